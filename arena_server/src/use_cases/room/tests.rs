use super::*;
use crate::domain::tuning::BotDifficulty;

const T0: u64 = 10_000;

fn config(max_players: usize, bot_count: usize, max_hp: i32) -> RoomConfig {
    RoomConfig {
        name: "test".to_string(),
        max_players,
        is_private: false,
        fill_with_bots: bot_count > 0,
        bot_count,
        bot_difficulty: BotDifficulty::Normal,
        max_hp,
    }
}

fn room(max_players: usize, bot_count: usize, max_hp: i32) -> Room {
    Room::new(
        Arc::from("ROOM1"),
        config(max_players, bot_count, max_hp),
        RoomTuning::default(),
        42,
    )
}

/// Two humans, match running since `T0`, no pickups in the way.
fn duel(max_hp: i32) -> (Room, EntityId, EntityId) {
    let mut room = room(8, 0, max_hp);
    let a = room.join("alice").expect("join a");
    let b = room.join("bob").expect("join b");
    assert!(room.start_match(a, T0));
    room.pickups.clear();
    place(&mut room, a, 300.0, 400.0);
    place(&mut room, b, 340.0, 400.0);
    (room, a, b)
}

fn place(room: &mut Room, id: EntityId, x: f32, y: f32) {
    room.entities.get_mut(&id).expect("entity").pos = Vec2::new(x, y);
}

fn give(room: &mut Room, id: EntityId, item: AbilityKind) {
    room.entities.get_mut(&id).expect("entity").held_item = Some(item);
}

fn input(seq: u64, aim: Vec2) -> PlayerInput {
    PlayerInput {
        seq,
        aim,
        ..PlayerInput::default()
    }
}

fn shoot_at(aim: Vec2, seq: u64) -> PlayerInput {
    PlayerInput {
        shoot: true,
        ..input(seq, aim)
    }
}

fn use_item(aim: Vec2, seq: u64) -> PlayerInput {
    PlayerInput {
        use_item: true,
        ..input(seq, aim)
    }
}

#[test]
fn when_point_blank_shots_land_then_target_dies_and_scores_are_credited() {
    let (mut room, a, b) = duel(3);
    let b_pos = room.entity(b).expect("b").pos;

    let mut hp_seen = Vec::new();
    let mut death_tick_events = Vec::new();
    for (i, now) in [T0 + 1000, T0 + 1200, T0 + 1400].into_iter().enumerate() {
        room.handle_input(a, shoot_at(b_pos, i as u64 + 1));
        let snap = room.tick(now);
        hp_seen.push(room.entity(b).expect("b").hp);
        death_tick_events = snap.events;
    }

    assert_eq!(hp_seen, vec![2, 1, 0]);
    let victim = room.entity(b).expect("b");
    assert!(!victim.alive);
    assert_eq!(victim.deaths, 1);
    assert_eq!(room.entity(a).expect("a").kills, 1);
    assert!(death_tick_events.iter().any(|e| matches!(
        e,
        RoomEvent::Death { target_id, by_root_id, .. } if *target_id == b && *by_root_id == a
    )));
}

#[test]
fn when_fire_interval_has_not_passed_then_second_shot_is_ignored() {
    let (mut room, a, b) = duel(3);
    let b_pos = room.entity(b).expect("b").pos;

    room.handle_input(a, shoot_at(b_pos, 1));
    room.tick(T0 + 1000);
    room.tick(T0 + 1050);
    room.tick(T0 + 1100);

    assert_eq!(room.entity(b).expect("b").hp, 2);
}

#[test]
fn when_respawn_delay_passes_then_dead_player_returns_at_full_hp() {
    let (mut room, a, b) = duel(1);
    let b_pos = room.entity(b).expect("b").pos;
    room.handle_input(a, shoot_at(b_pos, 1));
    room.tick(T0 + 1000);
    assert!(!room.entity(b).expect("b").alive);

    room.handle_input(a, input(2, b_pos));
    room.tick(T0 + 2000);
    assert!(!room.entity(b).expect("b").alive);

    room.tick(T0 + 1000 + room.tuning.player.respawn_ms);
    let b = room.entity(b).expect("b");
    assert!(b.alive);
    assert_eq!(b.hp, 1);
}

#[test]
fn when_match_is_not_playing_then_movement_applies_but_shots_do_not() {
    let mut room = room(8, 0, 3);
    let a = room.join("alice").expect("join");
    room.pickups.clear();
    place(&mut room, a, 300.0, 400.0);

    let mut moving = shoot_at(Vec2::new(900.0, 400.0), 1);
    moving.keys.right = true;
    room.handle_input(a, moving);
    let snap = room.tick(T0);

    assert!(room.entity(a).expect("a").pos.x > 300.0);
    assert!(snap.projectiles.is_empty());
}

#[test]
fn when_time_bubble_is_active_then_projectiles_and_bodies_inside_are_slowed() {
    let (mut room, a, b) = duel(3);
    place(&mut room, a, 600.0, 400.0);
    place(&mut room, b, 1100.0, 100.0);
    give(&mut room, a, AbilityKind::TimeBubble);

    room.handle_input(a, use_item(Vec2::new(700.0, 400.0), 1));
    let snap = room.tick(T0 + 1000);
    assert_eq!(snap.zones.len(), 1);
    assert_eq!(snap.zones[0].pos, Vec2::new(600.0, 400.0));
    assert_eq!(room.entity(a).expect("a").held_item, None);

    // Enemy bullet flying right, starting inside the bubble.
    let t = room.tuning.projectile;
    room.projectiles.insert(
        900,
        Projectile {
            id: 900,
            owner_id: b,
            root_id: b,
            pos: Vec2::new(500.0, 380.0),
            vel: Vec2::new(t.speed, 0.0),
            ttl: 5.0,
            radius: t.radius,
            damage: 1,
            kind: ProjectileKind::Standard,
            rehit_until: HashMap::new(),
            portal: PortalBudget {
                jumps_left: 0,
                cooldown_ms: 0,
                ready_at: 0,
            },
        },
    );
    room.tick(T0 + 1050);
    let x = room.projectiles[&900].pos.x;
    assert!((x - (500.0 + t.speed * 0.05 * 0.6)).abs() < 1e-3);

    // Once outside, full speed again.
    room.projectiles.get_mut(&900).expect("bullet").pos = Vec2::new(900.0, 300.0);
    room.tick(T0 + 1100);
    let x = room.projectiles[&900].pos.x;
    assert!((x - (900.0 + t.speed * 0.05)).abs() < 1e-3);

    let mut walk = input(2, Vec2::ZERO);
    walk.keys.up = true;
    room.handle_input(a, walk);
    room.tick(T0 + 1150);
    let y = room.entity(a).expect("a").pos.y;
    assert!((400.0 - y - room.tuning.player.speed * 0.05 * 0.5).abs() < 1e-3);

    room.tick(T0 + 1000 + room.tuning.ability.bubble_lifetime_ms);
    assert!(room.zones.is_empty());
}

#[test]
fn when_orbital_strike_is_confirmed_then_it_detonates_after_the_delay() {
    let (mut room, a, b) = duel(3);
    place(&mut room, a, 100.0, 100.0);
    place(&mut room, b, 800.0, 500.0);
    let c = room.join("carol").expect("join c");
    place(&mut room, c, 1100.0, 700.0);
    give(&mut room, a, AbilityKind::OrbitalStrike);

    room.handle_input(a, use_item(Vec2::new(800.0, 500.0), 1));
    room.tick(T0 + 1000);
    assert_eq!(room.entity(a).expect("a").held_item, Some(AbilityKind::OrbitalStrike));
    assert!(room.pending.contains_key(&a));

    assert!(room.confirm_strike(a, 820.0, 500.0, T0 + 1100));
    assert_eq!(room.entity(a).expect("a").held_item, None);

    let snap = room.tick(T0 + 1150);
    assert!(snap.events.iter().any(|e| matches!(e, RoomEvent::StrikeMark { .. })));
    assert_eq!(room.entity(b).expect("b").hp, 3);

    let snap = room.tick(T0 + 2100);
    let booms = snap
        .events
        .iter()
        .filter(|e| matches!(e, RoomEvent::StrikeBoom { .. }))
        .count();
    assert_eq!(booms, 1);
    assert_eq!(room.entity(b).expect("b").hp, 1);
    assert_eq!(room.entity(c).expect("c").hp, 3);
    assert!(room.strikes.is_empty());
}

#[test]
fn when_strike_lands_on_a_shield_then_a_charge_is_spent_instead_of_hp() {
    let (mut room, a, b) = duel(3);
    place(&mut room, a, 100.0, 100.0);
    place(&mut room, b, 800.0, 500.0);
    give(&mut room, b, AbilityKind::Shield);
    room.handle_input(b, use_item(Vec2::new(0.0, 0.0), 1));
    room.tick(T0 + 1000);
    assert_eq!(room.entity(b).expect("b").shield, 2);

    give(&mut room, a, AbilityKind::OrbitalStrike);
    room.handle_input(a, use_item(Vec2::new(800.0, 500.0), 1));
    room.tick(T0 + 1050);
    assert!(room.confirm_strike(a, 800.0, 500.0, T0 + 1100));

    let snap = room.tick(T0 + 2150);
    let target = room.entity(b).expect("b");
    assert_eq!(target.hp, 3);
    assert_eq!(target.shield, 1);
    assert!(snap.events.iter().any(|e| matches!(
        e,
        RoomEvent::ShieldHit {
            charges_left: 1,
            ..
        }
    )));
}

#[test]
fn when_dashing_then_bullets_beams_and_strikes_all_miss() {
    let (mut room, a, b) = duel(3);
    let a_pos = room.entity(a).expect("a").pos;
    room.dash_until.insert(a, T0 + 2300);

    room.handle_input(b, shoot_at(a_pos, 1));
    room.tick(T0 + 1000);
    assert_eq!(room.entity(a).expect("a").hp, 3);

    give(&mut room, b, AbilityKind::RiftSniper);
    room.handle_input(b, use_item(Vec2::new(0.0, 400.0), 2));
    let snap = room.tick(T0 + 1050);
    assert!(snap.events.iter().any(|e| matches!(e, RoomEvent::BeamFire { .. })));
    assert!(room.entity(a).expect("a").alive);

    give(&mut room, b, AbilityKind::OrbitalStrike);
    room.handle_input(b, use_item(a_pos, 3));
    room.tick(T0 + 1100);
    assert!(room.confirm_strike(b, a_pos.x, a_pos.y, T0 + 1150));
    place(&mut room, b, 800.0, 400.0);
    let snap = room.tick(T0 + 2200);
    assert!(snap.events.iter().any(|e| matches!(e, RoomEvent::StrikeBoom { .. })));
    assert_eq!(room.entity(a).expect("a").hp, 3);

    place(&mut room, b, 340.0, 400.0);
    room.handle_input(b, shoot_at(a_pos, 4));
    room.tick(T0 + 2400);
    assert_eq!(room.entity(a).expect("a").hp, 2);
}

#[test]
fn when_targeting_window_lapses_then_item_is_dropped_and_confirm_is_refused() {
    let (mut room, a, _b) = duel(3);
    give(&mut room, a, AbilityKind::OrbitalStrike);
    room.handle_input(a, use_item(Vec2::new(800.0, 500.0), 1));
    room.tick(T0 + 1000);

    room.tick(T0 + 1000 + room.tuning.ability.strike_window_ms);

    assert_eq!(room.entity(a).expect("a").held_item, None);
    assert!(!room.confirm_strike(a, 500.0, 500.0, T0 + 6100));
    assert!(room.strikes.is_empty());
}

#[test]
fn when_held_item_changed_before_confirm_then_portal_placement_is_dropped() {
    let (mut room, a, _b) = duel(3);
    give(&mut room, a, AbilityKind::LinkedPortals);
    room.handle_input(a, use_item(Vec2::new(800.0, 500.0), 1));
    room.tick(T0 + 1000);
    assert_eq!(room.portals.len(), 1);

    give(&mut room, a, AbilityKind::Shield);
    assert!(!room.place_portal_b(a, 900.0, 300.0, T0 + 1100));
    assert!(room.portals.is_empty());
    assert!(room.pending.is_empty());
    assert_eq!(room.entity(a).expect("a").held_item, Some(AbilityKind::Shield));
}

#[test]
fn when_portals_are_linked_then_bodies_teleport_once_per_cooldown() {
    let (mut room, a, b) = duel(3);
    place(&mut room, a, 200.0, 200.0);
    place(&mut room, b, 1100.0, 700.0);
    give(&mut room, a, AbilityKind::LinkedPortals);
    room.handle_input(a, use_item(Vec2::new(800.0, 500.0), 1));
    room.tick(T0 + 1000);

    assert!(room.place_portal_b(a, 900.0, 300.0, T0 + 1020));
    room.tick(T0 + 1050);
    assert_eq!(room.entity(a).expect("a").pos, Vec2::new(900.0, 300.0));

    // Standing on B during the cooldown does not bounce back.
    room.tick(T0 + 1100);
    assert_eq!(room.entity(a).expect("a").pos, Vec2::new(900.0, 300.0));

    room.tick(T0 + 1020 + room.tuning.ability.portal_link_ms);
    assert!(room.portals.is_empty());
}

#[test]
fn when_shield_is_up_then_beam_breaks_a_charge_instead_of_killing() {
    let (mut room, a, b) = duel(3);
    place(&mut room, a, 100.0, 400.0);
    place(&mut room, b, 700.0, 400.0);
    give(&mut room, b, AbilityKind::Shield);
    room.handle_input(b, use_item(Vec2::new(0.0, 0.0), 1));
    room.tick(T0 + 1000);
    assert_eq!(room.entity(b).expect("b").shield, 2);

    give(&mut room, a, AbilityKind::RiftSniper);
    room.handle_input(a, use_item(Vec2::new(1000.0, 400.0), 1));
    let snap = room.tick(T0 + 1050);

    let target = room.entity(b).expect("b");
    assert!(target.alive);
    assert_eq!(target.shield, 1);
    assert!(snap.events.iter().any(|e| matches!(e, RoomEvent::BeamFire { .. })));

    give(&mut room, a, AbilityKind::RiftSniper);
    room.handle_input(a, use_item(Vec2::new(1000.0, 400.0), 2));
    room.tick(T0 + 1100);
    give(&mut room, a, AbilityKind::RiftSniper);
    room.handle_input(a, use_item(Vec2::new(1000.0, 400.0), 3));
    room.tick(T0 + 1150);

    let target = room.entity(b).expect("b");
    assert!(!target.alive);
    assert_eq!(room.entity(a).expect("a").kills, 1);
}

#[test]
fn when_aim_is_on_top_of_caster_then_directional_item_is_kept() {
    let (mut room, a, _b) = duel(3);
    place(&mut room, a, 500.0, 500.0);
    give(&mut room, a, AbilityKind::VoidSlice);

    room.handle_input(a, use_item(Vec2::new(500.0, 500.0), 1));
    room.tick(T0 + 1000);

    assert_eq!(room.entity(a).expect("a").held_item, Some(AbilityKind::VoidSlice));
    assert!(room.projectiles.is_empty());
}

#[test]
fn when_nova_burst_overlaps_a_target_then_it_hits_once_per_window() {
    let (mut room, a, b) = duel(10);
    place(&mut room, b, 339.0, 400.0);
    give(&mut room, a, AbilityKind::PulseNova);

    room.handle_input(a, use_item(Vec2::new(900.0, 400.0), 1));
    room.tick(T0 + 1000);
    assert_eq!(room.entity(b).expect("b").hp, 9);

    let nova_bullet = |room: &Room| {
        room.projectiles
            .values()
            .find(|p| matches!(p.kind, ProjectileKind::Nova { .. }))
            .map(|p| p.pos)
            .expect("nova bullet")
    };

    let pos = nova_bullet(&room);
    place(&mut room, b, pos.x, pos.y);
    room.tick(T0 + 1050);
    assert_eq!(room.entity(b).expect("b").hp, 9);

    let pos = nova_bullet(&room);
    place(&mut room, b, pos.x, pos.y);
    room.tick(T0 + 1000 + room.tuning.ability.nova_hit_window_ms + 50);
    assert_eq!(room.entity(b).expect("b").hp, 8);
}

#[test]
fn when_same_sequence_is_resubmitted_then_item_activates_once() {
    let (mut room, a, b) = duel(3);
    place(&mut room, b, 1100.0, 700.0);
    give(&mut room, a, AbilityKind::PulseNova);
    room.handle_input(a, use_item(Vec2::new(900.0, 400.0), 7));
    room.tick(T0 + 1000);
    assert_eq!(room.projectiles.len(), 18);

    give(&mut room, a, AbilityKind::PulseNova);
    room.handle_input(a, use_item(Vec2::new(900.0, 400.0), 7));
    room.tick(T0 + 1050);

    assert_eq!(room.entity(a).expect("a").held_item, Some(AbilityKind::PulseNova));
}

#[test]
fn when_echo_is_spawned_then_it_retraces_the_owner_path_with_a_delay() {
    let (mut room, a, b) = duel(3);
    place(&mut room, a, 200.0, 200.0);
    place(&mut room, b, 1100.0, 700.0);

    let mut walk = input(1, Vec2::new(900.0, 200.0));
    walk.keys.right = true;
    room.handle_input(a, walk);

    let mut owner_path = Vec::new();
    let mut now = T0 + 1000;
    for _ in 0..30 {
        room.tick(now);
        owner_path.push((now, room.entity(a).expect("a").pos));
        now += 50;
    }

    give(&mut room, a, AbilityKind::Echo);
    let mut activate = walk;
    activate.seq = 2;
    activate.use_item = true;
    room.handle_input(a, activate);
    let snap = room.tick(now);
    let echo_id = snap
        .events
        .iter()
        .find_map(|e| match e {
            RoomEvent::SpawnEcho { echo_id, .. } => Some(*echo_id),
            _ => None,
        })
        .expect("echo spawned");

    let delay = room.tuning.ability.echo_delay_ms;
    for _ in 0..5 {
        let echo = room.entity(echo_id).expect("echo");
        let expected = owner_path
            .iter()
            .find(|(at, _)| *at == now - delay)
            .map(|(_, pos)| *pos)
            .expect("recorded position");
        assert!((echo.pos.x - expected.x).abs() < 1e-3);
        assert!(echo.is_echo);
        assert_eq!(echo.owner_id, Some(a));
        owner_path.push((now, room.entity(a).expect("a").pos));
        now += 50;
        room.tick(now);
    }

    room.tick(now + room.tuning.ability.echo_lifetime_ms);
    assert!(room.entity(echo_id).is_none());
}

#[test]
fn when_match_is_restarted_twice_then_roster_is_reset_both_times() {
    let (mut room, a, b) = duel(1);
    let b_pos = room.entity(b).expect("b").pos;
    room.handle_input(a, shoot_at(b_pos, 1));
    room.tick(T0 + 1000);
    give(&mut room, a, AbilityKind::Shield);

    for _ in 0..2 {
        assert!(room.restart_match(a));
        assert_eq!(room.match_state().phase, MatchPhase::Lobby);
        assert_eq!(room.match_state().started_at, None);
        assert!(room.projectiles.is_empty());
        assert!(room.timers.is_empty());
        assert_eq!(room.pickups.len(), room.tuning.ability.pickup_slots);

        let margin = room.tuning.player.spawn_margin;
        for id in [a, b] {
            let e = room.entity(id).expect("body");
            assert!(e.alive);
            assert_eq!(e.hp, e.max_hp);
            assert_eq!((e.kills, e.deaths), (0, 0));
            assert_eq!(e.held_item, None);
            assert!(e.pos.x >= margin && e.pos.x <= 1200.0 - margin);
            assert!(e.pos.y >= margin && e.pos.y <= 800.0 - margin);
        }
    }
}

#[test]
fn when_non_host_sends_match_commands_then_they_are_ignored() {
    let (mut room, _a, b) = duel(3);
    assert!(!room.restart_match(b));
    assert!(!room.configure_match(b, 120.0));
    assert_eq!(room.match_state().phase, MatchPhase::Playing);
}

#[test]
fn when_duration_is_configured_then_it_is_clamped_and_used_at_start() {
    let mut room = room(8, 0, 3);
    let a = room.join("alice").expect("join");

    assert!(room.configure_match(a, 5.0));
    assert_eq!(room.match_state().duration_sec, MIN_MATCH_DURATION_SEC);
    assert!(room.configure_match(a, 10_000.0));
    assert_eq!(room.match_state().duration_sec, MAX_MATCH_DURATION_SEC);
    assert!(!room.configure_match(a, f64::NAN));

    assert!(room.start_match(a, T0));
    assert_eq!(room.match_state().ends_at, Some(T0 + 900_000));
    assert!(!room.configure_match(a, 120.0));
}

#[test]
fn when_clock_passes_end_time_then_match_ends_and_damage_stops() {
    let (mut room, a, b) = duel(3);
    let ends_at = room.match_state().ends_at.expect("end time");
    room.drain_notices();

    room.tick(ends_at);
    assert_eq!(room.match_state().phase, MatchPhase::Ended);
    assert!(room
        .drain_notices()
        .iter()
        .any(|n| matches!(n, RoomNotice::Toast(t) if t.starts_with("Match over"))));

    let b_pos = room.entity(b).expect("b").pos;
    room.handle_input(a, shoot_at(b_pos, 1));
    room.tick(ends_at + 50);
    assert_eq!(room.entity(b).expect("b").hp, 3);
}

#[test]
fn when_host_leaves_then_next_human_becomes_host_even_with_bots_present() {
    let mut room = room(8, 2, 3);
    let a = room.join("alice").expect("join a");
    let b = room.join("bob").expect("join b");
    assert_eq!(room.match_state().host_id, Some(a));
    room.drain_notices();

    room.leave(a);

    assert_eq!(room.match_state().host_id, Some(b));
    let notices = room.drain_notices();
    assert!(notices.contains(&RoomNotice::Toast("bob is now the host".to_string())));

    room.leave(b);
    assert_eq!(room.match_state().host_id, None);
    assert_eq!(room.human_count(), 0);
}

#[test]
fn when_room_is_full_then_a_bot_is_evicted_or_join_is_refused() {
    let mut room = room(3, 2, 3);
    assert_eq!(room.bot_count(), 2);

    room.join("alice").expect("join a");
    assert_eq!(room.bot_count(), 2);
    room.join("bob").expect("join b");
    assert_eq!(room.bot_count(), 1);
    room.join("carol").expect("join c");
    assert_eq!(room.bot_count(), 0);

    assert_eq!(room.join("dave"), Err(RoomError::Full));
    assert_eq!(room.human_count(), 3);
}

#[test]
fn when_player_leaves_then_their_echoes_and_shots_go_with_them() {
    let (mut room, a, b) = duel(3);
    place(&mut room, b, 1100.0, 700.0);
    give(&mut room, a, AbilityKind::Echo);
    room.handle_input(a, use_item(Vec2::new(900.0, 400.0), 1));
    room.tick(T0 + 1000);
    room.handle_input(a, shoot_at(Vec2::new(900.0, 400.0), 2));
    room.tick(T0 + 1200);
    assert_eq!(room.entities.len(), 3);
    assert!(!room.projectiles.is_empty());

    room.leave(a);

    assert_eq!(room.entities.len(), 1);
    assert!(room.projectiles.values().all(|p| p.root_id != a));
}

#[test]
fn when_chat_overflows_then_only_the_latest_messages_are_kept() {
    let mut room = room(8, 0, 3);
    let a = room.join("alice").expect("join");

    for i in 0..(CHAT_HISTORY_LIMIT + 5) {
        room.send_chat(a, &format!("msg {i}"), T0 + i as u64);
    }
    let history = room.chat_history();
    assert_eq!(history.len(), CHAT_HISTORY_LIMIT);
    assert_eq!(history[0].text, "msg 5");

    assert!(room.send_chat(a, "   ", T0).is_none());
    let long = "x".repeat(500);
    let msg = room.send_chat(a, &long, T0).expect("long message");
    assert_eq!(msg.text.chars().count(), CHAT_MAX_CHARS);
}

#[test]
fn when_name_is_blank_or_long_then_it_is_normalised() {
    let mut room = room(8, 0, 3);
    let a = room.join("   ").expect("join");
    let b = room.join("abcdefghijklmnopqrstuvwxyz").expect("join");
    assert_eq!(room.entity(a).expect("a").name, "Player");
    assert_eq!(room.entity(b).expect("b").name.chars().count(), PLAYER_NAME_MAX_CHARS);
}

#[test]
fn when_pickup_is_touched_then_only_a_human_with_a_free_slot_takes_it() {
    let (mut room, a, b) = duel(3);
    place(&mut room, a, 300.0, 300.0);
    place(&mut room, b, 900.0, 300.0);
    give(&mut room, b, AbilityKind::Shield);
    room.pickups.insert(
        500,
        Pickup {
            id: 500,
            kind: AbilityKind::PulseNova,
            pos: Vec2::new(305.0, 300.0),
            radius: 16.0,
        },
    );
    room.pickups.insert(
        501,
        Pickup {
            id: 501,
            kind: AbilityKind::Echo,
            pos: Vec2::new(900.0, 305.0),
            radius: 16.0,
        },
    );

    room.tick(T0 + 1000);

    assert_eq!(room.entity(a).expect("a").held_item, Some(AbilityKind::PulseNova));
    assert!(!room.pickups.contains_key(&500));
    assert!(room.pickups.contains_key(&501));

    room.tick(T0 + 1000 + room.tuning.ability.pickup_respawn_ms);
    assert_eq!(room.pickups.len(), 2);
}

#[test]
fn when_bots_fill_the_room_then_they_hunt_humans_once_playing() {
    let mut room = room(4, 1, 3);
    let a = room.join("alice").expect("join");
    assert!(room.start_match(a, T0));
    room.pickups.clear();
    let bot_id = *room.bots.keys().next().expect("bot");
    place(&mut room, bot_id, 600.0, 400.0);
    place(&mut room, a, 800.0, 400.0);

    room.tick(T0 + 1000);

    assert!(room.projectiles.values().any(|p| p.owner_id == bot_id));
    assert_eq!(room.entity(bot_id).expect("bot").held_item, None);
}
