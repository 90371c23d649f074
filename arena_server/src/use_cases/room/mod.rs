// Authoritative state for one room: roster, match flow, abilities and the fixed-step pipeline.
//
// `Room` is plain data plus methods; the async task in `game.rs` owns it and is the only
// writer, so nothing here needs locking.

mod abilities;
mod match_flow;
mod pickups;
#[cfg(test)]
mod tests;

use crate::domain::events::{EntitySnapshot, ProjectileSnapshot, RoomEvent, StateSnapshot};
use crate::domain::geometry::{Arena, Vec2, dist_sq, point_in_circle};
use crate::domain::input_history::InputHistory;
use crate::domain::state::{
    AbilityKind, ChatMessage, Entity, EntityId, MatchPhase, MatchState, PendingKind,
    PendingTarget, Pickup, PlayerInput, PortalBudget, PortalPair, Projectile, ProjectileId,
    ProjectileKind, Strike, Zone,
};
use crate::domain::systems::bots::{self, BotBrain};
use crate::domain::systems::movement::{self, MovementConfig};
use crate::domain::systems::projectiles::{self, CollisionHooks, ProjectileConfig};
use crate::domain::tuning::{AbilityTuning, BotTuning, PlayerTuning, ProjectileTuning};
use crate::use_cases::types::{RoomConfig, RoomError, RoomSummary};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::Arc;
use tracing::{debug, info};

pub const CHAT_HISTORY_LIMIT: usize = 50;
pub const CHAT_MAX_CHARS: usize = 120;
pub const PLAYER_NAME_MAX_CHARS: usize = 16;

pub const DEFAULT_MATCH_DURATION_SEC: u32 = 300;
pub const MIN_MATCH_DURATION_SEC: u32 = 60;
pub const MAX_MATCH_DURATION_SEC: u32 = 900;

/// Spawn points try to keep at least this much room from other living bodies.
const SPAWN_CLEARANCE: f32 = 120.0;
const SPAWN_ATTEMPTS: usize = 12;

/// Echo replay needs a little more history than its delay.
const HISTORY_SLACK_MS: u64 = 1000;

/// World size plus every gameplay knob a room reads.
#[derive(Debug, Clone, Copy)]
pub struct RoomTuning {
    pub arena: Arena,
    /// Fixed simulation step in seconds; client-reported frame times are ignored.
    pub tick_dt: f32,
    pub player: PlayerTuning,
    pub projectile: ProjectileTuning,
    pub ability: AbilityTuning,
}

impl Default for RoomTuning {
    fn default() -> Self {
        Self {
            arena: Arena {
                width: 1200.0,
                height: 800.0,
            },
            tick_dt: 0.05,
            player: PlayerTuning::default(),
            projectile: ProjectileTuning::default(),
            ability: AbilityTuning::default(),
        }
    }
}

/// Messages that leave the room outside the per-tick snapshot.
#[derive(Debug, Clone, PartialEq)]
pub enum RoomNotice {
    Chat(ChatMessage),
    Toast(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Deferred {
    Respawn { entity_id: EntityId },
    RestockPickup { kind: AbilityKind },
}

/// A delayed action, checked against the current room state when it comes due.
#[derive(Debug, Clone, Copy)]
struct Timer {
    due: u64,
    action: Deferred,
}

pub struct Room {
    id: Arc<str>,
    config: RoomConfig,
    tuning: RoomTuning,
    tick: u64,

    entities: BTreeMap<EntityId, Entity>,
    projectiles: BTreeMap<ProjectileId, Projectile>,
    pickups: BTreeMap<u64, Pickup>,
    zones: BTreeMap<u64, Zone>,
    portals: BTreeMap<u64, PortalPair>,
    strikes: BTreeMap<u64, Strike>,
    pending: HashMap<EntityId, PendingTarget>,
    bots: BTreeMap<EntityId, BotBrain>,

    // Per-body input and cooldown bookkeeping.
    latest_input: HashMap<EntityId, PlayerInput>,
    last_item_seq: HashMap<EntityId, u64>,
    history: HashMap<EntityId, InputHistory>,
    last_shot_at: HashMap<EntityId, u64>,
    dash_until: HashMap<EntityId, u64>,
    shield_until: HashMap<EntityId, u64>,
    echo_expires_at: HashMap<EntityId, u64>,
    portal_cooldowns: HashMap<EntityId, u64>,
    /// (burst id, target id) -> end of that burst's hit window on the target.
    nova_hits: HashMap<(u64, EntityId), u64>,

    chat: VecDeque<ChatMessage>,
    match_state: MatchState,
    timers: Vec<Timer>,
    events: Vec<RoomEvent>,
    notices: Vec<RoomNotice>,
    next_id: u64,
    rng: StdRng,
}

impl Room {
    pub fn new(id: Arc<str>, config: RoomConfig, tuning: RoomTuning, seed: u64) -> Self {
        let mut room = Self {
            id,
            tuning,
            tick: 0,
            entities: BTreeMap::new(),
            projectiles: BTreeMap::new(),
            pickups: BTreeMap::new(),
            zones: BTreeMap::new(),
            portals: BTreeMap::new(),
            strikes: BTreeMap::new(),
            pending: HashMap::new(),
            bots: BTreeMap::new(),
            latest_input: HashMap::new(),
            last_item_seq: HashMap::new(),
            history: HashMap::new(),
            last_shot_at: HashMap::new(),
            dash_until: HashMap::new(),
            shield_until: HashMap::new(),
            echo_expires_at: HashMap::new(),
            portal_cooldowns: HashMap::new(),
            nova_hits: HashMap::new(),
            chat: VecDeque::new(),
            match_state: MatchState {
                phase: MatchPhase::Lobby,
                host_id: None,
                started_at: None,
                ends_at: None,
                duration_sec: DEFAULT_MATCH_DURATION_SEC,
            },
            timers: Vec::new(),
            events: Vec::new(),
            notices: Vec::new(),
            next_id: 1,
            rng: StdRng::seed_from_u64(seed),
            config,
        };

        for ordinal in 1..=room.config.bot_count {
            room.add_bot(ordinal);
        }
        room.refill_pickups();
        room
    }

    pub fn id(&self) -> &Arc<str> {
        &self.id
    }

    pub fn config(&self) -> &RoomConfig {
        &self.config
    }

    pub fn match_state(&self) -> &MatchState {
        &self.match_state
    }

    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    pub fn human_count(&self) -> usize {
        self.entities.values().filter(|e| e.is_human()).count()
    }

    pub fn bot_count(&self) -> usize {
        self.bots.len()
    }

    pub fn summary(&self) -> RoomSummary {
        RoomSummary {
            room_id: self.id.clone(),
            name: self.config.name.clone(),
            humans: self.human_count(),
            bots: self.bot_count(),
            max_players: self.config.max_players,
            is_private: self.config.is_private,
            phase: self.match_state.phase,
        }
    }

    pub fn chat_history(&self) -> Vec<ChatMessage> {
        self.chat.iter().cloned().collect()
    }

    pub fn drain_notices(&mut self) -> Vec<RoomNotice> {
        std::mem::take(&mut self.notices)
    }

    fn is_playing(&self) -> bool {
        self.match_state.phase == MatchPhase::Playing
    }

    fn alloc_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn toast(&mut self, text: impl Into<String>) {
        self.notices.push(RoomNotice::Toast(text.into()));
    }

    /// Humans and bots; echoes never count against capacity.
    fn body_count(&self) -> usize {
        self.entities.values().filter(|e| !e.is_echo).count()
    }

    fn add_bot(&mut self, ordinal: usize) {
        let id = self.alloc_id();
        let pos = self.spawn_point();
        let mut bot = Entity::new(
            id,
            format!("Bot {ordinal}"),
            pos,
            self.tuning.player.radius,
            self.config.max_hp,
        );
        bot.is_bot = true;
        self.entities.insert(id, bot);
        self.bots.insert(
            id,
            BotBrain::new(BotTuning::for_difficulty(self.config.bot_difficulty)),
        );
    }

    /// Uniform point at least `margin` away from every wall.
    fn random_point(&mut self, margin: f32) -> Vec2 {
        let arena = self.tuning.arena;
        let center = arena.center();
        let x = if margin < arena.width - margin {
            self.rng.gen_range(margin..=arena.width - margin)
        } else {
            center.x
        };
        let y = if margin < arena.height - margin {
            self.rng.gen_range(margin..=arena.height - margin)
        } else {
            center.y
        };
        Vec2::new(x, y)
    }

    /// Random spawn point, preferring spots clear of other living bodies.
    fn spawn_point(&mut self) -> Vec2 {
        let margin = self.tuning.player.spawn_margin;
        let mut best = self.tuning.arena.center();
        let mut best_gap = f32::MIN;
        for _ in 0..SPAWN_ATTEMPTS {
            let candidate = self.random_point(margin);
            let gap = self
                .entities
                .values()
                .filter(|e| e.alive)
                .map(|e| dist_sq(e.pos, candidate))
                .fold(f32::MAX, f32::min);
            if gap >= SPAWN_CLEARANCE * SPAWN_CLEARANCE {
                return candidate;
            }
            if gap > best_gap {
                best = candidate;
                best_gap = gap;
            }
        }
        best
    }

    /// Adds a human. A full room makes space by evicting its newest bot.
    pub fn join(&mut self, name: &str) -> Result<EntityId, RoomError> {
        if self.body_count() >= self.config.max_players {
            let Some(bot_id) = self.bots.keys().next_back().copied() else {
                return Err(RoomError::Full);
            };
            self.remove_body(bot_id);
            info!(room_id = %self.id, bot_id, "bot evicted to make room");
        }

        let name = sanitize_name(name);
        let id = self.alloc_id();
        let pos = self.spawn_point();
        self.entities.insert(
            id,
            Entity::new(
                id,
                name.clone(),
                pos,
                self.tuning.player.radius,
                self.config.max_hp,
            ),
        );
        if self.match_state.host_id.is_none() {
            self.match_state.host_id = Some(id);
        }
        info!(room_id = %self.id, player_id = id, %name, "player joined room");
        self.toast(format!("{name} joined"));
        Ok(id)
    }

    pub fn leave(&mut self, id: EntityId) {
        let Some(entity) = self.remove_body(id) else {
            return;
        };
        info!(room_id = %self.id, player_id = id, "player left room");
        self.toast(format!("{} left", entity.name));
        if self.match_state.host_id == Some(id) {
            self.reassign_host();
        }
    }

    /// Drops a body together with everything it owns: echoes, portals, strikes, shots in flight.
    fn remove_body(&mut self, id: EntityId) -> Option<Entity> {
        let entity = self.entities.remove(&id)?;

        let echoes: Vec<EntityId> = self
            .entities
            .values()
            .filter(|e| e.is_echo && e.owner_id == Some(id))
            .map(|e| e.id)
            .collect();
        for echo_id in echoes {
            self.despawn_echo(echo_id);
        }

        self.cancel_pending(id);
        self.portals.retain(|_, p| p.owner_id != id);
        self.strikes.retain(|_, s| s.owner_id != id);
        self.projectiles.retain(|_, p| p.root_id != id);
        self.timers
            .retain(|t| t.action != Deferred::Respawn { entity_id: id });

        self.bots.remove(&id);
        self.latest_input.remove(&id);
        self.last_item_seq.remove(&id);
        self.history.remove(&id);
        self.last_shot_at.remove(&id);
        self.dash_until.remove(&id);
        self.shield_until.remove(&id);
        self.portal_cooldowns.remove(&id);
        Some(entity)
    }

    fn despawn_echo(&mut self, echo_id: EntityId) {
        self.entities.remove(&echo_id);
        self.echo_expires_at.remove(&echo_id);
        self.last_shot_at.remove(&echo_id);
        self.portal_cooldowns.remove(&echo_id);
    }

    /// Overwrites the player's latest-input slot; the next tick reads it.
    pub fn handle_input(&mut self, id: EntityId, input: PlayerInput) {
        if self.entities.get(&id).is_some_and(Entity::is_human) {
            self.latest_input.insert(id, input);
        }
    }

    pub fn send_chat(&mut self, from_id: EntityId, text: &str, now_ms: u64) -> Option<ChatMessage> {
        let name = self
            .entities
            .get(&from_id)
            .filter(|e| e.is_human())?
            .name
            .clone();
        let text: String = text
            .trim()
            .chars()
            .filter(|c| !c.is_control())
            .take(CHAT_MAX_CHARS)
            .collect();
        if text.is_empty() {
            return None;
        }

        let msg = ChatMessage {
            id: self.alloc_id(),
            from_id,
            name,
            text,
            at: now_ms,
        };
        self.chat.push_back(msg.clone());
        while self.chat.len() > CHAT_HISTORY_LIMIT {
            self.chat.pop_front();
        }
        self.notices.push(RoomNotice::Chat(msg.clone()));
        Some(msg)
    }

    /// Advances the room by one fixed step and returns the snapshot for this tick.
    pub fn tick(&mut self, now_ms: u64) -> StateSnapshot {
        self.tick += 1;

        self.run_due_timers(now_ms);
        self.check_match_end(now_ms);
        self.expire_effects(now_ms);
        self.drive_bots(now_ms);
        self.step_bodies(now_ms);
        self.step_echoes(now_ms);
        self.apply_portals(now_ms);
        self.collect_pickups(now_ms);
        self.detonate_strikes(now_ms);
        self.step_projectiles(now_ms);

        self.snapshot(now_ms)
    }

    fn run_due_timers(&mut self, now_ms: u64) {
        let (due, waiting): (Vec<Timer>, Vec<Timer>) = std::mem::take(&mut self.timers)
            .into_iter()
            .partition(|t| t.due <= now_ms);
        self.timers = waiting;

        for timer in due {
            match timer.action {
                Deferred::Respawn { entity_id } => self.respawn(entity_id),
                Deferred::RestockPickup { kind } => self.spawn_pickup(kind),
            }
        }
    }

    fn respawn(&mut self, id: EntityId) {
        // Deaths outside a running match are undone by the next reset instead.
        if !self.is_playing() {
            return;
        }
        if !self.entities.get(&id).is_some_and(|e| !e.alive) {
            return;
        }
        let pos = self.spawn_point();
        if let Some(e) = self.entities.get_mut(&id) {
            e.pos = pos;
            e.hp = e.max_hp;
            e.alive = true;
            debug!(room_id = %self.id, entity_id = id, "respawned");
        }
    }

    fn expire_effects(&mut self, now_ms: u64) {
        self.zones.retain(|_, z| z.expires_at > now_ms);
        self.portals
            .retain(|_, p| p.expires_at.is_none_or(|at| at > now_ms));
        self.dash_until.retain(|_, until| *until > now_ms);
        self.nova_hits.retain(|_, until| *until > now_ms);
        self.portal_cooldowns.retain(|_, until| *until > now_ms);

        let expired: Vec<(EntityId, AbilityKind)> = self
            .pending
            .iter()
            .filter(|(_, p)| now_ms >= p.expires_at)
            .map(|(id, p)| (*id, p.ability()))
            .collect();
        for (id, ability) in expired {
            self.cancel_pending(id);
            if let Some(e) = self.entities.get_mut(&id) {
                if e.held_item == Some(ability) {
                    e.held_item = None;
                }
            }
            debug!(
                room_id = %self.id,
                entity_id = id,
                ability = ability.as_str(),
                "targeting window expired"
            );
        }

        let shields_down: Vec<EntityId> = self
            .shield_until
            .iter()
            .filter(|(_, until)| **until <= now_ms)
            .map(|(id, _)| *id)
            .collect();
        for id in shields_down {
            self.shield_until.remove(&id);
            if let Some(e) = self.entities.get_mut(&id) {
                e.shield = 0;
            }
        }

        let echoes_done: Vec<EntityId> = self
            .echo_expires_at
            .iter()
            .filter(|(_, at)| **at <= now_ms)
            .map(|(id, _)| *id)
            .collect();
        for echo_id in echoes_done {
            self.despawn_echo(echo_id);
        }
    }

    /// Forgets a two-phase activation. A portal still missing its exit goes with it.
    fn cancel_pending(&mut self, id: EntityId) {
        let Some(pending) = self.pending.remove(&id) else {
            return;
        };
        if let PendingKind::Portal { portal_id } = pending.kind {
            if self.portals.get(&portal_id).is_some_and(|p| p.b.is_none()) {
                self.portals.remove(&portal_id);
            }
        }
    }

    fn drive_bots(&mut self, now_ms: u64) {
        let Room {
            bots,
            entities,
            rng,
            latest_input,
            ..
        } = self;
        for (id, brain) in bots.iter_mut() {
            let Some(me) = entities.get(id) else {
                continue;
            };
            if !me.alive {
                continue;
            }
            let input = bots::think(brain, me, entities, now_ms, rng);
            latest_input.insert(*id, input);
        }
    }

    fn step_bodies(&mut self, now_ms: u64) {
        let playing = self.is_playing();
        let retain_ms = self.tuning.ability.echo_delay_ms + HISTORY_SLACK_MS;
        let ids: Vec<EntityId> = self
            .entities
            .values()
            .filter(|e| e.alive && !e.is_echo)
            .map(|e| e.id)
            .collect();

        for id in ids {
            let Some(input) = self.latest_input.get(&id).copied() else {
                continue;
            };
            let Some(pos) = self.entities.get(&id).map(|e| e.pos) else {
                continue;
            };
            if !self.bots.contains_key(&id) {
                self.history
                    .entry(id)
                    .or_insert_with(|| InputHistory::new(retain_ms))
                    .push(now_ms, input, pos);
            }

            self.move_body(id, input, now_ms);
            if !playing {
                continue;
            }
            if input.shoot {
                self.try_shoot(id, input.aim, now_ms);
            }
            // One activation per input sequence number.
            if input.use_item && self.last_item_seq.get(&id) != Some(&input.seq) {
                self.last_item_seq.insert(id, input.seq);
                self.activate_item(id, input.aim, now_ms);
            }
        }
    }

    /// Echoes replay their owner's input from `echo_delay_ms` ago, shots included.
    fn step_echoes(&mut self, now_ms: u64) {
        let playing = self.is_playing();
        let replay_at = now_ms.saturating_sub(self.tuning.ability.echo_delay_ms);
        let echoes: Vec<(EntityId, EntityId)> = self
            .entities
            .values()
            .filter(|e| e.is_echo && e.alive)
            .filter_map(|e| e.owner_id.map(|owner| (e.id, owner)))
            .collect();

        for (echo_id, owner_id) in echoes {
            let Some(record) = self
                .history
                .get(&owner_id)
                .and_then(|h| h.at_or_before(replay_at))
                .copied()
            else {
                continue;
            };
            self.move_body(echo_id, record.input, now_ms);
            if playing && record.input.shoot {
                self.try_shoot(echo_id, record.input.aim, now_ms);
            }
        }
    }

    /// Product of every speed modifier on a body: time bubble, dash, bot tier.
    fn move_multiplier(&self, id: EntityId, pos: Vec2, now_ms: u64) -> f32 {
        let ability = &self.tuning.ability;
        let mut m = zone_multiplier(&self.zones, pos, ability.bubble_move_multiplier);
        if self.dash_until.get(&id).is_some_and(|until| *until > now_ms) {
            m *= ability.dash_speed_multiplier;
        }
        if let Some(brain) = self.bots.get(&id) {
            m *= brain.tuning.move_multiplier;
        }
        m
    }

    fn move_body(&mut self, id: EntityId, input: PlayerInput, now_ms: u64) {
        let Some(pos) = self.entities.get(&id).map(|e| e.pos) else {
            return;
        };
        let multiplier = self.move_multiplier(id, pos, now_ms);
        let cfg = MovementConfig {
            speed: self.tuning.player.speed,
            arena: self.tuning.arena,
        };
        let dt = self.tuning.tick_dt;
        if let Some(e) = self.entities.get_mut(&id) {
            movement::tick_entity(e, input.keys, dt, multiplier, cfg);
        }
    }

    /// Fires a regular bullet toward `aim` if the shooter's fire interval allows it.
    fn try_shoot(&mut self, shooter_id: EntityId, aim: Vec2, now_ms: u64) -> bool {
        let interval = self.tuning.player.fire_interval_ms;
        if self
            .last_shot_at
            .get(&shooter_id)
            .is_some_and(|at| now_ms < at + interval)
        {
            return false;
        }
        let Some(origin) = self.entities.get(&shooter_id).map(|e| e.pos) else {
            return false;
        };
        let Some(dir) = aim.sub(origin).normalized() else {
            return false;
        };

        let t = self.tuning.projectile;
        let fired = self
            .spawn_projectile(
                shooter_id,
                dir,
                t.speed,
                ProjectileKind::Standard,
                t.radius,
                t.damage,
                t.life_time,
            )
            .is_some();
        if fired {
            self.last_shot_at.insert(shooter_id, now_ms);
        }
        fired
    }

    /// Spawns a projectile at the edge of the shooter's body, credited to its root.
    #[allow(clippy::too_many_arguments)]
    fn spawn_projectile(
        &mut self,
        shooter_id: EntityId,
        dir: Vec2,
        speed: f32,
        kind: ProjectileKind,
        radius: f32,
        damage: i32,
        ttl: f32,
    ) -> Option<ProjectileId> {
        let shooter = self.entities.get(&shooter_id).filter(|e| e.alive)?;
        let pos = shooter.pos.add(dir.scale(shooter.radius));
        let root_id = shooter.root_id();

        let t = self.tuning.projectile;
        let portal = if matches!(kind, ProjectileKind::Slash { .. }) {
            PortalBudget {
                jumps_left: t.slash_portal_jumps,
                cooldown_ms: t.slash_portal_cooldown_ms,
                ready_at: 0,
            }
        } else {
            PortalBudget {
                jumps_left: t.portal_jumps,
                cooldown_ms: t.portal_cooldown_ms,
                ready_at: 0,
            }
        };

        let id = self.alloc_id();
        self.projectiles.insert(
            id,
            Projectile {
                id,
                owner_id: shooter_id,
                root_id,
                pos,
                vel: dir.scale(speed),
                ttl,
                radius,
                damage,
                kind,
                rehit_until: HashMap::new(),
                portal,
            },
        );
        Some(id)
    }

    /// Moves bodies and projectiles that touch one end of a linked portal to the other end.
    fn apply_portals(&mut self, now_ms: u64) {
        let links: Vec<(Vec2, Vec2, f32)> = self
            .portals
            .values()
            .filter_map(|p| p.linked_ends(now_ms).map(|(a, b)| (a, b, p.radius)))
            .collect();
        if links.is_empty() {
            return;
        }

        let arena = self.tuning.arena;
        let cooldown = self.tuning.ability.portal_entity_cooldown_ms;
        for e in self.entities.values_mut() {
            if !e.alive
                || self
                    .portal_cooldowns
                    .get(&e.id)
                    .is_some_and(|until| *until > now_ms)
            {
                continue;
            }
            if let Some(exit) = portal_exit(&links, e.pos) {
                e.pos = arena.clamp_circle(exit, e.radius);
                self.portal_cooldowns.insert(e.id, now_ms + cooldown);
            }
        }

        for p in self.projectiles.values_mut() {
            if p.portal.jumps_left == 0 || now_ms < p.portal.ready_at {
                continue;
            }
            if let Some(exit) = portal_exit(&links, p.pos) {
                p.pos = exit;
                p.portal.jumps_left -= 1;
                p.portal.ready_at = now_ms + p.portal.cooldown_ms;
            }
        }
    }

    fn detonate_strikes(&mut self, now_ms: u64) {
        let due: Vec<u64> = self
            .strikes
            .values()
            .filter(|s| s.detonate_at <= now_ms)
            .map(|s| s.id)
            .collect();

        for strike_id in due {
            let Some(strike) = self.strikes.remove(&strike_id) else {
                continue;
            };
            self.events.push(RoomEvent::StrikeBoom {
                strike_id,
                owner_id: strike.owner_id,
                pos: strike.pos,
                radius: strike.radius,
            });
            if !self.is_playing() {
                continue;
            }

            // Everyone inside the blast takes damage, the caster included.
            let victims: Vec<EntityId> = self
                .entities
                .values()
                .filter(|e| e.alive && point_in_circle(e.pos, strike.pos, strike.radius))
                .map(|e| e.id)
                .collect();
            for victim in victims {
                self.hit_entity(victim, strike.owner_id, strike.owner_id, strike.damage, now_ms);
            }
        }
    }

    /// Non-projectile damage (beam, strike). Dash dodges it, a shield charge absorbs it.
    fn hit_entity(
        &mut self,
        target_id: EntityId,
        by_id: EntityId,
        by_root_id: EntityId,
        damage: i32,
        now_ms: u64,
    ) {
        if self
            .dash_until
            .get(&target_id)
            .is_some_and(|until| *until > now_ms)
        {
            return;
        }
        let Some(target) = self.entities.get_mut(&target_id) else {
            return;
        };
        if !target.alive {
            return;
        }
        if target.shield > 0 {
            target.shield -= 1;
            self.events.push(if target.shield == 0 {
                RoomEvent::ShieldBreak { target_id }
            } else {
                RoomEvent::ShieldHit {
                    target_id,
                    charges_left: target.shield,
                }
            });
            return;
        }

        if projectiles::damage_entity(
            &mut self.entities,
            target_id,
            damage,
            by_id,
            by_root_id,
            &mut self.events,
        ) {
            self.on_death(target_id, now_ms);
        }
    }

    fn step_projectiles(&mut self, now_ms: u64) {
        let ability = self.tuning.ability;
        let t = self.tuning.projectile;
        let cfg = ProjectileConfig {
            dt: self.tuning.tick_dt,
            now_ms,
            arena: self.tuning.arena,
            allow_damage: self.is_playing(),
            cull_margin: t.cull_margin,
            rehit_ms: t.rehit_ms,
            deflect_speed_factor: t.deflect_speed_factor,
            deflect_min_ttl: t.deflect_min_ttl,
            bouncer_max_speed: ability.bouncer_max_speed,
            bouncer_shrink: ability.bouncer_shrink,
        };

        let mut hooks = RoomHooks {
            zones: &self.zones,
            dash_until: &self.dash_until,
            nova_hits: &mut self.nova_hits,
            projectile_multiplier: ability.bubble_projectile_multiplier,
            nova_hit_window_ms: ability.nova_hit_window_ms,
            now_ms,
            deaths: Vec::new(),
        };
        projectiles::tick_projectiles(
            &mut self.entities,
            &mut self.projectiles,
            &mut self.next_id,
            &mut self.events,
            &mut hooks,
            cfg,
        );

        let deaths = hooks.deaths;
        for victim in deaths {
            self.on_death(victim, now_ms);
        }
    }

    /// Bookkeeping after a kill: echoes vanish, everyone else loses their buffs and waits
    /// to respawn.
    fn on_death(&mut self, id: EntityId, now_ms: u64) {
        let Some(entity) = self.entities.get_mut(&id) else {
            return;
        };
        if entity.is_echo {
            self.despawn_echo(id);
            return;
        }

        entity.held_item = None;
        entity.shield = 0;
        self.shield_until.remove(&id);
        self.dash_until.remove(&id);
        self.cancel_pending(id);
        self.timers.push(Timer {
            due: now_ms + self.tuning.player.respawn_ms,
            action: Deferred::Respawn { entity_id: id },
        });
    }

    fn snapshot(&mut self, now_ms: u64) -> StateSnapshot {
        let dash_until = &self.dash_until;
        StateSnapshot {
            t: now_ms,
            tick: self.tick,
            room_id: self.id.clone(),
            entities: self
                .entities
                .values()
                .map(|e| {
                    let mut s = EntitySnapshot::from(e);
                    s.phased = dash_until.get(&e.id).is_some_and(|until| *until > now_ms);
                    s
                })
                .collect(),
            projectiles: self
                .projectiles
                .values()
                .map(ProjectileSnapshot::from)
                .collect(),
            events: std::mem::take(&mut self.events),
            pickups: self.pickups.values().cloned().collect(),
            zones: self.zones.values().cloned().collect(),
            portals: self.portals.values().cloned().collect(),
            match_state: self.match_state.clone(),
        }
    }
}

/// Room rules plugged into the projectile engine.
struct RoomHooks<'a> {
    zones: &'a BTreeMap<u64, Zone>,
    dash_until: &'a HashMap<EntityId, u64>,
    nova_hits: &'a mut HashMap<(u64, EntityId), u64>,
    projectile_multiplier: f32,
    nova_hit_window_ms: u64,
    now_ms: u64,
    deaths: Vec<EntityId>,
}

impl CollisionHooks for RoomHooks<'_> {
    fn speed_multiplier(&self, pos: Vec2) -> f32 {
        zone_multiplier(self.zones, pos, self.projectile_multiplier)
    }

    fn is_invulnerable(&self, target: EntityId) -> bool {
        self.dash_until
            .get(&target)
            .is_some_and(|until| *until > self.now_ms)
    }

    fn ignore_hit(&self, projectile: &Projectile, target: EntityId) -> bool {
        let ProjectileKind::Nova { burst_id } = projectile.kind else {
            return false;
        };
        self.nova_hits
            .get(&(burst_id, target))
            .is_some_and(|until| *until > self.now_ms)
    }

    fn on_hit(&mut self, projectile: &Projectile, target: EntityId) {
        if let ProjectileKind::Nova { burst_id } = projectile.kind {
            self.nova_hits
                .insert((burst_id, target), self.now_ms + self.nova_hit_window_ms);
        }
    }

    fn on_death(&mut self, victim: &Entity, _by_root_id: EntityId) {
        self.deaths.push(victim.id);
    }
}

/// Time bubbles don't stack: any bubble covering `pos` applies `factor` once.
fn zone_multiplier(zones: &BTreeMap<u64, Zone>, pos: Vec2, factor: f32) -> f32 {
    if zones
        .values()
        .any(|z| point_in_circle(pos, z.pos, z.radius))
    {
        factor.min(1.0)
    } else {
        1.0
    }
}

fn portal_exit(links: &[(Vec2, Vec2, f32)], pos: Vec2) -> Option<Vec2> {
    links.iter().find_map(|&(a, b, r)| {
        if point_in_circle(pos, a, r) {
            Some(b)
        } else if point_in_circle(pos, b, r) {
            Some(a)
        } else {
            None
        }
    })
}

fn sanitize_name(raw: &str) -> String {
    let name: String = raw
        .trim()
        .chars()
        .filter(|c| !c.is_control())
        .take(PLAYER_NAME_MAX_CHARS)
        .collect();
    if name.is_empty() {
        "Player".to_string()
    } else {
        name
    }
}
