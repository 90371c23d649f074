// Pickup-granted abilities and the two targeting confirmations.

use super::Room;
use crate::domain::events::RoomEvent;
use crate::domain::geometry::{Vec2, ray_to_boundary, segment_intersects_circle};
use crate::domain::state::{
    AbilityKind, Entity, EntityId, PendingKind, PendingTarget, PortalPair, ProjectileKind,
    Strike, Zone, ZoneKind,
};
use std::f32::consts::TAU;
use tracing::{debug, info};

impl Room {
    /// Uses the held item. Direction-based abilities keep the item when the aim is degenerate;
    /// strike and portals keep it until their confirmation arrives.
    pub(super) fn activate_item(&mut self, id: EntityId, aim: Vec2, now_ms: u64) {
        let Some(caster) = self.entities.get(&id) else {
            return;
        };
        if !caster.alive || caster.is_echo {
            return;
        }
        let Some(kind) = caster.held_item else {
            return;
        };
        if self.pending.contains_key(&id) {
            return;
        }

        let consumed = match kind {
            AbilityKind::Echo => self.spawn_echo(id, now_ms),
            AbilityKind::TimeBubble => self.spawn_time_bubble(id, now_ms),
            AbilityKind::PhaseDash => {
                self.dash_until
                    .insert(id, now_ms + self.tuning.ability.dash_ms);
                true
            }
            AbilityKind::Shield => {
                let charges = self.tuning.ability.shield_charges;
                self.shield_until
                    .insert(id, now_ms + self.tuning.ability.shield_ms);
                if let Some(e) = self.entities.get_mut(&id) {
                    e.shield = charges;
                }
                true
            }
            AbilityKind::RiftSniper => self.fire_rift_beam(id, aim, now_ms),
            AbilityKind::PulseNova => self.fire_nova(id),
            AbilityKind::OrbitalStrike => {
                self.pending.insert(
                    id,
                    PendingTarget {
                        kind: PendingKind::Strike,
                        expires_at: now_ms + self.tuning.ability.strike_window_ms,
                    },
                );
                false
            }
            AbilityKind::LinkedPortals => {
                self.open_portal(id, now_ms);
                false
            }
            AbilityKind::AnnihilationBouncer => self.fire_bouncer(id, aim),
            AbilityKind::VoidSlice => self.fire_slash(id, aim),
        };

        if consumed {
            if let Some(e) = self.entities.get_mut(&id) {
                e.held_item = None;
            }
        }
        info!(
            room_id = %self.id,
            entity_id = id,
            ability = kind.as_str(),
            consumed,
            "ability activated"
        );
    }

    fn spawn_echo(&mut self, owner_id: EntityId, now_ms: u64) -> bool {
        let Some(owner) = self.entities.get(&owner_id) else {
            return false;
        };
        let ability = self.tuning.ability;
        let past = now_ms.saturating_sub(ability.echo_delay_ms);
        // Starts where the owner stood one delay ago, then replays from there.
        let pos = self
            .history
            .get(&owner_id)
            .and_then(|h| h.at_or_before(past))
            .map(|r| r.pos)
            .unwrap_or(owner.pos);
        let name = format!("{} (echo)", owner.name);
        let radius = owner.radius;

        let echo_id = self.alloc_id();
        let mut echo = Entity::new(echo_id, name, pos, radius, ability.echo_hp);
        echo.is_echo = true;
        echo.owner_id = Some(owner_id);
        self.entities.insert(echo_id, echo);
        self.echo_expires_at
            .insert(echo_id, now_ms + ability.echo_lifetime_ms);
        self.events.push(RoomEvent::SpawnEcho {
            echo_id,
            owner_id,
            pos,
        });
        true
    }

    fn spawn_time_bubble(&mut self, id: EntityId, now_ms: u64) -> bool {
        let Some(pos) = self.entities.get(&id).map(|e| e.pos) else {
            return false;
        };
        let zone_id = self.alloc_id();
        self.zones.insert(
            zone_id,
            Zone {
                id: zone_id,
                kind: ZoneKind::TimeBubble,
                pos,
                radius: self.tuning.ability.bubble_radius,
                expires_at: now_ms + self.tuning.ability.bubble_lifetime_ms,
            },
        );
        true
    }

    /// Instant beam to the arena edge. Kills every enemy body it crosses unless a shield
    /// or dash saves it.
    fn fire_rift_beam(&mut self, id: EntityId, aim: Vec2, now_ms: u64) -> bool {
        let Some(caster) = self.entities.get(&id) else {
            return false;
        };
        let from = caster.pos;
        let root_id = caster.root_id();
        let Some(dir) = aim.sub(from).normalized() else {
            return false;
        };
        let to = ray_to_boundary(from, dir, &self.tuning.arena);
        self.events.push(RoomEvent::BeamFire {
            owner_id: id,
            from,
            to,
        });

        let crossed: Vec<(EntityId, i32)> = self
            .entities
            .values()
            .filter(|e| e.alive && e.root_id() != root_id)
            .filter(|e| segment_intersects_circle(from, to, e.pos, e.radius))
            .map(|e| (e.id, e.hp))
            .collect();
        for (target_id, hp) in crossed {
            self.hit_entity(target_id, id, root_id, hp, now_ms);
        }
        true
    }

    /// Evenly spaced ring of bullets around the caster, sharing one burst id.
    fn fire_nova(&mut self, id: EntityId) -> bool {
        let Some(pos) = self.entities.get(&id).map(|e| e.pos) else {
            return false;
        };
        let ability = self.tuning.ability;
        let t = self.tuning.projectile;
        let burst_id = self.alloc_id();
        let count = ability.nova_count.max(1);

        for i in 0..count {
            let angle = TAU * i as f32 / count as f32;
            let dir = Vec2::new(angle.cos(), angle.sin());
            self.spawn_projectile(
                id,
                dir,
                ability.nova_speed,
                ProjectileKind::Nova { burst_id },
                t.radius,
                t.damage,
                t.life_time,
            );
        }
        self.events.push(RoomEvent::NovaFire {
            owner_id: id,
            pos,
            count,
        });
        true
    }

    fn fire_bouncer(&mut self, id: EntityId, aim: Vec2) -> bool {
        let Some(dir) = self.aim_direction(id, aim) else {
            return false;
        };
        let a = self.tuning.ability;
        self.spawn_projectile(
            id,
            dir,
            a.bouncer_speed,
            ProjectileKind::Bouncer {
                bounces_left: a.bouncer_bounces,
            },
            a.bouncer_radius,
            self.tuning.projectile.damage,
            a.bouncer_life_time,
        )
        .is_some()
    }

    fn fire_slash(&mut self, id: EntityId, aim: Vec2) -> bool {
        let Some(dir) = self.aim_direction(id, aim) else {
            return false;
        };
        let a = self.tuning.ability;
        self.spawn_projectile(
            id,
            dir,
            a.slash_speed,
            ProjectileKind::Slash {
                reflects_left: a.slash_reflects,
            },
            a.slash_radius,
            a.slash_damage,
            a.slash_life_time,
        )
        .is_some()
    }

    fn aim_direction(&self, id: EntityId, aim: Vec2) -> Option<Vec2> {
        let origin = self.entities.get(&id)?.pos;
        aim.sub(origin).normalized()
    }

    /// First half of linked portals: endpoint A at the caster, waiting for B.
    fn open_portal(&mut self, id: EntityId, now_ms: u64) {
        let Some(pos) = self.entities.get(&id).map(|e| e.pos) else {
            return;
        };
        let portal_id = self.alloc_id();
        self.portals.insert(
            portal_id,
            PortalPair {
                id: portal_id,
                owner_id: id,
                radius: self.tuning.ability.portal_radius,
                a: pos,
                b: None,
                created_at: now_ms,
                expires_at: None,
            },
        );
        self.pending.insert(
            id,
            PendingTarget {
                kind: PendingKind::Portal { portal_id },
                expires_at: now_ms + self.tuning.ability.portal_window_ms,
            },
        );
    }

    /// Takes the pending activation of the expected kind, dropping it if the caster
    /// no longer qualifies.
    fn take_pending(
        &mut self,
        id: EntityId,
        ability: AbilityKind,
        now_ms: u64,
    ) -> Option<PendingTarget> {
        let pending = *self.pending.get(&id)?;
        if pending.ability() != ability || now_ms >= pending.expires_at {
            return None;
        }
        let still_holding = self
            .entities
            .get(&id)
            .is_some_and(|e| e.alive && e.held_item == Some(ability));
        if !self.is_playing() || !still_holding {
            self.cancel_pending(id);
            debug!(
                room_id = %self.id,
                entity_id = id,
                ability = ability.as_str(),
                "confirmation dropped"
            );
            return None;
        }
        self.pending.remove(&id)
    }

    /// Second half of orbital strike: mark the target point, detonate after the delay.
    pub fn confirm_strike(&mut self, id: EntityId, x: f32, y: f32, now_ms: u64) -> bool {
        let target = Vec2::new(x, y);
        if !target.is_finite() {
            return false;
        }
        if self
            .take_pending(id, AbilityKind::OrbitalStrike, now_ms)
            .is_none()
        {
            return false;
        }

        let a = self.tuning.ability;
        let pos = self.tuning.arena.clamp_circle(target, 0.0);
        let strike_id = self.alloc_id();
        let detonate_at = now_ms + a.strike_delay_ms;
        self.strikes.insert(
            strike_id,
            Strike {
                id: strike_id,
                owner_id: id,
                pos,
                detonate_at,
                radius: a.strike_radius,
                damage: a.strike_damage,
            },
        );
        self.events.push(RoomEvent::StrikeMark {
            strike_id,
            owner_id: id,
            pos,
            radius: a.strike_radius,
            detonate_at,
        });
        if let Some(e) = self.entities.get_mut(&id) {
            e.held_item = None;
        }
        true
    }

    /// Second half of linked portals: place endpoint B and start the link timer.
    pub fn place_portal_b(&mut self, id: EntityId, x: f32, y: f32, now_ms: u64) -> bool {
        let target = Vec2::new(x, y);
        if !target.is_finite() {
            return false;
        }
        let Some(pending) = self.take_pending(id, AbilityKind::LinkedPortals, now_ms) else {
            return false;
        };
        let PendingKind::Portal { portal_id } = pending.kind else {
            return false;
        };

        let link_ms = self.tuning.ability.portal_link_ms;
        let arena = self.tuning.arena;
        let Some(portal) = self.portals.get_mut(&portal_id) else {
            return false;
        };
        portal.b = Some(arena.clamp_circle(target, portal.radius));
        portal.expires_at = Some(now_ms + link_ms);
        if let Some(e) = self.entities.get_mut(&id) {
            e.held_item = None;
        }
        true
    }
}
