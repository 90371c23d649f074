use super::{Deferred, Room, Timer};
use crate::domain::geometry::circles_overlap;
use crate::domain::state::{AbilityKind, Pickup};
use rand::Rng;
use rand::seq::SliceRandom;
use tracing::debug;

impl Room {
    fn rare_on_map(&self) -> bool {
        self.pickups.values().any(|p| p.kind.is_rare())
    }

    fn random_pickup_kind(&mut self) -> AbilityKind {
        let kind = AbilityKind::ALL[self.rng.gen_range(0..AbilityKind::ALL.len())];
        if !kind.is_rare() || !self.rare_on_map() {
            return kind;
        }
        let common: Vec<AbilityKind> = AbilityKind::ALL
            .into_iter()
            .filter(|k| !k.is_rare())
            .collect();
        common
            .choose(&mut self.rng)
            .copied()
            .unwrap_or(AbilityKind::Shield)
    }

    /// Places one pickup if a slot is free. A second rare pickup is swapped for a common one.
    pub(super) fn spawn_pickup(&mut self, kind: AbilityKind) {
        if self.pickups.len() >= self.tuning.ability.pickup_slots {
            return;
        }
        let kind = if kind.is_rare() && self.rare_on_map() {
            self.random_pickup_kind()
        } else {
            kind
        };
        let pos = self.random_point(self.tuning.ability.pickup_margin);
        let id = self.alloc_id();
        self.pickups.insert(
            id,
            Pickup {
                id,
                kind,
                pos,
                radius: self.tuning.ability.pickup_radius,
            },
        );
    }

    pub(super) fn refill_pickups(&mut self) {
        while self.pickups.len() < self.tuning.ability.pickup_slots {
            let kind = self.random_pickup_kind();
            self.spawn_pickup(kind);
        }
    }

    /// Living humans with an empty slot grab pickups they touch; bots and echoes never do.
    pub(super) fn collect_pickups(&mut self, now_ms: u64) {
        if !self.is_playing() {
            return;
        }

        let ids: Vec<u64> = self.pickups.keys().copied().collect();
        for pickup_id in ids {
            let Some(pickup) = self.pickups.get(&pickup_id) else {
                continue;
            };
            let (pos, radius, kind) = (pickup.pos, pickup.radius, pickup.kind);

            let Some(taker) = self.entities.values_mut().find(|e| {
                e.alive
                    && e.is_human()
                    && e.held_item.is_none()
                    && circles_overlap(e.pos, e.radius, pos, radius)
            }) else {
                continue;
            };
            taker.held_item = Some(kind);
            let taker_id = taker.id;

            self.pickups.remove(&pickup_id);
            let a = self.tuning.ability;
            let delay = if kind.is_rare() {
                a.rare_pickup_respawn_ms
            } else {
                a.pickup_respawn_ms
            };
            self.timers.push(Timer {
                due: now_ms + delay,
                action: Deferred::RestockPickup { kind },
            });
            debug!(
                room_id = %self.id,
                entity_id = taker_id,
                item = kind.as_str(),
                "pickup collected"
            );
        }
    }
}
