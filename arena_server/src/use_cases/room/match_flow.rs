// Lobby -> playing -> ended, host controls and world reset.

use super::{MAX_MATCH_DURATION_SEC, MIN_MATCH_DURATION_SEC, Room};
use crate::domain::state::{EntityId, MatchPhase};
use tracing::info;

impl Room {
    fn is_host(&self, id: EntityId) -> bool {
        self.match_state.host_id == Some(id)
    }

    /// Host-only, outside a running match. Durations are clamped to 1..15 minutes.
    pub fn configure_match(&mut self, by: EntityId, duration_sec: f64) -> bool {
        if !self.is_host(by) || self.is_playing() || !duration_sec.is_finite() {
            return false;
        }
        let duration = duration_sec
            .round()
            .clamp(MIN_MATCH_DURATION_SEC as f64, MAX_MATCH_DURATION_SEC as f64)
            as u32;
        self.match_state.duration_sec = duration;
        self.toast(format!("Match length set to {}", format_duration(duration)));
        true
    }

    pub fn start_match(&mut self, by: EntityId, now_ms: u64) -> bool {
        if !self.is_host(by) || self.match_state.phase != MatchPhase::Lobby {
            return false;
        }
        self.reset_world();
        self.match_state.phase = MatchPhase::Playing;
        self.match_state.started_at = Some(now_ms);
        self.match_state.ends_at =
            Some(now_ms + u64::from(self.match_state.duration_sec) * 1000);
        info!(room_id = %self.id, duration_sec = self.match_state.duration_sec, "match started");
        self.toast("Match started");
        true
    }

    /// Host-only from any phase; always lands in a fresh lobby.
    pub fn restart_match(&mut self, by: EntityId) -> bool {
        if !self.is_host(by) {
            return false;
        }
        self.reset_world();
        self.match_state.phase = MatchPhase::Lobby;
        self.match_state.started_at = None;
        self.match_state.ends_at = None;
        info!(room_id = %self.id, "match reset to lobby");
        self.toast("Match reset");
        true
    }

    pub(super) fn check_match_end(&mut self, now_ms: u64) {
        if !self.is_playing() {
            return;
        }
        let Some(ends_at) = self.match_state.ends_at else {
            return;
        };
        if now_ms < ends_at {
            return;
        }

        self.match_state.phase = MatchPhase::Ended;
        let winner = self
            .entities
            .values()
            .filter(|e| !e.is_echo)
            .max_by(|a, b| a.kills.cmp(&b.kills).then(b.id.cmp(&a.id)))
            .map(|e| (e.name.clone(), e.kills));
        info!(room_id = %self.id, "match ended");
        match winner {
            Some((name, kills)) => {
                self.toast(format!("Match over: {name} wins with {kills} kills"))
            }
            None => self.toast("Match over"),
        }
    }

    /// Hands the host role to the longest-present remaining human, if any.
    pub(super) fn reassign_host(&mut self) {
        let next = self
            .entities
            .values()
            .find(|e| e.is_human())
            .map(|e| (e.id, e.name.clone()));
        self.match_state.host_id = next.as_ref().map(|(id, _)| *id);
        if let Some((id, name)) = next {
            info!(room_id = %self.id, host_id = id, "host reassigned");
            self.toast(format!("{name} is now the host"));
        }
    }

    /// Clears every transient object and puts all humans and bots back at full health.
    fn reset_world(&mut self) {
        let echoes: Vec<EntityId> = self
            .entities
            .values()
            .filter(|e| e.is_echo)
            .map(|e| e.id)
            .collect();
        for echo_id in echoes {
            self.despawn_echo(echo_id);
        }

        self.projectiles.clear();
        self.zones.clear();
        self.strikes.clear();
        self.pending.clear();
        self.portals.clear();
        self.portal_cooldowns.clear();
        self.dash_until.clear();
        self.shield_until.clear();
        self.nova_hits.clear();
        self.last_shot_at.clear();
        self.history.clear();
        self.timers.clear();
        self.events.clear();
        for brain in self.bots.values_mut() {
            brain.reset();
        }

        let ids: Vec<EntityId> = self.entities.keys().copied().collect();
        for id in ids {
            let pos = self.spawn_point();
            if let Some(e) = self.entities.get_mut(&id) {
                e.pos = pos;
                e.hp = e.max_hp;
                e.alive = true;
                e.kills = 0;
                e.deaths = 0;
                e.held_item = None;
                e.shield = 0;
            }
        }

        self.refill_pickups();
    }
}

fn format_duration(sec: u32) -> String {
    match (sec / 60, sec % 60) {
        (m, 0) => format!("{m} min"),
        (m, s) => format!("{m}:{s:02}"),
    }
}
