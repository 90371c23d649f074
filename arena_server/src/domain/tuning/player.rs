/// Gameplay tuning for player-controlled (and bot/echo) bodies.
///
/// Keep this separate from runtime/server configuration (tick rates, buffer sizes, etc.).

#[derive(Debug, Clone, Copy)]
pub struct PlayerTuning {
    /// Movement speed in pixels per second.
    pub speed: f32,

    /// World-space collision radius in pixels (server-side hit checks).
    pub radius: f32,

    /// Hit points a body spawns with unless the room overrides it.
    pub default_max_hp: i32,

    /// Delay before a dead player is put back into the arena.
    pub respawn_ms: u64,

    /// Minimum time between two regular shots.
    pub fire_interval_ms: u64,

    /// Spawn points stay this far from the arena walls.
    pub spawn_margin: f32,
}

impl Default for PlayerTuning {
    fn default() -> Self {
        Self {
            speed: 260.0,
            radius: 18.0,
            default_max_hp: 3,
            respawn_ms: 1500,
            fire_interval_ms: 1000 / 6,
            spawn_margin: 60.0,
        }
    }
}
