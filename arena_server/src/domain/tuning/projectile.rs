/// Gameplay tuning for the regular bullet and the shared projectile rules.

#[derive(Debug, Clone, Copy)]
pub struct ProjectileTuning {
    /// Initial projectile speed in pixels per second.
    pub speed: f32,

    /// Lifetime in seconds before the projectile is despawned.
    pub life_time: f32,

    /// World-space collision radius in pixels.
    pub radius: f32,

    /// Hit points removed per hit.
    pub damage: i32,

    /// Plain projectiles are culled once they are this far outside the arena.
    pub cull_margin: f32,

    /// Per-target cooldown for projectiles that survive a hit (bouncer, slash).
    pub rehit_ms: u64,

    /// Portal jumps a regular projectile may take, and the wait between them.
    pub portal_jumps: u32,
    pub portal_cooldown_ms: u64,

    /// Slash projectiles get their own, larger portal budget.
    pub slash_portal_jumps: u32,
    pub slash_portal_cooldown_ms: u64,

    /// Deflected projectiles leave at this multiple of their old speed.
    pub deflect_speed_factor: f32,

    /// Deflected projectiles live at least this long.
    pub deflect_min_ttl: f32,
}

impl Default for ProjectileTuning {
    fn default() -> Self {
        Self {
            speed: 520.0,
            life_time: 1.4,
            radius: 5.0,
            damage: 1,
            cull_margin: 40.0,
            rehit_ms: 250,
            portal_jumps: 2,
            portal_cooldown_ms: 250,
            slash_portal_jumps: 4,
            slash_portal_cooldown_ms: 150,
            deflect_speed_factor: 1.2,
            deflect_min_ttl: 0.6,
        }
    }
}
