/// Gameplay tuning for pickup-granted abilities and the pickups themselves.

#[derive(Debug, Clone, Copy)]
pub struct AbilityTuning {
    // Echo
    pub echo_delay_ms: u64,
    pub echo_lifetime_ms: u64,
    pub echo_hp: i32,

    // Time bubble
    pub bubble_radius: f32,
    pub bubble_lifetime_ms: u64,
    pub bubble_move_multiplier: f32,
    pub bubble_projectile_multiplier: f32,

    // Phase dash
    pub dash_ms: u64,
    pub dash_speed_multiplier: f32,

    // Shield
    pub shield_charges: u32,
    pub shield_ms: u64,

    // Pulse nova
    pub nova_count: u32,
    pub nova_speed: f32,
    pub nova_hit_window_ms: u64,

    // Orbital strike
    pub strike_window_ms: u64,
    pub strike_delay_ms: u64,
    pub strike_radius: f32,
    pub strike_damage: i32,

    // Linked portals
    pub portal_window_ms: u64,
    pub portal_link_ms: u64,
    pub portal_radius: f32,
    pub portal_entity_cooldown_ms: u64,

    // Annihilation bouncer
    pub bouncer_bounces: u32,
    pub bouncer_speed: f32,
    pub bouncer_max_speed: f32,
    pub bouncer_radius: f32,
    pub bouncer_life_time: f32,
    /// Radius multiplier applied on every bounce.
    pub bouncer_shrink: f32,

    // Void slice
    pub slash_reflects: u32,
    pub slash_damage: i32,
    pub slash_speed: f32,
    pub slash_radius: f32,
    pub slash_life_time: f32,

    // Pickups
    pub pickup_radius: f32,
    pub pickup_slots: usize,
    pub pickup_margin: f32,
    pub pickup_respawn_ms: u64,
    pub rare_pickup_respawn_ms: u64,
}

impl Default for AbilityTuning {
    fn default() -> Self {
        Self {
            echo_delay_ms: 900,
            echo_lifetime_ms: 3500,
            echo_hp: 1,

            bubble_radius: 140.0,
            bubble_lifetime_ms: 10_000,
            bubble_move_multiplier: 0.5,
            bubble_projectile_multiplier: 0.6,

            dash_ms: 250,
            dash_speed_multiplier: 2.2,

            shield_charges: 2,
            shield_ms: 5000,

            nova_count: 18,
            nova_speed: 420.0,
            nova_hit_window_ms: 150,

            strike_window_ms: 5000,
            strike_delay_ms: 1000,
            strike_radius: 120.0,
            strike_damage: 2,

            portal_window_ms: 5000,
            portal_link_ms: 10_000,
            portal_radius: 36.0,
            portal_entity_cooldown_ms: 700,

            bouncer_bounces: 6,
            bouncer_speed: 360.0,
            bouncer_max_speed: 1800.0,
            bouncer_radius: 14.0,
            bouncer_life_time: 8.0,
            bouncer_shrink: 0.8,

            slash_reflects: 20,
            slash_damage: 5,
            slash_speed: 640.0,
            slash_radius: 34.0,
            slash_life_time: 0.35,

            pickup_radius: 16.0,
            pickup_slots: 6,
            pickup_margin: 80.0,
            pickup_respawn_ms: 6000,
            rare_pickup_respawn_ms: 15_000,
        }
    }
}
