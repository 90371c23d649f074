// Per-tick simulation systems. Pure functions over domain state; the room orchestrates them.

pub mod bots;
pub mod movement;
pub mod projectiles;
