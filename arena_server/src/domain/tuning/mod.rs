// Gameplay tuning, kept apart from runtime/server configuration.

pub mod ability;
pub mod bot;
pub mod player;
pub mod projectile;

pub use ability::AbilityTuning;
pub use bot::{BotDifficulty, BotTuning};
pub use player::PlayerTuning;
pub use projectile::ProjectileTuning;
