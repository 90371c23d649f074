// Domain layer: core simulation types and rules.

pub mod events;
pub mod geometry;
pub mod input_history;
pub mod ports;
pub mod state;
pub mod systems;
pub mod tuning;

pub use events::{EntitySnapshot, ProjectileSnapshot, RoomEvent, StateSnapshot};
pub use geometry::{Arena, Vec2};
pub use state::{
    AbilityKind, ChatMessage, Entity, EntityId, Keys, MatchPhase, MatchState, PlayerInput,
    Projectile, ProjectileKind,
};
