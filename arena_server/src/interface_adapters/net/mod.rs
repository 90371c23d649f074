// Network adapter modules split by WebSocket clients vs plain HTTP directory routes.

pub mod client;
pub mod directory;

pub use client::{spawn_room_serializer, ws_handler};
pub use directory::{get_room_handler, health_handler, list_rooms_handler};
