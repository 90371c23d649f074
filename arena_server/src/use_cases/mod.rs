// Use cases layer: room simulation and the workflows around it.

pub mod game;
pub mod registry;
pub mod room;
pub mod types;

pub use registry::{RegistrySettings, RoomHandle, RoomRegistry};
pub use room::{Room, RoomTuning};
pub use types::{
    JoinAccepted, RoomCommand, RoomConfig, RoomError, RoomSettings, RoomSummary, RoomUpdate,
};
