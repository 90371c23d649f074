use crate::use_cases::RoomRegistry;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    // Every live room, shared by the socket and HTTP handlers.
    pub room_registry: Arc<RoomRegistry>,
}
