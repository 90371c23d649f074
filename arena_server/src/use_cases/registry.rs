// Room directory: spawns room tasks, hands out their channels and forgets rooms once they close.

use super::game::room_task;
use super::room::{Room, RoomTuning};
use super::types::{JoinAccepted, RoomCommand, RoomError, RoomSettings, RoomSummary, RoomUpdate};
use crate::domain::ports::Clock;
use axum::extract::ws::Utf8Bytes;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{RwLock, broadcast, mpsc, oneshot, watch};
use tracing::info;
use uuid::Uuid;

const ROOM_ID_LEN: usize = 6;

/// Shared configuration for spawning rooms.
#[derive(Debug, Clone)]
pub struct RegistrySettings {
    /// Capacity for inbound room commands.
    pub command_channel_capacity: usize,
    /// Capacity for broadcast room updates.
    pub update_broadcast_capacity: usize,
    /// Fixed tick interval for every room loop.
    pub tick_interval: Duration,
    pub tuning: RoomTuning,
}

/// Per-room channels.
#[derive(Clone)]
pub struct RoomHandle {
    /// Identifier clients use to target this room.
    pub room_id: Arc<str>,
    /// Sender for commands into the room task.
    pub command_tx: mpsc::Sender<RoomCommand>,
    /// Broadcast sender for raw room updates.
    pub update_tx: broadcast::Sender<RoomUpdate>,
    /// Broadcast sender for serialized room updates.
    pub update_bytes_tx: broadcast::Sender<Utf8Bytes>,
    /// Watch sender holding the latest serialized state snapshot.
    pub latest_state_tx: watch::Sender<Utf8Bytes>,
    summary_rx: watch::Receiver<RoomSummary>,
}

impl RoomHandle {
    /// Directory entry as of the last tick.
    pub fn summary(&self) -> RoomSummary {
        self.summary_rx.borrow().clone()
    }
}

/// Thread-safe registry for active rooms.
pub struct RoomRegistry {
    settings: RegistrySettings,
    clock: Arc<dyn Clock>,
    rooms: RwLock<HashMap<String, RoomHandle>>,
}

impl RoomRegistry {
    pub fn new(settings: RegistrySettings, clock: Arc<dyn Clock>) -> Self {
        Self {
            settings,
            clock,
            rooms: RwLock::new(HashMap::new()),
        }
    }

    /// Creates a room and spawns its task. The room deregisters itself when the task ends.
    pub async fn create_room(self: &Arc<Self>, settings: RoomSettings) -> RoomHandle {
        let config = settings.sanitized(self.settings.tuning.player.default_max_hp);

        let mut rooms = self.rooms.write().await;
        let room_id = loop {
            let candidate = new_room_id();
            if !rooms.contains_key(&candidate) {
                break candidate;
            }
        };
        let room_id: Arc<str> = Arc::from(room_id);

        let room = Room::new(
            room_id.clone(),
            config.clone(),
            self.settings.tuning,
            rand::random(),
        );

        // Channel wiring for the room loop.
        let (command_tx, command_rx) =
            mpsc::channel::<RoomCommand>(self.settings.command_channel_capacity);
        let (update_tx, _update_rx) =
            broadcast::channel::<RoomUpdate>(self.settings.update_broadcast_capacity);
        let (update_bytes_tx, _update_bytes_rx) =
            broadcast::channel::<Utf8Bytes>(self.settings.update_broadcast_capacity);
        let (latest_state_tx, _latest_state_rx) = watch::channel::<Utf8Bytes>(Utf8Bytes::from(""));
        let (summary_tx, summary_rx) = watch::channel(room.summary());

        let handle = RoomHandle {
            room_id: room_id.clone(),
            command_tx,
            update_tx: update_tx.clone(),
            update_bytes_tx,
            latest_state_tx,
            summary_rx,
        };
        rooms.insert(room_id.to_string(), handle.clone());
        drop(rooms);

        let registry = Arc::clone(self);
        let tick_interval = self.settings.tick_interval;
        let clock = Arc::clone(&self.clock);
        let task_room_id = room_id.clone();
        tokio::spawn(async move {
            room_task(room, command_rx, update_tx, summary_tx, tick_interval, clock).await;
            registry.remove_room(&task_room_id).await;
        });

        info!(
            room_id = %room_id,
            name = %config.name,
            max_players = config.max_players,
            bots = config.bot_count,
            private = config.is_private,
            "room created"
        );
        handle
    }

    /// Returns a room handle for the provided id, if it exists. Ids are case-insensitive.
    pub async fn get_room(&self, room_id: &str) -> Option<RoomHandle> {
        let rooms = self.rooms.read().await;
        rooms.get(&normalize_room_id(room_id)).cloned()
    }

    /// Adds a human to a room and waits for the room task to accept them.
    pub async fn join_room(
        &self,
        room_id: &str,
        name: String,
    ) -> Result<(RoomHandle, JoinAccepted), RoomError> {
        let handle = self.get_room(room_id).await.ok_or(RoomError::NotFound)?;
        let (reply_tx, reply_rx) = oneshot::channel();
        handle
            .command_tx
            .send(RoomCommand::Join {
                name,
                reply: reply_tx,
            })
            .await
            .map_err(|_| RoomError::Closed)?;
        let accepted = reply_rx.await.map_err(|_| RoomError::Closed)??;
        Ok((handle, accepted))
    }

    /// Public rooms, ordered by id.
    pub async fn list_rooms(&self) -> Vec<RoomSummary> {
        let rooms = self.rooms.read().await;
        let mut list: Vec<RoomSummary> = rooms
            .values()
            .map(RoomHandle::summary)
            .filter(|s| !s.is_private)
            .collect();
        list.sort_by(|a, b| a.room_id.cmp(&b.room_id));
        list
    }

    pub async fn room_count(&self) -> usize {
        self.rooms.read().await.len()
    }

    async fn remove_room(&self, room_id: &str) {
        let removed = self.rooms.write().await.remove(room_id);
        if removed.is_some() {
            info!(room_id, "room removed");
        }
    }
}

fn new_room_id() -> String {
    Uuid::new_v4().simple().to_string()[..ROOM_ID_LEN].to_ascii_uppercase()
}

fn normalize_room_id(raw: &str) -> String {
    raw.trim().to_ascii_uppercase()
}
