// Use-case level inputs/outputs for the room loop.

use crate::domain::tuning::BotDifficulty;
use crate::domain::{ChatMessage, EntityId, MatchPhase, PlayerInput, StateSnapshot};
use std::fmt;
use std::sync::Arc;
use tokio::sync::oneshot;

#[derive(Debug)]
pub enum RoomCommand {
    Join {
        name: String,
        reply: oneshot::Sender<Result<JoinAccepted, RoomError>>,
    },
    Leave {
        player_id: EntityId,
    },
    Input {
        player_id: EntityId,
        input: PlayerInput,
    },
    StrikeConfirm {
        player_id: EntityId,
        x: f32,
        y: f32,
    },
    PortalPlaceB {
        player_id: EntityId,
        x: f32,
        y: f32,
    },
    MatchConfigure {
        player_id: EntityId,
        duration_sec: f64,
    },
    MatchStart {
        player_id: EntityId,
    },
    MatchRestart {
        player_id: EntityId,
    },
    Chat {
        player_id: EntityId,
        text: String,
    },
    Shutdown,
}

#[derive(Debug, Clone)]
pub struct JoinAccepted {
    pub player_id: EntityId,
    pub chat_history: Vec<ChatMessage>,
}

/// Everything a room pushes to its members.
#[derive(Debug, Clone)]
pub enum RoomUpdate {
    Snapshot(Arc<StateSnapshot>),
    Chat(ChatMessage),
    Toast(String),
}

/// Room parameters picked by the creator. Use `sanitized` before handing them to a room.
#[derive(Debug, Clone)]
pub struct RoomSettings {
    pub name: String,
    pub max_players: f64,
    pub is_private: bool,
    pub fill_with_bots: bool,
    pub bot_count: f64,
    pub bot_difficulty: BotDifficulty,
    pub max_hp: f64,
}

/// Validated room parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct RoomConfig {
    pub name: String,
    pub max_players: usize,
    pub is_private: bool,
    pub fill_with_bots: bool,
    pub bot_count: usize,
    pub bot_difficulty: BotDifficulty,
    pub max_hp: i32,
}

pub const MIN_PLAYERS: usize = 2;
pub const MAX_PLAYERS: usize = 12;
pub const DEFAULT_MAX_PLAYERS: usize = 8;
pub const MAX_HP_LIMIT: i32 = 20;
pub const ROOM_NAME_MAX_CHARS: usize = 32;

impl RoomSettings {
    /// Clamps every numeric field into its allowed range; non-finite values fall back to defaults.
    pub fn sanitized(self, default_max_hp: i32) -> RoomConfig {
        let max_players = finite_or(self.max_players, DEFAULT_MAX_PLAYERS as f64)
            .round()
            .clamp(MIN_PLAYERS as f64, MAX_PLAYERS as f64) as usize;
        let bot_count = if self.fill_with_bots {
            finite_or(self.bot_count, 0.0)
                .round()
                .clamp(0.0, (max_players - 1) as f64) as usize
        } else {
            0
        };
        let max_hp = finite_or(self.max_hp, default_max_hp as f64)
            .round()
            .clamp(1.0, MAX_HP_LIMIT as f64) as i32;

        let name: String = self.name.trim().chars().take(ROOM_NAME_MAX_CHARS).collect();
        let name = if name.is_empty() {
            "Arena".to_string()
        } else {
            name
        };

        RoomConfig {
            name,
            max_players,
            is_private: self.is_private,
            fill_with_bots: self.fill_with_bots,
            bot_count,
            bot_difficulty: self.bot_difficulty,
            max_hp,
        }
    }
}

fn finite_or(v: f64, fallback: f64) -> f64 {
    if v.is_finite() { v } else { fallback }
}

/// Directory entry for a room.
#[derive(Debug, Clone, PartialEq)]
pub struct RoomSummary {
    pub room_id: Arc<str>,
    pub name: String,
    pub humans: usize,
    pub bots: usize,
    pub max_players: usize,
    pub is_private: bool,
    pub phase: MatchPhase,
}

/// Errors returned by room and registry operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomError {
    NotFound,
    Full,
    /// The room task stopped between lookup and delivery.
    Closed,
}

impl fmt::Display for RoomError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoomError::NotFound => write!(f, "room not found"),
            RoomError::Full => write!(f, "room is full"),
            RoomError::Closed => write!(f, "room is closed"),
        }
    }
}

impl std::error::Error for RoomError {}
