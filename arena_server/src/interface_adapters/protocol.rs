// Wire protocol DTOs and conversions for public arena server messages.

use crate::domain::events::{EntitySnapshot, ProjectileSnapshot, RoomEvent, StateSnapshot};
use crate::domain::state::{Pickup, PortalPair, Zone, ZoneKind};
use crate::domain::tuning::BotDifficulty;
use crate::domain::{AbilityKind, ChatMessage, Keys, MatchPhase, MatchState, PlayerInput, Vec2};
use crate::use_cases::{RoomSettings, RoomSummary, RoomUpdate};
use serde::{Deserialize, Serialize};

/// Messages the server sends to connected clients over the WebSocket.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "data")]
pub enum ServerMessage {
    RoomCreated { room_id: String },
    // Sent once the room accepted the player; `player_id` is the controlled entity.
    RoomJoined { room_id: String, player_id: u64 },
    RoomLeft { room_id: String },
    RoomList(Vec<RoomSummaryDto>),
    Error { message: String },
    // Full room state for one tick.
    State(StateDto),
    Chat(ChatMessageDto),
    ChatHistory(Vec<ChatMessageDto>),
    Toast { text: String },
    Pong { t: f64 },
}

impl From<&RoomUpdate> for ServerMessage {
    fn from(update: &RoomUpdate) -> Self {
        match update {
            RoomUpdate::Snapshot(snapshot) => {
                ServerMessage::State(StateDto::from(snapshot.as_ref()))
            }
            RoomUpdate::Chat(msg) => ServerMessage::Chat(ChatMessageDto::from(msg)),
            RoomUpdate::Toast(text) => ServerMessage::Toast { text: text.clone() },
        }
    }
}

/// Messages the client sends to the server over the WebSocket.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum ClientMessage {
    // Directory commands, valid any time.
    CreateRoom(CreateRoomPayload),
    JoinRoom(JoinRoomPayload),
    LeaveRoom,
    ListRooms,
    Ping(PingPayload),

    // In-room commands.
    Input(PlayerInputDto),
    StrikeConfirm(PointDto),
    PortalPlaceB(PointDto),
    MatchConfigure(MatchConfigurePayload),
    MatchStart,
    MatchRestart,
    ChatSend(ChatSendPayload),
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateRoomPayload {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub player_name: String,
    #[serde(default)]
    pub max_players: Option<f64>,
    #[serde(default)]
    pub is_private: bool,
    #[serde(default)]
    pub fill_with_bots: bool,
    #[serde(default)]
    pub bot_count: Option<f64>,
    #[serde(default)]
    pub bot_difficulty: BotDifficulty,
    #[serde(default)]
    pub max_hp: Option<f64>,
}

impl CreateRoomPayload {
    /// Missing numbers become NaN so the room falls back to its defaults.
    pub fn settings(&self) -> RoomSettings {
        RoomSettings {
            name: self.name.clone(),
            max_players: self.max_players.unwrap_or(f64::NAN),
            is_private: self.is_private,
            fill_with_bots: self.fill_with_bots,
            bot_count: self.bot_count.unwrap_or(f64::NAN),
            bot_difficulty: self.bot_difficulty,
            max_hp: self.max_hp.unwrap_or(f64::NAN),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct JoinRoomPayload {
    pub room_id: String,
    #[serde(default)]
    pub player_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PingPayload {
    #[serde(default)]
    pub t: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MatchConfigurePayload {
    pub duration_sec: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatSendPayload {
    pub text: String,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct PointDto {
    #[serde(default)]
    pub x: f32,
    #[serde(default)]
    pub y: f32,
}

impl From<Vec2> for PointDto {
    fn from(v: Vec2) -> Self {
        Self { x: v.x, y: v.y }
    }
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct KeysDto {
    #[serde(default)]
    pub up: bool,
    #[serde(default)]
    pub down: bool,
    #[serde(default)]
    pub left: bool,
    #[serde(default)]
    pub right: bool,
}

/// Per-frame input payload sent by the client while in a room.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlayerInputDto {
    #[serde(default)]
    pub seq: u64,
    #[serde(default)]
    pub dt: f32,
    #[serde(default)]
    pub keys: KeysDto,
    #[serde(default)]
    pub aim: PointDto,
    #[serde(default)]
    pub shoot: bool,
    #[serde(default)]
    pub use_item: bool,
}

impl From<PlayerInputDto> for PlayerInput {
    fn from(input: PlayerInputDto) -> Self {
        Self {
            seq: input.seq,
            dt: input.dt,
            keys: Keys {
                up: input.keys.up,
                down: input.keys.down,
                left: input.keys.left,
                right: input.keys.right,
            },
            aim: Vec2::new(input.aim.x, input.aim.y),
            shoot: input.shoot,
            use_item: input.use_item,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RoomSummaryDto {
    pub room_id: String,
    pub name: String,
    pub players: usize,
    pub humans: usize,
    pub bots: usize,
    pub max_players: usize,
    pub phase: MatchPhase,
}

impl From<RoomSummary> for RoomSummaryDto {
    fn from(s: RoomSummary) -> Self {
        Self {
            room_id: s.room_id.to_string(),
            name: s.name,
            players: s.humans + s.bots,
            humans: s.humans,
            bots: s.bots,
            max_players: s.max_players,
            phase: s.phase,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatMessageDto {
    pub id: u64,
    pub from_id: u64,
    pub name: String,
    pub text: String,
    pub at: u64,
}

impl From<&ChatMessage> for ChatMessageDto {
    fn from(m: &ChatMessage) -> Self {
        Self {
            id: m.id,
            from_id: m.from_id,
            name: m.name.clone(),
            text: m.text.clone(),
            at: m.at,
        }
    }
}

/// Snapshot of a room sent to every member on each tick.
#[derive(Debug, Clone, Serialize)]
pub struct StateDto {
    pub t: u64,
    pub tick: u64,
    pub room_id: String,
    pub entities: Vec<EntityStateDto>,
    pub projectiles: Vec<ProjectileStateDto>,
    pub events: Vec<EventDto>,
    pub pickups: Vec<PickupDto>,
    pub zones: Vec<ZoneDto>,
    pub portals: Vec<PortalDto>,
    #[serde(rename = "match")]
    pub match_state: MatchStateDto,
}

impl From<&StateSnapshot> for StateDto {
    fn from(s: &StateSnapshot) -> Self {
        Self {
            t: s.t,
            tick: s.tick,
            room_id: s.room_id.to_string(),
            entities: s.entities.iter().map(EntityStateDto::from).collect(),
            projectiles: s
                .projectiles
                .iter()
                .map(ProjectileStateDto::from)
                .collect(),
            events: s.events.iter().map(EventDto::from).collect(),
            pickups: s.pickups.iter().map(PickupDto::from).collect(),
            zones: s.zones.iter().map(ZoneDto::from).collect(),
            portals: s.portals.iter().map(PortalDto::from).collect(),
            match_state: MatchStateDto::from(&s.match_state),
        }
    }
}

/// Flattened entity state for wire transmission.
#[derive(Debug, Clone, Serialize)]
pub struct EntityStateDto {
    pub id: u64,
    pub name: String,
    pub x: f32,
    pub y: f32,
    pub radius: f32,
    pub hp: i32,
    pub max_hp: i32,
    pub alive: bool,
    pub kills: u32,
    pub deaths: u32,
    pub is_echo: bool,
    pub owner_id: Option<u64>,
    pub is_bot: bool,
    pub held_item: Option<AbilityKind>,
    pub shield: u32,
    pub phased: bool,
}

impl From<&EntitySnapshot> for EntityStateDto {
    fn from(e: &EntitySnapshot) -> Self {
        Self {
            id: e.id,
            name: e.name.clone(),
            x: e.x,
            y: e.y,
            radius: e.radius,
            hp: e.hp,
            max_hp: e.max_hp,
            alive: e.alive,
            kills: e.kills,
            deaths: e.deaths,
            is_echo: e.is_echo,
            owner_id: e.owner_id,
            is_bot: e.is_bot,
            held_item: e.held_item,
            shield: e.shield,
            phased: e.phased,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ProjectileStateDto {
    pub id: u64,
    pub owner_id: u64,
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub radius: f32,
    pub kind: &'static str,
}

impl From<&ProjectileSnapshot> for ProjectileStateDto {
    fn from(p: &ProjectileSnapshot) -> Self {
        Self {
            id: p.id,
            owner_id: p.owner_id,
            x: p.x,
            y: p.y,
            vx: p.vx,
            vy: p.vy,
            radius: p.radius,
            kind: p.kind,
        }
    }
}

/// Gameplay events, tagged by a snake_case `type` inside the state's `events` array.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventDto {
    Hit {
        target_id: u64,
        by_id: u64,
        by_root_id: u64,
        damage: i32,
        hp: i32,
        x: f32,
        y: f32,
    },
    Death {
        target_id: u64,
        by_root_id: u64,
        x: f32,
        y: f32,
    },
    SpawnEcho {
        echo_id: u64,
        owner_id: u64,
        x: f32,
        y: f32,
    },
    BeamFire {
        owner_id: u64,
        from: PointDto,
        to: PointDto,
    },
    ShieldHit {
        target_id: u64,
        charges_left: u32,
    },
    ShieldBreak {
        target_id: u64,
    },
    NovaFire {
        owner_id: u64,
        x: f32,
        y: f32,
        count: u32,
    },
    StrikeMark {
        strike_id: u64,
        owner_id: u64,
        x: f32,
        y: f32,
        radius: f32,
        detonate_at: u64,
    },
    StrikeBoom {
        strike_id: u64,
        owner_id: u64,
        x: f32,
        y: f32,
        radius: f32,
    },
}

impl From<&RoomEvent> for EventDto {
    fn from(e: &RoomEvent) -> Self {
        match *e {
            RoomEvent::Hit {
                target_id,
                by_id,
                by_root_id,
                damage,
                hp,
                pos,
            } => EventDto::Hit {
                target_id,
                by_id,
                by_root_id,
                damage,
                hp,
                x: pos.x,
                y: pos.y,
            },
            RoomEvent::Death {
                target_id,
                by_root_id,
                pos,
            } => EventDto::Death {
                target_id,
                by_root_id,
                x: pos.x,
                y: pos.y,
            },
            RoomEvent::SpawnEcho {
                echo_id,
                owner_id,
                pos,
            } => EventDto::SpawnEcho {
                echo_id,
                owner_id,
                x: pos.x,
                y: pos.y,
            },
            RoomEvent::BeamFire { owner_id, from, to } => EventDto::BeamFire {
                owner_id,
                from: from.into(),
                to: to.into(),
            },
            RoomEvent::ShieldHit {
                target_id,
                charges_left,
            } => EventDto::ShieldHit {
                target_id,
                charges_left,
            },
            RoomEvent::ShieldBreak { target_id } => EventDto::ShieldBreak { target_id },
            RoomEvent::NovaFire {
                owner_id,
                pos,
                count,
            } => EventDto::NovaFire {
                owner_id,
                x: pos.x,
                y: pos.y,
                count,
            },
            RoomEvent::StrikeMark {
                strike_id,
                owner_id,
                pos,
                radius,
                detonate_at,
            } => EventDto::StrikeMark {
                strike_id,
                owner_id,
                x: pos.x,
                y: pos.y,
                radius,
                detonate_at,
            },
            RoomEvent::StrikeBoom {
                strike_id,
                owner_id,
                pos,
                radius,
            } => EventDto::StrikeBoom {
                strike_id,
                owner_id,
                x: pos.x,
                y: pos.y,
                radius,
            },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PickupDto {
    pub id: u64,
    pub kind: AbilityKind,
    pub x: f32,
    pub y: f32,
    pub radius: f32,
}

impl From<&Pickup> for PickupDto {
    fn from(p: &Pickup) -> Self {
        Self {
            id: p.id,
            kind: p.kind,
            x: p.pos.x,
            y: p.pos.y,
            radius: p.radius,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ZoneDto {
    pub id: u64,
    pub kind: ZoneKind,
    pub x: f32,
    pub y: f32,
    pub radius: f32,
    pub expires_at: u64,
}

impl From<&Zone> for ZoneDto {
    fn from(z: &Zone) -> Self {
        Self {
            id: z.id,
            kind: z.kind,
            x: z.pos.x,
            y: z.pos.y,
            radius: z.radius,
            expires_at: z.expires_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PortalDto {
    pub id: u64,
    pub owner_id: u64,
    pub radius: f32,
    pub a: PointDto,
    pub b: Option<PointDto>,
    pub expires_at: Option<u64>,
}

impl From<&PortalPair> for PortalDto {
    fn from(p: &PortalPair) -> Self {
        Self {
            id: p.id,
            owner_id: p.owner_id,
            radius: p.radius,
            a: p.a.into(),
            b: p.b.map(PointDto::from),
            expires_at: p.expires_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MatchStateDto {
    pub phase: MatchPhase,
    pub host_id: Option<u64>,
    pub started_at: Option<u64>,
    pub ends_at: Option<u64>,
    pub duration_sec: u32,
}

impl From<&MatchState> for MatchStateDto {
    fn from(m: &MatchState) -> Self {
        Self {
            phase: m.phase,
            host_id: m.host_id,
            started_at: m.started_at,
            ends_at: m.ends_at,
            duration_sec: m.duration_sec,
        }
    }
}
