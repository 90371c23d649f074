// Domain-level simulation entities and input types.

use crate::domain::geometry::Vec2;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub type EntityId = u64;
pub type ProjectileId = u64;

/// Closed set of pickup-granted abilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AbilityKind {
    Echo,
    TimeBubble,
    PhaseDash,
    Shield,
    RiftSniper,
    PulseNova,
    OrbitalStrike,
    LinkedPortals,
    AnnihilationBouncer,
    VoidSlice,
}

impl AbilityKind {
    pub const ALL: [AbilityKind; 10] = [
        AbilityKind::Echo,
        AbilityKind::TimeBubble,
        AbilityKind::PhaseDash,
        AbilityKind::Shield,
        AbilityKind::RiftSniper,
        AbilityKind::PulseNova,
        AbilityKind::OrbitalStrike,
        AbilityKind::LinkedPortals,
        AbilityKind::AnnihilationBouncer,
        AbilityKind::VoidSlice,
    ];

    /// Abilities that keep the item until a second (targeting) message arrives.
    pub fn needs_confirmation(self) -> bool {
        matches!(self, AbilityKind::OrbitalStrike | AbilityKind::LinkedPortals)
    }

    /// The rarest pickup; at most one of these is ever lying on the map.
    pub fn is_rare(self) -> bool {
        matches!(self, AbilityKind::AnnihilationBouncer)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AbilityKind::Echo => "echo",
            AbilityKind::TimeBubble => "time_bubble",
            AbilityKind::PhaseDash => "phase_dash",
            AbilityKind::Shield => "shield",
            AbilityKind::RiftSniper => "rift_sniper",
            AbilityKind::PulseNova => "pulse_nova",
            AbilityKind::OrbitalStrike => "orbital_strike",
            AbilityKind::LinkedPortals => "linked_portals",
            AbilityKind::AnnihilationBouncer => "annihilation_bouncer",
            AbilityKind::VoidSlice => "void_slice",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Keys {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
}

impl Keys {
    /// Raw (un-normalised) movement axis; +y points down the screen.
    pub fn axis(self) -> Vec2 {
        let mut v = Vec2::ZERO;
        if self.up {
            v.y -= 1.0;
        }
        if self.down {
            v.y += 1.0;
        }
        if self.left {
            v.x -= 1.0;
        }
        if self.right {
            v.x += 1.0;
        }
        v
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PlayerInput {
    pub seq: u64,
    /// Client frame time; informational only, the server integrates with its own tick.
    pub dt: f32,
    pub keys: Keys,
    /// Aim point in world coordinates.
    pub aim: Vec2,
    pub shoot: bool,
    pub use_item: bool,
}

#[derive(Debug, Clone)]
pub struct Entity {
    pub id: EntityId,
    pub name: String,
    pub pos: Vec2,
    pub radius: f32,

    // Combat state.
    pub hp: i32,
    pub max_hp: i32,
    pub alive: bool,
    pub kills: u32,
    pub deaths: u32,

    // Echo clones point back at the entity they copy. Lookup only.
    pub is_echo: bool,
    pub owner_id: Option<EntityId>,
    pub is_bot: bool,

    pub held_item: Option<AbilityKind>,
    pub shield: u32,
}

impl Entity {
    pub fn new(id: EntityId, name: String, pos: Vec2, radius: f32, max_hp: i32) -> Self {
        Self {
            id,
            name,
            pos,
            radius,
            hp: max_hp,
            max_hp,
            alive: true,
            kills: 0,
            deaths: 0,
            is_echo: false,
            owner_id: None,
            is_bot: false,
            held_item: None,
            shield: 0,
        }
    }

    /// The human/bot credited for anything this entity does.
    pub fn root_id(&self) -> EntityId {
        if self.is_echo {
            self.owner_id.unwrap_or(self.id)
        } else {
            self.id
        }
    }

    pub fn is_human(&self) -> bool {
        !self.is_bot && !self.is_echo
    }
}

/// Behaviour-specific projectile state; only the variant in use carries its fields.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProjectileKind {
    Standard,
    /// One bullet of a pulse nova burst. Bullets of a burst share a per-target hit window.
    Nova { burst_id: u64 },
    /// Bounces off walls, growing faster and deadlier each time. Can hit its own root.
    Bouncer { bounces_left: u32 },
    /// Melee sweep that deflects other projectiles.
    Slash { reflects_left: u32 },
}

impl ProjectileKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectileKind::Standard => "standard",
            ProjectileKind::Nova { .. } => "nova",
            ProjectileKind::Bouncer { .. } => "bouncer",
            ProjectileKind::Slash { .. } => "slash",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PortalBudget {
    pub jumps_left: u32,
    pub cooldown_ms: u64,
    pub ready_at: u64,
}

#[derive(Debug, Clone)]
pub struct Projectile {
    pub id: ProjectileId,
    pub owner_id: EntityId,
    pub root_id: EntityId,
    pub pos: Vec2,
    pub vel: Vec2,
    pub ttl: f32,
    pub radius: f32,
    pub damage: i32,
    pub kind: ProjectileKind,
    /// Target id -> time before which that target cannot be hit again.
    pub rehit_until: HashMap<EntityId, u64>,
    pub portal: PortalBudget,
}

impl Projectile {
    pub fn is_slash(&self) -> bool {
        matches!(self.kind, ProjectileKind::Slash { .. })
    }

    pub fn is_bouncer(&self) -> bool {
        matches!(self.kind, ProjectileKind::Bouncer { .. })
    }

    /// Bouncers and slashes stay alive after hitting someone.
    pub fn survives_hits(&self) -> bool {
        self.is_slash() || self.is_bouncer()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Pickup {
    pub id: u64,
    pub kind: AbilityKind,
    pub pos: Vec2,
    pub radius: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ZoneKind {
    TimeBubble,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Zone {
    pub id: u64,
    pub kind: ZoneKind,
    pub pos: Vec2,
    pub radius: f32,
    pub expires_at: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PortalPair {
    pub id: u64,
    pub owner_id: EntityId,
    pub radius: f32,
    pub a: Vec2,
    pub b: Option<Vec2>,
    pub created_at: u64,
    pub expires_at: Option<u64>,
}

impl PortalPair {
    /// Both endpoints exist and the link has not run out.
    pub fn linked_ends(&self, now_ms: u64) -> Option<(Vec2, Vec2)> {
        let b = self.b?;
        match self.expires_at {
            Some(at) if now_ms >= at => None,
            _ => Some((self.a, b)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingKind {
    Strike,
    Portal { portal_id: u64 },
}

/// A two-phase ability waiting for its confirmation message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingTarget {
    pub kind: PendingKind,
    pub expires_at: u64,
}

impl PendingTarget {
    pub fn ability(&self) -> AbilityKind {
        match self.kind {
            PendingKind::Strike => AbilityKind::OrbitalStrike,
            PendingKind::Portal { .. } => AbilityKind::LinkedPortals,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Strike {
    pub id: u64,
    pub owner_id: EntityId,
    pub pos: Vec2,
    pub detonate_at: u64,
    pub radius: f32,
    pub damage: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchPhase {
    Lobby,
    Playing,
    Ended,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchState {
    pub phase: MatchPhase,
    pub host_id: Option<EntityId>,
    pub started_at: Option<u64>,
    pub ends_at: Option<u64>,
    pub duration_sec: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub id: u64,
    pub from_id: EntityId,
    pub name: String,
    pub text: String,
    pub at: u64,
}
