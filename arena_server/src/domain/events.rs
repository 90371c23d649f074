// Per-tick gameplay events and the snapshot handed to the broadcast layer.

use crate::domain::geometry::Vec2;
use crate::domain::state::{
    AbilityKind, Entity, EntityId, MatchState, Pickup, PortalPair, Projectile, ProjectileId, Zone,
};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq)]
pub enum RoomEvent {
    Hit {
        target_id: EntityId,
        by_id: EntityId,
        by_root_id: EntityId,
        damage: i32,
        hp: i32,
        pos: Vec2,
    },
    Death {
        target_id: EntityId,
        by_root_id: EntityId,
        pos: Vec2,
    },
    SpawnEcho {
        echo_id: EntityId,
        owner_id: EntityId,
        pos: Vec2,
    },
    BeamFire {
        owner_id: EntityId,
        from: Vec2,
        to: Vec2,
    },
    ShieldHit {
        target_id: EntityId,
        charges_left: u32,
    },
    ShieldBreak {
        target_id: EntityId,
    },
    NovaFire {
        owner_id: EntityId,
        pos: Vec2,
        count: u32,
    },
    StrikeMark {
        strike_id: u64,
        owner_id: EntityId,
        pos: Vec2,
        radius: f32,
        detonate_at: u64,
    },
    StrikeBoom {
        strike_id: u64,
        owner_id: EntityId,
        pos: Vec2,
        radius: f32,
    },
}

#[derive(Debug, Clone)]
pub struct EntitySnapshot {
    pub id: EntityId,
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
    pub owner_id: Option<EntityId>,
    pub is_bot: bool,
    pub held_item: Option<AbilityKind>,
    pub shield: u32,
    pub phased: bool,
}

impl From<&Entity> for EntitySnapshot {
    fn from(e: &Entity) -> Self {
        Self {
            id: e.id,
            name: e.name.clone(),
            x: e.pos.x,
            y: e.pos.y,
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
            phased: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProjectileSnapshot {
    pub id: ProjectileId,
    pub owner_id: EntityId,
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub radius: f32,
    pub kind: &'static str,
}

impl From<&Projectile> for ProjectileSnapshot {
    fn from(p: &Projectile) -> Self {
        Self {
            id: p.id,
            owner_id: p.owner_id,
            x: p.pos.x,
            y: p.pos.y,
            vx: p.vel.x,
            vy: p.vel.y,
            radius: p.radius,
            kind: p.kind.as_str(),
        }
    }
}

/// Full shared world view for one tick. Every room member receives the same payload.
#[derive(Debug, Clone)]
pub struct StateSnapshot {
    pub t: u64,
    pub tick: u64,
    pub room_id: Arc<str>,
    pub entities: Vec<EntitySnapshot>,
    pub projectiles: Vec<ProjectileSnapshot>,
    pub events: Vec<RoomEvent>,
    pub pickups: Vec<Pickup>,
    pub zones: Vec<Zone>,
    pub portals: Vec<PortalPair>,
    pub match_state: MatchState,
}
