// Bot decision making. Bots produce the same `PlayerInput` a client would send,
// so they flow through the regular movement and shooting path.

use crate::domain::geometry::{Vec2, dist_sq};
use crate::domain::state::{Entity, EntityId, Keys, PlayerInput};
use crate::domain::tuning::BotTuning;
use rand::Rng;
use std::collections::BTreeMap;

/// Key axes are pressed once the wanted direction leans this far along them.
const KEY_DEADZONE: f32 = 0.3;

#[derive(Debug, Clone)]
pub struct BotBrain {
    pub tuning: BotTuning,
    pub target_id: Option<EntityId>,
    pub aim: Vec2,
    pub next_aim_at: u64,
    pub strafe_sign: f32,
    pub next_strafe_flip_at: u64,
    seq: u64,
}

impl BotBrain {
    pub fn new(tuning: BotTuning) -> Self {
        Self {
            tuning,
            target_id: None,
            aim: Vec2::ZERO,
            next_aim_at: 0,
            strafe_sign: 1.0,
            next_strafe_flip_at: 0,
            seq: 0,
        }
    }

    /// Forget the current target and timers (match reset).
    pub fn reset(&mut self) {
        *self = Self::new(self.tuning);
    }
}

/// Nearest alive human; falls back to the nearest alive body of any kind.
pub fn select_target<'a>(
    me: &Entity,
    entities: &'a BTreeMap<EntityId, Entity>,
) -> Option<&'a Entity> {
    let nearest = |humans_only: bool| {
        entities
            .values()
            .filter(|e| e.alive && e.id != me.id && e.root_id() != me.id)
            .filter(|e| !humans_only || e.is_human())
            .min_by(|a, b| dist_sq(me.pos, a.pos).total_cmp(&dist_sq(me.pos, b.pos)))
    };
    nearest(true).or_else(|| nearest(false))
}

pub fn think<R: Rng>(
    brain: &mut BotBrain,
    me: &Entity,
    entities: &BTreeMap<EntityId, Entity>,
    now_ms: u64,
    rng: &mut R,
) -> PlayerInput {
    brain.seq += 1;
    let idle = PlayerInput {
        seq: brain.seq,
        aim: brain.aim,
        ..PlayerInput::default()
    };

    let Some(target) = select_target(me, entities) else {
        brain.target_id = None;
        return idle;
    };

    let to_target = target.pos.sub(me.pos);
    let dist = to_target.len();
    let Some(dir) = to_target.normalized() else {
        return idle;
    };

    if now_ms >= brain.next_strafe_flip_at {
        if brain.next_strafe_flip_at != 0 {
            brain.strafe_sign = -brain.strafe_sign;
        }
        brain.next_strafe_flip_at = now_ms + brain.tuning.strafe_flip_ms;
    }

    let wanted = if dist > brain.tuning.far_distance {
        dir
    } else if dist < brain.tuning.near_distance {
        dir.scale(-1.0)
    } else {
        Vec2::new(-dir.y, dir.x).scale(brain.strafe_sign)
    };

    let retargeted = brain.target_id != Some(target.id);
    if retargeted || now_ms >= brain.next_aim_at {
        let j = brain.tuning.aim_jitter;
        let jitter = Vec2::new(rng.gen_range(-j..=j), rng.gen_range(-j..=j));
        brain.aim = target.pos.add(jitter);
        brain.next_aim_at = now_ms + brain.tuning.reaction_ms;
        brain.target_id = Some(target.id);
    }

    PlayerInput {
        seq: brain.seq,
        dt: 0.0,
        keys: keys_toward(wanted),
        aim: brain.aim,
        shoot: dist <= brain.tuning.shoot_range,
        use_item: false,
    }
}

fn keys_toward(v: Vec2) -> Keys {
    Keys {
        up: v.y < -KEY_DEADZONE,
        down: v.y > KEY_DEADZONE,
        left: v.x < -KEY_DEADZONE,
        right: v.x > KEY_DEADZONE,
    }
}
