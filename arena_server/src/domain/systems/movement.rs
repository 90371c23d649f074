use crate::domain::geometry::Arena;
use crate::domain::state::{Entity, Keys};

#[derive(Debug, Clone, Copy)]
pub struct MovementConfig {
    pub speed: f32, // px/s
    pub arena: Arena,
}

/// Moves an entity one step along its key axis, scaled by `multiplier`
/// (dash, time bubble, bot tier), and keeps it inside the arena.
pub fn tick_entity(e: &mut Entity, keys: Keys, dt: f32, multiplier: f32, cfg: MovementConfig) {
    // Diagonals are normalised so they are not faster than straight moves.
    let Some(dir) = keys.axis().normalized() else {
        return;
    };

    let step = dir.scale(cfg.speed * multiplier * dt);
    e.pos = cfg.arena.clamp_circle(e.pos.add(step), e.radius);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::geometry::Vec2;

    const CFG: MovementConfig = MovementConfig {
        speed: 200.0,
        arena: Arena {
            width: 1200.0,
            height: 800.0,
        },
    };

    fn entity_at(x: f32, y: f32) -> Entity {
        Entity::new(1, "p".to_string(), Vec2::new(x, y), 18.0, 3)
    }

    #[test]
    fn when_moving_right_then_entity_advances_by_speed_times_dt() {
        let mut e = entity_at(100.0, 100.0);
        let keys = Keys {
            right: true,
            ..Keys::default()
        };
        tick_entity(&mut e, keys, 0.05, 1.0, CFG);
        assert!((e.pos.x - 110.0).abs() < 1e-4);
        assert_eq!(e.pos.y, 100.0);
    }

    #[test]
    fn when_moving_diagonally_then_speed_is_not_boosted() {
        let mut e = entity_at(100.0, 100.0);
        let keys = Keys {
            down: true,
            right: true,
            ..Keys::default()
        };
        tick_entity(&mut e, keys, 0.05, 1.0, CFG);
        let moved = e.pos.sub(Vec2::new(100.0, 100.0)).len();
        assert!((moved - 10.0).abs() < 1e-3);
    }

    #[test]
    fn when_opposite_keys_cancel_then_entity_stays_put() {
        let mut e = entity_at(100.0, 100.0);
        let keys = Keys {
            left: true,
            right: true,
            ..Keys::default()
        };
        tick_entity(&mut e, keys, 0.05, 1.0, CFG);
        assert_eq!(e.pos, Vec2::new(100.0, 100.0));
    }

    #[test]
    fn when_pushing_into_wall_then_entity_is_clamped() {
        let mut e = entity_at(20.0, 400.0);
        let keys = Keys {
            left: true,
            ..Keys::default()
        };
        tick_entity(&mut e, keys, 0.05, 2.2, CFG);
        assert_eq!(e.pos.x, 18.0);
    }
}
