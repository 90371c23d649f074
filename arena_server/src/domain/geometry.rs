// Small 2D helpers shared by the simulation systems.

/// Directions shorter than this are treated as "no direction".
pub const MIN_DIRECTION_LEN: f32 = 0.001;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn len_sq(self) -> f32 {
        self.x * self.x + self.y * self.y
    }

    pub fn len(self) -> f32 {
        self.len_sq().sqrt()
    }

    pub fn scale(self, s: f32) -> Vec2 {
        Vec2::new(self.x * s, self.y * s)
    }

    pub fn add(self, other: Vec2) -> Vec2 {
        Vec2::new(self.x + other.x, self.y + other.y)
    }

    pub fn sub(self, other: Vec2) -> Vec2 {
        Vec2::new(self.x - other.x, self.y - other.y)
    }

    pub fn dot(self, other: Vec2) -> f32 {
        self.x * other.x + self.y * other.y
    }

    /// Unit vector, or `None` when the vector is too short to carry a direction.
    pub fn normalized(self) -> Option<Vec2> {
        let len = self.len();
        if len < MIN_DIRECTION_LEN || !len.is_finite() {
            return None;
        }
        Some(Vec2::new(self.x / len, self.y / len))
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Playable rectangle `[0, width] x [0, height]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Arena {
    pub width: f32,
    pub height: f32,
}

impl Arena {
    pub fn center(&self) -> Vec2 {
        Vec2::new(self.width * 0.5, self.height * 0.5)
    }

    /// Clamps a circle of `radius` so it stays fully inside the arena.
    pub fn clamp_circle(&self, p: Vec2, radius: f32) -> Vec2 {
        Vec2::new(
            clamp(p.x, radius, self.width - radius),
            clamp(p.y, radius, self.height - radius),
        )
    }

    /// True while `p` lies inside the arena grown by `margin` on every side.
    pub fn contains_with_margin(&self, p: Vec2, margin: f32) -> bool {
        p.x >= -margin
            && p.x <= self.width + margin
            && p.y >= -margin
            && p.y <= self.height + margin
    }
}

pub fn clamp(v: f32, min: f32, max: f32) -> f32 {
    // `f32::clamp` panics when min > max.
    if min > max {
        return (min + max) * 0.5;
    }
    v.max(min).min(max)
}

pub fn dist_sq(a: Vec2, b: Vec2) -> f32 {
    a.sub(b).len_sq()
}

/// Circle-circle overlap on squared distance; touching counts.
pub fn circles_overlap(a: Vec2, ra: f32, b: Vec2, rb: f32) -> bool {
    let r = ra + rb;
    dist_sq(a, b) <= r * r
}

pub fn point_in_circle(p: Vec2, center: Vec2, radius: f32) -> bool {
    dist_sq(p, center) <= radius * radius
}

/// Whether the segment `a -> b` passes within `radius` of `center`.
pub fn segment_intersects_circle(a: Vec2, b: Vec2, center: Vec2, radius: f32) -> bool {
    let ab = b.sub(a);
    let len_sq = ab.len_sq();
    let t = if len_sq <= f32::EPSILON {
        0.0
    } else {
        clamp(center.sub(a).dot(ab) / len_sq, 0.0, 1.0)
    };
    let closest = a.add(ab.scale(t));
    dist_sq(closest, center) <= radius * radius
}

/// Point where a ray from `origin` along unit `dir` leaves the arena.
pub fn ray_to_boundary(origin: Vec2, dir: Vec2, arena: &Arena) -> Vec2 {
    let mut t = f32::INFINITY;
    if dir.x > 0.0 {
        t = t.min((arena.width - origin.x) / dir.x);
    } else if dir.x < 0.0 {
        t = t.min(-origin.x / dir.x);
    }
    if dir.y > 0.0 {
        t = t.min((arena.height - origin.y) / dir.y);
    } else if dir.y < 0.0 {
        t = t.min(-origin.y / dir.y);
    }
    if !t.is_finite() || t < 0.0 {
        return origin;
    }
    origin.add(dir.scale(t))
}

#[cfg(test)]
mod tests {
    use super::*;

    const ARENA: Arena = Arena {
        width: 1200.0,
        height: 800.0,
    };

    #[test]
    fn when_circles_touch_exactly_then_they_overlap() {
        assert!(circles_overlap(
            Vec2::new(0.0, 0.0),
            3.0,
            Vec2::new(5.0, 0.0),
            2.0
        ));
        assert!(!circles_overlap(
            Vec2::new(0.0, 0.0),
            3.0,
            Vec2::new(5.01, 0.0),
            2.0
        ));
    }

    #[test]
    fn when_direction_is_tiny_then_normalize_refuses() {
        assert!(Vec2::new(0.0005, 0.0).normalized().is_none());
        let n = Vec2::new(3.0, 4.0).normalized().expect("direction");
        assert!((n.x - 0.6).abs() < 1e-6 && (n.y - 0.8).abs() < 1e-6);
    }

    #[test]
    fn when_segment_passes_near_circle_then_it_intersects() {
        let a = Vec2::new(0.0, 0.0);
        let b = Vec2::new(100.0, 0.0);
        assert!(segment_intersects_circle(a, b, Vec2::new(50.0, 10.0), 10.0));
        assert!(!segment_intersects_circle(a, b, Vec2::new(50.0, 11.0), 10.0));
        // Beyond the segment end only the endpoint distance matters.
        assert!(!segment_intersects_circle(a, b, Vec2::new(120.0, 0.0), 10.0));
    }

    #[test]
    fn when_ray_is_cast_then_it_stops_at_the_first_wall() {
        let end = ray_to_boundary(Vec2::new(600.0, 400.0), Vec2::new(1.0, 0.0), &ARENA);
        assert_eq!(end, Vec2::new(1200.0, 400.0));

        let diag = Vec2::new(-1.0, -1.0).normalized().expect("direction");
        let end = ray_to_boundary(Vec2::new(100.0, 400.0), diag, &ARENA);
        assert!(end.x.abs() < 1e-3);
        assert!((end.y - 300.0).abs() < 1e-3);
    }

    #[test]
    fn when_clamping_circle_then_it_stays_inside() {
        let p = ARENA.clamp_circle(Vec2::new(-50.0, 900.0), 18.0);
        assert_eq!(p, Vec2::new(18.0, 782.0));
    }
}
