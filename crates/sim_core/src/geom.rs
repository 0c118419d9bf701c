//! Small 2D geometry helpers shared by targeting and collision.

use glam::Vec2;

/// Axis-aligned rectangle in world space (panel geometry, arena bounds).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub min: Vec2,
    pub max: Vec2,
}

impl Rect {
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    pub fn from_center(center: Vec2, w: f32, h: f32) -> Self {
        let half = Vec2::new(w * 0.5, h * 0.5);
        Self { min: center - half, max: center + half }
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    /// Closest point on or inside the rect to `p`.
    #[inline]
    pub fn clamp_point(&self, p: Vec2) -> Vec2 {
        p.clamp(self.min, self.max)
    }

    /// Squared distance from `p` to the rect (zero inside).
    #[inline]
    pub fn distance_sq(&self, p: Vec2) -> f32 {
        (self.clamp_point(p) - p).length_squared()
    }

    #[inline]
    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }

    #[inline]
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
    }
}

/// Circle vs circle overlap via squared distance (no sqrt).
#[inline]
pub fn circles_overlap(a: Vec2, ra: f32, b: Vec2, rb: f32) -> bool {
    let r = ra + rb;
    (b - a).length_squared() <= r * r
}

/// Circle vs rect overlap via the clamped closest point.
#[inline]
pub fn circle_rect_overlap(c: Vec2, r: f32, rect: &Rect) -> bool {
    rect.distance_sq(c) <= r * r
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamped_distance_is_zero_inside() {
        let r = Rect::from_center(Vec2::ZERO, 10.0, 10.0);
        assert_eq!(r.distance_sq(Vec2::new(1.0, -2.0)), 0.0);
        assert!(r.distance_sq(Vec2::new(8.0, 0.0)) > 0.0);
    }

    #[test]
    fn circle_rect_edge_contact() {
        let r = Rect::from_center(Vec2::ZERO, 4.0, 4.0);
        assert!(circle_rect_overlap(Vec2::new(4.0, 0.0), 2.0, &r));
        assert!(!circle_rect_overlap(Vec2::new(4.1, 0.0), 2.0, &r));
    }
}
