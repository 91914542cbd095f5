//! Grid geometry owned by the core: positions and wire paths.
//!
//! Rendering interpolates curves through these points; the core only
//! stores and reorders them.

use serde::{Deserialize, Serialize};

/// Grid spacing in world units. Module positions snap to multiples of
/// this when placed.
pub const GRID: f64 = 25.0;

#[derive(Clone, Copy, PartialEq, Debug, Default, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    pub fn new(x: f64, y: f64) -> Self {
        Vec2 { x, y }
    }

    /// Nearest grid intersection for the given spacing.
    pub fn snapped(self, grid: f64) -> Self {
        Vec2 {
            x: (self.x / grid).round() * grid,
            y: (self.y / grid).round() * grid,
        }
    }
}

/// The user-placed control points of a link, ordered source to target.
#[derive(Clone, PartialEq, Debug, Default, Serialize, Deserialize)]
pub struct WirePath {
    pub points: Vec<Vec2>,
}

impl WirePath {
    pub fn new() -> Self {
        WirePath { points: Vec::new() }
    }

    pub fn from_points(points: Vec<Vec2>) -> Self {
        WirePath { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Flips the traversal direction, keeping point identity.
    pub fn reversed(mut self) -> Self {
        self.points.reverse();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapping_rounds_to_nearest_intersection() {
        let p = Vec2::new(37.0, -12.0).snapped(GRID);
        assert_eq!(p, Vec2::new(25.0, 0.0));
        let q = Vec2::new(38.0, 13.0).snapped(GRID);
        assert_eq!(q, Vec2::new(50.0, 25.0));
    }

    #[test]
    fn reversing_keeps_points() {
        let path = WirePath::from_points(vec![Vec2::new(0.0, 0.0), Vec2::new(1.0, 2.0)]);
        let rev = path.clone().reversed();
        assert_eq!(rev.points.len(), 2);
        assert_eq!(rev.points[0], Vec2::new(1.0, 2.0));
        assert_eq!(rev.clone().reversed(), path);
    }
}
