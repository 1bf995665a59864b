//! Circle shape.

use super::ShapeGeometry;
use kurbo::{Point, Rect, Vec2};
use serde::{Deserialize, Serialize};

/// A circle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Circle {
    pub center: Point,
    pub radius: f64,
}

impl Circle {
    pub fn new(center: Point, radius: f64) -> Self {
        Self {
            center,
            radius: radius.max(0.0),
        }
    }

    /// Fit the circle into `rect`, keeping it round.
    pub fn set_bounds(&mut self, rect: Rect) {
        let rect = rect.abs();
        self.center = rect.center();
        self.radius = rect.width().min(rect.height()) / 2.0;
    }
}

impl ShapeGeometry for Circle {
    fn bounds(&self) -> Rect {
        Rect::from_center_size(self.center, (self.radius * 2.0, self.radius * 2.0))
    }

    fn hit_test(&self, point: Point, tolerance: f64, filled: bool) -> bool {
        let dist = (point - self.center).hypot();
        if dist > self.radius + tolerance {
            return false;
        }
        filled || dist >= self.radius - tolerance
    }

    fn translate(&mut self, delta: Vec2) {
        self.center += delta;
    }

    fn round(&mut self) {
        self.center = self.center.round();
        self.radius = self.radius.round().max(0.0);
    }
}
