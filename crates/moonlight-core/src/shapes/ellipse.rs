//! Ellipse shape.

use super::ShapeGeometry;
use kurbo::{Point, Rect, Vec2};
use serde::{Deserialize, Serialize};

/// An axis-aligned ellipse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ellipse {
    /// Center point.
    pub center: Point,
    /// Horizontal radius.
    pub radius_x: f64,
    /// Vertical radius.
    pub radius_y: f64,
}

impl Ellipse {
    /// Create a new ellipse.
    pub fn new(center: Point, radius_x: f64, radius_y: f64) -> Self {
        Self {
            center,
            radius_x: radius_x.max(0.0),
            radius_y: radius_y.max(0.0),
        }
    }

    /// Create an ellipse from a bounding rectangle.
    pub fn from_rect(rect: Rect) -> Self {
        let rect = rect.abs();
        Self::new(rect.center(), rect.width() / 2.0, rect.height() / 2.0)
    }

    pub fn set_bounds(&mut self, rect: Rect) {
        *self = Self::from_rect(rect);
    }
}

impl ShapeGeometry for Ellipse {
    fn bounds(&self) -> Rect {
        Rect::new(
            self.center.x - self.radius_x,
            self.center.y - self.radius_y,
            self.center.x + self.radius_x,
            self.center.y + self.radius_y,
        )
    }

    fn hit_test(&self, point: Point, tolerance: f64, filled: bool) -> bool {
        let dx_outer = (point.x - self.center.x) / (self.radius_x + tolerance);
        let dy_outer = (point.y - self.center.y) / (self.radius_y + tolerance);
        if dx_outer * dx_outer + dy_outer * dy_outer > 1.0 {
            return false;
        }
        if filled {
            return true;
        }
        // Outline only: reject if inside inner ellipse
        let inner_rx = (self.radius_x - tolerance).max(0.0);
        let inner_ry = (self.radius_y - tolerance).max(0.0);
        if inner_rx < f64::EPSILON || inner_ry < f64::EPSILON {
            return true;
        }
        let dx_inner = (point.x - self.center.x) / inner_rx;
        let dy_inner = (point.y - self.center.y) / inner_ry;
        dx_inner * dx_inner + dy_inner * dy_inner > 1.0
    }

    fn translate(&mut self, delta: Vec2) {
        self.center += delta;
    }

    fn round(&mut self) {
        self.center = self.center.round();
        self.radius_x = self.radius_x.round().max(0.0);
        self.radius_y = self.radius_y.round().max(0.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_test_center() {
        let ellipse = Ellipse::new(Point::new(50.0, 50.0), 30.0, 20.0);
        assert!(ellipse.hit_test(Point::new(50.0, 50.0), 0.0, true));
        assert!(!ellipse.hit_test(Point::new(50.0, 50.0), 0.0, false));
    }

    #[test]
    fn test_bounds() {
        let ellipse = Ellipse::new(Point::new(50.0, 50.0), 30.0, 20.0);
        let bounds = ellipse.bounds();
        assert!((bounds.x0 - 20.0).abs() < f64::EPSILON);
        assert!((bounds.y0 - 30.0).abs() < f64::EPSILON);
        assert!((bounds.x1 - 80.0).abs() < f64::EPSILON);
        assert!((bounds.y1 - 70.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_from_rect() {
        let ellipse = Ellipse::from_rect(Rect::new(0.0, 0.0, 60.0, 40.0));
        assert_eq!(ellipse.center, Point::new(30.0, 20.0));
        assert!((ellipse.radius_x - 30.0).abs() < f64::EPSILON);
        assert!((ellipse.radius_y - 20.0).abs() < f64::EPSILON);
    }
}
