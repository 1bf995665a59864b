//! Rectangle shape.

use super::ShapeGeometry;
use kurbo::{Point, Rect, Vec2};
use serde::{Deserialize, Serialize};

/// An axis-aligned rectangle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rectangle {
    /// Top-left corner position.
    pub position: Point,
    /// Width of the rectangle.
    pub width: f64,
    /// Height of the rectangle.
    pub height: f64,
}

impl Rectangle {
    /// Create a new rectangle.
    pub fn new(position: Point, width: f64, height: f64) -> Self {
        Self {
            position,
            width: width.max(0.0),
            height: height.max(0.0),
        }
    }

    /// Create a rectangle from a kurbo Rect (normalized).
    pub fn from_rect(rect: Rect) -> Self {
        let rect = rect.abs();
        Self::new(rect.origin(), rect.width(), rect.height())
    }

    /// Get the rectangle as a kurbo Rect.
    pub fn as_rect(&self) -> Rect {
        Rect::new(
            self.position.x,
            self.position.y,
            self.position.x + self.width,
            self.position.y + self.height,
        )
    }

    pub fn set_bounds(&mut self, rect: Rect) {
        *self = Self::from_rect(rect);
    }
}

impl ShapeGeometry for Rectangle {
    fn bounds(&self) -> Rect {
        self.as_rect()
    }

    fn hit_test(&self, point: Point, tolerance: f64, filled: bool) -> bool {
        let rect = self.as_rect();
        let outer = rect.inflate(tolerance, tolerance);
        if !outer.contains(point) {
            return false;
        }
        if filled {
            return true;
        }
        // Outline only: reject the inner area
        let inner = rect.inflate(-tolerance, -tolerance);
        inner.width() <= 0.0 || inner.height() <= 0.0 || !inner.contains(point)
    }

    fn translate(&mut self, delta: Vec2) {
        self.position += delta;
    }

    fn round(&mut self) {
        self.position = self.position.round();
        self.width = self.width.round().max(0.0);
        self.height = self.height.round().max(0.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rectangle_creation() {
        let rect = Rectangle::new(Point::new(10.0, 20.0), 100.0, 50.0);
        assert!((rect.position.x - 10.0).abs() < f64::EPSILON);
        assert!((rect.position.y - 20.0).abs() < f64::EPSILON);
        assert!((rect.width - 100.0).abs() < f64::EPSILON);
        assert!((rect.height - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_rectangle_from_flipped_rect() {
        let rect = Rectangle::from_rect(Rect::new(100.0, 100.0, 50.0, 50.0));
        assert!((rect.position.x - 50.0).abs() < f64::EPSILON);
        assert!((rect.position.y - 50.0).abs() < f64::EPSILON);
        assert!((rect.width - 50.0).abs() < f64::EPSILON);
        assert!((rect.height - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_hit_test() {
        let rect = Rectangle::new(Point::new(0.0, 0.0), 100.0, 100.0);
        assert!(rect.hit_test(Point::new(50.0, 50.0), 0.0, true));
        assert!(!rect.hit_test(Point::new(150.0, 50.0), 0.0, true));
        assert!(rect.hit_test(Point::new(105.0, 50.0), 10.0, true));
    }

    #[test]
    fn test_outline_hit_test() {
        let rect = Rectangle::new(Point::new(0.0, 0.0), 100.0, 100.0);
        assert!(!rect.hit_test(Point::new(50.0, 50.0), 2.0, false));
        assert!(rect.hit_test(Point::new(1.0, 50.0), 2.0, false));
    }

    #[test]
    fn test_round() {
        let mut rect = Rectangle::new(Point::new(10.4, 20.6), 99.5, 50.2);
        rect.round();
        assert_eq!(rect.position, Point::new(10.0, 21.0));
        assert!((rect.width - 100.0).abs() < f64::EPSILON);
        assert!((rect.height - 50.0).abs() < f64::EPSILON);
    }
}
