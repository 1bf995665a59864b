//! Anchor points, resize handles and the corner-resize math.

use crate::shapes::{AnchorName, LineEnd, Shape};
use crate::snap::{Grid, snap_down, snap_up};
use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};

/// Handle size in screen pixels.
pub const HANDLE_SIZE: f64 = 10.0;
/// Handle hit tolerance in screen pixels.
pub const HANDLE_HIT_TOLERANCE: f64 = 8.0;
/// Smallest width/height a resize may produce.
pub const MIN_SIZE: f64 = 1.0;

/// Named point on an element's boundary.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Anchor {
    pub name: AnchorName,
    pub position: Point,
}

impl Anchor {
    pub fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        (point - self.position).hypot2() <= tolerance * tolerance
    }
}

/// Anchors of a shape: edge midpoints for closed shapes, the two endpoints
/// for lines. Corners and the centre are not anchors.
pub fn anchors_of(shape: &Shape) -> Vec<Anchor> {
    match shape {
        Shape::Rectangle(_) | Shape::Circle(_) | Shape::Ellipse(_) => {
            let Some(bounds) = shape.bounds() else {
                return Vec::new();
            };
            AnchorName::EDGES
                .iter()
                .map(|&name| Anchor {
                    name,
                    position: edge_midpoint(bounds, name),
                })
                .collect()
        }
        Shape::Line(line) => vec![
            Anchor {
                name: AnchorName::LineStart,
                position: line.start,
            },
            Anchor {
                name: AnchorName::LineEnd,
                position: line.end,
            },
        ],
        Shape::Text(_) | Shape::Group(_) => Vec::new(),
    }
}

/// Current position of a named anchor, if the shape has it.
pub fn anchor_position(shape: &Shape, name: AnchorName) -> Option<Point> {
    anchors_of(shape)
        .into_iter()
        .find(|a| a.name == name)
        .map(|a| a.position)
}

fn edge_midpoint(bounds: Rect, name: AnchorName) -> Point {
    let center = bounds.center();
    match name {
        AnchorName::Top => Point::new(center.x, bounds.y0),
        AnchorName::Bottom => Point::new(center.x, bounds.y1),
        AnchorName::Left => Point::new(bounds.x0, center.y),
        AnchorName::Right => Point::new(bounds.x1, center.y),
        AnchorName::LineStart | AnchorName::LineEnd => center,
    }
}

/// Corner positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Corner {
    #[serde(rename = "nw")]
    NorthWest,
    #[serde(rename = "ne")]
    NorthEast,
    #[serde(rename = "se")]
    SouthEast,
    #[serde(rename = "sw")]
    SouthWest,
}

impl Corner {
    pub const ALL: [Corner; 4] = [
        Corner::NorthWest,
        Corner::NorthEast,
        Corner::SouthEast,
        Corner::SouthWest,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Corner::NorthWest => "nw",
            Corner::NorthEast => "ne",
            Corner::SouthEast => "se",
            Corner::SouthWest => "sw",
        }
    }

    pub fn opposite(self) -> Corner {
        match self {
            Corner::NorthWest => Corner::SouthEast,
            Corner::NorthEast => Corner::SouthWest,
            Corner::SouthEast => Corner::NorthWest,
            Corner::SouthWest => Corner::NorthEast,
        }
    }

    pub fn is_east(self) -> bool {
        matches!(self, Corner::NorthEast | Corner::SouthEast)
    }

    pub fn is_south(self) -> bool {
        matches!(self, Corner::SouthEast | Corner::SouthWest)
    }

    pub fn of(self, rect: Rect) -> Point {
        Point::new(
            if self.is_east() { rect.x1 } else { rect.x0 },
            if self.is_south() { rect.y1 } else { rect.y0 },
        )
    }
}

/// Type of selection handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HandleKind {
    /// Corner resize handle of a rect/circle/ellipse.
    Corner(Corner),
    /// Endpoint handle of a line; reuses the line's anchor.
    Endpoint(LineEnd),
}

/// A handle with its position and type.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Handle {
    /// Position in scene coordinates.
    pub position: Point,
    pub kind: HandleKind,
}

impl Handle {
    pub fn new(position: Point, kind: HandleKind) -> Self {
        Self { position, kind }
    }

    /// Check if a point (in scene coordinates) hits this handle.
    /// `tolerance` should be adjusted for camera zoom.
    pub fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        (point - self.position).hypot2() <= tolerance * tolerance
    }
}

/// Resize handles for a shape: four corners for closed shapes, two endpoint
/// handles for lines, nothing for text and groups.
pub fn resize_handles_of(shape: &Shape) -> Vec<Handle> {
    match shape {
        Shape::Rectangle(_) | Shape::Circle(_) | Shape::Ellipse(_) => {
            let Some(bounds) = shape.bounds() else {
                return Vec::new();
            };
            Corner::ALL
                .iter()
                .map(|&corner| Handle::new(corner.of(bounds), HandleKind::Corner(corner)))
                .collect()
        }
        Shape::Line(line) => vec![
            Handle::new(line.start, HandleKind::Endpoint(LineEnd::Start)),
            Handle::new(line.end, HandleKind::Endpoint(LineEnd::End)),
        ],
        Shape::Text(_) | Shape::Group(_) => Vec::new(),
    }
}

/// Check which handle (if any) is hit.
pub fn hit_test_handles(shape: &Shape, point: Point, tolerance: f64) -> Option<HandleKind> {
    resize_handles_of(shape)
        .into_iter()
        .find(|h| h.hit_test(point, tolerance))
        .map(|h| h.kind)
}

/// New box for a corner drag.
///
/// The opposite corner of `original` is the pivot and never moves. Only the
/// dragged corner is snapped (or rounded when the grid is off), and it is
/// clamped so the box cannot invert or shrink below [`MIN_SIZE`].
pub fn resize_box(original: Rect, corner: Corner, pointer: Point, grid: Grid) -> Rect {
    let pivot = corner.opposite().of(original);
    let dragged = grid.snap_point(pointer);

    let x = clamp_axis(dragged.x, pivot.x, corner.is_east(), grid);
    let y = clamp_axis(dragged.y, pivot.y, corner.is_south(), grid);
    Rect::from_points(pivot, Point::new(x, y))
}

fn clamp_axis(value: f64, pivot: f64, positive: bool, grid: Grid) -> f64 {
    if positive {
        let min = pivot + MIN_SIZE;
        if value >= min {
            value
        } else if grid.enabled {
            snap_up(min, grid.size)
        } else {
            min.ceil()
        }
    } else {
        let max = pivot - MIN_SIZE;
        if value <= max {
            value
        } else if grid.enabled {
            snap_down(max, grid.size)
        } else {
            max.floor()
        }
    }
}

/// Apply a resized box to a shape.
///
/// Rectangles take the box as is. Ellipses and circles keep integer centre
/// and radii by holding the dragged corner fixed; rounding moves the pivot
/// side, so a grid-snapped corner stays on the grid.
pub fn apply_box(shape: &mut Shape, corner: Corner, rect: Rect) {
    match shape {
        Shape::Rectangle(r) => r.set_bounds(rect),
        Shape::Ellipse(e) => {
            let rx = (rect.width() / 2.0).round().max(MIN_SIZE);
            let ry = (rect.height() / 2.0).round().max(MIN_SIZE);
            let cx = if corner.is_east() { rect.x1 - rx } else { rect.x0 + rx };
            let cy = if corner.is_south() { rect.y1 - ry } else { rect.y0 + ry };
            e.center = Point::new(cx, cy);
            e.radius_x = rx;
            e.radius_y = ry;
        }
        Shape::Circle(c) => {
            let dragged = corner.of(rect);
            let r = (rect.width().min(rect.height()) / 2.0).round().max(MIN_SIZE);
            let cx = if corner.is_east() { dragged.x - r } else { dragged.x + r };
            let cy = if corner.is_south() { dragged.y - r } else { dragged.y + r };
            c.center = Point::new(cx, cy);
            c.radius = r;
        }
        Shape::Line(_) | Shape::Text(_) | Shape::Group(_) => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::{Circle, Ellipse, Line, Rectangle};

    fn rect_shape() -> Shape {
        Shape::Rectangle(Rectangle::new(Point::new(0.0, 0.0), 100.0, 50.0))
    }

    #[test]
    fn test_rectangle_anchors_are_edge_midpoints() {
        let anchors = anchors_of(&rect_shape());
        assert_eq!(anchors.len(), 4);
        assert_eq!(anchors[0].name, AnchorName::Top);
        assert_eq!(anchors[0].position, Point::new(50.0, 0.0));
        assert_eq!(anchors[3].position, Point::new(100.0, 25.0));
    }

    #[test]
    fn test_line_anchors() {
        let line = Shape::Line(Line::new(Point::new(1.0, 2.0), Point::new(3.0, 4.0)));
        let anchors = anchors_of(&line);
        assert_eq!(anchors.len(), 2);
        assert_eq!(anchors[1].name, AnchorName::LineEnd);
    }

    #[test]
    fn test_rectangle_handles() {
        let handles = resize_handles_of(&rect_shape());
        assert_eq!(handles.len(), 4);
        assert!(
            handles
                .iter()
                .any(|h| h.kind == HandleKind::Corner(Corner::SouthEast)
                    && h.position == Point::new(100.0, 50.0))
        );
    }

    #[test]
    fn test_line_handles() {
        let line = Shape::Line(Line::new(Point::new(0.0, 0.0), Point::new(100.0, 100.0)));
        let handles = resize_handles_of(&line);
        assert_eq!(handles.len(), 2);
        assert_eq!(handles[0].kind, HandleKind::Endpoint(LineEnd::Start));
    }

    #[test]
    fn test_handle_hit_test() {
        let hit = hit_test_handles(&rect_shape(), Point::new(98.0, 52.0), 5.0);
        assert_eq!(hit, Some(HandleKind::Corner(Corner::SouthEast)));
        assert_eq!(hit_test_handles(&rect_shape(), Point::new(50.0, 25.0), 5.0), None);
    }

    #[test]
    fn test_resize_keeps_pivot() {
        let original = Rect::new(10.0, 10.0, 110.0, 60.0);
        let resized = resize_box(original, Corner::SouthEast, Point::new(150.3, 90.6), Grid::default());
        assert_eq!(resized, Rect::new(10.0, 10.0, 150.0, 91.0));
    }

    #[test]
    fn test_resize_snaps_dragged_corner_only() {
        let original = Rect::new(13.0, 7.0, 113.0, 57.0);
        let grid = Grid::new(true, 20.0);
        let resized = resize_box(original, Corner::SouthEast, Point::new(152.0, 89.0), grid);
        assert!((resized.x0 - 13.0).abs() < f64::EPSILON);
        assert!((resized.y0 - 7.0).abs() < f64::EPSILON);
        assert!((resized.x1 % 20.0).abs() < f64::EPSILON);
        assert!((resized.y1 % 20.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_resize_cannot_invert() {
        let original = Rect::new(10.0, 10.0, 110.0, 60.0);
        let resized = resize_box(original, Corner::SouthEast, Point::new(-50.0, -50.0), Grid::default());
        assert!(resized.width() >= MIN_SIZE);
        assert!(resized.height() >= MIN_SIZE);
        assert!((resized.x0 - 10.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_resize_north_west() {
        let original = Rect::new(10.0, 10.0, 110.0, 60.0);
        let resized = resize_box(original, Corner::NorthWest, Point::new(0.0, 0.0), Grid::default());
        assert_eq!(resized, Rect::new(0.0, 0.0, 110.0, 60.0));
    }

    #[test]
    fn test_ellipse_box_keeps_dragged_corner() {
        let mut shape = Shape::Ellipse(Ellipse::new(Point::new(50.0, 50.0), 10.0, 10.0));
        apply_box(&mut shape, Corner::SouthEast, Rect::new(40.0, 40.0, 100.0, 81.0));
        let bounds = shape.bounds().unwrap();
        assert!((bounds.x1 - 100.0).abs() < f64::EPSILON);
        assert!((bounds.y1 - 81.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_circle_box_keeps_dragged_corner() {
        let mut shape = Shape::Circle(Circle::new(Point::new(10.0, 10.0), 10.0));
        apply_box(&mut shape, Corner::SouthEast, Rect::new(0.0, 0.0, 60.0, 40.0));
        let bounds = shape.bounds().unwrap();
        assert_eq!(bounds, Rect::new(20.0, 0.0, 60.0, 40.0));

        let mut shape = Shape::Circle(Circle::new(Point::new(50.0, 50.0), 10.0));
        apply_box(&mut shape, Corner::NorthWest, Rect::new(20.0, 30.0, 60.0, 60.0));
        assert_eq!(shape.bounds().unwrap(), Rect::new(20.0, 30.0, 50.0, 60.0));
    }

    #[test]
    fn test_circle_grid_resize_lands_on_grid() {
        let original = Rect::new(13.0, 13.0, 47.0, 47.0);
        let mut shape = Shape::Circle(Circle::new(original.center(), 17.0));
        let target = resize_box(
            original,
            Corner::SouthEast,
            Point::new(61.0, 79.0),
            Grid::new(true, 20.0),
        );
        apply_box(&mut shape, Corner::SouthEast, target);
        let bounds = shape.bounds().unwrap();
        assert_eq!((bounds.x1, bounds.y1), (60.0, 80.0));
        assert_eq!(bounds.width(), bounds.height());
    }
}
