//! Element definitions for the scene.

mod circle;
mod ellipse;
mod group;
mod line;
mod rectangle;
mod text;

pub use circle::Circle;
pub use ellipse::Ellipse;
pub use group::Group;
pub use line::{AnchorName, Connection, ConnectionStatus, Line, LineEnd};
pub use rectangle::Rectangle;
pub use text::{DEFAULT_FONT_SIZE, Text};

use kurbo::{Point, Rect, Vec2};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for elements.
///
/// Native ids look like `el-12`; they are handed out by the scene and never
/// reused within a session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementId(String);

impl ElementId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The numeric suffix of an `el-<n>` id, if it has that form.
    pub fn sequence(&self) -> Option<u64> {
        self.0.strip_prefix("el-")?.parse().ok()
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ElementId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for ElementId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Where an element came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provenance {
    /// Created by the editor, or imported with the editor's own metadata.
    #[default]
    Native,
    /// Imported from foreign markup without editor metadata.
    Plain,
}

/// Style properties. Unset fields fall back to the theme.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Style {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke_width: Option<f64>,
}

impl Style {
    /// Whether the interior of a closed shape paints (and therefore hits).
    pub fn is_filled(&self) -> bool {
        !matches!(self.fill.as_deref(), Some("none") | Some("transparent"))
    }

    /// Apply a patch, returning true if anything changed.
    pub fn apply(&mut self, patch: &StylePatch) -> bool {
        let before = self.clone();
        if let Some(fill) = &patch.fill {
            self.fill = Some(fill.clone());
        }
        if let Some(stroke) = &patch.stroke {
            self.stroke = Some(stroke.clone());
        }
        if let Some(width) = patch.stroke_width {
            self.stroke_width = Some(width.max(0.0));
        }
        *self != before
    }
}

/// A partial style update. `None` leaves the field as is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StylePatch {
    #[serde(default)]
    pub fill: Option<String>,
    #[serde(default)]
    pub stroke: Option<String>,
    #[serde(default)]
    pub stroke_width: Option<f64>,
}

impl StylePatch {
    pub fn is_empty(&self) -> bool {
        self.fill.is_none() && self.stroke.is_none() && self.stroke_width.is_none()
    }

    /// First color in the patch that does not parse.
    pub fn invalid_color(&self) -> Option<&str> {
        [self.fill.as_deref(), self.stroke.as_deref()]
            .into_iter()
            .flatten()
            .find(|c| !is_valid_color(c))
    }
}

/// Whether a string is a paint value the exporter can write.
///
/// Keywords and `var(...)` references pass through verbatim; everything
/// else must parse as a CSS color.
pub fn is_valid_color(value: &str) -> bool {
    let value = value.trim();
    matches!(value, "none" | "transparent" | "currentColor")
        || value.starts_with("var(")
        || peniko::color::parse_color(value).is_ok()
}

/// Shape kinds a user can insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeKind {
    Rectangle,
    Circle,
    Ellipse,
    Line,
    Arrow,
    Text,
}

impl ShapeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ShapeKind::Rectangle => "rectangle",
            ShapeKind::Circle => "circle",
            ShapeKind::Ellipse => "ellipse",
            ShapeKind::Line => "line",
            ShapeKind::Arrow => "arrow",
            ShapeKind::Text => "text",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "rectangle" | "rect" => Some(ShapeKind::Rectangle),
            "circle" => Some(ShapeKind::Circle),
            "ellipse" => Some(ShapeKind::Ellipse),
            "line" => Some(ShapeKind::Line),
            "arrow" => Some(ShapeKind::Arrow),
            "text" => Some(ShapeKind::Text),
            _ => None,
        }
    }

    /// Build a shape of this kind dragged out from `from` to `to`.
    ///
    /// Closed shapes fill the box spanned by the two points; lines run from
    /// one to the other; text starts at the box's top-left corner.
    pub fn shape_between(self, from: Point, to: Point) -> Shape {
        let rect = Rect::from_points(from, to);
        match self {
            ShapeKind::Rectangle => Shape::Rectangle(Rectangle::from_rect(rect)),
            ShapeKind::Circle => Shape::Circle(Circle::new(
                rect.center(),
                rect.width().min(rect.height()) / 2.0,
            )),
            ShapeKind::Ellipse => Shape::Ellipse(Ellipse::from_rect(rect)),
            ShapeKind::Line => Shape::Line(Line::new(from, to)),
            ShapeKind::Arrow => Shape::Line(Line::new(from, to).with_arrowhead()),
            ShapeKind::Text => Shape::Text(Text::new(
                Point::new(rect.x0, rect.y0 + DEFAULT_FONT_SIZE),
                "Text",
            )),
        }
    }

    /// Default footprint for a shape inserted at `center` without a drag.
    pub fn default_rect(self, center: Point) -> Rect {
        let size = match self {
            ShapeKind::Rectangle => (120.0, 80.0),
            ShapeKind::Circle => (80.0, 80.0),
            ShapeKind::Ellipse => (120.0, 80.0),
            ShapeKind::Line | ShapeKind::Arrow => (120.0, 0.0),
            ShapeKind::Text => (60.0, DEFAULT_FONT_SIZE),
        };
        Rect::from_center_size(center, size)
    }
}

/// Geometry shared by every drawable shape kind.
pub trait ShapeGeometry {
    /// Axis-aligned bounding box in scene coordinates.
    fn bounds(&self) -> Rect;

    /// Check if a point hits the shape. `tolerance` already includes half
    /// the stroke width; `filled` says whether the interior paints.
    fn hit_test(&self, point: Point, tolerance: f64, filled: bool) -> bool;

    /// Translate by a delta.
    fn translate(&mut self, delta: Vec2);

    /// Round every persisted coordinate to an integer.
    fn round(&mut self);
}

/// Closed set of shape kinds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Shape {
    #[serde(rename = "rect")]
    Rectangle(Rectangle),
    Circle(Circle),
    Ellipse(Ellipse),
    Line(Line),
    Text(Text),
    Group(Group),
}

impl Shape {
    /// Name used for `data-element-type` and in `ElementInfo`.
    pub fn type_name(&self) -> &'static str {
        match self {
            Shape::Rectangle(_) => "rect",
            Shape::Circle(_) => "circle",
            Shape::Ellipse(_) => "ellipse",
            Shape::Line(_) => "line",
            Shape::Text(_) => "text",
            Shape::Group(_) => "group",
        }
    }

    /// Own bounds. Groups have none; the scene derives them from children.
    pub fn bounds(&self) -> Option<Rect> {
        match self {
            Shape::Rectangle(s) => Some(s.bounds()),
            Shape::Circle(s) => Some(s.bounds()),
            Shape::Ellipse(s) => Some(s.bounds()),
            Shape::Line(s) => Some(s.bounds()),
            Shape::Text(s) => Some(s.bounds()),
            Shape::Group(_) => None,
        }
    }

    pub fn hit_test(&self, point: Point, tolerance: f64, filled: bool) -> bool {
        match self {
            Shape::Rectangle(s) => s.hit_test(point, tolerance, filled),
            Shape::Circle(s) => s.hit_test(point, tolerance, filled),
            Shape::Ellipse(s) => s.hit_test(point, tolerance, filled),
            Shape::Line(s) => s.hit_test(point, tolerance, filled),
            Shape::Text(s) => s.hit_test(point, tolerance, filled),
            Shape::Group(_) => false,
        }
    }

    pub fn translate(&mut self, delta: Vec2) {
        match self {
            Shape::Rectangle(s) => s.translate(delta),
            Shape::Circle(s) => s.translate(delta),
            Shape::Ellipse(s) => s.translate(delta),
            Shape::Line(s) => s.translate(delta),
            Shape::Text(s) => s.translate(delta),
            Shape::Group(_) => {}
        }
    }

    pub fn round(&mut self) {
        match self {
            Shape::Rectangle(s) => s.round(),
            Shape::Circle(s) => s.round(),
            Shape::Ellipse(s) => s.round(),
            Shape::Line(s) => s.round(),
            Shape::Text(s) => s.round(),
            Shape::Group(_) => {}
        }
    }

    /// The point hosts see as the element's `x`/`y`.
    pub fn reference_point(&self) -> Option<Point> {
        match self {
            Shape::Rectangle(s) => Some(s.position),
            Shape::Circle(s) => Some(s.center),
            Shape::Ellipse(s) => Some(s.center),
            Shape::Line(s) => Some(s.start),
            Shape::Text(s) => Some(s.position),
            Shape::Group(_) => None,
        }
    }

    /// Whether corner handles can resize this shape.
    pub fn is_box_resizable(&self) -> bool {
        matches!(self, Shape::Rectangle(_) | Shape::Circle(_) | Shape::Ellipse(_))
    }

    /// Replace the shape's box (rect/circle/ellipse only).
    pub fn set_bounds(&mut self, rect: Rect) {
        match self {
            Shape::Rectangle(s) => s.set_bounds(rect),
            Shape::Circle(s) => s.set_bounds(rect),
            Shape::Ellipse(s) => s.set_bounds(rect),
            Shape::Line(_) | Shape::Text(_) | Shape::Group(_) => {}
        }
    }

    pub fn as_line(&self) -> Option<&Line> {
        match self {
            Shape::Line(line) => Some(line),
            _ => None,
        }
    }

    pub fn as_line_mut(&mut self) -> Option<&mut Line> {
        match self {
            Shape::Line(line) => Some(line),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&Text> {
        match self {
            Shape::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn is_group(&self) -> bool {
        matches!(self, Shape::Group(_))
    }
}

/// An element of the scene: a shape plus identity, style and relations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    pub id: ElementId,
    pub shape: Shape,
    #[serde(default)]
    pub style: Style,
    /// Owning group. A relation only; the scene owns every element.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<ElementId>,
    #[serde(default)]
    pub provenance: Provenance,
    /// Raw `transform` attribute carried through from foreign markup.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transform: Option<String>,
}

/// Stroke width assumed for hit-testing when the style leaves it unset.
pub const DEFAULT_STROKE_WIDTH: f64 = 2.0;

impl Element {
    pub fn new(id: ElementId, shape: Shape) -> Self {
        Self {
            id,
            shape,
            style: Style::default(),
            parent_id: None,
            provenance: Provenance::Native,
            transform: None,
        }
    }

    pub fn with_style(mut self, style: Style) -> Self {
        self.style = style;
        self
    }

    pub fn with_parent(mut self, parent_id: ElementId) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    /// Check if a point hits this element's own geometry.
    pub fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        let half_stroke = self.style.stroke_width.unwrap_or(DEFAULT_STROKE_WIDTH) / 2.0;
        self.shape
            .hit_test(point, tolerance + half_stroke, self.style.is_filled())
    }

    /// True when this element is a line with at least one orphaned endpoint.
    pub fn has_orphaned_connection(&self) -> bool {
        self.shape.as_line().is_some_and(Line::is_orphaned)
    }
}

/// Distance from a point to a line segment (a→b).
pub fn point_to_segment_dist(point: Point, a: Point, b: Point) -> f64 {
    let seg = b - a;
    let pv = point - a;
    let len_sq = seg.hypot2();
    if len_sq < f64::EPSILON {
        return pv.hypot();
    }
    let t = (pv.dot(seg) / len_sq).clamp(0.0, 1.0);
    let proj = a + seg * t;
    (point - proj).hypot()
}

/// Inclusive axis-aligned overlap test (touching edges count).
pub fn rects_touch(a: Rect, b: Rect) -> bool {
    a.x0 <= b.x1 && b.x0 <= a.x1 && a.y0 <= b.y1 && b.y0 <= a.y1
}
