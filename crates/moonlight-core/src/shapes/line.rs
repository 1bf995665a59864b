//! Line shape and endpoint connections.

use super::{ElementId, ShapeGeometry, point_to_segment_dist};
use kurbo::{Point, Rect, Vec2};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Named attachment point on an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AnchorName {
    Top,
    Bottom,
    Left,
    Right,
    LineStart,
    LineEnd,
}

impl AnchorName {
    /// Edge anchors a line endpoint can bind to.
    pub const EDGES: [AnchorName; 4] = [
        AnchorName::Top,
        AnchorName::Bottom,
        AnchorName::Left,
        AnchorName::Right,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            AnchorName::Top => "top",
            AnchorName::Bottom => "bottom",
            AnchorName::Left => "left",
            AnchorName::Right => "right",
            AnchorName::LineStart => "line-start",
            AnchorName::LineEnd => "line-end",
        }
    }

    /// Whether a connection may target this anchor.
    pub fn is_connectable(self) -> bool {
        Self::EDGES.contains(&self)
    }
}

impl fmt::Display for AnchorName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AnchorName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "top" => Ok(AnchorName::Top),
            "bottom" => Ok(AnchorName::Bottom),
            "left" => Ok(AnchorName::Left),
            "right" => Ok(AnchorName::Right),
            "line-start" => Ok(AnchorName::LineStart),
            "line-end" => Ok(AnchorName::LineEnd),
            other => Err(format!("unknown anchor '{other}'")),
        }
    }
}

/// Which end of a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineEnd {
    Start,
    End,
}

impl LineEnd {
    pub fn anchor(self) -> AnchorName {
        match self {
            LineEnd::Start => AnchorName::LineStart,
            LineEnd::End => AnchorName::LineEnd,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    #[default]
    Attached,
    /// The target was removed; the endpoint is frozen.
    Orphaned,
}

/// Binding of a line endpoint to another element's anchor.
///
/// The target is referenced by id only and resolved through the scene.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    pub target: ElementId,
    pub anchor: AnchorName,
    #[serde(default)]
    pub status: ConnectionStatus,
}

impl Connection {
    pub fn new(target: ElementId, anchor: AnchorName) -> Self {
        Self {
            target,
            anchor,
            status: ConnectionStatus::Attached,
        }
    }

    pub fn is_orphaned(&self) -> bool {
        self.status == ConnectionStatus::Orphaned
    }

    /// Attribute form: `<target>:<anchor>` with `:orphaned` when orphaned.
    pub fn encode(&self) -> String {
        match self.status {
            ConnectionStatus::Attached => format!("{}:{}", self.target, self.anchor),
            ConnectionStatus::Orphaned => format!("{}:{}:orphaned", self.target, self.anchor),
        }
    }

    pub fn decode(value: &str) -> Option<Self> {
        let (rest, status) = match value.strip_suffix(":orphaned") {
            Some(rest) => (rest, ConnectionStatus::Orphaned),
            None => (value, ConnectionStatus::Attached),
        };
        let (target, anchor) = rest.rsplit_once(':')?;
        if target.is_empty() {
            return None;
        }
        Some(Self {
            target: ElementId::from(target),
            anchor: anchor.parse().ok()?,
            status,
        })
    }
}

/// A straight line segment, optionally drawn with an arrowhead at its end.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Line {
    pub start: Point,
    pub end: Point,
    #[serde(default)]
    pub arrowhead: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_connection: Option<Connection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_connection: Option<Connection>,
}

impl Line {
    /// Create a new unconnected line.
    pub fn new(start: Point, end: Point) -> Self {
        Self {
            start,
            end,
            arrowhead: false,
            start_connection: None,
            end_connection: None,
        }
    }

    pub fn with_arrowhead(mut self) -> Self {
        self.arrowhead = true;
        self
    }

    pub fn length(&self) -> f64 {
        (self.end - self.start).hypot()
    }

    pub fn endpoint(&self, end: LineEnd) -> Point {
        match end {
            LineEnd::Start => self.start,
            LineEnd::End => self.end,
        }
    }

    pub fn set_endpoint(&mut self, end: LineEnd, point: Point) {
        match end {
            LineEnd::Start => self.start = point,
            LineEnd::End => self.end = point,
        }
    }

    pub fn connection(&self, end: LineEnd) -> Option<&Connection> {
        match end {
            LineEnd::Start => self.start_connection.as_ref(),
            LineEnd::End => self.end_connection.as_ref(),
        }
    }

    pub fn connection_mut(&mut self, end: LineEnd) -> &mut Option<Connection> {
        match end {
            LineEnd::Start => &mut self.start_connection,
            LineEnd::End => &mut self.end_connection,
        }
    }

    /// Both connections with the end they belong to.
    pub fn connections(&self) -> impl Iterator<Item = (LineEnd, &Connection)> {
        self.start_connection
            .iter()
            .map(|c| (LineEnd::Start, c))
            .chain(self.end_connection.iter().map(|c| (LineEnd::End, c)))
    }

    pub fn is_orphaned(&self) -> bool {
        self.connections().any(|(_, c)| c.is_orphaned())
    }
}

impl ShapeGeometry for Line {
    fn bounds(&self) -> Rect {
        Rect::from_points(self.start, self.end)
    }

    fn hit_test(&self, point: Point, tolerance: f64, _filled: bool) -> bool {
        point_to_segment_dist(point, self.start, self.end) <= tolerance
    }

    fn translate(&mut self, delta: Vec2) {
        self.start += delta;
        self.end += delta;
    }

    fn round(&mut self) {
        self.start = self.start.round();
        self.end = self.end.round();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_creation() {
        let line = Line::new(Point::new(0.0, 0.0), Point::new(100.0, 100.0));
        assert!((line.start.x - 0.0).abs() < f64::EPSILON);
        assert!((line.end.x - 100.0).abs() < f64::EPSILON);
        assert!(!line.arrowhead);
    }

    #[test]
    fn test_line_length() {
        let line = Line::new(Point::new(0.0, 0.0), Point::new(3.0, 4.0));
        assert!((line.length() - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_hit_test() {
        let line = Line::new(Point::new(0.0, 0.0), Point::new(100.0, 0.0));
        assert!(line.hit_test(Point::new(50.0, 0.0), 1.0, false));
        assert!(line.hit_test(Point::new(50.0, 3.0), 5.0, false));
        assert!(!line.hit_test(Point::new(50.0, 10.0), 5.0, false));
    }

    #[test]
    fn test_connection_encoding() {
        let mut conn = Connection::new(ElementId::from("el-3"), AnchorName::Right);
        assert_eq!(conn.encode(), "el-3:right");
        assert_eq!(Connection::decode("el-3:right"), Some(conn.clone()));

        conn.status = ConnectionStatus::Orphaned;
        assert_eq!(conn.encode(), "el-3:right:orphaned");
        assert_eq!(Connection::decode("el-3:right:orphaned"), Some(conn));
    }

    #[test]
    fn test_connection_decode_rejects_garbage() {
        assert_eq!(Connection::decode("el-3"), None);
        assert_eq!(Connection::decode("el-3:middle"), None);
    }

    #[test]
    fn test_orphaned_line() {
        let mut line = Line::new(Point::ZERO, Point::new(10.0, 0.0));
        assert!(!line.is_orphaned());
        let mut conn = Connection::new(ElementId::from("el-1"), AnchorName::Top);
        conn.status = ConnectionStatus::Orphaned;
        line.end_connection = Some(conn);
        assert!(line.is_orphaned());
    }

    #[test]
    fn test_anchor_parse() {
        assert_eq!("line-end".parse::<AnchorName>(), Ok(AnchorName::LineEnd));
        assert!(AnchorName::Left.is_connectable());
        assert!(!AnchorName::LineStart.is_connectable());
    }
}
