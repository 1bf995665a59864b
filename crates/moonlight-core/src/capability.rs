//! Per-element edit permissions.

use crate::shapes::{Element, Provenance};
use serde::{Deserialize, Serialize};

/// What the user may do with an element.
///
/// Derived on every query from provenance and connection state; never
/// stored. Layer reordering is always allowed and is not part of this set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Capability {
    pub can_move: bool,
    pub can_resize: bool,
    pub can_restyle: bool,
    pub can_connect: bool,
}

impl Capability {
    pub const FULL: Capability = Capability {
        can_move: true,
        can_resize: true,
        can_restyle: true,
        can_connect: true,
    };

    pub const MOVE_ONLY: Capability = Capability {
        can_move: true,
        can_resize: false,
        can_restyle: false,
        can_connect: false,
    };
}

/// Resolve the capability of an element.
///
/// An orphaned line is move/delete-only, then plain imports are
/// move/delete-only, otherwise everything is allowed.
pub fn capability_of(element: &Element) -> Capability {
    if element.has_orphaned_connection() {
        return Capability::MOVE_ONLY;
    }
    match element.provenance {
        Provenance::Plain => Capability::MOVE_ONLY,
        Provenance::Native => Capability::FULL,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::{
        AnchorName, Connection, ConnectionStatus, ElementId, Line, Rectangle, Shape,
    };
    use kurbo::Point;

    #[test]
    fn test_native_is_full() {
        let element = Element::new(
            ElementId::from("el-1"),
            Shape::Rectangle(Rectangle::new(Point::ZERO, 10.0, 10.0)),
        );
        assert_eq!(capability_of(&element), Capability::FULL);
    }

    #[test]
    fn test_plain_is_move_only() {
        let mut element = Element::new(
            ElementId::from("el-1"),
            Shape::Rectangle(Rectangle::new(Point::ZERO, 10.0, 10.0)),
        );
        element.provenance = Provenance::Plain;
        let cap = capability_of(&element);
        assert!(cap.can_move);
        assert!(!cap.can_resize);
        assert!(!cap.can_restyle);
        assert!(!cap.can_connect);
    }

    #[test]
    fn test_orphaned_line_is_move_only() {
        let mut line = Line::new(Point::ZERO, Point::new(10.0, 0.0));
        let mut conn = Connection::new(ElementId::from("el-5"), AnchorName::Left);
        conn.status = ConnectionStatus::Orphaned;
        line.end_connection = Some(conn);
        let element = Element::new(ElementId::from("el-6"), Shape::Line(line));
        assert_eq!(capability_of(&element), Capability::MOVE_ONLY);
    }

    #[test]
    fn test_capability_serializes_camel_case() {
        let json = serde_json::to_value(Capability::FULL).unwrap();
        assert_eq!(json["canResize"], true);
    }
}
