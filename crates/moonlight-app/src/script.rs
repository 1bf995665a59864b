//! Operation scripts replayed against a document.
//!
//! A script is a JSON array of operations, each tagged by `op`:
//!
//! ```json
//! [
//!   { "op": "insert", "shape": "rectangle", "x": 100, "y": 100 },
//!   { "op": "move", "ids": ["el-1"], "dx": 20, "dy": 0 },
//!   { "op": "undo" }
//! ]
//! ```
//!
//! Operations without explicit ids act on the current selection.

use kurbo::{Point, Rect, Vec2};
use moonlight_core::{
    Corner, ElementId, Engine, EngineResult, KeyInput, Modifiers, ShapeKind, StylePatch,
};
use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "op", rename_all = "kebab-case")]
pub enum Operation {
    /// Insert a default-size shape, centred on `x`/`y` or the view.
    Insert {
        shape: ShapeKind,
        x: Option<f64>,
        y: Option<f64>,
    },
    Select {
        ids: Vec<ElementId>,
    },
    SelectAll,
    Deselect,
    Move {
        #[serde(default)]
        ids: Vec<ElementId>,
        dx: f64,
        dy: f64,
    },
    Resize {
        id: ElementId,
        corner: Corner,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    },
    Restyle {
        style: StylePatch,
    },
    EditText {
        id: ElementId,
        content: String,
    },
    Delete {
        #[serde(default)]
        ids: Vec<ElementId>,
    },
    Duplicate,
    Copy,
    Cut,
    Paste,
    Group,
    Ungroup,
    BringToFront,
    SendToBack,
    Undo,
    Redo,
    Clear,
    /// A raw key press, routed through the shortcut table.
    Key {
        key: String,
        #[serde(default)]
        ctrl: bool,
        #[serde(default)]
        shift: bool,
    },
}

impl Operation {
    pub fn name(&self) -> &'static str {
        match self {
            Operation::Insert { .. } => "insert",
            Operation::Select { .. } => "select",
            Operation::SelectAll => "select-all",
            Operation::Deselect => "deselect",
            Operation::Move { .. } => "move",
            Operation::Resize { .. } => "resize",
            Operation::Restyle { .. } => "restyle",
            Operation::EditText { .. } => "edit-text",
            Operation::Delete { .. } => "delete",
            Operation::Duplicate => "duplicate",
            Operation::Copy => "copy",
            Operation::Cut => "cut",
            Operation::Paste => "paste",
            Operation::Group => "group",
            Operation::Ungroup => "ungroup",
            Operation::BringToFront => "bring-to-front",
            Operation::SendToBack => "send-to-back",
            Operation::Undo => "undo",
            Operation::Redo => "redo",
            Operation::Clear => "clear",
            Operation::Key { .. } => "key",
        }
    }

    /// Run the operation. No-op outcomes (nothing to undo, an empty
    /// selection) are not errors.
    pub fn apply(&self, engine: &mut Engine) -> EngineResult<()> {
        match self {
            Operation::Insert { shape, x, y } => {
                let center = x.zip(*y).map(|(x, y)| Point::new(x, y));
                let id = engine.insert_shape(*shape, center)?;
                log::debug!("inserted {id}");
            }
            Operation::Select { ids } => engine.select(ids)?,
            Operation::SelectAll => engine.select_all(),
            Operation::Deselect => engine.deselect(),
            Operation::Move { ids, dx, dy } => {
                let ids = or_selection(engine, ids);
                engine.move_elements(&ids, Vec2::new(*dx, *dy))?;
            }
            Operation::Resize {
                id,
                corner,
                x,
                y,
                width,
                height,
            } => {
                let bounds = Rect::new(*x, *y, x + width, y + height);
                engine.resize_element(id, *corner, bounds)?;
            }
            Operation::Restyle { style } => {
                engine.restyle_selection(style.clone())?;
            }
            Operation::EditText { id, content } => {
                engine.edit_text(id, content)?;
            }
            Operation::Delete { ids } => {
                let ids = or_selection(engine, ids);
                engine.delete_elements(&ids)?;
            }
            Operation::Duplicate => {
                engine.duplicate_selection()?;
            }
            Operation::Copy => {
                engine.copy();
            }
            Operation::Cut => engine.cut()?,
            Operation::Paste => {
                engine.paste()?;
            }
            Operation::Group => {
                engine.group_selection()?;
            }
            Operation::Ungroup => {
                engine.ungroup_selection()?;
            }
            Operation::BringToFront => engine.bring_to_front()?,
            Operation::SendToBack => engine.send_to_back()?,
            Operation::Undo => {
                engine.undo();
            }
            Operation::Redo => {
                engine.redo();
            }
            Operation::Clear => engine.clear()?,
            Operation::Key { key, ctrl, shift } => {
                let modifiers = Modifiers {
                    ctrl: *ctrl,
                    shift: *shift,
                    ..Modifiers::NONE
                };
                if !engine.key_down(&KeyInput::new(key.as_str()).with_modifiers(modifiers)) {
                    log::info!("key {key:?} had no effect");
                }
            }
        }
        Ok(())
    }
}

fn or_selection(engine: &Engine, ids: &[ElementId]) -> Vec<ElementId> {
    if ids.is_empty() {
        engine.selected_ids()
    } else {
        ids.to_vec()
    }
}

/// Parse a script document.
pub fn parse_script(json: &str) -> Result<Vec<Operation>, serde_json::Error> {
    serde_json::from_str(json)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_script() {
        let ops = parse_script(
            r#"[
                {"op": "insert", "shape": "circle"},
                {"op": "insert", "shape": "rectangle", "x": 10, "y": 20},
                {"op": "restyle", "style": {"fill": "red", "strokeWidth": 4}},
                {"op": "key", "key": "z", "ctrl": true},
                {"op": "bring-to-front"}
            ]"#,
        )
        .unwrap();
        assert_eq!(
            ops[0],
            Operation::Insert {
                shape: ShapeKind::Circle,
                x: None,
                y: None
            }
        );
        assert_eq!(
            ops[2],
            Operation::Restyle {
                style: StylePatch {
                    fill: Some("red".into()),
                    stroke: None,
                    stroke_width: Some(4.0),
                }
            }
        );
        assert_eq!(ops[4].name(), "bring-to-front");
    }

    #[test]
    fn test_unknown_op_rejected() {
        assert!(parse_script(r#"[{"op": "explode"}]"#).is_err());
    }

    #[test]
    fn test_move_defaults_to_selection() {
        let mut engine = Engine::new(Default::default()).unwrap();
        let id = engine
            .insert_shape(ShapeKind::Rectangle, Some(Point::new(100.0, 100.0)))
            .unwrap();
        Operation::Move {
            ids: Vec::new(),
            dx: 5.0,
            dy: -5.0,
        }
        .apply(&mut engine)
        .unwrap();
        let info = engine.element_by_id(&id).unwrap();
        assert_eq!((info.x, info.y), (45.0, 55.0));
    }

    #[test]
    fn test_key_routes_through_shortcuts() {
        let mut engine = Engine::new(Default::default()).unwrap();
        engine.insert_shape(ShapeKind::Circle, None).unwrap();
        Operation::Key {
            key: "z".into(),
            ctrl: true,
            shift: false,
        }
        .apply(&mut engine)
        .unwrap();
        assert!(engine.elements().is_empty());
    }
}
