//! Pointer and keyboard input types, with click tracking.

use crate::shapes::ElementId;
use kurbo::{Point, Vec2};
use serde::{Deserialize, Serialize};

/// Mouse button identifiers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MouseButton {
    #[default]
    Left,
    Right,
    Middle,
}

/// Modifier keys state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modifiers {
    #[serde(default)]
    pub shift: bool,
    #[serde(default)]
    pub ctrl: bool,
    #[serde(default)]
    pub alt: bool,
    #[serde(default)]
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        shift: false,
        ctrl: false,
        alt: false,
        meta: false,
    };

    pub fn shift() -> Self {
        Self {
            shift: true,
            ..Self::NONE
        }
    }

    pub fn ctrl() -> Self {
        Self {
            ctrl: true,
            ..Self::NONE
        }
    }

    /// Ctrl on most platforms, Cmd on macOS.
    pub fn command(&self) -> bool {
        self.ctrl || self.meta
    }
}

/// A pointer event as delivered by the host.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PointerInput {
    /// Position in screen (viewport) pixels.
    pub position: Point,
    #[serde(default)]
    pub button: MouseButton,
    #[serde(default)]
    pub modifiers: Modifiers,
    /// Host timestamp in milliseconds.
    #[serde(default)]
    pub time_ms: u64,
}

impl PointerInput {
    pub fn at(x: f64, y: f64) -> Self {
        Self {
            position: Point::new(x, y),
            button: MouseButton::Left,
            modifiers: Modifiers::NONE,
            time_ms: 0,
        }
    }

    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    pub fn at_time(mut self, time_ms: u64) -> Self {
        self.time_ms = time_ms;
        self
    }
}

/// A key press as delivered by the host, using DOM key names
/// (`"Escape"`, `"Delete"`, `"z"`, `"]"`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyInput {
    pub key: String,
    #[serde(default)]
    pub modifiers: Modifiers,
}

impl KeyInput {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            modifiers: Modifiers::NONE,
        }
    }

    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    /// Lowercased key for letter shortcuts (Shift turns `z` into `Z`).
    pub fn normalized(&self) -> String {
        if self.key.chars().count() == 1 {
            self.key.to_lowercase()
        } else {
            self.key.clone()
        }
    }
}

/// Double-click detection constants.
pub const DOUBLE_CLICK_TIME_MS: u64 = 500;
pub const DOUBLE_CLICK_DISTANCE: f64 = 5.0;
/// A press-release travelling less than this (screen px) is a click.
pub const CLICK_DISTANCE: f64 = 3.0;

/// Tracks presses and drags across pointer events.
#[derive(Debug, Clone, Default)]
pub struct InputState {
    /// Current pointer position in screen coordinates.
    pub pointer_position: Point,
    pub modifiers: Modifiers,
    /// Start position of the current press.
    pub drag_start: Option<Point>,
    last_click: Option<(u64, Point, Option<ElementId>)>,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a press on `target`. Returns true if it completes a
    /// double-click: same target, within the time and distance windows.
    pub fn press(&mut self, input: &PointerInput, target: Option<&ElementId>) -> bool {
        self.pointer_position = input.position;
        self.modifiers = input.modifiers;
        self.drag_start = Some(input.position);

        let is_double = self.last_click.as_ref().is_some_and(|(time, pos, last)| {
            input.time_ms.saturating_sub(*time) <= DOUBLE_CLICK_TIME_MS
                && (input.position - *pos).hypot() <= DOUBLE_CLICK_DISTANCE
                && last.as_ref() == target
        });
        if is_double {
            // Reset so a third press does not count again
            self.last_click = None;
        } else {
            self.last_click = Some((input.time_ms, input.position, target.cloned()));
        }
        is_double
    }

    pub fn moved(&mut self, input: &PointerInput) {
        self.pointer_position = input.position;
        self.modifiers = input.modifiers;
    }

    pub fn release(&mut self, input: &PointerInput) {
        self.pointer_position = input.position;
        self.drag_start = None;
    }

    /// Screen-space drag delta from the press position.
    pub fn drag_delta(&self) -> Option<Vec2> {
        self.drag_start.map(|start| self.pointer_position - start)
    }

    /// Whether the current press has stayed within click distance.
    pub fn is_click(&self) -> bool {
        self.drag_delta()
            .is_none_or(|delta| delta.hypot() < CLICK_DISTANCE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drag_tracking() {
        let mut input = InputState::new();
        input.press(&PointerInput::at(100.0, 100.0), None);
        assert_eq!(input.drag_start, Some(Point::new(100.0, 100.0)));

        input.moved(&PointerInput::at(150.0, 120.0));
        let delta = input.drag_delta().unwrap();
        assert!((delta.x - 50.0).abs() < f64::EPSILON);
        assert!((delta.y - 20.0).abs() < f64::EPSILON);
        assert!(!input.is_click());

        input.release(&PointerInput::at(150.0, 120.0));
        assert!(input.drag_delta().is_none());
    }

    #[test]
    fn test_double_click_detection() {
        let mut input = InputState::new();
        let target = ElementId::from("el-1");

        assert!(!input.press(&PointerInput::at(100.0, 100.0).at_time(1000), Some(&target)));
        input.release(&PointerInput::at(100.0, 100.0));
        assert!(input.press(&PointerInput::at(102.0, 101.0).at_time(1300), Some(&target)));
        // Third press starts over
        assert!(!input.press(&PointerInput::at(102.0, 101.0).at_time(1400), Some(&target)));
    }

    #[test]
    fn test_double_click_too_slow() {
        let mut input = InputState::new();
        input.press(&PointerInput::at(100.0, 100.0).at_time(0), None);
        assert!(!input.press(&PointerInput::at(100.0, 100.0).at_time(600), None));
    }

    #[test]
    fn test_double_click_too_far() {
        let mut input = InputState::new();
        input.press(&PointerInput::at(100.0, 100.0).at_time(0), None);
        assert!(!input.press(&PointerInput::at(200.0, 200.0).at_time(100), None));
    }

    #[test]
    fn test_double_click_needs_same_target() {
        let mut input = InputState::new();
        let a = ElementId::from("el-1");
        let b = ElementId::from("el-2");
        input.press(&PointerInput::at(10.0, 10.0).at_time(0), Some(&a));
        assert!(!input.press(&PointerInput::at(10.0, 10.0).at_time(100), Some(&b)));
    }

    #[test]
    fn test_key_normalization() {
        assert_eq!(KeyInput::new("Z").normalized(), "z");
        assert_eq!(KeyInput::new("Escape").normalized(), "Escape");
        assert!(Modifiers { meta: true, ..Modifiers::NONE }.command());
    }
}
