//! Keyboard shortcut registry.

use crate::input::KeyInput;
use crate::shapes::ShapeKind;
use serde::Serialize;

/// What a shortcut does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case", tag = "action", content = "kind")]
pub enum Action {
    Delete,
    Cancel,
    Duplicate,
    Undo,
    Redo,
    SelectAll,
    Copy,
    Cut,
    Paste,
    Group,
    Ungroup,
    BringToFront,
    SendToBack,
    Insert(ShapeKind),
}

impl Action {
    /// Whether the action changes the document (blocked when readonly).
    pub fn is_mutating(self) -> bool {
        !matches!(
            self,
            Action::Cancel | Action::SelectAll | Action::Copy
        )
    }
}

/// A keyboard shortcut definition.
#[derive(Debug, Clone, Serialize)]
pub struct Shortcut {
    pub key: &'static str,
    /// Ctrl, or Cmd on macOS.
    pub ctrl: bool,
    pub shift: bool,
    pub action: Action,
    pub description: &'static str,
}

impl Shortcut {
    pub const fn new(
        key: &'static str,
        ctrl: bool,
        shift: bool,
        action: Action,
        description: &'static str,
    ) -> Self {
        Self {
            key,
            ctrl,
            shift,
            action,
            description,
        }
    }

    /// Format the shortcut for display (e.g., "Ctrl+Shift+Z").
    pub fn format(&self) -> String {
        let mut parts = Vec::new();
        if self.ctrl {
            parts.push("Ctrl");
        }
        if self.shift {
            parts.push("Shift");
        }
        let key = self.key.to_uppercase();
        parts.push(&key);
        parts.join("+")
    }

    fn matches(&self, input: &KeyInput) -> bool {
        let key = input.normalized();
        if key != self.key {
            return false;
        }
        // Digits and brackets ignore Shift; layouts differ on where they live
        let shift_matters = self.ctrl || self.key.chars().all(char::is_alphabetic);
        input.modifiers.command() == self.ctrl
            && (!shift_matters || input.modifiers.shift == self.shift)
    }
}

/// Registry of all keyboard shortcuts.
pub struct ShortcutRegistry;

impl ShortcutRegistry {
    /// Get all registered shortcuts.
    pub fn all() -> Vec<Shortcut> {
        vec![
            Shortcut::new("Delete", false, false, Action::Delete, "Delete selected elements"),
            Shortcut::new("Backspace", false, false, Action::Delete, "Delete selected elements"),
            Shortcut::new("Escape", false, false, Action::Cancel, "Cancel gesture or deselect"),
            Shortcut::new("d", true, false, Action::Duplicate, "Duplicate selection"),
            Shortcut::new("z", true, false, Action::Undo, "Undo"),
            Shortcut::new("z", true, true, Action::Redo, "Redo"),
            Shortcut::new("y", true, false, Action::Redo, "Redo"),
            Shortcut::new("a", true, false, Action::SelectAll, "Select all elements"),
            Shortcut::new("c", true, false, Action::Copy, "Copy selection"),
            Shortcut::new("x", true, false, Action::Cut, "Cut selection"),
            Shortcut::new("v", true, false, Action::Paste, "Paste"),
            Shortcut::new("g", true, false, Action::Group, "Group selection"),
            Shortcut::new("g", true, true, Action::Ungroup, "Ungroup selection"),
            Shortcut::new("]", false, false, Action::BringToFront, "Bring to front"),
            Shortcut::new("[", false, false, Action::SendToBack, "Send to back"),
            Shortcut::new("1", false, false, Action::Insert(ShapeKind::Rectangle), "Insert rectangle"),
            Shortcut::new("2", false, false, Action::Insert(ShapeKind::Circle), "Insert circle"),
            Shortcut::new("3", false, false, Action::Insert(ShapeKind::Ellipse), "Insert ellipse"),
            Shortcut::new("4", false, false, Action::Insert(ShapeKind::Line), "Insert line"),
            Shortcut::new("5", false, false, Action::Insert(ShapeKind::Arrow), "Insert arrow"),
            Shortcut::new("6", false, false, Action::Insert(ShapeKind::Text), "Insert text"),
        ]
    }

    /// Find the action bound to a key press.
    pub fn lookup(input: &KeyInput) -> Option<Action> {
        Self::all()
            .into_iter()
            .find(|s| s.matches(input))
            .map(|s| s.action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::Modifiers;

    fn ctrl_shift() -> Modifiers {
        Modifiers {
            ctrl: true,
            shift: true,
            ..Modifiers::NONE
        }
    }

    #[test]
    fn test_undo_redo_bindings() {
        let undo = KeyInput::new("z").with_modifiers(Modifiers::ctrl());
        assert_eq!(ShortcutRegistry::lookup(&undo), Some(Action::Undo));

        let redo = KeyInput::new("Z").with_modifiers(ctrl_shift());
        assert_eq!(ShortcutRegistry::lookup(&redo), Some(Action::Redo));

        let cmd = Modifiers {
            meta: true,
            ..Modifiers::NONE
        };
        let redo_y = KeyInput::new("y").with_modifiers(cmd);
        assert_eq!(ShortcutRegistry::lookup(&redo_y), Some(Action::Redo));
    }

    #[test]
    fn test_number_keys_insert() {
        assert_eq!(
            ShortcutRegistry::lookup(&KeyInput::new("5")),
            Some(Action::Insert(ShapeKind::Arrow))
        );
        assert_eq!(ShortcutRegistry::lookup(&KeyInput::new("9")), None);
    }

    #[test]
    fn test_plain_letter_is_not_a_shortcut() {
        assert_eq!(ShortcutRegistry::lookup(&KeyInput::new("z")), None);
    }

    #[test]
    fn test_format() {
        let shortcuts = ShortcutRegistry::all();
        let redo = shortcuts
            .iter()
            .find(|s| s.action == Action::Redo && s.shift)
            .unwrap();
        assert_eq!(redo.format(), "Ctrl+Shift+Z");
    }

    #[test]
    fn test_mutating_actions() {
        assert!(Action::Delete.is_mutating());
        assert!(!Action::SelectAll.is_mutating());
    }
}
