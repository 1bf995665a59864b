//! Undoable commands and the undo/redo history.

use crate::error::{EngineError, EngineResult};
use crate::handles::Corner;
use crate::scene::{Scene, ZOrder};
use crate::shapes::{Connection, Element, ElementId, LineEnd, StylePatch};
use kurbo::{Point, Rect, Vec2};
use std::collections::{HashSet, VecDeque};

/// Default number of undo steps kept.
pub const DEFAULT_HISTORY_LIMIT: usize = 100;

/// A user-visible mutation. Each executes as exactly one undo step.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Insert { elements: Vec<Element> },
    Delete { ids: Vec<ElementId> },
    Move { ids: Vec<ElementId>, delta: Vec2 },
    Resize { id: ElementId, corner: Corner, bounds: Rect },
    MoveEndpoint {
        id: ElementId,
        end: LineEnd,
        point: Point,
        connection: Option<Connection>,
    },
    Restyle { ids: Vec<ElementId>, patch: StylePatch },
    EditText { id: ElementId, content: String },
    Duplicate { ids: Vec<ElementId>, offset: Vec2 },
    Paste {
        elements: Vec<Element>,
        roots: Vec<ElementId>,
        offset: Vec2,
    },
    Reorder { ids: Vec<ElementId>, to: ZOrder },
    Group { ids: Vec<ElementId> },
    Ungroup { ids: Vec<ElementId> },
    Clear,
}

impl Command {
    /// Short name for logs.
    pub fn label(&self) -> &'static str {
        match self {
            Command::Insert { .. } => "insert",
            Command::Delete { .. } => "delete",
            Command::Move { .. } => "move",
            Command::Resize { .. } => "resize",
            Command::MoveEndpoint { .. } => "move-endpoint",
            Command::Restyle { .. } => "restyle",
            Command::EditText { .. } => "edit-text",
            Command::Duplicate { .. } => "duplicate",
            Command::Paste { .. } => "paste",
            Command::Reorder { .. } => "reorder",
            Command::Group { .. } => "group",
            Command::Ungroup { .. } => "ungroup",
            Command::Clear => "clear",
        }
    }

    /// Apply to a scene. Returns the ids the command produced (new elements
    /// for insert/duplicate/paste/group, freed members for ungroup).
    pub fn apply(&self, scene: &mut Scene) -> EngineResult<Vec<ElementId>> {
        match self {
            Command::Insert { elements } => {
                for element in elements {
                    scene.insert(element.clone());
                }
                Ok(elements.iter().map(|e| e.id.clone()).collect())
            }
            Command::Delete { ids } => {
                scene.remove_all(ids)?;
                Ok(Vec::new())
            }
            Command::Move { ids, delta } => {
                scene.translate(ids, integral(*delta))?;
                Ok(Vec::new())
            }
            Command::Resize { id, corner, bounds } => {
                scene.resize(id, *corner, *bounds)?;
                Ok(Vec::new())
            }
            Command::MoveEndpoint {
                id,
                end,
                point,
                connection,
            } => {
                scene.move_endpoint(id, *end, *point, connection.clone())?;
                Ok(Vec::new())
            }
            Command::Restyle { ids, patch } => {
                if let Some(color) = patch.invalid_color() {
                    return Err(EngineError::InvalidColor(color.to_string()));
                }
                for id in ids {
                    scene.restyle(id, patch)?;
                }
                Ok(Vec::new())
            }
            Command::EditText { id, content } => {
                scene.set_text(id, content)?;
                Ok(Vec::new())
            }
            Command::Duplicate { ids, offset } => scene.duplicate(ids, integral(*offset)),
            Command::Paste {
                elements,
                roots,
                offset,
            } => Ok(scene.paste(elements, roots, integral(*offset))),
            Command::Reorder { ids, to } => {
                scene.reorder(ids, *to)?;
                Ok(Vec::new())
            }
            Command::Group { ids } => Ok(scene.group(ids)?.into_iter().collect()),
            Command::Ungroup { ids } => {
                let mut freed = Vec::new();
                for id in ids {
                    freed.extend(scene.ungroup(id)?);
                }
                Ok(freed)
            }
            Command::Clear => {
                scene.clear();
                Ok(Vec::new())
            }
        }
    }
}

/// Persisted coordinates stay integral, whoever supplies the delta.
fn integral(delta: Vec2) -> Vec2 {
    Vec2::new(delta.x.round(), delta.y.round())
}

/// Exact before/after state of what one command changed.
#[derive(Debug, Clone, PartialEq)]
pub struct ScenePatch {
    before: Vec<(ElementId, Option<Element>)>,
    after: Vec<(ElementId, Option<Element>)>,
    order_before: Option<Vec<ElementId>>,
    order_after: Option<Vec<ElementId>>,
}

impl ScenePatch {
    /// Diff two scenes. Only elements that differ are recorded; the order
    /// is recorded only when it changed.
    pub fn diff(before: &Scene, after: &Scene) -> Self {
        let mut ids: Vec<ElementId> = before.ids();
        let known: HashSet<ElementId> = ids.iter().cloned().collect();
        ids.extend(after.ids().into_iter().filter(|id| !known.contains(id)));

        let mut patch = ScenePatch {
            before: Vec::new(),
            after: Vec::new(),
            order_before: None,
            order_after: None,
        };
        for id in ids {
            let old = before.get(&id);
            let new = after.get(&id);
            if old != new {
                patch.before.push((id.clone(), old.cloned()));
                patch.after.push((id, new.cloned()));
            }
        }
        let order_before = before.ids();
        let order_after = after.ids();
        if order_before != order_after {
            patch.order_before = Some(order_before);
            patch.order_after = Some(order_after);
        }
        patch
    }

    pub fn is_empty(&self) -> bool {
        self.before.is_empty() && self.order_before.is_none()
    }

    /// Ids present after but not before.
    pub fn added(&self) -> Vec<ElementId> {
        self.after
            .iter()
            .zip(&self.before)
            .filter(|((_, new), (_, old))| new.is_some() && old.is_none())
            .map(|((id, _), _)| id.clone())
            .collect()
    }

    /// Ids present before but not after.
    pub fn removed(&self) -> Vec<ElementId> {
        self.after
            .iter()
            .zip(&self.before)
            .filter(|((_, new), (_, old))| new.is_none() && old.is_some())
            .map(|((id, _), _)| id.clone())
            .collect()
    }

    pub fn revert(&self, scene: &mut Scene) {
        scene.restore(&self.before, self.order_before.as_deref());
    }

    pub fn reapply(&self, scene: &mut Scene) {
        scene.restore(&self.after, self.order_after.as_deref());
    }
}

/// One recorded history entry.
#[derive(Debug, Clone)]
struct Entry {
    label: &'static str,
    patch: ScenePatch,
}

/// What a history step did to the scene.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Step {
    pub label: &'static str,
    pub added: Vec<ElementId>,
    pub removed: Vec<ElementId>,
    /// Ids produced by the command (only set by `execute`).
    pub produced: Vec<ElementId>,
}

/// Undo/redo stacks, scoped to one engine instance.
#[derive(Debug, Clone)]
pub struct History {
    undo_stack: VecDeque<Entry>,
    redo_stack: Vec<Entry>,
    limit: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_LIMIT)
    }
}

impl History {
    pub fn new(limit: usize) -> Self {
        Self {
            undo_stack: VecDeque::new(),
            redo_stack: Vec::new(),
            limit: limit.max(1),
        }
    }

    /// Apply a command and record it.
    ///
    /// A failing command leaves the scene as it was. A command that changes
    /// nothing is not recorded and returns `None`.
    pub fn execute(&mut self, scene: &mut Scene, command: Command) -> EngineResult<Option<Step>> {
        let before = scene.clone();
        let produced = match command.apply(scene) {
            Ok(produced) => produced,
            Err(err) => {
                *scene = before;
                return Err(err);
            }
        };

        let patch = ScenePatch::diff(&before, scene);
        if patch.is_empty() {
            log::debug!("{} changed nothing; not recorded", command.label());
            return Ok(None);
        }

        let step = Step {
            label: command.label(),
            added: patch.added(),
            removed: patch.removed(),
            produced,
        };
        log::debug!(
            "{}: {} element(s) changed",
            command.label(),
            patch.before.len()
        );
        self.undo_stack.push_back(Entry {
            label: command.label(),
            patch,
        });
        self.redo_stack.clear();
        while self.undo_stack.len() > self.limit {
            self.undo_stack.pop_front();
        }
        Ok(Some(step))
    }

    /// Undo the last step. Returns `None` (and changes nothing) when there
    /// is nothing to undo.
    pub fn undo(&mut self, scene: &mut Scene) -> Option<Step> {
        let entry = self.undo_stack.pop_back()?;
        entry.patch.revert(scene);
        let step = Step {
            label: entry.label,
            added: entry.patch.removed(),
            removed: entry.patch.added(),
            produced: Vec::new(),
        };
        self.redo_stack.push(entry);
        Some(step)
    }

    /// Redo the last undone step. Returns `None` when there is nothing to
    /// redo.
    pub fn redo(&mut self, scene: &mut Scene) -> Option<Step> {
        let entry = self.redo_stack.pop()?;
        entry.patch.reapply(scene);
        let step = Step {
            label: entry.label,
            added: entry.patch.added(),
            removed: entry.patch.removed(),
            produced: Vec::new(),
        };
        self.undo_stack.push_back(entry);
        Some(step)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_len(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_len(&self) -> usize {
        self.redo_stack.len()
    }

    /// Forget everything (a new document starts).
    pub fn reset(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}
