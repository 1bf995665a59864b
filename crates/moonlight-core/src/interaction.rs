//! Pointer/keyboard state machine and the editing operations it drives.
//!
//! The [`Editor`] owns the scene, selection, history and camera of one
//! editor instance. Gestures preview on the live scene from a snapshot taken
//! when they start; releasing restores the snapshot and executes exactly one
//! command through the history.

use crate::camera::Camera;
use crate::capability::{Capability, capability_of};
use crate::error::{EngineError, EngineResult};
use crate::handles::{Anchor, Corner, Handle, HandleKind, anchors_of, hit_test_handles, resize_box, resize_handles_of};
use crate::history::{Command, History, Step};
use crate::input::{InputState, KeyInput, PointerInput};
use crate::scene::{Scene, ZOrder};
use crate::selection::Selection;
use crate::shapes::{
    AnchorName, Connection, Element, ElementId, LineEnd, Shape, ShapeKind, StylePatch,
};
use crate::shortcuts::{Action, ShortcutRegistry};
use crate::snap::{ANCHOR_SNAP_TOLERANCE, Grid, SnapTarget, snap_to_anchors};
use kurbo::{Point, Rect, Vec2};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Minimum drag, in scene units, for an anchor drag to create a line.
pub const CONNECT_THRESHOLD: f64 = 10.0;
/// Offset applied by duplicate and by each successive paste.
pub const PASTE_OFFSET: f64 = 20.0;
/// Element hit tolerance in screen pixels.
pub const HIT_TOLERANCE: f64 = 4.0;

/// Active tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ToolMode {
    #[default]
    Select,
    Pan,
    /// Drag (or click) on the canvas creates this kind of shape.
    Shape(ShapeKind),
}

impl ToolMode {
    pub fn as_str(self) -> &'static str {
        match self {
            ToolMode::Select => "select",
            ToolMode::Pan => "pan",
            ToolMode::Shape(kind) => kind.as_str(),
        }
    }
}

impl fmt::Display for ToolMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ToolMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "select" => Ok(ToolMode::Select),
            "pan" => Ok(ToolMode::Pan),
            other => ShapeKind::parse(other)
                .map(ToolMode::Shape)
                .ok_or_else(|| format!("unknown mode '{other}'")),
        }
    }
}

/// In-progress gesture.
#[derive(Debug, Clone, Default)]
enum Gesture {
    #[default]
    Idle,
    SelectingBox {
        start: Point,
        current: Point,
    },
    DraggingMove {
        base: Scene,
        ids: Vec<ElementId>,
        start: Point,
        origin: Point,
        delta: Vec2,
    },
    DraggingResize {
        base: Scene,
        id: ElementId,
        corner: Corner,
        original: Rect,
        bounds: Rect,
    },
    DraggingConnect {
        source: ElementId,
        anchor: AnchorName,
        /// Anchor position; the new line starts here.
        start: Point,
        /// Where the pointer went down, within tolerance of `start`.
        press: Point,
        current: Point,
    },
    DraggingEndpoint {
        base: Scene,
        id: ElementId,
        end: LineEnd,
        point: Point,
        connection: Option<Connection>,
    },
    Creating {
        kind: ShapeKind,
        start: Point,
        current: Point,
    },
    Panning {
        last: Point,
    },
    EditingText {
        id: ElementId,
        original: String,
        buffer: String,
    },
}

/// Name of the current gesture, for hosts and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GestureKind {
    Idle,
    SelectingBox,
    DraggingMove,
    DraggingResize,
    DraggingConnect,
    DraggingEndpoint,
    Creating,
    Panning,
    EditingText,
}

/// Copied elements waiting to be pasted.
#[derive(Debug, Clone, Default)]
struct Clipboard {
    elements: Vec<Element>,
    roots: Vec<ElementId>,
    pastes: u32,
}

/// An anchor belonging to an element, as shown to the renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementAnchor {
    pub element: ElementId,
    #[serde(flatten)]
    pub anchor: Anchor,
}

/// Everything the renderer draws on top of the scene.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Overlay {
    pub selection_bounds: Option<Rect>,
    pub handles: Vec<Handle>,
    pub anchors: Vec<ElementAnchor>,
    pub marquee: Option<Rect>,
    /// Start and end of the line an anchor drag would create.
    pub connect_preview: Option<(Point, Point)>,
    /// Text element being edited and its current buffer.
    pub editing: Option<(ElementId, String)>,
}

/// Editing state of one editor instance.
#[derive(Debug, Clone)]
pub struct Editor {
    pub scene: Scene,
    pub selection: Selection,
    pub history: History,
    pub camera: Camera,
    pub grid: Grid,
    readonly: bool,
    mode: ToolMode,
    gesture: Gesture,
    input: InputState,
    clipboard: Option<Clipboard>,
    last_pointer: Option<Point>,
    steps: Vec<Step>,
}

impl Editor {
    pub fn new(camera: Camera, grid: Grid, history_limit: usize) -> Self {
        Self {
            scene: Scene::new(),
            selection: Selection::new(),
            history: History::new(history_limit),
            camera,
            grid,
            readonly: false,
            mode: ToolMode::Select,
            gesture: Gesture::Idle,
            input: InputState::new(),
            clipboard: None,
            last_pointer: None,
            steps: Vec::new(),
        }
    }

    pub fn mode(&self) -> ToolMode {
        self.mode
    }

    /// Switch tools. Any gesture in progress is cancelled.
    pub fn set_mode(&mut self, mode: ToolMode) {
        if mode != self.mode {
            self.cancel_gesture();
            self.mode = mode;
        }
    }

    pub fn is_readonly(&self) -> bool {
        self.readonly
    }

    /// Toggle readonly. Entering readonly cancels the current gesture.
    pub fn set_readonly(&mut self, readonly: bool) {
        if readonly {
            self.cancel_gesture();
        }
        self.readonly = readonly;
    }

    pub fn gesture(&self) -> GestureKind {
        match self.gesture {
            Gesture::Idle => GestureKind::Idle,
            Gesture::SelectingBox { .. } => GestureKind::SelectingBox,
            Gesture::DraggingMove { .. } => GestureKind::DraggingMove,
            Gesture::DraggingResize { .. } => GestureKind::DraggingResize,
            Gesture::DraggingConnect { .. } => GestureKind::DraggingConnect,
            Gesture::DraggingEndpoint { .. } => GestureKind::DraggingEndpoint,
            Gesture::Creating { .. } => GestureKind::Creating,
            Gesture::Panning { .. } => GestureKind::Panning,
            Gesture::EditingText { .. } => GestureKind::EditingText,
        }
    }

    /// History steps taken since the last call.
    pub fn take_steps(&mut self) -> Vec<Step> {
        std::mem::take(&mut self.steps)
    }

    pub fn capability(&self, id: &ElementId) -> Option<Capability> {
        self.scene.get(id).map(capability_of)
    }

    /// Execute a command, record the step and drop stale selection entries.
    pub fn execute(&mut self, command: Command) -> EngineResult<Option<Step>> {
        let step = self.history.execute(&mut self.scene, command)?;
        if let Some(step) = &step {
            self.steps.push(step.clone());
        }
        self.selection.retain_existing(&self.scene);
        Ok(step)
    }

    pub fn undo(&mut self) -> bool {
        self.cancel_gesture();
        match self.history.undo(&mut self.scene) {
            Some(step) => {
                self.steps.push(step);
                self.selection.retain_existing(&self.scene);
                true
            }
            None => false,
        }
    }

    pub fn redo(&mut self) -> bool {
        self.cancel_gesture();
        match self.history.redo(&mut self.scene) {
            Some(step) => {
                self.steps.push(step);
                self.selection.retain_existing(&self.scene);
                true
            }
            None => false,
        }
    }

    /// Replace the document (import). Selection and history start over.
    pub fn replace_scene(&mut self, mut scene: Scene) {
        self.cancel_gesture();
        scene.inherit_ids_from(&self.scene);
        let removed = self.scene.ids();
        let added = scene.ids();
        self.scene = scene;
        self.selection.clear();
        self.history.reset();
        self.clipboard = None;
        self.steps.push(Step {
            label: "import",
            added,
            removed,
            produced: Vec::new(),
        });
    }

    // --- pointer input ---

    fn to_scene(&self, input: &PointerInput) -> Point {
        self.camera.screen_to_scene(input.position)
    }

    pub fn pointer_down(&mut self, input: &PointerInput) {
        let point = self.to_scene(input);
        self.last_pointer = Some(point);

        if matches!(self.gesture, Gesture::EditingText { .. }) {
            self.commit_text();
        }
        if !matches!(self.gesture, Gesture::Idle) {
            return;
        }

        match self.mode {
            ToolMode::Pan => {
                self.input.press(input, None);
                self.gesture = Gesture::Panning {
                    last: input.position,
                };
                return;
            }
            ToolMode::Shape(kind) => {
                self.input.press(input, None);
                if !self.readonly {
                    let start = self.grid.snap_point(point);
                    self.gesture = Gesture::Creating {
                        kind,
                        start,
                        current: start,
                    };
                }
                return;
            }
            ToolMode::Select => {}
        }

        if !self.readonly && self.begin_handle_drag(point) {
            self.input.press(input, self.selection.single());
            return;
        }
        if !self.readonly && self.begin_connect_drag(point) {
            self.input.press(input, None);
            return;
        }

        let tolerance = self.camera.screen_len(HIT_TOLERANCE);
        let hit = self.scene.hit_test(point, tolerance);
        let double = self.input.press(input, hit.as_ref());

        let Some(id) = hit else {
            self.gesture = Gesture::SelectingBox {
                start: point,
                current: point,
            };
            return;
        };

        if double && !self.readonly && self.begin_text_edit(&id) {
            return;
        }

        if input.modifiers.shift {
            self.selection.toggle(id.clone());
            if !self.selection.contains(&id) {
                return;
            }
        } else if !self.selection.contains(&id) {
            self.selection.select_one(id.clone());
        }

        if self.readonly {
            return;
        }
        let ids = self.selection.to_vec();
        let origin = self
            .selection
            .primary()
            .and_then(|p| self.scene.bounds_of(p))
            .map(|b| b.origin())
            .unwrap_or(point);
        log::debug!("move gesture over {} element(s)", ids.len());
        self.gesture = Gesture::DraggingMove {
            base: self.scene.clone(),
            ids,
            start: point,
            origin,
            delta: Vec2::ZERO,
        };
    }

    fn begin_handle_drag(&mut self, point: Point) -> bool {
        let Some(id) = self.selection.single().cloned() else {
            return false;
        };
        let Some(element) = self.scene.get(&id) else {
            return false;
        };
        if !capability_of(element).can_resize {
            return false;
        }
        let tolerance = self.camera.screen_len(crate::handles::HANDLE_HIT_TOLERANCE);
        match hit_test_handles(&element.shape, point, tolerance) {
            Some(HandleKind::Corner(corner)) => {
                let Some(original) = element.shape.bounds() else {
                    return false;
                };
                log::debug!("resize gesture on {id} from {}", corner.as_str());
                self.gesture = Gesture::DraggingResize {
                    base: self.scene.clone(),
                    id,
                    corner,
                    original,
                    bounds: original,
                };
                true
            }
            Some(HandleKind::Endpoint(end)) => {
                let Some(line) = element.shape.as_line() else {
                    return false;
                };
                log::debug!("endpoint gesture on {id}");
                self.gesture = Gesture::DraggingEndpoint {
                    base: self.scene.clone(),
                    point: line.endpoint(end),
                    connection: line.connection(end).cloned(),
                    id,
                    end,
                };
                true
            }
            None => false,
        }
    }

    fn begin_connect_drag(&mut self, point: Point) -> bool {
        let tolerance = self.camera.screen_len(crate::handles::HANDLE_HIT_TOLERANCE);
        for id in self.selection.ids() {
            let Some(element) = self.scene.get(id) else {
                continue;
            };
            if !capability_of(element).can_connect {
                continue;
            }
            let hit = anchors_of(&element.shape)
                .into_iter()
                .find(|a| a.name.is_connectable() && a.hit_test(point, tolerance));
            if let Some(anchor) = hit {
                log::debug!("connect gesture from {id}:{}", anchor.name);
                self.gesture = Gesture::DraggingConnect {
                    source: id.clone(),
                    anchor: anchor.name,
                    start: anchor.position,
                    press: point,
                    current: point,
                };
                return true;
            }
        }
        false
    }

    /// Connectable anchors of every element except `exclude`.
    fn anchor_targets(&self, exclude: &ElementId) -> Vec<SnapTarget> {
        self.scene
            .iter()
            .filter(|e| &e.id != exclude && capability_of(e).can_connect)
            .flat_map(|e| {
                anchors_of(&e.shape)
                    .into_iter()
                    .filter(|a| a.name.is_connectable())
                    .map(|a| SnapTarget {
                        point: a.position,
                        element: e.id.clone(),
                        anchor: a.name,
                    })
            })
            .collect()
    }

    fn anchor_under(&self, point: Point, exclude: &ElementId) -> Option<SnapTarget> {
        let targets = self.anchor_targets(exclude);
        let tolerance = self.camera.screen_len(ANCHOR_SNAP_TOLERANCE);
        snap_to_anchors(point, &targets, tolerance).cloned()
    }

    pub fn pointer_move(&mut self, input: &PointerInput) {
        let point = self.to_scene(input);
        self.last_pointer = Some(point);
        self.input.moved(input);

        let endpoint_target = match &self.gesture {
            Gesture::DraggingEndpoint { id, .. } => Some(self.anchor_under(point, id)),
            _ => None,
        };

        match &mut self.gesture {
            Gesture::Idle | Gesture::EditingText { .. } => {}
            Gesture::Panning { last } => {
                self.camera.pan(input.position - *last);
                *last = input.position;
            }
            Gesture::SelectingBox { current, .. } | Gesture::DraggingConnect { current, .. } => {
                *current = point;
            }
            Gesture::Creating { current, .. } => {
                *current = self.grid.snap_point(point);
            }
            Gesture::DraggingMove {
                base,
                ids,
                start,
                origin,
                delta,
            } => {
                let snapped = self.grid.snap_delta(*origin, point - *start);
                if snapped != *delta {
                    let mut preview = base.clone();
                    if preview.translate(ids, snapped).is_ok() {
                        self.scene = preview;
                        *delta = snapped;
                    }
                }
            }
            Gesture::DraggingResize {
                base,
                id,
                corner,
                original,
                bounds,
            } => {
                let next = resize_box(*original, *corner, point, self.grid);
                if next != *bounds {
                    let mut preview = base.clone();
                    if preview.resize(id, *corner, next).is_ok() {
                        self.scene = preview;
                        *bounds = next;
                    }
                }
            }
            Gesture::DraggingEndpoint {
                base,
                id,
                end,
                point: endpoint,
                connection,
            } => {
                let (next, binding) = match endpoint_target.flatten() {
                    Some(target) => (
                        target.point,
                        Some(Connection::new(target.element, target.anchor)),
                    ),
                    None => (self.grid.snap_point(point), None),
                };
                let mut preview = base.clone();
                if preview
                    .move_endpoint(id, *end, next, binding.clone())
                    .is_ok()
                {
                    self.scene = preview;
                    *endpoint = next;
                    *connection = binding;
                }
            }
        }
    }

    pub fn pointer_up(&mut self, input: &PointerInput) {
        let point = self.to_scene(input);
        self.last_pointer = Some(point);
        self.input.moved(input);
        let was_click = self.input.is_click();
        self.input.release(input);

        match std::mem::take(&mut self.gesture) {
            Gesture::Idle | Gesture::Panning { .. } => {}
            editing @ Gesture::EditingText { .. } => self.gesture = editing,
            Gesture::SelectingBox { start, .. } => {
                if was_click {
                    self.selection.clear();
                } else {
                    self.selection
                        .box_select(&self.scene, Rect::from_points(start, point));
                }
            }
            Gesture::Creating { kind, start, .. } => {
                let (from, to) = if was_click {
                    let rect = kind.default_rect(start);
                    (rect.origin(), Point::new(rect.x1, rect.y1))
                } else {
                    (start, self.grid.snap_point(point))
                };
                self.create_shape(kind, from, to);
                self.mode = ToolMode::Select;
            }
            Gesture::DraggingMove {
                base, ids, delta, ..
            } => {
                self.scene = base;
                if delta != Vec2::ZERO {
                    self.run(Command::Move { ids, delta });
                }
            }
            Gesture::DraggingResize {
                base,
                id,
                corner,
                original,
                bounds,
            } => {
                self.scene = base;
                if bounds != original {
                    self.run(Command::Resize {
                        id,
                        corner,
                        bounds,
                    });
                }
            }
            Gesture::DraggingEndpoint {
                base,
                id,
                end,
                point,
                connection,
            } => {
                self.scene = base;
                self.run(Command::MoveEndpoint {
                    id,
                    end,
                    point,
                    connection,
                });
            }
            Gesture::DraggingConnect {
                source,
                anchor,
                start,
                press,
                ..
            } => self.finish_connect(source, anchor, start, press, point),
        }
    }

    /// Pointer left the canvas: commit at the last known position.
    pub fn pointer_leave(&mut self) {
        if matches!(self.gesture, Gesture::Idle | Gesture::EditingText { .. }) {
            return;
        }
        let last = PointerInput {
            position: self.input.pointer_position,
            button: Default::default(),
            modifiers: self.input.modifiers,
            time_ms: 0,
        };
        self.pointer_up(&last);
    }

    fn finish_connect(
        &mut self,
        source: ElementId,
        anchor: AnchorName,
        start: Point,
        press: Point,
        point: Point,
    ) {
        // Measured from the press; the line itself starts on the anchor
        if (point - press).hypot() < CONNECT_THRESHOLD {
            log::debug!("connect drag from {source} below threshold; cancelled");
            return;
        }
        let (end, end_connection) = match self.anchor_under(point, &source) {
            Some(target) => (
                target.point,
                Some(Connection::new(target.element, target.anchor)),
            ),
            None => (self.grid.snap_point(point), None),
        };
        let mut line = crate::shapes::Line::new(start, end);
        line.start_connection = Some(Connection::new(source, anchor));
        line.end_connection = end_connection;
        let id = self.scene.next_id();
        let element = Element::new(id.clone(), Shape::Line(line));
        if self.run(Command::Insert {
            elements: vec![element],
        }) {
            self.selection.select_one(id);
        }
    }

    fn create_shape(&mut self, kind: ShapeKind, from: Point, to: Point) -> Option<ElementId> {
        let mut shape = kind.shape_between(from, to);
        shape.round();
        let id = self.scene.next_id();
        let element = Element::new(id.clone(), shape);
        if self.run(Command::Insert {
            elements: vec![element],
        }) {
            self.selection.select_one(id.clone());
            Some(id)
        } else {
            None
        }
    }

    /// Execute from a gesture: failures are logged, not surfaced.
    fn run(&mut self, command: Command) -> bool {
        let label = command.label();
        match self.execute(command) {
            Ok(step) => step.is_some(),
            Err(err) => {
                log::warn!("{label} rejected: {err}");
                false
            }
        }
    }

    /// Abort the current gesture, restoring the pre-gesture scene. Text
    /// edits are discarded.
    pub fn cancel_gesture(&mut self) -> bool {
        match std::mem::take(&mut self.gesture) {
            Gesture::Idle => false,
            Gesture::DraggingMove { base, .. }
            | Gesture::DraggingResize { base, .. }
            | Gesture::DraggingEndpoint { base, .. } => {
                self.scene = base;
                true
            }
            _ => true,
        }
    }

    // --- text editing ---

    /// Start editing the text of `id` (a text element or a shape's label).
    pub fn begin_text_edit(&mut self, id: &ElementId) -> bool {
        let text_id = match self.scene.get(id).map(|e| &e.shape) {
            Some(Shape::Text(_)) => id.clone(),
            Some(_) => match self.scene.label_of(id) {
                Some(label) => label,
                None => return false,
            },
            None => return false,
        };
        let Some(element) = self.scene.get(&text_id) else {
            return false;
        };
        if !capability_of(element).can_restyle {
            return false;
        }
        let Some(text) = element.shape.as_text() else {
            return false;
        };
        let content = text.content();
        self.cancel_gesture();
        self.selection.select_one(id.clone());
        log::debug!("editing text of {text_id}");
        self.gesture = Gesture::EditingText {
            id: text_id,
            original: content.clone(),
            buffer: content,
        };
        true
    }

    /// Commit the text buffer. Unchanged content records nothing.
    pub fn commit_text(&mut self) {
        if let Gesture::EditingText {
            id,
            original,
            buffer,
        } = std::mem::take(&mut self.gesture)
        {
            if buffer != original {
                self.run(Command::EditText {
                    id,
                    content: buffer,
                });
            }
        }
    }

    fn edit_text_key(&mut self, key: &KeyInput) {
        match key.key.as_str() {
            "Enter" if !key.modifiers.shift => self.commit_text(),
            "Escape" => {
                self.cancel_gesture();
            }
            other => {
                let Gesture::EditingText { buffer, .. } = &mut self.gesture else {
                    return;
                };
                match other {
                    "Enter" => buffer.push('\n'),
                    "Backspace" => {
                        buffer.pop();
                    }
                    ch if ch.chars().count() == 1 && !key.modifiers.command() => {
                        buffer.push_str(ch);
                    }
                    _ => {}
                }
            }
        }
    }

    // --- keyboard ---

    /// Handle a key press. Returns true if the key was consumed.
    pub fn key_down(&mut self, key: &KeyInput) -> bool {
        if matches!(self.gesture, Gesture::EditingText { .. }) {
            self.edit_text_key(key);
            return true;
        }
        let Some(action) = ShortcutRegistry::lookup(key) else {
            return false;
        };
        if action == Action::Cancel {
            if !self.cancel_gesture() {
                self.selection.clear();
            }
            return true;
        }
        if !matches!(self.gesture, Gesture::Idle) {
            return false;
        }
        if self.readonly && action.is_mutating() {
            log::debug!("{action:?} ignored: readonly");
            return false;
        }
        self.perform(action);
        true
    }

    fn perform(&mut self, action: Action) {
        let result = match action {
            Action::Delete => self.delete_selection().map(|_| ()),
            Action::Cancel => Ok(()),
            Action::Duplicate => self.duplicate_selection().map(|_| ()),
            Action::Undo => {
                self.undo();
                Ok(())
            }
            Action::Redo => {
                self.redo();
                Ok(())
            }
            Action::SelectAll => {
                self.selection.select_all(&self.scene);
                Ok(())
            }
            Action::Copy => {
                self.copy();
                Ok(())
            }
            Action::Cut => self.cut(),
            Action::Paste => self.paste().map(|_| ()),
            Action::Group => self.group_selection().map(|_| ()),
            Action::Ungroup => self.ungroup_selection().map(|_| ()),
            Action::BringToFront => self.reorder_selection(ZOrder::Front),
            Action::SendToBack => self.reorder_selection(ZOrder::Back),
            Action::Insert(kind) => {
                let at = self
                    .last_pointer
                    .unwrap_or_else(|| self.camera.visible_center());
                self.insert_shape(kind, at).map(|_| ())
            }
        };
        if let Err(err) = result {
            log::warn!("{action:?} failed: {err}");
        }
    }

    // --- operations shared by shortcuts and the host API ---

    /// Insert a default-size shape centred on `center`.
    pub fn insert_shape(&mut self, kind: ShapeKind, center: Point) -> EngineResult<ElementId> {
        let rect = kind.default_rect(self.grid.snap_point(center));
        let mut shape = kind.shape_between(rect.origin(), Point::new(rect.x1, rect.y1));
        shape.round();
        let id = self.scene.next_id();
        self.execute(Command::Insert {
            elements: vec![Element::new(id.clone(), shape)],
        })?;
        self.selection.select_one(id.clone());
        Ok(id)
    }

    pub fn delete_elements(&mut self, ids: &[ElementId]) -> EngineResult<bool> {
        if ids.is_empty() {
            return Ok(false);
        }
        self.cancel_gesture();
        let step = self.execute(Command::Delete { ids: ids.to_vec() })?;
        Ok(step.is_some())
    }

    pub fn delete_selection(&mut self) -> EngineResult<bool> {
        let ids = self.selection.to_vec();
        self.delete_elements(&ids)
    }

    pub fn duplicate_selection(&mut self) -> EngineResult<Vec<ElementId>> {
        let ids = self.selection.to_vec();
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let step = self.execute(Command::Duplicate {
            ids,
            offset: Vec2::new(PASTE_OFFSET, PASTE_OFFSET),
        })?;
        let copies = step.map(|s| s.produced).unwrap_or_default();
        self.selection.set(copies.clone());
        Ok(copies)
    }

    pub fn copy(&mut self) -> bool {
        let roots = self.selection.to_vec();
        if roots.is_empty() {
            return false;
        }
        self.clipboard = Some(Clipboard {
            elements: self.scene.copy_elements(&roots),
            roots,
            pastes: 0,
        });
        true
    }

    pub fn cut(&mut self) -> EngineResult<()> {
        if self.copy() {
            self.delete_selection()?;
        }
        Ok(())
    }

    /// Paste the clipboard; each paste lands a further offset away.
    pub fn paste(&mut self) -> EngineResult<Vec<ElementId>> {
        let Some(clipboard) = self.clipboard.as_mut() else {
            return Ok(Vec::new());
        };
        clipboard.pastes += 1;
        let shift = PASTE_OFFSET * f64::from(clipboard.pastes);
        let command = Command::Paste {
            elements: clipboard.elements.clone(),
            roots: clipboard.roots.clone(),
            offset: Vec2::new(shift, shift),
        };
        let step = self.execute(command)?;
        let copies = step.map(|s| s.produced).unwrap_or_default();
        self.selection.set(copies.clone());
        Ok(copies)
    }

    pub fn group_selection(&mut self) -> EngineResult<Option<ElementId>> {
        let ids = self.selection.to_vec();
        if ids.len() < 2 {
            return Ok(None);
        }
        let step = self.execute(Command::Group { ids })?;
        let group = step.and_then(|s| s.produced.into_iter().next());
        if let Some(group) = &group {
            self.selection.select_one(group.clone());
        }
        Ok(group)
    }

    pub fn ungroup_selection(&mut self) -> EngineResult<Vec<ElementId>> {
        let groups: Vec<ElementId> = self
            .selection
            .ids()
            .iter()
            .filter(|id| self.scene.get(id).is_some_and(|e| e.shape.is_group()))
            .cloned()
            .collect();
        if groups.is_empty() {
            return Ok(Vec::new());
        }
        let step = self.execute(Command::Ungroup { ids: groups })?;
        let members = step.map(|s| s.produced).unwrap_or_default();
        self.selection.set(members.clone());
        Ok(members)
    }

    /// Layer changes ignore capability: every element may be reordered.
    pub fn reorder_selection(&mut self, to: ZOrder) -> EngineResult<()> {
        let ids = self.selection.to_vec();
        if ids.is_empty() {
            return Ok(());
        }
        self.execute(Command::Reorder { ids, to })?;
        Ok(())
    }

    pub fn restyle_selection(&mut self, patch: StylePatch) -> EngineResult<bool> {
        let ids = self.selection.to_vec();
        if ids.is_empty() || patch.is_empty() {
            return Ok(false);
        }
        for id in &ids {
            if let Some(cap) = self.capability(id) {
                if !cap.can_restyle {
                    return Err(EngineError::CapabilityDenied {
                        id: id.clone(),
                        action: "restyle",
                    });
                }
            }
        }
        Ok(self.execute(Command::Restyle { ids, patch })?.is_some())
    }

    pub fn clear(&mut self) -> EngineResult<()> {
        self.cancel_gesture();
        self.execute(Command::Clear)?;
        self.selection.clear();
        Ok(())
    }

    // --- rendering support ---

    pub fn overlay(&self) -> Overlay {
        let mut overlay = Overlay {
            selection_bounds: self.scene.bounds_of_all(self.selection.ids()),
            ..Overlay::default()
        };

        if !self.readonly {
            if let Some(element) = self.selection.single().and_then(|id| self.scene.get(id)) {
                if capability_of(element).can_resize {
                    overlay.handles = resize_handles_of(&element.shape);
                }
            }
            for id in self.selection.ids() {
                let Some(element) = self.scene.get(id) else {
                    continue;
                };
                if !capability_of(element).can_connect {
                    continue;
                }
                overlay
                    .anchors
                    .extend(anchors_of(&element.shape).into_iter().map(|anchor| ElementAnchor {
                        element: id.clone(),
                        anchor,
                    }));
            }
        }

        match &self.gesture {
            Gesture::SelectingBox { start, current } => {
                overlay.marquee = Some(Rect::from_points(*start, *current));
            }
            Gesture::Creating { start, current, .. } => {
                overlay.marquee = Some(Rect::from_points(*start, *current));
            }
            Gesture::DraggingConnect { start, current, .. } => {
                overlay.connect_preview = Some((*start, *current));
            }
            Gesture::EditingText { id, buffer, .. } => {
                overlay.editing = Some((id.clone(), buffer.clone()));
            }
            _ => {}
        }
        overlay
    }
}
