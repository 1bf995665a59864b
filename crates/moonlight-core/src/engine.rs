//! The host-facing engine object.
//!
//! One `Engine` is one embedded editor: it owns its own scene, selection,
//! history and listeners, so several engines can live side by side.

use crate::camera::Camera;
use crate::capability::Capability;
use crate::config::{EngineConfig, Theme};
use crate::error::{EngineError, EngineResult};
use crate::events::{Event, EventBus, EventKind, Subscription};
use crate::handles::Corner;
use crate::history::Command;
use crate::input::{KeyInput, PointerInput};
use crate::interaction::{Editor, Overlay, ToolMode};
use crate::scene::{Scene, ZOrder};
use crate::shapes::{Connection, Element, ElementId, LineEnd, Shape, ShapeKind, Style, StylePatch};
use crate::snap::Grid;
use crate::svg::{ExportOptions, export_svg, import_svg_continuing};
use kurbo::{Point, Rect, Size, Vec2};
use serde::Serialize;
use uuid::Uuid;

/// A bound line endpoint, as reported to hosts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EndpointInfo {
    pub end: LineEnd,
    #[serde(flatten)]
    pub connection: Connection,
}

/// Read-only snapshot of one element.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementInfo {
    pub id: ElementId,
    /// Top-left of the element's bounds.
    pub x: f64,
    pub y: f64,
    pub shape: Shape,
    pub style: Style,
    pub capability: Capability,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transform: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<ElementId>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub connections: Vec<EndpointInfo>,
}

impl ElementInfo {
    fn new(scene: &Scene, element: &Element) -> Self {
        let origin = scene
            .bounds_of(&element.id)
            .map(|b| b.origin())
            .unwrap_or(Point::ZERO);
        let connections = element
            .shape
            .as_line()
            .map(|line| {
                line.connections()
                    .map(|(end, connection)| EndpointInfo {
                        end,
                        connection: connection.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default();
        Self {
            id: element.id.clone(),
            x: origin.x,
            y: origin.y,
            shape: element.shape.clone(),
            style: element.style.clone(),
            capability: crate::capability::capability_of(element),
            transform: element.transform.clone(),
            parent_id: element.parent_id.clone(),
            connections,
        }
    }
}

/// Editable scene engine.
#[derive(Debug)]
pub struct Engine {
    id: Uuid,
    config: EngineConfig,
    editor: Editor,
    events: EventBus,
    focused: bool,
}

impl Engine {
    pub fn new(mut config: EngineConfig) -> EngineResult<Self> {
        config.sanitize();
        let camera = Camera::new(Size::new(config.width, config.height), config.zoom);
        let grid = Grid::new(config.gridsnap, config.grid_size);
        let mut editor = Editor::new(camera, grid, config.history_limit);
        editor.set_readonly(config.readonly);

        let mut engine = Self {
            id: Uuid::new_v4(),
            config,
            editor,
            events: EventBus::new(),
            focused: false,
        };
        if let Some(markup) = engine.config.initial_svg.clone() {
            engine.load(&markup)?;
        }
        log::info!(
            "engine {} created ({}x{}, grid snap {})",
            engine.id,
            engine.config.width,
            engine.config.height,
            engine.config.gridsnap
        );
        Ok(engine)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn theme(&self) -> Theme {
        self.config.theme
    }

    pub fn set_theme(&mut self, theme: Theme) {
        self.config.theme = theme;
    }

    /// Tear the engine down. Outstanding subscriptions become inert.
    pub fn destroy(self) {
        self.events.clear();
        log::info!("engine {} destroyed", self.id);
    }

    // --- events ---

    /// Run an editor operation and publish what it changed.
    fn tracked<R>(&mut self, op: impl FnOnce(&mut Editor) -> R) -> R {
        let selection = self.editor.selection.to_vec();
        let mode = self.editor.mode();
        let result = op(&mut self.editor);
        self.publish(selection, mode);
        result
    }

    fn publish(&mut self, selection_before: Vec<ElementId>, mode_before: ToolMode) {
        let steps = self.editor.take_steps();
        for step in &steps {
            log::debug!(
                "engine {}: {} (+{} -{})",
                self.id,
                step.label,
                step.added.len(),
                step.removed.len()
            );
            if !step.removed.is_empty() {
                self.events.emit(&Event::ElementDelete(step.removed.clone()));
            }
            if !step.added.is_empty() {
                self.events.emit(&Event::ElementAdd(step.added.clone()));
            }
        }
        if !steps.is_empty() {
            self.events.emit(&Event::Change);
        }

        let selection = self.editor.selection.ids();
        if selection != selection_before.as_slice() {
            if selection.is_empty() {
                self.events.emit(&Event::Deselect(selection_before));
            } else {
                self.events.emit(&Event::Select(selection.to_vec()));
            }
        }
        let mode = self.editor.mode();
        if mode != mode_before {
            self.events.emit(&Event::ModeChange(mode));
        }
    }

    pub fn on_change(&self, callback: impl Fn(&Event) + 'static) -> Subscription {
        self.events.subscribe(EventKind::Change, callback)
    }

    pub fn on_select(&self, callback: impl Fn(&Event) + 'static) -> Subscription {
        self.events.subscribe(EventKind::Select, callback)
    }

    pub fn on_deselect(&self, callback: impl Fn(&Event) + 'static) -> Subscription {
        self.events.subscribe(EventKind::Deselect, callback)
    }

    pub fn on_focus(&self, callback: impl Fn(&Event) + 'static) -> Subscription {
        self.events.subscribe(EventKind::Focus, callback)
    }

    pub fn on_blur(&self, callback: impl Fn(&Event) + 'static) -> Subscription {
        self.events.subscribe(EventKind::Blur, callback)
    }

    pub fn on_mode_change(&self, callback: impl Fn(&Event) + 'static) -> Subscription {
        self.events.subscribe(EventKind::ModeChange, callback)
    }

    pub fn on_element_add(&self, callback: impl Fn(&Event) + 'static) -> Subscription {
        self.events.subscribe(EventKind::ElementAdd, callback)
    }

    pub fn on_element_delete(&self, callback: impl Fn(&Event) + 'static) -> Subscription {
        self.events.subscribe(EventKind::ElementDelete, callback)
    }

    // --- focus ---

    pub fn has_focus(&self) -> bool {
        self.focused
    }

    pub fn focus(&mut self) {
        if !self.focused {
            self.focused = true;
            self.events.emit(&Event::Focus);
        }
    }

    /// Losing focus commits a text edit in progress.
    pub fn blur(&mut self) {
        if self.focused {
            self.tracked(|editor| editor.commit_text());
            self.focused = false;
            self.events.emit(&Event::Blur);
        }
    }

    // --- documents ---

    pub fn export_svg(&self) -> EngineResult<String> {
        let options = ExportOptions {
            view_box: self.editor.camera.view_box,
            width: self.config.width,
            height: self.config.height,
            theme: self.config.theme,
        };
        export_svg(&self.editor.scene, &options)
    }

    fn load(&mut self, markup: &str) -> EngineResult<()> {
        let document = import_svg_continuing(markup, &self.editor.scene)?;
        self.editor.replace_scene(document.scene);
        if let Some(view_box) = document.view_box {
            self.editor.camera.set_view_box(view_box);
        }
        Ok(())
    }

    /// Replace the document with the given markup. On error nothing changes.
    pub fn import_svg(&mut self, markup: &str) -> EngineResult<()> {
        let selection = self.editor.selection.to_vec();
        let mode = self.editor.mode();
        let result = self.load(markup);
        if let Err(err) = &result {
            log::warn!("engine {}: import rejected: {err}", self.id);
        }
        self.publish(selection, mode);
        result
    }

    /// Remove every element. Undoable.
    pub fn clear(&mut self) -> EngineResult<()> {
        self.tracked(|editor| editor.clear())
    }

    // --- selection ---

    pub fn select(&mut self, ids: &[ElementId]) -> EngineResult<()> {
        if let Some(missing) = ids.iter().find(|id| !self.editor.scene.contains(id)) {
            return Err(EngineError::UnknownElement(missing.clone()));
        }
        self.tracked(|editor| {
            editor.selection.set(ids.to_vec());
        });
        Ok(())
    }

    pub fn select_all(&mut self) {
        self.tracked(|editor| {
            editor.selection.select_all(&editor.scene);
        });
    }

    pub fn deselect(&mut self) {
        self.tracked(|editor| {
            editor.selection.clear();
        });
    }

    pub fn selected_ids(&self) -> Vec<ElementId> {
        self.editor.selection.to_vec()
    }

    // --- queries ---

    pub fn elements(&self) -> Vec<ElementInfo> {
        let scene = &self.editor.scene;
        scene.iter().map(|e| ElementInfo::new(scene, e)).collect()
    }

    pub fn element_by_id(&self, id: &ElementId) -> Option<ElementInfo> {
        let scene = &self.editor.scene;
        scene.get(id).map(|e| ElementInfo::new(scene, e))
    }

    pub fn capability(&self, id: &ElementId) -> Option<Capability> {
        self.editor.capability(id)
    }

    pub fn scene(&self) -> &Scene {
        &self.editor.scene
    }

    pub fn overlay(&self) -> Overlay {
        self.editor.overlay()
    }

    pub fn camera(&self) -> &Camera {
        &self.editor.camera
    }

    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.editor.camera
    }

    // --- modes ---

    pub fn mode(&self) -> ToolMode {
        self.editor.mode()
    }

    pub fn set_mode(&mut self, mode: ToolMode) {
        self.tracked(|editor| editor.set_mode(mode));
    }

    pub fn is_readonly(&self) -> bool {
        self.editor.is_readonly()
    }

    pub fn set_readonly(&mut self, readonly: bool) {
        self.tracked(|editor| editor.set_readonly(readonly));
    }

    // --- editing ---

    pub fn undo(&mut self) -> bool {
        self.tracked(|editor| editor.undo())
    }

    pub fn redo(&mut self) -> bool {
        self.tracked(|editor| editor.redo())
    }

    pub fn can_undo(&self) -> bool {
        self.editor.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.editor.history.can_redo()
    }

    pub fn delete_elements(&mut self, ids: &[ElementId]) -> EngineResult<bool> {
        self.tracked(|editor| editor.delete_elements(ids))
    }

    /// Insert a default-size shape centred on `center` (or the view centre).
    pub fn insert_shape(&mut self, kind: ShapeKind, center: Option<Point>) -> EngineResult<ElementId> {
        let center = center.unwrap_or_else(|| self.editor.camera.visible_center());
        self.tracked(|editor| editor.insert_shape(kind, center))
    }

    /// Translate elements as one undoable step.
    pub fn move_elements(&mut self, ids: &[ElementId], delta: Vec2) -> EngineResult<bool> {
        let step = self.tracked(|editor| {
            editor.execute(Command::Move {
                ids: ids.to_vec(),
                delta,
            })
        })?;
        Ok(step.is_some())
    }

    /// Resize a box shape to `bounds`, as if dragged from `corner`.
    pub fn resize_element(&mut self, id: &ElementId, corner: Corner, bounds: Rect) -> EngineResult<bool> {
        let capability = self
            .capability(id)
            .ok_or_else(|| EngineError::UnknownElement(id.clone()))?;
        if !capability.can_resize {
            return Err(EngineError::CapabilityDenied {
                id: id.clone(),
                action: "resize",
            });
        }
        let step = self.tracked(|editor| {
            editor.execute(Command::Resize {
                id: id.clone(),
                corner,
                bounds,
            })
        })?;
        Ok(step.is_some())
    }

    pub fn restyle_selection(&mut self, patch: StylePatch) -> EngineResult<bool> {
        self.tracked(|editor| editor.restyle_selection(patch))
    }

    pub fn bring_to_front(&mut self) -> EngineResult<()> {
        self.tracked(|editor| editor.reorder_selection(ZOrder::Front))
    }

    pub fn send_to_back(&mut self) -> EngineResult<()> {
        self.tracked(|editor| editor.reorder_selection(ZOrder::Back))
    }

    pub fn duplicate_selection(&mut self) -> EngineResult<Vec<ElementId>> {
        self.tracked(|editor| editor.duplicate_selection())
    }

    pub fn copy(&mut self) -> bool {
        self.editor.copy()
    }

    pub fn cut(&mut self) -> EngineResult<()> {
        self.tracked(|editor| editor.cut())
    }

    pub fn paste(&mut self) -> EngineResult<Vec<ElementId>> {
        self.tracked(|editor| editor.paste())
    }

    pub fn group_selection(&mut self) -> EngineResult<Option<ElementId>> {
        self.tracked(|editor| editor.group_selection())
    }

    pub fn ungroup_selection(&mut self) -> EngineResult<Vec<ElementId>> {
        self.tracked(|editor| editor.ungroup_selection())
    }

    /// Replace the content of a text element (or a shape's label).
    pub fn edit_text(&mut self, id: &ElementId, content: &str) -> EngineResult<bool> {
        let target = match self.editor.scene.get(id).map(|e| &e.shape) {
            Some(Shape::Text(_)) => id.clone(),
            Some(_) => self
                .editor
                .scene
                .label_of(id)
                .ok_or_else(|| EngineError::CapabilityDenied {
                    id: id.clone(),
                    action: "text editing",
                })?,
            None => return Err(EngineError::UnknownElement(id.clone())),
        };
        if self.capability(&target).is_some_and(|c| !c.can_restyle) {
            return Err(EngineError::CapabilityDenied {
                id: target,
                action: "text editing",
            });
        }
        let step = self.tracked(|editor| {
            editor.execute(Command::EditText {
                id: target,
                content: content.to_string(),
            })
        })?;
        Ok(step.is_some())
    }

    // --- input ---

    pub fn pointer_down(&mut self, input: &PointerInput) {
        self.focus();
        self.tracked(|editor| editor.pointer_down(input));
    }

    pub fn pointer_move(&mut self, input: &PointerInput) {
        self.tracked(|editor| editor.pointer_move(input));
    }

    pub fn pointer_up(&mut self, input: &PointerInput) {
        self.tracked(|editor| editor.pointer_up(input));
    }

    pub fn pointer_leave(&mut self) {
        self.tracked(|editor| editor.pointer_leave());
    }

    /// Returns true if the key was consumed.
    pub fn key_down(&mut self, key: &KeyInput) -> bool {
        self.tracked(|editor| editor.key_down(key))
    }
}
