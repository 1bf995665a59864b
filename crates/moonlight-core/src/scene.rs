//! Scene model: the ordered element store.

use crate::error::{EngineError, EngineResult};
use crate::handles::{Corner, anchor_position, apply_box};
use crate::shapes::{
    ConnectionStatus, Connection, Element, ElementId, Group, LineEnd, Shape, StylePatch,
    rects_touch,
};
use kurbo::{Point, Rect, Vec2};
use std::collections::{HashMap, HashSet};

/// What happens to a removed group's children.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RemovePolicy {
    /// Children move up to the removed group's parent.
    Reparent,
    /// Children are removed with the group.
    #[default]
    Cascade,
}

/// Target of a layer reorder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZOrder {
    Front,
    Back,
}

/// Ordered collection of elements.
///
/// Order is paint order: the last element is frontmost. An id → index map
/// gives constant-time lookup. Relations between elements (group
/// membership, label ownership, connections) are stored as ids and resolved
/// through the scene.
#[derive(Debug, Clone, Default)]
pub struct Scene {
    elements: Vec<Element>,
    index: HashMap<ElementId, usize>,
    /// Last issued `el-<n>` sequence number. Only moves forward.
    last_id: u64,
}

/// Scenes compare by content and order. The id counter is bookkeeping.
impl PartialEq for Scene {
    fn eq(&self, other: &Self) -> bool {
        self.elements == other.elements
    }
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a scene from elements in paint order (used by import).
    pub fn from_elements(elements: Vec<Element>) -> Self {
        let mut scene = Self {
            elements,
            index: HashMap::new(),
            last_id: 0,
        };
        for id in scene.elements.iter().map(|e| e.id.clone()).collect::<Vec<_>>() {
            scene.note_id(&id);
        }
        scene.reindex();
        scene.resolve_connections();
        scene
    }

    /// Issue a fresh element id. Ids are never reused within a session.
    pub fn next_id(&mut self) -> ElementId {
        loop {
            self.last_id += 1;
            let id = ElementId::new(format!("el-{}", self.last_id));
            if !self.index.contains_key(&id) {
                return id;
            }
        }
    }

    /// Keep the counter ahead of an id seen from elsewhere.
    pub fn note_id(&mut self, id: &ElementId) {
        if let Some(seq) = id.sequence() {
            self.last_id = self.last_id.max(seq);
        }
    }

    /// Carry the id counter over from another scene (so ids stay unique
    /// across document replacement).
    pub fn inherit_ids_from(&mut self, other: &Scene) {
        self.last_id = self.last_id.max(other.last_id);
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Elements in paint order (back to front).
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Element> {
        self.elements.iter()
    }

    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    pub fn ids(&self) -> Vec<ElementId> {
        self.elements.iter().map(|e| e.id.clone()).collect()
    }

    pub fn contains(&self, id: &ElementId) -> bool {
        self.index.contains_key(id)
    }

    pub fn position(&self, id: &ElementId) -> Option<usize> {
        self.index.get(id).copied()
    }

    pub fn get(&self, id: &ElementId) -> Option<&Element> {
        self.index.get(id).map(|&i| &self.elements[i])
    }

    fn get_mut(&mut self, id: &ElementId) -> Option<&mut Element> {
        let i = *self.index.get(id)?;
        self.elements.get_mut(i)
    }

    fn require(&self, id: &ElementId) -> EngineResult<()> {
        if self.contains(id) {
            Ok(())
        } else {
            Err(EngineError::UnknownElement(id.clone()))
        }
    }

    fn reindex(&mut self) {
        self.index = self
            .elements
            .iter()
            .enumerate()
            .map(|(i, e)| (e.id.clone(), i))
            .collect();
    }

    /// Append an element at the front, or replace it in place if its id is
    /// already present.
    pub fn insert(&mut self, element: Element) {
        self.note_id(&element.id);
        match self.index.get(&element.id) {
            Some(&i) => self.elements[i] = element,
            None => {
                self.index.insert(element.id.clone(), self.elements.len());
                self.elements.push(element);
            }
        }
        self.resolve_connections();
    }

    /// Apply an edit to one element, then re-resolve connections.
    pub fn update<F>(&mut self, id: &ElementId, edit: F) -> EngineResult<()>
    where
        F: FnOnce(&mut Element),
    {
        let element = self
            .get_mut(id)
            .ok_or_else(|| EngineError::UnknownElement(id.clone()))?;
        edit(element);
        self.resolve_connections();
        Ok(())
    }

    /// Restore exact element states and, optionally, an exact order.
    ///
    /// `None` in `changes` removes the element. No connection resolution
    /// runs: the states are taken as recorded.
    pub(crate) fn restore(
        &mut self,
        changes: &[(ElementId, Option<Element>)],
        order: Option<&[ElementId]>,
    ) {
        let mut pending: HashMap<&ElementId, &Option<Element>> =
            changes.iter().map(|(id, el)| (id, el)).collect();

        match order {
            Some(order) => {
                let mut current: HashMap<ElementId, Element> = self
                    .elements
                    .drain(..)
                    .map(|e| (e.id.clone(), e))
                    .collect();
                for id in order {
                    let element = match pending.remove(id) {
                        Some(Some(el)) => Some(el.clone()),
                        Some(None) => None,
                        None => current.remove(id),
                    };
                    if let Some(element) = element {
                        self.elements.push(element);
                    }
                }
            }
            None => {
                self.elements.retain(|e| !matches!(pending.get(&e.id), Some(None)));
                for element in self.elements.iter_mut() {
                    if let Some(Some(el)) = pending.remove(&element.id) {
                        *element = el.clone();
                    }
                }
            }
        }
        for element in &self.elements {
            if let Some(seq) = element.id.sequence() {
                self.last_id = self.last_id.max(seq);
            }
        }
        self.reindex();
    }

    /// Remove everything. The id counter keeps running.
    pub fn clear(&mut self) {
        self.elements.clear();
        self.index.clear();
    }

    /// Children of a group (direct members only).
    pub fn children_of(&self, group: &ElementId) -> Vec<ElementId> {
        self.elements
            .iter()
            .filter(|e| e.parent_id.as_ref() == Some(group))
            .map(|e| e.id.clone())
            .collect()
    }

    /// Text labels owned by a shape.
    pub fn labels_of(&self, owner: &ElementId) -> Vec<ElementId> {
        self.elements
            .iter()
            .filter(|e| {
                e.shape
                    .as_text()
                    .and_then(|t| t.anchor_shape.as_ref())
                    .is_some_and(|a| a == owner)
            })
            .map(|e| e.id.clone())
            .collect()
    }

    pub fn label_of(&self, owner: &ElementId) -> Option<ElementId> {
        self.labels_of(owner).into_iter().next()
    }

    /// The given ids plus their group descendants and owned labels, in
    /// paint order.
    pub fn closure(&self, ids: &[ElementId]) -> Vec<ElementId> {
        let mut seen: HashSet<ElementId> = HashSet::new();
        let mut stack: Vec<ElementId> = ids.to_vec();
        while let Some(id) = stack.pop() {
            if !self.contains(&id) || !seen.insert(id.clone()) {
                continue;
            }
            stack.extend(self.children_of(&id));
            stack.extend(self.labels_of(&id));
        }
        self.elements
            .iter()
            .filter(|e| seen.contains(&e.id))
            .map(|e| e.id.clone())
            .collect()
    }

    /// The element a click on `id` selects: the owner of a label, then the
    /// outermost group ancestor.
    pub fn selectable_root(&self, id: &ElementId) -> ElementId {
        let mut current = id.clone();
        if let Some(owner) = self
            .get(&current)
            .and_then(|e| e.shape.as_text())
            .and_then(|t| t.anchor_shape.clone())
        {
            if self.contains(&owner) {
                current = owner;
            }
        }
        // Bounded walk guards against parent cycles in foreign markup.
        for _ in 0..self.elements.len() {
            match self.get(&current).and_then(|e| e.parent_id.clone()) {
                Some(parent) if self.contains(&parent) => current = parent,
                _ => break,
            }
        }
        current
    }

    /// Elements that select as themselves: no live parent, not a label.
    pub fn top_level_ids(&self) -> Vec<ElementId> {
        self.elements
            .iter()
            .filter(|e| self.selectable_root(&e.id) == e.id)
            .map(|e| e.id.clone())
            .collect()
    }

    /// Bounds of an element. Groups use the union of their members.
    pub fn bounds_of(&self, id: &ElementId) -> Option<Rect> {
        let element = self.get(id)?;
        if let Some(bounds) = element.shape.bounds() {
            return Some(bounds);
        }
        self.closure(std::slice::from_ref(id))
            .iter()
            .filter_map(|d| self.get(d)?.shape.bounds())
            .reduce(|a, b| a.union(b))
    }

    /// Union of the bounds of several elements.
    pub fn bounds_of_all(&self, ids: &[ElementId]) -> Option<Rect> {
        ids.iter()
            .filter_map(|id| self.bounds_of(id))
            .reduce(|a, b| a.union(b))
    }

    /// Topmost element under a point, resolved to what a click selects.
    pub fn hit_test(&self, point: Point, tolerance: f64) -> Option<ElementId> {
        self.elements
            .iter()
            .rev()
            .filter(|e| !e.shape.is_group())
            .find(|e| e.hit_test(point, tolerance))
            .map(|e| self.selectable_root(&e.id))
    }

    /// Top-level elements whose bounds touch `rect`.
    pub fn top_level_in_rect(&self, rect: Rect) -> Vec<ElementId> {
        let rect = rect.abs();
        self.top_level_ids()
            .into_iter()
            .filter(|id| self.bounds_of(id).is_some_and(|b| rects_touch(b, rect)))
            .collect()
    }

    /// Fill used to paint an element. Labels without a fill take their
    /// owner's stroke color.
    pub fn effective_fill(&self, id: &ElementId) -> Option<String> {
        let element = self.get(id)?;
        if let Some(fill) = &element.style.fill {
            return Some(fill.clone());
        }
        let owner = element.shape.as_text()?.anchor_shape.as_ref()?;
        self.get(owner)?.style.stroke.clone()
    }

    /// Move every attached line endpoint onto its target anchor; endpoints
    /// whose target or anchor is gone become orphaned and keep their last
    /// position.
    pub fn resolve_connections(&mut self) {
        let mut updates: Vec<(usize, LineEnd, Option<Point>)> = Vec::new();
        for (i, element) in self.elements.iter().enumerate() {
            let Some(line) = element.shape.as_line() else {
                continue;
            };
            for (end, conn) in line.connections() {
                if conn.is_orphaned() {
                    continue;
                }
                let position = self
                    .get(&conn.target)
                    .and_then(|target| anchor_position(&target.shape, conn.anchor));
                updates.push((i, end, position));
            }
        }

        for (i, end, position) in updates {
            let element = &mut self.elements[i];
            let id = element.id.clone();
            let Some(line) = element.shape.as_line_mut() else {
                continue;
            };
            match position {
                Some(point) => line.set_endpoint(end, point),
                None => {
                    if let Some(conn) = line.connection_mut(end).as_mut() {
                        log::debug!("connection {} of {id} orphaned", conn.encode());
                        conn.status = ConnectionStatus::Orphaned;
                    }
                }
            }
        }
    }

    fn remove_set(&mut self, doomed: &HashSet<ElementId>) -> Vec<Element> {
        let (removed, kept): (Vec<Element>, Vec<Element>) = self
            .elements
            .drain(..)
            .partition(|e| doomed.contains(&e.id));
        self.elements = kept;
        self.reindex();
        self.resolve_connections();
        removed
    }

    /// Remove an element.
    ///
    /// Labels owned by the element go with it. Lines bound to any removed
    /// element become orphaned. For groups, `policy` decides whether the
    /// members are removed or lifted to the group's parent.
    pub fn remove(&mut self, id: &ElementId, policy: RemovePolicy) -> EngineResult<Vec<Element>> {
        self.require(id)?;
        let doomed: HashSet<ElementId> = match policy {
            RemovePolicy::Cascade => self.closure(std::slice::from_ref(id)).into_iter().collect(),
            RemovePolicy::Reparent => {
                let parent = self.get(id).and_then(|e| e.parent_id.clone());
                for element in self.elements.iter_mut() {
                    if element.parent_id.as_ref() == Some(id) {
                        element.parent_id = parent.clone();
                    }
                }
                let mut doomed: HashSet<ElementId> = self.labels_of(id).into_iter().collect();
                doomed.insert(id.clone());
                doomed
            }
        };
        Ok(self.remove_set(&doomed))
    }

    /// Remove several elements (with their closures) at once.
    pub fn remove_all(&mut self, ids: &[ElementId]) -> EngineResult<Vec<Element>> {
        for id in ids {
            self.require(id)?;
        }
        let doomed: HashSet<ElementId> = self.closure(ids).into_iter().collect();
        Ok(self.remove_set(&doomed))
    }

    /// Translate elements together with their members and labels.
    ///
    /// Moved lines let go of targets that stay put; lines bound to moved
    /// targets follow them.
    pub fn translate(&mut self, ids: &[ElementId], delta: Vec2) -> EngineResult<()> {
        for id in ids {
            self.require(id)?;
        }
        let moved: HashSet<ElementId> = self.closure(ids).into_iter().collect();
        for element in self.elements.iter_mut() {
            if !moved.contains(&element.id) {
                continue;
            }
            element.shape.translate(delta);
            if let Some(line) = element.shape.as_line_mut() {
                for end in [LineEnd::Start, LineEnd::End] {
                    let slot = line.connection_mut(end);
                    let stays = slot
                        .as_ref()
                        .is_some_and(|c| !c.is_orphaned() && !moved.contains(&c.target));
                    if stays {
                        *slot = None;
                    }
                }
            }
        }
        self.resolve_connections();
        Ok(())
    }

    /// Resize a rect/circle/ellipse to a box produced by a corner drag.
    pub fn resize(&mut self, id: &ElementId, corner: Corner, rect: Rect) -> EngineResult<()> {
        let element = self
            .get_mut(id)
            .ok_or_else(|| EngineError::UnknownElement(id.clone()))?;
        if !element.shape.is_box_resizable() {
            return Err(EngineError::CapabilityDenied {
                id: id.clone(),
                action: "resize",
            });
        }
        apply_box(&mut element.shape, corner, rect);
        element.shape.round();
        self.recenter_labels(id);
        self.resolve_connections();
        Ok(())
    }

    fn recenter_labels(&mut self, owner: &ElementId) {
        let Some(bounds) = self.bounds_of(owner) else {
            return;
        };
        for label in self.labels_of(owner) {
            if let Some(Shape::Text(text)) = self.get_mut(&label).map(|e| &mut e.shape) {
                text.center_in(bounds);
            }
        }
    }

    /// Move one endpoint of a line, optionally binding it.
    pub fn move_endpoint(
        &mut self,
        id: &ElementId,
        end: LineEnd,
        point: Point,
        connection: Option<Connection>,
    ) -> EngineResult<()> {
        let element = self
            .get_mut(id)
            .ok_or_else(|| EngineError::UnknownElement(id.clone()))?;
        let Some(line) = element.shape.as_line_mut() else {
            return Err(EngineError::CapabilityDenied {
                id: id.clone(),
                action: "endpoint editing",
            });
        };
        line.set_endpoint(end, point.round());
        *line.connection_mut(end) = connection;
        self.resolve_connections();
        Ok(())
    }

    /// Apply a style patch. Returns whether anything changed.
    pub fn restyle(&mut self, id: &ElementId, patch: &StylePatch) -> EngineResult<bool> {
        let element = self
            .get_mut(id)
            .ok_or_else(|| EngineError::UnknownElement(id.clone()))?;
        Ok(element.style.apply(patch))
    }

    /// Replace the content of a text element.
    pub fn set_text(&mut self, id: &ElementId, content: &str) -> EngineResult<()> {
        let element = self
            .get_mut(id)
            .ok_or_else(|| EngineError::UnknownElement(id.clone()))?;
        match &mut element.shape {
            Shape::Text(text) => {
                text.set_content(content);
                Ok(())
            }
            _ => Err(EngineError::CapabilityDenied {
                id: id.clone(),
                action: "text editing",
            }),
        }
    }

    /// Move elements (with members and labels) to the front or back as one
    /// block, keeping their relative order. Returns whether the order
    /// changed.
    pub fn reorder(&mut self, ids: &[ElementId], to: ZOrder) -> EngineResult<bool> {
        for id in ids {
            self.require(id)?;
        }
        let block: HashSet<ElementId> = self.closure(ids).into_iter().collect();
        let before = self.ids();
        let (moving, rest): (Vec<Element>, Vec<Element>) = self
            .elements
            .drain(..)
            .partition(|e| block.contains(&e.id));
        self.elements = match to {
            ZOrder::Front => rest.into_iter().chain(moving).collect(),
            ZOrder::Back => moving.into_iter().chain(rest).collect(),
        };
        self.reindex();
        Ok(self.ids() != before)
    }

    /// Group elements. Returns the new group's id, or `None` if fewer than
    /// two elements were given.
    pub fn group(&mut self, ids: &[ElementId]) -> EngineResult<Option<ElementId>> {
        let mut members: Vec<ElementId> = Vec::new();
        for id in ids {
            self.require(id)?;
            if !members.contains(id) {
                members.push(id.clone());
            }
        }
        if members.len() < 2 {
            return Ok(None);
        }

        let first_parent = self.get(&members[0]).and_then(|e| e.parent_id.clone());
        let shared_parent = members
            .iter()
            .all(|id| self.get(id).and_then(|e| e.parent_id.clone()) == first_parent)
            .then_some(first_parent)
            .flatten();

        let insert_at = self
            .closure(&members)
            .iter()
            .filter_map(|id| self.position(id))
            .min()
            .unwrap_or(self.elements.len());

        let group_id = self.next_id();
        let mut group = Element::new(group_id.clone(), Shape::Group(Group::new()));
        group.parent_id = shared_parent;
        self.elements.insert(insert_at, group);
        self.reindex();

        for id in &members {
            if let Some(element) = self.get_mut(id) {
                element.parent_id = Some(group_id.clone());
            }
        }
        Ok(Some(group_id))
    }

    /// Dissolve a group. Members move up to the group's parent.
    pub fn ungroup(&mut self, group_id: &ElementId) -> EngineResult<Vec<ElementId>> {
        let group = self
            .get(group_id)
            .ok_or_else(|| EngineError::UnknownElement(group_id.clone()))?;
        if !group.shape.is_group() {
            return Ok(Vec::new());
        }
        let children = self.children_of(group_id);
        self.remove(group_id, RemovePolicy::Reparent)?;
        Ok(children)
    }

    /// Deep copies of elements and everything they carry along, in paint
    /// order.
    pub fn copy_elements(&self, ids: &[ElementId]) -> Vec<Element> {
        self.closure(ids)
            .iter()
            .filter_map(|id| self.get(id).cloned())
            .collect()
    }

    /// Insert copies of `source` with fresh ids, offset by `offset`.
    ///
    /// Membership, labels and connections survive only inside the copied
    /// set; anything pointing outside it is dropped. Returns the new ids of
    /// `roots`.
    pub fn paste(
        &mut self,
        source: &[Element],
        roots: &[ElementId],
        offset: Vec2,
    ) -> Vec<ElementId> {
        let mut fresh: HashMap<ElementId, ElementId> = HashMap::new();
        for element in source {
            let id = self.next_id();
            fresh.insert(element.id.clone(), id);
        }

        for element in source {
            let Some(new_id) = fresh.get(&element.id) else {
                continue;
            };
            let mut copy = element.clone();
            copy.id = new_id.clone();
            copy.parent_id = element.parent_id.as_ref().and_then(|p| fresh.get(p).cloned());
            match &mut copy.shape {
                Shape::Line(line) => {
                    for end in [LineEnd::Start, LineEnd::End] {
                        let slot = line.connection_mut(end);
                        let rebound = slot.take().and_then(|mut conn| {
                            conn.target = fresh.get(&conn.target)?.clone();
                            Some(conn)
                        });
                        *slot = rebound;
                    }
                }
                Shape::Text(text) => {
                    text.anchor_shape = text
                        .anchor_shape
                        .as_ref()
                        .and_then(|owner| fresh.get(owner).cloned());
                }
                _ => {}
            }
            copy.shape.translate(offset);
            self.index.insert(copy.id.clone(), self.elements.len());
            self.elements.push(copy);
        }
        self.resolve_connections();

        roots.iter().filter_map(|r| fresh.get(r).cloned()).collect()
    }

    /// Copy elements in place with an offset. Returns the ids of the copies
    /// of `ids`.
    pub fn duplicate(&mut self, ids: &[ElementId], offset: Vec2) -> EngineResult<Vec<ElementId>> {
        for id in ids {
            self.require(id)?;
        }
        let source = self.copy_elements(ids);
        Ok(self.paste(&source, ids, offset))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::{AnchorName, Circle, Line, Rectangle, Text};

    fn rect(scene: &mut Scene, x: f64, y: f64, w: f64, h: f64) -> ElementId {
        let id = scene.next_id();
        scene.insert(Element::new(
            id.clone(),
            Shape::Rectangle(Rectangle::new(Point::new(x, y), w, h)),
        ));
        id
    }

    fn connector(scene: &mut Scene, from: &ElementId, to: &ElementId) -> ElementId {
        let id = scene.next_id();
        let mut line = Line::new(Point::ZERO, Point::ZERO);
        line.start_connection = Some(Connection::new(from.clone(), AnchorName::Right));
        line.end_connection = Some(Connection::new(to.clone(), AnchorName::Left));
        scene.insert(Element::new(id.clone(), Shape::Line(line)));
        id
    }

    fn line_of(scene: &Scene, id: &ElementId) -> Line {
        scene.get(id).and_then(|e| e.shape.as_line()).cloned().unwrap()
    }

    #[test]
    fn test_ids_are_sequential_and_unique() {
        let mut scene = Scene::new();
        let a = scene.next_id();
        let b = scene.next_id();
        assert_eq!(a.as_str(), "el-1");
        assert_eq!(b.as_str(), "el-2");
    }

    #[test]
    fn test_ids_not_reused_after_clear() {
        let mut scene = Scene::new();
        rect(&mut scene, 0.0, 0.0, 10.0, 10.0);
        scene.clear();
        assert_eq!(scene.next_id().as_str(), "el-2");
    }

    #[test]
    fn test_insert_and_lookup() {
        let mut scene = Scene::new();
        let a = rect(&mut scene, 0.0, 0.0, 10.0, 10.0);
        let b = rect(&mut scene, 20.0, 0.0, 10.0, 10.0);
        assert_eq!(scene.len(), 2);
        assert_eq!(scene.position(&a), Some(0));
        assert_eq!(scene.position(&b), Some(1));
    }

    #[test]
    fn test_update_unknown_id_is_error() {
        let mut scene = Scene::new();
        let result = scene.update(&ElementId::from("el-9"), |_| {});
        assert!(matches!(result, Err(EngineError::UnknownElement(_))));
    }

    #[test]
    fn test_connection_resolves_on_insert() {
        let mut scene = Scene::new();
        let a = rect(&mut scene, 0.0, 0.0, 100.0, 50.0);
        let b = rect(&mut scene, 200.0, 0.0, 100.0, 50.0);
        let line = connector(&mut scene, &a, &b);
        let line = line_of(&scene, &line);
        assert_eq!(line.start, Point::new(100.0, 25.0));
        assert_eq!(line.end, Point::new(200.0, 25.0));
    }

    #[test]
    fn test_moving_target_moves_endpoint() {
        let mut scene = Scene::new();
        let a = rect(&mut scene, 0.0, 0.0, 100.0, 50.0);
        let b = rect(&mut scene, 200.0, 0.0, 100.0, 50.0);
        let id = connector(&mut scene, &a, &b);
        scene.translate(&[b.clone()], Vec2::new(20.0, 0.0)).unwrap();
        let line = line_of(&scene, &id);
        assert_eq!(line.end, Point::new(220.0, 25.0));
        assert_eq!(line.start, Point::new(100.0, 25.0));
    }

    #[test]
    fn test_moving_line_alone_detaches() {
        let mut scene = Scene::new();
        let a = rect(&mut scene, 0.0, 0.0, 100.0, 50.0);
        let b = rect(&mut scene, 200.0, 0.0, 100.0, 50.0);
        let id = connector(&mut scene, &a, &b);
        scene.translate(&[id.clone()], Vec2::new(0.0, 30.0)).unwrap();
        let line = line_of(&scene, &id);
        assert!(line.start_connection.is_none());
        assert_eq!(line.start, Point::new(100.0, 55.0));
    }

    #[test]
    fn test_moving_line_with_targets_keeps_connections() {
        let mut scene = Scene::new();
        let a = rect(&mut scene, 0.0, 0.0, 100.0, 50.0);
        let b = rect(&mut scene, 200.0, 0.0, 100.0, 50.0);
        let id = connector(&mut scene, &a, &b);
        scene
            .translate(&[a.clone(), b.clone(), id.clone()], Vec2::new(5.0, 5.0))
            .unwrap();
        let line = line_of(&scene, &id);
        assert!(line.start_connection.is_some());
        assert_eq!(line.start, Point::new(105.0, 30.0));
    }

    #[test]
    fn test_remove_target_orphans_line() {
        let mut scene = Scene::new();
        let a = rect(&mut scene, 0.0, 0.0, 100.0, 50.0);
        let b = rect(&mut scene, 200.0, 0.0, 100.0, 50.0);
        let id = connector(&mut scene, &a, &b);
        scene.remove(&b, RemovePolicy::Cascade).unwrap();
        let line = line_of(&scene, &id);
        assert!(line.is_orphaned());
        assert_eq!(line.end, Point::new(200.0, 25.0));
        assert!(!line.start_connection.as_ref().unwrap().is_orphaned());
    }

    #[test]
    fn test_remove_group_policies() {
        let mut scene = Scene::new();
        let a = rect(&mut scene, 0.0, 0.0, 10.0, 10.0);
        let b = rect(&mut scene, 20.0, 0.0, 10.0, 10.0);
        let group = scene.group(&[a.clone(), b.clone()]).unwrap().unwrap();

        let mut cascade = scene.clone();
        cascade.remove(&group, RemovePolicy::Cascade).unwrap();
        assert!(cascade.is_empty());

        scene.remove(&group, RemovePolicy::Reparent).unwrap();
        assert_eq!(scene.len(), 2);
        assert!(scene.get(&a).unwrap().parent_id.is_none());
    }

    #[test]
    fn test_group_bounds_and_hit_test() {
        let mut scene = Scene::new();
        let a = rect(&mut scene, 0.0, 0.0, 10.0, 10.0);
        let b = rect(&mut scene, 20.0, 20.0, 10.0, 10.0);
        let group = scene.group(&[a, b.clone()]).unwrap().unwrap();
        assert_eq!(scene.bounds_of(&group), Some(Rect::new(0.0, 0.0, 30.0, 30.0)));
        assert_eq!(scene.hit_test(Point::new(25.0, 25.0), 0.0), Some(group.clone()));
        assert_eq!(scene.top_level_ids(), vec![group]);
    }

    #[test]
    fn test_group_needs_two() {
        let mut scene = Scene::new();
        let a = rect(&mut scene, 0.0, 0.0, 10.0, 10.0);
        assert_eq!(scene.group(&[a]).unwrap(), None);
    }

    #[test]
    fn test_ungroup_restores_members() {
        let mut scene = Scene::new();
        let a = rect(&mut scene, 0.0, 0.0, 10.0, 10.0);
        let b = rect(&mut scene, 20.0, 0.0, 10.0, 10.0);
        let group = scene.group(&[a.clone(), b.clone()]).unwrap().unwrap();
        let members = scene.ungroup(&group).unwrap();
        assert_eq!(members, vec![a, b]);
        assert!(!scene.contains(&group));
    }

    #[test]
    fn test_hit_test_topmost() {
        let mut scene = Scene::new();
        let _back = rect(&mut scene, 0.0, 0.0, 100.0, 100.0);
        let front = rect(&mut scene, 50.0, 50.0, 100.0, 100.0);
        assert_eq!(scene.hit_test(Point::new(75.0, 75.0), 0.0), Some(front));
        assert_eq!(scene.hit_test(Point::new(500.0, 500.0), 0.0), None);
    }

    #[test]
    fn test_reorder_front_and_back() {
        let mut scene = Scene::new();
        let a = rect(&mut scene, 0.0, 0.0, 10.0, 10.0);
        let b = rect(&mut scene, 0.0, 0.0, 10.0, 10.0);
        let c = rect(&mut scene, 0.0, 0.0, 10.0, 10.0);
        assert!(scene.reorder(&[a.clone()], ZOrder::Front).unwrap());
        assert_eq!(scene.ids(), vec![b.clone(), c.clone(), a.clone()]);
        assert!(scene.reorder(&[c.clone()], ZOrder::Back).unwrap());
        assert_eq!(scene.ids(), vec![c.clone(), b, a.clone()]);
        assert!(!scene.reorder(&[a], ZOrder::Front).unwrap());
    }

    #[test]
    fn test_duplicate_rebinds_internal_connections() {
        let mut scene = Scene::new();
        let a = rect(&mut scene, 0.0, 0.0, 100.0, 50.0);
        let b = rect(&mut scene, 200.0, 0.0, 100.0, 50.0);
        let line = connector(&mut scene, &a, &b);

        let copies = scene
            .duplicate(&[a.clone(), line.clone()], Vec2::new(10.0, 10.0))
            .unwrap();
        assert_eq!(copies.len(), 2);
        let copy_line = line_of(&scene, &copies[1]);
        let start = copy_line.start_connection.clone().unwrap();
        assert_eq!(start.target, copies[0]);
        // The end pointed at a rect that was not copied
        assert!(copy_line.end_connection.is_none());
        assert_eq!(copy_line.start, Point::new(110.0, 35.0));
    }

    #[test]
    fn test_labels_follow_owner() {
        let mut scene = Scene::new();
        let owner = rect(&mut scene, 0.0, 0.0, 100.0, 60.0);
        let label_id = scene.next_id();
        let mut text = Text::new(Point::ZERO, "hi");
        text.anchor_shape = Some(owner.clone());
        scene.insert(Element::new(label_id.clone(), Shape::Text(text)));

        assert_eq!(scene.hit_test(Point::new(1.0, 1.0), 0.0), Some(owner.clone()));
        scene.translate(&[owner.clone()], Vec2::new(10.0, 0.0)).unwrap();
        let moved = scene.get(&label_id).unwrap().shape.reference_point().unwrap();
        assert_eq!(moved, Point::new(10.0, 0.0));

        scene.remove(&owner, RemovePolicy::Cascade).unwrap();
        assert!(scene.is_empty());
    }

    #[test]
    fn test_label_inherits_owner_stroke() {
        let mut scene = Scene::new();
        let owner = rect(&mut scene, 0.0, 0.0, 100.0, 60.0);
        scene
            .update(&owner, |e| e.style.stroke = Some("#336699".to_string()))
            .unwrap();
        let label_id = scene.next_id();
        let mut text = Text::new(Point::ZERO, "hi");
        text.anchor_shape = Some(owner);
        scene.insert(Element::new(label_id.clone(), Shape::Text(text)));
        assert_eq!(scene.effective_fill(&label_id).as_deref(), Some("#336699"));
    }

    #[test]
    fn test_resize_recenters_label_and_rejects_lines() {
        let mut scene = Scene::new();
        let owner = rect(&mut scene, 0.0, 0.0, 100.0, 60.0);
        let label_id = scene.next_id();
        let mut text = Text::new(Point::ZERO, "hi");
        text.anchor_shape = Some(owner.clone());
        scene.insert(Element::new(label_id.clone(), Shape::Text(text)));

        scene
            .resize(&owner, Corner::SouthEast, Rect::new(0.0, 0.0, 200.0, 100.0))
            .unwrap();
        let center = scene.bounds_of(&label_id).unwrap().center();
        assert!((center.x - 100.0).abs() <= 1.0);

        let line_id = scene.next_id();
        scene.insert(Element::new(
            line_id.clone(),
            Shape::Line(Line::new(Point::ZERO, Point::new(5.0, 5.0))),
        ));
        assert!(scene.resize(&line_id, Corner::SouthEast, Rect::ZERO).is_err());
    }

    #[test]
    fn test_box_select_is_inclusive() {
        let mut scene = Scene::new();
        let a = rect(&mut scene, 0.0, 0.0, 10.0, 10.0);
        let _b = rect(&mut scene, 50.0, 50.0, 10.0, 10.0);
        let circle = scene.next_id();
        scene.insert(Element::new(
            circle.clone(),
            Shape::Circle(Circle::new(Point::new(30.0, 0.0), 5.0)),
        ));
        let hits = scene.top_level_in_rect(Rect::new(10.0, 0.0, 25.0, 5.0));
        assert_eq!(hits, vec![a, circle]);
    }

    #[test]
    fn test_restore_exact_order() {
        let mut scene = Scene::new();
        let a = rect(&mut scene, 0.0, 0.0, 10.0, 10.0);
        let b = rect(&mut scene, 0.0, 0.0, 10.0, 10.0);
        let snapshot = scene.clone();
        let removed = scene.remove(&a, RemovePolicy::Cascade).unwrap();
        scene.restore(
            &[(a.clone(), removed.into_iter().next())],
            Some(&[a.clone(), b.clone()]),
        );
        assert_eq!(scene, snapshot);
    }
}
