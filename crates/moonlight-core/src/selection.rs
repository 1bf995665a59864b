//! Selection set.

use crate::scene::Scene;
use crate::shapes::ElementId;
use kurbo::Rect;

/// The set of selected element ids, in the order they were selected.
///
/// Mutators return whether the set changed so callers can decide whether to
/// emit selection events.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    ids: Vec<ElementId>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ids(&self) -> &[ElementId] {
        &self.ids
    }

    pub fn to_vec(&self) -> Vec<ElementId> {
        self.ids.clone()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn contains(&self, id: &ElementId) -> bool {
        self.ids.contains(id)
    }

    /// The first selected element, used as the reference for snapping.
    pub fn primary(&self) -> Option<&ElementId> {
        self.ids.first()
    }

    /// The single selected element, if exactly one is selected.
    pub fn single(&self) -> Option<&ElementId> {
        match self.ids.as_slice() {
            [id] => Some(id),
            _ => None,
        }
    }

    /// Replace the selection with one element.
    pub fn select_one(&mut self, id: ElementId) -> bool {
        self.set(vec![id])
    }

    /// Add if absent, remove if present (shift-click).
    pub fn toggle(&mut self, id: ElementId) -> bool {
        if let Some(pos) = self.ids.iter().position(|s| *s == id) {
            self.ids.remove(pos);
        } else {
            self.ids.push(id);
        }
        true
    }

    /// Replace the selection with the given ids (duplicates dropped).
    pub fn set(&mut self, ids: Vec<ElementId>) -> bool {
        let mut next: Vec<ElementId> = Vec::with_capacity(ids.len());
        for id in ids {
            if !next.contains(&id) {
                next.push(id);
            }
        }
        if next == self.ids {
            return false;
        }
        self.ids = next;
        true
    }

    /// Select every top-level element.
    pub fn select_all(&mut self, scene: &Scene) -> bool {
        self.set(scene.top_level_ids())
    }

    /// Select every top-level element whose bounds touch `rect`.
    pub fn box_select(&mut self, scene: &Scene, rect: Rect) -> bool {
        self.set(scene.top_level_in_rect(rect))
    }

    pub fn clear(&mut self) -> bool {
        if self.ids.is_empty() {
            return false;
        }
        self.ids.clear();
        true
    }

    /// Drop ids that are no longer in the scene.
    pub fn retain_existing(&mut self, scene: &Scene) -> bool {
        let before = self.ids.len();
        self.ids.retain(|id| scene.contains(id));
        self.ids.len() != before
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::{Element, Rectangle, Shape};
    use kurbo::Point;

    fn scene_with(n: usize) -> (Scene, Vec<ElementId>) {
        let mut scene = Scene::new();
        let mut ids = Vec::new();
        for i in 0..n {
            let id = scene.next_id();
            scene.insert(Element::new(
                id.clone(),
                Shape::Rectangle(Rectangle::new(Point::new(i as f64 * 100.0, 0.0), 50.0, 50.0)),
            ));
            ids.push(id);
        }
        (scene, ids)
    }

    #[test]
    fn test_select_one_replaces() {
        let (_, ids) = scene_with(2);
        let mut selection = Selection::new();
        selection.select_one(ids[0].clone());
        selection.select_one(ids[1].clone());
        assert_eq!(selection.ids(), &[ids[1].clone()]);
    }

    #[test]
    fn test_toggle() {
        let (_, ids) = scene_with(2);
        let mut selection = Selection::new();
        selection.select_one(ids[0].clone());
        selection.toggle(ids[1].clone());
        assert_eq!(selection.len(), 2);
        selection.toggle(ids[0].clone());
        assert_eq!(selection.ids(), &[ids[1].clone()]);
    }

    #[test]
    fn test_select_all_and_clear() {
        let (scene, ids) = scene_with(3);
        let mut selection = Selection::new();
        assert!(selection.select_all(&scene));
        assert_eq!(selection.to_vec(), ids);
        assert!(selection.clear());
        assert!(!selection.clear());
    }

    #[test]
    fn test_box_select_replaces_previous() {
        let (scene, ids) = scene_with(3);
        let mut selection = Selection::new();
        selection.select_one(ids[2].clone());
        selection.box_select(&scene, Rect::new(-10.0, -10.0, 120.0, 10.0));
        assert_eq!(selection.to_vec(), vec![ids[0].clone(), ids[1].clone()]);
    }

    #[test]
    fn test_retain_existing() {
        let (mut scene, ids) = scene_with(2);
        let mut selection = Selection::new();
        selection.select_all(&scene);
        scene
            .remove(&ids[0], crate::scene::RemovePolicy::Cascade)
            .unwrap();
        assert!(selection.retain_existing(&scene));
        assert_eq!(selection.to_vec(), vec![ids[1].clone()]);
    }
}
