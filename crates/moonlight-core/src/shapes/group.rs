//! Group marker for combining elements.

use serde::{Deserialize, Serialize};

/// A group of elements that can be manipulated as a single unit.
///
/// Membership is stored on the children (`Element::parent_id`), so the group
/// itself carries no geometry; its bounds are the union of its children.
/// Groups can contain other groups.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {}

impl Group {
    pub fn new() -> Self {
        Self {}
    }
}
