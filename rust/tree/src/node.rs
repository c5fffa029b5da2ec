// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Tree node handed to the renderer.

use crate::snapshot::ElementId;
use serde::{Deserialize, Serialize};

/// Node of the model structure tree.
///
/// Real elements carry their positive express id in both `id` and
/// `selectable_id`. Synthetic nodes (type-group headers, placeholder roots)
/// carry non-positive ids and are inert on click.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeNode {
    pub id: i64,
    pub selectable_id: i64,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_label: Option<String>,
    #[serde(default)]
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    /// Node for a real model element.
    pub fn element(id: ElementId, name: impl Into<String>, type_label: Option<String>) -> Self {
        Self {
            id: i64::from(id),
            selectable_id: i64::from(id),
            name: name.into(),
            type_label,
            children: Vec::new(),
        }
    }

    /// Synthetic node. `id` must be non-positive.
    pub fn synthetic(id: i64, name: impl Into<String>, type_label: Option<String>) -> Self {
        debug_assert!(id <= 0, "synthetic node ids are non-positive");
        Self {
            id,
            selectable_id: id,
            name: name.into(),
            type_label,
            children: Vec::new(),
        }
    }

    /// Element to select when this node is clicked, if any.
    pub fn selectable(&self) -> Option<ElementId> {
        if self.selectable_id > 0 {
            ElementId::try_from(self.selectable_id).ok()
        } else {
            None
        }
    }

    pub fn is_synthetic(&self) -> bool {
        self.id <= 0
    }

    /// Case-insensitive substring match on name and type label.
    /// `needle` must already be lower-cased.
    pub fn matches(&self, needle: &str) -> bool {
        self.name.to_lowercase().contains(needle)
            || self
                .type_label
                .as_deref()
                .is_some_and(|label| label.to_lowercase().contains(needle))
    }

    /// Pre-order walk over this node and all descendants.
    pub fn iter(&self) -> impl Iterator<Item = &TreeNode> {
        let mut stack = vec![self];
        std::iter::from_fn(move || {
            let node = stack.pop()?;
            stack.extend(node.children.iter().rev());
            Some(node)
        })
    }

    /// Number of nodes in this subtree, including itself.
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    /// Always false: a subtree contains at least its root.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// First node in the subtree with the given id.
    pub fn find(&self, id: i64) -> Option<&TreeNode> {
        self.iter().find(|node| node.id == id)
    }
}
