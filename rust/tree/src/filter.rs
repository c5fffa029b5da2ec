// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Structure-preserving text search over a built tree.

use crate::node::TreeNode;
use std::borrow::Cow;

/// Filter `root` down to the nodes matching `query` and their ancestors.
///
/// Matching is a case-insensitive substring test on name and type label. A
/// node survives if it matches or any child survives; survivors keep only
/// their surviving children. A blank query borrows the input unchanged.
/// Returns `None` when nothing matches.
pub fn filter_tree<'a>(root: &'a TreeNode, query: &str) -> Option<Cow<'a, TreeNode>> {
    if query.trim().is_empty() {
        return Some(Cow::Borrowed(root));
    }
    let needle = query.to_lowercase();
    filter_node(root, &needle).map(Cow::Owned)
}

fn filter_node(node: &TreeNode, needle: &str) -> Option<TreeNode> {
    let children: Vec<TreeNode> = node
        .children
        .iter()
        .filter_map(|child| filter_node(child, needle))
        .collect();

    if children.is_empty() && !node.matches(needle) {
        return None;
    }

    Some(TreeNode {
        id: node.id,
        selectable_id: node.selectable_id,
        name: node.name.clone(),
        type_label: node.type_label.clone(),
        children,
    })
}
