// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Tree builder: classification snapshot + names -> one Project-rooted tree.
//!
//! The spatial build runs in four passes over the snapshot:
//!
//! 1. **Seed**: one slot per spatial group id, member sets unioned across
//!    fragments (groups sharing an id are merged).
//! 2. **Nest**: a group whose id is listed in another group's members is
//!    nested under it. The id is removed from every listing parent's member
//!    set; [`NestingPolicy`] picks the one parent it is attached to.
//! 3. **Own**: every remaining member belongs to exactly one slot, the
//!    deepest one listing it, so transitive membership never duplicates a leaf.
//! 4. **Group**: each slot's own elements are bucketed under synthetic
//!    type-group headers, one per entity type.
//!
//! Synthetic ids are `-(scope * stride + counter)` where `scope` is the owning
//! spatial id (0 for the placeholder project), `counter` starts at 1 per scope
//! and `stride` exceeds the number of possible buckets, so headers never
//! collide with each other or with positive element ids.
//!
//! If the spatial build fails the builder falls back to flat entity-type
//! categories, and if that fails too it returns a single error node. It never
//! returns an error.

use crate::config::{NestingPolicy, TreeConfig};
use crate::error::{Error, Result};
use crate::labels::{self, PROJECT_LABEL, PROJECT_TYPE};
use crate::names::{placeholder_name, NameMap};
use crate::node::TreeNode;
use crate::snapshot::{Classification, ClassificationSnapshot, ElementId, EntityGroup, GroupId};
use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::BTreeSet;

/// Name of the node returned when nothing could be built.
pub const ERROR_NODE_NAME: &str = "Error loading structure";

/// Build the display tree for a classified model.
pub fn build_tree(classification: &Classification, names: &NameMap, config: &TreeConfig) -> TreeNode {
    let start = std::time::Instant::now();

    let tree = match classification {
        Classification::Spatial(snapshot) => {
            match build_spatial_tree(snapshot, names, config.nesting_policy) {
                Ok(tree) => tree,
                Err(e) => {
                    tracing::warn!(error = %e, "Spatial tree build failed, falling back to entity categories");
                    entity_tree_or_error(&snapshot.entities, names)
                }
            }
        }
        Classification::EntityOnly { entities, cause } => {
            tracing::warn!(cause = %cause, "Spatial structure unavailable, building entity categories");
            entity_tree_or_error(entities, names)
        }
        Classification::Failed(cause) => {
            tracing::error!(cause = %cause, "Classification failed");
            error_tree()
        }
    };

    tracing::info!(
        kind = classification.kind(),
        nodes = tree.len(),
        build_time_us = start.elapsed().as_micros() as u64,
        "Model tree built"
    );

    tree
}

/// Single-node tree shown when the structure could not be built at all.
pub fn error_tree() -> TreeNode {
    TreeNode::synthetic(0, ERROR_NODE_NAME, Some(PROJECT_LABEL.to_string()))
}

fn entity_tree_or_error(entities: &[EntityGroup], names: &NameMap) -> TreeNode {
    match build_entity_tree(entities, names) {
        Ok(tree) => tree,
        Err(e) => {
            tracing::error!(error = %e, "Entity classification tree failed");
            error_tree()
        }
    }
}

/// Entity type lookup shared by both build modes.
struct TypeIndex<'a> {
    groups: &'a [EntityGroup],
    /// Element id -> index of the first entity group listing it.
    type_of: FxHashMap<ElementId, usize>,
    /// Upper bound on type buckets per scope, plus one.
    stride: i64,
}

impl<'a> TypeIndex<'a> {
    fn new(groups: &'a [EntityGroup]) -> Self {
        let mut type_of: FxHashMap<ElementId, usize> = FxHashMap::default();
        for (index, group) in groups.iter().enumerate() {
            for &id in &group.elements {
                if let Some(&first) = type_of.get(&id) {
                    tracing::debug!(
                        element_id = id,
                        kept = %groups[first].type_name,
                        ignored = %group.type_name,
                        "Element listed under several entity types"
                    );
                } else {
                    type_of.insert(id, index);
                }
            }
        }

        Self {
            groups,
            type_of,
            // One bucket per entity group plus the untyped bucket, counters from 1.
            stride: groups.len() as i64 + 2,
        }
    }

    fn type_name(&self, id: ElementId) -> Option<&'a str> {
        self.type_of
            .get(&id)
            .map(|&index| self.groups[index].type_name.as_str())
    }

    fn label(&self, id: ElementId) -> Option<String> {
        self.type_name(id).map(labels::friendly_name)
    }

    /// Express id of the IFCPROJECT entity, if classified.
    fn project_id(&self) -> Option<ElementId> {
        self.groups
            .iter()
            .find(|g| g.type_name.eq_ignore_ascii_case(PROJECT_TYPE))
            .and_then(|g| g.elements.first().copied())
            .filter(|&id| id > 0)
    }

    fn synthetic_id(&self, scope: i64, counter: i64) -> i64 {
        -(scope * self.stride + counter)
    }
}

/// Leaf node for an element.
fn leaf(id: ElementId, types: &TypeIndex, names: &NameMap) -> TreeNode {
    let label = types.label(id).unwrap_or_else(|| "Element".to_string());
    TreeNode::element(id, names.name_or_placeholder(id), Some(label))
}

fn sort_by_name(nodes: &mut [TreeNode]) {
    nodes.sort_by(|a, b| labels::compare_names(&a.name, &b.name).then(a.id.cmp(&b.id)));
}

fn sort_spatial(nodes: &mut [TreeNode]) {
    nodes.sort_by(|a, b| {
        labels::compare_roots(a.type_label.as_deref(), &a.name, b.type_label.as_deref(), &b.name)
            .then(a.id.cmp(&b.id))
    });
}

/// Bucket `elements` under one synthetic header per entity type.
///
/// Counters follow entity group order with the untyped bucket last; headers
/// are then sorted by display name.
fn group_by_type(scope: i64, elements: &[ElementId], types: &TypeIndex, names: &NameMap) -> Vec<TreeNode> {
    if elements.is_empty() {
        return Vec::new();
    }

    let untyped = types.groups.len();
    let mut buckets: Vec<Vec<ElementId>> = vec![Vec::new(); untyped + 1];
    for &id in elements {
        let bucket = types.type_of.get(&id).copied().unwrap_or(untyped);
        buckets[bucket].push(id);
    }

    let mut counter = 0i64;
    let mut headers = Vec::new();
    for (bucket, ids) in buckets.into_iter().enumerate() {
        if ids.is_empty() {
            continue;
        }
        counter += 1;

        let friendly = match types.groups.get(bucket) {
            Some(group) => labels::friendly_name(&group.type_name),
            None => "Element".to_string(),
        };
        let mut header = TreeNode::synthetic(
            types.synthetic_id(scope, counter),
            format!("{} ({})", labels::plural(&friendly), ids.len()),
            Some(format!("{}Group", friendly)),
        );
        header.children = ids.into_iter().map(|id| leaf(id, types, names)).collect();
        sort_by_name(&mut header.children);
        headers.push(header);
    }

    sort_by_name(&mut headers);
    headers
}

/// Project root named after the IFCPROJECT entity, or a placeholder.
fn project_root(project_id: Option<ElementId>, names: &NameMap) -> TreeNode {
    match project_id {
        Some(id) => {
            let name = match names.get(id) {
                Some(name) if name != placeholder_name(id) => name.to_string(),
                _ => format!("Project {}", id),
            };
            TreeNode::element(id, name, Some(PROJECT_LABEL.to_string()))
        }
        None => TreeNode::synthetic(0, PROJECT_LABEL, Some(PROJECT_LABEL.to_string())),
    }
}

/// One spatial group during the build.
struct SpatialSlot<'a> {
    id: GroupId,
    name: &'a str,
    members: BTreeSet<ElementId>,
    /// Member count before nesting removed child ids.
    original_len: usize,
    parent: Option<usize>,
    children: Vec<usize>,
}

struct SpatialBuild<'a> {
    slots: Vec<SpatialSlot<'a>>,
    slot_of: FxHashMap<GroupId, usize>,
    /// Elements owned by each slot, ascending.
    direct: Vec<Vec<ElementId>>,
    types: TypeIndex<'a>,
    names: &'a NameMap,
}

impl<'a> SpatialBuild<'a> {
    fn seed(snapshot: &'a ClassificationSnapshot, names: &'a NameMap) -> Self {
        let mut slots: Vec<SpatialSlot<'a>> = Vec::with_capacity(snapshot.spatial.len());
        let mut slot_of: FxHashMap<GroupId, usize> = FxHashMap::default();

        for group in &snapshot.spatial {
            if group.id == 0 {
                tracing::warn!(group = %group.name, "Skipping spatial group with id 0");
                continue;
            }
            let index = *slot_of.entry(group.id).or_insert_with(|| {
                slots.push(SpatialSlot {
                    id: group.id,
                    name: group.name.as_str(),
                    members: BTreeSet::new(),
                    original_len: 0,
                    parent: None,
                    children: Vec::new(),
                });
                slots.len() - 1
            });
            slots[index].members.extend(group.member_set());
        }
        for slot in &mut slots {
            slot.original_len = slot.members.len();
        }

        let direct = vec![Vec::new(); slots.len()];
        Self {
            slots,
            slot_of,
            direct,
            types: TypeIndex::new(&snapshot.entities),
            names,
        }
    }

    fn is_ancestor(&self, ancestor: usize, mut node: usize) -> bool {
        loop {
            if node == ancestor {
                return true;
            }
            match self.slots[node].parent {
                Some(parent) => node = parent,
                None => return false,
            }
        }
    }

    fn nest(&mut self, policy: NestingPolicy, project_slot: Option<usize>) -> Result<()> {
        for child in 0..self.slots.len() {
            let child_id = self.slots[child].id;
            let candidates: Vec<usize> = (0..self.slots.len())
                .filter(|&p| p != child && self.slots[p].members.contains(&child_id))
                .collect();
            if candidates.is_empty() {
                continue;
            }

            for &p in &candidates {
                self.slots[p].members.remove(&child_id);
            }
            if Some(child) == project_slot {
                // The project is the root; it is never nested.
                continue;
            }

            let parent = match policy {
                NestingPolicy::FirstMatch => candidates[0],
                NestingPolicy::Innermost => candidates
                    .iter()
                    .copied()
                    .min_by_key(|&p| self.slots[p].original_len)
                    .unwrap_or(candidates[0]),
            };
            if candidates.len() > 1 {
                tracing::debug!(
                    group_id = child_id,
                    candidates = candidates.len(),
                    parent_id = self.slots[parent].id,
                    ?policy,
                    "Spatial group listed by several parents"
                );
            }

            if self.is_ancestor(child, parent) {
                return Err(Error::NestingCycle {
                    parent: self.slots[parent].id,
                    child: child_id,
                });
            }
            self.slots[child].parent = Some(parent);
            self.slots[parent].children.push(child);
        }
        Ok(())
    }

    fn depth(&self, mut node: usize) -> usize {
        let mut depth = 0;
        while let Some(parent) = self.slots[node].parent {
            depth += 1;
            node = parent;
        }
        depth
    }

    /// Assign every remaining member to the deepest slot listing it.
    /// Returns the set of owned element ids.
    fn assign_owners(&mut self, project_id: Option<ElementId>) -> FxHashSet<ElementId> {
        let depths: Vec<usize> = (0..self.slots.len()).map(|i| self.depth(i)).collect();
        let mut owner: FxHashMap<ElementId, usize> = FxHashMap::default();

        for (index, slot) in self.slots.iter().enumerate() {
            for &id in &slot.members {
                if id == 0 || self.slot_of.contains_key(&id) || Some(id) == project_id {
                    continue;
                }
                owner
                    .entry(id)
                    .and_modify(|current| {
                        if depths[index] > depths[*current] {
                            *current = index;
                        }
                    })
                    .or_insert(index);
            }
        }

        for (&id, &index) in &owner {
            self.direct[index].push(id);
        }
        for ids in &mut self.direct {
            ids.sort_unstable();
        }
        owner.into_keys().collect()
    }

    fn spatial_name(&self, slot: &SpatialSlot) -> String {
        if !slot.name.trim().is_empty() {
            return slot.name.to_string();
        }
        match self.names.get(slot.id) {
            Some(name) if name != placeholder_name(slot.id) => name.to_string(),
            _ => format!("Group {}", slot.id),
        }
    }

    fn spatial_label(&self, slot: &SpatialSlot) -> Option<String> {
        self.types
            .label(slot.id)
            .or_else(|| labels::known_friendly_name(slot.name).map(str::to_string))
    }

    fn materialize(&self, index: usize) -> TreeNode {
        let slot = &self.slots[index];
        let mut node = TreeNode::element(slot.id, self.spatial_name(slot), self.spatial_label(slot));
        node.children = group_by_type(i64::from(slot.id), &self.direct[index], &self.types, self.names);

        let mut nested: Vec<TreeNode> = slot.children.iter().map(|&c| self.materialize(c)).collect();
        sort_spatial(&mut nested);
        node.children.extend(nested);
        node
    }
}

/// Spatial hierarchy with per-container type groups.
pub fn build_spatial_tree(
    snapshot: &ClassificationSnapshot,
    names: &NameMap,
    policy: NestingPolicy,
) -> Result<TreeNode> {
    let mut build = SpatialBuild::seed(snapshot, names);
    let project_id = build.types.project_id();
    let project_slot = project_id.and_then(|id| build.slot_of.get(&id).copied());

    build.nest(policy, project_slot)?;
    let owned = build.assign_owners(project_id);

    // Elements only the entity classification knows about hang off the root.
    let mut unplaced: Vec<ElementId> = snapshot
        .entities
        .iter()
        .flat_map(|g| g.elements.iter().copied())
        .filter(|id| {
            *id > 0
                && !owned.contains(id)
                && !build.slot_of.contains_key(id)
                && Some(*id) != project_id
        })
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    if !unplaced.is_empty() {
        tracing::debug!(count = unplaced.len(), "Elements without a spatial container");
    }

    let roots: Vec<usize> = (0..build.slots.len())
        .filter(|&i| build.slots[i].parent.is_none() && Some(i) != project_slot)
        .collect();

    let mut root_nodes: Vec<TreeNode> = roots.iter().map(|&i| build.materialize(i)).collect();
    sort_spatial(&mut root_nodes);

    let mut project = match project_slot {
        Some(slot) => {
            // The project itself is a spatial group: it absorbs the unplaced
            // elements into its own buckets so synthetic ids stay unique.
            build.direct[slot].append(&mut unplaced);
            build.direct[slot].sort_unstable();
            let mut node = build.materialize(slot);
            node.type_label = Some(PROJECT_LABEL.to_string());
            node
        }
        None => {
            let mut node = project_root(project_id, names);
            let scope = project_id.map(i64::from).unwrap_or(0);
            node.children = group_by_type(scope, &unplaced, &build.types, names);
            node
        }
    };
    project.children.extend(root_nodes);

    tracing::debug!(
        spatial_groups = build.slots.len(),
        roots = roots.len(),
        elements = owned.len(),
        "Spatial nesting resolved"
    );

    Ok(project)
}

/// Flat entity-type categories under the Project root.
pub fn build_entity_tree(entities: &[EntityGroup], names: &NameMap) -> Result<TreeNode> {
    if entities.is_empty() {
        return Err(Error::NoEntityGroups);
    }

    let types = TypeIndex::new(entities);
    let project_id = types.project_id();
    let mut project = project_root(project_id, names);

    // Placeholder root sits in scope 0, a named one in its own id's scope.
    let scope = project_id.map(i64::from).unwrap_or(0);
    let mut counter = 0i64;
    let mut categories = Vec::new();
    for (index, group) in entities.iter().enumerate() {
        let mut leaves: Vec<TreeNode> = group
            .elements
            .iter()
            .copied()
            .filter(|&id| {
                id > 0 && types.type_of.get(&id) == Some(&index) && Some(id) != project_id
            })
            .map(|id| leaf(id, &types, names))
            .collect();
        if leaves.is_empty() {
            continue;
        }
        counter += 1;

        sort_by_name(&mut leaves);
        let friendly = labels::friendly_name(&group.type_name);
        let mut category = TreeNode::synthetic(
            types.synthetic_id(scope, counter),
            labels::plural(&friendly),
            Some(format!("{}Group", friendly)),
        );
        category.children = leaves;
        categories.push(category);
    }

    sort_by_name(&mut categories);
    project.children = categories;
    Ok(project)
}
