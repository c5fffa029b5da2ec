// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Property-based tests for the builder and the search filter.
//!
//! Invariants that must hold for any classified model:
//! - every element id appears in the built tree exactly once
//! - synthetic ids are non-positive and unique
//! - the filter keeps a node iff it matches or a descendant does

use ifc_lite_tree::{
    build_spatial_tree, build_tree, filter_tree, ClassificationSnapshot, Classification,
    ElementId, EntityGroup, NameMap, NestingPolicy, SpatialGroup, TreeConfig, TreeNode,
};
use proptest::prelude::*;
use rustc_hash::{FxHashMap, FxHashSet};

const TYPES: &[&str] = &[
    "IFCPROJECT",
    "IFCSITE",
    "IFCBUILDINGSTOREY",
    "IFCWALL",
    "IFCDOOR",
    "IFCSLAB",
    "IFCFLOWTERMINAL",
];
const WORDS: &[&str] = &["Basic Wall", "Entrance", "Level 1", "Roof", "Curtain Panel", "Duct"];

fn element_id() -> impl Strategy<Value = ElementId> {
    prop_oneof![3 => 1u32..40, 1 => 1000u32..1006]
}

fn spatial_groups() -> impl Strategy<Value = Vec<SpatialGroup>> {
    prop::collection::vec(
        (
            1000u32..1006,
            prop::sample::select(WORDS),
            prop::collection::vec(element_id(), 0..8),
        ),
        0..5,
    )
    .prop_map(|groups| {
        groups
            .into_iter()
            .map(|(id, name, members)| SpatialGroup::new(name, id).with_fragment("f1", members))
            .collect()
    })
}

fn entity_groups() -> impl Strategy<Value = Vec<EntityGroup>> {
    prop::collection::vec(
        (
            prop::sample::select(TYPES),
            // Spatial ids too, so the project and site types can name containers.
            prop::collection::vec(element_id(), 0..10),
        ),
        0..4,
    )
    .prop_map(|groups| {
        groups
            .into_iter()
            .map(|(type_name, ids)| EntityGroup::new(type_name, ids))
            .collect()
    })
}

fn names() -> impl Strategy<Value = NameMap> {
    prop::collection::vec((1u32..40, prop::sample::select(WORDS)), 0..20).prop_map(|pairs| {
        pairs
            .into_iter()
            .map(|(id, word)| (id, word.to_string()))
            .collect()
    })
}

fn policy() -> impl Strategy<Value = NestingPolicy> {
    prop_oneof![Just(NestingPolicy::FirstMatch), Just(NestingPolicy::Innermost)]
}

/// All ids the classifier reported, spatial group ids included.
fn reported_ids(snapshot: &ClassificationSnapshot) -> FxHashSet<i64> {
    let mut ids = FxHashSet::default();
    for group in &snapshot.spatial {
        ids.insert(i64::from(group.id));
        ids.extend(group.member_set().into_iter().map(i64::from));
    }
    for group in &snapshot.entities {
        ids.extend(group.elements.iter().copied().map(i64::from));
    }
    ids
}

/// Ids of nodes that match `needle` or have a matching descendant.
fn expected_survivors(node: &TreeNode, needle: &str, out: &mut FxHashSet<i64>) -> bool {
    let mut keep = node.matches(needle);
    for child in &node.children {
        keep |= expected_survivors(child, needle, out);
    }
    if keep {
        out.insert(node.id);
    }
    keep
}

proptest! {
    #[test]
    fn prop_every_element_appears_once(
        spatial in spatial_groups(),
        entities in entity_groups(),
        names in names(),
        policy in policy(),
    ) {
        let snapshot = ClassificationSnapshot { spatial, entities };
        // Random containment can be cyclic; those models take the fallback path.
        let Ok(tree) = build_spatial_tree(&snapshot, &names, policy) else {
            return Ok(());
        };

        let mut counts: FxHashMap<i64, usize> = FxHashMap::default();
        for node in tree.iter().filter(|n| n.id > 0) {
            *counts.entry(node.id).or_insert(0) += 1;
        }

        let expected = reported_ids(&snapshot);
        prop_assert_eq!(counts.len(), expected.len());
        for id in &expected {
            prop_assert_eq!(counts.get(id).copied(), Some(1), "element #{}", id);
        }
    }

    #[test]
    fn prop_synthetic_ids_are_unique_and_inert(
        spatial in spatial_groups(),
        entities in entity_groups(),
        names in names(),
    ) {
        let classification = Classification::Spatial(ClassificationSnapshot { spatial, entities });
        let tree = build_tree(&classification, &names, &TreeConfig::default());

        prop_assert_eq!(tree.type_label.as_deref(), Some("Project"));

        let mut seen = FxHashSet::default();
        for node in tree.iter() {
            prop_assert!(seen.insert(node.id), "duplicate node id {}", node.id);
            if node.id <= 0 {
                prop_assert!(node.selectable().is_none());
            } else {
                prop_assert_eq!(node.selectable(), Some(node.id as ElementId));
            }
        }
    }

    #[test]
    fn prop_filter_keeps_matches_and_their_ancestors(
        spatial in spatial_groups(),
        entities in entity_groups(),
        names in names(),
        query in "[a-z ]{1,3}",
    ) {
        let snapshot = ClassificationSnapshot { spatial, entities };
        let Ok(tree) = build_spatial_tree(&snapshot, &names, NestingPolicy::FirstMatch) else {
            return Ok(());
        };

        let filtered = filter_tree(&tree, &query);
        if query.trim().is_empty() {
            prop_assert_eq!(filtered.as_deref(), Some(&tree));
            return Ok(());
        }

        let mut expected = FxHashSet::default();
        expected_survivors(&tree, &query.to_lowercase(), &mut expected);

        match filtered {
            None => prop_assert!(expected.is_empty()),
            Some(filtered) => {
                let kept: FxHashSet<i64> = filtered.iter().map(|n| n.id).collect();
                prop_assert_eq!(kept, expected);
                prop_assert_eq!(filtered.id, tree.id);
            }
        }
    }
}
