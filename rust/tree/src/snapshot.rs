// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Classification snapshot: the immutable input to the tree builder.
//!
//! The classifier reports two groupings of the same elements:
//!
//! - **Spatial groups**: one per spatial container (site, building, storey,
//!   space). A group's members include the ids of the spatial groups nested
//!   in it, which is how the hierarchy is recovered.
//! - **Entity groups**: one per IFC entity type, independent of containment.
//!
//! Both arrive as name-keyed JSON objects whose member sets are partitioned by
//! fragment key. [`NamedGroups`] keeps the document order of those objects,
//! because first-match nesting depends on it.

use crate::error::Error;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::de::{Deserializer, MapAccess, Visitor};
use serde::Deserialize;
use std::collections::BTreeSet;
use std::fmt;
use std::marker::PhantomData;

/// IFC express id of a model element.
pub type ElementId = u32;

/// Id of a spatial group. Shares the express id space with elements.
pub type GroupId = u32;

/// Member ids partitioned by fragment key. The key carries no identity.
pub type FragmentMap = FxHashMap<String, FxHashSet<ElementId>>;

/// One spatial container and its flat content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpatialGroup {
    /// Group name as reported by the classifier.
    pub name: String,
    /// Express id of the spatial element.
    pub id: GroupId,
    /// Members by fragment key.
    pub members: FragmentMap,
}

impl SpatialGroup {
    pub fn new(name: impl Into<String>, id: GroupId) -> Self {
        Self {
            name: name.into(),
            id,
            members: FragmentMap::default(),
        }
    }

    /// Add members under a fragment key.
    pub fn with_fragment(
        mut self,
        fragment: impl Into<String>,
        ids: impl IntoIterator<Item = ElementId>,
    ) -> Self {
        self.members.entry(fragment.into()).or_default().extend(ids);
        self
    }

    /// Union of all member sets, ascending.
    pub fn member_set(&self) -> BTreeSet<ElementId> {
        self.members.values().flatten().copied().collect()
    }
}

/// Elements of one IFC entity type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityGroup {
    /// IFC type name, e.g. `IFCWALL`.
    pub type_name: String,
    /// Member ids, ascending and unique.
    pub elements: Vec<ElementId>,
}

impl EntityGroup {
    pub fn new(type_name: impl Into<String>, ids: impl IntoIterator<Item = ElementId>) -> Self {
        let elements: BTreeSet<ElementId> = ids.into_iter().collect();
        Self {
            type_name: type_name.into(),
            elements: elements.into_iter().collect(),
        }
    }
}

/// Spatial and entity groups of one loaded model.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassificationSnapshot {
    pub spatial: Vec<SpatialGroup>,
    pub entities: Vec<EntityGroup>,
}

/// Outcome of the classification phase, constructed deliberately by the
/// provider rather than inferred from which fields happen to be present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// Relations were indexed and spatial groups are meaningful.
    Spatial(ClassificationSnapshot),
    /// Only entity-type groups are usable.
    EntityOnly {
        entities: Vec<EntityGroup>,
        cause: Error,
    },
    /// Nothing usable was classified.
    Failed(Error),
}

impl Classification {
    /// Build the tagged result from what the provider produced.
    ///
    /// An indexing failure invalidates the spatial groups. Without entity
    /// groups to fall back on the classification has failed outright.
    pub fn from_provider(
        indexing: Result<(), Error>,
        spatial: Vec<SpatialGroup>,
        entities: Vec<EntityGroup>,
    ) -> Self {
        match indexing {
            Err(cause) if entities.is_empty() => {
                Self::Failed(Error::Classification(cause.to_string()))
            }
            Err(cause) => Self::EntityOnly { entities, cause },
            Ok(()) if !spatial.is_empty() => {
                Self::Spatial(ClassificationSnapshot { spatial, entities })
            }
            Ok(()) if !entities.is_empty() => Self::EntityOnly {
                entities,
                cause: Error::Indexing("no spatial groups reported".to_string()),
            },
            Ok(()) => Self::Failed(Error::Classification(
                "no spatial or entity groups reported".to_string(),
            )),
        }
    }

    /// Short name of the variant, for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Spatial(_) => "spatial",
            Self::EntityOnly { .. } => "entity-only",
            Self::Failed(_) => "failed",
        }
    }

    /// Entity groups, when any were classified.
    pub fn entities(&self) -> &[EntityGroup] {
        match self {
            Self::Spatial(snapshot) => &snapshot.entities,
            Self::EntityOnly { entities, .. } => entities,
            Self::Failed(_) => &[],
        }
    }

    /// Every id that can end up as a named node, ascending and unique.
    pub fn element_ids(&self) -> Vec<ElementId> {
        let mut ids: BTreeSet<ElementId> = BTreeSet::new();
        if let Self::Spatial(snapshot) = self {
            for group in &snapshot.spatial {
                ids.insert(group.id);
                ids.extend(group.members.values().flatten().copied());
            }
        }
        for group in self.entities() {
            ids.extend(group.elements.iter().copied());
        }
        ids.remove(&0);
        ids.into_iter().collect()
    }
}

/// Name-keyed groups in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedGroups<T>(pub Vec<(String, T)>);

impl<T> Default for NamedGroups<T> {
    fn default() -> Self {
        Self(Vec::new())
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for NamedGroups<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct GroupsVisitor<T>(PhantomData<T>);

        impl<'de, T: Deserialize<'de>> Visitor<'de> for GroupsVisitor<T> {
            type Value = NamedGroups<T>;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of group name to group")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut groups = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((name, group)) = map.next_entry::<String, T>()? {
                    groups.push((name, group));
                }
                Ok(NamedGroups(groups))
            }
        }

        deserializer.deserialize_map(GroupsVisitor(PhantomData))
    }
}

/// Wire shape of one `spatialStructures` entry.
#[derive(Debug, Clone, Deserialize)]
pub struct RawSpatialGroup {
    #[serde(default)]
    pub id: Option<GroupId>,
    #[serde(default)]
    pub map: FragmentMap,
}

/// Wire shape of one `entities` entry. Both historically observed shapes are
/// accepted.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawEntityGroup {
    /// `{ "map": { fragment: [ids] } }`
    Fragments { map: FragmentMap },
    /// `[{ "expressID": id, ... }]`
    Items(Vec<RawEntityItem>),
}

/// One item of the list-shaped entity group. Other fields are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct RawEntityItem {
    #[serde(rename = "expressID")]
    pub express_id: ElementId,
}

/// Convert the provider's spatial groups, dropping entries without a usable id.
pub fn spatial_groups_from_raw(raw: NamedGroups<RawSpatialGroup>) -> Vec<SpatialGroup> {
    raw.0
        .into_iter()
        .filter_map(|(name, group)| match group.id {
            Some(id) if id > 0 => Some(SpatialGroup {
                name,
                id,
                members: group.map,
            }),
            _ => {
                tracing::warn!(group = %name, id = ?group.id, "Skipping spatial group without a valid id");
                None
            }
        })
        .collect()
}

/// Convert the provider's entity groups into normalized member lists.
pub fn entity_groups_from_raw(raw: NamedGroups<RawEntityGroup>) -> Vec<EntityGroup> {
    raw.0
        .into_iter()
        .map(|(type_name, group)| match group {
            RawEntityGroup::Fragments { map } => {
                EntityGroup::new(type_name, map.into_values().flatten())
            }
            RawEntityGroup::Items(items) => {
                EntityGroup::new(type_name, items.into_iter().map(|item| item.express_id))
            }
        })
        .collect()
}
