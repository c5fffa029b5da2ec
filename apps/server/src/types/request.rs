// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Request types for the API.

use ifc_lite_tree::{
    entity_groups_from_raw, spatial_groups_from_raw, Classification, Error, NamedGroups,
    PropertyTable, RawEntityGroup, RawSpatialGroup,
};
use serde::Deserialize;

/// Classifier output for one model, as posted by the viewer.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadModelRequest {
    /// Spatial-structure groups: name -> `{ id, map: { fragment: [ids] } }`.
    #[serde(default)]
    pub spatial_structures: Option<NamedGroups<RawSpatialGroup>>,

    /// Entity groups: IFC type -> fragment map or item list.
    #[serde(default)]
    pub entities: Option<NamedGroups<RawEntityGroup>>,

    /// Set when relation indexing failed before classification.
    #[serde(default)]
    pub indexing_error: Option<String>,

    /// Element properties keyed by express id.
    #[serde(default)]
    pub properties: PropertyTable,
}

impl LoadModelRequest {
    /// Split into the classification snapshot and the property table.
    pub fn into_parts(self) -> (Classification, PropertyTable) {
        let indexing = match self.indexing_error {
            Some(reason) => Err(Error::Indexing(reason)),
            None => Ok(()),
        };
        let spatial = self.spatial_structures.map(spatial_groups_from_raw).unwrap_or_default();
        let entities = self.entities.map(entity_groups_from_raw).unwrap_or_default();

        (
            Classification::from_provider(indexing, spatial, entities),
            self.properties,
        )
    }
}

/// Query string of `GET /api/v1/tree`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TreeQuery {
    #[serde(default)]
    pub q: Option<String>,
}
