// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Response types for the API.

use ifc_lite_tree::{Generation, TreeNode};
use serde::Serialize;
use std::sync::Arc;

/// Result of a model upload.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadModelResponse {
    pub generation: Generation,
    /// `spatial`, `entity-only` or `failed`.
    pub kind: &'static str,
    /// Total node count, synthetic headers included.
    pub node_count: usize,
    pub tree: Arc<TreeNode>,
}

/// Published tree, optionally filtered. `tree` is null when nothing matched.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeResponse {
    pub generation: Generation,
    pub query: Option<String>,
    pub tree: Option<Arc<TreeNode>>,
}

/// Whether a selection request was forwarded to the property panel.
#[derive(Debug, Clone, Serialize)]
pub struct SelectResponse {
    pub selected: bool,
}
