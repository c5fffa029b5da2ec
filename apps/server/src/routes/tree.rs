// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Tree retrieval and search endpoint.

use crate::error::ApiError;
use crate::types::{TreeQuery, TreeResponse};
use crate::AppState;
use axum::{
    extract::{Query, State},
    Json,
};

/// GET /api/v1/tree?q= - Published tree, filtered when `q` is non-blank.
pub async fn get_tree(
    State(state): State<AppState>,
    Query(query): Query<TreeQuery>,
) -> Result<Json<TreeResponse>, ApiError> {
    let q = query.q.unwrap_or_default();
    let result = state
        .session
        .search(&q)
        .await
        .ok_or_else(|| ApiError::NotFound("No model loaded".into()))?;

    tracing::debug!(
        generation = result.generation.0,
        query = %q,
        matched = result.tree.is_some(),
        "Tree search"
    );

    Ok(Json(TreeResponse {
        generation: result.generation,
        query: (!q.trim().is_empty()).then_some(q),
        tree: result.tree,
    }))
}
