// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Model upload endpoint.

use crate::error::ApiError;
use crate::types::{LoadModelRequest, LoadModelResponse};
use crate::AppState;
use axum::{extract::rejection::JsonRejection, extract::State, Json};
use std::sync::Arc;

/// POST /api/v1/models - Build and publish the tree for a new model.
///
/// Starts a new load generation. If another upload starts before this one
/// has resolved its names, this one is dropped and answers 409.
pub async fn load_model(
    State(state): State<AppState>,
    body: Result<Json<LoadModelRequest>, JsonRejection>,
) -> Result<Json<LoadModelResponse>, ApiError> {
    let Json(request) = body?;
    let generation = state.session.begin_load();
    let (classification, properties) = request.into_parts();
    let properties = Arc::new(properties);

    tracing::info!(
        generation = generation.0,
        kind = classification.kind(),
        properties = properties.len(),
        "Model upload"
    );

    let published = state
        .session
        .load_as(generation, &classification, &*properties)
        .await
        .ok_or(ApiError::Superseded {
            generation: generation.0,
        })?;

    if state.properties.replace(generation, properties).await {
        // Highlight ids of the previous model mean nothing now.
        state.selector.clear()?;
    }

    Ok(Json(LoadModelResponse {
        generation: published.generation,
        kind: classification.kind(),
        node_count: published.tree.len(),
        tree: published.tree,
    }))
}
