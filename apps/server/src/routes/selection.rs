// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Selection endpoints: tree clicks in, highlight and property panel out.

use crate::error::ApiError;
use crate::types::SelectResponse;
use crate::AppState;
use axum::{
    extract::{Path, State},
    Json,
};
use ifc_lite_tree::{ElementId, SelectionState};

/// POST /api/v1/selection/:id - Select the element behind a clicked node.
///
/// Synthetic node ids (zero or negative) are accepted and ignored.
pub async fn select(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<SelectResponse>, ApiError> {
    let selected = match ElementId::try_from(id) {
        Ok(element_id) => state.selector.select(element_id)?,
        Err(_) => false,
    };
    tracing::debug!(node_id = id, selected, "Selection request");
    Ok(Json(SelectResponse { selected }))
}

/// DELETE /api/v1/selection - Clear highlight and property panel.
pub async fn clear(State(state): State<AppState>) -> Result<Json<SelectResponse>, ApiError> {
    state.selector.clear()?;
    Ok(Json(SelectResponse { selected: false }))
}

/// GET /api/v1/selection - Current highlight and properties.
pub async fn current(State(state): State<AppState>) -> Json<SelectionState> {
    Json(state.selection.borrow().clone())
}
