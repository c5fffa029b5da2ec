// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Health and API information endpoints.

use crate::AppState;
use axum::{extract::State, Json};
use ifc_lite_tree::Generation;
use serde::Serialize;

const SERVICE: &str = "ifc-lite-tree-server";

/// Method, path and summary of every route.
const ENDPOINTS: &[(&str, &str, &str)] = &[
    ("GET", "/api/v1/health", "Service and model status"),
    ("POST", "/api/v1/models", "Load a classified model and build its tree"),
    ("GET", "/api/v1/tree?q=", "Published tree, filtered by an optional search query"),
    ("POST", "/api/v1/selection/:id", "Highlight an element and load its properties"),
    ("DELETE", "/api/v1/selection", "Clear the selection"),
    ("GET", "/api/v1/selection", "Highlighted element and its properties"),
];

/// Health check response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    /// Generation of the published tree, if a model is loaded.
    pub published: Option<Generation>,
    /// Most recently started load; ahead of `published` while a load runs.
    pub latest: Generation,
    pub highlighted: Option<u32>,
}

/// API information response.
#[derive(Debug, Serialize)]
pub struct ApiInfoResponse {
    pub service: &'static str,
    pub version: &'static str,
    pub endpoints: Vec<EndpointInfo>,
}

#[derive(Debug, Serialize)]
pub struct EndpointInfo {
    pub method: &'static str,
    pub path: &'static str,
    pub description: &'static str,
}

/// GET /api/v1/health - Service and model status.
pub async fn check(State(state): State<AppState>) -> Json<HealthResponse> {
    let published = state.session.current().await.map(|p| p.generation);
    let highlighted = state.selection.borrow().highlighted;

    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        published,
        latest: state.session.latest(),
        highlighted,
    })
}

/// GET / - API information.
pub async fn info() -> Json<ApiInfoResponse> {
    let endpoints = ENDPOINTS
        .iter()
        .map(|&(method, path, description)| EndpointInfo {
            method,
            path,
            description,
        })
        .collect();

    Json(ApiInfoResponse {
        service: SERVICE,
        version: env!("CARGO_PKG_VERSION"),
        endpoints,
    })
}
