// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! IFC-Lite Tree Server - model structure tree over HTTP.
//!
//! The viewer posts a model's classifier output and properties; the server
//! builds the Project-rooted structure tree, serves filtered views of it and
//! owns the current selection.
//!
//! # Endpoints
//!
//! - `GET /api/v1/health` - Health check
//! - `POST /api/v1/models` - Load a model and build its tree
//! - `GET /api/v1/tree?q=` - Published tree, optionally filtered
//! - `POST /api/v1/selection/:id` - Select an element
//! - `DELETE /api/v1/selection` - Clear the selection
//! - `GET /api/v1/selection` - Highlighted element and its properties

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use ifc_lite_tree::{selection_channel, SelectionState, Selector, TreeSession};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer,
};

mod config;
mod error;
mod routes;
mod services;
mod types;

use config::Config;
use services::ModelProperties;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub session: Arc<TreeSession>,
    pub properties: Arc<ModelProperties>,
    pub selector: Selector,
    pub selection: watch::Receiver<SelectionState>,
}

impl AppState {
    /// Create the state and spawn the selection consumer.
    ///
    /// Must be called inside a Tokio runtime.
    pub fn new(config: Config) -> Self {
        let properties = Arc::new(ModelProperties::new());
        let (selector, consumer, selection) = selection_channel();
        tokio::spawn(consumer.run(Arc::clone(&properties)));

        Self {
            session: Arc::new(TreeSession::new(config.tree.clone())),
            config: Arc::new(config),
            properties,
            selector,
            selection,
        }
    }
}

/// Build the router with all routes and middleware.
pub fn app(state: AppState) -> Router {
    let config = Arc::clone(&state.config);

    Router::new()
        // Root endpoint - API information
        .route("/", get(routes::health::info))
        // Health check
        .route("/api/v1/health", get(routes::health::check))
        // Model tree
        .route("/api/v1/models", post(routes::models::load_model))
        .route("/api/v1/tree", get(routes::tree::get_tree))
        // Selection
        .route(
            "/api/v1/selection",
            get(routes::selection::current).delete(routes::selection::clear),
        )
        .route("/api/v1/selection/:id", post(routes::selection::select))
        // Middleware
        .layer(DefaultBodyLimit::max(config.max_body_size_mb * 1024 * 1024))
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(Duration::from_secs(config.request_timeout_secs)))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "info,tower_http=debug,ifc_lite_tree_server=debug,ifc_lite_tree=debug".into()),
        )
        .pretty()
        .init();

    let config = Config::from_env();

    tracing::info!(
        port = config.port,
        max_body_size_mb = config.max_body_size_mb,
        request_timeout_secs = config.request_timeout_secs,
        name_batch_size = config.tree.name_batch_size,
        nesting_policy = ?config.tree.nesting_policy,
        "Starting IFC-Lite Tree Server"
    );

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let app = app(AppState::new(config));

    tracing::info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                request = request.header("content-type", "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };
        let response = app
            .clone()
            .oneshot(request.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    fn office_model() -> Value {
        json!({
            "spatialStructures": {
                "Building": { "id": 1, "map": { "0": [2, 3, 10] } },
                "Level 1": { "id": 10, "map": { "0": [2, 3] } }
            },
            "entities": {
                "IFCBUILDING": [{ "expressID": 1 }],
                "IFCBUILDINGSTOREY": [{ "expressID": 10 }],
                "IFCWALL": { "map": { "0": [2] } },
                "IFCDOOR": [{ "expressID": 3 }]
            },
            "properties": {
                "2": { "Name": { "value": "Basic Wall" } },
                "3": { "Name": { "value": "Entrance" } }
            }
        })
    }

    #[tokio::test]
    async fn tree_is_missing_before_first_upload() {
        let app = app(AppState::new(Config::default()));
        let (status, body) = send(&app, "GET", "/api/v1/tree", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn health_reports_published_generation() {
        let app = app(AppState::new(Config::default()));

        let (status, body) = send(&app, "GET", "/api/v1/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["published"].is_null());
        assert_eq!(body["latest"], 0);

        send(&app, "POST", "/api/v1/models", Some(office_model())).await;
        let (_, body) = send(&app, "GET", "/api/v1/health", None).await;
        assert_eq!(body["published"], 1);
        assert_eq!(body["latest"], 1);

        let (_, body) = send(&app, "GET", "/", None).await;
        assert_eq!(body["endpoints"].as_array().unwrap().len(), 6);
    }

    #[tokio::test]
    async fn upload_then_search() {
        let app = app(AppState::new(Config::default()));

        let (status, body) = send(&app, "POST", "/api/v1/models", Some(office_model())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["generation"], 1);
        assert_eq!(body["kind"], "spatial");
        let storey = &body["tree"]["children"][0]["children"][0];
        assert_eq!(storey["name"], "Level 1");
        assert_eq!(storey["typeLabel"], "Storey");
        assert_eq!(storey["children"][0]["name"], "Doors (1)");
        assert_eq!(storey["children"][0]["children"][0]["name"], "Entrance");

        let (status, body) = send(&app, "GET", "/api/v1/tree?q=entr", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["query"], "entr");
        let storey = &body["tree"]["children"][0]["children"][0];
        assert_eq!(storey["children"].as_array().unwrap().len(), 1);

        let (_, body) = send(&app, "GET", "/api/v1/tree?q=window", None).await;
        assert!(body["tree"].is_null());
    }

    #[tokio::test]
    async fn selecting_an_element_loads_its_properties() {
        let state = AppState::new(Config::default());
        let mut observer = state.selection.clone();
        let app = app(state);
        send(&app, "POST", "/api/v1/models", Some(office_model())).await;

        let (status, body) = send(&app, "POST", "/api/v1/selection/3", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["selected"], true);

        observer
            .wait_for(|s| s.properties.is_some())
            .await
            .unwrap();
        let (_, body) = send(&app, "GET", "/api/v1/selection", None).await;
        assert_eq!(body["highlighted"], 3);
        assert_eq!(body["properties"]["Name"]["value"], "Entrance");

        let (_, body) = send(&app, "POST", "/api/v1/selection/-41", None).await;
        assert_eq!(body["selected"], false);

        send(&app, "DELETE", "/api/v1/selection", None).await;
        observer.wait_for(|s| s.highlighted.is_none()).await.unwrap();
    }

    #[tokio::test]
    async fn malformed_upload_is_rejected() {
        let app = app(AppState::new(Config::default()));
        let (status, body) = send(
            &app,
            "POST",
            "/api/v1/models",
            Some(json!({ "entities": 42 })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "INVALID_BODY");
    }

    #[tokio::test]
    async fn indexing_failure_falls_back_to_categories() {
        let app = app(AppState::new(Config::default()));
        let mut model = office_model();
        model["indexingError"] = json!("relations not indexed");

        let (status, body) = send(&app, "POST", "/api/v1/models", Some(model)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["kind"], "entity-only");
        let categories: Vec<&str> = body["tree"]["children"]
            .as_array()
            .unwrap()
            .iter()
            .map(|c| c["name"].as_str().unwrap())
            .collect();
        assert_eq!(categories, vec!["Buildings", "Doors", "Storeys", "Walls"]);
    }
}
