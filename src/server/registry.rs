// src/server/registry.rs
use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};

use super::{status, ErrorBody, Success};
use crate::directory::{DirectoryEntry, DirectoryError, DirectorySource, NodeRegistry, Registry};

pub fn registry_router(registry: Arc<Registry>) -> Router {
    Router::new()
        .route("/status", get(status))
        .route("/registerNode", post(register_node))
        .route("/getNodeRegistry", get(get_node_registry))
        .with_state(registry)
}

/// POST /registerNode
async fn register_node(
    State(registry): State<Arc<Registry>>,
    Json(entry): Json<DirectoryEntry>,
) -> Response {
    match registry.register(entry).await {
        Ok(()) => (StatusCode::OK, Json(Success::ok())).into_response(),
        Err(DirectoryError::DuplicateNodeId(_)) => (
            StatusCode::BAD_REQUEST,
            Json(ErrorBody::new("Node with this ID already registered")),
        )
            .into_response(),
        Err(e) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(ErrorBody::new(e.to_string())),
        )
            .into_response(),
    }
}

/// GET /getNodeRegistry
async fn get_node_registry(State(registry): State<Arc<Registry>>) -> Response {
    match registry.list_entries().await {
        Ok(nodes) => Json(NodeRegistry { nodes }).into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorBody::new(e.to_string())),
        )
            .into_response(),
    }
}
