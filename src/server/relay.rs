// src/server/relay.rs
use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};

use super::{status, ErrorBody, ResultBody, Success};
use crate::onion::Address;
use crate::relay::Relay;
use crate::transport::{MessageRequest, Transport};

#[derive(Clone)]
pub struct RelayApp {
    pub relay: Arc<Relay>,
    pub transport: Arc<dyn Transport>,
}

pub fn relay_router(app: RelayApp) -> Router {
    Router::new()
        .route("/status", get(status))
        .route("/getLastReceivedEncryptedMessage", get(last_encrypted))
        .route("/getLastReceivedDecryptedMessage", get(last_decrypted))
        .route("/getLastMessageDestination", get(last_destination))
        .route("/getMetrics", get(metrics))
        .route("/message", post(message))
        .with_state(app)
}

async fn last_encrypted(State(app): State<RelayApp>) -> Json<ResultBody<String>> {
    Json(ResultBody {
        result: app.relay.last_received_encrypted().await,
    })
}

async fn last_decrypted(State(app): State<RelayApp>) -> Json<ResultBody<String>> {
    Json(ResultBody {
        result: app.relay.last_received_decrypted().await,
    })
}

async fn last_destination(State(app): State<RelayApp>) -> Json<ResultBody<Address>> {
    Json(ResultBody {
        result: app.relay.last_destination().await,
    })
}

async fn metrics(State(app): State<RelayApp>) -> String {
    app.relay.metrics().report()
}

/// POST /message. Answers only after the next hop has answered.
async fn message(State(app): State<RelayApp>, Json(body): Json<MessageRequest>) -> Response {
    match app.relay.handle(body.message, app.transport.as_ref()).await {
        Ok(_) => (StatusCode::OK, Json(Success::ok())).into_response(),
        Err(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorBody::new("Error processing message")),
        )
            .into_response(),
    }
}
