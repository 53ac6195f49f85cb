// src/server/user.rs
use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use super::{status, ErrorBody, ResultBody, Success};
use crate::directory::DirectorySource;
use crate::transport::{MessageRequest, Transport};
use crate::user::{SendError, User};

#[derive(Clone)]
pub struct UserApp {
    pub user: Arc<User>,
    pub directory: Arc<dyn DirectorySource>,
    pub transport: Arc<dyn Transport>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest {
    pub message: String,
    pub destination_user_id: u32,
}

pub fn user_router(app: UserApp) -> Router {
    Router::new()
        .route("/status", get(status))
        .route("/getLastReceivedMessage", get(last_received))
        .route("/getLastSentMessage", get(last_sent))
        .route("/message", post(message))
        .route("/sendMessage", post(send_message))
        .with_state(app)
}

async fn last_received(State(app): State<UserApp>) -> Json<ResultBody<String>> {
    Json(ResultBody {
        result: app.user.last_received_message().await,
    })
}

async fn last_sent(State(app): State<UserApp>) -> Json<ResultBody<String>> {
    Json(ResultBody {
        result: app.user.last_sent_message().await,
    })
}

/// POST /message, the exit relay's final delivery.
async fn message(State(app): State<UserApp>, Json(body): Json<MessageRequest>) -> Json<Success> {
    app.user.accept(body.message).await;
    Json(Success::ok())
}

/// POST /sendMessage
async fn send_message(
    State(app): State<UserApp>,
    Json(body): Json<SendMessageRequest>,
) -> Response {
    let result = app
        .user
        .send_message(
            &body.message,
            body.destination_user_id,
            app.directory.as_ref(),
            app.transport.as_ref(),
        )
        .await;

    match result {
        Ok(()) => (StatusCode::OK, Json(Success::ok())).into_response(),
        Err(e @ (SendError::Circuit(_) | SendError::Onion(_))) => {
            log::warn!("User {} could not build a circuit: {}", app.user.user_id(), e);
            (StatusCode::BAD_REQUEST, Json(ErrorBody::new(e.to_string()))).into_response()
        }
        Err(e) => {
            log::error!("Error sending message: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorBody::new("Error sending message")),
            )
                .into_response()
        }
    }
}
