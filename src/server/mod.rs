// src/server/mod.rs
//! HTTP surface for the registry, relays and users.

use axum::Router;
use serde::Serialize;
use tokio::net::TcpListener;

mod registry;
mod relay;
mod user;

pub use registry::registry_router;
pub use relay::{relay_router, RelayApp};
pub use user::{user_router, SendMessageRequest, UserApp};

#[derive(Debug, Serialize)]
pub(crate) struct Success {
    pub success: bool,
}

impl Success {
    pub(crate) fn ok() -> Self {
        Self { success: true }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    pub(crate) fn new(error: impl Into<String>) -> Self {
        Self { error: error.into() }
    }
}

/// `{"result": ...}` wrapper used by every diagnostic getter.
#[derive(Debug, Serialize)]
pub(crate) struct ResultBody<T> {
    pub result: Option<T>,
}

pub(crate) async fn status() -> &'static str {
    "live"
}

/// Serves `router` on an already bound listener until the task is dropped.
pub async fn serve(listener: TcpListener, router: Router) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        log::info!("HTTP server listening on {}", addr);
    }
    axum::serve(listener, router).await
}
