// src/transport/mod.rs
//! Point-to-point request/response delivery between addressable endpoints.
//!
//! A delivery only returns once the receiving endpoint has finished with the
//! message, so a circuit traversal is one synchronous chain of hops.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;

use crate::onion::Address;
use crate::relay::RelayError;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("no endpoint reachable at {0}")]
    Unreachable(Address),
    #[error("endpoint {to} rejected the message: {reason}")]
    Rejected { to: Address, reason: String },
    #[error("transport error: {0}")]
    Http(String),
}

/// JSON body of every `POST /message`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageRequest {
    pub message: String,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Transport: Send + Sync {
    async fn deliver(&self, to: Address, message: String) -> Result<(), TransportError>;
}

/// Something that accepts messages at an address.
#[async_trait]
pub trait Endpoint: Send + Sync {
    async fn receive(&self, message: String, transport: &dyn Transport) -> Result<(), RelayError>;
}

/// In-process transport: delivery is a direct call into the attached endpoint.
#[derive(Default)]
pub struct LocalNetwork {
    endpoints: RwLock<HashMap<Address, Arc<dyn Endpoint>>>,
}

impl LocalNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn attach(&self, address: Address, endpoint: Arc<dyn Endpoint>) {
        self.endpoints.write().await.insert(address, endpoint);
    }

    pub async fn detach(&self, address: Address) {
        self.endpoints.write().await.remove(&address);
    }
}

#[async_trait]
impl Transport for LocalNetwork {
    async fn deliver(&self, to: Address, message: String) -> Result<(), TransportError> {
        let endpoint = self
            .endpoints
            .read()
            .await
            .get(&to)
            .cloned()
            .ok_or(TransportError::Unreachable(to))?;

        endpoint
            .receive(message, self)
            .await
            .map_err(|e| TransportError::Rejected {
                to,
                reason: e.to_string(),
            })
    }
}

/// Delivers over HTTP to `http://{host}:{address}/message`.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    host: String,
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(host: impl Into<String>) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| TransportError::Http(e.to_string()))?;
        Ok(Self {
            host: host.into(),
            client,
        })
    }

    fn url_for(&self, to: Address) -> Result<String, TransportError> {
        let port = u16::try_from(to.0).map_err(|_| TransportError::Unreachable(to))?;
        Ok(format!("http://{}:{}/message", self.host, port))
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn deliver(&self, to: Address, message: String) -> Result<(), TransportError> {
        let url = self.url_for(to)?;
        let response = self
            .client
            .post(&url)
            .json(&MessageRequest { message })
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    TransportError::Unreachable(to)
                } else {
                    TransportError::Http(e.to_string())
                }
            })?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(TransportError::Rejected {
                to,
                reason: format!("HTTP {}", response.status()),
            })
        }
    }
}
