// src/directory/mod.rs
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;

use crate::crypto::PublicKey;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DirectoryError {
    #[error("node {0} is already registered")]
    DuplicateNodeId(u32),
    #[error("node {0} published an undecodable public key")]
    InvalidKey(u32),
    #[error("network error: {0}")]
    NetworkError(String),
}

/// A relay identity as published in the directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryEntry {
    #[serde(rename = "nodeId")]
    pub node_id: u32,
    /// Base64 text of the relay's X25519 public key.
    #[serde(rename = "pubKey")]
    pub public_key: String,
}

impl DirectoryEntry {
    pub fn new(node_id: u32, public_key: &PublicKey) -> Self {
        Self {
            node_id,
            public_key: public_key.encode(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeRegistry {
    pub nodes: Vec<DirectoryEntry>,
}

/// Anything the origin can pull a directory snapshot from.
#[async_trait]
pub trait DirectorySource: Send + Sync {
    /// Returns an owned copy; later registrations never alter it.
    async fn list_entries(&self) -> Result<Vec<DirectoryEntry>, DirectoryError>;
}

/// In-process flat registry. Entries are immutable once accepted.
#[derive(Debug, Default)]
pub struct Registry {
    entries: RwLock<Vec<DirectoryEntry>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn register(&self, entry: DirectoryEntry) -> Result<(), DirectoryError> {
        if PublicKey::decode(&entry.public_key).is_err() {
            return Err(DirectoryError::InvalidKey(entry.node_id));
        }

        let mut entries = self.entries.write().await;
        if entries.iter().any(|e| e.node_id == entry.node_id) {
            log::warn!("Rejected duplicate registration for node {}", entry.node_id);
            return Err(DirectoryError::DuplicateNodeId(entry.node_id));
        }
        log::info!("Registered node {}", entry.node_id);
        entries.push(entry);
        Ok(())
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl DirectorySource for Registry {
    async fn list_entries(&self) -> Result<Vec<DirectoryEntry>, DirectoryError> {
        Ok(self.entries.read().await.clone())
    }
}

/// HTTP client for a registry served by [`crate::server::registry_router`].
#[derive(Debug, Clone)]
pub struct RegistryClient {
    base_url: String,
    client: reqwest::Client,
}

impl RegistryClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, DirectoryError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| DirectoryError::NetworkError(e.to_string()))?;
        Ok(Self {
            base_url: base_url.into(),
            client,
        })
    }

    pub async fn register(&self, entry: &DirectoryEntry) -> Result<(), DirectoryError> {
        let url = format!("{}/registerNode", self.base_url);
        log::debug!("Registering node {} at {}", entry.node_id, url);

        let response = self
            .client
            .post(&url)
            .json(entry)
            .send()
            .await
            .map_err(|e| DirectoryError::NetworkError(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else if status == reqwest::StatusCode::BAD_REQUEST {
            Err(DirectoryError::DuplicateNodeId(entry.node_id))
        } else if status == reqwest::StatusCode::UNPROCESSABLE_ENTITY {
            Err(DirectoryError::InvalidKey(entry.node_id))
        } else {
            Err(DirectoryError::NetworkError(format!("HTTP error: {}", status)))
        }
    }
}

#[async_trait]
impl DirectorySource for RegistryClient {
    async fn list_entries(&self) -> Result<Vec<DirectoryEntry>, DirectoryError> {
        let url = format!("{}/getNodeRegistry", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| DirectoryError::NetworkError(e.to_string()))?;

        if !response.status().is_success() {
            return Err(DirectoryError::NetworkError(format!(
                "HTTP error: {}",
                response.status()
            )));
        }

        let registry: NodeRegistry = response
            .json()
            .await
            .map_err(|e| DirectoryError::NetworkError(e.to_string()))?;
        log::debug!("Fetched {} directory entries", registry.nodes.len());
        Ok(registry.nodes)
    }
}
