// src/relay/mod.rs
//! Relay unwrap-and-forward.
//!
//! Each message moves `Idle -> Processing -> Forwarded | Failed` and the relay
//! returns to `Idle` once no message is in flight. Nothing but diagnostics is
//! shared between messages, so handlers run concurrently without ordering.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::RwLock;

use crate::crypto::{generate_asymmetric_key_pair, CryptoError, KeyPair, PublicKey};
use crate::directory::DirectoryEntry;
use crate::metrics::Metrics;
use crate::onion::{peel_layer, Address};
use crate::transport::{Endpoint, Transport, TransportError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayState {
    Idle,
    Processing,
    Forwarded,
    Failed,
}

/// What a relay reports upstream. Parse and crypto failures are deliberately
/// indistinguishable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RelayError {
    #[error("error processing message")]
    ProcessingFailed,
    #[error("forwarding failed")]
    ForwardFailed(#[source] TransportError),
}

/// Last-seen fields, kept for debugging only.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelayDiagnostics {
    pub last_received_encrypted: Option<String>,
    pub last_received_decrypted: Option<String>,
    pub last_destination: Option<Address>,
    pub last_outcome: Option<RelayState>,
}

struct InFlight<'a>(&'a AtomicUsize);

impl<'a> InFlight<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[derive(Debug)]
pub struct Relay {
    node_id: u32,
    address: Address,
    key_pair: KeyPair,
    diagnostics: RwLock<RelayDiagnostics>,
    in_flight: AtomicUsize,
    metrics: Metrics,
}

impl Relay {
    /// Creates a relay with a freshly generated key pair.
    pub fn new(node_id: u32, address: Address) -> Result<Self, CryptoError> {
        Ok(Self::with_key_pair(node_id, address, generate_asymmetric_key_pair()?))
    }

    pub fn with_key_pair(node_id: u32, address: Address, key_pair: KeyPair) -> Self {
        Self {
            node_id,
            address,
            key_pair,
            diagnostics: RwLock::new(RelayDiagnostics::default()),
            in_flight: AtomicUsize::new(0),
            metrics: Metrics::new(),
        }
    }

    pub fn node_id(&self) -> u32 {
        self.node_id
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.key_pair.public_key
    }

    pub fn directory_entry(&self) -> DirectoryEntry {
        DirectoryEntry::new(self.node_id, &self.key_pair.public_key)
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    pub fn state(&self) -> RelayState {
        if self.in_flight.load(Ordering::SeqCst) > 0 {
            RelayState::Processing
        } else {
            RelayState::Idle
        }
    }

    pub async fn diagnostics(&self) -> RelayDiagnostics {
        self.diagnostics.read().await.clone()
    }

    pub async fn last_received_encrypted(&self) -> Option<String> {
        self.diagnostics.read().await.last_received_encrypted.clone()
    }

    pub async fn last_received_decrypted(&self) -> Option<String> {
        self.diagnostics.read().await.last_received_decrypted.clone()
    }

    pub async fn last_destination(&self) -> Option<Address> {
        self.diagnostics.read().await.last_destination
    }

    /// Peels one layer and forwards the remainder, returning the next hop once
    /// it has acknowledged. Nothing is retried.
    pub async fn handle(
        &self,
        envelope: String,
        transport: &dyn Transport,
    ) -> Result<Address, RelayError> {
        let _guard = InFlight::enter(&self.in_flight);
        let result = self.process(envelope, transport).await;

        let outcome = match result {
            Ok(_) => {
                self.metrics.record_forwarded();
                RelayState::Forwarded
            }
            Err(_) => {
                self.metrics.record_failed();
                RelayState::Failed
            }
        };
        self.diagnostics.write().await.last_outcome = Some(outcome);
        result
    }

    async fn process(
        &self,
        envelope: String,
        transport: &dyn Transport,
    ) -> Result<Address, RelayError> {
        self.metrics.record_received(envelope.len());

        let layer = {
            let peeled = peel_layer(&envelope, &self.key_pair.private_key);
            self.diagnostics.write().await.last_received_encrypted = Some(envelope);
            match peeled {
                Ok(layer) => layer,
                Err(e) => {
                    log::warn!("Relay {} dropped a message it could not unwrap", self.node_id);
                    log::debug!("Relay {} unwrap failure: {}", self.node_id, e);
                    return Err(RelayError::ProcessingFailed);
                }
            }
        };

        let next_hop = layer.next_hop;
        {
            let mut diagnostics = self.diagnostics.write().await;
            diagnostics.last_received_decrypted = Some(layer.decrypted().to_string());
            diagnostics.last_destination = Some(next_hop);
        }

        log::debug!("Relay {} forwarding to {}", self.node_id, next_hop);
        transport
            .deliver(next_hop, layer.into_payload())
            .await
            .map_err(|e| {
                log::warn!("Relay {} could not forward to {}: {}", self.node_id, next_hop, e);
                RelayError::ForwardFailed(e)
            })?;

        Ok(next_hop)
    }
}

#[async_trait]
impl Endpoint for Relay {
    async fn receive(&self, message: String, transport: &dyn Transport) -> Result<(), RelayError> {
        self.handle(message, transport).await.map(|_| ())
    }
}
