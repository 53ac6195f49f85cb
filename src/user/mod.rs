// src/user/mod.rs
use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::RwLock;

use crate::circuit::{select_circuit, CircuitError};
use crate::directory::{DirectoryError, DirectorySource};
use crate::onion::{build_onion, Address, AddressPlan, OnionError};
use crate::relay::RelayError;
use crate::transport::{Endpoint, Transport, TransportError};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SendError {
    #[error(transparent)]
    Directory(#[from] DirectoryError),
    #[error(transparent)]
    Circuit(#[from] CircuitError),
    #[error(transparent)]
    Onion(#[from] OnionError),
    #[error("delivery to entry relay failed: {0}")]
    ForwardFailed(#[from] TransportError),
}

/// An origin and recipient of onion-routed messages.
#[derive(Debug)]
pub struct User {
    user_id: u32,
    address: Address,
    plan: AddressPlan,
    circuit_length: usize,
    last_sent_message: RwLock<Option<String>>,
    last_received_message: RwLock<Option<String>>,
}

impl User {
    pub fn new(user_id: u32, plan: AddressPlan, circuit_length: usize) -> Result<Self, OnionError> {
        Ok(Self {
            user_id,
            address: plan.user(user_id)?,
            plan,
            circuit_length,
            last_sent_message: RwLock::new(None),
            last_received_message: RwLock::new(None),
        })
    }

    pub fn user_id(&self) -> u32 {
        self.user_id
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub async fn last_sent_message(&self) -> Option<String> {
        self.last_sent_message.read().await.clone()
    }

    pub async fn last_received_message(&self) -> Option<String> {
        self.last_received_message.read().await.clone()
    }

    /// Builds a fresh circuit from a new directory snapshot and sends `message`
    /// to `destination_user_id` through it. Circuit and onion failures happen
    /// before anything touches the network.
    pub async fn send_message(
        &self,
        message: &str,
        destination_user_id: u32,
        directory: &dyn DirectorySource,
        transport: &dyn Transport,
    ) -> Result<(), SendError> {
        *self.last_sent_message.write().await = Some(message.to_string());

        let snapshot = directory.list_entries().await?;
        let circuit = select_circuit(snapshot, self.circuit_length)?;
        let destination = self.plan.user(destination_user_id)?;
        let onion = build_onion(message, &circuit, destination, &self.plan)?;

        let entry = circuit.entry().ok_or(CircuitError::EmptyCircuit)?;
        let entry_address = self.plan.relay(entry.node_id)?;
        log::info!(
            "User {} sending through {} hops, entry node {}",
            self.user_id,
            circuit.len(),
            entry.node_id
        );
        transport.deliver(entry_address, onion).await?;
        Ok(())
    }

    pub async fn accept(&self, message: String) {
        log::info!("User {} received a message", self.user_id);
        *self.last_received_message.write().await = Some(message);
    }
}

#[async_trait]
impl Endpoint for User {
    async fn receive(&self, message: String, _transport: &dyn Transport) -> Result<(), RelayError> {
        self.accept(message).await;
        Ok(())
    }
}
