// src/onion/mod.rs
//! Layered message construction at the origin and single-layer unwrap at a relay.

use thiserror::Error;

use crate::circuit::{Circuit, CircuitError};
use crate::crypto::{
    asymmetric_decrypt, asymmetric_encrypt, generate_symmetric_key, symmetric_decrypt,
    symmetric_encrypt, CryptoError, PrivateKey, PublicKey, SymmetricKey,
};

pub mod address;
pub mod envelope;

pub use address::{Address, AddressPlan, ADDRESS_WIDTH};
pub use envelope::{Envelope, ENVELOPE_SEPARATOR};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OnionError {
    #[error("envelope is missing its key/body separator")]
    MalformedEnvelope,
    #[error("address {0} does not fit the 10-digit field")]
    AddressOverflow(u64),
    #[error("address field is not a 10-digit number")]
    InvalidAddress,
    #[error(transparent)]
    Circuit(#[from] CircuitError),
    #[error(transparent)]
    Crypto(#[from] CryptoError),
}

/// Wraps `message` once per hop, exit hop first, and returns the blob for the entry relay.
pub fn build_onion(
    message: &str,
    circuit: &Circuit,
    destination: Address,
    plan: &AddressPlan,
) -> Result<String, OnionError> {
    if circuit.hops.is_empty() {
        return Err(CircuitError::EmptyCircuit.into());
    }

    let mut payload = message.to_string();
    let mut next_hop = destination;

    for hop in circuit.hops.iter().rev() {
        let public_key = PublicKey::decode(&hop.public_key)?;
        let key = generate_symmetric_key()?;

        let mut body = next_hop.to_field()?;
        body.push_str(&payload);

        let wrapped_body = symmetric_encrypt(&body, &key)?;
        let wrapped_key = asymmetric_encrypt(key.encode().as_bytes(), &public_key)?;
        payload = Envelope::new(wrapped_key, wrapped_body).serialize();

        log::debug!("Wrapped layer for node {} (next hop {})", hop.node_id, next_hop);
        next_hop = plan.relay(hop.node_id)?;
    }

    Ok(payload)
}

/// The result of removing exactly one layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeeledLayer {
    pub next_hop: Address,
    decrypted: String,
}

impl PeeledLayer {
    /// The full decrypted body, address field included.
    pub fn decrypted(&self) -> &str {
        &self.decrypted
    }

    /// What gets forwarded: an inner envelope, or plaintext at the exit.
    pub fn payload(&self) -> &str {
        &self.decrypted[ADDRESS_WIDTH..]
    }

    pub fn into_payload(mut self) -> String {
        self.decrypted.split_off(ADDRESS_WIDTH)
    }
}

/// Removes one layer with the relay's private key.
pub fn peel_layer(envelope: &str, private_key: &PrivateKey) -> Result<PeeledLayer, OnionError> {
    let envelope = Envelope::parse(envelope)?;

    let key_text = asymmetric_decrypt(&envelope.wrapped_key, private_key)?;
    let key_text = String::from_utf8(key_text).map_err(|_| CryptoError::DecryptionFailed)?;
    let key = SymmetricKey::decode(&key_text).map_err(|_| CryptoError::DecryptionFailed)?;

    let decrypted = symmetric_decrypt(&envelope.wrapped_body, &key)?;
    let field = decrypted.get(..ADDRESS_WIDTH).ok_or(OnionError::InvalidAddress)?;
    let next_hop = Address::parse_field(field)?;

    Ok(PeeledLayer { next_hop, decrypted })
}
