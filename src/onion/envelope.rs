// src/onion/envelope.rs
use crate::crypto::{decode, encode};

use super::OnionError;

pub const ENVELOPE_SEPARATOR: char = '.';

/// One onion layer as it travels: a sealed symmetric key plus the body it opens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    pub wrapped_key: Vec<u8>,
    /// `iv:ciphertext`, already text-encoded by the symmetric cipher.
    pub wrapped_body: String,
}

impl Envelope {
    pub fn new(wrapped_key: Vec<u8>, wrapped_body: String) -> Self {
        Self { wrapped_key, wrapped_body }
    }

    pub fn serialize(&self) -> String {
        let key = encode(&self.wrapped_key);
        let mut out = String::with_capacity(key.len() + 1 + self.wrapped_body.len());
        out.push_str(&key);
        out.push(ENVELOPE_SEPARATOR);
        out.push_str(&self.wrapped_body);
        out
    }

    /// Splits on the first separator. No cryptography happens here.
    pub fn parse(text: &str) -> Result<Self, OnionError> {
        let (key, body) = text
            .split_once(ENVELOPE_SEPARATOR)
            .ok_or(OnionError::MalformedEnvelope)?;
        let wrapped_key = decode(key).ok_or(OnionError::MalformedEnvelope)?;
        if wrapped_key.is_empty() || body.is_empty() {
            return Err(OnionError::MalformedEnvelope);
        }
        Ok(Self {
            wrapped_key,
            wrapped_body: body.to_string(),
        })
    }
}
