// src/crypto/keys.rs
use std::fmt;

use ring::rand::SystemRandom;
use x25519_dalek::StaticSecret;
use zeroize::Zeroize;

use super::{decode, encode, random_bytes, CryptoError};

pub const KEY_LEN: usize = 32;

/// X25519 public point of a relay, published through the directory.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct PublicKey(x25519_dalek::PublicKey);

impl PublicKey {
    pub fn encode(&self) -> String {
        encode(self.0.as_bytes())
    }

    pub fn decode(text: &str) -> Result<Self, CryptoError> {
        let bytes: [u8; KEY_LEN] = decode(text)
            .and_then(|b| b.try_into().ok())
            .ok_or(CryptoError::InvalidKey)?;
        Ok(Self(x25519_dalek::PublicKey::from(bytes)))
    }

    pub(crate) fn as_dalek(&self) -> &x25519_dalek::PublicKey {
        &self.0
    }

    pub(crate) fn as_bytes(&self) -> &[u8; KEY_LEN] {
        self.0.as_bytes()
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", self.encode())
    }
}

impl From<&PrivateKey> for PublicKey {
    fn from(private: &PrivateKey) -> Self {
        Self(x25519_dalek::PublicKey::from(&private.0))
    }
}

/// Static X25519 secret. Zeroized on drop by x25519-dalek.
#[derive(Clone)]
pub struct PrivateKey(StaticSecret);

impl PrivateKey {
    pub fn encode(&self) -> String {
        encode(self.0.as_bytes())
    }

    pub fn decode(text: &str) -> Result<Self, CryptoError> {
        let mut raw = decode(text).ok_or(CryptoError::InvalidKey)?;
        let bytes: Result<[u8; KEY_LEN], _> = raw.as_slice().try_into();
        raw.zeroize();
        Ok(Self(StaticSecret::from(bytes.map_err(|_| CryptoError::InvalidKey)?)))
    }

    pub(crate) fn as_dalek(&self) -> &StaticSecret {
        &self.0
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PrivateKey(<redacted>)")
    }
}

#[derive(Debug, Clone)]
pub struct KeyPair {
    pub public_key: PublicKey,
    pub private_key: PrivateKey,
}

/// Generates a relay key pair from the OS generator.
pub fn generate_asymmetric_key_pair() -> Result<KeyPair, CryptoError> {
    let rng = SystemRandom::new();
    let secret = StaticSecret::from(random_bytes::<KEY_LEN>(&rng)?);
    let private_key = PrivateKey(secret);
    Ok(KeyPair {
        public_key: PublicKey::from(&private_key),
        private_key,
    })
}

/// One-shot AES-256 key for a single (message, hop) pair.
pub struct SymmetricKey([u8; KEY_LEN]);

impl SymmetricKey {
    pub fn encode(&self) -> String {
        encode(&self.0)
    }

    pub fn decode(text: &str) -> Result<Self, CryptoError> {
        let mut raw = decode(text).ok_or(CryptoError::InvalidKey)?;
        let bytes: Result<[u8; KEY_LEN], _> = raw.as_slice().try_into();
        raw.zeroize();
        bytes.map(Self).map_err(|_| CryptoError::InvalidKey)
    }

    pub(crate) fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }
}

impl Zeroize for SymmetricKey {
    fn zeroize(&mut self) {
        self.0.zeroize();
    }
}

impl Drop for SymmetricKey {
    fn drop(&mut self) {
        self.zeroize();
    }
}

impl fmt::Debug for SymmetricKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SymmetricKey(<redacted>)")
    }
}

pub fn generate_symmetric_key() -> Result<SymmetricKey, CryptoError> {
    let rng = SystemRandom::new();
    Ok(SymmetricKey(random_bytes(&rng)?))
}
