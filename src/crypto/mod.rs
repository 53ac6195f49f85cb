// src/crypto/mod.rs
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use ring::rand::{SecureRandom, SystemRandom};
use thiserror::Error;

pub mod asymmetric;
pub mod keys;
pub mod symmetric;

pub use asymmetric::{asymmetric_decrypt, asymmetric_encrypt, MAX_SEALED_PLAINTEXT};
pub use keys::{
    generate_asymmetric_key_pair, generate_symmetric_key, KeyPair, PrivateKey, PublicKey,
    SymmetricKey,
};
pub use symmetric::{symmetric_decrypt, symmetric_encrypt, IV_SEPARATOR};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CryptoError {
    #[error("secure random source unavailable")]
    EntropyUnavailable,
    #[error("payload of {len} bytes exceeds sealing capacity of {max} bytes")]
    PayloadTooLarge { len: usize, max: usize },
    #[error("decryption failed")]
    DecryptionFailed,
    #[error("malformed ciphertext: {0}")]
    MalformedCiphertext(&'static str),
    #[error("invalid key encoding")]
    InvalidKey,
}

/// Fills `N` bytes from the OS generator. There is no fallback source.
pub(crate) fn random_bytes<const N: usize>(rng: &SystemRandom) -> Result<[u8; N], CryptoError> {
    let mut bytes = [0u8; N];
    rng.fill(&mut bytes)
        .map_err(|_| CryptoError::EntropyUnavailable)?;
    Ok(bytes)
}

pub(crate) fn encode(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

pub(crate) fn decode(text: &str) -> Option<Vec<u8>> {
    STANDARD.decode(text).ok()
}
