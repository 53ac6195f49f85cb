// src/crypto/asymmetric.rs
//! Sealed boxes for wrapping per-hop symmetric keys.
//!
//! Layout: `ephemeral_public(32) || aes-256-gcm(ciphertext || tag)`. The GCM
//! key and nonce come from HKDF-SHA256 over the X25519 shared secret, salted
//! with both public points, so every box has its own key and the fixed nonce
//! is never reused under it.

use hkdf::Hkdf;
use ring::aead::{self, Aad, LessSafeKey, Nonce, UnboundKey, NONCE_LEN};
use ring::rand::SystemRandom;
use sha2::Sha256;
use x25519_dalek::StaticSecret;
use zeroize::Zeroize;

use super::keys::{PrivateKey, PublicKey, KEY_LEN};
use super::{random_bytes, CryptoError};

/// Sealed boxes carry key material, never message bodies.
pub const MAX_SEALED_PLAINTEXT: usize = 190;

const HKDF_INFO: &[u8] = b"onion-relay sealed box v1";
const TAG_LEN: usize = 16;

fn derive_sealing_key(
    shared: &[u8; 32],
    ephemeral_public: &[u8; KEY_LEN],
    recipient_public: &[u8; KEY_LEN],
) -> Result<(LessSafeKey, [u8; NONCE_LEN]), CryptoError> {
    let mut salt = [0u8; 2 * KEY_LEN];
    salt[..KEY_LEN].copy_from_slice(ephemeral_public);
    salt[KEY_LEN..].copy_from_slice(recipient_public);

    let hk = Hkdf::<Sha256>::new(Some(&salt[..]), shared);
    let mut okm = [0u8; KEY_LEN + NONCE_LEN];
    hk.expand(HKDF_INFO, &mut okm)
        .map_err(|_| CryptoError::DecryptionFailed)?;

    let mut nonce = [0u8; NONCE_LEN];
    nonce.copy_from_slice(&okm[KEY_LEN..]);
    let unbound = UnboundKey::new(&aead::AES_256_GCM, &okm[..KEY_LEN])
        .map_err(|_| CryptoError::DecryptionFailed);
    okm.zeroize();

    Ok((LessSafeKey::new(unbound?), nonce))
}

/// Seals a short payload to `public_key`.
pub fn asymmetric_encrypt(
    plaintext: &[u8],
    public_key: &PublicKey,
) -> Result<Vec<u8>, CryptoError> {
    if plaintext.len() > MAX_SEALED_PLAINTEXT {
        return Err(CryptoError::PayloadTooLarge {
            len: plaintext.len(),
            max: MAX_SEALED_PLAINTEXT,
        });
    }

    let rng = SystemRandom::new();
    let ephemeral = StaticSecret::from(random_bytes::<KEY_LEN>(&rng)?);
    let ephemeral_public = x25519_dalek::PublicKey::from(&ephemeral);
    let shared = ephemeral.diffie_hellman(public_key.as_dalek());
    // A low-order recipient point yields an all-zero secret.
    if !shared.was_contributory() {
        return Err(CryptoError::InvalidKey);
    }

    let (key, nonce) = derive_sealing_key(
        shared.as_bytes(),
        ephemeral_public.as_bytes(),
        public_key.as_bytes(),
    )?;

    let mut in_out = plaintext.to_vec();
    key.seal_in_place_append_tag(Nonce::assume_unique_for_key(nonce), Aad::empty(), &mut in_out)
        .map_err(|_| CryptoError::DecryptionFailed)?;

    let mut sealed = Vec::with_capacity(KEY_LEN + in_out.len());
    sealed.extend_from_slice(ephemeral_public.as_bytes());
    sealed.extend_from_slice(&in_out);
    Ok(sealed)
}

/// Opens a sealed box. Every failure collapses into `DecryptionFailed`.
pub fn asymmetric_decrypt(sealed: &[u8], private_key: &PrivateKey) -> Result<Vec<u8>, CryptoError> {
    if sealed.len() < KEY_LEN + TAG_LEN {
        return Err(CryptoError::DecryptionFailed);
    }
    let (ephemeral_bytes, ciphertext) = sealed.split_at(KEY_LEN);
    let ephemeral_bytes: [u8; KEY_LEN] = ephemeral_bytes
        .try_into()
        .map_err(|_| CryptoError::DecryptionFailed)?;
    let ephemeral_public = x25519_dalek::PublicKey::from(ephemeral_bytes);

    let shared = private_key.as_dalek().diffie_hellman(&ephemeral_public);
    if !shared.was_contributory() {
        return Err(CryptoError::DecryptionFailed);
    }
    let own_public = PublicKey::from(private_key);
    let (key, nonce) =
        derive_sealing_key(shared.as_bytes(), &ephemeral_bytes, own_public.as_bytes())?;

    let mut in_out = ciphertext.to_vec();
    let plaintext = key
        .open_in_place(Nonce::assume_unique_for_key(nonce), Aad::empty(), &mut in_out)
        .map_err(|_| CryptoError::DecryptionFailed)?;
    Ok(plaintext.to_vec())
}
