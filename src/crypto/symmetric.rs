// src/crypto/symmetric.rs
use aes::cipher::block_padding::Pkcs7;
use aes::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use ring::rand::SystemRandom;

use super::keys::SymmetricKey;
use super::{decode, encode, random_bytes, CryptoError};

type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;

pub const IV_SEPARATOR: char = ':';
const BLOCK_LEN: usize = 16;

/// AES-256-CBC under a fresh random IV. Output is `base64(iv):base64(ciphertext)`.
pub fn symmetric_encrypt(plaintext: &str, key: &SymmetricKey) -> Result<String, CryptoError> {
    let rng = SystemRandom::new();
    let iv: [u8; BLOCK_LEN] = random_bytes(&rng)?;

    let ciphertext = Aes256CbcEnc::new(key.as_bytes().into(), (&iv).into())
        .encrypt_padded_vec_mut::<Pkcs7>(plaintext.as_bytes());

    Ok(format!("{}{}{}", encode(&iv), IV_SEPARATOR, encode(&ciphertext)))
}

pub fn symmetric_decrypt(
    ciphertext_with_iv: &str,
    key: &SymmetricKey,
) -> Result<String, CryptoError> {
    let (iv_text, body_text) = ciphertext_with_iv
        .split_once(IV_SEPARATOR)
        .ok_or(CryptoError::MalformedCiphertext("missing iv separator"))?;

    let iv = decode(iv_text).ok_or(CryptoError::MalformedCiphertext("iv is not base64"))?;
    let body = decode(body_text).ok_or(CryptoError::MalformedCiphertext("body is not base64"))?;
    if iv.len() != BLOCK_LEN {
        return Err(CryptoError::MalformedCiphertext("iv is not one block"));
    }
    if body.is_empty() || body.len() % BLOCK_LEN != 0 {
        return Err(CryptoError::MalformedCiphertext("body is not whole blocks"));
    }

    let decryptor = Aes256CbcDec::new_from_slices(key.as_bytes(), &iv)
        .map_err(|_| CryptoError::MalformedCiphertext("iv is not one block"))?;
    let plaintext = decryptor
        .decrypt_padded_vec_mut::<Pkcs7>(&body)
        .map_err(|_| CryptoError::DecryptionFailed)?;

    String::from_utf8(plaintext).map_err(|_| CryptoError::DecryptionFailed)
}
