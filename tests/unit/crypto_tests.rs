// tests/unit/crypto_tests.rs
use onion_relay::crypto::{
    asymmetric_decrypt, asymmetric_encrypt, generate_asymmetric_key_pair, generate_symmetric_key,
    symmetric_decrypt, symmetric_encrypt, CryptoError, PrivateKey, PublicKey, SymmetricKey,
    IV_SEPARATOR, MAX_SEALED_PLAINTEXT,
};
use onion_relay::onion::{Envelope, ENVELOPE_SEPARATOR};

#[test]
fn test_wrapped_symmetric_key_roundtrip() {
    let relay = generate_asymmetric_key_pair().unwrap();
    let key = generate_symmetric_key().unwrap();

    let wrapped = asymmetric_encrypt(key.encode().as_bytes(), &relay.public_key).unwrap();
    let unwrapped = asymmetric_decrypt(&wrapped, &relay.private_key).unwrap();
    let recovered = SymmetricKey::decode(std::str::from_utf8(&unwrapped).unwrap()).unwrap();

    let body = symmetric_encrypt("0000003000hello", &key).unwrap();
    assert_eq!(symmetric_decrypt(&body, &recovered).unwrap(), "0000003000hello");
}

#[test]
fn test_key_isolation() {
    let a = generate_asymmetric_key_pair().unwrap();
    let b = generate_asymmetric_key_pair().unwrap();
    let wrapped = asymmetric_encrypt(b"k", &a.public_key).unwrap();
    assert_eq!(
        asymmetric_decrypt(&wrapped, &b.private_key).unwrap_err(),
        CryptoError::DecryptionFailed
    );
}

#[test]
fn test_sealing_capacity_covers_encoded_keys() {
    let key = generate_symmetric_key().unwrap();
    assert!(key.encode().len() <= MAX_SEALED_PLAINTEXT);
}

#[test]
fn test_keys_survive_text_form() {
    let pair = generate_asymmetric_key_pair().unwrap();
    let public = PublicKey::decode(&pair.public_key.encode()).unwrap();
    let private = PrivateKey::decode(&pair.private_key.encode()).unwrap();
    let wrapped = asymmetric_encrypt(b"payload", &public).unwrap();
    assert_eq!(asymmetric_decrypt(&wrapped, &private).unwrap(), b"payload");
}

#[test]
fn test_wire_separators() {
    assert_eq!(ENVELOPE_SEPARATOR, '.');
    assert_eq!(IV_SEPARATOR, ':');

    let pair = generate_asymmetric_key_pair().unwrap();
    let key = generate_symmetric_key().unwrap();
    let envelope = Envelope::new(
        asymmetric_encrypt(key.encode().as_bytes(), &pair.public_key).unwrap(),
        symmetric_encrypt("body", &key).unwrap(),
    );
    let wire = envelope.serialize();
    assert_eq!(wire.matches('.').count(), 1);
    assert_eq!(wire.matches(':').count(), 1);
    assert_eq!(Envelope::parse(&wire).unwrap(), envelope);
}
