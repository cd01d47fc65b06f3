//! # Sealed-Box Encryption
//!
//! Asymmetric encryption to a recipient's static X25519 public key. Used in
//! both directions: the server seals transaction records to the device, the
//! device seals its decision to the server.
//!
//! ## Construction
//!
//! 1. Generate an ephemeral X25519 keypair.
//! 2. Diffie-Hellman with the recipient's static public key.
//! 3. Derive a 256-bit payload key with BLAKE3 `derive_key`, binding both
//!    public keys into the input.
//! 4. Encrypt with AES-256-GCM under a random 96-bit nonce.
//!
//! The raw DH output is never used as a key directly. It has algebraic
//! structure and is not uniform over {0,1}^256; the KDF fixes that.
//!
//! ## Wire format
//!
//! ```text
//! ephemeral_pub (32) || nonce (12) || ciphertext || tag (16)
//! ```

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use rand::rngs::OsRng;
use rand::RngCore;
use thiserror::Error;
use x25519_dalek::{EphemeralSecret, PublicKey};

use super::keys::{DecryptionKeyHandle, EncryptionKeyHandle};
use crate::config::{
    AES_KEY_LENGTH, AES_NONCE_LENGTH, AES_TAG_LENGTH, SEALED_BOX_KDF_CONTEXT, X25519_KEY_LENGTH,
};

/// Shortest possible sealed box: an empty plaintext still carries the
/// ephemeral key, the nonce and the tag.
pub const SEALED_OVERHEAD: usize = X25519_KEY_LENGTH + AES_NONCE_LENGTH + AES_TAG_LENGTH;

/// Errors that can occur during encryption/decryption.
///
/// Kept vague on purpose. The difference between "wrong key" and
/// "corrupted ciphertext" is none of an attacker's business.
#[derive(Debug, Error)]
pub enum EncryptionError {
    #[error("encryption failed")]
    EncryptFailed,

    #[error("decryption failed -- wrong key or corrupted ciphertext")]
    DecryptFailed,

    #[error("ciphertext too short: must be at least {} bytes", SEALED_OVERHEAD)]
    CiphertextTooShort,

    #[error("key agreement produced a non-contributory shared secret")]
    NonContributory,
}

/// Encrypt with AES-256-GCM under a fresh random nonce. Returns
/// `nonce || ciphertext || tag`.
pub fn encrypt(key: &[u8; AES_KEY_LENGTH], plaintext: &[u8]) -> Result<Vec<u8>, EncryptionError> {
    let cipher = Aes256Gcm::new_from_slice(key).map_err(|_| EncryptionError::EncryptFailed)?;

    let mut nonce_bytes = [0u8; AES_NONCE_LENGTH];
    OsRng.fill_bytes(&mut nonce_bytes);
    let nonce = Nonce::from_slice(&nonce_bytes);

    let ciphertext = cipher
        .encrypt(nonce, plaintext)
        .map_err(|_| EncryptionError::EncryptFailed)?;

    let mut out = Vec::with_capacity(AES_NONCE_LENGTH + ciphertext.len());
    out.extend_from_slice(&nonce_bytes);
    out.extend_from_slice(&ciphertext);
    Ok(out)
}

/// Decrypt data produced by [`encrypt`].
pub fn decrypt(key: &[u8; AES_KEY_LENGTH], data: &[u8]) -> Result<Vec<u8>, EncryptionError> {
    if data.len() < AES_NONCE_LENGTH + AES_TAG_LENGTH {
        return Err(EncryptionError::CiphertextTooShort);
    }

    let (nonce_bytes, ciphertext) = data.split_at(AES_NONCE_LENGTH);
    let cipher = Aes256Gcm::new_from_slice(key).map_err(|_| EncryptionError::DecryptFailed)?;

    cipher
        .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
        .map_err(|_| EncryptionError::DecryptFailed)
}

/// Seal `plaintext` so that only the holder of the matching
/// [`DecryptionKeyHandle`] can open it.
pub fn seal(
    recipient: &EncryptionKeyHandle,
    plaintext: &[u8],
) -> Result<Vec<u8>, EncryptionError> {
    let ephemeral = EphemeralSecret::random_from_rng(OsRng);
    let ephemeral_public = PublicKey::from(&ephemeral);

    let shared = ephemeral.diffie_hellman(recipient.inner());
    if !shared.was_contributory() {
        return Err(EncryptionError::NonContributory);
    }

    let key = derive_payload_key(
        shared.as_bytes(),
        ephemeral_public.as_bytes(),
        recipient.as_bytes(),
    );
    let body = encrypt(&key, plaintext)?;

    let mut out = Vec::with_capacity(X25519_KEY_LENGTH + body.len());
    out.extend_from_slice(ephemeral_public.as_bytes());
    out.extend_from_slice(&body);
    Ok(out)
}

/// Open a box produced by [`seal`].
pub fn open(recipient: &DecryptionKeyHandle, sealed: &[u8]) -> Result<Vec<u8>, EncryptionError> {
    if sealed.len() < SEALED_OVERHEAD {
        return Err(EncryptionError::CiphertextTooShort);
    }

    let (ephemeral_bytes, body) = sealed.split_at(X25519_KEY_LENGTH);
    let mut ephemeral = [0u8; X25519_KEY_LENGTH];
    ephemeral.copy_from_slice(ephemeral_bytes);
    let ephemeral_public = PublicKey::from(ephemeral);

    let shared = recipient.inner().diffie_hellman(&ephemeral_public);
    if !shared.was_contributory() {
        return Err(EncryptionError::NonContributory);
    }

    let own_public = recipient.encryption_key();
    let key = derive_payload_key(shared.as_bytes(), &ephemeral, own_public.as_bytes());
    decrypt(&key, body)
}

/// Both public keys go into the KDF input so a box cannot be re-targeted
/// at a different recipient by swapping the ephemeral key.
fn derive_payload_key(
    shared_secret: &[u8; 32],
    ephemeral_public: &[u8; 32],
    recipient_public: &[u8; 32],
) -> [u8; AES_KEY_LENGTH] {
    let mut material = [0u8; 96];
    material[..32].copy_from_slice(shared_secret);
    material[32..64].copy_from_slice(ephemeral_public);
    material[64..].copy_from_slice(recipient_public);
    blake3::derive_key(SEALED_BOX_KDF_CONTEXT, &material)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_key() -> [u8; 32] {
        let mut key = [0u8; 32];
        for (i, byte) in key.iter_mut().enumerate() {
            *byte = i as u8;
        }
        key
    }

    fn recipient() -> DecryptionKeyHandle {
        DecryptionKeyHandle::from_bytes([0x42; 32])
    }

    #[test]
    fn test_symmetric_roundtrip() {
        let key = test_key();
        let sealed = encrypt(&key, b"the quick brown fox").unwrap();
        assert_eq!(decrypt(&key, &sealed).unwrap(), b"the quick brown fox");
    }

    #[test]
    fn test_seal_open_roundtrip() {
        let secret = recipient();
        let sealed = seal(&secret.encryption_key(), b"5|Wire $500|1").unwrap();
        assert_eq!(open(&secret, &sealed).unwrap(), b"5|Wire $500|1");
    }

    #[test]
    fn test_sealed_length() {
        let secret = recipient();
        let plaintext = b"exactly 26 bytes of input!";
        let sealed = seal(&secret.encryption_key(), plaintext).unwrap();
        assert_eq!(sealed.len(), SEALED_OVERHEAD + plaintext.len());
    }

    #[test]
    fn test_empty_plaintext() {
        let secret = recipient();
        let sealed = seal(&secret.encryption_key(), b"").unwrap();
        assert_eq!(sealed.len(), SEALED_OVERHEAD);
        assert!(open(&secret, &sealed).unwrap().is_empty());
    }

    #[test]
    fn test_wrong_recipient_fails() {
        let sealed = seal(&recipient().encryption_key(), b"secret").unwrap();
        let other = DecryptionKeyHandle::from_bytes([0x43; 32]);
        assert!(matches!(open(&other, &sealed), Err(EncryptionError::DecryptFailed)));
    }

    #[test]
    fn test_modified_ciphertext_fails() {
        let secret = recipient();
        let mut sealed = seal(&secret.encryption_key(), b"secret").unwrap();
        let last = sealed.len() - 1;
        sealed[last] ^= 0x01;
        assert!(open(&secret, &sealed).is_err());
    }

    #[test]
    fn test_swapped_ephemeral_key_fails() {
        let secret = recipient();
        let mut sealed = seal(&secret.encryption_key(), b"secret").unwrap();
        sealed[0] ^= 0x80;
        assert!(open(&secret, &sealed).is_err());
    }

    #[test]
    fn test_too_short_rejected() {
        assert!(matches!(
            open(&recipient(), &[0u8; SEALED_OVERHEAD - 1]),
            Err(EncryptionError::CiphertextTooShort)
        ));
    }

    #[test]
    fn test_low_order_recipient_rejected() {
        // The all-zero point makes every DH output zero.
        let degenerate = EncryptionKeyHandle::from_bytes([0u8; 32]);
        assert!(matches!(
            seal(&degenerate, b"x"),
            Err(EncryptionError::NonContributory)
        ));
    }

    #[test]
    fn test_each_seal_is_fresh() {
        let pk = recipient().encryption_key();
        let a = seal(&pk, b"message").unwrap();
        let b = seal(&pk, b"message").unwrap();
        assert_ne!(a, b);
    }
}
