//! # Cryptographic Primitives for Vouch
//!
//! Everything security-related in the protocol flows through the
//! [`CryptoProvider`] trait: four operations over opaque key handles.
//!
//! - `sign` / `verify` -- authenticity of ciphertext in both directions.
//! - `encrypt` / `decrypt` -- confidentiality of transaction records.
//!
//! The authorization engine is generic over the provider, so tests can wrap
//! or replace it (e.g. to prove that decryption is never attempted on an
//! unauthenticated ciphertext). [`StandardCrypto`] is the real thing:
//!
//! - **Ed25519** for signatures.
//! - **X25519 + BLAKE3 + AES-256-GCM** sealed boxes for encryption.
//!
//! ## A note on "rolling your own crypto"
//!
//! We don't. Everything here is a thin, type-safe wrapper around audited
//! implementations.

pub mod encryption;
pub mod keys;
pub mod signatures;

use thiserror::Error;

pub use encryption::EncryptionError;
pub use keys::{
    DecryptionKeyHandle, EncryptionKeyHandle, KeyError, SigningKeyHandle, VerifyingKeyHandle,
};

/// Any failure of the crypto layer itself: malformed input, bad encoding,
/// unusable key material. Always fatal to the caller; never retried.
///
/// A signature that simply does not verify is *not* a `CryptoError`;
/// [`CryptoProvider::verify`] reports that as `Ok(false)`.
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("key material error: {0}")]
    Key(#[from] KeyError),

    #[error(transparent)]
    Encryption(#[from] EncryptionError),
}

/// The asymmetric-cryptography capability consumed by the protocol core.
///
/// Key handles are associated types so a provider decides its own key
/// representation; the core only ever moves them around by reference.
pub trait CryptoProvider: Send + Sync {
    /// Private key used to sign outbound data.
    type SigningKey: Send + Sync;
    /// Public key used to check inbound signatures.
    type VerifyingKey: Send + Sync;
    /// Recipient public key used to encrypt outbound data.
    type EncryptionKey: Send + Sync;
    /// Own private key used to decrypt inbound data.
    type DecryptionKey: Send + Sync;

    fn sign(&self, key: &Self::SigningKey, data: &[u8]) -> Result<Vec<u8>, CryptoError>;

    /// `Ok(false)` means "does not verify"; `Err` means the provider could
    /// not even attempt the check.
    fn verify(
        &self,
        key: &Self::VerifyingKey,
        data: &[u8],
        signature: &[u8],
    ) -> Result<bool, CryptoError>;

    fn encrypt(&self, key: &Self::EncryptionKey, plaintext: &[u8]) -> Result<Vec<u8>, CryptoError>;

    fn decrypt(&self, key: &Self::DecryptionKey, ciphertext: &[u8])
        -> Result<Vec<u8>, CryptoError>;
}

/// Ed25519 signatures and X25519 sealed boxes.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardCrypto;

impl CryptoProvider for StandardCrypto {
    type SigningKey = SigningKeyHandle;
    type VerifyingKey = VerifyingKeyHandle;
    type EncryptionKey = EncryptionKeyHandle;
    type DecryptionKey = DecryptionKeyHandle;

    fn sign(&self, key: &SigningKeyHandle, data: &[u8]) -> Result<Vec<u8>, CryptoError> {
        Ok(signatures::sign(key, data))
    }

    fn verify(
        &self,
        key: &VerifyingKeyHandle,
        data: &[u8],
        signature: &[u8],
    ) -> Result<bool, CryptoError> {
        Ok(signatures::verify(key, data, signature))
    }

    fn encrypt(&self, key: &EncryptionKeyHandle, plaintext: &[u8]) -> Result<Vec<u8>, CryptoError> {
        Ok(encryption::seal(key, plaintext)?)
    }

    fn decrypt(
        &self,
        key: &DecryptionKeyHandle,
        ciphertext: &[u8],
    ) -> Result<Vec<u8>, CryptoError> {
        Ok(encryption::open(key, ciphertext)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_roundtrips_across_the_key_pair() {
        let crypto = StandardCrypto;
        let server_secret = DecryptionKeyHandle::from_bytes([0x11; 32]);
        let server_public = server_secret.encryption_key();

        for plaintext in [&b""[..], &b"5|Wire $500|1"[..], &[0xFFu8; 4096][..]] {
            let ct = crypto.encrypt(&server_public, plaintext).unwrap();
            assert_eq!(crypto.decrypt(&server_secret, &ct).unwrap(), plaintext);
        }
    }

    #[test]
    fn provider_verify_reports_false_not_error() {
        let crypto = StandardCrypto;
        let signer = SigningKeyHandle::from_bytes(&[0x22; 32]);
        let sig = crypto.sign(&signer, b"payload").unwrap();

        assert!(crypto.verify(&signer.verifying_key(), b"payload", &sig).unwrap());
        assert!(!crypto.verify(&signer.verifying_key(), b"other", &sig).unwrap());
        assert!(!crypto.verify(&signer.verifying_key(), b"payload", b"short").unwrap());
    }

    #[test]
    fn provider_decrypt_garbage_is_crypto_error() {
        let crypto = StandardCrypto;
        let secret = DecryptionKeyHandle::from_bytes([0x33; 32]);
        let err = crypto.decrypt(&secret, &[0u8; 80]).unwrap_err();
        assert!(matches!(err, CryptoError::Encryption(_)));
    }
}
