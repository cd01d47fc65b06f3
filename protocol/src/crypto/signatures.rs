//! # Digital Signatures
//!
//! Ed25519 signing and verification. The server signs every ciphertext it
//! hands to a device; the device signs every ciphertext it hands back.
//!
//! ## Strictness
//!
//! We use `ed25519-dalek`'s strict verification. This rejects some edge-case
//! signatures that lenient implementations accept (small-order components,
//! non-canonical encodings). Stricter is safer, and the server is ours.

use ed25519_dalek::{Signature as DalekSignature, Signer};

use super::keys::{SigningKeyHandle, VerifyingKeyHandle};
use crate::config::SIGNATURE_LENGTH;

/// Sign a message, producing a 64-byte Ed25519 signature.
///
/// Deterministic (RFC 8032): the same key and message always produce the
/// same signature.
pub fn sign(key: &SigningKeyHandle, message: &[u8]) -> Vec<u8> {
    key.inner().sign(message).to_bytes().to_vec()
}

/// Verify an Ed25519 signature over `message`.
///
/// Returns `false` for a bad signature, for a signature from a different
/// key and for signature bytes of the wrong length. We don't distinguish
/// between those: they are all just "nope".
pub fn verify(key: &VerifyingKeyHandle, message: &[u8], signature: &[u8]) -> bool {
    let sig_bytes: [u8; SIGNATURE_LENGTH] = match signature.try_into() {
        Ok(b) => b,
        Err(_) => return false,
    };
    let signature = DalekSignature::from_bytes(&sig_bytes);
    key.inner().verify_strict(message, &signature).is_ok()
}
