//! # Protocol Configuration & Constants
//!
//! Every magic number in Vouch lives here. If you're hardcoding a constant
//! somewhere else, you're doing it wrong and you owe the team coffee.
//!
//! Some of these values are part of the wire contract with the server
//! (endpoint paths, status codes, key lengths). Changing those is a
//! coordinated release, not a refactor.

use std::time::Duration;

// ---------------------------------------------------------------------------
// Wire Protocol
// ---------------------------------------------------------------------------

/// Version of the status code table and canonical encodings. Bump it together
/// with the server when the status table changes.
pub const WIRE_FORMAT_VERSION: u16 = 1;

/// Field separator in the wire tuple and the canonical outbound form.
pub const FIELD_DELIMITER: char = '|';

/// Endpoint returning the latest transaction for a device.
pub const PATH_LATEST_TRANSACTION: &str = "/api/user/+last-txn";

/// Endpoint accepting a sealed decision.
pub const PATH_SUBMIT_DECISION: &str = "/api/txn/+mod";

/// Query parameter / form field carrying the device id.
pub const FIELD_DEVICE_ID: &str = "device_id";

/// Form field carrying the hex-encoded ciphertext.
pub const FIELD_PAYLOAD: &str = "payload";

/// Form field carrying the hex-encoded signature.
pub const FIELD_SIGNATURE: &str = "signature";

/// Path of the status endpoint for a single transaction.
pub fn status_path(transaction_id: u64) -> String {
    format!("/api/txn/{}/+stat", transaction_id)
}

// ---------------------------------------------------------------------------
// Cryptographic Parameters
// ---------------------------------------------------------------------------

/// Ed25519 secret key length in bytes.
pub const SIGNING_KEY_LENGTH: usize = 32;

/// Ed25519 public (verifying) key length in bytes.
pub const VERIFYING_KEY_LENGTH: usize = 32;

/// Ed25519 signature length. Always 64 bytes.
pub const SIGNATURE_LENGTH: usize = 64;

/// X25519 public/secret key length in bytes.
pub const X25519_KEY_LENGTH: usize = 32;

/// AES-256-GCM key length in bytes.
pub const AES_KEY_LENGTH: usize = 32;

/// AES-256-GCM nonce length in bytes. 96 bits. Not 128. Twelve bytes.
pub const AES_NONCE_LENGTH: usize = 12;

/// AES-256-GCM authentication tag length in bytes.
pub const AES_TAG_LENGTH: usize = 16;

/// BLAKE3 `derive_key` context for sealed-box key derivation. Changing this
/// string makes every in-flight ciphertext undecryptable.
pub const SEALED_BOX_KDF_CONTEXT: &str = "vouch 2026-01 sealed-box v1 payload key";

// ---------------------------------------------------------------------------
// Timing
// ---------------------------------------------------------------------------

/// Pause between two fetches while no pending transaction is available.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(7);

/// Time allowed to establish a TCP/TLS connection to the server.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Upper bound on a whole request/response exchange.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_path_embeds_transaction_id() {
        assert_eq!(status_path(42), "/api/txn/42/+stat");
    }

    #[test]
    fn crypto_parameter_sizes() {
        assert_eq!(SIGNING_KEY_LENGTH, 32);
        assert_eq!(VERIFYING_KEY_LENGTH, 32);
        assert_eq!(SIGNATURE_LENGTH, 64);
        assert_eq!(X25519_KEY_LENGTH, 32);
        assert_eq!(AES_KEY_LENGTH, 32);
        assert_eq!(AES_NONCE_LENGTH, 12);
    }

    #[test]
    fn timing_constants_sanity() {
        // A connect timeout longer than the whole request budget is never hit.
        assert!(DEFAULT_CONNECT_TIMEOUT < DEFAULT_REQUEST_TIMEOUT);
        assert!(DEFAULT_POLL_INTERVAL.as_millis() > 0);
    }
}
