//! # Remote Service
//!
//! The three network operations the protocol needs, behind one trait:
//!
//! | Operation      | Method & Path                              | Response             |
//! |----------------|--------------------------------------------|----------------------|
//! | `fetch_latest` | `GET /api/user/+last-txn?device_id=<id>`   | `<ct hex>|<sig hex>` |
//! | `submit`       | `POST /api/txn/+mod` (form)                | 200 on success       |
//! | `query_status` | `GET /api/txn/<id>/+stat`                  | status code          |
//!
//! Implementations report transport failures as they are; retry policy
//! belongs to the authorization client, which only ever retries fetches.

pub mod http;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::transaction::{DecodeError, Status, WireTuple};

pub use http::{HttpRemote, HttpRemoteConfig};

/// Transport-level failure talking to the server.
#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("invalid endpoint {url:?}: {reason}")]
    InvalidEndpoint { url: String, reason: String },

    #[error("request to {endpoint} timed out")]
    Timeout { endpoint: String },

    #[error("could not connect to {endpoint}: {message}")]
    Connect { endpoint: String, message: String },

    #[error("server returned HTTP {status} for {endpoint}")]
    HttpStatus { endpoint: String, status: u16 },

    #[error("empty response body from {endpoint}")]
    EmptyBody { endpoint: String },

    #[error("transport error on {endpoint}: {message}")]
    Transport { endpoint: String, message: String },
}

impl NetworkError {
    /// Failures worth another attempt after a pause: the server was
    /// unreachable, slow, or having a bad moment. Everything else means the
    /// request itself is wrong and will fail again.
    pub fn is_transient(&self) -> bool {
        match self {
            NetworkError::Timeout { .. } | NetworkError::Connect { .. } => true,
            NetworkError::HttpStatus { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

/// Anything a remote call can fail with.
#[derive(Debug, Error)]
pub enum RemoteError {
    #[error(transparent)]
    Network(#[from] NetworkError),

    /// The server answered the submit call with anything but HTTP 200.
    #[error("server rejected the submission with HTTP {status}")]
    Rejected { status: u16 },

    #[error("undecodable response: {0}")]
    Decode(#[from] DecodeError),
}

/// The server, as seen by the device.
#[async_trait]
pub trait RemoteService: Send + Sync {
    /// Latest transaction addressed to `device_id`, still sealed and
    /// unauthenticated.
    async fn fetch_latest(&self, device_id: u32) -> Result<WireTuple, RemoteError>;

    /// Hand a sealed decision back. Any answer other than HTTP 200 is
    /// [`RemoteError::Rejected`].
    async fn submit(
        &self,
        transaction_id: u64,
        device_id: u32,
        ciphertext: &[u8],
        signature: &[u8],
    ) -> Result<(), RemoteError>;

    /// Status the server currently records for the transaction.
    async fn query_status(&self, transaction_id: u64) -> Result<Status, RemoteError>;
}

#[async_trait]
impl<T: RemoteService + ?Sized> RemoteService for Arc<T> {
    async fn fetch_latest(&self, device_id: u32) -> Result<WireTuple, RemoteError> {
        (**self).fetch_latest(device_id).await
    }

    async fn submit(
        &self,
        transaction_id: u64,
        device_id: u32,
        ciphertext: &[u8],
        signature: &[u8],
    ) -> Result<(), RemoteError> {
        (**self)
            .submit(transaction_id, device_id, ciphertext, signature)
            .await
    }

    async fn query_status(&self, transaction_id: u64) -> Result<Status, RemoteError> {
        (**self).query_status(transaction_id).await
    }
}
