//! Error types for the authorization flow.
//!
//! Every step of [`AuthorizationClient::run`](super::AuthorizationClient::run)
//! that can fail returns an [`AuthError`]. Callers branch on
//! [`AuthError::kind`], never on the message text.

use std::fmt;
use std::io;

use thiserror::Error;

use super::client::ClientState;
use crate::crypto::CryptoError;
use crate::remote::{NetworkError, RemoteError};
use crate::transaction::{DecodeError, TransactionError};

/// Errors that can occur while authorizing a transaction.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Encryption, decryption or signing failed, or a key was unusable.
    #[error("crypto error: {0}")]
    Crypto(#[from] CryptoError),

    /// The server signature over a fetched ciphertext did not verify. The
    /// payload was not decrypted.
    #[error("server signature verification failed for {transaction_hint}")]
    Signature {
        /// Fingerprint of the rejected ciphertext, for the logs.
        transaction_hint: String,
    },

    /// A payload or response body was not in the expected shape.
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    /// The server could not be reached, or answered a fetch/status call
    /// with an error.
    #[error("network error: {0}")]
    Network(#[from] NetworkError),

    /// The server refused the sealed decision.
    #[error("submission rejected with HTTP {status}")]
    Submission {
        /// HTTP status the server answered with.
        status: u16,
    },

    /// The reply to the decision prompt was neither yes nor no.
    #[error("invalid reply {reply:?}: expected 'y' or 'n'")]
    InvalidInput {
        /// The reply, trimmed.
        reply: String,
    },

    /// The decision prompt could not be read or written.
    #[error("decision prompt failed: {0}")]
    Prompt(#[source] io::Error),

    /// No pending transaction showed up within the configured number of
    /// polls.
    #[error("no pending transaction after {attempts} poll attempts")]
    PollLimitExceeded {
        /// Attempts made, transient failures included.
        attempts: u32,
    },

    /// A transaction was pushed through an illegal status change.
    #[error(transparent)]
    Transition(#[from] TransactionError),

    /// `run` was called on a client that already finished.
    #[error("client cannot run from the {state} state")]
    InvalidState {
        /// State the client was in.
        state: ClientState,
    },
}

/// Coarse classification of an [`AuthError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Crypto,
    Signature,
    Decode,
    Network,
    Submission,
    InvalidInput,
    Prompt,
    PollLimitExceeded,
    Transition,
    InvalidState,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Crypto => "crypto",
            Self::Signature => "signature",
            Self::Decode => "decode",
            Self::Network => "network",
            Self::Submission => "submission",
            Self::InvalidInput => "invalid_input",
            Self::Prompt => "prompt",
            Self::PollLimitExceeded => "poll_limit_exceeded",
            Self::Transition => "transition",
            Self::InvalidState => "invalid_state",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl AuthError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Crypto(_) => ErrorKind::Crypto,
            Self::Signature { .. } => ErrorKind::Signature,
            Self::Decode(_) => ErrorKind::Decode,
            Self::Network(_) => ErrorKind::Network,
            Self::Submission { .. } => ErrorKind::Submission,
            Self::InvalidInput { .. } => ErrorKind::InvalidInput,
            Self::Prompt(_) => ErrorKind::Prompt,
            Self::PollLimitExceeded { .. } => ErrorKind::PollLimitExceeded,
            Self::Transition(_) => ErrorKind::Transition,
            Self::InvalidState { .. } => ErrorKind::InvalidState,
        }
    }

    /// Whether the run must stop. Invalid replies are re-prompted and
    /// transient network failures may be retried while polling; everything
    /// else ends the run.
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::InvalidInput { .. } => false,
            Self::Network(err) => !err.is_transient(),
            _ => true,
        }
    }

    /// The server may be compromised or the channel tampered with.
    pub fn is_tamper_signal(&self) -> bool {
        matches!(self, Self::Signature { .. })
    }
}

impl From<RemoteError> for AuthError {
    fn from(err: RemoteError) -> Self {
        match err {
            RemoteError::Network(err) => Self::Network(err),
            RemoteError::Rejected { status } => Self::Submission { status },
            RemoteError::Decode(err) => Self::Decode(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::EncryptionError;

    #[test]
    fn kinds_are_distinct_per_variant() {
        let errors = [
            AuthError::Crypto(CryptoError::Encryption(EncryptionError::DecryptFailed)),
            AuthError::Signature {
                transaction_hint: "ciphertext 00".into(),
            },
            AuthError::Decode(DecodeError::MissingDelimiter),
            AuthError::Network(NetworkError::Timeout {
                endpoint: "http://localhost".into(),
            }),
            AuthError::Submission { status: 500 },
            AuthError::InvalidInput {
                reply: "maybe".into(),
            },
            AuthError::Prompt(io::Error::from(io::ErrorKind::UnexpectedEof)),
            AuthError::PollLimitExceeded { attempts: 3 },
            AuthError::Transition(TransactionError::InvalidDeviceId),
            AuthError::InvalidState {
                state: ClientState::Done,
            },
        ];
        let mut kinds: Vec<ErrorKind> = errors.iter().map(AuthError::kind).collect();
        kinds.dedup();
        assert_eq!(kinds.len(), errors.len());
    }

    #[test]
    fn fatality_policy() {
        assert!(!AuthError::InvalidInput { reply: "x".into() }.is_fatal());
        assert!(!AuthError::Network(NetworkError::Timeout {
            endpoint: "http://localhost".into()
        })
        .is_fatal());
        assert!(AuthError::Network(NetworkError::HttpStatus {
            endpoint: "http://localhost".into(),
            status: 404
        })
        .is_fatal());
        assert!(AuthError::Signature {
            transaction_hint: String::new()
        }
        .is_fatal());
        assert!(AuthError::Submission { status: 503 }.is_fatal());
    }

    #[test]
    fn remote_rejection_becomes_submission_error() {
        let err = AuthError::from(RemoteError::Rejected { status: 403 });
        assert!(matches!(err, AuthError::Submission { status: 403 }));
        assert_eq!(err.kind(), ErrorKind::Submission);
    }

    #[test]
    fn only_signature_failures_are_tamper_signals() {
        assert!(AuthError::Signature {
            transaction_hint: String::new()
        }
        .is_tamper_signal());
        assert!(!AuthError::Decode(DecodeError::MissingDelimiter).is_tamper_signal());
    }
}
