//! # Transaction Module
//!
//! The data model shared by every other part of the protocol, and its
//! wire encodings.
//!
//! ## Architecture
//!
//! ```text
//! status.rs  -- Status enum and the explicit wire code table
//! types.rs   -- Transaction, Decision, SealedPayload, transition rules
//! parties.rs -- Device and Server, each owning their key handles
//! codec.rs   -- canonical form, wire tuple, JSON record, status body
//! ```
//!
//! ## Transaction Lifecycle
//!
//! 1. **Decode** -- a verified, decrypted server record becomes a
//!    `Transaction` in `Unauthenticated`.
//! 2. **Decide** -- the human's answer moves it to `Approved` or `Denied`.
//!    Exactly once.
//! 3. **Seal** -- canonical form, encrypted to the server, signed by the
//!    device.
//! 4. **Submit / confirm** -- handed to the remote service, then dropped.

pub mod codec;
pub mod parties;
pub mod status;
pub mod types;

pub use codec::{decode_canonical, decode_record, encode_canonical, DecodeError, WireTuple};
pub use parties::{Device, Server};
pub use status::Status;
pub use types::{Decision, SealedPayload, Transaction, TransactionError};
