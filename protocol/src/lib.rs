// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Vouch Protocol: Core Library
//!
//! Out-of-band transaction authorization, device side. A bank (the server)
//! wants a human to confirm a transaction on a second device before it goes
//! through. The device polls for the latest transaction, checks that the
//! server really sent it, shows it to the human, and sends back a sealed
//! yes or no.
//!
//! Nothing travels in the clear and nothing is trusted before it verifies:
//! server payloads are signed ciphertext, and the device answers with
//! ciphertext it signs itself.
//!
//! ## Architecture
//!
//! - **config** -- Protocol constants: endpoints, key sizes, timeouts.
//! - **crypto** -- Ed25519 signatures and sealed-box encryption behind the
//!   `CryptoProvider` trait.
//! - **transaction** -- The transaction record, its status rules and wire
//!   encodings.
//! - **remote** -- The three server calls, and their HTTP implementation.
//! - **authz** -- The state machine tying it all together.
//!
//! ## Design Philosophy
//!
//! 1. Verify before you decrypt. Always.
//! 2. Keys are injected, never global.
//! 3. Every failure has a kind, and the caller decides what it means.

pub mod authz;
pub mod config;
pub mod crypto;
pub mod remote;
pub mod transaction;

pub use authz::{AuthError, AuthorizationClient, ClientConfig, ErrorKind, Outcome};
pub use crypto::{CryptoProvider, StandardCrypto};
pub use remote::{HttpRemote, HttpRemoteConfig, RemoteService};
