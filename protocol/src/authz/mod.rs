//! # Authorization Flow
//!
//! fetch → verify → decrypt → decide → encrypt → sign → submit → confirm.
//!
//! [`AuthorizationClient`] owns the keys, the remote service and the
//! decision prompt, and walks a single transaction through the whole flow.

pub mod client;
pub mod decision;
pub mod error;

pub use client::{AuthorizationClient, ClientConfig, ClientState, Outcome};
pub use decision::{decide, parse_reply, DecisionPrompt};
pub use error::{AuthError, ErrorKind};
