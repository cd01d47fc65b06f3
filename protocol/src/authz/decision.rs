//! Asking the human.
//!
//! The prompt is a trait so the client never touches a terminal directly;
//! the binary supplies one over stdin/stdout, tests supply a scripted one.

use std::io;

use async_trait::async_trait;

use super::error::AuthError;
use crate::transaction::{Decision, Transaction};

/// Something that can show a transaction to a human and read back one
/// line of reply.
#[async_trait]
pub trait DecisionPrompt: Send {
    /// Present the transaction and read a reply. `Ok(None)` means the input
    /// is closed and no reply will ever come.
    async fn ask(&mut self, transaction: &Transaction) -> io::Result<Option<String>>;

    /// Tell the human their last reply was not understood.
    async fn reject(&mut self, reply: &str) -> io::Result<()>;
}

/// `"y"` approves; `"n"` or an empty reply denies. Surrounding whitespace
/// is ignored. Anything else is [`AuthError::InvalidInput`].
pub fn parse_reply(reply: &str) -> Result<Decision, AuthError> {
    match reply.trim() {
        "y" => Ok(Decision::Approve),
        "n" | "" => Ok(Decision::Deny),
        other => Err(AuthError::InvalidInput {
            reply: other.to_string(),
        }),
    }
}

/// Keep asking until the reply parses. The transaction is never touched
/// here; applying the decision is up to the caller.
pub async fn decide<P>(prompt: &mut P, transaction: &Transaction) -> Result<Decision, AuthError>
where
    P: DecisionPrompt + ?Sized,
{
    loop {
        let reply = prompt.ask(transaction).await.map_err(AuthError::Prompt)?;
        let Some(reply) = reply else {
            return Err(AuthError::Prompt(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "decision prompt closed before a reply was given",
            )));
        };

        match parse_reply(&reply) {
            Ok(decision) => return Ok(decision),
            Err(AuthError::InvalidInput { reply }) => {
                tracing::warn!(
                    transaction_id = transaction.id(),
                    reply = %reply,
                    "invalid reply, asking again"
                );
                prompt.reject(&reply).await.map_err(AuthError::Prompt)?;
            }
            Err(other) => return Err(other),
        }
    }
}
