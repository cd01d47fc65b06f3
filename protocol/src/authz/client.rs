//! The device-side protocol state machine.
//!
//! ```text
//!  Polling ──(pending txn)──▶ AwaitingDecision ──▶ Submitting ──▶ Confirming ──▶ Done
//!     │  ▲                          │                   │              │
//!     └──┘ resolved txn: sleep      └─────── any fatal error ──────────┴──▶ Aborted
//! ```
//!
//! A fetched ciphertext is only ever decrypted after the server signature
//! over it has verified. A failed verification aborts the run on the spot;
//! nothing is retried.

use std::fmt;
use std::time::Duration;

use tokio::time::sleep;

use super::decision::{decide, DecisionPrompt};
use super::error::AuthError;
use crate::config::DEFAULT_POLL_INTERVAL;
use crate::crypto::CryptoProvider;
use crate::remote::RemoteService;
use crate::transaction::{
    decode_record, encode_canonical, Decision, Device, Server, Status, Transaction,
};

/// Tunables for a single authorization run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Pause between polls while the latest transaction is already resolved.
    pub poll_interval: Duration,
    /// Give up after this many polls. `None` polls until a pending
    /// transaction shows up. At least one poll is always made.
    pub max_poll_attempts: Option<u32>,
    /// Treat timeouts, refused connections and 5xx answers on fetch as a
    /// wasted poll instead of aborting.
    pub retry_transient_fetch: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_poll_attempts: None,
            retry_transient_fetch: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClientState {
    Polling,
    AwaitingDecision,
    Submitting,
    Confirming,
    Done,
    Aborted,
}

impl ClientState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Aborted)
    }
}

impl fmt::Display for ClientState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Polling => "Polling",
            Self::AwaitingDecision => "AwaitingDecision",
            Self::Submitting => "Submitting",
            Self::Confirming => "Confirming",
            Self::Done => "Done",
            Self::Aborted => "Aborted",
        };
        f.write_str(name)
    }
}

/// Result of a completed run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub transaction_id: u64,
    pub decision: Decision,
    /// Status the server reported after the submission.
    pub confirmed_status: Status,
    /// Polls made before a pending transaction was found.
    pub poll_attempts: u32,
}

/// Drives one transaction from fetch to confirmation.
///
/// Keys and device identity are owned by the client for its whole
/// lifetime. A client runs once: after `Done` or `Aborted` it refuses to
/// start again.
pub struct AuthorizationClient<C, R, P>
where
    C: CryptoProvider,
    R: RemoteService,
    P: DecisionPrompt,
{
    crypto: C,
    device: Device<C>,
    server: Server<C>,
    remote: R,
    prompt: P,
    config: ClientConfig,
    state: ClientState,
}

impl<C, R, P> AuthorizationClient<C, R, P>
where
    C: CryptoProvider,
    R: RemoteService,
    P: DecisionPrompt,
{
    pub fn new(
        crypto: C,
        device: Device<C>,
        server: Server<C>,
        remote: R,
        prompt: P,
        config: ClientConfig,
    ) -> Self {
        Self {
            crypto,
            device,
            server,
            remote,
            prompt,
            config,
            state: ClientState::Polling,
        }
    }

    pub fn state(&self) -> ClientState {
        self.state
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn remote(&self) -> &R {
        &self.remote
    }

    pub fn prompt(&self) -> &P {
        &self.prompt
    }

    /// Run the whole pipeline: poll, verify, decrypt, decide, seal, submit,
    /// confirm. Any error leaves the client in [`ClientState::Aborted`].
    pub async fn run(&mut self) -> Result<Outcome, AuthError> {
        if self.state.is_terminal() {
            return Err(AuthError::InvalidState { state: self.state });
        }

        tracing::info!(
            device_id = self.device.id(),
            server = %self.server.api_url(),
            "starting authorization run"
        );

        match self.drive().await {
            Ok(outcome) => {
                tracing::info!(
                    transaction_id = outcome.transaction_id,
                    decision = ?outcome.decision,
                    confirmed_status = %outcome.confirmed_status,
                    poll_attempts = outcome.poll_attempts,
                    "authorization complete"
                );
                Ok(outcome)
            }
            Err(err) => {
                if let AuthError::Signature { transaction_hint } = &err {
                    tracing::error!(
                        tamper = true,
                        hint = %transaction_hint,
                        "server signature did not verify, refusing to decrypt"
                    );
                } else {
                    tracing::error!(kind = %err.kind(), error = %err, state = %self.state, "authorization aborted");
                }
                self.enter(ClientState::Aborted);
                Err(err)
            }
        }
    }

    async fn drive(&mut self) -> Result<Outcome, AuthError> {
        let (mut transaction, poll_attempts) = self.poll().await?;

        self.enter(ClientState::AwaitingDecision);
        let decision = decide(&mut self.prompt, &transaction).await?;
        transaction.apply_decision(decision)?;

        self.enter(ClientState::Submitting);
        self.submit(&mut transaction).await?;

        self.enter(ClientState::Confirming);
        let confirmed_status = self.remote.query_status(transaction.id()).await?;

        self.enter(ClientState::Done);
        Ok(Outcome {
            transaction_id: transaction.id(),
            decision,
            confirmed_status,
            poll_attempts,
        })
    }

    /// Poll until the latest transaction is pending.
    async fn poll(&mut self) -> Result<(Transaction, u32), AuthError> {
        let mut attempts: u32 = 0;
        loop {
            attempts += 1;
            tracing::debug!(attempt = attempts, "polling for latest transaction");

            match self.fetch_once().await {
                Ok(transaction) if transaction.is_pending() => {
                    return Ok((transaction, attempts));
                }
                Ok(transaction) => {
                    tracing::debug!(
                        transaction_id = transaction.id(),
                        status = %transaction.status(),
                        "latest transaction already resolved"
                    );
                }
                Err(err @ AuthError::Network(_))
                    if self.config.retry_transient_fetch && !err.is_fatal() =>
                {
                    tracing::warn!(attempt = attempts, error = %err, "transient fetch failure, will retry");
                }
                Err(err) => return Err(err),
            }

            if let Some(max) = self.config.max_poll_attempts {
                if attempts >= max {
                    return Err(AuthError::PollLimitExceeded { attempts });
                }
            }
            sleep(self.config.poll_interval).await;
        }
    }

    /// Fetch, verify, then decrypt and decode. Verification comes first,
    /// always.
    async fn fetch_once(&self) -> Result<Transaction, AuthError> {
        let tuple = self.remote.fetch_latest(self.device.id()).await?;

        let authentic = self.crypto.verify(
            self.server.verifying_key(),
            &tuple.ciphertext,
            &tuple.signature,
        )?;
        if !authentic {
            return Err(AuthError::Signature {
                transaction_hint: fingerprint(&tuple.ciphertext),
            });
        }

        let plaintext = self
            .crypto
            .decrypt(self.device.decryption_key(), &tuple.ciphertext)?;
        Ok(decode_record(&plaintext)?)
    }

    /// Encrypt the canonical form to the server, sign the ciphertext, seal
    /// the transaction and hand it over.
    async fn submit(&self, transaction: &mut Transaction) -> Result<(), AuthError> {
        let canonical = encode_canonical(transaction);
        let ciphertext = self
            .crypto
            .encrypt(self.server.encryption_key(), canonical.as_bytes())?;
        let signature = self.crypto.sign(self.device.signing_key(), &ciphertext)?;
        transaction.seal(ciphertext.clone(), signature.clone())?;

        self.remote
            .submit(transaction.id(), self.device.id(), &ciphertext, &signature)
            .await?;
        tracing::info!(
            transaction_id = transaction.id(),
            status = %transaction.status(),
            "decision submitted"
        );
        Ok(())
    }

    fn enter(&mut self, next: ClientState) {
        tracing::info!(from = %self.state, to = %next, "state transition");
        self.state = next;
    }
}

/// Short, log-safe identifier for a ciphertext we refused to open.
fn fingerprint(ciphertext: &[u8]) -> String {
    let prefix = &ciphertext[..ciphertext.len().min(8)];
    format!("ciphertext {}.. ({} bytes)", hex::encode(prefix), ciphertext.len())
}
