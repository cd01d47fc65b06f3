//! The transaction record and the decision applied to it.

use std::fmt;

use thiserror::Error;

use super::status::Status;

/// Errors raised by illegal operations on a [`Transaction`] or a party.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransactionError {
    /// Only `Unauthenticated → Approved` and `Unauthenticated → Denied`
    /// are legal.
    #[error("illegal status transition {from} -> {to} for transaction {id}")]
    InvalidTransition { id: u64, from: Status, to: Status },

    /// Sealing is the last step before submission and needs a decision.
    #[error("transaction {id} cannot be sealed while {status}")]
    NotDecided { id: u64, status: Status },

    /// Device id 0 is reserved by the server.
    #[error("device id must be a positive integer")]
    InvalidDeviceId,
}

/// What the human said.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Approve,
    Deny,
}

impl Decision {
    /// Status the transaction moves to when this decision is applied.
    pub fn status(self) -> Status {
        match self {
            Decision::Approve => Status::Approved,
            Decision::Deny => Status::Denied,
        }
    }
}

/// Ciphertext of the canonical form plus the device signature over exactly
/// those bytes. Kept as one value so the two can never drift apart.
#[derive(Clone, PartialEq, Eq)]
pub struct SealedPayload {
    pub ciphertext: Vec<u8>,
    pub signature: Vec<u8>,
}

impl fmt::Debug for SealedPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SealedPayload")
            .field("ciphertext_len", &self.ciphertext.len())
            .field("signature", &hex::encode(&self.signature))
            .finish()
    }
}

/// A single authorization request.
///
/// `id` and `text` never change after construction. `status` changes at
/// most once, through [`Transaction::apply_decision`]. The sealed payload
/// is only set right before submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    id: u64,
    text: String,
    status: Status,
    sealed: Option<SealedPayload>,
}

impl Transaction {
    pub fn new(id: u64, text: impl Into<String>, status: Status) -> Self {
        Self {
            id,
            text: text.into(),
            status,
            sealed: None,
        }
    }

    /// Server-assigned primary key.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Description shown to the human.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn status(&self) -> Status {
        self.status
    }

    /// `true` while the transaction still waits for a decision.
    pub fn is_pending(&self) -> bool {
        self.status == Status::Unauthenticated
    }

    /// Request a status change. Anything but a first decision on a pending
    /// transaction is rejected and leaves the transaction untouched.
    pub fn transition_to(&mut self, next: Status) -> Result<(), TransactionError> {
        match (self.status, next) {
            (Status::Unauthenticated, Status::Approved | Status::Denied) => {
                self.status = next;
                Ok(())
            }
            (from, to) => Err(TransactionError::InvalidTransition {
                id: self.id,
                from,
                to,
            }),
        }
    }

    pub fn apply_decision(&mut self, decision: Decision) -> Result<(), TransactionError> {
        self.transition_to(decision.status())
    }

    /// Attach the outbound ciphertext and its signature. Replaces any
    /// previous pair as a whole.
    pub fn seal(&mut self, ciphertext: Vec<u8>, signature: Vec<u8>) -> Result<(), TransactionError> {
        if self.is_pending() {
            return Err(TransactionError::NotDecided {
                id: self.id,
                status: self.status,
            });
        }
        self.sealed = Some(SealedPayload {
            ciphertext,
            signature,
        });
        Ok(())
    }

    pub fn sealed(&self) -> Option<&SealedPayload> {
        self.sealed.as_ref()
    }

    pub fn encrypted_payload(&self) -> Option<&[u8]> {
        self.sealed.as_ref().map(|s| s.ciphertext.as_slice())
    }

    pub fn signature(&self) -> Option<&[u8]> {
        self.sealed.as_ref().map(|s| s.signature.as_slice())
    }
}

impl fmt::Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} [{}] {}", self.id, self.status, self.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pending() -> Transaction {
        Transaction::new(5, "Wire $500", Status::Unauthenticated)
    }

    #[test]
    fn pending_can_be_approved_or_denied() {
        let mut a = pending();
        a.apply_decision(Decision::Approve).unwrap();
        assert_eq!(a.status(), Status::Approved);

        let mut d = pending();
        d.apply_decision(Decision::Deny).unwrap();
        assert_eq!(d.status(), Status::Denied);
    }

    #[test]
    fn transition_law_rejects_everything_else() {
        for from in Status::ALL {
            for to in Status::ALL {
                let mut txn = Transaction::new(1, "t", from);
                let legal = from == Status::Unauthenticated
                    && matches!(to, Status::Approved | Status::Denied);
                let result = txn.transition_to(to);
                assert_eq!(result.is_ok(), legal, "{} -> {}", from, to);
                if !legal {
                    assert_eq!(txn.status(), from, "rejected transition mutated status");
                }
            }
        }
    }

    #[test]
    fn decision_is_final() {
        let mut txn = pending();
        txn.apply_decision(Decision::Approve).unwrap();
        let err = txn.apply_decision(Decision::Deny).unwrap_err();
        assert_eq!(
            err,
            TransactionError::InvalidTransition {
                id: 5,
                from: Status::Approved,
                to: Status::Denied
            }
        );
        assert_eq!(txn.status(), Status::Approved);
    }

    #[test]
    fn sealing_requires_a_decision() {
        let mut txn = pending();
        assert!(txn.seal(vec![1], vec![2]).is_err());
        assert!(txn.sealed().is_none());

        txn.apply_decision(Decision::Deny).unwrap();
        txn.seal(vec![1, 2, 3], vec![9; 64]).unwrap();
        assert_eq!(txn.encrypted_payload(), Some(&[1u8, 2, 3][..]));
        assert_eq!(txn.signature().map(<[u8]>::len), Some(64));
    }

    #[test]
    fn resealing_replaces_both_halves() {
        let mut txn = pending();
        txn.apply_decision(Decision::Approve).unwrap();
        txn.seal(vec![1], vec![1]).unwrap();
        txn.seal(vec![2], vec![2]).unwrap();
        assert_eq!(
            txn.sealed(),
            Some(&SealedPayload {
                ciphertext: vec![2],
                signature: vec![2]
            })
        );
    }
}
