//! Transaction status and its wire codes.
//!
//! The server speaks status as a small integer. The mapping is written out
//! explicitly below rather than derived from declaration order, so
//! reordering the enum cannot silently change the wire contract.

use std::fmt;

use super::codec::DecodeError;
use crate::config::WIRE_FORMAT_VERSION;

/// Authorization outcome of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    /// Waiting for a human decision.
    Unauthenticated,
    /// The device holder approved the transaction.
    Approved,
    /// The device holder denied the transaction.
    Denied,
    /// The server gave up on the transaction.
    Error,
}

impl Status {
    /// Every status, in wire-code order.
    pub const ALL: [Status; 4] = [
        Status::Unauthenticated,
        Status::Approved,
        Status::Denied,
        Status::Error,
    ];

    /// Wire code table, version 1.
    pub const fn wire_code(self) -> u8 {
        match self {
            Status::Unauthenticated => 0,
            Status::Approved => 1,
            Status::Denied => 2,
            Status::Error => 3,
        }
    }

    /// Look a wire code up in the table. Anything outside it is a decode
    /// error, never an index out of bounds.
    pub fn from_wire_code(code: i64) -> Result<Self, DecodeError> {
        Status::ALL
            .into_iter()
            .find(|status| i64::from(status.wire_code()) == code)
            .ok_or(DecodeError::UnknownStatus {
                code,
                version: WIRE_FORMAT_VERSION,
            })
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unauthenticated => write!(f, "Unauthenticated"),
            Self::Approved => write!(f, "Approved"),
            Self::Denied => write!(f, "Denied"),
            Self::Error => write!(f, "Error"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_codes_are_fixed() {
        // Part of the server contract. Do not "fix" these.
        assert_eq!(Status::Unauthenticated.wire_code(), 0);
        assert_eq!(Status::Approved.wire_code(), 1);
        assert_eq!(Status::Denied.wire_code(), 2);
        assert_eq!(Status::Error.wire_code(), 3);
    }

    #[test]
    fn table_lookup_matches_codes() {
        for status in Status::ALL {
            assert_eq!(
                Status::from_wire_code(i64::from(status.wire_code())).unwrap(),
                status
            );
        }
    }

    #[test]
    fn out_of_range_codes_are_decode_errors() {
        for code in [4, 99, -1, i64::MAX, i64::MIN] {
            assert!(matches!(
                Status::from_wire_code(code),
                Err(DecodeError::UnknownStatus { code: c, version: 1 }) if c == code
            ));
        }
    }
}
