//! Wire encodings of a transaction.
//!
//! ```text
//! outbound canonical form   <id>|<text>|<status code>
//! inbound wire tuple        <hex ciphertext>|<hex signature>
//! inbound decrypted record  [{"pk": 5, "fields": {"text": "...", "status": 0, "attempt_date": "..."}}]
//! status body               <status code>
//! ```
//!
//! The canonical form does not escape `|` inside `text`. It stays
//! unambiguous because the fields on either side are plain integers:
//! the id ends at the *first* delimiter and the status code starts after
//! the *last* one, so everything in between is text.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::Deserialize;
use thiserror::Error;

use super::status::Status;
use super::types::Transaction;
use crate::config::FIELD_DELIMITER;

/// Malformed data coming off the wire or out of a decrypted payload.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("wire tuple is missing the '{}' delimiter", FIELD_DELIMITER)]
    MissingDelimiter,

    #[error("wire tuple has an empty {0} field")]
    EmptyField(&'static str),

    #[error("{0} field is not valid hex")]
    InvalidHex(&'static str),

    #[error("malformed transaction record: {0}")]
    MalformedRecord(String),

    #[error("expected exactly one transaction record, got {0}")]
    RecordCount(usize),

    #[error("transaction id must be non-negative, got {0}")]
    NegativeId(i64),

    #[error("unknown status code {code} (wire format v{version})")]
    UnknownStatus { code: i64, version: u16 },

    #[error("unrecognised attempt_date {0:?}")]
    InvalidAttemptDate(String),

    #[error("malformed canonical form {0:?}")]
    MalformedCanonical(String),

    #[error("malformed status body {0:?}")]
    MalformedStatusBody(String),
}

// ---------------------------------------------------------------------------
// Canonical outbound form
// ---------------------------------------------------------------------------

/// `"<id>|<text>|<status code>"`, the plaintext the device encrypts to the
/// server.
pub fn encode_canonical(txn: &Transaction) -> String {
    format!(
        "{id}{d}{text}{d}{code}",
        id = txn.id(),
        text = txn.text(),
        code = txn.status().wire_code(),
        d = FIELD_DELIMITER,
    )
}

/// Inverse of [`encode_canonical`]. `text` may itself contain `|`.
pub fn decode_canonical(s: &str) -> Result<Transaction, DecodeError> {
    let malformed = || DecodeError::MalformedCanonical(s.to_string());

    let (id, rest) = s.split_once(FIELD_DELIMITER).ok_or_else(malformed)?;
    let (text, code) = rest.rsplit_once(FIELD_DELIMITER).ok_or_else(malformed)?;

    let id: u64 = id.parse().map_err(|_| malformed())?;
    let code: i64 = code.parse().map_err(|_| malformed())?;
    Ok(Transaction::new(id, text, Status::from_wire_code(code)?))
}

// ---------------------------------------------------------------------------
// Wire tuple
// ---------------------------------------------------------------------------

/// A server-signed ciphertext as received from the latest-transaction
/// endpoint. Nothing in here has been authenticated yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireTuple {
    pub ciphertext: Vec<u8>,
    pub signature: Vec<u8>,
}

impl WireTuple {
    /// Parse `"<ciphertext>|<signature>"`, splitting on the first delimiter
    /// only. Trailing line terminators are ignored.
    pub fn parse(line: &str) -> Result<Self, DecodeError> {
        let line = line.trim_end_matches(['\r', '\n']);
        let (ciphertext, signature) = line
            .split_once(FIELD_DELIMITER)
            .ok_or(DecodeError::MissingDelimiter)?;

        if ciphertext.is_empty() {
            return Err(DecodeError::EmptyField("ciphertext"));
        }
        if signature.is_empty() {
            return Err(DecodeError::EmptyField("signature"));
        }

        Ok(Self {
            ciphertext: hex::decode(ciphertext).map_err(|_| DecodeError::InvalidHex("ciphertext"))?,
            signature: hex::decode(signature).map_err(|_| DecodeError::InvalidHex("signature"))?,
        })
    }
}

// ---------------------------------------------------------------------------
// Decrypted server record
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct RawRecord {
    pk: i64,
    fields: RawFields,
}

#[derive(Debug, Deserialize)]
struct RawFields {
    text: String,
    status: i64,
    attempt_date: String,
}

/// Decode the plaintext of a server ciphertext: a JSON array holding exactly
/// one record.
pub fn decode_record(plaintext: &[u8]) -> Result<Transaction, DecodeError> {
    let mut records: Vec<RawRecord> = serde_json::from_slice(plaintext)
        .map_err(|e| DecodeError::MalformedRecord(e.to_string()))?;

    if records.len() != 1 {
        return Err(DecodeError::RecordCount(records.len()));
    }
    let RawRecord { pk, fields } = records.remove(0);

    let id = u64::try_from(pk).map_err(|_| DecodeError::NegativeId(pk))?;
    let status = Status::from_wire_code(fields.status)?;
    validate_attempt_date(&fields.attempt_date)?;

    Ok(Transaction::new(id, fields.text, status))
}

/// The server sends its timestamps as a plain date, a naive datetime, or
/// RFC 3339. The value is not kept; an unparseable one still means the
/// record is not what we think it is.
fn validate_attempt_date(raw: &str) -> Result<(), DecodeError> {
    let raw = raw.trim();
    let ok = NaiveDate::parse_from_str(raw, "%Y-%m-%d").is_ok()
        || NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f").is_ok()
        || NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f").is_ok()
        || DateTime::parse_from_rfc3339(raw).is_ok();

    if ok {
        Ok(())
    } else {
        Err(DecodeError::InvalidAttemptDate(raw.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Status body
// ---------------------------------------------------------------------------

/// Decode the body of the status endpoint.
pub fn decode_status_body(body: &str) -> Result<Status, DecodeError> {
    let trimmed = body.trim();
    let code: i64 = trimmed
        .parse()
        .map_err(|_| DecodeError::MalformedStatusBody(trimmed.to_string()))?;
    Status::from_wire_code(code)
}
