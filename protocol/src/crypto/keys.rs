//! # Key Handles
//!
//! Opaque handles over the four pieces of key material the protocol needs:
//!
//! | Handle                | Held by | Purpose                                   |
//! |-----------------------|---------|-------------------------------------------|
//! | [`SigningKeyHandle`]    | device  | sign sealed decisions (Ed25519)           |
//! | [`VerifyingKeyHandle`]  | device  | verify server-signed ciphertext (Ed25519) |
//! | [`EncryptionKeyHandle`] | device  | encrypt decisions to the server (X25519)  |
//! | [`DecryptionKeyHandle`] | device  | decrypt server payloads (X25519)          |
//!
//! Key material is provisioned out of band. This module only *loads* it:
//! every key is 32 raw bytes, stored hex-encoded in its own file. Generating
//! or rotating keys is somebody else's job.
//!
//! ## Security considerations
//!
//! - Secret handles never print key material in `Debug` output.
//! - Both dalek crates zeroize secret scalars on drop.
//! - Key bytes are never logged. If you add logging to this module,
//!   you will be asked to leave.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use ed25519_dalek::{SigningKey, VerifyingKey};
use thiserror::Error;
use x25519_dalek::{PublicKey, StaticSecret};

use crate::config::{SIGNING_KEY_LENGTH, VERIFYING_KEY_LENGTH, X25519_KEY_LENGTH};

/// Errors that can occur while loading key material.
///
/// These are intentionally vague about the key bytes themselves; only the
/// file path and the shape of the problem are reported.
#[derive(Debug, Error)]
pub enum KeyError {
    #[error("failed to read key material from {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("key material is not valid hex")]
    InvalidHex,

    #[error("invalid key length: expected {expected} bytes, got {got}")]
    InvalidLength { expected: usize, got: usize },

    #[error("invalid public key bytes: not a valid Ed25519 point")]
    InvalidPublicKey,
}

/// Decode a hex string (surrounding whitespace ignored) into exactly
/// `N` bytes.
fn decode_fixed<const N: usize>(hex_str: &str) -> Result<[u8; N], KeyError> {
    let bytes = hex::decode(hex_str.trim()).map_err(|_| KeyError::InvalidHex)?;
    bytes
        .as_slice()
        .try_into()
        .map_err(|_| KeyError::InvalidLength {
            expected: N,
            got: bytes.len(),
        })
}

fn read_fixed<const N: usize>(path: &Path) -> Result<[u8; N], KeyError> {
    let contents = fs::read_to_string(path).map_err(|source| KeyError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    decode_fixed(&contents)
}

// ---------------------------------------------------------------------------
// Ed25519
// ---------------------------------------------------------------------------

/// Private Ed25519 key used to sign outbound ciphertext.
pub struct SigningKeyHandle {
    signing_key: SigningKey,
}

/// Public Ed25519 key used to check signatures.
#[derive(Clone, PartialEq, Eq)]
pub struct VerifyingKeyHandle {
    verifying_key: VerifyingKey,
}

impl SigningKeyHandle {
    /// Wrap raw 32-byte secret key material. In Ed25519 the secret key *is*
    /// the seed, so every 32-byte value is acceptable.
    pub fn from_bytes(bytes: &[u8; SIGNING_KEY_LENGTH]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(bytes),
        }
    }

    /// Parse a hex-encoded secret key.
    pub fn from_hex(hex_str: &str) -> Result<Self, KeyError> {
        Ok(Self::from_bytes(&decode_fixed(hex_str)?))
    }

    /// Load a hex-encoded secret key from a file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, KeyError> {
        Ok(Self::from_bytes(&read_fixed(path.as_ref())?))
    }

    /// The public half of this key.
    pub fn verifying_key(&self) -> VerifyingKeyHandle {
        VerifyingKeyHandle {
            verifying_key: self.signing_key.verifying_key(),
        }
    }

    pub(crate) fn inner(&self) -> &SigningKey {
        &self.signing_key
    }
}

impl fmt::Debug for SigningKeyHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SigningKeyHandle(pub={})", self.verifying_key().to_hex())
    }
}

impl VerifyingKeyHandle {
    /// Validate and wrap a 32-byte compressed Edwards point.
    pub fn from_bytes(bytes: &[u8; VERIFYING_KEY_LENGTH]) -> Result<Self, KeyError> {
        let verifying_key =
            VerifyingKey::from_bytes(bytes).map_err(|_| KeyError::InvalidPublicKey)?;
        Ok(Self { verifying_key })
    }

    pub fn from_hex(hex_str: &str) -> Result<Self, KeyError> {
        Self::from_bytes(&decode_fixed(hex_str)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, KeyError> {
        Self::from_bytes(&read_fixed(path.as_ref())?)
    }

    /// Hex-encoded representation. 64 characters for 32 bytes.
    pub fn to_hex(&self) -> String {
        hex::encode(self.verifying_key.to_bytes())
    }

    pub(crate) fn inner(&self) -> &VerifyingKey {
        &self.verifying_key
    }
}

impl fmt::Debug for VerifyingKeyHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VerifyingKeyHandle({})", &self.to_hex()[..16])
    }
}

// ---------------------------------------------------------------------------
// X25519
// ---------------------------------------------------------------------------

/// Recipient's static X25519 public key; payloads sealed to it can only be
/// opened by the matching [`DecryptionKeyHandle`].
#[derive(Clone, PartialEq, Eq)]
pub struct EncryptionKeyHandle {
    public_key: PublicKey,
}

/// Static X25519 secret used to open sealed payloads addressed to us.
pub struct DecryptionKeyHandle {
    secret: StaticSecret,
}

impl EncryptionKeyHandle {
    /// Every 32-byte string is a valid Montgomery u-coordinate, so this
    /// cannot fail. Degenerate (low-order) keys are caught at seal time.
    pub fn from_bytes(bytes: [u8; X25519_KEY_LENGTH]) -> Self {
        Self {
            public_key: PublicKey::from(bytes),
        }
    }

    pub fn from_hex(hex_str: &str) -> Result<Self, KeyError> {
        Ok(Self::from_bytes(decode_fixed(hex_str)?))
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, KeyError> {
        Ok(Self::from_bytes(read_fixed(path.as_ref())?))
    }

    pub fn as_bytes(&self) -> &[u8; X25519_KEY_LENGTH] {
        self.public_key.as_bytes()
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.public_key.as_bytes())
    }

    pub(crate) fn inner(&self) -> &PublicKey {
        &self.public_key
    }
}

impl fmt::Debug for EncryptionKeyHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EncryptionKeyHandle({})", &self.to_hex()[..16])
    }
}

impl DecryptionKeyHandle {
    pub fn from_bytes(bytes: [u8; X25519_KEY_LENGTH]) -> Self {
        Self {
            secret: StaticSecret::from(bytes),
        }
    }

    pub fn from_hex(hex_str: &str) -> Result<Self, KeyError> {
        Ok(Self::from_bytes(decode_fixed(hex_str)?))
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, KeyError> {
        Ok(Self::from_bytes(read_fixed(path.as_ref())?))
    }

    /// The public key peers use to seal payloads to us.
    pub fn encryption_key(&self) -> EncryptionKeyHandle {
        EncryptionKeyHandle {
            public_key: PublicKey::from(&self.secret),
        }
    }

    pub(crate) fn inner(&self) -> &StaticSecret {
        &self.secret
    }
}

impl fmt::Debug for DecryptionKeyHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "DecryptionKeyHandle(pub={})",
            &self.encryption_key().to_hex()[..16]
        )
    }
}
