//! The two parties of an authorization: the device (us) and the server.
//!
//! Both own their key handles for the lifetime of the process and are
//! handed to the authorization client at construction. Nothing here is
//! global.

use std::fmt;

use super::types::TransactionError;
use crate::crypto::CryptoProvider;

/// The human-held approver: an id registered with the server plus the two
/// private keys that go with it.
pub struct Device<C: CryptoProvider> {
    id: u32,
    decryption_key: C::DecryptionKey,
    signing_key: C::SigningKey,
}

impl<C: CryptoProvider> Device<C> {
    pub fn new(
        id: u32,
        signing_key: C::SigningKey,
        decryption_key: C::DecryptionKey,
    ) -> Result<Self, TransactionError> {
        if id == 0 {
            return Err(TransactionError::InvalidDeviceId);
        }
        Ok(Self {
            id,
            decryption_key,
            signing_key,
        })
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn decryption_key(&self) -> &C::DecryptionKey {
        &self.decryption_key
    }

    pub fn signing_key(&self) -> &C::SigningKey {
        &self.signing_key
    }
}

impl<C: CryptoProvider> fmt::Debug for Device<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Device").field("id", &self.id).finish_non_exhaustive()
    }
}

/// The remote authority: where it lives and the two public keys we trust
/// it with.
pub struct Server<C: CryptoProvider> {
    api_url: String,
    verifying_key: C::VerifyingKey,
    encryption_key: C::EncryptionKey,
}

impl<C: CryptoProvider> Server<C> {
    pub fn new(
        api_url: impl Into<String>,
        verifying_key: C::VerifyingKey,
        encryption_key: C::EncryptionKey,
    ) -> Self {
        Self {
            api_url: api_url.into(),
            verifying_key,
            encryption_key,
        }
    }

    /// Base URL of the API, e.g. `http://localhost:8000`.
    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    pub fn verifying_key(&self) -> &C::VerifyingKey {
        &self.verifying_key
    }

    pub fn encryption_key(&self) -> &C::EncryptionKey {
        &self.encryption_key
    }
}

impl<C: CryptoProvider> fmt::Debug for Server<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Server")
            .field("api_url", &self.api_url)
            .finish_non_exhaustive()
    }
}
