//! Runtime settings and key material.
//!
//! A TOML file holds everything the device needs to talk to its server:
//!
//! ```toml
//! base_url = "http://localhost:8000"
//! device_id = 7
//! poll_interval_secs = 7
//! max_polls = 100            # optional, unbounded when absent
//! retry_transient_fetch = false
//! connect_timeout_secs = 10
//! request_timeout_secs = 30
//! key_dir = "keys"           # relative to this file; defaults to its directory
//! ```
//!
//! The key directory holds four hex files: `server_verify.key`,
//! `server_encrypt.key`, `device_decrypt.key` and `device_sign.key`.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use vouch_protocol::authz::ClientConfig;
use vouch_protocol::config::{
    DEFAULT_CONNECT_TIMEOUT, DEFAULT_POLL_INTERVAL, DEFAULT_REQUEST_TIMEOUT,
};
use vouch_protocol::crypto::{
    DecryptionKeyHandle, EncryptionKeyHandle, KeyError, SigningKeyHandle, VerifyingKeyHandle,
};
use vouch_protocol::remote::HttpRemoteConfig;

/// Name of the settings file looked up next to the executable and in the
/// user config directory.
pub const SETTINGS_FILE: &str = "config.toml";

pub const SERVER_VERIFY_KEY_FILE: &str = "server_verify.key";
pub const SERVER_ENCRYPT_KEY_FILE: &str = "server_encrypt.key";
pub const DEVICE_DECRYPT_KEY_FILE: &str = "device_decrypt.key";
pub const DEVICE_SIGN_KEY_FILE: &str = "device_sign.key";

/// Settings loading errors.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("no settings file found (looked in: {})", display_paths(.searched))]
    NotFound { searched: Vec<PathBuf> },

    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid settings: {0}")]
    Validation(String),

    #[error("failed to load {}: {source}", .path.display())]
    Key {
        path: PathBuf,
        #[source]
        source: KeyError,
    },
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// One layer of settings. `base_url` and `device_id` may be left out of
/// the file when the command line or environment supplies them; call
/// [`Settings::validate`] once every layer has been applied.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    #[serde(default)]
    pub base_url: String,
    #[serde(default)]
    pub device_id: u32,
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    #[serde(default)]
    pub max_polls: Option<u32>,
    #[serde(default)]
    pub retry_transient_fetch: bool,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default)]
    pub key_dir: Option<PathBuf>,

    /// Directory relative paths are resolved against.
    #[serde(skip)]
    base_dir: PathBuf,
}

fn default_poll_interval_secs() -> u64 {
    DEFAULT_POLL_INTERVAL.as_secs()
}

fn default_connect_timeout_secs() -> u64 {
    DEFAULT_CONNECT_TIMEOUT.as_secs()
}

fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT.as_secs()
}

/// The four keys a device needs, loaded from the key directory.
pub struct KeyRing {
    pub server_verify: VerifyingKeyHandle,
    pub server_encrypt: EncryptionKeyHandle,
    pub device_decrypt: DecryptionKeyHandle,
    pub device_sign: SigningKeyHandle,
}

/// Pick the settings file: the explicit path if given (it must exist),
/// otherwise the first candidate that does.
pub fn discover(explicit: Option<&Path>) -> Result<PathBuf, SettingsError> {
    discover_in(explicit, &default_candidates())
}

fn discover_in(explicit: Option<&Path>, candidates: &[PathBuf]) -> Result<PathBuf, SettingsError> {
    if let Some(path) = explicit {
        return if path.is_file() {
            Ok(path.to_path_buf())
        } else {
            Err(SettingsError::NotFound {
                searched: vec![path.to_path_buf()],
            })
        };
    }

    candidates
        .iter()
        .find(|path| path.is_file())
        .cloned()
        .ok_or_else(|| SettingsError::NotFound {
            searched: candidates.to_vec(),
        })
}

/// `config.toml` next to the executable, then `~/.config/vouch/config.toml`.
fn default_candidates() -> Vec<PathBuf> {
    let mut candidates = Vec::new();
    if let Some(exe_dir) = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
    {
        candidates.push(exe_dir.join(SETTINGS_FILE));
    }
    if let Some(home) = dirs::home_dir() {
        candidates.push(home.join(".config").join("vouch").join(SETTINGS_FILE));
    }
    candidates
}

impl Settings {
    /// Load a settings file without validating it. Relative paths inside it
    /// resolve against its directory.
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let content = fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        Self::from_toml(&content, base_dir).map_err(|err| match err {
            SettingsError::Parse { source, .. } => SettingsError::Parse {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        })
    }

    pub fn from_toml(content: &str, base_dir: impl Into<PathBuf>) -> Result<Self, SettingsError> {
        let mut settings: Settings =
            toml::from_str(content).map_err(|source| SettingsError::Parse {
                path: PathBuf::from("<inline>"),
                source,
            })?;
        settings.base_dir = base_dir.into();
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.base_url.trim().is_empty() {
            return Err(SettingsError::Validation("base_url is empty".into()));
        }
        if self.device_id == 0 {
            return Err(SettingsError::Validation(
                "device_id must be a positive integer".into(),
            ));
        }
        if self.poll_interval_secs == 0 {
            return Err(SettingsError::Validation(
                "poll_interval_secs must be at least 1".into(),
            ));
        }
        if self.max_polls == Some(0) {
            return Err(SettingsError::Validation(
                "max_polls must be at least 1 when set".into(),
            ));
        }
        if self.connect_timeout_secs == 0 || self.request_timeout_secs == 0 {
            return Err(SettingsError::Validation(
                "timeouts must be at least 1 second".into(),
            ));
        }
        Ok(())
    }

    /// Where the key files live.
    pub fn key_dir(&self) -> PathBuf {
        match &self.key_dir {
            Some(dir) if dir.is_absolute() => dir.clone(),
            Some(dir) => self.base_dir.join(dir),
            None => self.base_dir.clone(),
        }
    }

    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            poll_interval: Duration::from_secs(self.poll_interval_secs),
            max_poll_attempts: self.max_polls,
            retry_transient_fetch: self.retry_transient_fetch,
        }
    }

    pub fn remote_config(&self) -> HttpRemoteConfig {
        HttpRemoteConfig {
            base_url: self.base_url.clone(),
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
        }
    }

    pub fn load_keys(&self) -> Result<KeyRing, SettingsError> {
        let dir = self.key_dir();
        Ok(KeyRing {
            server_verify: load_key(&dir, SERVER_VERIFY_KEY_FILE, VerifyingKeyHandle::from_file)?,
            server_encrypt: load_key(&dir, SERVER_ENCRYPT_KEY_FILE, EncryptionKeyHandle::from_file)?,
            device_decrypt: load_key(&dir, DEVICE_DECRYPT_KEY_FILE, DecryptionKeyHandle::from_file)?,
            device_sign: load_key(&dir, DEVICE_SIGN_KEY_FILE, SigningKeyHandle::from_file)?,
        })
    }
}

fn load_key<K>(
    dir: &Path,
    file: &str,
    read: impl FnOnce(PathBuf) -> Result<K, KeyError>,
) -> Result<K, SettingsError> {
    let path = dir.join(file);
    read(path.clone()).map_err(|source| SettingsError::Key { path, source })
}
