//! # CLI Interface
//!
//! Defines the command-line argument structure for `vouch-device` using
//! `clap` derive. Supports three subcommands: `run`, `status`, and
//! `version`. Every flag can also come from a `VOUCH_*` environment
//! variable; flags override the settings file.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::logging::LogFormat;

/// Vouch device client.
///
/// Waits for the next transaction that needs a human's say-so, shows it,
/// and sends back a signed, encrypted approve or deny.
#[derive(Parser, Debug)]
#[command(
    name = "vouch-device",
    about = "Vouch device client",
    version,
    propagate_version = true
)]
pub struct VouchCli {
    /// Path to the settings file (TOML).
    ///
    /// When omitted, `config.toml` next to the executable is used, then
    /// `~/.config/vouch/config.toml`.
    #[arg(long, short = 'c', env = "VOUCH_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Log output format. Logs always go to stderr.
    #[arg(long, env = "VOUCH_LOG_FORMAT", value_enum, default_value_t = LogFormat::Pretty, global = true)]
    pub log_format: LogFormat,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands for the device binary.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Wait for a pending transaction, ask for a decision and submit it.
    Run(RunArgs),
    /// Ask the server for the status of a transaction.
    Status(StatusArgs),
    /// Print version information and exit.
    Version,
}

/// Arguments for the `run` subcommand.
#[derive(Parser, Debug, Default)]
pub struct RunArgs {
    /// Base URL of the server API.
    #[arg(long, env = "VOUCH_BASE_URL")]
    pub base_url: Option<String>,

    /// Device id registered with the server.
    #[arg(long, env = "VOUCH_DEVICE_ID")]
    pub device_id: Option<u32>,

    /// Seconds between polls while no transaction is pending.
    #[arg(long, env = "VOUCH_POLL_INTERVAL_SECS")]
    pub poll_interval_secs: Option<u64>,

    /// Give up after this many polls.
    #[arg(long, env = "VOUCH_MAX_POLLS")]
    pub max_polls: Option<u32>,

    /// Keep polling through timeouts and server errors on fetch.
    #[arg(long, env = "VOUCH_RETRY_TRANSIENT_FETCH")]
    pub retry_transient_fetch: bool,

    /// Directory holding the four key files.
    #[arg(long, env = "VOUCH_KEY_DIR")]
    pub key_dir: Option<PathBuf>,
}

/// Arguments for the `status` subcommand.
#[derive(Parser, Debug)]
pub struct StatusArgs {
    /// Transaction id to look up.
    pub transaction_id: u64,

    /// Base URL of the server API. Skips the settings file when given.
    #[arg(long, env = "VOUCH_BASE_URL")]
    pub base_url: Option<String>,
}
