// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Vouch Device
//!
//! Entry point for the `vouch-device` binary. Parses CLI arguments,
//! initializes logging, loads settings and keys, and runs one
//! authorization from poll to confirmation.
//!
//! The binary supports three subcommands:
//!
//! - `run`     -- wait for a pending transaction and decide on it
//! - `status`  -- print the server-side status of a transaction
//! - `version` -- print build version information
//!
//! Exit codes: 0 on success, 2 for setup problems (settings, keys,
//! endpoint), and one code per [`ErrorKind`] for failures of the
//! authorization itself.

mod cli;
mod logging;
mod prompt;
mod settings;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::Instrument;
use uuid::Uuid;

use vouch_protocol::authz::{AuthError, AuthorizationClient, ErrorKind};
use vouch_protocol::crypto::StandardCrypto;
use vouch_protocol::remote::{HttpRemote, HttpRemoteConfig, RemoteService};
use vouch_protocol::transaction::{Device, Server};

use cli::{Commands, RunArgs, StatusArgs, VouchCli};
use prompt::TerminalPrompt;
use settings::Settings;

/// Settings, keys or endpoint unusable; nothing was attempted.
const EXIT_SETUP: u8 = 2;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = VouchCli::parse();

    if let Commands::Version = cli.command {
        print_version();
        return ExitCode::SUCCESS;
    }

    logging::init_logging(logging::DEFAULT_FILTER, cli.log_format);
    let run_id = Uuid::new_v4();
    let span = tracing::info_span!("vouch", run_id = %run_id);

    let result = match cli.command {
        Commands::Run(args) => run_device(cli.config, args).instrument(span).await,
        Commands::Status(args) => query_status(cli.config, args).instrument(span).await,
        Commands::Version => Ok(()),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let code = match err.downcast_ref::<AuthError>() {
                Some(auth) => exit_code(auth.kind()),
                None => EXIT_SETUP,
            };
            tracing::error!(%run_id, exit_code = code, "{:#}", err);
            eprintln!("error: {:#}", err);
            ExitCode::from(code)
        }
    }
}

/// One distinct, stable exit code per failure kind.
fn exit_code(kind: ErrorKind) -> u8 {
    match kind {
        ErrorKind::Crypto => 10,
        ErrorKind::Signature => 11,
        ErrorKind::Decode => 12,
        ErrorKind::Network => 13,
        ErrorKind::Submission => 14,
        ErrorKind::InvalidInput => 15,
        ErrorKind::Prompt => 16,
        ErrorKind::PollLimitExceeded => 17,
        ErrorKind::Transition => 18,
        ErrorKind::InvalidState => 19,
    }
}

fn load_settings(explicit: Option<PathBuf>) -> Result<Settings> {
    let path = settings::discover(explicit.as_deref())?;
    tracing::info!(path = %path.display(), "loading settings");
    Settings::load(&path).with_context(|| format!("loading settings from {}", path.display()))
}

/// Poll, decide, submit, confirm.
async fn run_device(config: Option<PathBuf>, args: RunArgs) -> Result<()> {
    let mut settings = load_settings(config)?;
    apply_overrides(&mut settings, args)?;
    settings.validate()?;

    let keys = settings.load_keys()?;
    let device = Device::<StandardCrypto>::new(settings.device_id, keys.device_sign, keys.device_decrypt)?;
    let server = Server::new(settings.base_url.clone(), keys.server_verify, keys.server_encrypt);
    let remote = HttpRemote::new(settings.remote_config())
        .with_context(|| format!("configuring server endpoint {}", settings.base_url))?;

    tracing::info!(
        device_id = settings.device_id,
        base_url = %settings.base_url,
        poll_interval_secs = settings.poll_interval_secs,
        max_polls = ?settings.max_polls,
        "device ready"
    );

    let mut client = AuthorizationClient::new(
        StandardCrypto,
        device,
        server,
        remote,
        TerminalPrompt::stdio(),
        settings.client_config(),
    );

    println!("Looking for a new transaction...");
    let outcome = client.run().await?;
    println!("Status is now {}", outcome.confirmed_status);
    Ok(())
}

/// Flags and `VOUCH_*` variables win over the settings file.
fn apply_overrides(settings: &mut Settings, args: RunArgs) -> Result<()> {
    if let Some(base_url) = args.base_url {
        settings.base_url = base_url;
    }
    if let Some(device_id) = args.device_id {
        settings.device_id = device_id;
    }
    if let Some(secs) = args.poll_interval_secs {
        settings.poll_interval_secs = secs;
    }
    if let Some(max_polls) = args.max_polls {
        settings.max_polls = Some(max_polls);
    }
    if args.retry_transient_fetch {
        settings.retry_transient_fetch = true;
    }
    if let Some(dir) = args.key_dir {
        let dir = if dir.is_absolute() {
            dir
        } else {
            std::env::current_dir()
                .context("resolving --key-dir")?
                .join(dir)
        };
        settings.key_dir = Some(dir);
    }
    Ok(())
}

/// Prints the server-side status of one transaction.
async fn query_status(config: Option<PathBuf>, args: StatusArgs) -> Result<()> {
    let remote_config = match args.base_url {
        Some(base_url) => HttpRemoteConfig::new(base_url),
        None => {
            let settings = load_settings(config)?;
            anyhow::ensure!(
                !settings.base_url.trim().is_empty(),
                "no base_url in the settings file; pass --base-url"
            );
            settings.remote_config()
        }
    };
    let remote = HttpRemote::new(remote_config)?;

    let status = remote
        .query_status(args.transaction_id)
        .await
        .map_err(AuthError::from)?;
    println!("{}", status);
    Ok(())
}

/// Prints version information to stdout.
fn print_version() {
    println!("vouch-device {}", env!("CARGO_PKG_VERSION"));
    println!("wire format  v{}", vouch_protocol::config::WIRE_FORMAT_VERSION);
}
