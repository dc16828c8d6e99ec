//! envseal CLI
//!
//! Seal payloads into signed envelopes, open them on the receiving side,
//! and re-check payloads against the digest ledger.
//!
//! User-facing output uses writeln! to stdout (this is a CLI binary, not debug output).

use std::io::{self, Write};
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::error;

use envseal_cli::check_cmd::{self, CheckArgs};
use envseal_cli::keygen_cmd::{self, KeygenArgs};
use envseal_cli::ledger_cmd;
use envseal_cli::open_cmd::{self, OpenArgs};
use envseal_cli::seal_cmd::{self, SealArgs};
use envseal_core::config::load_config;
use envseal_core::tracing_init::init_tracing;
use envseal_crypto::fingerprint_of;
use envseal_crypto::keys::load_public_key;

#[derive(Parser, Debug)]
#[command(name = "envseal")]
#[command(version, about = "Sign, encrypt and verify data envelopes", long_about = None)]
struct Cli {
    /// JSON settings file
    #[arg(long, global = true, env = "ENVSEAL_CONFIG")]
    config: Option<PathBuf>,

    /// Digest ledger path (overrides config)
    #[arg(long, global = true)]
    ledger: Option<PathBuf>,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Seal a payload into an envelope and record its digest
    Seal(SealArgs),
    /// Verify an envelope and extract its payload
    Open(OpenArgs),
    /// Check a payload against the digest ledger
    Check(CheckArgs),
    /// Generate an RSA key pair
    Keygen(KeygenArgs),
    /// List ledger entries
    Ledger,
    /// Print the fingerprint of a public key
    Fingerprint {
        /// Public key file (PKIX PEM)
        key: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();
    init_tracing("envseal=info", cli.log_json);

    match run(cli) {
        Ok(true) => {}
        Ok(false) => std::process::exit(2),
        Err(e) => {
            error!(error = %format!("{e:#}"), "Command failed");
            std::process::exit(1);
        }
    }
}

/// Returns `Ok(false)` when a check ran but did not succeed.
fn run(cli: Cli) -> anyhow::Result<bool> {
    let mut config = load_config(cli.config.as_deref())?;
    if let Some(ledger) = cli.ledger {
        config.ledger.path = ledger;
    }

    let mut out = io::stdout().lock();
    match cli.command {
        Command::Seal(args) => {
            let (path, entry) = seal_cmd::run(&args, &config)?;
            writeln!(out, "id:       {}", entry.id)?;
            writeln!(out, "envelope: {}", path.display())?;
        }
        Command::Open(args) => {
            let path = open_cmd::run(&args, &config)?;
            writeln!(out, "{}", path.display())?;
        }
        Command::Check(args) => {
            drop(out);
            return Ok(check_cmd::run(&args, &config)?.is_success());
        }
        Command::Keygen(args) => {
            let (private_path, public_path) = keygen_cmd::run(&args)?;
            writeln!(out, "private key: {}", private_path.display())?;
            writeln!(out, "public key:  {}", public_path.display())?;
        }
        Command::Ledger => {
            drop(out);
            ledger_cmd::run(&config)?;
        }
        Command::Fingerprint { key } => {
            writeln!(out, "{}", fingerprint_of(&load_public_key(&key)?))?;
        }
    }
    Ok(true)
}
