//! `envseal check`: key-less integrity check against the local ledger.
//!
//! User-facing output uses writeln! to stdout (this is a CLI binary, not debug output).

use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::Context;

use envseal_core::Config;
use envseal_crypto::{DigestLedger, MatchResult, check_integrity};

#[derive(clap::Args, Debug)]
pub struct CheckArgs {
    /// Record id printed when the payload was sealed.
    #[arg(long)]
    pub id: String,

    /// Candidate payload file.
    pub input: PathBuf,
}

/// Run the check and report the outcome on stdout.
pub fn run(args: &CheckArgs, config: &Config) -> anyhow::Result<MatchResult> {
    let payload = std::fs::read(&args.input)
        .with_context(|| format!("Failed to read payload {}", args.input.display()))?;
    let ledger = DigestLedger::new(config.ledger.path.clone());
    let result = check_integrity(&ledger, &args.id, &payload);

    let mut out = io::stdout().lock();
    writeln!(out, "{}: {result}", args.id.trim())?;
    Ok(result)
}
