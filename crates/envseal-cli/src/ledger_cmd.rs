//! `envseal ledger`: list recorded digests.
//!
//! User-facing output uses writeln! to stdout (this is a CLI binary, not debug output).

use std::io::{self, Write};

use envseal_core::Config;
use envseal_crypto::DigestLedger;

/// Print every ledger entry as `id,digest`; returns the entry count.
pub fn run(config: &Config) -> anyhow::Result<usize> {
    let entries = DigestLedger::new(config.ledger.path.clone()).entries()?;
    let mut out = io::stdout().lock();
    for entry in &entries {
        writeln!(out, "{},{}", entry.id, entry.digest)?;
    }
    Ok(entries.len())
}
