//! `envseal seal`: build an envelope and record its digest.

use std::path::PathBuf;

use anyhow::Context;
use tracing::info;

use envseal_core::Config;
use envseal_crypto::{DigestLedger, EnvelopeBuilder, LedgerEntry, SenderKeys};

use crate::output::{resolve_output, sealed_file_name, write_atomically};

#[derive(clap::Args, Debug)]
pub struct SealArgs {
    /// Payload file to seal.
    pub input: PathBuf,

    /// Where to write the envelope (default: `M<input-name>.xml`).
    #[arg(short, long)]
    pub out: Option<PathBuf>,

    /// Sender's private key (PKCS#1 PEM).
    #[arg(long, env = "ENVSEAL_SENDER_PRIVATE_KEY")]
    pub signing_key: Option<PathBuf>,

    /// Receiver's public key (PKIX PEM).
    #[arg(long, env = "ENVSEAL_RECEIVER_PUBLIC_KEY")]
    pub recipient_key: Option<PathBuf>,

    /// Payload format tag written into the envelope.
    #[arg(long)]
    pub format: Option<String>,
}

/// Seal `args.input`, returning the envelope path and the recorded entry.
pub fn run(args: &SealArgs, config: &Config) -> anyhow::Result<(PathBuf, LedgerEntry)> {
    info!(input = %args.input.display(), "Sealing file");

    let payload = std::fs::read(&args.input)
        .with_context(|| format!("Failed to read payload {}", args.input.display()))?;

    let keys = SenderKeys::load(
        args.signing_key
            .as_deref()
            .unwrap_or(&config.keys.sender_private_key),
        args.recipient_key
            .as_deref()
            .unwrap_or(&config.keys.receiver_public_key),
    )?;
    let format = args.format.as_deref().unwrap_or(&config.payload_format);
    let builder =
        EnvelopeBuilder::new(keys, DigestLedger::new(config.ledger.path.clone())).with_format(format);

    let out = resolve_output(args.out.as_deref(), sealed_file_name(&args.input)?);
    let sealed = builder.build(&payload)?;
    write_atomically(&out, sealed.document.as_bytes())?;

    info!(
        id = %sealed.entry.id,
        digest = %sealed.entry.digest,
        envelope = %out.display(),
        "File sealed"
    );
    Ok((out, sealed.entry))
}
