//! `envseal open`: verify an envelope and recover its payload.

use std::path::PathBuf;

use anyhow::Context;
use tracing::info;

use envseal_core::Config;
use envseal_crypto::{EnvelopeVerifier, ReceiverKeys};

use crate::output::{opened_file_name, resolve_output, write_atomically};

#[derive(clap::Args, Debug)]
pub struct OpenArgs {
    /// Envelope document to verify.
    pub input: PathBuf,

    /// Where to write the payload (default: `<input-name>.encdata`).
    #[arg(short, long)]
    pub out: Option<PathBuf>,

    /// Receiver's private key (PKCS#1 PEM).
    #[arg(long, env = "ENVSEAL_RECEIVER_PRIVATE_KEY")]
    pub decryption_key: Option<PathBuf>,

    /// Sender's public key (PKIX PEM).
    #[arg(long, env = "ENVSEAL_SENDER_PUBLIC_KEY")]
    pub sender_key: Option<PathBuf>,
}

/// Verify `args.input` and write the payload, returning its path.
///
/// Nothing is written unless the signature and digest both check out.
pub fn run(args: &OpenArgs, config: &Config) -> anyhow::Result<PathBuf> {
    info!(input = %args.input.display(), "Opening envelope");

    let document = std::fs::read_to_string(&args.input)
        .with_context(|| format!("Failed to read envelope {}", args.input.display()))?;

    let keys = ReceiverKeys::load(
        args.decryption_key
            .as_deref()
            .unwrap_or(&config.keys.receiver_private_key),
        args.sender_key
            .as_deref()
            .unwrap_or(&config.keys.sender_public_key),
    )?;
    let opened = EnvelopeVerifier::new(keys).open(&document)?;

    let out = resolve_output(args.out.as_deref(), opened_file_name(&args.input)?);
    write_atomically(&out, &opened.payload)?;

    info!(
        id = %opened.envelope.data.id,
        format = %opened.envelope.data.format,
        bytes = opened.payload.len(),
        output = %out.display(),
        "Envelope verified: payload was not modified"
    );
    Ok(out)
}
