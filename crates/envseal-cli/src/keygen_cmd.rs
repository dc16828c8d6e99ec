//! `envseal keygen`: provision an RSA key pair.

use std::path::PathBuf;

use tracing::info;

use envseal_crypto::fingerprint_of;
use envseal_crypto::keys::{generate_keypair, save_keypair};

#[derive(clap::Args, Debug)]
pub struct KeygenArgs {
    /// Base name of the key files (`<name>.pem`, `<name>.pub`).
    pub name: String,

    /// Directory to write the key files into.
    #[arg(long, default_value = ".")]
    pub dir: PathBuf,

    /// RSA modulus size in bits.
    #[arg(long, default_value_t = 2048)]
    pub bits: usize,
}

/// Generate and save a key pair, returning (private, public) paths.
pub fn run(args: &KeygenArgs) -> anyhow::Result<(PathBuf, PathBuf)> {
    let key = generate_keypair(args.bits)?;
    let (private_path, public_path) = save_keypair(&key, &args.dir, &args.name)?;
    info!(
        private_key = %private_path.display(),
        public_key = %public_path.display(),
        fingerprint = %fingerprint_of(&key.to_public_key()),
        "Generated key pair"
    );
    Ok((private_path, public_path))
}
