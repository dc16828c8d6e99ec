//! Configuration resolution for envseal.
//!
//! Implements hierarchical config resolution:
//! 1. Built-in defaults
//! 2. Settings file (JSON, passed with `--config`)
//! 3. Environment variables (`ENVSEAL_*`)
//! 4. CLI arguments (applied by each binary, highest priority)
//!
//! The resolved [`Config`] is handed to each component at construction time;
//! nothing in the workspace reads paths from global state.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{Error, Result};

/// Default upload cap for the verification service (32 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 32 << 20;

/// Default payload format tag embedded in envelopes.
pub const DEFAULT_PAYLOAD_FORMAT: &str = "CSV";

/// Complete envseal configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Config {
    #[serde(default)]
    pub keys: KeyPaths,
    #[serde(default)]
    pub ledger: LedgerConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default = "default_payload_format")]
    pub payload_format: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            keys: KeyPaths::default(),
            ledger: LedgerConfig::default(),
            server: ServerConfig::default(),
            payload_format: default_payload_format(),
        }
    }
}

fn default_payload_format() -> String {
    DEFAULT_PAYLOAD_FORMAT.to_string()
}

/// PEM key file locations for the four key roles.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct KeyPaths {
    /// Sender's own private key (PKCS#1 PEM), used to sign.
    pub sender_private_key: PathBuf,
    /// Receiver's public key (PKIX PEM), used to encrypt the digest.
    pub receiver_public_key: PathBuf,
    /// Receiver's own private key (PKCS#1 PEM), used to decrypt the digest.
    pub receiver_private_key: PathBuf,
    /// Sender's public key (PKIX PEM), used to check the signature.
    pub sender_public_key: PathBuf,
}

impl Default for KeyPaths {
    fn default() -> Self {
        Self {
            sender_private_key: PathBuf::from("ups_rsa.pem"),
            receiver_public_key: PathBuf::from("mykey.pub"),
            receiver_private_key: PathBuf::from("mykey.pem"),
            sender_public_key: PathBuf::from("ups_rsa.pub"),
        }
    }
}

/// Digest ledger location.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LedgerConfig {
    pub path: PathBuf,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("dataSums.store"),
        }
    }
}

/// Verification service settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ServerConfig {
    pub addr: SocketAddr,
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

/// Load configuration with hierarchical resolution.
///
/// An explicitly named settings file must exist; with `None` the built-in
/// defaults are the base.
pub fn load_config(settings_file: Option<&Path>) -> Result<Config> {
    let mut config = match settings_file {
        Some(path) => load_config_file(path)?,
        None => Config::default(),
    };
    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    Ok(config)
}

fn load_config_file(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::Config(format!("Failed to read config file {}: {}", path.display(), e))
    })?;
    serde_json::from_str(&content).map_err(|e| {
        Error::Config(format!("Failed to parse config file {}: {}", path.display(), e))
    })
}

/// Apply `ENVSEAL_*` overrides using `lookup` to read variables.
///
/// Unparsable numeric or address values are logged and ignored.
pub fn apply_env_overrides(config: &mut Config, lookup: impl Fn(&str) -> Option<String>) {
    let paths = [
        ("ENVSEAL_SENDER_PRIVATE_KEY", &mut config.keys.sender_private_key),
        ("ENVSEAL_RECEIVER_PUBLIC_KEY", &mut config.keys.receiver_public_key),
        ("ENVSEAL_RECEIVER_PRIVATE_KEY", &mut config.keys.receiver_private_key),
        ("ENVSEAL_SENDER_PUBLIC_KEY", &mut config.keys.sender_public_key),
        ("ENVSEAL_LEDGER_PATH", &mut config.ledger.path),
    ];
    for (key, slot) in paths {
        if let Some(val) = lookup(key) {
            *slot = PathBuf::from(val);
        }
    }

    if let Some(val) = lookup("ENVSEAL_LISTEN_ADDR") {
        match val.parse() {
            Ok(addr) => config.server.addr = addr,
            Err(e) => warn!(value = %val, error = %e, "Ignoring invalid ENVSEAL_LISTEN_ADDR"),
        }
    }
    if let Some(val) = lookup("ENVSEAL_MAX_UPLOAD_BYTES") {
        match val.parse() {
            Ok(n) => config.server.max_upload_bytes = n,
            Err(e) => warn!(value = %val, error = %e, "Ignoring invalid ENVSEAL_MAX_UPLOAD_BYTES"),
        }
    }
    if let Some(val) = lookup("ENVSEAL_PAYLOAD_FORMAT") {
        config.payload_format = val;
    }
}
