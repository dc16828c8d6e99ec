//! RSA key material for the four protocol roles.
//!
//! The sender holds its own private key plus the receiver's public key; the
//! receiver holds its own private key plus the sender's public key. Keys are
//! loaded once per process from PEM files and never mutated.

use std::path::{Path, PathBuf};

use rand::rngs::OsRng;
use rsa::pkcs1::{DecodeRsaPrivateKey, EncodeRsaPrivateKey, LineEnding};
use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePublicKey};
use rsa::traits::PublicKeyParts;
use rsa::{RsaPrivateKey, RsaPublicKey};
use zeroize::Zeroize;

use crate::error::CryptoError;

/// Smallest modulus accepted by [`generate_keypair`].
pub const MIN_KEY_BITS: usize = 1024;

/// Keys used by the envelope builder.
pub struct SenderKeys {
    signing_key: RsaPrivateKey,
    receiver_key: RsaPublicKey,
}

impl std::fmt::Debug for SenderKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SenderKeys")
            .field("signing_key", &"[REDACTED]")
            .field("signing_fingerprint", &fingerprint_of(&self.signing_key.to_public_key()))
            .field("receiver_fingerprint", &fingerprint_of(&self.receiver_key))
            .finish()
    }
}

impl SenderKeys {
    pub const fn new(signing_key: RsaPrivateKey, receiver_key: RsaPublicKey) -> Self {
        Self {
            signing_key,
            receiver_key,
        }
    }

    /// Load the sender's PKCS#1 private key and the receiver's PKIX public key.
    pub fn load(signing_key: &Path, receiver_key: &Path) -> Result<Self, CryptoError> {
        Ok(Self::new(
            load_private_key(signing_key)?,
            load_public_key(receiver_key)?,
        ))
    }

    pub const fn signing_key(&self) -> &RsaPrivateKey {
        &self.signing_key
    }

    pub const fn receiver_key(&self) -> &RsaPublicKey {
        &self.receiver_key
    }
}

/// Keys used by the envelope verifier.
pub struct ReceiverKeys {
    decryption_key: RsaPrivateKey,
    sender_key: RsaPublicKey,
}

impl std::fmt::Debug for ReceiverKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReceiverKeys")
            .field("decryption_key", &"[REDACTED]")
            .field(
                "decryption_fingerprint",
                &fingerprint_of(&self.decryption_key.to_public_key()),
            )
            .field("sender_fingerprint", &fingerprint_of(&self.sender_key))
            .finish()
    }
}

impl ReceiverKeys {
    pub const fn new(decryption_key: RsaPrivateKey, sender_key: RsaPublicKey) -> Self {
        Self {
            decryption_key,
            sender_key,
        }
    }

    /// Load the receiver's PKCS#1 private key and the sender's PKIX public key.
    pub fn load(decryption_key: &Path, sender_key: &Path) -> Result<Self, CryptoError> {
        Ok(Self::new(
            load_private_key(decryption_key)?,
            load_public_key(sender_key)?,
        ))
    }

    pub const fn decryption_key(&self) -> &RsaPrivateKey {
        &self.decryption_key
    }

    pub const fn sender_key(&self) -> &RsaPublicKey {
        &self.sender_key
    }
}

/// Parse an RSA private key from PEM text.
///
/// PKCS#1 (`RSA PRIVATE KEY`) is the expected container; PKCS#8
/// (`PRIVATE KEY`) is accepted as well.
pub fn parse_private_key_pem(pem: &str) -> Result<RsaPrivateKey, CryptoError> {
    RsaPrivateKey::from_pkcs1_pem(pem).or_else(|pkcs1_err| {
        RsaPrivateKey::from_pkcs8_pem(pem).map_err(|pkcs8_err| {
            CryptoError::KeyMaterial(format!(
                "not an RSA private key (pkcs1: {pkcs1_err}; pkcs8: {pkcs8_err})"
            ))
        })
    })
}

/// Parse an RSA public key from PKIX/SubjectPublicKeyInfo PEM text.
pub fn parse_public_key_pem(pem: &str) -> Result<RsaPublicKey, CryptoError> {
    RsaPublicKey::from_public_key_pem(pem)
        .map_err(|e| CryptoError::KeyMaterial(format!("not an RSA public key: {e}")))
}

/// Load a PEM private key file.
///
/// The PEM text is zeroized after parsing.
pub fn load_private_key(path: &Path) -> Result<RsaPrivateKey, CryptoError> {
    let mut pem = read_key_file(path)?;
    let result = parse_private_key_pem(&pem);
    pem.zeroize();
    result.map_err(|e| with_path(e, path))
}

/// Load a PEM public key file.
pub fn load_public_key(path: &Path) -> Result<RsaPublicKey, CryptoError> {
    let pem = read_key_file(path)?;
    parse_public_key_pem(&pem).map_err(|e| with_path(e, path))
}

fn read_key_file(path: &Path) -> Result<String, CryptoError> {
    std::fs::read_to_string(path).map_err(|e| {
        CryptoError::KeyMaterial(format!("cannot read key file {}: {e}", path.display()))
    })
}

fn with_path(err: CryptoError, path: &Path) -> CryptoError {
    match err {
        CryptoError::KeyMaterial(msg) => {
            CryptoError::KeyMaterial(format!("{}: {msg}", path.display()))
        }
        other => other,
    }
}

/// Generate a fresh RSA private key.
pub fn generate_keypair(bits: usize) -> Result<RsaPrivateKey, CryptoError> {
    if bits < MIN_KEY_BITS {
        return Err(CryptoError::KeyMaterial(format!(
            "key size {bits} is below the minimum of {MIN_KEY_BITS} bits"
        )));
    }
    RsaPrivateKey::new(&mut OsRng, bits).map_err(|e| CryptoError::KeyMaterial(e.to_string()))
}

/// Write `<name>.pem` (PKCS#1) and `<name>.pub` (PKIX) into `dir`.
///
/// The private key file gets owner-only permissions on Unix. Returns the
/// private and public key paths.
pub fn save_keypair(
    key: &RsaPrivateKey,
    dir: &Path,
    name: &str,
) -> Result<(PathBuf, PathBuf), CryptoError> {
    std::fs::create_dir_all(dir)?;
    let private_path = dir.join(format!("{name}.pem"));
    let public_path = dir.join(format!("{name}.pub"));

    let private_pem = key
        .to_pkcs1_pem(LineEnding::LF)
        .map_err(|e| CryptoError::KeyMaterial(e.to_string()))?;
    let public_pem = key
        .to_public_key()
        .to_public_key_pem(LineEnding::LF)
        .map_err(|e| CryptoError::KeyMaterial(e.to_string()))?;

    std::fs::write(&private_path, private_pem.as_bytes())?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&private_path, std::fs::Permissions::from_mode(0o600))?;
    }
    std::fs::write(&public_path, public_pem)?;

    Ok((private_path, public_path))
}

/// Colon-separated hex SHA-256 over the modulus and exponent of a public key.
pub fn fingerprint_of(key: &RsaPublicKey) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(key.n().to_bytes_be());
    hasher.update(key.e().to_bytes_be());
    hasher
        .finalize()
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect::<Vec<_>>()
        .join(":")
}
