//! Envelope construction.
//!
//! The content digest is encrypted for the receiver so only they can read
//! it; the encrypted digest is then signed by the sender so the receiver can
//! tell who produced it. The plain digest goes to the ledger for key-less
//! checks.

use base64::{Engine, engine::general_purpose::STANDARD};
use rand::rngs::OsRng;
use rsa::{Pkcs1v15Encrypt, Pkcs1v15Sign};
use sha1::Sha1;
use tracing::{debug, info};
use uuid::Uuid;

use crate::digest::{DIGEST_ALGORITHM, canonicalize, content_digest, sha1_of};
use crate::envelope::{Envelope, PayloadRecord};
use crate::error::CryptoError;
use crate::keys::SenderKeys;
use crate::ledger::{DigestLedger, LedgerEntry};

/// Format tag used when none is configured.
pub const DEFAULT_FORMAT: &str = "CSV";

/// Output of a successful build.
#[derive(Debug, Clone)]
pub struct SealedEnvelope {
    pub envelope: Envelope,
    /// Serialized envelope document.
    pub document: String,
    /// The entry recorded in the ledger.
    pub entry: LedgerEntry,
}

/// Builds envelopes on behalf of the sender.
#[derive(Debug)]
pub struct EnvelopeBuilder {
    keys: SenderKeys,
    ledger: DigestLedger,
    format: String,
}

impl EnvelopeBuilder {
    pub fn new(keys: SenderKeys, ledger: DigestLedger) -> Self {
        Self {
            keys,
            ledger,
            format: DEFAULT_FORMAT.to_string(),
        }
    }

    /// Set the payload format tag written into envelopes.
    #[must_use]
    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = format.into();
        self
    }

    pub const fn ledger(&self) -> &DigestLedger {
        &self.ledger
    }

    /// Build an envelope under a fresh random id and record it in the ledger.
    pub fn build(&self, payload: &[u8]) -> Result<SealedEnvelope, CryptoError> {
        self.build_with_id(&Uuid::new_v4().to_string(), payload)
    }

    /// Build an envelope under a caller-assigned id and record it.
    ///
    /// The ledger is only written after the document has been rendered, so a
    /// failed build leaves no trace.
    pub fn build_with_id(&self, id: &str, payload: &[u8]) -> Result<SealedEnvelope, CryptoError> {
        let sealed = self.seal(id, payload)?;
        self.ledger.append(&sealed.entry)?;
        info!(id = %sealed.entry.id, ledger = %self.ledger.path().display(), "Recorded envelope digest");
        Ok(sealed)
    }

    fn seal(&self, id: &str, payload: &[u8]) -> Result<SealedEnvelope, CryptoError> {
        let content = canonicalize(payload);
        let digest = content_digest(&content);
        info!(%id, %digest, "Computed payload digest");

        let encrypted = self
            .keys
            .receiver_key()
            .encrypt(&mut OsRng, Pkcs1v15Encrypt, digest.as_bytes())
            .map_err(|e| CryptoError::EncryptionFailed(e.to_string()))?;
        let encrypted_digest = STANDARD.encode(encrypted);
        debug!(%id, %encrypted_digest, "Encrypted digest for receiver");

        let signature = self
            .keys
            .signing_key()
            .sign(Pkcs1v15Sign::new::<Sha1>(), &sha1_of(&encrypted_digest))
            .map_err(|e| CryptoError::SigningFailed(e.to_string()))?;
        let signature = STANDARD.encode(signature);
        debug!(%id, %signature, "Signed encrypted digest");

        let envelope = Envelope {
            digest_algorithm: DIGEST_ALGORITHM.to_string(),
            encrypted_digest,
            signature,
            data: PayloadRecord {
                id: id.to_string(),
                format: self.format.clone(),
                content,
            },
        };
        let document = envelope.to_document()?;

        Ok(SealedEnvelope {
            envelope,
            document,
            entry: LedgerEntry::new(id, digest),
        })
    }
}
