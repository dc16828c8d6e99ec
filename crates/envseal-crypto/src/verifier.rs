//! Envelope verification.
//!
//! Order matters: the signature over the encrypted digest is checked first,
//! and nothing is decrypted unless it holds. An unauthenticated digest says
//! nothing about the payload.

use base64::{Engine, engine::general_purpose::STANDARD};
use rsa::{Pkcs1v15Encrypt, Pkcs1v15Sign};
use sha1::Sha1;
use tracing::{debug, info, warn};

use crate::digest::{constant_time_str_eq, content_digest, sha1_of};
use crate::envelope::Envelope;
use crate::error::CryptoError;
use crate::keys::ReceiverKeys;

/// A verified envelope and the payload it carried.
#[derive(Debug, Clone)]
pub struct OpenedEnvelope {
    pub envelope: Envelope,
    /// Original payload bytes (whitespace-trimmed at build time).
    pub payload: Vec<u8>,
}

/// Verifies envelopes on behalf of the receiver.
#[derive(Debug)]
pub struct EnvelopeVerifier {
    keys: ReceiverKeys,
}

impl EnvelopeVerifier {
    pub const fn new(keys: ReceiverKeys) -> Self {
        Self { keys }
    }

    /// Verify a document and return the recovered payload.
    pub fn verify(&self, document: &str) -> Result<Vec<u8>, CryptoError> {
        self.open(document).map(|opened| opened.payload)
    }

    /// Verify a document, keeping the parsed envelope alongside the payload.
    pub fn open(&self, document: &str) -> Result<OpenedEnvelope, CryptoError> {
        let envelope = Envelope::parse(document)?;
        let payload = self.verify_envelope(&envelope)?;
        Ok(OpenedEnvelope { envelope, payload })
    }

    /// Verify an already parsed envelope.
    pub fn verify_envelope(&self, envelope: &Envelope) -> Result<Vec<u8>, CryptoError> {
        let id = envelope.data.id.as_str();

        self.check_signature(envelope)?;
        info!(%id, "Sender signature verified");

        let expected = self.decrypt_digest(envelope)?;
        let actual = content_digest(&envelope.data.content);
        debug!(%id, %expected, %actual, "Comparing content digests");
        if !constant_time_str_eq(&expected, &actual) {
            warn!(%id, "Content digest mismatch");
            return Err(CryptoError::DigestMismatch);
        }
        info!(%id, "Content digest matches");

        STANDARD
            .decode(&envelope.data.content)
            .map_err(|e| CryptoError::MalformedField {
                field: "data-content",
                reason: e.to_string(),
            })
    }

    fn check_signature(&self, envelope: &Envelope) -> Result<(), CryptoError> {
        let signature = STANDARD
            .decode(&envelope.signature)
            .map_err(|_| CryptoError::SignatureInvalid)?;
        self.keys
            .sender_key()
            .verify(
                Pkcs1v15Sign::new::<Sha1>(),
                &sha1_of(&envelope.encrypted_digest),
                &signature,
            )
            .map_err(|e| {
                warn!(id = %envelope.data.id, error = %e, "Signature rejected");
                CryptoError::SignatureInvalid
            })
    }

    fn decrypt_digest(&self, envelope: &Envelope) -> Result<String, CryptoError> {
        let ciphertext = STANDARD
            .decode(&envelope.encrypted_digest)
            .map_err(|e| CryptoError::DecryptionFailed(e.to_string()))?;
        let plain = self
            .keys
            .decryption_key()
            .decrypt(Pkcs1v15Encrypt, &ciphertext)
            .map_err(|e| CryptoError::DecryptionFailed(e.to_string()))?;
        String::from_utf8(plain)
            .map(|digest| digest.trim().to_string())
            .map_err(|_| CryptoError::DecryptionFailed("decrypted digest is not UTF-8".into()))
    }
}
