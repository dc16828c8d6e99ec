//! envseal Envelope Protocol
//!
//! Point-to-point data-integrity envelopes: the sender seals a payload so
//! the receiver can prove who sent it and that it was not altered, and a
//! ledger of digests lets anyone re-check a payload without keys.
//!
//! ## Crypto primitives
//!
//! - **Digest**: SHA-1 over the base64 text of the trimmed payload
//! - **Confidentiality**: digest encrypted with RSA PKCS#1 v1.5 for the receiver
//! - **Authenticity**: RSA PKCS#1 v1.5 / SHA-1 signature over the encrypted digest
//! - **Ledger**: append-only `id,digest` lines under advisory file locks

pub mod builder;
pub mod digest;
pub mod envelope;
pub mod error;
pub mod integrity;
pub mod keys;
pub mod ledger;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_keys;
pub mod verifier;

pub use builder::{EnvelopeBuilder, SealedEnvelope};
pub use digest::{canonicalize, constant_time_str_eq, content_digest, payload_digest};
pub use envelope::{Envelope, PayloadRecord};
pub use error::CryptoError;
pub use integrity::{MatchResult, check_integrity};
pub use keys::{ReceiverKeys, SenderKeys, fingerprint_of};
pub use ledger::{DigestLedger, LedgerEntry};
pub use verifier::{EnvelopeVerifier, OpenedEnvelope};
