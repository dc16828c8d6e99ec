//! Key-less integrity check against the digest ledger.
//!
//! Lower assurance than full envelope verification: it only proves that a
//! candidate payload matches what was recorded under an id. It needs no key
//! material, so any party can run it.

use std::fmt;

use tracing::{info, warn};

use crate::digest::{constant_time_str_eq, payload_digest};
use crate::ledger::DigestLedger;

/// Outcome of [`check_integrity`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchResult {
    /// The payload digest equals the recorded digest.
    Success,
    /// A digest is recorded for the id but differs.
    Mismatch,
    /// No digest is recorded for the id.
    NotFound,
    /// The request itself is unusable (e.g. empty id).
    InputError(String),
    /// The ledger could not be read.
    Unavailable(String),
}

impl MatchResult {
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

impl fmt::Display for MatchResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => write!(f, "match: payload is unchanged"),
            Self::Mismatch => write!(f, "mismatch: payload differs from the recorded digest"),
            Self::NotFound => write!(f, "not found: no digest recorded for this id"),
            Self::InputError(reason) => write!(f, "invalid input: {reason}"),
            Self::Unavailable(reason) => write!(f, "ledger unavailable: {reason}"),
        }
    }
}

/// Compare `payload` against the digest recorded for `id`.
///
/// Never fails: every error condition is folded into the result.
pub fn check_integrity(ledger: &DigestLedger, id: &str, payload: &[u8]) -> MatchResult {
    let id = id.trim();
    if id.is_empty() {
        return MatchResult::InputError("data id is empty".into());
    }

    let recorded = match ledger.lookup(id) {
        Ok(Some(digest)) => digest,
        Ok(None) => {
            info!(%id, "No ledger entry for id");
            return MatchResult::NotFound;
        }
        Err(e) => {
            warn!(%id, error = %e, "Ledger lookup failed");
            return MatchResult::Unavailable(e.to_string());
        }
    };

    let computed = payload_digest(payload);
    let result = if constant_time_str_eq(&computed, &recorded) {
        MatchResult::Success
    } else {
        MatchResult::Mismatch
    };
    info!(%id, %computed, %recorded, ?result, "Integrity check finished");
    result
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::builder::EnvelopeBuilder;
    use crate::ledger::LedgerEntry;
    use crate::test_keys;

    #[test]
    fn ledger_scenario() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = DigestLedger::new(dir.path().join("dataSums.store"));
        let builder = EnvelopeBuilder::new(test_keys::sender_keys(), ledger.clone());
        builder.build_with_id("U1", b"aaa,10,2015-10-29,,,").unwrap();

        let line = std::fs::read_to_string(ledger.path()).unwrap();
        assert_eq!(line, "U1,E4YaDmwMQHxpGWODLTj1VzWHoyE=\n");

        assert_eq!(
            check_integrity(&ledger, "U1", b"aaa,10,2015-10-29,,,"),
            MatchResult::Success
        );
        assert_eq!(
            check_integrity(&ledger, "U1", b"aaa,11,2015-10-29,,,"),
            MatchResult::Mismatch
        );
        assert_eq!(
            check_integrity(&ledger, "U2", b"aaa,10,2015-10-29,,,"),
            MatchResult::NotFound
        );
    }

    #[test]
    fn candidate_is_canonicalised_like_the_builder() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = DigestLedger::new(dir.path().join("ledger"));
        let builder = EnvelopeBuilder::new(test_keys::sender_keys(), ledger.clone());
        let sealed = builder.build(b"\n  row,1\nrow,2  \n").unwrap();

        assert!(check_integrity(&ledger, &sealed.entry.id, b"row,1\nrow,2").is_success());
        assert!(
            check_integrity(&ledger, &format!(" {} ", sealed.entry.id), b"row,1\nrow,2\n\n")
                .is_success()
        );
        assert_eq!(
            check_integrity(&ledger, &sealed.entry.id, b"row,1\n row,2"),
            MatchResult::Mismatch
        );
    }

    #[test]
    fn empty_id_is_input_error() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = DigestLedger::new(dir.path().join("ledger"));
        ledger.append(&LedgerEntry::new("A", "AAAA")).unwrap();
        assert!(matches!(
            check_integrity(&ledger, "   ", b"data"),
            MatchResult::InputError(_)
        ));
    }

    #[test]
    fn missing_ledger_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = DigestLedger::new(dir.path().join("absent"));
        assert_eq!(check_integrity(&ledger, "A", b"data"), MatchResult::NotFound);
    }

    #[test]
    fn unreadable_ledger_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        // Opening a directory succeeds but reading it fails.
        let ledger = DigestLedger::new(dir.path().to_path_buf());
        assert!(matches!(
            check_integrity(&ledger, "A", b"data"),
            MatchResult::Unavailable(_)
        ));
    }
}
