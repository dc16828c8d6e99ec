//! Payload canonicalisation and SHA-1 digests.
//!
//! Every party hashes the same byte sequence: the standard base64 text of
//! the whitespace-trimmed payload. Hashing raw bytes anywhere would break
//! agreement between the builder, the verifier and the ledger check.

use base64::{Engine, engine::general_purpose::STANDARD};
use sha1::{Digest, Sha1};
use subtle::ConstantTimeEq;

/// Name of the digest algorithm written into envelopes.
pub const DIGEST_ALGORITHM: &str = "SHA1";

/// Trim leading/trailing Unicode whitespace and base64-encode the rest.
pub fn canonicalize(payload: &[u8]) -> String {
    STANDARD.encode(trim_whitespace(payload))
}

/// Strip `char::is_whitespace` characters from both ends.
///
/// Only UTF-8 at the edges is decoded; trimming stops at the first invalid
/// byte sequence, and the bytes in between are returned untouched.
pub fn trim_whitespace(payload: &[u8]) -> &[u8] {
    let start = payload.utf8_chunks().next().map_or(0, |chunk| {
        let valid = chunk.valid();
        valid.len() - valid.trim_start().len()
    });
    let rest = &payload[start..];
    let end = match rest.utf8_chunks().last() {
        Some(chunk) if chunk.invalid().is_empty() => {
            let valid = chunk.valid();
            rest.len() - (valid.len() - valid.trim_end().len())
        }
        _ => rest.len(),
    };
    &rest[..end]
}

/// Base64 of the SHA-1 over canonical content text.
pub fn content_digest(content: &str) -> String {
    STANDARD.encode(Sha1::digest(content.as_bytes()))
}

/// Digest of a raw payload, canonicalising first.
pub fn payload_digest(payload: &[u8]) -> String {
    content_digest(&canonicalize(payload))
}

/// Raw SHA-1 of `text`, the input to the envelope signature.
pub(crate) fn sha1_of(text: &str) -> Vec<u8> {
    Sha1::digest(text.as_bytes()).to_vec()
}

/// Constant-time string comparison.
pub fn constant_time_str_eq(a: &str, b: &str) -> bool {
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_content_is_base64_of_trimmed_payload() {
        assert_eq!(
            canonicalize(b"  aaa,10,2015-10-29,,,\n\n"),
            "YWFhLDEwLDIwMTUtMTAtMjksLCw="
        );
    }

    #[test]
    fn payload_digest_matches_known_value() {
        assert_eq!(
            payload_digest(b"aaa,10,2015-10-29,,,"),
            "E4YaDmwMQHxpGWODLTj1VzWHoyE="
        );
        assert_eq!(
            payload_digest(b"aaa,11,2015-10-29,,,"),
            "1V6cZt9In8fsz/CtEAXfv505pbo="
        );
    }

    #[test]
    fn trimming_is_idempotent() {
        let payloads: [&[u8]; 4] = [
            b"aaa,10,2015-10-29,,,",
            b"\t\r\n aaa,10\n bbb,33 \r\n",
            b"   ",
            b"",
        ];
        for p in payloads {
            assert_eq!(payload_digest(p), payload_digest(trim_whitespace(p)));
            assert_eq!(canonicalize(p), canonicalize(trim_whitespace(trim_whitespace(p))));
        }
    }

    #[test]
    fn unicode_whitespace_is_trimmed() {
        let plain = payload_digest(b"abc");
        for padded in ["abc\u{3000}", "abc\u{000B}", "\u{00A0}abc", "\u{0085}abc\u{2028}"] {
            assert_eq!(payload_digest(padded.as_bytes()), plain, "{padded:?}");
        }
    }

    #[test]
    fn trimming_stops_at_invalid_utf8() {
        assert_eq!(trim_whitespace(b" \xff abc\xfe\t\n"), b"\xff abc\xfe");
        assert_eq!(trim_whitespace(b"\xff \xfe"), b"\xff \xfe");
        assert!(trim_whitespace(" \u{3000} ".as_bytes()).is_empty());
        assert!(trim_whitespace(b"").is_empty());
    }

    #[test]
    fn empty_payload_digest() {
        assert_eq!(payload_digest(b" \n "), "2jmj7l5rSw0yVb/vlWAYkK/YBwk=");
    }

    #[test]
    fn interior_whitespace_is_significant() {
        assert_ne!(payload_digest(b"a b"), payload_digest(b"ab"));
    }

    #[test]
    fn constant_time_eq_handles_lengths() {
        assert!(constant_time_str_eq("abc", "abc"));
        assert!(!constant_time_str_eq("abc", "abd"));
        assert!(!constant_time_str_eq("abc", "abcd"));
        assert!(constant_time_str_eq("", ""));
    }
}
