//! Envelope document format.
//!
//! An envelope is a small fixed-schema text document. Each field sits
//! between a literal `<name>` / `</name>` marker pair:
//!
//! ```text
//! <doc>
//!   <signature>
//!     <digest>SHA1</digest>
//!     <digest-value-encrypted>…</digest-value-encrypted>
//!     <sigvalue>…</sigvalue>
//!   </signature>
//!   <data>
//!     <id>…</id>
//!     <format>…</format>
//!     <encoding>base64</encoding>
//!     <data-content>
//! …
//!     </data-content>
//!   </data>
//! </doc>
//! ```
//!
//! This is not general markup: there is no nesting beyond this layout, no
//! attributes and no escaping. Instead every field value is restricted to an
//! alphabet without `<` (base64, or `[A-Za-z0-9._-]` for identifiers), and
//! every marker must occur exactly once. Those two rules make extraction
//! unambiguous. Whitespace and control characters inside a field are
//! layout only and are dropped on extraction.

use base64::{Engine, engine::general_purpose::STANDARD};

use crate::digest::DIGEST_ALGORITHM;
use crate::error::CryptoError;

/// Encoding of the `data-content` field.
pub const CONTENT_ENCODING: &str = "base64";

const F_DIGEST: &str = "digest";
const F_ENCRYPTED_DIGEST: &str = "digest-value-encrypted";
const F_SIGNATURE: &str = "sigvalue";
const F_ID: &str = "id";
const F_FORMAT: &str = "format";
const F_ENCODING: &str = "encoding";
const F_CONTENT: &str = "data-content";

/// Wrapper blocks that must be present exactly once.
const BLOCKS: [&str; 3] = ["doc", "signature", "data"];

/// Column at which `data-content` is wrapped when serialising.
const CONTENT_LINE_WIDTH: usize = 76;

/// The payload carried inside an envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayloadRecord {
    /// Unique record identifier (a UUID for envelopes built here).
    pub id: String,
    /// Short format tag such as `CSV`.
    pub format: String,
    /// Canonical content: base64 of the trimmed payload.
    pub content: String,
}

/// A parsed or freshly built envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    pub digest_algorithm: String,
    /// Base64 of the RSA-encrypted content digest.
    pub encrypted_digest: String,
    /// Base64 RSA signature over SHA-1 of `encrypted_digest`.
    pub signature: String,
    pub data: PayloadRecord,
}

impl Envelope {
    /// Render the envelope document.
    ///
    /// Refuses to render values that could not be extracted back
    /// unambiguously.
    pub fn to_document(&self) -> Result<String, CryptoError> {
        check_digest_algorithm(&self.digest_algorithm)?;
        check_base64(F_ENCRYPTED_DIGEST, &self.encrypted_digest, false)?;
        check_base64(F_SIGNATURE, &self.signature, false)?;
        check_token(F_ID, &self.data.id)?;
        check_token(F_FORMAT, &self.data.format)?;
        check_base64(F_CONTENT, &self.data.content, true)?;

        let mut doc = format!(
            "<doc>\n  <signature>\n    <{F_DIGEST}>{}</{F_DIGEST}>\n    \
             <{F_ENCRYPTED_DIGEST}>{}</{F_ENCRYPTED_DIGEST}>\n    \
             <{F_SIGNATURE}>{}</{F_SIGNATURE}>\n  </signature>\n  <data>\n    \
             <{F_ID}>{}</{F_ID}>\n    <{F_FORMAT}>{}</{F_FORMAT}>\n    \
             <{F_ENCODING}>{CONTENT_ENCODING}</{F_ENCODING}>\n    <{F_CONTENT}>\n",
            self.digest_algorithm,
            self.encrypted_digest,
            self.signature,
            self.data.id,
            self.data.format,
        );
        // Content was validated as base64 above, so every index is a char boundary.
        let content = self.data.content.as_str();
        for start in (0..content.len()).step_by(CONTENT_LINE_WIDTH) {
            let end = (start + CONTENT_LINE_WIDTH).min(content.len());
            doc.push_str(&content[start..end]);
            doc.push('\n');
        }
        doc.push_str(&format!("    </{F_CONTENT}>\n  </data>\n</doc>\n"));
        Ok(doc)
    }

    /// Extract and validate every field of an envelope document.
    pub fn parse(document: &str) -> Result<Self, CryptoError> {
        for block in BLOCKS {
            locate(document, block)?;
        }

        let digest_algorithm = extract_field(document, F_DIGEST)?;
        check_digest_algorithm(&digest_algorithm)?;

        let encoding = extract_field(document, F_ENCODING)?;
        if encoding != CONTENT_ENCODING {
            return Err(CryptoError::MalformedField {
                field: F_ENCODING,
                reason: format!("unsupported encoding {encoding:?}"),
            });
        }

        // Signed as text: decoding is left to the verifier so that any
        // alteration surfaces as a signature failure.
        let encrypted_digest = extract_field(document, F_ENCRYPTED_DIGEST)?;
        check_base64_alphabet(F_ENCRYPTED_DIGEST, &encrypted_digest)?;
        let signature = extract_field(document, F_SIGNATURE)?;
        check_base64_alphabet(F_SIGNATURE, &signature)?;

        let id = extract_field(document, F_ID)?;
        check_token(F_ID, &id)?;
        let format = extract_field(document, F_FORMAT)?;
        check_token(F_FORMAT, &format)?;
        let content = extract_field(document, F_CONTENT)?;
        check_base64(F_CONTENT, &content, true)?;

        Ok(Self {
            digest_algorithm,
            encrypted_digest,
            signature,
            data: PayloadRecord {
                id,
                format,
                content,
            },
        })
    }
}

/// Byte range of the text between a field's markers.
fn locate(document: &str, field: &'static str) -> Result<(usize, usize), CryptoError> {
    let open = format!("<{field}>");
    let close = format!("</{field}>");

    let opens = document.matches(&open).count();
    let closes = document.matches(&close).count();
    if opens == 0 || closes == 0 {
        return Err(CryptoError::MissingField(field));
    }
    if opens > 1 || closes > 1 {
        return Err(CryptoError::MalformedField {
            field,
            reason: "marker appears more than once".into(),
        });
    }

    // Both markers are known to be present.
    let start = document.find(&open).unwrap_or_default() + open.len();
    let end = document.find(&close).unwrap_or_default();
    if end < start {
        return Err(CryptoError::MalformedField {
            field,
            reason: "closing marker precedes opening marker".into(),
        });
    }
    Ok((start, end))
}

fn extract_field(document: &str, field: &'static str) -> Result<String, CryptoError> {
    let (start, end) = locate(document, field)?;
    Ok(document[start..end]
        .chars()
        .filter(|c| !c.is_whitespace() && !c.is_control())
        .collect())
}

fn check_digest_algorithm(name: &str) -> Result<(), CryptoError> {
    if name == DIGEST_ALGORITHM {
        Ok(())
    } else {
        Err(CryptoError::UnsupportedDigest(name.to_string()))
    }
}

fn check_base64(field: &'static str, value: &str, allow_empty: bool) -> Result<(), CryptoError> {
    if value.is_empty() {
        return if allow_empty {
            Ok(())
        } else {
            Err(CryptoError::MalformedField {
                field,
                reason: "empty".into(),
            })
        };
    }
    STANDARD
        .decode(value)
        .map(|_| ())
        .map_err(|e| CryptoError::MalformedField {
            field,
            reason: format!("invalid base64: {e}"),
        })
}

/// Characters only; padding and length are not checked.
fn check_base64_alphabet(field: &'static str, value: &str) -> Result<(), CryptoError> {
    match value
        .chars()
        .find(|&c| !(c.is_ascii_alphanumeric() || matches!(c, '+' | '/' | '=')))
    {
        None => Ok(()),
        Some(c) => Err(CryptoError::MalformedField {
            field,
            reason: format!("{c:?} is not a base64 character"),
        }),
    }
}

fn check_token(field: &'static str, value: &str) -> Result<(), CryptoError> {
    let valid = !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'));
    if valid {
        Ok(())
    } else {
        Err(CryptoError::MalformedField {
            field,
            reason: format!("{value:?} is not a token of [A-Za-z0-9._-]"),
        })
    }
}
