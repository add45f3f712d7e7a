//! Canonical encoding of license records.
//!
//! The signed bytes are the record rendered as a flat JSON object of string
//! values with:
//!
//! 1. keys sorted byte-wise ascending,
//! 2. compact separators (no spaces after `:` or `,`), no trailing newline,
//! 3. standard JSON string escaping, nothing custom,
//! 4. dates as `YYYY-MM-DD` text.
//!
//! Any implementation in any language that follows these rules reproduces
//! the same bytes; signer and verifier both derive them from parsed values,
//! never from a file's own formatting.

use std::collections::BTreeMap;

use crate::error::{Result, ResultExt as _};
use crate::record::LicenseRecord;

/// Bytes produced exclusively by [`encode`].
///
/// The inner buffer is private so that signing and verification cannot be
/// fed bytes that came from any other serialization path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CanonicalBytes(Vec<u8>);

impl CanonicalBytes {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The canonical form is always valid UTF-8 JSON.
    pub fn as_str(&self) -> &str {
        std::str::from_utf8(&self.0).unwrap_or_default()
    }
}

impl AsRef<[u8]> for CanonicalBytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Canonically encode a validated record.
///
/// Non-ASCII characters are written as raw UTF-8, never as `\uXXXX`
/// escapes. Issuers that escape non-ASCII (Python's `json.dumps` default)
/// sign different bytes and will not verify here.
pub fn encode(record: &LicenseRecord) -> Result<CanonicalBytes> {
    // BTreeMap iterates in byte-wise key order; serde_json writes compact
    // output by default.
    let map: BTreeMap<&'static str, String> = record.fields().into_iter().collect();
    let bytes = serde_json::to_vec(&map).ctx_record("serialize canonical record")?;
    Ok(CanonicalBytes(bytes))
}

/// Canonically encode an untyped JSON object.
///
/// Fails with `MalformedRecord` if a required field is missing, a date is not
/// `YYYY-MM-DD`, or the object carries a field outside the record schema.
pub fn encode_value(value: serde_json::Value) -> Result<CanonicalBytes> {
    let record = LicenseRecord::from_json_value(value)?;
    encode(&record)
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
