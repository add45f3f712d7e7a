//! Hashing, encoding, date helpers, and input validation.

use base64::Engine as _;
use sha2::{Digest, Sha256};
use time::{macros::format_description, Date, OffsetDateTime};

use crate::error::{LicsignError, Result};

// ---------------------------------------------------------------------------
// Hashing
// ---------------------------------------------------------------------------

pub fn sha256(data: &[u8]) -> [u8; 32] {
    let mut h = Sha256::new();
    h.update(data);
    h.finalize().into()
}

pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(sha256(data))
}

// ---------------------------------------------------------------------------
// Base64 (standard alphabet, padded, never wrapped)
// ---------------------------------------------------------------------------

pub fn b64_encode(data: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(data)
}

pub fn b64_decode(s: &str) -> Result<Vec<u8>> {
    base64::engine::general_purpose::STANDARD
        .decode(s)
        .map_err(|e| LicsignError::Validation(format!("invalid base64: {e}")))
}

// ---------------------------------------------------------------------------
// Dates
// ---------------------------------------------------------------------------

/// Strict `YYYY-MM-DD`: exactly four year digits, no sign, no time part.
static DATE_RE: std::sync::LazyLock<regex::Regex> = std::sync::LazyLock::new(|| {
    regex::Regex::new(r"^[0-9]{4}-[0-9]{2}-[0-9]{2}$").expect("static date regex")
});

/// Parse a calendar date in `YYYY-MM-DD` form.
///
/// The shape is checked first so that inputs `time` would otherwise accept
/// (signed or five-digit years) are rejected; the calendar check then
/// rejects impossible dates such as `2030-13-40` or `2031-02-29`.
pub fn parse_date(s: &str, field: &str) -> Result<Date> {
    if !DATE_RE.is_match(s) {
        return Err(LicsignError::MalformedRecord(format!(
            "{field} '{s}' is not a YYYY-MM-DD date"
        )));
    }
    Date::parse(s, format_description!("[year]-[month]-[day]")).map_err(|e| {
        LicsignError::MalformedRecord(format!("{field} '{s}' is not a calendar date: {e}"))
    })
}

pub fn format_date(d: Date) -> String {
    d.format(format_description!("[year]-[month]-[day]"))
        .unwrap_or_else(|_| format!("{:04}-{:02}-{:02}", d.year(), u8::from(d.month()), d.day()))
}

pub fn today_utc() -> Date {
    OffsetDateTime::now_utc().date()
}

// ---------------------------------------------------------------------------
// Validation helpers
// ---------------------------------------------------------------------------

/// Validate that a path is not empty and does not contain null bytes.
pub fn validate_path(p: &std::path::Path, label: &str) -> Result<()> {
    let s = p.to_string_lossy();
    if s.is_empty() {
        return Err(LicsignError::Validation(format!("{label} path is empty")));
    }
    if s.contains('\0') {
        return Err(LicsignError::Validation(format!(
            "{label} path contains null byte"
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Version constants (set by build.rs)
// ---------------------------------------------------------------------------

pub const GIT_HASH: &str = env!("LICSIGN_GIT_HASH");
pub const BUILD_TS: &str = env!("LICSIGN_BUILD_TS");
pub const TARGET: &str = env!("LICSIGN_TARGET");
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// One-line version string for display.
pub fn version_string() -> String {
    format!("licsign v{VERSION} (git {GIT_HASH}, {TARGET}, built {BUILD_TS})")
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use time::Month;

    #[test]
    fn sha256_known_vector() {
        assert_eq!(
            sha256_hex(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn b64_uses_standard_padded_alphabet() {
        assert_eq!(b64_encode(&[0xfb, 0xff]), "+/8=");
        assert_eq!(b64_decode("+/8=").unwrap(), vec![0xfb, 0xff]);
    }

    #[test]
    fn b64_decode_invalid() {
        assert!(b64_decode("not_base64!!!").is_err());
        assert!(b64_decode("AAAAA").is_err());
    }

    #[test]
    fn parse_valid_dates() {
        let d = parse_date("2030-01-01", "expiry").unwrap();
        assert_eq!(d, Date::from_calendar_date(2030, Month::January, 1).unwrap());
        assert!(parse_date("2028-02-29", "expiry").is_ok());
    }

    #[test]
    fn parse_rejects_bad_dates() {
        for bad in [
            "2030-13-40",
            "2031-02-29",
            "2030-1-01",
            "30-01-01",
            "2030/01/01",
            "2030-01-01T00:00:00Z",
            "+2030-01-01",
            " 2030-01-01",
            "",
        ] {
            let err = parse_date(bad, "expiry").unwrap_err();
            assert!(
                matches!(err, LicsignError::MalformedRecord(_)),
                "{bad} should be malformed"
            );
        }
    }

    #[test]
    fn format_is_zero_padded() {
        let d = Date::from_calendar_date(2031, Month::March, 7).unwrap();
        assert_eq!(format_date(d), "2031-03-07");
    }

    #[test]
    fn valid_paths() {
        assert!(validate_path(std::path::Path::new("license.json"), "bundle").is_ok());
        assert!(validate_path(std::path::Path::new(""), "bundle").is_err());
    }

    #[test]
    fn version_string_non_empty() {
        let v = version_string();
        assert!(v.starts_with(&format!("licsign v{VERSION} ")));
        assert!(v.contains(TARGET));
    }
}
