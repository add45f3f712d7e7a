//! Structured error types for the licsign library.
//!
//! Every public library function returns [`Result<T>`] which carries a
//! domain-specific [`LicsignError`].  The FFI boundary converts these into
//! integer status codes via [`FfiErrorCode`].
//!
//! A signature that does not match is *not* an error: the verifier reports
//! it as [`crate::verify::VerificationResult::Invalid`].

use thiserror::Error;

// ---------------------------------------------------------------------------
// Primary error enum
// ---------------------------------------------------------------------------

/// Domain-specific error type for the licsign library.
#[derive(Error, Debug)]
pub enum LicsignError {
    /// The license record violates its schema (missing field, bad date, ...).
    #[error("malformed record: {0}")]
    MalformedRecord(String),

    /// Key material could not be read or parsed as an RSA key.
    #[error("key load: {0}")]
    KeyLoad(String),

    /// The signature primitive rejected its input.
    #[error("signing: {0}")]
    Signing(String),

    /// The bundle file is structurally broken.
    #[error("bundle format: {0}")]
    BundleFormat(String),

    #[error("config: {0}")]
    Config(String),

    #[error("io: {0}")]
    Io(String),

    #[error("validation: {0}")]
    Validation(String),

    /// Catch-all for errors that do not fit a specific domain.
    #[error("{0}")]
    Other(String),
}

/// Convenience alias used throughout the library.
pub type Result<T> = std::result::Result<T, LicsignError>;

// ---------------------------------------------------------------------------
// FFI error codes
// ---------------------------------------------------------------------------

/// Integer status codes returned across the C-ABI boundary.
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiErrorCode {
    Ok = 0,
    InvalidArgument = -1,
    MalformedRecord = -2,
    KeyLoadError = -3,
    SigningError = -4,
    BundleFormatError = -5,
    IoError = -6,
    ConfigError = -7,
    InternalError = -99,
}

impl From<&LicsignError> for FfiErrorCode {
    fn from(e: &LicsignError) -> Self {
        match e {
            LicsignError::MalformedRecord(_) => Self::MalformedRecord,
            LicsignError::KeyLoad(_) => Self::KeyLoadError,
            LicsignError::Signing(_) => Self::SigningError,
            LicsignError::BundleFormat(_) => Self::BundleFormatError,
            LicsignError::Config(_) => Self::ConfigError,
            LicsignError::Io(_) => Self::IoError,
            LicsignError::Validation(_) => Self::InvalidArgument,
            LicsignError::Other(_) => Self::InternalError,
        }
    }
}

// ---------------------------------------------------------------------------
// Context extension trait
// ---------------------------------------------------------------------------

/// Extension trait that adds domain-specific context to any `Result<T, E>`.
///
/// Usage mirrors `anyhow::Context` but tags the error with the originating
/// subsystem so that callers (and the FFI boundary) can categorise failures.
///
/// ```ignore
/// RsaPublicKey::from_public_key_pem(pem).ctx_key("parse SPKI public key")?;
/// ```
pub trait ResultExt<T> {
    fn ctx_record(self, msg: &str) -> Result<T>;
    fn ctx_key(self, msg: &str) -> Result<T>;
    fn ctx_signing(self, msg: &str) -> Result<T>;
    fn ctx_bundle(self, msg: &str) -> Result<T>;
    fn ctx_config(self, msg: &str) -> Result<T>;
    fn ctx_io(self, msg: &str) -> Result<T>;
}

impl<T, E: std::fmt::Display> ResultExt<T> for std::result::Result<T, E> {
    fn ctx_record(self, msg: &str) -> Result<T> {
        self.map_err(|e| LicsignError::MalformedRecord(format!("{msg}: {e}")))
    }
    fn ctx_key(self, msg: &str) -> Result<T> {
        self.map_err(|e| LicsignError::KeyLoad(format!("{msg}: {e}")))
    }
    fn ctx_signing(self, msg: &str) -> Result<T> {
        self.map_err(|e| LicsignError::Signing(format!("{msg}: {e}")))
    }
    fn ctx_bundle(self, msg: &str) -> Result<T> {
        self.map_err(|e| LicsignError::BundleFormat(format!("{msg}: {e}")))
    }
    fn ctx_config(self, msg: &str) -> Result<T> {
        self.map_err(|e| LicsignError::Config(format!("{msg}: {e}")))
    }
    fn ctx_io(self, msg: &str) -> Result<T> {
        self.map_err(|e| LicsignError::Io(format!("{msg}: {e}")))
    }
}

/// Same as [`ResultExt`] but for `Option<T>` (converts `None` into an error).
pub trait OptionExt<T> {
    fn required_record(self, msg: &str) -> Result<T>;
    fn required_bundle(self, msg: &str) -> Result<T>;
    fn required_config(self, msg: &str) -> Result<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn required_record(self, msg: &str) -> Result<T> {
        self.ok_or_else(|| LicsignError::MalformedRecord(msg.to_string()))
    }
    fn required_bundle(self, msg: &str) -> Result<T> {
        self.ok_or_else(|| LicsignError::BundleFormat(msg.to_string()))
    }
    fn required_config(self, msg: &str) -> Result<T> {
        self.ok_or_else(|| LicsignError::Config(msg.to_string()))
    }
}
