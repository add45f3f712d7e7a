//! Offline bundle verification.
//!
//! The verifier never trusts bytes from the file: it re-encodes the parsed
//! `license` object canonically and checks the signature against that.
//! Re-indenting or re-ordering the file is therefore harmless, while any
//! change to a value is detected.
//!
//! A signature that does not check out is a normal outcome
//! ([`VerificationResult::Invalid`]), not an error.  Errors are reserved for
//! unusable inputs: an unparseable key (`KeyLoad`) or a structurally broken
//! bundle (`BundleFormat`).

use std::path::Path;

use rsa::RsaPublicKey;
use serde::Serialize;
use tracing::{debug, warn};

use crate::bundle::{self, LicenseBundle};
use crate::canonical;
use crate::error::Result;
use crate::record::LicenseRecord;
use crate::signing;
use crate::util;

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InvalidReason {
    SignatureMismatch,
}

impl std::fmt::Display for InvalidReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SignatureMismatch => write!(f, "signature mismatch"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationResult {
    /// The signature matches; carries the record for display or policy checks.
    Valid(LicenseRecord),
    Invalid(InvalidReason),
}

impl VerificationResult {
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid(_))
    }

    pub fn record(&self) -> Option<&LicenseRecord> {
        match self {
            Self::Valid(r) => Some(r),
            Self::Invalid(_) => None,
        }
    }

    pub fn into_record(self) -> Option<LicenseRecord> {
        match self {
            Self::Valid(r) => Some(r),
            Self::Invalid(_) => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Core check
// ---------------------------------------------------------------------------

/// Verify a parsed bundle against the issuer's public key.
///
/// A signature string that is not valid base64 cannot be an authentic
/// signature and is reported as [`InvalidReason::SignatureMismatch`], the
/// same as any other rejection by the primitive.
pub fn verify(public_key: &RsaPublicKey, bundle: &LicenseBundle) -> Result<VerificationResult> {
    let msg = canonical::encode(&bundle.license)?;

    let sig = match util::b64_decode(&bundle.signature) {
        Ok(sig) if sig.is_empty() => {
            warn!("license signature is empty");
            return Ok(VerificationResult::Invalid(InvalidReason::SignatureMismatch));
        }
        Ok(sig) => sig,
        Err(e) => {
            warn!(error = %e, "license signature is not valid base64");
            return Ok(VerificationResult::Invalid(InvalidReason::SignatureMismatch));
        }
    };

    match signing::verify_pkcs1v15_sha256(public_key, &msg, &sig) {
        Ok(()) => {
            debug!(
                schema = %bundle.license.schema_version(),
                canonical_len = msg.len(),
                "license signature verified"
            );
            Ok(VerificationResult::Valid(bundle.license.clone()))
        }
        Err(e) => {
            warn!(error = %e, "license signature rejected");
            Ok(VerificationResult::Invalid(InvalidReason::SignatureMismatch))
        }
    }
}

// ---------------------------------------------------------------------------
// Verifier (holds a parsed key)
// ---------------------------------------------------------------------------

/// A parsed issuer public key.  Stateless and `Send + Sync`, so one value
/// can serve any number of threads.
#[derive(Debug, Clone)]
pub struct Verifier {
    public_key: RsaPublicKey,
    key_id: String,
}

impl Verifier {
    pub fn new(public_key: RsaPublicKey) -> Result<Self> {
        let key_id = signing::key_id(&public_key)?;
        Ok(Self { public_key, key_id })
    }

    pub fn from_public_key_pem(pem: &str) -> Result<Self> {
        Self::new(signing::parse_public_key_pem(pem)?)
    }

    pub fn from_public_key_file(path: &Path) -> Result<Self> {
        Self::new(signing::load_public_key_file(path)?)
    }

    pub fn key_id(&self) -> &str {
        &self.key_id
    }

    pub fn public_key(&self) -> &RsaPublicKey {
        &self.public_key
    }

    pub fn verify(&self, bundle: &LicenseBundle) -> Result<VerificationResult> {
        verify(&self.public_key, bundle)
    }

    /// Parse bundle JSON text and verify it.
    pub fn verify_json(&self, text: &str) -> Result<VerificationResult> {
        let bundle = bundle::parse(text)?;
        self.verify(&bundle)
    }

    pub fn verify_file(&self, path: &Path) -> Result<VerificationResult> {
        let bundle = bundle::load(path)?;
        debug!(path = %path.display(), key_id = %self.key_id, "verifying bundle");
        self.verify(&bundle)
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
