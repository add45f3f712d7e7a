//! License bundles: a record plus the base64 signature of its canonical form.
//!
//! ```json
//! {
//!   "license": { "name": "...", "email": "...", "organization": "...", "expiry": "YYYY-MM-DD" },
//!   "signature": "<base64, standard alphabet, padded>"
//! }
//! ```
//!
//! The file is pretty-printed for humans.  Its formatting never feeds the
//! signature: both sides re-encode the parsed record canonically.

use std::io::Write as _;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::canonical;
use crate::error::{LicsignError, OptionExt as _, Result, ResultExt as _};
use crate::record::LicenseRecord;
use crate::signing::Signer;
use crate::util;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LicenseBundle {
    pub license: LicenseRecord,
    /// Base64 RSA PKCS#1 v1.5 signature over the canonical record.
    pub signature: String,
}

// ---------------------------------------------------------------------------
// Build (issuer side)
// ---------------------------------------------------------------------------

/// Combine a record with its freshly computed signature.
pub fn build(record: LicenseRecord, signature: &[u8]) -> LicenseBundle {
    LicenseBundle {
        license: record,
        signature: util::b64_encode(signature),
    }
}

/// Encode, sign and bundle a record in one step.
pub fn issue(signer: &dyn Signer, record: LicenseRecord) -> Result<LicenseBundle> {
    let msg = canonical::encode(&record)?;
    let signature = signer.sign(&msg)?;
    info!(
        key_id = %signer.descriptor().key_id,
        schema = %record.schema_version(),
        license_number = record.license_number().unwrap_or("-"),
        "license signed"
    );
    Ok(build(record, &signature))
}

impl LicenseBundle {
    pub fn to_pretty_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).ctx_bundle("serialize bundle")
    }

    /// Decoded signature bytes.
    pub fn signature_bytes(&self) -> Result<Vec<u8>> {
        util::b64_decode(&self.signature).ctx_bundle("decode signature")
    }
}

// ---------------------------------------------------------------------------
// Persistence
// ---------------------------------------------------------------------------

/// Write the bundle as pretty-printed JSON, replacing `dest` if it exists.
///
/// The bytes go to a temporary file in the destination directory which is
/// then renamed over `dest`, so readers never observe a partial bundle.
pub fn persist(bundle: &LicenseBundle, dest: &Path) -> Result<()> {
    util::validate_path(dest, "bundle")?;
    let json = bundle.to_pretty_json()?;

    let dir = match dest.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut tmp = tempfile::NamedTempFile::new_in(dir)
        .map_err(|e| LicsignError::Io(format!("create temp file in {}: {e}", dir.display())))?;
    tmp.write_all(json.as_bytes()).ctx_io("write bundle")?;
    tmp.write_all(b"\n").ctx_io("write bundle")?;
    tmp.as_file().sync_all().ctx_io("sync bundle")?;
    tmp.persist(dest)
        .map_err(|e| LicsignError::Io(format!("write {}: {e}", dest.display())))?;

    info!(out = %dest.display(), "bundle written");
    Ok(())
}

// ---------------------------------------------------------------------------
// Parsing (verifier side)
// ---------------------------------------------------------------------------

/// Parse bundle JSON text.
///
/// Structural problems (not an object, missing or non-string `signature`,
/// missing/unknown/ill-typed record fields, malformed dates) are all
/// `BundleFormat` errors.
pub fn parse(text: &str) -> Result<LicenseBundle> {
    let value: serde_json::Value = serde_json::from_str(text).ctx_bundle("parse bundle JSON")?;
    from_value(value)
}

pub fn from_value(value: serde_json::Value) -> Result<LicenseBundle> {
    let mut obj = match value {
        serde_json::Value::Object(obj) => obj,
        _ => return Err(LicsignError::BundleFormat("bundle is not a JSON object".into())),
    };

    let license = obj.remove("license").required_bundle("missing 'license'")?;
    let signature = obj.remove("signature").required_bundle("missing 'signature'")?;

    // An empty string is well-formed here; the verifier reports it as a mismatch.
    let signature = match signature {
        serde_json::Value::String(s) => s,
        _ => return Err(LicsignError::BundleFormat("'signature' is not a string".into())),
    };
    if !license.is_object() {
        return Err(LicsignError::BundleFormat("'license' is not an object".into()));
    }
    let license = LicenseRecord::from_json_value(license).ctx_bundle("'license'")?;

    Ok(LicenseBundle { license, signature })
}

pub fn load(path: &Path) -> Result<LicenseBundle> {
    util::validate_path(path, "bundle")?;
    let text = std::fs::read_to_string(path)
        .map_err(|e| LicsignError::Io(format!("read bundle {}: {e}", path.display())))?;
    parse(&text)
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
