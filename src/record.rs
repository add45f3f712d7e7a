//! The license record: the payload that gets canonicalized and signed.
//!
//! Two record shapes exist in the wild:
//!
//! | Version | Fields                                                        |
//! |---------|---------------------------------------------------------------|
//! | `V1`    | `name`, `email`, `organization`, `expiry`                     |
//! | `V2`    | V1 + `license_number` and/or `valid_from`                     |
//!
//! The version is never written into the payload; it is derived from which
//! optional fields are present, so bundles from earlier issuers keep
//! verifying byte-for-byte.

use serde::{Deserialize, Serialize};
use time::Date;

use crate::error::{LicsignError, Result};
use crate::util;

// ---------------------------------------------------------------------------
// Data types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaVersion {
    V1,
    V2,
}

impl std::fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::V1 => write!(f, "v1"),
            Self::V2 => write!(f, "v2"),
        }
    }
}

impl std::str::FromStr for SchemaVersion {
    type Err = LicsignError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "v1" | "1" => Ok(Self::V1),
            "v2" | "2" => Ok(Self::V2),
            other => Err(LicsignError::Validation(format!(
                "unknown schema version '{other}' (expected v1 or v2)"
            ))),
        }
    }
}

/// A validated license record.  Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawRecord", into = "RawRecord")]
pub struct LicenseRecord {
    name: String,
    email: String,
    organization: String,
    expiry: Date,
    valid_from: Option<Date>,
    license_number: Option<String>,
}

/// Wire shape of the `license` object.  Dates are plain `YYYY-MM-DD` text.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawRecord {
    name: String,
    email: String,
    organization: String,
    expiry: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    valid_from: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    license_number: Option<String>,
}

impl TryFrom<RawRecord> for LicenseRecord {
    type Error = LicsignError;

    fn try_from(raw: RawRecord) -> Result<Self> {
        let expiry = util::parse_date(&raw.expiry, "expiry")?;
        let valid_from = raw
            .valid_from
            .as_deref()
            .map(|s| util::parse_date(s, "valid_from"))
            .transpose()?;
        let mut record = Self::new(raw.name, raw.email, raw.organization, expiry)?;
        record.valid_from = valid_from;
        record.license_number = raw.license_number;
        Ok(record)
    }
}

impl From<LicenseRecord> for RawRecord {
    fn from(r: LicenseRecord) -> Self {
        Self {
            name: r.name,
            email: r.email,
            organization: r.organization,
            expiry: util::format_date(r.expiry),
            valid_from: r.valid_from.map(util::format_date),
            license_number: r.license_number,
        }
    }
}

// ---------------------------------------------------------------------------
// Construction + accessors
// ---------------------------------------------------------------------------

impl LicenseRecord {
    /// Create a V1-shaped record.  Required string fields must be non-empty.
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        organization: impl Into<String>,
        expiry: Date,
    ) -> Result<Self> {
        let record = Self {
            name: name.into(),
            email: email.into(),
            organization: organization.into(),
            expiry,
            valid_from: None,
            license_number: None,
        };
        for (field, value) in [
            ("name", &record.name),
            ("email", &record.email),
            ("organization", &record.organization),
        ] {
            if value.is_empty() {
                return Err(LicsignError::MalformedRecord(format!(
                    "required field '{field}' is empty"
                )));
            }
        }
        Ok(record)
    }

    #[must_use]
    pub fn with_valid_from(mut self, valid_from: Date) -> Self {
        self.valid_from = Some(valid_from);
        self
    }

    /// The license number is kept verbatim; it is never parsed as a number.
    #[must_use]
    pub fn with_license_number(mut self, license_number: impl Into<String>) -> Self {
        self.license_number = Some(license_number.into());
        self
    }

    /// Build a record from an untyped JSON object, reporting every schema
    /// violation as [`LicsignError::MalformedRecord`].
    pub fn from_json_value(value: serde_json::Value) -> Result<Self> {
        let raw: RawRecord = serde_json::from_value(value)
            .map_err(|e| LicsignError::MalformedRecord(e.to_string()))?;
        Self::try_from(raw)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn organization(&self) -> &str {
        &self.organization
    }

    pub fn expiry(&self) -> Date {
        self.expiry
    }

    pub fn valid_from(&self) -> Option<Date> {
        self.valid_from
    }

    pub fn license_number(&self) -> Option<&str> {
        self.license_number.as_deref()
    }

    pub fn schema_version(&self) -> SchemaVersion {
        if self.valid_from.is_some() || self.license_number.is_some() {
            SchemaVersion::V2
        } else {
            SchemaVersion::V1
        }
    }

    /// Flat field-name → text mapping.  Absent optional fields are omitted,
    /// never written as empty strings or nulls.
    pub fn fields(&self) -> Vec<(&'static str, String)> {
        let mut out = vec![
            ("name", self.name.clone()),
            ("email", self.email.clone()),
            ("organization", self.organization.clone()),
            ("expiry", util::format_date(self.expiry)),
        ];
        if let Some(d) = self.valid_from {
            out.push(("valid_from", util::format_date(d)));
        }
        if let Some(n) = &self.license_number {
            out.push(("license_number", n.clone()));
        }
        out
    }
}

// ---------------------------------------------------------------------------
// Issuance input
// ---------------------------------------------------------------------------

/// User-supplied attributes for a new license, as plain text.
#[derive(Debug, Clone, Default)]
pub struct LicenseRequest {
    pub name: String,
    pub email: String,
    pub organization: String,
    pub expiry: String,
    pub valid_from: Option<String>,
    pub license_number: Option<String>,
}

impl LicenseRequest {
    /// Validate the request and produce the record to sign.
    ///
    /// For [`SchemaVersion::V2`] a missing `valid_from` defaults to
    /// `issued_on`.  [`SchemaVersion::V1`] records cannot carry either
    /// optional field.
    pub fn into_record(self, schema: SchemaVersion, issued_on: Date) -> Result<LicenseRecord> {
        let expiry = util::parse_date(&self.expiry, "expiry")?;
        let valid_from = self
            .valid_from
            .as_deref()
            .map(|s| util::parse_date(s, "valid_from"))
            .transpose()?;

        let record = LicenseRecord::new(self.name, self.email, self.organization, expiry)?;

        let record = match schema {
            SchemaVersion::V1 => {
                if valid_from.is_some() || self.license_number.is_some() {
                    return Err(LicsignError::MalformedRecord(
                        "v1 records carry neither valid_from nor license_number".into(),
                    ));
                }
                record
            }
            SchemaVersion::V2 => {
                let valid_from = valid_from.unwrap_or(issued_on);
                if valid_from > expiry {
                    return Err(LicsignError::MalformedRecord(format!(
                        "valid_from {} is after expiry {}",
                        util::format_date(valid_from),
                        util::format_date(expiry)
                    )));
                }
                let record = record.with_valid_from(valid_from);
                match self.license_number {
                    Some(n) => record.with_license_number(n),
                    None => record,
                }
            }
        };
        Ok(record)
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
