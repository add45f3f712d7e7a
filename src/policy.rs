//! Temporal validity, evaluated *after* signature verification.
//!
//! Verification answers "did the issuer sign this?"; whether an authentic
//! but expired license should still be honored is up to the embedding
//! application.  This module gives it the answer without deciding for it.
//!
//! Both bounds are inclusive: a license is active on its `valid_from` day
//! and on its `expiry` day.  A record without `valid_from` has no lower
//! bound.

use time::Date;

use crate::record::LicenseRecord;
use crate::util;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemporalStatus {
    Active,
    NotYetValid { valid_from: Date },
    Expired { expiry: Date },
}

impl TemporalStatus {
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }
}

impl std::fmt::Display for TemporalStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Active => write!(f, "active"),
            Self::NotYetValid { valid_from } => {
                write!(f, "not valid before {}", util::format_date(*valid_from))
            }
            Self::Expired { expiry } => write!(f, "expired on {}", util::format_date(*expiry)),
        }
    }
}

pub fn evaluate(record: &LicenseRecord, today: Date) -> TemporalStatus {
    if let Some(valid_from) = record.valid_from() {
        if today < valid_from {
            return TemporalStatus::NotYetValid { valid_from };
        }
    }
    if today > record.expiry() {
        return TemporalStatus::Expired {
            expiry: record.expiry(),
        };
    }
    TemporalStatus::Active
}

/// [`evaluate`] against the current UTC date.
pub fn evaluate_now(record: &LicenseRecord) -> TemporalStatus {
    evaluate(record, util::today_utc())
}
