//! licsign: offline issuance and verification of RSA-signed license files.
//!
//! This crate provides:
//! - A typed license record with shape-derived schema versions (`record`)
//! - Deterministic canonical encoding of records (`canonical`)
//! - RSA PKCS#1 v1.5 / SHA-256 signing (`signing`)
//! - Signed bundle construction and atomic persistence (`bundle`)
//! - Offline verification that never trusts file formatting (`verify`)
//! - An opt-in validity-window policy for verified records (`policy`)
//! - C-ABI FFI exports for native hosts (`ffi`)
//!
//! The CLI wrapper lives in `src/main.rs`.

#![deny(unsafe_code)]

pub mod config;
pub mod error;

pub mod bundle;
pub mod canonical;
pub mod policy;
pub mod record;
pub mod signing;
pub mod util;
pub mod verify;

#[allow(unsafe_code)]
pub mod ffi;

pub use bundle::LicenseBundle;
pub use canonical::CanonicalBytes;
pub use error::{LicsignError, Result};
pub use record::{LicenseRecord, LicenseRequest, SchemaVersion};
pub use verify::{InvalidReason, VerificationResult, Verifier};
