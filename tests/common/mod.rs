//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use anyhow::Result;
use rsa::pkcs1::EncodeRsaPrivateKey as _;
use rsa::pkcs8::{EncodePrivateKey as _, EncodePublicKey as _, LineEnding};
use rsa::RsaPrivateKey;
use time::macros::date;

use licsign_core::LicenseRecord;

static KEY_A: OnceLock<RsaPrivateKey> = OnceLock::new();
static KEY_B: OnceLock<RsaPrivateKey> = OnceLock::new();

/// 2048-bit issuer key used by most tests.
pub fn key_a() -> &'static RsaPrivateKey {
    KEY_A.get_or_init(|| RsaPrivateKey::new(&mut rand::rngs::OsRng, 2048).unwrap())
}

/// An unrelated key pair.
pub fn key_b() -> &'static RsaPrivateKey {
    KEY_B.get_or_init(|| RsaPrivateKey::new(&mut rand::rngs::OsRng, 2048).unwrap())
}

/// Write `<stem>_private.pem` (PKCS#8) and `<stem>_public.pem` (SPKI).
pub fn write_keys(dir: &Path, key: &RsaPrivateKey, stem: &str) -> Result<(PathBuf, PathBuf)> {
    let sk_path = dir.join(format!("{stem}_private.pem"));
    let pk_path = dir.join(format!("{stem}_public.pem"));
    std::fs::write(&sk_path, key.to_pkcs8_pem(LineEnding::LF)?.as_bytes())?;
    std::fs::write(&pk_path, key.to_public_key().to_public_key_pem(LineEnding::LF)?)?;
    Ok((sk_path, pk_path))
}

/// Same key, PKCS#1 (`BEGIN RSA PRIVATE KEY`) encoding.
pub fn write_pkcs1_private(dir: &Path, key: &RsaPrivateKey, stem: &str) -> Result<PathBuf> {
    let path = dir.join(format!("{stem}_private_pkcs1.pem"));
    std::fs::write(&path, key.to_pkcs1_pem(LineEnding::LF)?.as_bytes())?;
    Ok(path)
}

pub fn ada() -> LicenseRecord {
    LicenseRecord::new("Ada", "ada@example.com", "Acme", date!(2030 - 01 - 01)).unwrap()
}

pub fn ada_v2() -> LicenseRecord {
    ada()
        .with_valid_from(date!(2026 - 10 - 16))
        .with_license_number("LIC-0042")
}
