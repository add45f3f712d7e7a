//! C-ABI exports so native hosts can canonicalize and verify licenses
//! without reimplementing the encoding rules.
//!
//! Every function returns an `i32` status code (0 = success, negative = error).
//! Output is returned via a `*mut *mut c_char` parameter; the caller must free
//! the string with [`licsign_free_string`].  Detailed error messages are
//! available via [`licsign_last_error`].
//!
//! A signature mismatch is a *successful* call whose JSON output reports
//! `"valid": false`.
//!
//! # Safety
//! All functions that accept raw pointers are `unsafe`.  Callers must ensure
//! that string pointers are valid, null-terminated UTF-8.

#![allow(unsafe_code)]

use std::cell::RefCell;
use std::ffi::{c_char, c_int, CStr, CString};

use crate::error::{FfiErrorCode, LicsignError};

// ---------------------------------------------------------------------------
// Thread-local last error
// ---------------------------------------------------------------------------

thread_local! {
    static LAST_ERROR: RefCell<CString> = RefCell::new(CString::default());
}

fn set_last_error(msg: &str) {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = CString::new(msg.replace('\0', " ")).unwrap_or_default();
    });
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

unsafe fn ptr_to_str<'a>(ptr: *const c_char) -> Option<&'a str> {
    if ptr.is_null() {
        return None;
    }
    unsafe { CStr::from_ptr(ptr) }.to_str().ok()
}

fn string_to_ptr(s: String) -> *mut c_char {
    CString::new(s).unwrap_or_default().into_raw()
}

fn write_out(out: *mut *mut c_char, val: String) {
    if !out.is_null() {
        unsafe { *out = string_to_ptr(val) };
    }
}

/// Run `body`, catch panics, map errors to FFI codes.
fn ffi_run(
    out: *mut *mut c_char,
    body: impl FnOnce() -> crate::error::Result<String> + std::panic::UnwindSafe,
) -> c_int {
    match std::panic::catch_unwind(body) {
        Ok(Ok(json)) => {
            write_out(out, json);
            0
        }
        Ok(Err(e)) => {
            let code = FfiErrorCode::from(&e) as c_int;
            set_last_error(&e.to_string());
            code
        }
        Err(_) => {
            set_last_error("internal panic");
            FfiErrorCode::InternalError as c_int
        }
    }
}

// ---------------------------------------------------------------------------
// Public FFI functions
// ---------------------------------------------------------------------------

/// Retrieve the last error message.  Returns the number of bytes written
/// (including the null terminator).  If `buf` is null or `buf_len` is 0,
/// returns the required buffer size.
#[no_mangle]
pub unsafe extern "C" fn licsign_last_error(buf: *mut u8, buf_len: usize) -> c_int {
    LAST_ERROR.with(|e| {
        let msg = e.borrow();
        let bytes = msg.as_bytes_with_nul();
        if buf.is_null() || buf_len == 0 {
            return bytes.len() as c_int;
        }
        let copy_len = bytes.len().min(buf_len);
        unsafe { std::ptr::copy_nonoverlapping(bytes.as_ptr(), buf, copy_len) };
        if copy_len < bytes.len() {
            unsafe { *buf.add(copy_len - 1) = 0 };
        }
        copy_len as c_int
    })
}

/// Free a string previously returned by a `licsign_*` function.
#[no_mangle]
pub unsafe extern "C" fn licsign_free_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        unsafe {
            drop(CString::from_raw(ptr));
        }
    }
}

/// Return the library version as a JSON string.
#[no_mangle]
pub unsafe extern "C" fn licsign_version(out_json: *mut *mut c_char) -> c_int {
    ffi_run(out_json, || {
        let info = serde_json::json!({
            "version": crate::util::VERSION,
            "git_hash": crate::util::GIT_HASH,
            "build_ts": crate::util::BUILD_TS,
            "target": crate::util::TARGET,
            "signature_kind": crate::signing::SIGNATURE_KIND,
        });
        Ok(info.to_string())
    })
}

/// Canonically encode a license record given as a JSON object.
/// The output is the exact byte string that gets signed.
#[no_mangle]
pub unsafe extern "C" fn licsign_canonical_encode(
    license_json: *const c_char,
    out_canonical: *mut *mut c_char,
) -> c_int {
    ffi_run(out_canonical, || {
        let text = unsafe { ptr_to_str(license_json) }
            .ok_or_else(|| LicsignError::Validation("license_json is null or not UTF-8".into()))?;
        let value: serde_json::Value = serde_json::from_str(text)
            .map_err(|e| LicsignError::MalformedRecord(format!("parse license JSON: {e}")))?;
        let bytes = crate::canonical::encode_value(value)?;
        Ok(bytes.as_str().to_string())
    })
}

/// Verify a bundle (JSON text) against a PEM public key.
///
/// On success `out_json` receives
/// `{"valid": bool, "reason": null | "signature_mismatch", "schema": ..., "license": {...} | null}`.
#[no_mangle]
pub unsafe extern "C" fn licsign_verify_bundle(
    public_key_pem: *const c_char,
    bundle_json: *const c_char,
    out_json: *mut *mut c_char,
) -> c_int {
    ffi_run(out_json, || {
        let pem = unsafe { ptr_to_str(public_key_pem) }
            .ok_or_else(|| LicsignError::Validation("public_key_pem is null or not UTF-8".into()))?;
        let text = unsafe { ptr_to_str(bundle_json) }
            .ok_or_else(|| LicsignError::Validation("bundle_json is null or not UTF-8".into()))?;

        let verifier = crate::verify::Verifier::from_public_key_pem(pem)?;
        let result = verifier.verify_json(text)?;
        let info = match &result {
            crate::verify::VerificationResult::Valid(record) => serde_json::json!({
                "valid": true,
                "reason": null,
                "schema": record.schema_version(),
                "license": record,
                "key_id": verifier.key_id(),
            }),
            crate::verify::VerificationResult::Invalid(reason) => serde_json::json!({
                "valid": false,
                "reason": reason,
                "schema": null,
                "license": null,
                "key_id": verifier.key_id(),
            }),
        };
        Ok(info.to_string())
    })
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
