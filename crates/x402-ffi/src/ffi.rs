//! The C ABI.
//!
//! The library keeps one process-wide [`X402Verifier`], created by [`x402_init`] or
//! [`x402_init_with_config`]. Every [`CVerifyResult`] returned by a verify call owns its
//! strings; release it exactly once with [`x402_free_result`] or [`x402_release_result`].
//!
//! No function here unwinds into the caller: panics are caught and reported through the
//! return value.

use once_cell::sync::OnceCell;
use std::ffi::{CStr, CString, c_char};
use std::panic::{self, AssertUnwindSafe};
use std::ptr;
use x402_types::proto::VerifyResponse;

use crate::config::{ConfigError, VerifierConfig};
use crate::verifier::{InitError, X402Verifier};

pub const X402_OK: i32 = 0;
pub const X402_ERR_CONFIG: i32 = -1;
pub const X402_ERR_RUNTIME: i32 = -2;
pub const X402_ERR_PANIC: i32 = -3;
pub const X402_ERR_INVALID_ARGUMENT: i32 = -4;

static VERIFIER: OnceCell<X402Verifier> = OnceCell::new();

static VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), "\0");

/// Verification verdict handed to C callers.
///
/// Exactly one of `error_message` and `payer` is non-null. Both are NUL-terminated
/// UTF-8 strings owned by the library until released.
#[repr(C)]
#[derive(Debug)]
pub struct CVerifyResult {
    pub is_valid: bool,
    pub error_message: *mut c_char,
    pub payer: *mut c_char,
}

impl CVerifyResult {
    fn invalid(message: String) -> Self {
        Self {
            is_valid: false,
            error_message: into_c_string(message),
            payer: ptr::null_mut(),
        }
    }
}

impl From<VerifyResponse> for CVerifyResult {
    fn from(response: VerifyResponse) -> Self {
        match response {
            VerifyResponse::Valid { payer } => Self {
                is_valid: true,
                error_message: ptr::null_mut(),
                payer: into_c_string(payer),
            },
            invalid => Self::invalid(invalid.error_message().unwrap_or_default()),
        }
    }
}

/// Allocates a C string, replacing interior NULs so the allocation cannot fail.
fn into_c_string(value: String) -> *mut c_char {
    let value = if value.contains('\0') {
        value.replace('\0', "\u{FFFD}")
    } else {
        value
    };
    CString::new(value)
        .map(CString::into_raw)
        .unwrap_or(ptr::null_mut())
}

/// # Safety
/// `ptr` must be null or have been returned by [`into_c_string`] and not yet released.
unsafe fn drop_c_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        drop(unsafe { CString::from_raw(ptr) });
    }
}

fn init_with<F>(load: F) -> i32
where
    F: FnOnce() -> Result<VerifierConfig, ConfigError>,
{
    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        #[cfg(feature = "telemetry")]
        crate::telemetry::init();
        VERIFIER
            .get_or_try_init(|| X402Verifier::initialize(load()?))
            .map(|_| ())
    }));
    match result {
        Ok(Ok(())) => X402_OK,
        Ok(Err(InitError::Config(_error))) => {
            #[cfg(feature = "telemetry")]
            tracing::error!("x402 initialization failed: {}", _error);
            X402_ERR_CONFIG
        }
        Ok(Err(InitError::Runtime(_error))) => {
            #[cfg(feature = "telemetry")]
            tracing::error!("x402 initialization failed: {}", _error);
            X402_ERR_RUNTIME
        }
        Err(_) => X402_ERR_PANIC,
    }
}

fn with_verifier<F>(verify: F) -> CVerifyResult
where
    F: FnOnce(&X402Verifier) -> VerifyResponse,
{
    let Some(verifier) = VERIFIER.get() else {
        return CVerifyResult::invalid(
            "not_initialized: x402_init must succeed before verifying".to_string(),
        );
    };
    match panic::catch_unwind(AssertUnwindSafe(|| verify(verifier))) {
        Ok(response) => response.into(),
        Err(_) => {
            #[cfg(feature = "telemetry")]
            tracing::error!("x402 verification panicked");
            CVerifyResult::invalid("internal_error: verification panicked".to_string())
        }
    }
}

fn null_argument(name: &str) -> CVerifyResult {
    CVerifyResult::invalid(format!("malformed_input: {name} is null"))
}

/// Initializes the library from the environment.
///
/// Loads `.env`, installs logging, and reads the JSON file named by `X402_CONFIG`
/// (defaults when unset). Idempotent: returns 0 once a verifier exists.
#[unsafe(no_mangle)]
pub extern "C" fn x402_init() -> i32 {
    dotenvy::dotenv().ok();
    init_with(VerifierConfig::from_env)
}

/// Initializes the library from a NUL-terminated JSON configuration.
///
/// Ignored, returning 0, if the library is already initialized.
///
/// # Safety
/// `config_json` must be null or point to a NUL-terminated string valid for the call.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn x402_init_with_config(config_json: *const c_char) -> i32 {
    if config_json.is_null() {
        return X402_ERR_INVALID_ARGUMENT;
    }
    let Ok(config_json) = unsafe { CStr::from_ptr(config_json) }.to_str() else {
        return X402_ERR_INVALID_ARGUMENT;
    };
    init_with(|| VerifierConfig::from_json(config_json))
}

/// Returns the library version as a static NUL-terminated string. Do not free it.
#[unsafe(no_mangle)]
pub extern "C" fn x402_version() -> *const c_char {
    VERSION.as_ptr().cast()
}

/// Verifies a payment given two NUL-terminated JSON documents.
///
/// # Safety
/// Each argument must be null or point to a NUL-terminated string valid for the call.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn x402_verify_payment(
    payment_json: *const c_char,
    requirements_json: *const c_char,
) -> CVerifyResult {
    if payment_json.is_null() {
        return null_argument("payment_json");
    }
    if requirements_json.is_null() {
        return null_argument("requirements_json");
    }
    let payment = unsafe { CStr::from_ptr(payment_json) }.to_bytes();
    let requirements = unsafe { CStr::from_ptr(requirements_json) }.to_bytes();
    with_verifier(|verifier| verifier.verify_blocking(payment, requirements))
}

/// Verifies a payment given two length-delimited JSON buffers.
///
/// # Safety
/// Each pointer must be null or valid for reads of its length for the duration of the call.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn x402_verify_payment_bytes(
    payment: *const u8,
    payment_len: usize,
    requirements: *const u8,
    requirements_len: usize,
) -> CVerifyResult {
    if payment.is_null() {
        return null_argument("payment");
    }
    if requirements.is_null() {
        return null_argument("requirements");
    }
    let payment = unsafe { std::slice::from_raw_parts(payment, payment_len) };
    let requirements = unsafe { std::slice::from_raw_parts(requirements, requirements_len) };
    with_verifier(|verifier| verifier.verify_blocking(payment, requirements))
}

/// Releases the strings of a result passed by value.
///
/// # Safety
/// `result` must come from a verify call and must not have been released before.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn x402_free_result(result: CVerifyResult) {
    unsafe {
        drop_c_string(result.error_message);
        drop_c_string(result.payer);
    }
}

/// Releases the strings of a result in place and nulls them, so a second call is a no-op.
///
/// # Safety
/// `result` must be null or point to a result produced by a verify call.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn x402_release_result(result: *mut CVerifyResult) {
    let Some(result) = (unsafe { result.as_mut() }) else {
        return;
    };
    unsafe {
        drop_c_string(result.error_message);
        drop_c_string(result.payer);
    }
    result.error_message = ptr::null_mut();
    result.payer = ptr::null_mut();
}

/// Releases a string allocated by this library.
///
/// # Safety
/// `s` must be null or a string returned by this library that was not released before.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn x402_free_string(s: *mut c_char) {
    unsafe { drop_c_string(s) };
}

/// Owns a [`CVerifyResult`] and releases it on drop.
#[derive(Debug)]
pub struct OwnedVerifyResult(CVerifyResult);

impl OwnedVerifyResult {
    /// # Safety
    /// `result` must come from a verify call and must not be released elsewhere.
    pub unsafe fn new(result: CVerifyResult) -> Self {
        Self(result)
    }

    pub fn is_valid(&self) -> bool {
        self.0.is_valid
    }

    pub fn error_message(&self) -> Option<&str> {
        unsafe { borrow_c_str(self.0.error_message) }
    }

    pub fn payer(&self) -> Option<&str> {
        unsafe { borrow_c_str(self.0.payer) }
    }
}

impl Drop for OwnedVerifyResult {
    fn drop(&mut self) {
        unsafe { x402_release_result(&mut self.0) };
    }
}

/// # Safety
/// `ptr` must be null or a live NUL-terminated string.
unsafe fn borrow_c_str<'a>(ptr: *const c_char) -> Option<&'a str> {
    if ptr.is_null() {
        return None;
    }
    unsafe { CStr::from_ptr(ptr) }.to_str().ok()
}
