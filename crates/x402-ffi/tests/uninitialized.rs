use std::ffi::CString;
use x402_ffi::{OwnedVerifyResult, x402_verify_payment};

#[test]
fn test_verify_before_init() {
    let json = CString::new("{}").unwrap();
    let result = unsafe { OwnedVerifyResult::new(x402_verify_payment(json.as_ptr(), json.as_ptr())) };
    assert!(!result.is_valid());
    assert!(result.payer().is_none());
    assert!(
        result
            .error_message()
            .unwrap()
            .starts_with("not_initialized: ")
    );
}
