use solana_keypair::Keypair;
use solana_signer::Signer;
use std::ffi::{CStr, CString};
use std::ptr;
use std::thread;
use x402_chain_solana::chain::SolanaNetwork;
use x402_chain_solana::v1_solana_exact::{ExactPaymentBuilder, TransferAsset};
use x402_ffi::{
    OwnedVerifyResult, X402_ERR_CONFIG, X402_ERR_INVALID_ARGUMENT, X402_OK, x402_init_with_config,
    x402_verify_payment, x402_verify_payment_bytes, x402_version,
};
use x402_types::timestamp::UnixTimestamp;

fn init() {
    let config = CString::new("{}").unwrap();
    assert_eq!(unsafe { x402_init_with_config(config.as_ptr()) }, X402_OK);
}

fn verify(payment: &str, requirements: &str) -> OwnedVerifyResult {
    let payment = CString::new(payment).unwrap();
    let requirements = CString::new(requirements).unwrap();
    unsafe {
        OwnedVerifyResult::new(x402_verify_payment(
            payment.as_ptr(),
            requirements.as_ptr(),
        ))
    }
}

fn signed_payment(amount: u64, required: u64) -> (String, String, String) {
    let buyer = Keypair::new();
    let seller = Keypair::new();
    let builder = ExactPaymentBuilder::new(
        SolanaNetwork::Devnet,
        seller.pubkey(),
        TransferAsset::Native,
        amount,
    );
    let payload = builder
        .payment_payload(&buyer, UnixTimestamp::now())
        .unwrap();
    let mut requirements = builder.requirements();
    requirements.max_amount_required = required.into();
    (
        serde_json::to_string(&payload).unwrap(),
        serde_json::to_string(&requirements).unwrap(),
        buyer.pubkey().to_string(),
    )
}

#[test]
fn test_init_is_idempotent() {
    init();
    init();
    let other = CString::new(r#"{"networkTimeoutMs": 1}"#).unwrap();
    assert_eq!(unsafe { x402_init_with_config(other.as_ptr()) }, X402_OK);
}

#[test]
fn test_init_rejects_bad_arguments() {
    assert_eq!(
        unsafe { x402_init_with_config(ptr::null()) },
        X402_ERR_INVALID_ARGUMENT
    );
    let broken = CString::new("{ not json").unwrap();
    let code = unsafe { x402_init_with_config(broken.as_ptr()) };
    // A verifier created by a concurrently running test wins over the broken config.
    assert!(code == X402_ERR_CONFIG || code == X402_OK);
}

#[test]
fn test_version() {
    let version = unsafe { CStr::from_ptr(x402_version()) };
    assert_eq!(version.to_str().unwrap(), env!("CARGO_PKG_VERSION"));
}

#[test]
fn test_null_pointers() {
    init();
    let json = CString::new("{}").unwrap();
    let result = unsafe { OwnedVerifyResult::new(x402_verify_payment(ptr::null(), json.as_ptr())) };
    assert!(!result.is_valid());
    assert_eq!(
        result.error_message(),
        Some("malformed_input: payment_json is null")
    );

    let result = unsafe {
        OwnedVerifyResult::new(x402_verify_payment_bytes(
            json.as_ptr().cast(),
            2,
            ptr::null(),
            0,
        ))
    };
    assert_eq!(
        result.error_message(),
        Some("malformed_input: requirements is null")
    );
}

#[test]
fn test_malformed_json() {
    init();
    let result = verify("not json", "{}");
    assert!(!result.is_valid());
    assert!(result.payer().is_none());
    assert!(result.error_message().unwrap().starts_with("malformed_input: "));
}

#[test]
fn test_valid_native_payment() {
    init();
    let (payment, requirements, buyer) = signed_payment(1_000_000, 1_000_000);
    let result = verify(&payment, &requirements);
    assert!(result.is_valid(), "{:?}", result.error_message());
    assert_eq!(result.payer(), Some(buyer.as_str()));
    assert!(result.error_message().is_none());
}

#[test]
fn test_underpayment_via_bytes() {
    init();
    let (payment, requirements, _) = signed_payment(999_999, 1_000_000);
    let result = unsafe {
        OwnedVerifyResult::new(x402_verify_payment_bytes(
            payment.as_ptr(),
            payment.len(),
            requirements.as_ptr(),
            requirements.len(),
        ))
    };
    assert!(!result.is_valid());
    assert!(
        result
            .error_message()
            .unwrap()
            .starts_with("insufficient_amount: ")
    );
}

#[test]
fn test_concurrent_verification() {
    init();
    let handles: Vec<_> = (0..8)
        .map(|i| {
            thread::spawn(move || {
                let (payment, requirements, buyer) = signed_payment(1_000 + i, 1_000);
                let result = verify(&payment, &requirements);
                assert!(result.is_valid(), "{:?}", result.error_message());
                assert_eq!(result.payer(), Some(buyer.as_str()));
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
}
