//! Protocol types for x402 payment verification.
//!
//! This module defines the verdict produced by verification and the error taxonomy
//! every verifier reports through.
//!
//! # Key Types
//!
//! - [`VerifyResponse`] - The outcome of a verification: `Valid` or `Invalid`
//! - [`PaymentVerificationError`] - Errors that can occur during verification
//! - [`ErrorReason`] - Machine-readable reason codes
//! - [`PaymentProblem`] - Reason code plus human-readable details
//!
//! # Wire Format
//!
//! Payloads and requirements use snake_case field names, with camelCase aliases
//! accepted for compatibility with other x402 implementations. See [`v1`].

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::{Display, Formatter};

pub mod util;
pub mod v1;

/// Errors that can occur during payment verification.
///
/// Each variant maps onto exactly one [`ErrorReason`]; the attached data
/// becomes the human-readable details of the resulting [`PaymentProblem`].
#[derive(Debug, thiserror::Error)]
pub enum PaymentVerificationError {
    /// An input document is not valid structured data or violates the data model.
    #[error("{0}")]
    InvalidFormat(String),
    /// The payload declares a protocol version this library does not speak.
    #[error("Unsupported x402 version {0}")]
    UnsupportedVersion(u64),
    /// No verifier is registered for the requested scheme and network.
    #[error("Unsupported scheme {0}")]
    UnsupportedScheme(String),
    /// Payload and requirements name different networks.
    #[error("Payload network {payload} does not match required network {required}")]
    NetworkMismatch { payload: String, required: String },
    /// The scheme-specific payload could not be decoded or has a forbidden shape.
    #[error("{0}")]
    InvalidPayloadStructure(String),
    /// The authenticity proof does not bind the sender to the payload.
    #[error("{0}")]
    InvalidSignature(String),
    /// The payment recipient doesn't match the requirements.
    #[error("Payment recipient is invalid with respect to the payment requirements")]
    RecipientMismatch,
    /// The payment asset doesn't match the requirements.
    #[error("Payment asset {actual} does not match required asset {expected}")]
    AssetMismatch { expected: String, actual: String },
    /// The payment does not cover the required amount.
    #[error("paid {paid}, required {required}")]
    InsufficientAmount { paid: u64, required: u64 },
    /// The payload timestamp is older than the allowed window.
    #[error("Payment timestamp {timestamp} is older than {max_timeout_seconds}s at {now}")]
    Expired {
        timestamp: u64,
        now: u64,
        max_timeout_seconds: u64,
    },
    /// The payload timestamp is further in the future than the allowed window.
    #[error("Payment timestamp {timestamp} is more than {max_timeout_seconds}s ahead of {now}")]
    NotYetValid {
        timestamp: u64,
        now: u64,
        max_timeout_seconds: u64,
    },
    /// The network client could not answer in time, or is not configured.
    #[error("{0}")]
    NetworkUnavailable(String),
    /// The network has no successful transaction for the given reference.
    #[error("{0}")]
    TransactionNotFound(String),
}

impl PaymentVerificationError {
    /// Returns the machine-readable reason code for this error.
    pub fn reason(&self) -> ErrorReason {
        match self {
            PaymentVerificationError::InvalidFormat(_) => ErrorReason::MalformedInput,
            PaymentVerificationError::UnsupportedVersion(_) => ErrorReason::UnsupportedVersion,
            PaymentVerificationError::UnsupportedScheme(_) => ErrorReason::UnsupportedScheme,
            PaymentVerificationError::NetworkMismatch { .. } => ErrorReason::NetworkMismatch,
            PaymentVerificationError::InvalidPayloadStructure(_) => {
                ErrorReason::InvalidPayloadStructure
            }
            PaymentVerificationError::InvalidSignature(_) => ErrorReason::InvalidSignature,
            PaymentVerificationError::RecipientMismatch => ErrorReason::RecipientMismatch,
            PaymentVerificationError::AssetMismatch { .. } => ErrorReason::AssetMismatch,
            PaymentVerificationError::InsufficientAmount { .. } => {
                ErrorReason::InsufficientAmount
            }
            PaymentVerificationError::Expired { .. } => ErrorReason::Expired,
            PaymentVerificationError::NotYetValid { .. } => ErrorReason::NotYetValid,
            PaymentVerificationError::NetworkUnavailable(_) => ErrorReason::NetworkUnavailable,
            PaymentVerificationError::TransactionNotFound(_) => ErrorReason::TransactionNotFound,
        }
    }
}

impl AsPaymentProblem for PaymentVerificationError {
    fn as_payment_problem(&self) -> PaymentProblem {
        PaymentProblem::new(self.reason(), self.to_string())
    }
}

impl From<serde_json::Error> for PaymentVerificationError {
    fn from(value: serde_json::Error) -> Self {
        Self::InvalidFormat(value.to_string())
    }
}

/// Machine-readable error reason codes for payment failures.
///
/// These codes cross the C boundary as the prefix of the error message, so
/// callers can branch on them, e.g. to retry only on [`ErrorReason::NetworkUnavailable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorReason {
    /// An input document is not valid structured data.
    MalformedInput,
    /// The protocol version is not supported.
    UnsupportedVersion,
    /// No verifier exists for the scheme and network.
    UnsupportedScheme,
    /// Payload and requirements name different networks.
    NetworkMismatch,
    /// The scheme-specific payload is malformed or has a forbidden shape.
    InvalidPayloadStructure,
    /// The signature is invalid.
    InvalidSignature,
    /// The recipient address doesn't match.
    RecipientMismatch,
    /// The asset doesn't match.
    AssetMismatch,
    /// The amount does not cover the requirement.
    InsufficientAmount,
    /// The payment is too old.
    Expired,
    /// The payment is dated too far in the future.
    NotYetValid,
    /// The network client failed or timed out.
    NetworkUnavailable,
    /// The referenced transaction did not land successfully.
    TransactionNotFound,
}

impl ErrorReason {
    /// Returns the snake_case reason code.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorReason::MalformedInput => "malformed_input",
            ErrorReason::UnsupportedVersion => "unsupported_version",
            ErrorReason::UnsupportedScheme => "unsupported_scheme",
            ErrorReason::NetworkMismatch => "network_mismatch",
            ErrorReason::InvalidPayloadStructure => "invalid_payload_structure",
            ErrorReason::InvalidSignature => "invalid_signature",
            ErrorReason::RecipientMismatch => "recipient_mismatch",
            ErrorReason::AssetMismatch => "asset_mismatch",
            ErrorReason::InsufficientAmount => "insufficient_amount",
            ErrorReason::Expired => "expired",
            ErrorReason::NotYetValid => "not_yet_valid",
            ErrorReason::NetworkUnavailable => "network_unavailable",
            ErrorReason::TransactionNotFound => "transaction_not_found",
        }
    }

    /// Whether the failure depends on the environment rather than on the payload itself.
    ///
    /// Retrying a call that failed for a transient reason may succeed; retrying any
    /// other failure with the same inputs yields the same verdict.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ErrorReason::NetworkUnavailable | ErrorReason::TransactionNotFound
        )
    }
}

impl Display for ErrorReason {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Trait for converting errors into structured payment problems.
pub trait AsPaymentProblem {
    /// Converts this error into a [`PaymentProblem`].
    fn as_payment_problem(&self) -> PaymentProblem;
}

/// A structured payment error with reason code and details.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentProblem {
    /// The machine-readable error reason.
    reason: ErrorReason,
    /// Human-readable error details.
    details: String,
}

impl PaymentProblem {
    /// Creates a new payment problem with the given reason and details.
    pub fn new(reason: ErrorReason, details: String) -> Self {
        Self { reason, details }
    }

    /// Returns the error reason code.
    pub fn reason(&self) -> ErrorReason {
        self.reason
    }

    /// Returns the human-readable error details.
    pub fn details(&self) -> &str {
        &self.details
    }
}

/// Result of verifying a payment payload against payment requirements.
///
/// Exactly one of the two shapes is ever produced: a valid verdict always names
/// the payer, an invalid one always carries a reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifyResponse {
    /// The payload matches the requirements and passes all checks.
    Valid { payer: String },
    /// The payload failed verification for the given reason.
    Invalid {
        reason: ErrorReason,
        details: String,
    },
}

impl VerifyResponse {
    /// Constructs a successful verification response with the given `payer` address.
    pub fn valid(payer: String) -> Self {
        VerifyResponse::Valid { payer }
    }

    /// Constructs a failed verification response.
    pub fn invalid(reason: ErrorReason, details: String) -> Self {
        VerifyResponse::Invalid { reason, details }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, VerifyResponse::Valid { .. })
    }

    pub fn payer(&self) -> Option<&str> {
        match self {
            VerifyResponse::Valid { payer } => Some(payer),
            VerifyResponse::Invalid { .. } => None,
        }
    }

    pub fn reason(&self) -> Option<ErrorReason> {
        match self {
            VerifyResponse::Valid { .. } => None,
            VerifyResponse::Invalid { reason, .. } => Some(*reason),
        }
    }

    /// Formats the failure as `"<reason_code>: <details>"`, the shape used at the C boundary.
    pub fn error_message(&self) -> Option<String> {
        match self {
            VerifyResponse::Valid { .. } => None,
            VerifyResponse::Invalid { reason, details } => Some(format!("{reason}: {details}")),
        }
    }
}

impl From<PaymentVerificationError> for VerifyResponse {
    fn from(error: PaymentVerificationError) -> Self {
        let problem = error.as_payment_problem();
        VerifyResponse::Invalid {
            reason: problem.reason,
            details: problem.details,
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VerifyResponseWire {
    is_valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    payer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    invalid_reason: Option<ErrorReason>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    invalid_details: Option<String>,
}

impl Serialize for VerifyResponse {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let wire = match self {
            VerifyResponse::Valid { payer } => VerifyResponseWire {
                is_valid: true,
                payer: Some(payer.clone()),
                invalid_reason: None,
                invalid_details: None,
            },
            VerifyResponse::Invalid { reason, details } => VerifyResponseWire {
                is_valid: false,
                payer: None,
                invalid_reason: Some(*reason),
                invalid_details: Some(details.clone()),
            },
        };
        wire.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for VerifyResponse {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let wire = VerifyResponseWire::deserialize(deserializer)?;
        match wire.is_valid {
            true => {
                let payer = wire
                    .payer
                    .ok_or_else(|| serde::de::Error::missing_field("payer"))?;
                Ok(VerifyResponse::Valid { payer })
            }
            false => {
                let reason = wire
                    .invalid_reason
                    .ok_or_else(|| serde::de::Error::missing_field("invalidReason"))?;
                Ok(VerifyResponse::Invalid {
                    reason,
                    details: wire.invalid_details.unwrap_or_default(),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_message_starts_with_reason_code() {
        let response: VerifyResponse = PaymentVerificationError::InsufficientAmount {
            paid: 999_999,
            required: 1_000_000,
        }
        .into();
        assert_eq!(response.reason(), Some(ErrorReason::InsufficientAmount));
        assert_eq!(
            response.error_message().as_deref(),
            Some("insufficient_amount: paid 999999, required 1000000")
        );
        assert!(response.payer().is_none());
    }

    #[test]
    fn test_valid_has_payer_and_no_message() {
        let response = VerifyResponse::valid("payer".to_string());
        assert!(response.is_valid());
        assert_eq!(response.payer(), Some("payer"));
        assert!(response.error_message().is_none());
    }

    #[test]
    fn test_wire_format() {
        let response = VerifyResponse::invalid(ErrorReason::Expired, "too old".to_string());
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "isValid": false,
                "invalidReason": "expired",
                "invalidDetails": "too old"
            })
        );
        let back: VerifyResponse = serde_json::from_value(json).unwrap();
        assert_eq!(back, response);
    }

    #[test]
    fn test_reason_codes_match_serde_names() {
        for reason in [
            ErrorReason::MalformedInput,
            ErrorReason::NetworkMismatch,
            ErrorReason::InvalidPayloadStructure,
            ErrorReason::TransactionNotFound,
        ] {
            let json = serde_json::to_value(reason).unwrap();
            assert_eq!(json, serde_json::Value::String(reason.as_str().to_string()));
        }
    }

    #[test]
    fn test_transient_reasons() {
        assert!(ErrorReason::NetworkUnavailable.is_transient());
        assert!(ErrorReason::TransactionNotFound.is_transient());
        assert!(!ErrorReason::InvalidSignature.is_transient());
    }
}
