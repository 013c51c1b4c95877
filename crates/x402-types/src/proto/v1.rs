//! Protocol version 1 (V1) types for x402.
//!
//! V1 identifies networks by name (e.g., "solana-devnet") instead of CAIP-2 chain IDs.
//!
//! # Key Types
//!
//! - [`X402Version1`] - Version marker
//! - [`Scheme`] - Closed set of payment scheme identifiers
//! - [`PaymentPayload`] - Signed payment proof from the buyer
//! - [`PaymentRequirements`] - Payment terms set by the seller
//!
//! Field names are snake_case on the wire. The camelCase spellings used by other
//! x402 implementations (`x402Version`, `maxAmountRequired`, `payTo`, ...) are
//! accepted as aliases.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fmt::Display;
use std::num::NonZeroU64;
use std::str::FromStr;

use crate::proto::PaymentVerificationError;
use crate::proto::util::TokenAmount;
use crate::timestamp::UnixTimestamp;

/// Version marker for x402 protocol version 1.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct X402Version1;

impl X402Version1 {
    pub const VALUE: u64 = 1;
}

impl PartialEq<u64> for X402Version1 {
    fn eq(&self, other: &u64) -> bool {
        *other == Self::VALUE
    }
}

impl From<X402Version1> for u64 {
    fn from(_: X402Version1) -> Self {
        X402Version1::VALUE
    }
}

impl Display for X402Version1 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", Self::VALUE)
    }
}

/// Payment scheme identifier.
///
/// The set is closed: an unrecognised string fails parsing. Recognising a scheme
/// does not imply a verifier exists for it; that is decided by the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scheme {
    /// Transfer of exactly the stated amount, or more.
    Exact,
    /// Transfer of up to the stated amount.
    Upto,
}

impl Scheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scheme::Exact => "exact",
            Scheme::Upto => "upto",
        }
    }
}

impl Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Scheme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "exact" => Ok(Scheme::Exact),
            "upto" => Ok(Scheme::Upto),
            other => Err(format!("unknown scheme '{other}'")),
        }
    }
}

/// A signed payment proof from the buyer.
///
/// The `payload` object is scheme-specific and stays untyped here; the verifier
/// selected for `(scheme, network)` decodes it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentPayload {
    /// Protocol version; compared against [`X402Version1`] by the verifier.
    #[serde(alias = "x402Version")]
    pub x402_version: u64,
    /// The payment scheme.
    pub scheme: Scheme,
    /// The network name (e.g., "solana-devnet").
    pub network: String,
    /// The scheme-specific signed payload.
    pub payload: serde_json::Map<String, serde_json::Value>,
    /// When the buyer produced the payload.
    pub timestamp: UnixTimestamp,
}

impl PaymentPayload {
    /// Parses and validates a payment payload document.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, PaymentVerificationError> {
        let payload: Self = serde_json::from_slice(bytes).map_err(|e| {
            PaymentVerificationError::InvalidFormat(format!("payment payload: {e}"))
        })?;
        payload.validate()?;
        Ok(payload)
    }

    pub fn validate(&self) -> Result<(), PaymentVerificationError> {
        if self.network.is_empty() {
            return Err(PaymentVerificationError::InvalidFormat(
                "payment payload: network must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Decodes the scheme-specific `payload` object into a concrete type.
    pub fn payload_as<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        T::deserialize(serde_json::Value::Object(self.payload.clone()))
    }
}

/// Payment requirements set by the seller.
///
/// Defines the terms under which a payment will be accepted, including
/// the amount, recipient, asset, and timing constraints.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct PaymentRequirements {
    /// The payment scheme.
    pub scheme: Scheme,
    /// The network name (e.g., "solana-devnet").
    pub network: String,
    /// The amount required, in the asset's smallest unit.
    #[serde(alias = "maxAmountRequired")]
    pub max_amount_required: TokenAmount,
    /// The asset identifier: a token mint address, or `"SOL"` for native transfers.
    pub asset: String,
    /// The recipient address.
    #[serde(alias = "payTo")]
    pub pay_to: String,
    /// The resource being paid for.
    #[serde(default)]
    pub resource: String,
    /// Human-readable description of the resource.
    #[serde(default)]
    pub description: String,
    /// MIME type of the resource.
    #[serde(default, alias = "mimeType")]
    pub mime_type: String,
    /// Maximum distance in seconds between the payload timestamp and the verification instant.
    #[serde(alias = "maxTimeoutSeconds")]
    pub max_timeout_seconds: NonZeroU64,
    /// Optional JSON schema for the resource output.
    #[serde(
        default,
        alias = "outputSchema",
        skip_serializing_if = "Option::is_none"
    )]
    pub output_schema: Option<serde_json::Value>,
    /// Scheme-specific extra data, preserved as-is.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra: Option<serde_json::Value>,
}

impl PaymentRequirements {
    /// Parses and validates a payment requirements document.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, PaymentVerificationError> {
        let requirements: Self = serde_json::from_slice(bytes).map_err(|e| {
            PaymentVerificationError::InvalidFormat(format!("payment requirements: {e}"))
        })?;
        requirements.validate()?;
        Ok(requirements)
    }

    pub fn validate(&self) -> Result<(), PaymentVerificationError> {
        for (field, value) in [
            ("network", &self.network),
            ("asset", &self.asset),
            ("pay_to", &self.pay_to),
        ] {
            if value.is_empty() {
                return Err(PaymentVerificationError::InvalidFormat(format!(
                    "payment requirements: {field} must not be empty"
                )));
            }
        }
        Ok(())
    }

    /// Decodes `extra` into a concrete type. Absent `extra` yields `None`.
    pub fn extra_as<T: DeserializeOwned>(&self) -> Result<Option<T>, PaymentVerificationError> {
        match &self.extra {
            None | Some(serde_json::Value::Null) => Ok(None),
            Some(value) => T::deserialize(value).map(Some).map_err(|e| {
                PaymentVerificationError::InvalidFormat(format!("payment requirements extra: {e}"))
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proto::ErrorReason;
    use serde_json::json;

    fn requirements_json() -> serde_json::Value {
        json!({
            "scheme": "exact",
            "network": "solana-devnet",
            "max_amount_required": "1000000",
            "asset": "SOL",
            "pay_to": "9xQeWvG816bUx9EPjHmaT23yvVM2ZWbrrpZb9PusVFin",
            "max_timeout_seconds": 30
        })
    }

    #[test]
    fn test_requirements_snake_case() {
        let bytes = serde_json::to_vec(&requirements_json()).unwrap();
        let req = PaymentRequirements::from_slice(&bytes).unwrap();
        assert_eq!(req.scheme, Scheme::Exact);
        assert_eq!(req.max_amount_required.inner(), 1_000_000);
        assert_eq!(req.max_timeout_seconds.get(), 30);
        assert!(req.extra.is_none());
        assert_eq!(req.resource, "");
    }

    #[test]
    fn test_requirements_camel_case_aliases() {
        let bytes = serde_json::to_vec(&json!({
            "scheme": "exact",
            "network": "solana",
            "maxAmountRequired": "5",
            "asset": "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v",
            "payTo": "9xQeWvG816bUx9EPjHmaT23yvVM2ZWbrrpZb9PusVFin",
            "mimeType": "application/json",
            "maxTimeoutSeconds": 60,
            "extra": {"feePayer": "9xQeWvG816bUx9EPjHmaT23yvVM2ZWbrrpZb9PusVFin", "unknown": [1, 2]}
        }))
        .unwrap();
        let req = PaymentRequirements::from_slice(&bytes).unwrap();
        assert_eq!(req.max_amount_required.inner(), 5);
        assert_eq!(req.mime_type, "application/json");
        assert_eq!(req.extra.unwrap()["unknown"], json!([1, 2]));
    }

    #[test]
    fn test_requirements_violations_are_malformed() {
        let cases = [
            ("max_amount_required", json!("1.5")),
            ("max_amount_required", json!(1000000)),
            ("max_timeout_seconds", json!(0)),
            ("scheme", json!("streaming")),
            ("pay_to", json!("")),
        ];
        for (field, value) in cases {
            let mut doc = requirements_json();
            doc[field] = value;
            let err = PaymentRequirements::from_slice(&serde_json::to_vec(&doc).unwrap())
                .unwrap_err();
            assert_eq!(err.reason(), ErrorReason::MalformedInput, "{field}");
        }
    }

    #[test]
    fn test_payload_parses_both_spellings() {
        let snake = br#"{"x402_version":1,"scheme":"exact","network":"solana-devnet","payload":{"transaction":"AA=="},"timestamp":1700000000}"#;
        let camel = br#"{"x402Version":1,"scheme":"exact","network":"solana-devnet","payload":{"transaction":"AA=="},"timestamp":"1700000000"}"#;
        let a = PaymentPayload::from_slice(snake).unwrap();
        let b = PaymentPayload::from_slice(camel).unwrap();
        assert_eq!(a, b);
        assert!(X402Version1 == a.x402_version);
    }

    #[test]
    fn test_payload_must_be_object() {
        let bytes = br#"{"x402_version":1,"scheme":"exact","network":"solana","payload":"AA==","timestamp":1}"#;
        let err = PaymentPayload::from_slice(bytes).unwrap_err();
        assert_eq!(err.reason(), ErrorReason::MalformedInput);
    }

    #[test]
    fn test_payload_errors_name_the_document() {
        let err = PaymentPayload::from_slice(b"{not json").unwrap_err();
        assert!(err.to_string().starts_with("payment payload:"));
        let err = PaymentPayload::from_slice(&[0xff, 0xfe]).unwrap_err();
        assert_eq!(err.reason(), ErrorReason::MalformedInput);
        let err = PaymentPayload::from_slice(
            br#"{"x402_version":1,"scheme":"exact","network":"solana","payload":{}}"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("timestamp"));
    }

    #[test]
    fn test_unsupported_version_still_parses() {
        let bytes = br#"{"x402_version":2,"scheme":"exact","network":"solana","payload":{},"timestamp":1}"#;
        let payload = PaymentPayload::from_slice(bytes).unwrap();
        assert!(X402Version1 != payload.x402_version);

        let bytes = br#"{"x402_version":256,"scheme":"exact","network":"solana","payload":{},"timestamp":1}"#;
        let payload = PaymentPayload::from_slice(bytes).unwrap();
        assert_eq!(payload.x402_version, 256);
        assert!(X402Version1 != payload.x402_version);
    }
}
