//! Utility types and functions for x402.
//!
//! - [`b64`] - Base64 encoding/decoding utilities

pub mod b64;

pub use b64::*;
