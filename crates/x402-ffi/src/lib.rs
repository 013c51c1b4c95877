#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! C ABI for x402 payment verification.
//!
//! This crate packages the scheme registry from [`x402_types`] and the Solana verifier
//! from [`x402_chain_solana`] behind a handful of `extern "C"` functions, so that hosts
//! written in any language can check a payment proof with one call.
//!
//! # Lifecycle
//!
//! 1. Call [`x402_init`] (or [`x402_init_with_config`]) once. Later calls return `0`
//!    without re-initializing.
//! 2. Call [`x402_verify_payment`] from any number of threads.
//! 3. Release each returned [`CVerifyResult`] with [`x402_free_result`] or
//!    [`x402_release_result`].
//!
//! Rust callers can skip the global handle and own an [`X402Verifier`] directly.
//!
//! # Configuration
//!
//! [`x402_init`] loads `.env`, then reads the JSON file named by `X402_CONFIG`. See
//! [`VerifierConfig`] for the format. Log output is controlled by `X402_LOG`.
//!
//! # Feature Flags
//!
//! - `telemetry` (default) - Installs a `tracing` subscriber on init and logs verification

mod config;
mod ffi;
#[cfg(feature = "telemetry")]
pub mod telemetry;
mod verifier;

pub use config::{CONFIG_PATH_ENV, ConfigError, VerifierConfig};
pub use ffi::*;
pub use verifier::{InitError, X402Verifier, scheme_blueprints};
