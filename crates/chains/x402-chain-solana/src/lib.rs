#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! Solana chain support for x402 payment verification.
//!
//! This crate verifies x402 v1 "exact" payments on Solana. A payment is a
//! buyer-signed transaction moving SPL tokens (`TransferChecked`) or native SOL
//! (System `Transfer`) to the seller; verification is offline by default.
//!
//! # Architecture
//!
//! - [`chain`] - Core Solana chain types, and with `rpc` a JSON-RPC network client
//! - [`v1_solana_exact`] - The exact scheme: verifier, configuration and offline payment builder
//!
//! # Feature Flags
//!
//! - `rpc` - [`chain::rpc::SolanaRpcNetworkClient`] for on-chain account and confirmation checks
//! - `telemetry` - Tracing support
//!
//! # Usage
//!
//! ```
//! use x402_chain_solana::V1SolanaExact;
//! use x402_types::scheme::{BuildContext, SchemeBlueprints, SchemeRegistry};
//!
//! let blueprints = SchemeBlueprints::new().and_register(V1SolanaExact);
//! let registry = SchemeRegistry::build(&blueprints, &[], &BuildContext::default());
//! assert!(registry.slugs().any(|s| s.to_string() == "exact:solana-devnet"));
//! ```

pub mod chain;
pub mod v1_solana_exact;

mod networks;
pub use networks::*;

pub use v1_solana_exact::{ExactPaymentBuilder, TransferAsset, V1SolanaExact, V1SolanaExactConfig};
