//! Solana chain types for x402 payment verification.
//!
//! # Key Types
//!
//! - [`SolanaNetwork`] - A well-known Solana network, resolved from its x402 v1 name
//! - [`SolanaTokenDeployment`] - Token mint information including token program and decimals
//! - [`Address`] - A Solana public key (base58-encoded)
//!
//! With the `rpc` feature, [`rpc::SolanaRpcNetworkClient`] answers on-chain questions
//! over Solana JSON-RPC.

pub mod types;
pub use types::*;

#[cfg(feature = "rpc")]
pub mod rpc;
