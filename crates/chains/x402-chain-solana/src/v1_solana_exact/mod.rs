//! V1 Solana "exact" payment scheme implementation.
//!
//! This module implements the "exact" payment scheme for Solana using
//! the V1 x402 protocol. The buyer signs a transaction that moves at least the
//! required amount to the seller, either as an SPL `TransferChecked` or as a
//! native System transfer.
//!
//! # Features
//!
//! - SPL Token and Token-2022 program support
//! - Native SOL transfers (asset `"SOL"`)
//! - Compute budget instruction validation
//! - Fee payer safety checks
//! - Configurable instruction allowlists/blocklists
//! - Optional on-chain account and confirmation checks
//!
//! # Transaction Structure
//!
//! The expected transaction structure is:
//! - Leading `SetComputeUnitLimit` / `SetComputeUnitPrice` instructions, each at most once
//! - One `TransferChecked` (SPL Token or Token-2022) or System `Transfer`
//! - Additional instructions (if allowed by configuration)

pub mod client;
pub mod signature;
pub mod types;
pub mod verifier;

pub use client::*;
pub use types::*;
pub use verifier::*;

use x402_types::proto::v1::Scheme;
use x402_types::scheme::{
    BuildContext, SchemeSlug, X402SchemeBlueprint, X402SchemeVerifier,
};

use crate::chain::SolanaNetwork;
use crate::networks::KnownNetworkSolana;

/// Blueprint for `exact` on every known Solana network name.
pub struct V1SolanaExact;

impl V1SolanaExact {
    pub fn scheme(&self) -> Scheme {
        Scheme::Exact
    }
}

impl X402SchemeBlueprint for V1SolanaExact {
    fn slugs(&self) -> Vec<SchemeSlug> {
        [SolanaNetwork::solana(), SolanaNetwork::solana_devnet()]
            .iter()
            .flat_map(|network| network.network_names())
            .map(|name| SchemeSlug::new(self.scheme(), name))
            .collect()
    }

    fn build(
        &self,
        slug: &SchemeSlug,
        context: &BuildContext,
    ) -> Result<Box<dyn X402SchemeVerifier>, Box<dyn std::error::Error + Send + Sync>> {
        if slug.scheme != self.scheme() {
            return Err(format!("scheme {} is not served by V1SolanaExact", slug.scheme).into());
        }
        let network = SolanaNetwork::from_network_name(&slug.network)
            .ok_or_else(|| format!("unknown Solana network {}", slug.network))?;
        let config = context
            .config
            .clone()
            .map(serde_json::from_value::<V1SolanaExactConfig>)
            .transpose()?
            .unwrap_or_default();
        if config.needs_network() && context.network_client.is_none() {
            #[cfg(feature = "telemetry")]
            tracing::warn!(
                "Scheme {} needs a network client, but none is configured; on-chain checks will fail as network_unavailable",
                slug
            );
        }
        Ok(Box::new(V1SolanaExactVerifier::new(
            network,
            config,
            context.network_client.clone(),
        )))
    }
}
