//! Registry of well-known x402 v1 network names.
//!
//! x402 v1 identifies networks by short human-readable names (`"solana"`,
//! `"solana-devnet"`) rather than CAIP-2 chain IDs. This module keeps the names
//! this library knows about and records which names are aliases of another.
//!
//! Network comparison during verification is always an exact string comparison.
//! Aliases only matter when building the registry: a verifier for the canonical
//! network is also registered under each of its aliases.
//!
//! ```
//! use x402_types::networks::{network_by_name, canonical_network_name};
//!
//! let devnet = network_by_name("solana-devnet").unwrap();
//! assert_eq!(devnet.canonical_name(), "solana-devnet");
//! assert_eq!(canonical_network_name("solana-mainnet"), Some("solana"));
//! assert_eq!(canonical_network_name("base"), None);
//! ```

/// A known network definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkInfo {
    /// Network name as it appears in payloads (e.g., "solana-devnet").
    pub name: &'static str,
    /// The canonical name this entry is an alias of, if any.
    pub alias_of: Option<&'static str>,
}

impl NetworkInfo {
    /// Returns the name of the network this entry stands for.
    pub fn canonical_name(&self) -> &'static str {
        self.alias_of.unwrap_or(self.name)
    }
}

pub static KNOWN_NETWORKS: &[NetworkInfo] = &[
    NetworkInfo {
        name: "solana",
        alias_of: None,
    },
    NetworkInfo {
        name: "solana-mainnet",
        alias_of: Some("solana"),
    },
    NetworkInfo {
        name: "solana-devnet",
        alias_of: None,
    },
];

/// Looks up a known network by its exact name.
pub fn network_by_name(name: &str) -> Option<&'static NetworkInfo> {
    KNOWN_NETWORKS.iter().find(|n| n.name == name)
}

/// Resolves a name, possibly an alias, to the canonical network name.
pub fn canonical_network_name(name: &str) -> Option<&'static str> {
    network_by_name(name).map(NetworkInfo::canonical_name)
}

/// Returns every known name (canonical and aliases) that stands for `canonical`.
pub fn names_for(canonical: &str) -> impl Iterator<Item = &'static str> + '_ {
    KNOWN_NETWORKS
        .iter()
        .filter(move |n| n.canonical_name() == canonical)
        .map(|n| n.name)
}

/// Marker for USDC token deployments; chain crates implement per-network lookups on it.
#[allow(clippy::upper_case_acronyms)]
pub struct USDC;
