use solana_pubkey::pubkey;
use x402_types::networks::USDC;

use crate::chain::{SolanaNetwork, SolanaTokenDeployment};

/// Per-network instances for well-known Solana networks.
///
/// Implemented for network identifiers and for token markers such as [`USDC`],
/// so per-network data reads the same way everywhere:
///
/// ```
/// use x402_chain_solana::KnownNetworkSolana;
/// use x402_types::networks::USDC;
///
/// let usdc = USDC::solana_devnet();
/// assert_eq!(usdc.decimals, 6);
/// assert_eq!(usdc.address.to_string(), "4zMMC9srt5Ri5X14GAgXhaHii3GnPAEERYPJgZJDncDU");
/// ```
pub trait KnownNetworkSolana<A> {
    /// Returns the instance for Solana mainnet (solana:5eykt4UsFv8P8NJdTREpY1vzqKqZKvdp)
    fn solana() -> A;
    /// Returns the instance for Solana devnet (solana:EtWTRABZaYq6iMfeYKouRu166VU2xqa1)
    fn solana_devnet() -> A;
}

impl KnownNetworkSolana<SolanaTokenDeployment> for USDC {
    fn solana() -> SolanaTokenDeployment {
        let address = pubkey!("EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v");
        SolanaTokenDeployment::new(SolanaNetwork::Mainnet, address.into(), spl_token::ID, 6)
    }

    fn solana_devnet() -> SolanaTokenDeployment {
        let address = pubkey!("4zMMC9srt5Ri5X14GAgXhaHii3GnPAEERYPJgZJDncDU");
        SolanaTokenDeployment::new(SolanaNetwork::Devnet, address.into(), spl_token::ID, 6)
    }
}

/// Returns the USDC deployment on `network`.
pub fn usdc_deployment(network: SolanaNetwork) -> SolanaTokenDeployment {
    match network {
        SolanaNetwork::Mainnet => USDC::solana(),
        SolanaNetwork::Devnet => USDC::solana_devnet(),
    }
}
