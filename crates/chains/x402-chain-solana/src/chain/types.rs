use serde::{Deserialize, Deserializer, Serialize, Serializer};
use solana_pubkey::{Pubkey, pubkey};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use crate::networks::KnownNetworkSolana;

/// Associated Token Account program.
pub const ATA_PROGRAM_PUBKEY: Pubkey = pubkey!("ATokenGPvbdGVxr1b2hvZbsiqW5xWH25efTNsLJA8knL");

/// A well-known Solana network addressed by its x402 v1 name.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SolanaNetwork {
    Mainnet,
    Devnet,
}

impl SolanaNetwork {
    /// Resolves an x402 v1 network name, including aliases such as `solana-mainnet`.
    pub fn from_network_name(name: &str) -> Option<Self> {
        match x402_types::networks::canonical_network_name(name)? {
            "solana" => Some(SolanaNetwork::Mainnet),
            "solana-devnet" => Some(SolanaNetwork::Devnet),
            _ => None,
        }
    }

    /// The canonical x402 v1 name of this network.
    pub fn network_name(&self) -> &'static str {
        match self {
            SolanaNetwork::Mainnet => "solana",
            SolanaNetwork::Devnet => "solana-devnet",
        }
    }

    /// Every x402 v1 name that stands for this network.
    pub fn network_names(&self) -> Vec<&'static str> {
        x402_types::networks::names_for(self.network_name()).collect()
    }
}

impl KnownNetworkSolana<SolanaNetwork> for SolanaNetwork {
    fn solana() -> Self {
        SolanaNetwork::Mainnet
    }

    fn solana_devnet() -> Self {
        SolanaNetwork::Devnet
    }
}

impl Display for SolanaNetwork {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.network_name())
    }
}

/// An SPL token mint deployed on a Solana network.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct SolanaTokenDeployment {
    pub network: SolanaNetwork,
    /// The SPL token mint address.
    pub address: Address,
    /// The token program owning the mint.
    pub token_program: Pubkey,
    pub decimals: u8,
}

impl SolanaTokenDeployment {
    pub fn new(network: SolanaNetwork, address: Address, token_program: Pubkey, decimals: u8) -> Self {
        Self {
            network,
            address,
            token_program,
            decimals,
        }
    }
}

/// A Solana public key address.
///
/// Wraps [`Pubkey`] and serializes as a base58 string.
///
/// ```
/// use x402_chain_solana::chain::Address;
/// use std::str::FromStr;
///
/// let addr = Address::from_str("EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v").unwrap();
/// assert_eq!(addr.to_string(), "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v");
/// ```
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub struct Address(Pubkey);

impl Address {
    pub const fn new(pubkey: Pubkey) -> Self {
        Self(pubkey)
    }

    pub fn pubkey(&self) -> &Pubkey {
        &self.0
    }
}

impl From<Pubkey> for Address {
    fn from(pubkey: Pubkey) -> Self {
        Self(pubkey)
    }
}

impl From<Address> for Pubkey {
    fn from(address: Address) -> Self {
        address.0
    }
}

impl AsRef<[u8]> for Address {
    fn as_ref(&self) -> &[u8] {
        self.0.as_ref()
    }
}

impl Serialize for Address {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let pubkey = Pubkey::from_str(&s).map_err(|_| {
            serde::de::Error::custom(format!("Failed to decode Solana address: {s}"))
        })?;
        Ok(Self(pubkey))
    }
}

impl Display for Address {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Address {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let pubkey =
            Pubkey::from_str(s).map_err(|_| format!("Failed to decode Solana address: {s}"))?;
        Ok(Self(pubkey))
    }
}

/// Derives the associated token account of `owner` for `mint` under `token_program`.
pub fn associated_token_address(owner: &Pubkey, token_program: &Pubkey, mint: &Pubkey) -> Pubkey {
    let (ata, _) = Pubkey::find_program_address(
        &[owner.as_ref(), token_program.as_ref(), mint.as_ref()],
        &ATA_PROGRAM_PUBKEY,
    );
    ata
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_aliases() {
        assert_eq!(
            SolanaNetwork::from_network_name("solana-mainnet"),
            Some(SolanaNetwork::Mainnet)
        );
        assert_eq!(
            SolanaNetwork::from_network_name("solana-devnet"),
            Some(SolanaNetwork::Devnet)
        );
        assert_eq!(SolanaNetwork::from_network_name("base"), None);
        assert_eq!(
            SolanaNetwork::Mainnet.network_names(),
            vec!["solana", "solana-mainnet"]
        );
    }

    #[test]
    fn test_address_serde() {
        let json = "\"EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v\"";
        let address: Address = serde_json::from_str(json).unwrap();
        assert_eq!(serde_json::to_string(&address).unwrap(), json);
        assert!(serde_json::from_str::<Address>("\"0xdeadbeef\"").is_err());
    }

    #[test]
    fn test_associated_token_address_is_deterministic() {
        let owner = Pubkey::new_from_array([7; 32]);
        let mint = Pubkey::new_from_array([9; 32]);
        let a = associated_token_address(&owner, &spl_token::ID, &mint);
        let b = associated_token_address(&owner, &spl_token::ID, &mint);
        let c = associated_token_address(&owner, &spl_token_2022::ID, &mint);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
