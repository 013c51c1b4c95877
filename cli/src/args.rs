use clap::{Parser, Subcommand};
use std::path::PathBuf;
use x402_chain_solana::chain::SolanaNetwork;

#[derive(Parser, Debug)]
#[command(name = "x402-verify", version)]
#[command(about = "Verify x402 payment payloads against payment requirements")]
pub struct CliArgs {
    /// Path to the JSON verifier configuration
    #[arg(long, short, global = true, env = "X402_CONFIG")]
    pub config: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Verify a payment payload file against a requirements file
    Verify {
        #[arg(long)]
        payment: PathBuf,
        #[arg(long)]
        requirements: PathBuf,
    },
    /// Print a signed sample payment and matching requirements
    Sample {
        #[arg(long, default_value = "solana-devnet", value_parser = parse_network)]
        network: SolanaNetwork,
        /// Amount in the asset's smallest unit
        #[arg(long, default_value_t = 1_000_000)]
        amount: u64,
        /// `SOL`, `USDC`, or an SPL mint address
        #[arg(long, default_value = "SOL")]
        asset: String,
    },
}

fn parse_network(s: &str) -> Result<SolanaNetwork, String> {
    SolanaNetwork::from_network_name(s).ok_or_else(|| format!("unknown Solana network: {s}"))
}
