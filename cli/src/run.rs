use clap::Parser;
use dotenvy::dotenv;
use serde_json::json;
use solana_keypair::Keypair;
use solana_signer::Signer;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::str::FromStr;
use x402_chain_solana::chain::{Address, SolanaNetwork, SolanaTokenDeployment};
use x402_chain_solana::usdc_deployment;
use x402_chain_solana::v1_solana_exact::{ExactPaymentBuildError, ExactPaymentBuilder, TransferAsset};
use x402_ffi::{ConfigError, InitError, VerifierConfig, X402Verifier};
use x402_types::timestamp::UnixTimestamp;

use crate::args::{CliArgs, Command};

const EXIT_INVALID: u8 = 2;

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("Failed to read {0}: {1}")]
    Read(PathBuf, std::io::Error),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Init(#[from] InitError),
    #[error("Invalid asset {0}: expected SOL, USDC or a mint address")]
    Asset(String),
    #[error(transparent)]
    Build(#[from] ExactPaymentBuildError),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub fn run() -> Result<ExitCode, CliError> {
    dotenv().ok();
    #[cfg(feature = "telemetry")]
    x402_ffi::telemetry::init();
    let args = CliArgs::parse();
    match args.command {
        Command::Verify {
            payment,
            requirements,
        } => verify(args.config.as_deref(), &payment, &requirements),
        Command::Sample {
            network,
            amount,
            asset,
        } => sample(network, amount, &asset),
    }
}

fn verify(
    config: Option<&Path>,
    payment: &Path,
    requirements: &Path,
) -> Result<ExitCode, CliError> {
    let config = match config {
        Some(path) => VerifierConfig::load_from_path(path)?,
        None => VerifierConfig::default(),
    };
    let payment = read(payment)?;
    let requirements = read(requirements)?;

    let verifier = X402Verifier::initialize(config)?;
    let response = verifier.verify_blocking(&payment, &requirements);
    println!("{}", serde_json::to_string_pretty(&response)?);
    if response.is_valid() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::from(EXIT_INVALID))
    }
}

fn sample(network: SolanaNetwork, amount: u64, asset: &str) -> Result<ExitCode, CliError> {
    let asset = transfer_asset(network, asset)?;
    let buyer = Keypair::new();
    let seller = Keypair::new();
    let builder = ExactPaymentBuilder::new(network, seller.pubkey(), asset, amount);
    let payment = builder.payment_payload(&buyer, UnixTimestamp::now())?;
    let sample = json!({
        "payment": payment,
        "requirements": builder.requirements(),
    });
    println!("{}", serde_json::to_string_pretty(&sample)?);
    Ok(ExitCode::SUCCESS)
}

fn transfer_asset(network: SolanaNetwork, asset: &str) -> Result<TransferAsset, CliError> {
    let usdc = usdc_deployment(network);
    match asset {
        "SOL" => Ok(TransferAsset::Native),
        "USDC" => Ok(TransferAsset::Token(usdc)),
        mint => {
            let mint = Address::from_str(mint).map_err(|_| CliError::Asset(mint.to_string()))?;
            if mint == usdc.address {
                return Ok(TransferAsset::Token(usdc));
            }
            Ok(TransferAsset::Token(SolanaTokenDeployment::new(
                network,
                mint,
                usdc.token_program,
                usdc.decimals,
            )))
        }
    }
}

fn read(path: &Path) -> Result<Vec<u8>, CliError> {
    fs::read(path).map_err(|e| CliError::Read(path.to_path_buf(), e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transfer_asset_parsing() {
        assert_eq!(
            transfer_asset(SolanaNetwork::Devnet, "SOL").unwrap(),
            TransferAsset::Native
        );
        assert_eq!(
            transfer_asset(SolanaNetwork::Devnet, "USDC").unwrap(),
            TransferAsset::Token(usdc_deployment(SolanaNetwork::Devnet))
        );
        let usdc = usdc_deployment(SolanaNetwork::Mainnet);
        assert_eq!(
            transfer_asset(SolanaNetwork::Mainnet, &usdc.address.to_string()).unwrap(),
            TransferAsset::Token(usdc)
        );
        assert!(matches!(
            transfer_asset(SolanaNetwork::Devnet, "DOGE"),
            Err(CliError::Asset(_))
        ));
    }

    #[test]
    fn test_sample_round_trips_through_verifier() {
        let builder = ExactPaymentBuilder::new(
            SolanaNetwork::Devnet,
            Keypair::new().pubkey(),
            TransferAsset::Native,
            42,
        );
        let buyer = Keypair::new();
        let payment = builder.payment_payload(&buyer, UnixTimestamp::now()).unwrap();
        let verifier = X402Verifier::initialize(VerifierConfig::default()).unwrap();
        let response = verifier.verify_blocking(
            &serde_json::to_vec(&payment).unwrap(),
            &serde_json::to_vec(&builder.requirements()).unwrap(),
        );
        assert_eq!(response.payer(), Some(buyer.pubkey().to_string().as_str()));
    }
}
