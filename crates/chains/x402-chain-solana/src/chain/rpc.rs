//! [`NetworkClient`] over Solana JSON-RPC.

use solana_client::client_error::ClientError;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_commitment_config::CommitmentConfig;
use solana_pubkey::Pubkey;
use solana_signature::Signature;
use std::collections::HashMap;
use std::fmt::{Debug, Formatter};
use std::str::FromStr;
use std::sync::Arc;
use url::Url;
use x402_types::chain::{NetworkClient, NetworkClientError, TransactionStatus};

use crate::chain::SolanaNetwork;

/// Answers on-chain questions for Solana networks, one RPC endpoint per network.
///
/// Endpoints registered for a network are reachable under each of its names, so
/// an endpoint for `solana` also serves `solana-mainnet`.
#[derive(Clone)]
pub struct SolanaRpcNetworkClient {
    clients: HashMap<String, Arc<RpcClient>>,
    commitment: CommitmentConfig,
}

impl Debug for SolanaRpcNetworkClient {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut networks: Vec<&String> = self.clients.keys().collect();
        networks.sort();
        f.debug_struct("SolanaRpcNetworkClient")
            .field("networks", &networks)
            .field("commitment", &self.commitment.commitment)
            .finish()
    }
}

impl Default for SolanaRpcNetworkClient {
    fn default() -> Self {
        Self::new()
    }
}

impl SolanaRpcNetworkClient {
    pub fn new() -> Self {
        Self {
            clients: HashMap::new(),
            commitment: CommitmentConfig::confirmed(),
        }
    }

    /// Registers `url` for `network` (and its aliases).
    ///
    /// The nonblocking client spawns no tasks until first use, but should be created
    /// from within a Tokio runtime context.
    pub fn with_endpoint(mut self, network: &str, url: &Url) -> Self {
        let client = Arc::new(RpcClient::new_with_commitment(
            url.to_string(),
            self.commitment,
        ));
        let names = match SolanaNetwork::from_network_name(network) {
            Some(known) => known
                .network_names()
                .into_iter()
                .map(str::to_string)
                .collect(),
            None => vec![network.to_string()],
        };
        for name in names {
            #[cfg(feature = "telemetry")]
            tracing::info!(network = %name, rpc = %url, "Using Solana RPC endpoint");
            self.clients.insert(name, client.clone());
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    fn client(&self, network: &str) -> Result<&RpcClient, NetworkClientError> {
        self.clients
            .get(network)
            .map(|c| c.as_ref())
            .ok_or_else(|| NetworkClientError::UnknownNetwork(network.to_string()))
    }
}

fn transport(error: ClientError) -> NetworkClientError {
    NetworkClientError::Transport(error.to_string())
}

#[async_trait::async_trait]
impl NetworkClient for SolanaRpcNetworkClient {
    async fn transaction_status(
        &self,
        network: &str,
        reference: &str,
    ) -> Result<TransactionStatus, NetworkClientError> {
        let client = self.client(network)?;
        let signature = Signature::from_str(reference).map_err(|e| {
            NetworkClientError::Transport(format!("invalid signature {reference}: {e}"))
        })?;
        let status = client
            .get_signature_status_with_commitment(&signature, self.commitment)
            .await
            .map_err(transport)?;
        let status = match status {
            None => TransactionStatus::NotFound,
            Some(Ok(())) => TransactionStatus::Confirmed,
            Some(Err(e)) => TransactionStatus::Failed(e.to_string()),
        };
        #[cfg(feature = "telemetry")]
        tracing::debug!(network, signature = reference, ?status, "Fetched signature status");
        Ok(status)
    }

    async fn accounts_exist(
        &self,
        network: &str,
        addresses: &[String],
    ) -> Result<Vec<bool>, NetworkClientError> {
        let client = self.client(network)?;
        let pubkeys = addresses
            .iter()
            .map(|a| {
                Pubkey::from_str(a).map_err(|_| {
                    NetworkClientError::Transport(format!("invalid Solana address {a}"))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        let accounts = client
            .get_multiple_accounts(&pubkeys)
            .await
            .map_err(transport)?;
        Ok(accounts.iter().map(Option::is_some).collect())
    }
}
