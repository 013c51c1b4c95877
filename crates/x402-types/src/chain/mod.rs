//! Network client capability used by verifiers for on-chain facts.
//!
//! Most verification is offline: a signed transaction carries everything needed
//! to decide whether it pays the right party the right amount. Some deployments
//! also want facts only the network knows, such as whether the paying account
//! exists or whether a transaction has landed. Those facts are obtained through
//! [`NetworkClient`], which is injected at registry build time.
//!
//! Every client handed to a verifier should be wrapped in [`TimeoutNetworkClient`],
//! so a slow endpoint turns into [`NetworkClientError::Timeout`] rather than a stuck call.

use std::sync::Arc;
use std::time::Duration;

use crate::proto::PaymentVerificationError;

/// Outcome of looking up a transaction by its reference (signature, hash).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionStatus {
    /// The transaction landed and succeeded.
    Confirmed,
    /// The transaction landed but failed; the string describes the failure.
    Failed(String),
    /// The network has no record of the transaction.
    NotFound,
}

#[derive(Debug, thiserror::Error)]
pub enum NetworkClientError {
    #[error("No network client configured for network {0}")]
    UnknownNetwork(String),
    #[error("Network transport error: {0}")]
    Transport(String),
    #[error("Network call timed out after {0:?}")]
    Timeout(Duration),
}

impl From<NetworkClientError> for PaymentVerificationError {
    fn from(value: NetworkClientError) -> Self {
        PaymentVerificationError::NetworkUnavailable(value.to_string())
    }
}

/// Read-only access to the facts a verifier may need from a network.
///
/// Implementations must be safe to share across threads; verifiers hold them as
/// `Arc<dyn NetworkClient>`.
#[async_trait::async_trait]
pub trait NetworkClient: Send + Sync {
    /// Looks up the status of a transaction by its network-specific reference.
    async fn transaction_status(
        &self,
        network: &str,
        reference: &str,
    ) -> Result<TransactionStatus, NetworkClientError>;

    /// Reports, for each address in order, whether the account exists.
    async fn accounts_exist(
        &self,
        network: &str,
        addresses: &[String],
    ) -> Result<Vec<bool>, NetworkClientError>;
}

#[async_trait::async_trait]
impl<T: NetworkClient + ?Sized> NetworkClient for Arc<T> {
    async fn transaction_status(
        &self,
        network: &str,
        reference: &str,
    ) -> Result<TransactionStatus, NetworkClientError> {
        (**self).transaction_status(network, reference).await
    }

    async fn accounts_exist(
        &self,
        network: &str,
        addresses: &[String],
    ) -> Result<Vec<bool>, NetworkClientError> {
        (**self).accounts_exist(network, addresses).await
    }
}

/// Wraps a [`NetworkClient`] so every call is bounded by a timeout.
pub struct TimeoutNetworkClient<C> {
    inner: C,
    timeout: Duration,
}

impl<C> TimeoutNetworkClient<C> {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

    pub fn new(inner: C, timeout: Duration) -> Self {
        Self { inner, timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

#[async_trait::async_trait]
impl<C: NetworkClient> NetworkClient for TimeoutNetworkClient<C> {
    async fn transaction_status(
        &self,
        network: &str,
        reference: &str,
    ) -> Result<TransactionStatus, NetworkClientError> {
        let call = self.inner.transaction_status(network, reference);
        match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result,
            Err(_) => {
                #[cfg(feature = "telemetry")]
                tracing::warn!(network, timeout = ?self.timeout, "transaction_status timed out");
                Err(NetworkClientError::Timeout(self.timeout))
            }
        }
    }

    async fn accounts_exist(
        &self,
        network: &str,
        addresses: &[String],
    ) -> Result<Vec<bool>, NetworkClientError> {
        let call = self.inner.accounts_exist(network, addresses);
        match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result,
            Err(_) => {
                #[cfg(feature = "telemetry")]
                tracing::warn!(network, timeout = ?self.timeout, "accounts_exist timed out");
                Err(NetworkClientError::Timeout(self.timeout))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proto::ErrorReason;

    struct SlowClient;

    #[async_trait::async_trait]
    impl NetworkClient for SlowClient {
        async fn transaction_status(
            &self,
            _network: &str,
            _reference: &str,
        ) -> Result<TransactionStatus, NetworkClientError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(TransactionStatus::Confirmed)
        }

        async fn accounts_exist(
            &self,
            _network: &str,
            addresses: &[String],
        ) -> Result<Vec<bool>, NetworkClientError> {
            Ok(vec![true; addresses.len()])
        }
    }

    #[tokio::test]
    async fn test_timeout_maps_to_network_unavailable() {
        let client = TimeoutNetworkClient::new(SlowClient, Duration::from_millis(20));
        let err = client
            .transaction_status("solana-devnet", "sig")
            .await
            .unwrap_err();
        assert!(matches!(err, NetworkClientError::Timeout(_)));
        let err: PaymentVerificationError = err.into();
        assert_eq!(err.reason(), ErrorReason::NetworkUnavailable);
    }

    #[tokio::test]
    async fn test_fast_call_passes_through() {
        let client: Arc<dyn NetworkClient> = Arc::new(TimeoutNetworkClient::new(
            SlowClient,
            TimeoutNetworkClient::<SlowClient>::DEFAULT_TIMEOUT,
        ));
        let exists = client
            .accounts_exist("solana-devnet", &["a".to_string(), "b".to_string()])
            .await
            .unwrap();
        assert_eq!(exists, vec![true, true]);
    }
}
