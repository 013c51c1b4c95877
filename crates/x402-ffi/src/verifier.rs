use futures_util::future::join_all;
use std::fmt::{Debug, Formatter};
use std::mem::ManuallyDrop;
use std::sync::Arc;
use tokio::runtime::Runtime;
use x402_chain_solana::V1SolanaExact;
use x402_chain_solana::chain::rpc::SolanaRpcNetworkClient;
use x402_types::chain::{NetworkClient, TimeoutNetworkClient};
use x402_types::proto::VerifyResponse;
use x402_types::scheme::{BuildContext, SchemeBlueprints, SchemeRegistry, VerifyContext};

use crate::config::{ConfigError, VerifierConfig};

#[derive(Debug, thiserror::Error)]
pub enum InitError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("Failed to start async runtime: {0}")]
    Runtime(#[source] std::io::Error),
}

/// An initialized verifier: the immutable scheme registry plus the runtime that drives it.
///
/// Holding one is proof that initialization succeeded. It is `Send + Sync`; share it
/// by reference across threads.
///
/// Dropping it shuts the runtime down without waiting for in-flight network calls, so
/// a verifier may be dropped from any thread, including from inside another runtime.
/// The blocking methods still must not be called from within an async context.
///
/// ```
/// use x402_ffi::{VerifierConfig, X402Verifier};
///
/// let verifier = X402Verifier::initialize(VerifierConfig::default()).unwrap();
/// let response = verifier.verify_blocking(b"{}", b"{}");
/// assert!(!response.is_valid());
/// ```
pub struct X402Verifier {
    registry: SchemeRegistry,
    // Taken exactly once, in `Drop`.
    runtime: ManuallyDrop<Runtime>,
}

impl Drop for X402Verifier {
    fn drop(&mut self) {
        // SAFETY: the field is never touched again after this.
        let runtime = unsafe { ManuallyDrop::take(&mut self.runtime) };
        runtime.shutdown_background();
    }
}

impl Debug for X402Verifier {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("X402Verifier")
            .field("registry", &self.registry)
            .finish()
    }
}

/// The scheme blueprints compiled into this library.
pub fn scheme_blueprints() -> SchemeBlueprints {
    SchemeBlueprints::new().and_register(V1SolanaExact)
}

impl X402Verifier {
    pub fn initialize(config: VerifierConfig) -> Result<Self, InitError> {
        config.validate()?;
        let mut builder = tokio::runtime::Builder::new_multi_thread();
        builder.enable_all().thread_name("x402-verifier");
        if let Some(worker_threads) = config.worker_threads() {
            builder.worker_threads(worker_threads);
        }
        let runtime = builder.build().map_err(InitError::Runtime)?;

        let context = {
            // RPC clients must be created inside the runtime they will run on.
            let _guard = runtime.enter();
            match network_client(&config) {
                Some(client) => BuildContext::default().with_network_client(client),
                None => BuildContext::default(),
            }
        };
        let registry = SchemeRegistry::build(&scheme_blueprints(), config.schemes(), &context);
        #[cfg(feature = "telemetry")]
        tracing::info!(
            schemes = ?registry.slugs().map(|s| s.to_string()).collect::<Vec<_>>(),
            "x402 verifier initialized"
        );
        Ok(Self {
            registry,
            runtime: ManuallyDrop::new(runtime),
        })
    }

    pub fn registry(&self) -> &SchemeRegistry {
        &self.registry
    }

    /// Verifies one payment. The verification instant is captured once, at the start of the call.
    pub async fn verify(&self, payment: &[u8], requirements: &[u8]) -> VerifyResponse {
        let context = VerifyContext::now();
        self.registry
            .verify_slices(payment, requirements, &context)
            .await
    }

    /// Blocks the calling thread until [`X402Verifier::verify`] completes.
    ///
    /// Must not be called from within an async context.
    pub fn verify_blocking(&self, payment: &[u8], requirements: &[u8]) -> VerifyResponse {
        self.runtime.block_on(self.verify(payment, requirements))
    }

    /// Verifies many `(payment, requirements)` pairs concurrently, against one verification instant.
    ///
    /// Responses come back in input order.
    pub fn verify_batch_blocking(&self, batch: &[(Vec<u8>, Vec<u8>)]) -> Vec<VerifyResponse> {
        let context = VerifyContext::now();
        let calls = batch.iter().map(|(payment, requirements)| {
            self.registry
                .verify_slices(payment, requirements, &context)
        });
        self.runtime.block_on(join_all(calls))
    }
}

fn network_client(config: &VerifierConfig) -> Option<Arc<dyn NetworkClient>> {
    let client = config
        .rpc()
        .fold(SolanaRpcNetworkClient::new(), |client, (network, url)| {
            client.with_endpoint(network, url)
        });
    if client.is_empty() {
        return None;
    }
    let client: Arc<dyn NetworkClient> =
        Arc::new(TimeoutNetworkClient::new(client, config.network_timeout()));
    Some(client)
}

#[cfg(test)]
mod tests {
    use super::*;
    use x402_types::proto::ErrorReason;

    #[test]
    fn test_registry_serves_known_solana_networks() {
        let verifier = X402Verifier::initialize(VerifierConfig::default()).unwrap();
        let mut slugs: Vec<String> = verifier
            .registry()
            .slugs()
            .map(|s| s.to_string())
            .collect();
        slugs.sort();
        assert_eq!(
            slugs,
            vec!["exact:solana", "exact:solana-devnet", "exact:solana-mainnet"]
        );
    }

    #[test]
    fn test_disabled_scheme_is_unsupported() {
        let config = VerifierConfig::from_json(
            r#"{ "schemes": [{ "slug": "exact:solana-devnet", "enabled": false }] }"#,
        )
        .unwrap();
        let verifier = X402Verifier::initialize(config).unwrap();
        let payment = br#"{"x402_version":1,"scheme":"exact","network":"solana-devnet","payload":{},"timestamp":1}"#;
        let requirements = br#"{"scheme":"exact","network":"solana-devnet","max_amount_required":"1","asset":"SOL","pay_to":"x","max_timeout_seconds":30}"#;
        let response = verifier.verify_blocking(payment, requirements);
        assert_eq!(response.reason(), Some(ErrorReason::UnsupportedScheme));
    }

    #[tokio::test]
    async fn test_drop_inside_async_context() {
        let verifier = X402Verifier::initialize(VerifierConfig::default()).unwrap();
        drop(verifier);
        // The surrounding runtime keeps working
        tokio::task::yield_now().await;
    }

    #[test]
    fn test_batch_keeps_order() {
        let verifier = X402Verifier::initialize(VerifierConfig::default()).unwrap();
        let batch = vec![
            (b"not json".to_vec(), b"{}".to_vec()),
            (
                br#"{"x402_version":1,"scheme":"upto","network":"solana","payload":{},"timestamp":1}"#.to_vec(),
                br#"{"scheme":"upto","network":"solana","max_amount_required":"1","asset":"SOL","pay_to":"x","max_timeout_seconds":30}"#.to_vec(),
            ),
        ];
        let responses = verifier.verify_batch_blocking(&batch);
        assert_eq!(responses.len(), 2);
        assert_eq!(responses[0].reason(), Some(ErrorReason::MalformedInput));
        assert_eq!(responses[1].reason(), Some(ErrorReason::UnsupportedScheme));
    }
}
