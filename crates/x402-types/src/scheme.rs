//! Scheme verifiers and the registry that dispatches to them.
//!
//! A *scheme* (e.g. `exact`) defines how a payment is proven; a *network* (e.g.
//! `solana-devnet`) says where. A verifier is registered for each exact
//! `(scheme, network)` pair, identified by a [`SchemeSlug`].
//!
//! - [`X402SchemeVerifier`] checks one payload against one set of requirements.
//! - [`X402SchemeBlueprint`] declares the slugs it can serve and builds a verifier per slug.
//! - [`SchemeBlueprints`] is the set of compiled-in blueprints.
//! - [`SchemeRegistry`] is built once from blueprints plus configuration and is
//!   immutable afterwards; share it by reference.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt::{Debug, Display, Formatter};
use std::ops::Deref;
use std::str::FromStr;
use std::sync::Arc;

use crate::chain::NetworkClient;
use crate::proto::v1::{PaymentPayload, PaymentRequirements, Scheme};
use crate::proto::{PaymentVerificationError, VerifyResponse};
use crate::timestamp::UnixTimestamp;

/// Per-call context handed to a verifier.
#[derive(Debug, Clone, Copy)]
pub struct VerifyContext {
    /// The verification instant, captured once per call.
    pub now: UnixTimestamp,
}

impl VerifyContext {
    pub fn new(now: UnixTimestamp) -> Self {
        Self { now }
    }

    pub fn now() -> Self {
        Self::new(UnixTimestamp::now())
    }
}

/// Successful outcome of a scheme verifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedPayment {
    /// The paying party, in the network's address encoding.
    pub payer: String,
}

#[async_trait::async_trait]
pub trait X402SchemeVerifier: Send + Sync {
    async fn verify(
        &self,
        payload: &PaymentPayload,
        requirements: &PaymentRequirements,
        context: &VerifyContext,
    ) -> Result<VerifiedPayment, PaymentVerificationError>;
}

/// Everything a blueprint may draw on when building a verifier.
#[derive(Clone, Default)]
pub struct BuildContext {
    /// Client for on-chain facts, already bounded by a timeout. `None` runs fully offline.
    pub network_client: Option<Arc<dyn NetworkClient>>,
    /// Scheme-specific configuration for the slug being built.
    pub config: Option<serde_json::Value>,
}

impl Debug for BuildContext {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BuildContext")
            .field("network_client", &self.network_client.is_some())
            .field("config", &self.config)
            .finish()
    }
}

impl BuildContext {
    pub fn with_network_client(mut self, client: Arc<dyn NetworkClient>) -> Self {
        self.network_client = Some(client);
        self
    }

    fn for_slug(&self, config: Option<&SchemeConfig>) -> Self {
        Self {
            network_client: self.network_client.clone(),
            config: config.and_then(|c| c.config.clone()),
        }
    }
}

pub trait X402SchemeBlueprint: Send + Sync {
    /// The slugs this blueprint can build verifiers for.
    fn slugs(&self) -> Vec<SchemeSlug>;

    fn build(
        &self,
        slug: &SchemeSlug,
        context: &BuildContext,
    ) -> Result<Box<dyn X402SchemeVerifier>, Box<dyn std::error::Error + Send + Sync>>;
}

#[derive(Default)]
pub struct SchemeBlueprints(Vec<Box<dyn X402SchemeBlueprint>>);

impl Debug for SchemeBlueprints {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let slugs: Vec<String> = self.slugs().map(|s| s.to_string()).collect();
        f.debug_tuple("SchemeBlueprints").field(&slugs).finish()
    }
}

impl SchemeBlueprints {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn and_register<B: X402SchemeBlueprint + 'static>(mut self, blueprint: B) -> Self {
        self.register(blueprint);
        self
    }

    pub fn register<B: X402SchemeBlueprint + 'static>(&mut self, blueprint: B) {
        self.0.push(Box::new(blueprint));
    }

    pub fn slugs(&self) -> impl Iterator<Item = SchemeSlug> + '_ {
        self.0.iter().flat_map(|b| b.slugs())
    }
}

/// Identifies a verifier: exact scheme plus exact network name.
///
/// Displayed and parsed as `<scheme>:<network>`, e.g. `exact:solana-devnet`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SchemeSlug {
    pub scheme: Scheme,
    pub network: String,
}

impl SchemeSlug {
    pub fn new<N: Into<String>>(scheme: Scheme, network: N) -> Self {
        Self {
            scheme,
            network: network.into(),
        }
    }
}

impl Display for SchemeSlug {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.scheme, self.network)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SchemeSlugError {
    #[error("invalid scheme slug format, expected '<scheme>:<network>': {0}")]
    InvalidFormat(String),
    #[error("invalid scheme in slug: {0}")]
    InvalidScheme(String),
}

impl FromStr for SchemeSlug {
    type Err = SchemeSlugError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (scheme, network) = s
            .split_once(':')
            .ok_or_else(|| SchemeSlugError::InvalidFormat(s.to_string()))?;
        if network.is_empty() {
            return Err(SchemeSlugError::InvalidFormat(s.to_string()));
        }
        let scheme = scheme.parse::<Scheme>().map_err(SchemeSlugError::InvalidScheme)?;
        Ok(SchemeSlug::new(scheme, network))
    }
}

impl Serialize for SchemeSlug {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for SchemeSlug {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        SchemeSlug::from_str(&s).map_err(serde::de::Error::custom)
    }
}

/// Configuration entry for one slug.
///
/// ```json
/// { "slug": "exact:solana", "enabled": true, "config": { "checkAccounts": true } }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemeConfig {
    pub slug: SchemeSlug,
    #[serde(default = "scheme_config_defaults::default_enabled")]
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<serde_json::Value>,
}

mod scheme_config_defaults {
    pub fn default_enabled() -> bool {
        true
    }
}

/// Immutable dispatch table from [`SchemeSlug`] to verifier.
#[derive(Default)]
pub struct SchemeRegistry(HashMap<SchemeSlug, Box<dyn X402SchemeVerifier>>);

impl Debug for SchemeRegistry {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let slugs: Vec<String> = self.0.keys().map(|s| s.to_string()).collect();
        f.debug_tuple("SchemeRegistry").field(&slugs).finish()
    }
}

impl SchemeRegistry {
    /// Builds a verifier for every slug offered by `blueprints`, unless `configs` disables it.
    ///
    /// A verifier that fails to build is logged and left out; the remaining slugs are still served.
    pub fn build(
        blueprints: &SchemeBlueprints,
        configs: &[SchemeConfig],
        context: &BuildContext,
    ) -> Self {
        let mut verifiers = HashMap::new();
        for blueprint in blueprints.0.iter() {
            for slug in blueprint.slugs() {
                let config = configs.iter().find(|c| c.slug == slug);
                if config.is_some_and(|c| !c.enabled) {
                    #[cfg(feature = "telemetry")]
                    tracing::info!("Skipping disabled scheme {}", slug);
                    continue;
                }
                match blueprint.build(&slug, &context.for_slug(config)) {
                    Ok(verifier) => {
                        #[cfg(feature = "telemetry")]
                        tracing::info!("Registered scheme verifier {}", slug);
                        verifiers.insert(slug, verifier);
                    }
                    Err(_err) => {
                        #[cfg(feature = "telemetry")]
                        tracing::error!("Error building scheme verifier for {}: {}", slug, _err);
                    }
                }
            }
        }
        #[cfg(feature = "telemetry")]
        for config in configs {
            if !blueprints.slugs().any(|s| s == config.slug) {
                tracing::warn!("No scheme registered: {}", config.slug);
            }
        }
        Self(verifiers)
    }

    pub fn by_slug(&self, slug: &SchemeSlug) -> Option<&dyn X402SchemeVerifier> {
        let verifier = self.0.get(slug)?.deref();
        Some(verifier)
    }

    pub fn slugs(&self) -> impl Iterator<Item = &SchemeSlug> {
        self.0.keys()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Selects the verifier for `requirements` and runs it against `payload`.
    pub async fn try_verify(
        &self,
        payload: &PaymentPayload,
        requirements: &PaymentRequirements,
        context: &VerifyContext,
    ) -> Result<VerifiedPayment, PaymentVerificationError> {
        let slug = SchemeSlug::new(requirements.scheme, requirements.network.as_str());
        if payload.scheme != requirements.scheme {
            return Err(PaymentVerificationError::UnsupportedScheme(format!(
                "payload scheme {} does not match required scheme {}",
                payload.scheme, requirements.scheme
            )));
        }
        let verifier = self
            .by_slug(&slug)
            .ok_or_else(|| PaymentVerificationError::UnsupportedScheme(slug.to_string()))?;
        verifier.verify(payload, requirements, context).await
    }

    /// Parses both documents and verifies them, folding every failure into the verdict.
    pub async fn verify_slices(
        &self,
        payload: &[u8],
        requirements: &[u8],
        context: &VerifyContext,
    ) -> VerifyResponse {
        let result = async {
            let payload = PaymentPayload::from_slice(payload)?;
            let requirements = PaymentRequirements::from_slice(requirements)?;
            self.try_verify(&payload, &requirements, context).await
        }
        .await;
        match result {
            Ok(verified) => VerifyResponse::valid(verified.payer),
            Err(_err) => {
                #[cfg(feature = "telemetry")]
                tracing::debug!(reason = %_err.reason(), "payment rejected: {}", _err);
                _err.into()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proto::ErrorReason;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct AcceptAll;

    #[async_trait::async_trait]
    impl X402SchemeVerifier for AcceptAll {
        async fn verify(
            &self,
            _payload: &PaymentPayload,
            _requirements: &PaymentRequirements,
            _context: &VerifyContext,
        ) -> Result<VerifiedPayment, PaymentVerificationError> {
            Ok(VerifiedPayment {
                payer: "payer".to_string(),
            })
        }
    }

    struct TestBlueprint {
        builds: Arc<AtomicUsize>,
    }

    impl X402SchemeBlueprint for TestBlueprint {
        fn slugs(&self) -> Vec<SchemeSlug> {
            vec![
                SchemeSlug::new(Scheme::Exact, "solana"),
                SchemeSlug::new(Scheme::Exact, "solana-devnet"),
            ]
        }

        fn build(
            &self,
            slug: &SchemeSlug,
            context: &BuildContext,
        ) -> Result<Box<dyn X402SchemeVerifier>, Box<dyn std::error::Error + Send + Sync>> {
            self.builds.fetch_add(1, Ordering::SeqCst);
            if context.config.as_ref().is_some_and(|c| c["broken"] == true) {
                return Err(format!("broken config for {slug}").into());
            }
            Ok(Box::new(AcceptAll))
        }
    }

    fn blueprints() -> (SchemeBlueprints, Arc<AtomicUsize>) {
        let builds = Arc::new(AtomicUsize::new(0));
        let blueprints = SchemeBlueprints::new().and_register(TestBlueprint {
            builds: builds.clone(),
        });
        (blueprints, builds)
    }

    fn payload(scheme: &str, network: &str) -> Vec<u8> {
        serde_json::to_vec(&serde_json::json!({
            "x402_version": 1,
            "scheme": scheme,
            "network": network,
            "payload": {},
            "timestamp": 1
        }))
        .unwrap()
    }

    fn requirements(scheme: &str, network: &str) -> Vec<u8> {
        serde_json::to_vec(&serde_json::json!({
            "scheme": scheme,
            "network": network,
            "max_amount_required": "1",
            "asset": "SOL",
            "pay_to": "recipient",
            "max_timeout_seconds": 30
        }))
        .unwrap()
    }

    #[test]
    fn test_slug_round_trip() {
        let slug: SchemeSlug = "exact:solana-devnet".parse().unwrap();
        assert_eq!(slug, SchemeSlug::new(Scheme::Exact, "solana-devnet"));
        assert_eq!(slug.to_string(), "exact:solana-devnet");
        assert!("exact".parse::<SchemeSlug>().is_err());
        assert!("exact:".parse::<SchemeSlug>().is_err());
        assert!("stream:solana".parse::<SchemeSlug>().is_err());
    }

    #[test]
    fn test_build_skips_disabled_and_failed() {
        let (blueprints, builds) = blueprints();
        let configs: Vec<SchemeConfig> = serde_json::from_value(serde_json::json!([
            { "slug": "exact:solana", "enabled": false },
            { "slug": "exact:solana-devnet", "config": { "broken": true } }
        ]))
        .unwrap();
        let registry = SchemeRegistry::build(&blueprints, &configs, &BuildContext::default());
        assert!(registry.is_empty());
        assert_eq!(builds.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_build_without_config_registers_everything() {
        let (blueprints, _) = blueprints();
        let registry = SchemeRegistry::build(&blueprints, &[], &BuildContext::default());
        assert!(
            registry
                .by_slug(&SchemeSlug::new(Scheme::Exact, "solana"))
                .is_some()
        );
        assert!(
            registry
                .by_slug(&SchemeSlug::new(Scheme::Upto, "solana"))
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_dispatch() {
        let (blueprints, _) = blueprints();
        let registry = SchemeRegistry::build(&blueprints, &[], &BuildContext::default());
        let ctx = VerifyContext::new(UnixTimestamp::from_secs(1));

        let ok = registry
            .verify_slices(
                &payload("exact", "solana-devnet"),
                &requirements("exact", "solana-devnet"),
                &ctx,
            )
            .await;
        assert_eq!(ok.payer(), Some("payer"));

        let unknown_network = registry
            .verify_slices(
                &payload("exact", "base"),
                &requirements("exact", "base"),
                &ctx,
            )
            .await;
        assert_eq!(unknown_network.reason(), Some(ErrorReason::UnsupportedScheme));

        let scheme_mismatch = registry
            .verify_slices(
                &payload("upto", "solana"),
                &requirements("exact", "solana"),
                &ctx,
            )
            .await;
        assert_eq!(scheme_mismatch.reason(), Some(ErrorReason::UnsupportedScheme));

        let unregistered_scheme = registry
            .verify_slices(
                &payload("upto", "solana"),
                &requirements("upto", "solana"),
                &ctx,
            )
            .await;
        assert_eq!(
            unregistered_scheme.reason(),
            Some(ErrorReason::UnsupportedScheme)
        );

        let malformed = registry
            .verify_slices(b"{", &requirements("exact", "solana"), &ctx)
            .await;
        assert_eq!(malformed.reason(), Some(ErrorReason::MalformedInput));
    }
}
