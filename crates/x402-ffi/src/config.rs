//! Configuration for the verifier handle.
//!
//! ```json
//! {
//!   "networkTimeoutMs": 5000,
//!   "rpc": {
//!     "solana-devnet": "$SOLANA_DEVNET_RPC"
//!   },
//!   "schemes": [
//!     { "slug": "exact:solana-devnet", "config": { "checkAccounts": true } },
//!     { "slug": "exact:solana", "enabled": false }
//!   ]
//! }
//! ```
//!
//! Every key is optional. Without `rpc` entries the verifier runs fully offline.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;
use x402_types::config::LiteralOrEnv;
use x402_types::scheme::SchemeConfig;

/// Environment variable naming the JSON configuration file.
pub const CONFIG_PATH_ENV: &str = "X402_CONFIG";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifierConfig {
    /// Upper bound for every network client call, in milliseconds.
    #[serde(default = "config_defaults::default_network_timeout_ms")]
    network_timeout_ms: u64,
    /// Tokio worker threads; defaults to the number of cores.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    worker_threads: Option<usize>,
    /// RPC endpoint per network name.
    #[serde(default)]
    rpc: HashMap<String, LiteralOrEnv<Url>>,
    #[serde(default)]
    schemes: Vec<SchemeConfig>,
}

mod config_defaults {
    pub fn default_network_timeout_ms() -> u64 {
        5_000
    }
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            network_timeout_ms: config_defaults::default_network_timeout_ms(),
            worker_threads: None,
            rpc: HashMap::new(),
            schemes: Vec::new(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {0}: {1}")]
    FileRead(PathBuf, std::io::Error),
    #[error("Failed to parse config: {0}")]
    JsonParse(#[from] serde_json::Error),
    #[error("Invalid config: {0}")]
    Invalid(String),
}

impl VerifierConfig {
    /// Loads the file named by `X402_CONFIG`, or returns defaults when it is unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        match env::var_os(CONFIG_PATH_ENV) {
            Some(path) => Self::load_from_path(Path::new(&path)),
            None => Ok(Self::default()),
        }
    }

    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let content =
            fs::read_to_string(path).map_err(|e| ConfigError::FileRead(path.to_path_buf(), e))?;
        Self::from_json(&content)
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: VerifierConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.network_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "networkTimeoutMs must be positive".to_string(),
            ));
        }
        if self.worker_threads == Some(0) {
            return Err(ConfigError::Invalid(
                "workerThreads must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn network_timeout(&self) -> Duration {
        Duration::from_millis(self.network_timeout_ms)
    }

    pub fn worker_threads(&self) -> Option<usize> {
        self.worker_threads
    }

    pub fn rpc(&self) -> impl Iterator<Item = (&str, &Url)> {
        self.rpc
            .iter()
            .map(|(network, url)| (network.as_str(), url.inner()))
    }

    pub fn schemes(&self) -> &[SchemeConfig] {
        &self.schemes
    }

    pub fn with_network_timeout(mut self, timeout: Duration) -> Self {
        self.network_timeout_ms = timeout.as_millis().try_into().unwrap_or(u64::MAX);
        self
    }

    pub fn with_worker_threads(mut self, worker_threads: usize) -> Self {
        self.worker_threads = Some(worker_threads);
        self
    }

    pub fn with_rpc<N: Into<String>>(mut self, network: N, url: Url) -> Self {
        self.rpc
            .insert(network.into(), LiteralOrEnv::from_literal(url));
        self
    }

    pub fn with_scheme(mut self, scheme: SchemeConfig) -> Self {
        self.schemes.push(scheme);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = VerifierConfig::from_json("{}").unwrap();
        assert_eq!(config.network_timeout(), Duration::from_secs(5));
        assert_eq!(config.worker_threads(), None);
        assert_eq!(config.rpc().count(), 0);
        assert!(config.schemes().is_empty());
    }

    #[test]
    fn test_full_config() {
        let config = VerifierConfig::from_json(
            r#"{
                "networkTimeoutMs": 250,
                "workerThreads": 2,
                "rpc": { "solana-devnet": "https://api.devnet.solana.com" },
                "schemes": [
                    { "slug": "exact:solana", "enabled": false },
                    { "slug": "exact:solana-devnet", "config": { "checkAccounts": true } }
                ]
            }"#,
        )
        .unwrap();
        assert_eq!(config.network_timeout(), Duration::from_millis(250));
        assert_eq!(config.worker_threads(), Some(2));
        let (network, url) = config.rpc().next().unwrap();
        assert_eq!(network, "solana-devnet");
        assert_eq!(url.host_str(), Some("api.devnet.solana.com"));
        assert_eq!(config.schemes().len(), 2);
        assert!(!config.schemes()[0].enabled);
    }

    #[test]
    fn test_invalid_config() {
        assert!(matches!(
            VerifierConfig::from_json("{\"networkTimeoutMs\": 0}"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            VerifierConfig::from_json("{\"rpc\": {\"solana\": \"not a url\"}}"),
            Err(ConfigError::JsonParse(_))
        ));
        assert!(matches!(
            VerifierConfig::from_json("{\"schemes\": [{\"slug\": \"exact\"}]}"),
            Err(ConfigError::JsonParse(_))
        ));
    }
}
