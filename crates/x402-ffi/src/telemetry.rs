//! Process-wide log subscriber for hosts embedding the library.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Environment variable holding the log filter, e.g. `x402_chain_solana=debug`.
pub const LOG_FILTER_ENV: &str = "X402_LOG";
const DEFAULT_LOG_FILTER: &str = "warn";

/// Installs a stderr fmt subscriber filtered by `X402_LOG`.
///
/// Does nothing if the host process already installed a global subscriber.
pub fn init() {
    let filter = EnvFilter::try_from_env(LOG_FILTER_ENV)
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let installed = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
    if installed.is_ok() {
        tracing::debug!("x402 logging enabled via {}", LOG_FILTER_ENV);
    }
}
