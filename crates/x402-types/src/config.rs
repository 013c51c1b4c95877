//! Environment variable resolution for configuration values.
//!
//! Configuration documents may reference environment variables instead of
//! embedding values such as RPC endpoints with API keys:
//!
//! ```json
//! {
//!   "solana": "https://api.mainnet-beta.solana.com",
//!   "solana-devnet": "$SOLANA_DEVNET_RPC",
//!   "solana-mainnet": "${SOLANA_MAINNET_RPC}"
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::ops::Deref;
use std::str::FromStr;

/// A transparent wrapper that resolves environment variables during deserialization.
///
/// Supports both literal values and environment variable references:
/// - Literal: `"https://api.devnet.solana.com"`
/// - Simple env var: `"$SOLANA_RPC"`
/// - Braced env var: `"${SOLANA_RPC}"`
///
/// The resolved text is then parsed with `T::from_str`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiteralOrEnv<T>(T);

impl<T> LiteralOrEnv<T> {
    pub fn from_literal(value: T) -> Self {
        Self(value)
    }

    pub fn inner(&self) -> &T {
        &self.0
    }

    pub fn into_inner(self) -> T {
        self.0
    }

    /// Returns the variable name if `s` is written as `$VAR` or `${VAR}`.
    fn env_var_name(s: &str) -> Option<&str> {
        if let Some(braced) = s.strip_prefix("${").and_then(|r| r.strip_suffix('}')) {
            return Some(braced);
        }
        let bare = s.strip_prefix('$')?;
        let is_name = !bare.is_empty() && bare.chars().all(|c| c.is_alphanumeric() || c == '_');
        is_name.then_some(bare)
    }
}

impl<T> Deref for LiteralOrEnv<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<'de, T> Deserialize<'de> for LiteralOrEnv<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let value = match Self::env_var_name(&s) {
            Some(var_name) => std::env::var(var_name).map_err(|_| {
                serde::de::Error::custom(format!(
                    "Environment variable '{var_name}' not found (referenced as '{s}')"
                ))
            })?,
            None => s,
        };
        let parsed = value
            .parse::<T>()
            .map_err(|e| serde::de::Error::custom(format!("Failed to parse value: {e}")))?;
        Ok(LiteralOrEnv(parsed))
    }
}

impl<T> Serialize for LiteralOrEnv<T>
where
    T: Serialize,
{
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.0.serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_var_name_forms() {
        assert_eq!(LiteralOrEnv::<String>::env_var_name("$RPC_URL"), Some("RPC_URL"));
        assert_eq!(LiteralOrEnv::<String>::env_var_name("${RPC_URL}"), Some("RPC_URL"));
        assert_eq!(LiteralOrEnv::<String>::env_var_name("$"), None);
        assert_eq!(LiteralOrEnv::<String>::env_var_name("$RPC-URL"), None);
        assert_eq!(
            LiteralOrEnv::<String>::env_var_name("https://example.com"),
            None
        );
    }

    #[test]
    fn test_literal_value() {
        let v: LiteralOrEnv<u64> = serde_json::from_str("\"5000\"").unwrap();
        assert_eq!(*v, 5000);
    }

    #[test]
    fn test_env_value() {
        // SAFETY: the variable name is unique to this test.
        unsafe { std::env::set_var("X402_TYPES_CONFIG_TEST_TIMEOUT", "750") };
        let v: LiteralOrEnv<u64> =
            serde_json::from_str("\"${X402_TYPES_CONFIG_TEST_TIMEOUT}\"").unwrap();
        assert_eq!(v.into_inner(), 750);
    }

    #[test]
    fn test_missing_env_value() {
        let err = serde_json::from_str::<LiteralOrEnv<String>>("\"$X402_TYPES_CONFIG_TEST_UNSET\"")
            .unwrap_err();
        assert!(err.to_string().contains("X402_TYPES_CONFIG_TEST_UNSET"));
    }
}
