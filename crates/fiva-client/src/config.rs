use std::path::Path;

use serde::{Deserialize, Serialize};
use ton_cell::Address;

use crate::error::FivaError;
use crate::retry::{Backoff, RetryConfig};

pub const DEFAULT_TTL_SECS: u64 = 300;

fn default_ttl_secs() -> u64 {
    DEFAULT_TTL_SECS
}

fn default_bounceable() -> bool {
    true
}

/// Client settings for one SY market.
///
/// ```json
/// {
///   "syMinter": "EQ...",
///   "retry": { "max_attempts": 10, "backoff": { "kind": "fixed", "delay_ms": 2000 } },
///   "ttlSecs": 300,
///   "bounceable": true,
///   "testnet": false
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientConfig {
    /// Root of the address graph; everything else is resolved from it.
    pub sy_minter: Address,
    #[serde(default)]
    pub retry: RetryConfig,
    /// Default lifetime of a transaction request.
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,
    /// Render message destinations as bounceable.
    #[serde(default = "default_bounceable")]
    pub bounceable: bool,
    /// Render message destinations with the test-only flag.
    #[serde(default)]
    pub testnet: bool,
}

impl ClientConfig {
    pub fn new(sy_minter: Address) -> Self {
        Self {
            sy_minter,
            retry: RetryConfig::default(),
            ttl_secs: DEFAULT_TTL_SECS,
            bounceable: true,
            testnet: false,
        }
    }

    pub fn from_json(json: &str) -> Result<Self, FivaError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| FivaError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub async fn load_from_file(path: &Path) -> Result<Self, FivaError> {
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| FivaError::Config(format!("{}: {e}", path.display())))?;
        Self::from_json(&contents)
    }

    pub fn validate(&self) -> Result<(), FivaError> {
        if self.ttl_secs == 0 {
            return Err(FivaError::Config("ttl is zero".into()));
        }
        if self.retry.max_attempts == 0 {
            return Err(FivaError::Config("retry.max_attempts is zero".into()));
        }
        if let Backoff::Exponential { base_ms, max_ms } = self.retry.backoff {
            if base_ms > max_ms {
                return Err(FivaError::Config(format!(
                    "backoff base {base_ms}ms exceeds max {max_ms}ms"
                )));
            }
        }
        Ok(())
    }
}
