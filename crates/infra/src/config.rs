//! Configuration loading and representation.
//!
//! Sources, lowest precedence first: built-in defaults, an optional JSON file,
//! then `STOCKLEDGER_*` environment variables.

use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use stockledger_core::Sku;

pub const ENV_FIRST_SKU: &str = "STOCKLEDGER_FIRST_SKU";
pub const ENV_DELETE_POLICY: &str = "STOCKLEDGER_DELETE_POLICY";

/// What deleting a product that the ledger references does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeletePolicy {
    /// Reject with `ReferentialIntegrity`.
    #[default]
    Deny,
    /// Void the SKU's PENDING transactions, then delete; history is kept.
    CascadeVoid,
}

impl core::str::FromStr for DeletePolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "deny" => Ok(DeletePolicy::Deny),
            "cascade-void" | "cascade_void" => Ok(DeletePolicy::CascadeVoid),
            other => Err(ConfigError::Invalid {
                key: ENV_DELETE_POLICY,
                value: other.to_string(),
                reason: "expected `deny` or `cascade-void`",
            }),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {key}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: &'static str,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InventoryConfig {
    /// First SKU handed out when a product is created without one.
    pub first_sku: u64,
    pub delete_policy: DeletePolicy,
}

impl Default for InventoryConfig {
    fn default() -> Self {
        Self {
            first_sku: 1,
            delete_policy: DeletePolicy::Deny,
        }
    }
}

impl InventoryConfig {
    /// Defaults overridden by the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().with_overrides(|key| std::env::var(key).ok())
    }

    /// Read a JSON file, then apply environment overrides.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        let file: Self = serde_json::from_str(&raw)
            .with_context(|| format!("parsing config file {}", path.display()))?;
        let config = file.with_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Apply overrides from `lookup` (environment-style keys).
    pub fn with_overrides(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        if let Some(raw) = lookup(ENV_FIRST_SKU) {
            self.first_sku = raw.trim().parse().map_err(|_| ConfigError::Invalid {
                key: ENV_FIRST_SKU,
                value: raw.clone(),
                reason: "expected a non-negative integer",
            })?;
        }
        if let Some(raw) = lookup(ENV_DELETE_POLICY) {
            self.delete_policy = raw.parse()?;
        }
        Ok(self)
    }

    pub fn first_sku(&self) -> Sku {
        Sku::new(self.first_sku)
    }
}
