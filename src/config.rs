// Copyright (c) 2026 Amunchain
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//     http://www.apache.org/licenses/LICENSE-2.0
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! TOML harness configuration.
//!
//! Addresses are kept as strings until [`HarnessConfig::validate`] so a bad
//! entry is reported with the field it came from.

use crate::core::economics::tolerance::{CURRENCY_DELTA_UNITS, SHARE_DELTA_UNITS};
use crate::core::types::{Address, ScaledAmount};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Env var naming the config path.
pub const CONFIG_ENV: &str = "GEYSER_HARNESS_CONFIG";
/// Path used when [`CONFIG_ENV`] is unset.
pub const DEFAULT_CONFIG_PATH: &str = "./harness.toml";

/// Config errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File could not be read.
    #[error("read {path}: {source}")]
    Read {
        /// Path tried.
        path: String,
        /// Underlying failure.
        #[source]
        source: std::io::Error,
    },
    /// Not valid TOML or wrong schema.
    #[error("parse: {0}")]
    Parse(#[from] toml::de::Error),
    /// Field value rejected.
    #[error("invalid {field}: {reason}")]
    Invalid {
        /// Dotted field name.
        field: String,
        /// What is wrong with it.
        reason: String,
    },
}

fn invalid(field: impl Into<String>, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field: field.into(),
        reason: reason.into(),
    }
}

fn default_timeout_ms() -> u64 {
    30_000
}

// TOML integers are 64-bit; both presets fit.
fn default_currency_delta() -> u64 {
    CURRENCY_DELTA_UNITS
}

fn default_share_delta() -> u64 {
    SHARE_DELTA_UNITS
}

fn default_level() -> String {
    "info".to_string()
}

/// `[rpc]`
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RpcSection {
    /// JSON-RPC endpoint.
    pub url: String,
    /// Per-request timeout.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

/// `[contracts]`
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ContractsSection {
    /// Elastic token address.
    pub token: String,
    /// Geyser address.
    pub geyser: String,
}

/// `[accounts]`
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AccountsSection {
    /// Owner account; `eth_accounts[0]` when absent.
    #[serde(default)]
    pub owner: Option<String>,
    /// Accounts included in the status report.
    #[serde(default)]
    pub watch: Vec<String>,
}

/// `[verification]`
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VerificationSection {
    /// Founder share of rewards; verification is skipped when absent.
    #[serde(default)]
    pub founder_percentage: Option<u8>,
    /// Token amount tolerance.
    #[serde(default = "default_currency_delta")]
    pub currency_delta: u64,
    /// Share amount tolerance.
    #[serde(default = "default_share_delta")]
    pub share_delta: u64,
}

impl Default for VerificationSection {
    fn default() -> Self {
        Self {
            founder_percentage: None,
            currency_delta: default_currency_delta(),
            share_delta: default_share_delta(),
        }
    }
}

/// `[logging]`
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LoggingSection {
    /// One JSON object per event instead of compact text.
    #[serde(default)]
    pub json: bool,
    /// Max level (`trace` .. `error`).
    #[serde(default = "default_level")]
    pub level: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            json: false,
            level: default_level(),
        }
    }
}

/// Whole config file.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HarnessConfig {
    /// Node endpoint.
    pub rpc: RpcSection,
    /// Deployed contracts.
    pub contracts: ContractsSection,
    #[serde(default)]
    /// Accounts to act as and report on.
    pub accounts: AccountsSection,
    #[serde(default)]
    /// Tolerances and founder split.
    pub verification: VerificationSection,
    #[serde(default)]
    /// Subscriber setup.
    pub logging: LoggingSection,
}

/// Addresses from a validated config.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedAddresses {
    /// Token.
    pub token: Address,
    /// Geyser.
    pub geyser: Address,
    /// Owner, if configured.
    pub owner: Option<Address>,
    /// Watched accounts.
    pub watch: Vec<Address>,
}

fn parse_address(field: &str, raw: &str) -> Result<Address, ConfigError> {
    raw.parse::<Address>()
        .map_err(|e| invalid(field, e.to_string()))
}

impl HarnessConfig {
    /// Parse a TOML document and validate it.
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let cfg: HarnessConfig = toml::from_str(raw)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Reject values the harness cannot run with.
    pub fn validate(&self) -> Result<ResolvedAddresses, ConfigError> {
        if self.rpc.url.trim().is_empty() {
            return Err(invalid("rpc.url", "empty"));
        }
        if self.rpc.timeout_ms == 0 {
            return Err(invalid("rpc.timeout_ms", "must be positive"));
        }
        if let Some(pct) = self.verification.founder_percentage {
            if pct > 100 {
                return Err(invalid(
                    "verification.founder_percentage",
                    format!("{pct} exceeds 100"),
                ));
            }
        }

        let token = parse_address("contracts.token", &self.contracts.token)?;
        let geyser = parse_address("contracts.geyser", &self.contracts.geyser)?;
        let owner = self
            .accounts
            .owner
            .as_deref()
            .map(|o| parse_address("accounts.owner", o))
            .transpose()?;
        let watch = self
            .accounts
            .watch
            .iter()
            .enumerate()
            .map(|(i, w)| parse_address(&format!("accounts.watch[{i}]"), w))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ResolvedAddresses {
            token,
            geyser,
            owner,
            watch,
        })
    }

    /// Currency tolerance as an amount.
    pub fn currency_delta(&self) -> ScaledAmount {
        ScaledAmount::from(self.verification.currency_delta)
    }

    /// Share tolerance as an amount.
    pub fn share_delta(&self) -> ScaledAmount {
        ScaledAmount::from(self.verification.share_delta)
    }

    /// RPC timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.rpc.timeout_ms)
    }
}

/// Read, parse and validate the config at `path`.
pub fn load_config(path: impl AsRef<Path>) -> Result<HarnessConfig, ConfigError> {
    let path = path.as_ref();
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.display().to_string(),
        source,
    })?;
    HarnessConfig::from_toml_str(&raw)
}

/// Config path from [`CONFIG_ENV`], or [`DEFAULT_CONFIG_PATH`].
pub fn config_path_from_env() -> String {
    std::env::var(CONFIG_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string())
}
