// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::chain_config::ChainConfig;
use crate::load_config::{find_in_parent, resolve_config_path};
use crate::validation::validate_http_url;
use anyhow::{bail, Context, Result};
use figment::{
    providers::{Env, Format, Serialized, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::{
    env,
    path::{Path, PathBuf},
    time::Duration,
};
use tracing::debug;

pub const DEFAULT_CONFIG_NAME: &str = "contentgate.config.yaml";
pub const ENV_PREFIX: &str = "CONTENTGATE_";

/// Inclusive range of plaintext access levels the ledger accepts
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct AccessLevelRange {
    pub min: u64,
    pub max: u64,
}

impl Default for AccessLevelRange {
    fn default() -> Self {
        Self { min: 1, max: 10 }
    }
}

impl AccessLevelRange {
    pub fn contains(&self, value: u64) -> bool {
        (self.min..=self.max).contains(&value)
    }
}

/// Upper bounds for every call leaving the process
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct TimeoutConfig {
    pub ledger_read_ms: u64,
    /// Covers broadcast and waiting for the receipt
    pub ledger_write_ms: u64,
    pub encryption_ms: u64,
    pub oracle_ms: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            ledger_read_ms: 15_000,
            ledger_write_ms: 180_000,
            encryption_ms: 30_000,
            oracle_ms: 60_000,
        }
    }
}

impl TimeoutConfig {
    pub fn ledger_read(&self) -> Duration {
        Duration::from_millis(self.ledger_read_ms)
    }

    pub fn ledger_write(&self) -> Duration {
        Duration::from_millis(self.ledger_write_ms)
    }

    pub fn encryption(&self) -> Duration {
        Duration::from_millis(self.encryption_ms)
    }

    pub fn oracle(&self) -> Duration {
        Duration::from_millis(self.oracle_ms)
    }
}

/// Backoff applied to read-only ledger calls. Signing calls are never retried.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub initial_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay_ms: 500,
        }
    }
}

impl RetryConfig {
    pub fn initial_delay(&self) -> Duration {
        Duration::from_millis(self.initial_delay_ms)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct RelayerConfig {
    /// Base url of the relayer serving input proofs and public decryption
    pub url: String,
}

impl Default for RelayerConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:3000".to_string(),
        }
    }
}

/// The configuration as it appears on disk
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct UnscopedAppConfig {
    chain: ChainConfig,
    relayer: RelayerConfig,
    access_level: AccessLevelRange,
    timeouts: TimeoutConfig,
    read_retry: RetryConfig,
    /// How long a finished status notice stays visible
    notice_dismiss_ms: Option<u64>,
    /// Set the Open Telemetry collector grpc endpoint. Eg. 127.0.0.1:4317
    otel: Option<String>,
}

/// The validated config used throughout the app
#[derive(Debug, Clone)]
pub struct AppConfig {
    chain: ChainConfig,
    relayer: RelayerConfig,
    access_level: AccessLevelRange,
    timeouts: TimeoutConfig,
    read_retry: RetryConfig,
    notice_dismiss: Duration,
    otel: Option<String>,
    config_file: Option<PathBuf>,
}

impl AppConfig {
    pub fn try_from_unscoped(
        config: UnscopedAppConfig,
        config_file: Option<PathBuf>,
    ) -> Result<Self> {
        config.chain.validate()?;
        validate_http_url(&config.relayer.url)
            .with_context(|| format!("Invalid relayer url '{}'", config.relayer.url))?;

        if config.access_level.min > config.access_level.max {
            bail!(
                "access_level.min ({}) must not exceed access_level.max ({})",
                config.access_level.min,
                config.access_level.max
            );
        }

        if config.read_retry.max_attempts == 0 {
            bail!("read_retry.max_attempts must be at least 1");
        }

        Ok(AppConfig {
            chain: config.chain,
            relayer: config.relayer,
            access_level: config.access_level,
            timeouts: config.timeouts,
            read_retry: config.read_retry,
            notice_dismiss: Duration::from_millis(config.notice_dismiss_ms.unwrap_or(3000)),
            otel: config.otel,
            config_file,
        })
    }

    /// Get the chain config
    pub fn chain(&self) -> &ChainConfig {
        &self.chain
    }

    /// Get the relayer config
    pub fn relayer(&self) -> &RelayerConfig {
        &self.relayer
    }

    pub fn access_level(&self) -> AccessLevelRange {
        self.access_level
    }

    pub fn timeouts(&self) -> &TimeoutConfig {
        &self.timeouts
    }

    pub fn read_retry(&self) -> &RetryConfig {
        &self.read_retry
    }

    pub fn notice_dismiss(&self) -> Duration {
        self.notice_dismiss
    }

    /// Get the open telemetry collector url
    pub fn otel(&self) -> Option<String> {
        self.otel.clone()
    }

    /// The file this config was read from, if any
    pub fn config_file(&self) -> Option<&Path> {
        self.config_file.as_deref()
    }
}

/// Load the config at `config_file` or the default location if not provided. Environment
/// variables prefixed with `CONTENTGATE_` override file values, nested keys are separated
/// with `__` eg. `CONTENTGATE_CHAIN__RPC_URL`.
pub fn load_config(config_file: Option<String>, otel: Option<String>) -> Result<AppConfig> {
    let config_file = config_file.map(PathBuf::from);
    let cwd = env::current_dir()?;
    let resolved_config_path = resolve_config_path(
        find_in_parent,
        &cwd,
        &OsDirs::config_dir(),
        DEFAULT_CONFIG_NAME,
        config_file.as_deref(),
    );

    if !resolved_config_path.exists() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("{} does not exist", resolved_config_path.display()),
        ))
        .context("Configuration file not found");
    }
    debug!("Loading configuration from {:?}", resolved_config_path);

    let mut config: UnscopedAppConfig =
        Figment::from(Serialized::defaults(UnscopedAppConfig::default()))
            .merge(Yaml::file(&resolved_config_path))
            .merge(
                Env::prefixed(ENV_PREFIX)
                    .ignore(&["private_key"])
                    .split("__"),
            )
            .extract()
            .context("Could not parse configuration")?;

    if otel.is_some() {
        config.otel = otel;
    }

    AppConfig::try_from_unscoped(config, Some(resolved_config_path))
}

pub struct OsDirs;
impl OsDirs {
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("contentgate")
    }
}
