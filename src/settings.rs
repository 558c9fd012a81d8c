//! Settings loaded from a TOML file
//!
//! ```toml
//! cryptocurrencies = ["bitcoin", "ethereum", "dogecoin"]
//! refresh_interval_secs = 180
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::core::CoinId;
use crate::providers::coingecko::COINGECKO_API_BASE;

/// File name looked up in the working directory
pub const LOCAL_CONFIG_FILE: &str = "coinbar.toml";

pub const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 180;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

/// Configuration problems. All of them stop the app before a window opens.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("No config file found (looked in {})", display_paths(.0))]
    NotFound(Vec<PathBuf>),

    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("No cryptocurrencies configured; add at least one id to `cryptocurrencies`")]
    NoCoins,

    #[error("refresh_interval_secs must be greater than zero")]
    ZeroInterval,

    #[error("request_timeout_secs must be greater than zero")]
    ZeroTimeout,

    #[error("Invalid api_base_url '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// File representation; every key is optional so presence can be checked
#[derive(Debug, Default, Deserialize)]
struct RawSettings {
    cryptocurrencies: Option<Vec<String>>,
    refresh_interval_secs: Option<u64>,
    api_base_url: Option<String>,
    request_timeout_secs: Option<u64>,
}

impl RawSettings {
    fn read(path: &Path) -> Result<Self, ConfigError> {
        tracing::debug!("Loading settings from {}", path.display());

        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        Ok(toml::from_str(&content)?)
    }

    fn apply(&mut self, overrides: Overrides) {
        if let Some(coins) = overrides.coins {
            self.cryptocurrencies = Some(coins);
        }
        if let Some(interval) = overrides.refresh_interval_secs {
            self.refresh_interval_secs = Some(interval);
        }
    }

    fn into_settings(self) -> Result<Settings, ConfigError> {
        let settings = Settings {
            cryptocurrencies: normalize_coins(self.cryptocurrencies.unwrap_or_default()),
            refresh_interval_secs: self
                .refresh_interval_secs
                .unwrap_or(DEFAULT_REFRESH_INTERVAL_SECS),
            api_base_url: self
                .api_base_url
                .unwrap_or_else(|| COINGECKO_API_BASE.to_string()),
            request_timeout_secs: self
                .request_timeout_secs
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
        };

        settings.validate()
    }
}

/// Command-line values that take precedence over the file
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub coins: Option<Vec<String>>,
    pub refresh_interval_secs: Option<u64>,
}

/// Validated application settings
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// Coins to track, in display order, without duplicates
    pub cryptocurrencies: Vec<CoinId>,
    /// Seconds between automatic refreshes
    pub refresh_interval_secs: u64,
    /// Base URL of the CoinGecko-compatible API
    pub api_base_url: String,
    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,
}

impl Settings {
    /// Load settings from `explicit`, or from the first default location that
    /// exists, then apply `overrides` and validate the result.
    ///
    /// Without an explicit path, a missing file is only an error when the
    /// overrides do not name any coins either.
    pub fn load(explicit: Option<&Path>, overrides: Overrides) -> Result<Self, ConfigError> {
        Self::load_from(explicit, &Self::candidate_paths(), overrides)
    }

    fn load_from(
        explicit: Option<&Path>,
        candidates: &[PathBuf],
        overrides: Overrides,
    ) -> Result<Self, ConfigError> {
        let mut raw = match explicit {
            Some(path) => RawSettings::read(path)?,
            None => match candidates.iter().find(|p| p.exists()) {
                Some(path) => RawSettings::read(path)?,
                None if overrides.coins.is_some() => {
                    tracing::debug!("No config file found, using coins from the command line");
                    RawSettings::default()
                }
                None => return Err(ConfigError::NotFound(candidates.to_vec())),
            },
        };

        raw.apply(overrides);
        raw.into_settings()
    }

    /// Default lookup order: working directory, then the user config dir
    pub fn candidate_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from(LOCAL_CONFIG_FILE)];
        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("coinbar").join("config.toml"));
        }
        paths
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let raw: RawSettings = toml::from_str(content)?;
        raw.into_settings()
    }

    pub fn refresh_interval(&self) -> u64 {
        self.refresh_interval_secs
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    fn validate(self) -> Result<Self, ConfigError> {
        if self.cryptocurrencies.is_empty() {
            return Err(ConfigError::NoCoins);
        }
        if self.refresh_interval_secs == 0 {
            return Err(ConfigError::ZeroInterval);
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout);
        }

        let url = url::Url::parse(&self.api_base_url).map_err(|e| ConfigError::InvalidUrl {
            url: self.api_base_url.clone(),
            reason: e.to_string(),
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidUrl {
                url: self.api_base_url.clone(),
                reason: format!("unsupported scheme '{}'", url.scheme()),
            });
        }

        Ok(self)
    }
}

/// Trim ids, drop blanks and duplicates while keeping the first occurrence
fn normalize_coins(ids: Vec<String>) -> Vec<CoinId> {
    let mut coins: Vec<CoinId> = Vec::with_capacity(ids.len());
    for id in ids {
        let id = id.trim();
        if id.is_empty() {
            continue;
        }
        let coin = CoinId::from(id);
        if !coins.contains(&coin) {
            coins.push(coin);
        }
    }
    coins
}
