//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (LAYOVER_*)
//! 2. TOML config file (if LAYOVER_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::Generation;

mod validation;

pub use validation::ConfigError;

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (LAYOVER_*)
/// 2. TOML config file (if LAYOVER_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Base URL of the site being cached, e.g. `https://site.test/trips/jeju/`.
    ///
    /// Manifest entries and intercepted request paths resolve against this.
    /// Set via LAYOVER_ORIGIN environment variable. Required.
    #[serde(default)]
    pub origin: Option<String>,

    /// Current cache generation name, `<stem>-v<N>`, e.g. `jeju-trip-v12`.
    ///
    /// Deploy tooling bumps the version; every other generation is evicted
    /// on activation. Set via LAYOVER_CACHE_NAME environment variable.
    /// Required.
    #[serde(default)]
    pub cache_name: Option<String>,

    /// Path to the JSON cache manifest primed at install time.
    ///
    /// Set via LAYOVER_MANIFEST_PATH environment variable.
    #[serde(default = "default_manifest_path")]
    pub manifest_path: PathBuf,

    /// Path to SQLite cache database.
    ///
    /// Set via LAYOVER_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Socket address the gateway listens on.
    ///
    /// Set via LAYOVER_LISTEN_ADDR environment variable.
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// User-Agent string for upstream HTTP requests.
    ///
    /// Set via LAYOVER_USER_AGENT environment variable.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Maximum bytes to fetch per request.
    ///
    /// Set via LAYOVER_MAX_BYTES environment variable.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,

    /// Upstream HTTP request timeout in milliseconds.
    ///
    /// Set via LAYOVER_TIMEOUT_MS environment variable.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_manifest_path() -> PathBuf {
    PathBuf::from("./cache-manifest.json")
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./layover-cache.sqlite")
}

fn default_listen_addr() -> String {
    "127.0.0.1:8787".into()
}

fn default_user_agent() -> String {
    "layover/0.1".into()
}

fn default_max_bytes() -> usize {
    5_242_880 // 5MB
}

fn default_timeout_ms() -> u64 {
    20_000
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            origin: None,
            cache_name: None,
            manifest_path: default_manifest_path(),
            db_path: default_db_path(),
            listen_addr: default_listen_addr(),
            user_agent: default_user_agent(),
            max_bytes: default_max_bytes(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `LAYOVER_`
    /// 2. TOML file from `LAYOVER_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("LAYOVER_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("LAYOVER_")
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }

    /// The site origin as a parsed URL, with a trailing slash ensured so
    /// relative manifest entries resolve under it rather than beside it.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` if origin is unset, or
    /// `ConfigError::Invalid` if it is not a plain http(s) base URL.
    pub fn site_origin(&self) -> Result<Url, ConfigError> {
        let raw = self.origin.as_deref().ok_or_else(|| ConfigError::Missing {
            field: "origin".into(),
            hint: "Set LAYOVER_ORIGIN environment variable".into(),
        })?;

        let invalid = |reason: &str| ConfigError::Invalid { field: "origin".into(), reason: reason.into() };

        let mut url = Url::parse(raw).map_err(|e| invalid(&e.to_string()))?;

        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(invalid("scheme must be http or https"));
        }
        if url.host_str().is_none() {
            return Err(invalid("must have a host"));
        }
        if url.query().is_some() || url.fragment().is_some() {
            return Err(invalid("must not carry a query or fragment"));
        }

        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }

        Ok(url)
    }

    /// The current cache generation, parsed from `cache_name`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` if cache_name is unset, or
    /// `ConfigError::Invalid` if it does not follow `<stem>-v<N>`.
    pub fn generation(&self) -> Result<Generation, ConfigError> {
        let raw = self.cache_name.as_deref().ok_or_else(|| ConfigError::Missing {
            field: "cache_name".into(),
            hint: "Set LAYOVER_CACHE_NAME environment variable".into(),
        })?;

        Generation::parse(raw)
            .map_err(|e| ConfigError::Invalid { field: "cache_name".into(), reason: e.to_string() })
    }
}
