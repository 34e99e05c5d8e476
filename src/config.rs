use crate::error::{Error, Result};
use crate::proxy::gate::DEFAULT_IGNORED_PREFIXES;
use crate::proxy::types::{
    ApiKey, EdgeConfig, UpstreamBaseUrl, DEFAULT_API_KEY, DEFAULT_CACHE_TTL,
    DEFAULT_UPSTREAM_BASE_URL,
};
use serde::Deserialize;
use std::env;
use std::time::Duration;

pub use config::ConfigError;
use config::{Config, Environment, File};

/// Prefix for environment overrides, e.g. `EDGE_ROUTER__UPSTREAM__BASE_URL`
pub const ENV_PREFIX: &str = "EDGE_ROUTER";

/// Regions the service is deployed to
pub const DEFAULT_REGIONS: &[&str] = &["iad1", "sfo1", "fra1", "hnd1", "syd1"];

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub application: ApplicationSettings,
    pub upstream: UpstreamSettings,
    pub cache: CacheSettings,
    pub gate: GateSettings,
    pub deployment: DeploymentSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ApplicationSettings {
    pub host: String,
    pub port: u16,
    pub environment: String,
}

#[derive(Deserialize, Clone)]
pub struct UpstreamSettings {
    pub base_url: String,
    pub api_key: String,
}

impl std::fmt::Debug for UpstreamSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpstreamSettings")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct CacheSettings {
    pub ttl_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GateSettings {
    pub ignored_prefixes: Vec<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DeploymentSettings {
    pub regions: Vec<String>,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Pretty,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingSettings {
    pub level: String,
    pub format: LogFormat,
}

impl Settings {
    pub fn new() -> std::result::Result<Self, ConfigError> {
        let environment = env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());
        Self::from_sources(&environment, Environment::with_prefix(ENV_PREFIX))
    }

    /// Layer defaults, optional config files and `overrides`, in that order
    pub fn from_sources(
        environment: &str,
        overrides: Environment,
    ) -> std::result::Result<Self, ConfigError> {
        let config = Config::builder()
            // Start with default values
            .set_default("application.host", "0.0.0.0")?
            .set_default("application.port", 8080)?
            .set_default("application.environment", environment)?
            .set_default("upstream.base_url", DEFAULT_UPSTREAM_BASE_URL)?
            .set_default("upstream.api_key", DEFAULT_API_KEY)?
            .set_default("cache.ttl_secs", DEFAULT_CACHE_TTL.as_secs())?
            .set_default("gate.ignored_prefixes", DEFAULT_IGNORED_PREFIXES.to_vec())?
            .set_default("deployment.regions", DEFAULT_REGIONS.to_vec())?
            .set_default("logging.level", "info")?
            .set_default("logging.format", "json")?
            // Add configuration file if it exists
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{environment}")).required(false))
            .add_source(File::with_name("config/local").required(false))
            .add_source(
                overrides
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("gate.ignored_prefixes")
                    .with_list_parse_key("deployment.regions")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Validated configuration for the edge service
    pub fn edge_config(&self) -> Result<EdgeConfig> {
        let base_url = UpstreamBaseUrl::try_new(self.upstream.base_url.clone()).map_err(|e| {
            Error::invalid_setting("upstream.base_url", e.to_string())
        })?;
        let api_key = ApiKey::try_new(self.upstream.api_key.clone())
            .map_err(|e| Error::invalid_setting("upstream.api_key", e.to_string()))?;

        if self.cache.ttl_secs == 0 {
            return Err(Error::invalid_setting(
                "cache.ttl_secs",
                "must be greater than zero",
            ));
        }

        Ok(EdgeConfig {
            base_url,
            api_key,
            cache_ttl: Duration::from_secs(self.cache.ttl_secs),
            ignored_prefixes: self.gate.ignored_prefixes.clone(),
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.application.host, self.application.port)
    }
}
