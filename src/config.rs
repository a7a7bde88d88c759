use config::{Config as ConfigBuilder, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub database: DatabaseConfig,
    #[serde(default)]
    pub pricing: PricingConfig,
    #[serde(default)]
    pub sources: SourcesConfig,
    #[serde(default)]
    pub menu: MenuConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PricingConfig {
    #[serde(default = "default_currency")]
    pub currency: String,
    /// Cron expression for the daily refresh (seconds-resolution, local
    /// time). Default: 02:00 every day.
    #[serde(default = "default_refresh_cron")]
    pub refresh_cron: String,
    /// Politeness delay between external lookups.
    #[serde(default = "default_rate_limit_ms")]
    pub rate_limit_ms: u64,
    /// Hard bound on a single external lookup.
    #[serde(default = "default_lookup_timeout_ms")]
    pub lookup_timeout_ms: u64,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            currency: default_currency(),
            refresh_cron: default_refresh_cron(),
            rate_limit_ms: default_rate_limit_ms(),
            lookup_timeout_ms: default_lookup_timeout_ms(),
        }
    }
}

fn default_currency() -> String {
    "VND".to_string()
}

fn default_refresh_cron() -> String {
    "0 0 2 * * *".to_string()
}

fn default_rate_limit_ms() -> u64 {
    500
}

fn default_lookup_timeout_ms() -> u64 {
    10_000
}

#[derive(Debug, Deserialize, Clone)]
pub struct SourcesConfig {
    /// Market scraping sidecar endpoint. Empty disables the source.
    #[serde(default = "default_market_url")]
    pub market_url: String,
    /// AI estimation endpoint used as fallback. Empty disables it.
    #[serde(default)]
    pub ai_url: String,
    #[serde(default = "default_ai_model")]
    pub ai_model: String,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            market_url: default_market_url(),
            ai_url: String::new(),
            ai_model: default_ai_model(),
        }
    }
}

fn default_market_url() -> String {
    "http://127.0.0.1:8090/api/prices".to_string()
}

fn default_ai_model() -> String {
    "gpt-4o-mini".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct MenuConfig {
    /// Candidate pool size per menu block.
    #[serde(default = "default_pool_limit")]
    pub pool_limit: usize,
    /// Catalog scan bound applied before exclusion filtering.
    #[serde(default = "default_scan_limit")]
    pub scan_limit: u32,
}

impl Default for MenuConfig {
    fn default() -> Self {
        Self {
            pool_limit: default_pool_limit(),
            scan_limit: default_scan_limit(),
        }
    }
}

fn default_pool_limit() -> usize {
    20
}

fn default_scan_limit() -> u32 {
    100
}

#[derive(Debug, Deserialize, Clone)]
pub struct ObservabilityConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from file and environment variables
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables (ANGI__DATABASE__URL, etc.)
    /// 2. Config file specified by path
    /// 3. Hardcoded defaults
    pub fn load(config_path: Option<String>) -> Result<Self, ConfigError> {
        let mut builder = ConfigBuilder::builder();

        builder = builder
            .set_default("database.url", "sqlite:angi.db")?
            .set_default("database.max_connections", 5)?;

        let config_file_path = config_path
            .or_else(|| env::var("CONFIG_PATH").ok())
            .unwrap_or_else(|| "config/default.toml".to_string());

        if std::path::Path::new(&config_file_path).exists() {
            builder = builder.add_source(File::with_name(&config_file_path));
        }

        builder = builder.add_source(
            Environment::with_prefix("ANGI")
                .separator("__")
                .try_parsing(true),
        );

        // legacy variable without prefix, kept for deploy scripts
        if let Ok(database_url) = env::var("DATABASE_URL") {
            builder = builder.set_override("database.url", database_url)?;
        }

        builder.build()?.try_deserialize()
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.database.max_connections < 1 {
            return Err("Database max_connections must be at least 1".to_string());
        }
        if self.pricing.refresh_cron.trim().is_empty() {
            return Err("Pricing refresh_cron must not be empty".to_string());
        }
        if self.pricing.lookup_timeout_ms == 0 {
            return Err("Pricing lookup_timeout_ms must be greater than 0".to_string());
        }
        if self.menu.pool_limit == 0 {
            return Err("Menu pool_limit must be greater than 0".to_string());
        }
        Ok(())
    }
}
