//! Configuration management for tqmweb
//!
//! This module handles loading, validation, and management of
//! tqmweb configuration from YAML files.

pub mod error;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub use error::{ConfigError, ConfigErrorCode, ConfigResult};

// ==================== Configuration Types ====================

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,
    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8081
}

/// Marketplace API access
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketplaceConfig {
    /// REST gateway, e.g. https://api.daraz.pk/rest
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub app_key: String,
    #[serde(default)]
    pub app_secret: String,
    #[serde(default)]
    pub access_token: String,
    /// Ingest orders created on or after this date
    #[serde(default)]
    pub created_after: Option<NaiveDate>,
    /// Used when `created_after` is unset
    #[serde(default = "default_lookback_days")]
    pub lookback_days: u32,
    /// Status filters for order listing; empty means all
    #[serde(default)]
    pub statuses: Vec<String>,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    /// Days after the order date searched for finance rows
    #[serde(default = "default_finance_window_days")]
    pub finance_window_days: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Serve orders from a JSON dump instead of the live API
    #[serde(default)]
    pub fixture_path: Option<PathBuf>,
}

impl Default for MarketplaceConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            app_key: String::new(),
            app_secret: String::new(),
            access_token: String::new(),
            created_after: None,
            lookback_days: default_lookback_days(),
            statuses: Vec::new(),
            page_size: default_page_size(),
            finance_window_days: default_finance_window_days(),
            timeout_secs: default_timeout_secs(),
            fixture_path: None,
        }
    }
}

fn default_base_url() -> String {
    "https://api.daraz.pk/rest".to_string()
}

fn default_lookback_days() -> u32 {
    30
}

fn default_page_size() -> u32 {
    100
}

fn default_finance_window_days() -> u32 {
    90
}

fn default_timeout_secs() -> u64 {
    30
}

impl MarketplaceConfig {
    /// Whether orders come from a local fixture rather than the live API
    pub fn uses_fixture(&self) -> bool {
        self.fixture_path.is_some()
    }

    /// First order date to ingest
    pub fn ingest_start(&self, today: NaiveDate) -> NaiveDate {
        self.created_after
            .unwrap_or_else(|| today - chrono::Duration::days(i64::from(self.lookback_days)))
    }
}

/// Storage backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// SQLite tables
    Sql,
    /// Two flat JSON files
    Json,
}

impl Default for StorageBackend {
    fn default() -> Self {
        StorageBackend::Json
    }
}

impl std::str::FromStr for StorageBackend {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sql" | "sqlite" => Ok(StorageBackend::Sql),
            "json" | "file" => Ok(StorageBackend::Json),
            _ => Err(format!("Invalid storage backend: {}", s)),
        }
    }
}

impl std::fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageBackend::Sql => write!(f, "sql"),
            StorageBackend::Json => write!(f, "json"),
        }
    }
}

/// Cost and payment persistence
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,
    #[serde(default = "default_database_url")]
    pub database_url: String,
    #[serde(default = "default_costs_file")]
    pub costs_file: PathBuf,
    #[serde(default = "default_payments_file")]
    pub payments_file: PathBuf,
    /// Owner recorded on payments and used to scope payment history
    #[serde(default = "default_user_id")]
    pub user_id: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            database_url: default_database_url(),
            costs_file: default_costs_file(),
            payments_file: default_payments_file(),
            user_id: default_user_id(),
        }
    }
}

fn default_database_url() -> String {
    "sqlite://tqmweb.db".to_string()
}

fn default_costs_file() -> PathBuf {
    PathBuf::from("./data/costs.json")
}

fn default_payments_file() -> PathBuf {
    PathBuf::from("./data/payments.json")
}

fn default_user_id() -> String {
    "operator".to_string()
}

/// Dashboard display settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardConfig {
    #[serde(default = "default_title")]
    pub title: String,
    /// Currency label used in formatted amounts
    #[serde(default = "default_currency")]
    pub currency: String,
    /// Vendors always shown in the liability breakdown and payment form
    #[serde(default = "default_vendors")]
    pub vendors: Vec<String>,
    /// Vendor assigned to items without a cost record
    #[serde(default = "default_vendor")]
    pub default_vendor: String,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            title: default_title(),
            currency: default_currency(),
            vendors: default_vendors(),
            default_vendor: default_vendor(),
        }
    }
}

fn default_title() -> String {
    "Daraz TQM Dashboard / Vendor Payment Tracker".to_string()
}

fn default_currency() -> String {
    "PKR".to_string()
}

fn default_vendors() -> Vec<String> {
    vec!["Tick Bags".to_string(), "Sleek Space".to_string()]
}

fn default_vendor() -> String {
    "Other".to_string()
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: default_log_level() }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub marketplace: MarketplaceConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub dashboard: DashboardConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a YAML file
    pub fn load(path: &Path) -> ConfigResult<Self> {
        if !path.exists() {
            return Err(ConfigError::FileNotFound {
                path: path.display().to_string(),
            });
        }
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_yaml(&content)?;
        log::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Load from a file, falling back to defaults when it does not exist
    pub fn load_or_default(path: &Path) -> ConfigResult<Self> {
        match Self::load(path) {
            Err(ConfigError::FileNotFound { path }) => {
                log::warn!(
                    "Config file {} not found; defaults need marketplace credentials or marketplace.fixture_path \
                     (see --print-config)",
                    path
                );
                let config = Config::default();
                config.validate()?;
                Ok(config)
            }
            other => other,
        }
    }

    /// Parse and validate YAML text
    pub fn from_yaml(content: &str) -> ConfigResult<Self> {
        let config: Config = serde_yaml::from_str(content)
            .map_err(|e| ConfigError::InvalidYaml { message: e.to_string() })?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> ConfigResult<()> {
        if self.server.port == 0 {
            return Err(ConfigError::InvalidValue {
                field: "server.port".to_string(),
                reason: "Port must be greater than 0".to_string(),
            });
        }

        if self.marketplace.page_size == 0 || self.marketplace.page_size > 500 {
            return Err(ConfigError::InvalidValue {
                field: "marketplace.page_size".to_string(),
                reason: "Page size must be between 1 and 500".to_string(),
            });
        }

        if !self.marketplace.uses_fixture() {
            for (field, value) in [
                ("marketplace.app_key", &self.marketplace.app_key),
                ("marketplace.app_secret", &self.marketplace.app_secret),
                ("marketplace.access_token", &self.marketplace.access_token),
            ] {
                if value.trim().is_empty() {
                    return Err(ConfigError::MissingField { field: field.to_string() });
                }
            }
        }

        if self.dashboard.currency.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "dashboard.currency".to_string(),
                reason: "Currency label must not be empty".to_string(),
            });
        }

        if self.dashboard.vendors.iter().all(|v| v.trim().is_empty()) {
            return Err(ConfigError::InvalidValue {
                field: "dashboard.vendors".to_string(),
                reason: "At least one vendor is required".to_string(),
            });
        }

        Ok(())
    }

    /// Generate a default configuration file
    pub fn generate_default() -> &'static str {
        include_str!("../templates/default_config.yaml")
    }

    /// Vendors offered in forms: configured ones plus the fallback vendor
    pub fn vendor_choices(&self) -> Vec<String> {
        let mut vendors: Vec<String> = self
            .dashboard
            .vendors
            .iter()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .collect();
        if !vendors.contains(&self.dashboard.default_vendor) {
            vendors.push(self.dashboard.default_vendor.clone());
        }
        vendors
    }
}
