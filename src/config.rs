//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and environment variable overrides.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub usda: UsdaConfig,

    #[serde(default)]
    pub analysis: AnalysisConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Which `LogStore` implementation to open
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Sqlite,
    Memory,
}

impl std::str::FromStr for StorageBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sqlite" => Ok(Self::Sqlite),
            "memory" => Ok(Self::Memory),
            other => Err(ConfigError::Invalid(format!("unknown storage backend '{}'", other))),
        }
    }
}

/// Storage configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,

    #[serde(default = "default_database_path")]
    pub database_path: String,
}

fn default_database_path() -> String {
    dirs::data_local_dir()
        .map(|p| p.join("foodlog").join("food_log.db").to_string_lossy().to_string())
        .unwrap_or_else(|| "./food_log.db".to_string())
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            database_path: default_database_path(),
        }
    }
}

/// API server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3001
}

fn default_request_timeout() -> u64 {
    30
}

impl ApiConfig {
    /// `host:port` for binding
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

/// USDA FoodData Central configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UsdaConfig {
    #[serde(default = "default_usda_base_url")]
    pub base_url: String,

    #[serde(default = "default_usda_api_key")]
    pub api_key: String,

    #[serde(default = "default_page_size")]
    pub page_size: u32,

    #[serde(default = "default_usda_timeout")]
    pub request_timeout_ms: u64,
}

fn default_usda_base_url() -> String {
    "https://api.nal.usda.gov/fdc/v1".to_string()
}

fn default_usda_api_key() -> String {
    "DEMO_KEY".to_string()
}

fn default_page_size() -> u32 {
    20
}

fn default_usda_timeout() -> u64 {
    10_000
}

impl Default for UsdaConfig {
    fn default() -> Self {
        Self {
            base_url: default_usda_base_url(),
            api_key: default_usda_api_key(),
            page_size: default_page_size(),
            request_timeout_ms: default_usda_timeout(),
        }
    }
}

/// Correlation analysis configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default = "default_read_timeout")]
    pub read_timeout_ms: u64,
}

fn default_read_timeout() -> u64 {
    10_000
}

impl AnalysisConfig {
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            read_timeout_ms: default_read_timeout(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Self::parse(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            error: e.to_string(),
        })
    }

    /// Parse configuration from TOML text
    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        let mut config: Self = toml::from_str(content)?;
        config.storage.database_path = expand_home(&config.storage.database_path);
        Ok(config)
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from default locations or environment
    pub fn load_default() -> Self {
        let config_paths = [
            dirs::config_dir().map(|p| p.join("foodlog").join("config.toml")),
            Some(PathBuf::from("/etc/foodlog/config.toml")),
            Some(PathBuf::from("./config.toml")),
        ];

        for path_opt in config_paths.iter().flatten() {
            if path_opt.exists() {
                match Self::load_with_env(path_opt) {
                    Ok(config) => {
                        tracing::info!("Loaded config from {:?}", path_opt);
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load config from {:?}: {}", path_opt, e);
                    }
                }
            }
        }

        tracing::info!("Using default config with environment overrides");
        Self::from_env()
    }

    /// Apply environment variable overrides to an existing config
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary key lookup
    fn apply_overrides<F>(&mut self, var: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        // Storage overrides
        if let Some(path) = var("FOODLOG_DATABASE_PATH") {
            self.storage.database_path = expand_home(&path);
        }
        if let Some(backend) = var("FOODLOG_STORAGE_BACKEND") {
            match backend.parse() {
                Ok(b) => self.storage.backend = b,
                Err(e) => tracing::warn!("Ignoring FOODLOG_STORAGE_BACKEND: {}", e),
            }
        }

        // API overrides
        if let Some(host) = var("FOODLOG_API_HOST") {
            self.api.host = host;
        }
        if let Some(port) = var("FOODLOG_API_PORT") {
            if let Ok(p) = port.parse() {
                self.api.port = p;
            }
        }

        // USDA overrides
        if let Some(key) = var("USDA_API_KEY").filter(|k| !k.trim().is_empty()) {
            self.usda.api_key = key;
        }
        if let Some(url) = var("FOODLOG_USDA_BASE_URL") {
            self.usda.base_url = url;
        }

        // Logging overrides
        if let Some(level) = var("FOODLOG_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = var("FOODLOG_LOG_FORMAT") {
            self.logging.format = format;
        }
    }
}

/// Resolve a leading `~` against the user's home directory
fn expand_home(path: &str) -> String {
    let rest = match path.strip_prefix('~') {
        Some(rest) if rest.is_empty() || rest.starts_with('/') || rest.starts_with('\\') => rest,
        _ => return path.to_string(),
    };

    match dirs::home_dir() {
        Some(home) => format!("{}{}", home.to_string_lossy(), rest),
        None => {
            tracing::warn!("No home directory to expand {:?}", path);
            path.to_string()
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    let database_path = toml::Value::String(default_database_path());

    format!(
        r#"# Food Log Configuration
#
# Environment variables override these settings:
# - FOODLOG_DATABASE_PATH
# - FOODLOG_STORAGE_BACKEND
# - FOODLOG_API_HOST
# - FOODLOG_API_PORT
# - USDA_API_KEY
# - FOODLOG_USDA_BASE_URL
# - FOODLOG_LOG_LEVEL
# - FOODLOG_LOG_FORMAT

[storage]
# Storage backend: sqlite or memory
backend = "sqlite"

# SQLite database file
database_path = {database_path}

[api]
# API server host
host = "0.0.0.0"

# API server port
port = 3001

# Request timeout in seconds
request_timeout_secs = 30

[usda]
# FoodData Central endpoint
base_url = "https://api.nal.usda.gov/fdc/v1"

# API key (get one from fdc.nal.usda.gov); DEMO_KEY is heavily rate limited
api_key = "DEMO_KEY"

# Results per search
page_size = 20

# Per-request timeout (ms)
request_timeout_ms = 10000

[analysis]
# Time allowed for the two aggregate reads of a correlation request (ms)
read_timeout_ms = 10000

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log format: pretty (for development) or json (for production)
format = "pretty"
"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.storage.backend, StorageBackend::Sqlite);
        assert!(config.storage.database_path.ends_with("food_log.db"));
        assert_eq!(config.api.port, 3001);
        assert_eq!(config.api.addr(), "0.0.0.0:3001");
        assert_eq!(config.usda.api_key, "DEMO_KEY");
        assert_eq!(config.usda.page_size, 20);
        assert_eq!(config.analysis.read_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn test_generated_config_parses() {
        let config = Config::parse(&generate_default_config()).unwrap();
        assert_eq!(config.api.port, 3001);
        assert_eq!(config.usda.base_url, "https://api.nal.usda.gov/fdc/v1");
        assert_eq!(config.logging.format, "pretty");
        assert_eq!(config.storage.database_path, default_database_path());
        assert!(!config.storage.database_path.starts_with('~'));
    }

    #[test]
    fn test_home_relative_database_path() {
        let Some(home) = dirs::home_dir() else {
            return;
        };

        let config = Config::parse("[storage]\ndatabase_path = \"~/foodlog/food_log.db\"").unwrap();
        assert_eq!(
            PathBuf::from(&config.storage.database_path),
            home.join("foodlog/food_log.db")
        );

        let mut config = Config::default();
        config.apply_overrides(|k| (k == "FOODLOG_DATABASE_PATH").then(|| "~/x.db".to_string()));
        assert_eq!(PathBuf::from(&config.storage.database_path), home.join("x.db"));

        assert_eq!(expand_home("~user/x.db"), "~user/x.db");
        assert_eq!(expand_home("./~/x.db"), "./~/x.db");
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[storage]\nbackend = \"memory\"\n\n[api]\nport = 9000").unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.storage.backend, StorageBackend::Memory);
        assert_eq!(config.api.port, 9000);
        assert_eq!(config.api.host, "0.0.0.0");
        assert_eq!(config.usda.page_size, 20);
    }

    #[test]
    fn test_load_reports_parse_errors() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[storage]\nbackend = \"postgres\"").unwrap();

        let err = Config::load(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_load_missing_file() {
        let err = Config::load(Path::new("/nonexistent/foodlog.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_overrides() {
        let vars: HashMap<&str, &str> = [
            ("FOODLOG_DATABASE_PATH", "/tmp/x.db"),
            ("FOODLOG_STORAGE_BACKEND", "Memory"),
            ("FOODLOG_API_PORT", "8080"),
            ("USDA_API_KEY", "secret"),
            ("FOODLOG_LOG_FORMAT", "json"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.apply_overrides(|k| vars.get(k).map(|v| v.to_string()));

        assert_eq!(config.storage.database_path, "/tmp/x.db");
        assert_eq!(config.storage.backend, StorageBackend::Memory);
        assert_eq!(config.api.port, 8080);
        assert_eq!(config.usda.api_key, "secret");
        assert_eq!(config.logging.format, "json");
    }

    #[test]
    fn test_bad_overrides_are_ignored() {
        let mut config = Config::default();
        config.apply_overrides(|k| match k {
            "FOODLOG_API_PORT" => Some("not-a-port".to_string()),
            "FOODLOG_STORAGE_BACKEND" => Some("postgres".to_string()),
            "USDA_API_KEY" => Some("  ".to_string()),
            _ => None,
        });

        assert_eq!(config.api.port, 3001);
        assert_eq!(config.storage.backend, StorageBackend::Sqlite);
        assert_eq!(config.usda.api_key, "DEMO_KEY");
    }
}
