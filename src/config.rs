//! Configuration management for `TourPlan`
//!
//! Handles loading configuration from files, environment variables,
//! and provides validation for all configuration settings.

use crate::TourPlanError;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure for the `TourPlan` application
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TourPlanConfig {
    /// Input data files
    pub data: DataConfig,
    /// Text generator settings
    pub generator: GeneratorConfig,
    /// Description cache configuration
    pub cache: CacheConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
    /// Default application settings
    pub defaults: DefaultsConfig,
    /// HTTP server settings
    pub server: ServerConfig,
}

/// Locations of the attraction graph, records and region table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_graph_path")]
    pub graph_path: String,
    #[serde(default = "default_records_path")]
    pub records_path: String,
    /// Region table; the built-in Xuzhou table is used when absent
    #[serde(default)]
    pub regions_path: Option<String>,
}

/// Text generator settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// When false every narrative and description uses its fallback text
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_generator_base_url")]
    pub base_url: String,
    #[serde(default = "default_generator_model")]
    pub model: String,
    /// Request timeout in seconds
    #[serde(default = "default_generator_timeout")]
    pub timeout_seconds: u64,
    #[serde(default = "default_narrative_temperature")]
    pub narrative_temperature: f32,
    #[serde(default = "default_description_temperature")]
    pub description_temperature: f32,
}

/// Cache configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Cache TTL in hours
    #[serde(default = "default_cache_ttl")]
    pub ttl_hours: u32,
    /// Cache directory location
    #[serde(default = "default_cache_location")]
    pub location: String,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (pretty or json)
    #[serde(default = "default_log_format")]
    pub format: String,
}

/// Default application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Number of recommendations returned when a query sets no limit; 0 returns all
    #[serde(default = "default_top_n")]
    pub top_n: usize,
}

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_server_host")]
    pub host: String,
    #[serde(default = "default_server_port")]
    pub port: u16,
    /// Largest accepted request body in bytes
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

// Default value functions
fn default_true() -> bool {
    true
}

fn default_graph_path() -> String {
    "data/knowledge_graph.json".to_string()
}

fn default_records_path() -> String {
    "data/attractions.json".to_string()
}

fn default_generator_base_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_generator_model() -> String {
    "llama3.2".to_string()
}

fn default_generator_timeout() -> u64 {
    60
}

fn default_narrative_temperature() -> f32 {
    0.7
}

fn default_description_temperature() -> f32 {
    0.3
}

fn default_cache_ttl() -> u32 {
    720
}

fn default_cache_location() -> String {
    "~/.cache/tourplan".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_top_n() -> usize {
    10
}

fn default_server_host() -> String {
    "127.0.0.1".to_string()
}

fn default_server_port() -> u16 {
    3000
}

fn default_max_body_bytes() -> usize {
    64 * 1024
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            graph_path: default_graph_path(),
            records_path: default_records_path(),
            regions_path: None,
        }
    }
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: default_generator_base_url(),
            model: default_generator_model(),
            timeout_seconds: default_generator_timeout(),
            narrative_temperature: default_narrative_temperature(),
            description_temperature: default_description_temperature(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_hours: default_cache_ttl(),
            location: default_cache_location(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            top_n: default_top_n(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_server_host(),
            port: default_server_port(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

impl TourPlanConfig {
    /// Load configuration from file and environment variables
    pub fn load() -> Result<Self> {
        Self::load_from_path(None)
    }

    /// Load configuration from specified path
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

        let config_file = config_path.unwrap_or_else(|| {
            Self::get_config_path().unwrap_or_else(|| PathBuf::from("config.toml"))
        });

        if config_file.exists() {
            builder = builder.add_source(
                File::from(config_file.clone())
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // TOURPLAN_GENERATOR__BASE_URL overrides generator.base_url
        builder = builder.add_source(
            Environment::with_prefix("TOURPLAN")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let mut config: TourPlanConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        config.apply_defaults();
        config.validate()?;

        Ok(config)
    }

    /// Get the default configuration file path
    #[must_use]
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("tourplan").join("config.toml"))
    }

    /// Cache directory with a leading `~` expanded to the home directory
    #[must_use]
    pub fn cache_dir(&self) -> PathBuf {
        match self.cache.location.strip_prefix("~/") {
            Some(rest) => dirs::home_dir()
                .map(|home| home.join(rest))
                .unwrap_or_else(|| PathBuf::from(rest)),
            None => PathBuf::from(&self.cache.location),
        }
    }

    /// Apply default values to missing configuration fields
    pub fn apply_defaults(&mut self) {
        if self.data.graph_path.is_empty() {
            self.data.graph_path = default_graph_path();
        }
        if self.data.records_path.is_empty() {
            self.data.records_path = default_records_path();
        }
        if self
            .data
            .regions_path
            .as_deref()
            .is_some_and(|path| path.trim().is_empty())
        {
            self.data.regions_path = None;
        }
        if self.generator.base_url.is_empty() {
            self.generator.base_url = default_generator_base_url();
        }
        if self.generator.model.is_empty() {
            self.generator.model = default_generator_model();
        }
        if self.generator.timeout_seconds == 0 {
            self.generator.timeout_seconds = default_generator_timeout();
        }
        if self.cache.ttl_hours == 0 {
            self.cache.ttl_hours = default_cache_ttl();
        }
        if self.cache.location.is_empty() {
            self.cache.location = default_cache_location();
        }
        if self.logging.level.is_empty() {
            self.logging.level = default_log_level();
        }
        if self.logging.format.is_empty() {
            self.logging.format = default_log_format();
        }
        if self.server.host.is_empty() {
            self.server.host = default_server_host();
        }
        if self.server.max_body_bytes == 0 {
            self.server.max_body_bytes = default_max_body_bytes();
        }
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_numeric_ranges()?;
        self.validate_string_values()?;
        Ok(())
    }

    /// Validate numeric configuration ranges
    fn validate_numeric_ranges(&self) -> Result<()> {
        if self.generator.timeout_seconds > 600 {
            return Err(TourPlanError::config("Generator timeout cannot exceed 600 seconds").into());
        }

        for (name, value) in [
            ("narrative", self.generator.narrative_temperature),
            ("description", self.generator.description_temperature),
        ] {
            if !(0.0..=2.0).contains(&value) {
                return Err(TourPlanError::config(format!(
                    "Generator {name} temperature must be between 0.0 and 2.0"
                ))
                .into());
            }
        }

        if self.cache.ttl_hours > 8760 {
            return Err(TourPlanError::config("Cache TTL cannot exceed 8760 hours (1 year)").into());
        }

        if self.defaults.top_n > 200 {
            return Err(TourPlanError::config("Default top_n cannot exceed 200").into());
        }

        if self.server.port == 0 {
            return Err(TourPlanError::config("Server port cannot be 0").into());
        }

        Ok(())
    }

    /// Validate string configuration values
    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(TourPlanError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            ))
            .into());
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(TourPlanError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            ))
            .into());
        }

        if !self.generator.base_url.starts_with("http://")
            && !self.generator.base_url.starts_with("https://")
        {
            return Err(TourPlanError::config(
                "Generator base URL must be a valid HTTP or HTTPS URL",
            )
            .into());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = TourPlanConfig::default();
        assert_eq!(config.generator.base_url, "http://localhost:11434");
        assert_eq!(config.generator.timeout_seconds, 60);
        assert!((config.generator.narrative_temperature - 0.7).abs() < 1e-6);
        assert!((config.generator.description_temperature - 0.3).abs() < 1e-6);
        assert_eq!(config.cache.ttl_hours, 720);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.defaults.top_n, 10);
        assert!(config.data.regions_path.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation_invalid_log_level() {
        let mut config = TourPlanConfig::default();
        config.logging.level = "invalid".to_string();
        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Invalid log level"));
    }

    #[test]
    fn test_config_validation_numeric_ranges() {
        let mut config = TourPlanConfig::default();
        config.generator.timeout_seconds = 900;
        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("timeout cannot exceed"));
    }

    #[test]
    fn test_config_validation_temperature() {
        let mut config = TourPlanConfig::default();
        config.generator.narrative_temperature = 3.5;
        let result = config.validate();
        assert!(result.unwrap_err().to_string().contains("temperature"));
    }

    #[test]
    fn test_config_validation_base_url() {
        let mut config = TourPlanConfig::default();
        config.generator.base_url = "localhost:11434".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_apply_defaults_fills_blanks() {
        let mut config = TourPlanConfig::default();
        config.generator.model = String::new();
        config.defaults.top_n = 0;
        config.data.regions_path = Some("  ".to_string());
        config.apply_defaults();
        assert_eq!(config.generator.model, "llama3.2");
        assert_eq!(config.defaults.top_n, 0);
        assert!(config.data.regions_path.is_none());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::with_suffix(".toml").unwrap();
        writeln!(
            file,
            "[generator]\nmodel = \"qwen2.5\"\n\n[server]\nport = 8088\n\n[data]\ngraph_path = \"kg.json\""
        )
        .unwrap();

        let config = TourPlanConfig::load_from_path(Some(file.path().to_path_buf())).unwrap();
        assert_eq!(config.generator.model, "qwen2.5");
        assert_eq!(config.server.port, 8088);
        assert_eq!(config.data.graph_path, "kg.json");
        assert_eq!(config.data.records_path, "data/attractions.json");
        assert_eq!(config.logging.format, "pretty");
    }

    #[test]
    fn test_cache_dir_expands_home() {
        let mut config = TourPlanConfig::default();
        config.cache.location = "/tmp/tourplan-cache".to_string();
        assert_eq!(config.cache_dir(), PathBuf::from("/tmp/tourplan-cache"));

        config.cache.location = "~/.cache/tourplan".to_string();
        assert!(config.cache_dir().ends_with(".cache/tourplan"));
    }

    #[test]
    fn test_config_path_generation() {
        let path = TourPlanConfig::get_config_path();
        assert!(path.is_some());
        let path = path.unwrap();
        assert!(path.to_string_lossy().contains("tourplan"));
        assert!(path.to_string_lossy().contains("config.toml"));
    }
}
