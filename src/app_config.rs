// Centralized configuration management for PhishShield
// Load ALL env vars ONCE at startup

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;
use thiserror::Error;

use crate::config::{
    PolicyConfig, DEFAULT_MAX_BATCH_ITEMS, DEFAULT_PHISHING_THRESHOLD,
    DEFAULT_TRUSTED_DOMAIN_CONFIDENCE,
};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

/// Log filter used when RUST_LOG is unset
pub const DEFAULT_LOG_FILTER: &str = "phishshield_core=debug,tower_http=info";

/// Global application configuration loaded once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(|| {
    dotenv::dotenv().ok();

    AppConfig::from_env().expect("Failed to load configuration")
});

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    // Server
    pub bind_address: String,
    pub port: u16,
    pub environment: Environment,
    pub rust_log: String,
    pub cors_allowed_origins: Vec<String>,

    // Model store
    pub model_dir: String,
    pub trusted_domains_path: String,

    // Engine
    pub batch_parallelism: usize,

    // Nested configs
    pub policy: PolicyConfig,
}

/// Environment type
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Environment {
    Development,
    Test,
    Staging,
    Production,
}

impl From<String> for Environment {
    fn from(s: String) -> Self {
        match s.to_lowercase().as_str() {
            "development" | "dev" => Environment::Development,
            "test" => Environment::Test,
            "staging" | "stage" => Environment::Staging,
            "production" | "prod" => Environment::Production,
            _ => Environment::Development,
        }
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Staging => write!(f, "staging"),
            Environment::Production => write!(f, "production"),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        // Helper function to get optional env var with default
        let get_or_default = |key: &str, default: &str| -> String {
            env::var(key).unwrap_or_else(|_| default.to_string())
        };

        let parse_usize_or_default = |key: &str, default: usize| -> Result<usize, ConfigError> {
            match env::var(key) {
                Ok(raw) => raw.trim().parse().map_err(|_| {
                    ConfigError::InvalidValue(key.to_string(), "not a valid usize".to_string())
                }),
                Err(_) => Ok(default),
            }
        };

        let parse_f64_or_default = |key: &str, default: f64| -> Result<f64, ConfigError> {
            match env::var(key) {
                Ok(raw) => raw.trim().parse().map_err(|_| {
                    ConfigError::InvalidValue(key.to_string(), "not a valid number".to_string())
                }),
                Err(_) => Ok(default),
            }
        };

        // Parse bind address to extract port
        let bind_address = get_or_default("BIND_ADDRESS", "0.0.0.0:5000");
        let port = bind_address
            .rsplit(':')
            .next()
            .and_then(|p| p.parse().ok())
            .unwrap_or(5000);

        let environment_str = get_or_default("ENVIRONMENT", "development");
        let environment = Environment::from(environment_str);

        let rust_log = get_or_default("RUST_LOG", DEFAULT_LOG_FILTER);
        let cors_allowed_origins: Vec<String> =
            get_or_default("CORS_ALLOWED_ORIGINS", "http://localhost:5173")
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();

        let model_dir = get_or_default("MODEL_DIR", "model");
        let trusted_domains_path =
            get_or_default("TRUSTED_DOMAINS_PATH", "data/trusted_domains.json");

        let batch_parallelism = parse_usize_or_default("BATCH_PARALLELISM", 1)?;
        if batch_parallelism == 0 {
            return Err(ConfigError::InvalidValue(
                "BATCH_PARALLELISM".to_string(),
                "must be at least 1".to_string(),
            ));
        }

        let policy = PolicyConfig {
            phishing_threshold: parse_f64_or_default(
                "PHISHING_THRESHOLD",
                DEFAULT_PHISHING_THRESHOLD,
            )?,
            trusted_domain_confidence: parse_f64_or_default(
                "TRUSTED_DOMAIN_CONFIDENCE",
                DEFAULT_TRUSTED_DOMAIN_CONFIDENCE,
            )?,
            max_batch_items: parse_usize_or_default("MAX_BATCH_ITEMS", DEFAULT_MAX_BATCH_ITEMS)?,
        };
        policy.validate()?;

        Ok(Self {
            bind_address,
            port,
            environment,
            rust_log,
            cors_allowed_origins,
            model_dir,
            trusted_domains_path,
            batch_parallelism,
            policy,
        })
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == Environment::Production
    }
}

/// Get the global configuration instance
pub fn config() -> &'static AppConfig {
    &CONFIG
}
