use crate::domain::{Address, IdentifierConfig};
use std::collections::HashMap;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rpc_url: String,
    pub registry_address: Address,
    pub explorer_url: String,
    pub identifier_config_file: Option<String>,
    pub resolve_timeout_ms: u64,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnv(String),
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_map(std::env::vars().collect())
    }

    pub fn from_env_map(env_map: HashMap<String, String>) -> Result<Self, ConfigError> {
        let port = env_map
            .get("PORT")
            .map(|s| s.as_str())
            .unwrap_or("8080")
            .parse::<u16>()
            .map_err(|_| {
                ConfigError::InvalidValue("PORT".to_string(), "must be a valid u16".to_string())
            })?;

        let rpc_url = env_map
            .get("RPC_URL")
            .cloned()
            .ok_or_else(|| ConfigError::MissingEnv("RPC_URL".to_string()))?;

        let registry_address = env_map
            .get("REGISTRY_ADDRESS")
            .ok_or_else(|| ConfigError::MissingEnv("REGISTRY_ADDRESS".to_string()))
            .and_then(|s| {
                Address::from_str(s).map_err(|e| {
                    ConfigError::InvalidValue("REGISTRY_ADDRESS".to_string(), e.to_string())
                })
            })?;

        let explorer_url = env_map
            .get("EXPLORER_URL")
            .cloned()
            .unwrap_or_else(|| "https://etherscan.io".to_string());

        let identifier_config_file = env_map
            .get("IDENTIFIER_CONFIG_FILE")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        let resolve_timeout_ms = env_map
            .get("RESOLVE_TIMEOUT_MS")
            .map(|s| s.as_str())
            .unwrap_or("30000")
            .parse::<u64>()
            .map_err(|_| {
                ConfigError::InvalidValue(
                    "RESOLVE_TIMEOUT_MS".to_string(),
                    "must be a valid u64".to_string(),
                )
            })?;

        Ok(Config {
            port,
            rpc_url,
            registry_address,
            explorer_url,
            identifier_config_file,
            resolve_timeout_ms,
        })
    }

    /// Load the identifier configuration, if a file is configured.
    pub fn load_identifiers(&self) -> Result<Option<IdentifierConfig>, ConfigError> {
        let Some(path) = &self.identifier_config_file else {
            return Ok(None);
        };
        IdentifierConfig::from_file(path).map(Some).map_err(|e| {
            ConfigError::InvalidValue("IDENTIFIER_CONFIG_FILE".to_string(), e.to_string())
        })
    }
}
