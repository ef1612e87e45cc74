//! Configuration loading from disk and environment.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::RelayConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Environment variables that override file settings.
pub const ENV_RPC_URL: &str = "RELAY_RPC_URL";
pub const ENV_CONFIRMATIONS: &str = "RELAY_CONFIRMATIONS";
pub const ENV_FEE_PERCENTAGE: &str = "RELAY_FEE_PERCENTAGE";
pub const ENV_POLL_INTERVAL: &str = "RELAY_POLL_INTERVAL";
pub const ENV_BIND_ADDRESS: &str = "RELAY_BIND_ADDRESS";
pub const ENV_FRONTEND_URL: &str = "RELAY_FRONTEND_URL";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for {var}: '{value}'")]
    Env { var: &'static str, value: String },

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file, then apply
/// environment overrides.
pub fn load_config(path: &Path) -> Result<RelayConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: RelayConfig = toml::from_str(&content)?;
    finalize(config)
}

/// Build configuration from defaults plus environment overrides only.
pub fn load_from_env() -> Result<RelayConfig, ConfigError> {
    finalize(RelayConfig::default())
}

fn finalize(mut config: RelayConfig) -> Result<RelayConfig, ConfigError> {
    apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Apply `RELAY_*` overrides using the given lookup.
pub fn apply_env_overrides<F>(config: &mut RelayConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(url) = lookup(ENV_RPC_URL) {
        config.blockchain.rpc_url = url;
    }
    if let Some(value) = lookup(ENV_CONFIRMATIONS) {
        config.lifecycle.confirmation_threshold =
            value.trim().parse().map_err(|_| ConfigError::Env {
                var: ENV_CONFIRMATIONS,
                value: value.clone(),
            })?;
    }
    if let Some(value) = lookup(ENV_FEE_PERCENTAGE) {
        config.lifecycle.fee_percentage = value.trim().to_string();
    }
    if let Some(value) = lookup(ENV_POLL_INTERVAL) {
        config.lifecycle.poll_interval_secs =
            value.trim().parse().map_err(|_| ConfigError::Env {
                var: ENV_POLL_INTERVAL,
                value: value.clone(),
            })?;
    }
    if let Some(addr) = lookup(ENV_BIND_ADDRESS) {
        config.listener.bind_address = addr;
    }
    if let Some(origin) = lookup(ENV_FRONTEND_URL) {
        config.http.frontend_url = origin;
    }
    Ok(())
}
