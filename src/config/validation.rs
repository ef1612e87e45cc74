//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (thresholds >= 1, intervals > 0, fee < 100%)
//! - Check that the selected store backend has what it needs
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: RelayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::fmt;

use crate::config::schema::{LifecycleConfig, RelayConfig, StoreBackend};
use crate::escrow::fee::FeeRate;

/// Upper bound for either retention window (ten years).
pub const MAX_RETENTION_SECS: u64 = 10 * 365 * 24 * 60 * 60;

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a full configuration.
pub fn validate_config(config: &RelayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.trim().is_empty() {
        errors.push(ValidationError::new("listener.bind_address", "must not be empty"));
    }

    if config.http.request_timeout_secs == 0 {
        errors.push(ValidationError::new("http.request_timeout_secs", "must be greater than 0"));
    }

    let chain = &config.blockchain;
    if chain.rpc_url.trim().is_empty() {
        errors.push(ValidationError::new("blockchain.rpc_url", "must not be empty"));
    } else if chain.rpc_url.parse::<url::Url>().is_err() {
        errors.push(ValidationError::new(
            "blockchain.rpc_url",
            format!("'{}' is not a valid URL", chain.rpc_url),
        ));
    }
    if chain.rpc_timeout_secs == 0 {
        errors.push(ValidationError::new("blockchain.rpc_timeout_secs", "must be greater than 0"));
    }
    if chain.gas_limit < 21_000 {
        errors.push(ValidationError::new(
            "blockchain.gas_limit",
            "must be at least 21000 for a value transfer",
        ));
    }
    if !(chain.gas_price_multiplier.is_finite() && chain.gas_price_multiplier >= 1.0) {
        errors.push(ValidationError::new(
            "blockchain.gas_price_multiplier",
            "must be a finite number >= 1.0",
        ));
    }

    if let Err(mut lifecycle_errors) = validate_lifecycle(&config.lifecycle) {
        errors.append(&mut lifecycle_errors);
    }

    if config.store.backend == StoreBackend::File && config.store.path.trim().is_empty() {
        errors.push(ValidationError::new("store.path", "required for the file backend"));
    }

    if config.observability.metrics_enabled
        && config
            .observability
            .metrics_address
            .parse::<std::net::SocketAddr>()
            .is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            "must be a socket address when metrics are enabled",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validate only the hot-reloadable lifecycle section.
pub fn validate_lifecycle(lifecycle: &LifecycleConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if lifecycle.confirmation_threshold == 0 {
        errors.push(ValidationError::new(
            "lifecycle.confirmation_threshold",
            "must be at least 1",
        ));
    }
    if let Err(e) = FeeRate::from_percentage(&lifecycle.fee_percentage) {
        errors.push(ValidationError::new("lifecycle.fee_percentage", e.to_string()));
    }
    if lifecycle.poll_interval_secs == 0 {
        errors.push(ValidationError::new("lifecycle.poll_interval_secs", "must be greater than 0"));
    }
    for (field, secs) in [
        ("lifecycle.completed_retention_secs", lifecycle.completed_retention_secs),
        ("lifecycle.failed_retention_secs", lifecycle.failed_retention_secs),
    ] {
        if secs == 0 || secs > MAX_RETENTION_SECS {
            errors.push(ValidationError::new(
                field,
                format!("must be between 1 and {}", MAX_RETENTION_SECS),
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&RelayConfig::default()).is_ok());
    }

    #[test]
    fn test_collects_every_error() {
        let mut config = RelayConfig::default();
        config.blockchain.rpc_url = String::new();
        config.lifecycle.confirmation_threshold = 0;
        config.lifecycle.fee_percentage = "100".to_string();
        config.lifecycle.poll_interval_secs = 0;

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(
            fields,
            vec![
                "blockchain.rpc_url",
                "lifecycle.confirmation_threshold",
                "lifecycle.fee_percentage",
                "lifecycle.poll_interval_secs",
            ]
        );
    }

    #[test]
    fn test_file_backend_requires_path() {
        let mut config = RelayConfig::default();
        config.store.path = "  ".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors[0].field, "store.path");
    }

    #[test]
    fn test_gas_limit_floor() {
        let mut config = RelayConfig::default();
        config.blockchain.gas_limit = 20_999;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors[0].field, "blockchain.gas_limit");
    }

    #[test]
    fn test_retention_windows_are_bounded() {
        let mut lifecycle = LifecycleConfig::default();
        lifecycle.completed_retention_secs = u64::MAX;
        lifecycle.failed_retention_secs = 10_000_000_000_000_000;

        let errors = validate_lifecycle(&lifecycle).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(
            fields,
            vec!["lifecycle.completed_retention_secs", "lifecycle.failed_retention_secs"]
        );

        lifecycle.completed_retention_secs = MAX_RETENTION_SECS;
        lifecycle.failed_retention_secs = 1;
        assert!(validate_lifecycle(&lifecycle).is_ok());
    }
}
