//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the relay.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the escrow relay.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RelayConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// HTTP API settings (timeouts, CORS).
    pub http: HttpConfig,

    /// Blockchain RPC and signing settings.
    pub blockchain: BlockchainConfig,

    /// Transaction lifecycle policy (thresholds, fee, retention).
    pub lifecycle: LifecycleConfig,

    /// Transaction store backend.
    pub store: StoreConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:10000").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:10000".to_string(),
        }
    }
}

/// HTTP API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Request timeout (total time for request/response) in seconds.
    ///
    /// The manual trigger performs RPC calls synchronously, so this must
    /// comfortably exceed a few RPC round trips.
    pub request_timeout_secs: u64,

    /// Browser origin allowed by CORS (the wallet frontend).
    pub frontend_url: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: 60,
            frontend_url: "http://localhost:3000".to_string(),
        }
    }
}

/// Blockchain integration configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BlockchainConfig {
    /// JSON-RPC endpoint URL.
    pub rpc_url: String,

    /// Failover JSON-RPC endpoint URLs.
    pub failover_urls: Vec<String>,

    /// Chain ID (e.g., 1 for Ethereum mainnet, 11155111 for Sepolia).
    pub chain_id: u64,

    /// RPC request timeout in seconds.
    pub rpc_timeout_secs: u64,

    /// Gas limit for the forwarding value transfer.
    pub gas_limit: u64,

    /// Gas price multiplier (1.0 = estimated, 1.2 = 20% buffer).
    pub gas_price_multiplier: f64,

    /// Maximum gas price in gwei (protection against spikes).
    pub max_gas_price_gwei: u64,
}

impl Default for BlockchainConfig {
    fn default() -> Self {
        Self {
            rpc_url: "http://localhost:8545".to_string(),
            failover_urls: Vec::new(),
            chain_id: 11_155_111,
            rpc_timeout_secs: 10,
            gas_limit: 21_000,
            gas_price_multiplier: 1.0,
            max_gas_price_gwei: 500,
        }
    }
}

/// Lifecycle policy for escrowed transactions.
///
/// This section is hot-reloadable; the running engine picks up a new copy
/// at the start of its next pass.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct LifecycleConfig {
    /// Confirmations required before a hash counts as verified.
    pub confirmation_threshold: u64,

    /// Service fee as a decimal percentage string ("1", "0.25").
    pub fee_percentage: String,

    /// Interval between lifecycle passes in seconds.
    pub poll_interval_secs: u64,

    /// How long a completed record is kept before deletion, in seconds.
    pub completed_retention_secs: u64,

    /// How long a failed record is kept before deletion, in seconds.
    pub failed_retention_secs: u64,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            confirmation_threshold: 3,
            fee_percentage: "1".to_string(),
            poll_interval_secs: 30,
            completed_retention_secs: 60,
            failed_retention_secs: 300,
        }
    }
}

/// Which store implementation backs the relay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreBackend {
    /// Process-local map; everything is lost on restart.
    Memory,
    /// JSON flat file rewritten on every mutation.
    File,
}

/// Transaction store configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StoreConfig {
    pub backend: StoreBackend,

    /// Path of the JSON file for the file backend.
    pub path: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::File,
            path: "data/transactions.json".to_string(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
