//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML) + RELAY_* environment variables
//!     → loader.rs (parse, deserialize, apply env overrides)
//!     → validation.rs (semantic checks)
//!     → RelayConfig (validated, immutable)
//!     → sections handed to subsystems at startup
//!
//! On file change:
//!     watcher.rs detects change
//!     → loader.rs loads new config
//!     → validation.rs validates
//!     → atomic swap of Arc<LifecycleConfig>
//!     → lifecycle engine observes new policy on its next pass
//! ```
//!
//! # Design Decisions
//! - Only the lifecycle policy is hot-reloadable; RPC, store and listener
//!   settings require a restart
//! - All fields have defaults to allow minimal configs
//! - The signing key never lives in the config file

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, load_from_env, ConfigError};
pub use schema::{
    BlockchainConfig, HttpConfig, LifecycleConfig, ListenerConfig, LogFormat,
    ObservabilityConfig, RelayConfig, StoreBackend, StoreConfig,
};
