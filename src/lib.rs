//! Escrow relay library.
//!
//! Watches escrow deposits on an EVM chain, forwards each one (minus a
//! service fee) to its destination once it is deep enough, and tracks the
//! forward until it is deep enough too.

pub mod blockchain;
pub mod config;
pub mod escrow;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod store;

pub use config::schema::RelayConfig;
pub use escrow::{EscrowService, LifecycleEngine};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
