//! Blockchain gateway subsystem.
//!
//! # Data Flow
//! ```text
//! Environment Variables (escrow private key) + [blockchain] config
//!     → wallet.rs (key loading, signing, nonce reservation)
//!     → client.rs (RPC connection with timeouts and failover)
//!     → transaction.rs (build, sign, broadcast value transfers)
//!     → gateway.rs (the `Gateway` trait the lifecycle core consumes)
//! ```
//!
//! # Security Constraints
//! - Private keys ONLY from environment variables
//! - Never log private keys or sensitive data
//! - All RPC calls have configurable timeouts
//! - Graceful degradation when blockchain unreachable

pub mod client;
pub mod gateway;
#[cfg(any(test, feature = "test-util"))]
pub mod mock;
pub mod transaction;
pub mod types;
pub mod wallet;

pub use client::BlockchainClient;
pub use gateway::{Gateway, RpcGateway};
#[cfg(any(test, feature = "test-util"))]
pub use mock::MockGateway;
pub use types::{BlockchainConfig, ChainId, GatewayError, GatewayResult, ReceiptInfo};
pub use wallet::Wallet;
