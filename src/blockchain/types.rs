//! Chain-specific types and error definitions.

use thiserror::Error;

// Re-export BlockchainConfig from config module to avoid duplication
pub use crate::config::schema::BlockchainConfig;

/// Chain ID type for strong typing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChainId(pub u64);

impl From<u64> for ChainId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl From<ChainId> for u64 {
    fn from(id: ChainId) -> Self {
        id.0
    }
}

/// Errors that can occur during gateway operations.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// RPC connection or request failed.
    #[error("RPC error: {0}")]
    Rpc(String),

    /// RPC request timed out.
    #[error("RPC timeout after {0} seconds")]
    Timeout(u64),

    /// Invalid private key format or signing failure.
    #[error("Wallet error: {0}")]
    Wallet(String),

    /// No signing credential is configured.
    #[error("Signing credential not configured")]
    SignerNotConfigured,

    /// The operator account cannot cover value plus gas.
    #[error("Insufficient funds: {0}")]
    InsufficientFunds(String),

    /// The node answered with a JSON-RPC error (bad nonce, underpriced,
    /// intrinsic gas too low, ...).
    #[error("Rejected by node: {0}")]
    Rejected(String),

    /// Destination is not a valid chain address.
    #[error("Invalid address '{0}'")]
    InvalidAddress(String),

    /// Gas price exceeded maximum allowed.
    #[error("Gas price {current_gwei} gwei exceeds maximum {max_gwei} gwei")]
    GasPriceTooHigh { current_gwei: u64, max_gwei: u64 },

    /// Chain configuration mismatch.
    #[error("Chain ID mismatch: expected {expected}, got {actual}")]
    ChainMismatch { expected: u64, actual: u64 },
}

impl GatewayError {
    /// Map a node-side rejection message to a typed error.
    pub fn from_rpc_message(message: impl Into<String>) -> Self {
        let message = message.into();
        if message.to_ascii_lowercase().contains("insufficient funds") {
            Self::InsufficientFunds(message)
        } else {
            Self::Rejected(message)
        }
    }

    /// Whether the failure came from the transport rather than the chain
    /// or the request itself.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Rpc(_) | Self::Timeout(_))
    }
}

/// Result type for gateway operations.
pub type GatewayResult<T> = Result<T, GatewayError>;

/// The parts of a mined transaction's receipt the relay cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReceiptInfo {
    /// Block the transaction was included in.
    pub block_number: u64,
    /// On-chain execution succeeded (status == 1).
    pub success: bool,
}
