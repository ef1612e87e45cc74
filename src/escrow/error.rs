//! Error types for the escrow lifecycle.

use thiserror::Error;
use uuid::Uuid;

use crate::blockchain::types::GatewayError;
use crate::escrow::fee::FeeRateError;
use crate::escrow::types::TransactionStatus;
use crate::store::StoreError;

/// Intake payload rejected; no record is created.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Invalid {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },

    #[error("Amount must be greater than zero")]
    NonPositiveAmount,
}

/// Forward could not be broadcast. Always terminal for the record.
#[derive(Debug, Error)]
pub enum ForwardError {
    /// No signing credential; nothing was sent.
    #[error("Escrow wallet not configured")]
    NotConfigured,

    #[error("Fee computation failed: {0}")]
    Fee(#[from] FeeRateError),

    #[error("Forward broadcast failed: {0}")]
    Broadcast(#[from] GatewayError),
}

/// Failures while driving a single record.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Transaction not found: {0}")]
    NotFound(Uuid),

    #[error("Transaction {id}: illegal transition {from} -> {to}")]
    InvalidTransition {
        id: Uuid,
        from: TransactionStatus,
        to: TransactionStatus,
    },

    #[error("Transaction {0}: forward already claimed")]
    ForwardAlreadyClaimed(Uuid),

    #[error("Invalid lifecycle settings: {0}")]
    Settings(#[from] FeeRateError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type EngineResult<T> = Result<T, EngineError>;

/// Intake failed; nothing was persisted.
#[derive(Debug, Error)]
pub enum SubmitError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Store(#[from] StoreError),
}
