//! Transaction record and its state machine.
//!
//! ```text
//! pending ──escrow verified──▶ verified ──forward sent──▶ forwarding_pending ──forward verified──▶ completed
//!    │                            │                              │
//!    └──────escrow reverted───────┴──────forward rejected────────┴──────forward reverted──────▶ failed
//! ```
//!
//! Every mutation goes through a `mark_*` method, which refuses anything
//! that is not a forward edge of the graph above.

use alloy::primitives::TxHash;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::escrow::amount::Amount;
use crate::escrow::error::EngineError;
use crate::escrow::fee::FeeSplit;

/// Lifecycle status of an escrowed transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    /// Waiting for the escrow transfer to reach the confirmation threshold.
    Pending,
    /// Escrow confirmed; forward not yet broadcast.
    Verified,
    /// Forward broadcast; waiting for its confirmations.
    ForwardingPending,
    /// Both transfers confirmed.
    Completed,
    /// Escrow or forward failed; no further processing.
    Failed,
}

impl TransactionStatus {
    /// Terminal statuses are never reprocessed, only swept.
    pub fn is_terminal(&self) -> bool {
        matches!(self, TransactionStatus::Completed | TransactionStatus::Failed)
    }

    /// Whether `next` is a forward edge from `self`.
    pub fn can_transition_to(&self, next: TransactionStatus) -> bool {
        use TransactionStatus::*;
        matches!(
            (self, next),
            (Pending, Verified)
                | (Verified, ForwardingPending)
                | (ForwardingPending, Completed)
                | (Pending | Verified | ForwardingPending, Failed)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Pending => "pending",
            TransactionStatus::Verified => "verified",
            TransactionStatus::ForwardingPending => "forwarding_pending",
            TransactionStatus::Completed => "completed",
            TransactionStatus::Failed => "failed",
        }
    }
}

impl std::fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canonical, validated intake payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTransaction {
    pub sender_address: String,
    pub destination_address: String,
    pub amount: Amount,
    pub escrow_tx_hash: TxHash,
    pub escrow_wallet: Option<String>,
    pub chain_id: Option<u64>,
}

/// An escrowed transfer tracked from intake to deletion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: Uuid,
    pub sender_address: String,
    pub destination_address: String,
    pub amount: Amount,
    pub escrow_tx_hash: TxHash,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub escrow_wallet: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chain_id: Option<u64>,
    pub status: TransactionStatus,
    pub forward_tx_hash: Option<TxHash>,
    pub forwarded_amount: Option<Amount>,
    pub fee_kept: Option<Amount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub escrow_confirmations: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forward_confirmations: Option<u64>,
    pub received_at: DateTime<Utc>,
    pub verified_at: Option<DateTime<Utc>>,
    /// Set just before a forward broadcast is attempted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forward_claimed_at: Option<DateTime<Utc>>,
    pub forward_initiated_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub failed_at: Option<DateTime<Utc>>,
    pub error: Option<String>,
}

impl Transaction {
    /// Create a new pending record with a fresh id.
    pub fn new_pending(new: NewTransaction, received_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            sender_address: new.sender_address,
            destination_address: new.destination_address,
            amount: new.amount,
            escrow_tx_hash: new.escrow_tx_hash,
            escrow_wallet: new.escrow_wallet,
            chain_id: new.chain_id,
            status: TransactionStatus::Pending,
            forward_tx_hash: None,
            forwarded_amount: None,
            fee_kept: None,
            escrow_confirmations: None,
            forward_confirmations: None,
            received_at,
            verified_at: None,
            forward_claimed_at: None,
            forward_initiated_at: None,
            completed_at: None,
            failed_at: None,
            error: None,
        }
    }

    fn transition(&mut self, next: TransactionStatus) -> Result<(), EngineError> {
        if !self.status.can_transition_to(next) {
            return Err(EngineError::InvalidTransition {
                id: self.id,
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        Ok(())
    }

    /// Escrow reached the confirmation threshold.
    pub fn mark_verified(&mut self, confirmations: u64, at: DateTime<Utc>) -> Result<(), EngineError> {
        self.transition(TransactionStatus::Verified)?;
        self.escrow_confirmations = Some(confirmations);
        self.verified_at = Some(at);
        Ok(())
    }

    /// Record intent to forward before any broadcast happens.
    pub fn claim_forward(&mut self, at: DateTime<Utc>) -> Result<(), EngineError> {
        if self.status != TransactionStatus::Verified
            || self.forward_tx_hash.is_some()
            || self.forward_claimed_at.is_some()
        {
            return Err(EngineError::ForwardAlreadyClaimed(self.id));
        }
        self.forward_claimed_at = Some(at);
        Ok(())
    }

    /// Forward broadcast accepted by the network.
    pub fn mark_forwarding(
        &mut self,
        forward_tx_hash: TxHash,
        split: FeeSplit,
        at: DateTime<Utc>,
    ) -> Result<(), EngineError> {
        if self.forward_tx_hash.is_some() {
            return Err(EngineError::ForwardAlreadyClaimed(self.id));
        }
        self.transition(TransactionStatus::ForwardingPending)?;
        self.forward_tx_hash = Some(forward_tx_hash);
        self.forwarded_amount = Some(split.forwarded);
        self.fee_kept = Some(split.fee);
        self.forward_initiated_at = Some(at);
        Ok(())
    }

    /// Forward reached the confirmation threshold.
    pub fn mark_completed(&mut self, confirmations: u64, at: DateTime<Utc>) -> Result<(), EngineError> {
        if self.verified_at.is_none() || self.forward_tx_hash.is_none() {
            return Err(EngineError::InvalidTransition {
                id: self.id,
                from: self.status,
                to: TransactionStatus::Completed,
            });
        }
        self.transition(TransactionStatus::Completed)?;
        self.forward_confirmations = Some(confirmations);
        self.completed_at = Some(at);
        Ok(())
    }

    /// Terminal failure with a reason.
    pub fn mark_failed(&mut self, reason: impl Into<String>, at: DateTime<Utc>) -> Result<(), EngineError> {
        self.transition(TransactionStatus::Failed)?;
        self.error = Some(reason.into());
        self.failed_at = Some(at);
        Ok(())
    }

    /// When the record entered its terminal status, if it has.
    pub fn terminal_since(&self) -> Option<DateTime<Utc>> {
        match self.status {
            TransactionStatus::Completed => Some(self.completed_at.unwrap_or(self.received_at)),
            TransactionStatus::Failed => Some(self.failed_at.unwrap_or(self.received_at)),
            _ => None,
        }
    }

    /// Terminal and older than the retention window for its status.
    pub fn is_expired(&self, now: DateTime<Utc>, completed_retention: Duration, failed_retention: Duration) -> bool {
        let Some(since) = self.terminal_since() else {
            return false;
        };
        let window = match self.status {
            TransactionStatus::Completed => completed_retention,
            _ => failed_retention,
        };
        now - since > window
    }

    /// Case-insensitive sender match.
    pub fn is_sent_by(&self, address: &str) -> bool {
        self.sender_address.trim().eq_ignore_ascii_case(address.trim())
    }
}
