//! Confirmation classification.
//!
//! Pure with respect to records: it reads the chain and reports, it never
//! mutates a transaction.

use std::sync::Arc;

use alloy::primitives::TxHash;
use serde::Serialize;

use crate::blockchain::gateway::Gateway;

/// On-chain status of a single hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Classification {
    /// Not mined yet (or dropped by a reorg).
    Pending,
    /// Mined successfully, below the threshold.
    Confirming { confirmations: u64 },
    /// Mined successfully, at or above the threshold.
    Verified { confirmations: u64 },
    /// Mined, but execution reverted.
    Failed,
    /// Transport or RPC failure; says nothing about the transaction.
    Error { detail: String },
}

impl Classification {
    pub fn is_verified(&self) -> bool {
        matches!(self, Classification::Verified { .. })
    }

    /// Transient outcomes must never be written to a record.
    pub fn is_transient(&self) -> bool {
        matches!(self, Classification::Error { .. })
    }

    pub fn confirmations(&self) -> u64 {
        match self {
            Classification::Confirming { confirmations } | Classification::Verified { confirmations } => {
                *confirmations
            }
            _ => 0,
        }
    }
}

/// Classifies hashes against a confirmation threshold.
#[derive(Clone)]
pub struct ConfirmationVerifier {
    gateway: Arc<dyn Gateway>,
    threshold: u64,
}

impl ConfirmationVerifier {
    pub fn new(gateway: Arc<dyn Gateway>, threshold: u64) -> Self {
        Self { gateway, threshold }
    }

    pub fn threshold(&self) -> u64 {
        self.threshold
    }

    /// Classify `hash`.
    ///
    /// Confirmations are `current height - inclusion height`. If the node we
    /// asked for the height lags the one that served the receipt, the count
    /// saturates at zero instead of wrapping.
    pub async fn classify(&self, hash: TxHash) -> Classification {
        let receipt = match self.gateway.get_receipt(hash).await {
            Ok(Some(receipt)) => receipt,
            Ok(None) => return Classification::Pending,
            Err(e) => {
                tracing::warn!(tx_hash = %hash, error = %e, "Receipt lookup failed");
                return Classification::Error { detail: e.to_string() };
            }
        };

        if !receipt.success {
            return Classification::Failed;
        }

        let height = match self.gateway.current_height().await {
            Ok(height) => height,
            Err(e) => {
                tracing::warn!(tx_hash = %hash, error = %e, "Block height lookup failed");
                return Classification::Error { detail: e.to_string() };
            }
        };

        let confirmations = height.saturating_sub(receipt.block_number);
        if confirmations >= self.threshold {
            Classification::Verified { confirmations }
        } else {
            Classification::Confirming { confirmations }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::mock::MockGateway;

    fn setup(threshold: u64) -> (Arc<MockGateway>, ConfirmationVerifier) {
        let gateway = Arc::new(MockGateway::new());
        let verifier = ConfirmationVerifier::new(gateway.clone(), threshold);
        (gateway, verifier)
    }

    #[tokio::test]
    async fn test_threshold_boundary() {
        let (gateway, verifier) = setup(3);
        let hash = TxHash::repeat_byte(7);

        assert_eq!(verifier.classify(hash).await, Classification::Pending);

        gateway.mine(hash, true);
        gateway.advance(2);
        assert_eq!(verifier.classify(hash).await, Classification::Confirming { confirmations: 2 });

        gateway.advance(1);
        assert_eq!(verifier.classify(hash).await, Classification::Verified { confirmations: 3 });
    }

    #[tokio::test]
    async fn test_reverted_receipt_is_failed() {
        let (gateway, verifier) = setup(3);
        let hash = TxHash::repeat_byte(8);
        gateway.mine(hash, false);
        gateway.advance(10);
        assert_eq!(verifier.classify(hash).await, Classification::Failed);
    }

    #[tokio::test]
    async fn test_transport_failure_is_transient() {
        let (gateway, verifier) = setup(3);
        gateway.set_transport_down(true);
        let result = verifier.classify(TxHash::repeat_byte(9)).await;
        assert!(result.is_transient());
    }

    #[tokio::test]
    async fn test_lagging_height_saturates() {
        let (gateway, verifier) = setup(1);
        let hash = TxHash::repeat_byte(10);
        gateway.mine_at(hash, 150, true);
        assert_eq!(verifier.classify(hash).await, Classification::Confirming { confirmations: 0 });
    }
}
