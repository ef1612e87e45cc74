//! Forward broadcast: escrowed amount minus the service fee, to the
//! destination address.

use std::sync::Arc;

use alloy::primitives::TxHash;

use crate::blockchain::gateway::Gateway;
use crate::escrow::error::ForwardError;
use crate::escrow::fee::{FeeRate, FeeSplit};
use crate::escrow::types::Transaction;

/// A forward the network accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForwardOutcome {
    pub tx_hash: TxHash,
    pub split: FeeSplit,
}

/// Builds and broadcasts forwards. Never retries.
#[derive(Clone)]
pub struct Forwarder {
    gateway: Arc<dyn Gateway>,
    fee: FeeRate,
    gas_limit: u64,
}

impl Forwarder {
    pub fn new(gateway: Arc<dyn Gateway>, fee: FeeRate, gas_limit: u64) -> Self {
        Self { gateway, fee, gas_limit }
    }

    /// Broadcast the forward for `tx`.
    ///
    /// Fails fast with [`ForwardError::NotConfigured`] when no signer is
    /// configured; in that case nothing reaches the network.
    pub async fn forward(&self, tx: &Transaction) -> Result<ForwardOutcome, ForwardError> {
        if !self.gateway.is_signing_configured() {
            return Err(ForwardError::NotConfigured);
        }

        let split = self.fee.split(tx.amount)?;
        tracing::info!(
            tx_id = %tx.id,
            destination = %tx.destination_address,
            amount = %split.forwarded,
            fee = %split.fee,
            "Broadcasting forward"
        );

        let tx_hash = self
            .gateway
            .broadcast(&tx.destination_address, split.forwarded.wei(), self.gas_limit)
            .await?;

        Ok(ForwardOutcome { tx_hash, split })
    }
}
