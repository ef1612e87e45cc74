//! Service facade over store, engine and gateway.
//!
//! Everything the HTTP layer and the binaries need goes through here.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::blockchain::gateway::Gateway;
use crate::escrow::engine::{LifecycleEngine, ProcessReport};
use crate::escrow::error::{EngineResult, SubmitError};
use crate::escrow::intake::IntakeRequest;
use crate::escrow::types::Transaction;
use crate::store::{StoreResult, TransactionStore};

pub const SERVICE_NAME: &str = "escrow-relay";

/// Configuration-level health. Never touches the network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    pub status: &'static str,
    pub timestamp: DateTime<Utc>,
    pub service: &'static str,
    pub rpc_configured: bool,
    pub signer_configured: bool,
    pub escrow_address: Option<String>,
}

pub struct EscrowService {
    store: Arc<dyn TransactionStore>,
    gateway: Arc<dyn Gateway>,
    engine: Arc<LifecycleEngine>,
}

impl EscrowService {
    pub fn new(store: Arc<dyn TransactionStore>, gateway: Arc<dyn Gateway>, engine: Arc<LifecycleEngine>) -> Self {
        Self { store, gateway, engine }
    }

    pub fn engine(&self) -> &Arc<LifecycleEngine> {
        &self.engine
    }

    /// Validate and persist a new pending transaction.
    pub fn submit(&self, request: IntakeRequest) -> Result<Transaction, SubmitError> {
        let new = request.validate()?;
        let tx = Transaction::new_pending(new, Utc::now());
        self.store.create(tx.clone())?;

        tracing::info!(
            tx_id = %tx.id,
            sender = %tx.sender_address,
            destination = %tx.destination_address,
            amount = %tx.amount,
            escrow_tx_hash = %tx.escrow_tx_hash,
            "Transaction received"
        );
        Ok(tx)
    }

    pub fn get(&self, id: Uuid) -> StoreResult<Option<Transaction>> {
        self.store.get(id)
    }

    /// Records from `sender`, newest first. Case-insensitive.
    pub fn list_by_sender(&self, sender: &str) -> StoreResult<Vec<Transaction>> {
        let mut records: Vec<Transaction> = self
            .store
            .list_all()?
            .into_iter()
            .filter(|tx| tx.is_sent_by(sender))
            .collect();
        records.sort_by(|a, b| b.received_at.cmp(&a.received_at));
        Ok(records)
    }

    /// Every record still in the store, newest first.
    pub fn list_all(&self) -> StoreResult<Vec<Transaction>> {
        let mut records = self.store.list_all()?;
        records.sort_by(|a, b| b.received_at.cmp(&a.received_at));
        Ok(records)
    }

    pub async fn trigger(&self, id: Uuid) -> EngineResult<ProcessReport> {
        self.engine.trigger(id).await
    }

    pub fn health(&self) -> HealthReport {
        HealthReport {
            status: "healthy",
            timestamp: Utc::now(),
            service: SERVICE_NAME,
            rpc_configured: self.gateway.is_rpc_configured(),
            signer_configured: self.gateway.is_signing_configured(),
            escrow_address: self.gateway.operator_address().map(|a| a.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::mock::MockGateway;
    use crate::config::schema::LifecycleConfig;
    use crate::escrow::error::ValidationError;
    use crate::store::MemoryStore;
    use arc_swap::ArcSwap;
    use serde_json::json;

    fn service(gateway: MockGateway) -> EscrowService {
        let gateway: Arc<dyn Gateway> = Arc::new(gateway);
        let store: Arc<dyn TransactionStore> = Arc::new(MemoryStore::new());
        let settings = Arc::new(ArcSwap::from_pointee(LifecycleConfig::default()));
        let engine = Arc::new(LifecycleEngine::new(store.clone(), gateway.clone(), settings, 21_000));
        EscrowService::new(store, gateway, engine)
    }

    fn request(sender: &str, hash_byte: u8) -> IntakeRequest {
        serde_json::from_value(json!({
            "senderAddress": sender,
            "destinationAddress": "0xB",
            "amount": "1.0",
            "escrowTxHash": format!("0x{}", format!("{:02x}", hash_byte).repeat(32)),
        }))
        .unwrap()
    }

    #[test]
    fn test_rejected_intake_creates_nothing() {
        let svc = service(MockGateway::new());
        let bad: IntakeRequest = serde_json::from_value(json!({ "senderAddress": "0xA" })).unwrap();
        assert!(matches!(
            svc.submit(bad),
            Err(SubmitError::Validation(ValidationError::MissingField(_)))
        ));
        assert!(svc.list_all().unwrap().is_empty());
    }

    #[test]
    fn test_listing_by_sender() {
        let svc = service(MockGateway::new());
        svc.submit(request("0xAbC", 1)).unwrap();
        svc.submit(request("0xabc", 2)).unwrap();
        svc.submit(request("0xDEF", 3)).unwrap();

        assert_eq!(svc.list_by_sender("0xABC").unwrap().len(), 2);
        assert_eq!(svc.list_by_sender("0xdef").unwrap().len(), 1);
        assert!(svc.list_by_sender("0x123").unwrap().is_empty());
        assert_eq!(svc.list_all().unwrap().len(), 3);
    }

    #[test]
    fn test_health_reflects_configuration() {
        let report = service(MockGateway::new().without_signer()).health();
        assert!(report.rpc_configured);
        assert!(!report.signer_configured);
        assert!(report.escrow_address.is_none());

        let report = service(MockGateway::new()).health();
        assert!(report.signer_configured);
        assert!(report.escrow_address.is_some());
    }
}
