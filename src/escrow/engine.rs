//! Lifecycle engine.
//!
//! # Responsibilities
//! - Drive each non-terminal record one step along the state machine per tick
//! - Guarantee the forward broadcast happens at most once per record
//! - Sweep terminal records once their retention window has elapsed
//!
//! # Design Decisions
//! - One lock per record id, shared by the periodic driver and manual triggers
//! - A forward claim is persisted before broadcasting; a claim with no
//!   forward hash is never retried
//! - Transient chain errors leave the record untouched
//! - Settings are read from an `ArcSwap` at the start of every step, so hot
//!   reloads apply on the next tick

use std::sync::Arc;
use std::time::{Duration, Instant};

use arc_swap::ArcSwap;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;
use tokio::sync::{broadcast, Mutex};
use uuid::Uuid;

use crate::blockchain::gateway::Gateway;
use crate::config::schema::LifecycleConfig;
use crate::escrow::error::{EngineError, EngineResult, ForwardError};
use crate::escrow::fee::FeeRate;
use crate::escrow::forwarder::Forwarder;
use crate::escrow::types::{Transaction, TransactionStatus};
use crate::escrow::verifier::{Classification, ConfirmationVerifier};
use crate::observability::metrics;
use crate::store::TransactionStore;

pub const ESCROW_FAILED: &str = "Escrow transaction failed";
pub const FORWARD_FAILED: &str = "Forward transaction failed";
pub const FORWARD_OUTCOME_UNKNOWN: &str = "forward outcome unknown; manual reconciliation required";

/// Result of one step for one record.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessReport {
    pub transaction: Transaction,
    /// Escrow classification, if the step looked at it.
    pub escrow: Option<Classification>,
    /// Forward classification, if the step looked at it.
    pub forward: Option<Classification>,
}

/// Counters for one full pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassSummary {
    pub processed: usize,
    pub transitions: usize,
    pub errors: usize,
    pub deleted: usize,
}

pub struct LifecycleEngine {
    store: Arc<dyn TransactionStore>,
    gateway: Arc<dyn Gateway>,
    settings: Arc<ArcSwap<LifecycleConfig>>,
    gas_limit: u64,
    locks: DashMap<Uuid, Arc<Mutex<()>>>,
}

impl LifecycleEngine {
    pub fn new(
        store: Arc<dyn TransactionStore>,
        gateway: Arc<dyn Gateway>,
        settings: Arc<ArcSwap<LifecycleConfig>>,
        gas_limit: u64,
    ) -> Self {
        Self {
            store,
            gateway,
            settings,
            gas_limit,
            locks: DashMap::new(),
        }
    }

    /// Current lifecycle settings.
    pub fn settings(&self) -> Arc<LifecycleConfig> {
        self.settings.load_full()
    }

    fn lock_for(&self, id: Uuid) -> Arc<Mutex<()>> {
        self.locks.entry(id).or_default().value().clone()
    }

    fn persist(&self, tx: &Transaction) -> EngineResult<()> {
        self.store.update(tx)?;
        metrics::record_transition(tx.status);
        tracing::info!(tx_id = %tx.id, status = %tx.status, "Transaction status changed");
        Ok(())
    }

    /// Run one step of the state machine for `id`.
    ///
    /// Serialized against every other caller touching the same id.
    pub async fn process(&self, id: Uuid) -> EngineResult<ProcessReport> {
        // Unknown ids never get a lock entry.
        if self.store.get(id)?.is_none() {
            return Err(EngineError::NotFound(id));
        }
        let lock = self.lock_for(id);
        let _guard = lock.lock().await;

        let Some(mut tx) = self.store.get(id)? else {
            // Swept while we waited.
            self.locks.remove(&id);
            return Err(EngineError::NotFound(id));
        };
        let mut report = ProcessReport {
            transaction: tx.clone(),
            escrow: None,
            forward: None,
        };
        if tx.status.is_terminal() {
            return Ok(report);
        }

        let settings = self.settings.load_full();
        let verifier = ConfirmationVerifier::new(self.gateway.clone(), settings.confirmation_threshold);

        if tx.status == TransactionStatus::Pending {
            let escrow = verifier.classify(tx.escrow_tx_hash).await;
            match &escrow {
                Classification::Verified { confirmations } => {
                    tx.mark_verified(*confirmations, Utc::now())?;
                    self.persist(&tx)?;
                }
                Classification::Failed => {
                    tx.mark_failed(ESCROW_FAILED, Utc::now())?;
                    self.persist(&tx)?;
                }
                Classification::Confirming { confirmations } => {
                    tracing::debug!(tx_id = %tx.id, confirmations, "Escrow confirming");
                }
                Classification::Pending | Classification::Error { .. } => {}
            }
            report.escrow = Some(escrow);
        }

        if tx.status == TransactionStatus::Verified {
            self.forward(&mut tx, &settings).await?;
        }

        if tx.status == TransactionStatus::ForwardingPending {
            if let Some(hash) = tx.forward_tx_hash {
                let forward = verifier.classify(hash).await;
                match &forward {
                    Classification::Verified { confirmations } => {
                        tx.mark_completed(*confirmations, Utc::now())?;
                        self.persist(&tx)?;
                    }
                    Classification::Failed => {
                        tx.mark_failed(FORWARD_FAILED, Utc::now())?;
                        self.persist(&tx)?;
                    }
                    _ => {}
                }
                report.forward = Some(forward);
            }
        }

        report.transaction = tx;
        Ok(report)
    }

    /// Claim, broadcast, record. Caller holds the record lock.
    async fn forward(&self, tx: &mut Transaction, settings: &LifecycleConfig) -> EngineResult<()> {
        if tx.forward_tx_hash.is_some() {
            return Ok(());
        }
        if tx.forward_claimed_at.is_some() {
            tracing::error!(tx_id = %tx.id, "Forward was claimed but never recorded");
            metrics::record_forward("unknown");
            tx.mark_failed(FORWARD_OUTCOME_UNKNOWN, Utc::now())?;
            return self.persist(tx);
        }

        let fee = FeeRate::from_percentage(&settings.fee_percentage)?;
        let forwarder = Forwarder::new(self.gateway.clone(), fee, self.gas_limit);

        tx.claim_forward(Utc::now())?;
        self.store.update(tx)?;

        match forwarder.forward(tx).await {
            Ok(outcome) => {
                metrics::record_forward("sent");
                tracing::info!(tx_id = %tx.id, tx_hash = %outcome.tx_hash, "Forward broadcast");
                tx.mark_forwarding(outcome.tx_hash, outcome.split, Utc::now())?;
            }
            Err(e) => {
                let outcome = match e {
                    ForwardError::NotConfigured => "not_configured",
                    _ => "rejected",
                };
                metrics::record_forward(outcome);
                tracing::error!(tx_id = %tx.id, error = %e, "Forward failed");
                tx.mark_failed(e.to_string(), Utc::now())?;
            }
        }
        self.persist(tx)
    }

    /// Manual trigger: one step for `id`, plus a classification of every hash
    /// the step itself did not look at.
    pub async fn trigger(&self, id: Uuid) -> EngineResult<ProcessReport> {
        let mut report = self.process(id).await?;
        let verifier = ConfirmationVerifier::new(self.gateway.clone(), self.settings.load().confirmation_threshold);

        if report.escrow.is_none() {
            report.escrow = Some(verifier.classify(report.transaction.escrow_tx_hash).await);
        }
        if report.forward.is_none() {
            if let Some(hash) = report.transaction.forward_tx_hash {
                report.forward = Some(verifier.classify(hash).await);
            }
        }
        Ok(report)
    }

    /// One full pass over every non-terminal record, then a retention sweep.
    ///
    /// A failing record is logged and skipped; it never aborts the pass.
    pub async fn run_pass(&self) -> PassSummary {
        let start = Instant::now();
        let mut summary = PassSummary::default();

        let records = match self.store.list_all() {
            Ok(records) => records,
            Err(e) => {
                tracing::error!(error = %e, "Failed to list transactions");
                return summary;
            }
        };

        for tx in records.into_iter().filter(|tx| !tx.status.is_terminal()) {
            summary.processed += 1;
            match self.process(tx.id).await {
                Ok(report) => {
                    if report.transaction.status != tx.status {
                        summary.transitions += 1;
                    }
                }
                // Deleted since the snapshot.
                Err(EngineError::NotFound(_)) => {}
                Err(e) => {
                    summary.errors += 1;
                    tracing::error!(tx_id = %tx.id, error = %e, "Failed to process transaction");
                }
            }
        }

        summary.deleted = self.sweep_retention(Utc::now());

        match self.store.list_all() {
            Ok(records) => metrics::set_tracked(records.len()),
            Err(e) => tracing::warn!(error = %e, "Failed to count transactions"),
        }
        metrics::record_pass_duration(start);
        summary
    }

    /// Delete terminal records older than their retention window.
    pub fn sweep_retention(&self, now: DateTime<Utc>) -> usize {
        let settings = self.settings.load();
        let completed = retention_window(settings.completed_retention_secs);
        let failed = retention_window(settings.failed_retention_secs);

        let records = match self.store.list_all() {
            Ok(records) => records,
            Err(e) => {
                tracing::error!(error = %e, "Failed to list transactions for retention sweep");
                return 0;
            }
        };

        let mut deleted = 0;
        for tx in records.iter().filter(|tx| tx.is_expired(now, completed, failed)) {
            match self.store.delete(tx.id) {
                Ok(true) => {
                    deleted += 1;
                    self.locks.remove(&tx.id);
                    metrics::record_deleted(tx.status);
                    tracing::info!(tx_id = %tx.id, status = %tx.status, "Transaction removed after retention window");
                }
                Ok(false) => {}
                Err(e) => tracing::error!(tx_id = %tx.id, error = %e, "Failed to delete transaction"),
            }
        }
        deleted
    }

    /// Periodic driver. Re-reads the poll interval after every pass.
    pub async fn run(self: Arc<Self>, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!(
            poll_interval_secs = self.settings.load().poll_interval_secs,
            "Lifecycle engine starting"
        );

        loop {
            let summary = self.run_pass().await;
            if summary.processed > 0 || summary.deleted > 0 {
                tracing::debug!(
                    processed = summary.processed,
                    transitions = summary.transitions,
                    errors = summary.errors,
                    deleted = summary.deleted,
                    "Lifecycle pass finished"
                );
            }

            let interval = Duration::from_secs(self.settings.load().poll_interval_secs.max(1));
            tokio::select! {
                _ = tokio::time::sleep(interval) => {}
                _ = shutdown.recv() => {
                    tracing::info!("Lifecycle engine received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }
}

/// Seconds to a `chrono` window, saturating instead of wrapping.
fn retention_window(secs: u64) -> chrono::Duration {
    i64::try_from(secs)
        .ok()
        .and_then(chrono::Duration::try_seconds)
        .unwrap_or(chrono::Duration::MAX)
}
