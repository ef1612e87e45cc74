//! End-to-end lifecycle scenarios against a scripted chain.

use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::TxHash;
use chrono::Duration as ChronoDuration;

use escrow_relay::blockchain::MockGateway;
use escrow_relay::escrow::engine::{ESCROW_FAILED, FORWARD_FAILED, FORWARD_OUTCOME_UNKNOWN};
use escrow_relay::escrow::{Amount, Classification, TransactionStatus};
use escrow_relay::store::{FileStore, MemoryStore, TransactionStore};

mod common;
use common::{escrow_hash, relay, relay_with};

fn ether(s: &str) -> Amount {
    Amount::parse_ether(s).unwrap()
}

fn rank(status: TransactionStatus) -> u8 {
    match status {
        TransactionStatus::Pending => 0,
        TransactionStatus::Verified => 1,
        TransactionStatus::ForwardingPending => 2,
        TransactionStatus::Completed => 3,
        TransactionStatus::Failed => 4,
    }
}

#[tokio::test]
async fn test_happy_path_one_ether() {
    let r = relay();
    let escrow = escrow_hash(0xe1);
    let tx = r.submit("1.0", escrow);
    let mut seen = vec![tx.status];

    // Two confirmations: not enough.
    r.gateway.mine(escrow, true);
    r.gateway.advance(2);
    r.engine.run_pass().await;
    let current = r.record(&tx).unwrap();
    assert_eq!(current.status, TransactionStatus::Pending);
    assert_eq!(r.gateway.broadcast_calls(), 0);
    seen.push(current.status);

    // Third confirmation: verified and forwarded in the same tick.
    r.gateway.advance(1);
    let summary = r.engine.run_pass().await;
    assert_eq!(summary.processed, 1);
    let current = r.record(&tx).unwrap();
    assert_eq!(current.status, TransactionStatus::ForwardingPending);
    assert_eq!(current.forwarded_amount, Some(ether("0.99")));
    assert_eq!(current.fee_kept, Some(ether("0.01")));
    assert!(current.verified_at.is_some());
    assert!(current.forward_initiated_at.is_some());
    seen.push(current.status);

    let sent = r.gateway.broadcasts();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].destination, common::destination());
    assert_eq!(sent[0].amount, ether("0.99").wei());
    assert_eq!(Some(sent[0].hash), current.forward_tx_hash);

    // Forward confirms.
    r.gateway.mine(sent[0].hash, true);
    r.gateway.advance(3);
    r.engine.run_pass().await;
    let done = r.record(&tx).unwrap();
    assert_eq!(done.status, TransactionStatus::Completed);
    assert_eq!(done.forwarded_amount.unwrap().checked_add(done.fee_kept.unwrap()), Some(done.amount));
    assert!(done.escrow_confirmations.unwrap() >= 3);
    assert!(done.forward_confirmations.unwrap() >= 3);
    seen.push(done.status);

    assert!(seen.windows(2).all(|w| rank(w[0]) <= rank(w[1])));
    assert_eq!(r.gateway.broadcast_calls(), 1);

    // Retention: present just inside the window, gone just after.
    let completed_at = done.completed_at.unwrap();
    assert_eq!(r.engine.sweep_retention(completed_at + ChronoDuration::seconds(59)), 0);
    assert!(r.record(&tx).is_some());
    assert_eq!(r.engine.sweep_retention(completed_at + ChronoDuration::seconds(61)), 1);
    assert!(r.record(&tx).is_none());
    assert!(r.service.list_by_sender("0xa").unwrap().is_empty());
}

#[tokio::test]
async fn test_escrow_revert_fails_without_forward() {
    let r = relay();
    let escrow = escrow_hash(0xe2);
    let tx = r.submit("1.0", escrow);

    r.gateway.mine(escrow, false);
    r.engine.run_pass().await;

    let failed = r.record(&tx).unwrap();
    assert_eq!(failed.status, TransactionStatus::Failed);
    assert_eq!(failed.error.as_deref(), Some(ESCROW_FAILED));
    assert!(failed.forward_tx_hash.is_none());
    assert_eq!(r.gateway.broadcast_calls(), 0);

    // Later passes leave it alone.
    r.gateway.advance(10);
    r.engine.run_pass().await;
    assert_eq!(r.record(&tx).unwrap(), failed);

    let failed_at = failed.failed_at.unwrap();
    r.engine.sweep_retention(failed_at + ChronoDuration::seconds(120));
    assert!(r.record(&tx).is_some());
    r.engine.sweep_retention(failed_at + ChronoDuration::seconds(301));
    assert!(r.record(&tx).is_none());
}

#[tokio::test]
async fn test_transport_outage_changes_nothing() {
    let r = relay();
    let escrow = escrow_hash(0xe3);
    let tx = r.submit("2", escrow);

    r.gateway.mine(escrow, true);
    r.gateway.advance(5);
    r.gateway.set_transport_down(true);

    for _ in 0..3 {
        let summary = r.engine.run_pass().await;
        assert_eq!(summary.errors, 0);
        assert_eq!(r.record(&tx).unwrap(), tx);
    }
    let report = r.engine.trigger(tx.id).await.unwrap();
    assert!(matches!(report.escrow, Some(Classification::Error { .. })));
    assert_eq!(report.transaction.status, TransactionStatus::Pending);
    assert!(report.transaction.error.is_none());

    // Recovers on the next tick after the outage.
    r.gateway.set_transport_down(false);
    r.engine.run_pass().await;
    assert_eq!(r.record(&tx).unwrap().status, TransactionStatus::ForwardingPending);

    // Outage while the forward is in flight keeps it in flight.
    r.gateway.set_transport_down(true);
    r.engine.run_pass().await;
    let current = r.record(&tx).unwrap();
    assert_eq!(current.status, TransactionStatus::ForwardingPending);
    assert!(current.error.is_none());
}

#[tokio::test]
async fn test_concurrent_triggers_forward_once() {
    let r = Arc::new(relay_with(
        MockGateway::new().with_broadcast_delay(Duration::from_millis(200)),
        Arc::new(MemoryStore::new()),
    ));
    let escrow = escrow_hash(0xe4);
    let tx = r.submit("1.0", escrow);
    r.gateway.mine(escrow, true);
    r.gateway.advance(3);

    let id = tx.id;
    let mut handles = Vec::new();
    for _ in 0..8 {
        let engine = r.engine.clone();
        handles.push(tokio::spawn(async move { engine.trigger(id).await.unwrap() }));
    }
    let engine = r.engine.clone();
    let pass = tokio::spawn(async move { engine.run_pass().await });

    let mut hashes = Vec::new();
    for handle in handles {
        let report = handle.await.unwrap();
        assert_eq!(report.transaction.status, TransactionStatus::ForwardingPending);
        hashes.push(report.transaction.forward_tx_hash.unwrap());
    }
    pass.await.unwrap();

    assert_eq!(r.gateway.broadcast_calls(), 1);
    assert!(hashes.windows(2).all(|w| w[0] == w[1]));
}

#[tokio::test]
async fn test_completion_needs_forward_threshold() {
    let r = relay();
    let escrow = escrow_hash(0xe5);
    let tx = r.submit("1.0", escrow);

    r.gateway.mine(escrow, true);
    r.gateway.advance(3);
    r.engine.run_pass().await;
    let forward = r.record(&tx).unwrap().forward_tx_hash.unwrap();

    // Escrow is far past the threshold; the forward alone is not.
    r.gateway.mine(forward, true);
    r.gateway.advance(2);
    let report = r.engine.trigger(tx.id).await.unwrap();
    assert_eq!(report.forward, Some(Classification::Confirming { confirmations: 2 }));
    assert_eq!(report.transaction.status, TransactionStatus::ForwardingPending);

    // Raising the threshold at runtime applies on the next step.
    r.set_lifecycle(|l| l.confirmation_threshold = 6);
    r.gateway.advance(2);
    r.engine.run_pass().await;
    assert_eq!(r.record(&tx).unwrap().status, TransactionStatus::ForwardingPending);

    r.gateway.advance(2);
    r.engine.run_pass().await;
    let done = r.record(&tx).unwrap();
    assert_eq!(done.status, TransactionStatus::Completed);
    assert_eq!(done.forward_confirmations, Some(6));
}

#[tokio::test]
async fn test_missing_signer_fails_deterministically() {
    let r = relay_with(MockGateway::new().without_signer(), Arc::new(MemoryStore::new()));
    let escrow = escrow_hash(0xe6);
    let tx = r.submit("1.0", escrow);

    r.gateway.mine(escrow, true);
    r.gateway.advance(3);
    r.engine.run_pass().await;

    let failed = r.record(&tx).unwrap();
    assert_eq!(failed.status, TransactionStatus::Failed);
    assert_eq!(failed.error.as_deref(), Some("Escrow wallet not configured"));
    assert!(failed.verified_at.is_some());
    assert_eq!(r.gateway.broadcast_calls(), 0);
}

#[tokio::test]
async fn test_forward_rejections_are_terminal() {
    let r = relay();
    r.gateway.reject_broadcasts("insufficient funds for gas * price + value");
    let escrow = escrow_hash(0xe7);
    let tx = r.submit("1.0", escrow);
    r.gateway.mine(escrow, true);
    r.gateway.advance(3);
    r.engine.run_pass().await;

    let failed = r.record(&tx).unwrap();
    assert_eq!(failed.status, TransactionStatus::Failed);
    assert!(failed.error.unwrap().contains("insufficient funds"));

    // Not retried.
    r.engine.run_pass().await;
    assert_eq!(r.gateway.broadcast_calls(), 1);
}

#[tokio::test]
async fn test_invalid_destination_fails_at_forward() {
    let r = relay();
    let escrow = escrow_hash(0xe8);
    let mut request = common::intake("0xA", "1.0", escrow);
    request.destination_address = Some("not-an-address".to_string());
    let tx = r.service.submit(request).unwrap();

    r.gateway.mine(escrow, true);
    r.gateway.advance(3);
    r.engine.run_pass().await;

    let failed = r.record(&tx).unwrap();
    assert_eq!(failed.status, TransactionStatus::Failed);
    assert!(failed.error.unwrap().contains("not-an-address"));
    assert!(r.gateway.broadcasts().is_empty());
}

#[tokio::test]
async fn test_forward_revert_fails() {
    let r = relay();
    let escrow = escrow_hash(0xe9);
    let tx = r.submit("1.0", escrow);
    r.gateway.mine(escrow, true);
    r.gateway.advance(3);
    r.engine.run_pass().await;

    let forward = r.record(&tx).unwrap().forward_tx_hash.unwrap();
    r.gateway.mine(forward, false);
    r.engine.run_pass().await;

    let failed = r.record(&tx).unwrap();
    assert_eq!(failed.status, TransactionStatus::Failed);
    assert_eq!(failed.error.as_deref(), Some(FORWARD_FAILED));
    assert!(failed.completed_at.is_none());
}

#[tokio::test]
async fn test_reloaded_fee_applies_to_next_forward() {
    let r = relay();
    r.set_lifecycle(|l| l.fee_percentage = "2.5".to_string());
    let escrow = escrow_hash(0xea);
    let tx = r.submit("1.0", escrow);
    r.gateway.mine(escrow, true);
    r.gateway.advance(3);
    r.engine.run_pass().await;

    let current = r.record(&tx).unwrap();
    assert_eq!(current.forwarded_amount, Some(ether("0.975")));
    assert_eq!(current.fee_kept, Some(ether("0.025")));
}

#[tokio::test]
async fn test_one_bad_record_does_not_stop_the_pass() {
    let r = relay();
    let good = r.submit("1.0", escrow_hash(0xeb));
    let stuck = r.submit("1.0", escrow_hash(0xec));

    // A claim with no hash is resolved to failed, not retried.
    let mut claimed = r.record(&stuck).unwrap();
    claimed.mark_verified(3, chrono::Utc::now()).unwrap();
    claimed.claim_forward(chrono::Utc::now()).unwrap();
    r.store.update(&claimed).unwrap();

    r.gateway.mine(escrow_hash(0xeb), true);
    r.gateway.advance(3);
    let summary = r.engine.run_pass().await;
    assert_eq!(summary.processed, 2);
    assert_eq!(summary.errors, 0);

    assert_eq!(r.record(&good).unwrap().status, TransactionStatus::ForwardingPending);
    let stuck = r.record(&stuck).unwrap();
    assert_eq!(stuck.status, TransactionStatus::Failed);
    assert_eq!(stuck.error.as_deref(), Some(FORWARD_OUTCOME_UNKNOWN));
    assert_eq!(r.gateway.broadcast_calls(), 1);
}

#[tokio::test]
async fn test_file_store_resumes_after_restart() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("transactions.json");
    let escrow = escrow_hash(0xed);

    let gateway = MockGateway::new();
    gateway.mine(escrow, true);
    gateway.advance(3);

    let first = relay_with(gateway, Arc::new(FileStore::open(&path).unwrap()));
    let tx = first.submit("1.0", escrow);
    first.engine.run_pass().await;
    let forward: TxHash = first.record(&tx).unwrap().forward_tx_hash.unwrap();
    drop(first);

    // Same chain state, fresh process.
    let gateway = MockGateway::new();
    gateway.mine(escrow, true);
    gateway.mine(forward, true);
    gateway.advance(3);
    let second = relay_with(gateway, Arc::new(FileStore::open(&path).unwrap()));

    let resumed = second.record(&tx).unwrap();
    assert_eq!(resumed.status, TransactionStatus::ForwardingPending);

    second.engine.run_pass().await;
    assert_eq!(second.record(&tx).unwrap().status, TransactionStatus::Completed);
    assert_eq!(second.gateway.broadcast_calls(), 0);

    let reopened = FileStore::open(&path).unwrap();
    assert_eq!(reopened.get(tx.id).unwrap().unwrap().status, TransactionStatus::Completed);
}
