//! Shared fixtures for the integration suites.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;

use alloy::primitives::{Address, TxHash};
use arc_swap::ArcSwap;
use serde_json::json;
use tokio::net::TcpListener;

use escrow_relay::blockchain::{Gateway, MockGateway};
use escrow_relay::config::schema::{HttpConfig, LifecycleConfig};
use escrow_relay::escrow::{EscrowService, IntakeRequest, LifecycleEngine, Transaction};
use escrow_relay::http::HttpServer;
use escrow_relay::lifecycle::Shutdown;
use escrow_relay::store::{MemoryStore, TransactionStore};

pub const GAS_LIMIT: u64 = 21_000;

/// A relay wired to a scriptable chain and an in-memory store.
pub struct Relay {
    pub gateway: Arc<MockGateway>,
    pub store: Arc<dyn TransactionStore>,
    pub settings: Arc<ArcSwap<LifecycleConfig>>,
    pub engine: Arc<LifecycleEngine>,
    pub service: Arc<EscrowService>,
}

pub fn relay() -> Relay {
    relay_with(MockGateway::new(), Arc::new(MemoryStore::new()))
}

pub fn relay_with(gateway: MockGateway, store: Arc<dyn TransactionStore>) -> Relay {
    let gateway = Arc::new(gateway);
    let dyn_gateway: Arc<dyn Gateway> = gateway.clone();
    let settings = Arc::new(ArcSwap::from_pointee(LifecycleConfig::default()));
    let engine = Arc::new(LifecycleEngine::new(
        store.clone(),
        dyn_gateway.clone(),
        settings.clone(),
        GAS_LIMIT,
    ));
    let service = Arc::new(EscrowService::new(store.clone(), dyn_gateway, engine.clone()));
    Relay {
        gateway,
        store,
        settings,
        engine,
        service,
    }
}

pub fn escrow_hash(byte: u8) -> TxHash {
    TxHash::repeat_byte(byte)
}

pub fn destination() -> Address {
    Address::repeat_byte(0xbb)
}

pub fn intake(sender: &str, amount: &str, escrow: TxHash) -> IntakeRequest {
    serde_json::from_value(json!({
        "senderAddress": sender,
        "destinationAddress": destination().to_string(),
        "amount": amount,
        "escrowTxHash": escrow.to_string(),
    }))
    .unwrap()
}

impl Relay {
    pub fn submit(&self, amount: &str, escrow: TxHash) -> Transaction {
        self.service.submit(intake("0xA", amount, escrow)).unwrap()
    }

    pub fn record(&self, tx: &Transaction) -> Option<Transaction> {
        self.store.get(tx.id).unwrap()
    }

    pub fn set_lifecycle(&self, f: impl FnOnce(&mut LifecycleConfig)) {
        let mut next = (**self.settings.load()).clone();
        f(&mut next);
        self.settings.store(Arc::new(next));
    }
}

/// Serve the relay API on an ephemeral port.
pub async fn start_server(service: Arc<EscrowService>, shutdown: &Shutdown) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = HttpServer::new(service, &HttpConfig::default());
    let rx = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, rx).await;
    });
    addr
}
