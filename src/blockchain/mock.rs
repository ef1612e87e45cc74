//! Scriptable in-memory gateway.
//!
//! Used by the test suites to drive the lifecycle engine through confirmation
//! depths, reverts, reorgs and RPC outages without a node.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use alloy::primitives::{keccak256, Address, TxHash, U256};
use async_trait::async_trait;

use crate::blockchain::gateway::Gateway;
use crate::blockchain::types::{GatewayError, GatewayResult, ReceiptInfo};

/// A transfer the mock accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BroadcastRecord {
    pub hash: TxHash,
    pub destination: Address,
    pub amount: U256,
    pub gas_limit: u64,
}

#[derive(Default)]
struct MockState {
    height: u64,
    receipts: HashMap<TxHash, ReceiptInfo>,
    transport_down: bool,
    broadcast_rejection: Option<String>,
    broadcasts: Vec<BroadcastRecord>,
}

/// In-memory [`Gateway`] with failure injection.
pub struct MockGateway {
    state: Mutex<MockState>,
    signer: Option<Address>,
    broadcast_delay: Option<Duration>,
    receipt_calls: AtomicUsize,
    broadcast_calls: AtomicUsize,
}

impl MockGateway {
    /// A gateway at height 100 with a configured signer.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MockState {
                height: 100,
                ..MockState::default()
            }),
            signer: Some(Address::repeat_byte(0xee)),
            broadcast_delay: None,
            receipt_calls: AtomicUsize::new(0),
            broadcast_calls: AtomicUsize::new(0),
        }
    }

    /// Same gateway, but with no signing credential.
    pub fn without_signer(mut self) -> Self {
        self.signer = None;
        self
    }

    /// Make every broadcast take this long (to widen race windows).
    pub fn with_broadcast_delay(mut self, delay: Duration) -> Self {
        self.broadcast_delay = Some(delay);
        self
    }

    fn state(&self) -> std::sync::MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn height(&self) -> u64 {
        self.state().height
    }

    pub fn set_height(&self, height: u64) {
        self.state().height = height;
    }

    /// Mine `blocks` more blocks.
    pub fn advance(&self, blocks: u64) {
        self.state().height += blocks;
    }

    /// Include `hash` at the current height.
    pub fn mine(&self, hash: TxHash, success: bool) {
        let mut state = self.state();
        let block_number = state.height;
        state.receipts.insert(hash, ReceiptInfo { block_number, success });
    }

    /// Include `hash` at an explicit block.
    pub fn mine_at(&self, hash: TxHash, block_number: u64, success: bool) {
        self.state().receipts.insert(hash, ReceiptInfo { block_number, success });
    }

    /// Forget the receipt for `hash` (simulates a reorg dropping it).
    pub fn drop_receipt(&self, hash: TxHash) {
        self.state().receipts.remove(&hash);
    }

    /// Make reads and broadcasts fail with transport errors.
    pub fn set_transport_down(&self, down: bool) {
        self.state().transport_down = down;
    }

    /// Make broadcasts fail with a node-side rejection message.
    pub fn reject_broadcasts(&self, message: impl Into<String>) {
        self.state().broadcast_rejection = Some(message.into());
    }

    /// Every transfer accepted so far.
    pub fn broadcasts(&self) -> Vec<BroadcastRecord> {
        self.state().broadcasts.clone()
    }

    /// Number of broadcast attempts, accepted or not.
    pub fn broadcast_calls(&self) -> usize {
        self.broadcast_calls.load(Ordering::SeqCst)
    }

    pub fn receipt_calls(&self) -> usize {
        self.receipt_calls.load(Ordering::SeqCst)
    }
}

impl Default for MockGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Gateway for MockGateway {
    async fn get_receipt(&self, hash: TxHash) -> GatewayResult<Option<ReceiptInfo>> {
        self.receipt_calls.fetch_add(1, Ordering::SeqCst);
        let state = self.state();
        if state.transport_down {
            return Err(GatewayError::Rpc("connection refused".to_string()));
        }
        Ok(state.receipts.get(&hash).copied())
    }

    async fn current_height(&self) -> GatewayResult<u64> {
        let state = self.state();
        if state.transport_down {
            return Err(GatewayError::Timeout(10));
        }
        Ok(state.height)
    }

    async fn broadcast(&self, destination: &str, amount: U256, gas_limit: u64) -> GatewayResult<TxHash> {
        let call = self.broadcast_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.broadcast_delay {
            tokio::time::sleep(delay).await;
        }
        if self.signer.is_none() {
            return Err(GatewayError::SignerNotConfigured);
        }
        let destination: Address = destination
            .trim()
            .parse()
            .map_err(|_| GatewayError::InvalidAddress(destination.to_string()))?;

        let mut state = self.state();
        if state.transport_down {
            return Err(GatewayError::Rpc("connection refused".to_string()));
        }
        if let Some(message) = &state.broadcast_rejection {
            return Err(GatewayError::from_rpc_message(message.clone()));
        }

        let hash = keccak256((call as u64).to_be_bytes());
        state.broadcasts.push(BroadcastRecord {
            hash,
            destination,
            amount,
            gas_limit,
        });
        Ok(hash)
    }

    fn is_rpc_configured(&self) -> bool {
        true
    }

    fn is_signing_configured(&self) -> bool {
        self.signer.is_some()
    }

    fn operator_address(&self) -> Option<Address> {
        self.signer
    }
}
