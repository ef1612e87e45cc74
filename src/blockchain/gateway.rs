//! The gateway seam between the lifecycle core and the chain.
//!
//! The engine only ever talks to `dyn Gateway`, injected once at startup.
//! No operation retries internally; retry policy belongs to the caller.

use alloy::primitives::{Address, TxHash, U256};
use async_trait::async_trait;

use crate::blockchain::client::BlockchainClient;
use crate::blockchain::transaction::TxBuilder;
use crate::blockchain::types::{GatewayError, GatewayResult, ReceiptInfo};
use crate::blockchain::wallet::Wallet;

/// Read and write access to a single chain.
#[async_trait]
pub trait Gateway: Send + Sync {
    /// Receipt for `hash`, or `None` if it is not mined yet.
    ///
    /// Fails only on transport errors.
    async fn get_receipt(&self, hash: TxHash) -> GatewayResult<Option<ReceiptInfo>>;

    /// Latest known block height.
    async fn current_height(&self) -> GatewayResult<u64>;

    /// Sign and submit a value transfer from the operator account.
    async fn broadcast(&self, destination: &str, amount: U256, gas_limit: u64) -> GatewayResult<TxHash>;

    /// An RPC endpoint is configured (says nothing about reachability).
    fn is_rpc_configured(&self) -> bool;

    /// A signing credential is configured.
    fn is_signing_configured(&self) -> bool;

    /// Address of the escrow account, if a signer is configured.
    fn operator_address(&self) -> Option<Address>;
}

/// Gateway backed by JSON-RPC providers and an optional escrow wallet.
#[derive(Debug, Clone)]
pub struct RpcGateway {
    client: BlockchainClient,
    sender: Option<TxBuilder>,
}

impl RpcGateway {
    pub fn new(client: BlockchainClient, wallet: Option<Wallet>) -> Self {
        let sender = wallet.map(|w| TxBuilder::new(client.clone(), w));
        Self { client, sender }
    }
}

#[async_trait]
impl Gateway for RpcGateway {
    async fn get_receipt(&self, hash: TxHash) -> GatewayResult<Option<ReceiptInfo>> {
        self.client.get_transaction_receipt(hash).await
    }

    async fn current_height(&self) -> GatewayResult<u64> {
        self.client.get_block_number().await
    }

    async fn broadcast(&self, destination: &str, amount: U256, gas_limit: u64) -> GatewayResult<TxHash> {
        let sender = self.sender.as_ref().ok_or(GatewayError::SignerNotConfigured)?;
        let to: Address = destination
            .trim()
            .parse()
            .map_err(|_| GatewayError::InvalidAddress(destination.to_string()))?;
        sender.send_transfer(to, amount, gas_limit).await
    }

    fn is_rpc_configured(&self) -> bool {
        !self.client.config().rpc_url.trim().is_empty()
    }

    fn is_signing_configured(&self) -> bool {
        self.sender.is_some()
    }

    fn operator_address(&self) -> Option<Address> {
        self.sender.as_ref().map(TxBuilder::address)
    }
}
