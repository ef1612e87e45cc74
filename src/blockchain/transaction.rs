//! Value-transfer building, signing and broadcasting.
//!
//! # Responsibilities
//! - Build legacy value transfers with nonce and gas price from the chain
//! - Enforce the gas price ceiling
//! - Sign with the escrow wallet and submit the raw envelope

use alloy::network::TransactionBuilder;
use alloy::primitives::{Address, TxHash, U256};
use alloy::rpc::types::TransactionRequest;

use crate::blockchain::client::BlockchainClient;
use crate::blockchain::types::{GatewayError, GatewayResult};
use crate::blockchain::wallet::Wallet;

/// Builds and broadcasts transfers from the escrow wallet.
#[derive(Clone, Debug)]
pub struct TxBuilder {
    client: BlockchainClient,
    wallet: Wallet,
}

impl TxBuilder {
    /// Create a new transaction builder.
    pub fn new(client: BlockchainClient, wallet: Wallet) -> Self {
        Self { client, wallet }
    }

    /// Build a plain value transfer request.
    ///
    /// # Arguments
    /// * `to` - Destination address
    /// * `value` - Amount of native token to send, in wei
    /// * `gas_limit` - Gas limit for the transfer
    pub async fn build_transfer(
        &self,
        to: Address,
        value: U256,
        gas_limit: u64,
    ) -> GatewayResult<TransactionRequest> {
        let chain_nonce = self.client.get_transaction_count(self.wallet.address()).await?;

        let gas_price = self.client.get_gas_price().await?;
        let gas_price_gwei = gas_price / 1_000_000_000;

        let config = self.client.config();
        if gas_price_gwei > config.max_gas_price_gwei as u128 {
            return Err(GatewayError::GasPriceTooHigh {
                current_gwei: gas_price_gwei as u64,
                max_gwei: config.max_gas_price_gwei,
            });
        }

        // Apply multiplier for safety margin
        let adjusted_gas_price = (gas_price as f64 * config.gas_price_multiplier) as u128;

        let nonce = self.wallet.reserve_nonce(chain_nonce);

        let tx = TransactionRequest::default()
            .with_from(self.wallet.address())
            .with_to(to)
            .with_value(value)
            .with_nonce(nonce)
            .with_gas_price(adjusted_gas_price)
            .with_chain_id(self.wallet.chain_id())
            .with_gas_limit(gas_limit);

        Ok(tx)
    }

    /// Sign and broadcast a value transfer, returning its hash.
    pub async fn send_transfer(&self, to: Address, value: U256, gas_limit: u64) -> GatewayResult<TxHash> {
        let request = self.build_transfer(to, value, gas_limit).await?;
        let nonce = request.nonce;

        let envelope = request
            .build(&self.wallet.network_wallet())
            .await
            .map_err(|e| GatewayError::Wallet(format!("Signing failed: {}", e)))?;

        match self.client.send_envelope(envelope).await {
            Ok(hash) => {
                tracing::info!(tx_hash = %hash, to = %to, value = %value, ?nonce, "Transfer broadcast");
                Ok(hash)
            }
            Err(e) => {
                if let Some(nonce) = nonce {
                    release_rejected_nonce(&self.wallet, nonce, &e);
                }
                Err(e)
            }
        }
    }

    /// Get the wallet address.
    pub fn address(&self) -> Address {
        self.wallet.address()
    }
}

/// Hand `nonce` back to the wallet when the node refused the envelope.
///
/// After a transport failure the envelope may still have reached the
/// mempool, so the nonce stays consumed.
fn release_rejected_nonce(wallet: &Wallet, nonce: u64, error: &GatewayError) {
    if error.is_transport() {
        return;
    }
    tracing::debug!(nonce, error = %error, "Releasing nonce after rejected broadcast");
    wallet.set_nonce(nonce);
}
