//! Blockchain RPC client with timeout and error handling.
//!
//! # Responsibilities
//! - Connect to JSON-RPC endpoint (primary + failovers)
//! - Query chain state (block number, nonce, gas price, receipts)
//! - Submit signed transaction envelopes
//! - Handle timeouts and network errors gracefully

use alloy::consensus::TxEnvelope;
use alloy::primitives::{Address, TxHash};
use alloy::providers::{Provider, ProviderBuilder};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

use crate::blockchain::types::{BlockchainConfig, ChainId, GatewayError, GatewayResult, ReceiptInfo};
use crate::observability::metrics;

/// Blockchain RPC client wrapper with failover support.
#[derive(Clone)]
pub struct BlockchainClient {
    /// List of providers (primary + failovers).
    providers: Vec<Arc<dyn Provider + Send + Sync>>,
    /// Configuration.
    config: BlockchainConfig,
    /// Request timeout duration.
    timeout_duration: Duration,
}

impl BlockchainClient {
    /// Create a new blockchain client.
    ///
    /// Fails only if the primary RPC URL cannot be parsed; an unreachable
    /// endpoint is tolerated so the relay can start and retry later.
    pub async fn new(config: BlockchainConfig) -> GatewayResult<Self> {
        let timeout_duration = Duration::from_secs(config.rpc_timeout_secs);
        let mut providers = Vec::new();

        // 1. Add primary provider
        let primary_url: url::Url = config.rpc_url.parse().map_err(|e| {
            GatewayError::Rpc(format!("Invalid RPC URL '{}': {}", config.rpc_url, e))
        })?;
        providers.push(Arc::new(ProviderBuilder::new().connect_http(primary_url)) as Arc<dyn Provider + Send + Sync>);

        // 2. Add failover providers
        for url_str in &config.failover_urls {
            if let Ok(url) = url_str.parse() {
                providers.push(Arc::new(ProviderBuilder::new().connect_http(url)) as Arc<dyn Provider + Send + Sync>);
            } else {
                tracing::warn!(url = %url_str, "Ignoring invalid failover RPC URL");
            }
        }

        let client = Self {
            providers,
            config: config.clone(),
            timeout_duration,
        };

        // Verify chain ID matches configuration
        match client.verify_chain_id().await {
            Ok(()) => {
                tracing::info!(
                    rpc_url = %config.rpc_url,
                    chain_id = config.chain_id,
                    "Blockchain client initialized"
                );
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    "Blockchain client initialized but chain verification failed"
                );
            }
        }

        Ok(client)
    }

    /// Verify the connected chain ID matches configuration.
    pub async fn verify_chain_id(&self) -> GatewayResult<()> {
        let chain_id = self.get_chain_id().await?;
        if chain_id.0 != self.config.chain_id {
            return Err(GatewayError::ChainMismatch {
                expected: self.config.chain_id,
                actual: chain_id.0,
            });
        }
        Ok(())
    }

    /// Get the chain ID from the RPC.
    pub async fn get_chain_id(&self) -> GatewayResult<ChainId> {
        let mut timed_out = false;
        for (i, provider) in self.providers.iter().enumerate() {
            let fut = provider.get_chain_id();
            match timeout(self.timeout_duration, fut).await {
                Ok(Ok(result)) => return Ok(ChainId(result)),
                Ok(Err(e)) => {
                    tracing::warn!(provider_idx = i, error = %e, "RPC error, trying next provider");
                }
                Err(_) => {
                    timed_out = true;
                    tracing::warn!(provider_idx = i, "RPC timeout, trying next provider");
                }
            }
        }
        Err(self.exhausted("chain_id", timed_out))
    }

    /// Get the latest block number.
    pub async fn get_block_number(&self) -> GatewayResult<u64> {
        let mut timed_out = false;
        for (i, provider) in self.providers.iter().enumerate() {
            let fut = provider.get_block_number();
            match timeout(self.timeout_duration, fut).await {
                Ok(Ok(result)) => return Ok(result),
                Ok(Err(e)) => tracing::warn!(provider_idx = i, error = %e, "RPC error"),
                Err(_) => {
                    timed_out = true;
                    tracing::warn!(provider_idx = i, "RPC timeout");
                }
            }
        }
        Err(self.exhausted("block_number", timed_out))
    }

    /// Get the transaction count (nonce) for an address, including
    /// transactions still in the mempool.
    pub async fn get_transaction_count(&self, address: Address) -> GatewayResult<u64> {
        let mut timed_out = false;
        for (i, provider) in self.providers.iter().enumerate() {
            let fut = provider.get_transaction_count(address).pending();
            match timeout(self.timeout_duration, fut).await {
                Ok(Ok(result)) => return Ok(result),
                Ok(Err(e)) => tracing::warn!(provider_idx = i, error = %e, "RPC error"),
                Err(_) => {
                    timed_out = true;
                    tracing::warn!(provider_idx = i, "RPC timeout");
                }
            }
        }
        Err(self.exhausted("transaction_count", timed_out))
    }

    /// Get a transaction receipt by hash.
    ///
    /// `Ok(None)` means the transaction is not mined yet (or was dropped);
    /// it is never an error.
    pub async fn get_transaction_receipt(&self, tx_hash: TxHash) -> GatewayResult<Option<ReceiptInfo>> {
        let mut timed_out = false;
        for (i, provider) in self.providers.iter().enumerate() {
            let fut = provider.get_transaction_receipt(tx_hash);
            match timeout(self.timeout_duration, fut).await {
                Ok(Ok(Some(receipt))) => {
                    // A receipt without a block number belongs to a pending block.
                    return Ok(receipt.block_number.map(|block_number| ReceiptInfo {
                        block_number,
                        success: receipt.status(),
                    }));
                }
                Ok(Ok(None)) => return Ok(None),
                Ok(Err(e)) => tracing::warn!(provider_idx = i, error = %e, "RPC error"),
                Err(_) => {
                    timed_out = true;
                    tracing::warn!(provider_idx = i, "RPC timeout");
                }
            }
        }
        Err(self.exhausted("receipt", timed_out))
    }

    /// Get current gas price in wei.
    pub async fn get_gas_price(&self) -> GatewayResult<u128> {
        let mut timed_out = false;
        for (i, provider) in self.providers.iter().enumerate() {
            let fut = provider.get_gas_price();
            match timeout(self.timeout_duration, fut).await {
                Ok(Ok(result)) => return Ok(result),
                Ok(Err(e)) => tracing::warn!(provider_idx = i, error = %e, "RPC error"),
                Err(_) => {
                    timed_out = true;
                    tracing::warn!(provider_idx = i, "RPC timeout");
                }
            }
        }
        Err(self.exhausted("gas_price", timed_out))
    }

    /// Submit a signed transaction envelope.
    ///
    /// A node-side rejection (bad nonce, insufficient funds) is returned
    /// immediately. Transport failures move on to the next provider; the
    /// envelope is already signed, so resubmitting it cannot create a
    /// second transfer.
    pub async fn send_envelope(&self, envelope: TxEnvelope) -> GatewayResult<TxHash> {
        let mut timed_out = false;
        for (i, provider) in self.providers.iter().enumerate() {
            let fut = provider.send_tx_envelope(envelope.clone());
            match timeout(self.timeout_duration, fut).await {
                Ok(Ok(pending)) => return Ok(*pending.tx_hash()),
                Ok(Err(e)) => {
                    if let Some(payload) = e.as_error_resp() {
                        return Err(GatewayError::from_rpc_message(payload.message.to_string()));
                    }
                    tracing::warn!(provider_idx = i, error = %e, "RPC error while broadcasting");
                }
                Err(_) => {
                    timed_out = true;
                    tracing::warn!(provider_idx = i, "RPC timeout while broadcasting");
                }
            }
        }
        Err(self.exhausted("send_transaction", timed_out))
    }

    fn exhausted(&self, operation: &'static str, timed_out: bool) -> GatewayError {
        metrics::record_rpc_error(operation);
        if timed_out && self.providers.len() == 1 {
            GatewayError::Timeout(self.config.rpc_timeout_secs)
        } else {
            GatewayError::Rpc(format!("All RPC providers failed ({})", operation))
        }
    }

    /// Get the configuration.
    pub fn config(&self) -> &BlockchainConfig {
        &self.config
    }
}

impl std::fmt::Debug for BlockchainClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlockchainClient")
            .field("rpc_url", &self.config.rpc_url)
            .field("failovers", &(self.providers.len() - 1))
            .field("chain_id", &self.config.chain_id)
            .field("timeout_secs", &self.config.rpc_timeout_secs)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> BlockchainConfig {
        BlockchainConfig {
            rpc_url: "http://127.0.0.1:1".to_string(),
            failover_urls: Vec::new(),
            chain_id: 31337, // Anvil default
            rpc_timeout_secs: 2,
            ..BlockchainConfig::default()
        }
    }

    #[tokio::test]
    async fn test_client_creation_tolerates_unreachable_rpc() {
        let result = BlockchainClient::new(test_config()).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_invalid_primary_url_is_rejected() {
        let mut config = test_config();
        config.rpc_url = "not a url".to_string();
        let err = BlockchainClient::new(config).await.unwrap_err();
        assert!(err.to_string().contains("Invalid RPC URL"));
    }

    #[tokio::test]
    async fn test_rpc_failover_exhausts_all_providers() {
        let mut config = test_config();
        config.failover_urls.push("http://127.0.0.1:2".to_string());

        let client = BlockchainClient::new(config).await.unwrap();
        let err = client.get_block_number().await.unwrap_err();
        assert!(err.is_transport());
        assert!(err.to_string().contains("All RPC providers failed"));
    }
}
