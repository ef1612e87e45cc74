//! Escrow wallet management and transaction signing.
//!
//! # Security
//! - The escrow private key is loaded ONLY from an environment variable
//! - Keys are never logged or serialized
//! - `Debug` prints the address, never the key

use alloy::network::EthereumWallet;
use alloy::primitives::Address;
use alloy::signers::local::PrivateKeySigner;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::blockchain::types::{GatewayError, GatewayResult};

/// Environment variable name for the escrow private key.
pub const PRIVATE_KEY_ENV_VAR: &str = "RELAY_ESCROW_PRIVATE_KEY";

/// Operator-controlled escrow wallet with nonce management.
#[derive(Clone)]
pub struct Wallet {
    /// The underlying signer (private key).
    signer: PrivateKeySigner,
    /// Next nonce this process intends to use.
    nonce: Arc<AtomicU64>,
    /// Chain ID for EIP-155 replay protection.
    chain_id: u64,
}

impl Wallet {
    /// Create a wallet from a hex-encoded private key string.
    ///
    /// Accepts the key with or without a `0x` prefix.
    pub fn from_private_key(private_key_hex: &str, chain_id: u64) -> GatewayResult<Self> {
        let key_hex = private_key_hex.trim();
        let key_hex = key_hex.strip_prefix("0x").unwrap_or(key_hex);

        let signer: PrivateKeySigner = key_hex
            .parse()
            .map_err(|e| GatewayError::Wallet(format!("Invalid private key format: {}", e)))?;

        tracing::info!(
            address = %signer.address(),
            chain_id = chain_id,
            "Escrow wallet initialized"
        );

        Ok(Self {
            signer,
            nonce: Arc::new(AtomicU64::new(0)),
            chain_id,
        })
    }

    /// Load wallet from environment variable.
    ///
    /// Returns `Ok(None)` when the variable is unset or empty, so the relay
    /// can still run (forwards will fail fast with a configuration error).
    pub fn from_env(chain_id: u64) -> GatewayResult<Option<Self>> {
        match std::env::var(PRIVATE_KEY_ENV_VAR) {
            Ok(key) if !key.trim().is_empty() => Self::from_private_key(&key, chain_id).map(Some),
            _ => {
                tracing::warn!(
                    var = PRIVATE_KEY_ENV_VAR,
                    "Escrow signing key not set; forwarding is disabled"
                );
                Ok(None)
            }
        }
    }

    /// Get the wallet's address.
    pub fn address(&self) -> Address {
        self.signer.address()
    }

    /// Get the chain ID this wallet is configured for.
    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    /// Reserve the next nonce, never going below what the chain reports.
    ///
    /// Consecutive forwards in one pass are broadcast before the earlier
    /// ones are mined, so the chain count alone would hand out duplicates.
    pub fn reserve_nonce(&self, chain_nonce: u64) -> u64 {
        self.nonce.fetch_max(chain_nonce, Ordering::SeqCst);
        self.nonce.fetch_add(1, Ordering::SeqCst)
    }

    /// Reset the local nonce (e.g., after a rejected broadcast).
    pub fn set_nonce(&self, nonce: u64) {
        self.nonce.store(nonce, Ordering::SeqCst);
    }

    /// Get current nonce without incrementing.
    pub fn current_nonce(&self) -> u64 {
        self.nonce.load(Ordering::SeqCst)
    }

    /// Network wallet used to sign transaction requests.
    pub fn network_wallet(&self) -> EthereumWallet {
        EthereumWallet::from(self.signer.clone())
    }
}

impl std::fmt::Debug for Wallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Wallet")
            .field("address", &self.address())
            .field("chain_id", &self.chain_id)
            .finish()
    }
}
