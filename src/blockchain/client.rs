//! Blockchain RPC client with timeout and error handling.
//!
//! # Responsibilities
//! - Connect to the EVM JSON-RPC endpoint with the signing wallet attached
//! - Query chain state (chain ID, balance)
//! - Bound every call with the configured timeout

use std::time::Duration;

use alloy::primitives::{Address, U256};
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use tokio::time::timeout;

use crate::blockchain::types::{BlockchainError, BlockchainResult, ChainId};
use crate::blockchain::wallet::Wallet;
use crate::storage::rpc::parse_endpoint;

/// Signing RPC client for the execution layer.
#[derive(Clone)]
pub struct ChainClient {
    provider: DynProvider,
    rpc_url: String,
    expected_chain_id: Option<u64>,
    timeout_duration: Duration,
    address: Address,
}

impl ChainClient {
    /// Create a new client. No network traffic happens here; only the URL is checked.
    pub fn new(
        rpc_url: &str,
        wallet: &Wallet,
        expected_chain_id: Option<u64>,
        timeout_secs: u64,
    ) -> BlockchainResult<Self> {
        let url = parse_endpoint(rpc_url).map_err(|e| BlockchainError::Rpc(e.to_string()))?;

        let provider = ProviderBuilder::new()
            .wallet(wallet.ethereum_wallet())
            .connect_http(url)
            .erased();

        tracing::debug!(rpc_url = %rpc_url, "Chain client initialized");

        Ok(Self {
            provider,
            rpc_url: rpc_url.to_string(),
            expected_chain_id,
            timeout_duration: Duration::from_secs(timeout_secs),
            address: wallet.address(),
        })
    }

    /// Get the chain ID from the RPC.
    pub async fn get_chain_id(&self) -> BlockchainResult<ChainId> {
        match timeout(self.timeout_duration, self.provider.get_chain_id()).await {
            Ok(Ok(id)) => Ok(ChainId(id)),
            Ok(Err(e)) => Err(BlockchainError::Rpc(e.to_string())),
            Err(_) => Err(BlockchainError::Timeout(self.timeout_duration.as_secs())),
        }
    }

    /// Verify the connected chain ID matches configuration, if one was configured.
    pub async fn verify_chain_id(&self) -> BlockchainResult<()> {
        let Some(expected) = self.expected_chain_id else {
            return Ok(());
        };
        let actual = self.get_chain_id().await?;
        if actual.0 != expected {
            return Err(BlockchainError::ChainMismatch {
                expected,
                actual: actual.0,
            });
        }
        Ok(())
    }

    /// Get the balance of the signing wallet.
    pub async fn wallet_balance(&self) -> BlockchainResult<U256> {
        match timeout(self.timeout_duration, self.provider.get_balance(self.address)).await {
            Ok(Ok(balance)) => Ok(balance),
            Ok(Err(e)) => Err(BlockchainError::Rpc(e.to_string())),
            Err(_) => Err(BlockchainError::Timeout(self.timeout_duration.as_secs())),
        }
    }

    /// Log chain and balance details; failures are reported but not fatal.
    pub async fn preflight(&self) {
        match self.verify_chain_id().await {
            Ok(()) => {}
            Err(e) => tracing::warn!(error = %e, "Chain verification failed"),
        }
        match self.wallet_balance().await {
            Ok(balance) if balance.is_zero() => {
                tracing::warn!(address = %self.address, "Wallet has no balance to pay storage fees")
            }
            Ok(balance) => {
                tracing::info!(address = %self.address, balance = %balance, "Wallet balance")
            }
            Err(e) => tracing::warn!(error = %e, "Could not query wallet balance"),
        }
    }

    /// Get the underlying provider.
    pub fn provider(&self) -> &DynProvider {
        &self.provider
    }

    pub fn timeout_duration(&self) -> Duration {
        self.timeout_duration
    }
}

impl std::fmt::Debug for ChainClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChainClient")
            .field("rpc_url", &self.rpc_url)
            .field("chain_id", &self.expected_chain_id)
            .field("timeout_secs", &self.timeout_duration.as_secs())
            .field("address", &self.address)
            .finish()
    }
}
