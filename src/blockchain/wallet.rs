//! Wallet loading and signing.
//!
//! # Security
//! - Private keys are loaded ONLY from the environment (see `config::loader`)
//! - Keys are never logged or serialized
//! - The raw hex string is never stored here; `config::loader` holds it in a
//!   zeroizing buffer that the caller drops after parsing

use alloy::network::EthereumWallet;
use alloy::primitives::Address;
use alloy::signers::local::PrivateKeySigner;
use alloy::signers::Signer;

use crate::blockchain::types::{BlockchainError, BlockchainResult};

/// Signing wallet for flow submissions.
#[derive(Debug, Clone)]
pub struct Wallet {
    signer: PrivateKeySigner,
}

impl Wallet {
    /// Create a wallet from a hex-encoded private key string.
    ///
    /// # Arguments
    /// * `private_key_hex` - Hex string (with or without 0x prefix)
    ///
    /// # Security
    /// The private key is parsed and stored securely. It is never logged.
    pub fn from_private_key(private_key_hex: &str) -> BlockchainResult<Self> {
        // Strip 0x prefix if present
        let key_hex = private_key_hex.strip_prefix("0x").unwrap_or(private_key_hex);

        let signer: PrivateKeySigner = key_hex
            .parse()
            .map_err(|e| BlockchainError::Wallet(format!("Invalid private key format: {}", e)))?;

        tracing::info!(address = %signer.address(), "Wallet initialized");

        Ok(Self { signer })
    }

    /// Bind the signer to a chain for EIP-155 replay protection.
    pub fn with_chain_id(mut self, chain_id: Option<u64>) -> Self {
        self.signer.set_chain_id(chain_id);
        self
    }

    /// Get the wallet's address.
    pub fn address(&self) -> Address {
        self.signer.address()
    }

    /// Wallet form accepted by alloy's provider builder.
    pub fn ethereum_wallet(&self) -> EthereumWallet {
        EthereumWallet::from(self.signer.clone())
    }
}
