//! Blockchain integration subsystem.
//!
//! # Data Flow
//! ```text
//! PRIVATE_KEY (environment)
//!     → wallet.rs (key parsing, signer)
//!     → client.rs (EVM RPC connection with timeouts)
//!     → flow.rs (price, submit log entry, confirm)
//! ```
//!
//! # Security Constraints
//! - Private keys ONLY from environment variables
//! - Never log private keys or sensitive data
//! - All RPC calls have configurable timeouts

pub mod client;
pub mod flow;
pub mod types;
pub mod wallet;

pub use client::ChainClient;
pub use flow::FlowSubmitter;
pub use types::{BlockchainError, ChainId};
pub use wallet::Wallet;
