//! baseuri-uploader
//!
//! Uploads a small placeholder file to 0G Storage and reports the Merkle root
//! that identifies it, for use as an NFT contract's base URI.
//!
//! # Architecture Overview
//!
//! ```text
//!   cli ──▶ config (defaults → TOML → env → flags → validate)
//!    │
//!    ▼
//!   app ──▶ payload (fixed content, optional scoped staging file)
//!    │
//!    ├──▶ blockchain (wallet, EVM client, flow submission)
//!    │
//!    ├──▶ storage (layout → merkle → indexer/node → uploader)
//!    │
//!    ▼
//!   report (root hash and base-URI guidance on stdout)
//! ```

pub mod app;
pub mod blockchain;
pub mod cli;
pub mod config;
pub mod error;
pub mod observability;
pub mod payload;
pub mod report;
pub mod storage;

pub use config::schema::UploaderConfig;
pub use error::AppError;
pub use storage::{FileData, Uploader};
