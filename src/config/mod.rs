//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! defaults (schema.rs)
//!     → config file, TOML (loader.rs)
//!     → environment overrides: RPC_URL, INDEXER_URL, STORAGE_NODE_URL (loader.rs)
//!     → CLI flags (cli.rs)
//!     → validation.rs (semantic checks)
//!     → UploaderConfig (validated, immutable)
//! ```
//!
//! # Design Decisions
//! - All fields have defaults; no file is needed to run against testnet
//! - The private key is read from the environment only, never from a file
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::ConfigError;
pub use schema::{
    ConnectionMode, LogFormat, NetworkConfig, ObservabilityConfig, PayloadConfig, UploadConfig,
    UploaderConfig,
};
