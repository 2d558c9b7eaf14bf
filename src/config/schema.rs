//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the uploader.
//! All types derive Serde traits for deserialization from config files, and
//! every field has a default so an empty file (or no file) is valid.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::storage::SelectMethod;

/// Official 0G testnet EVM endpoint.
pub const DEFAULT_EVM_RPC_URL: &str = "https://evmrpc-testnet.0g.ai/";
/// Official 0G testnet indexer endpoint.
pub const DEFAULT_INDEXER_URL: &str = "https://indexer-storage-testnet-turbo.0g.ai";
/// Public 0G testnet storage node.
pub const DEFAULT_STORAGE_NODE_URL: &str = "https://rpc-storage-testnet.0g.ai";

/// Root configuration for the uploader.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct UploaderConfig {
    /// Endpoints and how storage nodes are found.
    pub network: NetworkConfig,

    /// Upload behaviour and the overall deadline.
    pub upload: UploadConfig,

    /// The fixed payload uploaded by `base-uri`.
    pub payload: PayloadConfig,

    /// Logging settings.
    pub observability: ObservabilityConfig,
}

/// How storage nodes are reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionMode {
    /// Ask the indexer for nodes covering every shard.
    #[default]
    Indexer,
    /// Talk to the configured storage node URLs directly.
    Node,
}

/// Network endpoint configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct NetworkConfig {
    pub mode: ConnectionMode,

    /// EVM JSON-RPC endpoint used to submit the flow log entry.
    pub evm_rpc_url: String,

    /// Indexer JSON-RPC endpoint (indexer mode).
    pub indexer_url: String,

    /// Storage node JSON-RPC endpoints (node mode).
    pub storage_nodes: Vec<String>,

    /// Expected chain ID; a mismatch is logged, not fatal.
    pub chain_id: Option<u64>,

    /// Flow contract address; taken from the storage node status when unset.
    pub flow_address: Option<String>,

    /// Base URL of the HTTP gateway used in the printed download link.
    pub gateway_url: String,

    /// Per-request JSON-RPC timeout in seconds.
    pub rpc_timeout_secs: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            mode: ConnectionMode::Indexer,
            evm_rpc_url: DEFAULT_EVM_RPC_URL.to_string(),
            indexer_url: DEFAULT_INDEXER_URL.to_string(),
            storage_nodes: vec![DEFAULT_STORAGE_NODE_URL.to_string()],
            chain_id: None,
            flow_address: None,
            gateway_url: DEFAULT_INDEXER_URL.to_string(),
            rpc_timeout_secs: 10,
        }
    }
}

/// Upload behaviour.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UploadConfig {
    /// Deadline for the whole network phase in seconds.
    pub timeout_secs: u64,

    /// How many nodes must store each segment (indexer mode).
    pub expected_replica: usize,

    /// Candidate ordering for node selection.
    pub selection: SelectMethod,

    /// Segments sent per `zgs_uploadSegments` call.
    pub segments_per_request: usize,

    /// Interval between file info polls in milliseconds.
    pub poll_interval_ms: u64,

    /// Return early if the network already has a finalized copy.
    pub skip_if_finalized: bool,

    /// Wait until every node reports the file finalized.
    pub wait_for_finality: bool,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 60,
            expected_replica: 1,
            selection: SelectMethod::Min,
            segments_per_request: 10,
            poll_interval_ms: 1000,
            skip_if_finalized: true,
            wait_for_finality: true,
        }
    }
}

/// The fixed test payload.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PayloadConfig {
    /// File name the payload is uploaded (and optionally staged) under.
    pub file_name: String,

    /// Payload text.
    pub content: String,

    /// Write the payload to disk before uploading; the file is removed afterwards.
    pub stage_on_disk: bool,

    /// Directory for the staged file (current directory when unset).
    pub staging_dir: Option<String>,
}

impl Default for PayloadConfig {
    fn default() -> Self {
        Self {
            file_name: "placeholder_for_baseuri.txt".to_string(),
            content: "This is a temporary file created to get the base URI.".to_string(),
            stage_on_disk: false,
            staging_dir: None,
        }
    }
}

impl PayloadConfig {
    /// Where the staged file goes: `staging_dir`, else the working directory.
    pub fn staging_dir(&self) -> PathBuf {
        self.staging_dir
            .as_deref()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error); `RUST_LOG` takes precedence.
    pub log_level: String,

    pub log_format: LogFormat,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
        }
    }
}
