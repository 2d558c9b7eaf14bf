//! Command-line interface.
//!
//! Flags override the config file and environment; anything left unset keeps
//! the layered value.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::{ConnectionMode, LogFormat, UploaderConfig};
use crate::storage::SelectMethod;

#[derive(Debug, Parser)]
#[command(name = "baseuri-uploader", version)]
#[command(
    about = "Upload a placeholder file to 0G Storage and print its root hash for use as an NFT base URI",
    long_about = None
)]
pub struct Cli {
    /// TOML config file (falls back to $BASEURI_CONFIG)
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Reach storage nodes through the indexer or directly
    #[arg(long, value_enum)]
    pub mode: Option<ConnectionMode>,

    /// EVM JSON-RPC endpoint
    #[arg(long, value_name = "URL")]
    pub rpc_url: Option<String>,

    #[arg(long, value_name = "URL")]
    pub indexer_url: Option<String>,

    /// Storage node URL for node mode; repeat for several nodes
    #[arg(long = "node", value_name = "URL")]
    pub nodes: Vec<String>,

    /// How the indexer's candidate nodes are ordered before selection
    #[arg(long, value_enum)]
    pub selection: Option<SelectMethod>,

    /// Deadline for the whole network phase
    #[arg(long, value_name = "SECS")]
    pub timeout_secs: Option<u64>,

    #[arg(long, value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Emit logs as JSON lines on stderr
    #[arg(long)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Upload the placeholder payload and print the base-URI banner (default)
    BaseUri {
        /// Stage the payload in a temporary file that is removed afterwards
        #[arg(long)]
        temp_file: bool,
    },
    /// Upload a local file and print its root hash
    Upload { file: PathBuf },
    /// Compute a root hash locally without a key or network access
    Root { file: Option<PathBuf> },
}

impl Cli {
    pub fn selected_command(&self) -> Command {
        self.command
            .clone()
            .unwrap_or(Command::BaseUri { temp_file: false })
    }

    /// Write every flag that was given into `config`.
    pub fn apply(&self, config: &mut UploaderConfig) {
        if let Some(mode) = self.mode {
            config.network.mode = mode;
        }
        if let Some(url) = &self.rpc_url {
            config.network.evm_rpc_url = url.clone();
        }
        if let Some(url) = &self.indexer_url {
            config.network.indexer_url = url.clone();
        }
        if !self.nodes.is_empty() {
            config.network.storage_nodes = self.nodes.clone();
        }
        if let Some(selection) = self.selection {
            config.upload.selection = selection;
        }
        if let Some(secs) = self.timeout_secs {
            config.upload.timeout_secs = secs;
        }
        if let Some(level) = &self.log_level {
            config.observability.log_level = level.clone();
        }
        if self.json_logs {
            config.observability.log_format = LogFormat::Json;
        }
        if let Some(Command::BaseUri { temp_file: true }) = &self.command {
            config.payload.stage_on_disk = true;
        }
    }
}
