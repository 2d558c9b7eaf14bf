//! Command execution.
//!
//! # Phases
//! ```text
//! config + PRIVATE_KEY        → Configuration errors (no network)
//! wallet + chain/storage clients → ClientInit errors (no network)
//! connect, submit, upload     → bounded by upload.timeout_secs, cancelled by Ctrl-C
//! report                      → stdout
//! ```

use std::future::Future;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use alloy::primitives::Address;

use crate::blockchain::{ChainClient, FlowSubmitter, Wallet};
use crate::cli::{Cli, Command};
use crate::config::loader::{load_layered, process_env, read_private_key, CONFIG_PATH_ENV_VAR};
use crate::config::{
    ConnectionMode, NetworkConfig, ObservabilityConfig, UploadConfig, UploaderConfig,
};
use crate::error::AppError;
use crate::observability::init_logging;
use crate::payload::Payload;
use crate::report;
use crate::storage::shard;
use crate::storage::types::ShardConfig;
use crate::storage::{
    FileData, IndexerClient, StorageNode, UploadError, UploadOptions, UploadOutcome, UploadTarget,
    Uploader,
};

/// Run the selected command to completion.
pub async fn run(cli: Cli) -> Result<(), AppError> {
    let config_path = cli
        .config
        .clone()
        .or_else(|| process_env(CONFIG_PATH_ENV_VAR).map(PathBuf::from));

    let config = match load_layered(config_path.as_deref(), process_env, |c| cli.apply(c)) {
        Ok(config) => config,
        Err(e) => {
            init_logging(&ObservabilityConfig::default());
            return Err(e.into());
        }
    };
    init_logging(&config.observability);

    tracing::debug!(
        mode = ?config.network.mode,
        evm_rpc = %config.network.evm_rpc_url,
        "Configuration loaded"
    );

    let stdout = std::io::stdout();
    match cli.selected_command() {
        Command::Root { file } => {
            let payload = match &file {
                Some(path) => read_payload(path)?,
                None => Payload::from_config(&config.payload),
            };
            let root = payload.file_data()?.merkle_tree()?.root();
            report::write_root(&mut stdout.lock(), root, file.as_deref()).map_err(AppError::Output)
        }
        Command::Upload { file } => {
            let payload = read_payload(&file)?;
            let outcome = upload_payload(&config, &payload, false).await?;
            report::write_root(&mut stdout.lock(), outcome.root, Some(&file))
                .map_err(AppError::Output)
        }
        Command::BaseUri { .. } => {
            let payload = Payload::from_config(&config.payload);
            let outcome = upload_payload(&config, &payload, config.payload.stage_on_disk).await?;
            let mut out = stdout.lock();
            report::write_base_uri(&mut out, &outcome, &config.network.gateway_url)
                .and_then(|()| out.flush())
                .map_err(AppError::Output)
        }
    }
}

fn read_payload(path: &Path) -> Result<Payload, AppError> {
    Payload::from_file(path).map_err(|source| AppError::Payload {
        path: path.to_path_buf(),
        source,
    })
}

/// Upload `payload` with the key from the environment.
///
/// When `stage` is set the bytes are written to a scoped file and read back;
/// the file is gone by the time this returns, on every path.
pub async fn upload_payload(
    config: &UploaderConfig,
    payload: &Payload,
    stage: bool,
) -> Result<UploadOutcome, AppError> {
    let key = read_private_key(process_env)?;
    let wallet = Wallet::from_private_key(&key)?.with_chain_id(config.network.chain_id);
    drop(key);

    let rpc_timeout = Duration::from_secs(config.network.rpc_timeout_secs);
    let chain = ChainClient::new(
        &config.network.evm_rpc_url,
        &wallet,
        config.network.chain_id,
        config.network.rpc_timeout_secs,
    )?;
    let endpoints = StorageEndpoints::from_config(&config.network, rpc_timeout)?;
    let flow_address = configured_flow_address(&config.network)?;

    let staged = if stage {
        let dir = config.payload.staging_dir();
        let file = payload.stage(&dir).map_err(|source| AppError::Payload {
            path: dir.join(payload.file_name()),
            source,
        })?;
        Some(file)
    } else {
        None
    };

    let data = match &staged {
        Some(file) => {
            let bytes = file.read().map_err(|source| AppError::Payload {
                path: file.path().to_path_buf(),
                source,
            })?;
            FileData::from_bytes(bytes)?
        }
        None => payload.file_data()?,
    };

    tracing::info!(
        file = payload.file_name(),
        size = data.size(),
        address = %wallet.address(),
        "Uploading to 0G Storage"
    );

    let deadline = config.upload.timeout_secs;
    let work = async {
        chain.preflight().await;
        let targets = endpoints.connect(&config.upload, rpc_timeout).await?;
        let flow_address = match flow_address {
            Some(address) => address,
            None => {
                let first = targets.first().ok_or(UploadError::NoTargets)?;
                discover_flow_address(&first.node).await?
            }
        };
        let submitter = FlowSubmitter::new(chain, flow_address);
        let uploader = Uploader::new(targets, submitter, UploadOptions::from(&config.upload))?;
        let outcome = uploader.upload(&data).await?;
        Ok::<_, AppError>(outcome)
    };

    let result = bounded(work, deadline, tokio::signal::ctrl_c()).await;

    drop(staged);

    if let Ok(outcome) = &result {
        tracing::info!(
            root = %outcome.root,
            tx_seq = ?outcome.tx_seq,
            segments = outcome.segments_sent,
            already_stored = outcome.already_stored,
            "Upload complete"
        );
    }
    result
}

/// Run `work` until it finishes, `deadline_secs` pass, or `interrupt` fires.
///
/// An interrupt future that fails (no signal handler) never cancels the work.
async fn bounded<T, W, I>(work: W, deadline_secs: u64, interrupt: I) -> Result<T, AppError>
where
    W: Future<Output = Result<T, AppError>>,
    I: Future<Output = std::io::Result<()>>,
{
    tokio::select! {
        res = tokio::time::timeout(Duration::from_secs(deadline_secs), work) => match res {
            Ok(outcome) => outcome,
            Err(_) => Err(AppError::Timeout(deadline_secs)),
        },
        Ok(()) = interrupt => Err(AppError::Interrupted),
    }
}

fn configured_flow_address(network: &NetworkConfig) -> Result<Option<Address>, AppError> {
    network
        .flow_address
        .as_deref()
        .map(|raw| {
            raw.parse::<Address>()
                .map_err(|e| AppError::ClientInit(format!("invalid flow address {}: {}", raw, e)))
        })
        .transpose()
}

async fn discover_flow_address(node: &StorageNode) -> Result<Address, UploadError> {
    let status = node.status().await?;
    let identity = status.network_identity.ok_or_else(|| {
        UploadError::Submission(format!(
            "{} does not report a flow contract; set network.flow_address",
            node.url()
        ))
    })?;
    tracing::debug!(
        flow = %identity.flow_address,
        chain_id = identity.chain_id,
        "Flow contract discovered from storage node"
    );
    Ok(identity.flow_address)
}

/// Storage-side clients, built before any network traffic.
enum StorageEndpoints {
    Indexer(IndexerClient),
    Nodes(Vec<StorageNode>),
}

impl StorageEndpoints {
    fn from_config(network: &NetworkConfig, timeout: Duration) -> Result<Self, AppError> {
        let init = |e: crate::storage::rpc::RpcError| AppError::ClientInit(e.to_string());
        match network.mode {
            ConnectionMode::Indexer => Ok(Self::Indexer(
                IndexerClient::new(&network.indexer_url, timeout).map_err(init)?,
            )),
            ConnectionMode::Node => network
                .storage_nodes
                .iter()
                .map(|url| StorageNode::new(url, timeout).map_err(init))
                .collect::<Result<Vec<_>, _>>()
                .map(Self::Nodes),
        }
    }

    /// Resolve the nodes to upload to, with the shard each one stores.
    async fn connect(
        self,
        upload: &UploadConfig,
        timeout: Duration,
    ) -> Result<Vec<UploadTarget>, UploadError> {
        match self {
            Self::Indexer(indexer) => {
                let selected = indexer
                    .select_nodes(upload.expected_replica, upload.selection)
                    .await?;
                selected
                    .into_iter()
                    .map(|node| {
                        Ok(UploadTarget {
                            node: StorageNode::new(&node.url, timeout)?,
                            shard: node.config,
                        })
                    })
                    .collect()
            }
            Self::Nodes(nodes) => {
                let mut targets = Vec::with_capacity(nodes.len());
                for node in nodes {
                    let shard = node.shard_config().await?;
                    tracing::info!(
                        node = %node.url(),
                        num_shard = shard.num_shard,
                        shard_id = shard.shard_id,
                        "Using storage node"
                    );
                    targets.push(UploadTarget { node, shard });
                }
                let shards: Vec<ShardConfig> = targets.iter().map(|t| t.shard).collect();
                if !shard::covers(&shards, upload.expected_replica) {
                    return Err(UploadError::NodeSelection(format!(
                        "configured storage nodes do not store every segment {} time(s)",
                        upload.expected_replica
                    )));
                }
                Ok(targets)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[tokio::test]
    async fn test_failed_interrupt_does_not_cancel_work() {
        let interrupt = async { Err::<(), _>(io::Error::new(io::ErrorKind::Other, "no handler")) };
        let result = bounded(async { Ok::<_, AppError>(7) }, 5, interrupt).await;
        assert_eq!(result.unwrap(), 7);
    }

    #[tokio::test]
    async fn test_interrupt_cancels_pending_work() {
        let work = std::future::pending::<Result<(), AppError>>();
        let result = bounded(work, 5, async { Ok::<(), io::Error>(()) }).await;
        assert!(matches!(result, Err(AppError::Interrupted)));
    }

    #[tokio::test]
    async fn test_deadline_cancels_pending_work() {
        let work = std::future::pending::<Result<(), AppError>>();
        let interrupt = std::future::pending::<io::Result<()>>();
        let result = bounded(work, 1, interrupt).await;
        assert!(matches!(result, Err(AppError::Timeout(1))));
    }
}
