//! Upload orchestration.
//!
//! # Data Flow
//! ```text
//! FileData
//!     → merkle tree (root = content identifier)
//!     → zgs_getFileInfo (already stored? skip)
//!     → LogSubmitter::submit (flow log entry on chain)
//!     → poll zgs_getFileInfo until each node has synced the entry
//!     → zgs_uploadSegments, only the segments each node's shard stores
//!     → poll until finalized
//! ```
//!
//! No step is retried; the caller bounds the whole sequence with one timeout.

use std::time::Duration;

use alloy::primitives::B256;
use async_trait::async_trait;
use thiserror::Error;
use tokio::time::sleep;

use crate::config::schema::UploadConfig;
use crate::storage::layout::{FileData, SEGMENT_MAX_CHUNKS};
use crate::storage::merkle::{MerkleError, MerkleTree};
use crate::storage::node::StorageNode;
use crate::storage::rpc::RpcError;
use crate::storage::shard;
use crate::storage::types::{
    FileInfo, FlowSubmission, SegmentWithProof, ShardConfig, SubmitReceipt,
};

/// Failures during the network phase of an upload.
#[derive(Debug, Error)]
pub enum UploadError {
    #[error(transparent)]
    Rpc(#[from] RpcError),

    #[error("node selection failed: {0}")]
    NodeSelection(String),

    #[error("log entry submission failed: {0}")]
    Submission(String),

    #[error(transparent)]
    Hash(#[from] MerkleError),

    #[error("no storage nodes to upload to")]
    NoTargets,
}

/// Appends a file's log entry to the flow. Implemented on-chain by
/// `blockchain::FlowSubmitter`; tests substitute their own.
#[async_trait]
pub trait LogSubmitter: Send + Sync {
    async fn submit(&self, submission: &FlowSubmission) -> Result<SubmitReceipt, UploadError>;
}

/// A storage node together with the shard it stores.
#[derive(Debug)]
pub struct UploadTarget {
    pub node: StorageNode,
    pub shard: ShardConfig,
}

#[derive(Debug, Clone)]
pub struct UploadOptions {
    pub poll_interval: Duration,
    pub segments_per_request: usize,
    pub skip_if_finalized: bool,
    pub wait_for_finality: bool,
}

impl Default for UploadOptions {
    fn default() -> Self {
        Self::from(&UploadConfig::default())
    }
}

impl From<&UploadConfig> for UploadOptions {
    fn from(config: &UploadConfig) -> Self {
        Self {
            poll_interval: Duration::from_millis(config.poll_interval_ms),
            segments_per_request: config.segments_per_request.max(1),
            skip_if_finalized: config.skip_if_finalized,
            wait_for_finality: config.wait_for_finality,
        }
    }
}

/// Result of a completed upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadOutcome {
    /// Merkle root of the file; the content identifier.
    pub root: B256,
    pub tx_seq: Option<u64>,
    /// The network already held a finalized copy; nothing was sent.
    pub already_stored: bool,
    pub segments_sent: usize,
}

pub struct Uploader<S> {
    targets: Vec<UploadTarget>,
    submitter: S,
    options: UploadOptions,
}

impl<S: LogSubmitter> Uploader<S> {
    pub fn new(
        targets: Vec<UploadTarget>,
        submitter: S,
        options: UploadOptions,
    ) -> Result<Self, UploadError> {
        if targets.is_empty() {
            return Err(UploadError::NoTargets);
        }
        let shards: Vec<ShardConfig> = targets.iter().map(|t| t.shard).collect();
        if !shard::covers(&shards, 1) {
            return Err(UploadError::NodeSelection(format!(
                "{} storage nodes do not store every segment between them",
                targets.len()
            )));
        }
        Ok(Self {
            targets,
            submitter,
            options,
        })
    }

    /// Upload `data` and return its root once the nodes hold it.
    pub async fn upload(&self, data: &FileData) -> Result<UploadOutcome, UploadError> {
        let tree = data.merkle_tree()?;
        let root = tree.root();

        tracing::info!(
            root = %root,
            size = data.size(),
            segments = data.num_segments(),
            nodes = self.targets.len(),
            "Starting upload"
        );

        let existing = self.find_log_entry(root).await?;
        if let Some(info) = &existing {
            if info.finalized && self.options.skip_if_finalized {
                tracing::info!(
                    root = %root,
                    tx_seq = info.tx.seq,
                    "File already stored, skipping upload"
                );
                return Ok(UploadOutcome {
                    root,
                    tx_seq: Some(info.tx.seq),
                    already_stored: true,
                    segments_sent: 0,
                });
            }
        }

        let mut tx_seq = existing.as_ref().map(|info| info.tx.seq);
        if existing.is_none() {
            let submission = data.submission()?;
            let receipt = self.submitter.submit(&submission).await?;
            tracing::info!(
                tx_hash = %receipt.tx_hash,
                tx_seq = ?receipt.tx_seq,
                "Log entry submitted"
            );
            tx_seq = receipt.tx_seq.or(tx_seq);
        }

        let mut segments_sent = 0;
        for target in &self.targets {
            let info = self.wait_for_log_entry(&target.node, root).await?;
            tx_seq = tx_seq.or(Some(info.tx.seq));
            if info.finalized && self.options.skip_if_finalized {
                tracing::debug!(node = %target.node.url(), "Node already finalized the file");
                continue;
            }
            segments_sent += self.upload_segments(target, data, &tree, &info).await?;
        }

        if self.options.wait_for_finality {
            for target in &self.targets {
                self.wait_for_finality(&target.node, root).await?;
            }
        }

        tracing::info!(root = %root, segments_sent, "Upload complete");

        Ok(UploadOutcome {
            root,
            tx_seq,
            already_stored: false,
            segments_sent,
        })
    }

    /// File info from the first target that knows `root`.
    async fn find_log_entry(&self, root: B256) -> Result<Option<FileInfo>, UploadError> {
        for target in &self.targets {
            if let Some(info) = target.node.file_info(root).await? {
                tracing::debug!(
                    node = %target.node.url(),
                    tx_seq = info.tx.seq,
                    "Log entry found"
                );
                return Ok(Some(info));
            }
        }
        Ok(None)
    }

    async fn wait_for_log_entry(
        &self,
        node: &StorageNode,
        root: B256,
    ) -> Result<FileInfo, UploadError> {
        loop {
            if let Some(info) = node.file_info(root).await? {
                return Ok(info);
            }
            tracing::debug!(node = %node.url(), root = %root, "Waiting for log entry to sync");
            sleep(self.options.poll_interval).await;
        }
    }

    async fn wait_for_finality(&self, node: &StorageNode, root: B256) -> Result<(), UploadError> {
        loop {
            match node.file_info(root).await? {
                Some(info) if info.finalized => return Ok(()),
                _ => {
                    tracing::debug!(node = %node.url(), root = %root, "Waiting for finality");
                    sleep(self.options.poll_interval).await;
                }
            }
        }
    }

    async fn upload_segments(
        &self,
        target: &UploadTarget,
        data: &FileData,
        tree: &MerkleTree,
        info: &FileInfo,
    ) -> Result<usize, UploadError> {
        let root = tree.root();
        let start_segment = info.tx.start_entry_index / SEGMENT_MAX_CHUNKS as u64;
        let per_request = self.options.segments_per_request;

        let mut batch = Vec::with_capacity(per_request);
        let mut sent = 0;

        for index in 0..data.num_segments() {
            if !target.shard.stores(start_segment + index as u64) {
                continue;
            }
            let Some(bytes) = data.segment(index) else {
                break;
            };
            batch.push(SegmentWithProof {
                root,
                data: bytes,
                index: index as u64,
                proof: tree.proof_at(index)?,
                file_size: data.size() as u64,
            });

            if batch.len() == per_request {
                sent += self.flush(&target.node, &mut batch).await?;
            }
        }
        if !batch.is_empty() {
            sent += self.flush(&target.node, &mut batch).await?;
        }

        Ok(sent)
    }

    async fn flush(
        &self,
        node: &StorageNode,
        batch: &mut Vec<SegmentWithProof>,
    ) -> Result<usize, UploadError> {
        let count = batch.len();
        node.upload_segments(batch).await?;
        tracing::debug!(
            node = %node.url(),
            first = batch.first().map(|s| s.index),
            count,
            "Uploaded segments"
        );
        batch.clear();
        Ok(count)
    }
}
