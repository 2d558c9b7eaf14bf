//! Storage node JSON-RPC client (`zgs_*` namespace).

use std::time::Duration;

use alloy::primitives::B256;

use crate::storage::rpc::{RpcClient, RpcError, NO_PARAMS};
use crate::storage::types::{FileInfo, NodeStatus, SegmentWithProof, ShardConfig};

/// Client for a single storage node.
#[derive(Debug)]
pub struct StorageNode {
    rpc: RpcClient,
}

impl StorageNode {
    pub fn new(url: &str, timeout: Duration) -> Result<Self, RpcError> {
        Ok(Self {
            rpc: RpcClient::new(url, timeout)?,
        })
    }

    pub fn url(&self) -> &url::Url {
        self.rpc.url()
    }

    /// Sync status and network identity (chain id, flow contract).
    pub async fn status(&self) -> Result<NodeStatus, RpcError> {
        self.rpc.call("zgs_getStatus", NO_PARAMS).await
    }

    /// File info for `root`, or `None` while the node has not seen the log entry.
    pub async fn file_info(&self, root: B256) -> Result<Option<FileInfo>, RpcError> {
        self.rpc.call("zgs_getFileInfo", (root,)).await
    }

    pub async fn shard_config(&self) -> Result<ShardConfig, RpcError> {
        self.rpc.call("zgs_getShardConfig", NO_PARAMS).await
    }

    pub async fn upload_segments(&self, segments: &[SegmentWithProof]) -> Result<(), RpcError> {
        self.rpc.call("zgs_uploadSegments", (segments,)).await
    }
}
