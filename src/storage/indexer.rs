//! Indexer client: discovers storage nodes and their shard layout.

use std::time::Duration;

use crate::storage::rpc::{RpcClient, RpcError, NO_PARAMS};
use crate::storage::shard::{self, SelectMethod};
use crate::storage::types::{ShardedNode, ShardedNodes};
use crate::storage::uploader::UploadError;

#[derive(Debug)]
pub struct IndexerClient {
    rpc: RpcClient,
}

impl IndexerClient {
    pub fn new(url: &str, timeout: Duration) -> Result<Self, RpcError> {
        Ok(Self {
            rpc: RpcClient::new(url, timeout)?,
        })
    }

    pub async fn sharded_nodes(&self) -> Result<ShardedNodes, RpcError> {
        self.rpc.call("indexer_getShardedNodes", NO_PARAMS).await
    }

    /// Choose trusted nodes that together store every segment `replica` times.
    pub async fn select_nodes(
        &self,
        replica: usize,
        method: SelectMethod,
    ) -> Result<Vec<ShardedNode>, UploadError> {
        let nodes = self.sharded_nodes().await?;
        let candidates = nodes.trusted.len();

        tracing::debug!(
            trusted = candidates,
            discovered = nodes.discovered.len(),
            "Indexer returned storage nodes"
        );

        let selected = shard::select(nodes.trusted, replica, method).ok_or_else(|| {
            UploadError::NodeSelection(format!(
                "{} trusted nodes cannot cover all shards with replica {}",
                candidates, replica
            ))
        })?;

        for node in &selected {
            tracing::info!(
                node = %node.url,
                num_shard = node.config.num_shard,
                shard_id = node.config.shard_id,
                "Selected storage node"
            );
        }

        Ok(selected)
    }
}
