//! Storage network wire types and upload domain types.

use alloy::primitives::{Address, B256};
use serde::{Deserialize, Serialize};

use crate::storage::merkle::Proof;

/// One power-of-two subtree of a flow submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionNode {
    pub root: B256,
    pub height: u64,
}

/// Log entry appended to the on-chain flow for a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowSubmission {
    /// File length in bytes (unpadded).
    pub length: u64,
    pub tags: Vec<u8>,
    pub nodes: Vec<SubmissionNode>,
}

/// What the chain reported for a submitted log entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitReceipt {
    pub tx_hash: B256,
    /// Flow sequence number, when the `Submit` event could be decoded.
    pub tx_seq: Option<u64>,
}

/// Response of `zgs_getStatus`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeStatus {
    #[serde(default)]
    pub connected_peers: u64,
    #[serde(default)]
    pub log_sync_height: u64,
    #[serde(default)]
    pub next_tx_seq: u64,
    #[serde(default)]
    pub network_identity: Option<NetworkIdentity>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkIdentity {
    pub chain_id: u64,
    pub flow_address: Address,
}

/// Log entry as seen by a storage node.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogTransaction {
    pub data_merkle_root: B256,
    pub start_entry_index: u64,
    pub size: u64,
    pub seq: u64,
}

/// Response of `zgs_getFileInfo`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileInfo {
    pub tx: LogTransaction,
    pub finalized: bool,
    #[serde(default)]
    pub is_cached: bool,
    #[serde(default)]
    pub uploaded_seg_num: u64,
}

/// Which slice of segments a node stores: those with `index % num_shard == shard_id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShardConfig {
    pub num_shard: u64,
    pub shard_id: u64,
}

impl Default for ShardConfig {
    fn default() -> Self {
        Self {
            num_shard: 1,
            shard_id: 0,
        }
    }
}

impl ShardConfig {
    pub fn stores(&self, segment_index: u64) -> bool {
        self.num_shard == 0 || segment_index % self.num_shard == self.shard_id
    }
}

/// Storage node advertised by the indexer.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShardedNode {
    pub url: String,
    pub config: ShardConfig,
    #[serde(default)]
    pub latency: i64,
    #[serde(default)]
    pub since: i64,
}

/// Response of `indexer_getShardedNodes`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShardedNodes {
    #[serde(default)]
    pub trusted: Vec<ShardedNode>,
    #[serde(default)]
    pub discovered: Vec<ShardedNode>,
}

/// One segment with its proof against the file root, as sent to `zgs_uploadSegments`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentWithProof {
    pub root: B256,
    #[serde(with = "base64_bytes")]
    pub data: Vec<u8>,
    pub index: u64,
    pub proof: Proof,
    pub file_size: u64,
}

mod base64_bytes {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD.decode(encoded).map_err(serde::de::Error::custom)
    }
}
