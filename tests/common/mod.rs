//! Shared utilities for integration testing: an in-process storage network.
//!
//! `Ledger` plays the flow contract, `MockNode` a zgs storage node and
//! `start_indexer` the indexer. All speak JSON-RPC over axum on 127.0.0.1.

#![allow(dead_code)]

use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use alloy::primitives::{Address, B256};
use async_trait::async_trait;
use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio::net::TcpListener;

use baseuri_uploader::storage::layout::{
    compute_padded_size, num_splits, segment_root, CHUNK_SIZE, SEGMENT_MAX_CHUNKS, SEGMENT_SIZE,
};
use baseuri_uploader::storage::types::{
    FlowSubmission, SegmentWithProof, ShardConfig, ShardedNode, SubmitReceipt,
};
use baseuri_uploader::storage::{
    FileData, LogSubmitter, StorageNode, UploadError, UploadOptions, UploadTarget,
};

pub const FLOW_ADDRESS: Address = Address::new([0x0f; 20]);

struct LogEntry {
    seq: u64,
    start_entry_index: u64,
    size: u64,
}

/// The on-chain flow as the mock network sees it.
#[derive(Default)]
pub struct Ledger {
    tracked: Vec<(B256, FlowSubmission)>,
    entries: HashMap<B256, LogEntry>,
    next_entry_index: u64,
}

pub type SharedLedger = Arc<Mutex<Ledger>>;

impl Ledger {
    pub fn shared() -> SharedLedger {
        Arc::new(Mutex::new(Ledger::default()))
    }

    /// Let the ledger recognize `data` when its submission arrives.
    pub fn track(&mut self, data: &FileData) {
        let root = data.merkle_tree().unwrap().root();
        self.tracked.push((root, data.submission().unwrap()));
    }

    /// Start the next entry at a chosen flow position, to exercise shard offsets.
    pub fn set_next_entry_index(&mut self, index: u64) {
        self.next_entry_index = index;
    }

    /// Put `data` on the flow directly, as if another client had submitted it.
    pub fn record(&mut self, data: &FileData) -> B256 {
        self.track(data);
        let root = data.merkle_tree().unwrap().root();
        self.append(&data.submission().unwrap()).unwrap();
        root
    }

    fn append(&mut self, submission: &FlowSubmission) -> Option<u64> {
        let root = self
            .tracked
            .iter()
            .find(|(_, tracked)| tracked == submission)
            .map(|(root, _)| *root)?;

        let seq = self.entries.len() as u64;
        let chunks = num_splits(submission.length as usize, CHUNK_SIZE);
        let (padded, _) = compute_padded_size(chunks);
        let start_entry_index = self.next_entry_index;
        let segments = num_splits(padded, SEGMENT_MAX_CHUNKS);
        self.next_entry_index += (segments * SEGMENT_MAX_CHUNKS) as u64;

        self.entries.insert(
            root,
            LogEntry {
                seq,
                start_entry_index,
                size: submission.length,
            },
        );
        Some(seq)
    }
}

/// Log submitter that appends to the mock ledger instead of a chain.
pub struct MockSubmitter {
    ledger: SharedLedger,
    calls: Arc<AtomicUsize>,
}

impl MockSubmitter {
    pub fn new(ledger: SharedLedger) -> Self {
        Self {
            ledger,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn calls(&self) -> Arc<AtomicUsize> {
        self.calls.clone()
    }
}

#[async_trait]
impl LogSubmitter for MockSubmitter {
    async fn submit(&self, submission: &FlowSubmission) -> Result<SubmitReceipt, UploadError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let seq = self
            .ledger
            .lock()
            .unwrap()
            .append(submission)
            .ok_or_else(|| UploadError::Submission("unknown submission".into()))?;
        Ok(SubmitReceipt {
            tx_hash: B256::with_last_byte(seq as u8 + 1),
            tx_seq: Some(seq),
        })
    }
}

/// One storage node's view: its shard and the segments it has accepted.
pub struct MockNode {
    ledger: SharedLedger,
    shard: ShardConfig,
    received: Mutex<HashMap<B256, BTreeSet<u64>>>,
    requests: AtomicUsize,
    /// `zgs_getFileInfo` answers null this many more times, as if not yet synced.
    lagging_polls: AtomicUsize,
    /// `zgs_getFileInfo` never answers.
    stalled: AtomicBool,
}

impl MockNode {
    pub fn lag_file_info(&self, polls: usize) {
        self.lagging_polls.store(polls, Ordering::SeqCst);
    }

    pub fn stall_file_info(&self) {
        self.stalled.store(true, Ordering::SeqCst);
    }

    /// Mark every segment of `data` this node stores as already received.
    pub fn hold(&self, data: &FileData) {
        let root = data.merkle_tree().unwrap().root();
        let ledger = self.ledger.lock().unwrap();
        let entry = ledger.entries.get(&root).unwrap();
        let expected = self.expected_segments(entry);
        self.received.lock().unwrap().entry(root).or_default().extend(expected);
    }

    pub fn received(&self, root: B256) -> Vec<u64> {
        self.received
            .lock()
            .unwrap()
            .get(&root)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    fn file_info(&self, root: B256) -> Value {
        let lagging = self
            .lagging_polls
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if lagging {
            return Value::Null;
        }

        let ledger = self.ledger.lock().unwrap();
        let Some(entry) = ledger.entries.get(&root) else {
            return Value::Null;
        };
        let received = self.received.lock().unwrap();
        let have = received.get(&root).map(BTreeSet::len).unwrap_or(0);
        let finalized = self
            .expected_segments(entry)
            .iter()
            .all(|i| received.get(&root).is_some_and(|set| set.contains(i)));

        json!({
            "tx": {
                "dataMerkleRoot": root,
                "startEntryIndex": entry.start_entry_index,
                "size": entry.size,
                "seq": entry.seq,
            },
            "finalized": finalized,
            "isCached": false,
            "uploadedSegNum": have,
        })
    }

    fn expected_segments(&self, entry: &LogEntry) -> Vec<u64> {
        let start = entry.start_entry_index / SEGMENT_MAX_CHUNKS as u64;
        let segments = num_splits(entry.size as usize, SEGMENT_SIZE) as u64;
        (0..segments).filter(|i| self.shard.stores(start + i)).collect()
    }

    fn upload_segments(&self, segments: Vec<SegmentWithProof>) -> Result<Value, String> {
        for segment in segments {
            let start = {
                let ledger = self.ledger.lock().unwrap();
                let entry = ledger
                    .entries
                    .get(&segment.root)
                    .ok_or_else(|| format!("no log entry for {}", segment.root))?;
                entry.start_entry_index / SEGMENT_MAX_CHUNKS as u64
            };
            if !self.shard.stores(start + segment.index) {
                return Err(format!("segment {} is not in this shard", segment.index));
            }

            verify_segment(&segment)?;
            self.received
                .lock()
                .unwrap()
                .entry(segment.root)
                .or_default()
                .insert(segment.index);
        }
        Ok(Value::Null)
    }
}

/// Check a segment's proof the way a storage node does: pad it to its slot
/// in the padded file and prove its root against the file root.
fn verify_segment(segment: &SegmentWithProof) -> Result<(), String> {
    let chunks = num_splits(segment.file_size as usize, CHUNK_SIZE);
    let (padded_chunks, _) = compute_padded_size(chunks);
    let padded_size = padded_chunks * CHUNK_SIZE;
    let num_leaves = num_splits(padded_size, SEGMENT_SIZE);

    let offset = segment.index as usize * SEGMENT_SIZE;
    if offset >= padded_size {
        return Err(format!("segment {} out of range", segment.index));
    }
    let slot = SEGMENT_SIZE.min(padded_size - offset);
    if segment.data.len() > slot || segment.data.len() % CHUNK_SIZE != 0 {
        return Err(format!("segment {} has bad length {}", segment.index, segment.data.len()));
    }

    let mut padded = segment.data.clone();
    padded.resize(slot, 0);
    let leaf = segment_root(&padded).map_err(|e| e.to_string())?;
    segment
        .proof
        .validate(segment.root, leaf, segment.index as usize, num_leaves)
        .map_err(|e| e.to_string())
}

fn reply(id: Value, result: Result<Value, String>) -> Json<Value> {
    match result {
        Ok(result) => Json(json!({ "jsonrpc": "2.0", "id": id, "result": result })),
        Err(message) => Json(json!({
            "jsonrpc": "2.0",
            "id": id,
            "error": { "code": -32000, "message": message },
        })),
    }
}

async fn node_rpc(State(node): State<Arc<MockNode>>, Json(request): Json<Value>) -> Json<Value> {
    node.requests.fetch_add(1, Ordering::SeqCst);
    let id = request["id"].clone();
    let params = &request["params"];

    let result = match request["method"].as_str().unwrap_or_default() {
        "zgs_getStatus" => Ok(json!({
            "connectedPeers": 1,
            "logSyncHeight": 100,
            "nextTxSeq": node.ledger.lock().unwrap().entries.len(),
            "networkIdentity": { "chainId": 16601, "flowAddress": FLOW_ADDRESS },
        })),
        "zgs_getShardConfig" => Ok(json!(node.shard)),
        "zgs_getFileInfo" if node.stalled.load(Ordering::SeqCst) => {
            std::future::pending::<Result<Value, String>>().await
        }
        "zgs_getFileInfo" => serde_json::from_value::<B256>(params[0].clone())
            .map(|root| node.file_info(root))
            .map_err(|e| e.to_string()),
        "zgs_uploadSegments" => serde_json::from_value::<Vec<SegmentWithProof>>(params[0].clone())
            .map_err(|e| e.to_string())
            .and_then(|segments| node.upload_segments(segments)),
        other => Err(format!("method {} not found", other)),
    };

    reply(id, result)
}

async fn serve(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

/// Start a storage node storing `shard`; returns its URL and handle.
pub async fn start_node(ledger: SharedLedger, shard: ShardConfig) -> (String, Arc<MockNode>) {
    let node = Arc::new(MockNode {
        ledger,
        shard,
        received: Mutex::new(HashMap::new()),
        requests: AtomicUsize::new(0),
        lagging_polls: AtomicUsize::new(0),
        stalled: AtomicBool::new(false),
    });
    let router = Router::new().route("/", post(node_rpc)).with_state(node.clone());
    (serve(router).await, node)
}

/// Start an indexer that advertises `nodes` as trusted.
pub async fn start_indexer(nodes: Vec<ShardedNode>) -> String {
    let nodes = Arc::new(nodes);
    let router = Router::new().route(
        "/",
        post(|State(nodes): State<Arc<Vec<ShardedNode>>>, Json(request): Json<Value>| async move {
            let id = request["id"].clone();
            let result = match request["method"].as_str() {
                Some("indexer_getShardedNodes") => {
                    Ok(json!({ "trusted": nodes.as_slice(), "discovered": [] }))
                }
                _ => Err("method not found".to_string()),
            };
            reply(id, result)
        }),
    )
    .with_state(nodes);
    serve(router).await
}

pub fn sharded(url: &str, num_shard: u64, shard_id: u64) -> ShardedNode {
    ShardedNode {
        url: url.to_string(),
        config: ShardConfig { num_shard, shard_id },
        latency: 0,
        since: 0,
    }
}

pub fn rpc_timeout() -> Duration {
    Duration::from_secs(5)
}

pub async fn target(url: &str) -> UploadTarget {
    let node = StorageNode::new(url, rpc_timeout()).unwrap();
    let shard = node.shard_config().await.unwrap();
    UploadTarget { node, shard }
}

pub fn fast_options() -> UploadOptions {
    UploadOptions {
        poll_interval: Duration::from_millis(20),
        segments_per_request: 2,
        skip_if_finalized: true,
        wait_for_finality: true,
    }
}

/// Deterministic bytes that differ from segment to segment.
pub fn patterned(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}
