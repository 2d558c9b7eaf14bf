//! 0G Storage client subsystem.
//!
//! # Data Flow
//! ```text
//! payload bytes
//!     → layout.rs (chunks, segments, padding, flow submission)
//!     → merkle.rs (segment roots → file root, per-segment proofs)
//!     → indexer.rs + shard.rs (discover and pick storage nodes)
//!     → node.rs over rpc.rs (zgs_* JSON-RPC)
//!     → uploader.rs (submit, sync, upload, finalize)
//! ```

pub mod indexer;
pub mod layout;
pub mod merkle;
pub mod node;
pub mod rpc;
pub mod shard;
pub mod types;
pub mod uploader;

pub use indexer::IndexerClient;
pub use layout::FileData;
pub use node::StorageNode;
pub use shard::SelectMethod;
pub use uploader::{LogSubmitter, UploadError, UploadOptions, UploadOutcome, UploadTarget, Uploader};
