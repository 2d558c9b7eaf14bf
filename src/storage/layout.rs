//! File layout on the storage network: chunks, segments, padding and the
//! flow submission derived from them.

use alloy::primitives::{B256, U256};

use crate::storage::merkle::{MerkleError, MerkleTree};
use crate::storage::types::{FlowSubmission, SubmissionNode};

/// Smallest addressable unit of data, in bytes.
pub const CHUNK_SIZE: usize = 256;

/// Chunks per segment; a segment is the unit of upload.
pub const SEGMENT_MAX_CHUNKS: usize = 1024;

/// Segment size in bytes (256 KiB).
pub const SEGMENT_SIZE: usize = CHUNK_SIZE * SEGMENT_MAX_CHUNKS;

/// Number of `unit`-sized pieces needed to cover `total`.
pub fn num_splits(total: usize, unit: usize) -> usize {
    if total == 0 {
        return 0;
    }
    (total - 1) / unit + 1
}

/// Padded chunk count and the next power of two for `chunks`.
///
/// Files are padded so the flow can split them into a small number of
/// power-of-two subtrees: the padding granularity is 1/16th of the next power
/// of two.
pub fn compute_padded_size(chunks: usize) -> (usize, usize) {
    let next_pow2 = chunks.next_power_of_two();
    if next_pow2 == chunks {
        return (chunks, next_pow2);
    }

    let min_chunk = if next_pow2 >= 16 { next_pow2 / 16 } else { 1 };
    let padded = num_splits(chunks, min_chunk) * min_chunk;
    (padded, next_pow2)
}

/// Immutable file contents held in memory, with layout helpers.
#[derive(Debug, Clone)]
pub struct FileData {
    bytes: Vec<u8>,
}

impl FileData {
    /// Wrap bytes; empty content has no Merkle root and is rejected.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, MerkleError> {
        if bytes.is_empty() {
            return Err(MerkleError::EmptyData);
        }
        Ok(Self { bytes })
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    pub fn num_chunks(&self) -> usize {
        num_splits(self.size(), CHUNK_SIZE)
    }

    /// Segments that carry real data (the ones that get uploaded).
    pub fn num_segments(&self) -> usize {
        num_splits(self.size(), SEGMENT_SIZE)
    }

    pub fn padded_chunks(&self) -> usize {
        compute_padded_size(self.num_chunks()).0
    }

    pub fn padded_size(&self) -> usize {
        self.padded_chunks() * CHUNK_SIZE
    }

    /// Segments of the padded data; the leaf count of the file tree.
    pub fn num_padded_segments(&self) -> usize {
        num_splits(self.padded_size(), SEGMENT_SIZE)
    }

    /// Copy `len` bytes starting at `offset`, zero-filling past the end of the file.
    fn read_padded(&self, offset: usize, len: usize) -> Vec<u8> {
        let mut buf = vec![0u8; len];
        if offset < self.bytes.len() {
            let end = (offset + len).min(self.bytes.len());
            buf[..end - offset].copy_from_slice(&self.bytes[offset..end]);
        }
        buf
    }

    /// Segment payload as uploaded: real chunks only, last chunk zero-padded.
    pub fn segment(&self, index: usize) -> Option<Vec<u8>> {
        let start_chunk = index * SEGMENT_MAX_CHUNKS;
        let num_chunks = self.num_chunks();
        if start_chunk >= num_chunks {
            return None;
        }
        let chunks = (num_chunks - start_chunk).min(SEGMENT_MAX_CHUNKS);
        Some(self.read_padded(start_chunk * CHUNK_SIZE, chunks * CHUNK_SIZE))
    }

    /// Merkle tree whose leaves are the segment roots of the padded data.
    pub fn merkle_tree(&self) -> Result<MerkleTree, MerkleError> {
        let padded_size = self.padded_size();
        let mut roots = Vec::with_capacity(self.num_padded_segments());
        let mut offset = 0;
        while offset < padded_size {
            let len = SEGMENT_SIZE.min(padded_size - offset);
            roots.push(segment_root(&self.read_padded(offset, len))?);
            offset += len;
        }
        MerkleTree::from_leaf_hashes(roots)
    }

    /// Flow log entry describing this file.
    pub fn submission(&self) -> Result<FlowSubmission, MerkleError> {
        let mut nodes = Vec::new();
        let mut offset = 0;
        for chunks in split_nodes(self.num_chunks()) {
            nodes.push(self.submission_node(offset, chunks)?);
            offset += chunks * CHUNK_SIZE;
        }

        Ok(FlowSubmission {
            length: self.size() as u64,
            tags: Vec::new(),
            nodes,
        })
    }

    fn submission_node(&self, offset: usize, chunks: usize) -> Result<SubmissionNode, MerkleError> {
        let batch = chunks.min(SEGMENT_MAX_CHUNKS) * CHUNK_SIZE;
        let end = offset + chunks * CHUNK_SIZE;

        let mut roots = Vec::new();
        let mut cursor = offset;
        while cursor < end {
            roots.push(segment_root(&self.read_padded(cursor, batch))?);
            cursor += batch;
        }

        Ok(SubmissionNode {
            root: MerkleTree::from_leaf_hashes(roots)?.root(),
            height: chunks.trailing_zeros() as u64,
        })
    }
}

/// Root of the tree over the chunks of one segment.
pub fn segment_root(segment: &[u8]) -> Result<B256, MerkleError> {
    Ok(MerkleTree::from_contents(segment.chunks(CHUNK_SIZE))?.root())
}

/// Split the padded chunk range into descending power-of-two subtrees.
pub fn split_nodes(chunks: usize) -> Vec<usize> {
    let (mut padded, mut next) = compute_padded_size(chunks);
    let mut nodes = Vec::new();
    while padded > 0 && next > 0 {
        if padded >= next {
            padded -= next;
            nodes.push(next);
        }
        next /= 2;
    }
    nodes
}

impl FlowSubmission {
    /// Storage fee: one price unit per sector (chunk) covered by the nodes.
    pub fn fee(&self, price_per_sector: U256) -> U256 {
        let sectors: u64 = self.nodes.iter().map(|n| 1u64 << n.height).sum();
        price_per_sector * U256::from(sectors)
    }
}
