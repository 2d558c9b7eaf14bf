//! Keccak Merkle tree with odd-node promotion, plus inclusion proofs.
//!
//! # Construction
//! ```text
//! level 0:  h0   h1   h2   h3   h4
//! level 1:  H(h0,h1)  H(h2,h3)  h4      <- unpaired node promoted unchanged
//! level 2:  H(H01,H23)  h4
//! level 3:  H(H0123, h4)                <- root
//! ```
//!
//! Leaves are `keccak256(content)`, interior nodes are `keccak256(left || right)`.

use alloy::primitives::{keccak256, B256};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while deriving or checking Merkle hashes.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MerkleError {
    /// No data to hash (empty files have no root).
    #[error("cannot compute a Merkle root over empty data")]
    EmptyData,

    /// Leaf index outside the tree.
    #[error("leaf index {index} out of range for {leaves} leaves")]
    IndexOutOfRange { index: usize, leaves: usize },

    /// Proof shape or content does not match.
    #[error("invalid proof: {0}")]
    InvalidProof(String),
}

/// Hash a leaf's raw content.
pub fn leaf_hash(content: &[u8]) -> B256 {
    keccak256(content)
}

/// Hash two child nodes into their parent.
pub fn interior_hash(left: &B256, right: &B256) -> B256 {
    let mut buf = [0u8; 64];
    buf[..32].copy_from_slice(left.as_slice());
    buf[32..].copy_from_slice(right.as_slice());
    keccak256(buf)
}

/// A fully materialized Merkle tree, stored level by level.
#[derive(Debug, Clone)]
pub struct MerkleTree {
    /// `levels[0]` holds the leaves, the last level holds the root alone.
    levels: Vec<Vec<B256>>,
}

impl MerkleTree {
    /// Build a tree from leaf hashes that have already been computed.
    pub fn from_leaf_hashes(leaves: Vec<B256>) -> Result<Self, MerkleError> {
        if leaves.is_empty() {
            return Err(MerkleError::EmptyData);
        }

        let mut levels = vec![leaves];
        while levels.last().map_or(0, Vec::len) > 1 {
            let current = &levels[levels.len() - 1];
            let mut next = Vec::with_capacity(current.len() / 2 + 1);
            for pair in current.chunks(2) {
                match pair {
                    [left, right] => next.push(interior_hash(left, right)),
                    [single] => next.push(*single),
                    _ => unreachable!("chunks(2) yields one or two items"),
                }
            }
            levels.push(next);
        }

        Ok(Self { levels })
    }

    /// Build a tree by hashing each piece of content as a leaf.
    pub fn from_contents<'a, I>(contents: I) -> Result<Self, MerkleError>
    where
        I: IntoIterator<Item = &'a [u8]>,
    {
        Self::from_leaf_hashes(contents.into_iter().map(leaf_hash).collect())
    }

    pub fn root(&self) -> B256 {
        // Construction guarantees at least one level with exactly one node at the top.
        self.levels[self.levels.len() - 1][0]
    }

    pub fn num_leaves(&self) -> usize {
        self.levels[0].len()
    }

    /// Generate the inclusion proof for the leaf at `index`.
    pub fn proof_at(&self, index: usize) -> Result<Proof, MerkleError> {
        let leaves = self.num_leaves();
        if index >= leaves {
            return Err(MerkleError::IndexOutOfRange { index, leaves });
        }

        if leaves == 1 {
            return Ok(Proof {
                lemma: vec![self.root()],
                path: Vec::new(),
            });
        }

        let mut lemma = vec![self.levels[0][index]];
        let mut path = Vec::new();
        let mut idx = index;

        for level in &self.levels[..self.levels.len() - 1] {
            if idx % 2 == 1 {
                lemma.push(level[idx - 1]);
                path.push(false);
            } else if idx + 1 < level.len() {
                lemma.push(level[idx + 1]);
                path.push(true);
            }
            // else: promoted, nothing to record at this level
            idx /= 2;
        }

        lemma.push(self.root());
        Ok(Proof { lemma, path })
    }
}

/// Inclusion proof in the wire format storage nodes expect.
///
/// `lemma` is `[leaf, sibling_0, .., sibling_n, root]`; `path[i]` is true when
/// the running node sits on the left of `lemma[i + 1]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proof {
    pub lemma: Vec<B256>,
    pub path: Vec<bool>,
}

impl Proof {
    /// Check that this proof places `leaf` at `position` in a tree of
    /// `num_leaves` leaves whose root is `root`.
    pub fn validate(
        &self,
        root: B256,
        leaf: B256,
        position: usize,
        num_leaves: usize,
    ) -> Result<(), MerkleError> {
        self.validate_format()?;

        if self.lemma[0] != leaf {
            return Err(MerkleError::InvalidProof("leaf hash mismatch".into()));
        }
        if self.lemma[self.lemma.len() - 1] != root {
            return Err(MerkleError::InvalidProof("root hash mismatch".into()));
        }

        let computed = self.position(num_leaves)?;
        if computed != position {
            return Err(MerkleError::InvalidProof(format!(
                "proof points at position {computed}, expected {position}"
            )));
        }

        let mut hash = self.lemma[0];
        for (i, is_left) in self.path.iter().enumerate() {
            let sibling = &self.lemma[i + 1];
            hash = if *is_left {
                interior_hash(&hash, sibling)
            } else {
                interior_hash(sibling, &hash)
            };
        }

        if hash != root {
            return Err(MerkleError::InvalidProof("recomputed root mismatch".into()));
        }
        Ok(())
    }

    fn validate_format(&self) -> Result<(), MerkleError> {
        match (self.lemma.len(), self.path.len()) {
            (0, _) => Err(MerkleError::InvalidProof("empty lemma".into())),
            (1, 0) => Ok(()),
            (l, p) if l == p + 2 => Ok(()),
            (l, p) => Err(MerkleError::InvalidProof(format!(
                "lemma length {l} does not match path length {p}"
            ))),
        }
    }

    /// Recover the leaf position encoded by `path` for a tree of `num_leaves`.
    fn position(&self, num_leaves: usize) -> Result<usize, MerkleError> {
        if num_leaves == 0 {
            return Err(MerkleError::EmptyData);
        }

        // Replay the tree shape top-down: at each level decide which subtree
        // the leaf lives in, skipping levels where the node was promoted.
        let mut widths = vec![num_leaves];
        while widths[widths.len() - 1] > 1 {
            let w = widths[widths.len() - 1];
            widths.push(w.div_ceil(2));
        }

        let mut steps = self.path.iter().rev();
        let mut index = 0usize;
        for level in (0..widths.len() - 1).rev() {
            let width = widths[level];
            let left = index * 2;
            let promoted = left + 1 >= width;
            if promoted {
                index = left;
                continue;
            }
            match steps.next() {
                Some(true) => index = left,
                Some(false) => index = left + 1,
                None => {
                    return Err(MerkleError::InvalidProof("path shorter than tree".into()))
                }
            }
        }

        if steps.next().is_some() {
            return Err(MerkleError::InvalidProof("path longer than tree".into()));
        }
        Ok(index)
    }
}
