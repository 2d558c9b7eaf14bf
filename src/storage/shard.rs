//! Storage node selection by shard coverage.
//!
//! A node with `(num_shard, shard_id)` stores every segment whose index is
//! congruent to `shard_id` modulo `num_shard`. A selection is complete when each
//! residue modulo the largest `num_shard` is stored by at least `replica` nodes.

use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::storage::types::{ShardConfig, ShardedNode};

/// Ordering applied to candidates before greedy selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SelectMethod {
    /// Prefer nodes with the fewest shards (largest coverage) first.
    #[default]
    Min,
    /// Shuffle candidates to spread load.
    Random,
}

/// Pick nodes that cover every shard `replica` times, or `None` if impossible.
pub fn select(
    mut nodes: Vec<ShardedNode>,
    replica: usize,
    method: SelectMethod,
) -> Option<Vec<ShardedNode>> {
    nodes.retain(|n| is_valid(&n.config));
    if nodes.is_empty() || replica == 0 {
        return None;
    }

    match method {
        SelectMethod::Min => nodes.sort_by_key(|n| (n.config.num_shard, n.config.shard_id)),
        SelectMethod::Random => nodes.shuffle(&mut rand::thread_rng()),
    }

    let modulus = nodes.iter().map(|n| n.config.num_shard).max()? as usize;
    let mut coverage = vec![0usize; modulus];
    let mut selected = Vec::new();

    for node in nodes {
        let residues: Vec<usize> = residues(&node.config, modulus).collect();
        if residues.iter().all(|r| coverage[*r] >= replica) {
            continue;
        }
        for r in residues {
            coverage[r] += 1;
        }
        selected.push(node);

        if coverage.iter().all(|c| *c >= replica) {
            return Some(selected);
        }
    }

    None
}

/// Whether `shards` together store every segment at least `replica` times.
///
/// Invalid configurations contribute nothing.
pub fn covers(shards: &[ShardConfig], replica: usize) -> bool {
    let valid: Vec<&ShardConfig> = shards.iter().filter(|s| is_valid(s)).collect();
    let Some(modulus) = valid.iter().map(|s| s.num_shard as usize).max() else {
        return false;
    };
    if replica == 0 {
        return false;
    }

    let mut coverage = vec![0usize; modulus];
    for shard in valid {
        for r in residues(shard, modulus) {
            coverage[r] += 1;
        }
    }
    coverage.iter().all(|c| *c >= replica)
}

fn is_valid(shard: &ShardConfig) -> bool {
    shard.num_shard.is_power_of_two() && shard.shard_id < shard.num_shard
}

/// Residues modulo `modulus` that `shard` stores.
fn residues(shard: &ShardConfig, modulus: usize) -> impl Iterator<Item = usize> {
    (shard.shard_id as usize..modulus).step_by(shard.num_shard as usize)
}
