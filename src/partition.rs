//! Corpus partitioning.
//!
//! Splits a corpus into a fixed number of near-equal shards so that
//! independent workers can each take one shard. The split is contiguous
//! and deterministic: with `n` documents and `k` shards, the first
//! `n % k` shards receive `n / k + 1` documents and the rest receive
//! `n / k`, preserving corpus row order within each shard.

use log::info;

use crate::data::Document;
use crate::error::{ArnicaError, Result};
use crate::shard::{ShardManifest, ShardStore};

/// Splits a corpus into shards and writes them to a [`ShardStore`].
#[derive(Debug)]
pub struct Partitioner {
    store: ShardStore,
    shard_count: usize,
}

impl Partitioner {
    pub fn new(store: ShardStore, shard_count: usize) -> Result<Self> {
        if shard_count == 0 {
            return Err(ArnicaError::invalid_config("shard count must be at least 1"));
        }
        Ok(Self { store, shard_count })
    }

    /// Partition `documents` into exactly `shard_count` shards under
    /// `collection` and write each one, plus the collection manifest.
    ///
    /// An empty corpus produces `shard_count` empty shards rather than an
    /// error, so downstream tooling sees a uniform layout.
    pub fn partition(&self, collection: &str, documents: &[Document]) -> Result<ShardManifest> {
        let sizes = split_sizes(documents.len(), self.shard_count);

        let mut offset = 0;
        for (index, &size) in sizes.iter().enumerate() {
            let shard = &documents[offset..offset + size];
            self.store.write_shard(collection, index, shard)?;
            info!(
                "wrote shard {index} of collection {collection}: {size} documents"
            );
            offset += size;
        }

        let manifest = ShardManifest {
            collection: collection.to_string(),
            shard_count: self.shard_count,
            shard_sizes: sizes,
            created_at: chrono::Utc::now(),
        };
        self.store.write_manifest(&manifest)?;
        info!(
            "partitioned collection {collection}: {} documents into {} shards",
            manifest.total_documents(),
            manifest.shard_count
        );
        Ok(manifest)
    }
}

/// Shard sizes for `n` documents over `k` shards: the first `n % k` shards
/// get one extra document. Sizes always differ by at most one and sum to
/// `n`.
fn split_sizes(n: usize, k: usize) -> Vec<usize> {
    let base = n / k;
    let extra = n % k;
    (0..k).map(|i| base + usize::from(i < extra)).collect()
}
