//! Shard dispatch.
//!
//! The thin entry point binding a shard identifier to its input shard file
//! and output snapshot pair. A malformed identifier or an unreadable shard
//! is reported immediately as an error; there is no partial retry at this
//! layer. Orchestrators map a returned error to a non-zero exit and
//! reschedule the whole shard.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use log::info;

use crate::error::{ArnicaError, Result};
use crate::oracle::ScoringOracle;
use crate::runner::{RunReport, RunnerConfig, ShardRunner};
use crate::segment::SegmenterConfig;
use crate::shard::ShardStore;
use crate::storage::Storage;

/// Identifies one shard: a human-readable collection name plus a
/// zero-based shard index, written `{collection}/{index}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ShardId {
    pub collection: String,
    pub index: usize,
}

impl ShardId {
    pub fn new(collection: impl Into<String>, index: usize) -> Self {
        Self {
            collection: collection.into(),
            index,
        }
    }
}

impl FromStr for ShardId {
    type Err = ArnicaError;

    fn from_str(s: &str) -> Result<Self> {
        let (collection, index) = s.rsplit_once('/').ok_or_else(|| {
            ArnicaError::invalid_config(format!(
                "shard identifier must look like collection/index, got {s:?}"
            ))
        })?;
        if collection.is_empty() {
            return Err(ArnicaError::invalid_config(
                "shard identifier has an empty collection name",
            ));
        }
        let index = index.parse().map_err(|_| {
            ArnicaError::invalid_config(format!(
                "shard identifier has a non-numeric index: {s:?}"
            ))
        })?;
        Ok(Self::new(collection, index))
    }
}

impl fmt::Display for ShardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.collection, self.index)
    }
}

/// Runs shards against a shard store and a result storage.
///
/// The result path of shard `{collection}/{index}` is
/// `{collection}/result_{index}.csv`; paths for distinct shards never
/// collide, so any number of dispatchers may run concurrently as long as
/// no two take the same shard.
pub struct Dispatcher {
    shards: ShardStore,
    results: Arc<dyn Storage>,
    oracle: Arc<dyn ScoringOracle>,
    segmenter: SegmenterConfig,
    save_interval: usize,
}

impl Dispatcher {
    pub fn new(
        shards: ShardStore,
        results: Arc<dyn Storage>,
        oracle: Arc<dyn ScoringOracle>,
    ) -> Self {
        Self {
            shards,
            results,
            oracle,
            segmenter: SegmenterConfig::default(),
            save_interval: 4,
        }
    }

    pub fn with_segmenter(mut self, segmenter: SegmenterConfig) -> Self {
        self.segmenter = segmenter;
        self
    }

    pub fn with_save_interval(mut self, save_interval: usize) -> Self {
        self.save_interval = save_interval;
        self
    }

    /// Result snapshot path for a shard.
    pub fn result_path(shard_id: &ShardId) -> String {
        format!("{}/result_{}.csv", shard_id.collection, shard_id.index)
    }

    /// Process one shard end to end, resuming from prior output.
    pub fn run(&self, shard_id: &ShardId) -> Result<RunReport> {
        let documents = self
            .shards
            .read_shard(&shard_id.collection, shard_id.index)?;
        info!("dispatching shard {shard_id}: {} documents", documents.len());

        let config = RunnerConfig::new(Self::result_path(shard_id))
            .with_segmenter(self.segmenter.clone())
            .with_save_interval(self.save_interval);
        let runner = ShardRunner::new(Arc::clone(&self.results), Arc::clone(&self.oracle), config)?;
        runner.run(&documents)
    }
}
