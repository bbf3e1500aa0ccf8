//! # Arnica
//!
//! A resumable, checkpointed batch pipeline for computing per-document
//! affect trajectories over large text corpora.
//!
//! ## Features
//!
//! - Deterministic partitioning of a corpus into near-equal shards
//! - Evenly spaced word-window segmentation of variable-length documents
//! - Pluggable batched scoring behind an infallible oracle boundary
//! - Moving-average smoothing and per-document summarization
//! - Crash-safe, resumable shard processing with atomic snapshot flushes
//! - Pluggable storage backends

// Core modules
mod data;
pub mod dispatch;
mod error;
pub mod oracle;
pub mod partition;
pub mod runner;
pub mod segment;
pub mod shard;
pub mod smooth;
pub mod storage;
pub mod table;

// Re-exports for the public API
pub use data::{Document, ScoreVector};
pub use dispatch::{Dispatcher, ShardId};
pub use error::{ArnicaError, Result};
pub use oracle::{EmotionModel, OracleAdapter, POSITIVITY_METRIC, PositivityLexicon, ScoringOracle};
pub use partition::Partitioner;
pub use runner::{RunReport, RunnerConfig, ShardRunner};
pub use segment::{SegmenterConfig, WindowSegmenter};
pub use shard::{ShardManifest, ShardStore};
pub use smooth::{SmoothedDocument, smooth_series};
pub use storage::{Storage, StorageConfig, StorageFactory};
pub use table::{ScoreTable, SummaryTable, derive_processed_ids};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
