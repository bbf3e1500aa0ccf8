//! The checkpointed shard runner.
//!
//! Drives one shard end to end: skip documents already present in the
//! persisted long-form output, run segmentation, scoring, and smoothing
//! for the rest, and periodically rewrite both output snapshots through an
//! atomic replace. Documents are strictly sequential within a run so every
//! flush captures a consistent "these documents are fully done" prefix;
//! killing the worker between flushes loses at most `save_interval - 1`
//! documents, which are simply redone on the next run.
//!
//! Only storage and configuration failures abort a run. Corpus noise
//! (missing id or text) is skipped permanently, and a scoring failure
//! degrades to `NaN` rows while still checkpointing the document, so a
//! permanently failing document can never wedge the shard in a retry loop.

use std::sync::Arc;
use std::time::Instant;

use log::{debug, info, warn};

use crate::data::Document;
use crate::error::{ArnicaError, Result};
use crate::oracle::ScoringOracle;
use crate::segment::{SegmenterConfig, WindowSegmenter};
use crate::smooth::SmoothedDocument;
use crate::storage::{Storage, write_atomic};
use crate::table::{
    EMPTY_SENTINEL_PERCENTILE, ScoreRow, ScoreTable, SummaryRow, SummaryTable,
    derive_processed_ids,
};

/// Configuration for a [`ShardRunner`].
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    pub segmenter: SegmenterConfig,
    /// Flush both snapshots after this many newly processed documents.
    pub save_interval: usize,
    /// Storage path of the long-form snapshot.
    pub scores_path: String,
    /// Storage path of the summary snapshot.
    pub summary_path: String,
}

impl RunnerConfig {
    /// Config writing to `scores_path`, with the summary path derived the
    /// same way the output pair is always laid out: `result.csv` pairs
    /// with `result_summary.csv`.
    pub fn new(scores_path: impl Into<String>) -> Self {
        let scores_path = scores_path.into();
        let summary_path = match scores_path.strip_suffix(".csv") {
            Some(stem) => format!("{stem}_summary.csv"),
            None => format!("{scores_path}_summary"),
        };
        Self {
            segmenter: SegmenterConfig::default(),
            save_interval: 4,
            scores_path,
            summary_path,
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
}

/// Counters describing what one run did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    /// Documents scored and summarized in this run.
    pub processed: usize,
    /// Documents that produced zero windows and were checkpointed with a
    /// sentinel row.
    pub empty: usize,
    /// Documents skipped because the checkpoint already contains them.
    pub skipped_checkpoint: usize,
    /// Documents skipped permanently for missing id or text.
    pub skipped_invalid: usize,
    /// Number of flushes performed, including the final one.
    pub flushes: usize,
}

/// Processes one shard against one output pair.
///
/// The runner owns its shard's outputs exclusively; no two runners may
/// target the same paths concurrently. The scoring oracle is injected so
/// heavy model state is constructed and released by the caller.
pub struct ShardRunner {
    storage: Arc<dyn Storage>,
    oracle: Arc<dyn ScoringOracle>,
    segmenter: WindowSegmenter,
    config: RunnerConfig,
}

impl ShardRunner {
    pub fn new(
        storage: Arc<dyn Storage>,
        oracle: Arc<dyn ScoringOracle>,
        config: RunnerConfig,
    ) -> Result<Self> {
        if config.save_interval == 0 {
            return Err(ArnicaError::invalid_config("save_interval must be at least 1"));
        }
        if config.segmenter.window_size == 0 || config.segmenter.window_count == 0 {
            return Err(ArnicaError::invalid_config(
                "window_size and window_count must be at least 1",
            ));
        }
        let segmenter = WindowSegmenter::new(config.segmenter.clone());
        Ok(Self {
            storage,
            oracle,
            segmenter,
            config,
        })
    }

    /// Run the shard to completion, resuming from any prior output.
    pub fn run(&self, documents: &[Document]) -> Result<RunReport> {
        let metrics = self.oracle.metrics();
        let (mut scores, mut summaries) = self.load_prior(&metrics)?;
        let mut processed_ids = derive_processed_ids(&scores);

        let mut report = RunReport::default();
        let mut since_flush = 0usize;
        let total = documents.len();
        let started = Instant::now();

        for (idx, doc) in documents.iter().enumerate() {
            if !doc.is_valid() {
                debug!("skipping document with missing id or text at shard offset {idx}");
                report.skipped_invalid += 1;
                continue;
            }
            if processed_ids.contains(&doc.id) {
                info!("skipping document {}, already processed", doc.id);
                report.skipped_checkpoint += 1;
                continue;
            }

            let windows = self.segmenter.segment(&doc.text);
            if windows.is_empty() {
                // Checkpoint the document with a sentinel row so it is not
                // retried forever, but emit no summary for it.
                warn!("document {} produced no windows, recording empty sentinel", doc.id);
                scores.push(ScoreRow {
                    url: doc.id.clone(),
                    percentile: EMPTY_SENTINEL_PERCENTILE,
                    values: vec![f64::NAN; metrics.len()],
                });
                processed_ids.insert(doc.id.clone());
                report.empty += 1;
            } else {
                let scored = self.oracle.score_document(&doc.text, &windows);
                debug_assert_eq!(scored.len(), windows.len());
                let smoothed = SmoothedDocument::from_scores(&scored);

                for i in 0..windows.len() {
                    let values = metrics.iter().map(|m| smoothed.value_at(m, i)).collect();
                    scores.push(ScoreRow {
                        url: doc.id.clone(),
                        percentile: i + 1,
                        values,
                    });
                }

                let summary = smoothed.summarize();
                let averages = metrics
                    .iter()
                    .map(|m| summary.averages.get(m).copied().unwrap_or(f64::NAN))
                    .collect();
                summaries.push(SummaryRow {
                    url: doc.id.clone(),
                    averages,
                    avg_variance: summary.avg_variance,
                });

                processed_ids.insert(doc.id.clone());
                report.processed += 1;
            }

            since_flush += 1;
            if since_flush >= self.config.save_interval {
                self.flush(&scores, &summaries)?;
                report.flushes += 1;
                since_flush = 0;
            }

            let elapsed = started.elapsed().as_secs_f64();
            info!(
                "processed {}/{} documents, {} remaining, {:.2}s per document on average",
                idx + 1,
                total,
                total - idx - 1,
                elapsed / (idx + 1) as f64
            );
        }

        self.flush(&scores, &summaries)?;
        report.flushes += 1;
        info!(
            "shard complete: {} scored, {} empty, {} checkpoint skips, {} invalid",
            report.processed, report.empty, report.skipped_checkpoint, report.skipped_invalid
        );
        Ok(report)
    }

    /// Load prior snapshots if present, or start fresh tables with the
    /// oracle's metric columns. A prior snapshot whose columns disagree
    /// with the injected oracle is a configuration error: mixing metric
    /// sets in one output would silently corrupt the table.
    fn load_prior(&self, metrics: &[String]) -> Result<(ScoreTable, SummaryTable)> {
        let scores = if self.storage.file_exists(&self.config.scores_path) {
            let input = self.storage.open_input(&self.config.scores_path)?;
            let table = ScoreTable::from_csv(input)?;
            if table.metrics() != metrics {
                return Err(ArnicaError::invalid_config(format!(
                    "existing snapshot {} has different metric columns than the oracle",
                    self.config.scores_path
                )));
            }
            info!(
                "loaded existing results from {} ({} rows)",
                self.config.scores_path,
                table.rows().len()
            );
            table
        } else {
            info!("no existing results found, starting fresh");
            ScoreTable::new(metrics.to_vec())
        };

        let summaries = if self.storage.file_exists(&self.config.summary_path) {
            let input = self.storage.open_input(&self.config.summary_path)?;
            let table = SummaryTable::from_csv(input)?;
            if table.metrics() != metrics {
                return Err(ArnicaError::invalid_config(format!(
                    "existing summary {} has different metric columns than the oracle",
                    self.config.summary_path
                )));
            }
            table
        } else {
            SummaryTable::new(metrics.to_vec())
        };

        Ok((scores, summaries))
    }

    /// Durably rewrite both snapshots from the full in-memory tables.
    fn flush(&self, scores: &ScoreTable, summaries: &SummaryTable) -> Result<()> {
        write_atomic(
            self.storage.as_ref(),
            &self.config.scores_path,
            &scores.to_csv_bytes()?,
        )?;
        write_atomic(
            self.storage.as_ref(),
            &self.config.summary_path,
            &summaries.to_csv_bytes()?,
        )?;
        info!(
            "flushed {} score rows and {} summary rows",
            scores.rows().len(),
            summaries.rows().len()
        );
        Ok(())
    }
}
