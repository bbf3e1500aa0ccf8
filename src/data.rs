//! Core data types shared across the pipeline.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

/// A single document read from the corpus.
///
/// The `id` is the stable resume key: once a document's rows appear in the
/// persisted long-form output, its id is skipped on every later run. The
/// text is immutable once read from a shard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub text: String,
}

impl Document {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
        }
    }

    /// A document with an empty id or empty text is corpus noise and is
    /// skipped permanently without being recorded.
    pub fn is_valid(&self) -> bool {
        !self.id.is_empty() && !self.text.is_empty()
    }
}

/// Scores for one text window: metric name to a value in `[0, 1]`, with
/// `NaN` as the failure sentinel.
#[derive(Debug, Clone, Default)]
pub struct ScoreVector {
    values: AHashMap<String, f64>,
}

impl ScoreVector {
    pub fn new() -> Self {
        Self {
            values: AHashMap::new(),
        }
    }

    /// A vector carrying `NaN` for every given metric, used when the
    /// scoring model fails for a whole batch.
    pub fn nan_filled<S: AsRef<str>>(metrics: &[S]) -> Self {
        let mut values = AHashMap::with_capacity(metrics.len());
        for m in metrics {
            values.insert(m.as_ref().to_string(), f64::NAN);
        }
        Self { values }
    }

    pub fn insert(&mut self, metric: impl Into<String>, value: f64) {
        self.values.insert(metric.into(), value);
    }

    /// Returns the value for a metric, or `None` if the key is absent.
    /// Absent keys are treated as missing by the smoother, never as zero.
    pub fn get(&self, metric: &str) -> Option<f64> {
        self.values.get(metric).copied()
    }

    pub fn contains(&self, metric: &str) -> bool {
        self.values.contains_key(metric)
    }

    /// Metric keys in this vector, in no particular order.
    pub fn metrics(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(|k| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
