//! Score smoothing and per-document aggregation.
//!
//! Raw per-window scores are noisy; each metric's series is passed through
//! a centered 3-wide moving average before anything is persisted. The
//! smoothed series then collapse into one summary row per document.

use ahash::AHashMap;

use crate::data::ScoreVector;

/// Apply a centered 3-wide moving average to `scores`.
///
/// The first element becomes the mean of elements 0 and 1, the last the
/// mean of the final two. Length-0 and length-1 inputs are returned
/// unchanged since no smoothing is possible. `NaN` values propagate into
/// their neighborhood rather than being dropped.
pub fn smooth_series(scores: &[f64]) -> Vec<f64> {
    match scores.len() {
        0 => Vec::new(),
        1 => scores.to_vec(),
        n => {
            let mut smoothed = Vec::with_capacity(n);
            smoothed.push((scores[0] + scores[1]) / 2.0);
            for i in 1..n - 1 {
                smoothed.push((scores[i - 1] + scores[i] + scores[i + 1]) / 3.0);
            }
            smoothed.push((scores[n - 2] + scores[n - 1]) / 2.0);
            smoothed
        }
    }
}

/// Population variance of `values` around `mean` (divisor = count).
fn population_variance(values: &[f64], mean: f64) -> f64 {
    let sum: f64 = values.iter().map(|v| (v - mean) * (v - mean)).sum();
    sum / values.len() as f64
}

/// Per-document summary statistics over the smoothed series.
#[derive(Debug, Clone)]
pub struct DocumentSummary {
    /// Mean of each metric's smoothed series.
    pub averages: AHashMap<String, f64>,
    /// Population variance of each metric's smoothed series.
    pub variances: AHashMap<String, f64>,
    /// Mean of the per-metric variances, metrics with empty series
    /// excluded.
    pub avg_variance: f64,
}

/// A document's smoothed per-window score series, one per metric.
///
/// The metric set is taken from the first window's score vector; windows
/// missing a key simply contribute nothing to that metric's series, so a
/// series may be shorter than the window count.
#[derive(Debug, Clone)]
pub struct SmoothedDocument {
    window_count: usize,
    series: AHashMap<String, Vec<f64>>,
}

impl SmoothedDocument {
    pub fn from_scores(scores: &[ScoreVector]) -> Self {
        let mut series = AHashMap::new();
        if let Some(first) = scores.first() {
            for metric in first.metrics() {
                let raw: Vec<f64> = scores.iter().filter_map(|v| v.get(metric)).collect();
                series.insert(metric.to_string(), smooth_series(&raw));
            }
        }
        Self {
            window_count: scores.len(),
            series,
        }
    }

    pub fn window_count(&self) -> usize {
        self.window_count
    }

    pub fn series(&self, metric: &str) -> Option<&[f64]> {
        self.series.get(metric).map(|s| s.as_slice())
    }

    /// Smoothed value of `metric` at window `index`, or `NaN` when the
    /// metric is unknown or its series is too short.
    pub fn value_at(&self, metric: &str, index: usize) -> f64 {
        self.series
            .get(metric)
            .and_then(|s| s.get(index))
            .copied()
            .unwrap_or(f64::NAN)
    }

    /// Collapse the smoothed series into per-document statistics.
    pub fn summarize(&self) -> DocumentSummary {
        let mut averages = AHashMap::new();
        let mut variances = AHashMap::new();
        let mut variance_sum = 0.0;
        let mut variance_count = 0usize;

        for (metric, series) in &self.series {
            if series.is_empty() {
                averages.insert(metric.clone(), f64::NAN);
                continue;
            }
            let mean = series.iter().sum::<f64>() / series.len() as f64;
            let variance = population_variance(series, mean);
            averages.insert(metric.clone(), mean);
            variances.insert(metric.clone(), variance);
            variance_sum += variance;
            variance_count += 1;
        }

        let avg_variance = if variance_count == 0 {
            f64::NAN
        } else {
            variance_sum / variance_count as f64
        };

        DocumentSummary {
            averages,
            variances,
            avg_variance,
        }
    }
}
