//! The scoring oracle boundary.
//!
//! The heavy affect classifier lives behind the [`EmotionModel`] trait and
//! is supplied by the caller; this crate never loads model weights itself.
//! The runner consumes the [`ScoringOracle`] trait, whose contract is
//! deliberately strict: given `n` windows it returns exactly `n` score
//! vectors and never fails. [`OracleAdapter`] upholds that contract around
//! an arbitrary model by degrading any model failure to a full-length
//! batch of `NaN` vectors, and merges a cheap whole-document positivity
//! scalar into every window's vector under the reserved `pos` key.

pub mod lexicon;

use log::warn;

use crate::data::ScoreVector;
use crate::error::Result;

pub use lexicon::PositivityLexicon;

/// Reserved metric key for the whole-document positivity scalar.
pub const POSITIVITY_METRIC: &str = "pos";

/// An opaque batched affect classifier.
///
/// Implementations own any heavy resources (model weights, inference
/// sessions) and release them on drop. `score_batch` may fail as a whole;
/// it must never return a partial batch.
pub trait EmotionModel: Send + Sync {
    /// The fixed, ordered label set this model scores.
    fn labels(&self) -> &[String];

    /// Score a batch of texts. On success the outer vector has one entry
    /// per input text and each inner vector has one value per label, in
    /// label order, each in `[0, 1]`.
    fn score_batch(&self, texts: &[String]) -> Result<Vec<Vec<f64>>>;
}

/// The scoring boundary consumed by the runner.
///
/// Implementations never fail and never return a partial batch: the output
/// always has exactly one vector per input window.
pub trait ScoringOracle: Send + Sync {
    /// Ordered metric names appearing in every score vector. Defines the
    /// column order of the long-form output.
    fn metrics(&self) -> Vec<String>;

    /// Score every window of one document. `text` is the whole document,
    /// used for document-level metrics such as positivity.
    fn score_document(&self, text: &str, windows: &[String]) -> Vec<ScoreVector>;
}

/// Adapts an [`EmotionModel`] to the infallible [`ScoringOracle`] contract.
pub struct OracleAdapter<M: EmotionModel> {
    model: M,
    lexicon: PositivityLexicon,
}

impl<M: EmotionModel> OracleAdapter<M> {
    pub fn new(model: M) -> Self {
        Self {
            model,
            lexicon: PositivityLexicon::new(),
        }
    }
}

impl<M: EmotionModel> ScoringOracle for OracleAdapter<M> {
    fn metrics(&self) -> Vec<String> {
        let mut metrics = Vec::with_capacity(self.model.labels().len() + 1);
        metrics.push(POSITIVITY_METRIC.to_string());
        metrics.extend(self.model.labels().iter().cloned());
        metrics
    }

    fn score_document(&self, text: &str, windows: &[String]) -> Vec<ScoreVector> {
        let labels = self.model.labels();
        let positivity = self.lexicon.score(text);

        let batch = match self.model.score_batch(windows) {
            Ok(batch) if batch.len() == windows.len() => batch,
            Ok(batch) => {
                warn!(
                    "emotion model returned {} rows for {} windows; degrading to NaN",
                    batch.len(),
                    windows.len()
                );
                return self.nan_batch(windows.len(), positivity);
            }
            Err(e) => {
                warn!("emotion model failed, degrading to NaN: {e}");
                return self.nan_batch(windows.len(), positivity);
            }
        };

        batch
            .into_iter()
            .map(|row| {
                let mut vector = ScoreVector::new();
                vector.insert(POSITIVITY_METRIC, positivity);
                if row.len() == labels.len() {
                    for (label, value) in labels.iter().zip(row) {
                        vector.insert(label.clone(), value);
                    }
                } else {
                    for label in labels {
                        vector.insert(label.clone(), f64::NAN);
                    }
                }
                vector
            })
            .collect()
    }
}

impl<M: EmotionModel> OracleAdapter<M> {
    fn nan_batch(&self, len: usize, positivity: f64) -> Vec<ScoreVector> {
        let labels = self.model.labels();
        (0..len)
            .map(|_| {
                let mut vector = ScoreVector::nan_filled(labels);
                vector.insert(POSITIVITY_METRIC, positivity);
                vector
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ArnicaError;

    struct ConstantModel {
        labels: Vec<String>,
        value: f64,
    }

    impl EmotionModel for ConstantModel {
        fn labels(&self) -> &[String] {
            &self.labels
        }

        fn score_batch(&self, texts: &[String]) -> Result<Vec<Vec<f64>>> {
            Ok(texts.iter().map(|_| vec![self.value; 2]).collect())
        }
    }

    struct FailingModel {
        labels: Vec<String>,
    }

    impl EmotionModel for FailingModel {
        fn labels(&self) -> &[String] {
            &self.labels
        }

        fn score_batch(&self, _texts: &[String]) -> Result<Vec<Vec<f64>>> {
            Err(ArnicaError::internal("inference backend is down"))
        }
    }

    fn labels() -> Vec<String> {
        vec!["joy".to_string(), "anger".to_string()]
    }

    #[test]
    fn test_metrics_put_positivity_first() {
        let adapter = OracleAdapter::new(ConstantModel {
            labels: labels(),
            value: 0.5,
        });
        assert_eq!(adapter.metrics(), vec!["pos", "joy", "anger"]);
    }

    #[test]
    fn test_positivity_merged_into_every_window() {
        let adapter = OracleAdapter::new(ConstantModel {
            labels: labels(),
            value: 0.5,
        });
        let windows = vec!["good great".to_string(), "good great".to_string()];
        let scored = adapter.score_document("good great", &windows);

        assert_eq!(scored.len(), 2);
        let pos = scored[0].get("pos").unwrap();
        assert!(pos > 0.0);
        for v in &scored {
            assert_eq!(v.get("pos"), Some(pos));
            assert_eq!(v.get("joy"), Some(0.5));
        }
    }

    #[test]
    fn test_model_failure_degrades_to_full_nan_batch() {
        let adapter = OracleAdapter::new(FailingModel { labels: labels() });
        let windows = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let scored = adapter.score_document("a b c", &windows);

        assert_eq!(scored.len(), 3);
        for v in &scored {
            assert!(v.get("joy").unwrap().is_nan());
            assert!(v.get("anger").unwrap().is_nan());
            // The lexicon scalar is independent of the model and survives.
            assert!(v.get("pos").unwrap().is_finite());
        }
    }
}
