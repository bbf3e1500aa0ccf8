use std::sync::Arc;

use tempfile::TempDir;

use arnica::storage::file::FileStorageConfig;
use arnica::storage::{StorageConfig, StorageFactory, read_to_vec};
use arnica::{
    ArnicaError, Document, EmotionModel, OracleAdapter, RunnerConfig, ScoreTable, SegmenterConfig,
    ShardRunner, SummaryTable,
};

/// Model that fails whenever the text mentions its poison marker,
/// standing in for a document that reliably crashes inference.
struct PoisonableModel {
    labels: Vec<String>,
}

impl PoisonableModel {
    fn new() -> Self {
        Self {
            labels: vec!["joy".to_string(), "fear".to_string()],
        }
    }
}

impl EmotionModel for PoisonableModel {
    fn labels(&self) -> &[String] {
        &self.labels
    }

    fn score_batch(&self, texts: &[String]) -> arnica::Result<Vec<Vec<f64>>> {
        if texts.iter().any(|t| t.contains("poison")) {
            return Err(ArnicaError::internal("inference crashed on this batch"));
        }
        Ok(texts.iter().map(|_| vec![0.4, 0.6]).collect())
    }
}

fn doc(id: &str, marker: &str) -> Document {
    let text: Vec<String> = (0..120).map(|w| format!("{marker}{w}")).collect();
    Document::new(id, text.join(" "))
}

#[test]
fn test_oracle_failure_degrades_to_nan_but_still_checkpoints() -> arnica::Result<()> {
    let temp_dir = TempDir::new().unwrap();
    let storage = StorageFactory::create(StorageConfig::File(FileStorageConfig::new(
        temp_dir.path(),
    )))?;

    let documents = vec![
        doc("https://example.org/ok1", "word"),
        doc("https://example.org/bad", "poison"),
        doc("https://example.org/ok2", "word"),
    ];

    let oracle = Arc::new(OracleAdapter::new(PoisonableModel::new()));
    let config = RunnerConfig::new("result.csv").with_segmenter(SegmenterConfig {
        window_size: 30,
        window_count: 8,
        word_cap: 50_000,
    });
    let runner = ShardRunner::new(Arc::clone(&storage), oracle, config)?;
    let report = runner.run(&documents)?;

    // The failing document does not abort the shard and still counts as
    // processed.
    assert_eq!(report.processed, 3);

    let table = ScoreTable::from_csv(read_to_vec(storage.as_ref(), "result.csv")?.as_slice())?;
    let joy_col = table.metrics().iter().position(|m| m == "joy").unwrap();

    let bad_rows: Vec<_> = table
        .rows()
        .iter()
        .filter(|r| r.url == "https://example.org/bad")
        .collect();
    assert_eq!(bad_rows.len(), 8);
    for row in &bad_rows {
        assert!(row.values[joy_col].is_nan());
    }

    // Healthy documents keep real scores.
    let ok_rows: Vec<_> = table
        .rows()
        .iter()
        .filter(|r| r.url == "https://example.org/ok1")
        .collect();
    assert_eq!(ok_rows.len(), 8);
    for row in &ok_rows {
        assert!((row.values[joy_col] - 0.4).abs() < 1e-12);
    }

    // The failed document appears exactly once in the summary.
    let summary =
        SummaryTable::from_csv(read_to_vec(storage.as_ref(), "result_summary.csv")?.as_slice())?;
    let bad_summaries = summary
        .rows()
        .iter()
        .filter(|r| r.url == "https://example.org/bad")
        .count();
    assert_eq!(bad_summaries, 1);

    // On a later run the failed document is not retried.
    let oracle = Arc::new(OracleAdapter::new(PoisonableModel::new()));
    let runner = ShardRunner::new(
        Arc::clone(&storage),
        oracle,
        RunnerConfig::new("result.csv"),
    )?;
    let report = runner.run(&documents)?;
    assert_eq!(report.skipped_checkpoint, 3);
    Ok(())
}
