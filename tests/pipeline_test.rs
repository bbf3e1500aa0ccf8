use std::sync::Arc;

use tempfile::TempDir;

use arnica::storage::file::FileStorageConfig;
use arnica::storage::{StorageConfig, StorageFactory, read_to_vec};
use arnica::{
    Dispatcher, Document, EmotionModel, OracleAdapter, Partitioner, ScoreTable, SegmenterConfig,
    ShardId, ShardStore, SummaryTable,
};

struct FlatModel {
    labels: Vec<String>,
}

impl EmotionModel for FlatModel {
    fn labels(&self) -> &[String] {
        &self.labels
    }

    fn score_batch(&self, texts: &[String]) -> arnica::Result<Vec<Vec<f64>>> {
        Ok(texts.iter().map(|_| vec![0.2, 0.7]).collect())
    }
}

#[test]
fn test_partition_then_dispatch_each_shard() -> arnica::Result<()> {
    let input_dir = TempDir::new().unwrap();
    let output_dir = TempDir::new().unwrap();

    let shards = ShardStore::new(StorageFactory::create(StorageConfig::File(
        FileStorageConfig::new(input_dir.path()),
    ))?);
    let results = StorageFactory::create(StorageConfig::File(FileStorageConfig::new(
        output_dir.path(),
    )))?;

    // Partition a small corpus into 2 shards.
    let corpus: Vec<Document> = (0..7)
        .map(|i| {
            let text: Vec<String> = (0..90).map(|w| format!("doc{i}w{w}")).collect();
            Document::new(format!("https://example.org/{i}"), text.join(" "))
        })
        .collect();
    let partitioner = Partitioner::new(shards.clone(), 2)?;
    let manifest = partitioner.partition("2020", &corpus)?;
    assert_eq!(manifest.shard_sizes, vec![4, 3]);

    // Dispatch both shards, as two workers would.
    let oracle = Arc::new(OracleAdapter::new(FlatModel {
        labels: vec!["joy".to_string(), "sadness".to_string()],
    }));
    let dispatcher = Dispatcher::new(shards, results.clone(), oracle).with_segmenter(
        SegmenterConfig {
            window_size: 20,
            window_count: 6,
            word_cap: 50_000,
        },
    );

    for index in 0..2 {
        let report = dispatcher.run(&ShardId::new("2020", index))?;
        assert_eq!(report.processed, manifest.shard_sizes[index]);
    }

    // Each shard produced its own disjoint output pair.
    for (index, &size) in manifest.shard_sizes.iter().enumerate() {
        let path = Dispatcher::result_path(&ShardId::new("2020", index));
        let table = ScoreTable::from_csv(read_to_vec(results.as_ref(), &path)?.as_slice())?;
        assert_eq!(table.metrics(), &["pos", "joy", "sadness"]);
        assert_eq!(table.rows().len(), size * 6);

        let summary_path = path.replace(".csv", "_summary.csv");
        let summary =
            SummaryTable::from_csv(read_to_vec(results.as_ref(), &summary_path)?.as_slice())?;
        assert_eq!(summary.rows().len(), size);

        // Constant model scores smooth to the same constant, so every
        // per-document variance collapses to zero.
        for row in summary.rows() {
            assert!(row.avg_variance.abs() < 1e-12);
        }
    }
    Ok(())
}

#[test]
fn test_dispatch_unknown_shard_is_fatal() -> arnica::Result<()> {
    let dir = TempDir::new().unwrap();
    let storage = StorageFactory::create(StorageConfig::File(FileStorageConfig::new(dir.path())))?;
    let shards = ShardStore::new(storage.clone());

    let oracle = Arc::new(OracleAdapter::new(FlatModel {
        labels: vec!["joy".to_string()],
    }));
    let dispatcher = Dispatcher::new(shards, storage, oracle);

    assert!(dispatcher.run(&ShardId::new("nope", 3)).is_err());
    Ok(())
}
