//! Tabular result snapshots.
//!
//! The runner produces two CSV snapshots per shard: a long-form table with
//! one row per (document, window) pair, and a summary table with one row
//! per document. Both are rewritten in full on every flush, so the row
//! structs keep everything needed to re-emit prior rows byte-for-byte.
//!
//! The long-form table is also the checkpoint: the set of `url` values it
//! contains is exactly the set of documents a future run may skip. Window
//! rows are 1-based; percentile 0 is the sentinel for a document that
//! produced no windows and was checkpointed without scores.

use std::io::Read;

use ahash::AHashSet;

use crate::error::{ArnicaError, Result};

/// Percentile value marking a zero-window document's sentinel row.
pub const EMPTY_SENTINEL_PERCENTILE: usize = 0;

/// One (document, window) row of the long-form output.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreRow {
    pub url: String,
    pub percentile: usize,
    /// Metric values aligned with the owning table's metric order.
    pub values: Vec<f64>,
}

/// The long-form output table: `url, percentile, <metric...>`.
#[derive(Debug, Clone)]
pub struct ScoreTable {
    metrics: Vec<String>,
    rows: Vec<ScoreRow>,
}

impl ScoreTable {
    pub fn new(metrics: Vec<String>) -> Self {
        Self {
            metrics,
            rows: Vec::new(),
        }
    }

    /// Parse a previously flushed snapshot. The metric column list is
    /// recovered from the header.
    pub fn from_csv<R: Read>(reader: R) -> Result<Self> {
        let mut csv_reader = csv::Reader::from_reader(reader);
        let headers = csv_reader.headers()?.clone();
        let mut columns = headers.iter();
        if columns.next() != Some("url") || columns.next() != Some("percentile") {
            return Err(ArnicaError::storage(
                "long-form snapshot must start with `url,percentile` columns",
            ));
        }
        let metrics: Vec<String> = columns.map(|c| c.to_string()).collect();

        let mut rows = Vec::new();
        for record in csv_reader.records() {
            let record = record?;
            let url = record
                .get(0)
                .ok_or_else(|| ArnicaError::storage("long-form row missing url"))?
                .to_string();
            let percentile = record
                .get(1)
                .and_then(|p| p.parse().ok())
                .ok_or_else(|| ArnicaError::storage("long-form row has bad percentile"))?;
            let values = parse_values(&record, 2, metrics.len())?;
            rows.push(ScoreRow {
                url,
                percentile,
                values,
            });
        }
        Ok(Self { metrics, rows })
    }

    pub fn to_csv_bytes(&self) -> Result<Vec<u8>> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        let mut header = vec!["url".to_string(), "percentile".to_string()];
        header.extend(self.metrics.iter().cloned());
        writer.write_record(&header)?;
        for row in &self.rows {
            let mut record = vec![row.url.clone(), row.percentile.to_string()];
            record.extend(row.values.iter().map(|v| format_value(*v)));
            writer.write_record(&record)?;
        }
        writer
            .into_inner()
            .map_err(|e| ArnicaError::storage(format!("cannot finish CSV snapshot: {e}")))
    }

    pub fn push(&mut self, row: ScoreRow) {
        debug_assert_eq!(row.values.len(), self.metrics.len());
        self.rows.push(row);
    }

    pub fn metrics(&self) -> &[String] {
        &self.metrics
    }

    pub fn rows(&self) -> &[ScoreRow] {
        &self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// One document's row of the summary output.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryRow {
    pub url: String,
    /// Per-metric averages aligned with the owning table's metric order.
    pub averages: Vec<f64>,
    pub avg_variance: f64,
}

/// The summary output table:
/// `url, avg_<metric...>, avg_variance_across_emotions`.
#[derive(Debug, Clone)]
pub struct SummaryTable {
    metrics: Vec<String>,
    rows: Vec<SummaryRow>,
}

impl SummaryTable {
    pub fn new(metrics: Vec<String>) -> Self {
        Self {
            metrics,
            rows: Vec::new(),
        }
    }

    pub fn from_csv<R: Read>(reader: R) -> Result<Self> {
        let mut csv_reader = csv::Reader::from_reader(reader);
        let headers = csv_reader.headers()?.clone();
        let columns: Vec<&str> = headers.iter().collect();
        if columns.first() != Some(&"url")
            || columns.last() != Some(&"avg_variance_across_emotions")
        {
            return Err(ArnicaError::storage(
                "summary snapshot must span `url` through `avg_variance_across_emotions`",
            ));
        }
        let metrics: Vec<String> = columns[1..columns.len() - 1]
            .iter()
            .map(|c| {
                c.strip_prefix("avg_")
                    .map(|m| m.to_string())
                    .ok_or_else(|| {
                        ArnicaError::storage(format!("unexpected summary column: {c}"))
                    })
            })
            .collect::<Result<_>>()?;

        let mut rows = Vec::new();
        for record in csv_reader.records() {
            let record = record?;
            let url = record
                .get(0)
                .ok_or_else(|| ArnicaError::storage("summary row missing url"))?
                .to_string();
            let averages = parse_values(&record, 1, metrics.len())?;
            let avg_variance = record
                .get(1 + metrics.len())
                .and_then(|v| v.parse().ok())
                .ok_or_else(|| ArnicaError::storage("summary row has bad variance"))?;
            rows.push(SummaryRow {
                url,
                averages,
                avg_variance,
            });
        }
        Ok(Self { metrics, rows })
    }

    pub fn to_csv_bytes(&self) -> Result<Vec<u8>> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        let mut header = vec!["url".to_string()];
        header.extend(self.metrics.iter().map(|m| format!("avg_{m}")));
        header.push("avg_variance_across_emotions".to_string());
        writer.write_record(&header)?;
        for row in &self.rows {
            let mut record = vec![row.url.clone()];
            record.extend(row.averages.iter().map(|v| format_value(*v)));
            record.push(format_value(row.avg_variance));
            writer.write_record(&record)?;
        }
        writer
            .into_inner()
            .map_err(|e| ArnicaError::storage(format!("cannot finish CSV snapshot: {e}")))
    }

    pub fn push(&mut self, row: SummaryRow) {
        debug_assert_eq!(row.averages.len(), self.metrics.len());
        self.rows.push(row);
    }

    pub fn metrics(&self) -> &[String] {
        &self.metrics
    }

    pub fn rows(&self) -> &[SummaryRow] {
        &self.rows
    }
}

/// The resumption checkpoint: every document id with rows in the persisted
/// long-form output. Pure over the in-memory table, so the skip logic is
/// testable without touching storage. The summary table is deliberately
/// not consulted; the long-form output alone is authoritative.
pub fn derive_processed_ids(table: &ScoreTable) -> AHashSet<String> {
    table.rows().iter().map(|row| row.url.clone()).collect()
}

fn parse_values(record: &csv::StringRecord, offset: usize, count: usize) -> Result<Vec<f64>> {
    let mut values = Vec::with_capacity(count);
    for i in 0..count {
        let field = record
            .get(offset + i)
            .ok_or_else(|| ArnicaError::storage("snapshot row is truncated"))?;
        let value = field
            .parse::<f64>()
            .map_err(|_| ArnicaError::storage(format!("bad numeric field: {field}")))?;
        values.push(value);
    }
    Ok(values)
}

/// Stable float formatting so an unchanged row re-serializes to identical
/// bytes across flushes. `NaN` prints as `NaN`, which `f64::from_str`
/// parses back.
fn format_value(v: f64) -> String {
    format!("{v}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metrics() -> Vec<String> {
        vec!["pos".to_string(), "joy".to_string()]
    }

    #[test]
    fn test_score_table_roundtrip_with_nan() -> Result<()> {
        let mut table = ScoreTable::new(metrics());
        table.push(ScoreRow {
            url: "doc1".to_string(),
            percentile: 1,
            values: vec![0.5, f64::NAN],
        });

        let bytes = table.to_csv_bytes()?;
        let parsed = ScoreTable::from_csv(bytes.as_slice())?;
        assert_eq!(parsed.metrics(), table.metrics());
        assert_eq!(parsed.rows()[0].url, "doc1");
        assert_eq!(parsed.rows()[0].values[0], 0.5);
        assert!(parsed.rows()[0].values[1].is_nan());
        Ok(())
    }

    #[test]
    fn test_reserialization_is_byte_identical() -> Result<()> {
        let mut table = ScoreTable::new(metrics());
        for i in 1..=3 {
            table.push(ScoreRow {
                url: "doc1".to_string(),
                percentile: i,
                values: vec![0.1 * i as f64, f64::NAN],
            });
        }
        let first = table.to_csv_bytes()?;
        let reparsed = ScoreTable::from_csv(first.as_slice())?;
        assert_eq!(reparsed.to_csv_bytes()?, first);
        Ok(())
    }

    #[test]
    fn test_derive_processed_ids() {
        let mut table = ScoreTable::new(metrics());
        for url in ["a", "a", "b"] {
            table.push(ScoreRow {
                url: url.to_string(),
                percentile: 1,
                values: vec![0.0, 0.0],
            });
        }
        let ids = derive_processed_ids(&table);
        assert_eq!(ids.len(), 2);
        assert!(ids.contains("a"));
        assert!(ids.contains("b"));
        assert!(!ids.contains("c"));
    }

    #[test]
    fn test_summary_header_roundtrip() -> Result<()> {
        let mut table = SummaryTable::new(metrics());
        table.push(SummaryRow {
            url: "doc1".to_string(),
            averages: vec![0.25, 0.75],
            avg_variance: 0.0,
        });

        let bytes = table.to_csv_bytes()?;
        let text = String::from_utf8(bytes.clone()).unwrap();
        assert!(text.starts_with("url,avg_pos,avg_joy,avg_variance_across_emotions\n"));

        let parsed = SummaryTable::from_csv(bytes.as_slice())?;
        assert_eq!(parsed.metrics(), table.metrics());
        assert_eq!(parsed.rows(), table.rows());
        Ok(())
    }

    #[test]
    fn test_bad_header_is_storage_error() {
        let err = ScoreTable::from_csv("id,window,joy\n".as_bytes()).unwrap_err();
        assert!(matches!(err, ArnicaError::Storage(_)));
    }
}
