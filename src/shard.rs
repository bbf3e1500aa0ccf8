//! Durable shard storage.
//!
//! A shard is an ordered slice of the corpus written once by the
//! [`Partitioner`](crate::partition::Partitioner) and read-only afterwards.
//! Shards and the corpus share the same CSV schema: an `id` column and a
//! `text` column. Each collection also carries a small JSON manifest
//! recording how it was split.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};
use std::sync::Arc;

use crate::data::Document;
use crate::error::{ArnicaError, Result};
use crate::storage::{Storage, write_atomic};

/// Name of the per-collection manifest file.
pub const MANIFEST_FILE: &str = "manifest.json";

/// Storage path of one shard file.
pub fn shard_path(collection: &str, index: usize) -> String {
    format!("{collection}/shard_{index}.csv")
}

/// Storage path of a collection's manifest.
pub fn manifest_path(collection: &str) -> String {
    format!("{collection}/{MANIFEST_FILE}")
}

/// Manifest describing how a collection was partitioned.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShardManifest {
    pub collection: String,
    pub shard_count: usize,
    /// Document count per shard, indexed by shard number.
    pub shard_sizes: Vec<usize>,
    pub created_at: DateTime<Utc>,
}

impl ShardManifest {
    pub fn total_documents(&self) -> usize {
        self.shard_sizes.iter().sum()
    }
}

/// Parse documents from a CSV stream with `id` and `text` columns.
///
/// A missing `id` or `text` column is a configuration error: the input is
/// not a usable corpus and processing must not start. Rows with empty
/// fields are kept here; the runner classifies them as data-quality skips.
pub fn read_documents<R: Read>(reader: R) -> Result<Vec<Document>> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let headers = csv_reader.headers()?.clone();
    let id_col = headers.iter().position(|h| h == "id");
    let text_col = headers.iter().position(|h| h == "text");
    let (id_col, text_col) = match (id_col, text_col) {
        (Some(i), Some(t)) => (i, t),
        _ => {
            return Err(ArnicaError::invalid_config(
                "corpus is missing a required `id` or `text` column",
            ));
        }
    };

    let mut documents = Vec::new();
    for record in csv_reader.records() {
        let record = record?;
        let id = record.get(id_col).unwrap_or_default();
        let text = record.get(text_col).unwrap_or_default();
        documents.push(Document::new(id, text));
    }
    Ok(documents)
}

/// Serialize documents as an `id,text` CSV stream.
pub fn write_documents<W: Write>(writer: W, documents: &[Document]) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(["id", "text"])?;
    for doc in documents {
        csv_writer.write_record([doc.id.as_str(), doc.text.as_str()])?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Read/write access to the shard files of one or more collections.
#[derive(Debug, Clone)]
pub struct ShardStore {
    storage: Arc<dyn Storage>,
}

impl ShardStore {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    pub fn storage(&self) -> &Arc<dyn Storage> {
        &self.storage
    }

    /// Write one shard. Called once per shard by the partitioner; shard
    /// files are never rewritten afterwards.
    pub fn write_shard(
        &self,
        collection: &str,
        index: usize,
        documents: &[Document],
    ) -> Result<()> {
        let mut buf = Vec::new();
        write_documents(&mut buf, documents)?;
        write_atomic(self.storage.as_ref(), &shard_path(collection, index), &buf)
    }

    /// Read one shard in stored order.
    pub fn read_shard(&self, collection: &str, index: usize) -> Result<Vec<Document>> {
        let input = self.storage.open_input(&shard_path(collection, index))?;
        read_documents(input)
    }

    pub fn write_manifest(&self, manifest: &ShardManifest) -> Result<()> {
        let json = serde_json::to_vec_pretty(manifest)?;
        write_atomic(
            self.storage.as_ref(),
            &manifest_path(&manifest.collection),
            &json,
        )
    }

    pub fn read_manifest(&self, collection: &str) -> Result<ShardManifest> {
        let input = self.storage.open_input(&manifest_path(collection))?;
        let manifest = serde_json::from_reader(input)?;
        Ok(manifest)
    }
}
