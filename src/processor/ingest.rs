//! End-to-end ingestion: format check, parse, validate, store.
//!
//! A run replaces the store's dataset in one atomic commit, so a failure at
//! any stage leaves the previously ingested data intact.
//!
//! Runs must not overlap. Calling [`Ingestor::ingest`] again before the
//! previous call finished is a caller error; the store serializes the final
//! commit but the later run simply wins.

use super::batch::BatchProcessor;
use super::progress::ProgressSink;
use crate::config::Config;
use crate::error::{CustomerMapError, Result};
use crate::parser::{TabularInput, TabularParser};
use crate::schema::SchemaResolver;
use crate::store::StoreHandle;
use crate::validator::Rejection;
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Statistics for one ingestion run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IngestStats {
    /// File name the data came from
    pub source: String,
    /// Data rows produced by the parser, before validation
    pub rows_parsed: usize,
    /// Delimited lines dropped for a field-count mismatch
    pub malformed_lines: usize,
    pub valid: usize,
    pub rejected: usize,
    /// Distinct customers in the store after the run
    pub stored: usize,
    pub chunks: usize,
    pub elapsed: Duration,
}

impl IngestStats {
    /// Stored customers as a percentage of parsed rows
    pub fn success_rate(&self) -> f64 {
        if self.rows_parsed == 0 {
            100.0
        } else {
            (self.stored as f64 / self.rows_parsed as f64) * 100.0
        }
    }

    /// Parsed rows that did not end up in the store
    pub fn excluded(&self) -> usize {
        self.rows_parsed.saturating_sub(self.stored)
    }

    pub fn summary(&self) -> String {
        format!(
            "Ingested {}: {} -> {} customers ({:.1}% success) | \
             Rejected: {} | Excluded: {} | Malformed lines: {} | {:.2}s",
            self.source,
            self.rows_parsed,
            self.stored,
            self.success_rate(),
            self.rejected,
            self.excluded(),
            self.malformed_lines,
            self.elapsed.as_secs_f64()
        )
    }
}

/// Outcome of a successful run
#[derive(Debug, Clone, Default)]
pub struct IngestReport {
    pub stats: IngestStats,
    pub rejections: Vec<Rejection>,
}

/// Drives the ingestion pipeline into a store
#[derive(Debug, Clone)]
pub struct Ingestor {
    parser: TabularParser,
    resolver: SchemaResolver,
    batch: BatchProcessor,
}

impl Ingestor {
    pub fn new(config: &Config) -> Self {
        Self {
            parser: TabularParser::new(),
            resolver: SchemaResolver::new(config.ingest.columns.clone()),
            batch: BatchProcessor::new(config.ingest.chunk_size),
        }
    }

    /// Read a file from disk and ingest it
    pub async fn ingest_path(
        &self,
        path: &Path,
        store: &StoreHandle,
        progress: &dyn ProgressSink,
    ) -> Result<IngestReport> {
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let bytes = tokio::fs::read(path).await?;
        self.ingest(&file_name, bytes, store, progress).await
    }

    /// Ingest file contents, replacing the store's dataset on success
    ///
    /// Progress is reset to 0 when the run starts and when it ends, whether
    /// or not it succeeded.
    pub async fn ingest(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
        store: &StoreHandle,
        progress: &dyn ProgressSink,
    ) -> Result<IngestReport> {
        progress.reset();
        let result = self.run(file_name, bytes, store, progress).await;
        progress.reset();

        if let Err(e) = &result {
            warn!("Ingestion of {} failed: {}", file_name, e);
        }
        result
    }

    async fn run(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
        store: &StoreHandle,
        progress: &dyn ProgressSink,
    ) -> Result<IngestReport> {
        let start = Instant::now();
        info!("Ingesting {} ({} bytes)", file_name, bytes.len());

        let input = TabularInput::from_bytes(file_name, bytes)?;
        debug!("Parsing {} as {:?}", file_name, input.format());
        let parser = self.parser;
        let table = tokio::task::spawn_blocking(move || parser.parse(&input))
            .await
            .map_err(|e| CustomerMapError::Io(std::io::Error::other(e)))??;

        let outcome = self
            .batch
            .process(&table.rows, &self.resolver, progress)
            .await?;

        let rows_parsed = table.rows.len();
        let stored = store
            .replace_all(outcome.customers, Some(file_name.to_string()), rows_parsed)
            .await?;

        let stats = IngestStats {
            source: file_name.to_string(),
            rows_parsed,
            malformed_lines: table.malformed_lines,
            valid: outcome.stats.valid,
            rejected: outcome.stats.rejected,
            stored,
            chunks: outcome.stats.chunks,
            elapsed: start.elapsed(),
        };
        info!("{}", stats.summary());

        Ok(IngestReport {
            stats,
            rejections: outcome.rejections,
        })
    }
}

impl Default for Ingestor {
    fn default() -> Self {
        Self::new(&Config::default())
    }
}
