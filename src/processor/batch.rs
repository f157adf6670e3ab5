//! Chunked, cooperative validation of parsed rows.

use super::progress::{ProgressSink, percent_complete};
use crate::constants::DEFAULT_CHUNK_SIZE;
use crate::error::{CustomerMapError, Result};
use crate::models::{Customer, RawRow};
use crate::schema::SchemaResolver;
use crate::validator::{Rejection, RecordValidator};
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Totals for one validation run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchStats {
    pub total_rows: usize,
    pub valid: usize,
    pub rejected: usize,
    pub chunks: usize,
    pub elapsed: Duration,
}

/// Valid customers in input order plus every rejection
#[derive(Debug, Clone, Default)]
pub struct BatchOutcome {
    pub customers: Vec<Customer>,
    pub rejections: Vec<Rejection>,
    pub stats: BatchStats,
}

/// Validates rows in fixed-size chunks, yielding to the runtime between
/// chunks
#[derive(Debug, Clone)]
pub struct BatchProcessor {
    chunk_size: usize,
}

impl BatchProcessor {
    /// Create a processor; a zero chunk size falls back to the default
    pub fn new(chunk_size: usize) -> Self {
        let chunk_size = if chunk_size == 0 {
            DEFAULT_CHUNK_SIZE
        } else {
            chunk_size
        };
        Self { chunk_size }
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Validate every row and report progress after each chunk
    ///
    /// The column check runs on the first row's headers before any chunk;
    /// when it fails no row is validated and no progress is emitted.
    pub async fn process(
        &self,
        rows: &[RawRow],
        resolver: &SchemaResolver,
        progress: &dyn ProgressSink,
    ) -> Result<BatchOutcome> {
        let start = Instant::now();
        let first = rows.first().ok_or(CustomerMapError::EmptyInput)?;
        let schema = resolver.resolve_columns(first.headers())?;
        let validator = RecordValidator::new(schema);

        let total = rows.len();
        let mut outcome = BatchOutcome::default();
        let mut done = 0;

        for chunk in rows.chunks(self.chunk_size) {
            for (offset, row) in chunk.iter().enumerate() {
                match validator.validate(row, done + offset) {
                    Ok(customer) => outcome.customers.push(customer),
                    Err(rejection) => {
                        debug!("Rejected {}", rejection);
                        outcome.rejections.push(rejection);
                    }
                }
            }
            done += chunk.len();
            outcome.stats.chunks += 1;

            let percent = percent_complete(done, total);
            debug!("Validated {}/{} rows ({}%)", done, total, percent);
            progress.update(percent);
            tokio::task::yield_now().await;
        }

        outcome.stats.total_rows = total;
        outcome.stats.valid = outcome.customers.len();
        outcome.stats.rejected = outcome.rejections.len();
        outcome.stats.elapsed = start.elapsed();

        info!(
            "Validation complete: {} valid, {} rejected of {} rows in {} chunks",
            outcome.stats.valid, outcome.stats.rejected, total, outcome.stats.chunks
        );

        if outcome.customers.is_empty() {
            return Err(CustomerMapError::NoValidData);
        }
        Ok(outcome)
    }
}

impl Default for BatchProcessor {
    fn default() -> Self {
        Self::new(DEFAULT_CHUNK_SIZE)
    }
}
