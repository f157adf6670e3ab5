//! Ingestion pipeline.
//!
//! [`Ingestor`] runs the whole pipeline for one file: format detection,
//! parsing, chunked validation through [`BatchProcessor`], and an atomic
//! replace of the store's dataset. Progress flows to any [`ProgressSink`].

pub mod batch;
pub mod ingest;
pub mod progress;

#[cfg(test)]
pub mod tests;

pub use batch::{BatchOutcome, BatchProcessor, BatchStats};
pub use ingest::{IngestReport, IngestStats, Ingestor};
pub use progress::{
    ChannelProgress, NoProgress, ProgressBarSink, ProgressSink, percent_complete,
    progress_channel,
};
