//! Tests for the ingestion pipeline
//!
//! Drives chunked validation and full file ingestion against temporary
//! stores.

pub mod batch_tests;
pub mod ingest_tests;

use std::sync::Mutex;

/// Progress sink that records every value it receives
#[derive(Debug, Default)]
pub(crate) struct RecordingProgress {
    values: Mutex<Vec<u8>>,
}

impl RecordingProgress {
    pub(crate) fn values(&self) -> Vec<u8> {
        self.values.lock().unwrap().clone()
    }
}

impl crate::processor::ProgressSink for RecordingProgress {
    fn update(&self, percent: u8) {
        self.values.lock().unwrap().push(percent);
    }
}
