//! Full pipeline tests from file contents to store

use super::RecordingProgress;
use crate::config::Config;
use crate::error::CustomerMapError;
use crate::processor::{Ingestor, NoProgress};
use crate::store::StoreHandle;
use std::fs;
use tempfile::TempDir;

const MIXED_CSV: &str = "accno,name,longitude,lattitude\n\
                         A1,Jane,73.7,24.5\n\
                         A2,,73.7,24.5\n\
                         A3,Bob,200,24.5\n";

fn handle(temp_dir: &TempDir) -> StoreHandle {
    StoreHandle::new(temp_dir.path().join("store.json"))
}

#[tokio::test]
async fn test_end_to_end_counts_and_excluded() {
    let temp_dir = TempDir::new().unwrap();
    let store = handle(&temp_dir);
    let progress = RecordingProgress::default();

    let report = Ingestor::default()
        .ingest("customers.csv", MIXED_CSV.as_bytes().to_vec(), &store, &progress)
        .await
        .unwrap();

    assert_eq!(store.count().await.unwrap(), 1);
    assert_eq!(store.original_record_count().await.unwrap(), Some(3));
    assert_eq!(store.excluded_count().await.unwrap(), 2);
    assert_eq!(report.stats.stored, 1);
    assert_eq!(report.stats.rejected, 2);
    assert_eq!(report.stats.excluded(), 2);
    assert_eq!(report.rejections.len(), 2);

    // Reset, one chunk, reset
    assert_eq!(progress.values(), vec![0, 100, 0]);
}

#[tokio::test]
async fn test_quoted_fields_survive_ingestion() {
    let temp_dir = TempDir::new().unwrap();
    let store = handle(&temp_dir);
    let csv = "accno,name,longitude,lattitude\n123,\"Doe, Jane\",1.0,2.0\n";

    Ingestor::default()
        .ingest("q.csv", csv.as_bytes().to_vec(), &store, &NoProgress)
        .await
        .unwrap();

    let customer = store.get("123").await.unwrap().unwrap();
    assert_eq!(customer.name, "Doe, Jane");
    assert_eq!(customer.longitude, 1.0);
    assert_eq!(customer.latitude, 2.0);
}

#[tokio::test]
async fn test_failed_ingest_keeps_previous_dataset() {
    let temp_dir = TempDir::new().unwrap();
    let store = handle(&temp_dir);
    let ingestor = Ingestor::default();

    ingestor
        .ingest("first.csv", MIXED_CSV.as_bytes().to_vec(), &store, &NoProgress)
        .await
        .unwrap();

    let progress = RecordingProgress::default();
    let error = ingestor
        .ingest("bad.csv", b"accno,longitude\nA9,10\n".to_vec(), &store, &progress)
        .await
        .unwrap_err();

    assert!(matches!(error, CustomerMapError::MissingColumns { .. }));
    assert_eq!(progress.values(), vec![0, 0]);
    assert_eq!(store.count().await.unwrap(), 1);
    assert_eq!(store.metadata().await.unwrap().source.as_deref(), Some("first.csv"));
}

#[tokio::test]
async fn test_reingest_replaces_dataset() {
    let temp_dir = TempDir::new().unwrap();
    let store = handle(&temp_dir);
    let ingestor = Ingestor::default();

    ingestor
        .ingest("first.csv", MIXED_CSV.as_bytes().to_vec(), &store, &NoProgress)
        .await
        .unwrap();
    ingestor
        .ingest(
            "second.csv",
            b"accno,name,longitude,lattitude\nB1,Bea,1,1\nB2,Ben,2,2\n".to_vec(),
            &store,
            &NoProgress,
        )
        .await
        .unwrap();

    assert_eq!(store.count().await.unwrap(), 2);
    assert!(store.get("A1").await.unwrap().is_none());
    assert_eq!(store.excluded_count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_unsupported_and_empty_inputs() {
    let temp_dir = TempDir::new().unwrap();
    let store = handle(&temp_dir);
    let ingestor = Ingestor::default();

    let error = ingestor
        .ingest("notes.txt", b"hello".to_vec(), &store, &NoProgress)
        .await
        .unwrap_err();
    assert!(matches!(error, CustomerMapError::UnsupportedFormat { .. }));

    let error = ingestor
        .ingest("empty.csv", b"accno,name,longitude,lattitude\n".to_vec(), &store, &NoProgress)
        .await
        .unwrap_err();
    assert!(matches!(error, CustomerMapError::EmptyInput));
}

#[tokio::test]
async fn test_ingest_path_with_custom_column_names() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("renamed.csv");
    fs::write(&path, "Account,Customer Name,Lng,Lat\nX1,Xena,5,6\n").unwrap();

    let mut config = Config::default().with_chunk_size(10);
    config.ingest.columns.accno = "account".to_string();
    config.ingest.columns.longitude = "lng".to_string();
    config.ingest.columns.latitude = "lat".to_string();

    let store = handle(&temp_dir);
    let report = Ingestor::new(&config)
        .ingest_path(&path, &store, &NoProgress)
        .await
        .unwrap();

    assert_eq!(report.stats.source, "renamed.csv");
    let customer = store.get("X1").await.unwrap().unwrap();
    assert_eq!(customer.name, "Xena");
    assert_eq!(customer.longitude, 5.0);
}
