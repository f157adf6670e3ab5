//! Chunked validation tests

use super::RecordingProgress;
use crate::error::CustomerMapError;
use crate::models::RawRow;
use crate::processor::BatchProcessor;
use crate::schema::SchemaResolver;
use std::sync::Arc;

fn rows(headers: &[&str], data: &[&[&str]]) -> Vec<RawRow> {
    let headers: Arc<[String]> = headers.iter().map(|s| s.to_string()).collect();
    data.iter()
        .map(|values| RawRow::new(headers.clone(), values.iter().map(|s| s.to_string()).collect()))
        .collect()
}

const HEADERS: &[&str] = &["accno", "name", "longitude", "lattitude"];

#[tokio::test]
async fn test_progress_is_monotonic_and_reaches_100() {
    let data: Vec<Vec<String>> = (0..10)
        .map(|i| vec![format!("A{}", i), "Name".into(), "10".into(), "20".into()])
        .collect();
    let data: Vec<Vec<&str>> = data
        .iter()
        .map(|row| row.iter().map(String::as_str).collect())
        .collect();
    let data: Vec<&[&str]> = data.iter().map(Vec::as_slice).collect();
    let input = rows(HEADERS, &data);

    let progress = RecordingProgress::default();
    let outcome = BatchProcessor::new(3)
        .process(&input, &SchemaResolver::default(), &progress)
        .await
        .unwrap();

    assert_eq!(progress.values(), vec![30, 60, 90, 100]);
    assert_eq!(outcome.stats.chunks, 4);
    assert_eq!(outcome.stats.valid, 10);
    assert_eq!(outcome.stats.total_rows, 10);
}

#[tokio::test]
async fn test_missing_columns_fail_before_any_validation() {
    let input = rows(
        &["accno", "longitude", "lattitude"],
        &[&["A1", "10", "20"], &["", "", ""]],
    );
    let progress = RecordingProgress::default();

    let error = BatchProcessor::default()
        .process(&input, &SchemaResolver::default(), &progress)
        .await
        .unwrap_err();

    match error {
        CustomerMapError::MissingColumns { missing } => assert_eq!(missing, vec!["name"]),
        other => panic!("unexpected error: {other}"),
    }
    assert!(progress.values().is_empty());
}

#[tokio::test]
async fn test_empty_input_is_an_error() {
    let progress = RecordingProgress::default();
    let error = BatchProcessor::default()
        .process(&[], &SchemaResolver::default(), &progress)
        .await
        .unwrap_err();
    assert!(matches!(error, CustomerMapError::EmptyInput));
}

#[tokio::test]
async fn test_all_rows_rejected_is_no_valid_data() {
    let input = rows(HEADERS, &[&["A1", "X", "abc", "20"], &["", "Y", "10", "20"]]);
    let error = BatchProcessor::default()
        .process(&input, &SchemaResolver::default(), &RecordingProgress::default())
        .await
        .unwrap_err();
    assert!(matches!(error, CustomerMapError::NoValidData));
}

#[tokio::test]
async fn test_order_preserved_and_rejections_indexed() {
    let input = rows(
        HEADERS,
        &[
            &["C3", "Carol", "10", "20"],
            &["B2", "Bob", "10", "95"],
            &["A1", "Alice", "0", "0"],
        ],
    );
    let outcome = BatchProcessor::new(2)
        .process(&input, &SchemaResolver::default(), &RecordingProgress::default())
        .await
        .unwrap();

    let accnos: Vec<_> = outcome.customers.iter().map(|c| c.accno.as_str()).collect();
    assert_eq!(accnos, vec!["C3", "A1"]);
    assert_eq!(outcome.rejections.len(), 1);
    assert_eq!(outcome.rejections[0].row_index, 1);
    assert_eq!(outcome.rejections[0].accno, "B2");
}

#[test]
fn test_zero_chunk_size_uses_default() {
    assert_eq!(BatchProcessor::new(0).chunk_size(), 1000);
}
