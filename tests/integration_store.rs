//! Integration tests for store persistence across process restarts
//!
//! Each "process" is simulated by a fresh context over the same snapshot.

use customer_map::processor::NoProgress;
use customer_map::store::HandleState;
use customer_map::{AppContext, Config};
use tempfile::TempDir;

const CSV: &[u8] = b"accno,name,longitude,lattitude\n\
AB100,X,73.7,24.5\n\
CD200,AB Traders,73.8,24.6\n\
,Nobody,73.9,24.7\n";

fn config(temp_dir: &TempDir) -> Config {
    Config::default().with_store_path(temp_dir.path().join("data").join("store.json"))
}

#[tokio::test]
async fn test_dataset_survives_restart() {
    let temp_dir = TempDir::new().unwrap();
    {
        let mut ctx = AppContext::new(config(&temp_dir)).unwrap();
        ctx.ingest_bytes("customers.csv", CSV.to_vec(), &NoProgress)
            .await
            .unwrap();
    }

    let ctx = AppContext::new(config(&temp_dir)).unwrap();
    assert_eq!(ctx.store().state(), HandleState::Closed);

    let query = ctx.query();
    assert_eq!(query.count().await.unwrap(), 2);
    assert_eq!(query.excluded_count().await.unwrap(), 1);
    assert_eq!(ctx.store().state(), HandleState::Open);

    let metadata = ctx.store().metadata().await.unwrap();
    assert_eq!(metadata.source.as_deref(), Some("customers.csv"));
    assert_eq!(metadata.original_record_count, Some(3));

    let results = query.search_page("AB").await.unwrap();
    let accnos: Vec<_> = results.iter().map(|c| c.accno.as_str()).collect();
    assert_eq!(accnos, vec!["AB100", "CD200"]);
}

#[tokio::test]
async fn test_clear_survives_restart() {
    let temp_dir = TempDir::new().unwrap();
    {
        let mut ctx = AppContext::new(config(&temp_dir)).unwrap();
        ctx.ingest_bytes("customers.csv", CSV.to_vec(), &NoProgress)
            .await
            .unwrap();
        ctx.clear().await.unwrap();
    }

    let ctx = AppContext::new(config(&temp_dir)).unwrap();
    assert_eq!(ctx.query().count().await.unwrap(), 0);
    assert_eq!(ctx.query().excluded_count().await.unwrap(), 0);
    assert!(ctx.query().initial_page().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_select_then_show_details() {
    let temp_dir = TempDir::new().unwrap();
    let mut ctx = AppContext::new(config(&temp_dir)).unwrap();
    ctx.ingest_bytes("customers.csv", CSV.to_vec(), &NoProgress)
        .await
        .unwrap();

    ctx.select("CD200").await.unwrap();
    let selected = ctx.selected().await.unwrap().unwrap();
    let lines = selected.detail_lines();

    assert_eq!(lines[0], ("Name", "AB Traders".to_string()));
    assert_eq!(
        lines.last().unwrap().1,
        "24.600000, 73.800000".to_string()
    );
}
