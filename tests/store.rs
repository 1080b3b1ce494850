//! Storage Integration Tests
//!
//! File library persistence and the correction history log.

use std::sync::Arc;

use casewarden::domain::CorrectionTableEntry;
use casewarden::library::{CorrectionHistory, CorrectionRecord, FileCatalog};
use casewarden::{parse_csv, to_csv};
use tempfile::TempDir;

fn entry(row: usize, original: &str, suggested: &str) -> CorrectionTableEntry {
    CorrectionTableEntry {
        row,
        column: "Accused First Name".to_string(),
        original_value: original.to_string(),
        suggested_value: suggested.to_string(),
        reason: "Capitalization".to_string(),
    }
}

#[tokio::test]
async fn test_catalog_persists_per_owner() {
    let temp = TempDir::new().unwrap();
    let files_dir = temp.path().join("files");

    let mut catalog = FileCatalog::load(&files_dir, "auditor@example.org").await.unwrap();
    assert!(catalog.is_empty());

    catalog.upsert("cases.csv", "Case Title\nA\n");
    let path = catalog.save(&files_dir).await.unwrap();
    assert!(path.starts_with(&files_dir));

    let reloaded = FileCatalog::load(&files_dir, "auditor@example.org").await.unwrap();
    assert_eq!(reloaded.len(), 1);
    assert_eq!(reloaded.get("cases.csv").unwrap().data, "Case Title\nA\n");

    // A different owner sees nothing
    let other = FileCatalog::load(&files_dir, "someone@example.org").await.unwrap();
    assert!(other.is_empty());
}

#[tokio::test]
async fn test_resave_updates_in_place() {
    let temp = TempDir::new().unwrap();
    let files_dir = temp.path().join("files");

    let mut catalog = FileCatalog::new("owner");
    let id = catalog.upsert("cases.csv", "Case Title\nA\n").id;
    catalog.save(&files_dir).await.unwrap();

    let mut catalog = FileCatalog::load(&files_dir, "owner").await.unwrap();
    catalog.upsert("cases.csv", "Case Title\nA\nB\n");
    catalog.save(&files_dir).await.unwrap();

    let catalog = FileCatalog::load(&files_dir, "owner").await.unwrap();
    assert_eq!(catalog.len(), 1);
    let stored = catalog.get("cases.csv").unwrap();
    assert_eq!(stored.id, id);
    assert_eq!(stored.size, 15);
}

#[tokio::test]
async fn test_stored_snapshot_reloads_as_dataset() {
    let temp = TempDir::new().unwrap();
    let files_dir = temp.path().join("files");

    let original = parse_csv(
        "Case Title,Accused First Name\n\"Theft, Market\",Rajesh\n",
        "cases.csv",
    )
    .unwrap()
    .dataset;

    let mut catalog = FileCatalog::new("owner");
    catalog.upsert("cases.csv", to_csv(&original).unwrap());
    catalog.save(&files_dir).await.unwrap();

    let catalog = FileCatalog::load(&files_dir, "owner").await.unwrap();
    let stored = catalog.get("cases.csv").unwrap();
    let reloaded = parse_csv(&stored.data, &stored.name).unwrap().dataset;

    assert_eq!(reloaded.columns(), original.columns());
    assert_eq!(reloaded.cell(0, "Case Title"), Some("Theft, Market"));
}

#[tokio::test]
async fn test_history_append_and_replay() {
    let temp = TempDir::new().unwrap();
    let history = CorrectionHistory::new(temp.path().join("state").join("history.jsonl"));

    assert!(history.replay().await.unwrap().is_empty());

    history
        .append(&[
            CorrectionRecord::new("owner", "cases.csv", &entry(1, "rajesh", "Rajesh")),
            CorrectionRecord::new("owner", "cases.csv", &entry(4, "anita", "Anita")),
        ])
        .unwrap();
    history
        .append(&[CorrectionRecord::new("owner", "other.csv", &entry(2, "ravi", "Ravi"))])
        .unwrap();

    let records = history.replay().await.unwrap();
    assert_eq!(records.len(), 3);
    assert_eq!(records[0].original, "rajesh");
    assert_eq!(records[1].row, 4);
    assert_eq!(records[2].source_name, "other.csv");
}

#[tokio::test]
async fn test_concurrent_appends_do_not_interleave() {
    let temp = TempDir::new().unwrap();
    let history = Arc::new(CorrectionHistory::new(temp.path().join("history.jsonl")));

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let history = Arc::clone(&history);
            std::thread::spawn(move || {
                let records: Vec<CorrectionRecord> = (0..25)
                    .map(|j| {
                        CorrectionRecord::new(
                            &format!("owner{}", i),
                            "cases.csv",
                            &entry(j + 1, "name", "Name"),
                        )
                    })
                    .collect();
                history.append(&records).unwrap();
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    let records = history.replay().await.unwrap();
    assert_eq!(records.len(), 200);
}
