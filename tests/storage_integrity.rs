//! Storage Integrity Tests
//!
//! - corrupted units fail loudly instead of returning partial data
//! - interrupted writes never become visible
//! - abandoned staging files are removed on open, live ones are kept
//! - a reader keeps its snapshot across a concurrent replace

use std::fs;
use std::path::PathBuf;
use std::time::{Duration, SystemTime};

use gridstore::api::{DatasetService, ErrorKind};
use gridstore::planner::Conjunction;
use gridstore::schema::{SchemaInferencer, TabularFormat};
use gridstore::storage::{DatasetStore, StorageErrorCode, STAGING_GRACE};
use tempfile::TempDir;

fn unit_path(temp_dir: &TempDir, name: &str) -> PathBuf {
    temp_dir.path().join("datasets").join(format!("{}.grid", name))
}

fn load(store: &DatasetStore, name: &str, rows: &[[&str; 2]]) {
    let schema = SchemaInferencer::infer(["a", "b"], TabularFormat::Csv).unwrap();
    store.create_or_replace(name, &schema).unwrap();
    store
        .bulk_load(
            name,
            rows.iter()
                .map(|r| r.iter().map(|v| v.to_string()).collect::<Vec<_>>()),
        )
        .unwrap();
}

#[test]
fn test_corruption_is_reported() {
    let temp_dir = TempDir::new().unwrap();
    let store = DatasetStore::open(temp_dir.path()).unwrap();
    load(&store, "alice", &[["alpha", "beta"], ["gamma", "delta"]]);

    let path = unit_path(&temp_dir, "alice");
    let mut contents = fs::read(&path).unwrap();
    let last = contents.len() - 3;
    contents[last] ^= 0xFF;
    fs::write(&path, contents).unwrap();

    let err = store.count("alice", &Conjunction::always()).unwrap_err();
    assert_eq!(err.code(), StorageErrorCode::DataCorruption);

    let service = DatasetService::new(store);
    let err = service.total_count("alice").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::StorageFailure);
    assert_eq!(err.http_status(), 500);
    assert!(err.message().contains("DATA_CORRUPTION"));
}

#[test]
fn test_corrupted_schema_record() {
    let temp_dir = TempDir::new().unwrap();
    let store = DatasetStore::open(temp_dir.path()).unwrap();
    load(&store, "alice", &[["x", "y"]]);

    let path = unit_path(&temp_dir, "alice");
    let mut contents = fs::read(&path).unwrap();
    contents[10] ^= 0xFF;
    fs::write(&path, contents).unwrap();

    assert!(store.schema("alice").is_err());
}

#[test]
fn test_abandoned_generation_is_invisible() {
    let temp_dir = TempDir::new().unwrap();
    let store = DatasetStore::open(temp_dir.path()).unwrap();
    load(&store, "alice", &[["1", "2"]]);

    let schema = SchemaInferencer::infer(["c"], TabularFormat::Csv).unwrap();
    {
        let mut generation = store.begin_generation("alice", &schema).unwrap();
        generation.append(vec!["new".into()]).unwrap();
        // dropped without commit
    }

    assert_eq!(store.count("alice", &Conjunction::always()).unwrap(), 1);
    assert_eq!(store.schema("alice").unwrap().column_count(), 2);

    let leftovers: Vec<_> = fs::read_dir(temp_dir.path().join("datasets"))
        .unwrap()
        .filter_map(Result::ok)
        .filter(|e| e.file_name().to_string_lossy().ends_with(".staging"))
        .collect();
    assert!(leftovers.is_empty());
}

#[test]
fn test_only_stale_staging_removed_on_open() {
    let temp_dir = TempDir::new().unwrap();
    {
        let store = DatasetStore::open(temp_dir.path()).unwrap();
        load(&store, "alice", &[["1", "2"]]);
    }

    let stale = temp_dir
        .path()
        .join("datasets")
        .join(".alice.0000.staging");
    fs::write(&stale, b"partial").unwrap();
    fs::File::options()
        .write(true)
        .open(&stale)
        .unwrap()
        .set_modified(SystemTime::now() - STAGING_GRACE - Duration::from_secs(1))
        .unwrap();

    let fresh = temp_dir
        .path()
        .join("datasets")
        .join(".alice.1111.staging");
    fs::write(&fresh, b"in flight").unwrap();

    let store = DatasetStore::open(temp_dir.path()).unwrap();
    assert!(!stale.exists());
    assert!(fresh.exists());
    assert_eq!(store.count("alice", &Conjunction::always()).unwrap(), 1);
    assert_eq!(store.list().unwrap(), vec!["alice".to_string()]);
}

#[test]
fn test_reader_keeps_snapshot_across_replace() {
    let temp_dir = TempDir::new().unwrap();
    let store = DatasetStore::open(temp_dir.path()).unwrap();
    load(&store, "alice", &[["1", "a"], ["2", "b"], ["3", "c"]]);

    let mut cursor = store.open_scan("alice", &Conjunction::always()).unwrap();
    let first = cursor.next().unwrap().unwrap();
    assert_eq!(first.values, vec!["1", "a"]);

    load(&store, "alice", &[["9", "z"]]);
    store.drop_dataset("alice").unwrap();

    let rest: Vec<_> = cursor.map(|r| r.unwrap().values[0].clone()).collect();
    assert_eq!(rest, vec!["2", "3"]);
}

#[test]
fn test_invalid_names_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let store = DatasetStore::open(temp_dir.path()).unwrap();
    let schema = SchemaInferencer::infer(["a"], TabularFormat::Csv).unwrap();

    for name in ["", "../etc", ".hidden", "a/b", "white space"] {
        let err = store.create_or_replace(name, &schema).unwrap_err();
        assert_eq!(err.code(), StorageErrorCode::InvalidDatasetName, "{name}");
    }
}
