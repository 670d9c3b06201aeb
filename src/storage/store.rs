//! Dataset store
//!
//! One unit file per dataset name under `<data_dir>/datasets/`.
//!
//! Every mutation builds a complete new generation in a staging file and
//! publishes it with a single rename:
//! - readers holding an open unit keep reading the generation they opened
//! - a failed or abandoned write leaves the committed generation untouched
//! - writers to the same name are serialized; different names never contend
//!
//! Leftover staging files from a crash are removed on `open`.

use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, OnceLock};
use std::time::{Duration, SystemTime};

use regex::Regex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::errors::{StorageError, StorageResult};
use super::reader::UnitReader;
use super::record::StoredRow;
use super::writer::UnitWriter;
use crate::executor::PredicateFilter;
use crate::planner::Conjunction;
use crate::schema::DatasetSchema;

const DATASETS_DIR: &str = "datasets";
const UNIT_EXTENSION: &str = "grid";
const STAGING_SUFFIX: &str = ".staging";

/// Staging files untouched for this long belong to no live writer.
/// Another process sharing the directory may still be writing newer ones.
pub const STAGING_GRACE: Duration = Duration::from_secs(10 * 60);

fn dataset_name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_.-]{0,127}$").expect("dataset name pattern is valid")
    })
}

/// Returns true if `name` can be used as a dataset name.
pub fn is_valid_dataset_name(name: &str) -> bool {
    dataset_name_pattern().is_match(name)
}

struct StoreInner {
    datasets_dir: PathBuf,
    /// Names with an active writer
    writers: Mutex<HashSet<String>>,
    released: Condvar,
}

impl StoreInner {
    fn lock_writers(&self) -> MutexGuard<'_, HashSet<String>> {
        // The set is only touched by insert/remove, so a poisoned lock
        // still holds consistent data.
        self.writers.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Exclusive right to write one dataset name. Released on drop.
struct WriterSlot {
    inner: Arc<StoreInner>,
    name: String,
}

impl WriterSlot {
    fn acquire(inner: &Arc<StoreInner>, name: &str) -> Self {
        let mut writers = inner.lock_writers();
        while writers.contains(name) {
            debug!(dataset = name, "waiting for active writer");
            writers = inner
                .released
                .wait(writers)
                .unwrap_or_else(|e| e.into_inner());
        }
        writers.insert(name.to_string());

        Self {
            inner: Arc::clone(inner),
            name: name.to_string(),
        }
    }
}

impl Drop for WriterSlot {
    fn drop(&mut self) {
        self.inner.lock_writers().remove(&self.name);
        self.inner.released.notify_all();
    }
}

/// Durable, per-name dataset storage.
///
/// Cheap to clone; clones share the writer registry.
#[derive(Clone)]
pub struct DatasetStore {
    inner: Arc<StoreInner>,
}

impl DatasetStore {
    /// Opens (creating if needed) a store rooted at `data_dir`.
    ///
    /// Removes staging files left behind by an interrupted write, once
    /// they are older than `STAGING_GRACE`.
    pub fn open(data_dir: impl AsRef<Path>) -> StorageResult<Self> {
        let datasets_dir = data_dir.as_ref().join(DATASETS_DIR);
        fs::create_dir_all(&datasets_dir).map_err(|e| {
            StorageError::io_error(
                format!("Failed to create data directory: {}", datasets_dir.display()),
                e,
            )
        })?;

        let entries = fs::read_dir(&datasets_dir).map_err(|e| {
            StorageError::io_error(
                format!("Failed to list data directory: {}", datasets_dir.display()),
                e,
            )
        })?;

        let now = SystemTime::now();
        let mut removed = 0usize;
        let mut kept = 0usize;
        for entry in entries {
            let entry =
                entry.map_err(|e| StorageError::io_error("Failed to read directory entry", e))?;
            let path = entry.path();
            let is_staging = path
                .file_name()
                .and_then(|n| n.to_str())
                .map_or(false, |n| n.ends_with(STAGING_SUFFIX));
            if !is_staging {
                continue;
            }
            if !is_abandoned(&entry, now) {
                kept += 1;
                continue;
            }
            match fs::remove_file(&path) {
                Ok(()) => removed += 1,
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => {
                    return Err(StorageError::io_error(
                        format!("Failed to remove staging file: {}", path.display()),
                        e,
                    ))
                }
            }
        }

        info!(
            data_dir = %datasets_dir.display(),
            staging_removed = removed,
            staging_in_flight = kept,
            "dataset store opened"
        );

        Ok(Self {
            inner: Arc::new(StoreInner {
                datasets_dir,
                writers: Mutex::new(HashSet::new()),
                released: Condvar::new(),
            }),
        })
    }

    /// Directory holding the unit files.
    pub fn datasets_dir(&self) -> &Path {
        &self.inner.datasets_dir
    }

    fn unit_path(&self, name: &str) -> StorageResult<PathBuf> {
        if !is_valid_dataset_name(name) {
            return Err(StorageError::invalid_dataset_name(name));
        }
        Ok(self
            .inner
            .datasets_dir
            .join(format!("{}.{}", name, UNIT_EXTENSION)))
    }

    fn staging_path(&self, name: &str) -> PathBuf {
        self.inner
            .datasets_dir
            .join(format!(".{}.{}{}", name, Uuid::new_v4(), STAGING_SUFFIX))
    }

    fn open_unit(&self, name: &str) -> StorageResult<UnitReader> {
        let path = self.unit_path(name)?;
        UnitReader::open(&path).map_err(|e| match e.source_io_kind() {
            Some(io::ErrorKind::NotFound) => StorageError::dataset_not_found(name),
            _ => e,
        })
    }

    fn start_generation(
        &self,
        slot: WriterSlot,
        schema: &DatasetSchema,
    ) -> StorageResult<Generation> {
        let final_path = self.unit_path(&slot.name)?;
        let staging_path = self.staging_path(&slot.name);
        let writer = UnitWriter::create(&staging_path, schema)?;

        debug!(
            dataset = %slot.name,
            staging = %staging_path.display(),
            columns = schema.column_count(),
            "generation started"
        );

        Ok(Generation {
            slot,
            writer: Some(writer),
            staging_path,
            final_path,
            committed: false,
        })
    }

    /// Starts a new generation for `name` with `schema`.
    ///
    /// Blocks while another writer holds the name. The committed
    /// generation (if any) stays visible until `Generation::commit`.
    pub fn begin_generation(
        &self,
        name: &str,
        schema: &DatasetSchema,
    ) -> StorageResult<Generation> {
        self.unit_path(name)?;
        let slot = WriterSlot::acquire(&self.inner, name);
        self.start_generation(slot, schema)
    }

    /// Replaces any existing unit for `name` with an empty one shaped by
    /// `schema`. Repeating the call leaves the same state.
    pub fn create_or_replace(&self, name: &str, schema: &DatasetSchema) -> StorageResult<()> {
        self.begin_generation(name, schema)?.commit()?;
        Ok(())
    }

    /// Appends rows to an existing dataset, all or nothing.
    ///
    /// Returns the number of rows appended.
    pub fn bulk_load<I>(&self, name: &str, rows: I) -> StorageResult<u64>
    where
        I: IntoIterator<Item = Vec<String>>,
    {
        self.unit_path(name)?;
        let slot = WriterSlot::acquire(&self.inner, name);

        let mut current = self.open_unit(name)?;
        let schema = current.schema().clone();
        let mut generation = self.start_generation(slot, &schema)?;

        while let Some(row) = current.read_row()? {
            generation.append(row)?;
        }
        let existing = generation.rows_written();

        for row in rows {
            generation.append(row)?;
        }
        let total = generation.commit()?;

        Ok(total - existing)
    }

    /// Counts rows matching `predicate`.
    pub fn count(&self, name: &str, predicate: &Conjunction) -> StorageResult<u64> {
        let mut total = 0u64;
        for row in self.open_scan(name, predicate)? {
            row?;
            total += 1;
        }
        Ok(total)
    }

    /// Returns matching rows `offset..offset + limit` in storage order.
    pub fn scan(
        &self,
        name: &str,
        predicate: &Conjunction,
        offset: u64,
        limit: u64,
    ) -> StorageResult<Vec<StoredRow>> {
        let mut rows = Vec::new();
        if limit == 0 {
            return Ok(rows);
        }
        for row in self.open_scan(name, predicate)?.skip_matches(offset) {
            rows.push(row?);
            if rows.len() as u64 >= limit {
                break;
            }
        }
        Ok(rows)
    }

    /// Opens a streaming cursor over matching rows of the current generation.
    pub fn open_scan(&self, name: &str, predicate: &Conjunction) -> StorageResult<RowCursor> {
        let reader = self.open_unit(name)?;
        Ok(RowCursor {
            reader,
            filter: PredicateFilter::new(predicate),
            position: 0,
            skip: 0,
            done: false,
        })
    }

    /// Returns the schema of the current generation.
    pub fn schema(&self, name: &str) -> StorageResult<DatasetSchema> {
        Ok(self.open_unit(name)?.schema().clone())
    }

    /// Returns true if a committed generation exists for `name`.
    pub fn exists(&self, name: &str) -> StorageResult<bool> {
        let path = self.unit_path(name)?;
        Ok(path.is_file())
    }

    /// Removes the dataset. Waits for any active writer first.
    pub fn drop_dataset(&self, name: &str) -> StorageResult<()> {
        let path = self.unit_path(name)?;
        let _slot = WriterSlot::acquire(&self.inner, name);

        match fs::remove_file(&path) {
            Ok(()) => {
                info!(dataset = name, "dataset dropped");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(StorageError::dataset_not_found(name))
            }
            Err(e) => Err(StorageError::io_error(
                format!("Failed to remove unit file: {}", path.display()),
                e,
            )),
        }
    }

    /// Names of all committed datasets, sorted.
    pub fn list(&self) -> StorageResult<Vec<String>> {
        let entries = fs::read_dir(&self.inner.datasets_dir)
            .map_err(|e| StorageError::io_error("Failed to list data directory", e))?;

        let mut names = Vec::new();
        for entry in entries {
            let entry =
                entry.map_err(|e| StorageError::io_error("Failed to read directory entry", e))?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(UNIT_EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                if is_valid_dataset_name(stem) {
                    names.push(stem.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }
}

/// A staged generation of one dataset.
///
/// Holds the dataset's writer slot until committed or dropped. Dropping
/// without `commit` deletes the staging file.
pub struct Generation {
    slot: WriterSlot,
    writer: Option<UnitWriter>,
    staging_path: PathBuf,
    final_path: PathBuf,
    committed: bool,
}

impl Generation {
    /// Rows staged so far
    pub fn rows_written(&self) -> u64 {
        self.writer.as_ref().map_or(0, UnitWriter::rows_written)
    }

    /// Stages one row.
    pub fn append(&mut self, values: Vec<String>) -> StorageResult<()> {
        match self.writer.as_mut() {
            Some(writer) => writer.append(values),
            None => Err(StorageError::write_failed(
                "Generation already finished",
                io::Error::new(io::ErrorKind::Other, "writer closed"),
            )),
        }
    }

    /// Makes the generation visible. Returns the number of rows stored.
    pub fn commit(mut self) -> StorageResult<u64> {
        let writer = self.writer.take().ok_or_else(|| {
            StorageError::write_failed(
                "Generation already finished",
                io::Error::new(io::ErrorKind::Other, "writer closed"),
            )
        })?;
        let rows = writer.finish()?;

        fs::rename(&self.staging_path, &self.final_path).map_err(|e| {
            StorageError::write_failed(
                format!("Failed to publish unit: {}", self.final_path.display()),
                e,
            )
        })?;
        self.committed = true;

        if let Some(dir) = self.final_path.parent() {
            sync_dir(dir);
        }

        info!(dataset = %self.slot.name, rows, "generation committed");
        Ok(rows)
    }
}

impl Drop for Generation {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        // Close the handle before unlinking
        self.writer.take();
        match fs::remove_file(&self.staging_path) {
            Ok(()) => debug!(dataset = %self.slot.name, "staged generation discarded"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => warn!(
                dataset = %self.slot.name,
                staging = %self.staging_path.display(),
                error = %e,
                "failed to remove staging file"
            ),
        }
    }
}

#[cfg(unix)]
fn sync_dir(dir: &Path) {
    if let Err(e) = fs::File::open(dir).and_then(|f| f.sync_all()) {
        warn!(dir = %dir.display(), error = %e, "directory fsync failed");
    }
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) {}

/// A staging file is abandoned once its last write is older than the
/// grace period. Unknown timestamps count as live.
fn is_abandoned(entry: &fs::DirEntry, now: SystemTime) -> bool {
    entry
        .metadata()
        .and_then(|m| m.modified())
        .ok()
        .and_then(|modified| now.duration_since(modified).ok())
        .map_or(false, |age| age >= STAGING_GRACE)
}

/// Streaming cursor over the matching rows of one generation.
///
/// Row ids are storage positions, so they are stable across filters.
/// After the first error the cursor yields nothing further.
pub struct RowCursor {
    reader: UnitReader,
    filter: PredicateFilter,
    position: u64,
    skip: u64,
    done: bool,
}

impl RowCursor {
    /// Schema of the generation being read
    pub fn schema(&self) -> &DatasetSchema {
        self.reader.schema()
    }

    /// Replaces the predicate before iteration starts.
    ///
    /// Lets a caller plan against this cursor's schema and then filter the
    /// same generation.
    pub fn with_predicate(mut self, predicate: &Conjunction) -> Self {
        self.filter = PredicateFilter::new(predicate);
        self
    }

    /// Skips the first `n` matching rows.
    pub fn skip_matches(mut self, n: u64) -> Self {
        self.skip = n;
        self
    }
}

impl Iterator for RowCursor {
    type Item = StorageResult<StoredRow>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        loop {
            match self.reader.read_row() {
                Ok(Some(values)) => {
                    self.position += 1;
                    if !self.filter.matches(&values) {
                        continue;
                    }
                    if self.skip > 0 {
                        self.skip -= 1;
                        continue;
                    }
                    return Some(Ok(StoredRow {
                        id: self.position,
                        values,
                    }));
                }
                Ok(None) => {
                    self.done = true;
                    return None;
                }
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planner::Predicate;
    use crate::storage::StorageErrorCode;
    use crate::schema::{ColumnId, SchemaInferencer, TabularFormat};
    use tempfile::TempDir;

    fn schema(n: usize) -> DatasetSchema {
        let headers: Vec<String> = (0..n).map(|i| format!("h{}", i)).collect();
        SchemaInferencer::infer(&headers, TabularFormat::Csv).unwrap()
    }

    fn rows(values: &[&[&str]]) -> Vec<Vec<String>> {
        values
            .iter()
            .map(|r| r.iter().map(|s| s.to_string()).collect())
            .collect()
    }

    fn seed(store: &DatasetStore, name: &str, columns: usize, values: &[&[&str]]) {
        store.create_or_replace(name, &schema(columns)).unwrap();
        store.bulk_load(name, rows(values)).unwrap();
    }

    fn age_file(path: &Path, age: Duration) {
        fs::File::options()
            .write(true)
            .open(path)
            .unwrap()
            .set_modified(SystemTime::now() - age)
            .unwrap();
    }

    fn staging_files(store: &DatasetStore) -> usize {
        fs::read_dir(store.datasets_dir())
            .unwrap()
            .filter(|e| {
                e.as_ref()
                    .unwrap()
                    .file_name()
                    .to_string_lossy()
                    .ends_with(STAGING_SUFFIX)
            })
            .count()
    }

    #[test]
    fn test_create_is_empty_and_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        let store = DatasetStore::open(temp_dir.path()).unwrap();

        store.create_or_replace("alice", &schema(2)).unwrap();
        store.create_or_replace("alice", &schema(2)).unwrap();
        assert!(store.exists("alice").unwrap());
        assert_eq!(store.count("alice", &Conjunction::always()).unwrap(), 0);
        assert_eq!(store.schema("alice").unwrap(), schema(2));
    }

    #[test]
    fn test_replace_discards_previous_generation() {
        let temp_dir = TempDir::new().unwrap();
        let store = DatasetStore::open(temp_dir.path()).unwrap();

        seed(&store, "alice", 3, &[&["1", "2", "3"]]);
        seed(&store, "alice", 2, &[&["x", "y"], &["z", "w"]]);

        assert_eq!(store.schema("alice").unwrap().column_count(), 2);
        let all = store.scan("alice", &Conjunction::always(), 0, 10).unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].values, vec!["x", "y"]);
    }

    #[test]
    fn test_failed_generation_keeps_previous_one() {
        let temp_dir = TempDir::new().unwrap();
        let store = DatasetStore::open(temp_dir.path()).unwrap();
        seed(&store, "alice", 2, &[&["a", "b"]]);

        let mut generation = store.begin_generation("alice", &schema(2)).unwrap();
        generation.append(vec!["c".into(), "d".into()]).unwrap();
        let err = generation.append(vec!["e".into()]).unwrap_err();
        assert_eq!(err.code(), StorageErrorCode::RowArityMismatch);
        drop(generation);

        let all = store.scan("alice", &Conjunction::always(), 0, 10).unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].values, vec!["a", "b"]);
        assert_eq!(staging_files(&store), 0);
    }

    #[test]
    fn test_dropped_generation_is_invisible() {
        let temp_dir = TempDir::new().unwrap();
        let store = DatasetStore::open(temp_dir.path()).unwrap();

        {
            let mut generation = store.begin_generation("bob", &schema(1)).unwrap();
            generation.append(vec!["x".into()]).unwrap();
        }

        assert!(!store.exists("bob").unwrap());
        assert_eq!(staging_files(&store), 0);
        let err = store.count("bob", &Conjunction::always()).unwrap_err();
        assert_eq!(err.code(), StorageErrorCode::DatasetNotFound);
    }

    #[test]
    fn test_generation_commit_publishes_rows() {
        let temp_dir = TempDir::new().unwrap();
        let store = DatasetStore::open(temp_dir.path()).unwrap();

        let mut generation = store.begin_generation("bob", &schema(1)).unwrap();
        generation.append(vec!["x".into()]).unwrap();
        generation.append(vec!["y".into()]).unwrap();
        assert_eq!(generation.rows_written(), 2);
        assert_eq!(generation.commit().unwrap(), 2);

        assert_eq!(store.count("bob", &Conjunction::always()).unwrap(), 2);
        assert_eq!(staging_files(&store), 0);
    }

    #[test]
    fn test_bulk_load_appends() {
        let temp_dir = TempDir::new().unwrap();
        let store = DatasetStore::open(temp_dir.path()).unwrap();

        seed(&store, "alice", 2, &[&["a", "b"]]);
        let appended = store
            .bulk_load("alice", rows(&[&["c", "d"], &["e", "f"]]))
            .unwrap();
        assert_eq!(appended, 2);

        let all = store.scan("alice", &Conjunction::always(), 0, 10).unwrap();
        let ids: Vec<u64> = all.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_bulk_load_is_all_or_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let store = DatasetStore::open(temp_dir.path()).unwrap();

        seed(&store, "alice", 2, &[&["a", "b"]]);
        let err = store
            .bulk_load("alice", rows(&[&["c", "d"], &["bad"]]))
            .unwrap_err();
        assert_eq!(err.code(), StorageErrorCode::RowArityMismatch);
        assert_eq!(store.count("alice", &Conjunction::always()).unwrap(), 1);
        assert_eq!(staging_files(&store), 0);
    }

    #[test]
    fn test_bulk_load_unknown_dataset() {
        let temp_dir = TempDir::new().unwrap();
        let store = DatasetStore::open(temp_dir.path()).unwrap();

        let err = store.bulk_load("ghost", rows(&[&["a"]])).unwrap_err();
        assert_eq!(err.code(), StorageErrorCode::DatasetNotFound);
    }

    #[test]
    fn test_scan_ids_are_storage_positions() {
        let temp_dir = TempDir::new().unwrap();
        let store = DatasetStore::open(temp_dir.path()).unwrap();
        seed(
            &store,
            "alice",
            1,
            &[&["apple"], &["berry"], &["apricot"], &["cherry"]],
        );

        let predicate = Conjunction::of(vec![Predicate::contains(ColumnId::from_index(0), "AP")]);
        let matched = store.scan("alice", &predicate, 0, 10).unwrap();
        let ids: Vec<u64> = matched.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 3]);

        let second = store.scan("alice", &predicate, 1, 10).unwrap();
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].id, 3);
        assert!(store.scan("alice", &predicate, 5, 10).unwrap().is_empty());
        assert_eq!(store.count("alice", &predicate).unwrap(), 2);
    }

    #[test]
    fn test_invalid_names_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let store = DatasetStore::open(temp_dir.path()).unwrap();

        for name in ["", "../etc", "a/b", ".hidden", "x y"] {
            let err = store.create_or_replace(name, &schema(1)).unwrap_err();
            assert_eq!(err.code(), StorageErrorCode::InvalidDatasetName, "{name}");
        }
    }

    #[test]
    fn test_open_removes_leftover_staging() {
        let temp_dir = TempDir::new().unwrap();
        let store = DatasetStore::open(temp_dir.path()).unwrap();
        let stale = store.datasets_dir().join(".alice.1234.staging");
        fs::write(&stale, b"partial").unwrap();
        age_file(&stale, STAGING_GRACE + Duration::from_secs(60));

        let store = DatasetStore::open(temp_dir.path()).unwrap();
        assert_eq!(staging_files(&store), 0);
    }

    #[test]
    fn test_open_keeps_recent_staging() {
        let temp_dir = TempDir::new().unwrap();
        let store = DatasetStore::open(temp_dir.path()).unwrap();
        fs::write(store.datasets_dir().join(".bob.5678.staging"), b"partial").unwrap();

        let store = DatasetStore::open(temp_dir.path()).unwrap();
        assert_eq!(staging_files(&store), 1);
    }

    #[test]
    fn test_second_open_does_not_break_inflight_generation() {
        let temp_dir = TempDir::new().unwrap();
        let server = DatasetStore::open(temp_dir.path()).unwrap();
        let mut generation = server.begin_generation("alice", &schema(1)).unwrap();
        generation.append(vec!["x".into()]).unwrap();

        // e.g. a CLI command against the same data_dir
        let other = DatasetStore::open(temp_dir.path()).unwrap();

        assert_eq!(generation.commit().unwrap(), 1);
        assert_eq!(other.count("alice", &Conjunction::always()).unwrap(), 1);
    }

    #[test]
    fn test_drop_and_list() {
        let temp_dir = TempDir::new().unwrap();
        let store = DatasetStore::open(temp_dir.path()).unwrap();

        seed(&store, "b", 1, &[&["x"]]);
        seed(&store, "a", 1, &[&["x"]]);
        assert_eq!(store.list().unwrap(), vec!["a", "b"]);

        store.drop_dataset("a").unwrap();
        assert_eq!(store.list().unwrap(), vec!["b"]);
        let err = store.drop_dataset("a").unwrap_err();
        assert_eq!(err.code(), StorageErrorCode::DatasetNotFound);
    }

    #[test]
    fn test_reader_keeps_snapshot_across_replace() {
        let temp_dir = TempDir::new().unwrap();
        let store = DatasetStore::open(temp_dir.path()).unwrap();
        seed(&store, "alice", 1, &[&["old1"], &["old2"]]);

        let mut cursor = store.open_scan("alice", &Conjunction::always()).unwrap();
        assert_eq!(cursor.next().unwrap().unwrap().values, vec!["old1"]);

        seed(&store, "alice", 1, &[&["new"]]);

        assert_eq!(cursor.next().unwrap().unwrap().values, vec!["old2"]);
        assert!(cursor.next().is_none());
        assert_eq!(store.count("alice", &Conjunction::always()).unwrap(), 1);
    }

    #[test]
    fn test_writers_to_one_name_are_serialized() {
        let temp_dir = TempDir::new().unwrap();
        let store = DatasetStore::open(temp_dir.path()).unwrap();
        seed(&store, "alice", 1, &[]);

        let handles: Vec<_> = (0..4)
            .map(|t| {
                let store = store.clone();
                std::thread::spawn(move || {
                    for i in 0..5 {
                        store
                            .bulk_load("alice", vec![vec![format!("t{}-{}", t, i)]])
                            .unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(store.count("alice", &Conjunction::always()).unwrap(), 20);
    }
}
