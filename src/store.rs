//! Persistence of learner attempt records.
//!
//! One CSV file per learner under a users directory, named after the learner
//! (`Bob Smith` -> `bob_smith.csv`). The file is read in full on load and
//! rewritten in full, header first, on every save.

use crate::profile::AttemptRecord;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

const HEADER: [&str; 5] = [
    "session_id",
    "word_typed",
    "correct_word",
    "level",
    "similarity_score",
];

const FALLBACK_KEY: &str = "learner";

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// Where learner records live between runs
pub trait RecordStore {
    /// Every record stored for `learner`; empty if the learner is new
    fn load(&self, learner: &str) -> Result<Vec<AttemptRecord>>;
    /// Replace everything stored for `learner` with `records`
    fn save(&self, learner: &str, records: &[AttemptRecord]) -> Result<()>;
}

/// Turn a learner name into a storage key: lowercase, spaces become
/// underscores, anything not alphanumeric or `_` is dropped.
pub fn sanitize_key(name: &str) -> String {
    let key: String = name
        .trim()
        .to_lowercase()
        .replace(' ', "_")
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '_')
        .collect();

    if key.is_empty() {
        FALLBACK_KEY.to_string()
    } else {
        key
    }
}

#[derive(Debug, Clone)]
pub struct CsvRecordStore {
    dir: PathBuf,
}

impl CsvRecordStore {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn path_for(&self, learner: &str) -> PathBuf {
        self.dir.join(format!("{}.csv", sanitize_key(learner)))
    }
}

impl RecordStore for CsvRecordStore {
    fn load(&self, learner: &str) -> Result<Vec<AttemptRecord>> {
        let path = self.path_for(learner);
        let file = match File::open(&path) {
            Ok(file) => file,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no records yet");
                return Ok(Vec::new());
            }
            Err(err) => return Err(err.into()),
        };

        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(file);

        let records = rdr
            .deserialize::<AttemptRecord>()
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(records)
    }

    fn save(&self, learner: &str, records: &[AttemptRecord]) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path_for(learner);

        // The header is written by hand so an empty history still gets one
        let mut wtr = csv::WriterBuilder::new()
            .has_headers(false)
            .from_path(&path)?;
        wtr.write_record(HEADER)?;
        for record in records {
            wtr.serialize(record)?;
        }
        wtr.flush()?;

        info!(path = %path.display(), records = records.len(), "saved learner records");
        Ok(())
    }
}

/// Keeps records in memory only; used for guests and in tests
#[derive(Debug, Default)]
pub struct MemoryRecordStore {
    learners: RefCell<HashMap<String, Vec<AttemptRecord>>>,
}

impl RecordStore for MemoryRecordStore {
    fn load(&self, learner: &str) -> Result<Vec<AttemptRecord>> {
        Ok(self
            .learners
            .borrow()
            .get(&sanitize_key(learner))
            .cloned()
            .unwrap_or_default())
    }

    fn save(&self, learner: &str, records: &[AttemptRecord]) -> Result<()> {
        self.learners
            .borrow_mut()
            .insert(sanitize_key(learner), records.to_vec());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::SessionId;
    use assert_matches::assert_matches;
    use tempfile::tempdir;

    fn record(id: f64, typed: &str, correct: &str, level: u32, sim: f64) -> AttemptRecord {
        AttemptRecord::new(SessionId::new(id), typed, correct, level, sim)
    }

    #[test]
    fn test_sanitize_key() {
        assert_eq!(sanitize_key("Alice"), "alice");
        assert_eq!(sanitize_key(" Bob Smith "), "bob_smith");
        assert_eq!(sanitize_key("John's"), "johns");
        assert_eq!(sanitize_key("../../etc"), "etc");
        assert_eq!(sanitize_key("!!!"), "learner");
    }

    #[test]
    fn test_missing_file_is_new_learner() {
        let dir = tempdir().unwrap();
        let store = CsvRecordStore::new(dir.path());

        assert!(store.load("alice").unwrap().is_empty());
        assert!(!store.path_for("alice").exists());
    }

    #[test]
    fn test_save_empty_writes_header_only() {
        let dir = tempdir().unwrap();
        let store = CsvRecordStore::new(dir.path().join("users"));

        store.save("Alice", &[]).unwrap();

        let contents = fs::read_to_string(store.path_for("alice")).unwrap();
        assert_eq!(
            contents,
            "session_id,word_typed,correct_word,level,similarity_score\n"
        );
    }

    #[test]
    fn test_save_then_load_round_trips_records() {
        let dir = tempdir().unwrap();
        let store = CsvRecordStore::new(dir.path());
        let records = vec![
            record(1_761_000_000.123_456, "pithon", "python", 1, 0.5),
            record(1_761_000_000.123_456, "honey", "honey", 2, 1.0),
            record(1_761_000_100.5, "rythm", "rhythm", 3, 1.0 / 3.0),
        ];

        store.save("alice", &records).unwrap();
        let loaded = store.load("Alice").unwrap();

        assert_eq!(loaded, records);
    }

    #[test]
    fn test_save_rewrites_whole_file() {
        let dir = tempdir().unwrap();
        let store = CsvRecordStore::new(dir.path());

        store
            .save("alice", &[record(1.0, "bee", "bee", 1, 1.0)])
            .unwrap();
        store
            .save("alice", &[record(2.0, "wax", "wax", 1, 1.0)])
            .unwrap();

        let loaded = store.load("alice").unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].correct_word, "wax");
    }

    #[test]
    fn test_reads_reference_layout() {
        let dir = tempdir().unwrap();
        let store = CsvRecordStore::new(dir.path());
        fs::write(
            store.path_for("bob"),
            "session_id,word_typed,correct_word,level,similarity_score\n\
             1700000000.25,pithon,python,1,0.6666666666666667\n",
        )
        .unwrap();

        let loaded = store.load("bob").unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].session_id, SessionId::new(1_700_000_000.25));
        assert_eq!(loaded[0].level, 1);
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = tempdir().unwrap();
        let store = CsvRecordStore::new(dir.path());
        fs::write(
            store.path_for("bob"),
            "session_id,word_typed,correct_word,level,similarity_score\n\
             yesterday,bee,bee,one,great\n",
        )
        .unwrap();

        assert_matches!(store.load("bob"), Err(StoreError::Csv(_)));
    }

    #[test]
    fn test_memory_store_uses_sanitized_keys() {
        let store = MemoryRecordStore::default();
        store
            .save("Bob Smith", &[record(1.0, "bee", "bee", 1, 1.0)])
            .unwrap();

        assert_eq!(store.load("bob smith").unwrap().len(), 1);
        assert!(store.load("alice").unwrap().is_empty());
    }
}
