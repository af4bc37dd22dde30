//! File-backed persistence for override records.
//!
//! Persistence is best-effort: every I/O failure is logged and degrades to
//! "no persisted state", so a broken data directory can never block a
//! grading run. An empty record set and a missing backing file are the
//! same state.

use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// One per-student override rule. Field names in the serialized form match
/// the override CSV headers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverrideRecord {
    #[serde(rename = "Student ID")]
    pub student_id: String,
    #[serde(rename = "Smart Score Threshold")]
    pub threshold: Option<f64>,
    #[serde(rename = "Minimum Grade")]
    pub minimum_grade: Option<f64>,
}

const STORE_FILE: &str = "student_overrides.json";

/// Durable storage for the override table, one JSON file per installation.
pub struct OverrideStore {
    file: PathBuf,
}

impl OverrideStore {
    /// Store rooted at the per-user application data directory.
    pub fn open_default() -> Self {
        let dir = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("mastery_grader");
        Self::open(dir)
    }

    /// Store rooted at an explicit directory. Tests point this at a
    /// temporary directory.
    pub fn open(dir: impl Into<PathBuf>) -> Self {
        OverrideStore {
            file: dir.into().join(STORE_FILE),
        }
    }

    /// Whether a backing file is present.
    pub fn exists(&self) -> bool {
        self.file.exists()
    }

    /// Writes the full record set, or deletes the backing file when the set
    /// is empty.
    pub fn save(&self, records: &[OverrideRecord]) {
        if records.is_empty() {
            if self.file.exists() {
                if let Err(e) = fs::remove_file(&self.file) {
                    warn!(file = %self.file.display(), error = %e, "Failed to remove override store file");
                }
            }
            return;
        }

        let json = match serde_json::to_string_pretty(records) {
            Ok(json) => json,
            Err(e) => {
                warn!(error = %e, "Failed to serialize overrides");
                return;
            }
        };

        if let Some(parent) = self.file.parent() {
            if let Err(e) = fs::create_dir_all(parent) {
                warn!(dir = %parent.display(), error = %e, "Failed to create override store directory");
                return;
            }
        }

        match fs::write(&self.file, json) {
            Ok(()) => debug!(file = %self.file.display(), count = records.len(), "Overrides persisted"),
            Err(e) => {
                warn!(file = %self.file.display(), error = %e, "Failed to write override store; overrides will not survive restart");
            }
        }
    }

    /// Loads the previously saved record set, or `None` when there is none
    /// or it cannot be read.
    pub fn load(&self) -> Option<Vec<OverrideRecord>> {
        if !self.file.exists() {
            return None;
        }

        let content = match fs::read_to_string(&self.file) {
            Ok(content) => content,
            Err(e) => {
                warn!(file = %self.file.display(), error = %e, "Failed to read override store");
                return None;
            }
        };

        match serde_json::from_str::<Vec<OverrideRecord>>(&content) {
            Ok(records) if records.is_empty() => None,
            Ok(records) => Some(records),
            Err(e) => {
                warn!(file = %self.file.display(), error = %e, "Override store file is not valid; ignoring it");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, threshold: Option<f64>, minimum: Option<f64>) -> OverrideRecord {
        OverrideRecord {
            student_id: id.to_string(),
            threshold,
            minimum_grade: minimum,
        }
    }

    #[test]
    fn test_save_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = OverrideStore::open(dir.path());

        let records = vec![
            record("001", Some(60.0), None),
            record("002", None, Some(70.0)),
        ];
        store.save(&records);

        assert!(store.exists());
        assert_eq!(store.load(), Some(records));
    }

    #[test]
    fn test_save_empty_deletes_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = OverrideStore::open(dir.path());

        store.save(&[record("001", Some(60.0), None)]);
        assert!(store.exists());

        store.save(&[]);
        assert!(!store.exists());
        assert_eq!(store.load(), None);
    }

    #[test]
    fn test_load_without_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = OverrideStore::open(dir.path());
        assert!(!store.exists());
        assert_eq!(store.load(), None);
    }

    #[test]
    fn test_load_invalid_file_degrades_to_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = OverrideStore::open(dir.path());
        fs::write(dir.path().join(STORE_FILE), "not json at all").unwrap();
        assert_eq!(store.load(), None);
    }

    #[test]
    fn test_load_empty_list_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = OverrideStore::open(dir.path());
        fs::write(dir.path().join(STORE_FILE), "[]").unwrap();
        assert_eq!(store.load(), None);
    }

    #[test]
    fn test_save_into_unwritable_location_does_not_panic() {
        let dir = tempfile::tempdir().unwrap();
        // Parent path is a file, so the store directory cannot be created.
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "x").unwrap();

        let store = OverrideStore::open(blocker.join("nested"));
        store.save(&[record("001", Some(60.0), None)]);
        assert_eq!(store.load(), None);
    }
}
