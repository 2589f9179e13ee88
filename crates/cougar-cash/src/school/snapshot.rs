use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use super::state::SchoolState;

/// Storage abstraction for the whole school state; saves are last-write-wins.
pub trait SnapshotStore: Send + Sync {
    /// `Ok(None)` when nothing has been saved yet.
    fn load(&self) -> Result<Option<SchoolState>, SnapshotError>;
    fn save(&self, state: &SchoolState) -> Result<(), SnapshotError>;
}

#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("snapshot io failed for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("snapshot {path} is not valid school state: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to encode school state: {0}")]
    Encode(#[source] serde_json::Error),
}

/// Pretty-printed JSON file, replaced through a sibling temp file on save.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> SnapshotError {
        SnapshotError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl SnapshotStore for JsonFileStore {
    fn load(&self) -> Result<Option<SchoolState>, SnapshotError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(self.io_error(err)),
        };

        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|source| SnapshotError::Decode {
                path: self.path.clone(),
                source,
            })
    }

    fn save(&self, state: &SchoolState) -> Result<(), SnapshotError> {
        let encoded = serde_json::to_vec_pretty(state).map_err(SnapshotError::Encode)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|err| self.io_error(err))?;
        }
        let staging = self.path.with_extension("json.tmp");
        fs::write(&staging, encoded).map_err(|err| self.io_error(err))?;
        fs::rename(&staging, &self.path).map_err(|err| self.io_error(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RewardsConfig;
    use chrono::NaiveDate;

    fn now() -> chrono::NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 10, 6)
            .and_then(|date| date.and_hms_opt(9, 15, 0))
            .expect("valid timestamp")
    }

    #[test]
    fn missing_file_loads_as_empty() {
        let dir = tempfile::tempdir().expect("temp dir");
        let store = JsonFileStore::new(dir.path().join("school.json"));
        assert!(store.load().expect("load succeeds").is_none());
    }

    #[test]
    fn saved_state_round_trips() {
        let dir = tempfile::tempdir().expect("temp dir");
        let store = JsonFileStore::new(dir.path().join("nested").join("school.json"));

        let mut state = SchoolState::seeded(&RewardsConfig::default(), now());
        state
            .add_student("Ava Cougar", "ava@school.example", 5, now())
            .expect("student added");
        store.save(&state).expect("save succeeds");

        let loaded = store.load().expect("load succeeds").expect("snapshot present");
        assert_eq!(loaded, state);
    }

    #[test]
    fn corrupt_snapshot_reports_decode_error() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("school.json");
        fs::write(&path, "{ not json").expect("write fixture");

        match JsonFileStore::new(&path).load() {
            Err(SnapshotError::Decode { path: reported, .. }) => assert_eq!(reported, path),
            other => panic!("expected decode error, got {other:?}"),
        }
    }
}
