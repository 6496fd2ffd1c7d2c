//! Durable record of the last consumed update id.
//!
//! The cursor only moves forward. The in-memory value may run ahead of the
//! persisted one; `changed()` reports that gap until a `save()` succeeds.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{errors::Error, utils::write_atomic, Result};

pub const CURSOR_FILE_NAME: &str = "status.json";

#[derive(Debug, Default, Serialize, Deserialize)]
struct CursorRecord {
    #[serde(default)]
    last_update: i64,
}

#[derive(Debug)]
pub struct CursorStore {
    path: PathBuf,
    last_update: i64,
    changed: bool,
}

impl CursorStore {
    /// Load `<working_dir>/status.json`, starting from zero when it does not exist yet.
    ///
    /// Any other read or parse failure is returned; callers treat it as fatal.
    pub fn load(working_dir: &Path) -> Result<Self> {
        let path = working_dir.join(CURSOR_FILE_NAME);
        info!(path = %path.display(), "loading cursor");

        let txt = match fs::read_to_string(&path) {
            Ok(txt) => txt,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                info!("no cursor file, starting from zero");
                return Ok(Self::fresh(path));
            }
            Err(e) => return Err(Error::Io(e)),
        };
        if txt.trim().is_empty() {
            return Ok(Self::fresh(path));
        }

        let record: CursorRecord = serde_json::from_str(&txt)?;
        info!(last_update = record.last_update, "cursor loaded");
        Ok(Self {
            path,
            last_update: record.last_update,
            changed: false,
        })
    }

    fn fresh(path: PathBuf) -> Self {
        Self {
            path,
            last_update: 0,
            changed: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn last_update(&self) -> i64 {
        self.last_update
    }

    /// Offset for the next fetch: only updates after the cursor.
    pub fn next_offset(&self) -> i64 {
        self.last_update.saturating_add(1)
    }

    pub fn changed(&self) -> bool {
        self.changed
    }

    /// Advance the cursor. Equal ids are ignored; lower ids are ignored with a warning.
    pub fn set_update(&mut self, update_id: i64) {
        if update_id == self.last_update {
            return;
        }
        if update_id < self.last_update {
            warn!(
                update_id,
                last_update = self.last_update,
                "update id is behind the cursor, ignoring"
            );
            return;
        }
        self.last_update = update_id;
        self.changed = true;
    }

    /// Persist the cursor if it changed since the last successful save.
    ///
    /// The write and fsync run on the blocking pool. On failure the dirty flag
    /// stays set so the next cycle tries again.
    pub async fn save(&mut self) -> Result<()> {
        if !self.changed {
            return Ok(());
        }
        let path = self.path.clone();
        let last_update = self.last_update;
        tokio::task::spawn_blocking(move || write_record(&path, last_update))
            .await
            .map_err(|e| Error::Persistence {
                path: self.path.clone(),
                reason: e.to_string(),
            })??;
        self.changed = false;
        info!(last_update, "cursor saved");
        Ok(())
    }
}

fn write_record(path: &Path, last_update: i64) -> Result<()> {
    let txt = serde_json::to_vec(&CursorRecord { last_update })?;
    write_atomic(path, &txt).map_err(|e| Error::Persistence {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_starts_at_zero() {
        let dir = tempfile::tempdir().unwrap();
        let store = CursorStore::load(dir.path()).unwrap();
        assert_eq!(store.last_update(), 0);
        assert_eq!(store.next_offset(), 1);
        assert!(!store.changed());
        assert_eq!(store.path(), dir.path().join(CURSOR_FILE_NAME));
    }

    #[test]
    fn empty_file_starts_at_zero() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(CURSOR_FILE_NAME), "  \n").unwrap();
        let store = CursorStore::load(dir.path()).unwrap();
        assert_eq!(store.last_update(), 0);
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(CURSOR_FILE_NAME), "{\"last_update\": ").unwrap();
        let err = CursorStore::load(dir.path()).unwrap_err();
        assert!(matches!(err, Error::Json(_)));
    }

    #[test]
    fn unreadable_record_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join(CURSOR_FILE_NAME)).unwrap();
        assert!(CursorStore::load(dir.path()).is_err());
    }

    #[test]
    fn cursor_ends_at_max_of_all_updates() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = CursorStore::load(dir.path()).unwrap();

        let mut seen_max = 0;
        for id in [3, 1, 7, 7, 5, 12, 11, 2] {
            let before = store.last_update();
            store.set_update(id);
            assert!(store.last_update() >= before);
            seen_max = seen_max.max(id);
            assert_eq!(store.last_update(), seen_max);
        }
        assert_eq!(store.last_update(), 12);
    }

    #[test]
    fn equal_or_lower_ids_do_not_mark_dirty() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(CURSOR_FILE_NAME), r#"{"last_update":10}"#).unwrap();
        let mut store = CursorStore::load(dir.path()).unwrap();

        store.set_update(10);
        store.set_update(4);
        assert_eq!(store.last_update(), 10);
        assert!(!store.changed());

        store.set_update(11);
        assert!(store.changed());
    }

    #[tokio::test]
    async fn save_round_trips_through_load() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = CursorStore::load(dir.path()).unwrap();
        store.set_update(42);
        store.save().await.unwrap();
        assert!(!store.changed());

        let txt = fs::read_to_string(store.path()).unwrap();
        let v: serde_json::Value = serde_json::from_str(&txt).unwrap();
        assert_eq!(v, serde_json::json!({"last_update": 42}));

        let reloaded = CursorStore::load(dir.path()).unwrap();
        assert_eq!(reloaded.last_update(), 42);
        assert_eq!(reloaded.next_offset(), 43);
    }

    #[tokio::test]
    async fn second_save_without_changes_does_not_write() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = CursorStore::load(dir.path()).unwrap();
        store.set_update(5);
        store.save().await.unwrap();

        // If the second save wrote anything, the record would reappear.
        fs::remove_file(store.path()).unwrap();
        store.save().await.unwrap();
        assert!(!store.path().exists());
    }

    #[tokio::test]
    async fn failed_save_keeps_dirty_flag() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        fs::write(&blocker, "x").unwrap();

        let mut store = CursorStore::load(dir.path()).unwrap();
        store.path = blocker.join(CURSOR_FILE_NAME);
        store.set_update(9);

        let err = store.save().await.unwrap_err();
        assert!(matches!(err, Error::Persistence { .. }));
        assert!(store.changed());
        assert_eq!(store.last_update(), 9);

        store.path = dir.path().join(CURSOR_FILE_NAME);
        store.save().await.unwrap();
        assert!(!store.changed());
    }

    #[test]
    fn next_offset_saturates_at_the_top_of_the_range() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join(CURSOR_FILE_NAME),
            format!(r#"{{"last_update":{}}}"#, i64::MAX),
        )
        .unwrap();
        let store = CursorStore::load(dir.path()).unwrap();
        assert_eq!(store.next_offset(), i64::MAX);
    }
}
