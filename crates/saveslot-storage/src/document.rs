//! JSON document storage with atomic replacement.
//!
//! Each document lives in its own file. Writes go to a temporary file in the
//! target's directory and are renamed into place, so a reader of the target
//! path sees either the old content or the new content, never a partial write.

use crate::{StorageError, StorageResult};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};
use std::fs;
use std::io::Write;
use std::path::Path;
use tracing::{debug, warn};

/// Marker inserted between a document's file name and the random suffix of
/// its in-flight temporary file.
pub const TEMP_MARKER: &str = ".tmp.";

/// Returns true for leftovers of an interrupted write, e.g. `user.json.tmp.a1B2c3`.
pub fn is_temp_file(name: &str) -> bool {
    name.contains(TEMP_MARKER)
}

/// Loads and atomically saves JSON documents by path.
#[derive(Debug, Clone)]
pub struct DocumentStore {
    pretty: bool,
    durable: bool,
}

impl Default for DocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentStore {
    /// Create a store that writes pretty-printed JSON without fsync.
    pub fn new() -> Self {
        Self {
            pretty: true,
            durable: false,
        }
    }

    /// Choose between indented and compact output.
    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    /// Flush the temporary file to stable storage before renaming it.
    pub fn with_durable(mut self, durable: bool) -> Self {
        self.durable = durable;
        self
    }

    /// Read the document at `path` as untyped JSON.
    pub fn load(&self, path: &Path) -> StorageResult<Value> {
        self.load_as(path)
    }

    /// Read the document at `path` into `T`.
    pub fn load_as<T: DeserializeOwned>(&self, path: &Path) -> StorageResult<T> {
        debug!(path = %path.display(), "Loading document");

        let content = fs::read_to_string(path).map_err(|e| StorageError::io(path, e))?;
        serde_json::from_str(&content).map_err(|e| StorageError::json(path, e))
    }

    /// Write `document` to `path`.
    ///
    /// With a `merge_key` the existing document at `path` (or an empty object)
    /// receives `document` under that key and the merged object is written.
    pub fn save<T: Serialize + ?Sized>(
        &self,
        document: &T,
        path: &Path,
        merge_key: Option<&str>,
    ) -> StorageResult<()> {
        debug!(path = %path.display(), merge_key = ?merge_key, "Saving document");

        let content = match merge_key {
            Some(key) => {
                let mut existing = self.load_object_or_empty(path)?;
                let value = serde_json::to_value(document).map_err(|e| StorageError::json(path, e))?;
                existing.insert(key.to_string(), value);
                self.serialize(&Value::Object(existing), path)?
            }
            None => self.serialize(document, path)?,
        };

        self.write_atomic(path, content.as_bytes())
    }

    /// Remove temporary files left behind by interrupted writes in `dir`.
    ///
    /// Returns how many were removed. A missing directory removes nothing.
    pub fn sweep_temp_files(&self, dir: &Path) -> StorageResult<usize> {
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(StorageError::io(dir, e)),
        };

        let mut removed = 0;
        for entry in entries {
            let entry = entry.map_err(|e| StorageError::io(dir, e))?;
            let name = entry.file_name();
            if !is_temp_file(&name.to_string_lossy()) {
                continue;
            }
            let path = entry.path();
            match fs::remove_file(&path) {
                Ok(()) => {
                    warn!(path = %path.display(), "Removed leftover temporary file");
                    removed += 1;
                }
                Err(e) => return Err(StorageError::io(&path, e)),
            }
        }

        Ok(removed)
    }

    fn load_object_or_empty(&self, path: &Path) -> StorageResult<Map<String, Value>> {
        match self.load(path) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(_) => Err(StorageError::NotAnObject(path.to_path_buf())),
            Err(StorageError::NotFound(_)) => Ok(Map::new()),
            Err(e) => Err(e),
        }
    }

    fn serialize<T: Serialize + ?Sized>(&self, document: &T, path: &Path) -> StorageResult<String> {
        let result = if self.pretty {
            serde_json::to_string_pretty(document)
        } else {
            serde_json::to_string(document)
        };
        result.map_err(|e| StorageError::json(path, e))
    }

    /// Write to a sibling temp file, then rename over `path`.
    ///
    /// The temp file is deleted on every failure path before the rename.
    fn write_atomic(&self, path: &Path, content: &[u8]) -> StorageResult<()> {
        let file_name = path
            .file_name()
            .ok_or_else(|| StorageError::invalid_path(format!("{} has no file name", path.display())))?;
        let parent = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };

        fs::create_dir_all(parent).map_err(|e| StorageError::io(parent, e))?;

        let prefix = format!("{}{}", file_name.to_string_lossy(), TEMP_MARKER);
        let mut temp = tempfile::Builder::new()
            .prefix(&prefix)
            .tempfile_in(parent)
            .map_err(|e| StorageError::io(parent, e))?;

        let temp_path = temp.path().to_path_buf();
        temp.write_all(content)
            .map_err(|e| StorageError::io(&temp_path, e))?;
        temp.flush().map_err(|e| StorageError::io(&temp_path, e))?;

        if self.durable {
            temp.as_file()
                .sync_all()
                .map_err(|e| StorageError::io(&temp_path, e))?;
        }

        // On failure the returned error owns the temp file and removes it on drop.
        temp.persist(path).map_err(|e| StorageError::io(path, e.error))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};
    use serde_json::json;
    use std::collections::HashMap;
    use tempfile::tempdir;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
    struct TestData {
        name: String,
        value: i32,
    }

    fn temp_files_in(dir: &Path) -> Vec<String> {
        fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .filter(|n| is_temp_file(n))
            .collect()
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let store = DocumentStore::new();
        let path = dir.path().join("data.json");

        let data = TestData {
            name: "test".to_string(),
            value: 42,
        };

        store.save(&data, &path, None).unwrap();

        let read: TestData = store.load_as(&path).unwrap();
        assert_eq!(read, data);
    }

    #[test]
    fn test_round_trip_nested_value() {
        let dir = tempdir().unwrap();
        let store = DocumentStore::new();
        let path = dir.path().join("stocks.json");

        let doc = json!({
            "AAPL": {"price": 182.5, "history": [180, 181.25, null]},
            "listed": true,
            "note": "héllo",
        });

        store.save(&doc, &path, None).unwrap();
        assert_eq!(store.load(&path).unwrap(), doc);
    }

    #[test]
    fn test_load_not_found() {
        let dir = tempdir().unwrap();
        let store = DocumentStore::new();

        let err = store.load(&dir.path().join("missing.json")).unwrap_err();
        assert!(matches!(err, StorageError::NotFound(_)));
    }

    #[test]
    fn test_load_malformed() {
        let dir = tempdir().unwrap();
        let store = DocumentStore::new();
        let path = dir.path().join("broken.json");
        fs::write(&path, "{\"a\": ").unwrap();

        let err = store.load(&path).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Malformed);
        assert_eq!(err.path(), Some(path.as_path()));
    }

    #[test]
    fn test_save_creates_parent_dirs() {
        let dir = tempdir().unwrap();
        let store = DocumentStore::new();
        let path = dir.path().join("saves").join("save_1").join("user.json");

        store.save(&json!({"cash": 100}), &path, None).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_save_replaces_whole_document() {
        let dir = tempdir().unwrap();
        let store = DocumentStore::new();
        let path = dir.path().join("doc.json");

        store.save(&json!({"a": 1, "b": 2}), &path, None).unwrap();
        store.save(&json!({"c": 3}), &path, None).unwrap();

        assert_eq!(store.load(&path).unwrap(), json!({"c": 3}));
    }

    #[test]
    fn test_merge_into_existing() {
        let dir = tempdir().unwrap();
        let store = DocumentStore::new();
        let path = dir.path().join("doc.json");

        store.save(&json!({"a": 1}), &path, None).unwrap();
        store.save(&json!({"x": 2}), &path, Some("b")).unwrap();

        assert_eq!(store.load(&path).unwrap(), json!({"a": 1, "b": {"x": 2}}));
    }

    #[test]
    fn test_merge_into_missing_starts_empty() {
        let dir = tempdir().unwrap();
        let store = DocumentStore::new();
        let path = dir.path().join("doc.json");

        store.save(&json!(7), &path, Some("seven")).unwrap();
        assert_eq!(store.load(&path).unwrap(), json!({"seven": 7}));
    }

    #[test]
    fn test_merge_into_non_object_fails() {
        let dir = tempdir().unwrap();
        let store = DocumentStore::new();
        let path = dir.path().join("doc.json");
        store.save(&json!([1, 2, 3]), &path, None).unwrap();

        let err = store.save(&json!(1), &path, Some("k")).unwrap_err();
        assert!(matches!(err, StorageError::NotAnObject(_)));
        assert_eq!(store.load(&path).unwrap(), json!([1, 2, 3]));
    }

    #[test]
    fn test_merge_into_malformed_leaves_file_untouched() {
        let dir = tempdir().unwrap();
        let store = DocumentStore::new();
        let path = dir.path().join("doc.json");
        fs::write(&path, "not json").unwrap();

        let err = store.save(&json!(1), &path, Some("k")).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Malformed);
        assert_eq!(fs::read_to_string(&path).unwrap(), "not json");
    }

    #[test]
    fn test_serialization_failure_leaves_target_untouched() {
        let dir = tempdir().unwrap();
        let store = DocumentStore::new();
        let path = dir.path().join("doc.json");
        store.save(&json!({"keep": true}), &path, None).unwrap();

        // JSON object keys must be strings.
        let mut bad: HashMap<(i32, i32), i32> = HashMap::new();
        bad.insert((1, 2), 3);

        let err = store.save(&bad, &path, None).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Malformed);
        assert_eq!(store.load(&path).unwrap(), json!({"keep": true}));
        assert!(temp_files_in(dir.path()).is_empty());
    }

    #[test]
    fn test_failed_rename_removes_temp_file() {
        let dir = tempdir().unwrap();
        let store = DocumentStore::new();
        // A directory at the target path makes the rename fail.
        let path = dir.path().join("occupied.json");
        fs::create_dir(&path).unwrap();

        let err = store.save(&json!({"a": 1}), &path, None).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Io);
        assert!(path.is_dir());
        assert!(temp_files_in(dir.path()).is_empty());
    }

    #[test]
    fn test_interrupted_write_leaves_previous_content() {
        let dir = tempdir().unwrap();
        let store = DocumentStore::new();
        let path = dir.path().join("user.json");
        store.save(&json!({"cash": 10}), &path, None).unwrap();

        // A crash after the temp write but before the rename leaves only this behind.
        let orphan = dir.path().join("user.json.tmp.XyZ123");
        fs::write(&orphan, "{\"cash\": 99").unwrap();

        assert_eq!(store.load(&path).unwrap(), json!({"cash": 10}));
        assert_eq!(store.sweep_temp_files(dir.path()).unwrap(), 1);
        assert!(!orphan.exists());
        assert!(path.exists());
    }

    #[test]
    fn test_save_leaves_no_temp_files() {
        let dir = tempdir().unwrap();
        let store = DocumentStore::new().with_durable(true);
        let path = dir.path().join("doc.json");

        store.save(&json!({"a": 1}), &path, None).unwrap();
        store.save(&json!({"a": 2}), &path, Some("b")).unwrap();

        assert!(temp_files_in(dir.path()).is_empty());
    }

    #[test]
    fn test_pretty_and_compact_output() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("doc.json");

        DocumentStore::new()
            .save(&json!({"a": 1}), &path, None)
            .unwrap();
        assert!(fs::read_to_string(&path).unwrap().contains("\n  \"a\": 1"));

        DocumentStore::new()
            .with_pretty(false)
            .save(&json!({"a": 1}), &path, None)
            .unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "{\"a\":1}");
    }

    #[test]
    fn test_sweep_missing_dir() {
        let dir = tempdir().unwrap();
        let store = DocumentStore::new();
        assert_eq!(store.sweep_temp_files(&dir.path().join("nope")).unwrap(), 0);
    }

    #[test]
    fn test_is_temp_file() {
        assert!(is_temp_file("metadata.json.tmp.abc"));
        assert!(!is_temp_file("metadata.json"));
    }
}
