//! Fixtures for building save roots on disk.
//!
//! Files are written directly, without going through the repository, so
//! tests can set up states the repository itself would never produce.

use serde_json::{json, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Directory under the fixture's temp dir that holds the slots.
pub const ROOT_DIR: &str = "saves";

/// Builder for a temporary save root.
///
/// # Example
///
/// ```rust
/// use saveslot_test_utils::fixtures::TestSaveRoot;
///
/// let saves = TestSaveRoot::new()
///     .with_slot("save_1", "2024-01-01,10:00:00")
///     .with_raw_file("save_1/notes.json", "[1, 2]")
///     .build();
///
/// assert!(saves.root().join("save_1/user.json").exists());
/// assert!(saves.root().join("save_1/notes.json").exists());
/// ```
pub struct TestSaveRoot {
    temp_dir: TempDir,
    /// Files to create (path relative to the save root -> contents).
    files: Vec<(PathBuf, String)>,
    /// Empty directories to create (relative to the save root).
    dirs: Vec<PathBuf>,
    /// Contents of `saveslot.json` next to the save root.
    config: Option<String>,
}

impl TestSaveRoot {
    pub fn new() -> Self {
        Self {
            temp_dir: TempDir::new().expect("Failed to create temp directory"),
            files: Vec::new(),
            dirs: Vec::new(),
            config: None,
        }
    }

    /// A complete slot whose metadata carries `timestamp`.
    pub fn with_slot(self, slot_id: &str, timestamp: &str) -> Self {
        self.with_document(slot_id, "user", json!({"name": "player", "cash": 1000}))
            .with_document(slot_id, "stocks", json!({"ACME": 10}))
            .with_document(slot_id, "metadata", metadata(timestamp, "player", 60))
    }

    /// A slot holding only the named documents.
    pub fn with_incomplete_slot(mut self, slot_id: &str, documents: &[&str]) -> Self {
        self.dirs.push(PathBuf::from(slot_id));
        for name in documents {
            self = self.with_document(slot_id, name, json!({}));
        }
        self
    }

    /// An empty slot directory.
    pub fn with_empty_slot(mut self, slot_id: &str) -> Self {
        self.dirs.push(PathBuf::from(slot_id));
        self
    }

    pub fn with_document(self, slot_id: &str, name: &str, value: Value) -> Self {
        let contents = serde_json::to_string_pretty(&value).expect("Failed to serialize fixture");
        self.with_raw_file(format!("{slot_id}/{name}.json"), contents)
    }

    /// Any file under the save root, e.g. corrupt JSON or a stray temp file.
    pub fn with_raw_file(mut self, path: impl AsRef<Path>, contents: impl Into<String>) -> Self {
        self.files.push((path.as_ref().to_path_buf(), contents.into()));
        self
    }

    /// Write a `saveslot.json` beside the save root.
    pub fn with_config(mut self, config: &str) -> Self {
        self.config = Some(config.to_string());
        self
    }

    pub fn build(self) -> BuiltSaveRoot {
        let root = self.temp_dir.path().join(ROOT_DIR);
        fs::create_dir_all(&root)
            .unwrap_or_else(|e| panic!("Failed to create save root {}: {}", root.display(), e));

        for dir in &self.dirs {
            let full_path = root.join(dir);
            fs::create_dir_all(&full_path).unwrap_or_else(|e| {
                panic!("Failed to create directory {}: {}", full_path.display(), e)
            });
        }

        for (path, contents) in &self.files {
            write(&root.join(path), contents);
        }

        if let Some(config) = &self.config {
            write(&self.temp_dir.path().join("saveslot.json"), config);
        }

        BuiltSaveRoot {
            temp_dir: self.temp_dir,
        }
    }
}

impl Default for TestSaveRoot {
    fn default() -> Self {
        Self::new()
    }
}

/// A save root on disk, removed when dropped.
pub struct BuiltSaveRoot {
    temp_dir: TempDir,
}

impl BuiltSaveRoot {
    /// The temp directory containing the save root and any config file.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// The save root itself.
    pub fn root(&self) -> PathBuf {
        self.path().join(ROOT_DIR)
    }

    /// Parse a JSON file relative to the save root.
    pub fn read_json(&self, path: impl AsRef<Path>) -> Value {
        let full_path = self.root().join(path.as_ref());
        let content = fs::read_to_string(&full_path)
            .unwrap_or_else(|e| panic!("Failed to read file {}: {}", full_path.display(), e));
        serde_json::from_str(&content)
            .unwrap_or_else(|e| panic!("Invalid JSON in {}: {}", full_path.display(), e))
    }

    /// Overwrite a file relative to the save root.
    pub fn write_file(&self, path: impl AsRef<Path>, contents: impl AsRef<str>) {
        write(&self.root().join(path.as_ref()), contents.as_ref());
    }

    pub fn file_exists(&self, path: impl AsRef<Path>) -> bool {
        self.root().join(path.as_ref()).exists()
    }

    /// File names directly inside a slot, sorted.
    pub fn slot_files(&self, slot_id: &str) -> Vec<String> {
        let dir = self.root().join(slot_id);
        if !dir.exists() {
            return Vec::new();
        }
        let mut names: Vec<String> = fs::read_dir(&dir)
            .unwrap_or_else(|e| panic!("Failed to read directory {}: {}", dir.display(), e))
            .filter_map(|entry| {
                let entry = entry.ok()?;
                entry
                    .file_type()
                    .ok()?
                    .is_file()
                    .then(|| entry.file_name().to_string_lossy().to_string())
            })
            .collect();
        names.sort();
        names
    }
}

/// A metadata document as the repository writes it.
pub fn metadata(timestamp: &str, user_name: &str, play_time: u64) -> Value {
    json!({
        "timestamp": timestamp,
        "user_name": user_name,
        "play_time": play_time,
    })
}

fn write(path: &Path, contents: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap_or_else(|e| {
            panic!(
                "Failed to create parent directory for {}: {}",
                path.display(),
                e
            )
        });
    }
    fs::write(path, contents)
        .unwrap_or_else(|e| panic!("Failed to write file {}: {}", path.display(), e));
}
