//! Error types for the core crate.

use saveslot_storage::{ErrorKind, StorageError};
use std::path::PathBuf;
use thiserror::Error;

/// Core error types.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Document store failure.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Configuration error.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// Slot directory does not exist.
    #[error("save slot '{id}' does not exist")]
    SlotNotFound { id: String, path: PathBuf },

    /// Slot ID cannot name a directory under the save root.
    #[error("invalid slot id: {0:?}")]
    InvalidSlotId(String),

    /// Document name cannot name a file inside a slot.
    #[error("invalid document name: {0:?}")]
    InvalidDocumentName(String),

    /// An operation that writes into an existing slot was given no slot.
    #[error("slot id is required; use create() to make a new save")]
    MissingSlotId,

    /// No slot carried a usable metadata timestamp.
    #[error("no valid saves found")]
    NoValidSaves,

    /// Filesystem failure on a slot directory or the save root.
    #[error("io error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Document cache lock was poisoned.
    #[error("lock poisoned: {0}")]
    LockPoisoned(String),
}

impl CoreError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            CoreError::Storage(e) => e.kind(),
            CoreError::Config(ConfigError::InvalidJson { .. }) => ErrorKind::Malformed,
            CoreError::Config(_) => ErrorKind::Precondition,
            CoreError::SlotNotFound { .. } | CoreError::NoValidSaves => ErrorKind::NotFound,
            CoreError::InvalidSlotId(_)
            | CoreError::InvalidDocumentName(_)
            | CoreError::MissingSlotId => ErrorKind::Precondition,
            CoreError::Io { .. } | CoreError::LockPoisoned(_) => ErrorKind::Io,
        }
    }

    /// The path involved in the failure, when one is known.
    pub fn path(&self) -> Option<PathBuf> {
        match self {
            CoreError::Storage(e) => e.path().map(|p| p.to_path_buf()),
            CoreError::Config(ConfigError::InvalidJson { path, .. }) => Some(PathBuf::from(path)),
            CoreError::Io { path, .. } | CoreError::SlotNotFound { path, .. } => Some(path.clone()),
            _ => None,
        }
    }
}

/// Configuration-specific errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Invalid JSON syntax.
    #[error("invalid config at {path}: {message}")]
    InvalidJson { path: String, message: String },

    /// Environment override could not be parsed.
    #[error("invalid value for {name}: {value:?}")]
    InvalidEnv { name: String, value: String },

    /// Config file exists but could not be read.
    #[error("cannot read config {path}: {message}")]
    Unreadable { path: String, message: String },
}

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_not_found_message() {
        let err = CoreError::SlotNotFound {
            id: "save_99".to_string(),
            path: PathBuf::from("saves/save_99"),
        };
        assert_eq!(err.to_string(), "save slot 'save_99' does not exist");
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(err.path(), Some(PathBuf::from("saves/save_99")));
    }

    #[test]
    fn test_storage_error_is_transparent() {
        let err = CoreError::from(StorageError::NotFound(PathBuf::from("x.json")));
        assert_eq!(err.to_string(), "Document not found: x.json");
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(err.path(), Some(PathBuf::from("x.json")));
    }

    #[test]
    fn test_precondition_kinds() {
        assert_eq!(CoreError::MissingSlotId.kind(), ErrorKind::Precondition);
        assert_eq!(
            CoreError::InvalidSlotId("..".into()).kind(),
            ErrorKind::Precondition
        );
    }

    #[test]
    fn test_config_error_kinds() {
        let err = CoreError::from(ConfigError::InvalidJson {
            path: "saveslot.json".into(),
            message: "expected value".into(),
        });
        assert_eq!(err.kind(), ErrorKind::Malformed);
        assert_eq!(err.path(), Some(PathBuf::from("saveslot.json")));
        assert_eq!(
            err.to_string(),
            "config error: invalid config at saveslot.json: expected value"
        );
    }
}
