//! Storage error types.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Coarse classification of a failure, shared by every layer above storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Target document or slot directory is absent.
    NotFound,
    /// Content failed to parse or serialize as JSON.
    Malformed,
    /// The caller passed an invalid argument.
    Precondition,
    /// The filesystem operation itself failed.
    Io,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::NotFound => "not_found",
            ErrorKind::Malformed => "malformed",
            ErrorKind::Precondition => "precondition",
            ErrorKind::Io => "io",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// IO error (permission denied, disk full, etc.)
    #[error("IO error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON serialization/deserialization error
    #[error("JSON error in {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Document file does not exist
    #[error("Document not found: {}", .0.display())]
    NotFound(PathBuf),

    /// A merge was requested into a document that is not a JSON object
    #[error("Document at {} is not a JSON object", .0.display())]
    NotAnObject(PathBuf),

    /// Path cannot name a document
    #[error("Invalid path: {0}")]
    InvalidPath(String),
}

impl StorageError {
    /// Wrap an IO error, folding `NotFound` into [`StorageError::NotFound`].
    pub fn io(path: &Path, source: std::io::Error) -> Self {
        if source.kind() == std::io::ErrorKind::NotFound {
            Self::NotFound(path.to_path_buf())
        } else {
            Self::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    }

    /// Wrap a JSON error for the given path.
    pub fn json(path: &Path, source: serde_json::Error) -> Self {
        Self::Json {
            path: path.to_path_buf(),
            source,
        }
    }

    /// Create an invalid path error.
    pub fn invalid_path(message: impl Into<String>) -> Self {
        Self::InvalidPath(message.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            StorageError::Io { .. } => ErrorKind::Io,
            StorageError::Json { .. } | StorageError::NotAnObject(_) => ErrorKind::Malformed,
            StorageError::NotFound(_) => ErrorKind::NotFound,
            StorageError::InvalidPath(_) => ErrorKind::Precondition,
        }
    }

    /// The file path involved, when there is one.
    pub fn path(&self) -> Option<&Path> {
        match self {
            StorageError::Io { path, .. } | StorageError::Json { path, .. } => Some(path),
            StorageError::NotFound(path) | StorageError::NotAnObject(path) => Some(path),
            StorageError::InvalidPath(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_error_not_found_formats_path() {
        let err = StorageError::NotFound(PathBuf::from("saves/save_1/user.json"));
        assert_eq!(
            err.to_string(),
            "Document not found: saves/save_1/user.json"
        );
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn storage_error_io_folds_not_found() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = StorageError::io(Path::new("a.json"), io_err);
        assert!(matches!(err, StorageError::NotFound(_)));
    }

    #[test]
    fn storage_error_io_keeps_other_kinds() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = StorageError::io(Path::new("a.json"), io_err);
        assert_eq!(err.kind(), ErrorKind::Io);
        assert!(err.to_string().contains("IO error at a.json"));
        assert_eq!(err.path(), Some(Path::new("a.json")));
    }

    #[test]
    fn storage_error_json_is_malformed() {
        let json_err = serde_json::from_str::<String>("invalid").unwrap_err();
        let err = StorageError::json(Path::new("b.json"), json_err);
        assert_eq!(err.kind(), ErrorKind::Malformed);
        assert!(err.to_string().contains("JSON error in b.json"));
    }

    #[test]
    fn storage_error_invalid_path_is_precondition() {
        let err = StorageError::invalid_path("no file name");
        assert_eq!(err.kind(), ErrorKind::Precondition);
        assert_eq!(err.to_string(), "Invalid path: no file name");
        assert!(err.path().is_none());
    }

    #[test]
    fn error_kind_as_str() {
        assert_eq!(ErrorKind::NotFound.as_str(), "not_found");
        assert_eq!(ErrorKind::Precondition.to_string(), "precondition");
    }
}
