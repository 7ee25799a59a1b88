//! The result envelope returned by every repository operation.
//!
//! Operations never return `Err` or panic across the repository boundary.
//! Internally they run on [`CoreResult`] and convert once, at the end, into an
//! [`Outcome`] stamped with the operation name and the path involved.

use crate::error::{CoreError, CoreResult};
use saveslot_storage::ErrorKind;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;
use tracing::warn;

/// Where a failure happened, filled in by the failing operation itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Operation name, e.g. `SlotRepository::delete`.
    pub operation: String,
    pub kind: ErrorKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.path {
            Some(path) => write!(f, "{} ({})", self.operation, path.display()),
            None => f.write_str(&self.operation),
        }
    }
}

/// Uniform success/failure envelope.
///
/// `success` implies `error` and `context` are `None` and `data` is set;
/// failure implies `error` is a non-empty `"<kind>: <message>"` string and
/// `data` is `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Outcome<T> {
    pub success: bool,
    pub error: Option<String>,
    pub context: Option<Diagnostic>,
    pub data: Option<T>,
}

/// A failed [`Outcome`] turned back into an error value.
#[derive(Debug, Clone, Error)]
#[error("{error}{}", .context.as_ref().map(|c| format!(" [{c}]")).unwrap_or_default())]
pub struct OutcomeError {
    pub error: String,
    pub context: Option<Diagnostic>,
}

impl<T> Outcome<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            error: None,
            context: None,
            data: Some(data),
        }
    }

    pub fn fail(operation: &str, err: &CoreError) -> Self {
        let kind = err.kind();
        Self {
            success: false,
            error: Some(format!("{kind}: {err}")),
            context: Some(Diagnostic {
                operation: operation.to_string(),
                kind,
                path: err.path(),
            }),
            data: None,
        }
    }

    /// Convert an internal result, logging the failure once.
    pub fn from_result(operation: &str, result: CoreResult<T>) -> Self {
        match result {
            Ok(data) => Self::ok(data),
            Err(err) => {
                warn!(operation, kind = %err.kind(), error = %err, "Operation failed");
                Self::fail(operation, &err)
            }
        }
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    pub fn kind(&self) -> Option<ErrorKind> {
        self.context.as_ref().map(|c| c.kind)
    }

    pub fn data(&self) -> Option<&T> {
        self.data.as_ref()
    }

    pub fn into_data(self) -> Option<T> {
        self.data
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        Outcome {
            success: self.success,
            error: self.error,
            context: self.context,
            data: self.data.map(f),
        }
    }

    pub fn into_result(self) -> Result<T, OutcomeError> {
        match (self.success, self.data) {
            (true, Some(data)) => Ok(data),
            (true, None) => Err(OutcomeError {
                error: "outcome reported success without data".to_string(),
                context: self.context,
            }),
            (false, _) => Err(OutcomeError {
                error: self.error.unwrap_or_else(|| "unknown error".to_string()),
                context: self.context,
            }),
        }
    }
}
