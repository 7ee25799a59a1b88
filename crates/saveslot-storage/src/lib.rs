//! Storage layer for saveslot.
//!
//! This crate provides the document store: whole-file JSON documents,
//! loaded by path and written with atomic write-then-rename replacement.

pub mod document;
pub mod error;

pub use document::{is_temp_file, DocumentStore, TEMP_MARKER};
pub use error::{ErrorKind, StorageError, StorageResult};
