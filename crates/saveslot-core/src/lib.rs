//! Save-slot persistence for saveslot.
//!
//! This crate provides the slot layer on top of `saveslot-storage`:
//! - [`SlotRepository`]: create, load, save, list, delete, validate slots
//! - Latest-save resolution by metadata timestamp
//! - [`Outcome`]: the envelope every repository operation returns
//! - [`StoreConfig`]: file and environment configuration
//!
//! ```rust,ignore
//! use saveslot_core::{SessionInfo, SlotRepository};
//! use serde_json::json;
//!
//! let repository = SlotRepository::with_root("saves")?;
//! let created = repository.create(&json!({"cash": 1000}), &json!({}), &SessionInfo::new("ann", 0), None);
//! let latest = repository.get_latest_save_id();
//! ```

pub mod cache;
pub mod config;
pub mod error;
mod latest;
pub mod metadata;
pub mod outcome;
pub mod repository;
pub mod slot;

pub use config::StoreConfig;
pub use error::{ConfigError, CoreError, CoreResult};
pub use metadata::{Metadata, SessionInfo, TIMESTAMP_FORMAT};
pub use outcome::{Diagnostic, Outcome, OutcomeError};
pub use repository::{SlotRepository, Validation};
pub use saveslot_storage::ErrorKind;
