//! Testing utilities and fixtures for saveslot.
//!
//! - **Fixtures**: temporary save roots pre-populated with slots
//! - **Assertions**: helpers for JSON files, temp-file leftovers and outcomes
//!
//! # Example Usage
//!
//! ```rust,ignore
//! use saveslot_test_utils::TestSaveRoot;
//!
//! let saves = TestSaveRoot::new()
//!     .with_slot("save_1", "2024-01-01,10:00:00")
//!     .with_incomplete_slot("save_2", &["user"])
//!     .build();
//!
//! assert!(saves.root().join("save_1/metadata.json").exists());
//! ```

pub mod assertions;
pub mod fixtures;

pub use fixtures::{BuiltSaveRoot, TestSaveRoot};
