//! Slot and document naming.
//!
//! A slot is a directory `<root>/<slot_id>/`; a document is a file
//! `<root>/<slot_id>/<name>.json`. Generated slot IDs are `save_<N>`, N >= 1.

use crate::error::{CoreError, CoreResult};
use saveslot_util::path::is_safe_component;
use std::cmp::Ordering;

pub const GENERATED_PREFIX: &str = "save_";

pub const USER_DOCUMENT: &str = "user";
pub const STOCKS_DOCUMENT: &str = "stocks";
pub const METADATA_DOCUMENT: &str = "metadata";

/// Documents a complete slot must contain.
pub const REQUIRED_DOCUMENTS: [&str; 3] = [USER_DOCUMENT, STOCKS_DOCUMENT, METADATA_DOCUMENT];

pub const DOCUMENT_EXTENSION: &str = "json";

/// `save_<n>`.
pub fn generated_id(n: u64) -> String {
    format!("{GENERATED_PREFIX}{n}")
}

/// The `N` of a canonical `save_<N>` ID. `save_0`, `save_01` and `save_x` are not generated IDs.
pub fn generated_number(id: &str) -> Option<u64> {
    let digits = id.strip_prefix(GENERATED_PREFIX)?;
    let n: u64 = digits.parse().ok()?;
    (n >= 1 && digits == n.to_string()).then_some(n)
}

pub fn validate_slot_id(id: &str) -> CoreResult<()> {
    if is_safe_component(id) {
        Ok(())
    } else {
        Err(CoreError::InvalidSlotId(id.to_string()))
    }
}

pub fn validate_document_name(name: &str) -> CoreResult<()> {
    if is_safe_component(name) {
        Ok(())
    } else {
        Err(CoreError::InvalidDocumentName(name.to_string()))
    }
}

/// `user` -> `user.json`.
pub fn document_file_name(name: &str) -> String {
    format!("{name}.{DOCUMENT_EXTENSION}")
}

/// Enumeration order: generated IDs by number, then everything else by name.
pub fn compare_ids(a: &str, b: &str) -> Ordering {
    match (generated_number(a), generated_number(b)) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.cmp(b),
    }
}
