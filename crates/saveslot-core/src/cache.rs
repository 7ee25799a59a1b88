//! Per-repository memo of documents already read or written.
//!
//! Entries are refreshed by successful loads and saves and dropped whenever a
//! load or save of the same document fails, or its slot is deleted.

use crate::error::{CoreError, CoreResult};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::RwLock;

type Key = (String, String);

pub struct DocumentCache {
    enabled: bool,
    entries: RwLock<HashMap<Key, Value>>,
}

impl DocumentCache {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn get(&self, slot_id: &str, name: &str) -> CoreResult<Option<Value>> {
        if !self.enabled {
            return Ok(None);
        }
        let entries = self
            .entries
            .read()
            .map_err(|e| CoreError::LockPoisoned(e.to_string()))?;
        Ok(entries.get(&key(slot_id, name)).cloned())
    }

    pub fn put(&self, slot_id: &str, name: &str, value: Value) -> CoreResult<()> {
        if !self.enabled {
            return Ok(());
        }
        let mut entries = self
            .entries
            .write()
            .map_err(|e| CoreError::LockPoisoned(e.to_string()))?;
        entries.insert(key(slot_id, name), value);
        Ok(())
    }

    pub fn invalidate(&self, slot_id: &str, name: &str) -> CoreResult<()> {
        let mut entries = self
            .entries
            .write()
            .map_err(|e| CoreError::LockPoisoned(e.to_string()))?;
        entries.remove(&key(slot_id, name));
        Ok(())
    }

    /// Drop every document of `slot_id`.
    pub fn invalidate_slot(&self, slot_id: &str) -> CoreResult<()> {
        let mut entries = self
            .entries
            .write()
            .map_err(|e| CoreError::LockPoisoned(e.to_string()))?;
        entries.retain(|(slot, _), _| slot != slot_id);
        Ok(())
    }

    pub fn clear(&self) -> CoreResult<()> {
        self.entries
            .write()
            .map_err(|e| CoreError::LockPoisoned(e.to_string()))?
            .clear();
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn key(slot_id: &str, name: &str) -> Key {
    (slot_id.to_string(), name.to_string())
}
