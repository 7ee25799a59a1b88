//! The slot repository.
//!
//! A repository owns one save root directory. Every public operation returns
//! an [`Outcome`]; the private `*_inner` helpers do the work on
//! [`CoreResult`] and are shared with the latest-save resolver.

use crate::cache::DocumentCache;
use crate::config::StoreConfig;
use crate::error::{CoreError, CoreResult};
use crate::metadata::{Metadata, SessionInfo};
use crate::outcome::Outcome;
use crate::slot::{
    compare_ids, document_file_name, generated_id, validate_document_name, validate_slot_id,
    METADATA_DOCUMENT, REQUIRED_DOCUMENTS, STOCKS_DOCUMENT, USER_DOCUMENT,
};
use saveslot_storage::{DocumentStore, StorageError};
use saveslot_util::TimingGuard;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use std::fs;
use std::io::ErrorKind as IoErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Result of [`SlotRepository::validate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Validation {
    pub valid: bool,
    /// File names of absent required documents; `None` when the slot is complete.
    pub missing_files: Option<Vec<String>>,
}

/// A directory of save slots.
pub struct SlotRepository {
    root: PathBuf,
    store: DocumentStore,
    cache: DocumentCache,
}

impl SlotRepository {
    /// Open the save root described by `config`, creating it if missing.
    ///
    /// Temporary files left by interrupted writes are removed from every slot.
    pub fn open(config: &StoreConfig) -> CoreResult<Self> {
        fs::create_dir_all(&config.root).map_err(|e| CoreError::io(&config.root, e))?;

        let repository = Self {
            root: config.root.clone(),
            store: DocumentStore::new()
                .with_pretty(config.pretty)
                .with_durable(config.durable),
            cache: DocumentCache::new(config.cache),
        };

        match repository.recover() {
            Ok(0) => {}
            Ok(removed) => info!(root = %repository.root.display(), removed, "Recovered save root"),
            Err(e) => warn!(root = %repository.root.display(), error = %e, "Could not sweep save root"),
        }

        debug!(root = %repository.root.display(), "Opened slot repository");
        Ok(repository)
    }

    /// Open `root` with default settings.
    pub fn with_root(root: impl Into<PathBuf>) -> CoreResult<Self> {
        Self::open(&StoreConfig::with_root(root))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn cache(&self) -> &DocumentCache {
        &self.cache
    }

    /// `<root>/<slot_id>`.
    pub fn slot_path(&self, slot_id: &str) -> CoreResult<PathBuf> {
        validate_slot_id(slot_id)?;
        Ok(self.root.join(slot_id))
    }

    /// `<root>/<slot_id>/<name>.json`.
    pub fn document_path(&self, slot_id: &str, name: &str) -> CoreResult<PathBuf> {
        validate_document_name(name)?;
        Ok(self.slot_path(slot_id)?.join(document_file_name(name)))
    }

    /// Write `user`, `stocks` and freshly stamped `metadata` into a slot.
    ///
    /// With `slot_id` the slot is created if needed and its documents are
    /// overwritten. Without it the lowest unused `save_<N>` is claimed. The
    /// resolved slot ID is the outcome's data.
    pub fn create<U, S>(
        &self,
        user: &U,
        stocks: &S,
        session: &SessionInfo,
        slot_id: Option<&str>,
    ) -> Outcome<String>
    where
        U: Serialize + ?Sized,
        S: Serialize + ?Sized,
    {
        let _timing = TimingGuard::repository("create");
        Outcome::from_result(
            "SlotRepository::create",
            self.create_inner(user, stocks, session, slot_id),
        )
    }

    /// Load a document from a slot as untyped JSON.
    pub fn load_document(&self, slot_id: &str, name: &str) -> Outcome<Value> {
        Outcome::from_result(
            "SlotRepository::load_document",
            self.read_document(slot_id, name),
        )
    }

    /// Load a document from a slot into `T`.
    pub fn load_document_as<T: DeserializeOwned>(&self, slot_id: &str, name: &str) -> Outcome<T> {
        Outcome::from_result(
            "SlotRepository::load_document_as",
            self.read_document_as(slot_id, name),
        )
    }

    pub fn load_metadata(&self, slot_id: &str) -> Outcome<Metadata> {
        Outcome::from_result(
            "SlotRepository::load_metadata",
            self.read_document_as(slot_id, METADATA_DOCUMENT),
        )
    }

    /// Replace one document in an existing slot.
    ///
    /// `slot_id` is required and the slot must already exist; new slots are
    /// made with [`create`](Self::create).
    pub fn save_document<T: Serialize + ?Sized>(
        &self,
        document: &T,
        name: &str,
        slot_id: Option<&str>,
    ) -> Outcome<()> {
        Outcome::from_result(
            "SlotRepository::save_document",
            self.save_document_inner(document, name, slot_id),
        )
    }

    /// Restamp an existing slot's metadata from `session`.
    pub fn save_metadata(&self, slot_id: &str, session: &SessionInfo) -> Outcome<Metadata> {
        Outcome::from_result(
            "SlotRepository::save_metadata",
            self.require_slot(slot_id)
                .and_then(|_| self.write_metadata(slot_id, session)),
        )
    }

    /// Slot IDs under the root: `save_<N>` by number, then other names.
    pub fn list(&self) -> Outcome<Vec<String>> {
        Outcome::from_result("SlotRepository::list", self.list_ids())
    }

    /// Remove a slot and everything in it.
    pub fn delete(&self, slot_id: &str) -> Outcome<()> {
        Outcome::from_result("SlotRepository::delete", self.delete_inner(slot_id))
    }

    pub fn exists(&self, slot_id: &str) -> Outcome<bool> {
        Outcome::from_result("SlotRepository::exists", self.slot_exists(slot_id))
    }

    /// Check which required documents are present.
    ///
    /// An incomplete slot is still a successful call; inspect
    /// [`Validation::valid`].
    pub fn validate(&self, slot_id: &str) -> Outcome<Validation> {
        let _timing = TimingGuard::repository("validate");
        Outcome::from_result("SlotRepository::validate", self.validate_inner(slot_id))
    }

    /// Remove leftover temporary files from every slot directory.
    pub fn recover(&self) -> CoreResult<usize> {
        let mut removed = 0;
        for slot_id in self.list_ids()? {
            removed += self.store.sweep_temp_files(&self.root.join(&slot_id))?;
        }
        Ok(removed)
    }

    pub(crate) fn list_ids(&self) -> CoreResult<Vec<String>> {
        let _timing = TimingGuard::repository("list");
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == IoErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(CoreError::io(&self.root, e)),
        };

        let mut ids = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| CoreError::io(&self.root, e))?;
            if !entry.path().is_dir() {
                continue;
            }
            match entry.file_name().into_string() {
                Ok(name) => ids.push(name),
                Err(name) => warn!(name = ?name, "Skipping slot directory with non-UTF-8 name"),
            }
        }

        ids.sort_by(|a, b| compare_ids(a, b));
        debug!(root = %self.root.display(), count = ids.len(), "Listed slots");
        Ok(ids)
    }

    pub(crate) fn read_document(&self, slot_id: &str, name: &str) -> CoreResult<Value> {
        let path = self.document_path(slot_id, name)?;
        if let Some(value) = self.cache.get(slot_id, name)? {
            debug!(slot_id, name, "Document cache hit");
            return Ok(value);
        }
        self.load_from_disk(slot_id, name, &path)
    }

    /// Read a document from disk, skipping the cache lookup.
    ///
    /// The cache is refreshed on success and the entry dropped on failure.
    pub(crate) fn read_document_uncached(&self, slot_id: &str, name: &str) -> CoreResult<Value> {
        let path = self.document_path(slot_id, name)?;
        self.load_from_disk(slot_id, name, &path)
    }

    fn load_from_disk(&self, slot_id: &str, name: &str, path: &Path) -> CoreResult<Value> {
        match self.store.load(path) {
            Ok(value) => {
                self.cache.put(slot_id, name, value.clone())?;
                Ok(value)
            }
            Err(e) => {
                self.cache.invalidate(slot_id, name)?;
                Err(e.into())
            }
        }
    }

    pub(crate) fn read_document_as<T: DeserializeOwned>(
        &self,
        slot_id: &str,
        name: &str,
    ) -> CoreResult<T> {
        let value = self.read_document(slot_id, name)?;
        serde_json::from_value(value).map_err(|e| {
            let path = self.root.join(slot_id).join(document_file_name(name));
            CoreError::from(StorageError::json(&path, e))
        })
    }

    fn create_inner<U, S>(
        &self,
        user: &U,
        stocks: &S,
        session: &SessionInfo,
        slot_id: Option<&str>,
    ) -> CoreResult<String>
    where
        U: Serialize + ?Sized,
        S: Serialize + ?Sized,
    {
        // Serialize before touching the disk so a bad payload leaves no slot behind.
        let user = to_value(user, Path::new(&document_file_name(USER_DOCUMENT)))?;
        let stocks = to_value(stocks, Path::new(&document_file_name(STOCKS_DOCUMENT)))?;

        let (slot_id, fresh) = match slot_id {
            Some(id) => {
                let path = self.slot_path(id)?;
                let existed = self.slot_exists(id)?;
                fs::create_dir_all(&path).map_err(|e| CoreError::io(&path, e))?;
                (id.to_string(), !existed)
            }
            None => (self.claim_next_id()?, true),
        };

        if let Err(e) = self.write_slot_documents(&slot_id, session, user, stocks) {
            if fresh {
                self.discard_slot(&slot_id);
            }
            return Err(e);
        }

        info!(slot_id = %slot_id, "Created save slot");
        Ok(slot_id)
    }

    fn write_slot_documents(
        &self,
        slot_id: &str,
        session: &SessionInfo,
        user: Value,
        stocks: Value,
    ) -> CoreResult<()> {
        // Metadata goes first so a slot with user data always has a timestamp.
        self.write_metadata(slot_id, session)?;
        self.write_document(slot_id, USER_DOCUMENT, user)?;
        self.write_document(slot_id, STOCKS_DOCUMENT, stocks)
    }

    /// Remove a slot directory this repository created during a failed `create`.
    fn discard_slot(&self, slot_id: &str) {
        let path = self.root.join(slot_id);
        if let Err(e) = fs::remove_dir_all(&path) {
            warn!(slot_id, path = %path.display(), error = %e, "Could not remove partially created slot");
        }
        if let Err(e) = self.cache.invalidate_slot(slot_id) {
            warn!(slot_id, error = %e, "Could not drop cached documents of discarded slot");
        }
    }

    /// Create the directory of the lowest unused `save_<N>`.
    fn claim_next_id(&self) -> CoreResult<String> {
        let mut n = 1;
        loop {
            let id = generated_id(n);
            let path = self.root.join(&id);
            match fs::symlink_metadata(&path) {
                Ok(_) => {}
                Err(e) if e.kind() == IoErrorKind::NotFound => match fs::create_dir(&path) {
                    Ok(()) => {
                        debug!(slot_id = %id, "Claimed slot id");
                        return Ok(id);
                    }
                    Err(e) if e.kind() == IoErrorKind::AlreadyExists => {}
                    Err(e) => return Err(CoreError::io(&path, e)),
                },
                Err(e) => return Err(CoreError::io(&path, e)),
            }
            n += 1;
        }
    }

    fn save_document_inner<T: Serialize + ?Sized>(
        &self,
        document: &T,
        name: &str,
        slot_id: Option<&str>,
    ) -> CoreResult<()> {
        let slot_id = slot_id.ok_or(CoreError::MissingSlotId)?;
        let path = self.document_path(slot_id, name)?;
        self.require_slot(slot_id)?;

        let value = to_value(document, &path)?;
        self.write_document(slot_id, name, value)
    }

    fn write_metadata(&self, slot_id: &str, session: &SessionInfo) -> CoreResult<Metadata> {
        let metadata = Metadata::now(session);
        let path = self.document_path(slot_id, METADATA_DOCUMENT)?;
        self.write_document(slot_id, METADATA_DOCUMENT, to_value(&metadata, &path)?)?;
        Ok(metadata)
    }

    /// Full-replace write that keeps the cache in step with the file.
    fn write_document(&self, slot_id: &str, name: &str, value: Value) -> CoreResult<()> {
        let path = self.document_path(slot_id, name)?;
        match self.store.save(&value, &path, None) {
            Ok(()) => {
                debug!(slot_id, name, "Saved document");
                self.cache.put(slot_id, name, value)
            }
            Err(e) => {
                self.cache.invalidate(slot_id, name)?;
                Err(e.into())
            }
        }
    }

    fn delete_inner(&self, slot_id: &str) -> CoreResult<()> {
        let path = self.require_slot(slot_id)?;
        let result = fs::remove_dir_all(&path).map_err(|e| CoreError::io(&path, e));
        // Drop cached documents even if removal stopped halfway.
        self.cache.invalidate_slot(slot_id)?;
        result?;

        info!(slot_id, "Deleted save slot");
        Ok(())
    }

    fn slot_exists(&self, slot_id: &str) -> CoreResult<bool> {
        let path = self.slot_path(slot_id)?;
        match fs::metadata(&path) {
            Ok(meta) => Ok(meta.is_dir()),
            Err(e) if e.kind() == IoErrorKind::NotFound => Ok(false),
            Err(e) => Err(CoreError::io(&path, e)),
        }
    }

    /// The slot's directory, or `SlotNotFound`.
    fn require_slot(&self, slot_id: &str) -> CoreResult<PathBuf> {
        let path = self.slot_path(slot_id)?;
        if self.slot_exists(slot_id)? {
            Ok(path)
        } else {
            Err(CoreError::SlotNotFound {
                id: slot_id.to_string(),
                path,
            })
        }
    }

    fn validate_inner(&self, slot_id: &str) -> CoreResult<Validation> {
        let path = self.require_slot(slot_id)?;
        let entries = fs::read_dir(&path).map_err(|e| CoreError::io(&path, e))?;

        let mut present = HashSet::new();
        for entry in entries {
            let entry = entry.map_err(|e| CoreError::io(&path, e))?;
            if entry.path().is_file() {
                present.insert(entry.file_name().to_string_lossy().to_string());
            }
        }

        let missing: Vec<String> = REQUIRED_DOCUMENTS
            .iter()
            .map(|name| document_file_name(name))
            .filter(|file| !present.contains(file))
            .collect();

        debug!(slot_id, missing = ?missing, "Validated slot");
        Ok(if missing.is_empty() {
            Validation {
                valid: true,
                missing_files: None,
            }
        } else {
            Validation {
                valid: false,
                missing_files: Some(missing),
            }
        })
    }
}

fn to_value<T: Serialize + ?Sized>(document: &T, path: &Path) -> CoreResult<Value> {
    serde_json::to_value(document).map_err(|e| StorageError::json(path, e).into())
}
