//! Latest-save resolution by metadata timestamp.

use crate::error::{CoreError, CoreResult};
use crate::metadata::parse_timestamp;
use crate::outcome::Outcome;
use crate::repository::SlotRepository;
use crate::slot::METADATA_DOCUMENT;
use chrono::NaiveDateTime;
use saveslot_util::TimingGuard;
use serde_json::Value;
use tracing::{debug, warn};

impl SlotRepository {
    /// ID of the slot whose metadata timestamp is the most recent.
    ///
    /// Only the metadata `timestamp` field is consulted, read from disk. Slots
    /// with missing or unreadable metadata, or a timestamp that does not parse,
    /// are skipped. Equal timestamps keep the slot that comes first in
    /// [`list`](Self::list) order. Fails with "no valid saves found" when no
    /// slot qualifies.
    pub fn get_latest_save_id(&self) -> Outcome<String> {
        let _timing = TimingGuard::repository("get_latest_save_id");
        Outcome::from_result("SlotRepository::get_latest_save_id", self.latest_inner())
    }

    fn latest_inner(&self) -> CoreResult<String> {
        let mut latest: Option<(NaiveDateTime, String)> = None;

        for slot_id in self.list_ids()? {
            // Always from disk: a corrupt file must not be masked by a cached copy.
            let metadata = match self.read_document_uncached(&slot_id, METADATA_DOCUMENT) {
                Ok(metadata) => metadata,
                Err(e) => {
                    warn!(slot_id = %slot_id, error = %e, "Skipping slot without readable metadata");
                    continue;
                }
            };

            let raw = metadata
                .get("timestamp")
                .and_then(Value::as_str)
                .unwrap_or_default();
            let Some(instant) = parse_timestamp(raw) else {
                warn!(slot_id = %slot_id, timestamp = %raw, "Skipping slot with unparseable timestamp");
                continue;
            };

            if latest.as_ref().map_or(true, |(best, _)| instant > *best) {
                latest = Some((instant, slot_id));
            }
        }

        let (instant, slot_id) = latest.ok_or(CoreError::NoValidSaves)?;
        debug!(slot_id = %slot_id, %instant, "Resolved latest save");
        Ok(slot_id)
    }
}

#[cfg(test)]
mod tests {
    use crate::metadata::SessionInfo;
    use crate::SlotRepository;
    use saveslot_storage::ErrorKind;
    use serde_json::json;
    use std::fs;
    use tempfile::tempdir;

    fn write_metadata(repository: &SlotRepository, slot_id: &str, timestamp: &str) {
        repository.create(&json!({}), &json!({}), &SessionInfo::default(), Some(slot_id));
        repository.save_document(
            &json!({"timestamp": timestamp, "user_name": "u", "play_time": 0}),
            "metadata",
            Some(slot_id),
        );
    }

    #[test]
    fn test_latest_picks_greatest_timestamp() {
        let dir = tempdir().unwrap();
        let repository = SlotRepository::with_root(dir.path()).unwrap();
        write_metadata(&repository, "save_1", "2024-01-01,10:00:00");
        write_metadata(&repository, "save_2", "2024-06-01,09:00:00");
        write_metadata(&repository, "save_3", "2024-03-01,23:59:59");

        assert_eq!(
            repository.get_latest_save_id().into_data().as_deref(),
            Some("save_2")
        );
    }

    #[test]
    fn test_latest_skips_corrupt_metadata() {
        let dir = tempdir().unwrap();
        let repository = SlotRepository::with_root(dir.path()).unwrap();
        write_metadata(&repository, "save_1", "2024-01-01,10:00:00");
        write_metadata(&repository, "save_2", "yesterday");
        write_metadata(&repository, "save_3", "2024-01-03,10:00:00");
        write_metadata(&repository, "save_4", "2024-01-02,10:00:00");
        fs::write(dir.path().join("save_4/metadata.json"), "{{{").unwrap();

        assert_eq!(
            repository.get_latest_save_id().into_data().as_deref(),
            Some("save_3")
        );
    }

    #[test]
    fn test_latest_tie_keeps_first_in_list_order() {
        let dir = tempdir().unwrap();
        let repository = SlotRepository::with_root(dir.path()).unwrap();
        write_metadata(&repository, "latest", "2024-01-01,10:00:00");
        write_metadata(&repository, "save_2", "2024-01-01,10:00:00");

        assert_eq!(
            repository.get_latest_save_id().into_data().as_deref(),
            Some("save_2")
        );
    }

    #[test]
    fn test_latest_empty_root() {
        let dir = tempdir().unwrap();
        let repository = SlotRepository::with_root(dir.path()).unwrap();

        let outcome = repository.get_latest_save_id();
        assert!(!outcome.success);
        assert_eq!(outcome.kind(), Some(ErrorKind::NotFound));
        assert!(outcome.error.unwrap().contains("no valid saves found"));
    }

    #[test]
    fn test_latest_all_invalid() {
        let dir = tempdir().unwrap();
        let repository = SlotRepository::with_root(dir.path()).unwrap();
        write_metadata(&repository, "save_1", "");
        fs::create_dir(dir.path().join("save_2")).unwrap();

        assert!(!repository.get_latest_save_id().success);
    }

    #[test]
    fn test_latest_reads_only_timestamp() {
        let dir = tempdir().unwrap();
        let repository = SlotRepository::with_root(dir.path()).unwrap();
        write_metadata(&repository, "save_1", "2024-01-01,10:00:00");
        write_metadata(&repository, "save_2", "2024-01-01,10:00:00");
        repository.save_document(
            &json!({"timestamp": "2024-01-01,09:00:00", "user_name": "a", "play_time": 12.5}),
            "metadata",
            Some("save_1"),
        );
        repository.save_document(
            &json!({"timestamp": "2024-05-01,10:00:00"}),
            "metadata",
            Some("save_2"),
        );

        assert_eq!(
            repository.get_latest_save_id().into_data().as_deref(),
            Some("save_2")
        );
    }

    #[test]
    fn test_latest_sees_disk_changes_behind_cache() {
        let dir = tempdir().unwrap();
        let repository = SlotRepository::with_root(dir.path()).unwrap();
        write_metadata(&repository, "save_1", "2024-01-01,10:00:00");
        write_metadata(&repository, "save_2", "2024-02-01,10:00:00");
        assert!(repository.cache().is_enabled());
        assert!(repository.load_document("save_2", "metadata").success);

        fs::write(dir.path().join("save_2/metadata.json"), "{\"timestamp\": ").unwrap();

        assert_eq!(
            repository.get_latest_save_id().into_data().as_deref(),
            Some("save_1")
        );
        // The failed read dropped the stale entry, so loads agree with the disk.
        assert_eq!(
            repository.load_document("save_2", "metadata").kind(),
            Some(ErrorKind::Malformed)
        );
    }
}
