//! The `metadata` document written into every slot.

use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Format of [`Metadata::timestamp`], local time.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d,%H:%M:%S";

/// Values the running game session supplies when metadata is stamped.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SessionInfo {
    pub user_name: String,
    /// Seconds played.
    pub play_time: u64,
}

impl SessionInfo {
    pub fn new(user_name: impl Into<String>, play_time: u64) -> Self {
        Self {
            user_name: user_name.into(),
            play_time,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    pub timestamp: String,
    pub user_name: String,
    pub play_time: u64,
}

impl Metadata {
    /// Stamp `session` with the current local time.
    pub fn now(session: &SessionInfo) -> Self {
        Self::at(Local::now().naive_local(), session)
    }

    pub fn at(instant: NaiveDateTime, session: &SessionInfo) -> Self {
        Self {
            timestamp: instant.format(TIMESTAMP_FORMAT).to_string(),
            user_name: session.user_name.clone(),
            play_time: session.play_time,
        }
    }

    /// The parsed timestamp, or `None` if it does not match [`TIMESTAMP_FORMAT`].
    pub fn instant(&self) -> Option<NaiveDateTime> {
        parse_timestamp(&self.timestamp)
    }
}

pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn instant(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 9)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    #[test]
    fn test_metadata_at_formats_timestamp() {
        let session = SessionInfo::new("alice", 3600);
        let metadata = Metadata::at(instant(7, 5, 0), &session);

        assert_eq!(metadata.timestamp, "2024-03-09,07:05:00");
        assert_eq!(metadata.user_name, "alice");
        assert_eq!(metadata.play_time, 3600);
        assert_eq!(metadata.instant(), Some(instant(7, 5, 0)));
    }

    #[test]
    fn test_metadata_now_parses_back() {
        let metadata = Metadata::now(&SessionInfo::default());
        assert!(metadata.instant().is_some());
    }

    #[test]
    fn test_parse_timestamp_rejects_other_formats() {
        assert!(parse_timestamp("2024-03-09 07:05:00").is_none());
        assert!(parse_timestamp("2024-13-09,07:05:00").is_none());
        assert!(parse_timestamp("").is_none());
    }

    #[test]
    fn test_metadata_json_shape() {
        let metadata = Metadata::at(instant(23, 59, 59), &SessionInfo::new("bob", 12));
        assert_eq!(
            serde_json::to_value(&metadata).unwrap(),
            serde_json::json!({
                "timestamp": "2024-03-09,23:59:59",
                "user_name": "bob",
                "play_time": 12
            })
        );
    }
}
