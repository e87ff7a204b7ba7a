//! In-memory log store
//!
//! Seven newest-first sequences, one per [`Category`], each capped at
//! [`MAX_LOGS`] records. The serialized form is a single JSON object with one
//! array per category plus `lastCleared`.

use crate::category::Category;
use crate::error::{StoreError, StoreResult};
use crate::record::{LogRecord, RecordTime};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Maximum records kept per category
pub const MAX_LOGS: usize = 100;

/// Age in seconds past which [`LogStore::purge_expired`] drops a record
pub const RETENTION_SECS: i64 = 120;

/// Retention window as a duration
#[inline]
#[must_use]
pub fn retention() -> Duration {
    Duration::seconds(RETENTION_SECS)
}

/// Per-category bounded log sequences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogStore {
    #[serde(default)]
    network: VecDeque<LogRecord>,
    #[serde(default)]
    server_logs: VecDeque<LogRecord>,
    #[serde(default)]
    video_surveillance: VecDeque<LogRecord>,
    #[serde(default)]
    biometric_access: VecDeque<LogRecord>,
    #[serde(default)]
    physical_security: VecDeque<LogRecord>,
    #[serde(default)]
    internal_comms: VecDeque<LogRecord>,
    #[serde(default)]
    inmate_threats: VecDeque<LogRecord>,
    #[serde(rename = "lastCleared")]
    last_cleared: DateTime<Utc>,
}

impl LogStore {
    /// Create an empty store cleared at `now`
    #[must_use]
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            network: VecDeque::new(),
            server_logs: VecDeque::new(),
            video_surveillance: VecDeque::new(),
            biometric_access: VecDeque::new(),
            physical_security: VecDeque::new(),
            internal_comms: VecDeque::new(),
            inmate_threats: VecDeque::new(),
            last_cleared: now,
        }
    }

    /// When the store was created or last reset
    #[inline]
    #[must_use]
    pub fn last_cleared(&self) -> DateTime<Utc> {
        self.last_cleared
    }

    /// Records of one category, newest first
    #[must_use]
    pub fn records(&self, category: Category) -> &VecDeque<LogRecord> {
        match category {
            Category::Network => &self.network,
            Category::ServerLogs => &self.server_logs,
            Category::VideoSurveillance => &self.video_surveillance,
            Category::BiometricAccess => &self.biometric_access,
            Category::PhysicalSecurity => &self.physical_security,
            Category::InternalComms => &self.internal_comms,
            Category::InmateThreats => &self.inmate_threats,
        }
    }

    fn records_mut(&mut self, category: Category) -> &mut VecDeque<LogRecord> {
        match category {
            Category::Network => &mut self.network,
            Category::ServerLogs => &mut self.server_logs,
            Category::VideoSurveillance => &mut self.video_surveillance,
            Category::BiometricAccess => &mut self.biometric_access,
            Category::PhysicalSecurity => &mut self.physical_security,
            Category::InternalComms => &mut self.internal_comms,
            Category::InmateThreats => &mut self.inmate_threats,
        }
    }

    /// Most recent record of a category
    #[inline]
    #[must_use]
    pub fn latest(&self, category: Category) -> Option<&LogRecord> {
        self.records(category).front()
    }

    /// Number of records in a category
    #[inline]
    #[must_use]
    pub fn len(&self, category: Category) -> usize {
        self.records(category).len()
    }

    /// Number of records across all categories
    #[must_use]
    pub fn total_len(&self) -> usize {
        Category::ALL.iter().map(|c| self.len(*c)).sum()
    }

    /// True if every category is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        Category::ALL.iter().all(|c| self.records(*c).is_empty())
    }

    /// Iterate over categories and their records
    pub fn iter(&self) -> impl Iterator<Item = (Category, &VecDeque<LogRecord>)> {
        Category::ALL.into_iter().map(move |c| (c, self.records(c)))
    }

    /// Insert a record at the head of a category, trimming to [`MAX_LOGS`]
    pub fn push(&mut self, category: Category, record: LogRecord) {
        let records = self.records_mut(category);
        records.push_front(record);
        records.truncate(MAX_LOGS);
    }

    /// Insert a record into the category named `name`.
    ///
    /// # Errors
    /// `StoreError::UnknownCategory` if `name` is not a store category; the
    /// store is left untouched.
    pub fn append(&mut self, name: &str, record: LogRecord) -> StoreResult<Category> {
        let category: Category = name.parse()?;
        self.push(category, record);
        Ok(category)
    }

    /// Remove records whose timestamp is not newer than `now - retention()`.
    ///
    /// Records without a timestamp are kept; unparseable timestamps expire.
    /// Returns the number of records removed.
    pub fn purge_expired(&mut self, now: DateTime<Utc>) -> usize {
        let cutoff = now - retention();
        let mut removed = 0;
        for category in Category::ALL {
            let records = self.records_mut(category);
            let before = records.len();
            records.retain(|record| match record.time() {
                RecordTime::Missing => true,
                RecordTime::At(at) => at > cutoff,
                RecordTime::Invalid => false,
            });
            removed += before - records.len();
        }
        removed
    }

    /// Serialize to the snapshot format
    ///
    /// # Errors
    /// `StoreError::Serialize` if a record cannot be encoded
    pub fn to_json(&self) -> StoreResult<String> {
        serde_json::to_string(self).map_err(StoreError::Serialize)
    }

    /// Parse a snapshot.
    ///
    /// Missing category arrays restore empty and any category holding more
    /// than [`MAX_LOGS`] records is trimmed.
    ///
    /// # Errors
    /// `StoreError::Parse` for malformed JSON, a non-object document, a
    /// non-array category or a missing `lastCleared`
    pub fn from_json(snapshot: &str) -> StoreResult<Self> {
        let mut store: Self = serde_json::from_str(snapshot).map_err(StoreError::Parse)?;
        for category in Category::ALL {
            store.records_mut(category).truncate(MAX_LOGS);
        }
        Ok(store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::TIMESTAMP_FIELD;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 14, 12, 0, 0).unwrap() + Duration::seconds(secs)
    }

    fn record(seq: usize) -> LogRecord {
        LogRecord::new().with_field("seq", seq)
    }

    fn stamped(time: DateTime<Utc>) -> LogRecord {
        LogRecord::new().with_field(TIMESTAMP_FIELD, time.to_rfc3339())
    }

    #[test]
    fn new_store_is_empty() {
        let store = LogStore::new(at(0));
        assert!(store.is_empty());
        assert_eq!(store.total_len(), 0);
        assert_eq!(store.last_cleared(), at(0));
    }

    #[test]
    fn push_inserts_at_head() {
        let mut store = LogStore::new(at(0));
        store.push(Category::Network, record(1));
        store.push(Category::Network, record(2));

        let seqs: Vec<_> = store
            .records(Category::Network)
            .iter()
            .map(|r| r.get("seq").cloned())
            .collect();
        assert_eq!(seqs, vec![Some(json!(2)), Some(json!(1))]);
        assert_eq!(store.latest(Category::Network), Some(&record(2)));
    }

    #[test]
    fn push_caps_at_max_logs_dropping_oldest() {
        let mut store = LogStore::new(at(0));
        for seq in 0..MAX_LOGS + 5 {
            store.push(Category::ServerLogs, record(seq));
        }

        let records = store.records(Category::ServerLogs);
        assert_eq!(records.len(), MAX_LOGS);
        assert_eq!(records.front(), Some(&record(MAX_LOGS + 4)));
        assert_eq!(records.back(), Some(&record(5)));
    }

    #[test]
    fn append_by_name() {
        let mut store = LogStore::new(at(0));
        let category = store.append("biometric_access", record(1)).unwrap();
        assert_eq!(category, Category::BiometricAccess);
        assert_eq!(store.len(Category::BiometricAccess), 1);
    }

    #[test]
    fn append_unknown_category_leaves_store_untouched() {
        let mut store = LogStore::new(at(0));
        store.push(Category::Network, record(1));
        let before = store.clone();

        let err = store.append("inmate_threat", record(2)).unwrap_err();
        assert!(matches!(err, StoreError::UnknownCategory(_)));
        assert_eq!(store, before);
    }

    #[test]
    fn purge_drops_records_past_retention() {
        let now = at(600);
        let mut store = LogStore::new(at(0));
        store.push(Category::Network, stamped(now - Duration::minutes(5)));
        store.push(Category::Network, stamped(now - Duration::seconds(30)));
        store.push(Category::InternalComms, stamped(now - Duration::minutes(3)));

        assert_eq!(store.purge_expired(now), 2);
        assert_eq!(store.len(Category::Network), 1);
        assert_eq!(store.len(Category::InternalComms), 0);
    }

    #[test]
    fn purge_cutoff_is_exclusive() {
        let now = at(600);
        let mut store = LogStore::new(at(0));
        store.push(Category::Network, stamped(now - retention()));
        assert_eq!(store.purge_expired(now), 1);
    }

    #[test]
    fn purge_keeps_untimestamped_records() {
        let mut store = LogStore::new(at(0));
        store.push(Category::PhysicalSecurity, record(1));
        assert_eq!(store.purge_expired(at(1_000_000)), 0);
        assert_eq!(store.len(Category::PhysicalSecurity), 1);
    }

    #[test]
    fn purge_drops_unparseable_timestamps() {
        let mut store = LogStore::new(at(0));
        store.push(
            Category::Network,
            LogRecord::new().with_field(TIMESTAMP_FIELD, "not a date"),
        );
        assert_eq!(store.purge_expired(at(1)), 1);
    }

    #[test]
    fn purge_leaves_last_cleared_alone() {
        let mut store = LogStore::new(at(0));
        store.purge_expired(at(600));
        assert_eq!(store.last_cleared(), at(0));
    }

    #[test]
    fn snapshot_has_expected_shape() {
        let mut store = LogStore::new(at(0));
        store.push(Category::Network, record(1));

        let value: serde_json::Value = serde_json::from_str(&store.to_json().unwrap()).unwrap();
        let object = value.as_object().unwrap();
        for category in Category::ALL {
            assert!(object.get(category.as_str()).unwrap().is_array());
        }
        assert!(object.get("lastCleared").unwrap().is_string());
        assert_eq!(object.len(), 8);
    }

    #[test]
    fn snapshot_round_trip() {
        let mut store = LogStore::new(at(0));
        store.push(Category::Network, record(1));
        store.push(Category::InmateThreats, stamped(at(5)));

        let restored = LogStore::from_json(&store.to_json().unwrap()).unwrap();
        assert_eq!(restored, store);
    }

    #[test]
    fn snapshot_written_by_browser_client_restores() {
        let snapshot = r#"{
            "network": [{"threat_level": "low", "timestamp": "2025-03-14T12:00:00+00:00Z"}],
            "server_logs": [],
            "video_surveillance": [],
            "biometric_access": [],
            "physical_security": [],
            "internal_comms": [],
            "inmate_threats": [],
            "lastCleared": "2025-03-14T11:59:00.000Z"
        }"#;

        let store = LogStore::from_json(snapshot).unwrap();
        assert_eq!(store.len(Category::Network), 1);
        assert_eq!(store.last_cleared(), at(-60));
    }

    #[test]
    fn missing_categories_restore_empty() {
        let store = LogStore::from_json(r#"{"lastCleared": "2025-03-14T12:00:00Z"}"#).unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn malformed_snapshots_fail_to_parse() {
        for snapshot in [
            "{not json",
            "[]",
            r#"{"network": []}"#,
            r#"{"network": 5, "lastCleared": "2025-03-14T12:00:00Z"}"#,
        ] {
            let err = LogStore::from_json(snapshot).unwrap_err();
            assert!(err.is_corrupt_snapshot(), "{snapshot} should be rejected");
        }
    }

    #[test]
    fn oversized_snapshot_is_trimmed() {
        let records: Vec<_> = (0..MAX_LOGS + 20).map(|i| json!({"seq": i})).collect();
        let snapshot = json!({
            "network": records,
            "lastCleared": "2025-03-14T12:00:00Z",
        });

        let store = LogStore::from_json(&snapshot.to_string()).unwrap();
        assert_eq!(store.len(Category::Network), MAX_LOGS);
        assert_eq!(store.latest(Category::Network), Some(&record(0)));
    }
}
