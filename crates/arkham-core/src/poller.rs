//! Backend polling
//!
//! The poller fetches one sample record per category from the backend and
//! feeds them into the log store. Delays between polls are drawn uniformly
//! from a configured range so that open dashboards do not poll in lockstep.

use crate::config::DashboardConfig;
use crate::error::FetchError;
use arkham_store::{Category, LogRecord, LogStore};
use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::Value;
use std::time::Duration;

/// Read endpoint for one category's table data
#[must_use]
pub const fn category_endpoint(category: Category) -> &'static str {
    match category {
        Category::Network => "/api/network-monitoring",
        Category::ServerLogs => "/api/server-logs",
        Category::VideoSurveillance => "/api/video-surveillance",
        Category::BiometricAccess => "/api/biometric-access",
        Category::PhysicalSecurity => "/api/physical-security",
        Category::InternalComms => "/api/internal-comms",
        Category::InmateThreats => "/api/inmate-threats",
    }
}

/// Where log records come from
#[async_trait]
pub trait LogSource: Send + Sync {
    /// Fetch the sample-logs document: `<category>_log` → record
    ///
    /// # Errors
    /// Transport failures or a body that is not JSON
    async fn fetch_sample_logs(&self) -> Result<Value, FetchError>;

    /// Fetch the table data for one category
    ///
    /// # Errors
    /// Transport failures or a body that is not a JSON array
    async fn fetch_category(&self, category: Category) -> Result<Vec<LogRecord>, FetchError>;
}

/// [`LogSource`] backed by the dashboard HTTP API
#[derive(Debug, Clone)]
pub struct HttpLogSource {
    client: reqwest::Client,
    base_url: String,
    sample_logs_path: String,
}

impl HttpLogSource {
    /// Build a source from configuration
    ///
    /// # Errors
    /// `FetchError::Http` if the HTTP client cannot be constructed
    pub fn new(config: &DashboardConfig) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            sample_logs_path: config.sample_logs_path.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_json(&self, path: &str) -> Result<Value, FetchError> {
        let url = self.url(path);
        tracing::trace!(%url, "fetching");
        let value = self
            .client
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json::<Value>()
            .await?;
        Ok(value)
    }
}

#[async_trait]
impl LogSource for HttpLogSource {
    async fn fetch_sample_logs(&self) -> Result<Value, FetchError> {
        self.get_json(&self.sample_logs_path).await
    }

    async fn fetch_category(&self, category: Category) -> Result<Vec<LogRecord>, FetchError> {
        let value = self.get_json(category_endpoint(category)).await?;
        records_from_array(value)
    }
}

/// Convert a JSON array body into records, skipping non-object entries
///
/// # Errors
/// `FetchError::MalformedResponse` if `value` is not an array
pub fn records_from_array(value: Value) -> Result<Vec<LogRecord>, FetchError> {
    let Value::Array(items) = value else {
        return Err(FetchError::malformed(format!(
            "expected array of log records, got {}",
            json_kind(&value)
        )));
    };
    let total = items.len();
    let records: Vec<_> = items
        .into_iter()
        .filter_map(|item| LogRecord::from_value(item).ok())
        .collect();
    if records.len() < total {
        tracing::debug!(skipped = total - records.len(), "non-object table rows skipped");
    }
    Ok(records)
}

/// Outcome of ingesting one sample-logs response
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestReport {
    /// Categories that received a record, in response order
    pub appended: Vec<Category>,
    /// Response keys that were not ingested
    pub skipped: Vec<String>,
}

impl IngestReport {
    /// Number of records appended
    #[inline]
    #[must_use]
    pub fn appended_count(&self) -> usize {
        self.appended.len()
    }
}

/// Append every recognizable entry of a sample-logs response to `store`.
///
/// Keys resolve through [`Category::from_response_key`]; keys naming no
/// store category and values that are not objects are skipped.
///
/// # Errors
/// `FetchError::MalformedResponse` if `response` is not a JSON object; the
/// store is untouched
pub fn ingest_response(store: &mut LogStore, response: &Value) -> Result<IngestReport, FetchError> {
    let Value::Object(entries) = response else {
        return Err(FetchError::malformed(format!(
            "invalid or empty sample logs response: {}",
            json_kind(response)
        )));
    };

    let mut report = IngestReport::default();
    for (key, value) in entries {
        let Some(category) = Category::from_response_key(key) else {
            tracing::debug!(%key, "response key has no store category");
            report.skipped.push(key.clone());
            continue;
        };
        match LogRecord::from_value(value.clone()) {
            Ok(record) => {
                store.push(category, record);
                report.appended.push(category);
            }
            Err(_) => {
                tracing::warn!(%key, "sample log entry is not an object");
                report.skipped.push(key.clone());
            }
        }
    }
    Ok(report)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Jittered delay generator
#[derive(Debug)]
pub struct PollSchedule {
    min_ms: u64,
    max_ms: u64,
    rng: StdRng,
}

impl PollSchedule {
    /// Delays uniform in `[min_ms, max_ms]`; the bounds are swapped if
    /// given in the wrong order
    #[must_use]
    pub fn new(min_ms: u64, max_ms: u64) -> Self {
        Self::with_rng(min_ms, max_ms, StdRng::from_entropy())
    }

    /// Deterministic schedule for reproducible runs
    #[must_use]
    pub fn seeded(min_ms: u64, max_ms: u64, seed: u64) -> Self {
        Self::with_rng(min_ms, max_ms, StdRng::seed_from_u64(seed))
    }

    /// Schedule using the configured poll range
    #[must_use]
    pub fn from_config(config: &DashboardConfig) -> Self {
        Self::new(config.poll_min_ms, config.poll_max_ms)
    }

    fn with_rng(a: u64, b: u64, rng: StdRng) -> Self {
        Self {
            min_ms: a.min(b),
            max_ms: a.max(b),
            rng,
        }
    }

    /// Delay bounds in milliseconds
    #[inline]
    #[must_use]
    pub fn bounds(&self) -> (u64, u64) {
        (self.min_ms, self.max_ms)
    }

    /// Draw the next delay
    pub fn next_delay(&mut self) -> Duration {
        Duration::from_millis(self.rng.gen_range(self.min_ms..=self.max_ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;

    fn sample_record(level: &str) -> Value {
        json!({"threat_level": level, "timestamp": "2025-03-14T12:00:00Z"})
    }

    #[test]
    fn ingest_maps_keys_to_categories() {
        let mut store = LogStore::new(Utc::now());
        let response = json!({
            "network_log": sample_record("low"),
            "server_log": {"status": "resolved"},
        });

        let report = ingest_response(&mut store, &response).unwrap();

        assert_eq!(report.appended_count(), 2);
        assert!(report.appended.contains(&Category::Network));
        assert!(report.appended.contains(&Category::ServerLogs));
        assert_eq!(store.len(Category::Network), 1);
        assert_eq!(store.len(Category::ServerLogs), 1);
        assert!(report.skipped.is_empty());
    }

    #[test]
    fn ingest_skips_unresolvable_keys() {
        let mut store = LogStore::new(Utc::now());
        let response = json!({
            "inmate_threat_log": sample_record("critical"),
            "weather_log": {},
        });

        let report = ingest_response(&mut store, &response).unwrap();

        assert_eq!(report.appended_count(), 0);
        assert_eq!(report.skipped.len(), 2);
        assert!(store.is_empty());
    }

    #[test]
    fn ingest_skips_non_object_values() {
        let mut store = LogStore::new(Utc::now());
        let report = ingest_response(&mut store, &json!({"network_log": "oops"})).unwrap();
        assert_eq!(report.skipped, vec!["network_log".to_string()]);
        assert!(store.is_empty());
    }

    #[test]
    fn non_object_response_is_malformed() {
        let mut store = LogStore::new(Utc::now());
        for response in [json!(null), json!([1, 2]), json!("text")] {
            let err = ingest_response(&mut store, &response).unwrap_err();
            assert!(matches!(err, FetchError::MalformedResponse(_)));
        }
        assert!(store.is_empty());
    }

    #[test]
    fn table_rows_must_be_an_array() {
        let rows = records_from_array(json!([{"a": 1}, 7, {"b": 2}])).unwrap();
        assert_eq!(rows.len(), 2);
        assert!(records_from_array(json!({"a": 1})).is_err());
    }

    #[test]
    fn delays_stay_within_bounds() {
        let mut schedule = PollSchedule::seeded(2000, 4000, 7);
        for _ in 0..1000 {
            let delay = schedule.next_delay();
            assert!(delay >= Duration::from_millis(2000));
            assert!(delay <= Duration::from_millis(4000));
        }
    }

    #[test]
    fn delays_are_jittered() {
        let mut schedule = PollSchedule::seeded(2000, 4000, 11);
        let first = schedule.next_delay();
        assert!((0..50).any(|_| schedule.next_delay() != first));
    }

    #[test]
    fn degenerate_and_inverted_ranges() {
        let mut fixed = PollSchedule::seeded(3000, 3000, 1);
        assert_eq!(fixed.next_delay(), Duration::from_millis(3000));

        let inverted = PollSchedule::seeded(4000, 2000, 1);
        assert_eq!(inverted.bounds(), (2000, 4000));
    }

    #[test]
    fn every_category_has_an_endpoint() {
        for category in Category::ALL {
            assert!(category_endpoint(category).starts_with("/api/"));
        }
    }

    #[test]
    fn http_source_trims_trailing_slash() {
        let config = DashboardConfig::new().with_base_url("http://127.0.0.1:5000/");
        let source = HttpLogSource::new(&config).unwrap();
        assert_eq!(source.url("/api/sample-logs"), "http://127.0.0.1:5000/api/sample-logs");
    }
}
