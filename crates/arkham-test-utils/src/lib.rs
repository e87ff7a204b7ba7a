//! Testing utilities for the Arkham dashboard workspace
//!
//! Record fixtures, a scripted [`LogSource`] and a renderer that records
//! every update it receives.

#![allow(missing_docs)]

use arkham_core::{
    AccessResults, ActivityItem, AlertTimeline, FetchError, LogSource, RenderError,
    SeverityDistribution, Status, Subsystem, ViewRenderer,
};
use arkham_store::{Category, LogRecord};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashSet, VecDeque};
use std::sync::Arc;
use tokio::time::Instant;

pub fn network_record(threat_level: &str) -> LogRecord {
    LogRecord::new()
        .with_field("source_ip", "192.168.10.4")
        .with_field("destination_ip", "10.0.0.12")
        .with_field("protocol", "TCP")
        .with_field("port", 443)
        .with_field("action", "blocked")
        .with_field("threat_level", threat_level)
}

pub fn server_record(status: &str) -> LogRecord {
    LogRecord::new()
        .with_field("server", "db-core-1")
        .with_field("event", "Unauthorized login attempt")
        .with_field("attempts", 3)
        .with_field("status", status)
}

/// `record` with its timestamp set to `at`
pub fn stamped(record: LogRecord, at: DateTime<Utc>) -> LogRecord {
    record.with_field("timestamp", at.to_rfc3339_opts(SecondsFormat::Secs, true))
}

/// Sample-logs response with one network and one server record
pub fn sample_response() -> Value {
    json!({
        "network_log": network_record("low").into_inner(),
        "server_log": server_record("resolved").into_inner(),
    })
}

/// Sample-logs response covering every key the backend sends
pub fn full_response(threat_level: &str) -> Value {
    json!({
        "network_log": network_record(threat_level).into_inner(),
        "server_log": server_record("escalated").into_inner(),
        "video_surveillance_log": {
            "location": "Cell Block A",
            "level": threat_level,
            "activity": "loitering",
        },
        "biometric_access_log": {
            "scanner_id": "BIO-7",
            "access_result": "denied",
            "location": "Armory",
        },
        "physical_security_log": {"system": "door_lock", "status": "active", "location": "Yard"},
        "internal_comms_log": {"type": "alert", "sent_by": "warden", "message": "lockdown"},
        "inmate_threat_log": {"name": "Harvey Dent", "threat_level": threat_level},
    })
}

/// A [`LogSource`] that replays queued responses
///
/// Clones share the queue, so a test keeps one handle while the session owns
/// another. Once the queue is empty every fetch fails with
/// `FetchError::Exhausted`.
#[derive(Debug, Clone, Default)]
pub struct ScriptedSource {
    inner: Arc<Mutex<Script>>,
}

#[derive(Debug, Default)]
struct Script {
    responses: VecDeque<Result<Value, FetchError>>,
    tables: BTreeMap<Category, Vec<LogRecord>>,
    fetched_at: Vec<Instant>,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful response
    pub fn push(&self, response: Value) -> &Self {
        self.inner.lock().responses.push_back(Ok(response));
        self
    }

    /// Queue a failed fetch
    pub fn push_err(&self, err: FetchError) -> &Self {
        self.inner.lock().responses.push_back(Err(err));
        self
    }

    /// Serve `rows` from the category endpoint
    pub fn set_table(&self, category: Category, rows: Vec<LogRecord>) {
        self.inner.lock().tables.insert(category, rows);
    }

    /// Instants at which sample logs were fetched
    pub fn fetch_times(&self) -> Vec<Instant> {
        self.inner.lock().fetched_at.clone()
    }

    pub fn fetch_count(&self) -> usize {
        self.inner.lock().fetched_at.len()
    }

    pub fn remaining(&self) -> usize {
        self.inner.lock().responses.len()
    }
}

#[async_trait]
impl LogSource for ScriptedSource {
    async fn fetch_sample_logs(&self) -> Result<Value, FetchError> {
        let mut script = self.inner.lock();
        script.fetched_at.push(Instant::now());
        script.responses.pop_front().unwrap_or(Err(FetchError::Exhausted))
    }

    async fn fetch_category(&self, category: Category) -> Result<Vec<LogRecord>, FetchError> {
        Ok(self.inner.lock().tables.get(&category).cloned().unwrap_or_default())
    }
}

/// One renderer call
#[derive(Debug, Clone, PartialEq)]
pub enum RenderEvent {
    Status(Subsystem, Status),
    Severity(SeverityDistribution),
    Activity(Vec<ActivityItem>),
    Categories(BTreeMap<Category, usize>),
    Access(AccessResults),
    Timeline(AlertTimeline),
}

/// A [`ViewRenderer`] that records every update
///
/// Subsystems marked missing fail with `RenderError::MissingTarget`, as a
/// page without that indicator element would.
#[derive(Debug, Clone, Default)]
pub struct RecordingRenderer {
    events: Arc<Mutex<Vec<RenderEvent>>>,
    missing: HashSet<Subsystem>,
}

impl RecordingRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Renderer whose page lacks `subsystem`'s indicator
    pub fn without(mut self, subsystem: Subsystem) -> Self {
        self.missing.insert(subsystem);
        self
    }

    pub fn events(&self) -> Vec<RenderEvent> {
        self.events.lock().clone()
    }

    /// Statuses rendered so far, in call order
    pub fn statuses(&self) -> Vec<(Subsystem, Status)> {
        self.events
            .lock()
            .iter()
            .filter_map(|e| match e {
                RenderEvent::Status(s, status) => Some((*s, *status)),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }

    fn record(&self, event: RenderEvent) {
        self.events.lock().push(event);
    }
}

impl ViewRenderer for RecordingRenderer {
    fn update_status(&mut self, subsystem: Subsystem, status: Status) -> Result<(), RenderError> {
        if self.missing.contains(&subsystem) {
            return Err(RenderError::missing_target(subsystem.element_id()));
        }
        self.record(RenderEvent::Status(subsystem, status));
        Ok(())
    }

    fn update_severity_chart(
        &mut self,
        distribution: &SeverityDistribution,
    ) -> Result<(), RenderError> {
        self.record(RenderEvent::Severity(*distribution));
        Ok(())
    }

    fn update_recent_activity(&mut self, items: &[ActivityItem]) -> Result<(), RenderError> {
        self.record(RenderEvent::Activity(items.to_vec()));
        Ok(())
    }

    fn update_category_chart(
        &mut self,
        counts: &BTreeMap<Category, usize>,
    ) -> Result<(), RenderError> {
        self.record(RenderEvent::Categories(counts.clone()));
        Ok(())
    }

    fn update_access_chart(&mut self, results: &AccessResults) -> Result<(), RenderError> {
        self.record(RenderEvent::Access(*results));
        Ok(())
    }

    fn update_timeline(&mut self, timeline: &AlertTimeline) -> Result<(), RenderError> {
        self.record(RenderEvent::Timeline(timeline.clone()));
        Ok(())
    }
}
