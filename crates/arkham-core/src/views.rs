//! Dashboard view data
//!
//! Pure functions turning a [`LogStore`] into the plain data the dashboard
//! charts and lists draw: severity distribution, recent activity, per
//! category counts, access results and the rolling alert timeline.

use crate::poller::IngestReport;
use crate::status::Severity;
use arkham_store::{Category, LogRecord, LogStore};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::cmp::Reverse;
use std::collections::{BTreeMap, VecDeque};

/// Slots kept by [`AlertTimeline`]
pub const TIMELINE_SLOTS: usize = 12;

/// Counts per severity level
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SeverityDistribution {
    pub low: usize,
    pub medium: usize,
    pub high: usize,
    pub critical: usize,
}

impl SeverityDistribution {
    fn add(&mut self, level: Severity) {
        match level {
            Severity::Low => self.low += 1,
            Severity::Medium => self.medium += 1,
            Severity::High => self.high += 1,
            Severity::Critical => self.critical += 1,
        }
    }

    /// Counts in chart order: low, medium, high, critical
    #[must_use]
    pub fn as_array(&self) -> [usize; 4] {
        [self.low, self.medium, self.high, self.critical]
    }

    /// Sum of all counts
    #[must_use]
    pub fn total(&self) -> usize {
        self.as_array().iter().sum()
    }
}

/// Severity counts across network threats, inmate threats and surveillance.
///
/// Records without the field, or with a value outside the four levels, are
/// not counted.
#[must_use]
pub fn severity_distribution(store: &LogStore) -> SeverityDistribution {
    const SOURCES: [(Category, &str); 3] = [
        (Category::Network, "threat_level"),
        (Category::InmateThreats, "threat_level"),
        (Category::VideoSurveillance, "level"),
    ];

    let mut distribution = SeverityDistribution::default();
    for (category, field) in SOURCES {
        store
            .records(category)
            .iter()
            .filter_map(|r| r.lowercase_field(field))
            .filter_map(|level| Severity::parse(&level))
            .for_each(|level| distribution.add(level));
    }
    distribution
}

/// One line of the recent activity list
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActivityItem {
    /// Short category label, e.g. `Network`
    pub kind: &'static str,
    pub category: Category,
    pub message: String,
    pub timestamp: Option<DateTime<Utc>>,
    /// Lower-cased `threat_level` or `level`, when the record has one
    pub indicator: Option<String>,
}

impl ActivityItem {
    fn from_latest(category: Category, record: &LogRecord) -> Self {
        let f = |name: &str| record.display_field(name);
        let (kind, message) = match category {
            Category::Network => (
                "Network",
                format!("{} {} traffic from {}", f("action"), f("protocol"), f("source_ip")),
            ),
            Category::ServerLogs => ("Server", format!("{} on {}", f("event"), f("server"))),
            Category::VideoSurveillance => (
                "Surveillance",
                format!("{} in {}", f("activity"), f("location")),
            ),
            Category::BiometricAccess => (
                "Access",
                format!("Access {} at {}", f("access_result"), f("location")),
            ),
            Category::PhysicalSecurity => (
                "Security",
                format!("{} {} in {}", f("system"), f("status"), f("location")),
            ),
            Category::InternalComms => ("Comms", format!("{} sent by {}", f("type"), f("sent_by"))),
            Category::InmateThreats => (
                "Inmate",
                format!(
                    "{} ({}) in {}",
                    f("name"),
                    f("threat_level"),
                    f("last_known_location")
                ),
            ),
        };

        Self {
            kind,
            category,
            message,
            timestamp: record.timestamp(),
            indicator: record
                .lowercase_field("threat_level")
                .or_else(|| record.lowercase_field("level")),
        }
    }
}

/// Newest record of each non-empty category, newest first, at most `limit`.
///
/// Items without a usable timestamp sort last.
#[must_use]
pub fn recent_activity(store: &LogStore, limit: usize) -> Vec<ActivityItem> {
    let mut items: Vec<_> = Category::ALL
        .into_iter()
        .filter_map(|c| store.latest(c).map(|r| ActivityItem::from_latest(c, r)))
        .collect();
    items.sort_by_key(|item| (item.timestamp.is_none(), Reverse(item.timestamp)));
    items.truncate(limit);
    items
}

/// Cached record count per category
#[must_use]
pub fn category_counts(store: &LogStore) -> BTreeMap<Category, usize> {
    store.iter().map(|(c, records)| (c, records.len())).collect()
}

/// Biometric access outcomes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AccessResults {
    pub granted: usize,
    pub denied: usize,
}

/// Granted vs denied counts over cached biometric records
#[must_use]
pub fn access_results(store: &LogStore) -> AccessResults {
    let mut results = AccessResults::default();
    for record in store.records(Category::BiometricAccess) {
        match record.lowercase_field("access_result").as_deref() {
            Some("granted") => results.granted += 1,
            Some("denied") => results.denied += 1,
            _ => {}
        }
    }
    results
}

/// Alerting records per timeline series for one poll cycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AlertCounts {
    pub network: usize,
    pub security: usize,
    pub access: usize,
}

impl AlertCounts {
    /// Count alerting records among those a poll cycle just appended
    #[must_use]
    pub fn from_ingest(store: &LogStore, report: &IngestReport) -> Self {
        let mut counts = Self::default();
        for &category in &report.appended {
            let Some(record) = store.latest(category) else {
                continue;
            };
            let field = |name: &str| record.lowercase_field(name);
            match category {
                Category::Network => {
                    if matches!(field("threat_level").as_deref(), Some("high" | "critical")) {
                        counts.network += 1;
                    }
                }
                Category::PhysicalSecurity => {
                    if field("status").as_deref() == Some("active") {
                        counts.security += 1;
                    }
                }
                Category::VideoSurveillance => {
                    if matches!(field("level").as_deref(), Some("high" | "severe")) {
                        counts.security += 1;
                    }
                }
                Category::BiometricAccess => {
                    if field("access_result").as_deref() == Some("denied") {
                        counts.access += 1;
                    }
                }
                _ => {}
            }
        }
        counts
    }
}

/// Rolling per-cycle alert counts for the network, security and access
/// series
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AlertTimeline {
    labels: VecDeque<String>,
    network: VecDeque<usize>,
    security: VecDeque<usize>,
    access: VecDeque<usize>,
}

impl AlertTimeline {
    /// Timeline of [`TIMELINE_SLOTS`] empty slots
    #[must_use]
    pub fn new() -> Self {
        Self {
            labels: std::iter::repeat(String::new()).take(TIMELINE_SLOTS).collect(),
            network: VecDeque::from(vec![0; TIMELINE_SLOTS]),
            security: VecDeque::from(vec![0; TIMELINE_SLOTS]),
            access: VecDeque::from(vec![0; TIMELINE_SLOTS]),
        }
    }

    /// Shift in one cycle's counts, dropping the oldest slot
    pub fn record(&mut self, label: impl Into<String>, counts: AlertCounts) {
        shift(&mut self.labels, label.into());
        shift(&mut self.network, counts.network);
        shift(&mut self.security, counts.security);
        shift(&mut self.access, counts.access);
    }

    /// Slot labels, oldest first
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.labels.iter().map(String::as_str)
    }

    /// Network series, oldest first
    #[must_use]
    pub fn network(&self) -> Vec<usize> {
        self.network.iter().copied().collect()
    }

    /// Security series (physical + surveillance), oldest first
    #[must_use]
    pub fn security(&self) -> Vec<usize> {
        self.security.iter().copied().collect()
    }

    /// Access series, oldest first
    #[must_use]
    pub fn access(&self) -> Vec<usize> {
        self.access.iter().copied().collect()
    }
}

impl Default for AlertTimeline {
    fn default() -> Self {
        Self::new()
    }
}

fn shift<T>(series: &mut VecDeque<T>, value: T) {
    series.pop_front();
    series.push_back(value);
}
