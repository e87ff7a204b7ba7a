//! Status classification
//!
//! Each monitored subsystem gets a three-level status computed from the
//! severity of its [`STATUS_WINDOW`] most recent records. Five or more
//! high/critical records raise an alert, five or more medium records a
//! warning.

use arkham_store::{Category, LogRecord, LogStore};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Records considered per classification
pub const STATUS_WINDOW: usize = 30;

/// Occurrences of a level needed to escalate
pub const STATUS_THRESHOLD: usize = 5;

/// Severity level of a single record
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// All levels, lowest first
    pub const ALL: [Severity; 4] = [
        Severity::Low,
        Severity::Medium,
        Severity::High,
        Severity::Critical,
    ];

    /// Parse an already lower-cased level name
    #[must_use]
    pub fn parse(level: &str) -> Option<Self> {
        match level {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            "critical" => Some(Self::Critical),
            _ => None,
        }
    }

    /// Lower-case name
    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }

    #[inline]
    const fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Subsystem status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Status {
    /// `(low, "Normal")`
    Normal,
    /// `(medium, "Warning")`
    Warning,
    /// `(high, "Alert")`
    Alert,
}

impl Status {
    /// Indicator level
    #[inline]
    #[must_use]
    pub const fn level(self) -> Severity {
        match self {
            Self::Normal => Severity::Low,
            Self::Warning => Severity::Medium,
            Self::Alert => Severity::High,
        }
    }

    /// Display label
    #[inline]
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Normal => "Normal",
            Self::Warning => "Warning",
            Self::Alert => "Alert",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Count levels over the first [`STATUS_WINDOW`] records and classify.
///
/// `level_of` returns `None` for records whose level is not one of the four
/// known names; those records are not counted.
pub fn classify<'a, I, F>(records: I, level_of: F) -> Status
where
    I: IntoIterator<Item = &'a LogRecord>,
    F: Fn(&LogRecord) -> Option<Severity>,
{
    let mut counts = [0usize; 4];
    for level in records.into_iter().take(STATUS_WINDOW).filter_map(|r| level_of(r)) {
        counts[level.index()] += 1;
    }

    if counts[Severity::Critical.index()] >= STATUS_THRESHOLD
        || counts[Severity::High.index()] >= STATUS_THRESHOLD
    {
        Status::Alert
    } else if counts[Severity::Medium.index()] >= STATUS_THRESHOLD {
        Status::Warning
    } else {
        Status::Normal
    }
}

/// A dashboard status indicator
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Subsystem {
    Network,
    Server,
    Surveillance,
    Access,
    Physical,
}

impl Subsystem {
    /// All indicators in dashboard order
    pub const ALL: [Subsystem; 5] = [
        Subsystem::Network,
        Subsystem::Server,
        Subsystem::Surveillance,
        Subsystem::Access,
        Subsystem::Physical,
    ];

    /// Category this indicator summarizes
    #[inline]
    #[must_use]
    pub const fn category(self) -> Category {
        match self {
            Self::Network => Category::Network,
            Self::Server => Category::ServerLogs,
            Self::Surveillance => Category::VideoSurveillance,
            Self::Access => Category::BiometricAccess,
            Self::Physical => Category::PhysicalSecurity,
        }
    }

    /// Stable element id of the indicator
    #[inline]
    #[must_use]
    pub const fn element_id(self) -> &'static str {
        match self {
            Self::Network => "networkStatus",
            Self::Server => "serverStatus",
            Self::Surveillance => "surveillanceStatus",
            Self::Access => "accessStatus",
            Self::Physical => "physicalStatus",
        }
    }

    /// Indicator for a category, if that category has one
    #[must_use]
    pub fn for_category(category: Category) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.category() == category)
    }

    /// Severity of one record under this subsystem's rule
    #[must_use]
    pub fn level_of(self, record: &LogRecord) -> Option<Severity> {
        match self {
            Self::Network => level_field(record, "threat_level"),
            Self::Surveillance => level_field(record, "level"),
            Self::Server => Some(match record.lowercase_field("status").as_deref() {
                Some("escalated") => Severity::High,
                Some("investigating" | "monitoring") => Severity::Medium,
                _ => Severity::Low,
            }),
            Self::Access => Some(match record.lowercase_field("access_result").as_deref() {
                Some("denied") => Severity::High,
                _ => Severity::Low,
            }),
            Self::Physical => Some(match record.lowercase_field("status").as_deref() {
                Some("active") => Severity::High,
                Some("fault") => Severity::Medium,
                _ => Severity::Low,
            }),
        }
    }

    /// Classify this subsystem's category, `None` if it holds no records
    #[must_use]
    pub fn status(self, store: &LogStore) -> Option<Status> {
        let records = store.records(self.category());
        if records.is_empty() {
            return None;
        }
        Some(classify(records, |r| self.level_of(r)))
    }
}

impl fmt::Display for Subsystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Network => "Network",
            Self::Server => "Server",
            Self::Surveillance => "Surveillance",
            Self::Access => "Access",
            Self::Physical => "Physical Security",
        };
        f.write_str(name)
    }
}

/// Lower-cased level field, `low` when absent, `None` when unrecognized
fn level_field(record: &LogRecord, field: &str) -> Option<Severity> {
    match record.lowercase_field(field) {
        Some(level) => Severity::parse(&level),
        None => Some(Severity::Low),
    }
}
