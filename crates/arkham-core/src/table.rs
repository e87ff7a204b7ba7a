//! Per-category log tables
//!
//! A [`LogTable`] turns the JSON array served by a category endpoint into
//! display rows: timestamps are formatted in the caller's time zone, label
//! columns carry a CSS-style class, and the rows are searched, ordered and
//! paged according to a [`TableQuery`].

use crate::error::TableError;
use arkham_store::{parse_timestamp, Category, LogRecord, TIMESTAMP_FIELD};
use chrono::TimeZone;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Columns whose cells are rendered as labels
pub const LABEL_COLUMNS: [&str; 4] = ["threat_level", "status", "access_result", "action"];

/// Selectable page lengths
pub const PAGE_LENGTHS: [PageLength; 5] = [
    PageLength::Rows(10),
    PageLength::Rows(15),
    PageLength::Rows(25),
    PageLength::Rows(50),
    PageLength::All,
];

/// One table column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDef {
    /// Record field shown in this column
    pub data: String,
    /// Header text
    pub title: String,
    #[serde(default = "orderable_default")]
    pub orderable: bool,
}

fn orderable_default() -> bool {
    true
}

impl ColumnDef {
    /// Orderable column
    #[must_use]
    pub fn new(data: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            title: title.into(),
            orderable: true,
        }
    }

    /// Same column with ordering disabled
    #[must_use]
    pub fn unorderable(mut self) -> Self {
        self.orderable = false;
        self
    }

    fn is_timestamp(&self) -> bool {
        self.data == TIMESTAMP_FIELD
    }

    fn is_label(&self) -> bool {
        LABEL_COLUMNS.contains(&self.data.as_str())
    }
}

/// Parse column definitions from a JSON array of `{data, title, orderable?}`
///
/// # Errors
/// `TableError::Columns` for malformed JSON, `TableError::NoColumns` for an
/// empty array
pub fn parse_columns(json: &str) -> Result<Vec<ColumnDef>, TableError> {
    let columns: Vec<ColumnDef> = serde_json::from_str(json)?;
    if columns.is_empty() {
        return Err(TableError::NoColumns);
    }
    Ok(columns)
}

/// Built-in columns for a category's table
#[must_use]
pub fn default_columns(category: Category) -> Vec<ColumnDef> {
    let c = |data: &str, title: &str| ColumnDef::new(data, title);
    let mut columns = vec![c("timestamp", "Timestamp")];
    columns.extend(match category {
        Category::Network => vec![
            c("source_ip", "Source IP"),
            c("destination_ip", "Destination IP"),
            c("protocol", "Protocol"),
            c("port", "Port"),
            c("action", "Action"),
            c("threat_level", "Threat Level"),
        ],
        Category::ServerLogs => vec![
            c("server", "Server"),
            c("event", "Event"),
            c("attempts", "Attempts"),
            c("status", "Status"),
        ],
        Category::VideoSurveillance => vec![
            c("location", "Location"),
            c("level", "Level"),
            c("activity", "Activity"),
        ],
        Category::BiometricAccess => vec![
            c("scanner_id", "Scanner"),
            c("user_id", "User"),
            c("access_result", "Result"),
            c("reason", "Reason"),
            c("location", "Location"),
        ],
        Category::PhysicalSecurity => vec![
            c("system", "System"),
            c("location", "Location"),
            c("status", "Status"),
            c("trigger_reason", "Trigger"),
        ],
        Category::InternalComms => vec![
            c("type", "Type"),
            c("sent_by", "Sent By"),
            c("recipients", "Recipients").unorderable(),
            c("message", "Message").unorderable(),
        ],
        Category::InmateThreats => vec![
            c("inmate_id", "Inmate ID"),
            c("name", "Name"),
            c("threat_level", "Threat Level"),
            c("last_known_location", "Last Known Location"),
            c("incident_flag", "Incident"),
            c("recommendation", "Recommendation").unorderable(),
        ],
    });
    columns
}

/// Rows per page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageLength {
    Rows(usize),
    All,
}

impl Default for PageLength {
    fn default() -> Self {
        Self::Rows(15)
    }
}

impl FromStr for PageLength {
    type Err = TableError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("all") {
            return Ok(Self::All);
        }
        match s.parse::<usize>() {
            Ok(n) if n > 0 => Ok(Self::Rows(n)),
            _ => Err(TableError::PageLength(s.to_string())),
        }
    }
}

impl fmt::Display for PageLength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rows(n) => write!(f, "{n}"),
            Self::All => f.write_str("All"),
        }
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

/// Search, order and paging state
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableQuery {
    /// Case-insensitive search; every whitespace-separated term must match
    /// some cell of a row
    pub search: Option<String>,
    /// Column index and direction; `None` orders by timestamp, newest first
    pub order: Option<(usize, SortDirection)>,
    /// Zero-based page index
    pub page: usize,
    pub page_length: PageLength,
}

/// A rendered cell
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Cell {
    pub text: String,
    /// Class for label columns with a value
    pub label_class: Option<String>,
}

/// One page of rendered rows
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TablePage {
    pub columns: Vec<ColumnDef>,
    pub rows: Vec<Vec<Cell>>,
    /// Rows before searching
    pub total: usize,
    /// Rows after searching
    pub filtered: usize,
    /// Page actually shown, clamped to the last page
    pub page: usize,
    pub page_count: usize,
}

/// Table layout for one endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogTable {
    columns: Vec<ColumnDef>,
}

impl LogTable {
    /// Table over explicit columns
    ///
    /// # Errors
    /// `TableError::NoColumns` if `columns` is empty
    pub fn new(columns: Vec<ColumnDef>) -> Result<Self, TableError> {
        if columns.is_empty() {
            return Err(TableError::NoColumns);
        }
        Ok(Self { columns })
    }

    /// Table from a JSON column definition string
    ///
    /// # Errors
    /// As [`parse_columns`]
    pub fn from_json(json: &str) -> Result<Self, TableError> {
        Ok(Self {
            columns: parse_columns(json)?,
        })
    }

    /// Table with the built-in columns of `category`
    #[must_use]
    pub fn for_category(category: Category) -> Self {
        Self {
            columns: default_columns(category),
        }
    }

    /// Column definitions
    #[must_use]
    pub fn columns(&self) -> &[ColumnDef] {
        &self.columns
    }

    /// Index of the timestamp column, if the table has one
    #[must_use]
    pub fn timestamp_column(&self) -> Option<usize> {
        self.columns.iter().position(ColumnDef::is_timestamp)
    }

    /// Search, order and page `records`, rendering timestamps in `tz`.
    ///
    /// Ordering by a column marked unorderable leaves rows in source order.
    ///
    /// # Errors
    /// `TableError::OrderColumn` if the query orders by a column the table
    /// does not have
    pub fn render<'a, I, Tz>(
        &self,
        records: I,
        query: &TableQuery,
        tz: &Tz,
    ) -> Result<TablePage, TableError>
    where
        I: IntoIterator<Item = &'a LogRecord>,
        Tz: TimeZone,
        Tz::Offset: fmt::Display,
    {
        let order = match query.order {
            Some((index, _)) if index >= self.columns.len() => {
                return Err(TableError::OrderColumn {
                    index,
                    count: self.columns.len(),
                });
            }
            Some(order) => Some(order),
            None => self.timestamp_column().map(|i| (i, SortDirection::Desc)),
        };

        let rows: Vec<(&LogRecord, Vec<Cell>)> = records
            .into_iter()
            .map(|record| (record, self.render_row(record, tz)))
            .collect();
        let total = rows.len();

        let terms: Vec<String> = query
            .search
            .as_deref()
            .unwrap_or_default()
            .split_whitespace()
            .map(str::to_lowercase)
            .collect();
        let mut rows: Vec<_> = rows
            .into_iter()
            .filter(|(_, cells)| matches_search(cells, &terms))
            .collect();
        let filtered = rows.len();

        if let Some((index, direction)) = order {
            let column = &self.columns[index];
            if column.orderable {
                rows.sort_by(|(a, _), (b, _)| {
                    let ordering = compare_field(a, b, column);
                    match direction {
                        SortDirection::Asc => ordering,
                        SortDirection::Desc => ordering.reverse(),
                    }
                });
            }
        }

        let (page, page_count, rows) = match query.page_length {
            PageLength::All => (0, 1, rows),
            PageLength::Rows(len) => {
                let len = len.max(1);
                let page_count = filtered.div_ceil(len).max(1);
                let page = query.page.min(page_count - 1);
                let rows = rows.into_iter().skip(page * len).take(len).collect();
                (page, page_count, rows)
            }
        };

        Ok(TablePage {
            columns: self.columns.clone(),
            rows: rows.into_iter().map(|(_, cells)| cells).collect(),
            total,
            filtered,
            page,
            page_count,
        })
    }

    fn render_row<Tz>(&self, record: &LogRecord, tz: &Tz) -> Vec<Cell>
    where
        Tz: TimeZone,
        Tz::Offset: fmt::Display,
    {
        self.columns
            .iter()
            .map(|column| {
                if column.is_timestamp() {
                    let text = record
                        .get(&column.data)
                        .map(|v| format_timestamp(v, tz))
                        .unwrap_or_default();
                    return Cell { text, label_class: None };
                }
                let text = record.display_field(&column.data);
                let label_class =
                    (column.is_label() && !text.is_empty()).then(|| label_class(&text));
                Cell { text, label_class }
            })
            .collect()
    }
}

fn matches_search(cells: &[Cell], terms: &[String]) -> bool {
    terms
        .iter()
        .all(|term| cells.iter().any(|cell| cell.text.to_lowercase().contains(term.as_str())))
}

fn compare_field(a: &LogRecord, b: &LogRecord, column: &ColumnDef) -> Ordering {
    if column.is_timestamp() {
        return a.timestamp().cmp(&b.timestamp());
    }
    match (a.get(&column.data), b.get(&column.data)) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        _ => a
            .display_field(&column.data)
            .to_lowercase()
            .cmp(&b.display_field(&column.data).to_lowercase()),
    }
}

/// `YYYY-MM-DD HH:mm:ss` in `tz`; unparseable values are shown as-is
#[must_use]
pub fn format_timestamp<Tz>(value: &Value, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    match value {
        Value::String(raw) => parse_timestamp(raw).map_or_else(
            || raw.clone(),
            |at| at.with_timezone(tz).format("%Y-%m-%d %H:%M:%S").to_string(),
        ),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Lower-cased value with whitespace runs replaced by `-`
#[must_use]
pub fn label_class(value: &str) -> String {
    value
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
        .to_lowercase()
}
