//! Terminal output for dashboard views and tables

use arkham_core::{
    AccessResults, ActivityItem, AlertTimeline, DashboardFrame, RenderError, SeverityDistribution,
    Status, Subsystem, TablePage, ViewRenderer,
};
use arkham_store::Category;
use std::collections::BTreeMap;

/// Prints view updates as plain lines; unchanged values are not reprinted
#[derive(Debug, Default)]
pub(crate) struct ConsoleRenderer {
    statuses: BTreeMap<Subsystem, Status>,
    last_activity: Vec<String>,
}

impl ViewRenderer for ConsoleRenderer {
    fn update_status(&mut self, subsystem: Subsystem, status: Status) -> Result<(), RenderError> {
        if self.statuses.insert(subsystem, status) != Some(status) {
            println!("[{}] {subsystem}: {status}", subsystem.element_id());
        }
        Ok(())
    }

    fn update_severity_chart(
        &mut self,
        distribution: &SeverityDistribution,
    ) -> Result<(), RenderError> {
        let [low, medium, high, critical] = distribution.as_array();
        println!("severity  low={low} medium={medium} high={high} critical={critical}");
        Ok(())
    }

    fn update_recent_activity(&mut self, items: &[ActivityItem]) -> Result<(), RenderError> {
        let lines: Vec<String> = items.iter().map(activity_line).collect();
        if lines != self.last_activity {
            for line in &lines {
                println!("  {line}");
            }
            self.last_activity = lines;
        }
        Ok(())
    }

    fn update_access_chart(&mut self, results: &AccessResults) -> Result<(), RenderError> {
        println!("access    granted={} denied={}", results.granted, results.denied);
        Ok(())
    }

    fn update_timeline(&mut self, timeline: &AlertTimeline) -> Result<(), RenderError> {
        let latest = |series: Vec<usize>| series.last().copied().unwrap_or_default();
        println!(
            "alerts    network={} security={} access={}",
            latest(timeline.network()),
            latest(timeline.security()),
            latest(timeline.access())
        );
        Ok(())
    }
}

fn activity_line(item: &ActivityItem) -> String {
    let when = item
        .timestamp
        .map(|at| at.format("%H:%M:%S").to_string())
        .unwrap_or_else(|| "--:--:--".to_string());
    match &item.indicator {
        Some(level) => format!("{when} {:<12} {} [{level}]", item.kind, item.message),
        None => format!("{when} {:<12} {}", item.kind, item.message),
    }
}

/// Full dashboard summary, as printed by `status`
pub(crate) fn print_frame(frame: &DashboardFrame) {
    println!("Status");
    for subsystem in Subsystem::ALL {
        let label = frame.statuses.get(&subsystem).map_or("No data", |s| s.label());
        println!("  {:<18} {label}", subsystem.to_string());
    }

    let [low, medium, high, critical] = frame.severity.as_array();
    println!("Severity");
    println!("  low={low} medium={medium} high={high} critical={critical}");

    println!("Records");
    for category in Category::ALL {
        let count = frame.counts.get(&category).copied().unwrap_or_default();
        println!("  {:<18} {count}", category.as_str());
    }

    println!(
        "Access\n  granted={} denied={}",
        frame.access.granted, frame.access.denied
    );

    println!("Recent activity");
    if frame.activity.is_empty() {
        println!("  (none)");
    }
    for item in &frame.activity {
        println!("  {}", activity_line(item));
    }
}

/// One table page with column-aligned cells
pub(crate) fn print_table(page: &TablePage) {
    let mut widths: Vec<usize> = page.columns.iter().map(|c| c.title.len()).collect();
    for row in &page.rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.text.chars().count());
        }
    }

    let header: Vec<String> = page
        .columns
        .iter()
        .zip(&widths)
        .map(|(c, w)| format!("{:<w$}", c.title, w = *w))
        .collect();
    println!("{}", header.join("  "));
    for row in &page.rows {
        let cells: Vec<String> = row
            .iter()
            .zip(&widths)
            .map(|(c, w)| format!("{:<w$}", c.text, w = *w))
            .collect();
        println!("{}", cells.join("  "));
    }
    println!(
        "page {}/{} ({} of {} rows)",
        page.page + 1,
        page.page_count,
        page.filtered,
        page.total
    );
}
