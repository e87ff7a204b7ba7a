//! Dashboard session
//!
//! One [`DashboardSession`] owns everything a dashboard page needs: the
//! cached store, the log source, the renderer, the last known status of each
//! subsystem and the alert timeline. Its [`run`](DashboardSession::run) loop
//! is a single task, so the store is never shared and needs no lock.

use crate::config::DashboardConfig;
use crate::error::{DashboardError, RenderError};
use crate::poller::{ingest_response, IngestReport, LogSource, PollSchedule};
use crate::render::ViewRenderer;
use crate::status::{Status, Subsystem};
use crate::views::{
    access_results, category_counts, recent_activity, severity_distribution, AccessResults,
    ActivityItem, AlertCounts, AlertTimeline, SeverityDistribution,
};
use arkham_store::{Category, LogCache, LogStore, SnapshotSlot};
use chrono::{DateTime, Local, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use tokio::sync::watch;
use tokio::time::{Instant, MissedTickBehavior};

/// Everything the dashboard shows after one recompute
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardFrame {
    pub statuses: BTreeMap<Subsystem, Status>,
    pub severity: SeverityDistribution,
    pub activity: Vec<ActivityItem>,
    pub counts: BTreeMap<Category, usize>,
    pub access: AccessResults,
    pub timeline: AlertTimeline,
}

impl DashboardFrame {
    /// Frame computed from a store alone: statuses for non-empty categories
    /// and an empty timeline
    #[must_use]
    pub fn from_store(store: &LogStore, activity_limit: usize) -> Self {
        let statuses = Subsystem::ALL
            .into_iter()
            .filter_map(|s| s.status(store).map(|status| (s, status)))
            .collect();
        Self::build(store, statuses, AlertTimeline::new(), activity_limit)
    }

    fn build(
        store: &LogStore,
        statuses: BTreeMap<Subsystem, Status>,
        timeline: AlertTimeline,
        activity_limit: usize,
    ) -> Self {
        Self {
            statuses,
            severity: severity_distribution(store),
            activity: recent_activity(store, activity_limit),
            counts: category_counts(store),
            access: access_results(store),
            timeline,
        }
    }
}

/// A running dashboard
pub struct DashboardSession<S, L, R> {
    cache: LogCache<S>,
    source: L,
    renderer: R,
    schedule: PollSchedule,
    statuses: BTreeMap<Subsystem, Status>,
    timeline: AlertTimeline,
    config: DashboardConfig,
}

impl<S, L, R> DashboardSession<S, L, R>
where
    S: SnapshotSlot,
    L: LogSource,
    R: ViewRenderer,
{
    /// Session over a restored cache, polling on the configured schedule
    pub fn new(cache: LogCache<S>, source: L, renderer: R, config: DashboardConfig) -> Self {
        Self {
            cache,
            source,
            renderer,
            schedule: PollSchedule::from_config(&config),
            statuses: BTreeMap::new(),
            timeline: AlertTimeline::new(),
            config,
        }
    }

    /// Replace the poll schedule
    #[must_use]
    pub fn with_schedule(mut self, schedule: PollSchedule) -> Self {
        self.schedule = schedule;
        self
    }

    /// Cached logs
    pub fn store(&self) -> &LogStore {
        self.cache.store()
    }

    /// Cache and its slot
    pub fn cache(&self) -> &LogCache<S> {
        &self.cache
    }

    /// Last known status per subsystem
    pub fn statuses(&self) -> &BTreeMap<Subsystem, Status> {
        &self.statuses
    }

    /// Rolling alert counts
    pub fn timeline(&self) -> &AlertTimeline {
        &self.timeline
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    /// Fetch one sample-logs response, ingest it, persist and recompute.
    ///
    /// # Errors
    /// `DashboardError::Fetch` when the request fails or the response is not
    /// an object; the store is left untouched
    pub async fn poll_once(&mut self) -> Result<IngestReport, DashboardError> {
        let response = self.source.fetch_sample_logs().await?;
        let report = ingest_response(self.cache.store_mut(), &response)?;
        tracing::debug!(
            appended = report.appended_count(),
            skipped = report.skipped.len(),
            "sample logs ingested"
        );

        if let Err(err) = self.cache.persist() {
            tracing::warn!(%err, "failed to persist log store after poll");
        }

        let counts = AlertCounts::from_ingest(self.cache.store(), &report);
        self.timeline.record(Local::now().format("%H:%M").to_string(), counts);
        self.recompute();
        Ok(report)
    }

    /// Purge expired records as of `now`, then persist
    pub fn run_maintenance_at(&mut self, now: DateTime<Utc>) -> usize {
        let removed = self.cache.purge_expired(now);
        if let Err(err) = self.cache.persist() {
            tracing::warn!(%err, "failed to persist log store after purge");
        }
        if removed > 0 {
            self.recompute();
        }
        removed
    }

    /// [`run_maintenance_at`](Self::run_maintenance_at) with the current time
    pub fn run_maintenance(&mut self) -> usize {
        self.run_maintenance_at(Utc::now())
    }

    /// Reclassify, rebuild every view and push them to the renderer.
    ///
    /// Subsystems whose category is empty keep their previous status.
    /// Renderer failures are logged and the remaining updates still run.
    pub fn recompute(&mut self) -> DashboardFrame {
        let store = self.cache.store();
        for subsystem in Subsystem::ALL {
            let Some(status) = subsystem.status(store) else {
                continue;
            };
            self.statuses.insert(subsystem, status);
            log_render_failure(
                subsystem.element_id(),
                self.renderer.update_status(subsystem, status),
            );
        }

        let frame = DashboardFrame::build(
            store,
            self.statuses.clone(),
            self.timeline.clone(),
            self.config.recent_activity_limit,
        );

        log_render_failure("severity", self.renderer.update_severity_chart(&frame.severity));
        log_render_failure("activity", self.renderer.update_recent_activity(&frame.activity));
        log_render_failure("category", self.renderer.update_category_chart(&frame.counts));
        log_render_failure("access", self.renderer.update_access_chart(&frame.access));
        log_render_failure("timeline", self.renderer.update_timeline(&frame.timeline));
        frame
    }

    /// Poll and maintain until `shutdown` turns true or its sender is
    /// dropped.
    ///
    /// The first poll runs immediately; each following poll is scheduled a
    /// jittered delay after the previous one completed. A poll in progress
    /// always runs to completion.
    pub async fn run(&mut self, mut shutdown: watch::Receiver<bool>) {
        let period = self.config.maintenance_interval();
        let mut maintenance = tokio::time::interval_at(Instant::now() + period, period);
        maintenance.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut next_poll = Instant::now();

        tracing::info!(
            source = %self.config.base_url,
            slot = %self.cache.slot().describe(),
            "dashboard session started"
        );

        loop {
            if *shutdown.borrow() {
                break;
            }
            tokio::select! {
                biased;

                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }

                () = tokio::time::sleep_until(next_poll) => {
                    if let Err(err) = self.poll_once().await {
                        tracing::warn!(%err, "poll cycle skipped");
                    }
                    let delay = self.schedule.next_delay();
                    next_poll = Instant::now() + delay;
                    tracing::trace!(?delay, "next poll scheduled");
                }

                _ = maintenance.tick() => {
                    let removed = self.run_maintenance();
                    tracing::trace!(removed, "maintenance pass done");
                }
            }
        }

        tracing::info!("dashboard session stopped");
    }
}

fn log_render_failure(view: &str, result: Result<(), RenderError>) {
    match result {
        Ok(()) => {}
        Err(RenderError::MissingTarget(element)) => {
            tracing::warn!(view, %element, "render target not found, update skipped");
        }
        Err(err) => tracing::warn!(view, %err, "render update failed"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchError;
    use crate::render::NullRenderer;
    use arkham_store::{LogRecord, MemorySlot};
    use async_trait::async_trait;
    use chrono::TimeZone;
    use serde_json::{json, Value};

    struct FixedSource(Value);

    #[async_trait]
    impl LogSource for FixedSource {
        async fn fetch_sample_logs(&self) -> Result<Value, FetchError> {
            Ok(self.0.clone())
        }

        async fn fetch_category(&self, _category: Category) -> Result<Vec<LogRecord>, FetchError> {
            Ok(Vec::new())
        }
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 14, 12, 0, 0).unwrap()
    }

    fn session(response: Value) -> DashboardSession<MemorySlot, FixedSource, NullRenderer> {
        let cache = LogCache::create_at(MemorySlot::new(), t0());
        DashboardSession::new(cache, FixedSource(response), NullRenderer, DashboardConfig::new())
    }

    #[tokio::test]
    async fn poll_feeds_timeline() {
        let mut session = session(json!({
            "network_log": {"threat_level": "critical"},
            "biometric_access_log": {"access_result": "denied"},
        }));

        session.poll_once().await.unwrap();

        assert_eq!(session.timeline().network().last(), Some(&1));
        assert_eq!(session.timeline().access().last(), Some(&1));
        assert_eq!(session.statuses()[&Subsystem::Network], Status::Normal);
    }

    #[tokio::test]
    async fn malformed_response_is_an_error() {
        let mut session = session(json!([]));
        let err = session.poll_once().await.unwrap_err();
        assert!(matches!(err, DashboardError::Fetch(FetchError::MalformedResponse(_))));
        assert!(session.store().is_empty());
    }

    #[test]
    fn maintenance_purges_and_persists() {
        let mut session = session(json!({}));
        let saves = session.cache().slot().save_count();
        let stale = LogRecord::new().with_field("timestamp", "2025-03-14T11:00:00Z");
        session.cache.push(Category::ServerLogs, stale);

        assert_eq!(session.run_maintenance_at(t0()), 1);
        assert!(session.store().is_empty());
        assert_eq!(session.cache().slot().save_count(), saves + 1);
    }

    #[test]
    fn frame_from_store_skips_empty_categories() {
        let mut store = LogStore::new(t0());
        store.push(Category::PhysicalSecurity, LogRecord::new().with_field("status", "fault"));

        let frame = DashboardFrame::from_store(&store, 3);
        assert_eq!(frame.statuses.len(), 1);
        assert_eq!(frame.statuses[&Subsystem::Physical], Status::Normal);
        assert_eq!(frame.activity.len(), 1);
        assert_eq!(frame.counts[&Category::PhysicalSecurity], 1);
    }
}
