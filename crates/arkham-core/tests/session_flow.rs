//! End-to-end session behavior against a scripted backend.

use arkham_core::{
    DashboardConfig, DashboardError, DashboardSession, FetchError, LogSource, PollSchedule, Status,
    Subsystem,
};
use arkham_store::{Category, LogCache, LogRecord, MemorySlot};
use arkham_test_utils::{
    full_response, network_record, sample_response, stamped, RecordingRenderer, RenderEvent,
    ScriptedSource,
};
use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

type TestSession = DashboardSession<MemorySlot, ScriptedSource, RecordingRenderer>;

fn session(source: &ScriptedSource, renderer: &RecordingRenderer) -> (TestSession, MemorySlot) {
    let slot = MemorySlot::new();
    let cache = LogCache::create_at(slot.clone(), Utc::now());
    let session = DashboardSession::new(
        cache,
        source.clone(),
        renderer.clone(),
        DashboardConfig::new().with_poll_range(2000, 4000),
    );
    (session, slot)
}

#[tokio::test]
async fn one_poll_appends_each_record_and_saves_once() {
    let source = ScriptedSource::new();
    source.push(sample_response());
    let (mut session, slot) = session(&source, &RecordingRenderer::new());
    let saves_before = slot.save_count();

    let report = session.poll_once().await.unwrap();

    assert_eq!(report.appended_count(), 2);
    assert_eq!(session.store().len(Category::Network), 1);
    assert_eq!(session.store().len(Category::ServerLogs), 1);
    assert_eq!(session.store().total_len(), 2);
    assert_eq!(slot.save_count(), saves_before + 1);
}

#[tokio::test]
async fn poll_without_known_keys_still_persists() {
    let source = ScriptedSource::new();
    source.push(json!({"inmate_threat_log": {}, "weather_log": {}}));
    let (mut session, slot) = session(&source, &RecordingRenderer::new());
    let saves_before = slot.save_count();

    let report = session.poll_once().await.unwrap();

    assert_eq!(report.appended_count(), 0);
    assert!(session.store().is_empty());
    assert_eq!(slot.save_count(), saves_before + 1);
}

#[tokio::test]
async fn backend_inmate_key_is_not_ingested() {
    let source = ScriptedSource::new();
    source.push(full_response("high"));
    let (mut session, _) = session(&source, &RecordingRenderer::new());

    let report = session.poll_once().await.unwrap();

    assert_eq!(report.appended_count(), 6);
    assert_eq!(report.skipped, vec!["inmate_threat_log".to_string()]);
    assert_eq!(session.store().len(Category::InmateThreats), 0);
}

#[tokio::test]
async fn failed_cycles_leave_store_untouched() {
    let source = ScriptedSource::new();
    source
        .push(sample_response())
        .push_err(FetchError::malformed("not json"))
        .push(json!("invalid"))
        .push(sample_response());
    let (mut session, slot) = session(&source, &RecordingRenderer::new());

    session.poll_once().await.unwrap();
    let snapshot = session.store().clone();
    let saves = slot.save_count();

    assert!(matches!(session.poll_once().await, Err(DashboardError::Fetch(_))));
    assert!(matches!(
        session.poll_once().await,
        Err(DashboardError::Fetch(FetchError::MalformedResponse(_)))
    ));
    assert_eq!(session.store(), &snapshot);
    assert_eq!(slot.save_count(), saves);

    session.poll_once().await.unwrap();
    assert_eq!(session.store().total_len(), 4);
}

#[tokio::test]
async fn emptied_category_keeps_previous_status() {
    let source = ScriptedSource::new();
    let now = Utc::now();
    for _ in 0..5 {
        source.push(json!({
            "network_log": stamped(network_record("critical"), now).into_inner(),
        }));
    }
    let renderer = RecordingRenderer::new();
    let (mut session, _) = session(&source, &renderer);

    for _ in 0..5 {
        session.poll_once().await.unwrap();
    }
    assert_eq!(session.statuses()[&Subsystem::Network], Status::Alert);

    renderer.clear();
    let removed = session.run_maintenance_at(now + ChronoDuration::minutes(3));

    assert_eq!(removed, 5);
    assert!(session.store().records(Category::Network).is_empty());
    assert_eq!(session.statuses()[&Subsystem::Network], Status::Alert);
    // the indicator was not redrawn
    assert!(renderer.statuses().is_empty());
    assert!(renderer
        .events()
        .iter()
        .any(|e| matches!(e, RenderEvent::Severity(d) if d.total() == 0)));
}

#[tokio::test]
async fn missing_indicator_does_not_block_other_views() {
    let source = ScriptedSource::new();
    source.push(full_response("critical"));
    let renderer = RecordingRenderer::new().without(Subsystem::Network);
    let (mut session, _) = session(&source, &renderer);

    session.poll_once().await.unwrap();

    let rendered: Vec<_> = renderer.statuses().into_iter().map(|(s, _)| s).collect();
    assert_eq!(
        rendered,
        vec![
            Subsystem::Server,
            Subsystem::Surveillance,
            Subsystem::Access,
            Subsystem::Physical
        ]
    );
    // the status itself is still tracked
    assert!(session.statuses().contains_key(&Subsystem::Network));
    let events = renderer.events();
    assert!(events.iter().any(|e| matches!(e, RenderEvent::Timeline(_))));
    assert!(events.iter().any(|e| matches!(e, RenderEvent::Access(a) if a.denied == 1)));
}

#[tokio::test(start_paused = true)]
async fn run_loop_polls_with_jittered_gaps() {
    let source = ScriptedSource::new();
    for _ in 0..4 {
        source.push(sample_response());
    }
    let renderer = RecordingRenderer::new();
    let (session, _) = session(&source, &renderer);
    let mut session = session.with_schedule(PollSchedule::seeded(2000, 4000, 42));

    let (tx, rx) = watch::channel(false);
    let handle = tokio::spawn(async move {
        session.run(rx).await;
        session
    });

    tokio::time::sleep(Duration::from_secs(30)).await;
    tx.send(true).unwrap();
    let session = handle.await.unwrap();

    let times = source.fetch_times();
    // first poll is immediate; 30 s allows at least 7 more at <= 4 s apart
    assert!(times.len() >= 8, "only {} polls", times.len());
    for pair in times.windows(2) {
        let gap = pair[1] - pair[0];
        assert!(gap >= Duration::from_millis(2000), "gap {gap:?} too short");
        assert!(gap <= Duration::from_millis(4000), "gap {gap:?} too long");
    }

    // polls after the script ran out failed without stopping the loop
    assert_eq!(source.remaining(), 0);
    assert_eq!(session.store().len(Category::Network), 4);
}

#[tokio::test(start_paused = true)]
async fn shutdown_before_start_never_polls() {
    let source = ScriptedSource::new();
    let (mut session, _) = session(&source, &RecordingRenderer::new());
    let (_tx, rx) = watch::channel(true);

    session.run(rx).await;

    assert_eq!(source.fetch_count(), 0);
}

/// Backend that takes five seconds to answer each sample-logs request
#[derive(Debug, Clone, Default)]
struct SlowSource {
    completed: Arc<AtomicUsize>,
}

#[async_trait]
impl LogSource for SlowSource {
    async fn fetch_sample_logs(&self) -> Result<Value, FetchError> {
        tokio::time::sleep(Duration::from_secs(5)).await;
        self.completed.fetch_add(1, Ordering::SeqCst);
        Ok(json!({ "network_log": network_record("low").into_inner() }))
    }

    async fn fetch_category(&self, _category: Category) -> Result<Vec<LogRecord>, FetchError> {
        Ok(Vec::new())
    }
}

#[tokio::test(start_paused = true)]
async fn shutdown_lets_in_flight_poll_finish() {
    let source = SlowSource::default();
    let completed = Arc::clone(&source.completed);
    let cache = LogCache::create_at(MemorySlot::new(), Utc::now());
    let mut session = DashboardSession::new(
        cache,
        source,
        RecordingRenderer::new(),
        DashboardConfig::new().with_poll_range(2000, 4000),
    );

    let (tx, rx) = watch::channel(false);
    let handle = tokio::spawn(async move {
        session.run(rx).await;
        session
    });

    // the first poll starts immediately and is still waiting on the backend
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(completed.load(Ordering::SeqCst), 0);
    tx.send(true).unwrap();
    let session = handle.await.unwrap();

    assert_eq!(completed.load(Ordering::SeqCst), 1);
    assert_eq!(session.store().len(Category::Network), 1);
}
