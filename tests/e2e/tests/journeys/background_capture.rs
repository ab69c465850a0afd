//! Journey: leave the pipeline running and let it watch the clipboard
//!
//! Runs on paused tokio time so poll and maintenance intervals elapse
//! instantly.

use std::time::Duration as StdDuration;

use chrono::{Duration, Utc};
use clipmem_core::watcher::ClipboardSnapshot;
use clipmem_core::{ContentFormat, PageRequest, PipelineEvent, Settings, SourceError};
use clipmem_e2e_tests::harness::TestPipeline;
use tokio::sync::broadcast::Receiver;
use tokio::time::timeout;

/// Wait for the next event matching `pred`, skipping everything else
async fn next_matching<F>(events: &mut Receiver<PipelineEvent>, pred: F) -> PipelineEvent
where
    F: Fn(&PipelineEvent) -> bool,
{
    timeout(StdDuration::from_secs(600), async {
        loop {
            let event = events.recv().await.expect("event channel open");
            if pred(&event) {
                return event;
            }
        }
    })
    .await
    .expect("event arrived in time")
}

fn fast_polling() -> Settings {
    Settings {
        poll_interval_ms: 200,
        ..Default::default()
    }
}

#[tokio::test(start_paused = true)]
async fn test_running_pipeline_captures_each_new_value_once() {
    let test = TestPipeline::with_settings(fast_polling());
    let mut events = test.pipeline.subscribe();
    test.source
        .push(ClipboardSnapshot::new("draft reply to landlord").with_application("Mail"));
    test.source
        .push(ClipboardSnapshot::new("draft reply to landlord").with_application("Mail"));
    test.source.push(ClipboardSnapshot::new("https://example.com/lease.pdf"));

    assert!(test.pipeline.start());

    let is_capture = |e: &PipelineEvent| matches!(e, PipelineEvent::ItemCaptured { .. });
    let first = next_matching(&mut events, is_capture).await;
    let second = next_matching(&mut events, is_capture).await;
    test.pipeline.stop();

    match (first, second) {
        (
            PipelineEvent::ItemCaptured { original: a, .. },
            PipelineEvent::ItemCaptured { original: b, format, .. },
        ) => {
            assert_eq!(a, "draft reply to landlord");
            assert_eq!(b, "https://example.com/lease.pdf");
            assert_eq!(format, ContentFormat::Link.as_str());
        }
        other => panic!("unexpected events: {:?}", other),
    }

    let page = test.pipeline.history(PageRequest::default());
    assert_eq!(page.total, 2);
    assert_eq!(page.items[0].format, ContentFormat::Link);
}

#[tokio::test(start_paused = true)]
async fn test_stopped_pipeline_stops_reading() {
    let test = TestPipeline::with_settings(fast_polling());
    let mut events = test.pipeline.subscribe();
    test.source.push(ClipboardSnapshot::new("before stop"));

    assert!(test.pipeline.start());
    assert!(!test.pipeline.start(), "second start is a no-op");
    next_matching(&mut events, |e| matches!(e, PipelineEvent::ItemCaptured { .. })).await;

    test.pipeline.stop();
    test.pipeline.stop();
    assert!(!test.pipeline.is_running());

    test.source.push(ClipboardSnapshot::new("after stop"));
    tokio::time::sleep(StdDuration::from_secs(5)).await;

    assert_eq!(test.source.remaining(), 1);
    assert_eq!(test.pipeline.store().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_source_errors_do_not_stop_the_loop() {
    let test = TestPipeline::with_settings(fast_polling());
    let mut events = test.pipeline.subscribe();
    test.source
        .push_error(SourceError::Unavailable("clipboard locked by another process".into()));
    test.source.push_empty();
    test.source.push(ClipboardSnapshot::new("after the hiccup"));

    assert!(test.pipeline.start());
    let event =
        next_matching(&mut events, |e| matches!(e, PipelineEvent::ItemCaptured { .. })).await;
    test.pipeline.stop();

    if let PipelineEvent::ItemCaptured { original, .. } = event {
        assert_eq!(original, "after the hiccup");
    }
    assert_eq!(test.pipeline.store().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_periodic_maintenance_expires_old_items() {
    let test = TestPipeline::with_settings(Settings {
        auto_delete_after_days: Some(1),
        maintenance_interval_secs: 60,
        ..Default::default()
    });
    test.copy_at("stale snippet from last week", Utc::now() - Duration::days(7));
    test.copy("fresh snippet");
    let mut events = test.pipeline.subscribe();

    assert!(test.pipeline.start());
    let event = next_matching(&mut events, |e| {
        matches!(e, PipelineEvent::MaintenanceCompleted { .. })
    })
    .await;
    test.pipeline.stop();

    match event {
        PipelineEvent::MaintenanceCompleted { expired, indexed_items, .. } => {
            assert_eq!(expired, 1);
            assert_eq!(indexed_items, 1);
        }
        other => panic!("unexpected event: {:?}", other),
    }
    assert_eq!(test.pipeline.store().len(), 1);
}
