//! Journey: a history that stays bounded, ordered and consistent
//!
//! Duplicates, capacity eviction, pagination, user edits, auto-delete and
//! restart all have to keep the store, the search index and the memory bank
//! in agreement.

use chrono::{Duration, Utc};
use clipmem_core::{CaptureOutcome, PageRequest, PipelineEvent, SearchFilters, Settings};
use clipmem_e2e_tests::harness::TestPipeline;

fn contents(items: &[clipmem_core::ClipboardItem]) -> Vec<&str> {
    items.iter().map(|i| i.content.as_str()).collect()
}

// ============================================================================
// DUPLICATES AND CAPACITY
// ============================================================================

#[test]
fn test_duplicate_copy_points_at_existing_item() {
    let test = TestPipeline::new();
    let first = test.capture("meeting room 4B");
    test.capture("something else");

    match test.copy("meeting room 4B") {
        CaptureOutcome::Duplicate { existing_id } => assert_eq!(existing_id, first.id),
        other => panic!("expected duplicate, got {:?}", other),
    }
    assert_eq!(test.pipeline.store().len(), 2);
}

#[test]
fn test_duplicates_allowed_when_detection_is_off() {
    let test = TestPipeline::with_settings(Settings {
        duplicate_detection: false,
        ..Default::default()
    });

    test.capture("same again");
    test.capture("same again");

    assert_eq!(test.pipeline.store().len(), 2);
}

#[test]
fn test_capacity_evicts_oldest_everywhere() {
    let test = TestPipeline::with_settings(Settings {
        max_size: 3,
        ..Default::default()
    });
    let mut events = test.pipeline.subscribe();

    let first = test.capture("alpha release checklist");
    for content in ["bravo", "charlie", "delta", "echo"] {
        test.capture(content);
    }

    let page = test.pipeline.history(PageRequest::default());
    assert_eq!(page.total, 3);
    assert_eq!(contents(&page.items), vec!["echo", "delta", "charlie"]);

    assert!(test.pipeline.search("alpha", &SearchFilters::default()).is_empty());
    assert!(test.pipeline.bank().get(&first.id).is_none());

    let mut evicted = Vec::new();
    while let Ok(event) = events.try_recv() {
        if let PipelineEvent::ItemsEvicted { ids, .. } = event {
            evicted.extend(ids);
        }
    }
    assert_eq!(evicted.len(), 2);
    assert_eq!(evicted[0], first.id);
}

#[test]
fn test_shrinking_capacity_drops_oldest() {
    let test = TestPipeline::new();
    for content in ["one fish", "two fish", "red fish", "blue fish"] {
        test.capture(content);
    }

    let evicted = test.pipeline.set_max_size(2);

    assert_eq!(evicted.len(), 2);
    assert_eq!(test.pipeline.store().len(), 2);
    let hits = test.pipeline.search("fish", &SearchFilters::default());
    assert_eq!(hits.len(), 2);
}

// ============================================================================
// ORDERING AND PAGINATION
// ============================================================================

#[test]
fn test_history_is_newest_first_by_capture_time() {
    let test = TestPipeline::new();
    let now = Utc::now();
    test.copy_at("copied an hour ago", now - Duration::hours(1));
    test.copy_at("copied three hours ago", now - Duration::hours(3));
    test.copy_at("copied two hours ago", now - Duration::hours(2));

    let first = test.pipeline.history(PageRequest { limit: 2, offset: 0 });
    assert_eq!(first.total, 3);
    assert_eq!(
        contents(&first.items),
        vec!["copied an hour ago", "copied two hours ago"]
    );

    let second = test.pipeline.history(PageRequest { limit: 2, offset: 2 });
    assert_eq!(contents(&second.items), vec!["copied three hours ago"]);

    let past_end = test.pipeline.history(PageRequest { limit: 2, offset: 10 });
    assert!(past_end.items.is_empty());
    assert_eq!(past_end.total, 3);
}

// ============================================================================
// USER EDITS
// ============================================================================

#[test]
fn test_tagging_makes_items_findable_by_tag() {
    let test = TestPipeline::new();
    let item = test.capture("quarterly planning doc");
    test.capture("lunch order");

    assert!(test.pipeline.add_tag(&item.id, "work").unwrap());
    assert!(!test.pipeline.add_tag(&item.id, "work").unwrap());

    let filters = SearchFilters {
        tags: vec!["work".to_string()],
        ..Default::default()
    };
    let hits = test.pipeline.search("", &filters);
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].item.id, item.id);

    assert!(test.pipeline.remove_tag(&item.id, "work").unwrap());
    assert!(test.pipeline.search("", &filters).is_empty());
}

#[test]
fn test_favorite_toggles() {
    let test = TestPipeline::new();
    let item = test.capture("keep this around");

    assert!(test.pipeline.toggle_favorite(&item.id).unwrap());
    assert_eq!(test.pipeline.store().get_favorites().len(), 1);
    assert!(!test.pipeline.toggle_favorite(&item.id).unwrap());
    assert!(test.pipeline.store().get_favorites().is_empty());
}

#[test]
fn test_delete_removes_item_everywhere() {
    let test = TestPipeline::new();
    let mut events = test.pipeline.subscribe();
    let item = test.capture("temporary scratch note");

    assert!(test.pipeline.delete(&item.id).unwrap());
    assert!(!test.pipeline.delete(&item.id).unwrap());

    assert!(test.pipeline.store().get(&item.id).is_none());
    assert!(test.pipeline.search("scratch", &SearchFilters::default()).is_empty());
    assert!(test.pipeline.bank().get(&item.id).is_none());

    let deleted = std::iter::from_fn(|| events.try_recv().ok())
        .filter(|e| matches!(e, PipelineEvent::ItemDeleted { .. }))
        .count();
    assert_eq!(deleted, 1);
}

#[test]
fn test_clear_empties_store_index_and_memory() {
    let test = TestPipeline::new();
    test.capture("first thing");
    test.capture("second thing");

    test.pipeline.clear().unwrap();

    assert!(test.pipeline.store().is_empty());
    assert_eq!(test.pipeline.index().stats().items, 0);
    assert!(test.pipeline.bank().is_empty());

    // A cleared history accepts the same content again
    assert!(matches!(test.copy("first thing"), CaptureOutcome::Captured(_)));
}

// ============================================================================
// MAINTENANCE
// ============================================================================

#[test]
fn test_maintenance_auto_deletes_expired_items() {
    let test = TestPipeline::with_settings(Settings {
        auto_delete_after_days: Some(7),
        ..Default::default()
    });
    let old = match test.copy_at("last month's invoice", Utc::now() - Duration::days(30)) {
        CaptureOutcome::Captured(item) => item,
        other => panic!("expected capture, got {:?}", other),
    };
    test.capture("this week's invoice");

    let report = test
        .pipeline
        .run_maintenance()
        .unwrap()
        .expect("no other pass is running");

    assert_eq!(report.expired, vec![old.id.clone()]);
    assert_eq!(report.indexed_items, 1);
    assert_eq!(test.pipeline.store().len(), 1);
    assert!(test.pipeline.bank().get(&old.id).is_none());
}

#[test]
fn test_maintenance_without_age_limit_keeps_everything() {
    let test = TestPipeline::new();
    test.copy_at("ancient snippet", Utc::now() - Duration::days(400));

    let report = test.pipeline.run_maintenance().unwrap().unwrap();

    assert!(report.expired.is_empty());
    assert_eq!(test.pipeline.store().len(), 1);
}

// ============================================================================
// PERSISTENCE
// ============================================================================

#[test]
fn test_history_survives_restart() {
    let mut test = TestPipeline::new();
    let item = test.capture("persist me across restarts");
    test.pipeline.add_tag(&item.id, "keep").unwrap();
    test.capture("and me too");

    test.reopen();

    let page = test.pipeline.history(PageRequest::default());
    assert_eq!(page.total, 2);
    let restored = test.pipeline.store().get(&item.id).expect("item persisted");
    assert!(restored.has_tag("keep"));

    // Index and memory are rebuilt from the store on open
    let hits = test.pipeline.search("persist", &SearchFilters::default());
    assert_eq!(hits.len(), 1);
    assert_eq!(test.pipeline.bank().len(), 2);

    // Dedup still applies to what was loaded
    assert!(matches!(
        test.copy("and me too"),
        CaptureOutcome::Duplicate { .. }
    ));
}
