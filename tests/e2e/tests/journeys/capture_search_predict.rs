//! Journey: copy things, find them again, get told what comes next
//!
//! Covers the path from a raw clipboard payload to search results,
//! similar-content suggestions and merged predictions.

use chrono::Utc;
use clipmem_core::{CaptureContext, CaptureOutcome, ContentFormat, PipelineEvent, SearchFilters};
use clipmem_e2e_tests::harness::TestPipeline;
use clipmem_e2e_tests::mocks::ClipboardFixtures;

// ============================================================================
// CAPTURE
// ============================================================================

#[test]
fn test_each_format_is_stored_canonically() {
    let test = TestPipeline::new();

    for fixture in ClipboardFixtures::one_of_each_format() {
        let item = match test.copy_via_watcher(fixture.raw, Some("Editor")) {
            Some(CaptureOutcome::Captured(item)) => item,
            other => panic!("{:?} was not captured: {:?}", fixture.raw, other),
        };
        assert_eq!(item.content, fixture.expected_content, "content for {:?}", fixture.raw);
        assert_eq!(item.format, fixture.expected_format, "format for {:?}", fixture.raw);
    }

    let page = test.pipeline.history(Default::default());
    assert_eq!(page.total, 5);
    // Newest first: the link was copied last
    assert_eq!(page.items[0].format, ContentFormat::Link);
}

#[test]
fn test_repeated_watcher_reads_capture_once() {
    let test = TestPipeline::new();

    assert!(test.copy_via_watcher("standup at ten", None).is_some());
    // Source still reports the same value
    assert!(test.pipeline.poll_once().unwrap().is_none());
    assert!(test.pipeline.poll_once().unwrap().is_none());

    assert_eq!(test.pipeline.store().len(), 1);
}

#[test]
fn test_capture_publishes_event_with_suggestions() {
    let test = TestPipeline::new();
    let mut events = test.pipeline.subscribe();

    test.capture("cargo test --workspace --release");
    test.capture("cargo build --workspace --release");

    let mut captured = Vec::new();
    while let Ok(event) = events.try_recv() {
        if let PipelineEvent::ItemCaptured { original, suggestions, .. } = event {
            captured.push((original, suggestions));
        }
    }

    assert_eq!(captured.len(), 2);
    assert!(captured[0].1.is_empty());
    assert_eq!(captured[1].0, "cargo build --workspace --release");
    assert_eq!(captured[1].1.len(), 1);
    assert_eq!(captured[1].1[0].text, "cargo test --workspace --release");
}

// ============================================================================
// SEARCH
// ============================================================================

#[test]
fn test_exact_match_outranks_substring() {
    let test = TestPipeline::new();
    test.capture("tokio runtime");
    test.capture("tokio runtime builder docs");
    test.capture("unrelated grocery list");

    let results = test.pipeline.search("tokio runtime", &SearchFilters::default());

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].item.content, "tokio runtime");
    assert!(results[0].score > results[1].score);
}

#[test]
fn test_search_by_format_filter() {
    let test = TestPipeline::new();
    for fixture in ClipboardFixtures::one_of_each_format() {
        test.copy(fixture.raw);
    }

    let filters = SearchFilters {
        formats: vec![ContentFormat::Code],
        ..Default::default()
    };
    let results = test.pipeline.search("", &filters);

    assert_eq!(results.len(), 1);
    assert!(results[0].item.content.starts_with("def greet"));
}

#[test]
fn test_completion_lists_index_keys() {
    let test = TestPipeline::new();
    test.capture("tokio runtime");
    test.capture("tokens expire hourly");

    let completions = test.pipeline.complete("tok");
    assert!(completions.contains(&"tokio".to_string()));
    assert!(completions.contains(&"tokens".to_string()));

    assert!(test.pipeline.complete("t").is_empty());
    assert!(test.pipeline.complete("format:").contains(&"format:text".to_string()));
}

// ============================================================================
// SUGGESTIONS AND PREDICTIONS
// ============================================================================

#[test]
fn test_suggestions_come_from_related_session_items() {
    let test = TestPipeline::new();
    for content in ClipboardFixtures::developer_session() {
        test.copy(content);
    }

    let suggestions = test.pipeline.get_suggestions("cargo test --workspace");

    assert_eq!(suggestions.len(), 3);
    assert!(suggestions.iter().all(|s| s.text.starts_with("cargo")));
    // Newest first
    assert_eq!(suggestions[0].text, "cargo build --workspace --release");
}

#[test]
fn test_predictions_merge_every_signal() {
    let test = TestPipeline::new();
    let at = Utc::now();
    test.copy_at("daily standup notes for the platform team", at);

    let context = CaptureContext::at(at, Some("vscode"), None);
    let predictions = test.pipeline.predict("import numpy as np", &context);
    let contents: Vec<&str> = predictions.iter().map(|p| p.content.as_str()).collect();

    assert_eq!(
        contents,
        vec![
            "function",
            "const",
            "import",
            "from",
            "daily standup notes for the platform team"
        ]
    );
    assert!(predictions.windows(2).all(|w| w[0].confidence >= w[1].confidence));
}

#[test]
fn test_predictions_follow_last_capture() {
    let test = TestPipeline::new();
    test.copy_in("SELECT id FROM users", Some("Terminal"));

    let predictions = test.pipeline.get_predictions();
    let contents: Vec<&str> = predictions.iter().map(|p| p.content.as_str()).collect();

    assert!(contents.contains(&"FROM"));
    assert!(contents.contains(&"git status"));
    assert!(!contents.contains(&"SELECT id FROM users"));
}

// ============================================================================
// SENSITIVE CONTENT
// ============================================================================

#[test]
fn test_sensitive_items_stay_out_of_index_and_memory() {
    let test = TestPipeline::new();
    let mut events = test.pipeline.subscribe();

    for secret in ClipboardFixtures::sensitive() {
        let item = test.capture(secret);
        assert!(item.is_masked(), "{:?} should be flagged", secret);
    }

    assert_eq!(test.pipeline.store().len(), 4);
    assert_eq!(test.pipeline.index().stats().items, 0);
    assert!(test.pipeline.bank().is_empty());
    assert!(test.pipeline.search("password", &SearchFilters::default()).is_empty());
    assert!(test.pipeline.get_suggestions("ssn 123-45-6789").is_empty());

    while let Ok(event) = events.try_recv() {
        if let PipelineEvent::ItemCaptured { original, suggestions, .. } = event {
            assert!(original.contains('*'));
            assert!(!original.contains("correct-horse-battery"));
            assert!(suggestions.is_empty());
        }
    }
}
