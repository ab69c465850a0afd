//! Journey: move history between machines
//!
//! Export writes a versioned JSON document, import replays it through the
//! normal save path so dedup and capacity still hold.

use clipmem_core::{ClipboardItem, SearchFilters, Settings};
use clipmem_e2e_tests::harness::TestPipeline;
use clipmem_e2e_tests::mocks::ClipboardFixtures;

fn exported_items(path: &std::path::Path) -> Vec<ClipboardItem> {
    let raw = std::fs::read_to_string(path).unwrap();
    let document: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(document["version"], 1);
    serde_json::from_value(document["items"].clone()).unwrap()
}

#[test]
fn test_export_leaves_out_sensitive_items_by_default() {
    let test = TestPipeline::new();
    test.capture("shared wifi name is Guest");
    for secret in ClipboardFixtures::sensitive() {
        test.copy(secret);
    }
    let path = test.data_dir().join("export.json");

    let written = test.pipeline.export_json(&path, false).unwrap();

    assert_eq!(written, 1);
    let items = exported_items(&path);
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].content, "shared wifi name is Guest");
    let raw = std::fs::read_to_string(&path).unwrap();
    assert!(!raw.contains("correct-horse-battery"));
}

#[test]
fn test_export_can_include_sensitive_items() {
    let test = TestPipeline::new();
    for secret in ClipboardFixtures::sensitive() {
        test.copy(secret);
    }
    let path = test.data_dir().join("nested").join("full.json");

    let written = test.pipeline.export_json(&path, true).unwrap();

    assert_eq!(written, 4);
    assert!(exported_items(&path).iter().all(|i| i.metadata.sensitive));
}

#[test]
fn test_import_into_fresh_history_restores_search_and_memory() {
    let source = TestPipeline::new();
    for fixture in ClipboardFixtures::one_of_each_format() {
        source.copy(fixture.raw);
    }
    let tagged = source.capture("release train schedule");
    source.pipeline.add_tag(&tagged.id, "ops").unwrap();
    let path = source.data_dir().join("history.json");
    source.pipeline.export_json(&path, false).unwrap();

    let target = TestPipeline::new();
    let report = target.pipeline.import_json(&path).unwrap();

    assert_eq!(report.imported, 6);
    assert_eq!(report.duplicates, 0);
    assert_eq!(target.pipeline.store().len(), 6);

    // Imported items keep their original ordering and facts
    let original = source.pipeline.history(Default::default());
    let imported = target.pipeline.history(Default::default());
    let ids = |page: &clipmem_core::Page| page.items.iter().map(|i| i.id.clone()).collect::<Vec<_>>();
    assert_eq!(ids(&original), ids(&imported));

    let filters = SearchFilters {
        tags: vec!["ops".to_string()],
        ..Default::default()
    };
    let hits = target.pipeline.search("release", &filters);
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].item.id, tagged.id);
    assert_eq!(target.pipeline.bank().len(), 6);
}

#[test]
fn test_reimport_counts_duplicates() {
    let test = TestPipeline::new();
    test.capture("alpha");
    test.capture("beta");
    let path = test.data_dir().join("history.json");
    test.pipeline.export_json(&path, false).unwrap();

    let report = test.pipeline.import_json(&path).unwrap();

    assert_eq!(report.imported, 0);
    assert_eq!(report.duplicates, 2);
    assert_eq!(test.pipeline.store().len(), 2);
}

#[test]
fn test_import_respects_capacity() {
    let source = TestPipeline::new();
    for content in ["one", "two", "three", "four", "five"] {
        source.capture(content);
    }
    let path = source.data_dir().join("history.json");
    source.pipeline.export_json(&path, false).unwrap();

    let target = TestPipeline::with_settings(Settings {
        max_size: 3,
        ..Default::default()
    });
    let report = target.pipeline.import_json(&path).unwrap();

    assert_eq!(report.imported, 5);
    assert_eq!(report.evicted, 2);
    let kept: Vec<String> = target
        .pipeline
        .history(Default::default())
        .items
        .into_iter()
        .map(|i| i.content)
        .collect();
    assert_eq!(kept, vec!["five", "four", "three"]);
}

#[test]
fn test_import_accepts_bare_item_array() {
    let test = TestPipeline::new();
    let item = ClipboardItem::new("hand written entry", clipmem_core::ContentFormat::Text);
    let path = test.data_dir().join("items.json");
    std::fs::write(&path, serde_json::to_string(&vec![item.clone()]).unwrap()).unwrap();

    let report = test.pipeline.import_json(&path).unwrap();

    assert_eq!(report.imported, 1);
    assert_eq!(test.pipeline.store().get(&item.id).unwrap().content, "hand written entry");
}

#[test]
fn test_import_of_missing_file_fails_cleanly() {
    let test = TestPipeline::new();
    test.capture("still here");

    let result = test.pipeline.import_json(&test.data_dir().join("nope.json"));

    assert!(result.is_err());
    assert_eq!(test.pipeline.store().len(), 1);
}
