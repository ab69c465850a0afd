//! Generated-input checks for normalization and history invariants

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{Duration, Utc};
use clipmem_core::content::normalize;
use clipmem_core::item::{CaptureContext, ClipboardItem, ContentFormat, SaveOutcome};
use clipmem_core::pipeline::ClipboardPipeline;
use clipmem_core::storage::{HistoryConfig, HistoryStore};
use clipmem_core::watcher::ScriptedSource;
use clipmem_core::{SearchFilters, Settings};
use proptest::prelude::*;

const MARKUP_PIECES: &[&str] = &[
    "<p>", "</p>", "<b>", "</b>", "<br/>", "<div class=\"x\">", "</div>", "<li>", "<script>",
    "</script>", "<style>", "</style>", "<!--", "-->", "&lt;", "&gt;", "&amp;", "&quot;", "&#60;",
    "&#x3e;", "&nbsp;", "&hellip;", "amp;", "lt;", "gt;", "#60;", "<", ">", "&", ";", " ", "  ",
    "\t", "\n", "\r\n", "\r", "hello", "world", "a", "x=1",
];

const RTF_PIECES: &[&str] = &[
    "{\\rtf1 ", "{", "}", "\\par ", "\\tab ", "\\'e9", "\\\\", "\\{", "\\}",
    "{\\*\\generator x;}", "{\\fonttbl\\f0 Arial;}", "\\b ", "\\b0 ", "\\~", "\n", " ", "text",
    "rtf", "\\rtf1",
];

/// Capture texts share the `report` token so one query reaches all of them
const WORDS: &[&str] = &[
    "alpha report",
    "bravo report",
    "charlie report",
    "delta report",
    "echo report",
    "foxtrot report",
    "golf report",
    "hotel report",
];

fn pieces(set: &'static [&'static str]) -> impl Strategy<Value = String> {
    prop::collection::vec(prop::sample::select(set), 0..40).prop_map(|parts| parts.concat())
}

// ============================================================================
// NORMALIZATION
// ============================================================================

proptest! {
    #[test]
    fn normalization_is_idempotent_for_every_format(text in ".{0,120}") {
        for format in ContentFormat::ALL {
            let once = normalize(&text, format);
            let twice = normalize(&once, format);
            prop_assert_eq!(&twice, &once, "format {}", format);
        }
    }

    #[test]
    fn markup_normalization_is_idempotent(html in pieces(MARKUP_PIECES)) {
        let once = normalize(&html, ContentFormat::Markup);
        let twice = normalize(&once, ContentFormat::Markup);
        prop_assert_eq!(&twice, &once, "input {:?}", html);
    }

    #[test]
    fn rtf_normalization_is_idempotent(rtf in pieces(RTF_PIECES)) {
        let once = normalize(&rtf, ContentFormat::RichText);
        let twice = normalize(&once, ContentFormat::RichText);
        prop_assert_eq!(&twice, &once, "input {:?}", rtf);
    }
}

// ============================================================================
// HISTORY
// ============================================================================

proptest! {
    #[test]
    fn history_stays_bounded_newest_first_and_unique(
        max_size in 1usize..6,
        saves in prop::collection::vec((0usize..WORDS.len(), 0i64..500), 1..40),
    ) {
        let store = HistoryStore::in_memory(HistoryConfig {
            max_size,
            ..Default::default()
        });
        let base = Utc::now();
        let mut distinct = HashSet::new();
        let mut stamps = HashMap::new();

        for (word, minutes) in &saves {
            distinct.insert(WORDS[*word]);
            let item = ClipboardItem::with_timestamp(
                WORDS[*word],
                ContentFormat::Text,
                base - Duration::minutes(*minutes),
            );
            stamps.insert(item.id.clone(), item.timestamp);

            let outcome = store.save(item).unwrap();
            prop_assert!(store.len() <= max_size);

            // Eviction only ever takes the oldest
            if let SaveOutcome::Saved { evicted, .. } = outcome {
                let kept = store.get_all();
                if let Some(oldest_kept) = kept.last() {
                    for id in &evicted {
                        prop_assert!(stamps[id] <= oldest_kept.timestamp);
                    }
                }
            }
        }

        let all = store.get_all();
        prop_assert_eq!(all.len(), max_size.min(distinct.len()));
        prop_assert!(all.windows(2).all(|w| w[0].timestamp >= w[1].timestamp));
        let unique: HashSet<&str> = all.iter().map(|i| i.content.as_str()).collect();
        prop_assert_eq!(unique.len(), all.len());
    }

    #[test]
    fn pipeline_index_and_memory_track_the_store(
        max_size in 1usize..5,
        captures in prop::collection::vec((0usize..WORDS.len(), 0i64..500), 1..25),
    ) {
        let settings = Settings {
            max_size,
            ..Default::default()
        };
        let pipeline = ClipboardPipeline::in_memory(Arc::new(ScriptedSource::new()), &settings);
        let base = Utc::now();

        for (word, minutes) in &captures {
            let context = CaptureContext::at(base - Duration::minutes(*minutes), None, None);
            pipeline.process(WORDS[*word], &context).unwrap();
        }

        let stored: HashSet<String> =
            pipeline.store().get_all().into_iter().map(|i| i.id).collect();
        prop_assert!(stored.len() <= max_size);
        prop_assert_eq!(pipeline.index().stats().items, stored.len());
        prop_assert_eq!(pipeline.bank().len(), stored.len());

        let hits = pipeline.search("report", &SearchFilters::default());
        prop_assert_eq!(hits.len(), stored.len());
        prop_assert!(hits.iter().all(|hit| stored.contains(&hit.item.id)));
    }
}
