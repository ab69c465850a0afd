//! clipmem Search Benchmarks
//!
//! Benchmarks for indexing, suggestion and ranked query paths using Criterion.
//! Run with: cargo bench -p clipmem-core

use chrono::{Duration, Utc};
use clipmem_core::content::{normalize, tokenize};
use clipmem_core::memory::text_similarity;
use clipmem_core::search::{SearchFilters, SearchIndex};
use clipmem_core::{ClipboardItem, ContentFormat};
use criterion::{Criterion, black_box, criterion_group, criterion_main};

const WORDS: [&str; 12] = [
    "invoice", "deploy", "meeting", "report", "kubernetes", "review", "budget", "schedule",
    "release", "customer", "database", "migration",
];

fn history(n: usize) -> Vec<ClipboardItem> {
    let now = Utc::now();
    (0..n)
        .map(|i| {
            let content = format!(
                "{} {} notes for {} #{}",
                WORDS[i % WORDS.len()],
                WORDS[(i * 7) % WORDS.len()],
                WORDS[(i * 5) % WORDS.len()],
                i
            );
            let mut item =
                ClipboardItem::with_timestamp(content, ContentFormat::Text, now - Duration::minutes(i as i64));
            item.tags = vec![WORDS[i % 3].to_string()];
            item
        })
        .collect()
}

fn bench_build_index(c: &mut Criterion) {
    let items = history(1000);
    c.bench_function("index_build_1000", |b| {
        b.iter(|| {
            let index = SearchIndex::new();
            index.build(black_box(&items));
        })
    });
}

fn bench_query(c: &mut Criterion) {
    let index = SearchIndex::new();
    index.build(&history(1000));
    let now = Utc::now();

    let mut minute = 0i64;
    c.bench_function("query_uncached_1000", |b| {
        b.iter(|| {
            // Shift the minute bucket so every iteration misses the cache
            minute += 1;
            black_box(index.query("deploy notes", &SearchFilters::default(), now + Duration::minutes(minute)));
        })
    });

    c.bench_function("query_cached_1000", |b| {
        b.iter(|| black_box(index.query("deploy notes", &SearchFilters::default(), now)))
    });
}

fn bench_suggest(c: &mut Criterion) {
    let index = SearchIndex::new();
    index.build(&history(1000));
    c.bench_function("suggest_prefix", |b| b.iter(|| black_box(index.suggest("re"))));
}

fn bench_normalize_markup(c: &mut Criterion) {
    let html = "<div><p>Quarterly&nbsp;report</p><script>track()</script><br>Total: &#36;1,200</div>"
        .repeat(20);
    c.bench_function("normalize_markup", |b| {
        b.iter(|| black_box(normalize(&html, ContentFormat::Markup)))
    });
}

fn bench_similarity(c: &mut Criterion) {
    let a = "release notes for the database migration review";
    let b_text = "database migration review notes before release";
    c.bench_function("tokenize", |b| b.iter(|| black_box(tokenize(a))));
    c.bench_function("text_similarity", |b| b.iter(|| black_box(text_similarity(a, b_text))));
}

criterion_group!(
    benches,
    bench_build_index,
    bench_query,
    bench_suggest,
    bench_normalize_markup,
    bench_similarity,
);
criterion_main!(benches);
