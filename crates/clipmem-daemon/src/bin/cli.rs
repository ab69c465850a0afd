//! clipmem CLI
//!
//! Command-line interface for browsing and managing clipboard history.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use clap::{Parser, Subcommand};
use colored::Colorize;

use clipmem_core::search::SearchFilters;
use clipmem_core::{
    CaptureContext, ClipboardItem, ClipboardPipeline, ContentFormat, PageRequest, ScriptedSource,
    Settings, SortBy, SqliteBackend,
};
use clipmem_daemon::{logging, settings};

/// clipmem - Clipboard Memory CLI
#[derive(Parser)]
#[command(name = "clipmem")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "CLI for the clipmem clipboard history")]
#[command(long_about = "clipmem keeps a bounded, searchable history of everything you copy.\n\nIt learns what you copy together and predicts what you will want next.")]
struct Cli {
    /// Custom data directory (holds clipmem.db)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Settings file (JSON)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List history, newest first
    History {
        #[arg(long, default_value = "20")]
        limit: usize,
        #[arg(long, default_value = "0")]
        offset: usize,
    },

    /// Ranked search over history
    Search {
        query: String,
        /// Only items with this tag (repeatable)
        #[arg(long)]
        tag: Vec<String>,
        /// Only items of this format (repeatable)
        #[arg(long)]
        format: Vec<String>,
        /// Sort by relevance, date or length
        #[arg(long, default_value = "relevance")]
        sort: String,
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Index keys and saved searches starting with a prefix
    Suggest { prefix: String },

    /// Predict the next content
    Predict {
        /// Content just copied (defaults to the newest history item)
        content: Option<String>,
        /// Application the content came from
        #[arg(long)]
        app: Option<String>,
    },

    /// Show history statistics
    Stats {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show memory bank insights
    Insights {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Add a tag to an item
    Tag { id: String, tag: String },

    /// Delete an item
    Delete { id: String },

    /// Delete all history
    Clear {
        /// Skip confirmation
        #[arg(long)]
        yes: bool,
    },

    /// Export history as JSON
    Export {
        output: PathBuf,
        /// Include items flagged as sensitive
        #[arg(long)]
        include_sensitive: bool,
    },

    /// Import a JSON export
    Import { file: PathBuf },

    /// Run age-based cleanup and rebuild the index
    Maintain,

    /// Copy the SQLite database to a file
    Backup {
        /// Output file path for the backup
        output: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(tracing::Level::WARN, false);

    let settings = settings::resolve(cli.config, cli.data_dir)?;
    // The CLI never polls; an idle source keeps the pipeline offline
    let pipeline = ClipboardPipeline::open(Arc::new(ScriptedSource::new()), &settings)?;

    match cli.command {
        Commands::History { limit, offset } => run_history(&pipeline, limit, offset),
        Commands::Search {
            query,
            tag,
            format,
            sort,
            limit,
        } => run_search(&pipeline, &query, tag, format, &sort, limit),
        Commands::Suggest { prefix } => run_suggest(&pipeline, &prefix),
        Commands::Predict { content, app } => run_predict(&pipeline, content, app),
        Commands::Stats { json } => run_stats(&pipeline, json),
        Commands::Insights { json } => run_insights(&pipeline, json),
        Commands::Tag { id, tag } => run_tag(&pipeline, &id, &tag),
        Commands::Delete { id } => run_delete(&pipeline, &id),
        Commands::Clear { yes } => run_clear(&pipeline, yes),
        Commands::Export {
            output,
            include_sensitive,
        } => run_export(&pipeline, output, include_sensitive),
        Commands::Import { file } => run_import(&pipeline, file),
        Commands::Maintain => run_maintain(&pipeline),
        Commands::Backup { output } => run_backup(&settings, output),
    }
}

/// One history line: short id, age, format, preview
fn print_item(item: &ClipboardItem) {
    let preview = if item.is_masked() {
        clipmem_core::content::mask(&item.content, 2)
    } else {
        item.preview(70)
    };
    let short_id: String = item.id.chars().take(8).collect();
    let star = if item.favorite { "*".yellow() } else { " ".normal() };
    println!(
        "{}{} {:>6} {:<10} {}",
        star,
        short_id.dimmed(),
        format_age(item),
        item.format.as_str().cyan(),
        preview.replace('\n', " ")
    );
    if !item.tags.is_empty() {
        println!("           {}", item.tags.join(", ").dimmed());
    }
}

fn format_age(item: &ClipboardItem) -> String {
    let age = Utc::now() - item.timestamp;
    if age.num_days() > 0 {
        format!("{}d", age.num_days())
    } else if age.num_hours() > 0 {
        format!("{}h", age.num_hours())
    } else {
        format!("{}m", age.num_minutes().max(0))
    }
}

/// Resolve a full id from a unique prefix
fn resolve_id(pipeline: &ClipboardPipeline, prefix: &str) -> anyhow::Result<String> {
    let matches: Vec<String> = pipeline
        .store()
        .get_all()
        .into_iter()
        .filter(|i| i.id.starts_with(prefix))
        .map(|i| i.id)
        .collect();
    match matches.as_slice() {
        [id] => Ok(id.clone()),
        [] => anyhow::bail!("no item with id {}", prefix),
        _ => anyhow::bail!("id prefix {} is ambiguous ({} items)", prefix, matches.len()),
    }
}

fn run_history(pipeline: &ClipboardPipeline, limit: usize, offset: usize) -> anyhow::Result<()> {
    let page = pipeline.history(PageRequest { limit, offset });
    println!(
        "{} ({}-{} of {})",
        "=== Clipboard History ===".cyan().bold(),
        (offset + 1).min(page.total),
        (offset + page.items.len()).min(page.total),
        page.total
    );
    for item in &page.items {
        print_item(item);
    }
    Ok(())
}

fn run_search(
    pipeline: &ClipboardPipeline,
    query: &str,
    tags: Vec<String>,
    formats: Vec<String>,
    sort: &str,
    limit: Option<usize>,
) -> anyhow::Result<()> {
    let filters = SearchFilters {
        tags,
        formats: formats.iter().map(|f| ContentFormat::parse_name(f)).collect(),
        limit,
        sort: SortBy::parse_name(sort).unwrap_or_default(),
    };
    let results = pipeline.search(query, &filters);

    println!("{} {}", "=== Search:".cyan().bold(), format!("{} ===", query).cyan().bold());
    if results.is_empty() {
        println!("{}", "No matches.".yellow());
        return Ok(());
    }
    for result in &results {
        print!("{:>4} ", result.score.to_string().green());
        print_item(&result.item);
    }
    Ok(())
}

fn run_suggest(pipeline: &ClipboardPipeline, prefix: &str) -> anyhow::Result<()> {
    for suggestion in pipeline.complete(prefix) {
        println!("{}", suggestion);
    }
    Ok(())
}

fn run_predict(
    pipeline: &ClipboardPipeline,
    content: Option<String>,
    app: Option<String>,
) -> anyhow::Result<()> {
    let newest = pipeline.history(PageRequest { limit: 1, offset: 0 }).items.into_iter().next();
    let content = content
        .or_else(|| newest.as_ref().map(|i| i.content.clone()))
        .unwrap_or_default();
    let app = app.or_else(|| newest.map(|i| i.metadata.application));
    let context = CaptureContext::now(app.as_deref(), None);

    println!("{}", "=== Predictions ===".cyan().bold());
    let predictions = pipeline.predict(&content, &context);
    if predictions.is_empty() {
        println!("{}", "Nothing to predict yet.".yellow());
    }
    for p in predictions {
        println!(
            "  {:>4.0}%  {}  {}",
            p.confidence * 100.0,
            p.content.bold(),
            p.reasoning.dimmed()
        );
    }
    Ok(())
}

fn run_stats(pipeline: &ClipboardPipeline, json: bool) -> anyhow::Result<()> {
    let stats = pipeline.store().stats();
    let index = pipeline.index().stats();

    if json {
        let value = serde_json::json!({ "history": stats, "index": index });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!("{}", "=== clipmem Statistics ===".cyan().bold());
    println!();
    println!("{}: {} / {}", "Items".white().bold(), stats.total_items, stats.max_size);
    println!("{}: {}", "Favorites".white().bold(), stats.favorite_items);
    println!("{}: {}", "Sensitive".white().bold(), stats.sensitive_items);
    if let Some(oldest) = stats.oldest_item {
        println!("{}: {}", "Oldest Item".white().bold(), oldest.format("%Y-%m-%d %H:%M:%S"));
    }
    if let Some(newest) = stats.newest_item {
        println!("{}: {}", "Newest Item".white().bold(), newest.format("%Y-%m-%d %H:%M:%S"));
    }
    println!("{}: {} keys / {} items", "Search Index".white().bold(), index.keys, index.items);

    if stats.total_items > 0 {
        println!();
        println!("{}", "=== Formats ===".yellow().bold());
        for (format, count) in &stats.by_format {
            print_distribution_bar(format, *count, stats.total_items);
        }
    }
    Ok(())
}

/// Print a distribution bar
fn print_distribution_bar(label: &str, count: usize, total: usize) {
    let percentage = if total > 0 {
        (count as f64 / total as f64) * 100.0
    } else {
        0.0
    };
    let bar_width: usize = 30;
    let filled = ((percentage / 100.0) * bar_width as f64) as usize;
    let bar = format!("{}{}", "#".repeat(filled), "-".repeat(bar_width.saturating_sub(filled)));
    println!("  {:15} [{:30}] {:>4} ({:>5.1}%)", label, bar.green(), count, percentage);
}

fn run_insights(pipeline: &ClipboardPipeline, json: bool) -> anyhow::Result<()> {
    let insights = pipeline.get_memory_insights();

    if json {
        println!("{}", serde_json::to_string_pretty(&insights)?);
        return Ok(());
    }

    println!("{}", "=== Memory Insights ===".cyan().bold());
    println!();
    println!("{}: {}", "Learned Records".white().bold(), insights.total_records);
    println!("{}: {:.2}", "Average Importance".white().bold(), insights.average_importance);
    println!("{}: {}", "Relationships".white().bold(), insights.total_relationships);
    if let Some(hour) = insights.busiest_hour {
        println!("{}: {}:00", "Busiest Hour".white().bold(), hour);
    }
    if !insights.top_applications.is_empty() {
        println!();
        println!("{}", "Top applications:".yellow().bold());
        for (app, count) in &insights.top_applications {
            println!("  {:20} {}", app, count);
        }
    }
    if !insights.by_type.is_empty() {
        println!();
        println!("{}", "=== By Type ===".yellow().bold());
        for (kind, count) in &insights.by_type {
            print_distribution_bar(kind, *count, insights.total_records);
        }
    }
    Ok(())
}

fn run_tag(pipeline: &ClipboardPipeline, id: &str, tag: &str) -> anyhow::Result<()> {
    let id = resolve_id(pipeline, id)?;
    if pipeline.add_tag(&id, tag)? {
        println!("{} {} {}", "Tagged".green(), &id[..8.min(id.len())], tag.bold());
    } else {
        println!("{}", "Tag already present.".yellow());
    }
    Ok(())
}

fn run_delete(pipeline: &ClipboardPipeline, id: &str) -> anyhow::Result<()> {
    let id = resolve_id(pipeline, id)?;
    pipeline.delete(&id)?;
    println!("{} {}", "Deleted".green(), id);
    Ok(())
}

fn run_clear(pipeline: &ClipboardPipeline, yes: bool) -> anyhow::Result<()> {
    let count = pipeline.store().len();
    if !yes {
        println!(
            "{}",
            format!("This deletes all {} items. Re-run with --yes to confirm.", count).yellow()
        );
        return Ok(());
    }
    pipeline.clear()?;
    println!("{} {} items", "Cleared".green().bold(), count);
    Ok(())
}

fn run_export(pipeline: &ClipboardPipeline, output: PathBuf, include_sensitive: bool) -> anyhow::Result<()> {
    let written = pipeline.export_json(&output, include_sensitive)?;
    println!("{} {} items to {}", "Exported".green().bold(), written, output.display());
    if !include_sensitive && pipeline.store().stats().sensitive_items > 0 {
        println!("{}", "Sensitive items were left out (use --include-sensitive).".dimmed());
    }
    Ok(())
}

fn run_import(pipeline: &ClipboardPipeline, file: PathBuf) -> anyhow::Result<()> {
    let report = pipeline.import_json(&file)?;
    println!("{}", "=== Import ===".cyan().bold());
    println!("{}: {}", "Imported".white().bold(), report.imported);
    println!("{}: {}", "Duplicates".white().bold(), report.duplicates);
    if report.evicted > 0 {
        println!("{}: {}", "Evicted (over capacity)".yellow().bold(), report.evicted);
    }
    Ok(())
}

fn run_maintain(pipeline: &ClipboardPipeline) -> anyhow::Result<()> {
    match pipeline.run_maintenance()? {
        Some(report) => {
            println!("{}", "=== Maintenance ===".cyan().bold());
            println!("{}: {}", "Expired".white().bold(), report.expired.len());
            println!("{}: {}", "Indexed Items".white().bold(), report.indexed_items);
            println!("{}: {}ms", "Duration".white().bold(), report.duration_ms);
        }
        None => println!("{}", "Maintenance already running.".yellow()),
    }
    Ok(())
}

fn run_backup(settings: &Settings, output: PathBuf) -> anyhow::Result<()> {
    println!("{}", "=== clipmem Backup ===".cyan().bold());
    println!();

    let db_path = settings.db_path()?;
    if !db_path.exists() {
        anyhow::bail!("Database not found at: {}", db_path.display());
    }

    println!("Flushing WAL checkpoint and copying database...");
    println!("  {} {}", "From:".dimmed(), db_path.display());
    println!("  {}   {}", "To:".dimmed(), output.display());
    let backend = SqliteBackend::new(Some(db_path))?;
    let file_size = backend.backup_to(&output)?;

    let size_display = if file_size >= 1024 * 1024 {
        format!("{:.2} MB", file_size as f64 / (1024.0 * 1024.0))
    } else if file_size >= 1024 {
        format!("{:.1} KB", file_size as f64 / 1024.0)
    } else {
        format!("{} bytes", file_size)
    };

    println!();
    println!(
        "{}",
        format!("Backup complete: {} ({})", output.display(), size_display)
            .green()
            .bold()
    );
    Ok(())
}
