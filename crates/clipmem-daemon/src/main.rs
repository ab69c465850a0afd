//! clipmemd - Clipboard Memory Daemon
//!
//! Watches the system clipboard through an external command and runs every
//! change through the clipmem pipeline:
//!
//! - Normalization and classification (text, markup, rich-text, code, links)
//! - Bounded, deduplicated history in SQLite
//! - Search index and similarity memory rebuilt on startup
//! - Periodic maintenance (age-based auto-delete, index rebuild)
//!
//! Runs until Ctrl-C.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::sync::broadcast::error::RecvError;
use tracing::{Level, error, info, warn};

use clipmem_core::{ClipboardPipeline, PipelineEvent};
use clipmem_daemon::source::{CommandSource, ShellCommand, default_command};
use clipmem_daemon::{logging, settings};

/// clipmemd - clipboard memory daemon
#[derive(Parser)]
#[command(name = "clipmemd")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Watch the clipboard and keep a searchable, predictive history")]
struct Args {
    /// Custom data directory (holds clipmem.db)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Settings file (JSON); defaults to the platform config dir
    #[arg(long)]
    config: Option<PathBuf>,

    /// Command that prints the clipboard to stdout
    #[arg(long)]
    source_cmd: Option<String>,

    /// Command that prints the active window title
    #[arg(long)]
    window_cmd: Option<String>,

    /// Application name to attach to captures
    #[arg(long)]
    app: Option<String>,

    /// Emit logs as JSON lines
    #[arg(long)]
    log_json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse before logging init so --help/--version print cleanly
    let args = Args::parse();
    logging::init(Level::INFO, args.log_json);

    info!("clipmemd v{} starting...", env!("CARGO_PKG_VERSION"));

    let settings = settings::resolve(args.config, args.data_dir)?;
    let command_line = args.source_cmd.as_deref().unwrap_or(default_command());
    let Some(read_cmd) = ShellCommand::parse(command_line) else {
        anyhow::bail!("--source-cmd must not be empty");
    };

    let mut source = CommandSource::new(read_cmd, settings.clipboard_timeout());
    if let Some(window_cmd) = args.window_cmd.as_deref().and_then(ShellCommand::parse) {
        source = source.with_window_command(window_cmd);
    }
    if let Some(app) = args.app {
        source = source.with_application(app);
    }

    let pipeline = match ClipboardPipeline::open(Arc::new(source), &settings) {
        Ok(p) => Arc::new(p),
        Err(e) => {
            error!("Failed to open clipboard history: {}", e);
            return Err(e.into());
        }
    };
    info!(
        db = %settings.db_path()?.display(),
        items = pipeline.store().len(),
        source = command_line,
        poll_ms = settings.poll_interval_ms,
        "Storage initialized"
    );

    let mut events = pipeline.subscribe();
    if !pipeline.start() {
        anyhow::bail!("clipboard pipeline failed to start");
    }

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Ctrl-C received, shutting down");
                break;
            }
            event = events.recv() => match event {
                Ok(event) => log_event(&event),
                Err(RecvError::Lagged(missed)) => warn!(missed, "Event log fell behind"),
                Err(RecvError::Closed) => break,
            },
        }
    }

    pipeline.stop();
    info!("clipmemd shutting down");
    Ok(())
}

fn log_event(event: &PipelineEvent) {
    match event {
        PipelineEvent::ItemCaptured {
            item_id,
            format,
            tags,
            suggestions,
            ..
        } => info!(
            id = %item_id,
            format = %format,
            tags = ?tags,
            suggestions = suggestions.len(),
            "Item captured"
        ),
        PipelineEvent::CaptureFailed { stage, error, .. } => {
            warn!(stage = %stage, "Capture failed: {}", error)
        }
        PipelineEvent::MaintenanceCompleted {
            expired,
            indexed_items,
            duration_ms,
            ..
        } => info!(expired, indexed_items, duration_ms, "Maintenance pass"),
        other => tracing::debug!(event = other.kind(), "Pipeline event"),
    }
}
