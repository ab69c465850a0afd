//! Logging setup
//!
//! Logs go to stderr so stdout stays clean for command output. `RUST_LOG`
//! overrides the default level.

use std::io;

use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Install the global subscriber. `json` switches to one JSON object per line.
pub fn init(default_level: Level, json: bool) {
    let filter = EnvFilter::builder()
        .with_default_directive(default_level.into())
        .from_env_lossy();

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false);

    // A second init (e.g. in tests) keeps the first subscriber
    let result = if json {
        builder.json().try_init()
    } else {
        builder.with_ansi(false).try_init()
    };
    if let Err(e) = result {
        eprintln!("warning: logging already initialized: {}", e);
    }
}
