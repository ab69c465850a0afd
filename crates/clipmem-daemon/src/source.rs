//! Command-backed clipboard source
//!
//! Reads the clipboard by running an external command (`xclip -o`,
//! `pbpaste`, ...) and taking its stdout. An optional second command
//! reports the active window title.

use std::process::Stdio;
use std::time::Duration;

use clipmem_core::watcher::{ClipboardSnapshot, ClipboardSource, SourceError};
use tokio::process::Command;
use tokio::runtime::{Builder, Handle};

/// Default clipboard read command for this platform
pub fn default_command() -> &'static str {
    if cfg!(target_os = "macos") {
        "pbpaste"
    } else if cfg!(target_os = "windows") {
        "powershell -NoProfile -Command Get-Clipboard"
    } else {
        "xclip -selection clipboard -o"
    }
}

/// A program plus arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl ShellCommand {
    /// Split a command line on whitespace; `None` when empty
    pub fn parse(line: &str) -> Option<Self> {
        let mut parts = line.split_whitespace().map(str::to_string);
        let program = parts.next()?;
        Some(Self {
            program,
            args: parts.collect(),
        })
    }

    /// Run to completion within `timeout`, returning stdout
    async fn output(&self, timeout: Duration) -> Result<String, SourceError> {
        let child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| SourceError::Unavailable(format!("{}: {}", self.program, e)))?;

        // On timeout the wait future is dropped with the child, which kills it
        let output = tokio::time::timeout(timeout, child.wait_with_output())
            .await
            .map_err(|_| SourceError::Timeout(u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX)))?
            .map_err(|e| SourceError::Command(format!("{}: {}", self.program, e)))?;

        if !output.status.success() {
            return Err(SourceError::Command(format!(
                "{} exited with {}",
                self.program, output.status
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    /// Blocking wrapper for the watcher's poll thread.
    ///
    /// Uses the ambient runtime when there is one (the watcher reads on
    /// `spawn_blocking`), otherwise a throwaway current-thread runtime.
    /// Must not be called from inside an async task.
    fn run(&self, timeout: Duration) -> Result<String, SourceError> {
        match Handle::try_current() {
            Ok(handle) => handle.block_on(self.output(timeout)),
            Err(_) => Builder::new_current_thread()
                .enable_all()
                .build()
                .map_err(|e| SourceError::Unavailable(format!("runtime: {}", e)))?
                .block_on(self.output(timeout)),
        }
    }
}

/// Clipboard source that shells out on every read
pub struct CommandSource {
    read: ShellCommand,
    window: Option<ShellCommand>,
    application: Option<String>,
    timeout: Duration,
}

impl CommandSource {
    pub fn new(read: ShellCommand, timeout: Duration) -> Self {
        Self {
            read,
            window: None,
            application: None,
            timeout,
        }
    }

    /// Command printing the active window title
    pub fn with_window_command(mut self, window: ShellCommand) -> Self {
        self.window = Some(window);
        self
    }

    /// Fixed application name reported with every snapshot
    pub fn with_application(mut self, application: impl Into<String>) -> Self {
        self.application = Some(application.into());
        self
    }
}

impl ClipboardSource for CommandSource {
    fn read(&self) -> Result<Option<ClipboardSnapshot>, SourceError> {
        let content = self.read.run(self.timeout)?;
        if content.is_empty() {
            return Ok(None);
        }

        // Window title is best effort
        let window_title = match &self.window {
            Some(cmd) => match cmd.run(self.timeout) {
                Ok(title) => Some(title.trim().to_string()).filter(|t| !t.is_empty()),
                Err(e) => {
                    tracing::debug!("Window title unavailable: {}", e);
                    None
                }
            },
            None => None,
        };

        Ok(Some(ClipboardSnapshot {
            content,
            application: self.application.clone(),
            window_title,
        }))
    }
}
