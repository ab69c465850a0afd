//! Capture context
//!
//! A closed description of where and when content was copied. Hour of day and
//! weekday are taken from the local clock, since time-of-day patterns are
//! about the user's day rather than UTC.

use chrono::{DateTime, Datelike, Local, Timelike, Utc, Weekday};
use serde::{Deserialize, Serialize};

/// Sentinel for context the source could not provide
pub const UNKNOWN: &str = "unknown";

/// Context attached to a capture
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureContext {
    /// Source application, or "unknown"
    pub application: String,
    /// Active window title, or "unknown"
    pub window_title: String,
    /// Capture instant
    pub captured_at: DateTime<Utc>,
    /// Local weekday of the capture
    pub day_of_week: Weekday,
    /// Local hour of the capture (0-23)
    pub hour_of_day: u32,
}

impl CaptureContext {
    /// Context for a capture happening now
    pub fn now(application: Option<&str>, window_title: Option<&str>) -> Self {
        Self::at(Utc::now(), application, window_title)
    }

    /// Context for a capture at a given instant
    pub fn at(
        captured_at: DateTime<Utc>,
        application: Option<&str>,
        window_title: Option<&str>,
    ) -> Self {
        let local = captured_at.with_timezone(&Local);
        Self {
            application: or_unknown(application),
            window_title: or_unknown(window_title),
            captured_at,
            day_of_week: local.weekday(),
            hour_of_day: local.hour(),
        }
    }

    /// Context with no application information
    pub fn unknown_at(captured_at: DateTime<Utc>) -> Self {
        Self::at(captured_at, None, None)
    }

    /// Override the hour bucket (used when replaying recorded context)
    pub fn with_hour(mut self, hour_of_day: u32) -> Self {
        self.hour_of_day = hour_of_day % 24;
        self
    }

    /// Whether the application is known
    pub fn has_application(&self) -> bool {
        self.application != UNKNOWN
    }
}

impl Default for CaptureContext {
    fn default() -> Self {
        Self::now(None, None)
    }
}

/// Local hour of an arbitrary instant, matching `CaptureContext::hour_of_day`
pub fn local_hour(instant: DateTime<Utc>) -> u32 {
    instant.with_timezone(&Local).hour()
}

fn or_unknown(value: Option<&str>) -> String {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => UNKNOWN.to_string(),
    }
}
