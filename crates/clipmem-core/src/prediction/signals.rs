//! Prediction signal generators
//!
//! Each generator turns the current content and capture context into
//! candidate predictions with fixed confidences:
//! - Time of day: content learned in the same local hour (0.6)
//! - Source application: common fragments per application (0.7)
//! - Content pattern: likely continuations of the current content (0.8 / 0.7)
//! - Memory bank: similar past content (0.8)

use std::sync::Arc;

use chrono::Weekday;

use super::PredictionError;
use crate::item::CaptureContext;
use crate::memory::{MemoryBank, Prediction};

/// Source of candidate predictions
pub trait SignalGenerator: Send + Sync {
    /// Short name for logs
    fn name(&self) -> &'static str;

    /// Produce candidates for the current content and context
    fn generate(
        &self,
        content: &str,
        context: &CaptureContext,
    ) -> Result<Vec<Prediction>, PredictionError>;
}

// ============================================================================
// TIME OF DAY
// ============================================================================

/// Content previously copied in the same local hour
pub struct TimeOfDaySignal {
    bank: Arc<MemoryBank>,
    limit: usize,
}

impl TimeOfDaySignal {
    pub const CONFIDENCE: f64 = 0.6;

    pub fn new(bank: Arc<MemoryBank>) -> Self {
        Self { bank, limit: 3 }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }
}

impl SignalGenerator for TimeOfDaySignal {
    fn name(&self) -> &'static str {
        "time-of-day"
    }

    fn generate(
        &self,
        content: &str,
        context: &CaptureContext,
    ) -> Result<Vec<Prediction>, PredictionError> {
        let reasoning = format!(
            "Pattern detected at {}:00 on {}",
            context.hour_of_day,
            day_name(context.day_of_week)
        );
        Ok(self
            .bank
            .records_in_hour(context.hour_of_day, self.limit + 1)
            .into_iter()
            .filter(|r| r.content != content)
            .take(self.limit)
            .map(|r| Prediction::new(r.content, Self::CONFIDENCE, reasoning.clone()))
            .collect())
    }
}

fn day_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

// ============================================================================
// SOURCE APPLICATION
// ============================================================================

/// Fragments commonly copied in particular applications
pub struct ApplicationSignal {
    /// (application key, fragments); keys match case-insensitively by substring
    table: Vec<(String, Vec<String>)>,
}

impl ApplicationSignal {
    pub const CONFIDENCE: f64 = 0.7;

    pub fn new() -> Self {
        let table = [
            ("vscode", &["function", "const", "import"][..]),
            ("chrome", &["https://", "www."][..]),
            ("firefox", &["https://", "www."][..]),
            ("notepad", &["TODO:", "Note:"][..]),
            ("terminal", &["cd ", "ls -la", "git status"][..]),
        ];
        Self::with_table(
            table
                .iter()
                .map(|(app, fragments)| {
                    (
                        app.to_string(),
                        fragments.iter().map(|f| f.to_string()).collect(),
                    )
                })
                .collect(),
        )
    }

    pub fn with_table(table: Vec<(String, Vec<String>)>) -> Self {
        Self { table }
    }
}

impl Default for ApplicationSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl SignalGenerator for ApplicationSignal {
    fn name(&self) -> &'static str {
        "application"
    }

    fn generate(
        &self,
        _content: &str,
        context: &CaptureContext,
    ) -> Result<Vec<Prediction>, PredictionError> {
        if !context.has_application() {
            return Ok(vec![]);
        }
        let app = context.application.to_lowercase();
        let Some((_, fragments)) = self.table.iter().find(|(key, _)| app.contains(key.as_str()))
        else {
            return Ok(vec![]);
        };
        Ok(fragments
            .iter()
            .map(|f| {
                Prediction::new(
                    f.clone(),
                    Self::CONFIDENCE,
                    format!("Common in {}", context.application),
                )
            })
            .collect())
    }
}

// ============================================================================
// CONTENT PATTERN
// ============================================================================

/// A continuation rule: content containing `needle` predicts `prediction`
#[derive(Debug, Clone)]
pub struct PatternRule {
    pub needle: String,
    pub prediction: String,
    pub confidence: f64,
    pub reasoning: String,
}

impl PatternRule {
    pub fn new(needle: &str, prediction: &str, confidence: f64, reasoning: &str) -> Self {
        Self {
            needle: needle.to_string(),
            prediction: prediction.to_string(),
            confidence,
            reasoning: reasoning.to_string(),
        }
    }
}

/// Likely continuations of the current content
pub struct ContentPatternSignal {
    rules: Vec<PatternRule>,
}

impl ContentPatternSignal {
    pub fn new() -> Self {
        Self::with_rules(vec![
            PatternRule::new("function", "() {", 0.8, "Function pattern detected"),
            PatternRule::new("import", "from", 0.7, "Import statement pattern"),
            PatternRule::new("SELECT", "FROM", 0.7, "Query pattern detected"),
        ])
    }

    pub fn with_rules(rules: Vec<PatternRule>) -> Self {
        Self { rules }
    }
}

impl Default for ContentPatternSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl SignalGenerator for ContentPatternSignal {
    fn name(&self) -> &'static str {
        "content-pattern"
    }

    fn generate(
        &self,
        content: &str,
        _context: &CaptureContext,
    ) -> Result<Vec<Prediction>, PredictionError> {
        Ok(self
            .rules
            .iter()
            .filter(|rule| content.contains(rule.needle.as_str()))
            .map(|rule| Prediction::new(rule.prediction.clone(), rule.confidence, rule.reasoning.clone()))
            .collect())
    }
}

// ============================================================================
// MEMORY BANK
// ============================================================================

/// Similar content from the memory bank
pub struct MemoryBankSignal {
    bank: Arc<MemoryBank>,
}

impl MemoryBankSignal {
    pub fn new(bank: Arc<MemoryBank>) -> Self {
        Self { bank }
    }
}

impl SignalGenerator for MemoryBankSignal {
    fn name(&self) -> &'static str {
        "memory-bank"
    }

    fn generate(
        &self,
        content: &str,
        _context: &CaptureContext,
    ) -> Result<Vec<Prediction>, PredictionError> {
        Ok(self
            .bank
            .get_smart_suggestions(content)
            .into_iter()
            .map(|s| Prediction::new(s.text, s.confidence, "Similar to previously copied content"))
            .collect())
    }
}
