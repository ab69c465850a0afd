//! Prediction module - Next-content predictions
//!
//! - `SignalGenerator` trait and the four standard signals
//! - `PredictiveEngine` merging, deduplicating and ranking their output

mod engine;
mod signals;

pub use engine::{DEFAULT_MAX_PREDICTIONS, PredictiveEngine};
pub use signals::{
    ApplicationSignal, ContentPatternSignal, MemoryBankSignal, PatternRule, SignalGenerator,
    TimeOfDaySignal,
};

/// Prediction error type
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum PredictionError {
    /// A generator could not produce candidates
    #[error("Generator '{generator}' failed: {message}")]
    Generator { generator: String, message: String },
}

/// Prediction result type
pub type Result<T> = std::result::Result<T, PredictionError>;
