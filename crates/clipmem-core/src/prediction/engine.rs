//! Predictive Engine
//!
//! Merges every signal generator into one ranked list. A failing generator
//! contributes nothing and the rest still run.

use std::collections::HashSet;
use std::sync::Arc;

use super::signals::{
    ApplicationSignal, ContentPatternSignal, MemoryBankSignal, SignalGenerator, TimeOfDaySignal,
};
use crate::item::CaptureContext;
use crate::memory::{MemoryBank, Prediction};

/// Maximum predictions returned by default
pub const DEFAULT_MAX_PREDICTIONS: usize = 5;

/// Ranked "next content" predictions from several signals
pub struct PredictiveEngine {
    generators: Vec<Box<dyn SignalGenerator>>,
    max_predictions: usize,
}

impl PredictiveEngine {
    /// Engine with the four standard generators over a memory bank
    pub fn new(bank: Arc<MemoryBank>) -> Self {
        Self::with_generators(vec![
            Box::new(TimeOfDaySignal::new(Arc::clone(&bank))),
            Box::new(ApplicationSignal::new()),
            Box::new(ContentPatternSignal::new()),
            Box::new(MemoryBankSignal::new(bank)),
        ])
    }

    /// Engine with an explicit generator list (run in order)
    pub fn with_generators(generators: Vec<Box<dyn SignalGenerator>>) -> Self {
        Self {
            generators,
            max_predictions: DEFAULT_MAX_PREDICTIONS,
        }
    }

    pub fn with_max_predictions(mut self, max_predictions: usize) -> Self {
        self.max_predictions = max_predictions;
        self
    }

    /// Names of the configured generators, in run order
    pub fn generator_names(&self) -> Vec<&'static str> {
        self.generators.iter().map(|g| g.name()).collect()
    }

    /// Merge generator output: first occurrence of each content wins, then
    /// confidence descending, capped
    pub fn predict(&self, content: &str, context: &CaptureContext) -> Vec<Prediction> {
        let mut merged = Vec::new();
        for generator in &self.generators {
            match generator.generate(content, context) {
                Ok(predictions) => merged.extend(predictions),
                Err(e) => tracing::warn!(generator = generator.name(), "Prediction signal failed: {}", e),
            }
        }
        self.merge(merged)
    }

    fn merge(&self, predictions: Vec<Prediction>) -> Vec<Prediction> {
        let mut seen = HashSet::new();
        let mut unique: Vec<Prediction> = predictions
            .into_iter()
            .filter(|p| seen.insert(p.content.clone()))
            .collect();
        // Stable: equal confidences keep generator order
        unique.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
        unique.truncate(self.max_predictions);
        unique
    }
}
