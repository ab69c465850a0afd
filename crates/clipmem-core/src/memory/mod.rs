//! Memory module - Similarity graph over clipboard content
//!
//! - Memory records with capture context and importance
//! - Jaccard token similarity
//! - Bounded-window relationship building
//! - Time-of-day predictions and similarity suggestions

mod bank;
mod record;
mod similarity;

pub use bank::{MemoryBank, MemoryBankConfig, MemoryInsights};
pub use record::{MEMORY_ID_PREFIX, MemoryRecord, Prediction, Suggestion, SuggestionKind};
pub use similarity::{jaccard, text_similarity, token_set};
