//! Content module - Normalization and classification
//!
//! Turns raw clipboard payloads into canonical, classified content:
//! - `normalizer`: per-format canonical text and type detection
//! - `classifier`: metadata, sensitivity and derived tags

mod classifier;
mod normalizer;

pub use classifier::{
    ClassifierConfig, ContentClassifier, FormattedContent, detect_code_language, detect_language,
    is_sensitive, mask, parse_link, shannon_entropy,
};
pub use normalizer::{
    decode_entities, detect_type, normalize, normalize_code, normalize_text, strip_markup,
    strip_rtf,
};

use crate::item::{CaptureContext, ContentFormat};

/// Tokens must be longer than this many characters
pub const SHORT_TOKEN_CHARS: usize = 2;

/// Lower-cased word tokens longer than two characters, in order of
/// appearance (repeats kept)
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric() && c != '_')
        .filter(|w| w.chars().count() > SHORT_TOKEN_CHARS)
        .map(str::to_lowercase)
        .collect()
}

/// Detect (when undeclared) and normalize a raw payload.
///
/// If normalization of a declared structured format leaves nothing, the raw
/// payload is kept as plain text instead.
pub fn canonicalize(raw: &str, declared: Option<ContentFormat>) -> (String, ContentFormat) {
    let format = declared.unwrap_or_else(|| detect_type(raw));
    let canonical = normalize(raw, format);

    if canonical.is_empty() && format != ContentFormat::Text && !raw.trim().is_empty() {
        tracing::debug!(format = %format, "Normalization produced no content, falling back to text");
        return (normalize(raw, ContentFormat::Text), ContentFormat::Text);
    }
    (canonical, format)
}

/// Canonicalize and classify a raw payload
pub fn prepare(
    classifier: &ContentClassifier,
    raw: &str,
    declared: Option<ContentFormat>,
    context: Option<&CaptureContext>,
) -> FormattedContent {
    let (canonical, format) = canonicalize(raw, declared);
    classifier.format_with_context(&canonical, format, context)
}
