//! Content Classifier / Formatter
//!
//! Derives metadata for normalized content:
//! - Size counters (bytes, characters, words)
//! - Script-based natural language
//! - Programming language for code
//! - Domain and transport security for links
//! - Sensitivity (credentials, tokens, card numbers, SSNs)
//! - Derived tags

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::item::{CaptureContext, ContentFormat, ItemMetadata};

// ============================================================================
// PATTERNS
// ============================================================================

static PASSWORD_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(password|passwd|pwd|passcode|pin)\s*[:=]\s*\S+")
        .expect("password pattern is valid")
});

static SECRET_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?i)\b(api[_\-\s]?key|secret|token|access[_\-\s]?key|client[_\-\s]?secret|auth)\s*[:=]\s*["']?([A-Za-z0-9_\-./+=]+)"#,
    )
    .expect("secret pattern is valid")
});

static BEARER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bbearer\s+[A-Za-z0-9_\-.=]{16,}").expect("bearer pattern is valid")
});

static CARD_NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:\d{4}[ \-]?){3}\d{4}\b").expect("card pattern is valid")
});

static SSN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\d{3}-\d{2}-\d{4}\b").expect("ssn pattern is valid"));

static PRIVATE_KEY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"-----BEGIN [A-Z ]*PRIVATE KEY-----").expect("private key pattern is valid")
});

static AWS_ACCESS_KEY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bAKIA[0-9A-Z]{16}\b").expect("aws key pattern is valid"));

static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[A-Za-z0-9._%+\-]+@[A-Za-z0-9.\-]+\.[A-Za-z]{2,}").expect("email pattern is valid")
});

static URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[a-zA-Z][a-zA-Z0-9+.\-]*://\S+").expect("url pattern is valid"));

/// Minimum length of a labelled value before it is treated as a key
const MIN_SECRET_LEN: usize = 16;
/// Minimum Shannon entropy (bits per char) of a labelled value
const MIN_SECRET_ENTROPY: f64 = 3.0;

/// Keyword signatures per programming language, as (pattern, weight)
static CODE_SIGNATURES: LazyLock<Vec<(&'static str, Vec<(Regex, u32)>)>> = LazyLock::new(|| {
    let sig = |patterns: &[(&str, u32)]| -> Vec<(Regex, u32)> {
        patterns
            .iter()
            .filter_map(|(p, w)| Regex::new(p).ok().map(|r| (r, *w)))
            .collect()
    };
    vec![
        (
            "rust",
            sig(&[
                (r"\bfn\s+\w+", 3),
                (r"\blet\s+mut\b", 3),
                (r"\bimpl\b", 2),
                (r"\bpub\s+(fn|struct|enum|mod)\b", 3),
                (r"::", 1),
                (r"\w+!\(", 2),
                (r"->\s*\w+", 1),
            ]),
        ),
        (
            "python",
            sig(&[
                (r"(?m)^\s*def\s+\w+\s*\(.*\)\s*:", 4),
                (r"(?m)^\s*from\s+[\w.]+\s+import\b", 3),
                (r"(?m)^\s*import\s+\w+\s*$", 1),
                (r"\bself\b", 1),
                (r"\belif\b", 3),
                (r"\bprint\(", 1),
                (r"(?m):\s*$", 1),
            ]),
        ),
        (
            "javascript",
            sig(&[
                (r"\bfunction\b", 3),
                (r"\b(const|let|var)\s+\w+\s*=", 2),
                (r"=>", 2),
                (r"\bconsole\.log\(", 3),
                (r"\brequire\(", 3),
                (r"(?m)^\s*import\s+.+\s+from\s+['\x22]", 2),
                (r"===", 2),
            ]),
        ),
        (
            "typescript",
            sig(&[
                (r"\binterface\s+\w+", 3),
                (r":\s*(string|number|boolean|void|any)\b", 4),
                (r"\btype\s+\w+\s*=", 3),
                (r"\b(public|private|readonly)\s+\w+\s*:", 2),
            ]),
        ),
        (
            "java",
            sig(&[
                (r"\bpublic\s+(static\s+)?(class|void|final)\b", 4),
                (r"\bSystem\.out\.println\(", 4),
                (r"\bprivate\s+\w+\s+\w+\s*;", 2),
                (r"@Override", 3),
            ]),
        ),
        (
            "go",
            sig(&[
                (r"(?m)^\s*package\s+\w+\s*$", 3),
                (r"\bfunc\s+(\(\w+\s+\*?\w+\)\s*)?\w+\s*\(", 4),
                (r":=", 2),
                (r"\bfmt\.\w+\(", 3),
            ]),
        ),
        (
            "c",
            sig(&[
                (r"#include\s*[<\x22]", 4),
                (r"\bint\s+main\s*\(", 3),
                (r"\bprintf\(", 2),
                (r"\b(malloc|free|sizeof)\(", 2),
            ]),
        ),
        (
            "sql",
            sig(&[
                (r"(?i)\bselect\b.+\bfrom\b", 4),
                (r"(?i)\binsert\s+into\b", 4),
                (r"(?i)\bcreate\s+table\b", 4),
                (r"(?i)\bwhere\b", 1),
                (r"(?i)\bjoin\b", 1),
            ]),
        ),
        (
            "shell",
            sig(&[
                (r"^#!\s*/", 4),
                (r"(?m)^\s*\$\s+\w+", 3),
                (r"\b(sudo|apt|brew|echo|grep|chmod|export)\b", 1),
                (r"\|\s*\w+", 1),
            ]),
        ),
    ]
});

// ============================================================================
// TYPES
// ============================================================================

/// Content plus the metadata derived for it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormattedContent {
    pub content: String,
    pub format: ContentFormat,
    pub metadata: ItemMetadata,
}

/// Classifier configuration
#[derive(Debug, Clone)]
pub struct ClassifierConfig {
    /// Character count above which the `long` tag is derived
    pub long_threshold: usize,
    /// Visible characters kept at each end of a masked preview
    pub mask_visible: usize,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            long_threshold: 100,
            mask_visible: 2,
        }
    }
}

// ============================================================================
// CLASSIFIER
// ============================================================================

/// Derives metadata for normalized content
#[derive(Debug, Clone, Default)]
pub struct ContentClassifier {
    config: ClassifierConfig,
}

impl ContentClassifier {
    /// Create a classifier with default thresholds
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with custom configuration
    pub fn with_config(config: ClassifierConfig) -> Self {
        Self { config }
    }

    /// Classify content without capture context
    pub fn format(&self, content: &str, format: ContentFormat) -> FormattedContent {
        self.format_with_context(content, format, None)
    }

    /// Classify content, copying application and window title from context
    pub fn format_with_context(
        &self,
        content: &str,
        format: ContentFormat,
        context: Option<&CaptureContext>,
    ) -> FormattedContent {
        let mut metadata = ItemMetadata {
            length: content.len(),
            char_count: content.chars().count(),
            word_count: content.split_whitespace().count(),
            language: detect_language(content).to_string(),
            ..Default::default()
        };

        if let Some(ctx) = context {
            metadata.application = ctx.application.clone();
            metadata.window_title = ctx.window_title.clone();
        }

        match format {
            ContentFormat::Code => {
                metadata.code_language = detect_code_language(content).map(str::to_string);
            }
            ContentFormat::Link => {
                let (domain, secure) = parse_link(content);
                metadata.domain = domain;
                metadata.secure = Some(secure);
            }
            _ => {}
        }

        if is_sensitive(content) {
            metadata.sensitive = true;
            metadata.masked = true;
        }

        metadata.derived_tags = self.derive_tags(content, format, metadata.char_count);

        FormattedContent {
            content: content.to_string(),
            format,
            metadata,
        }
    }

    /// Tags inferred from content shape
    pub fn derive_tags(&self, content: &str, format: ContentFormat, char_count: usize) -> Vec<String> {
        let mut tags = Vec::new();
        if char_count > self.config.long_threshold {
            tags.push("long".to_string());
        }
        if content.chars().any(|c| c.is_ascii_digit()) {
            tags.push("numbers".to_string());
        }
        if content.chars().any(|c| c.is_uppercase()) {
            tags.push("uppercase".to_string());
        }
        if EMAIL.is_match(content) {
            tags.push("email".to_string());
        }
        if format == ContentFormat::Link || URL.is_match(content) {
            tags.push("url".to_string());
        }
        if format == ContentFormat::Code {
            tags.push("code".to_string());
        }
        tags
    }

    /// Masked preview of content
    pub fn mask(&self, content: &str) -> String {
        mask(content, self.config.mask_visible)
    }
}

// ============================================================================
// HEURISTICS
// ============================================================================

/// Coarse language by majority script among alphabetic characters
pub fn detect_language(content: &str) -> &'static str {
    let mut latin = 0usize;
    let mut arabic = 0usize;
    let mut cyrillic = 0usize;
    let mut cjk = 0usize;

    for c in content.chars().filter(|c| c.is_alphabetic()) {
        match c as u32 {
            0x0041..=0x024F => latin += 1,
            0x0400..=0x04FF => cyrillic += 1,
            0x0600..=0x06FF | 0x0750..=0x077F => arabic += 1,
            0x3040..=0x30FF | 0x3400..=0x4DBF | 0x4E00..=0x9FFF | 0xAC00..=0xD7AF => cjk += 1,
            _ => {}
        }
    }

    let counts = [
        (latin, "english"),
        (arabic, "arabic"),
        (cyrillic, "cyrillic"),
        (cjk, "cjk"),
    ];
    counts
        .iter()
        .filter(|(n, _)| *n > 0)
        .max_by_key(|(n, _)| *n)
        .map(|(_, name)| *name)
        .unwrap_or(crate::item::UNKNOWN)
}

/// Best-scoring language signature, if any matched
pub fn detect_code_language(content: &str) -> Option<&'static str> {
    let mut best: Option<(&'static str, u32)> = None;
    for (language, patterns) in CODE_SIGNATURES.iter() {
        let score: u32 = patterns
            .iter()
            .filter(|(re, _)| re.is_match(content))
            .map(|(_, w)| *w)
            .sum();
        if score > 0 && best.is_none_or(|(_, b)| score > b) {
            best = Some((*language, score));
        }
    }
    best.map(|(language, _)| language)
}

/// Host and https flag for a link
pub fn parse_link(link: &str) -> (Option<String>, bool) {
    let trimmed = link.trim();
    let Some((scheme, rest)) = trimmed.split_once("://") else {
        return (None, false);
    };
    let secure = scheme.eq_ignore_ascii_case("https");

    let authority = rest.split(['/', '?', '#']).next().unwrap_or_default();
    let host_port = authority.rsplit('@').next().unwrap_or_default();
    let host = if host_port.starts_with('[') {
        host_port.split(']').next().map(|h| format!("{}]", h))
    } else {
        host_port.split(':').next().map(str::to_string)
    };

    let domain = host.filter(|h| !h.is_empty()).map(|h| h.to_lowercase());
    (domain, secure)
}

/// Whether content looks like a credential or personal identifier
pub fn is_sensitive(content: &str) -> bool {
    if PASSWORD_LABEL.is_match(content)
        || BEARER.is_match(content)
        || SSN.is_match(content)
        || PRIVATE_KEY.is_match(content)
        || AWS_ACCESS_KEY.is_match(content)
    {
        return true;
    }

    if CARD_NUMBER
        .find_iter(content)
        .any(|m| luhn_valid(m.as_str()))
    {
        return true;
    }

    SECRET_LABEL.captures_iter(content).any(|caps| {
        caps.get(2).is_some_and(|value| {
            let value = value.as_str();
            value.len() >= MIN_SECRET_LEN && shannon_entropy(value) >= MIN_SECRET_ENTROPY
        })
    })
}

fn luhn_valid(candidate: &str) -> bool {
    let digits: Vec<u32> = candidate.chars().filter_map(|c| c.to_digit(10)).collect();
    if digits.len() < 13 {
        return false;
    }
    let sum: u32 = digits
        .iter()
        .rev()
        .enumerate()
        .map(|(i, &d)| {
            if i % 2 == 1 {
                let doubled = d * 2;
                if doubled > 9 { doubled - 9 } else { doubled }
            } else {
                d
            }
        })
        .sum();
    sum % 10 == 0
}

/// Shannon entropy in bits per character
pub fn shannon_entropy(value: &str) -> f64 {
    let mut counts: HashMap<char, usize> = HashMap::new();
    let mut total = 0usize;
    for c in value.chars() {
        *counts.entry(c).or_insert(0) += 1;
        total += 1;
    }
    if total == 0 {
        return 0.0;
    }
    counts
        .values()
        .map(|&n| {
            let p = n as f64 / total as f64;
            -p * p.log2()
        })
        .sum()
}

/// Masked preview keeping `visible` characters at each end
pub fn mask(content: &str, visible: usize) -> String {
    let chars: Vec<char> = content.chars().collect();
    if chars.len() <= visible * 2 {
        return "*".repeat(chars.len().max(1));
    }
    let head: String = chars[..visible].iter().collect();
    let tail: String = chars[chars.len() - visible..].iter().collect();
    let hidden = (chars.len() - visible * 2).min(16);
    format!("{}{}{}", head, "*".repeat(hidden), tail)
}

// ============================================================================
// TESTS
// ============================================================================
