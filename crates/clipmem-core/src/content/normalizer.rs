//! Content Normalizer
//!
//! Converts raw clipboard payloads into canonical text for their format:
//! - Text: unified line endings, collapsed whitespace, at most one blank line
//! - Markup: tags stripped, script/style bodies dropped, entities decoded
//! - Rich text: RTF control words, destinations and braces stripped
//! - Code: line endings unified, trailing whitespace trimmed, indentation kept
//! - Links and image references: trimmed
//!
//! Also detects the most likely format of untyped clipboard text.

use std::sync::LazyLock;

use regex::Regex;

use crate::item::ContentFormat;

// ============================================================================
// PATTERNS
// ============================================================================

static SCRIPT_STYLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<script\b[^>]*>.*?</script\s*>|<style\b[^>]*>.*?</style\s*>")
        .expect("script/style pattern is valid")
});

static HTML_COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->").expect("comment pattern is valid"));

static BLOCK_BREAK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)<br\s*/?>|</(p|div|li|tr|h[1-6]|blockquote|pre|table|ul|ol)\s*>")
        .expect("block break pattern is valid")
});

static ANY_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]+>").expect("tag pattern is valid"));

static ENTITY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"&(#[0-9]{1,7}|#[xX][0-9a-fA-F]{1,6}|[a-zA-Z][a-zA-Z0-9]{1,7});")
        .expect("entity pattern is valid")
});

static LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z][a-zA-Z0-9+.\-]*://\S+$").expect("link pattern is valid")
});

static MARKUP_ROOT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^(<!doctype\s+html|<\?xml|<html\b|<(head|body|div|p|span|table|ul|ol|li|svg|section|article|header|footer|nav|a|b|i|em|strong|h[1-6])\b[^>]*>)",
    )
    .expect("markup root pattern is valid")
});

static CODE_KEYWORDS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?m)^\s*(function\s*\w*\s*\(|class\s+\w+|import\s+[\w{*"']|from\s+[\w.]+\s+import\s|def\s+\w+\s*\(|(pub\s+)?fn\s+\w+|(pub\s+)?(struct|enum|trait|impl)\s+\w+|(const|let|var)\s+\w+\s*=|#include\s*[<"]|package\s+\w+|func\s+\w+\s*\()"#,
    )
    .expect("code keyword pattern is valid")
});

/// Groups whose contents are never visible text
const RTF_DESTINATIONS: &[&str] = &[
    "fonttbl",
    "colortbl",
    "stylesheet",
    "info",
    "pict",
    "header",
    "footer",
    "listtable",
    "listoverridetable",
    "generator",
    "xmlnstbl",
];

// ============================================================================
// NORMALIZATION
// ============================================================================

/// Normalize a raw payload into canonical text for the declared format.
///
/// Empty input yields an empty string.
pub fn normalize(raw: &str, format: ContentFormat) -> String {
    if raw.is_empty() {
        return String::new();
    }

    match format {
        ContentFormat::Text => normalize_text(raw),
        ContentFormat::Markup => settle(raw, |s| normalize_text(&strip_markup(s))),
        ContentFormat::RichText => settle(raw, |s| {
            if looks_like_rtf(s) {
                normalize_text(&strip_rtf(s))
            } else {
                normalize_text(s)
            }
        }),
        ContentFormat::Code => normalize_code(raw),
        ContentFormat::Link | ContentFormat::ImageReference => raw.trim().to_string(),
    }
}

/// Apply `pass` until the output stops changing.
///
/// Decoded entities can spell out new tags or entities (`&lt;b&gt;`,
/// `&amp;lt;`), so a single pass is not a fixed point. Stripping and
/// decoding only ever shorten the input and the text rules are idempotent,
/// so the loop terminates.
fn settle(raw: &str, pass: impl Fn(&str) -> String) -> String {
    let mut current = pass(raw);
    loop {
        let next = pass(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}

/// Text rules: unify line endings, collapse horizontal whitespace, trim
/// lines, keep at most one blank line between paragraphs, trim the whole.
pub fn normalize_text(raw: &str) -> String {
    let unified = unify_line_endings(raw);
    let mut out = String::with_capacity(unified.len());
    let mut started = false;
    let mut pending_blank = false;

    for line in unified.split('\n') {
        let collapsed = line.split_whitespace().collect::<Vec<_>>().join(" ");
        if collapsed.is_empty() {
            pending_blank = started;
            continue;
        }
        if started {
            out.push('\n');
            if pending_blank {
                out.push('\n');
            }
        }
        out.push_str(&collapsed);
        started = true;
        pending_blank = false;
    }

    out
}

/// Code rules: unify line endings, trim trailing whitespace per line, drop
/// blank leading and trailing lines. Indentation is preserved.
pub fn normalize_code(raw: &str) -> String {
    let unified = unify_line_endings(raw);
    let lines: Vec<&str> = unified.split('\n').map(str::trim_end).collect();

    let first = lines.iter().position(|l| !l.is_empty());
    let last = lines.iter().rposition(|l| !l.is_empty());

    match (first, last) {
        (Some(first), Some(last)) => lines[first..=last].join("\n"),
        _ => String::new(),
    }
}

fn unify_line_endings(raw: &str) -> String {
    raw.replace("\r\n", "\n")
        .replace(['\r', '\u{2028}', '\u{2029}', '\u{85}'], "\n")
}

/// Strip tags and decode entities. The result still needs the text rules.
pub fn strip_markup(raw: &str) -> String {
    let without_scripts = SCRIPT_STYLE.replace_all(raw, "");
    let without_comments = HTML_COMMENT.replace_all(&without_scripts, "");
    let with_breaks = BLOCK_BREAK.replace_all(&without_comments, "\n");
    let without_tags = ANY_TAG.replace_all(&with_breaks, "");
    decode_entities(&without_tags)
}

/// Decode named and numeric character references. Unknown names are kept.
pub fn decode_entities(input: &str) -> String {
    ENTITY
        .replace_all(input, |caps: &regex::Captures| {
            let body = &caps[1];
            decode_entity(body).unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

fn decode_entity(body: &str) -> Option<String> {
    if let Some(num) = body.strip_prefix('#') {
        let code = match num.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => num.parse::<u32>().ok()?,
        };
        return char::from_u32(code).map(String::from);
    }

    let decoded = match body {
        "amp" => "&",
        "lt" => "<",
        "gt" => ">",
        "quot" => "\"",
        "apos" => "'",
        "nbsp" => " ",
        "copy" => "\u{a9}",
        "reg" => "\u{ae}",
        "trade" => "\u{2122}",
        "hellip" => "\u{2026}",
        "mdash" => "\u{2014}",
        "ndash" => "\u{2013}",
        "lsquo" => "\u{2018}",
        "rsquo" => "\u{2019}",
        "ldquo" => "\u{201c}",
        "rdquo" => "\u{201d}",
        "euro" => "\u{20ac}",
        _ => return None,
    };
    Some(decoded.to_string())
}

fn looks_like_rtf(raw: &str) -> bool {
    raw.trim_start().starts_with("{\\rtf")
}

/// Extract visible text from an RTF document.
///
/// `\par` and `\line` become newlines, `\tab` a tab, `\'hh` a Latin-1
/// character. Destination groups (`{\*...}`, font and color tables, ...)
/// are skipped entirely.
pub fn strip_rtf(raw: &str) -> String {
    let chars: Vec<char> = raw.chars().collect();
    let mut out = String::with_capacity(raw.len());
    let mut skip_stack: Vec<bool> = Vec::new();
    let mut skipping = false;
    let mut group_start = false;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            '{' => {
                skip_stack.push(skipping);
                group_start = true;
                i += 1;
                continue;
            }
            '}' => {
                skipping = skip_stack.pop().unwrap_or(false);
                i += 1;
            }
            '\\' => {
                i += 1;
                let Some(&next) = chars.get(i) else { break };

                if next.is_ascii_alphabetic() {
                    let start = i;
                    while i < chars.len() && chars[i].is_ascii_alphabetic() {
                        i += 1;
                    }
                    let word: String = chars[start..i].iter().collect();

                    if i < chars.len() && (chars[i] == '-' || chars[i].is_ascii_digit()) {
                        i += 1;
                        while i < chars.len() && chars[i].is_ascii_digit() {
                            i += 1;
                        }
                    }
                    if i < chars.len() && chars[i] == ' ' {
                        i += 1;
                    }

                    if group_start && RTF_DESTINATIONS.contains(&word.as_str()) {
                        skipping = true;
                    }
                    if !skipping {
                        match word.as_str() {
                            "par" | "line" | "sect" | "page" => out.push('\n'),
                            "tab" => out.push('\t'),
                            _ => {}
                        }
                    }
                } else if next == '\'' {
                    let hex: String = chars.iter().skip(i + 1).take(2).collect();
                    i += 1 + hex.len();
                    if !skipping {
                        if let Ok(byte) = u8::from_str_radix(&hex, 16) {
                            out.push(char::from(byte));
                        }
                    }
                } else if next == '*' {
                    skipping = true;
                    i += 1;
                } else {
                    if !skipping {
                        match next {
                            '\\' | '{' | '}' => out.push(next),
                            '~' => out.push(' '),
                            '\n' | '\r' => out.push('\n'),
                            _ => {}
                        }
                    }
                    i += 1;
                }
            }
            '\r' | '\n' => i += 1,
            _ => {
                if !skipping {
                    out.push(c);
                }
                i += 1;
            }
        }
        group_start = false;
    }

    out
}

// ============================================================================
// TYPE DETECTION
// ============================================================================

/// Detect the most likely format of raw clipboard text.
///
/// Priority: link, markup, rich text, code, text.
pub fn detect_type(text: &str) -> ContentFormat {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return ContentFormat::Text;
    }

    if LINK.is_match(trimmed) {
        return ContentFormat::Link;
    }
    if MARKUP_ROOT.is_match(trimmed) {
        return ContentFormat::Markup;
    }
    if trimmed.starts_with("{\\rtf") {
        return ContentFormat::RichText;
    }
    if looks_like_code(trimmed) {
        return ContentFormat::Code;
    }

    ContentFormat::Text
}

fn looks_like_code(text: &str) -> bool {
    if CODE_KEYWORDS.is_match(text) {
        return true;
    }
    let has_block = text.contains('{') && text.contains('}');
    has_block && (text.contains(';') || text.contains("=>") || text.contains("()"))
}

// ============================================================================
// TESTS
// ============================================================================
