//! Text normalization applied to every engine output before it is cached.

use once_cell::sync::Lazy;
use regex::Regex;

static HORIZONTAL_WHITESPACE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[ \t\u{a0}\u{2000}-\u{200a}\u{202f}\u{205f}\u{3000}]+")
        .expect("Horizontal whitespace regex pattern is valid and should compile")
});
static BLANK_LINE_RUNS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n{3,}").expect("Blank line regex pattern is valid and should compile"));

/// Remove control characters, keeping newlines and tabs.
pub fn strip_control_characters(text: &str) -> String {
    if text.chars().any(|c| c.is_control() && c != '\n' && c != '\t') {
        text.chars()
            .filter(|&c| !c.is_control() || c == '\n' || c == '\t')
            .collect()
    } else {
        text.to_string()
    }
}

/// Normalize raw engine text.
///
/// Line endings become `\n`, control characters other than newline and tab
/// are dropped, runs of horizontal whitespace collapse to one space (a lone
/// tab survives), lines are trimmed, more than one blank line in a row
/// collapses to one, and the result is trimmed.
pub fn normalize_text(text: &str) -> String {
    if text.trim().is_empty() {
        return String::new();
    }

    let unified = text.replace("\r\n", "\n").replace('\r', "\n");
    let stripped = strip_control_characters(&unified);

    let mut result = String::with_capacity(stripped.len());
    for (i, line) in stripped.split('\n').enumerate() {
        if i > 0 {
            result.push('\n');
        }
        let collapsed = HORIZONTAL_WHITESPACE.replace_all(line, |caps: &regex::Captures| {
            if &caps[0] == "\t" { "\t".to_string() } else { " ".to_string() }
        });
        result.push_str(collapsed.trim());
    }

    BLANK_LINE_RUNS.replace_all(&result, "\n\n").trim().to_string()
}

pub fn count_words(text: &str) -> usize {
    text.split_whitespace().count()
}

pub fn count_characters(text: &str) -> usize {
    text.chars().count()
}
