//! Per-field confidence scoring.
//!
//! A value that passes the strict format check for its pattern kind gets the
//! kind's boosted score, anything else stays at the base score. Very short
//! and very long values are penalized afterwards.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::types::PatternKind;

pub const BASE_CONFIDENCE: f64 = 0.5;
const SHORT_VALUE_CHARS: usize = 2;
const LONG_VALUE_CHARS: usize = 100;
const SHORT_VALUE_PENALTY: f64 = 0.5;
const LONG_VALUE_PENALTY: f64 = 0.7;

static STRICT_EMAIL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9-]+(?:\.[A-Za-z0-9-]+)*\.[A-Za-z]{2,}$")
        .expect("Strict email regex pattern is valid and should compile")
});
static STRICT_SLASH_DATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{1,2})[/.-](\d{1,2})[/.-](\d{2}|\d{4})$")
        .expect("Strict date regex pattern is valid and should compile")
});
static STRICT_ISO_DATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\d{4}-(\d{2})-(\d{2})$").expect("Strict ISO date regex pattern is valid and should compile")
});
static STRICT_CURRENCY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:[$€£]|(?:USD|EUR|GBP))?[ \t]?(?:\d{1,3}(?:,\d{3})+|\d+)(?:\.\d{2})?$")
        .expect("Strict currency regex pattern is valid and should compile")
});
static STRICT_PHONE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\+?[\d \t().-]+$").expect("Strict phone regex pattern is valid and should compile"));
static STRICT_IDENTIFIER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9]+(?:-[A-Za-z0-9]+)*$").expect("Strict identifier regex pattern is valid and should compile")
});
static STRICT_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z][A-Za-z'-]*(?:[ \t][A-Za-z][A-Za-z'-]*)*$")
        .expect("Strict name regex pattern is valid and should compile")
});
static STRICT_ZIP: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{5}(?:-\d{4})?$").expect("Strict zip code regex pattern is valid and should compile"));
static STRICT_URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:https?://|www\.)[A-Za-z0-9-]+(?:\.[A-Za-z0-9-]+)*\.[A-Za-z]{2,}(?::\d+)?(?:[/?#]\S*)?$")
        .expect("Strict URL regex pattern is valid and should compile")
});

/// Score awarded to a value that passes its kind's strict check.
pub fn boosted_confidence(kind: PatternKind) -> f64 {
    match kind {
        PatternKind::Email => 0.95,
        PatternKind::Date | PatternKind::Currency | PatternKind::ZipCode | PatternKind::Url => 0.90,
        PatternKind::Phone | PatternKind::Identifier | PatternKind::Name => 0.85,
    }
}

pub fn matches_strict_format(kind: PatternKind, value: &str) -> bool {
    match kind {
        PatternKind::Email => STRICT_EMAIL.is_match(value),
        PatternKind::Date => is_plausible_date(value),
        PatternKind::Currency => STRICT_CURRENCY.is_match(value),
        PatternKind::Phone => {
            let digits = value.chars().filter(|c| c.is_ascii_digit()).count();
            STRICT_PHONE.is_match(value) && (10..=15).contains(&digits)
        }
        PatternKind::Identifier => STRICT_IDENTIFIER.is_match(value) && value.chars().any(|c| c.is_ascii_digit()),
        PatternKind::Name => STRICT_NAME.is_match(value),
        PatternKind::ZipCode => STRICT_ZIP.is_match(value),
        PatternKind::Url => STRICT_URL.is_match(value),
    }
}

fn is_plausible_date(value: &str) -> bool {
    if let Some(caps) = STRICT_ISO_DATE.captures(value) {
        let month: u32 = caps[1].parse().unwrap_or(0);
        let day: u32 = caps[2].parse().unwrap_or(0);
        return (1..=12).contains(&month) && (1..=31).contains(&day);
    }

    // Day/month order is ambiguous, so accept either reading.
    if let Some(caps) = STRICT_SLASH_DATE.captures(value) {
        let first: u32 = caps[1].parse().unwrap_or(0);
        let second: u32 = caps[2].parse().unwrap_or(0);
        let in_range = (1..=31).contains(&first) && (1..=31).contains(&second);
        return in_range && (first <= 12 || second <= 12);
    }

    false
}

/// Confidence for a single extracted value, always within `[0, 1]`.
pub fn field_confidence(kind: PatternKind, value: &str) -> f64 {
    let value = value.trim();
    let mut confidence = if matches_strict_format(kind, value) {
        boosted_confidence(kind)
    } else {
        BASE_CONFIDENCE
    };

    let length = value.chars().count();
    if length < SHORT_VALUE_CHARS {
        confidence *= SHORT_VALUE_PENALTY;
    } else if length > LONG_VALUE_CHARS {
        confidence *= LONG_VALUE_PENALTY;
    }

    confidence.clamp(0.0, 1.0)
}

/// Mean confidence across the items of a list field.
pub fn list_confidence<S: AsRef<str>>(kind: PatternKind, values: &[S]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let total: f64 = values.iter().map(|v| field_confidence(kind, v.as_ref())).sum();
    (total / values.len() as f64).clamp(0.0, 1.0)
}

/// Parse a currency string into a number, ignoring symbols and thousands separators.
pub fn parse_amount(value: &str) -> Option<f64> {
    let cleaned: String = value
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|amount| amount.is_finite())
}
