//! Field pattern tables, one ordered list per document type.
//!
//! Single-value patterns take capture group 1 as the field value. List
//! patterns (generic documents) collect every full match.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

use crate::types::{DocumentType, PatternKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMode {
    /// First match only, value from capture group 1.
    First,
    /// Every match, collected into a list.
    All,
}

#[derive(Debug)]
pub struct FieldPattern {
    pub name: &'static str,
    pub kind: PatternKind,
    pub mode: MatchMode,
    pub regex: Regex,
}

impl FieldPattern {
    fn new(name: &'static str, kind: PatternKind, mode: MatchMode, pattern: &str) -> Self {
        Self {
            name,
            kind,
            mode,
            regex: Regex::new(pattern).expect("Field extraction regex pattern is valid and should compile"),
        }
    }

    fn first(name: &'static str, kind: PatternKind, pattern: &str) -> Self {
        Self::new(name, kind, MatchMode::First, pattern)
    }

    fn all(name: &'static str, kind: PatternKind, pattern: &str) -> Self {
        Self::new(name, kind, MatchMode::All, pattern)
    }
}

const AMOUNT: &str = r"\d+(?:,\d{3})*(?:\.\d{1,2})?";
const SLASH_DATE: &str = r"\d{1,2}[/.-]\d{1,2}[/.-]\d{2,4}";

static PATTERN_TABLE: Lazy<HashMap<DocumentType, Vec<FieldPattern>>> = Lazy::new(|| {
    let mut table = HashMap::new();

    table.insert(
        DocumentType::Invoice,
        vec![
            FieldPattern::first(
                "invoice_number",
                PatternKind::Identifier,
                r"(?i)\binvoice[ \t]*(?:#|no\b\.?|number\b|num\b\.?|:)[ \t]*:?[ \t]*([A-Z0-9][A-Z0-9-]*)",
            ),
            FieldPattern::first(
                "total_amount",
                PatternKind::Currency,
                &format!(r"(?i)\btotal\b[^\d\n]{{0,30}}({AMOUNT})"),
            ),
            FieldPattern::first(
                "invoice_date",
                PatternKind::Date,
                &format!(r"(?i)\bdate\b[^\d\n]{{0,20}}({SLASH_DATE})\b"),
            ),
        ],
    );

    table.insert(
        DocumentType::Receipt,
        vec![
            FieldPattern::first(
                "total",
                PatternKind::Currency,
                &format!(r"(?i)\btotal\b[^\d\n]{{0,30}}({AMOUNT})"),
            ),
            FieldPattern::first(
                "tax",
                PatternKind::Currency,
                &format!(r"(?i)\b(?:sales[ \t]+)?tax\b(?:[ \t]*\(?\d+(?:\.\d+)?[ \t]*%\)?)?[^\d\n]{{0,20}}({AMOUNT})"),
            ),
            FieldPattern::first("date", PatternKind::Date, &format!(r"\b({SLASH_DATE})\b")),
        ],
    );

    table.insert(
        DocumentType::Form,
        vec![
            FieldPattern::first(
                "name",
                PatternKind::Name,
                r"(?i)\b(?:full[ \t]+)?name\b[ \t]*:?[ \t]*([A-Z][A-Z'-]*(?:[ \t]+[A-Z][A-Z'-]*)*)",
            ),
            FieldPattern::first(
                "email",
                PatternKind::Email,
                r"(?i)\be-?mail\b[^@\n]{0,20}?([A-Z0-9._%+-]+@[A-Z0-9.-]+\.[A-Z]{2,})",
            ),
            FieldPattern::first(
                "phone",
                PatternKind::Phone,
                r"(?i)\b(?:phone|tel(?:ephone)?)\b[^\d\n+(]{0,20}(\+?[\d(][\d \t().-]{5,}\d)",
            ),
        ],
    );

    table.insert(
        DocumentType::Generic,
        vec![
            FieldPattern::all(
                "email_list",
                PatternKind::Email,
                r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b",
            ),
            FieldPattern::all(
                "phone_list",
                PatternKind::Phone,
                r"(?:\+\d{1,3}[ .-]?)?(?:\(\d{3}\)[ .-]?|\b\d{3}[ .-])\d{3}[ .-]\d{4}\b",
            ),
            FieldPattern::all(
                "date_list",
                PatternKind::Date,
                &format!(r"\b\d{{4}}-\d{{2}}-\d{{2}}\b|\b{SLASH_DATE}\b"),
            ),
            FieldPattern::all(
                "currency_list",
                PatternKind::Currency,
                &format!(r"[$€£][ \t]?{AMOUNT}|\b(?:USD|EUR|GBP)[ \t]?{AMOUNT}"),
            ),
            FieldPattern::all("zip_code_list", PatternKind::ZipCode, r"\b\d{5}(?:-\d{4})?\b"),
            FieldPattern::all(
                "url_list",
                PatternKind::Url,
                r#"\bhttps?://[^\s<>"']*[^\s<>"'.,;:)]|\bwww\.[^\s<>"']*[^\s<>"'.,;:)]"#,
            ),
        ],
    );

    table
});

/// Ordered field patterns for a document type.
pub fn patterns_for(document_type: DocumentType) -> &'static [FieldPattern] {
    PATTERN_TABLE
        .get(&document_type)
        .map(|patterns| patterns.as_slice())
        .unwrap_or(&[])
}
