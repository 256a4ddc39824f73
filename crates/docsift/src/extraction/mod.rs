//! Structured field extraction from normalized OCR text.
//!
//! Extraction is table driven: the document type selects an ordered list of
//! [`patterns::FieldPattern`]s, and each pattern yields at most one field.
//! The function is pure, so the same [`OcrResult`] and hint always produce
//! the same [`StructuredExtraction`].

pub mod confidence;
pub mod patterns;

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::types::{
    DocumentType, ExtractedField, ExtractionSummary, FieldValue, OcrResult, PatternKind, Span, StructuredExtraction,
};

pub use confidence::{field_confidence, list_confidence};
pub use patterns::{FieldPattern, MatchMode, patterns_for};

static INVOICE_KEYWORDS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:invoice|bill[ \t]+to|amount[ \t]+due)s?\b")
        .expect("Invoice keyword regex pattern is valid and should compile")
});
static RECEIPT_KEYWORDS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:receipt|subtotal|thank[ \t]+you)s?\b")
        .expect("Receipt keyword regex pattern is valid and should compile")
});
static FORM_KEYWORDS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:form|application|signature)s?\b").expect("Form keyword regex pattern is valid and should compile")
});

/// Classify text by keyword presence. Invoice wins over receipt, receipt over form.
pub fn classify_document(text: &str) -> DocumentType {
    if INVOICE_KEYWORDS.is_match(text) {
        DocumentType::Invoice
    } else if RECEIPT_KEYWORDS.is_match(text) {
        DocumentType::Receipt
    } else if FORM_KEYWORDS.is_match(text) {
        DocumentType::Form
    } else {
        DocumentType::Generic
    }
}

/// Pick the document type: a recognized hint wins, anything else falls back
/// to classification.
pub fn resolve_document_type(text: &str, template_hint: Option<&str>) -> DocumentType {
    match template_hint.map(str::trim).filter(|hint| !hint.is_empty()) {
        Some(hint) => match hint.parse::<DocumentType>() {
            Ok(document_type) => document_type,
            Err(_) => {
                tracing::warn!(hint, "Ignoring unknown template hint, classifying from text");
                classify_document(text)
            }
        },
        None => classify_document(text),
    }
}

/// Extract typed fields from a recognition result.
pub fn extract_structured(result: &OcrResult, template_hint: Option<&str>) -> StructuredExtraction {
    let text = result.text.as_str();
    let document_type = resolve_document_type(text, template_hint);

    let mut fields = IndexMap::new();
    for pattern in patterns_for(document_type) {
        let field = match pattern.mode {
            MatchMode::First => extract_first(pattern, text),
            MatchMode::All => extract_all(pattern, text),
        };
        if let Some(field) = field {
            fields.insert(field.name.clone(), field);
        }
    }

    let summary = summarize(&fields);
    tracing::debug!(
        document_type = %document_type,
        field_count = summary.field_count,
        mean_confidence = summary.mean_confidence,
        "Structured extraction complete"
    );

    StructuredExtraction {
        document_type,
        fields,
        raw_text: result.text.clone(),
        extracted_at: result.recognized_at,
        summary,
    }
}

fn extract_first(pattern: &FieldPattern, text: &str) -> Option<ExtractedField> {
    let caps = pattern.regex.captures(text)?;
    let matched = caps.get(1).or_else(|| caps.get(0))?;
    let raw = matched.as_str().trim_end();
    if raw.is_empty() {
        return None;
    }

    let value = match pattern.kind {
        PatternKind::Currency => confidence::parse_amount(raw)
            .map(FieldValue::Amount)
            .unwrap_or_else(|| FieldValue::Text(raw.to_string())),
        _ => FieldValue::Text(raw.to_string()),
    };

    Some(ExtractedField {
        name: pattern.name.to_string(),
        value,
        source_span: char_span(text, matched.start(), matched.start() + raw.len()),
        pattern_kind: pattern.kind,
        confidence: field_confidence(pattern.kind, raw),
        match_count: 1,
    })
}

fn extract_all(pattern: &FieldPattern, text: &str) -> Option<ExtractedField> {
    let matches: Vec<_> = pattern.regex.find_iter(text).collect();
    let (first, last) = (matches.first()?, matches.last()?);
    let span = char_span(text, first.start(), last.end());
    let values: Vec<String> = matches.iter().map(|m| m.as_str().to_string()).collect();

    Some(ExtractedField {
        name: pattern.name.to_string(),
        confidence: list_confidence(pattern.kind, &values),
        match_count: values.len(),
        value: FieldValue::List(values),
        source_span: span,
        pattern_kind: pattern.kind,
    })
}

/// Convert byte positions from a regex match into character offsets.
fn char_span(text: &str, byte_start: usize, byte_end: usize) -> Span {
    let start = text[..byte_start].chars().count();
    let end = start + text[byte_start..byte_end].chars().count();
    Span::new(start, end)
}

fn summarize(fields: &IndexMap<String, ExtractedField>) -> ExtractionSummary {
    if fields.is_empty() {
        return ExtractionSummary::default();
    }
    let total: f64 = fields.values().map(|f| f.confidence).sum();
    ExtractionSummary {
        field_count: fields.len(),
        mean_confidence: total / fields.len() as f64,
    }
}
