use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

use crate::error::DocsiftError;
use crate::text::normalize::{count_characters, count_words, normalize_text};

/// Engine options for a recognition call.
///
/// A sorted map so that the cache fingerprint derived from it does not depend
/// on insertion order.
pub type ProcessingOptions = BTreeMap<String, serde_json::Value>;

// ============================================================================
// Recognition
// ============================================================================

/// Raw output of a [`RecognitionEngine`](crate::plugins::RecognitionEngine) call.
///
/// Nothing here is trusted as-is: [`OcrResult::from_recognition`] normalizes
/// the text, rescales the confidence and recomputes all counts.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecognitionOutput {
    pub text: String,
    pub confidence: f64,
    #[serde(default)]
    pub language: String,
    #[serde(default)]
    pub page_count: usize,
    #[serde(default)]
    pub processing_time_seconds: f64,
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
    /// Word count as reported by the engine, if it reports one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reported_word_count: Option<usize>,
    /// Character count as reported by the engine, if it reports one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reported_character_count: Option<usize>,
}

impl RecognitionOutput {
    pub fn new(text: impl Into<String>, confidence: f64) -> Self {
        Self {
            text: text.into(),
            confidence,
            language: "eng".to_string(),
            page_count: 1,
            ..Default::default()
        }
    }
}

/// Canonical output of one recognition call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OcrResult {
    /// Normalized text.
    pub text: String,
    /// Engine confidence in `[0.0, 1.0]`.
    pub confidence: f64,
    pub language: String,
    /// Always at least 1.
    pub page_count: usize,
    pub processing_time_seconds: f64,
    /// Recomputed from `text`.
    pub word_count: usize,
    /// Recomputed from `text`.
    pub character_count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reported_word_count: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reported_character_count: Option<usize>,
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
    pub recognized_at: DateTime<Utc>,
}

impl OcrResult {
    /// Build the canonical result from raw engine output.
    ///
    /// Confidence values above 1.0 and up to 100.0 are read as percentages.
    /// Word and character counts always come from the normalized text; the
    /// engine's own counts are kept only in the `reported_*` fields.
    pub fn from_recognition(output: RecognitionOutput) -> Self {
        let text = normalize_text(&output.text);
        let word_count = count_words(&text);
        let character_count = count_characters(&text);

        Self {
            text,
            confidence: normalize_confidence(output.confidence),
            language: output.language,
            page_count: output.page_count.max(1),
            processing_time_seconds: if output.processing_time_seconds.is_finite() {
                output.processing_time_seconds.max(0.0)
            } else {
                0.0
            },
            word_count,
            character_count,
            reported_word_count: output.reported_word_count,
            reported_character_count: output.reported_character_count,
            metadata: output.metadata,
            recognized_at: Utc::now(),
        }
    }

    /// Shorthand for a single-page result with default language.
    pub fn from_text(text: impl Into<String>, confidence: f64) -> Self {
        Self::from_recognition(RecognitionOutput::new(text, confidence))
    }
}

fn normalize_confidence(raw: f64) -> f64 {
    if !raw.is_finite() {
        return 0.0;
    }
    let scaled = if raw > 1.0 && raw <= 100.0 { raw / 100.0 } else { raw };
    scaled.clamp(0.0, 1.0)
}

// ============================================================================
// Quality
// ============================================================================

/// Four-way bucket derived from the overall quality score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityLevel {
    Excellent,
    Good,
    Fair,
    Poor,
}

impl QualityLevel {
    pub fn from_score(score: f64) -> Self {
        if score >= 0.95 {
            QualityLevel::Excellent
        } else if score >= 0.80 {
            QualityLevel::Good
        } else if score >= 0.60 {
            QualityLevel::Fair
        } else {
            QualityLevel::Poor
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            QualityLevel::Excellent => "excellent",
            QualityLevel::Good => "good",
            QualityLevel::Fair => "fair",
            QualityLevel::Poor => "poor",
        }
    }
}

impl fmt::Display for QualityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueSeverity {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    LowConfidence,
    InsufficientText,
    SuspiciousPatterns,
}

impl IssueKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueKind::LowConfidence => "low_confidence",
            IssueKind::InsufficientText => "insufficient_text",
            IssueKind::SuspiciousPatterns => "suspicious_patterns",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityIssue {
    #[serde(rename = "type")]
    pub kind: IssueKind,
    pub severity: IssueSeverity,
    pub description: String,
    pub recommendation: String,
}

/// Result of [`QualityAssessor::assess`](crate::text::quality::QualityAssessor::assess).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityAssessment {
    /// Weighted combination of the three component scores, in `[0.0, 1.0]`.
    pub overall_quality: f64,
    pub quality_level: QualityLevel,
    pub text_quality: f64,
    pub confidence_quality: f64,
    pub consistency_quality: f64,
    pub issues: Vec<QualityIssue>,
    pub suggestions: Vec<String>,
}

impl QualityAssessment {
    pub fn issue(&self, kind: IssueKind) -> Option<&QualityIssue> {
        self.issues.iter().find(|issue| issue.kind == kind)
    }

    pub fn has_issue(&self, kind: IssueKind) -> bool {
        self.issue(kind).is_some()
    }
}

// ============================================================================
// Structured extraction
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentType {
    Invoice,
    Receipt,
    Form,
    Generic,
}

impl DocumentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentType::Invoice => "invoice",
            DocumentType::Receipt => "receipt",
            DocumentType::Form => "form",
            DocumentType::Generic => "generic",
        }
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentType {
    type Err = DocsiftError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "invoice" => Ok(DocumentType::Invoice),
            "receipt" => Ok(DocumentType::Receipt),
            "form" => Ok(DocumentType::Form),
            "generic" => Ok(DocumentType::Generic),
            other => Err(DocsiftError::validation(format!(
                "Unknown document type '{}'. Must be one of: invoice, receipt, form, generic",
                other
            ))),
        }
    }
}

/// Format family a field pattern matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternKind {
    Identifier,
    Currency,
    Date,
    Email,
    Phone,
    Name,
    ZipCode,
    Url,
}

impl PatternKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PatternKind::Identifier => "identifier",
            PatternKind::Currency => "currency",
            PatternKind::Date => "date",
            PatternKind::Email => "email",
            PatternKind::Phone => "phone",
            PatternKind::Name => "name",
            PatternKind::ZipCode => "zip_code",
            PatternKind::Url => "url",
        }
    }
}

/// Character offsets into the source text, end exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// The spanned characters of `source`.
    pub fn text_in(&self, source: &str) -> String {
        source
            .chars()
            .skip(self.start)
            .take(self.end.saturating_sub(self.start))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Amount(f64),
    Text(String),
    List(Vec<String>),
}

impl FieldValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_amount(&self) -> Option<f64> {
        match self {
            FieldValue::Amount(amount) => Some(*amount),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            FieldValue::List(items) => Some(items),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedField {
    pub name: String,
    pub value: FieldValue,
    /// For list fields, the span from the first match start to the last match end.
    pub source_span: Span,
    pub pattern_kind: PatternKind,
    pub confidence: f64,
    pub match_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ExtractionSummary {
    pub field_count: usize,
    pub mean_confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuredExtraction {
    pub document_type: DocumentType,
    pub fields: IndexMap<String, ExtractedField>,
    pub raw_text: String,
    pub extracted_at: DateTime<Utc>,
    pub summary: ExtractionSummary,
}

impl StructuredExtraction {
    pub fn field(&self, name: &str) -> Option<&ExtractedField> {
        self.fields.get(name)
    }
}

// ============================================================================
// Pipeline and batch
// ============================================================================

/// Everything the pipeline produces for one document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentAnalysis {
    pub file_name: String,
    pub file_hash: String,
    /// True when the OCR result was served from the cache.
    pub from_cache: bool,
    pub ocr: OcrResult,
    pub quality: QualityAssessment,
    pub structured: StructuredExtraction,
}

/// One input document of a batch.
#[derive(Debug, Clone)]
pub struct BatchItem {
    pub content: Vec<u8>,
    pub mime_type: String,
    pub file_name: Option<String>,
    pub template_hint: Option<String>,
}

impl BatchItem {
    pub fn new(content: impl Into<Vec<u8>>, mime_type: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            mime_type: mime_type.into(),
            file_name: None,
            template_hint: None,
        }
    }

    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = Some(file_name.into());
        self
    }

    pub fn with_template_hint(mut self, hint: impl Into<String>) -> Self {
        self.template_hint = Some(hint.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchItemStatus {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum BatchItemOutcome {
    Success { result: Box<DocumentAnalysis> },
    Error { kind: String, message: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchItemResult {
    /// Position of the item in the submitted list.
    pub index: usize,
    pub file_name: String,
    #[serde(flatten)]
    pub outcome: BatchItemOutcome,
}

impl BatchItemResult {
    pub fn success(index: usize, result: DocumentAnalysis) -> Self {
        Self {
            index,
            file_name: result.file_name.clone(),
            outcome: BatchItemOutcome::Success {
                result: Box::new(result),
            },
        }
    }

    pub fn failure(index: usize, file_name: impl Into<String>, error: &DocsiftError) -> Self {
        Self {
            index,
            file_name: file_name.into(),
            outcome: BatchItemOutcome::Error {
                kind: error.kind().to_string(),
                message: error.to_string(),
            },
        }
    }

    pub fn status(&self) -> BatchItemStatus {
        match self.outcome {
            BatchItemOutcome::Success { .. } => BatchItemStatus::Success,
            BatchItemOutcome::Error { .. } => BatchItemStatus::Error,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status() == BatchItemStatus::Success
    }

    pub fn result(&self) -> Option<&DocumentAnalysis> {
        match &self.outcome {
            BatchItemOutcome::Success { result } => Some(result),
            BatchItemOutcome::Error { .. } => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match &self.outcome {
            BatchItemOutcome::Success { .. } => None,
            BatchItemOutcome::Error { message, .. } => Some(message),
        }
    }
}

/// Order-preserving batch output: `results[i]` belongs to input `i`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchResult {
    pub results: Vec<BatchItemResult>,
    pub succeeded: usize,
    pub failed: usize,
    pub elapsed_seconds: f64,
}

impl BatchResult {
    pub fn from_results(results: Vec<BatchItemResult>, elapsed_seconds: f64) -> Self {
        let succeeded = results.iter().filter(|r| r.is_success()).count();
        let failed = results.len() - succeeded;
        Self {
            results,
            succeeded,
            failed,
            elapsed_seconds,
        }
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}
