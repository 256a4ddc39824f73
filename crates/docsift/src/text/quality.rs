//! Heuristic quality scoring of OCR results.
//!
//! The overall score combines three independent axes:
//!
//! - **text quality**: length, share of readable tokens, sentence punctuation
//!   and a penalty for symbol-heavy output
//! - **confidence quality**: a step function of the engine confidence
//! - **consistency**: whether the text length and the engine's own word count
//!   agree with what was actually recognized
//!
//! Assessment is a pure function of the [`OcrResult`].

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::types::{IssueKind, IssueSeverity, OcrResult, QualityAssessment, QualityIssue, QualityLevel};

const TEXT_WEIGHT: f64 = 0.4;
const CONFIDENCE_WEIGHT: f64 = 0.3;
const CONSISTENCY_WEIGHT: f64 = 0.3;

const BASE_SCORE: f64 = 0.5;
const MIN_SUBSTANTIAL_LENGTH: usize = 10;
const SUBSTANTIAL_TEXT_BONUS: f64 = 0.2;
const READABLE_TOKEN_BONUS: f64 = 0.3;
const PUNCTUATION_BONUS: f64 = 0.1;
const SPECIAL_CHAR_PENALTY: f64 = 0.2;
const SPECIAL_CHAR_PENALTY_RATIO: f64 = 0.3;

const MIN_READABLE_TOKEN_CHARS: usize = 2;
const MIN_READABLE_ALPHA_RATIO: f64 = 0.7;

const LENGTH_PROXY_TOLERANCE: f64 = 0.2;
const LENGTH_PROXY_BONUS: f64 = 0.3;
const WORD_COUNT_TOLERANCE: usize = 2;
const WORD_COUNT_BONUS: f64 = 0.2;

const BASIC_PUNCTUATION: &[char] = &['.', ',', ';', ':', '!', '?', '\'', '"', '-', '(', ')'];

static ISOLATED_LETTER_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b[A-Za-z][^A-Za-z\s]{2,}").expect("Isolated letter regex pattern is valid and should compile")
});
static DIGIT_LETTER_DIGIT_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\d[A-Za-z]\d").expect("Digit-letter-digit regex pattern is valid and should compile")
});
static SPECIAL_RUN_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"[^\p{Alphabetic}\p{N}\s.,;:!?'"()\-]{3,}"#)
        .expect("Special character run regex pattern is valid and should compile")
});

/// Tunable thresholds for issue detection and suggestions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QualityThresholds {
    /// Below this confidence a high-severity `low_confidence` issue is raised.
    pub low_confidence: f64,
    /// Below this many trimmed characters `insufficient_text` is raised.
    pub min_text_length: usize,
    /// Special-character ratio above which text is considered suspicious.
    pub suspicious_special_ratio: f64,
    /// Overall score below which a rescan is suggested.
    pub rescan_below: f64,
    /// Confidence below which preprocessing is suggested.
    pub preprocess_below: f64,
    /// Word count below which the input is flagged as too small.
    pub min_word_count: usize,
}

impl Default for QualityThresholds {
    fn default() -> Self {
        Self {
            low_confidence: 0.5,
            min_text_length: 5,
            suspicious_special_ratio: 0.2,
            rescan_below: 0.6,
            preprocess_below: 0.7,
            min_word_count: 10,
        }
    }
}

/// Scores [`OcrResult`]s and reports issues and suggestions.
///
/// # Example
///
/// ```rust
/// use docsift::text::quality::QualityAssessor;
/// use docsift::types::{OcrResult, QualityLevel};
///
/// let result = OcrResult::from_text("", 0.0);
/// let assessment = QualityAssessor::default().assess(&result);
/// assert_eq!(assessment.quality_level, QualityLevel::Poor);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct QualityAssessor {
    thresholds: QualityThresholds,
}

impl QualityAssessor {
    pub fn new(thresholds: QualityThresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &QualityThresholds {
        &self.thresholds
    }

    pub fn assess(&self, result: &OcrResult) -> QualityAssessment {
        let text_quality = text_quality_score(&result.text);
        let confidence_quality = confidence_quality_score(result.confidence);
        let consistency_quality = consistency_quality_score(result);

        let overall_quality = (TEXT_WEIGHT * text_quality
            + CONFIDENCE_WEIGHT * confidence_quality
            + CONSISTENCY_WEIGHT * consistency_quality)
            .clamp(0.0, 1.0);

        let suspicious = has_suspicious_patterns(&result.text, self.thresholds.suspicious_special_ratio);
        let issues = self.detect_issues(result, suspicious);
        let suggestions = self.suggestions(result, overall_quality, suspicious);

        QualityAssessment {
            overall_quality,
            quality_level: QualityLevel::from_score(overall_quality),
            text_quality,
            confidence_quality,
            consistency_quality,
            issues,
            suggestions,
        }
    }

    fn detect_issues(&self, result: &OcrResult, suspicious: bool) -> Vec<QualityIssue> {
        let mut issues = Vec::new();

        if result.confidence < self.thresholds.low_confidence {
            issues.push(QualityIssue {
                kind: IssueKind::LowConfidence,
                severity: IssueSeverity::High,
                description: format!(
                    "OCR confidence {:.2} is below {:.2}",
                    result.confidence, self.thresholds.low_confidence
                ),
                recommendation: "Route the document to manual review or rescan it".to_string(),
            });
        }

        let trimmed_len = result.text.trim().chars().count();
        if trimmed_len < self.thresholds.min_text_length {
            issues.push(QualityIssue {
                kind: IssueKind::InsufficientText,
                severity: IssueSeverity::Medium,
                description: format!("Only {} characters of text were recognized", trimmed_len),
                recommendation: "Check that the document contains text and the scan is not blank".to_string(),
            });
        }

        if suspicious {
            issues.push(QualityIssue {
                kind: IssueKind::SuspiciousPatterns,
                severity: IssueSeverity::Medium,
                description: "Text contains character sequences typical of recognition errors".to_string(),
                recommendation: "Proofread the extracted text against the original document".to_string(),
            });
        }

        issues
    }

    fn suggestions(&self, result: &OcrResult, overall_quality: f64, suspicious: bool) -> Vec<String> {
        let mut suggestions = Vec::new();

        if overall_quality < self.thresholds.rescan_below {
            suggestions.push("Rescan the document at a higher resolution (300 DPI or more)".to_string());
        }
        if result.confidence < self.thresholds.preprocess_below {
            suggestions
                .push("Preprocess the image (deskew, denoise, raise contrast) and check page orientation".to_string());
        }
        if result.word_count < self.thresholds.min_word_count {
            suggestions.push("Very little text was recognized; the input may be too small or unclear".to_string());
        }
        if suspicious {
            suggestions.push("Proofread numbers and identifiers, they are the most error-prone".to_string());
        }

        suggestions
    }
}

/// Assess with the default thresholds.
pub fn assess_quality(result: &OcrResult) -> QualityAssessment {
    QualityAssessor::default().assess(result)
}

#[inline]
fn is_special_char(c: char) -> bool {
    !c.is_alphanumeric() && !c.is_whitespace() && !BASIC_PUNCTUATION.contains(&c)
}

/// Share of characters that are neither alphanumeric, whitespace nor basic punctuation.
pub fn special_character_ratio(text: &str) -> f64 {
    let total = text.chars().count();
    if total == 0 {
        return 0.0;
    }
    let special = text.chars().filter(|&c| is_special_char(c)).count();
    special as f64 / total as f64
}

#[inline]
fn is_readable_token(token: &str) -> bool {
    let len = token.chars().count();
    if len < MIN_READABLE_TOKEN_CHARS {
        return false;
    }
    let alphabetic = token.chars().filter(|c| c.is_alphabetic()).count();
    alphabetic as f64 / len as f64 >= MIN_READABLE_ALPHA_RATIO
}

pub fn text_quality_score(text: &str) -> f64 {
    let mut score = BASE_SCORE;

    if text.trim().chars().count() > MIN_SUBSTANTIAL_LENGTH {
        score += SUBSTANTIAL_TEXT_BONUS;
    }

    let tokens: Vec<&str> = text.split_whitespace().collect();
    if !tokens.is_empty() {
        let readable = tokens.iter().filter(|token| is_readable_token(token)).count();
        score += READABLE_TOKEN_BONUS * (readable as f64 / tokens.len() as f64);
    }

    if text.contains(['.', '!', '?']) {
        score += PUNCTUATION_BONUS;
    }

    if special_character_ratio(text) > SPECIAL_CHAR_PENALTY_RATIO {
        score -= SPECIAL_CHAR_PENALTY;
    }

    score.clamp(0.0, 1.0)
}

pub fn confidence_quality_score(confidence: f64) -> f64 {
    if confidence >= 0.9 {
        1.0
    } else if confidence >= 0.7 {
        0.8
    } else if confidence >= 0.5 {
        0.6
    } else if confidence >= 0.3 {
        0.4
    } else {
        0.2
    }
}

pub fn consistency_quality_score(result: &OcrResult) -> f64 {
    let mut score = BASE_SCORE;

    let length_proxy = result.character_count as f64 / 1000.0;
    if (length_proxy - result.confidence).abs() < LENGTH_PROXY_TOLERANCE {
        score += LENGTH_PROXY_BONUS;
    }

    if let Some(reported) = result.reported_word_count
        && reported.abs_diff(result.word_count) <= WORD_COUNT_TOLERANCE
    {
        score += WORD_COUNT_BONUS;
    }

    score.clamp(0.0, 1.0)
}

pub fn has_suspicious_patterns(text: &str, special_ratio_threshold: f64) -> bool {
    ISOLATED_LETTER_PATTERN.is_match(text)
        || DIGIT_LETTER_DIGIT_PATTERN.is_match(text)
        || SPECIAL_RUN_PATTERN.is_match(text)
        || special_character_ratio(text) > special_ratio_threshold
}
