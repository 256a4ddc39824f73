//! Quality assessment through the public API and through the pipeline.

use docsift::text::quality::{QualityAssessor, QualityThresholds, assess_quality};
use docsift::types::{IssueKind, IssueSeverity, OcrResult, ProcessingOptions, QualityLevel, RecognitionOutput};
use docsift::OcrPipeline;

mod helpers;

use helpers::{MockEngine, Script};

#[test]
fn test_empty_result_is_poor() {
    let assessment = assess_quality(&OcrResult::from_text("", 0.0));

    assert_eq!(assessment.quality_level, QualityLevel::Poor);
    assert!((assessment.overall_quality - 0.5).abs() < 1e-9);

    let issue = assessment.issue(IssueKind::InsufficientText).unwrap();
    assert_eq!(issue.severity, IssueSeverity::Medium);
    assert!(assessment.has_issue(IssueKind::LowConfidence));
    assert!(!assessment.suggestions.is_empty());
}

#[test]
fn test_clean_prose_scores_excellent() {
    let text = "The quick brown fox jumps over the lazy dog. ".repeat(20);
    let mut output = RecognitionOutput::new(text, 0.95);
    output.reported_word_count = Some(181);
    let assessment = assess_quality(&OcrResult::from_recognition(output));

    assert_eq!(assessment.quality_level, QualityLevel::Excellent);
    assert!(assessment.issues.is_empty());
    assert!(assessment.suggestions.is_empty());
}

#[test]
fn test_scores_stay_in_unit_interval() {
    let samples = [
        ("", 0.0),
        ("@@@@ #### $$$$ %%%%", 0.1),
        ("Tota1 4O5 amount", 0.4),
        ("Plain sentence with enough words to count.", 0.75),
        ("x", 1.0),
    ];

    for (text, confidence) in samples {
        let assessment = assess_quality(&OcrResult::from_text(text, confidence));
        for score in [
            assessment.overall_quality,
            assessment.text_quality,
            assessment.confidence_quality,
            assessment.consistency_quality,
        ] {
            assert!((0.0..=1.0).contains(&score), "{text:?}: {score}");
        }
    }
}

#[test]
fn test_symbol_noise_is_flagged() {
    let assessment = assess_quality(&OcrResult::from_text("@@@@ #### $$$$ %%%%", 0.95));

    assert!(assessment.has_issue(IssueKind::SuspiciousPatterns));
    assert!(
        assessment
            .suggestions
            .iter()
            .any(|s| s.to_lowercase().contains("proofread"))
    );
}

#[test]
fn test_custom_thresholds() {
    let strict = QualityAssessor::new(QualityThresholds {
        low_confidence: 0.95,
        ..Default::default()
    });
    let result = OcrResult::from_text("Confident but not confident enough.", 0.9);

    assert!(strict.assess(&result).has_issue(IssueKind::LowConfidence));
    assert!(!assess_quality(&result).has_issue(IssueKind::LowConfidence));
}

#[test]
fn test_assessment_is_deterministic() {
    let result = OcrResult::from_text("Receipt total 12.50, thank you!", 0.81);
    assert_eq!(assess_quality(&result), assess_quality(&result));
}

#[tokio::test]
async fn test_pipeline_reports_low_confidence_as_issue_not_error() {
    let engine = MockEngine::new()
        .script("blurry", Script::text("blurry scan text").with_confidence(0.3))
        .shared();
    let pipeline = OcrPipeline::new(engine);

    let analysis = pipeline
        .extract_structured_data(b"blurry", "image/tiff", &ProcessingOptions::new(), None)
        .await
        .unwrap();

    let issue = analysis.quality.issue(IssueKind::LowConfidence).unwrap();
    assert_eq!(issue.severity, IssueSeverity::High);
    assert_eq!(analysis.quality.confidence_quality, 0.4);
}

#[tokio::test]
async fn test_percentage_confidence_is_rescaled() {
    let engine = MockEngine::new()
        .script("pct", Script::text("Scanned letter body.").with_confidence(87.0))
        .shared();
    let pipeline = OcrPipeline::new(engine);

    let result = pipeline
        .extract_text(b"pct", "image/bmp", &ProcessingOptions::new())
        .await
        .unwrap();

    assert!((result.confidence - 0.87).abs() < 1e-9);
}
