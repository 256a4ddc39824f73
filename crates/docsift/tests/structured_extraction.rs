//! Field extraction tests across document types.

use docsift::extraction::{classify_document, extract_structured};
use docsift::types::{DocumentType, FieldValue, OcrResult, PatternKind};

mod helpers;

use helpers::INVOICE_TEXT;

fn ocr(text: &str) -> OcrResult {
    OcrResult::from_text(text, 0.9)
}

#[test]
fn test_invoice_example() {
    let result = ocr(INVOICE_TEXT);
    let extraction = extract_structured(&result, Some("invoice"));

    assert_eq!(extraction.document_type, DocumentType::Invoice);

    let number = extraction.field("invoice_number").unwrap();
    assert_eq!(number.value, FieldValue::Text("INV-2024-001".to_string()));
    assert_eq!(number.pattern_kind, PatternKind::Identifier);
    assert!(number.confidence >= 0.85);

    let total = extraction.field("total_amount").unwrap();
    assert_eq!(total.value, FieldValue::Amount(450.0));
    assert!(total.confidence >= 0.85);

    let date = extraction.field("invoice_date").unwrap();
    assert_eq!(date.value, FieldValue::Text("01/15/2024".to_string()));
    assert!(date.confidence >= 0.85);
}

#[test]
fn test_invoice_classified_without_hint() {
    let extraction = extract_structured(&ocr(INVOICE_TEXT), None);
    assert_eq!(extraction.document_type, DocumentType::Invoice);
    assert_eq!(extraction.summary.field_count, 3);
}

#[test]
fn test_receipt_fields() {
    let text = "CORNER MARKET\nRECEIPT\nSubtotal: $10.00\nTax (8%): $0.80\nTotal: $10.80\n03/14/2024\nThank you!";
    let extraction = extract_structured(&ocr(text), None);

    assert_eq!(extraction.document_type, DocumentType::Receipt);
    assert_eq!(extraction.field("total").unwrap().value.as_amount(), Some(10.8));
    assert_eq!(extraction.field("tax").unwrap().value.as_amount(), Some(0.8));
    assert_eq!(extraction.field("date").unwrap().value.as_text(), Some("03/14/2024"));
}

#[test]
fn test_form_fields() {
    let text = "Membership Application Form\nName: Jane Doe\nEmail: jane.doe@example.com\nPhone: (555) 123-4567\nSignature: ________";
    let extraction = extract_structured(&ocr(text), None);

    assert_eq!(extraction.document_type, DocumentType::Form);
    assert_eq!(extraction.field("name").unwrap().value.as_text(), Some("Jane Doe"));

    let email = extraction.field("email").unwrap();
    assert_eq!(email.value.as_text(), Some("jane.doe@example.com"));
    assert_eq!(email.confidence, 0.95);

    let phone = extraction.field("phone").unwrap();
    assert_eq!(phone.value.as_text(), Some("(555) 123-4567"));
    assert_eq!(phone.confidence, 0.85);
}

#[test]
fn test_generic_lists() {
    let text = "Contact info@example.com or sales@example.org.\n\
                Call (555) 123-4567 or 555-987-6543.\n\
                Visit https://example.com/docs. Office: 123 Main St, Springfield, IL 62704.\n\
                Meeting on 2024-03-15 costs $1,250.00.";
    let result = ocr(text);
    let extraction = extract_structured(&result, None);

    assert_eq!(extraction.document_type, DocumentType::Generic);

    let names: Vec<&str> = extraction.fields.keys().map(String::as_str).collect();
    assert_eq!(
        names,
        vec!["email_list", "phone_list", "date_list", "currency_list", "zip_code_list", "url_list"]
    );

    let phones = extraction.field("phone_list").unwrap();
    assert_eq!(phones.match_count, 2);
    assert_eq!(
        phones.value.as_list().unwrap(),
        &["(555) 123-4567".to_string(), "555-987-6543".to_string()]
    );

    let urls = extraction.field("url_list").unwrap();
    assert_eq!(urls.value.as_list().unwrap(), &["https://example.com/docs".to_string()]);

    let zips = extraction.field("zip_code_list").unwrap();
    assert_eq!(zips.value.as_list().unwrap(), &["62704".to_string()]);

    let currency = extraction.field("currency_list").unwrap();
    assert_eq!(currency.value.as_list().unwrap(), &["$1,250.00".to_string()]);
}

#[test]
fn test_spans_point_into_source_text() {
    let result = ocr(INVOICE_TEXT);
    let extraction = extract_structured(&result, None);

    let number = extraction.field("invoice_number").unwrap();
    assert_eq!(number.source_span.text_in(&result.text), "INV-2024-001");
    let date = extraction.field("invoice_date").unwrap();
    assert_eq!(date.source_span.text_in(&result.text), "01/15/2024");
}

#[test]
fn test_spans_are_character_offsets_in_non_ascii_text() {
    let result = ocr("Müller & Söhne GmbH\nRechnung für Café Zoë\nInvoice #RE-77\nTotal: €1.250,00\nDate: 02/03/2024");
    let extraction = extract_structured(&result, None);
    assert_eq!(extraction.document_type, DocumentType::Invoice);

    let number = extraction.field("invoice_number").unwrap();
    let chars: Vec<char> = result.text.chars().collect();
    let byte_start = result.text.find("RE-77").unwrap();
    let char_start = result.text[..byte_start].chars().count();
    assert!(byte_start > char_start);
    assert_eq!(number.source_span.start, char_start);
    assert_eq!(number.source_span.end, char_start + 5);
    assert_eq!(chars[number.source_span.start..number.source_span.end].iter().collect::<String>(), "RE-77");

    let date = extraction.field("invoice_date").unwrap();
    assert_eq!(date.source_span.text_in(&result.text), "02/03/2024");
}

#[test]
fn test_extraction_is_idempotent() {
    let result = ocr("Invoice No. 991\nBill To: ACME\nAmount Due: $1,200.00\nTotal: $1,200.00");
    let first = extract_structured(&result, None);
    let second = extract_structured(&result, None);
    assert_eq!(first, second);
    assert_eq!(first.extracted_at, result.recognized_at);
}

#[test]
fn test_confidences_are_bounded() {
    let long_value = format!("Name: {}", "a".repeat(150));
    let texts = [
        INVOICE_TEXT,
        "Invoice #7\nTotal: 5",
        "Form\nName: Q\nEmail: not-an-email",
        long_value.as_str(),
        "nothing to see here",
        "",
    ];

    for text in texts {
        let extraction = extract_structured(&ocr(text), None);
        for field in extraction.fields.values() {
            assert!((0.0..=1.0).contains(&field.confidence), "{}: {}", field.name, field.confidence);
        }
        assert!((0.0..=1.0).contains(&extraction.summary.mean_confidence));
    }
}

#[test]
fn test_short_values_are_penalized() {
    let extraction = extract_structured(&ocr("Invoice #7\nTotal: 5"), None);
    let number = extraction.field("invoice_number").unwrap();
    assert_eq!(number.value.as_text(), Some("7"));
    assert!(number.confidence < 0.5);
}

#[test]
fn test_unknown_hint_falls_back_to_classification() {
    let extraction = extract_structured(&ocr(INVOICE_TEXT), Some("purchase-order"));
    assert_eq!(extraction.document_type, DocumentType::Invoice);
}

#[test]
fn test_hint_overrides_keywords() {
    let extraction = extract_structured(&ocr(INVOICE_TEXT), Some("generic"));
    assert_eq!(extraction.document_type, DocumentType::Generic);
    assert!(extraction.field("invoice_number").is_none());
    assert!(extraction.field("date_list").is_some());
}

#[test]
fn test_empty_text_yields_no_fields() {
    let extraction = extract_structured(&ocr(""), None);
    assert_eq!(classify_document(""), DocumentType::Generic);
    assert!(extraction.fields.is_empty());
    assert_eq!(extraction.summary.field_count, 0);
    assert_eq!(extraction.summary.mean_confidence, 0.0);
}
