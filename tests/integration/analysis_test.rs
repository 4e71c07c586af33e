//! Analysis Client Integration Tests
//!
//! Request construction and response parsing against a scripted provider.

use std::sync::Arc;

use gem_eye::services::analysis::{AnalysisClient, NO_DATA_MESSAGE, USER_PROMPT};
use gem_eye::{AnalysisReport, AppError};
use gem_eye_llm::MessageContent;

use crate::common::{network_down, payload, text_response, MockLlmProvider, SAMPLE_JSON};

#[tokio::test]
async fn test_report_fields_match_document_exactly() {
    let mock = Arc::new(MockLlmProvider::new(vec![text_response(SAMPLE_JSON)]));
    let client = AnalysisClient::new(mock.clone());

    let report = client.analyze(&payload()).await.unwrap();

    let expected: serde_json::Value = serde_json::from_str(SAMPLE_JSON).unwrap();
    assert_eq!(serde_json::to_value(&report).unwrap(), expected);

    let direct: AnalysisReport = serde_json::from_str(SAMPLE_JSON).unwrap();
    assert_eq!(report, direct);
    assert_eq!(report.identification.confidence_value(), 71.5);
    assert_eq!(report.confidence_label(), "Moderate");
}

#[tokio::test]
async fn test_integer_confidence_is_not_rewritten() {
    let document = SAMPLE_JSON.replace("\"confidence\": 71.5", "\"confidence\": 82");
    let mock = Arc::new(MockLlmProvider::new(vec![text_response(&document)]));
    let client = AnalysisClient::new(mock);

    let report = client.analyze(&payload()).await.unwrap();

    let expected: serde_json::Value = serde_json::from_str(&document).unwrap();
    let actual = serde_json::to_value(&report).unwrap();
    assert_eq!(actual["identification"]["confidence"].to_string(), "82");
    assert_eq!(actual, expected);
}

#[tokio::test]
async fn test_request_carries_prompt_and_stripped_image() {
    let mock = Arc::new(MockLlmProvider::new(vec![text_response(SAMPLE_JSON)]));
    let client = AnalysisClient::new(mock.clone());

    client.analyze(&payload()).await.unwrap();

    let requests = mock.requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    let parts = &requests[0][0].content;
    assert_eq!(parts.len(), 2);
    assert!(matches!(&parts[0], MessageContent::Text { text } if text == USER_PROMPT));
    match &parts[1] {
        MessageContent::Image { media_type, data } => {
            assert_eq!(media_type, "image/jpeg");
            assert_eq!(data, "/9j/4AAQSkZJRg==");
        }
        other => panic!("expected image part, got {:?}", other),
    }
}

#[tokio::test]
async fn test_empty_text_fails_with_no_data_message() {
    let client = AnalysisClient::new(Arc::new(MockLlmProvider::new(vec![text_response("")])));

    let err = client.analyze(&payload()).await.unwrap_err();
    assert_eq!(err.to_string(), NO_DATA_MESSAGE);
}

#[tokio::test]
async fn test_wrong_shape_is_schema_error() {
    let client = AnalysisClient::new(Arc::new(MockLlmProvider::new(vec![text_response(
        r#"{"identification": {"primary": "Quartz"}}"#,
    )])));

    let err = client.analyze(&payload()).await.unwrap_err();
    assert!(matches!(err, AppError::Schema(_)));
}

#[tokio::test]
async fn test_no_retry_after_failure() {
    let mock = Arc::new(MockLlmProvider::new(vec![
        network_down(),
        text_response(SAMPLE_JSON),
    ]));
    let client = AnalysisClient::new(mock.clone());

    assert!(client.analyze(&payload()).await.is_err());
    assert_eq!(mock.request_count(), 1);
}
