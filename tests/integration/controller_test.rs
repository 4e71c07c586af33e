//! State Controller Integration Tests
//!
//! Transitions of the analysis state machine, including reset and
//! supersession of an in-flight request.

use std::sync::Arc;
use std::time::Duration;

use gem_eye::services::analysis::NO_DATA_MESSAGE;
use gem_eye::{AnalysisClient, AnalysisController, AnalysisPhase, AnalysisState, ImagePayload};

use crate::common::{network_down, payload, text_response, MockLlmProvider, SAMPLE_JSON};

fn controller_with(mock: &Arc<MockLlmProvider>) -> Arc<AnalysisController> {
    Arc::new(AnalysisController::new(AnalysisClient::new(mock.clone())))
}

#[tokio::test]
async fn test_initial_state_is_idle() {
    let mock = Arc::new(MockLlmProvider::new(vec![]));
    let controller = controller_with(&mock);

    let state = controller.snapshot().await;
    assert_eq!(state, AnalysisState::default());
    assert_eq!(state.phase(), AnalysisPhase::Idle);
}

#[tokio::test]
async fn test_start_without_image_is_noop() {
    let mock = Arc::new(MockLlmProvider::new(vec![text_response(SAMPLE_JSON)]));
    let controller = controller_with(&mock);

    let state = controller.start_analysis().await;

    assert_eq!(state, AnalysisState::default());
    assert_eq!(controller.snapshot().await, AnalysisState::default());
    assert_eq!(mock.request_count(), 0);
}

#[tokio::test]
async fn test_success_populates_result() {
    let mock = Arc::new(MockLlmProvider::new(vec![text_response(SAMPLE_JSON)]));
    let controller = controller_with(&mock);

    controller.select_payload(payload()).await;
    assert_eq!(controller.snapshot().await.phase(), AnalysisPhase::Staged);

    let state = controller.start_analysis().await;
    assert!(!state.loading);
    assert!(state.error.is_none());
    assert_eq!(
        state.result.as_ref().map(|r| r.identification.primary.as_str()),
        Some("Colombian Emerald")
    );
    assert_eq!(state.phase(), AnalysisPhase::Resolved);
    assert_eq!(controller.snapshot().await, state);
}

#[tokio::test]
async fn test_network_failure_then_reset() {
    let mock = Arc::new(MockLlmProvider::new(vec![network_down()]));
    let controller = controller_with(&mock);

    controller.select_payload(payload()).await;
    let state = controller.start_analysis().await;

    assert!(!state.loading);
    assert!(state.result.is_none());
    let error = state.error.as_deref().unwrap();
    assert!(error.contains("network down"), "unexpected message: {}", error);
    assert_eq!(state.phase(), AnalysisPhase::Failed);

    controller.reset().await;
    assert_eq!(controller.snapshot().await, AnalysisState::default());
}

#[tokio::test]
async fn test_empty_response_sets_error() {
    let mock = Arc::new(MockLlmProvider::new(vec![text_response("  ")]));
    let controller = controller_with(&mock);

    controller.select_payload(payload()).await;
    let state = controller.start_analysis().await;

    assert_eq!(state.error.as_deref(), Some(NO_DATA_MESSAGE));
    assert!(state.result.is_none());
    assert!(!state.loading);
}

#[tokio::test]
async fn test_select_clears_previous_outcome() {
    let mock = Arc::new(MockLlmProvider::new(vec![network_down()]));
    let controller = controller_with(&mock);

    controller.select_payload(payload()).await;
    controller.start_analysis().await;
    assert_eq!(controller.snapshot().await.phase(), AnalysisPhase::Failed);

    let next = ImagePayload::parse("data:image/png;base64,iVBORw0KGgo=").unwrap();
    controller.select_payload(next.clone()).await;

    let state = controller.snapshot().await;
    assert_eq!(state.image, Some(next));
    assert!(state.error.is_none());
    assert!(state.result.is_none());
    assert_eq!(state.phase(), AnalysisPhase::Staged);
}

#[tokio::test]
async fn test_select_image_from_file() {
    let mock = Arc::new(MockLlmProvider::new(vec![]));
    let controller = controller_with(&mock);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("specimen.gif");
    std::fs::write(&path, b"GIF89a\x01\x00\x01\x00").unwrap();

    controller.select_image(&path).await.unwrap();
    let state = controller.snapshot().await;
    assert_eq!(state.image.map(|i| i.mime_type), Some("image/gif".to_string()));

    assert!(controller
        .select_image(&dir.path().join("missing.png"))
        .await
        .is_err());
}

#[tokio::test]
async fn test_reset_during_analysis_cancels_request() {
    let mock = Arc::new(MockLlmProvider::gated(vec![text_response(SAMPLE_JSON)]));
    let controller = controller_with(&mock);
    controller.select_payload(payload()).await;

    let task = tokio::spawn({
        let controller = controller.clone();
        async move { controller.start_analysis().await }
    });

    mock.started.notified().await;
    assert_eq!(controller.snapshot().await.phase(), AnalysisPhase::Analyzing);

    controller.reset().await;

    let state = tokio::time::timeout(Duration::from_secs(5), task)
        .await
        .expect("analysis did not stop after reset")
        .unwrap();
    assert_eq!(state, AnalysisState::default());
    assert!(!mock.is_completed());
    assert_eq!(controller.snapshot().await, AnalysisState::default());
}

#[tokio::test]
async fn test_second_start_while_loading_is_noop() {
    let mock = Arc::new(MockLlmProvider::gated(vec![text_response(SAMPLE_JSON)]));
    let controller = controller_with(&mock);
    controller.select_payload(payload()).await;

    let task = tokio::spawn({
        let controller = controller.clone();
        async move { controller.start_analysis().await }
    });
    mock.started.notified().await;

    let during = controller.start_analysis().await;
    assert!(during.loading);
    assert_eq!(mock.request_count(), 1);

    mock.release.notify_one();
    let state = task.await.unwrap();
    assert_eq!(state.phase(), AnalysisPhase::Resolved);
}

#[tokio::test]
async fn test_new_selection_supersedes_running_analysis() {
    let mock = Arc::new(MockLlmProvider::gated(vec![text_response(SAMPLE_JSON)]));
    let controller = controller_with(&mock);
    controller.select_payload(payload()).await;

    let task = tokio::spawn({
        let controller = controller.clone();
        async move { controller.start_analysis().await }
    });
    mock.started.notified().await;

    let next = ImagePayload::parse("data:image/png;base64,iVBORw0KGgo=").unwrap();
    controller.select_payload(next.clone()).await;

    let state = task.await.unwrap();
    assert_eq!(state.phase(), AnalysisPhase::Staged);
    assert_eq!(state.image, Some(next));
    assert!(state.result.is_none());
    assert!(!mock.is_completed());
}

async fn wait_for_phase(controller: &AnalysisController, phase: AnalysisPhase) -> AnalysisState {
    for _ in 0..200 {
        let state = controller.snapshot().await;
        if state.phase() == phase {
            return state;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("controller never reached {:?}", phase);
}

#[tokio::test]
async fn test_abandoned_start_still_settles() {
    let mock = Arc::new(MockLlmProvider::gated(vec![text_response(SAMPLE_JSON)]));
    let controller = controller_with(&mock);
    controller.select_payload(payload()).await;

    let abandoned =
        tokio::time::timeout(Duration::from_millis(50), controller.start_analysis()).await;
    assert!(abandoned.is_err());
    assert_eq!(controller.snapshot().await.phase(), AnalysisPhase::Analyzing);

    mock.release.notify_one();
    let state = wait_for_phase(&controller, AnalysisPhase::Resolved).await;
    assert_eq!(
        state.result.map(|r| r.identification.primary),
        Some("Colombian Emerald".to_string())
    );

    // The controller accepts a new run once the abandoned one settled
    mock.release.notify_one();
    let rerun = controller.start_analysis().await;
    assert_eq!(mock.request_count(), 2);
    assert_eq!(rerun.phase(), AnalysisPhase::Failed);
}

#[tokio::test]
async fn test_reset_from_resolved() {
    let mock = Arc::new(MockLlmProvider::new(vec![text_response(SAMPLE_JSON)]));
    let controller = controller_with(&mock);

    controller.select_payload(payload()).await;
    controller.start_analysis().await;
    assert_eq!(controller.snapshot().await.phase(), AnalysisPhase::Resolved);

    controller.reset().await;
    let state = controller.snapshot().await;
    assert_eq!(state, AnalysisState::default());
    assert_eq!(state.phase(), AnalysisPhase::Idle);
}

#[tokio::test]
async fn test_reset_from_staged() {
    let mock = Arc::new(MockLlmProvider::new(vec![]));
    let controller = controller_with(&mock);

    controller.select_payload(payload()).await;
    assert_eq!(controller.snapshot().await.phase(), AnalysisPhase::Staged);

    controller.reset().await;
    assert_eq!(controller.snapshot().await, AnalysisState::default());
    assert_eq!(mock.request_count(), 0);
}

#[tokio::test]
async fn test_select_after_success_clears_result() {
    let mock = Arc::new(MockLlmProvider::new(vec![text_response(SAMPLE_JSON)]));
    let controller = controller_with(&mock);

    controller.select_payload(payload()).await;
    let resolved = controller.start_analysis().await;
    assert!(resolved.result.is_some());

    let next = ImagePayload::parse("data:image/png;base64,iVBORw0KGgo=").unwrap();
    controller.select_payload(next.clone()).await;

    let state = controller.snapshot().await;
    assert_eq!(state.image, Some(next));
    assert!(state.result.is_none());
    assert!(state.error.is_none());
    assert!(!state.loading);
    assert_eq!(state.phase(), AnalysisPhase::Staged);
}
