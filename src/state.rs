//! Application State
//!
//! The analysis state machine and the controller that owns it. All mutation
//! goes through [`AnalysisController`]; readers get snapshots.

use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::models::report::AnalysisReport;
use crate::services::analysis::AnalysisClient;
use crate::services::image::ImagePayload;
use crate::utils::error::{AppError, AppResult};

/// Message stored when a failure carries no text of its own
pub const DEFAULT_ERROR_MESSAGE: &str = "An unexpected error occurred during analysis.";

/// Observable state of one analysis session
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AnalysisState {
    pub loading: bool,
    #[serde(skip)]
    pub image: Option<ImagePayload>,
    pub result: Option<AnalysisReport>,
    pub error: Option<String>,
}

/// Coarse phase derived from [`AnalysisState`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisPhase {
    /// No image selected
    Idle,
    /// Image present, nothing run yet
    Staged,
    Analyzing,
    Resolved,
    Failed,
}

impl AnalysisState {
    pub fn phase(&self) -> AnalysisPhase {
        if self.loading {
            AnalysisPhase::Analyzing
        } else if self.error.is_some() {
            AnalysisPhase::Failed
        } else if self.result.is_some() {
            AnalysisPhase::Resolved
        } else if self.image.is_some() {
            AnalysisPhase::Staged
        } else {
            AnalysisPhase::Idle
        }
    }
}

struct Inner {
    state: AnalysisState,
    /// Bumped whenever an in-flight analysis is superseded
    generation: u64,
    cancel: Option<CancellationToken>,
}

impl Inner {
    fn abort_inflight(&mut self) {
        if let Some(token) = self.cancel.take() {
            token.cancel();
            info!(generation = self.generation, "in-flight analysis cancelled");
        }
        self.generation += 1;
    }
}

/// Owns the analysis state and drives its transitions
///
/// The request runs on its own task, so the state settles even when the
/// caller of [`AnalysisController::start_analysis`] stops waiting.
pub struct AnalysisController {
    client: AnalysisClient,
    inner: Arc<RwLock<Inner>>,
}

impl AnalysisController {
    pub fn new(client: AnalysisClient) -> Self {
        Self {
            client,
            inner: Arc::new(RwLock::new(Inner {
                state: AnalysisState::default(),
                generation: 0,
                cancel: None,
            })),
        }
    }

    /// Copy of the current state
    pub async fn snapshot(&self) -> AnalysisState {
        self.inner.read().await.state.clone()
    }

    /// Read an image file and stage it
    pub async fn select_image(&self, path: &Path) -> AppResult<()> {
        let payload = ImagePayload::from_file(path).await?;
        self.select_payload(payload).await;
        Ok(())
    }

    /// Stage an already-encoded image, clearing any previous outcome.
    ///
    /// An analysis still running for the previous image is cancelled.
    pub async fn select_payload(&self, payload: ImagePayload) {
        let mut inner = self.inner.write().await;
        if inner.state.loading {
            inner.abort_inflight();
        }
        debug!(payload = ?payload, "image selected");
        inner.state = AnalysisState {
            image: Some(payload),
            ..AnalysisState::default()
        };
    }

    /// Analyze the staged image and return the resulting state.
    ///
    /// Does nothing without an image or while an analysis is already running.
    pub async fn start_analysis(&self) -> AnalysisState {
        let (image, generation, token) = {
            let mut inner = self.inner.write().await;
            let image = match (&inner.state.image, inner.state.loading) {
                (Some(image), false) => image.clone(),
                (None, _) => {
                    debug!("start_analysis ignored: no image selected");
                    return inner.state.clone();
                }
                (Some(_), true) => {
                    debug!("start_analysis ignored: analysis already running");
                    return inner.state.clone();
                }
            };

            let token = CancellationToken::new();
            inner.cancel = Some(token.clone());
            inner.state.loading = true;
            inner.state.error = None;
            inner.state.result = None;
            info!(generation = inner.generation, "analysis started");
            (image, inner.generation, token)
        };

        let client = self.client.clone();
        let shared = Arc::clone(&self.inner);
        let task = tokio::spawn(async move {
            let outcome = tokio::select! {
                _ = token.cancelled() => Err(AppError::Cancelled),
                outcome = client.analyze(&image) => outcome,
            };
            settle(&shared, generation, outcome).await
        });

        match task.await {
            Ok(state) => state,
            Err(err) => {
                let outcome = Err(AppError::service(format!("analysis task failed: {}", err)));
                settle(&self.inner, generation, outcome).await
            }
        }
    }

    /// Return to the initial state, cancelling any running analysis
    pub async fn reset(&self) {
        let mut inner = self.inner.write().await;
        inner.abort_inflight();
        inner.state = AnalysisState::default();
        debug!("state reset");
    }
}

/// Record the outcome of the analysis started at `generation`, unless it was superseded
async fn settle(
    inner: &RwLock<Inner>,
    generation: u64,
    outcome: AppResult<AnalysisReport>,
) -> AnalysisState {
    let mut inner = inner.write().await;
    if inner.generation != generation {
        debug!(generation, "discarding result of superseded analysis");
        return inner.state.clone();
    }

    inner.cancel = None;
    inner.state.loading = false;
    match outcome {
        Ok(report) => {
            info!(primary = %report.identification.primary, "analysis resolved");
            inner.state.result = Some(report);
        }
        Err(err) => {
            warn!(error = %err, "analysis failed");
            inner.state.error = Some(failure_message(&err));
        }
    }
    inner.state.clone()
}

fn failure_message(err: &AppError) -> String {
    let message = err.to_string();
    if message.trim().is_empty() {
        DEFAULT_ERROR_MESSAGE.to_string()
    } else {
        message
    }
}
