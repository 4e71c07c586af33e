//! Shared test helpers: a scripted provider and a sample report document.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::Notify;

use gem_eye::ImagePayload;
use gem_eye_llm::{
    LlmError, LlmProvider, LlmRequestOptions, LlmResponse, LlmResult, Message, ProviderConfig,
    StopReason, UsageStats,
};

pub const SAMPLE_JSON: &str = r#"{
    "identification": {
        "primary": "Colombian Emerald",
        "origin": "Muzo, Colombia",
        "confidence": 71.5,
        "features": ["Jardin inclusions", "Three-phase inclusions", "Bluish-green hue", "Step cut"],
        "simulants": ["Green glass", "Tsavorite garnet"]
    },
    "visualEvaluation": {
        "color": "Vivid bluish green, medium-dark tone",
        "clarity": "Moderately included, typical for the species",
        "cut": "Emerald step cut with slight window"
    },
    "valuation": {
        "priceRange": "$3,000 - $8,000 per carat",
        "factors": "Oil treatment level and Muzo provenance dominate pricing"
    },
    "recommendations": ["Chelsea filter test", "Microscopy for clarity enhancement"],
    "warnings": ["Cannot distinguish natural from hydrothermal synthetic from a photo"]
}"#;

pub fn text_response(text: &str) -> LlmResult<LlmResponse> {
    Ok(LlmResponse {
        content: Some(text.to_string()),
        stop_reason: StopReason::EndTurn,
        usage: UsageStats {
            input_tokens: 1200,
            output_tokens: 350,
            thinking_tokens: None,
        },
        model: "mock-model".to_string(),
    })
}

pub fn network_down() -> LlmResult<LlmResponse> {
    Err(LlmError::NetworkError {
        message: "network down".to_string(),
    })
}

pub fn payload() -> ImagePayload {
    ImagePayload::parse("data:image/jpeg;base64,/9j/4AAQSkZJRg==").unwrap()
}

/// Provider returning scripted responses in order.
///
/// When gated, each call signals `started` and then waits for `release`.
pub struct MockLlmProvider {
    config: ProviderConfig,
    responses: Mutex<Vec<LlmResult<LlmResponse>>>,
    pub requests: Mutex<Vec<Vec<Message>>>,
    gated: bool,
    pub started: Notify,
    pub release: Notify,
    pub completed: AtomicBool,
}

impl MockLlmProvider {
    pub fn new(responses: Vec<LlmResult<LlmResponse>>) -> Self {
        Self {
            config: ProviderConfig::default(),
            responses: Mutex::new(responses),
            requests: Mutex::new(Vec::new()),
            gated: false,
            started: Notify::new(),
            release: Notify::new(),
            completed: AtomicBool::new(false),
        }
    }

    pub fn gated(responses: Vec<LlmResult<LlmResponse>>) -> Self {
        Self {
            gated: true,
            ..Self::new(responses)
        }
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn is_completed(&self) -> bool {
        self.completed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LlmProvider for MockLlmProvider {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn model(&self) -> &str {
        "mock-model"
    }

    fn supports_multimodal(&self) -> bool {
        true
    }

    fn config(&self) -> &ProviderConfig {
        &self.config
    }

    async fn send_message(
        &self,
        messages: Vec<Message>,
        _system: Option<String>,
        _request_options: LlmRequestOptions,
    ) -> LlmResult<LlmResponse> {
        self.requests.lock().unwrap().push(messages);

        if self.gated {
            self.started.notify_one();
            self.release.notified().await;
        }

        let next = {
            let mut responses = self.responses.lock().unwrap();
            if responses.is_empty() {
                Err(LlmError::Other {
                    message: "No more mock responses available".to_string(),
                })
            } else {
                responses.remove(0)
            }
        };
        self.completed.store(true, Ordering::SeqCst);
        next
    }

    async fn health_check(&self) -> LlmResult<()> {
        Ok(())
    }
}
