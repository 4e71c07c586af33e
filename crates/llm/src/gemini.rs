//! Gemini Provider
//!
//! Implementation of the LlmProvider trait for Google's Gemini
//! `generateContent` REST API. Supports inline images and server-side
//! response schemas.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::http_client::build_http_client;
use super::provider::{missing_api_key_error, parse_http_error, LlmProvider};
use super::types::{
    LlmError, LlmRequestOptions, LlmResponse, LlmResult, Message, MessageContent, MessageRole,
    ParameterSchema, ProviderConfig, ResponseFormat, StopReason, UsageStats,
};

/// Default Gemini API endpoint
const GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Header carrying the API key
const API_KEY_HEADER: &str = "x-goog-api-key";

/// Gemini provider
pub struct GeminiProvider {
    config: ProviderConfig,
    client: reqwest::Client,
}

impl GeminiProvider {
    /// Create a new Gemini provider with a direct (unproxied) HTTP client
    pub fn new(config: ProviderConfig) -> LlmResult<Self> {
        Ok(Self::with_client(config, build_http_client(None)?))
    }

    /// Create a provider that reuses an existing HTTP client
    pub fn with_client(config: ProviderConfig, client: reqwest::Client) -> Self {
        Self { config, client }
    }

    /// Get the API base URL
    fn base_url(&self) -> &str {
        self.config
            .base_url
            .as_deref()
            .unwrap_or(GEMINI_API_URL)
            .trim_end_matches('/')
    }

    /// Model name without the `models/` resource prefix
    fn model_id(&self) -> &str {
        self.config
            .model
            .strip_prefix("models/")
            .unwrap_or(self.config.model.as_str())
    }

    fn generate_url(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url(), self.model_id())
    }

    fn api_key(&self) -> LlmResult<&str> {
        self.config
            .api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| missing_api_key_error("gemini"))
    }

    /// Build the request body for the API
    fn build_request_body(
        &self,
        messages: &[Message],
        system: Option<&str>,
        options: &LlmRequestOptions,
    ) -> GenerateContentRequest {
        let contents = messages.iter().map(message_to_gemini).collect();

        let system_instruction = system.map(|text| Content {
            role: None,
            parts: vec![Part::Text {
                text: text.to_string(),
            }],
        });

        let (response_mime_type, response_schema) = match &options.response_format {
            ResponseFormat::Text => (None, None),
            ResponseFormat::Json { schema } => (
                Some("application/json".to_string()),
                schema.as_ref().map(schema_to_gemini),
            ),
        };

        GenerateContentRequest {
            contents,
            system_instruction,
            generation_config: GenerationConfig {
                temperature: Some(self.config.temperature),
                max_output_tokens: Some(self.config.max_tokens),
                response_mime_type,
                response_schema,
            },
        }
    }

    /// Parse a response from the Gemini API
    fn parse_response(&self, response: GenerateContentResponse) -> LlmResult<LlmResponse> {
        let candidate = match response.candidates.into_iter().next() {
            Some(candidate) => candidate,
            None => {
                if let Some(reason) = response
                    .prompt_feedback
                    .and_then(|feedback| feedback.block_reason)
                {
                    return Err(LlmError::ContentBlocked { reason });
                }
                return Ok(LlmResponse {
                    content: None,
                    stop_reason: StopReason::EndTurn,
                    usage: usage_from_metadata(response.usage_metadata),
                    model: response
                        .model_version
                        .unwrap_or_else(|| self.config.model.clone()),
                });
            }
        };

        let text: String = candidate
            .content
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter(|part| !part.thought.unwrap_or(false))
                    .filter_map(|part| part.text)
                    .collect()
            })
            .unwrap_or_default();

        let stop_reason = candidate
            .finish_reason
            .as_deref()
            .map(StopReason::from)
            .unwrap_or(StopReason::EndTurn);

        Ok(LlmResponse {
            content: if text.is_empty() { None } else { Some(text) },
            stop_reason,
            usage: usage_from_metadata(response.usage_metadata),
            model: response
                .model_version
                .unwrap_or_else(|| self.config.model.clone()),
        })
    }
}

/// Convert a Message to Gemini `Content`
fn message_to_gemini(message: &Message) -> Content {
    let role = match message.role {
        MessageRole::User => "user",
        MessageRole::Assistant => "model",
    };

    let parts = message
        .content
        .iter()
        .map(|content| match content {
            MessageContent::Text { text } => Part::Text { text: text.clone() },
            MessageContent::Image { media_type, data } => Part::InlineData {
                inline_data: InlineData {
                    mime_type: media_type.clone(),
                    data: data.clone(),
                },
            },
        })
        .collect();

    Content {
        role: Some(role.to_string()),
        parts,
    }
}

/// Convert a ParameterSchema into Gemini's OpenAPI-subset schema (upper-case type names)
fn schema_to_gemini(schema: &ParameterSchema) -> serde_json::Value {
    let mut value = serde_json::json!({
        "type": schema.schema_type.to_uppercase(),
    });

    if let Some(description) = &schema.description {
        value["description"] = serde_json::json!(description);
    }

    if let Some(properties) = &schema.properties {
        let converted: serde_json::Map<String, serde_json::Value> = properties
            .iter()
            .map(|(name, prop)| (name.clone(), schema_to_gemini(prop)))
            .collect();
        value["properties"] = serde_json::Value::Object(converted);
    }

    if let Some(required) = &schema.required {
        value["required"] = serde_json::json!(required);
    }

    if let Some(items) = &schema.items {
        value["items"] = schema_to_gemini(items);
    }

    value
}

fn usage_from_metadata(metadata: Option<UsageMetadata>) -> UsageStats {
    metadata
        .map(|u| UsageStats {
            input_tokens: u.prompt_token_count.unwrap_or(0),
            output_tokens: u.candidates_token_count.unwrap_or(0),
            thinking_tokens: u.thoughts_token_count,
        })
        .unwrap_or_default()
}

/// Pull `error.message` out of a Google API error envelope, falling back to the raw body
fn extract_error_message(body: &str) -> String {
    serde_json::from_str::<ErrorEnvelope>(body)
        .ok()
        .and_then(|envelope| envelope.error.message)
        .unwrap_or_else(|| body.to_string())
}

#[async_trait]
impl LlmProvider for GeminiProvider {
    fn name(&self) -> &'static str {
        "gemini"
    }

    fn model(&self) -> &str {
        &self.config.model
    }

    fn supports_multimodal(&self) -> bool {
        true
    }

    fn supports_structured_output(&self) -> bool {
        true
    }

    async fn send_message(
        &self,
        messages: Vec<Message>,
        system: Option<String>,
        request_options: LlmRequestOptions,
    ) -> LlmResult<LlmResponse> {
        let api_key = self.api_key()?;
        let body = self.build_request_body(&messages, system.as_deref(), &request_options);

        debug!(
            model = %self.model_id(),
            messages = messages.len(),
            images = messages.iter().filter(|m| m.has_image()).count(),
            "gemini: sending generateContent request"
        );

        let response = self
            .client
            .post(self.generate_url())
            .header(API_KEY_HEADER, api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::NetworkError {
                message: e.to_string(),
            })?;

        let status = response.status().as_u16();
        let body_text = response.text().await.map_err(|e| LlmError::NetworkError {
            message: e.to_string(),
        })?;

        if status != 200 {
            warn!(status, "gemini: generateContent returned an error status");
            return Err(parse_http_error(
                status,
                &extract_error_message(&body_text),
                "gemini",
            ));
        }

        let gemini_response: GenerateContentResponse =
            serde_json::from_str(&body_text).map_err(|e| LlmError::ParseError {
                message: format!("Failed to parse response: {}", e),
            })?;

        self.parse_response(gemini_response)
    }

    async fn health_check(&self) -> LlmResult<()> {
        let api_key = self.api_key()?;

        let response = self
            .client
            .get(format!("{}/models", self.base_url()))
            .query(&[("pageSize", "1")])
            .header(API_KEY_HEADER, api_key)
            .send()
            .await
            .map_err(|e| LlmError::NetworkError {
                message: e.to_string(),
            })?;

        let status = response.status().as_u16();
        if status == 200 {
            Ok(())
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(parse_http_error(
                status,
                &extract_error_message(&body),
                "gemini",
            ))
        }
    }

    fn config(&self) -> &ProviderConfig {
        &self.config
    }

    async fn list_models(&self) -> LlmResult<Option<Vec<String>>> {
        let api_key = self.api_key()?;

        let response = self
            .client
            .get(format!("{}/models", self.base_url()))
            .query(&[("pageSize", "1000")])
            .header(API_KEY_HEADER, api_key)
            .send()
            .await
            .map_err(|e| LlmError::NetworkError {
                message: e.to_string(),
            })?;

        let status = response.status().as_u16();
        if status != 200 {
            let body = response.text().await.unwrap_or_default();
            return Err(parse_http_error(
                status,
                &extract_error_message(&body),
                "gemini",
            ));
        }

        let body: ModelList = response.json().await.map_err(|e| LlmError::ParseError {
            message: e.to_string(),
        })?;

        Ok(Some(generation_models(body)))
    }
}

/// Names of models that accept `generateContent`, without the resource prefix
fn generation_models(list: ModelList) -> Vec<String> {
    list.models
        .into_iter()
        .filter(|m| {
            m.supported_generation_methods
                .iter()
                .any(|method| method == "generateContent")
        })
        .map(|m| {
            m.name
                .strip_prefix("models/")
                .map(|s| s.to_string())
                .unwrap_or(m.name)
        })
        .collect()
}

/// Gemini `generateContent` request body
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    generation_config: GenerationConfig,
}

/// Content container used in requests
#[derive(Debug, Serialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    parts: Vec<Part>,
}

/// Untagged union of text and inline media parts
#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Part {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
}

/// Base64 inline payload for image requests
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_schema: Option<serde_json::Value>,
}

/// Gemini API response format
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
    #[serde(default)]
    usage_metadata: Option<UsageMetadata>,
    #[serde(default)]
    model_version: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<ResponseContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    thought: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: Option<u32>,
    #[serde(default)]
    candidates_token_count: Option<u32>,
    #[serde(default)]
    thoughts_token_count: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ModelList {
    #[serde(default)]
    models: Vec<ModelInfo>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ModelInfo {
    name: String,
    #[serde(default)]
    supported_generation_methods: Vec<String>,
}
