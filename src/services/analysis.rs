//! Analysis Client
//!
//! Builds the single multimodal request for a gemstone photo, constrains the
//! response to the report schema, and parses the answer into an
//! [`AnalysisReport`].

use std::sync::Arc;

use gem_eye_llm::{LlmProvider, LlmRequestOptions, LlmResponse, Message, ParameterSchema};
use tracing::{debug, info, warn};

use crate::models::report::AnalysisReport;
use crate::services::image::ImagePayload;
use crate::utils::error::{AppError, AppResult};

/// System directive sent with every analysis request
pub const SYSTEM_PROMPT: &str = "You are a world-class Gemologist and Market Analyst.
Analyze gemstone images with extreme precision based on visual cues.
Follow these rules:
1. Identify the likely species and potential simulants.
2. Evaluate Color (Hue, Saturation, Tone), Clarity (Inclusions), and Cut.
3. Estimate Market Value Range per carat (USD).
4. Provide a confidence score (0-100%).
5. Mention if image quality is too low to distinguish natural vs synthetic.
6. Provide expert test recommendations (RI, UV, etc.).

Return the response strictly in JSON format.";

/// Instruction accompanying the image
pub const USER_PROMPT: &str =
    "Analyze this gemstone image in detail. Provide professional gemological insights.";

/// Failure message when the service answers without text
pub const NO_DATA_MESSAGE: &str = "No analysis data returned from the expert AI.";

/// Response-shape constraint mirroring [`AnalysisReport`] field for field.
pub fn response_schema() -> ParameterSchema {
    let string_list = || ParameterSchema::array(None, ParameterSchema::string(None));

    ParameterSchema::strict_object(vec![
        (
            "identification",
            ParameterSchema::strict_object(vec![
                ("primary", ParameterSchema::string(None)),
                ("origin", ParameterSchema::string(None)),
                ("confidence", ParameterSchema::number(None)),
                ("features", string_list()),
                ("simulants", string_list()),
            ]),
        ),
        (
            "visualEvaluation",
            ParameterSchema::strict_object(vec![
                ("color", ParameterSchema::string(None)),
                ("clarity", ParameterSchema::string(None)),
                ("cut", ParameterSchema::string(None)),
            ]),
        ),
        (
            "valuation",
            ParameterSchema::strict_object(vec![
                ("priceRange", ParameterSchema::string(None)),
                ("factors", ParameterSchema::string(None)),
            ]),
        ),
        ("recommendations", string_list()),
        ("warnings", string_list()),
    ])
}

/// Strip a markdown code fence wrapping the whole response.
///
/// Backticks inside field values are left alone.
fn extract_json(text: &str) -> &str {
    let trimmed = text.trim();

    let fenced = trimmed
        .strip_prefix("```")
        .and_then(|rest| rest.strip_suffix("```"));

    match fenced {
        // Skip optional language identifier (e.g., "json")
        Some(inner) => match inner.split_once('\n') {
            Some((_, body)) => body.trim(),
            None => inner.trim(),
        },
        None => trimmed,
    }
}

/// Parse response text into a validated report.
///
/// Fields are taken verbatim; no normalization is applied.
pub fn parse_report(text: &str) -> AppResult<AnalysisReport> {
    let json = extract_json(text);
    let report: AnalysisReport =
        serde_json::from_str(json).map_err(|e| AppError::schema(e.to_string()))?;
    report.validate().map_err(AppError::schema)?;
    Ok(report)
}

fn response_text(response: &LlmResponse) -> AppResult<&str> {
    response.text().ok_or_else(|| {
        warn!(
            model = %response.model,
            stop_reason = ?response.stop_reason,
            "analysis response contained no text"
        );
        AppError::service(NO_DATA_MESSAGE)
    })
}

/// Sends one image to the provider and returns the structured report
#[derive(Clone)]
pub struct AnalysisClient {
    provider: Arc<dyn LlmProvider>,
}

impl AnalysisClient {
    pub fn new(provider: Arc<dyn LlmProvider>) -> Self {
        Self { provider }
    }

    /// Run one analysis. Exactly one request is made; there is no retry.
    pub async fn analyze(&self, image: &ImagePayload) -> AppResult<AnalysisReport> {
        if !self.provider.supports_multimodal() {
            return Err(AppError::config(format!(
                "{} model {} does not accept images",
                self.provider.name(),
                self.provider.model()
            )));
        }
        if !self.provider.supports_structured_output() {
            debug!("provider does not enforce the response schema; relying on local validation");
        }

        let message = Message::user_with_image(USER_PROMPT, &image.mime_type, &image.data);
        let options = LlmRequestOptions::json_schema(response_schema());

        debug!(
            provider = self.provider.name(),
            model = self.provider.model(),
            mime_type = %image.mime_type,
            image_bytes = image.byte_len(),
            "sending analysis request"
        );

        let response = self
            .provider
            .send_message(vec![message], Some(SYSTEM_PROMPT.to_string()), options)
            .await?;

        info!(
            model = %response.model,
            input_tokens = response.usage.input_tokens,
            output_tokens = response.usage.output_tokens,
            total_tokens = response.usage.total_tokens(),
            "analysis response received"
        );

        let text = response_text(&response)?;
        debug!(response_len = text.len(), "parsing analysis report");
        parse_report(text)
    }
}
