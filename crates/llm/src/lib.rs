//! GemEye LLM
//!
//! Provides a unified interface for sending multimodal requests to hosted
//! model providers. Currently implemented:
//! - Google Gemini (`generateContent` with inline images and response schemas)
//!
//! Also includes the HTTP client factory shared by providers.

pub mod gemini;
pub mod http_client;
pub mod provider;
pub mod types;

// Re-export main types
pub use gemini::GeminiProvider;
pub use http_client::build_http_client;
pub use provider::LlmProvider;
pub use types::*;
