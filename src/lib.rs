//! GemEye - AI gemstone analysis
//!
//! This library provides the backend for the GemEye gemstone analyzer.
//! It includes:
//! - The analysis client that sends a photo to a multimodal model
//! - The state controller driving idle/staged/analyzing/resolved/failed
//! - JSON config storage and data models

pub mod models;
pub mod services;
pub mod state;
pub mod storage;
pub mod utils;

pub use models::report::AnalysisReport;
pub use models::settings::{AppConfig, SettingsUpdate};
pub use services::{AnalysisClient, ImagePayload};
pub use state::{AnalysisController, AnalysisPhase, AnalysisState};
pub use storage::ConfigService;
pub use utils::error::{AppError, AppResult};
