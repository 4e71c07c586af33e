//! Data Models
//!
//! Domain types shared by the services and the state controller.

pub mod report;
pub mod settings;

pub use report::{AnalysisReport, Identification, Valuation, VisualEvaluation};
pub use settings::AppConfig;
