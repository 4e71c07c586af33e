//! Business Logic Services
//!
//! - `image`: encoding the photograph into an in-memory payload
//! - `analysis`: the request/response cycle with the model provider
//! - `render`: terminal presentation of reports and states

pub mod analysis;
pub mod image;
pub mod render;

pub use analysis::AnalysisClient;
pub use image::ImagePayload;
