//! Core Error Types
//!
//! Errors raised by the shared data types in this crate. The application
//! crate wraps these in its own `AppError`.

use thiserror::Error;

/// Core error type for the GemEye workspace.
#[derive(Error, Debug)]
pub enum CoreError {
    /// A proxy URL that cannot be used
    #[error("Invalid proxy: {0}")]
    InvalidProxy(String),
}

/// Result type alias for core errors
pub type CoreResult<T> = Result<T, CoreError>;

impl CoreError {
    /// Create an invalid proxy error
    pub fn invalid_proxy(msg: impl Into<String>) -> Self {
        Self::InvalidProxy(msg.into())
    }
}
