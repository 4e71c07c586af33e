//! GemEye Core
//!
//! Foundational error types and shared configuration data for the GemEye
//! workspace. This crate has no dependency on the HTTP stack, the async
//! runtime, or any model provider.
//!
//! ## Module Organization
//!
//! - `error` - Core error type (`CoreError`, `CoreResult`)
//! - `proxy` - Proxy configuration data types shared by the HTTP client factory

pub mod error;
pub mod proxy;

// ── Error Types ────────────────────────────────────────────────────────
pub use error::{CoreError, CoreResult};

// ── Proxy Types ────────────────────────────────────────────────────────
pub use proxy::{ProxyConfig, ProxyProtocol};
