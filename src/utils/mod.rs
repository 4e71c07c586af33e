//! Utilities Module
//!
//! Common utilities and helpers.

pub mod error;
pub mod paths;
