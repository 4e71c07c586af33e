//! Integration Tests Module
//!
//! End-to-end tests for the GemEye backend. The model provider is replaced
//! by a scripted mock so no network access is needed.

// Shared mock provider and fixtures
mod common;

// Analysis client request/response cycle
mod analysis_test;

// State controller transitions, cancellation and supersession
mod controller_test;

// Config file and override layering
mod config_test;
