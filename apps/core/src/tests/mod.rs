//! Test Module
//!
//! Cross-module tests for the assistant. Unit tests live next to their code.
//!
//! ## Test Categories
//! - `brain_tests`: language, normalization, rules, retrieval and reply resolution together
//! - `session_tests`: session flow against mock backends and a temporary transcript
//! - `transcript_tests`: the transcript file, concurrent writers and statistics over it
//! - `integration_tests`: the shipped dataset end to end, and API mode against a mock server

pub mod integration_tests;
