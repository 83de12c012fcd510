#![deny(missing_docs)]

//! Core library for the Fern document summarizer.

/// HTTP routing and REST handlers.
pub mod api;
/// Chat-completions client for the summarization backend.
pub mod backend;
/// Environment-driven configuration management.
pub mod config;
/// Text extraction from PDF and plain-text documents.
pub mod extract;
/// Structured logging and tracing setup.
pub mod logging;
/// Summarization counters.
pub mod metrics;
/// Chunking, orchestration, and aggregation.
pub mod pipeline;
