#![deny(missing_docs)]

//! Core library for the Analyst AI document question-answering service.

/// HTTP routing and REST handlers.
pub mod api;
/// Environment-driven configuration management.
pub mod config;
/// The loaded, queryable chunk corpus.
pub mod corpus;
/// Per-format text extraction.
pub mod extraction;
/// Language-model client abstraction and adapters.
pub mod inference;
/// Structured logging and tracing setup.
pub mod logging;
/// Ingestion metrics helpers.
pub mod metrics;
/// Document processing pipeline utilities.
pub mod processing;
