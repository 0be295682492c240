//! # Thermonet IO
//!
//! Output layer for thermonet runs.
//!
//! This crate provides:
//! - Structured error handling for run output
//! - The run directory lifecycle (create, header, teardown)
//! - JSON and JSON-lines record writers

/// Error types and result aliases for run output
pub mod error;
/// Run directory creation, static files and teardown
pub mod run_dir;
/// Streaming step, epoch and node-state writers
pub mod writer;

pub use error::{Result, RunError};
pub use run_dir::{RunDirectory, RunHeader};
pub use writer::RecordWriter;
