//! Error types for thermonet_io.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RunError {
    /// File system errors
    #[error("File system error: {0}")]
    FileSystem(#[from] std::io::Error),

    /// JSON encoding errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Config snapshot errors
    #[error("TOML error: {0}")]
    Toml(#[from] toml::ser::Error),

    /// The run directory already holds a run
    #[error("Run directory already exists: {}", .0.display())]
    AlreadyExists(PathBuf),

    #[error("{context}: {source}")]
    Context {
        context: String,
        source: Box<RunError>,
    },
}

pub type Result<T> = std::result::Result<T, RunError>;

impl RunError {
    /// Wraps an error with additional context.
    #[must_use]
    pub fn with_context<S: Into<String>>(self, context: S) -> Self {
        Self::Context {
            context: context.into(),
            source: Box::new(self),
        }
    }
}

/// Attaches a context message to a fallible I/O step.
pub(crate) trait ResultExt<T> {
    fn context<S: Into<String>>(self, context: S) -> Result<T>;
}

impl<T, E: Into<RunError>> ResultExt<T> for std::result::Result<T, E> {
    fn context<S: Into<String>>(self, context: S) -> Result<T> {
        self.map_err(|e| e.into().with_context(context))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_context() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err = RunError::from(io_err).with_context("writing steps.jsonl");
        let msg = err.to_string();
        assert!(msg.starts_with("writing steps.jsonl"));
        assert!(msg.contains("gone"));
    }

    #[test]
    fn test_already_exists_names_path() {
        let err = RunError::AlreadyExists(PathBuf::from("/tmp/run"));
        assert!(err.to_string().contains("/tmp/run"));
    }
}
