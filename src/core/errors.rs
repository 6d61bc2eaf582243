//! Error types for the ring5-ingest engine.
//!
//! Structured error types that preserve enough context to identify which
//! phase of the ingestion pipeline failed (construction, validation, the
//! per-file parse, or the finalization pass) and propagate through the
//! worker pool's futures without losing that context.

use std::fmt;
use std::io;

use thiserror::Error;

/// Result type for ring5-ingest operations.
pub type Result<T> = std::result::Result<T, IngestError>;

/// Comprehensive error type for all ingestion operations.
#[derive(Error, Debug)]
pub enum IngestError {
    /// I/O related errors (file operations, subprocess spawn).
    #[error("I/O error: {message}")]
    Io {
        /// Human-readable error message.
        message: String,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// Construction errors: unknown kind name, missing required params,
    /// a Distribution range exceeding the safety cap. Fatal to the request.
    #[error("Construction error: {message}")]
    Construction {
        /// Error description.
        message: String,
        /// Kind name or field that failed construction, if known.
        field: Option<String>,
    },

    /// Input-validation errors at the scan/parse submission boundary:
    /// non-existent root, glob with path-escape, a leading `-` in a name.
    #[error("Input validation error: {message}")]
    InputValidation {
        /// Error description.
        message: String,
    },

    /// Content invariants violated while accumulating or finalizing a
    /// Stat: unknown/out-of-range bucket, non-numeric value, observation
    /// count exceeding `repeat`, missing mandatory Distribution sentinels.
    #[error("Content invariant violated for '{variable}': {message}")]
    ContentInvariant {
        /// The variable name whose Stat raised.
        variable: String,
        /// Error description.
        message: String,
    },

    /// Access-guard errors: reading `reduced_content` before both
    /// `balance_content()` and `reduce_duplicates()` have run.
    #[error("Access guard violated for '{variable}': {message}")]
    AccessGuard {
        /// The variable name whose Stat was accessed too early.
        variable: String,
        /// Error description.
        message: String,
    },

    /// Transient/external errors: tokenizer timeout, tokenizer non-zero
    /// exit, malformed scanner JSON, missing file at execution time.
    #[error("Transient error in {stage}: {message}")]
    Transient {
        /// The pipeline stage the error occurred in (e.g. "tokenizer", "scanner").
        stage: String,
        /// Error description.
        message: String,
    },

    /// Regex compilation or matching error.
    #[error("Regex error: {message}")]
    Regex {
        /// Error description.
        message: String,
    },

    /// CSV read/write error.
    #[error("CSV error: {message}")]
    Csv {
        /// Error description.
        message: String,
    },

    /// Configuration errors (loading/parsing `IngestConfig`, `config.ini`).
    #[error("Configuration error: {message}")]
    Config {
        /// Error description.
        message: String,
    },
}

impl IngestError {
    /// Create a new I/O error with context.
    pub fn io(message: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source,
        }
    }

    /// Create a new construction error.
    pub fn construction(message: impl Into<String>) -> Self {
        Self::Construction {
            message: message.into(),
            field: None,
        }
    }

    /// Create a new construction error naming the offending field.
    pub fn construction_field(message: impl Into<String>, field: impl Into<String>) -> Self {
        Self::Construction {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    /// Create a new input-validation error.
    pub fn input_validation(message: impl Into<String>) -> Self {
        Self::InputValidation {
            message: message.into(),
        }
    }

    /// Create a new content-invariant error scoped to a variable.
    pub fn content_invariant(variable: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ContentInvariant {
            variable: variable.into(),
            message: message.into(),
        }
    }

    /// Create a new access-guard error scoped to a variable.
    pub fn access_guard(variable: impl Into<String>, message: impl Into<String>) -> Self {
        Self::AccessGuard {
            variable: variable.into(),
            message: message.into(),
        }
    }

    /// Create a new transient error scoped to a pipeline stage.
    pub fn transient(stage: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Transient {
            stage: stage.into(),
            message: message.into(),
        }
    }

    /// Create a new configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}

impl From<io::Error> for IngestError {
    fn from(err: io::Error) -> Self {
        Self::io("I/O operation failed", err)
    }
}

impl From<regex::Error> for IngestError {
    fn from(err: regex::Error) -> Self {
        Self::Regex {
            message: err.to_string(),
        }
    }
}

impl From<csv::Error> for IngestError {
    fn from(err: csv::Error) -> Self {
        Self::Csv {
            message: err.to_string(),
        }
    }
}

impl From<serde_yaml::Error> for IngestError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::Config {
            message: format!("YAML error: {err}"),
        }
    }
}

impl From<config::ConfigError> for IngestError {
    fn from(err: config::ConfigError) -> Self {
        Self::Config {
            message: err.to_string(),
        }
    }
}

/// Result extension trait for attaching context to an error as it propagates.
pub trait ResultExt<T> {
    /// Attach lazily-computed context to an error result.
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;

    /// Attach static context to an error result.
    fn context(self, msg: &'static str) -> Result<T>;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: Into<IngestError> + fmt::Display,
{
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| {
            let ctx = f();
            let inner = e.into();
            IngestError::Transient {
                stage: "context".to_string(),
                message: format!("{ctx}: {inner}"),
            }
        })
    }

    fn context(self, msg: &'static str) -> Result<T> {
        self.with_context(|| msg.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = IngestError::construction("unknown kind");
        assert!(matches!(err, IngestError::Construction { .. }));

        let err = IngestError::content_invariant("system.cpu.ipc", "missing sentinel");
        assert!(matches!(err, IngestError::ContentInvariant { .. }));
    }

    #[test]
    fn test_access_guard_message_names_variable() {
        let err = IngestError::access_guard("simTicks", "balance/reduce not called");
        let msg = err.to_string();
        assert!(msg.contains("simTicks"));
    }
}
