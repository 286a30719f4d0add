//! Error types for securecheck operations.
//!
//! Two layers of errors exist:
//!
//! - [`ProbeError`] is a *soft* failure raised while gathering platform
//!   state. It degrades one record to defaults and is carried next to the
//!   snapshot as a diagnostic. It never aborts a run.
//! - [`CheckError`] is an application error (bad config file, I/O) raised
//!   outside the detection engine.

use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Classification of a soft probe failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, schemars::JsonSchema)]
pub enum ErrorKind {
    /// A registry key, class or tool could not be opened or queried.
    SourceUnavailable,
    /// A source answered but the payload matched no expected shape.
    ParseFailure,
    /// A helper process exited non-zero or produced no output.
    ExternalToolFailure,
    /// A bounded external call exceeded its deadline.
    Timeout,
}

/// Soft failure produced by an adapter or probe.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProbeError {
    /// The source could not be opened or queried.
    #[error("{origin} unavailable: {message}")]
    SourceUnavailable { origin: String, message: String },

    /// The source answered with an unexpected payload.
    #[error("unexpected output from {origin}: {message}")]
    ParseFailure { origin: String, message: String },

    /// A helper process failed or returned nothing.
    #[error("command failed with exit code {code:?}: {command}{}", detail_suffix(.detail))]
    ExternalToolFailure {
        command: String,
        code: Option<i32>,
        detail: String,
    },

    /// A bounded call ran past its deadline.
    #[error("{operation} timed out after {}s", .after.as_secs())]
    Timeout { operation: String, after: Duration },
}

fn detail_suffix(detail: &str) -> String {
    if detail.trim().is_empty() {
        String::new()
    } else {
        format!(" ({})", detail.trim())
    }
}

impl ProbeError {
    /// Shorthand for [`ProbeError::SourceUnavailable`].
    pub fn unavailable(origin: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SourceUnavailable {
            origin: origin.into(),
            message: message.into(),
        }
    }

    /// Shorthand for [`ProbeError::ParseFailure`].
    pub fn parse(origin: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ParseFailure {
            origin: origin.into(),
            message: message.into(),
        }
    }

    /// The taxonomy bucket this error belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::SourceUnavailable { .. } => ErrorKind::SourceUnavailable,
            Self::ParseFailure { .. } => ErrorKind::ParseFailure,
            Self::ExternalToolFailure { .. } => ErrorKind::ExternalToolFailure,
            Self::Timeout { .. } => ErrorKind::Timeout,
        }
    }

    /// Fold the errors of several independent sub-queries into one.
    ///
    /// Returns `None` when the list is empty and the sole error unchanged
    /// when there is exactly one.
    pub fn combine(origin: &str, mut errors: Vec<ProbeError>) -> Option<ProbeError> {
        match errors.len() {
            0 => None,
            1 => errors.pop(),
            _ => {
                let message = errors
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join("; ");
                Some(Self::unavailable(origin, message))
            }
        }
    }
}

/// Core error type for application-level failures.
#[derive(Debug, Error)]
pub enum CheckError {
    /// Explicitly requested configuration file is missing.
    #[error("Configuration not found: {path}")]
    ConfigNotFound { path: PathBuf },

    /// Configuration file is not valid YAML for the expected schema.
    #[error("Failed to parse config at {path}: {message}")]
    ConfigParseError { path: PathBuf, message: String },

    /// Configuration values are out of range.
    #[error("Invalid configuration: {message}")]
    ConfigValidationError { message: String },

    /// A probe failure escalated to the application layer.
    #[error(transparent)]
    Probe(#[from] ProbeError),

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic wrapped error for anyhow interop.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias for securecheck operations.
pub type Result<T> = std::result::Result<T, CheckError>;
