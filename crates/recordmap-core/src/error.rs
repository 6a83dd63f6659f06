//! Error types for the recordmap core library
//!
//! This module defines the error handling for flattening and rehydration,
//! using thiserror for the error definitions and anyhow for boxed sources.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Main error type for recordmap operations
#[derive(Error, Debug)]
pub enum Error {
    /// An object appeared twice on the same ancestry path while flattening
    #[error("Cycle detected: {type_name} at {path}")]
    CycleDetected { type_name: String, path: String },

    /// Nesting went deeper than the configured limit
    #[error("Maximum depth {max_depth} exceeded at {path}")]
    DepthExceeded { max_depth: usize, path: String },

    /// Constructor kept failing after every keyword argument was relaxed
    #[error("Construction of {type_name} failed: {message}")]
    Construction {
        type_name: String,
        message: String,
        #[source]
        source: Option<ConstructError>,
    },

    /// A leftover field could not be attached to the rehydrated object
    #[error("Field '{field}' rejected by {type_name}: {message}")]
    AttachRejected {
        type_name: String,
        field: String,
        message: String,
    },

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Configuration {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// JSON parsing and serialization errors
    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: serde_json::Error,
    },

    /// IO errors
    #[error("IO error: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// Generic internal error with context
    #[error("Internal error: {message}")]
    Internal {
        message: String,
        #[source]
        source: anyhow::Error,
    },
}

/// Convenience type alias for Results using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Errors a constructor reports back to the rehydrator
///
/// Any of these triggers the keyword relaxation loop.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConstructError {
    /// A required argument was not supplied
    #[error("missing required argument '{name}'")]
    MissingArgument { name: String },

    /// An argument could not be converted to the parameter type
    #[error("argument '{name}' has wrong type: expected {expected}, found {found}")]
    TypeMismatch {
        name: String,
        expected: String,
        found: String,
    },

    /// A keyword argument the constructor does not accept
    #[error("unexpected keyword argument '{name}'")]
    UnexpectedKeyword { name: String },

    /// Positional arguments left over after binding
    #[error("{count} unexpected positional argument(s)")]
    UnexpectedPositional { count: usize },

    /// Constructor-specific failure
    #[error("{0}")]
    Custom(String),
}

/// Why an object refused a field assignment
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SetFieldError {
    /// The object has no writable field with this name
    #[error("no writable field '{0}'")]
    Unknown(String),

    /// The field exists but is read-only
    #[error("field '{0}' is read-only")]
    ReadOnly(String),

    /// The value has the wrong shape for the field
    #[error("field '{name}' expects {expected}")]
    WrongType { name: String, expected: String },
}

/// Strictness modes for rehydration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrictMode {
    /// Fail on abandoned construction or rejected fields
    Strict,
    /// Proceed with warnings
    #[default]
    Warn,
    /// Proceed silently, only debug logging
    Lenient,
}

/// Severity levels for report items
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Severity {
    /// Informational, no action required
    Info,
    /// Warning, should be reviewed
    Warning,
    /// Error, part of the data did not survive
    Error,
}

/// Codes for deviations recorded while rehydrating
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReportCode {
    /// Annotation present but no type could be resolved
    Unresolved,
    /// Keyword argument removed so construction could succeed
    Relaxed,
    /// Entry attached after construction instead of bound to a parameter
    Attached,
    /// Entry the object refused to accept
    Rejected,
    /// Constructor never succeeded
    Abandoned,
}

impl fmt::Display for StrictMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StrictMode::Strict => write!(f, "Strict"),
            StrictMode::Warn => write!(f, "Warn"),
            StrictMode::Lenient => write!(f, "Lenient"),
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

impl fmt::Display for ReportCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportCode::Unresolved => write!(f, "Unresolved"),
            ReportCode::Relaxed => write!(f, "Relaxed"),
            ReportCode::Attached => write!(f, "Attached"),
            ReportCode::Rejected => write!(f, "Rejected"),
            ReportCode::Abandoned => write!(f, "Abandoned"),
        }
    }
}

// Conversion implementations
impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Json {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Error::Internal {
            message: err.to_string(),
            source: err,
        }
    }
}
