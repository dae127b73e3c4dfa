//! Structured error types shared across GINF crates.

use std::collections::BTreeMap;
use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Structured payload attached to every [`GinfError`] variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Stable machine readable error code.
    pub code: String,
    /// Human readable diagnostic message.
    pub message: String,
    /// Contextual key value pairs (vertex indices, sizes, option names, etc.).
    #[serde(default)]
    pub context: BTreeMap<String, String>,
    /// Optional hint that may help the caller resolve the issue.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl ErrorInfo {
    /// Creates a new error payload with the provided code and message.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            context: BTreeMap::new(),
            hint: None,
        }
    }

    /// Adds a context entry to the payload.
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    /// Sets a human readable hint for remediation.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

/// Canonical error type for the graph inference workspace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[serde(tag = "family", content = "detail")]
pub enum GinfError {
    /// Invalid method names, sweep kinds, ladders or option combinations.
    #[error("config error: {0}")]
    Config(ErrorInfo),
    /// Structural graph errors (vertex out of range, size mismatch).
    #[error("graph error: {0}")]
    Graph(ErrorInfo),
    /// Invalid label assignments.
    #[error("labels error: {0}")]
    Labels(ErrorInfo),
    /// Failures reported by the external generative model.
    #[error("model error: {0}")]
    Model(ErrorInfo),
    /// An optional backend required by the requested path is unavailable.
    #[error("dependency error: {0}")]
    Dependency(ErrorInfo),
    /// Operations that need accumulated data which is not there yet.
    #[error("data error: {0}")]
    Data(ErrorInfo),
    /// Serialization, schema and I/O errors.
    #[error("serde error: {0}")]
    Serde(ErrorInfo),
}

impl Display for ErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (code: {})", self.message, self.code)?;
        if !self.context.is_empty() {
            write!(f, " | context: [")?;
            for (idx, (key, value)) in self.context.iter().enumerate() {
                if idx > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{key}={value}")?;
            }
            write!(f, "]")?;
        }
        if let Some(hint) = &self.hint {
            write!(f, " | hint: {hint}")?;
        }
        Ok(())
    }
}

impl GinfError {
    /// Returns a reference to the payload describing the error.
    pub fn info(&self) -> &ErrorInfo {
        match self {
            GinfError::Config(info)
            | GinfError::Graph(info)
            | GinfError::Labels(info)
            | GinfError::Model(info)
            | GinfError::Dependency(info)
            | GinfError::Data(info)
            | GinfError::Serde(info) => info,
        }
    }

    /// Shorthand for a configuration error.
    pub fn config(code: impl Into<String>, message: impl Into<String>) -> Self {
        GinfError::Config(ErrorInfo::new(code, message))
    }

    /// Shorthand for an error raised by the external model.
    pub fn model(code: impl Into<String>, message: impl Into<String>) -> Self {
        GinfError::Model(ErrorInfo::new(code, message))
    }

    /// Returns `true` when the error is a configuration error.
    pub fn is_config(&self) -> bool {
        matches!(self, GinfError::Config(_))
    }
}
