//! Structured error types shared across rig crates.

use std::collections::BTreeMap;
use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Structured payload attached to every [`RigError`] variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Stable machine readable error code.
    pub code: String,
    /// Human readable diagnostic message.
    pub message: String,
    /// Contextual key value pairs (keys, filenames, sizes, etc.).
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

/// Canonical error type for the rig state core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[serde(tag = "family", content = "detail")]
pub enum RigError {
    /// A dotted key or one of its sections does not exist.
    #[error("not found: {0}")]
    NotFound(ErrorInfo),
    /// A key is structurally invalid or collides with an existing section.
    #[error("malformed key: {0}")]
    MalformedKey(ErrorInfo),
    /// The backing container could not be read or written.
    #[error("backing store error: {0}")]
    Backing(ErrorInfo),
    /// The advisory file lock could not be acquired within the timeout.
    #[error("lock timeout: {0}")]
    LockTimeout(ErrorInfo),
    /// A persistence operation was attempted before a filename was bound.
    #[error("uninitialized: {0}")]
    Uninitialized(ErrorInfo),
    /// A leaf payload failed to encode or decode.
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

impl RigError {
    /// Returns a reference to the payload describing the error.
    pub fn info(&self) -> &ErrorInfo {
        match self {
            RigError::NotFound(info)
            | RigError::MalformedKey(info)
            | RigError::Backing(info)
            | RigError::LockTimeout(info)
            | RigError::Uninitialized(info)
            | RigError::Serde(info) => info,
        }
    }

    /// True when the error is a recoverable lookup miss.
    pub fn is_not_found(&self) -> bool {
        matches!(self, RigError::NotFound(_))
    }
}
