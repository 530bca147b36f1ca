//! Server-reported error records.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// A failure reported by the ledger.
///
/// The same shape appears as the body of a non-2xx response and in place of
/// a result inside a batch response array. `temporary` is the server's hint
/// that repeating the request may succeed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorRecord {
    /// Stable machine-readable code (e.g. `CH003`).
    pub code: String,
    /// Human-readable summary.
    #[serde(default)]
    pub message: String,
    /// Additional context, when the server supplies it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    /// Whether the server considers the failure transient.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temporary: Option<bool>,
    /// Structured data attached to the error.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl ErrorRecord {
    /// Creates a new error record.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            detail: None,
            temporary: None,
            data: None,
        }
    }

    /// Sets the detail text.
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// Sets the retryable hint.
    pub fn with_temporary(mut self, temporary: bool) -> Self {
        self.temporary = Some(temporary);
        self
    }

    /// Attaches structured data.
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    /// Returns true if a JSON value has the shape of an error record.
    ///
    /// Failed batch elements carry a non-null string `code`; successful
    /// elements leave it absent or null.
    pub fn is_error_value(value: &Value) -> bool {
        value
            .get("code")
            .map(|code| code.is_string())
            .unwrap_or(false)
    }
}

impl fmt::Display for ErrorRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)?;
        if let Some(detail) = &self.detail {
            write!(f, " ({})", detail)?;
        }
        Ok(())
    }
}
