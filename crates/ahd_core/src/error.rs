use serde::{Deserialize, Serialize};
use std::fmt;

/// Single structured error shape shared by the core pipeline, event sources and the CLI shell.
///
/// `code` is a stable SCREAMING_SNAKE identifier (`SOURCE_FETCH_FAILED`, `AUTH_REQUIRED`, ...).
/// `details` carries free-form `key=value` pairs separated by `; `.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppError {
    pub code: String,
    pub message: String,
    pub details: Option<String>,
    pub retryable: bool,
}

impl AppError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
            retryable: false,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_retryable(mut self, retryable: bool) -> Self {
        self.retryable = retryable;
        self
    }

    /// Look up `key` in `details` (`a=1; b=2`).
    pub fn detail(&self, key: &str) -> Option<&str> {
        self.details.as_deref()?.split("; ").find_map(|pair| {
            let (k, v) = pair.split_once('=')?;
            (k.trim() == key).then(|| v.trim())
        })
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)?;
        if let Some(details) = &self.details {
            write!(f, " ({details})")?;
        }
        Ok(())
    }
}

impl std::error::Error for AppError {}
