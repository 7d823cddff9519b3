use serde::{Deserialize, Serialize};
use std::fmt;

/// Single structured error shape shared by the core, the HTTP clients and the shell.
///
/// `code` is a stable machine-readable identifier (`VALIDATION_*`, `WIZARD_*`, `API_*`, ...);
/// `retryable` tells the shell whether re-triggering the same action may succeed.
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

    /// Client-side validation failures never reach the network.
    pub fn is_validation(&self) -> bool {
        self.code.starts_with("VALIDATION_")
    }

    /// Text suitable for a transient user-facing notification.
    pub fn user_message(&self) -> String {
        match (&self.details, self.retryable) {
            (Some(details), true) => format!("{} ({details}). Please try again.", self.message),
            (Some(details), false) => format!("{} ({details})", self.message),
            (None, true) => format!("{}. Please try again.", self.message),
            (None, false) => self.message.clone(),
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for AppError {}
