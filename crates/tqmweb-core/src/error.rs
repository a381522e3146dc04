//! Error types for tqmweb-core
//!
//! This module provides error handling for order ingestion, finance
//! resolution and the cost/payment store, including error codes, severity
//! levels and suggestions for the operator.

use serde::{Deserialize, Serialize};
use std::io;
use thiserror::Error;
use tqmweb_market::MarketError;

/// Error codes for programmatic error handling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Orders not ingested yet
    NotLoaded,
    /// Marketplace API failure
    UpstreamError,
    /// Cost/payment persistence failure
    StorageError,
    /// Invalid request data
    ValidationError,
    /// IO error
    IoError,
    /// Internal error
    InternalError,
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCode::NotLoaded => write!(f, "NOT_LOADED"),
            ErrorCode::UpstreamError => write!(f, "UPSTREAM_ERROR"),
            ErrorCode::StorageError => write!(f, "STORAGE_ERROR"),
            ErrorCode::ValidationError => write!(f, "VALIDATION_ERROR"),
            ErrorCode::IoError => write!(f, "IO_ERROR"),
            ErrorCode::InternalError => write!(f, "INTERNAL_ERROR"),
        }
    }
}

/// Detailed error information for API responses and logs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetails {
    /// Error code
    pub code: ErrorCode,
    /// Human-readable message
    pub message: String,
    /// Additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
    /// Suggestions for resolution
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<String>,
}

impl ErrorDetails {
    pub fn new(code: ErrorCode, message: String) -> Self {
        Self {
            code,
            message,
            details: None,
            suggestions: vec![],
        }
    }

    pub fn with_detail(mut self, detail: serde_json::Value) -> Self {
        self.details = Some(detail);
        self
    }

    pub fn with_suggestion(mut self, suggestion: String) -> Self {
        self.suggestions.push(suggestion);
        self
    }
}

impl std::fmt::Display for ErrorDetails {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)?;
        if let Some(ref details) = self.details {
            write!(f, "\nDetails: {}", details)?;
        }
        if !self.suggestions.is_empty() {
            write!(f, "\nSuggestions:")?;
            for suggestion in &self.suggestions {
                write!(f, "\n  - {}", suggestion)?;
            }
        }
        Ok(())
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorSeverity {
    Info,
    Warning,
    Error,
    Critical,
}

impl std::fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorSeverity::Info => write!(f, "info"),
            ErrorSeverity::Warning => write!(f, "warning"),
            ErrorSeverity::Error => write!(f, "error"),
            ErrorSeverity::Critical => write!(f, "critical"),
        }
    }
}

/// Main error type for tqmweb-core
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Orders have not been loaded")]
    NotLoaded,

    #[error("Marketplace error: {message}")]
    Upstream { message: String },

    #[error("Storage error: {message}")]
    Storage { message: String },

    #[error("{message}")]
    Validation { message: String },

    #[error("IO error: {0}")]
    IoError(#[from] io::Error),

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl CoreError {
    pub fn validation(message: impl Into<String>) -> Self {
        CoreError::Validation { message: message.into() }
    }

    /// Get the error code
    pub fn code(&self) -> ErrorCode {
        match self {
            CoreError::NotLoaded => ErrorCode::NotLoaded,
            CoreError::Upstream { .. } => ErrorCode::UpstreamError,
            CoreError::Storage { .. } => ErrorCode::StorageError,
            CoreError::Validation { .. } => ErrorCode::ValidationError,
            CoreError::IoError(_) => ErrorCode::IoError,
            CoreError::Internal { .. } => ErrorCode::InternalError,
        }
    }

    /// Get the severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            CoreError::NotLoaded => ErrorSeverity::Warning,
            CoreError::Upstream { .. } => ErrorSeverity::Error,
            CoreError::Storage { .. } => ErrorSeverity::Error,
            CoreError::Validation { .. } => ErrorSeverity::Info,
            CoreError::IoError(_) => ErrorSeverity::Error,
            CoreError::Internal { .. } => ErrorSeverity::Critical,
        }
    }

    /// Convert to detailed error info
    pub fn to_details(&self) -> ErrorDetails {
        let mut details = ErrorDetails::new(self.code(), self.to_string());

        match self {
            CoreError::NotLoaded => {
                details = details.with_suggestion(
                    "POST /api/refresh to retry order ingestion.".to_string()
                );
            }
            CoreError::Upstream { message } => {
                details = details.with_detail(serde_json::json!({ "upstream_message": message }));
                details = details.with_suggestion(
                    "Check marketplace credentials and that the access token has not expired.".to_string()
                );
                details = details.with_suggestion(
                    "POST /api/refresh once the marketplace is reachable.".to_string()
                );
            }
            CoreError::Storage { .. } => {
                details = details.with_suggestion(
                    "Check storage.database_url or the JSON file paths and their permissions.".to_string()
                );
            }
            CoreError::Validation { message } => {
                details = details.with_detail(serde_json::json!({ "validation_message": message }));
            }
            CoreError::Internal { .. } => {
                details = details.with_suggestion(
                    "Check stored costs and payments for implausibly large amounts.".to_string()
                );
            }
            _ => {}
        }

        details
    }
}

/// Result type with CoreError
pub type CoreResult<T> = Result<T, CoreError>;

impl From<MarketError> for CoreError {
    fn from(error: MarketError) -> Self {
        let message = if error.is_transport() {
            format!("marketplace unreachable: {}", error)
        } else {
            error.to_string()
        };
        CoreError::Upstream { message }
    }
}

impl From<sqlx::Error> for CoreError {
    fn from(error: sqlx::Error) -> Self {
        CoreError::Storage { message: error.to_string() }
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(error: serde_json::Error) -> Self {
        CoreError::Storage { message: format!("corrupt JSON store: {}", error) }
    }
}

/// Error context for reporting
#[derive(Debug, Clone, Default)]
pub struct ErrorContext {
    /// Operation being performed
    pub operation: String,
    /// Additional context data
    pub data: serde_json::Value,
}

impl ErrorContext {
    pub fn new(operation: &str) -> Self {
        Self {
            operation: operation.to_string(),
            data: serde_json::json!({}),
        }
    }

    pub fn with_data(mut self, key: &str, value: serde_json::Value) -> Self {
        self.data[key] = value;
        self
    }
}

/// Error logger trait
pub trait ErrorLogger {
    fn log_error(&self, error: &CoreError, context: &ErrorContext);
}

/// Default error logger using log crate
#[derive(Default)]
pub struct DefaultErrorLogger;

impl ErrorLogger for DefaultErrorLogger {
    fn log_error(&self, error: &CoreError, context: &ErrorContext) {
        match error.severity() {
            ErrorSeverity::Info | ErrorSeverity::Warning => log::warn!(
                target: "tqmweb::error",
                "{} - Operation: {} - Data: {}",
                error.to_details(),
                context.operation,
                context.data
            ),
            ErrorSeverity::Error | ErrorSeverity::Critical => log::error!(
                target: "tqmweb::error",
                "{} - Operation: {} - Data: {}",
                error.to_details(),
                context.operation,
                context.data
            ),
        }
    }
}

// ==================== Tests ====================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_display() {
        assert_eq!(ErrorCode::NotLoaded.to_string(), "NOT_LOADED");
        assert_eq!(ErrorCode::UpstreamError.to_string(), "UPSTREAM_ERROR");
        assert_eq!(ErrorCode::StorageError.to_string(), "STORAGE_ERROR");
    }

    #[test]
    fn test_core_error_severity() {
        assert_eq!(CoreError::NotLoaded.severity(), ErrorSeverity::Warning);
        assert_eq!(CoreError::validation("bad").severity(), ErrorSeverity::Info);
        assert_eq!(
            CoreError::Internal { message: "x".to_string() }.severity(),
            ErrorSeverity::Critical
        );
    }

    #[test]
    fn test_market_error_maps_to_upstream() {
        let error: CoreError = MarketError::Api {
            code: "IllegalAccessToken".to_string(),
            message: "expired".to_string(),
        }
        .into();
        assert_eq!(error.code(), ErrorCode::UpstreamError);
        assert!(error.to_string().contains("IllegalAccessToken"));
    }

    #[test]
    fn test_error_details_upstream() {
        let details = CoreError::Upstream { message: "timeout".to_string() }.to_details();
        assert_eq!(details.code, ErrorCode::UpstreamError);
        assert!(details.details.is_some());
        assert_eq!(details.suggestions.len(), 2);
    }

    #[test]
    fn test_validation_message_is_bare() {
        assert_eq!(CoreError::validation("Amount must be positive").to_string(), "Amount must be positive");
    }

    #[test]
    fn test_error_context() {
        let context = ErrorContext::new("save_cost").with_data("key", serde_json::json!("SKU1"));
        assert_eq!(context.operation, "save_cost");
        assert_eq!(context.data["key"], "SKU1");
    }
}
