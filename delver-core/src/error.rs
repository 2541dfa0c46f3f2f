//! Unified error handling system
//!
//! Provides structured error types with context, recovery suggestions, and proper error chaining

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, warn};

pub type DelverResult<T> = Result<T, DelverError>;

/// Error context providing additional information for debugging and recovery
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorContext {
    /// Unique error ID for tracking
    pub error_id: String,
    /// Timestamp when error occurred
    pub timestamp: DateTime<Utc>,
    /// Component where error originated
    pub component: String,
    /// Operation being performed when error occurred
    pub operation: Option<String>,
    /// Recovery suggestions
    pub recovery_suggestions: Vec<String>,
}

impl ErrorContext {
    pub fn new(component: &str) -> Self {
        Self {
            error_id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            component: component.to_string(),
            operation: None,
            recovery_suggestions: Vec::new(),
        }
    }

    pub fn with_operation(mut self, operation: &str) -> Self {
        self.operation = Some(operation.to_string());
        self
    }

    pub fn with_suggestion(mut self, suggestion: &str) -> Self {
        self.recovery_suggestions.push(suggestion.to_string());
        self
    }
}

/// Main error type for the Delver system
#[derive(Error, Debug)]
pub enum DelverError {
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
        context: ErrorContext,
    },

    #[error("Validation error: {message}")]
    Validation {
        message: String,
        field: Option<String>,
        context: ErrorContext,
    },

    #[error("LLM error: {message}")]
    Llm {
        message: String,
        provider: Option<String>,
        model: Option<String>,
        context: ErrorContext,
    },

    #[error("Operation timeout: {operation}")]
    Timeout {
        operation: String,
        duration_ms: u64,
        context: ErrorContext,
    },

    #[error("Research error: {message}")]
    Research {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
        context: ErrorContext,
    },

    #[error("Transport error: {message}")]
    Transport {
        message: String,
        context: ErrorContext,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {message}")]
    Internal {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
        context: ErrorContext,
    },
}

impl DelverError {
    /// Get the error context
    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            DelverError::Config { context, .. } => Some(context),
            DelverError::Validation { context, .. } => Some(context),
            DelverError::Llm { context, .. } => Some(context),
            DelverError::Timeout { context, .. } => Some(context),
            DelverError::Research { context, .. } => Some(context),
            DelverError::Transport { context, .. } => Some(context),
            DelverError::Internal { context, .. } => Some(context),
            _ => None,
        }
    }

    /// Check if error is recoverable by the pipeline (folded into state rather than aborting)
    pub fn is_recoverable(&self) -> bool {
        match self {
            DelverError::Llm { .. } => true,
            DelverError::Timeout { .. } => true,
            DelverError::Research { .. } => true,
            DelverError::Config { .. } => false,
            DelverError::Validation { .. } => false,
            DelverError::Transport { .. } => false,
            _ => false,
        }
    }

    /// Log the error with appropriate level
    pub fn log(&self) {
        match self {
            DelverError::Config { .. } | DelverError::Validation { .. } => {
                error!(
                    error_id = ?self.context().map(|c| &c.error_id),
                    error = %self,
                    "Configuration or validation error"
                );
            }
            DelverError::Llm { .. } | DelverError::Timeout { .. } => {
                warn!(
                    error_id = ?self.context().map(|c| &c.error_id),
                    error = %self,
                    "Model or timeout error (recoverable, folded into run state)"
                );
            }
            _ => {
                error!(
                    error_id = ?self.context().map(|c| &c.error_id),
                    error = %self,
                    "Error occurred"
                );
            }
        }
    }
}

/// Convenience macros for creating errors with context
#[macro_export]
macro_rules! config_error {
    ($msg:expr, $component:expr) => {
        $crate::DelverError::Config {
            message: $msg.to_string(),
            source: None,
            context: $crate::ErrorContext::new($component)
                .with_suggestion("Check your configuration file")
                .with_suggestion("Set DEMO_MODE=true to run without credentials"),
        }
    };
    ($msg:expr, $component:expr, $source:expr) => {
        $crate::DelverError::Config {
            message: $msg.to_string(),
            source: Some(Box::new($source)),
            context: $crate::ErrorContext::new($component),
        }
    };
}

#[macro_export]
macro_rules! validation_error {
    ($msg:expr, $field:expr, $component:expr) => {
        $crate::DelverError::Validation {
            message: $msg.to_string(),
            field: Some($field.to_string()),
            context: $crate::ErrorContext::new($component)
                .with_suggestion("Check the field value and format"),
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_context_builder() {
        let context = ErrorContext::new("engine")
            .with_operation("reflection")
            .with_suggestion("Retry with a different model");

        assert_eq!(context.component, "engine");
        assert_eq!(context.operation.as_deref(), Some("reflection"));
        assert_eq!(context.recovery_suggestions.len(), 1);
        assert!(!context.error_id.is_empty());
    }

    #[test]
    fn test_recoverability_classification() {
        let llm = DelverError::Llm {
            message: "rate limited".to_string(),
            provider: Some("openai".to_string()),
            model: None,
            context: ErrorContext::new("llm"),
        };
        assert!(llm.is_recoverable());

        let config = config_error!("missing API key", "config");
        assert!(!config.is_recoverable());
    }

    #[test]
    fn test_validation_error_macro() {
        let err = validation_error!("question cannot be empty", "question", "engine");
        match err {
            DelverError::Validation { field, .. } => {
                assert_eq!(field.as_deref(), Some("question"));
            }
            _ => panic!("expected validation error"),
        }
    }
}
