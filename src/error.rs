//! Custom error types for loopwatch.
//!
//! The monitor itself never fails on conversation input: unknown sessions are
//! created on demand and empty text simply yields no matches. Errors are
//! reserved for caller mistakes at the parsing boundary (roles, context
//! labels) and for configuration loading.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for loopwatch operations
#[derive(Error, Debug)]
pub enum MonitorError {
    // =========================================================================
    // Caller Errors
    // =========================================================================
    /// Role string is neither `user` nor `agent`
    #[error("Invalid role '{value}': expected 'user' or 'agent'")]
    InvalidRole { value: String },

    /// Context label is not part of the known label set
    #[error("Unknown context label '{value}'")]
    UnknownContext { value: String },

    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Failed to load configuration
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        path: Option<PathBuf>,
    },

    /// Invalid configuration value
    #[error("Invalid configuration: {field} - {reason}")]
    InvalidConfig { field: String, reason: String },

    // =========================================================================
    // Wrapped Errors
    // =========================================================================
    /// IO error wrapper
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON error wrapper
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// TOML error wrapper
    #[error(transparent)]
    Toml(#[from] toml::de::Error),
}

impl MonitorError {
    /// Create an invalid role error
    pub fn invalid_role(value: impl Into<String>) -> Self {
        Self::InvalidRole {
            value: value.into(),
        }
    }

    /// Create an unknown context error
    pub fn unknown_context(value: impl Into<String>) -> Self {
        Self::UnknownContext {
            value: value.into(),
        }
    }

    /// Create a configuration error with path
    pub fn config_with_path(message: impl Into<String>, path: PathBuf) -> Self {
        Self::Config {
            message: message.into(),
            path: Some(path),
        }
    }

    /// Create an invalid configuration error
    pub fn invalid_config(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Check if this error was caused by a caller passing bad input
    pub fn is_caller_error(&self) -> bool {
        matches!(self, Self::InvalidRole { .. } | Self::UnknownContext { .. })
    }

    /// Get error code for exit status
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::InvalidRole { .. } | Self::UnknownContext { .. } => 2,
            Self::Config { .. } | Self::InvalidConfig { .. } | Self::Toml(_) => 7,
            _ => 1,
        }
    }
}

/// Type alias for loopwatch results
pub type Result<T> = std::result::Result<T, MonitorError>;
