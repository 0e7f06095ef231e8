//! Error types for Switchyard

use thiserror::Error;

/// Result type alias using Switchyard's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Switchyard error types with helpful messages and suggestions
#[derive(Error, Debug)]
pub enum Error {
    // Registry errors (E001-E099)
    #[error("Provider '{0}' is not registered. Run `switchyard providers list` to see all providers.")]
    ProviderNotFound(String),

    // Request errors (E100-E199)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    // Dispatch errors (E200-E299)
    #[error("Provider '{provider}' call failed: {detail}")]
    CallFailed { provider: String, detail: String },

    // Config errors (E300-E399)
    #[error("Configuration error: {0}")]
    ConfigError(String),

    // Generic errors
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Get error code for this error type
    pub fn code(&self) -> &'static str {
        match self {
            Self::ProviderNotFound(_) => "E001",
            Self::InvalidRequest(_) => "E100",
            Self::CallFailed { .. } => "E200",
            Self::ConfigError(_) => "E300",
            Self::Io(_) => "E9999",
        }
    }

    /// Get suggestion for how to fix this error
    pub fn suggestion(&self) -> Option<String> {
        match self {
            Self::ProviderNotFound(_) => Some("switchyard providers list".to_string()),
            Self::ConfigError(_) => Some("switchyard config list".to_string()),
            _ => None,
        }
    }
}
