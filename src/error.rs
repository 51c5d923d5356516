//! Error types for Surfr
//!
//! Centralized error handling using thiserror.

use thiserror::Error;

use crate::actions::ActionError;

/// All error types that can escape a task run
#[derive(Debug, Error)]
pub enum SurfrError {
    /// Browser could not be launched or a page could not be opened
    #[error("Browser error: {0}")]
    Browser(String),

    /// LLM API error
    #[error("LLM error: {0}")]
    Llm(String),

    /// Action registration or dispatch error
    #[error("Action error: {0}")]
    Action(#[from] ActionError),

    /// Invalid configuration value
    #[error("Config error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for Surfr operations
pub type Result<T> = std::result::Result<T, SurfrError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_browser_error() {
        let err = SurfrError::Browser("chrome not found".to_string());
        assert_eq!(err.to_string(), "Browser error: chrome not found");
    }

    #[test]
    fn test_llm_error() {
        let err = SurfrError::Llm("rate limited".to_string());
        assert_eq!(err.to_string(), "LLM error: rate limited");
    }

    #[test]
    fn test_config_error() {
        let err = SurfrError::Config("max_attempts must be positive".to_string());
        assert_eq!(err.to_string(), "Config error: max_attempts must be positive");
    }

    #[test]
    fn test_action_error_conversion() {
        let err: SurfrError = ActionError::UnknownAction {
            name: "scroll".to_string(),
        }
        .into();
        assert!(matches!(err, SurfrError::Action(_)));
        assert!(err.to_string().contains("scroll"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: SurfrError = io_err.into();
        assert!(matches!(err, SurfrError::Io(_)));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("invalid").unwrap_err();
        let err: SurfrError = json_err.into();
        assert!(matches!(err, SurfrError::Json(_)));
    }
}
