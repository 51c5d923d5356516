//! Browser session layer
//!
//! A `BrowserSession` is a live handle to exactly one page. Actions drive it
//! through this trait; `ChromeSession` is the real implementation and
//! `MockSession` backs the tests.

mod chrome;
mod mock;

pub use chrome::{ChromeLauncher, ChromeSession};
pub use mock::{MockLauncher, MockSession};

use std::path::Path;

use async_trait::async_trait;

use crate::error::SurfrError;

/// Operations on a single live page
#[async_trait]
pub trait BrowserSession: Send {
    /// Navigate and wait for the page load event
    async fn goto(&mut self, url: &str) -> Result<(), BrowserError>;

    /// Click the first element matching a CSS selector
    async fn click(&mut self, selector: &str) -> Result<(), BrowserError>;

    /// Focus the element matching `selector` and type `text` into it
    async fn type_text(&mut self, selector: &str, text: &str) -> Result<(), BrowserError>;

    /// Whether an element matching `selector` exists and is rendered
    async fn is_visible(&mut self, selector: &str) -> Result<bool, BrowserError>;

    /// Full HTML of the current page
    async fn content(&mut self) -> Result<String, BrowserError>;

    async fn current_url(&mut self) -> Result<String, BrowserError>;

    /// Save a PNG screenshot of the page to `path`
    async fn screenshot(&mut self, path: &Path) -> Result<(), BrowserError>;

    /// Press a named key (e.g. "Enter", "Tab") on the focused element
    async fn press_key(&mut self, key: &str) -> Result<(), BrowserError>;

    /// Shut the page and its browser down
    async fn close(&mut self) -> Result<(), BrowserError>;
}

/// Acquires a fresh session on demand
#[async_trait]
pub trait SessionLauncher: Send + Sync {
    async fn launch(&self) -> Result<Box<dyn BrowserSession>, BrowserError>;
}

/// Errors raised by a browser session
#[derive(Debug, thiserror::Error)]
pub enum BrowserError {
    #[error("Failed to launch browser: {0}")]
    Launch(String),

    #[error("Navigation to {url} failed: {message}")]
    Navigation { url: String, message: String },

    #[error("No element matches selector '{selector}'")]
    ElementNotFound { selector: String },

    #[error("Element '{selector}' not visible after {timeout_ms}ms")]
    NotVisible { selector: String, timeout_ms: u64 },

    #[error("{operation} timed out after {timeout_ms}ms")]
    Timeout { operation: String, timeout_ms: u64 },

    #[error("Browser protocol error: {0}")]
    Protocol(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<BrowserError> for SurfrError {
    fn from(err: BrowserError) -> Self {
        SurfrError::Browser(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_browser_error_messages() {
        let err = BrowserError::ElementNotFound {
            selector: "#submit".to_string(),
        };
        assert_eq!(err.to_string(), "No element matches selector '#submit'");

        let err = BrowserError::NotVisible {
            selector: ".modal".to_string(),
            timeout_ms: 5000,
        };
        assert!(err.to_string().contains("5000ms"));
    }

    #[test]
    fn test_browser_error_into_surfr_error() {
        let err: SurfrError = BrowserError::Launch("no chrome binary".to_string()).into();
        assert!(matches!(err, SurfrError::Browser(_)));
        assert!(err.to_string().contains("no chrome binary"));
    }
}
