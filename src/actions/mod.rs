//! Browser actions the model can request
//!
//! The action set is closed: every action is an `ActionKind` variant backed by
//! a type implementing `Action`. The `ActionRegistry` holds them, exposes their
//! definitions to the model and dispatches requests by name.
//!
//! Browser failures never escape an action. They come back as an
//! `ActionResult` with `success: false`. `ActionError` is reserved for requests
//! that cannot be attempted at all.

mod check_selector;
mod click;
mod get_content;
mod get_current_url;
mod key_press;
mod navigate;
mod registry;
mod screenshot;
mod type_text;
mod wait;

pub use check_selector::CheckSelectorAction;
pub use click::ClickAction;
pub use get_content::GetContentAction;
pub use get_current_url::GetCurrentUrlAction;
pub use key_press::KeyPressAction;
pub use navigate::NavigateAction;
pub use registry::ActionRegistry;
pub use screenshot::ScreenshotAction;
pub use type_text::TypeTextAction;
pub use wait::wait_until_visible;

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::browser::BrowserSession;
use crate::config::{BrowserConfig, TimeoutsConfig};

/// A browser operation the model can request
#[async_trait]
pub trait Action: Send + Sync {
    fn kind(&self) -> ActionKind;

    /// Name the model uses to request this action
    fn name(&self) -> &'static str {
        self.kind().name()
    }

    fn description(&self) -> &'static str;

    /// JSON Schema for the parameters
    fn input_schema(&self) -> Value;

    /// Run against `session`. `input` has already been checked for required fields.
    async fn execute(
        &self,
        session: &mut dyn BrowserSession,
        input: &Map<String, Value>,
        ctx: &ActionContext,
    ) -> Result<ActionResult, ActionError>;
}

/// The closed set of actions
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ActionKind {
    Navigate,
    Click,
    TypeText,
    CheckSelector,
    GetContent,
    GetCurrentUrl,
    Screenshot,
    KeyPress,
}

impl ActionKind {
    pub const ALL: [ActionKind; 8] = [
        ActionKind::Navigate,
        ActionKind::Click,
        ActionKind::TypeText,
        ActionKind::CheckSelector,
        ActionKind::GetContent,
        ActionKind::GetCurrentUrl,
        ActionKind::Screenshot,
        ActionKind::KeyPress,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ActionKind::Navigate => "navigate",
            ActionKind::Click => "click",
            ActionKind::TypeText => "type",
            ActionKind::CheckSelector => "check_selector",
            ActionKind::GetContent => "get_content",
            ActionKind::GetCurrentUrl => "get_current_url",
            ActionKind::Screenshot => "screenshot",
            ActionKind::KeyPress => "key_press",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Outcome of one action, serialized flat: `{"success": .., "error": .., <data>}`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(flatten)]
    pub data: Map<String, Value>,
}

impl ActionResult {
    pub fn success() -> Self {
        Self {
            success: true,
            error: None,
            data: Map::new(),
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            data: Map::new(),
        }
    }

    /// Attach an extra field
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.data.insert(key.to_string(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    pub fn to_value(&self) -> Value {
        let mut map = self.data.clone();
        map.insert("success".to_string(), Value::Bool(self.success));
        if let Some(error) = &self.error {
            map.insert("error".to_string(), Value::String(error.clone()));
        }
        Value::Object(map)
    }
}

/// Per-action waits and limits, resolved from config
#[derive(Debug, Clone)]
pub struct ActionContext {
    pub click_visible: Duration,
    pub type_visible: Duration,
    pub check_selector: Duration,
    pub navigation: Duration,
    pub poll_interval: Duration,
    pub max_content_bytes: usize,
}

impl ActionContext {
    pub fn from_config(timeouts: &TimeoutsConfig, browser: &BrowserConfig) -> Self {
        Self {
            click_visible: Duration::from_millis(timeouts.click_visible_ms),
            type_visible: Duration::from_millis(timeouts.type_visible_ms),
            check_selector: Duration::from_millis(timeouts.check_selector_ms),
            navigation: Duration::from_millis(timeouts.navigation_ms),
            poll_interval: Duration::from_millis(100),
            max_content_bytes: browser.max_content_bytes,
        }
    }
}

impl Default for ActionContext {
    fn default() -> Self {
        Self::from_config(&TimeoutsConfig::default(), &BrowserConfig::default())
    }
}

/// Requests that cannot be attempted, and registration mistakes
#[derive(Debug, thiserror::Error)]
pub enum ActionError {
    #[error("Unknown action: {name}")]
    UnknownAction { name: String },

    #[error("Invalid input for {action}: {message}")]
    InvalidInput { action: String, message: String },

    #[error("Invalid schema for {action}: {message}")]
    InvalidSchema { action: String, message: String },

    #[error("Action already registered: {name}")]
    DuplicateAction { name: String },
}

/// Fetch a required string parameter
pub(crate) fn required_str<'a>(
    input: &'a Map<String, Value>,
    action: ActionKind,
    key: &str,
) -> Result<&'a str, ActionError> {
    input
        .get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| ActionError::InvalidInput {
            action: action.name().to_string(),
            message: format!("'{}' must be a string", key),
        })
}

/// Cut `text` to at most `max_bytes`, backing off to a char boundary
pub(crate) fn truncate_utf8(text: &str, max_bytes: usize) -> &str {
    if text.len() <= max_bytes {
        return text;
    }
    let mut end = max_bytes;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}
