//! navigate action - open a URL and return the page HTML

use async_trait::async_trait;
use log::warn;
use serde_json::{Map, Value};

use super::{Action, ActionContext, ActionError, ActionKind, ActionResult, required_str, truncate_utf8};
use crate::browser::{BrowserError, BrowserSession};

pub struct NavigateAction;

#[async_trait]
impl Action for NavigateAction {
    fn kind(&self) -> ActionKind {
        ActionKind::Navigate
    }

    fn description(&self) -> &'static str {
        "Navigate the browser to a URL and return the page HTML once it has loaded."
    }

    fn input_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "url": {
                    "type": "string",
                    "description": "Absolute URL to open, including the scheme"
                }
            },
            "required": ["url"]
        })
    }

    async fn execute(
        &self,
        session: &mut dyn BrowserSession,
        input: &Map<String, Value>,
        ctx: &ActionContext,
    ) -> Result<ActionResult, ActionError> {
        let url = required_str(input, self.kind(), "url")?;

        let outcome = match tokio::time::timeout(ctx.navigation, session.goto(url)).await {
            Ok(result) => result,
            Err(_) => Err(BrowserError::Timeout {
                operation: format!("navigate to {}", url),
                timeout_ms: ctx.navigation.as_millis() as u64,
            }),
        };
        if let Err(e) = outcome {
            warn!("navigate failed: {}", e);
            return Ok(ActionResult::failure(e.to_string()));
        }

        match session.content().await {
            Ok(html) => Ok(ActionResult::success().with("content", truncate_utf8(&html, ctx.max_content_bytes))),
            Err(e) => Ok(ActionResult::failure(e.to_string())),
        }
    }
}
