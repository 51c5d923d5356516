//! type action - wait for an input to become visible, then type into it

use async_trait::async_trait;
use serde_json::{Map, Value};

use super::{Action, ActionContext, ActionError, ActionKind, ActionResult, required_str, wait_until_visible};
use crate::browser::{BrowserError, BrowserSession};

pub struct TypeTextAction;

#[async_trait]
impl Action for TypeTextAction {
    fn kind(&self) -> ActionKind {
        ActionKind::TypeText
    }

    fn description(&self) -> &'static str {
        "Type text into the input matching a CSS selector. Waits for the input to become visible first."
    }

    fn input_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "selector": {
                    "type": "string",
                    "description": "Unique CSS selector of the input"
                },
                "text": {
                    "type": "string",
                    "description": "Text to type"
                }
            },
            "required": ["selector", "text"]
        })
    }

    async fn execute(
        &self,
        session: &mut dyn BrowserSession,
        input: &Map<String, Value>,
        ctx: &ActionContext,
    ) -> Result<ActionResult, ActionError> {
        let selector = required_str(input, self.kind(), "selector")?;
        let text = required_str(input, self.kind(), "text")?;

        let outcome = match wait_until_visible(session, selector, ctx.type_visible, ctx.poll_interval).await {
            Ok(true) => session.type_text(selector, text).await,
            Ok(false) => Err(BrowserError::NotVisible {
                selector: selector.to_string(),
                timeout_ms: ctx.type_visible.as_millis() as u64,
            }),
            Err(e) => Err(e),
        };

        Ok(match outcome {
            Ok(()) => ActionResult::success(),
            Err(e) => ActionResult::failure(e.to_string()),
        })
    }
}
