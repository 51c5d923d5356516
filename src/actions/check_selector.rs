//! check_selector action - report whether an element is visible

use async_trait::async_trait;
use serde_json::{Map, Value};

use super::{Action, ActionContext, ActionError, ActionKind, ActionResult, required_str, wait_until_visible};
use crate::browser::BrowserSession;

pub struct CheckSelectorAction;

#[async_trait]
impl Action for CheckSelectorAction {
    fn kind(&self) -> ActionKind {
        ActionKind::CheckSelector
    }

    fn description(&self) -> &'static str {
        "Check whether an element matching a CSS selector exists and is visible. \
         Use this before clicking or typing."
    }

    fn input_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "selector": {
                    "type": "string",
                    "description": "CSS selector to check"
                }
            },
            "required": ["selector"]
        })
    }

    async fn execute(
        &self,
        session: &mut dyn BrowserSession,
        input: &Map<String, Value>,
        ctx: &ActionContext,
    ) -> Result<ActionResult, ActionError> {
        let selector = required_str(input, self.kind(), "selector")?;

        let result = match wait_until_visible(session, selector, ctx.check_selector, ctx.poll_interval).await {
            Ok(visible) => ActionResult::success().with("is_visible", visible),
            Err(e) => ActionResult::failure(e.to_string()).with("is_visible", false),
        };
        Ok(result)
    }
}
