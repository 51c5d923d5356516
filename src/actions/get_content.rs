//! get_content action

use async_trait::async_trait;
use serde_json::{Map, Value};

use super::{Action, ActionContext, ActionError, ActionKind, ActionResult, truncate_utf8};
use crate::browser::BrowserSession;

pub struct GetContentAction;

#[async_trait]
impl Action for GetContentAction {
    fn kind(&self) -> ActionKind {
        ActionKind::GetContent
    }

    fn description(&self) -> &'static str {
        "Return the HTML of the current page."
    }

    fn input_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {}
        })
    }

    async fn execute(
        &self,
        session: &mut dyn BrowserSession,
        _input: &Map<String, Value>,
        ctx: &ActionContext,
    ) -> Result<ActionResult, ActionError> {
        Ok(match session.content().await {
            Ok(html) => ActionResult::success().with("content", truncate_utf8(&html, ctx.max_content_bytes)),
            Err(e) => ActionResult::failure(e.to_string()).with("content", ""),
        })
    }
}
