//! get_current_url action

use async_trait::async_trait;
use serde_json::{Map, Value};

use super::{Action, ActionContext, ActionError, ActionKind, ActionResult};
use crate::browser::BrowserSession;

pub struct GetCurrentUrlAction;

#[async_trait]
impl Action for GetCurrentUrlAction {
    fn kind(&self) -> ActionKind {
        ActionKind::GetCurrentUrl
    }

    fn description(&self) -> &'static str {
        "Return the URL of the current page."
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
        _ctx: &ActionContext,
    ) -> Result<ActionResult, ActionError> {
        Ok(match session.current_url().await {
            Ok(url) => ActionResult::success().with("url", url),
            Err(e) => ActionResult::failure(e.to_string()),
        })
    }
}
