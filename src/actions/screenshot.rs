//! screenshot action - save a PNG of the current page

use std::path::Path;

use async_trait::async_trait;
use serde_json::{Map, Value};

use super::{Action, ActionContext, ActionError, ActionKind, ActionResult, required_str};
use crate::browser::BrowserSession;

pub struct ScreenshotAction;

#[async_trait]
impl Action for ScreenshotAction {
    fn kind(&self) -> ActionKind {
        ActionKind::Screenshot
    }

    fn description(&self) -> &'static str {
        "Save a full-page PNG screenshot of the current page to a file."
    }

    fn input_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "File path to write the PNG to"
                }
            },
            "required": ["path"]
        })
    }

    async fn execute(
        &self,
        session: &mut dyn BrowserSession,
        input: &Map<String, Value>,
        _ctx: &ActionContext,
    ) -> Result<ActionResult, ActionError> {
        let path = required_str(input, self.kind(), "path")?;

        Ok(match session.screenshot(Path::new(path)).await {
            Ok(()) => ActionResult::success().with("path", path),
            Err(e) => ActionResult::failure(e.to_string()),
        })
    }
}
