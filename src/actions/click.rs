//! click action - wait for an element to become visible, then click it

use async_trait::async_trait;
use serde_json::{Map, Value};

use super::{Action, ActionContext, ActionError, ActionKind, ActionResult, required_str, wait_until_visible};
use crate::browser::{BrowserError, BrowserSession};

pub struct ClickAction;

#[async_trait]
impl Action for ClickAction {
    fn kind(&self) -> ActionKind {
        ActionKind::Click
    }

    fn description(&self) -> &'static str {
        "Click the element matching a CSS selector. Waits for the element to become visible first."
    }

    fn input_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "selector": {
                    "type": "string",
                    "description": "Unique CSS selector of the element to click"
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

        let outcome = match wait_until_visible(session, selector, ctx.click_visible, ctx.poll_interval).await {
            Ok(true) => session.click(selector).await,
            Ok(false) => Err(BrowserError::NotVisible {
                selector: selector.to_string(),
                timeout_ms: ctx.click_visible.as_millis() as u64,
            }),
            Err(e) => Err(e),
        };

        Ok(match outcome {
            Ok(()) => ActionResult::success(),
            Err(e) => ActionResult::failure(e.to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::MockSession;
    use serde_json::json;
    use std::time::Duration;

    fn fast() -> ActionContext {
        ActionContext {
            click_visible: Duration::from_millis(30),
            poll_interval: Duration::from_millis(10),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_click_visible_element() {
        let session = MockSession::new().with_visible("#submit");
        let mut handle = session.clone();
        let input = json!({"selector": "#submit"});
        let result = ClickAction
            .execute(&mut handle, input.as_object().unwrap(), &fast())
            .await
            .unwrap();

        assert!(result.success);
        assert!(result.error.is_none());
        assert_eq!(session.operations(), vec!["click #submit"]);
    }

    #[tokio::test]
    async fn test_click_hidden_element_times_out() {
        let session = MockSession::new().with_hidden("#submit");
        let mut handle = session.clone();
        let input = json!({"selector": "#submit"});
        let result = ClickAction
            .execute(&mut handle, input.as_object().unwrap(), &fast())
            .await
            .unwrap();

        assert!(!result.success);
        assert!(result.error.unwrap().contains("not visible"));
        assert!(session.operations().is_empty());
    }
}
