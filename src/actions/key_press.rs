//! key_press action

use async_trait::async_trait;
use serde_json::{Map, Value};

use super::{Action, ActionContext, ActionError, ActionKind, ActionResult, required_str};
use crate::browser::BrowserSession;

pub struct KeyPressAction;

#[async_trait]
impl Action for KeyPressAction {
    fn kind(&self) -> ActionKind {
        ActionKind::KeyPress
    }

    fn description(&self) -> &'static str {
        "Press a key on the focused element, e.g. \"Enter\", \"Tab\" or \"Escape\"."
    }

    fn input_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "key": {
                    "type": "string",
                    "description": "Key name as used by KeyboardEvent.key"
                }
            },
            "required": ["key"]
        })
    }

    async fn execute(
        &self,
        session: &mut dyn BrowserSession,
        input: &Map<String, Value>,
        _ctx: &ActionContext,
    ) -> Result<ActionResult, ActionError> {
        let key = required_str(input, self.kind(), "key")?;
        if key.trim().is_empty() {
            return Ok(ActionResult::failure("key must not be empty"));
        }

        Ok(match session.press_key(key).await {
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

    #[tokio::test]
    async fn test_key_press() {
        let session = MockSession::new();
        let mut handle = session.clone();
        let input = json!({"key": "Enter"});
        let result = KeyPressAction
            .execute(&mut handle, input.as_object().unwrap(), &ActionContext::default())
            .await
            .unwrap();

        assert!(result.success);
        assert_eq!(session.operations(), vec!["key Enter"]);
    }

    #[tokio::test]
    async fn test_blank_key_is_a_failed_result() {
        let mut session = MockSession::new();
        let input = json!({"key": " "});
        let result = KeyPressAction
            .execute(&mut session, input.as_object().unwrap(), &ActionContext::default())
            .await
            .unwrap();
        assert!(!result.success);
    }
}
