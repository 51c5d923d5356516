//! Action registry - registration, definitions and dispatch

use std::collections::BTreeMap;

use log::debug;
use serde_json::Value;

use super::{
    Action, ActionContext, ActionError, ActionKind, ActionResult, CheckSelectorAction, ClickAction,
    GetContentAction, GetCurrentUrlAction, KeyPressAction, NavigateAction, ScreenshotAction, TypeTextAction,
};
use crate::browser::BrowserSession;
use crate::llm::ToolDefinition;

/// Holds the registered actions and the waits they run with
pub struct ActionRegistry {
    actions: BTreeMap<ActionKind, Box<dyn Action>>,
    context: ActionContext,
}

impl ActionRegistry {
    /// Empty registry (for custom action sets)
    pub fn new(context: ActionContext) -> Self {
        Self {
            actions: BTreeMap::new(),
            context,
        }
    }

    /// Registry with every built-in action
    pub fn standard(context: ActionContext) -> Result<Self, ActionError> {
        let mut registry = Self::new(context);

        // Navigation
        registry.register(Box::new(NavigateAction))?;
        registry.register(Box::new(GetCurrentUrlAction))?;

        // Element interaction
        registry.register(Box::new(ClickAction))?;
        registry.register(Box::new(TypeTextAction))?;
        registry.register(Box::new(CheckSelectorAction))?;
        registry.register(Box::new(KeyPressAction))?;

        // Inspection
        registry.register(Box::new(GetContentAction))?;
        registry.register(Box::new(ScreenshotAction))?;

        Ok(registry)
    }

    /// Add an action after checking its name and schema
    pub fn register(&mut self, action: Box<dyn Action>) -> Result<(), ActionError> {
        let kind = ActionKind::from_name(action.name()).ok_or_else(|| ActionError::InvalidSchema {
            action: action.name().to_string(),
            message: "name does not match any action kind".to_string(),
        })?;
        if kind != action.kind() {
            return Err(ActionError::InvalidSchema {
                action: action.name().to_string(),
                message: format!("name resolves to {} but action declares {}", kind, action.kind()),
            });
        }
        validate_schema(action.name(), &action.input_schema())?;

        if self.actions.contains_key(&kind) {
            return Err(ActionError::DuplicateAction {
                name: action.name().to_string(),
            });
        }
        self.actions.insert(kind, action);
        Ok(())
    }

    /// Tool definitions for the model, in `ActionKind` order
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.actions
            .values()
            .map(|a| ToolDefinition::new(a.name(), a.description(), a.input_schema()))
            .collect()
    }

    pub fn has_action(&self, name: &str) -> bool {
        ActionKind::from_name(name).is_some_and(|kind| self.actions.contains_key(&kind))
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.actions.values().map(|a| a.name()).collect()
    }

    pub fn context(&self) -> &ActionContext {
        &self.context
    }

    /// Run the action called `name` with `params`.
    ///
    /// Errors only when the request cannot be attempted: unknown name,
    /// non-object parameters or a missing required field.
    pub async fn dispatch(
        &self,
        session: &mut dyn BrowserSession,
        name: &str,
        params: &Value,
    ) -> Result<ActionResult, ActionError> {
        let action = ActionKind::from_name(name)
            .and_then(|kind| self.actions.get(&kind))
            .ok_or_else(|| ActionError::UnknownAction { name: name.to_string() })?;

        let input = params.as_object().ok_or_else(|| ActionError::InvalidInput {
            action: name.to_string(),
            message: "parameters must be an object".to_string(),
        })?;

        let schema = action.input_schema();
        for field in required_fields(&schema) {
            if !input.contains_key(field) {
                return Err(ActionError::InvalidInput {
                    action: name.to_string(),
                    message: format!("missing required parameter '{}'", field),
                });
            }
        }

        debug!("dispatch {} {}", name, params);
        action.execute(session, input, &self.context).await
    }
}

fn required_fields(schema: &Value) -> impl Iterator<Item = &str> {
    schema["required"]
        .as_array()
        .into_iter()
        .flatten()
        .filter_map(Value::as_str)
}

fn validate_schema(action: &str, schema: &Value) -> Result<(), ActionError> {
    let invalid = |message: String| ActionError::InvalidSchema {
        action: action.to_string(),
        message,
    };

    if schema["type"] != "object" {
        return Err(invalid("schema type must be \"object\"".to_string()));
    }
    let properties = schema["properties"]
        .as_object()
        .ok_or_else(|| invalid("schema must declare properties".to_string()))?;

    if let Some(required) = schema.get("required") {
        let required = required
            .as_array()
            .ok_or_else(|| invalid("required must be an array".to_string()))?;
        for field in required {
            let field = field
                .as_str()
                .ok_or_else(|| invalid("required entries must be strings".to_string()))?;
            if !properties.contains_key(field) {
                return Err(invalid(format!("required field '{}' is not a declared property", field)));
            }
        }
    }
    Ok(())
}
