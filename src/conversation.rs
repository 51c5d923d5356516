//! Conversation channel - stateful message exchange with the model
//!
//! The loop talks to the model one message at a time: the task, then one
//! action result (or diagnostic) per send. The Messages API requires every
//! `tool_use` block to be answered by a `tool_result` in the next user turn,
//! so the channel tracks which calls of the latest assistant turn are still
//! open and closes them all on the next send:
//!
//! - a `FunctionResult` answers the open call with its request id
//! - open calls the caller will still run get a "result follows" note
//! - every other open call is closed as not executed
//! - a result whose call is no longer open goes out as plain text

use std::sync::Arc;

use log::debug;
use serde_json::{Map, Value};

use crate::error::Result;
use crate::llm::{
    CompletionRequest, ContentBlock, LlmClient, Message, Role, ToolCall, ToolDefinition, ToolResult, Usage,
};

const QUEUED: &str = "Queued: the result follows in a later message";
const NOT_EXECUTED: &str = "Not executed";

/// What the loop sends into the channel
#[derive(Debug, Clone, PartialEq)]
pub enum Outgoing {
    Text(String),
    /// `id` is the request id the result belongs to
    FunctionResult { id: String, name: String, response: Value },
}

/// One action the model asked for
#[derive(Debug, Clone, PartialEq)]
pub struct ActionRequest {
    pub id: String,
    /// `None` when the model sent a blank name
    pub name: Option<String>,
    /// `None` when the model's input was not a JSON object
    pub parameters: Option<Map<String, Value>>,
}

impl ActionRequest {
    pub fn is_well_formed(&self) -> bool {
        self.name.is_some() && self.parameters.is_some()
    }

    /// Name for diagnostics, even when missing
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("<unnamed>")
    }
}

impl From<&ToolCall> for ActionRequest {
    fn from(call: &ToolCall) -> Self {
        let name = call.name.trim();
        Self {
            id: call.id.clone(),
            name: (!name.is_empty()).then(|| name.to_string()),
            parameters: call.input.as_object().cloned(),
        }
    }
}

/// The model's answer to one send
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Reply {
    pub text: Option<String>,
    pub requests: Vec<ActionRequest>,
}

impl Reply {
    pub fn text_or_empty(&self) -> &str {
        self.text.as_deref().unwrap_or("")
    }
}

/// Owns the history and talks to an `LlmClient`
pub struct Conversation {
    client: Arc<dyn LlmClient>,
    system: String,
    tools: Vec<ToolDefinition>,
    messages: Vec<Message>,
    /// Calls from the latest assistant turn that have no result yet
    pending: Vec<ToolCall>,
    usage: Usage,
    max_tokens: u32,
}

impl Conversation {
    pub fn new(client: Arc<dyn LlmClient>, system: impl Into<String>, tools: Vec<ToolDefinition>) -> Self {
        Self {
            client,
            system: system.into(),
            tools,
            messages: Vec::new(),
            pending: Vec::new(),
            usage: Usage::default(),
            max_tokens: 4096,
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn set_system(&mut self, system: impl Into<String>) {
        self.system = system.into();
    }

    pub fn system(&self) -> &str {
        &self.system
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn usage(&self) -> &Usage {
        &self.usage
    }

    /// Send one message and wait for the model's reply.
    ///
    /// On failure the outgoing message is rolled back, so the history stays
    /// a valid alternation.
    pub async fn send(&mut self, outgoing: Outgoing) -> Result<Reply> {
        self.send_with_queued(outgoing, &[]).await
    }

    /// Like `send`, but open calls whose id is in `queued` are told their
    /// result comes later instead of being closed as not executed.
    pub async fn send_with_queued(&mut self, outgoing: Outgoing, queued: &[String]) -> Result<Reply> {
        let pending = std::mem::take(&mut self.pending);
        let message = compose(outgoing, &pending, queued);
        self.messages.push(message);

        let request = CompletionRequest::new(self.system.clone())
            .with_messages(self.messages.clone())
            .with_tools(self.tools.clone())
            .with_max_tokens(self.max_tokens);

        let response = match self.client.complete(request).await {
            Ok(response) => response,
            Err(e) => {
                self.messages.pop();
                self.pending = pending;
                return Err(e);
            }
        };

        self.usage.add(&response.usage);
        debug!(
            "reply: {} chars, {} tool calls, stop {:?}",
            response.content.len(),
            response.tool_calls.len(),
            response.stop_reason
        );

        let assistant = if response.content.is_empty() && response.tool_calls.is_empty() {
            Message::assistant("(no response)")
        } else {
            response.to_message()
        };
        self.messages.push(assistant);
        self.pending = response.tool_calls.clone();

        let text = response.content.trim();
        Ok(Reply {
            text: (!text.is_empty()).then(|| response.content.clone()),
            requests: response.tool_calls.iter().map(ActionRequest::from).collect(),
        })
    }
}

/// Build the user turn for `outgoing`, closing every call in `pending`
fn compose(outgoing: Outgoing, pending: &[ToolCall], queued: &[String]) -> Message {
    let (answer, text) = match outgoing {
        Outgoing::Text(text) => (None, Some(text)),
        Outgoing::FunctionResult { id, name, response } => {
            if pending.iter().any(|call| call.id == id) {
                (Some((id, response)), None)
            } else {
                let text = format!("Result of {} (call {}): {}", name, id, response);
                (None, Some(text))
            }
        }
    };

    let mut blocks: Vec<ContentBlock> = pending
        .iter()
        .map(|call| {
            let result = match &answer {
                Some((id, response)) if *id == call.id => {
                    if response.get("success").and_then(Value::as_bool) == Some(false) {
                        ToolResult::error(call.id.clone(), response.to_string())
                    } else {
                        ToolResult::success(call.id.clone(), response.to_string())
                    }
                }
                _ if queued.contains(&call.id) => ToolResult::success(call.id.clone(), QUEUED),
                _ => ToolResult::error(call.id.clone(), NOT_EXECUTED),
            };
            ContentBlock::from(result)
        })
        .collect();

    match text {
        Some(text) if blocks.is_empty() => Message::user(text),
        Some(text) => {
            blocks.push(ContentBlock::Text { text });
            Message::blocks(Role::User, blocks)
        }
        None => Message::blocks(Role::User, blocks),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SurfrError;
    use crate::llm::{CompletionResponse, MessageContent, MockLlmClient};
    use serde_json::json;

    fn conversation(mock: Arc<MockLlmClient>) -> Conversation {
        Conversation::new(mock, "You drive a browser", vec![])
    }

    fn blocks(message: &Message) -> &[ContentBlock] {
        match &message.content {
            MessageContent::Blocks(blocks) => blocks,
            MessageContent::Text(_) => panic!("expected blocks"),
        }
    }

    #[tokio::test]
    async fn test_send_text_returns_reply() {
        let mock = Arc::new(MockLlmClient::new(vec![CompletionResponse::text("Done.")]));
        let mut conv = conversation(mock.clone());

        let reply = conv.send(Outgoing::Text("open example.com".into())).await.unwrap();
        assert_eq!(reply.text.as_deref(), Some("Done."));
        assert!(reply.requests.is_empty());
        assert_eq!(conv.messages().len(), 2);
        assert_eq!(mock.requests()[0].system, "You drive a browser");
    }

    #[tokio::test]
    async fn test_blank_text_is_none() {
        let mock = Arc::new(MockLlmClient::new(vec![CompletionResponse::tool_use(
            "  ",
            vec![ToolCall::new("t1", "get_content", json!({}))],
        )]));
        let mut conv = conversation(mock);
        let reply = conv.send(Outgoing::Text("go".into())).await.unwrap();
        assert!(reply.text.is_none());
        assert_eq!(reply.requests.len(), 1);
    }

    #[tokio::test]
    async fn test_function_result_answers_matching_call() {
        let mock = Arc::new(MockLlmClient::new(vec![
            CompletionResponse::tool_use(
                "",
                vec![ToolCall::new("t1", "navigate", json!({"url": "https://example.com"}))],
            ),
            CompletionResponse::text("Done."),
        ]));
        let mut conv = conversation(mock.clone());

        conv.send(Outgoing::Text("go".into())).await.unwrap();
        conv.send(Outgoing::FunctionResult {
            id: "t1".into(),
            name: "navigate".into(),
            response: json!({"success": true}),
        })
        .await
        .unwrap();

        let requests = mock.requests();
        let last = requests[1].messages.last().unwrap();
        assert_eq!(last.role, Role::User);
        assert_eq!(
            blocks(last),
            &[ContentBlock::ToolResult {
                tool_use_id: "t1".into(),
                content: "{\"success\":true}".into(),
                is_error: false,
            }]
        );
    }

    fn two_clicks() -> CompletionResponse {
        CompletionResponse::tool_use(
            "",
            vec![
                ToolCall::new("t1", "click", json!({"selector": "#a"})),
                ToolCall::new("t2", "click", json!({"selector": "#b"})),
            ],
        )
    }

    #[tokio::test]
    async fn test_result_answers_its_own_id() {
        let mock = Arc::new(MockLlmClient::new(vec![two_clicks(), CompletionResponse::text("ok")]));
        let mut conv = conversation(mock.clone());

        conv.send(Outgoing::Text("go".into())).await.unwrap();
        conv.send(Outgoing::FunctionResult {
            id: "t2".into(),
            name: "click".into(),
            response: json!({"success": false, "error": "not visible"}),
        })
        .await
        .unwrap();

        let requests = mock.requests();
        let results = blocks(requests[1].messages.last().unwrap());
        assert_eq!(results.len(), 2);
        assert!(matches!(&results[0], ContentBlock::ToolResult { tool_use_id, is_error: true, content }
            if tool_use_id == "t1" && content == NOT_EXECUTED));
        assert!(matches!(&results[1], ContentBlock::ToolResult { tool_use_id, is_error: true, content }
            if tool_use_id == "t2" && content.contains("not visible")));
    }

    #[tokio::test]
    async fn test_queued_calls_are_not_reported_as_skipped() {
        let mock = Arc::new(MockLlmClient::new(vec![two_clicks(), CompletionResponse::text("ok")]));
        let mut conv = conversation(mock.clone());

        conv.send(Outgoing::Text("go".into())).await.unwrap();
        conv.send_with_queued(
            Outgoing::FunctionResult {
                id: "t1".into(),
                name: "click".into(),
                response: json!({"success": true}),
            },
            &["t2".to_string()],
        )
        .await
        .unwrap();

        let requests = mock.requests();
        let results = blocks(requests[1].messages.last().unwrap());
        assert!(matches!(&results[0], ContentBlock::ToolResult { tool_use_id, is_error: false, content }
            if tool_use_id == "t1" && content == "{\"success\":true}"));
        assert!(matches!(&results[1], ContentBlock::ToolResult { tool_use_id, is_error: false, content }
            if tool_use_id == "t2" && content == QUEUED));
    }

    #[tokio::test]
    async fn test_unmatched_result_goes_out_as_text() {
        let mock = Arc::new(MockLlmClient::new(vec![
            CompletionResponse::text("hello"),
            CompletionResponse::text("ok"),
        ]));
        let mut conv = conversation(mock.clone());

        conv.send(Outgoing::Text("go".into())).await.unwrap();
        conv.send(Outgoing::FunctionResult {
            id: "t9".into(),
            name: "get_current_url".into(),
            response: json!({"success": true, "url": "about:blank"}),
        })
        .await
        .unwrap();

        let last = mock.requests()[1].messages.last().cloned().unwrap();
        assert!(last.text().starts_with("Result of get_current_url (call t9): "));
    }

    #[tokio::test]
    async fn test_text_closes_pending_calls() {
        let mock = Arc::new(MockLlmClient::new(vec![
            CompletionResponse::tool_use("", vec![ToolCall::new("t1", "scroll", json!({}))]),
            CompletionResponse::text("ok"),
        ]));
        let mut conv = conversation(mock.clone());

        conv.send(Outgoing::Text("go".into())).await.unwrap();
        conv.send(Outgoing::Text("Error executing action scroll: Unknown action: scroll".into()))
            .await
            .unwrap();

        let last = mock.requests()[1].messages.last().cloned().unwrap();
        let sent = blocks(&last);
        assert!(matches!(&sent[0], ContentBlock::ToolResult { tool_use_id, .. } if tool_use_id == "t1"));
        assert!(matches!(&sent[1], ContentBlock::Text { text } if text.contains("scroll")));
    }

    #[tokio::test]
    async fn test_failed_send_rolls_back() {
        let mock = Arc::new(MockLlmClient::new(vec![CompletionResponse::tool_use(
            "",
            vec![ToolCall::new("t1", "get_content", json!({}))],
        )]));
        let mut conv = conversation(mock.clone());

        conv.send(Outgoing::Text("go".into())).await.unwrap();
        let err = conv.send(Outgoing::Text("again".into())).await.unwrap_err();
        assert!(matches!(err, SurfrError::Llm(_)));
        assert_eq!(conv.messages().len(), 2);
        assert_eq!(conv.pending.len(), 1);
    }

    #[tokio::test]
    async fn test_usage_accumulates() {
        let mut first = CompletionResponse::text("a");
        first.usage = Usage::new(10, 5);
        let mut second = CompletionResponse::text("b");
        second.usage = Usage::new(20, 5);
        let mock = Arc::new(MockLlmClient::new(vec![first, second]));
        let mut conv = conversation(mock);

        conv.send(Outgoing::Text("1".into())).await.unwrap();
        conv.send(Outgoing::Text("2".into())).await.unwrap();
        assert_eq!(conv.usage().total(), 40);
    }

    #[test]
    fn test_action_request_from_malformed_call() {
        let request = ActionRequest::from(&ToolCall::new("t1", " ", json!({})));
        assert!(!request.is_well_formed());
        assert_eq!(request.display_name(), "<unnamed>");

        let request = ActionRequest::from(&ToolCall::new("t2", "click", Value::Null));
        assert!(!request.is_well_formed());
        assert_eq!(request.display_name(), "click");
    }
}
