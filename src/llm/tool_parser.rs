//! Tool parser for extracting tool calls from Anthropic API responses
//!
//! Malformed tool_use blocks are kept rather than dropped so the task loop
//! can see and report them.

use serde_json::Value;

use crate::llm::types::{CompletionResponse, StopReason, ToolCall, Usage};

/// Parse a raw Anthropic API response into a CompletionResponse
///
/// Handles both text and tool_use content blocks from the response.
pub fn parse_response(response: &Value) -> CompletionResponse {
    let mut content = String::new();
    let mut tool_calls = Vec::new();

    if let Some(content_blocks) = response.get("content").and_then(|c| c.as_array()) {
        for block in content_blocks {
            match block.get("type").and_then(|t| t.as_str()) {
                Some("text") => {
                    if let Some(text) = block.get("text").and_then(|t| t.as_str()) {
                        if !content.is_empty() {
                            content.push('\n');
                        }
                        content.push_str(text);
                    }
                }
                Some("tool_use") => tool_calls.push(parse_tool_use_block(block)),
                _ => {} // Skip unknown block types
            }
        }
    }

    let stop_reason = response
        .get("stop_reason")
        .and_then(|s| s.as_str())
        .map(parse_stop_reason)
        .unwrap_or(StopReason::EndTurn);

    let usage = response.get("usage").map(parse_usage).unwrap_or_default();

    CompletionResponse {
        content,
        tool_calls,
        stop_reason,
        usage,
    }
}

/// Parse a single tool_use content block into a ToolCall
///
/// Missing fields become empty name / null input.
fn parse_tool_use_block(block: &Value) -> ToolCall {
    let id = block.get("id").and_then(|v| v.as_str()).unwrap_or_default();
    let name = block.get("name").and_then(|v| v.as_str()).unwrap_or_default();
    let input = block.get("input").cloned().unwrap_or(Value::Null);

    ToolCall::new(id, name, input)
}

/// Parse stop reason string into StopReason enum
fn parse_stop_reason(reason: &str) -> StopReason {
    match reason {
        "end_turn" => StopReason::EndTurn,
        "tool_use" => StopReason::ToolUse,
        "max_tokens" => StopReason::MaxTokens,
        "stop_sequence" => StopReason::StopSequence,
        _ => StopReason::EndTurn,
    }
}

/// Parse usage object from response
fn parse_usage(usage: &Value) -> Usage {
    Usage {
        input_tokens: usage.get("input_tokens").and_then(|v| v.as_u64()).unwrap_or(0),
        output_tokens: usage.get("output_tokens").and_then(|v| v.as_u64()).unwrap_or(0),
    }
}
