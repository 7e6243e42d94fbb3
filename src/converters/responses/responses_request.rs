use crate::converters::anthropic::{
    AnthropicContent, AnthropicContentObject, AnthropicMessage, AnthropicRequest, AnthropicTool,
};
use crate::converters::helpers::generate_id;
use crate::model_map::ModelMap;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use super::responses_content::ResponsesContentPart;
use super::responses_input_item::ResponsesInputItem;
use super::responses_tool::ResponsesTool;
use super::responses_tool_choice::ResponsesToolChoice;

/// Used when the client sent no system prompt; the backend rejects empty
/// instructions.
pub const DEFAULT_INSTRUCTIONS: &str = "You are a helpful assistant.";

/// Request body for the Codex Responses endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponsesRequest {
    pub model: String,
    pub input: Vec<ResponsesInputItem>,
    pub instructions: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<ResponsesTool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_choice: Option<ResponsesToolChoice>,
    pub stream: bool,
    pub store: bool,
}

/// Maps a Messages request onto a Responses request. Never fails: missing
/// pieces fall back to defaults, and `max_tokens`/`temperature` are dropped
/// because the backend does not accept them.
pub fn translate_request(request: &AnthropicRequest, models: &ModelMap) -> ResponsesRequest {
    let mut instructions = request.system_text();
    if instructions.is_empty() {
        instructions = DEFAULT_INSTRUCTIONS.to_string();
    }

    let mut input = Vec::with_capacity(request.messages.len());
    for message in &request.messages {
        input.extend(translate_message(message));
    }

    let tools: Option<Vec<ResponsesTool>> = request
        .tools
        .as_ref()
        .filter(|tools| !tools.is_empty())
        .map(|tools| tools.iter().map(translate_tool).collect());
    let tool_choice = tools.as_ref().map(|_| ResponsesToolChoice::Auto);

    ResponsesRequest {
        model: models.map(&request.model),
        input,
        instructions,
        tools,
        tool_choice,
        stream: request.is_stream(),
        store: false,
    }
}

/// One message becomes at most one `message` item (its text and images) followed
/// by its tool calls and tool results in block order.
fn translate_message(message: &AnthropicMessage) -> Vec<ResponsesInputItem> {
    let assistant = message.is_assistant();
    let role = if assistant { "assistant" } else { "user" };

    let blocks = match &message.content {
        AnthropicContent::Text(text) => {
            return vec![ResponsesInputItem::Message {
                role: role.to_string(),
                content: vec![ResponsesContentPart::text_for_role(assistant, text.clone())],
            }];
        }
        AnthropicContent::Other(value) => {
            let text = match value {
                Value::Null => String::new(),
                other => other.to_string(),
            };
            return vec![ResponsesInputItem::Message {
                role: role.to_string(),
                content: vec![ResponsesContentPart::text_for_role(assistant, text)],
            }];
        }
        AnthropicContent::Array(blocks) => blocks,
    };

    let mut parts = Vec::new();
    let mut actions = Vec::new();

    for block in blocks {
        match block {
            AnthropicContentObject::Text { text } => {
                parts.push(ResponsesContentPart::text_for_role(assistant, text.clone()));
            }
            AnthropicContentObject::Image { source } => {
                if let Some(image_url) = source.to_image_url() {
                    parts.push(ResponsesContentPart::InputImage { image_url });
                }
            }
            AnthropicContentObject::ToolUse { id, name, input } => {
                let id = non_empty(id).unwrap_or_else(|| generate_id("call"));
                let arguments = serde_json::to_string(input).unwrap_or_else(|_| "{}".to_string());
                actions.push(ResponsesInputItem::FunctionCall {
                    id: id.clone(),
                    call_id: id,
                    name: name.clone(),
                    arguments,
                });
            }
            AnthropicContentObject::ToolResult {
                tool_use_id,
                content,
                ..
            } => {
                actions.push(ResponsesInputItem::FunctionCallOutput {
                    id: None,
                    call_id: non_empty(tool_use_id).unwrap_or_else(|| generate_id("call")),
                    output: content.to_text(),
                });
            }
            AnthropicContentObject::Thinking { .. }
            | AnthropicContentObject::RedactedThinking { .. }
            | AnthropicContentObject::Unknown => {}
        }
    }

    let mut items = Vec::with_capacity(actions.len() + 1);
    if !parts.is_empty() {
        items.push(ResponsesInputItem::Message {
            role: role.to_string(),
            content: parts,
        });
    }
    items.extend(actions);
    items
}

fn translate_tool(tool: &AnthropicTool) -> ResponsesTool {
    ResponsesTool::Function {
        name: tool.name.clone(),
        description: tool.description.clone().unwrap_or_default(),
        parameters: tool
            .input_schema
            .clone()
            .unwrap_or_else(|| json!({"type": "object"})),
    }
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value.as_ref().filter(|s| !s.is_empty()).cloned()
}
