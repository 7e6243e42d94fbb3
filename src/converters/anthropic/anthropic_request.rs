use crate::converters::anthropic::{
    AnthropicContent, AnthropicContentObject, AnthropicMessage, AnthropicSystemContent,
    AnthropicTool,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Messages API request body. Every field is defaulted so partial bodies
/// still translate; fields the backend cannot take are kept only so they show
/// up in debug logs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnthropicRequest {
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub messages: Vec<AnthropicMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<AnthropicSystemContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<AnthropicTool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream: Option<bool>,
    /// Sampling limits the backend does not take; kept untyped so an odd value
    /// never rejects the request.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<serde_json::Value>,
    #[serde(flatten)]
    pub extra_fields: HashMap<String, serde_json::Value>,
}

impl AnthropicRequest {
    pub fn is_stream(&self) -> bool {
        self.stream.unwrap_or(false)
    }

    pub fn system_text(&self) -> String {
        self.system
            .as_ref()
            .map(AnthropicSystemContent::to_text)
            .unwrap_or_default()
    }

    /// Rough token estimate for `count_tokens`: one token per four characters of
    /// system and message text.
    pub fn estimated_input_tokens(&self) -> u64 {
        let mut chars = self.system_text().chars().count();
        for message in &self.messages {
            match &message.content {
                AnthropicContent::Text(text) => chars += text.chars().count(),
                AnthropicContent::Array(blocks) => {
                    for block in blocks {
                        if let AnthropicContentObject::Text { text } = block {
                            chars += text.chars().count();
                        }
                    }
                }
                AnthropicContent::Other(_) => {}
            }
        }
        (chars / 4) as u64
    }

    /// Short preview of the last message for request logs.
    pub fn last_message_preview(&self, max_chars: usize) -> Option<String> {
        let last = self.messages.last()?;
        let text = match &last.content {
            AnthropicContent::Text(text) => text.clone(),
            other => serde_json::to_string(other).unwrap_or_default(),
        };
        Some(text.chars().take(max_chars).collect())
    }
}
