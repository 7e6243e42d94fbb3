use crate::converters::anthropic::AnthropicContentObject;
use crate::converters::anthropic::anthropic_content_object::skip_invalid_blocks;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnthropicContent {
    Text(String),
    Array(#[serde(deserialize_with = "skip_invalid_blocks")] Vec<AnthropicContentObject>),
    /// Anything else a client sends; rendered as text.
    Other(Value),
}

impl Default for AnthropicContent {
    fn default() -> Self {
        AnthropicContent::Text(String::new())
    }
}
