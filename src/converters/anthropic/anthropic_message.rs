use serde::{Deserialize, Serialize};
use crate::converters::anthropic::AnthropicContent;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnthropicMessage {
    #[serde(default = "AnthropicMessage::default_role")]
    pub role: String,
    #[serde(default)]
    pub content: AnthropicContent,
}

impl AnthropicMessage {
    fn default_role() -> String {
        "user".to_string()
    }

    pub fn is_assistant(&self) -> bool {
        self.role == "assistant"
    }
}
