use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Content block as produced by the bridge, both in `content_block_start`
/// frames and in collected non-streaming messages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum AnthropicContentBlock {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(rename = "tool_use")]
    ToolUse {
        id: String,
        name: String,
        input: Value,
    },
}
