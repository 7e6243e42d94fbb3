use serde::{Deserialize, Deserializer, Serialize, de::DeserializeOwned};
use serde_json::Value;
use tracing::warn;
use crate::converters::anthropic::AnthropicImageSource;

/// One block of a request message. Ids are optional because clients replaying
/// trimmed histories do not always send them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum AnthropicContentObject {
    #[serde(rename = "text")]
    Text {
        #[serde(default)]
        text: String,
    },
    #[serde(rename = "thinking")]
    Thinking {
        #[serde(default)]
        thinking: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        signature: Option<String>,
    },
    #[serde(rename = "redacted_thinking")]
    RedactedThinking {
        #[serde(default)]
        data: String,
    },
    #[serde(rename = "image")]
    Image { source: AnthropicImageSource },
    #[serde(rename = "tool_use")]
    ToolUse {
        #[serde(skip_serializing_if = "Option::is_none")]
        id: Option<String>,
        #[serde(default)]
        name: String,
        #[serde(default = "empty_object")]
        input: Value,
    },
    #[serde(rename = "tool_result")]
    ToolResult {
        #[serde(skip_serializing_if = "Option::is_none")]
        tool_use_id: Option<String>,
        #[serde(default)]
        content: AnthropicToolResultContent,
        #[serde(skip_serializing_if = "Option::is_none")]
        is_error: Option<bool>,
    },
    #[serde(other)]
    Unknown,
}

fn empty_object() -> Value {
    Value::Object(serde_json::Map::new())
}

/// Decodes a block list one element at a time. A block that does not decode
/// is logged and dropped; the rest of the list survives.
pub(crate) fn skip_invalid_blocks<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let values = Vec::<Value>::deserialize(deserializer)?;
    Ok(values
        .into_iter()
        .filter_map(|value| match serde_json::from_value(value) {
            Ok(block) => Some(block),
            Err(e) => {
                warn!("Dropping content block that does not decode: {}", e);
                None
            }
        })
        .collect())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnthropicToolResultContent {
    Text(String),
    Blocks(#[serde(deserialize_with = "skip_invalid_blocks")] Vec<AnthropicToolResultBlock>),
    Other(Value),
}

impl Default for AnthropicToolResultContent {
    fn default() -> Self {
        AnthropicToolResultContent::Text(String::new())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum AnthropicToolResultBlock {
    #[serde(rename = "text")]
    Text {
        #[serde(default)]
        text: String,
    },
    #[serde(other)]
    Unknown,
}

impl AnthropicToolResultContent {
    /// Flattens tool output to one string: text sub-blocks joined with a space,
    /// everything else dropped.
    pub fn to_text(&self) -> String {
        match self {
            AnthropicToolResultContent::Text(text) => text.clone(),
            AnthropicToolResultContent::Blocks(blocks) => blocks
                .iter()
                .filter_map(|block| match block {
                    AnthropicToolResultBlock::Text { text } => Some(text.as_str()),
                    AnthropicToolResultBlock::Unknown => None,
                })
                .collect::<Vec<_>>()
                .join(" "),
            AnthropicToolResultContent::Other(Value::Null) => String::new(),
            AnthropicToolResultContent::Other(value) => value.to_string(),
        }
    }
}
