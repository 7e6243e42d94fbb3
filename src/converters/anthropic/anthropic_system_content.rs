use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnthropicSystemContent {
    Text(String),
    Array(Vec<AnthropicSystemContentObject>),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum AnthropicSystemContentObject {
    #[serde(rename = "text")]
    Text {
        #[serde(default)]
        text: String,
    },
    #[serde(other)]
    Unknown,
}

impl AnthropicSystemContent {
    /// Flattens the system prompt; text segments are joined with a single space.
    pub fn to_text(&self) -> String {
        match self {
            AnthropicSystemContent::Text(text) => text.clone(),
            AnthropicSystemContent::Array(segments) => segments
                .iter()
                .filter_map(|segment| match segment {
                    AnthropicSystemContentObject::Text { text } => Some(text.as_str()),
                    AnthropicSystemContentObject::Unknown => None,
                })
                .collect::<Vec<_>>()
                .join(" "),
        }
    }
}
