use serde::{Deserialize, Serialize};

use super::responses_content::ResponsesContentPart;

/// Item of a Responses `output` array, as carried by `output_item.added`,
/// `output_item.done` and the final `response.completed` payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResponsesOutputItem {
    Message {
        #[serde(default)]
        id: String,
        #[serde(default)]
        role: String,
        #[serde(default)]
        content: Vec<ResponsesContentPart>,
    },
    FunctionCall {
        #[serde(default)]
        id: String,
        #[serde(default)]
        call_id: String,
        #[serde(default)]
        name: String,
        #[serde(default)]
        arguments: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        status: Option<String>,
    },
    #[serde(other)]
    Unknown,
}

impl ResponsesOutputItem {
    pub fn is_function_call(&self) -> bool {
        matches!(self, ResponsesOutputItem::FunctionCall { .. })
    }
}
