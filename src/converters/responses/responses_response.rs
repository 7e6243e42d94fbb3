use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

use super::responses_output_item::ResponsesOutputItem;
use super::responses_usage::ResponsesUsage;

/// The `response` object of a `response.completed` event. Only usage and the
/// output kinds matter to the bridge; the rest is kept for logging.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResponsesResponse {
    #[serde(default)]
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default)]
    pub output: Vec<ResponsesOutputItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<ResponsesUsage>,
    #[serde(flatten)]
    #[serde(default)]
    pub extra: HashMap<String, Value>,
}

impl ResponsesResponse {
    pub fn has_function_call(&self) -> bool {
        self.output.iter().any(ResponsesOutputItem::is_function_call)
    }
}
