use crate::converters::anthropic::{
    AnthropicContentBlock, AnthropicStreamDelta, AnthropicStreamMessage, AnthropicUsage,
};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// One named frame of the Messages streaming protocol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum AnthropicStreamChunk {
    #[serde(rename = "message_start")]
    MessageStart { message: AnthropicStreamMessage },
    #[serde(rename = "content_block_start")]
    ContentBlockStart {
        index: u32,
        content_block: AnthropicContentBlock,
    },
    #[serde(rename = "content_block_delta")]
    ContentBlockDelta {
        index: u32,
        delta: AnthropicStreamDelta,
    },
    #[serde(rename = "content_block_stop")]
    ContentBlockStop { index: u32 },
    #[serde(rename = "message_delta")]
    MessageDelta {
        delta: AnthropicMessageDelta,
        usage: AnthropicUsage,
    },
    #[serde(rename = "message_stop")]
    MessageStop,
    #[serde(rename = "error")]
    Error { error: AnthropicErrorBody },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnthropicMessageDelta {
    pub stop_reason: Option<String>,
    pub stop_sequence: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnthropicErrorBody {
    pub r#type: String,
    pub message: String,
}

impl AnthropicStreamChunk {
    pub fn stream_type(&self) -> &'static str {
        match self {
            AnthropicStreamChunk::MessageStart { .. } => "message_start",
            AnthropicStreamChunk::ContentBlockStart { .. } => "content_block_start",
            AnthropicStreamChunk::ContentBlockDelta { .. } => "content_block_delta",
            AnthropicStreamChunk::ContentBlockStop { .. } => "content_block_stop",
            AnthropicStreamChunk::MessageDelta { .. } => "message_delta",
            AnthropicStreamChunk::MessageStop => "message_stop",
            AnthropicStreamChunk::Error { .. } => "error",
        }
    }

    /// Renders the frame exactly as it goes on the wire:
    /// `event: <name>\ndata: <json>\n\n`.
    pub fn to_sse_frame(&self) -> String {
        let data = serde_json::to_string(self).unwrap_or_else(|e| {
            warn!("Failed to serialize {} frame: {}", self.stream_type(), e);
            format!("{{\"type\":\"{}\"}}", self.stream_type())
        });
        format!("event: {}\ndata: {}\n\n", self.stream_type(), data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use regex::Regex;

    #[test]
    fn test_message_start_frame_has_null_stop_reason_and_zero_usage() {
        let chunk = AnthropicStreamChunk::MessageStart {
            message: AnthropicStreamMessage::empty("msg_1".to_string(), "gpt-5.3-codex".to_string()),
        };
        let frame = chunk.to_sse_frame();

        assert!(frame.starts_with("event: message_start\ndata: {"));
        assert!(frame.ends_with("}\n\n"));
        assert!(Regex::new(r#""stop_reason":null"#).unwrap().is_match(&frame));
        assert!(Regex::new(r#""usage":\{"input_tokens":0,"output_tokens":0\}"#).unwrap().is_match(&frame));
        assert!(Regex::new(r#""content":\[\]"#).unwrap().is_match(&frame));
    }

    #[test]
    fn test_input_json_delta_frame() {
        let chunk = AnthropicStreamChunk::ContentBlockDelta {
            index: 2,
            delta: AnthropicStreamDelta::InputJsonDelta {
                partial_json: "{\"a\":".to_string(),
            },
        };
        let frame = chunk.to_sse_frame();

        assert!(frame.starts_with("event: content_block_delta\n"));
        assert!(Regex::new(r#""index":2"#).unwrap().is_match(&frame));
        assert!(Regex::new(r#""type":"input_json_delta""#).unwrap().is_match(&frame));
        assert!(Regex::new(r#""partial_json":"\{\\"a\\":""#).unwrap().is_match(&frame));
    }

    #[test]
    fn test_message_stop_frame() {
        assert_eq!(
            AnthropicStreamChunk::MessageStop.to_sse_frame(),
            "event: message_stop\ndata: {\"type\":\"message_stop\"}\n\n"
        );
    }

    #[test]
    fn test_frame_parses_back() {
        let chunk = AnthropicStreamChunk::MessageDelta {
            delta: AnthropicMessageDelta {
                stop_reason: Some("tool_use".to_string()),
                stop_sequence: None,
            },
            usage: AnthropicUsage { input_tokens: 3, output_tokens: 9 },
        };
        let frame = chunk.to_sse_frame();
        let data = frame
            .lines()
            .find_map(|line| line.strip_prefix("data: "))
            .unwrap();
        let parsed: AnthropicStreamChunk = serde_json::from_str(data).unwrap();
        assert_eq!(parsed, chunk);
    }
}
