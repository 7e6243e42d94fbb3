use crate::converters::anthropic::{
    AnthropicContentBlock, AnthropicStreamChunk, AnthropicStreamDelta, AnthropicUsage,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Non-streaming Messages response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnthropicResponse {
    pub id: String,
    pub r#type: String,
    pub role: String,
    pub content: Vec<AnthropicContentBlock>,
    pub model: String,
    pub stop_reason: Option<String>,
    pub stop_sequence: Option<String>,
    pub usage: AnthropicUsage,
}

/// Folds the frames of one translated stream into a single response, so the
/// non-streaming reply always carries the same blocks as the streaming one.
#[derive(Debug, Default)]
pub struct AnthropicResponseBuilder {
    id: String,
    model: String,
    content: Vec<AnthropicContentBlock>,
    open_block: Option<OpenBlock>,
    stop_reason: Option<String>,
    usage: AnthropicUsage,
}

#[derive(Debug)]
enum OpenBlock {
    Text(String),
    ToolUse {
        id: String,
        name: String,
        partial_json: String,
    },
}

impl AnthropicResponseBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, chunk: &AnthropicStreamChunk) {
        match chunk {
            AnthropicStreamChunk::MessageStart { message } => {
                self.id = message.id.clone();
                self.model = message.model.clone();
            }
            AnthropicStreamChunk::ContentBlockStart { content_block, .. } => {
                self.close_block();
                self.open_block = Some(match content_block {
                    AnthropicContentBlock::Text { text } => OpenBlock::Text(text.clone()),
                    AnthropicContentBlock::ToolUse { id, name, .. } => OpenBlock::ToolUse {
                        id: id.clone(),
                        name: name.clone(),
                        partial_json: String::new(),
                    },
                });
            }
            AnthropicStreamChunk::ContentBlockDelta { delta, .. } => {
                match (&mut self.open_block, delta) {
                    (Some(OpenBlock::Text(text)), AnthropicStreamDelta::TextDelta { text: more }) => {
                        text.push_str(more)
                    }
                    (
                        Some(OpenBlock::ToolUse { partial_json, .. }),
                        AnthropicStreamDelta::InputJsonDelta { partial_json: more },
                    ) => partial_json.push_str(more),
                    _ => {}
                }
            }
            AnthropicStreamChunk::ContentBlockStop { .. } => self.close_block(),
            AnthropicStreamChunk::MessageDelta { delta, usage } => {
                self.stop_reason = delta.stop_reason.clone();
                self.usage = *usage;
            }
            AnthropicStreamChunk::MessageStop | AnthropicStreamChunk::Error { .. } => {}
        }
    }

    fn close_block(&mut self) {
        let Some(block) = self.open_block.take() else {
            return;
        };
        let block = match block {
            OpenBlock::Text(text) => AnthropicContentBlock::Text { text },
            OpenBlock::ToolUse {
                id,
                name,
                partial_json,
            } => AnthropicContentBlock::ToolUse {
                id,
                name,
                input: parse_tool_input(&partial_json),
            },
        };
        self.content.push(block);
    }

    pub fn finish(mut self) -> AnthropicResponse {
        self.close_block();
        AnthropicResponse {
            id: self.id,
            r#type: "message".to_string(),
            role: "assistant".to_string(),
            content: self.content,
            model: self.model,
            stop_reason: Some(self.stop_reason.unwrap_or_else(|| "end_turn".to_string())),
            stop_sequence: None,
            usage: self.usage,
        }
    }
}

fn parse_tool_input(partial_json: &str) -> Value {
    serde_json::from_str(partial_json)
        .ok()
        .filter(Value::is_object)
        .unwrap_or_else(|| Value::Object(serde_json::Map::new()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::converters::anthropic::{AnthropicMessageDelta, AnthropicStreamMessage};
    use serde_json::json;

    fn text_block(index: u32, parts: &[&str]) -> Vec<AnthropicStreamChunk> {
        let mut chunks = vec![AnthropicStreamChunk::ContentBlockStart {
            index,
            content_block: AnthropicContentBlock::Text { text: String::new() },
        }];
        for part in parts {
            chunks.push(AnthropicStreamChunk::ContentBlockDelta {
                index,
                delta: AnthropicStreamDelta::TextDelta { text: part.to_string() },
            });
        }
        chunks.push(AnthropicStreamChunk::ContentBlockStop { index });
        chunks
    }

    #[test]
    fn test_builder_collects_text_and_tool_blocks_in_order() {
        let mut chunks = vec![AnthropicStreamChunk::MessageStart {
            message: AnthropicStreamMessage::empty("msg_abc".to_string(), "gpt-5.3-codex".to_string()),
        }];
        chunks.extend(text_block(0, &["Hi", " there"]));
        chunks.push(AnthropicStreamChunk::ContentBlockStart {
            index: 1,
            content_block: AnthropicContentBlock::ToolUse {
                id: "c1".to_string(),
                name: "lookup".to_string(),
                input: json!({}),
            },
        });
        for part in ["{\"a\":", "1}"] {
            chunks.push(AnthropicStreamChunk::ContentBlockDelta {
                index: 1,
                delta: AnthropicStreamDelta::InputJsonDelta { partial_json: part.to_string() },
            });
        }
        chunks.push(AnthropicStreamChunk::ContentBlockStop { index: 1 });
        chunks.push(AnthropicStreamChunk::MessageDelta {
            delta: AnthropicMessageDelta {
                stop_reason: Some("tool_use".to_string()),
                stop_sequence: None,
            },
            usage: AnthropicUsage { input_tokens: 5, output_tokens: 2 },
        });
        chunks.push(AnthropicStreamChunk::MessageStop);

        let mut builder = AnthropicResponseBuilder::new();
        for chunk in &chunks {
            builder.push(chunk);
        }
        let response = builder.finish();

        assert_eq!(response.id, "msg_abc");
        assert_eq!(response.model, "gpt-5.3-codex");
        assert_eq!(
            response.content,
            vec![
                AnthropicContentBlock::Text { text: "Hi there".to_string() },
                AnthropicContentBlock::ToolUse {
                    id: "c1".to_string(),
                    name: "lookup".to_string(),
                    input: json!({"a": 1}),
                },
            ]
        );
        assert_eq!(response.stop_reason.as_deref(), Some("tool_use"));
        assert_eq!(response.usage, AnthropicUsage { input_tokens: 5, output_tokens: 2 });

        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["type"], "message");
        assert_eq!(value["stop_sequence"], serde_json::Value::Null);
    }

    #[test]
    fn test_unparseable_tool_arguments_become_empty_object() {
        let mut builder = AnthropicResponseBuilder::new();
        builder.push(&AnthropicStreamChunk::ContentBlockStart {
            index: 0,
            content_block: AnthropicContentBlock::ToolUse {
                id: "c9".to_string(),
                name: "broken".to_string(),
                input: json!({}),
            },
        });
        builder.push(&AnthropicStreamChunk::ContentBlockDelta {
            index: 0,
            delta: AnthropicStreamDelta::InputJsonDelta { partial_json: "{\"a\":".to_string() },
        });
        let response = builder.finish();

        assert_eq!(
            response.content,
            vec![AnthropicContentBlock::ToolUse {
                id: "c9".to_string(),
                name: "broken".to_string(),
                input: json!({}),
            }]
        );
        assert_eq!(response.stop_reason.as_deref(), Some("end_turn"));
    }
}
