use super::anthropic::{
    AnthropicContentBlock, AnthropicMessageDelta, AnthropicStreamChunk, AnthropicStreamDelta,
    AnthropicStreamMessage, AnthropicUsage,
};
use super::helpers::generate_id;
use super::responses::{ResponsesOutputItem, ResponsesResponse, ResponsesStreamEvent};
use serde_json::json;
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

/// Turns the Responses events of one upstream stream into Messages frames.
///
/// One translator per response; it is never shared. Blocks are emitted strictly
/// one after another: opening a block always closes the previous one first.
#[derive(Debug)]
pub struct StreamTranslator {
    message_id: String,
    model: String,
    block_index: u32,
    text_open: bool,
    /// Call id of the tool_use block currently open.
    open_tool_call: Option<String>,
    /// Calls that already got a `content_block_start`.
    started_calls: HashSet<String>,
    /// `output_item.added` function calls by item id, for argument deltas
    /// that only carry `item_id`.
    pending_calls: HashMap<String, PendingCall>,
    usage: AnthropicUsage,
    emitted_tool_use: bool,
    message_delta_sent: bool,
    completed: bool,
}

#[derive(Debug, Clone)]
struct PendingCall {
    call_id: String,
    name: String,
}

impl StreamTranslator {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            message_id: generate_id("msg"),
            model: model.into(),
            block_index: 0,
            text_open: false,
            open_tool_call: None,
            started_calls: HashSet::new(),
            pending_calls: HashMap::new(),
            usage: AnthropicUsage::default(),
            emitted_tool_use: false,
            message_delta_sent: false,
            completed: false,
        }
    }

    pub fn message_id(&self) -> &str {
        &self.message_id
    }

    /// True once `response.completed` has been handled; later events are ignored.
    pub fn is_completed(&self) -> bool {
        self.completed
    }

    /// The `message_start` frame, sent before any upstream event is read.
    pub fn start(&self) -> AnthropicStreamChunk {
        AnthropicStreamChunk::MessageStart {
            message: AnthropicStreamMessage::empty(self.message_id.clone(), self.model.clone()),
        }
    }

    pub fn handle(&mut self, event: ResponsesStreamEvent) -> Vec<AnthropicStreamChunk> {
        let mut out = Vec::new();
        if self.completed {
            return out;
        }

        match event {
            ResponsesStreamEvent::OutputTextDelta { delta, .. } => {
                self.close_tool(&mut out);
                if !self.text_open {
                    out.push(AnthropicStreamChunk::ContentBlockStart {
                        index: self.block_index,
                        content_block: AnthropicContentBlock::Text {
                            text: String::new(),
                        },
                    });
                    self.text_open = true;
                }
                out.push(AnthropicStreamChunk::ContentBlockDelta {
                    index: self.block_index,
                    delta: AnthropicStreamDelta::TextDelta { text: delta },
                });
            }
            ResponsesStreamEvent::OutputTextDone { .. } => self.close_text(&mut out),
            ResponsesStreamEvent::OutputItemAdded { item } => {
                if let ResponsesOutputItem::FunctionCall {
                    id, call_id, name, ..
                } = item
                {
                    if !id.is_empty() {
                        self.pending_calls.insert(id, PendingCall { call_id, name });
                    }
                }
            }
            ResponsesStreamEvent::FunctionCallArgumentsDelta {
                item_id,
                call_id,
                name,
                delta,
            } => {
                let Some(call) = self.resolve_call(item_id, call_id, name) else {
                    warn!("Argument delta without a call id or item id, dropped");
                    return out;
                };
                if !self.started_calls.contains(&call.call_id) {
                    self.close_text(&mut out);
                    self.close_tool(&mut out);
                    self.open_tool_block(call.call_id.clone(), call.name, &mut out);
                }
                if self.open_tool_call.as_deref() == Some(call.call_id.as_str()) {
                    out.push(AnthropicStreamChunk::ContentBlockDelta {
                        index: self.block_index,
                        delta: AnthropicStreamDelta::InputJsonDelta {
                            partial_json: delta,
                        },
                    });
                } else {
                    debug!("Argument delta for closed call {}, dropped", call.call_id);
                }
            }
            ResponsesStreamEvent::FunctionCallArgumentsDone { .. } => self.close_tool(&mut out),
            ResponsesStreamEvent::OutputItemDone { item } => {
                if let ResponsesOutputItem::FunctionCall {
                    id,
                    call_id,
                    name,
                    arguments,
                    ..
                } = item
                {
                    // deltas may have opened the block under the item id
                    let started = [&call_id, &id]
                        .into_iter()
                        .find(|key| !key.is_empty() && self.started_calls.contains(*key))
                        .cloned();
                    if let Some(started) = started {
                        if self.open_tool_call.as_deref() == Some(started.as_str()) {
                            self.close_tool(&mut out);
                        }
                    } else {
                        let call_id = if call_id.is_empty() { id } else { call_id };
                        // whole call delivered at once
                        self.close_text(&mut out);
                        self.close_tool(&mut out);
                        self.open_tool_block(call_id, name, &mut out);
                        let partial_json = if arguments.is_empty() {
                            "{}".to_string()
                        } else {
                            arguments
                        };
                        out.push(AnthropicStreamChunk::ContentBlockDelta {
                            index: self.block_index,
                            delta: AnthropicStreamDelta::InputJsonDelta { partial_json },
                        });
                        self.close_tool(&mut out);
                    }
                }
            }
            ResponsesStreamEvent::Completed { response } => {
                self.close_text(&mut out);
                self.close_tool(&mut out);
                out.push(self.complete(&response));
            }
            ResponsesStreamEvent::Other { event_type } => {
                debug!("Ignoring upstream event {}", event_type);
            }
        }
        out
    }

    /// Frames owed at end of input: closes whatever is open, sends
    /// `message_delta` if `response.completed` never arrived, then `message_stop`.
    pub fn finish(&mut self) -> Vec<AnthropicStreamChunk> {
        let mut out = Vec::new();
        self.close_text(&mut out);
        self.close_tool(&mut out);
        if !self.message_delta_sent {
            out.push(self.message_delta());
        }
        out.push(AnthropicStreamChunk::MessageStop);
        self.completed = true;
        out
    }

    fn complete(&mut self, response: &ResponsesResponse) -> AnthropicStreamChunk {
        if let Some(usage) = &response.usage {
            self.usage = AnthropicUsage {
                input_tokens: clamp_tokens(usage.input_tokens),
                output_tokens: clamp_tokens(usage.output_tokens),
            };
        }
        if response.has_function_call() {
            self.emitted_tool_use = true;
        }
        self.completed = true;
        self.message_delta()
    }

    fn message_delta(&mut self) -> AnthropicStreamChunk {
        self.message_delta_sent = true;
        let stop_reason = if self.emitted_tool_use {
            "tool_use"
        } else {
            "end_turn"
        };
        AnthropicStreamChunk::MessageDelta {
            delta: AnthropicMessageDelta {
                stop_reason: Some(stop_reason.to_string()),
                stop_sequence: None,
            },
            usage: self.usage,
        }
    }

    fn resolve_call(
        &self,
        item_id: Option<String>,
        call_id: Option<String>,
        name: Option<String>,
    ) -> Option<PendingCall> {
        let pending = item_id.as_ref().and_then(|id| self.pending_calls.get(id));
        let call_id = call_id
            .filter(|id| !id.is_empty())
            .or_else(|| pending.map(|call| call.call_id.clone()).filter(|id| !id.is_empty()))
            .or(item_id)?;
        let name = name
            .or_else(|| pending.map(|call| call.name.clone()))
            .unwrap_or_default();
        Some(PendingCall { call_id, name })
    }

    fn open_tool_block(&mut self, call_id: String, name: String, out: &mut Vec<AnthropicStreamChunk>) {
        out.push(AnthropicStreamChunk::ContentBlockStart {
            index: self.block_index,
            content_block: AnthropicContentBlock::ToolUse {
                id: call_id.clone(),
                name,
                input: json!({}),
            },
        });
        self.started_calls.insert(call_id.clone());
        self.open_tool_call = Some(call_id);
        self.emitted_tool_use = true;
    }

    fn close_text(&mut self, out: &mut Vec<AnthropicStreamChunk>) {
        if self.text_open {
            out.push(AnthropicStreamChunk::ContentBlockStop {
                index: self.block_index,
            });
            self.block_index += 1;
            self.text_open = false;
        }
    }

    fn close_tool(&mut self, out: &mut Vec<AnthropicStreamChunk>) {
        if self.open_tool_call.take().is_some() {
            out.push(AnthropicStreamChunk::ContentBlockStop {
                index: self.block_index,
            });
            self.block_index += 1;
        }
    }
}

fn clamp_tokens(tokens: u64) -> u32 {
    u32::try_from(tokens).unwrap_or(u32::MAX)
}
