use serde::{Deserialize, Deserializer, de::Error as _};
use serde_json::Value;

use super::responses_output_item::ResponsesOutputItem;
use super::responses_response::ResponsesResponse;

/// One event of the Responses streaming protocol, keyed by its `type` string.
///
/// The backend sends the type with a `response.` prefix
/// (`response.output_text.delta`); the bare form is accepted too. Event types
/// the translator does not act on land in `Other` and are ignored downstream.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponsesStreamEvent {
    OutputTextDelta {
        item_id: Option<String>,
        delta: String,
    },
    OutputTextDone {
        item_id: Option<String>,
    },
    OutputItemAdded {
        item: ResponsesOutputItem,
    },
    FunctionCallArgumentsDelta {
        item_id: Option<String>,
        call_id: Option<String>,
        name: Option<String>,
        delta: String,
    },
    FunctionCallArgumentsDone {
        item_id: Option<String>,
        call_id: Option<String>,
    },
    OutputItemDone {
        item: ResponsesOutputItem,
    },
    Completed {
        response: ResponsesResponse,
    },
    Other {
        event_type: String,
    },
}

impl<'de> Deserialize<'de> for ResponsesStreamEvent {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw_value = Value::deserialize(deserializer)?;
        let mut raw_object = match raw_value {
            Value::Object(map) => map,
            _ => {
                return Err(D::Error::custom(
                    "expected ResponsesStreamEvent to deserialize from an object",
                ));
            }
        };

        let event_type = match raw_object.remove("type") {
            Some(Value::String(s)) => s,
            Some(_) => {
                return Err(D::Error::custom(
                    "expected `type` field to be a string for ResponsesStreamEvent",
                ));
            }
            None => return Err(D::Error::missing_field("type")),
        };

        let payload = Value::Object(raw_object);
        let kind = event_type.strip_prefix("response.").unwrap_or(&event_type);

        let event = match kind {
            "output_text.delta" => {
                let data: TextDeltaEnvelope =
                    serde_json::from_value(payload).map_err(D::Error::custom)?;
                ResponsesStreamEvent::OutputTextDelta {
                    item_id: data.item_id,
                    delta: data.delta,
                }
            }
            "output_text.done" => {
                let data: ItemRefEnvelope =
                    serde_json::from_value(payload).map_err(D::Error::custom)?;
                ResponsesStreamEvent::OutputTextDone {
                    item_id: data.item_id,
                }
            }
            "output_item.added" => {
                let data: OutputItemEnvelope =
                    serde_json::from_value(payload).map_err(D::Error::custom)?;
                ResponsesStreamEvent::OutputItemAdded { item: data.item }
            }
            "function_call_arguments.delta" => {
                let data: ArgumentsDeltaEnvelope =
                    serde_json::from_value(payload).map_err(D::Error::custom)?;
                ResponsesStreamEvent::FunctionCallArgumentsDelta {
                    item_id: data.item_id,
                    call_id: data.call_id,
                    name: data.name,
                    delta: data.delta,
                }
            }
            "function_call_arguments.done" => {
                let data: ItemRefEnvelope =
                    serde_json::from_value(payload).map_err(D::Error::custom)?;
                ResponsesStreamEvent::FunctionCallArgumentsDone {
                    item_id: data.item_id,
                    call_id: data.call_id,
                }
            }
            "output_item.done" => {
                let data: OutputItemEnvelope =
                    serde_json::from_value(payload).map_err(D::Error::custom)?;
                ResponsesStreamEvent::OutputItemDone { item: data.item }
            }
            "completed" => {
                let data: CompletedEnvelope =
                    serde_json::from_value(payload).map_err(D::Error::custom)?;
                ResponsesStreamEvent::Completed {
                    response: data.response,
                }
            }
            _ => ResponsesStreamEvent::Other { event_type },
        };

        Ok(event)
    }
}

#[derive(Deserialize)]
struct TextDeltaEnvelope {
    #[serde(default)]
    item_id: Option<String>,
    #[serde(default)]
    delta: String,
}

#[derive(Deserialize)]
struct ItemRefEnvelope {
    #[serde(default)]
    item_id: Option<String>,
    #[serde(default)]
    call_id: Option<String>,
}

#[derive(Deserialize)]
struct ArgumentsDeltaEnvelope {
    #[serde(default)]
    item_id: Option<String>,
    #[serde(default)]
    call_id: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    delta: String,
}

#[derive(Deserialize)]
struct OutputItemEnvelope {
    item: ResponsesOutputItem,
}

#[derive(Deserialize)]
struct CompletedEnvelope {
    #[serde(default)]
    response: ResponsesResponse,
}
