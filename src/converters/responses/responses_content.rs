use serde::{Deserialize, Serialize};

/// Content part of a Responses `message` item. Only the parts the bridge
/// produces or reads back are modelled; anything else deserializes to
/// `Unknown`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResponsesContentPart {
    InputText {
        #[serde(default)]
        text: String,
    },
    OutputText {
        #[serde(default)]
        text: String,
    },
    InputImage {
        #[serde(default)]
        image_url: String,
    },
    #[serde(other)]
    Unknown,
}

impl ResponsesContentPart {
    /// Text part tagged for the speaker: `output_text` for the assistant,
    /// `input_text` for everyone else.
    pub fn text_for_role(assistant: bool, text: String) -> Self {
        if assistant {
            ResponsesContentPart::OutputText { text }
        } else {
            ResponsesContentPart::InputText { text }
        }
    }
}
