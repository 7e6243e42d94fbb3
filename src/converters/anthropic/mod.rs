pub mod anthropic_content;
pub mod anthropic_content_block;
pub mod anthropic_content_object;
pub mod anthropic_image_source;
pub mod anthropic_message;
pub mod anthropic_request;
pub mod anthropic_response;
pub mod anthropic_stream_chunk;
pub mod anthropic_stream_delta;
pub mod anthropic_stream_message;
pub mod anthropic_system_content;
pub mod anthropic_tool;
pub mod anthropic_usage;

pub use anthropic_content::AnthropicContent;
pub use anthropic_content_block::AnthropicContentBlock;
pub use anthropic_content_object::AnthropicContentObject;
pub use anthropic_image_source::AnthropicImageSource;
pub use anthropic_message::AnthropicMessage;
pub use anthropic_request::AnthropicRequest;
pub use anthropic_response::{AnthropicResponse, AnthropicResponseBuilder};
pub use anthropic_stream_chunk::{AnthropicErrorBody, AnthropicMessageDelta, AnthropicStreamChunk};
pub use anthropic_stream_delta::AnthropicStreamDelta;
pub use anthropic_stream_message::AnthropicStreamMessage;
pub use anthropic_system_content::AnthropicSystemContent;
pub use anthropic_tool::AnthropicTool;
pub use anthropic_usage::AnthropicUsage;
