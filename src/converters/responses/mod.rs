pub mod responses_content;
pub mod responses_input_item;
pub mod responses_output_item;
pub mod responses_request;
pub mod responses_response;
pub mod responses_stream_chunk;
pub mod responses_tool;
pub mod responses_tool_choice;
pub mod responses_usage;

#[allow(unused_imports)]
pub use responses_content::ResponsesContentPart;
#[allow(unused_imports)]
pub use responses_input_item::ResponsesInputItem;
#[allow(unused_imports)]
pub use responses_output_item::ResponsesOutputItem;
#[allow(unused_imports)]
pub use responses_request::{ResponsesRequest, translate_request};
#[allow(unused_imports)]
pub use responses_response::ResponsesResponse;
#[allow(unused_imports)]
pub use responses_stream_chunk::ResponsesStreamEvent;
#[allow(unused_imports)]
pub use responses_tool::ResponsesTool;
#[allow(unused_imports)]
pub use responses_tool_choice::ResponsesToolChoice;
#[allow(unused_imports)]
pub use responses_usage::ResponsesUsage;
