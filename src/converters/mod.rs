pub mod anthropic;
pub mod helpers;
pub mod response_handler;
pub mod responses;
pub mod sse_framer;
pub mod stream;
