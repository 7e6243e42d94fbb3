use crate::converters::anthropic::{AnthropicErrorBody, AnthropicStreamChunk};
use crate::converters::helpers::truncate_chars;
use crate::models::ErrorResponse;
use crate::token_store::AuthError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Upstream error bodies are cut to this many characters before being
/// passed on to the client.
pub const MAX_UPSTREAM_BODY_CHARS: usize = 500;

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("invalid request body: {0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Auth(#[from] AuthError),

    /// Non-success status from the backend, before any event was read.
    #[error("HTTP {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("upstream stream interrupted: {0}")]
    UpstreamStream(String),

    #[error("upstream request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("malformed upstream event: {0}")]
    Decode(#[from] serde_json::Error),
}

impl BridgeError {
    pub fn upstream(status: StatusCode, body: &str) -> Self {
        BridgeError::Upstream {
            status: status.as_u16(),
            body: truncate_chars(body, MAX_UPSTREAM_BODY_CHARS).to_string(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            BridgeError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            BridgeError::Auth(_) => StatusCode::UNAUTHORIZED,
            BridgeError::Upstream { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            BridgeError::UpstreamStream(_) | BridgeError::Transport(_) | BridgeError::Decode(_) => {
                StatusCode::BAD_GATEWAY
            }
        }
    }

    pub fn error_type(&self) -> &'static str {
        match self {
            BridgeError::InvalidRequest(_) => "invalid_request_error",
            BridgeError::Auth(_) => "authentication_error",
            _ => "api_error",
        }
    }

    /// The `error` frame sent in place of the rest of a stream.
    pub fn to_stream_chunk(&self) -> AnthropicStreamChunk {
        AnthropicStreamChunk::Error {
            error: AnthropicErrorBody {
                r#type: self.error_type().to_string(),
                message: self.to_string(),
            },
        }
    }
}

impl IntoResponse for BridgeError {
    fn into_response(self) -> Response {
        let body = ErrorResponse::new(self.error_type(), self.to_string());
        (self.status_code(), Json(body)).into_response()
    }
}
