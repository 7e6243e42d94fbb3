use crate::auth::{self, AppState};
use crate::converters::anthropic::AnthropicRequest;
use crate::converters::response_handler::{
    handle_non_streaming_response, handle_streaming_response, handle_upstream_failure,
};
use crate::converters::responses::translate_request;
use crate::error::BridgeError;
use crate::models::{CountTokensResponse, HealthResponse};
use crate::request_id::{self, RequestId};
use axum::{
    Extension, Json, Router,
    extract::State,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde_json::Value;
use tower_http::cors::CorsLayer;
use tracing::{debug, info};

pub fn build_router(app_state: AppState) -> Router {
    Router::new()
        .route("/v1/messages", post(anthropic_messages))
        .route("/v1/messages/count_tokens", post(count_tokens))
        .route("/health", get(health))
        .layer(middleware::from_fn_with_state(
            app_state.clone(),
            auth::require_authorization,
        ))
        .layer(middleware::from_fn(request_id::inject_request_id))
        .layer(CorsLayer::permissive())
        .with_state(app_state)
}

fn decode_request(body: Value) -> Result<AnthropicRequest, BridgeError> {
    serde_json::from_value(body).map_err(|e| BridgeError::InvalidRequest(e.to_string()))
}

#[axum_macros::debug_handler]
pub async fn anthropic_messages(
    State(app_state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Json(body): Json<Value>,
) -> Response {
    let result = match decode_request(body) {
        Ok(request) => route_messages(app_state, request_id, request).await,
        Err(e) => Err(e),
    };
    result.unwrap_or_else(IntoResponse::into_response)
}

async fn route_messages(
    app_state: AppState,
    request_id: RequestId,
    request: AnthropicRequest,
) -> Result<Response, BridgeError> {
    // no backend call without a usable token
    app_state.tokens.ensure_fresh().await?;

    let streaming = request.is_stream();
    let mut target = translate_request(&request, &app_state.config.models);
    info!(
        "{} → {} | stream={} | messages={}",
        request.model,
        target.model,
        streaming,
        request.messages.len()
    );
    if let Some(preview) = request.last_message_preview(120) {
        debug!("last message: {}", preview);
    }

    // the backend only streams; non-streaming replies are collected here
    target.stream = true;

    let response = app_state
        .llm_client
        .forward(&target, app_state.tokens.as_ref(), &request_id)
        .await?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Ok(handle_upstream_failure(status, &body, streaming));
    }

    let upstream = response.bytes_stream();
    if streaming {
        Ok(handle_streaming_response(upstream, target.model))
    } else {
        Ok(handle_non_streaming_response(upstream, target.model).await)
    }
}

#[axum_macros::debug_handler]
pub async fn count_tokens(Json(body): Json<Value>) -> Response {
    match decode_request(body) {
        Ok(request) => Json(CountTokensResponse {
            input_tokens: request.estimated_input_tokens(),
        })
        .into_response(),
        Err(e) => e.into_response(),
    }
}

#[axum_macros::debug_handler]
pub async fn health(State(app_state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        token_expired: app_state.tokens.is_expired(),
    })
}
