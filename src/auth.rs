use crate::config::Config;
use crate::llm_client::CodexClient;
use crate::models::ErrorResponse;
use crate::token_store::TokenProvider;
use axum::{
    Json,
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub tokens: Arc<dyn TokenProvider>,
    pub llm_client: Arc<CodexClient>,
    /// Inbound key clients must present; `None` leaves the bridge open.
    pub token: Option<String>,
}

pub async fn require_authorization(
    State(app_state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, Response> {
    if request.uri().path() == "/health" {
        return Ok(next.run(request).await);
    }

    let Some(expected) = app_state.token.as_deref() else {
        return Ok(next.run(request).await);
    };

    // Messages clients send x-api-key; accept a bearer token as well
    let provided = request
        .headers()
        .get("x-api-key")
        .and_then(|hv| hv.to_str().ok())
        .or_else(|| {
            request
                .headers()
                .get("Authorization")
                .and_then(|hv| hv.to_str().ok())
                .and_then(|s| s.strip_prefix("Bearer "))
                .map(str::trim)
        });

    let rejection = match provided {
        None => Some("x-api-key header is required"),
        Some(key) if key != expected => Some("invalid x-api-key"),
        Some(_) => None,
    };
    if let Some(message) = rejection {
        info!("Rejected request: {}", message);
        return Err(unauthorized(message));
    }

    debug!("API key validation successful");
    Ok(next.run(request).await)
}

fn unauthorized(message: &str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(ErrorResponse::new("authentication_error", message)),
    )
        .into_response()
}
