use crate::converters::helpers::generate_id;
use axum::{
    extract::Request,
    http::{HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};
use tracing::{Instrument, info_span};

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Per-request id. Also sent to the backend as `session_id`, so the backend
/// logs and ours line up.
#[derive(Clone, Debug)]
pub struct RequestId(pub String);

impl RequestId {
    /// Reuses a caller-supplied `x-request-id`, otherwise mints `req_<24 hex>`.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let id = headers
            .get(REQUEST_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| generate_id("req"));
        RequestId(id)
    }
}

pub async fn inject_request_id(mut req: Request, next: Next) -> Response {
    let request_id = RequestId::from_headers(req.headers());
    let header = HeaderValue::from_str(&request_id.0).ok();

    let span = info_span!(
        "bridge_request",
        request_id = %request_id.0,
        method = %req.method(),
        path = %req.uri().path()
    );
    req.extensions_mut().insert(request_id);

    let mut resp = next.run(req).instrument(span).await;
    if let Some(header) = header {
        resp.headers_mut().insert(REQUEST_ID_HEADER, header);
    }
    resp
}
