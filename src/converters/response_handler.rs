use crate::converters::anthropic::{AnthropicResponse, AnthropicResponseBuilder, AnthropicStreamChunk};
use crate::converters::responses::ResponsesStreamEvent;
use crate::converters::sse_framer::SseFramer;
use crate::converters::stream::StreamTranslator;
use crate::error::BridgeError;
use async_stream::stream;
use axum::{
    Json,
    body::Body,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use futures::{Stream, StreamExt, stream};
use std::convert::Infallible;
use std::fmt::Display;
use tracing::{debug, info, warn};

/// Translates the raw upstream body into Messages frames as bytes arrive.
///
/// `message_start` is yielded before the first upstream chunk is awaited.
/// A payload that is not valid JSON is logged and skipped. A transport error
/// ends the sequence with one `Err`. Once `response.completed` has been
/// handled, the upstream is no longer polled.
pub fn translate_events<S, E>(
    upstream: S,
    model: String,
) -> impl Stream<Item = Result<AnthropicStreamChunk, BridgeError>> + Send
where
    S: Stream<Item = Result<Bytes, E>> + Send + 'static,
    E: Display + Send + 'static,
{
    stream! {
        let mut translator = StreamTranslator::new(model);
        let mut framer = SseFramer::new();
        yield Ok(translator.start());

        let mut upstream = Box::pin(upstream);
        while let Some(chunk) = upstream.next().await {
            let bytes = match chunk {
                Ok(bytes) => bytes,
                Err(e) => {
                    warn!("Upstream stream error: {}", e);
                    yield Err(BridgeError::UpstreamStream(e.to_string()));
                    return;
                }
            };
            for payload in framer.push(&bytes) {
                for frame in translate_payload(&mut translator, &payload) {
                    yield Ok(frame);
                }
            }
            if translator.is_completed() {
                break;
            }
        }

        if !translator.is_completed() {
            for payload in framer.finish() {
                for frame in translate_payload(&mut translator, &payload) {
                    yield Ok(frame);
                }
            }
        }
        for frame in translator.finish() {
            yield Ok(frame);
        }
    }
}

fn translate_payload(translator: &mut StreamTranslator, payload: &str) -> Vec<AnthropicStreamChunk> {
    debug!("raw streaming event: {}", payload);
    match serde_json::from_str::<ResponsesStreamEvent>(payload).map_err(BridgeError::from) {
        Ok(event) => translator.handle(event),
        Err(e) => {
            warn!("Skipping upstream event: {}", e);
            Vec::new()
        }
    }
}

/// Renders frames as wire text; an `Err` becomes an `error` frame.
pub fn sse_frames<S>(events: S) -> impl Stream<Item = Result<String, Infallible>>
where
    S: Stream<Item = Result<AnthropicStreamChunk, BridgeError>>,
{
    events.map(|event| {
        Ok(match event {
            Ok(chunk) => chunk.to_sse_frame(),
            Err(e) => e.to_stream_chunk().to_sse_frame(),
        })
    })
}

/// Drains the frames into one message for clients that did not ask to stream.
pub async fn collect_response<S>(events: S) -> Result<AnthropicResponse, BridgeError>
where
    S: Stream<Item = Result<AnthropicStreamChunk, BridgeError>>,
{
    let mut events = Box::pin(events);
    let mut builder = AnthropicResponseBuilder::new();
    while let Some(event) = events.next().await {
        builder.push(&event?);
    }
    Ok(builder.finish())
}

pub fn event_stream_response<S>(frames: S) -> Response
where
    S: Stream<Item = Result<String, Infallible>> + Send + 'static,
{
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/event-stream"),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        Body::from_stream(frames),
    )
        .into_response()
}

pub fn handle_streaming_response<S, E>(upstream: S, model: String) -> Response
where
    S: Stream<Item = Result<Bytes, E>> + Send + 'static,
    E: Display + Send + 'static,
{
    event_stream_response(sse_frames(translate_events(upstream, model)))
}

pub async fn handle_non_streaming_response<S, E>(upstream: S, model: String) -> Response
where
    S: Stream<Item = Result<Bytes, E>> + Send + 'static,
    E: Display + Send + 'static,
{
    match collect_response(translate_events(upstream, model)).await {
        Ok(message) => {
            info!(
                "Collected response {} with {} content blocks",
                message.id,
                message.content.len()
            );
            Json(message).into_response()
        }
        Err(e) => e.into_response(),
    }
}

/// Response for a backend that answered with a non-success status before
/// sending any event: one `error` frame when streaming, otherwise the error
/// envelope with the backend's status.
pub fn handle_upstream_failure(status: StatusCode, body: &str, streaming: bool) -> Response {
    let error = BridgeError::upstream(status, body);
    warn!("Upstream returned {}", error);
    if streaming {
        let frame = error.to_stream_chunk().to_sse_frame();
        event_stream_response(stream::iter([Ok::<_, Infallible>(frame)]))
    } else {
        error.into_response()
    }
}
