use axum::{
    extract::{Path, State},
    response::sse::{Event, Sse},
    Json,
};
use futures::stream::{Stream, StreamExt};
use serde::Deserialize;
use std::convert::Infallible;
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::CancellationToken;
use utoipa::ToSchema;

use parley_chat::ResponseChunk;

use crate::state::AppState;

#[derive(Debug, Deserialize, ToSchema)]
pub struct SendMessageRequest {
    pub user_id: String,
    pub content: String,
}

/// Send a message and stream the response using Server-Sent Events
///
/// Validation and authorization failures arrive in-band as a single terminal
/// `error` event; the HTTP status is 200 either way since the stream has
/// already started.
#[utoipa::path(
    post,
    path = "/conversations/{conversation_id}/messages",
    request_body = SendMessageRequest,
    responses(
        (status = 200, description = "Streaming response", content_type = "text/event-stream")
    ),
    tag = "messages"
)]
pub async fn send_message_stream(
    State(state): State<AppState>,
    Path(conversation_id): Path<String>,
    Json(req): Json<SendMessageRequest>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let cancel = CancellationToken::new();

    let receiver = state.orchestrator.send_message_streaming(
        conversation_id,
        req.user_id,
        req.content,
        cancel.clone(),
    );

    // Dropping the guard when the client disconnects cancels the in-flight
    // agent call instead of letting it run to completion unobserved
    let guard = cancel.drop_guard();

    let sse_stream = ReceiverStream::new(receiver).map(move |chunk| {
        let _ = &guard;
        Ok::<Event, Infallible>(chunk_to_event(chunk))
    });

    Sse::new(sse_stream)
}

fn chunk_to_event(chunk: ResponseChunk) -> Event {
    let name = if !chunk.is_complete {
        "chunk"
    } else if chunk.error.is_some() {
        "error"
    } else {
        "done"
    };

    match Event::default().event(name).json_data(&chunk) {
        Ok(event) => event,
        Err(e) => {
            tracing::error!(error = %e, "Failed to serialize response chunk");
            Event::default().event("error").data("serialization failure")
        }
    }
}
