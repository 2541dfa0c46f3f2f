//! Research run handlers
//!
//! Non-streaming runs, SSE streaming runs, and the thread-compatibility
//! surface. These handlers only re-encode the engine's event stream; all
//! pipeline logic lives in the engine crate.

use super::types::{
    ResearchRequest, ResearchRunResponse, ThreadResponse, ThreadRunQuery, ThreadRunRequest,
};
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, KeepAliveStream, Sse},
        Json,
    },
    Json as JsonExtractor,
};
use delver_research::{EventStream, ResearchError, ResearchEvent, StreamMode};
use futures_util::stream::{BoxStream, Stream, StreamExt};
use std::convert::Infallible;
use std::time::Duration;
use tracing::{error, info};
use uuid::Uuid;

type SseResponse = Sse<KeepAliveStream<BoxStream<'static, Result<Event, Infallible>>>>;

/// Run research without streaming and return the final result
#[utoipa::path(
    post,
    path = "/api/research",
    tag = "Research",
    summary = "Run research",
    description = "Run a research pipeline to completion and return the cited answer",
    request_body = ResearchRequest,
    responses(
        (status = 200, description = "Research completed", body = ResearchRunResponse),
        (status = 400, description = "Question is empty")
    )
)]
pub async fn run_research(
    State(state): State<AppState>,
    JsonExtractor(request): JsonExtractor<ResearchRequest>,
) -> Result<Json<ResearchRunResponse>, StatusCode> {
    if request.question.trim().is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }

    info!(question = %request.question, "Running non-streaming research");

    // Pre-flight configuration failure is the one hard-failure path,
    // surfaced as a structured success=false payload
    let engine = match state.engine() {
        Ok(engine) => engine,
        Err(e) => return Ok(Json(failure_response(e.to_string()))),
    };

    match engine.run(&request.question).await {
        Ok(result) => Ok(Json(ResearchRunResponse {
            success: result.success,
            final_answer: result.final_answer,
            citations: result.citations,
            research_summary: serde_json::to_value(&result.research_summary)
                .unwrap_or_else(|_| serde_json::json!({})),
            errors: result.errors,
            error: None,
        })),
        Err(ResearchError::Validation { message }) => {
            error!(error = %message, "Rejected research request");
            Err(StatusCode::BAD_REQUEST)
        }
        Err(e) => {
            error!(error = %e, "Research run failed");
            Ok(Json(failure_response(e.to_string())))
        }
    }
}

fn failure_response(error: String) -> ResearchRunResponse {
    ResearchRunResponse {
        success: false,
        final_answer: "Error occurred during research process.".to_string(),
        citations: Vec::new(),
        research_summary: serde_json::json!({ "error": error }),
        errors: vec![error.clone()],
        error: Some(error),
    }
}

/// Stream research progress over Server-Sent Events
#[utoipa::path(
    post,
    path = "/api/research/stream",
    tag = "Research",
    summary = "Stream research progress",
    description = "Run research and stream progress frames over SSE",
    request_body = ResearchRequest,
    responses(
        (status = 200, description = "Streaming research frames", content_type = "text/event-stream"),
        (status = 400, description = "Question is empty")
    )
)]
pub async fn research_stream(
    State(state): State<AppState>,
    JsonExtractor(request): JsonExtractor<ResearchRequest>,
) -> Result<SseResponse, StatusCode> {
    info!(question = %request.question, "Starting research stream");
    start_stream(&state, &request.question, request.stream_mode.as_deref()).await
}

/// List in-flight research runs
#[utoipa::path(
    get,
    path = "/api/research/runs",
    tag = "Research",
    summary = "List active research runs",
    responses(
        (status = 200, description = "Active runs listed successfully")
    )
)]
pub async fn list_research_runs(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, StatusCode> {
    let engine = state.engine().map_err(|e| {
        error!(error = %e, "Engine unavailable");
        StatusCode::SERVICE_UNAVAILABLE
    })?;

    let runs = engine.list_active_runs().await;
    Ok(Json(serde_json::json!({
        "runs": runs,
        "count": runs.len(),
    })))
}

/// Cancel an in-flight research run
#[utoipa::path(
    post,
    path = "/api/research/{run_id}/cancel",
    tag = "Research",
    summary = "Cancel a research run",
    description = "Request cancellation; honored between pipeline stages",
    params(
        ("run_id" = String, Path, description = "Run ID")
    ),
    responses(
        (status = 200, description = "Cancellation requested"),
        (status = 404, description = "Run not found")
    )
)]
pub async fn cancel_research(
    State(state): State<AppState>,
    Path(run_id): Path<String>,
) -> Result<Json<serde_json::Value>, StatusCode> {
    let engine = state.engine().map_err(|_| StatusCode::SERVICE_UNAVAILABLE)?;

    match engine.cancel_run(&run_id).await {
        Ok(()) => Ok(Json(serde_json::json!({
            "status": "cancelling",
            "run_id": run_id,
        }))),
        Err(ResearchError::RunNotFound { .. }) => Err(StatusCode::NOT_FOUND),
        Err(e) => {
            error!(error = %e, "Failed to cancel research run");
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

// ============================================================================
// Thread-compatibility surface
// ============================================================================

/// Create an opaque thread identifier
#[utoipa::path(
    post,
    path = "/api/threads",
    tag = "Threads",
    summary = "Create a thread",
    responses(
        (status = 200, description = "Thread created", body = ThreadResponse)
    )
)]
pub async fn create_thread() -> Json<ThreadResponse> {
    Json(ThreadResponse {
        thread_id: Uuid::new_v4().to_string(),
    })
}

/// Start a streaming run on a thread
#[utoipa::path(
    post,
    path = "/api/threads/{thread_id}/runs",
    tag = "Threads",
    summary = "Run research on a thread",
    description = "Posting a message list containing one human message starts a streaming run",
    params(
        ("thread_id" = String, Path, description = "Thread ID")
    ),
    request_body = ThreadRunRequest,
    responses(
        (status = 200, description = "Streaming research frames", content_type = "text/event-stream"),
        (status = 400, description = "Missing messages or message content")
    )
)]
pub async fn run_thread(
    State(state): State<AppState>,
    Path(thread_id): Path<String>,
    JsonExtractor(request): JsonExtractor<ThreadRunRequest>,
) -> Result<SseResponse, StatusCode> {
    let question = request
        .input
        .messages
        .first()
        .and_then(|message| message.content.as_deref())
        .ok_or(StatusCode::BAD_REQUEST)?;

    info!(thread_id = %thread_id, "Starting thread run");
    start_stream(&state, question, None).await
}

/// GET variant of the thread run for EventSource clients
#[utoipa::path(
    get,
    path = "/api/threads/{thread_id}/runs",
    tag = "Threads",
    summary = "Run research on a thread via GET",
    description = "Accepts the question as a query parameter for transports that cannot issue bodies",
    params(
        ("thread_id" = String, Path, description = "Thread ID"),
        ThreadRunQuery
    ),
    responses(
        (status = 200, description = "Streaming research frames", content_type = "text/event-stream"),
        (status = 400, description = "Question is empty")
    )
)]
pub async fn run_thread_get(
    State(state): State<AppState>,
    Path(thread_id): Path<String>,
    Query(params): Query<ThreadRunQuery>,
) -> Result<SseResponse, StatusCode> {
    info!(thread_id = %thread_id, "Starting thread run via GET");
    start_stream(&state, &params.question, params.stream_mode.as_deref()).await
}

// ============================================================================
// SSE framing
// ============================================================================

/// Start a streaming run and wrap its events as SSE frames
async fn start_stream(
    state: &AppState,
    question: &str,
    stream_mode: Option<&str>,
) -> Result<SseResponse, StatusCode> {
    let engine = state.engine().map_err(|e| {
        error!(error = %e, "Engine unavailable");
        StatusCode::SERVICE_UNAVAILABLE
    })?;

    let mode = StreamMode::parse(stream_mode.unwrap_or("values"));

    let run = engine.run_streaming(question, mode).await.map_err(|e| match e {
        ResearchError::Validation { .. } => StatusCode::BAD_REQUEST,
        e => {
            error!(error = %e, "Failed to start research stream");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    })?;

    Ok(Sse::new(frame_stream(run.events).boxed()).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    ))
}

/// Frame the run's events: monotone numeric id per frame, `event:` line
/// matching the payload type, JSON `data:` line
fn frame_stream(events: EventStream) -> impl Stream<Item = Result<Event, Infallible>> {
    async_stream::stream! {
        let mut events = events;
        let mut frame_id: u64 = 0;
        while let Some(event) = events.next().await {
            yield Ok(sse_frame(frame_id, &event));
            frame_id += 1;
        }
    }
}

fn sse_frame(id: u64, event: &ResearchEvent) -> Event {
    let frame = Event::default()
        .id(id.to_string())
        .event(event.event_name());

    match frame.json_data(event) {
        Ok(frame) => frame,
        Err(e) => Event::default().id(id.to_string()).event("error").data(
            serde_json::json!({
                "type": "error",
                "error": format!("Failed to serialize event: {}", e),
            })
            .to_string(),
        ),
    }
}
