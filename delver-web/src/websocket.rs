//! WebSocket handler for real-time research streaming
//!
//! Relays the engine's progress event stream over a WebSocket connection.
//! One connection can issue multiple research requests sequentially.

use crate::AppState;
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use delver_research::{ResearchEvent, StreamMode, StreamingRun};
use futures_util::StreamExt;
use serde::Deserialize;
use tracing::{error, info, warn};

/// Incoming research request frame
#[derive(Debug, Deserialize)]
pub struct WsResearchRequest {
    pub question: String,
    #[serde(default)]
    pub stream_mode: Option<String>,
}

/// Research WebSocket handler
pub async fn research_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_research_socket(socket, state))
}

/// Handle one research WebSocket connection
async fn handle_research_socket(mut socket: WebSocket, state: AppState) {
    info!("New research WebSocket connection established");

    while let Some(msg) = socket.recv().await {
        match msg {
            Ok(Message::Text(text)) => {
                if let Err(e) = handle_research_request(&mut socket, &state, &text).await {
                    error!("Error handling research request: {}", e);
                    break;
                }
            }
            Ok(Message::Ping(data)) => {
                if socket.send(Message::Pong(data)).await.is_err() {
                    break;
                }
            }
            Ok(Message::Close(_)) => {
                info!("Research WebSocket connection closed by client");
                break;
            }
            Err(e) => {
                error!("Research WebSocket error: {}", e);
                break;
            }
            _ => {}
        }
    }

    info!("Research WebSocket connection terminated");
}

/// Run one research request and relay its event stream to the client
async fn handle_research_request(
    socket: &mut WebSocket,
    state: &AppState,
    text: &str,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let request: WsResearchRequest = match serde_json::from_str(text) {
        Ok(request) => request,
        Err(e) => {
            warn!("Malformed research request: {}", e);
            send_error(socket, &format!("Malformed request: {}", e)).await?;
            return Ok(());
        }
    };

    if request.question.trim().is_empty() {
        send_error(socket, "Question cannot be empty").await?;
        return Ok(());
    }

    let engine = match state.engine() {
        Ok(engine) => engine,
        Err(e) => {
            send_error(socket, &e.to_string()).await?;
            return Ok(());
        }
    };

    let mode = StreamMode::parse(request.stream_mode.as_deref().unwrap_or("values"));

    // Acknowledge before the first stage runs
    let started = serde_json::json!({
        "type": "research_started",
        "question": request.question,
        "timestamp": chrono::Utc::now(),
    });
    socket.send(Message::Text(started.to_string().into())).await?;

    let StreamingRun { run_id, mut events } =
        match engine.run_streaming(&request.question, mode).await {
            Ok(run) => run,
            Err(e) => {
                send_error(socket, &e.to_string()).await?;
                return Ok(());
            }
        };

    while let Some(event) = events.next().await {
        let payload = serde_json::to_string(&event)?;
        if socket.send(Message::Text(payload.into())).await.is_err() {
            // Client went away mid-run; stop the run rather than stream into
            // the void. The current fan-out batch still completes.
            let _ = engine.cancel_run(&run_id).await;
            return Err("client disconnected during research stream".into());
        }

        if matches!(
            event,
            ResearchEvent::Complete { .. } | ResearchEvent::Error { .. }
        ) {
            break;
        }
    }

    Ok(())
}

async fn send_error(
    socket: &mut WebSocket,
    error: &str,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let frame = serde_json::json!({
        "type": "error",
        "error": error,
        "timestamp": chrono::Utc::now(),
    });
    socket.send(Message::Text(frame.to_string().into())).await?;
    Ok(())
}
