//! Request and response types shared across handlers

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// Research run request
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ResearchRequest {
    /// The question to research
    #[schema(example = "What is the impact of X?")]
    pub question: String,
    /// Progress mode: "values" (state snapshots) or "events" (node lifecycle)
    #[serde(default)]
    #[schema(example = "values")]
    pub stream_mode: Option<String>,
}

/// Non-streaming research run response
#[derive(Debug, Serialize, ToSchema)]
pub struct ResearchRunResponse {
    pub success: bool,
    pub final_answer: String,
    pub citations: Vec<String>,
    #[schema(value_type = Object)]
    pub research_summary: serde_json::Value,
    pub errors: Vec<String>,
    /// Top-level error for runs that failed before the pipeline started
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Health check response
#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    #[schema(example = "healthy")]
    pub status: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    #[schema(example = "0.1.0")]
    pub version: String,
    /// Whether the research engine passed pre-flight validation
    pub engine_ready: bool,
    pub websocket_enabled: bool,
}

/// Thread creation response
#[derive(Debug, Serialize, ToSchema)]
pub struct ThreadResponse {
    pub thread_id: String,
}

/// Thread run request (compatibility surface for stream-hook clients)
#[derive(Debug, Deserialize, ToSchema)]
pub struct ThreadRunRequest {
    pub input: ThreadRunInput,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ThreadRunInput {
    #[serde(default)]
    pub messages: Vec<ThreadMessage>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ThreadMessage {
    /// Message role tag, e.g. "human"
    #[serde(rename = "type")]
    pub message_type: Option<String>,
    pub content: Option<String>,
}

/// Query parameters for the GET thread-run variant (EventSource clients
/// cannot issue bodies)
#[derive(Debug, Deserialize, IntoParams)]
pub struct ThreadRunQuery {
    pub question: String,
    pub stream_mode: Option<String>,
}
