//! Configuration reporting handler

use crate::AppState;
use axum::{extract::State, response::Json};

/// Report the current configuration status
#[utoipa::path(
    get,
    path = "/api/config",
    tag = "Configuration",
    summary = "Get configuration status",
    description = "Report demo mode, credential availability, and research parameters",
    responses(
        (status = 200, description = "Configuration retrieved successfully")
    )
)]
pub async fn get_config(State(state): State<AppState>) -> Json<serde_json::Value> {
    let config = &state.delver;

    Json(serde_json::json!({
        "demo_mode": config.demo_mode,
        "api_key_configured": config.has_credentials(),
        "config_valid": config.validate().is_ok(),
        "models": {
            "query_generator": config.llm.query_model,
            "web_searcher": config.llm.search_model,
            "reflection": config.llm.reflection_model,
            "answer": config.llm.answer_model,
        },
        "research_parameters": {
            "initial_queries_count": config.research.initial_queries_count,
            "max_research_loops": config.research.max_research_loops,
            "max_sources_per_query": config.research.max_sources_per_query,
            "search_timeout_seconds": config.research.search_timeout_seconds,
            "parallel_search_limit": config.research.parallel_search_limit,
            "min_sources_for_sufficiency": config.research.min_sources_for_sufficiency,
        },
    }))
}
