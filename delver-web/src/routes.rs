//! Route definitions for the Delver web server

use crate::{handlers, websocket, AppState};
use axum::{
    routing::{get, post},
    Router,
};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Configuration
        .route("/config", get(handlers::get_config))
        // Research runs
        .route("/research", post(handlers::run_research))
        .route("/research/stream", post(handlers::research_stream))
        .route("/research/runs", get(handlers::list_research_runs))
        .route("/research/{run_id}/cancel", post(handlers::cancel_research))
        // Thread-compatibility surface
        .route("/threads", post(handlers::create_thread))
        .route(
            "/threads/{thread_id}/runs",
            post(handlers::run_thread).get(handlers::run_thread_get),
        )
}

/// Create WebSocket routes
pub fn websocket_routes() -> Router<AppState> {
    Router::new().route("/research", get(websocket::research_handler))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::WebConfig;
    use axum::http::StatusCode;
    use delver_core::DelverConfig;
    use tower::ServiceExt;

    async fn demo_state() -> AppState {
        let delver = DelverConfig {
            demo_mode: true,
            ..Default::default()
        };
        AppState::new(WebConfig::default(), delver).await
    }

    #[tokio::test]
    async fn test_health_check_route() {
        let state = demo_state().await;
        let app = api_routes().with_state(state);

        let response = app
            .oneshot(
                axum::http::Request::builder()
                    .uri("/health")
                    .body(axum::body::Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_config_route() {
        let state = demo_state().await;
        let app = api_routes().with_state(state);

        let response = app
            .oneshot(
                axum::http::Request::builder()
                    .uri("/config")
                    .body(axum::body::Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }
}
