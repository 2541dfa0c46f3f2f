//! Delver Web Server
//!
//! HTTP/WebSocket surface for the research engine. Transport adapters here
//! only re-encode the engine's progress event stream; no pipeline logic
//! lives in this crate.

pub mod handlers;
pub mod openapi;
pub mod routes;
pub mod server;
pub mod state;
pub mod websocket;

// Re-export main types
pub use server::DelverServer;
pub use state::AppState;

use axum::{extract::DefaultBodyLimit, http::Method, Router};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Create the main application router
pub fn create_app(state: AppState) -> Router {
    // Streaming clients connect from arbitrary origins
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers(Any);

    Router::new()
        // Service banner and bare health check for load balancers
        .route("/", axum::routing::get(handlers::root))
        .route("/health", axum::routing::get(handlers::health_check))
        // API routes
        .nest("/api", routes::api_routes())
        // WebSocket routes
        .nest("/ws", routes::websocket_routes())
        // API documentation
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", openapi::ApiDoc::openapi()))
        // Add middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(DefaultBodyLimit::max(1024 * 1024)) // 1MB max body size
        .with_state(state)
}

/// Configuration for the web server
#[derive(Debug, Clone)]
pub struct WebConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// Enable development mode
    pub dev_mode: bool,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            dev_mode: false,
        }
    }
}

impl WebConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self {
            host: std::env::var("DELVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: std::env::var("DELVER_PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            dev_mode: std::env::var("DELVER_DEV_MODE")
                .unwrap_or_else(|_| "false".to_string())
                .parse()
                .unwrap_or(false),
        }
    }

    /// Get the server address
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Error types for the web server
#[derive(thiserror::Error, Debug)]
pub enum WebError {
    #[error("Server error: {0}")]
    Server(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Research error: {0}")]
    Research(String),
}

/// Result type for web operations
pub type WebResult<T> = Result<T, WebError>;
