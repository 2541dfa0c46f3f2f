//! OpenAPI specification for the Delver web server

use utoipa::OpenApi;

use crate::handlers::{
    HealthResponse, ResearchRequest, ResearchRunResponse, ThreadMessage, ThreadResponse,
    ThreadRunInput, ThreadRunRequest,
};

/// Main OpenAPI specification for the Delver web server
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Delver Research API",
        version = "0.1.0",
        description = "Streaming deep-research orchestration service",
        license(name = "MIT OR Apache-2.0")
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development server")
    ),
    paths(
        // Health and configuration
        crate::handlers::health_check,
        crate::handlers::get_config,

        // Research runs
        crate::handlers::run_research,
        crate::handlers::research_stream,
        crate::handlers::list_research_runs,
        crate::handlers::cancel_research,

        // Thread-compatibility surface
        crate::handlers::create_thread,
        crate::handlers::run_thread,
        crate::handlers::run_thread_get,
    ),
    components(
        schemas(
            HealthResponse,
            ResearchRequest,
            ResearchRunResponse,
            ThreadResponse,
            ThreadRunRequest,
            ThreadRunInput,
            ThreadMessage,
        )
    ),
    tags(
        (name = "Health", description = "Health check endpoints"),
        (name = "Configuration", description = "Server configuration reporting"),
        (name = "Research", description = "Research run operations"),
        (name = "Threads", description = "Thread-compatibility streaming surface"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_generation() {
        let openapi = ApiDoc::openapi();
        assert_eq!(openapi.info.title, "Delver Research API");
        assert!(!openapi.paths.paths.is_empty());
    }

    #[test]
    fn test_openapi_includes_stream_endpoint() {
        let openapi = ApiDoc::openapi();
        assert!(openapi.paths.paths.contains_key("/api/research/stream"));
        assert!(openapi.paths.paths.contains_key("/api/threads/{thread_id}/runs"));
    }
}
