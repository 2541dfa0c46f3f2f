//! Application state shared across handlers

use crate::{WebConfig, WebError, WebResult};
use delver_core::DelverConfig;
use delver_research::ResearchEngine;
use std::sync::Arc;
use tracing::{info, warn};

/// Shared application state
///
/// The engine is `None` when pre-flight configuration validation failed
/// (no credentials and demo mode off); the server still starts so clients
/// receive structured errors instead of connection refusals.
#[derive(Clone)]
pub struct AppState {
    /// Web server configuration
    pub config: WebConfig,
    /// Full service configuration, reported by the config endpoint
    pub delver: DelverConfig,
    /// Research engine; absent when configuration validation failed
    engine: Option<Arc<ResearchEngine>>,
}

impl AppState {
    /// Create the application state, building the research engine
    pub async fn new(config: WebConfig, delver: DelverConfig) -> Self {
        let engine = match ResearchEngine::from_config(&delver).await {
            Ok(engine) => {
                info!(demo_mode = delver.demo_mode, "Research engine initialized");
                Some(Arc::new(engine))
            }
            Err(e) => {
                warn!(
                    error = %e,
                    "Research engine unavailable; requests will return configuration errors"
                );
                None
            }
        };

        Self {
            config,
            delver,
            engine,
        }
    }

    /// Get the research engine, or the pre-flight configuration error
    pub fn engine(&self) -> WebResult<&Arc<ResearchEngine>> {
        self.engine.as_ref().ok_or_else(|| {
            WebError::Config(
                "Research engine is not configured: set an API key or enable demo mode"
                    .to_string(),
            )
        })
    }

    /// Whether the engine passed pre-flight validation
    pub fn is_ready(&self) -> bool {
        self.engine.is_some()
    }
}
