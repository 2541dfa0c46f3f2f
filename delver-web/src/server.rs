//! Delver Web Server
//!
//! Main web server implementation using Axum.

use crate::{create_app, AppState, WebConfig, WebError, WebResult};
use axum::serve;
use delver_core::DelverConfig;
use tokio::net::TcpListener;
use tracing::{error, info};

/// Main Delver web server
pub struct DelverServer {
    config: WebConfig,
    state: AppState,
}

impl DelverServer {
    /// Create a new Delver server
    pub async fn new(config: WebConfig, delver: DelverConfig) -> WebResult<Self> {
        let state = AppState::new(config.clone(), delver).await;
        Ok(Self { config, state })
    }

    /// Start the web server
    pub async fn start(self) -> WebResult<()> {
        let address = self.config.address();

        info!("Starting Delver web server");
        info!("Server address: http://{}", address);
        info!("Development mode: {}", self.config.dev_mode);

        let app = create_app(self.state.clone());

        let listener = TcpListener::bind(&address)
            .await
            .map_err(WebError::Server)?;

        info!("Server listening on http://{}", address);

        if let Err(e) = serve(listener, app).await {
            error!("Server error: {}", e);
            return Err(WebError::Server(e));
        }

        Ok(())
    }

    /// Get server configuration
    pub fn config(&self) -> &WebConfig {
        &self.config
    }

    /// Get application state
    pub fn state(&self) -> &AppState {
        &self.state
    }
}

/// Builder for DelverServer
pub struct DelverServerBuilder {
    config: WebConfig,
    delver: DelverConfig,
}

impl DelverServerBuilder {
    /// Create a new server builder
    pub fn new() -> Self {
        Self {
            config: WebConfig::default(),
            delver: DelverConfig::from_env(),
        }
    }

    /// Set the server host
    pub fn host<S: Into<String>>(mut self, host: S) -> Self {
        self.config.host = host.into();
        self
    }

    /// Set the server port
    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    /// Enable development mode
    pub fn dev_mode(mut self, dev_mode: bool) -> Self {
        self.config.dev_mode = dev_mode;
        self
    }

    /// Override the full service configuration
    pub fn delver_config(mut self, delver: DelverConfig) -> Self {
        self.delver = delver;
        self
    }

    /// Force demo mode on or off
    pub fn demo_mode(mut self, demo_mode: bool) -> Self {
        self.delver.demo_mode = demo_mode;
        self
    }

    /// Build the server
    pub async fn build(self) -> WebResult<DelverServer> {
        DelverServer::new(self.config, self.delver).await
    }
}

impl Default for DelverServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Convenience function to start a server with configuration from the environment
pub async fn start_server() -> WebResult<()> {
    let config = WebConfig::from_env();
    let delver = DelverConfig::from_env();
    let server = DelverServer::new(config, delver).await?;
    server.start().await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_server_creation_in_demo_mode() {
        let delver = DelverConfig {
            demo_mode: true,
            ..Default::default()
        };
        let server = DelverServer::new(WebConfig::default(), delver).await;
        assert!(server.is_ok());
        assert!(server.unwrap().state().is_ready());
    }

    #[test]
    fn test_server_builder() {
        let builder = DelverServerBuilder::new()
            .host("localhost")
            .port(3000)
            .dev_mode(true)
            .demo_mode(true);

        assert_eq!(builder.config.host, "localhost");
        assert_eq!(builder.config.port, 3000);
        assert!(builder.config.dev_mode);
        assert!(builder.delver.demo_mode);
    }

    #[test]
    fn test_config_from_env_defaults() {
        let config = WebConfig::default();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 8080);
        assert!(!config.dev_mode);
    }
}
