//! Configuration surface for the research service
//!
//! Typed configuration with defaults matching the documented research
//! parameters, environment-variable loading, and TOML file persistence.

use crate::error::{DelverError, DelverResult, ErrorContext};
use crate::logging::LoggingConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Research pipeline parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResearchOptions {
    /// Number of queries generated on the first round
    pub initial_queries_count: usize,
    /// Upper bound on reflection loops per run
    pub max_research_loops: usize,
    /// Maximum source URLs kept per search task
    pub max_sources_per_query: usize,
    /// Timeout for a single search task
    pub search_timeout_seconds: u64,
    /// Concurrency limit for the search fan-out
    pub parallel_search_limit: usize,
    /// Advisory threshold passed to the reflection prompt
    pub min_sources_for_sufficiency: usize,
}

impl Default for ResearchOptions {
    fn default() -> Self {
        Self {
            initial_queries_count: 3,
            max_research_loops: 2,
            max_sources_per_query: 10,
            search_timeout_seconds: 30,
            parallel_search_limit: 5,
            min_sources_for_sufficiency: 5,
        }
    }
}

/// Language model configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmOptions {
    /// Provider name (openai, anthropic, ollama, groq)
    pub provider: String,
    /// Model used for query generation
    pub query_model: String,
    /// Model used for the simulated web search
    pub search_model: String,
    /// Model used for reflection
    pub reflection_model: String,
    /// Model used for final answer synthesis
    pub answer_model: String,
    /// API key; falls back to the provider's environment variable
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Custom API endpoint
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    pub temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

impl Default for LlmOptions {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            query_model: "gpt-4o-mini".to_string(),
            search_model: "gpt-4o-search-preview".to_string(),
            reflection_model: "o4-mini".to_string(),
            answer_model: "o4-mini".to_string(),
            api_key: None,
            base_url: None,
            temperature: 0.1,
            max_tokens: Some(4000),
        }
    }
}

impl LlmOptions {
    /// Environment variable holding the provider's API key
    pub fn api_key_env_var(&self) -> &'static str {
        match self.provider.as_str() {
            "anthropic" => "ANTHROPIC_API_KEY",
            "groq" => "GROQ_API_KEY",
            _ => "OPENAI_API_KEY",
        }
    }

    /// Resolve the API key from config or environment
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .or_else(|| std::env::var(self.api_key_env_var()).ok())
            .filter(|key| !key.trim().is_empty())
    }
}

/// Top-level configuration for the Delver service
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DelverConfig {
    /// Bypass the language model with deterministic canned output
    pub demo_mode: bool,
    pub research: ResearchOptions,
    pub llm: LlmOptions,
    pub logging: LoggingConfig,
}

impl DelverConfig {
    /// Load configuration from environment variables, starting from defaults
    pub fn from_env() -> Self {
        let mut config = Self {
            // Demo mode defaults to on so the service runs without credentials
            demo_mode: std::env::var("DEMO_MODE")
                .map(|v| v.to_lowercase() == "true")
                .unwrap_or(true),
            ..Self::default()
        };

        if let Ok(count) = std::env::var("DELVER_INITIAL_QUERIES") {
            if let Ok(parsed) = count.parse() {
                config.research.initial_queries_count = parsed;
            }
        }
        if let Ok(loops) = std::env::var("DELVER_MAX_RESEARCH_LOOPS") {
            if let Ok(parsed) = loops.parse() {
                config.research.max_research_loops = parsed;
            }
        }
        if let Ok(timeout) = std::env::var("DELVER_SEARCH_TIMEOUT_SECONDS") {
            if let Ok(parsed) = timeout.parse() {
                config.research.search_timeout_seconds = parsed;
            }
        }
        if let Ok(limit) = std::env::var("DELVER_PARALLEL_SEARCH_LIMIT") {
            if let Ok(parsed) = limit.parse() {
                config.research.parallel_search_limit = parsed;
            }
        }
        if let Ok(provider) = std::env::var("DELVER_LLM_PROVIDER") {
            config.llm.provider = provider;
        }

        config
    }

    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> DelverResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| DelverError::Config {
            message: format!("Failed to read config file: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config")
                .with_operation("read_file")
                .with_suggestion("Check if the config file exists and is readable"),
        })?;

        let config: DelverConfig = toml::from_str(&content).map_err(|e| DelverError::Config {
            message: format!("Failed to parse config: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config")
                .with_operation("parse_toml")
                .with_suggestion("Check TOML syntax in config file"),
        })?;

        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> DelverResult<()> {
        let content = toml::to_string_pretty(self).map_err(|e| DelverError::Config {
            message: format!("Failed to serialize config: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config").with_operation("serialize_toml"),
        })?;

        std::fs::write(path, content).map_err(|e| DelverError::Config {
            message: format!("Failed to write config file: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config")
                .with_operation("write_file")
                .with_suggestion("Check if the directory exists and is writable"),
        })?;

        Ok(())
    }

    /// Whether a usable API key is available for the configured provider
    pub fn has_credentials(&self) -> bool {
        self.llm.resolve_api_key().is_some()
    }

    /// Pre-flight validation: the single hard failure path before a run starts
    pub fn validate(&self) -> DelverResult<()> {
        if self.research.max_research_loops == 0 {
            return Err(DelverError::Config {
                message: "max_research_loops must be greater than 0".to_string(),
                source: None,
                context: ErrorContext::new("config")
                    .with_operation("validate")
                    .with_suggestion("Set research.max_research_loops to a positive value"),
            });
        }

        if self.research.parallel_search_limit == 0 {
            return Err(DelverError::Config {
                message: "parallel_search_limit must be greater than 0".to_string(),
                source: None,
                context: ErrorContext::new("config")
                    .with_operation("validate")
                    .with_suggestion("Set research.parallel_search_limit to a positive value"),
            });
        }

        if !self.demo_mode && !self.has_credentials() {
            return Err(DelverError::Config {
                message: format!(
                    "No API key configured for provider '{}' and demo mode is disabled",
                    self.llm.provider
                ),
                source: None,
                context: ErrorContext::new("config")
                    .with_operation("validate")
                    .with_suggestion("Set the provider API key environment variable")
                    .with_suggestion("Or set DEMO_MODE=true to run without credentials"),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_research_parameters() {
        let options = ResearchOptions::default();
        assert_eq!(options.initial_queries_count, 3);
        assert_eq!(options.max_research_loops, 2);
        assert_eq!(options.max_sources_per_query, 10);
        assert_eq!(options.search_timeout_seconds, 30);
        assert_eq!(options.parallel_search_limit, 5);
        assert_eq!(options.min_sources_for_sufficiency, 5);
    }

    #[test]
    fn test_validate_demo_mode_without_credentials() {
        let config = DelverConfig {
            demo_mode: true,
            llm: LlmOptions {
                api_key: None,
                ..Default::default()
            },
            ..Default::default()
        };
        // Demo mode never needs credentials
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_missing_credentials() {
        let config = DelverConfig {
            demo_mode: false,
            llm: LlmOptions {
                api_key: None,
                // Provider nobody sets a key for in the test environment
                provider: "groq".to_string(),
                ..Default::default()
            },
            ..Default::default()
        };
        if std::env::var("GROQ_API_KEY").is_err() {
            assert!(config.validate().is_err());
        }
    }

    #[test]
    fn test_validate_accepts_explicit_key() {
        let config = DelverConfig {
            demo_mode: false,
            llm: LlmOptions {
                api_key: Some("test-key".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_loops() {
        let config = DelverConfig {
            demo_mode: true,
            research: ResearchOptions {
                max_research_loops: 0,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_roundtrip_through_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("delver.toml");

        let mut config = DelverConfig::default();
        config.research.max_research_loops = 4;
        config.save_to_file(&path).unwrap();

        let loaded = DelverConfig::from_file(&path).unwrap();
        assert_eq!(loaded.research.max_research_loops, 4);
        assert_eq!(loaded.llm.provider, config.llm.provider);
    }
}
