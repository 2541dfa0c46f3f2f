//! LLM client integration using siumai
//!
//! Provides a unified interface over multiple LLM providers. One siumai
//! client is built per distinct configured model so each stage can use its
//! own model.

use crate::llm::TextGenerator;
use crate::{ResearchError, ResearchResult};
use async_trait::async_trait;
use delver_core::LlmOptions;
use siumai::prelude::*;
use std::collections::HashMap;
use std::time::Instant;
use tracing::{debug, info};

/// Provider-agnostic LLM client backed by siumai
pub struct SiumaiGenerator {
    clients: HashMap<String, Box<dyn LlmClient>>,
    options: LlmOptions,
}

impl SiumaiGenerator {
    /// Create a new generator, building one client per distinct model
    pub async fn new(options: LlmOptions) -> ResearchResult<Self> {
        let mut clients: HashMap<String, Box<dyn LlmClient>> = HashMap::new();
        let models = [
            options.query_model.clone(),
            options.search_model.clone(),
            options.reflection_model.clone(),
            options.answer_model.clone(),
        ];

        for model in models {
            if !clients.contains_key(&model) {
                let client = Self::build_client(&options, &model).await?;
                clients.insert(model, client);
            }
        }

        info!(
            provider = %options.provider,
            models = clients.len(),
            "Created LLM clients"
        );

        Ok(Self { clients, options })
    }

    /// Build the appropriate siumai client based on configuration
    async fn build_client(
        options: &LlmOptions,
        model: &str,
    ) -> ResearchResult<Box<dyn LlmClient>> {
        match options.provider.as_str() {
            "openai" => {
                let api_key = options.resolve_api_key().ok_or_else(|| {
                    ResearchError::config("OpenAI API key not found")
                })?;

                let mut builder = LlmBuilder::new()
                    .openai()
                    .api_key(&api_key)
                    .model(model)
                    .temperature(options.temperature);

                if let Some(max_tokens) = options.max_tokens {
                    builder = builder.max_tokens(max_tokens);
                }

                if let Some(base_url) = &options.base_url {
                    builder = builder.base_url(base_url);
                }

                let client = builder.build().await.map_err(|e| {
                    ResearchError::llm(format!("Failed to build OpenAI client: {}", e))
                })?;

                Ok(Box::new(client))
            }
            "anthropic" => {
                let api_key = options.resolve_api_key().ok_or_else(|| {
                    ResearchError::config("Anthropic API key not found")
                })?;

                let mut builder = LlmBuilder::new()
                    .anthropic()
                    .api_key(&api_key)
                    .model(model)
                    .temperature(options.temperature);

                if let Some(max_tokens) = options.max_tokens {
                    builder = builder.max_tokens(max_tokens);
                }

                let client = builder.build().await.map_err(|e| {
                    ResearchError::llm(format!("Failed to build Anthropic client: {}", e))
                })?;

                Ok(Box::new(client))
            }
            "ollama" => {
                let base_url = options
                    .base_url
                    .clone()
                    .unwrap_or_else(|| "http://localhost:11434".to_string());

                let mut builder = LlmBuilder::new()
                    .ollama()
                    .model(model)
                    .base_url(&base_url)
                    .temperature(options.temperature);

                if let Some(max_tokens) = options.max_tokens {
                    builder = builder.max_tokens(max_tokens);
                }

                let client = builder.build().await.map_err(|e| {
                    ResearchError::llm(format!("Failed to build Ollama client: {}", e))
                })?;

                Ok(Box::new(client))
            }
            "groq" => {
                let api_key = options
                    .resolve_api_key()
                    .ok_or_else(|| ResearchError::config("Groq API key not found"))?;

                let mut builder = LlmBuilder::new()
                    .groq()
                    .api_key(&api_key)
                    .model(model)
                    .temperature(options.temperature);

                if let Some(max_tokens) = options.max_tokens {
                    builder = builder.max_tokens(max_tokens);
                }

                let client = builder.build().await.map_err(|e| {
                    ResearchError::llm(format!("Failed to build Groq client: {}", e))
                })?;

                Ok(Box::new(client))
            }
            provider => Err(ResearchError::config(format!(
                "Unsupported LLM provider: {}",
                provider
            ))),
        }
    }

    /// Get the current configuration
    pub fn options(&self) -> &LlmOptions {
        &self.options
    }
}

#[async_trait]
impl TextGenerator for SiumaiGenerator {
    async fn generate(&self, model: &str, prompt: &str) -> ResearchResult<String> {
        let start_time = Instant::now();

        let client = self
            .clients
            .get(model)
            .or_else(|| self.clients.get(&self.options.query_model))
            .ok_or_else(|| {
                ResearchError::config(format!("No client configured for model: {}", model))
            })?;

        let messages = vec![user!(prompt)];

        let response = client
            .chat(messages)
            .await
            .map_err(|e| ResearchError::llm(format!("LLM generation failed: {}", e)))?;

        let generation_time = start_time.elapsed();

        if let Some(content) = response.content_text() {
            debug!(
                model = model,
                elapsed_ms = generation_time.as_millis() as u64,
                chars = content.len(),
                "Generated response"
            );
            Ok(content.to_string())
        } else {
            Err(ResearchError::llm("No text content in LLM response"))
        }
    }
}
