//! Language model access
//!
//! The pipeline depends on a single opaque capability: `generate(prompt) ->
//! text`. Everything provider-specific lives behind the [`TextGenerator`]
//! trait so the engine can be driven by the siumai-backed client, the demo
//! generator, or a scripted generator in tests.

mod client;
mod demo;

pub use client::SiumaiGenerator;
pub use demo::DemoGenerator;

use crate::ResearchResult;
use async_trait::async_trait;
use std::sync::Arc;

/// Opaque text-generation capability
///
/// Implementations must be safe for concurrent invocation: the search
/// fan-out calls `generate` from many tasks at once.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generate a completion for the prompt using the named model
    async fn generate(&self, model: &str, prompt: &str) -> ResearchResult<String>;
}

/// Shared handle to a generator, cloned into every pipeline stage
pub type SharedGenerator = Arc<dyn TextGenerator>;
