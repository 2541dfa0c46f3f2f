//! Delver Research - Deep research orchestration engine
//!
//! This crate implements the research pipeline that answers a natural-language
//! question by iteratively generating search queries, gathering evidence in
//! parallel, judging sufficiency, and synthesizing a cited answer. Progress is
//! exposed as a sequenced event stream that transport adapters (SSE,
//! WebSocket) consume without holding any pipeline logic themselves.
//!
//! ## Architecture
//!
//! - **State** ([`state`]): the run-scoped accumulator threaded through all
//!   stages, plus the immutable evidence records produced by search tasks.
//! - **Stages** ([`planner`], [`searcher`], [`reflector`], [`synthesizer`]):
//!   async transformations that degrade to safe defaults instead of failing
//!   the run.
//! - **Engine** ([`engine`]): the cyclic state machine driving the stages,
//!   including the parallel search fan-out with a strict barrier before
//!   aggregation.
//! - **Events** ([`events`]): the per-run progress emitter with two operating
//!   modes (state snapshots or fine-grained node lifecycle events).
//! - **LLM** ([`llm`]): the `generate(prompt) -> text` seam, backed by siumai
//!   in production and by a deterministic generator in demo mode.

pub mod engine;
pub mod events;
pub mod llm;
pub mod planner;
pub mod prompts;
pub mod reflector;
pub mod searcher;
pub mod sources;
pub mod state;
pub mod synthesizer;

pub use engine::{ResearchEngine, StreamingRun};
pub use events::{EventStream, ProgressEmitter, ResearchEvent, StreamMode};
pub use llm::{DemoGenerator, SharedGenerator, SiumaiGenerator, TextGenerator};
pub use state::{
    EvidenceRecord, FinalResult, ResearchPhase, ResearchState, ResearchSummary,
};

/// Engine-level error type
#[derive(Debug, thiserror::Error)]
pub enum ResearchError {
    #[error("Core error: {0}")]
    Core(#[from] delver_core::DelverError),

    #[error("LLM error: {message}")]
    Llm { message: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Research run not found: {run_id}")]
    RunNotFound { run_id: String },

    #[error("Research error: {message}")]
    Research { message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type ResearchResult<T> = Result<T, ResearchError>;

impl ResearchError {
    /// Create an LLM error
    pub fn llm<S: Into<String>>(message: S) -> Self {
        Self::Llm {
            message: message.into(),
        }
    }

    /// Create a validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a research error
    pub fn research<S: Into<String>>(message: S) -> Self {
        Self::Research {
            message: message.into(),
        }
    }
}

/// Prelude module for convenient imports
pub mod prelude {
    pub use super::{
        EvidenceRecord, FinalResult, ResearchEngine, ResearchError, ResearchEvent, ResearchPhase,
        ResearchResult, ResearchState, ResearchSummary, StreamMode, StreamingRun, TextGenerator,
    };
}
