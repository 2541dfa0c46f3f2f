//! Answer synthesis stage
//!
//! The terminal stage: compiles all evidence into the final cited answer.
//! Must never leave the run without some answer, so a model failure produces
//! a user-facing apology instead of an error.

use crate::llm::SharedGenerator;
use crate::state::{ResearchState, ResearchSummary};
use crate::{prompts, sources};
use tracing::{debug, warn};

/// Output of the answer-synthesis stage
#[derive(Debug, Clone)]
pub struct SynthesizedAnswer {
    pub final_answer: String,
    /// Deduplicated citation URLs, first-seen order over the evidence records
    pub citations: Vec<String>,
    pub summary: ResearchSummary,
    /// Set when the stage failed and the answer is an apology
    pub error: Option<String>,
}

/// Answer-synthesis stage
#[derive(Clone)]
pub struct Synthesizer {
    generator: SharedGenerator,
    model: String,
}

impl Synthesizer {
    pub fn new(generator: SharedGenerator, model: String) -> Self {
        Self { generator, model }
    }

    /// Compile the final answer from the accumulated run state
    pub async fn synthesize(&self, state: &ResearchState) -> SynthesizedAnswer {
        debug!(
            records = state.evidence_records.len(),
            sources = state.discovered_sources.len(),
            "Generating final answer"
        );

        let prompt = prompts::answer_prompt(
            &state.original_question,
            &state.evidence_records,
            &state.discovered_sources,
        );

        let citations = extract_citations(state);

        match self.generator.generate(&self.model, &prompt).await {
            Ok(final_answer) => {
                let summary = build_summary(state, citations.len());
                debug!(citations = citations.len(), "Final answer generated");
                SynthesizedAnswer {
                    final_answer,
                    citations,
                    summary,
                    error: None,
                }
            }
            Err(e) => {
                warn!(error = %e, "Answer generation failed");
                let summary = build_summary(state, 0);
                SynthesizedAnswer {
                    final_answer: format!(
                        "I apologize, but I encountered an error while generating the final answer: {}",
                        e
                    ),
                    citations: Vec::new(),
                    summary,
                    error: Some(format!("Answer generation failed: {}", e)),
                }
            }
        }
    }
}

/// Citations are the union of all evidence source URLs, deduplicated with
/// first-seen order preserved
fn extract_citations(state: &ResearchState) -> Vec<String> {
    sources::dedup_first_seen(
        state
            .evidence_records
            .iter()
            .flat_map(|record| record.source_urls.iter().cloned()),
    )
}

fn build_summary(state: &ResearchState, total_sources: usize) -> ResearchSummary {
    ResearchSummary {
        total_queries: state.query_list.len(),
        total_results: state.evidence_records.len(),
        total_sources,
        research_loops: state.loop_count,
        completion_time: chrono::Utc::now(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::TextGenerator;
    use crate::state::EvidenceRecord;
    use crate::ResearchResult;
    use async_trait::async_trait;
    use std::sync::Arc;

    struct CannedGenerator;

    #[async_trait]
    impl TextGenerator for CannedGenerator {
        async fn generate(&self, _model: &str, _prompt: &str) -> ResearchResult<String> {
            Ok("## Answer\n\nSynthesized answer text.".to_string())
        }
    }

    struct FailingGenerator;

    #[async_trait]
    impl TextGenerator for FailingGenerator {
        async fn generate(&self, _model: &str, _prompt: &str) -> ResearchResult<String> {
            Err(crate::ResearchError::llm("model offline"))
        }
    }

    fn state_with_evidence() -> ResearchState {
        let mut state = ResearchState::new("what is x?");
        state.query_list = vec!["x research".to_string(), "x analysis".to_string()];
        state.loop_count = 1;
        state.evidence_records.push(EvidenceRecord::new(
            "x research",
            "initial_0",
            "findings",
            vec![
                "https://a.example/1".to_string(),
                "https://b.example/2".to_string(),
            ],
            0.9,
        ));
        state.evidence_records.push(EvidenceRecord::new(
            "x analysis",
            "initial_1",
            "more findings",
            vec![
                "https://b.example/2".to_string(),
                "https://c.example/3".to_string(),
            ],
            0.9,
        ));
        let urls: Vec<String> = state
            .evidence_records
            .iter()
            .flat_map(|r| r.source_urls.clone())
            .collect();
        state.merge_sources(urls);
        state
    }

    #[tokio::test]
    async fn test_citations_are_deduplicated_first_seen() {
        let synthesizer = Synthesizer::new(Arc::new(CannedGenerator), "answer-model".to_string());
        let answer = synthesizer.synthesize(&state_with_evidence()).await;

        assert_eq!(
            answer.citations,
            vec![
                "https://a.example/1".to_string(),
                "https://b.example/2".to_string(),
                "https://c.example/3".to_string(),
            ]
        );
        assert_eq!(answer.summary.total_sources, 3);
        assert_eq!(answer.summary.total_results, 2);
        assert_eq!(answer.summary.research_loops, 1);
        assert!(answer.error.is_none());
    }

    #[tokio::test]
    async fn test_failure_yields_apology_and_empty_citations() {
        let synthesizer = Synthesizer::new(Arc::new(FailingGenerator), "answer-model".to_string());
        let answer = synthesizer.synthesize(&state_with_evidence()).await;

        assert!(answer.final_answer.starts_with("I apologize"));
        assert!(answer.citations.is_empty());
        assert!(answer.error.unwrap().contains("model offline"));
    }

    #[tokio::test]
    async fn test_empty_evidence_still_produces_answer() {
        let synthesizer = Synthesizer::new(Arc::new(CannedGenerator), "answer-model".to_string());
        let answer = synthesizer.synthesize(&ResearchState::new("q")).await;
        assert!(!answer.final_answer.is_empty());
        assert_eq!(answer.summary.total_results, 0);
    }
}
