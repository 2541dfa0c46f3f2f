//! Search stage
//!
//! One invocation per query, run in parallel by the engine. A search task
//! never raises past its boundary: model failures and timeouts become
//! zero-relevance evidence records so the fan-in barrier always receives
//! exactly one record per dispatched task.

use crate::llm::SharedGenerator;
use crate::state::EvidenceRecord;
use crate::{prompts, sources};
use delver_core::{with_timeout, ResearchOptions};
use tracing::{debug, warn};

/// A single fanned-out search task
#[derive(Debug, Clone)]
pub struct SearchTask {
    pub query: String,
    /// `initial_<i>` on the first round, `followup_<loop>_<i>` after
    pub task_id: String,
    /// The run's original question, passed along for context
    pub original_question: String,
}

/// Result of one search task: always exactly one record
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub record: EvidenceRecord,
    /// Set when the task failed; the engine folds it into the run's error list
    pub error: Option<String>,
}

/// Search stage
#[derive(Clone)]
pub struct Searcher {
    generator: SharedGenerator,
    options: ResearchOptions,
    model: String,
}

impl Searcher {
    pub fn new(generator: SharedGenerator, options: ResearchOptions, model: String) -> Self {
        Self {
            generator,
            options,
            model,
        }
    }

    /// Execute one search task
    pub async fn search(&self, task: SearchTask) -> SearchOutcome {
        debug!(task_id = %task.task_id, query = %task.query, "Starting search task");

        let prompt = prompts::web_search_prompt(&task.query, &task.original_question);
        let timeout_ms = self.options.search_timeout_seconds * 1000;

        let generated = with_timeout(
            self.generator.generate(&self.model, &prompt),
            timeout_ms,
            "web_search",
        )
        .await;

        match generated {
            Ok(Ok(summary)) => {
                let mut urls = sources::extract_urls(&summary);
                urls.truncate(self.options.max_sources_per_query);

                debug!(
                    task_id = %task.task_id,
                    sources = urls.len(),
                    "Search task completed"
                );

                SearchOutcome {
                    record: EvidenceRecord::new(task.query, task.task_id, summary, urls, 0.9),
                    error: None,
                }
            }
            Ok(Err(e)) => self.failed(task, e.to_string()),
            Err(timeout) => self.failed(task, timeout.to_string()),
        }
    }

    fn failed(&self, task: SearchTask, error: String) -> SearchOutcome {
        warn!(task_id = %task.task_id, error = %error, "Search task failed");
        SearchOutcome {
            record: EvidenceRecord::failure(task.query.clone(), task.task_id, error.clone()),
            error: Some(format!("Web search failed for '{}': {}", task.query, error)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::TextGenerator;
    use crate::ResearchResult;
    use async_trait::async_trait;
    use std::sync::Arc;

    struct CannedGenerator(&'static str);

    #[async_trait]
    impl TextGenerator for CannedGenerator {
        async fn generate(&self, _model: &str, _prompt: &str) -> ResearchResult<String> {
            Ok(self.0.to_string())
        }
    }

    struct FailingGenerator;

    #[async_trait]
    impl TextGenerator for FailingGenerator {
        async fn generate(&self, _model: &str, _prompt: &str) -> ResearchResult<String> {
            Err(crate::ResearchError::llm("provider unavailable"))
        }
    }

    fn task() -> SearchTask {
        SearchTask {
            query: "rust adoption".to_string(),
            task_id: "initial_0".to_string(),
            original_question: "how widely is rust used?".to_string(),
        }
    }

    #[tokio::test]
    async fn test_successful_search_extracts_sources() {
        let searcher = Searcher::new(
            Arc::new(CannedGenerator(
                "Rust adoption keeps growing. See https://example.com/survey for data.",
            )),
            ResearchOptions::default(),
            "search-model".to_string(),
        );

        let outcome = searcher.search(task()).await;
        assert!(outcome.error.is_none());
        assert!(!outcome.record.is_failure());
        assert_eq!(
            outcome.record.source_urls,
            vec!["https://example.com/survey".to_string()]
        );
    }

    #[tokio::test]
    async fn test_source_cap_is_applied() {
        let summary: String = (0..15)
            .map(|i| format!("https://s{}.example/page ", i))
            .collect();
        let options = ResearchOptions {
            max_sources_per_query: 10,
            ..Default::default()
        };
        let searcher = Searcher::new(
            Arc::new(CannedGenerator(Box::leak(summary.into_boxed_str()))),
            options,
            "search-model".to_string(),
        );

        let outcome = searcher.search(task()).await;
        assert_eq!(outcome.record.source_urls.len(), 10);
    }

    #[tokio::test]
    async fn test_failed_search_becomes_error_record() {
        let searcher = Searcher::new(
            Arc::new(FailingGenerator),
            ResearchOptions::default(),
            "search-model".to_string(),
        );

        let outcome = searcher.search(task()).await;
        assert!(outcome.record.is_failure());
        assert!(outcome.record.summary.contains("provider unavailable"));
        assert!(outcome.error.unwrap().contains("rust adoption"));
    }
}
