//! Types for the research pipeline state
//!
//! One [`ResearchState`] exists per run and is mutated stage by stage; the
//! [`EvidenceRecord`]s it accumulates are write-once.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Externally visible pipeline phase, owned by the currently active stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResearchPhase {
    GeneratingQueries,
    SearchWeb,
    Reflection,
    GeneratingAnswer,
    Completed,
    Error,
}

impl std::fmt::Display for ResearchPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ResearchPhase::GeneratingQueries => "generating_queries",
            ResearchPhase::SearchWeb => "search_web",
            ResearchPhase::Reflection => "reflection",
            ResearchPhase::GeneratingAnswer => "generating_answer",
            ResearchPhase::Completed => "completed",
            ResearchPhase::Error => "error",
        };
        write!(f, "{}", name)
    }
}

/// One search task's synthesized findings plus source URLs
///
/// Write-once: failed searches still produce a record (relevance 0.0, error
/// text as summary) so the fan-in barrier never loses track of task count.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvidenceRecord {
    /// Unique record ID, generated at creation
    pub id: String,
    /// The search query that produced this record
    pub query: String,
    /// Synthesized findings, or the error message for failed tasks
    pub summary: String,
    /// Source URLs extracted from the findings; may be empty
    pub source_urls: Vec<String>,
    /// Correlates to the originating fan-out task (e.g. `initial_0`)
    pub task_id: String,
    /// Relevance in [0.0, 1.0]; 0.0 is reserved for error records
    pub relevance_score: f64,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl EvidenceRecord {
    /// Create a record for a successful search task
    pub fn new(
        query: impl Into<String>,
        task_id: impl Into<String>,
        summary: impl Into<String>,
        source_urls: Vec<String>,
        relevance_score: f64,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            query: query.into(),
            summary: summary.into(),
            source_urls,
            task_id: task_id.into(),
            relevance_score: relevance_score.clamp(0.0, 1.0),
            created_at: chrono::Utc::now(),
        }
    }

    /// Create a record for a failed search task
    pub fn failure(
        query: impl Into<String>,
        task_id: impl Into<String>,
        error: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            query: query.into(),
            summary: error.into(),
            source_urls: Vec::new(),
            task_id: task_id.into(),
            relevance_score: 0.0,
            created_at: chrono::Utc::now(),
        }
    }

    /// Whether this record represents a failed search task
    pub fn is_failure(&self) -> bool {
        self.relevance_score == 0.0
    }
}

/// The mutable, run-scoped accumulator threaded through all pipeline stages
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResearchState {
    /// Set once at run start, never mutated
    pub original_question: String,
    /// Replaced each time query generation runs
    pub query_list: Vec<String>,
    /// Explanation from query generation, informational only
    pub rationale: String,
    /// Appended to (never replaced) across loop iterations, arrival order
    pub evidence_records: Vec<EvidenceRecord>,
    /// Deduplicated source URLs, first-seen order, monotonically growing
    pub discovered_sources: Vec<String>,
    /// Set by the reflection stage each loop
    pub is_sufficient: bool,
    /// Missing-information description from reflection
    pub knowledge_gap: String,
    /// Empty unless reflection decides more research is needed
    pub follow_up_queries: Vec<String>,
    /// Incremented once per reflection invocation
    pub loop_count: usize,
    /// Cumulative count of search tasks executed
    pub total_tasks_run: usize,
    /// Set only by answer synthesis
    pub final_answer: String,
    /// Deduplicated citation URLs, first-seen order, set only by answer synthesis
    pub citations: Vec<String>,
    pub current_phase: ResearchPhase,
    /// Append-only, never cleared within a run
    pub errors: Vec<String>,
}

impl ResearchState {
    /// Create the initial state for a run
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            original_question: question.into(),
            query_list: Vec::new(),
            rationale: String::new(),
            evidence_records: Vec::new(),
            discovered_sources: Vec::new(),
            is_sufficient: false,
            knowledge_gap: String::new(),
            follow_up_queries: Vec::new(),
            loop_count: 0,
            total_tasks_run: 0,
            final_answer: String::new(),
            citations: Vec::new(),
            current_phase: ResearchPhase::GeneratingQueries,
            errors: Vec::new(),
        }
    }

    /// Append an error description; errors are never cleared within a run
    pub fn record_error(&mut self, error: impl Into<String>) {
        self.errors.push(error.into());
    }

    /// Set-union new source URLs into the discovered set
    ///
    /// Case-sensitive exact match, first-seen order preserved. Idempotent:
    /// merging already-known URLs is a no-op.
    pub fn merge_sources<I>(&mut self, urls: I)
    where
        I: IntoIterator<Item = String>,
    {
        for url in urls {
            if !self.discovered_sources.contains(&url) {
                self.discovered_sources.push(url);
            }
        }
    }

    /// Serialize the full state for a snapshot progress event
    pub fn snapshot(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_else(|_| serde_json::json!({}))
    }
}

/// Counts describing a finished run, attached to the terminal event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResearchSummary {
    pub total_queries: usize,
    pub total_results: usize,
    pub total_sources: usize,
    pub research_loops: usize,
    pub completion_time: chrono::DateTime<chrono::Utc>,
}

/// Payload of the terminal `complete` event and of a non-streaming run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinalResult {
    pub success: bool,
    pub final_answer: String,
    pub citations: Vec<String>,
    pub research_summary: ResearchSummary,
    pub errors: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_record_is_zero_relevance() {
        let record = EvidenceRecord::failure("rust adoption", "initial_1", "timed out");
        assert!(record.is_failure());
        assert_eq!(record.summary, "timed out");
        assert!(record.source_urls.is_empty());
        assert_eq!(record.task_id, "initial_1");
    }

    #[test]
    fn test_relevance_is_clamped() {
        let record = EvidenceRecord::new("q", "initial_0", "findings", vec![], 1.7);
        assert_eq!(record.relevance_score, 1.0);
    }

    #[test]
    fn test_merge_sources_dedup_is_idempotent() {
        let mut state = ResearchState::new("question");
        state.merge_sources(vec![
            "https://a.example/one".to_string(),
            "https://b.example/two".to_string(),
            "https://a.example/one".to_string(),
        ]);
        assert_eq!(state.discovered_sources.len(), 2);

        let before = state.discovered_sources.clone();
        state.merge_sources(before.clone());
        assert_eq!(state.discovered_sources, before);
    }

    #[test]
    fn test_merge_sources_is_case_sensitive() {
        let mut state = ResearchState::new("question");
        state.merge_sources(vec![
            "https://a.example/One".to_string(),
            "https://a.example/one".to_string(),
        ]);
        assert_eq!(state.discovered_sources.len(), 2);
    }

    #[test]
    fn test_phase_serializes_snake_case() {
        let json = serde_json::to_string(&ResearchPhase::GeneratingAnswer).unwrap();
        assert_eq!(json, "\"generating_answer\"");
        assert_eq!(ResearchPhase::SearchWeb.to_string(), "search_web");
    }

    #[test]
    fn test_snapshot_contains_phase_and_counts() {
        let mut state = ResearchState::new("what is x");
        state.query_list = vec!["x research".to_string()];
        let snapshot = state.snapshot();
        assert_eq!(snapshot["current_phase"], "generating_queries");
        assert_eq!(snapshot["query_list"].as_array().unwrap().len(), 1);
    }
}
