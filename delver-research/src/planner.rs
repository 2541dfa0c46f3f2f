//! Query generation stage
//!
//! Turns the user's question into targeted search queries. This stage never
//! fails the run: on model failure or unparseable output it falls back to a
//! deterministic templated query set and records the failure.

use crate::llm::SharedGenerator;
use crate::prompts;
use delver_core::ResearchOptions;
use serde_json::Value;
use tracing::{debug, warn};

/// Output of the query-generation stage
#[derive(Debug, Clone)]
pub struct QueryPlan {
    pub queries: Vec<String>,
    pub rationale: String,
    /// Set when the stage degraded to the deterministic fallback
    pub error: Option<String>,
}

/// Query-generation stage
#[derive(Clone)]
pub struct QueryPlanner {
    generator: SharedGenerator,
    options: ResearchOptions,
    model: String,
}

impl QueryPlanner {
    pub fn new(generator: SharedGenerator, options: ResearchOptions, model: String) -> Self {
        Self {
            generator,
            options,
            model,
        }
    }

    /// Generate up to `initial_queries_count` search queries for the question
    pub async fn generate_queries(&self, question: &str) -> QueryPlan {
        debug!(question, "Generating search queries");

        let prompt = prompts::query_generation_prompt(question);

        let mut plan = match self.generator.generate(&self.model, &prompt).await {
            Ok(raw) => match parse_query_response(&raw) {
                Some((queries, rationale)) => QueryPlan {
                    queries,
                    rationale,
                    error: None,
                },
                None => {
                    warn!("Query generation returned unparseable output, using fallback queries");
                    QueryPlan {
                        queries: fallback_queries(question),
                        rationale: "Generated basic research queries".to_string(),
                        error: Some(
                            "Query generation failed: unparseable model output".to_string(),
                        ),
                    }
                }
            },
            Err(e) => {
                warn!(error = %e, "Query generation failed, using fallback queries");
                QueryPlan {
                    queries: fallback_queries(question),
                    rationale: "Generated basic research queries".to_string(),
                    error: Some(format!("Query generation failed: {}", e)),
                }
            }
        };

        plan.queries.truncate(self.options.initial_queries_count);
        debug!(count = plan.queries.len(), "Generated queries");
        plan
    }
}

/// Deterministic fallback query set derived from the question
pub fn fallback_queries(question: &str) -> Vec<String> {
    vec![
        format!("{} research", question),
        format!("{} analysis", question),
        format!("{} overview", question),
    ]
}

/// Tolerant parse of the model's JSON response
///
/// Accepts the JSON object anywhere in the response text, any string-array
/// field as the query list, and several spellings of the rationale field.
fn parse_query_response(raw: &str) -> Option<(Vec<String>, String)> {
    let json_text = extract_json_object(raw)?;
    let parsed: Value = serde_json::from_str(json_text).ok()?;

    let queries = parsed
        .get("queries")
        .and_then(string_array)
        .or_else(|| {
            parsed
                .as_object()?
                .values()
                .find_map(|value| string_array(value).filter(|list| !list.is_empty()))
        })?;

    if queries.is_empty() {
        return None;
    }

    let rationale = ["rationale", "thought", "thoughts", "reasoning", "explanation"]
        .iter()
        .find_map(|key| parsed.get(*key).and_then(Value::as_str))
        .unwrap_or("Generated research queries")
        .to_string();

    Some((queries, rationale))
}

/// Slice out the first `{..}` block from the response text
fn extract_json_object(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    (start < end).then(|| &raw[start..=end])
}

fn string_array(value: &Value) -> Option<Vec<String>> {
    let array = value.as_array()?;
    array
        .iter()
        .map(|item| item.as_str().map(str::to_string))
        .collect()
}
