//! Reflection stage
//!
//! Judges whether the accumulated evidence suffices to answer the question.
//! On unparseable model output the stage defaults to "sufficient". This is
//! the safeguard that keeps malformed output from looping the pipeline
//! forever, and it must stay that way.

use crate::llm::SharedGenerator;
use crate::prompts;
use crate::state::EvidenceRecord;
use delver_core::ResearchOptions;
use serde_json::Value;
use tracing::{debug, warn};

/// Output of the reflection stage
#[derive(Debug, Clone)]
pub struct Reflection {
    pub is_sufficient: bool,
    pub knowledge_gap: String,
    pub follow_up_queries: Vec<String>,
    /// Set when the stage degraded to the conservative default
    pub error: Option<String>,
}

/// Reflection stage
#[derive(Clone)]
pub struct Reflector {
    generator: SharedGenerator,
    options: ResearchOptions,
    model: String,
}

impl Reflector {
    pub fn new(generator: SharedGenerator, options: ResearchOptions, model: String) -> Self {
        Self {
            generator,
            options,
            model,
        }
    }

    /// Judge the accumulated evidence
    pub async fn reflect(
        &self,
        question: &str,
        evidence: &[EvidenceRecord],
        source_count: usize,
        loop_count: usize,
    ) -> Reflection {
        debug!(
            records = evidence.len(),
            sources = source_count,
            loop_count,
            "Reflecting on search results"
        );

        let prompt = prompts::reflection_prompt(
            question,
            evidence,
            source_count,
            loop_count,
            self.options.min_sources_for_sufficiency,
        );

        match self.generator.generate(&self.model, &prompt).await {
            Ok(raw) => match parse_reflection(&raw) {
                Some(reflection) => reflection,
                None => {
                    warn!("Reflection returned unparseable output, assuming sufficient");
                    Reflection {
                        is_sufficient: true,
                        knowledge_gap: String::new(),
                        follow_up_queries: Vec::new(),
                        error: Some(
                            "Reflection failed: unparseable model output".to_string(),
                        ),
                    }
                }
            },
            Err(e) => {
                warn!(error = %e, "Reflection failed, assuming sufficient");
                Reflection {
                    is_sufficient: true,
                    knowledge_gap: format!("Reflection error: {}", e),
                    follow_up_queries: Vec::new(),
                    error: Some(format!("Reflection failed: {}", e)),
                }
            }
        }
    }
}

/// Parse the reflection JSON, tolerating surrounding prose and both the
/// singular and plural gap field names
fn parse_reflection(raw: &str) -> Option<Reflection> {
    let json_text = match (raw.find('{'), raw.rfind('}')) {
        (Some(start), Some(end)) if start < end => raw[start..=end].to_string(),
        // Some models return bare key/value lines with the braces stripped
        _ => format!("{{{}}}", raw.trim()),
    };

    let parsed: Value = serde_json::from_str(&json_text).ok()?;
    let object = parsed.as_object()?;

    let is_sufficient = object
        .get("is_sufficient")
        .and_then(Value::as_bool)
        .unwrap_or(true);

    let knowledge_gap = object
        .get("knowledge_gaps")
        .or_else(|| object.get("knowledge_gap"))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    let follow_up_queries = object
        .get("follow_up_queries")
        .and_then(Value::as_array)
        .map(|array| {
            array
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    Some(Reflection {
        is_sufficient,
        knowledge_gap,
        follow_up_queries,
        error: None,
    })
}
