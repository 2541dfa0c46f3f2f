//! Deterministic demo generator
//!
//! Bypasses the language-model dependency entirely with canned output, used
//! in environments without credentials. Responses are keyed off markers in
//! the stage prompt templates, so the full pipeline runs end to end with
//! stable results.

use crate::llm::TextGenerator;
use crate::ResearchResult;
use async_trait::async_trait;
use serde_json::json;

/// Credential-free generator returning deterministic canned output
#[derive(Debug, Default, Clone)]
pub struct DemoGenerator;

impl DemoGenerator {
    pub fn new() -> Self {
        Self
    }

    /// Pull the research question out of a stage prompt
    fn question_from_prompt(prompt: &str) -> Option<&str> {
        prompt
            .lines()
            .find_map(|line| line.strip_prefix("Original Question: "))
            .or_else(|| {
                prompt
                    .lines()
                    .find_map(|line| line.strip_prefix("Question: "))
            })
            .map(str::trim)
    }

    /// Pull the search query out of a search prompt
    fn query_from_prompt(prompt: &str) -> Option<&str> {
        prompt
            .lines()
            .find_map(|line| line.strip_prefix("Search for information about: "))
            .map(str::trim)
    }
}

#[async_trait]
impl TextGenerator for DemoGenerator {
    async fn generate(&self, _model: &str, prompt: &str) -> ResearchResult<String> {
        // Query generation: templated queries mirroring the deterministic
        // fallback set, so demo output matches degraded-mode output.
        if prompt.contains("targeted search queries") {
            let question = Self::question_from_prompt(prompt).unwrap_or("the topic");
            return Ok(json!({
                "rationale": "Demo mode: canned research strategy covering background, analysis, and overview angles",
                "queries": [
                    format!("{} research", question),
                    format!("{} analysis", question),
                    format!("{} overview", question),
                ],
            })
            .to_string());
        }

        // Simulated web search: canned findings with stable source URLs.
        if prompt.starts_with("Search for information about: ") {
            let query = Self::query_from_prompt(prompt).unwrap_or("the query");
            return Ok(format!(
                "Demo findings for '{}'.\n\n\
                 Key points: this is deterministic sample content produced without a language model. \
                 It summarizes what a real search synthesis would contain, including representative \
                 facts and figures.\n\nSources:\n\
                 - https://example.com/research/overview\n\
                 - https://example.org/analysis/background",
                query
            ));
        }

        // Reflection: always judge the evidence sufficient on the first pass.
        if prompt.contains("Research Loops Completed:") {
            return Ok(json!({
                "is_sufficient": true,
                "analysis": "Demo mode: the canned evidence covers the question adequately",
                "knowledge_gaps": "",
                "follow_up_queries": [],
            })
            .to_string());
        }

        // Answer synthesis: canned markdown answer.
        if prompt.contains("synthesize this information") {
            let question = Self::question_from_prompt(prompt).unwrap_or("your question");
            return Ok(format!(
                "## Demo Answer\n\n\
                 This deterministic answer to \"{}\" was produced in demo mode, without calling a \
                 language model.\n\n\
                 - The research pipeline ran end to end: query generation, parallel search, \
                 aggregation, reflection, and synthesis.\n\
                 - Citations reference the demo sources gathered during the search phase \
                 [Source: example.com].\n\n\
                 Configure an API key and disable demo mode for real research output.",
                question
            ));
        }

        Ok("Demo mode response.".to_string())
    }
}
