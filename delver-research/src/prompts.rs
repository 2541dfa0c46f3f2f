//! Prompt templates and formatting helpers for the pipeline stages

use crate::state::EvidenceRecord;

pub const QUERY_GENERATION_SYSTEM_PROMPT: &str = r#"You are an expert research assistant specializing in breaking down complex questions into targeted search queries.

Your task is to analyze a user's question and generate focused search queries that will gather comprehensive information to answer their question accurately.

Guidelines:
1. Generate 2-4 specific, targeted search queries
2. Each query should explore a different aspect of the question
3. Use precise, searchable terms that will return high-quality results
4. Avoid overly broad or vague queries

Format your response as JSON:
{
  "rationale": "Brief explanation of your research strategy",
  "queries": ["query1", "query2", "query3"]
}"#;

pub const REFLECTION_SYSTEM_PROMPT: &str = r#"You are a research quality analyst evaluating whether collected information is sufficient to answer a user's question comprehensively.

Your task is to:
1. Analyze all research findings for completeness
2. Identify any significant gaps in information
3. Determine if additional research is needed
4. If more research is needed, generate targeted follow-up queries

Be thorough but practical - don't request unnecessary additional research."#;

pub const ANSWER_SYSTEM_PROMPT: &str = r#"You are an expert research analyst tasked with synthesizing comprehensive, well-sourced answers from research findings.

Guidelines:
- Use markdown formatting for structure and readability
- Include specific facts, statistics, and evidence
- Properly attribute information to sources
- Present information objectively and balanced
- Be comprehensive but concise"#;

/// Build the full query-generation prompt for a question
pub fn query_generation_prompt(question: &str) -> String {
    format!(
        "{}\n\nPlease generate targeted search queries for this question:\n\nQuestion: {}\n\nFocus on creating queries that will help gather authoritative, comprehensive information to provide a well-researched answer.",
        QUERY_GENERATION_SYSTEM_PROMPT, question
    )
}

/// Build the search prompt for a single query
pub fn web_search_prompt(query: &str, original_question: &str) -> String {
    format!(
        "Search for information about: {}\n\nThis search supports the broader research question: {}\n\nPlease provide:\n1. A comprehensive summary of findings\n2. Key facts and data points\n3. Multiple reliable sources with their URLs\n4. Recent developments if applicable\n\nFocus on accuracy and cite specific sources where possible.",
        query, original_question
    )
}

/// Build the reflection prompt over accumulated evidence
pub fn reflection_prompt(
    question: &str,
    evidence: &[EvidenceRecord],
    source_count: usize,
    loop_count: usize,
    min_sources_for_sufficiency: usize,
) -> String {
    format!(
        "{}\n\nOriginal Question: {}\n\nResearch Findings:\n{}\n\nSources Gathered: {} (around {} distinct sources is a useful benchmark)\nResearch Loops Completed: {}\n\nEvaluate if this information is sufficient to provide a comprehensive answer. Format your response as JSON:\n\n{{\n  \"is_sufficient\": true or false,\n  \"analysis\": \"Your evaluation of the research completeness\",\n  \"knowledge_gaps\": \"Specific gaps identified (if any)\",\n  \"follow_up_queries\": [\"additional query 1\", \"additional query 2\"]\n}}",
        REFLECTION_SYSTEM_PROMPT,
        question,
        format_results_for_reflection(evidence),
        source_count,
        min_sources_for_sufficiency,
        loop_count
    )
}

/// Build the final answer-synthesis prompt
pub fn answer_prompt(question: &str, evidence: &[EvidenceRecord], sources: &[String]) -> String {
    format!(
        "{}\n\nOriginal Question: {}\n\nResearch Findings:\n{}\n\nSources:\n{}\n\nPlease synthesize this information into a comprehensive, well-structured answer that directly addresses the user's question. Use markdown formatting and include proper citations.",
        ANSWER_SYSTEM_PROMPT,
        question,
        format_results_for_answer(evidence),
        format_sources_list(sources)
    )
}

/// Format evidence records for reflection analysis
pub fn format_results_for_reflection(evidence: &[EvidenceRecord]) -> String {
    evidence
        .iter()
        .enumerate()
        .map(|(i, record)| {
            format!(
                "Research Area {}: {}\nSummary: {}\nSources: {} sources\nKey URL: {}\n",
                i + 1,
                record.query,
                record.summary,
                record.source_urls.len(),
                record
                    .source_urls
                    .first()
                    .map(String::as_str)
                    .unwrap_or("No sources")
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Format evidence records for final answer generation
pub fn format_results_for_answer(evidence: &[EvidenceRecord]) -> String {
    evidence
        .iter()
        .map(|record| format!("Query: {}\nFindings: {}\n", record.query, record.summary))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Format the source list for citations, capped at the top 20 sources
pub fn format_sources_list(sources: &[String]) -> String {
    sources
        .iter()
        .take(20)
        .map(|source| format!("- {}", source))
        .collect::<Vec<_>>()
        .join("\n")
}
