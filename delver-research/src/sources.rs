//! Source URL handling
//!
//! Extracts URLs from model-generated text and deduplicates them while
//! preserving first-seen order.

use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;

static URL_PATTERN: OnceLock<Regex> = OnceLock::new();

fn url_regex() -> &'static Regex {
    URL_PATTERN.get_or_init(|| {
        Regex::new(r"https?://[\w\-\.]+\.[a-zA-Z]{2,}(?:/[\w\-\._~:/?#\[\]@!$&'()*+,;=%]*)?")
            .expect("URL pattern is valid")
    })
}

/// Extract unique URLs from free text, first-seen order preserved
pub fn extract_urls(text: &str) -> Vec<String> {
    dedup_first_seen(url_regex().find_iter(text).map(|m| m.as_str().to_string()))
}

/// Deduplicate strings preserving the order of first occurrence
///
/// Case-sensitive exact match; used for both discovered sources and
/// citations.
pub fn dedup_first_seen<I>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut seen = HashSet::new();
    let mut unique = Vec::new();
    for item in items {
        if !item.is_empty() && seen.insert(item.clone()) {
            unique.push(item);
        }
    }
    unique
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_urls_from_prose() {
        let text = "See https://example.com/report and http://data.example.org/stats?y=2024 for details.";
        let urls = extract_urls(text);
        assert_eq!(
            urls,
            vec![
                "https://example.com/report".to_string(),
                "http://data.example.org/stats?y=2024".to_string(),
            ]
        );
    }

    #[test]
    fn test_extract_urls_dedups_repeats() {
        let text = "https://example.com/a then again https://example.com/a and https://example.com/b";
        let urls = extract_urls(text);
        assert_eq!(urls.len(), 2);
        assert_eq!(urls[0], "https://example.com/a");
    }

    #[test]
    fn test_no_urls_yields_empty() {
        assert!(extract_urls("no links here").is_empty());
    }

    #[test]
    fn test_dedup_first_seen_keeps_order() {
        let deduped = dedup_first_seen(
            ["b", "a", "b", "c", "a"]
                .into_iter()
                .map(str::to_string),
        );
        assert_eq!(deduped, vec!["b", "a", "c"]);
    }
}
