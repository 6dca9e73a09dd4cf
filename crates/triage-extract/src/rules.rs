//! Rule-based extraction oracle
//!
//! Regex patterns with per-pattern confidence, plus a small keyword
//! table for the issue type. Used as the offline fallback when no LLM
//! API key is configured; quality is deliberately modest, which is why
//! every hit carries a confidence tag for downstream review.

use regex::Regex;

use triage_core::{Confidence, ExtractionOracle, RawExtraction, Result};

/// Keyword table mapping ticket phrasing to an issue type
const ISSUE_KEYWORDS: &[(&str, &str)] = &[
    ("reboot", "reboot"),
    ("restart", "reboot"),
    ("not responding", "unreachable"),
    ("unreachable", "unreachable"),
    ("offline", "unreachable"),
    ("down", "unreachable"),
    ("disk", "disk"),
    ("storage", "disk"),
    ("filesystem", "disk"),
    ("slow", "performance"),
    ("cpu", "performance"),
    ("memory", "performance"),
];

/// Regex-driven extraction oracle
pub struct RuleBasedExtractor {
    /// Pattern rules in priority order (regex, confidence)
    patterns: Vec<(Regex, Confidence)>,
}

impl RuleBasedExtractor {
    pub fn new() -> Self {
        let mut extractor = Self {
            patterns: Vec::new(),
        };

        // Explicit "Server: <name>" labels
        extractor.add_pattern(r"(?i)server:\s*([^\s,;]+)", Confidence::High);
        // Fully qualified domain names
        extractor.add_pattern(
            r"\b([A-Za-z0-9][A-Za-z0-9-]*(?:\.[A-Za-z0-9-]+)+\.[A-Za-z]{2,})\b",
            Confidence::Medium,
        );
        // Hyphenated server names ending in a digit (DB-PROD-01, CLOUD-LNX-DOCK01)
        extractor.add_pattern(
            r"\b([A-Za-z][A-Za-z0-9]*(?:-[A-Za-z0-9]+)*-[A-Za-z]*[0-9]+)\b",
            Confidence::Low,
        );
        // Compact server names (WEB01, APP03)
        extractor.add_pattern(r"\b([A-Za-z]{2,}[0-9]{2,})\b", Confidence::Low);

        extractor
    }

    fn add_pattern(&mut self, pattern: &str, confidence: Confidence) {
        // Patterns are compile-time constants; a failure here is a bug
        let regex = Regex::new(pattern).expect("invalid extraction pattern");
        self.patterns.push((regex, confidence));
    }

    /// Classify the ticket's issue from keyword hits, first match wins
    fn classify_issue(ticket_text: &str) -> Option<String> {
        let lowered = ticket_text.to_lowercase();
        ISSUE_KEYWORDS
            .iter()
            .find(|(keyword, _)| lowered.contains(keyword))
            .map(|(_, issue)| issue.to_string())
    }
}

impl Default for RuleBasedExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl ExtractionOracle for RuleBasedExtractor {
    async fn extract(&self, ticket_text: &str) -> Result<Vec<RawExtraction>> {
        let issue_type = Self::classify_issue(ticket_text);

        let mut seen: Vec<String> = Vec::new();
        let mut extractions = Vec::new();

        // Priority order: a hostname caught by an earlier pattern keeps
        // that pattern's confidence
        for (regex, confidence) in &self.patterns {
            for captures in regex.captures_iter(ticket_text) {
                let Some(hostname) = captures.get(1).map(|m| m.as_str().trim()) else {
                    continue;
                };
                if hostname.is_empty() {
                    continue;
                }
                if seen.iter().any(|s| s.eq_ignore_ascii_case(hostname)) {
                    continue;
                }
                seen.push(hostname.to_string());
                extractions.push(RawExtraction {
                    hostname: hostname.to_string(),
                    issue_type: issue_type.clone(),
                    confidence: Some(*confidence),
                });
            }
        }

        Ok(extractions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_server_label_has_high_confidence() {
        let extractor = RuleBasedExtractor::new();
        let extractions = extractor
            .extract("Server: CLOUD-LNX-DOCK01 needs a reboot")
            .await
            .unwrap();

        assert_eq!(extractions.len(), 1);
        assert_eq!(extractions[0].hostname, "CLOUD-LNX-DOCK01");
        assert_eq!(extractions[0].confidence, Some(Confidence::High));
        assert_eq!(extractions[0].issue_type.as_deref(), Some("reboot"));
    }

    #[tokio::test]
    async fn test_bare_server_names_are_low_confidence() {
        let extractor = RuleBasedExtractor::new();
        let extractions = extractor
            .extract("WEB01 and DB-PROD-01 are not responding")
            .await
            .unwrap();

        let hostnames: Vec<&str> = extractions.iter().map(|e| e.hostname.as_str()).collect();
        assert!(hostnames.contains(&"WEB01"));
        assert!(hostnames.contains(&"DB-PROD-01"));
        for extraction in &extractions {
            assert_eq!(extraction.confidence, Some(Confidence::Low));
            assert_eq!(extraction.issue_type.as_deref(), Some("unreachable"));
        }
    }

    #[tokio::test]
    async fn test_fqdn_extraction() {
        let extractor = RuleBasedExtractor::new();
        let extractions = extractor
            .extract("Cannot reach app.eu.company.com this morning")
            .await
            .unwrap();

        assert_eq!(extractions.len(), 1);
        assert_eq!(extractions[0].hostname, "app.eu.company.com");
        assert_eq!(extractions[0].confidence, Some(Confidence::Medium));
    }

    #[tokio::test]
    async fn test_duplicate_mentions_collapse_to_first_pattern() {
        let extractor = RuleBasedExtractor::new();
        let extractions = extractor
            .extract("Server: WEB01 is down. WEB01 again.")
            .await
            .unwrap();

        assert_eq!(extractions.len(), 1);
        assert_eq!(extractions[0].confidence, Some(Confidence::High));
    }

    #[tokio::test]
    async fn test_no_hostnames_yields_empty_list() {
        let extractor = RuleBasedExtractor::new();
        let extractions = extractor
            .extract("My password expired, please reset it")
            .await
            .unwrap();
        assert!(extractions.is_empty());
    }

    #[test]
    fn test_issue_classification() {
        assert_eq!(
            RuleBasedExtractor::classify_issue("please restart the box").as_deref(),
            Some("reboot")
        );
        assert_eq!(
            RuleBasedExtractor::classify_issue("the disk is full").as_deref(),
            Some("disk")
        );
        assert_eq!(RuleBasedExtractor::classify_issue("hello"), None);
    }
}
