//! Triage Extract - hostname extraction from ticket text
//!
//! The extraction oracles (an OpenAI-compatible LLM and a rule-based
//! regex fallback) return raw candidate records; the
//! [`ExtractionAdapter`] normalizes those into the pipeline's internal
//! shape. The adapter is deliberately not the NLP logic: it only
//! validates, defaults, and deduplicates.

pub mod openai;
pub mod rules;

pub use openai::OpenAiExtractor;
pub use rules::RuleBasedExtractor;

use std::sync::Arc;

use triage_core::{Confidence, ExtractionOracle, Result, TicketExtraction};

/// Normalizes oracle output into validated ticket extractions
///
/// One pass per call. Records with an empty hostname are dropped, a
/// missing issue type defaults to `"unspecified"`, and identical
/// (hostname, issue_type) pairs within one ticket collapse to the
/// first occurrence. Confidence is passed through unmodified and never
/// gates inclusion: low-confidence extractions still get looked up and
/// surface as metadata for downstream review.
pub struct ExtractionAdapter {
    oracle: Arc<dyn ExtractionOracle>,
}

impl ExtractionAdapter {
    pub fn new(oracle: Arc<dyn ExtractionOracle>) -> Self {
        Self { oracle }
    }

    pub async fn extract(&self, ticket_text: &str) -> Result<Vec<TicketExtraction>> {
        let raw = self.oracle.extract(ticket_text).await?;

        let mut extractions: Vec<TicketExtraction> = Vec::with_capacity(raw.len());
        for record in raw {
            let hostname = record.hostname.trim();
            if hostname.is_empty() {
                tracing::warn!("oracle returned a record without a hostname, dropping it");
                continue;
            }

            let extraction = TicketExtraction {
                hostname: hostname.to_string(),
                issue_type: record
                    .issue_type
                    .map(|t| t.trim().to_string())
                    .filter(|t| !t.is_empty())
                    .unwrap_or_else(|| "unspecified".to_string()),
                confidence: record.confidence.unwrap_or(Confidence::Medium),
            };

            // Within one ticket, a repeated (hostname, issue_type) pair
            // is noise; the first occurrence wins
            let duplicate = extractions.iter().any(|e| {
                e.hostname.eq_ignore_ascii_case(&extraction.hostname)
                    && e.issue_type == extraction.issue_type
            });
            if !duplicate {
                extractions.push(extraction);
            }
        }

        tracing::debug!(count = extractions.len(), "ticket extraction complete");
        Ok(extractions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use triage_core::RawExtraction;

    struct FixedOracle(Vec<RawExtraction>);

    #[async_trait::async_trait]
    impl ExtractionOracle for FixedOracle {
        async fn extract(&self, _ticket_text: &str) -> Result<Vec<RawExtraction>> {
            Ok(self.0.clone())
        }
    }

    fn raw(
        hostname: &str,
        issue_type: Option<&str>,
        confidence: Option<Confidence>,
    ) -> RawExtraction {
        RawExtraction {
            hostname: hostname.to_string(),
            issue_type: issue_type.map(str::to_string),
            confidence,
        }
    }

    #[tokio::test]
    async fn test_defaults_missing_issue_type() {
        let adapter = ExtractionAdapter::new(Arc::new(FixedOracle(vec![raw(
            "WEB01",
            None,
            Some(Confidence::High),
        )])));

        let extractions = adapter.extract("ticket").await.unwrap();
        assert_eq!(extractions.len(), 1);
        assert_eq!(extractions[0].issue_type, "unspecified");
        assert_eq!(extractions[0].confidence, Confidence::High);
    }

    #[tokio::test]
    async fn test_deduplicates_within_ticket() {
        let adapter = ExtractionAdapter::new(Arc::new(FixedOracle(vec![
            raw("WEB01", Some("reboot"), Some(Confidence::High)),
            raw("web01", Some("reboot"), Some(Confidence::Low)),
            raw("WEB01", Some("disk"), Some(Confidence::Medium)),
        ])));

        let extractions = adapter.extract("ticket").await.unwrap();
        // Same hostname with a different issue type is a distinct record
        assert_eq!(extractions.len(), 2);
        assert_eq!(extractions[0].hostname, "WEB01");
        assert_eq!(extractions[0].issue_type, "reboot");
        assert_eq!(extractions[0].confidence, Confidence::High);
        assert_eq!(extractions[1].issue_type, "disk");
    }

    #[tokio::test]
    async fn test_drops_empty_hostnames_and_trims() {
        let adapter = ExtractionAdapter::new(Arc::new(FixedOracle(vec![
            raw("   ", Some("reboot"), None),
            raw("  DB-PROD-01 ", Some("  "), None),
        ])));

        let extractions = adapter.extract("ticket").await.unwrap();
        assert_eq!(extractions.len(), 1);
        assert_eq!(extractions[0].hostname, "DB-PROD-01");
        assert_eq!(extractions[0].issue_type, "unspecified");
        assert_eq!(extractions[0].confidence, Confidence::Medium);
    }

    #[tokio::test]
    async fn test_low_confidence_is_not_filtered() {
        let adapter = ExtractionAdapter::new(Arc::new(FixedOracle(vec![raw(
            "APP-SERVER-03",
            Some("unreachable"),
            Some(Confidence::Low),
        )])));

        let extractions = adapter.extract("ticket").await.unwrap();
        assert_eq!(extractions.len(), 1);
        assert_eq!(extractions[0].confidence, Confidence::Low);
    }
}
