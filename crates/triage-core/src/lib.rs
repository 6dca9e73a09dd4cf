//! Triage Core - Domain models, traits, and shared types
//!
//! This crate defines the core abstractions used throughout the triage
//! system:
//! - Ticket extraction records and lookup results
//! - The batch report produced by a collation run
//! - Common error types
//! - Traits for the extraction oracle and the lookup service
//! - Configuration management

pub mod config;

pub use config::{AppConfig, CacheConfig, ConfigError, LlmConfig, LookupConfig};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Core error types for triage operations
///
/// "Not found" is deliberately not an error: it is modeled as data
/// (`found = false` on the lookup results) so that it can never be
/// confused with a transport or availability failure.
#[derive(Error, Debug)]
pub enum TriageError {
    /// The extraction oracle was unreachable or returned a malformed response
    #[error("Extraction failed: {0}")]
    Extraction(String),

    /// The lookup service was unreachable or its backing store unreadable
    #[error("Lookup backend error: {0}")]
    Lookup(String),

    /// A ticket source could not be read; reported to the caller before
    /// any processing, never mixed into a batch report
    #[error("Cannot read ticket source: {path}")]
    TicketSource {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, TriageError>;

// ============================================================================
// Extraction Model
// ============================================================================

/// Extraction confidence reported by the oracle
///
/// Informational only: low-confidence extractions are still looked up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

impl Confidence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl std::fmt::Display for Confidence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Wire-shape record as returned by an extraction oracle, before
/// validation and defaulting by the adapter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawExtraction {
    pub hostname: String,

    #[serde(default)]
    pub issue_type: Option<String>,

    #[serde(default)]
    pub confidence: Option<Confidence>,
}

/// A validated extraction from one ticket
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketExtraction {
    pub hostname: String,
    pub issue_type: String,
    pub confidence: Confidence,
}

// ============================================================================
// Lookup Model
// ============================================================================

/// Result of resolving a hostname to its support group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostnameLookupResult {
    pub hostname: String,
    pub support_group: Option<String>,
    pub found: bool,
}

impl HostnameLookupResult {
    /// A definitive "no matching row" answer
    pub fn not_found(hostname: impl Into<String>) -> Self {
        Self {
            hostname: hostname.into(),
            support_group: None,
            found: false,
        }
    }
}

/// Result of resolving a support group to its contact information
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactLookupResult {
    pub support_group: String,
    pub app_owner: Option<String>,
    pub email_distros: Option<String>,
    pub individual_contacts: Option<String>,
    pub found: bool,
}

impl ContactLookupResult {
    /// A definitive "no matching row" answer
    pub fn not_found(support_group: impl Into<String>) -> Self {
        Self {
            support_group: support_group.into(),
            app_owner: None,
            email_distros: None,
            individual_contacts: None,
            found: false,
        }
    }
}

// ============================================================================
// Batch Report
// ============================================================================

/// Per-group accumulation of routed hostnames and contact data
///
/// `hostnames` and `issue_types` keep first-seen order and never hold
/// duplicates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupRecord {
    pub support_group: String,
    pub hostnames: Vec<String>,
    pub email_distros: Option<String>,
    pub individual_contacts: Option<String>,
    pub issue_types: Vec<String>,
}

impl GroupRecord {
    pub fn new(support_group: impl Into<String>) -> Self {
        Self {
            support_group: support_group.into(),
            hostnames: Vec::new(),
            email_distros: None,
            individual_contacts: None,
            issue_types: Vec::new(),
        }
    }

    /// Append a hostname, preserving first-seen order; re-adding an
    /// already-present hostname is a no-op
    pub fn add_hostname(&mut self, hostname: &str) {
        if !self.hostnames.iter().any(|h| h == hostname) {
            self.hostnames.push(hostname.to_string());
        }
    }

    /// Union an issue type into the set, preserving first-seen order
    pub fn add_issue_type(&mut self, issue_type: &str) {
        if !self.issue_types.iter().any(|t| t == issue_type) {
            self.issue_types.push(issue_type.to_string());
        }
    }
}

/// Summary statistics for one collation run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub total_hostnames: usize,
    pub total_support_groups: usize,
    pub successful_lookups: usize,
    pub failed_lookups: usize,
    pub coverage_percentage: u32,
}

/// Error bookkeeping for one collation run
///
/// `hostnames_not_found` and a group's `hostnames` are disjoint: a
/// hostname is accounted for in exactly one place.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchErrors {
    pub hostnames_not_found: Vec<String>,
    pub support_groups_not_found: Vec<String>,
    pub other_errors: Vec<String>,
}

/// The single output artifact of a collation run
///
/// Constructed fresh per invocation and never mutated after return.
/// The serialized form is a stable contract for downstream consumers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchReport {
    pub summary: BatchSummary,
    pub groups: BTreeMap<String, GroupRecord>,
    pub errors: BatchErrors,
}

/// Coverage as a rounded percentage; 0 when nothing was extracted
pub fn coverage_percentage(successful: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    (100.0 * successful as f64 / total as f64).round() as u32
}

// ============================================================================
// External Collaborator Traits
// ============================================================================

/// The extraction oracle consumed by the pipeline
///
/// One call performs one pass over the ticket text. A malformed or
/// error response is a transport failure (`Err`), never an empty list.
#[async_trait::async_trait]
pub trait ExtractionOracle: Send + Sync {
    async fn extract(&self, ticket_text: &str) -> Result<Vec<RawExtraction>>;
}

/// Logical tables exposed by the lookup service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LookupTable {
    /// hostname -> support group; columns {support_group, _, server_name},
    /// keyed by server_name
    Assets,
    /// support group -> contacts; columns {app_owner, email_distros,
    /// individual_contacts}, keyed by app_owner
    Contacts,
}

/// Raw row cells returned by a lookup
pub type LookupRow = Vec<String>;

/// Capability interface over the external key-value lookup store
///
/// Matching is exact, case-insensitive, and trimmed, performed by the
/// implementation. Any key-value or relational store satisfying this
/// interface is substitutable.
#[async_trait::async_trait]
pub trait LookupService: Send + Sync {
    async fn resolve_by_key(&self, table: LookupTable, key: &str) -> Result<Option<LookupRow>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_record_idempotent_add() {
        let mut record = GroupRecord::new("Linux Support Team");
        record.add_hostname("WEB01");
        record.add_hostname("WEB01");
        record.add_hostname("WEB02");
        assert_eq!(record.hostnames, vec!["WEB01", "WEB02"]);

        record.add_issue_type("reboot");
        record.add_issue_type("reboot");
        assert_eq!(record.issue_types, vec!["reboot"]);
    }

    #[test]
    fn test_coverage_percentage() {
        assert_eq!(coverage_percentage(0, 0), 0);
        assert_eq!(coverage_percentage(3, 4), 75);
        assert_eq!(coverage_percentage(1, 1), 100);
        assert_eq!(coverage_percentage(1, 3), 33);
        assert_eq!(coverage_percentage(2, 3), 67);
    }

    #[test]
    fn test_confidence_serde_lowercase() {
        assert_eq!(serde_json::to_string(&Confidence::High).unwrap(), "\"high\"");
        let parsed: Confidence = serde_json::from_str("\"low\"").unwrap();
        assert_eq!(parsed, Confidence::Low);
    }

    #[test]
    fn test_raw_extraction_defaults_missing_fields() {
        let raw: RawExtraction = serde_json::from_str(r#"{"hostname": "WEB01"}"#).unwrap();
        assert_eq!(raw.hostname, "WEB01");
        assert!(raw.issue_type.is_none());
        assert!(raw.confidence.is_none());
    }

    #[test]
    fn test_batch_report_json_contract() {
        let mut report = BatchReport::default();
        report.summary = BatchSummary {
            total_hostnames: 1,
            total_support_groups: 1,
            successful_lookups: 1,
            failed_lookups: 0,
            coverage_percentage: 100,
        };
        let mut record = GroupRecord::new("Linux Support Team");
        record.add_hostname("CLOUD-LNX-DOCK01");
        record.add_issue_type("reboot");
        record.email_distros = Some("linux-support@company.com".to_string());
        report
            .groups
            .insert("Linux Support Team".to_string(), record);

        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["summary"]["total_hostnames"], 1);
        assert_eq!(value["summary"]["coverage_percentage"], 100);
        let group = &value["groups"]["Linux Support Team"];
        assert_eq!(group["support_group"], "Linux Support Team");
        assert_eq!(group["hostnames"][0], "CLOUD-LNX-DOCK01");
        assert_eq!(group["email_distros"], "linux-support@company.com");
        assert!(group["individual_contacts"].is_null());
        assert_eq!(group["issue_types"][0], "reboot");
        assert!(value["errors"]["hostnames_not_found"]
            .as_array()
            .unwrap()
            .is_empty());
        assert!(value["errors"]["other_errors"].as_array().unwrap().is_empty());
    }
}
