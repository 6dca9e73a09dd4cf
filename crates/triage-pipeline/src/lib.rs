//! Triage Pipeline - the collation engine
//!
//! Drives extraction and resolution per ticket and folds the results
//! into a [`BatchReport`]: hostnames grouped by support group, contact
//! info per group, summary statistics, and error bookkeeping. A single
//! bad ticket never aborts the batch; every failure is recorded inside
//! the report instead.

use std::sync::Arc;

use triage_core::{
    coverage_percentage, BatchReport, BatchSummary, ExtractionOracle, GroupRecord, LookupService,
};
use triage_extract::ExtractionAdapter;
use triage_lookup::{ContactResolver, GroupResolver, LookupCaches};

/// Append preserving first-seen order, skipping duplicates
fn push_unique(list: &mut Vec<String>, value: &str) {
    if !list.iter().any(|v| v == value) {
        list.push(value.to_string());
    }
}

/// The collation engine
///
/// Tickets are processed one at a time, hostnames within a ticket one
/// at a time, in deterministic input order; latency is dominated by
/// the external calls, which the lookup caches absorb.
pub struct Collator {
    adapter: ExtractionAdapter,
    groups: GroupResolver,
    contacts: ContactResolver,
}

impl Collator {
    pub fn new(
        oracle: Arc<dyn ExtractionOracle>,
        service: Arc<dyn LookupService>,
        caches: LookupCaches,
    ) -> Self {
        Self {
            adapter: ExtractionAdapter::new(oracle),
            groups: GroupResolver::new(Arc::clone(&service), caches.group),
            contacts: ContactResolver::new(service, caches.contact),
        }
    }

    /// Collate a batch of raw ticket texts into one report
    ///
    /// Infallible by design: extraction or lookup failures land in
    /// `errors.other_errors` with enough context (ticket index,
    /// hostname) to retry manually.
    pub async fn collate(&self, tickets: &[String]) -> BatchReport {
        let mut report = BatchReport::default();
        let mut total = 0usize;
        let mut successful = 0usize;
        let mut failed = 0usize;

        for (index, ticket) in tickets.iter().enumerate() {
            let extractions = match self.adapter.extract(ticket).await {
                Ok(extractions) => extractions,
                Err(e) => {
                    tracing::warn!(ticket = index, error = %e, "extraction failed");
                    report.errors.other_errors.push(format!("ticket {index}: {e}"));
                    continue;
                }
            };

            for extraction in extractions {
                let result = match self.groups.resolve(&extraction.hostname).await {
                    Ok(result) => result,
                    Err(e) => {
                        tracing::warn!(
                            ticket = index,
                            hostname = %extraction.hostname,
                            error = %e,
                            "group lookup failed, abandoning ticket"
                        );
                        report.errors.other_errors.push(format!(
                            "ticket {index}: hostname {}: {e}",
                            extraction.hostname
                        ));
                        // Transport failure: skip the rest of this
                        // ticket and continue with the next one
                        break;
                    }
                };

                total += 1;
                match result.support_group.filter(|_| result.found) {
                    Some(group_name) => {
                        successful += 1;
                        let record = report
                            .groups
                            .entry(group_name.clone())
                            .or_insert_with(|| GroupRecord::new(&group_name));
                        record.add_hostname(&result.hostname);
                        record.add_issue_type(&extraction.issue_type);
                    }
                    None => {
                        failed += 1;
                        push_unique(&mut report.errors.hostnames_not_found, &result.hostname);
                    }
                }
            }
        }

        // Contacts are fetched once per distinct group, not once per
        // hostname
        let group_names: Vec<String> = report.groups.keys().cloned().collect();
        for group_name in group_names {
            match self.contacts.resolve(&group_name).await {
                Ok(contact) if contact.found => {
                    if let Some(record) = report.groups.get_mut(&group_name) {
                        record.email_distros = contact.email_distros;
                        record.individual_contacts = contact.individual_contacts;
                    }
                }
                Ok(_) => {
                    // Missing contacts never block routing; the group
                    // keeps its hostnames with empty contact fields
                    report
                        .errors
                        .support_groups_not_found
                        .push(group_name.clone());
                }
                Err(e) => {
                    tracing::warn!(group = %group_name, error = %e, "contact lookup failed");
                    report
                        .errors
                        .other_errors
                        .push(format!("support group {group_name}: {e}"));
                }
            }
        }

        report.summary = BatchSummary {
            total_hostnames: total,
            total_support_groups: report.groups.len(),
            successful_lookups: successful,
            failed_lookups: failed,
            coverage_percentage: coverage_percentage(successful, total),
        };

        tracing::info!(
            tickets = tickets.len(),
            hostnames = total,
            groups = report.summary.total_support_groups,
            failed,
            "collation complete"
        );

        report
    }
}
