//! Triage CLI - ticket routing from the command line
//!
//! Usage:
//!   triage process <files>... [--json]
//!   triage lookup <hostname>
//!   triage contacts <group>

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use triage_core::{AppConfig, BatchReport, ExtractionOracle, LookupService, TriageError};
use triage_extract::{OpenAiExtractor, RuleBasedExtractor};
use triage_lookup::{ContactResolver, GroupResolver, LookupCaches, WorkbookLookupService};
use triage_pipeline::Collator;

#[derive(Parser)]
#[command(name = "triage")]
#[command(about = "Route IT support tickets to responsible support groups")]
#[command(version)]
struct Cli {
    /// Path to a TOML config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Process ticket files and print the grouped report
    Process {
        /// Ticket text files
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Look up the support group for a hostname
    Lookup {
        hostname: String,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Look up contact information for a support group
    Contacts {
        group: String,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => AppConfig::from_file(path)?,
        None => AppConfig::default(),
    }
    .with_env_override()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.logging.level.clone())),
        )
        .with_writer(std::io::stderr)
        .init();

    let service: Arc<dyn LookupService> = Arc::new(WorkbookLookupService::new(&config.lookup));
    let caches = LookupCaches::with_config(&config.cache);

    match cli.command {
        Commands::Process { files, json } => {
            let oracle = build_oracle(&config)?;
            let collator = Collator::new(oracle, service, caches.clone());

            let mut tickets = Vec::new();
            let mut unreadable = 0usize;
            for file in &files {
                // Input failures are reported here, before processing,
                // and never mixed into the report
                match std::fs::read_to_string(file) {
                    Ok(content) => tickets.push(content),
                    Err(e) => {
                        unreadable += 1;
                        let err = TriageError::TicketSource {
                            path: file.display().to_string(),
                            source: e,
                        };
                        tracing::error!(error = %err, "skipping ticket file");
                    }
                }
            }
            if tickets.is_empty() {
                anyhow::bail!("no readable ticket files among {} given", files.len());
            }

            let report = collator.collate(&tickets).await;

            for stats in caches.all_stats() {
                tracing::debug!(
                    cache = %stats.name,
                    hits = stats.hits,
                    misses = stats.misses,
                    hit_rate = stats.hit_rate,
                    "cache statistics"
                );
            }

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("{}", render_report(&report));
            }

            if unreadable > 0 {
                tracing::warn!(unreadable, "some ticket files were skipped");
            }
        }
        Commands::Lookup { hostname, json } => {
            let resolver = GroupResolver::new(service, caches.group);
            let result = resolver
                .resolve(&hostname)
                .await
                .context("hostname lookup failed")?;

            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else if result.found {
                println!("Hostname: {}", result.hostname);
                println!(
                    "Support Group: {}",
                    result.support_group.as_deref().unwrap_or("(empty)")
                );
            } else {
                println!("Hostname '{hostname}' not found");
            }
        }
        Commands::Contacts { group, json } => {
            let resolver = ContactResolver::new(service, caches.contact);
            let result = resolver
                .resolve(&group)
                .await
                .context("contact lookup failed")?;

            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else if result.found {
                println!("Support Group: {}", result.support_group);
                if let Some(email) = &result.email_distros {
                    println!("Email: {email}");
                }
                if let Some(contacts) = &result.individual_contacts {
                    println!("Contacts: {contacts}");
                }
            } else {
                println!("Support group '{group}' not found");
            }
        }
    }

    Ok(())
}

/// Pick the extraction oracle: LLM when an API key is configured,
/// regex rules otherwise
fn build_oracle(config: &AppConfig) -> anyhow::Result<Arc<dyn ExtractionOracle>> {
    if config.llm.api_key.is_some() {
        tracing::info!(model = %config.llm.model, "using LLM extraction oracle");
        Ok(Arc::new(OpenAiExtractor::from_config(&config.llm)?))
    } else {
        tracing::info!("no API key configured, using rule-based extraction");
        Ok(Arc::new(RuleBasedExtractor::new()))
    }
}

/// Human-readable rendering of a batch report
fn render_report(report: &BatchReport) -> String {
    let mut output = Vec::new();

    output.push("=== TICKET PROCESSING RESULTS ===".to_string());
    output.push(String::new());
    output.push(format!(
        "Total Hostnames: {}",
        report.summary.total_hostnames
    ));
    output.push(format!(
        "Support Groups: {}",
        report.summary.total_support_groups
    ));
    output.push(format!(
        "Successful Lookups: {}",
        report.summary.successful_lookups
    ));
    output.push(format!("Failed Lookups: {}", report.summary.failed_lookups));
    output.push(format!(
        "Coverage: {}%",
        report.summary.coverage_percentage
    ));

    for (name, record) in &report.groups {
        output.push(String::new());
        output.push(format!("[{name}]"));
        output.push(format!("Hostnames: {}", record.hostnames.join(", ")));
        if !record.issue_types.is_empty() {
            output.push(format!("Issues: {}", record.issue_types.join(", ")));
        }
        match (&record.email_distros, &record.individual_contacts) {
            (None, None) => output.push("Contact information not found".to_string()),
            (email, contacts) => {
                if let Some(email) = email {
                    output.push(format!("Email: {email}"));
                }
                if let Some(contacts) = contacts {
                    output.push(format!("Contacts: {contacts}"));
                }
            }
        }
    }

    if !report.errors.hostnames_not_found.is_empty() {
        output.push(String::new());
        output.push(format!(
            "Hostnames not found: {}",
            report.errors.hostnames_not_found.join(", ")
        ));
    }
    if !report.errors.support_groups_not_found.is_empty() {
        output.push(format!(
            "Groups without contacts: {}",
            report.errors.support_groups_not_found.join(", ")
        ));
    }
    if !report.errors.other_errors.is_empty() {
        output.push(String::new());
        output.push("Errors:".to_string());
        for error in &report.errors.other_errors {
            output.push(format!("  - {error}"));
        }
    }

    output.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use triage_core::{BatchSummary, GroupRecord};

    #[test]
    fn test_render_report() {
        let mut report = BatchReport::default();
        report.summary = BatchSummary {
            total_hostnames: 2,
            total_support_groups: 1,
            successful_lookups: 1,
            failed_lookups: 1,
            coverage_percentage: 50,
        };
        let mut record = GroupRecord::new("Linux Support Team");
        record.add_hostname("CLOUD-LNX-DOCK01");
        record.add_issue_type("reboot");
        record.email_distros = Some("linux-support@company.com".to_string());
        report
            .groups
            .insert("Linux Support Team".to_string(), record);
        report
            .errors
            .hostnames_not_found
            .push("UNKNOWN-SERVER".to_string());

        let rendered = render_report(&report);
        assert!(rendered.contains("Total Hostnames: 2"));
        assert!(rendered.contains("[Linux Support Team]"));
        assert!(rendered.contains("Email: linux-support@company.com"));
        assert!(rendered.contains("Hostnames not found: UNKNOWN-SERVER"));
    }

    #[test]
    fn test_cli_parses_process_command() {
        let cli = Cli::parse_from(["triage", "process", "ticket.txt", "--json"]);
        match cli.command {
            Commands::Process { files, json } => {
                assert_eq!(files, vec![PathBuf::from("ticket.txt")]);
                assert!(json);
            }
            _ => panic!("expected process command"),
        }
    }
}
