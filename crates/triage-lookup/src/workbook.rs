//! Spreadsheet-backed lookup service using calamine
//!
//! Reads the assets (hostname -> support group) and contacts
//! (support group -> contact info) tables from Excel workbooks.
//! The workbook is reopened on every query; the cache layer upstream
//! is what keeps a batch run from paying that cost per hostname.

use std::path::{Path, PathBuf};

use calamine::{open_workbook_auto, Data, Reader};
use triage_core::{LookupConfig, LookupRow, LookupService, LookupTable, Result, TriageError};

/// Zero-based key column per table: assets are keyed by server_name
/// (third column), contacts by app_owner (first column)
fn key_column(table: LookupTable) -> usize {
    match table {
        LookupTable::Assets => 2,
        LookupTable::Contacts => 0,
    }
}

/// Lookup service over two Excel workbooks
pub struct WorkbookLookupService {
    assets_workbook: PathBuf,
    assets_sheet: String,
    contacts_workbook: PathBuf,
    contacts_sheet: String,
}

impl WorkbookLookupService {
    pub fn new(config: &LookupConfig) -> Self {
        Self {
            assets_workbook: config.assets_workbook.clone(),
            assets_sheet: config.assets_sheet.clone(),
            contacts_workbook: config.contacts_workbook.clone(),
            contacts_sheet: config.contacts_sheet.clone(),
        }
    }

    fn source(&self, table: LookupTable) -> (&Path, &str) {
        match table {
            LookupTable::Assets => (&self.assets_workbook, &self.assets_sheet),
            LookupTable::Contacts => (&self.contacts_workbook, &self.contacts_sheet),
        }
    }

    /// Convert a cell to its string form
    fn cell_to_string(cell: &Data) -> String {
        match cell {
            Data::Empty => String::new(),
            Data::String(s) => s.clone(),
            Data::Float(f) => {
                // Format without unnecessary decimals
                if f.fract() == 0.0 {
                    format!("{}", *f as i64)
                } else {
                    format!("{f}")
                }
            }
            Data::Int(i) => format!("{i}"),
            Data::Bool(b) => if *b { "TRUE" } else { "FALSE" }.to_string(),
            Data::Error(e) => format!("#ERROR: {e:?}"),
            Data::DateTime(dt) => format!("{dt}"),
            Data::DateTimeIso(s) => s.clone(),
            Data::DurationIso(s) => s.clone(),
        }
    }

    fn scan_sheet(&self, table: LookupTable, key: &str) -> Result<Option<LookupRow>> {
        let (path, sheet) = self.source(table);

        let mut workbook = open_workbook_auto(path).map_err(|e| {
            TriageError::Lookup(format!("cannot open workbook {}: {e}", path.display()))
        })?;

        let range = workbook.worksheet_range(sheet).map_err(|e| {
            TriageError::Lookup(format!(
                "cannot read sheet {sheet} in {}: {e}",
                path.display()
            ))
        })?;

        let wanted = key.trim().to_uppercase();
        let column = key_column(table);

        // First row is the header
        for row in range.rows().skip(1) {
            let Some(cell) = row.get(column) else {
                continue;
            };
            if Self::cell_to_string(cell).trim().to_uppercase() == wanted {
                return Ok(Some(row.iter().map(Self::cell_to_string).collect()));
            }
        }

        Ok(None)
    }
}

#[async_trait::async_trait]
impl LookupService for WorkbookLookupService {
    async fn resolve_by_key(&self, table: LookupTable, key: &str) -> Result<Option<LookupRow>> {
        tracing::debug!(?table, key, "workbook lookup");
        self.scan_sheet(table, key)
    }
}
