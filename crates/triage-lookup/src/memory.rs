//! In-memory lookup service
//!
//! Holds both tables as plain row vectors. Used by the test suites and
//! handy for local runs without workbook files.

use std::sync::atomic::{AtomicUsize, Ordering};

use triage_core::{LookupRow, LookupService, LookupTable, Result};

/// Lookup service backed by in-memory tables
#[derive(Default)]
pub struct StaticLookupService {
    assets: Vec<LookupRow>,
    contacts: Vec<LookupRow>,
    calls: AtomicUsize,
}

impl StaticLookupService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an assets row: {support_group, location, server_name}
    pub fn with_asset(
        mut self,
        support_group: &str,
        location: &str,
        server_name: &str,
    ) -> Self {
        self.assets.push(vec![
            support_group.to_string(),
            location.to_string(),
            server_name.to_string(),
        ]);
        self
    }

    /// Add a contacts row: {app_owner, email_distros, individual_contacts}
    pub fn with_contact(
        mut self,
        app_owner: &str,
        email_distros: &str,
        individual_contacts: &str,
    ) -> Self {
        self.contacts.push(vec![
            app_owner.to_string(),
            email_distros.to_string(),
            individual_contacts.to_string(),
        ]);
        self
    }

    /// How many lookups reached this service (i.e. missed the cache)
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }

    fn rows(&self, table: LookupTable) -> &[LookupRow] {
        match table {
            LookupTable::Assets => &self.assets,
            LookupTable::Contacts => &self.contacts,
        }
    }
}

#[async_trait::async_trait]
impl LookupService for StaticLookupService {
    async fn resolve_by_key(&self, table: LookupTable, key: &str) -> Result<Option<LookupRow>> {
        self.calls.fetch_add(1, Ordering::Relaxed);

        let column = match table {
            LookupTable::Assets => 2,
            LookupTable::Contacts => 0,
        };
        let wanted = key.trim().to_uppercase();

        Ok(self
            .rows(table)
            .iter()
            .find(|row| {
                row.get(column)
                    .is_some_and(|cell| cell.trim().to_uppercase() == wanted)
            })
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_case_insensitive_match() {
        let service = StaticLookupService::new().with_asset(
            "Linux Support Team",
            "DC1",
            "CLOUD-LNX-DOCK01",
        );

        let row = service
            .resolve_by_key(LookupTable::Assets, "  cloud-lnx-dock01 ")
            .await
            .unwrap();
        assert_eq!(row.unwrap()[0], "Linux Support Team");
        assert_eq!(service.call_count(), 1);
    }

    #[tokio::test]
    async fn test_tables_are_separate() {
        let service = StaticLookupService::new()
            .with_asset("Linux Support Team", "DC1", "WEB01")
            .with_contact("Linux Support Team", "linux-support@company.com", "");

        assert!(service
            .resolve_by_key(LookupTable::Contacts, "WEB01")
            .await
            .unwrap()
            .is_none());
        assert!(service
            .resolve_by_key(LookupTable::Contacts, "Linux Support Team")
            .await
            .unwrap()
            .is_some());
    }
}
