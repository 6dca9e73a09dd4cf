//! Hostname and contact resolution over the cache-wrapped lookup service
//!
//! Both resolvers share the same discipline: normalize the key, check
//! the cache, query the service on a miss, cache positive results
//! only. Negative results are never cached, so a row added to the data
//! source is picked up without waiting for TTL expiry. A transport
//! failure of the service is an `Err`, never a `found = false`.

use std::sync::Arc;

use triage_core::{
    ContactLookupResult, HostnameLookupResult, LookupService, LookupTable, Result,
};

use crate::cache::TtlCache;

/// A trimmed, non-empty cell value
fn non_empty(cell: Option<&String>) -> Option<String> {
    cell.map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

// ============================================================================
// Group Resolver
// ============================================================================

/// Resolves a hostname to its responsible support group
pub struct GroupResolver {
    service: Arc<dyn LookupService>,
    cache: TtlCache<HostnameLookupResult>,
}

impl GroupResolver {
    pub fn new(service: Arc<dyn LookupService>, cache: TtlCache<HostnameLookupResult>) -> Self {
        Self { service, cache }
    }

    pub async fn resolve(&self, hostname: &str) -> Result<HostnameLookupResult> {
        let hostname = hostname.trim();
        let cache_key = format!("group:{}", hostname.to_uppercase());

        if let Some(cached) = self.cache.get(&cache_key) {
            return Ok(cached);
        }

        match self
            .service
            .resolve_by_key(LookupTable::Assets, hostname)
            .await?
        {
            Some(row) => match non_empty(row.first()) {
                Some(group) => {
                    let result = HostnameLookupResult {
                        hostname: hostname.to_string(),
                        support_group: Some(group),
                        found: true,
                    };
                    self.cache.put(&cache_key, result.clone());
                    tracing::debug!(hostname, group = ?result.support_group, "hostname resolved");
                    Ok(result)
                }
                // A row with an empty group cell cannot route; treat it
                // as not found and leave it uncached like any other
                // miss, so a later fix to the cell is picked up
                // immediately
                None => {
                    tracing::debug!(hostname, "matching row has no support group");
                    Ok(HostnameLookupResult::not_found(hostname))
                }
            },
            None => {
                tracing::debug!(hostname, "hostname has no matching row");
                Ok(HostnameLookupResult::not_found(hostname))
            }
        }
    }
}

// ============================================================================
// Contact Resolver
// ============================================================================

/// Resolves a support group to its contact information
pub struct ContactResolver {
    service: Arc<dyn LookupService>,
    cache: TtlCache<ContactLookupResult>,
}

impl ContactResolver {
    pub fn new(service: Arc<dyn LookupService>, cache: TtlCache<ContactLookupResult>) -> Self {
        Self { service, cache }
    }

    pub async fn resolve(&self, support_group: &str) -> Result<ContactLookupResult> {
        let support_group = support_group.trim();
        let cache_key = format!("contact:{}", support_group.to_uppercase());

        if let Some(cached) = self.cache.get(&cache_key) {
            return Ok(cached);
        }

        match self
            .service
            .resolve_by_key(LookupTable::Contacts, support_group)
            .await?
        {
            Some(row) => {
                let result = ContactLookupResult {
                    support_group: support_group.to_string(),
                    app_owner: non_empty(row.first()),
                    email_distros: non_empty(row.get(1)),
                    individual_contacts: non_empty(row.get(2)),
                    found: true,
                };
                self.cache.put(&cache_key, result.clone());
                Ok(result)
            }
            None => {
                tracing::debug!(support_group, "support group has no contact row");
                Ok(ContactLookupResult::not_found(support_group))
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::StaticLookupService;
    use triage_core::{CacheConfig, LookupRow, TriageError};

    fn cache<V: Clone>() -> TtlCache<V> {
        TtlCache::with_config(
            "test",
            &CacheConfig {
                enabled: true,
                ttl_seconds: 3600,
            },
        )
    }

    fn assets_service() -> Arc<StaticLookupService> {
        Arc::new(
            StaticLookupService::new()
                .with_asset("Linux Support Team", "DC1", "CLOUD-LNX-DOCK01")
                .with_contact(
                    "Linux Support Team",
                    "linux-support@company.com",
                    "alice@company.com; bob@company.com",
                ),
        )
    }

    #[tokio::test]
    async fn test_resolve_found_and_cached() {
        let service = assets_service();
        let resolver = GroupResolver::new(service.clone(), cache());

        let result = resolver.resolve("cloud-lnx-dock01").await.unwrap();
        assert!(result.found);
        assert_eq!(result.support_group.as_deref(), Some("Linux Support Team"));

        // Second resolve is served from cache
        let again = resolver.resolve("CLOUD-LNX-DOCK01").await.unwrap();
        assert!(again.found);
        assert_eq!(service.call_count(), 1);
    }

    #[tokio::test]
    async fn test_normalization_shares_cache_entries() {
        let service = assets_service();
        let resolver = GroupResolver::new(service.clone(), cache());

        resolver.resolve("CLOUD-LNX-DOCK01").await.unwrap();
        resolver.resolve("  cloud-LNX-dock01  ").await.unwrap();
        assert_eq!(service.call_count(), 1);
    }

    #[tokio::test]
    async fn test_negative_results_are_not_cached() {
        let service = assets_service();
        let resolver = GroupResolver::new(service.clone(), cache());

        let first = resolver.resolve("UNKNOWN-SERVER").await.unwrap();
        assert!(!first.found);
        let second = resolver.resolve("UNKNOWN-SERVER").await.unwrap();
        assert!(!second.found);

        // Both calls reached the service: "not found" was never cached
        assert_eq!(service.call_count(), 2);
    }

    #[tokio::test]
    async fn test_empty_group_cell_is_not_found_and_not_cached() {
        let service = Arc::new(StaticLookupService::new().with_asset("", "DC1", "ORPHAN-01"));
        let resolver = GroupResolver::new(service.clone(), cache());

        let first = resolver.resolve("ORPHAN-01").await.unwrap();
        assert!(!first.found);
        assert!(first.support_group.is_none());

        let second = resolver.resolve("ORPHAN-01").await.unwrap();
        assert!(!second.found);

        // Both calls reached the service: the unroutable row was never
        // cached, so fixing the cell takes effect immediately
        assert_eq!(service.call_count(), 2);
    }

    #[tokio::test]
    async fn test_contact_resolution() {
        let service = assets_service();
        let resolver = ContactResolver::new(service, cache());

        let result = resolver.resolve("Linux Support Team").await.unwrap();
        assert!(result.found);
        assert_eq!(
            result.email_distros.as_deref(),
            Some("linux-support@company.com")
        );
        assert_eq!(
            result.individual_contacts.as_deref(),
            Some("alice@company.com; bob@company.com")
        );

        let missing = resolver.resolve("Nonexistent Team").await.unwrap();
        assert!(!missing.found);
        assert!(missing.email_distros.is_none());
    }

    #[tokio::test]
    async fn test_transport_failure_is_an_error() {
        struct BrokenService;

        #[async_trait::async_trait]
        impl LookupService for BrokenService {
            async fn resolve_by_key(
                &self,
                _table: LookupTable,
                _key: &str,
            ) -> Result<Option<LookupRow>> {
                Err(TriageError::Lookup("backend unreachable".to_string()))
            }
        }

        let resolver = GroupResolver::new(Arc::new(BrokenService), cache());
        let err = resolver.resolve("WEB01").await.unwrap_err();
        assert!(matches!(err, TriageError::Lookup(_)));
    }
}
