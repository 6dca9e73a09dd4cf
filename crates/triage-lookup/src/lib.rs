//! Triage Lookup - caching and resolution over the external lookup store
//!
//! Provides:
//! - A TTL-bounded memoization layer over external key-value lookups
//! - A spreadsheet-backed implementation of the lookup service
//! - Resolvers mapping hostnames to support groups and support groups
//!   to contact information

pub mod cache;
pub mod memory;
pub mod resolve;
pub mod workbook;

pub use cache::{CacheStats, CacheStatsReport, Clock, LookupCaches, SystemClock, TtlCache};
pub use memory::StaticLookupService;
pub use resolve::{ContactResolver, GroupResolver};
pub use workbook::WorkbookLookupService;
