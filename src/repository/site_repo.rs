// ==========================================
// Project Site Tracker - Site Repository trait
// ==========================================
// Data access interface for the import pipeline.
// Red line: repositories do data CRUD only, no business rules
// ==========================================

use crate::domain::site::{NormalizedRecord, ProjectSite};
use crate::repository::error::RepositoryResult;
use async_trait::async_trait;

/// Counts returned by one transactional batch apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchApplyStats {
    pub inserted: usize,
    pub updated: usize,
}

// ==========================================
// SiteRepository Trait
// ==========================================
// Implementor: SiteRepositoryImpl (rusqlite)
#[async_trait]
pub trait SiteRepository: Send + Sync {
    /// Fetch existing sites for a set of site codes in one query.
    ///
    /// This is the detection lookup: one round-trip keyed on the whole
    /// batch, never one query per row. Codes absent from the store are
    /// simply missing from the result.
    async fn fetch_by_site_codes(
        &self,
        site_codes: &[String],
    ) -> RepositoryResult<Vec<ProjectSite>>;

    /// Apply one resolved batch inside a single transaction.
    ///
    /// Inserts every record in `inserts`, updates by `site_code` for every
    /// record in `overrides`, then commits. Any failure rolls back the
    /// whole batch; partially-applied imports are worse than no import.
    async fn apply_batch(
        &self,
        inserts: &[NormalizedRecord],
        overrides: &[NormalizedRecord],
    ) -> RepositoryResult<BatchApplyStats>;

    /// Single-site lookup, for callers inspecting a committed result.
    async fn get_by_site_code(&self, site_code: &str)
        -> RepositoryResult<Option<ProjectSite>>;

    /// Total persisted sites.
    async fn count_sites(&self) -> RepositoryResult<usize>;
}
