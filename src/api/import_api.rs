// ==========================================
// Project Site Tracker - Import API
// ==========================================
// Thin facade over the import pipeline: wires repositories and pipeline
// stages onto a shared database handle and translates pipeline output
// into caller-facing response types.
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::db::DbHandle;
use crate::domain::audit::{AuditEntity, AuditEntry};
use crate::domain::import::{ImportJob, Resolution, RowError};
use crate::importer::conflict_detector::ConflictDetector;
use crate::importer::row_normalizer::RowNormalizer;
use crate::importer::site_importer_trait::SiteImporter;
use crate::importer::{SiteImporterImpl, UniversalFileParser};
use crate::repository::{
    AuditLogRepository, ImportJobRepositoryImpl, SiteRepositoryImpl,
};
use crate::domain::types::ResolutionAction;
use serde::{Deserialize, Serialize};
use std::path::Path;

// ==========================================
// Request / response types
// ==========================================

/// Operator decision for one conflicting row, as received from a caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolutionRequest {
    pub row_index: usize,
    /// "Override" or "Skip", case-insensitive.
    pub action: String,
}

/// One classified row in a detection response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConflictSummary {
    pub row_index: usize,
    pub site_code: String,
    pub conflict_type: String,
    pub differences: Vec<String>,
}

/// Detection response: classification only, nothing written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectResponse {
    pub total: usize,
    pub new_count: usize,
    pub exact_duplicates: usize,
    pub data_conflicts: usize,
    pub conflicts: Vec<ConflictSummary>,
    pub row_errors: Vec<RowError>,
}

/// Commit response: counts plus the finished ledger entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportResponse {
    pub job_id: String,
    pub status: String,
    pub inserted: usize,
    pub updated: usize,
    pub skipped: usize,
    pub success_count: usize,
    pub error_count: usize,
    pub failed_rows: Vec<RowError>,
}

// ==========================================
// ImportApi
// ==========================================
pub struct ImportApi {
    conn: DbHandle,
}

impl ImportApi {
    pub fn new(conn: DbHandle) -> Self {
        Self { conn }
    }

    fn build_importer(
        &self,
    ) -> SiteImporterImpl<SiteRepositoryImpl, ImportJobRepositoryImpl, AuditLogRepository> {
        SiteImporterImpl::new(
            SiteRepositoryImpl::new(self.conn.clone()),
            ImportJobRepositoryImpl::new(self.conn.clone()),
            AuditLogRepository::new(self.conn.clone()),
            Box::new(UniversalFileParser),
            Box::new(RowNormalizer),
            Box::new(ConflictDetector),
        )
    }

    fn parse_resolutions(resolutions: &[ResolutionRequest]) -> ApiResult<Vec<Resolution>> {
        resolutions
            .iter()
            .map(|r| {
                let action = ResolutionAction::from_str(&r.action).ok_or_else(|| {
                    ApiError::InvalidInput(format!(
                        "row {}: unknown resolution action '{}'",
                        r.row_index, r.action
                    ))
                })?;
                Ok(Resolution {
                    row_index: r.row_index,
                    action,
                })
            })
            .collect()
    }

    /// Classify a file against the store without writing anything.
    pub async fn detect_conflicts(&self, file_path: &str) -> ApiResult<DetectResponse> {
        let importer = self.build_importer();
        let rows = UniversalFileParser
            .parse(file_path)
            .map_err(|e| ApiError::ImportError(e.to_string()))?;

        let report = importer.detect_conflicts(rows).await?;

        let mut exact_duplicates = 0;
        let mut data_conflicts = 0;
        let conflicts = report
            .conflicts
            .iter()
            .map(|c| {
                match c.conflict_type {
                    crate::domain::types::ConflictType::ExactDuplicate => exact_duplicates += 1,
                    crate::domain::types::ConflictType::SiteCodeMatchDifferentData => {
                        data_conflicts += 1
                    }
                    crate::domain::types::ConflictType::NoMatch => {}
                }
                ConflictSummary {
                    row_index: c.row_index,
                    site_code: c.incoming.site_code.clone(),
                    conflict_type: c.conflict_type.as_str().to_string(),
                    differences: c.differences.clone(),
                }
            })
            .collect();

        Ok(DetectResponse {
            total: report.total_count,
            new_count: report.new_count,
            exact_duplicates,
            data_conflicts,
            conflicts,
            row_errors: report.row_errors,
        })
    }

    /// Commit a file as one atomic import batch.
    pub async fn import_file(
        &self,
        file_path: &str,
        resolutions: &[ResolutionRequest],
    ) -> ApiResult<ImportResponse> {
        let resolutions = Self::parse_resolutions(resolutions)?;
        let importer = self.build_importer();

        let outcome = importer
            .import_file(Path::new(file_path), resolutions)
            .await?;

        Ok(ImportResponse {
            job_id: outcome.job.id,
            status: outcome.job.status.as_str().to_string(),
            inserted: outcome.result.inserted,
            updated: outcome.result.updated,
            skipped: outcome.result.skipped,
            success_count: outcome.job.success_count,
            error_count: outcome.job.error_count,
            failed_rows: outcome.result.failed_rows,
        })
    }

    /// Fetch one ledger entry.
    pub async fn get_job(&self, job_id: &str) -> ApiResult<ImportJob> {
        use crate::repository::ImportJobRepository;

        let repo = ImportJobRepositoryImpl::new(self.conn.clone());
        repo.get_job(job_id)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("import_jobs: {}", job_id)))
    }

    /// Most recent ledger entries, newest first.
    pub async fn recent_jobs(&self, limit: usize) -> ApiResult<Vec<ImportJob>> {
        use crate::repository::ImportJobRepository;

        let repo = ImportJobRepositoryImpl::new(self.conn.clone());
        Ok(repo.recent_jobs(limit).await?)
    }

    /// Audit history for one site, newest first.
    pub fn site_history(&self, site_code: &str, limit: usize) -> ApiResult<Vec<AuditEntry>> {
        let repo = AuditLogRepository::new(self.conn.clone());
        Ok(repo.recent_for_record(AuditEntity::ProjectSites, site_code, limit)?)
    }
}
