// ==========================================
// Project Site Tracker - Site importer implementation
// ==========================================
// Pipeline orchestrator, file to ledger:
// normalize -> detect -> resolve -> validate -> transactional commit
//           -> audit flush -> ledger finish
// ==========================================

use crate::domain::audit::{AuditAction, AuditEntity, AuditEntry};
use crate::domain::import::{
    Conflict, DetectionReport, ImportOutcome, ImportResult, Resolution, RowError,
};
use crate::domain::site::{NormalizedRecord, ProjectSite};
use crate::domain::types::ConflictType;
use crate::importer::conflict_resolver;
use crate::importer::error::{ImportError, PipelineResult};
use crate::importer::site_importer_trait::{
    ConflictDetector, FileParser, RowNormalizer, SiteImporter,
};
use crate::repository::{AuditSink, ImportJobRepository, SiteRepository};
use async_trait::async_trait;
use futures::future;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info, instrument, warn};

// ==========================================
// SiteImporterImpl
// ==========================================
pub struct SiteImporterImpl<R, J, A>
where
    R: SiteRepository,
    J: ImportJobRepository,
    A: AuditSink,
{
    // Data access
    site_repo: R,
    job_repo: J,
    audit: A,

    // Pipeline stages
    file_parser: Box<dyn FileParser>,
    normalizer: Box<dyn RowNormalizer>,
    detector: Box<dyn ConflictDetector>,
}

impl<R, J, A> SiteImporterImpl<R, J, A>
where
    R: SiteRepository,
    J: ImportJobRepository,
    A: AuditSink,
{
    pub fn new(
        site_repo: R,
        job_repo: J,
        audit: A,
        file_parser: Box<dyn FileParser>,
        normalizer: Box<dyn RowNormalizer>,
        detector: Box<dyn ConflictDetector>,
    ) -> Self {
        Self {
            site_repo,
            job_repo,
            audit,
            file_parser,
            normalizer,
            detector,
        }
    }

    /// Normalize every row, collecting unusable rows instead of aborting.
    fn normalize_rows(
        &self,
        rows: &[HashMap<String, String>],
    ) -> (Vec<NormalizedRecord>, Vec<RowError>) {
        let mut records = Vec::new();
        let mut errors = Vec::new();

        for (idx, row) in rows.iter().enumerate() {
            let row_index = idx + 1;
            match self.normalizer.normalize(row, row_index) {
                Ok(record) => records.push(record),
                Err(e) => {
                    warn!(row_index, error = %e, "row rejected during normalization");
                    errors.push(RowError {
                        row_index,
                        message: e.to_string(),
                    });
                }
            }
        }

        (records, errors)
    }

    /// One batched lookup for the whole batch, keyed by site code.
    async fn snapshot_existing(
        &self,
        records: &[NormalizedRecord],
    ) -> PipelineResult<HashMap<String, ProjectSite>> {
        let mut codes: Vec<String> = records
            .iter()
            .filter(|r| !r.site_code.is_empty())
            .map(|r| r.site_code.clone())
            .collect();
        codes.sort();
        codes.dedup();

        let sites = self.site_repo.fetch_by_site_codes(&codes).await?;
        Ok(sites
            .into_iter()
            .map(|site| (site.site_code.clone(), site))
            .collect())
    }

    /// Pre-transaction field validation.
    ///
    /// The one place partial failure is allowed: rows failing here become
    /// row errors and are excluded from the transaction, strictly before
    /// the atomic commit ever starts. An empty site_code is rejected here
    /// too: the column is the UNIQUE natural key, so a codeless row can
    /// neither be keyed nor safely inserted.
    fn validate_record(record: &NormalizedRecord) -> PipelineResult<()> {
        if record.site_code.is_empty() {
            return Err(ImportError::Validation {
                row: record.row_index,
                field: "site_code".to_string(),
                message: "must not be empty".to_string(),
            });
        }
        if let Some(lat) = record.latitude {
            if !(-90.0..=90.0).contains(&lat) {
                return Err(ImportError::Validation {
                    row: record.row_index,
                    field: "latitude".to_string(),
                    message: format!("out of range [-90, 90]: {}", lat),
                });
            }
        }
        if let Some(lon) = record.longitude {
            if !(-180.0..=180.0).contains(&lon) {
                return Err(ImportError::Validation {
                    row: record.row_index,
                    field: "longitude".to_string(),
                    message: format!("out of range [-180, 180]: {}", lon),
                });
            }
        }
        Ok(())
    }

    /// Collapse in-file duplicate site codes before inserting.
    ///
    /// The later row wins, matching the update path where file order
    /// decides; displaced rows become row errors rather than tripping the
    /// UNIQUE constraint and failing the whole batch.
    fn dedup_by_site_code(
        records: Vec<NormalizedRecord>,
        errors: &mut Vec<RowError>,
    ) -> Vec<NormalizedRecord> {
        let mut kept: Vec<NormalizedRecord> = Vec::with_capacity(records.len());
        let mut index_by_code: HashMap<String, usize> = HashMap::new();

        for record in records {
            match index_by_code.get(&record.site_code) {
                Some(&i) => {
                    let displaced = std::mem::replace(&mut kept[i], record);
                    warn!(
                        row_index = displaced.row_index,
                        site_code = %displaced.site_code,
                        "duplicate site_code in file, later row wins"
                    );
                    errors.push(RowError {
                        row_index: displaced.row_index,
                        message: format!(
                            "duplicate site_code {} in file; a later row supersedes it",
                            displaced.site_code
                        ),
                    });
                }
                None => {
                    index_by_code.insert(record.site_code.clone(), kept.len());
                    kept.push(record);
                }
            }
        }

        kept
    }

    /// Split records into transaction-ready and rejected.
    fn partition_valid(
        records: Vec<NormalizedRecord>,
        errors: &mut Vec<RowError>,
    ) -> Vec<NormalizedRecord> {
        let mut valid = Vec::new();
        for record in records {
            match Self::validate_record(&record) {
                Ok(()) => valid.push(record),
                Err(e) => {
                    warn!(
                        row_index = record.row_index,
                        error = %e,
                        "row excluded from commit by validation"
                    );
                    errors.push(RowError {
                        row_index: record.row_index,
                        message: e.to_string(),
                    });
                }
            }
        }
        valid
    }

    /// Same partition for override conflicts, keeping the full Conflict so
    /// the audit flush sees exactly what the transaction received.
    fn partition_valid_conflicts(
        conflicts: &[Conflict],
        errors: &mut Vec<RowError>,
    ) -> Vec<Conflict> {
        let mut valid = Vec::new();
        for conflict in conflicts {
            match Self::validate_record(&conflict.incoming) {
                Ok(()) => valid.push(conflict.clone()),
                Err(e) => {
                    warn!(
                        row_index = conflict.incoming.row_index,
                        error = %e,
                        "row excluded from commit by validation"
                    );
                    errors.push(RowError {
                        row_index: conflict.incoming.row_index,
                        message: e.to_string(),
                    });
                }
            }
        }
        valid
    }

    /// Write audit entries for the committed batch.
    ///
    /// Best-effort by design: the data transaction has already committed,
    /// so a failed audit write is logged and dropped, never propagated.
    async fn flush_audit(&self, inserts: &[NormalizedRecord], overrides: &[Conflict]) {
        let mut entries = Vec::with_capacity(inserts.len() + overrides.len());

        for record in inserts {
            entries.push(
                AuditEntry::new(
                    AuditAction::Create,
                    AuditEntity::ProjectSites,
                    &record.site_code,
                )
                .with_new_values(record),
            );
        }

        for conflict in overrides {
            let mut entry = AuditEntry::new(
                AuditAction::Update,
                AuditEntity::ProjectSites,
                &conflict.incoming.site_code,
            )
            .with_new_values(&conflict.incoming);
            if let Some(existing) = &conflict.existing {
                entry = entry.with_old_values(existing);
            }
            entries.push(entry);
        }

        let results =
            future::join_all(entries.iter().map(|entry| self.audit.record_audit(entry))).await;
        for (entry, result) in entries.iter().zip(results) {
            if let Err(e) = result {
                warn!(record_id = %entry.record_id, error = %e, "audit write failed");
            }
        }
    }

    /// Detection over already-normalized records.
    async fn detect_normalized(
        &self,
        records: &[NormalizedRecord],
        row_errors: Vec<RowError>,
    ) -> PipelineResult<DetectionReport> {
        let existing = self.snapshot_existing(records).await?;
        let conflicts = self.detector.classify(records, &existing);
        let new_count = conflicts
            .iter()
            .filter(|c| c.conflict_type == ConflictType::NoMatch)
            .count();

        Ok(DetectionReport {
            new_count,
            total_count: conflicts.len(),
            conflicts,
            row_errors,
        })
    }
}

#[async_trait]
impl<R, J, A> SiteImporter for SiteImporterImpl<R, J, A>
where
    R: SiteRepository + Send + Sync,
    J: ImportJobRepository + Send + Sync,
    A: AuditSink + Send + Sync,
{
    #[instrument(skip(self, rows), fields(total_rows = rows.len()))]
    async fn detect_conflicts(
        &self,
        rows: Vec<HashMap<String, String>>,
    ) -> PipelineResult<DetectionReport> {
        debug!("stage 1: normalize");
        let (records, row_errors) = self.normalize_rows(&rows);

        debug!("stage 2: classify against store snapshot");
        let report = self.detect_normalized(&records, row_errors).await?;

        info!(
            total = report.total_count,
            new = report.new_count,
            conflicting = report.total_count - report.new_count,
            rejected = report.row_errors.len(),
            "conflict detection complete"
        );
        Ok(report)
    }

    #[instrument(skip(self, rows, resolutions), fields(filename = %filename, total_rows = rows.len()))]
    async fn commit_import(
        &self,
        filename: &str,
        rows: Vec<HashMap<String, String>>,
        resolutions: Vec<Resolution>,
    ) -> PipelineResult<ImportOutcome> {
        let total_rows = rows.len();

        // The ledger entry exists from the first moment of the attempt;
        // a rejected commit leaves it Pending.
        let job = self.job_repo.start(filename, total_rows).await?;
        info!(job_id = %job.id, total_rows, "import started");

        debug!("stage 1: normalize");
        let (records, mut row_errors) = self.normalize_rows(&rows);

        debug!("stage 2: classify against store snapshot");
        let existing = self.snapshot_existing(&records).await?;
        let conflicts = self.detector.classify(&records, &existing);

        debug!("stage 3: apply operator resolutions");
        let outcome = conflict_resolver::resolve(&conflicts, &resolutions);
        if !outcome.unresolved.is_empty() {
            // Fail closed before any write; the job stays Pending
            warn!(
                job_id = %job.id,
                unresolved = outcome.unresolved.len(),
                "commit refused: unresolved conflicts"
            );
            return Err(ImportError::ConflictUnresolved {
                unresolved: outcome.unresolved.len(),
            });
        }

        self.job_repo.mark_processing(&job.id).await?;

        debug!("stage 4: pre-transaction validation");
        let new_records: Vec<NormalizedRecord> = conflicts
            .iter()
            .filter(|c| c.conflict_type == ConflictType::NoMatch)
            .map(|c| c.incoming.clone())
            .collect();
        // Validate first so codeless rows are already gone when the
        // dedup keys on site_code
        let new_records = Self::partition_valid(new_records, &mut row_errors);
        let inserts = Self::dedup_by_site_code(new_records, &mut row_errors);

        let override_conflicts =
            Self::partition_valid_conflicts(&outcome.to_override, &mut row_errors);
        let overrides: Vec<NormalizedRecord> = override_conflicts
            .iter()
            .map(|c| c.incoming.clone())
            .collect();

        let skipped = outcome.to_skip.len();

        debug!(
            inserts = inserts.len(),
            overrides = overrides.len(),
            skipped,
            "stage 5: transactional commit"
        );
        let stats = match self.site_repo.apply_batch(&inserts, &overrides).await {
            Ok(stats) => stats,
            Err(e) => {
                // Whole batch rolled back; every attempted row becomes an
                // attributable error and the job finishes Failed
                warn!(job_id = %job.id, error = %e, "batch commit failed, rolled back");
                let message = format!("batch rolled back: {}", e);
                let mut failed_rows = row_errors;
                for record in inserts.iter().chain(overrides.iter()) {
                    failed_rows.push(RowError {
                        row_index: record.row_index,
                        message: message.clone(),
                    });
                }
                for conflict in &outcome.to_skip {
                    failed_rows.push(RowError {
                        row_index: conflict.row_index,
                        message: message.clone(),
                    });
                }
                failed_rows.sort_by_key(|e| e.row_index);
                let result = ImportResult {
                    inserted: 0,
                    updated: 0,
                    skipped: 0,
                    failed_rows,
                };
                let job = self.job_repo.finish(&job.id, &result).await?;
                return Ok(ImportOutcome { result, job });
            }
        };

        debug!("stage 6: audit flush");
        // Only what the transaction actually received; skips and
        // validation-rejected rows leave no audit trail
        self.flush_audit(&inserts, &override_conflicts).await;

        debug!("stage 7: ledger finish");
        row_errors.sort_by_key(|e| e.row_index);
        let result = ImportResult {
            inserted: stats.inserted,
            updated: stats.updated,
            skipped,
            failed_rows: row_errors,
        };
        let job = self.job_repo.finish(&job.id, &result).await?;

        info!(
            job_id = %job.id,
            inserted = result.inserted,
            updated = result.updated,
            skipped = result.skipped,
            failed = result.failed_rows.len(),
            status = job.status.as_str(),
            "import finished"
        );
        Ok(ImportOutcome { result, job })
    }

    async fn import_file(
        &self,
        file_path: &Path,
        resolutions: Vec<Resolution>,
    ) -> PipelineResult<ImportOutcome> {
        let rows = self
            .file_parser
            .parse_to_raw_rows(file_path)
            .map_err(|e| ImportError::FileReadError(e.to_string()))?;

        let filename = file_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown");

        self.commit_import(filename, rows, resolutions).await
    }
}
