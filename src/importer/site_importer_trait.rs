// ==========================================
// Project Site Tracker - Import pipeline traits
// ==========================================
// Interface seams between the pipeline stages; implementations live
// beside them. The orchestrator owns the wiring.
// ==========================================

use crate::domain::import::{Conflict, DetectionReport, ImportOutcome, Resolution};
use crate::domain::site::{NormalizedRecord, ProjectSite};
use crate::importer::error::PipelineResult;
use async_trait::async_trait;
use std::collections::HashMap;
use std::error::Error;
use std::path::Path;

// ==========================================
// SiteImporter Trait
// ==========================================
// The pipeline surface consumed by the HTTP layer (and the CLI).
// Implementor: SiteImporterImpl
#[async_trait]
pub trait SiteImporter: Send + Sync {
    /// Classify a batch of raw rows against the store without writing.
    ///
    /// Read-only and idempotent: two calls over the same rows and the same
    /// database state return identical reports. Rows the normalizer cannot
    /// use are collected in the report, never fatal.
    async fn detect_conflicts(
        &self,
        rows: Vec<HashMap<String, String>>,
    ) -> PipelineResult<DetectionReport>;

    /// Commit a batch of raw rows as one atomic import.
    ///
    /// Stages: normalize -> detect -> resolve -> validate -> one database
    /// transaction -> audit flush -> ledger finish.
    ///
    /// Fails with `ConflictUnresolved` before any write when a genuinely
    /// conflicting row has no operator resolution; the job record stays
    /// Pending. Transaction failures roll back the whole batch and surface
    /// through the returned job as status Failed, not as an Err.
    async fn commit_import(
        &self,
        filename: &str,
        rows: Vec<HashMap<String, String>>,
        resolutions: Vec<Resolution>,
    ) -> PipelineResult<ImportOutcome>;

    /// Parse a CSV/XLSX file from disk and commit it as one batch.
    async fn import_file(
        &self,
        file_path: &Path,
        resolutions: Vec<Resolution>,
    ) -> PipelineResult<ImportOutcome>;
}

// ==========================================
// FileParser Trait
// ==========================================
// Stage 0: tabular file -> raw row maps (header -> cell text)
// Implementors: CsvParser, ExcelParser, UniversalFileParser
pub trait FileParser: Send + Sync {
    fn parse_to_raw_rows(
        &self,
        file_path: &Path,
    ) -> Result<Vec<HashMap<String, String>>, Box<dyn Error>>;
}

// ==========================================
// RowNormalizer Trait
// ==========================================
// Stage 1: raw row map -> NormalizedRecord
// Implementor: row_normalizer::RowNormalizer
pub trait RowNormalizer: Send + Sync {
    /// Normalize one raw row. `row_index` is the 1-based source file row,
    /// carried through for error attribution.
    fn normalize(
        &self,
        row: &HashMap<String, String>,
        row_index: usize,
    ) -> PipelineResult<NormalizedRecord>;
}

// ==========================================
// ConflictDetector Trait
// ==========================================
// Stage 2: records + store snapshot -> classified conflicts
// Implementor: conflict_detector::ConflictDetector
pub trait ConflictDetector: Send + Sync {
    fn classify(
        &self,
        records: &[NormalizedRecord],
        existing: &HashMap<String, ProjectSite>,
    ) -> Vec<Conflict>;
}
