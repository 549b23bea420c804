// ==========================================
// Project Site Tracker - Import domain model
// ==========================================
// Conflicts, operator resolutions, job ledger entries and
// per-batch result summaries
// ==========================================

use crate::domain::site::{NormalizedRecord, ProjectSite};
use crate::domain::types::{ConflictType, JobStatus, ResolutionAction};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ==========================================
// Conflict - relationship of one incoming row to the store
// ==========================================
// Invariant: conflict_type == NoMatch  <=>  existing == None
//                                      <=>  differences is empty
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conflict {
    pub row_index: usize,
    pub conflict_type: ConflictType,
    pub existing: Option<ProjectSite>,
    pub incoming: NormalizedRecord,
    /// Differing field names in the fixed comparison order.
    pub differences: Vec<String>,
}

// ==========================================
// Resolution - operator decision for one conflicting row
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub row_index: usize,
    pub action: ResolutionAction,
}

// ==========================================
// DetectionReport - output of the conflict detector
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionReport {
    /// One entry per classified row, NoMatch rows included.
    pub conflicts: Vec<Conflict>,
    /// Rows with no existing record (would insert).
    pub new_count: usize,
    /// Rows classified (normalization failures excluded).
    pub total_count: usize,
    /// Rows the normalizer could not use, collected not fatal.
    pub row_errors: Vec<RowError>,
}

// ==========================================
// ResolutionOutcome - output of the conflict resolver
// ==========================================
// A conflict appears in exactly one of the three buckets.
#[derive(Debug, Clone, Default)]
pub struct ResolutionOutcome {
    pub to_override: Vec<Conflict>,
    pub to_skip: Vec<Conflict>,
    pub unresolved: Vec<Conflict>,
}

// ==========================================
// RowError - row-attributable failure
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowError {
    pub row_index: usize,
    pub message: String,
}

// ==========================================
// ImportResult - per-batch commit summary
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportResult {
    pub inserted: usize,
    pub updated: usize,
    pub skipped: usize,
    pub failed_rows: Vec<RowError>,
}

impl ImportResult {
    pub fn success_count(&self) -> usize {
        self.inserted + self.updated + self.skipped
    }
}

// ==========================================
// ImportOutcome - what one commit hands back to the caller
// ==========================================
// Counts plus the ledger entry; errors are always attributable rows,
// never a bare exception.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportOutcome {
    pub result: ImportResult,
    pub job: ImportJob,
}

// ==========================================
// ImportJob - durable ledger entry for one import attempt
// ==========================================
// Created Pending, mutated by the importer, terminal once status
// leaves Processing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportJob {
    pub id: String, // UUID
    pub filename: String,
    pub total_rows: usize,
    pub success_count: usize,
    pub error_count: usize,
    pub errors: Vec<RowError>,
    pub status: JobStatus,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl ImportJob {
    /// Fresh Pending job, counts zeroed.
    pub fn new(filename: &str, total_rows: usize) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            filename: filename.to_string(),
            total_rows,
            success_count: 0,
            error_count: 0,
            errors: Vec::new(),
            status: JobStatus::Pending,
            started_at: Utc::now(),
            completed_at: None,
        }
    }

    /// Terminal status for the given counts.
    ///
    /// All rows succeed -> Completed; all fail -> Failed; mixed -> Partial.
    /// An empty batch counts as Completed.
    pub fn terminal_status(success_count: usize, error_count: usize) -> JobStatus {
        if error_count == 0 {
            JobStatus::Completed
        } else if success_count == 0 {
            JobStatus::Failed
        } else {
            JobStatus::Partial
        }
    }
}
