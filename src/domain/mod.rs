// ==========================================
// Project Site Tracker - Domain layer
// ==========================================
// Entities and shared types; no I/O, no SQL
// ==========================================

pub mod audit;
pub mod import;
pub mod site;
pub mod types;

pub use audit::{AuditAction, AuditEntity, AuditEntry};
pub use import::{
    Conflict, DetectionReport, ImportJob, ImportOutcome, ImportResult, Resolution,
    ResolutionOutcome, RowError,
};
pub use site::{NormalizedRecord, ProjectSite, COMPARED_FIELDS};
pub use types::{ConflictType, JobStatus, ProjectType, ResolutionAction, SiteStatus};
