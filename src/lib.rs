// ==========================================
// Project Site Tracker - Core library
// ==========================================
// CSV/Excel bulk import with conflict reconciliation for the
// project-site registry. Stack: Rust + SQLite.
// ==========================================

// ==========================================
// Module declarations
// ==========================================

// Domain layer - entities and types
pub mod domain;

// Repository layer - data access
pub mod repository;

// Importer layer - external data
pub mod importer;

// Database infrastructure (connection init / unified PRAGMAs)
pub mod db;

// Logging
pub mod logging;

// API layer - caller-facing facades
pub mod api;

// ==========================================
// Core type re-exports
// ==========================================

// Domain types
pub use domain::types::{ConflictType, JobStatus, ProjectType, ResolutionAction, SiteStatus};

// Domain entities
pub use domain::{
    AuditEntry, Conflict, DetectionReport, ImportJob, ImportOutcome, ImportResult,
    NormalizedRecord, ProjectSite, Resolution, RowError,
};

// Pipeline
pub use importer::{SiteImporter, SiteImporterImpl};

// API
pub use api::ImportApi;

// ==========================================
// Constants
// ==========================================

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub const APP_NAME: &str = "Project Site Tracker";
