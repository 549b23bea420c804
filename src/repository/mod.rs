// ==========================================
// Project Site Tracker - Repository layer
// ==========================================
// Data access over SQLite; no business rules here
// ==========================================

pub mod audit_repo;
pub mod error;
pub mod import_job_repo;
pub mod site_repo;
pub mod site_repo_impl;

pub use audit_repo::{AuditLogRepository, AuditSink};
pub use error::{RepositoryError, RepositoryResult};
pub use import_job_repo::{ImportJobRepository, ImportJobRepositoryImpl};
pub use site_repo::{BatchApplyStats, SiteRepository};
pub use site_repo_impl::SiteRepositoryImpl;
