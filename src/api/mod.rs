// ==========================================
// Project Site Tracker - API layer
// ==========================================
// Caller-facing facades over the pipeline and repositories
// ==========================================

pub mod error;
pub mod import_api;

pub use error::{ApiError, ApiResult};
pub use import_api::{
    ConflictSummary, DetectResponse, ImportApi, ImportResponse, ResolutionRequest,
};
