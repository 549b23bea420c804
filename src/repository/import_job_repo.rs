// ==========================================
// Project Site Tracker - Import Job Ledger
// ==========================================
// Durable record of every import attempt. The status machine is
// enforced here: Pending -> Processing -> Completed/Failed/Partial,
// and nothing leaves a terminal state.
// ==========================================

use crate::db::DbHandle;
use crate::domain::import::{ImportJob, ImportResult, RowError};
use crate::domain::types::JobStatus;
use crate::repository::error::{RepositoryError, RepositoryResult};
use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, Connection, Row};

// ==========================================
// ImportJobRepository Trait
// ==========================================
#[async_trait]
pub trait ImportJobRepository: Send + Sync {
    /// Create a Pending job for an import attempt.
    async fn start(&self, filename: &str, total_rows: usize) -> RepositoryResult<ImportJob>;

    /// Move a Pending job into Processing.
    async fn mark_processing(&self, job_id: &str) -> RepositoryResult<()>;

    /// Record the outcome and move the job into its terminal state.
    async fn finish(&self, job_id: &str, result: &ImportResult) -> RepositoryResult<ImportJob>;

    /// Fetch one job by id.
    async fn get_job(&self, job_id: &str) -> RepositoryResult<Option<ImportJob>>;

    /// Most recent jobs, newest first.
    async fn recent_jobs(&self, limit: usize) -> RepositoryResult<Vec<ImportJob>>;
}

// ==========================================
// ImportJobRepositoryImpl
// ==========================================
pub struct ImportJobRepositoryImpl {
    conn: DbHandle,
}

impl ImportJobRepositoryImpl {
    pub fn new(conn: DbHandle) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    fn map_job_row(row: &Row<'_>) -> rusqlite::Result<ImportJob> {
        let status_raw: String = row.get(6)?;
        let errors_json: String = row.get(5)?;
        let errors: Vec<RowError> = serde_json::from_str(&errors_json).unwrap_or_default();
        Ok(ImportJob {
            id: row.get(0)?,
            filename: row.get(1)?,
            total_rows: row.get::<_, i64>(2)? as usize,
            success_count: row.get::<_, i64>(3)? as usize,
            error_count: row.get::<_, i64>(4)? as usize,
            errors,
            status: JobStatus::from_str(&status_raw).unwrap_or(JobStatus::Failed),
            started_at: row.get(7)?,
            completed_at: row.get(8)?,
        })
    }

    const SELECT_COLUMNS: &'static str = "job_id, filename, total_rows, success_count, \
         error_count, errors_json, status, started_at, completed_at";

    fn load_job(conn: &Connection, job_id: &str) -> RepositoryResult<Option<ImportJob>> {
        let query = format!(
            "SELECT {} FROM import_jobs WHERE job_id = ?1",
            Self::SELECT_COLUMNS
        );
        let mut stmt = conn.prepare(&query)?;
        match stmt.query_row(params![job_id], Self::map_job_row) {
            Ok(job) => Ok(Some(job)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Reject transitions the state machine does not allow.
    fn check_transition(current: JobStatus, next: JobStatus) -> RepositoryResult<()> {
        if !current.can_transition_to(next) {
            return Err(RepositoryError::InvalidStateTransition {
                from: current.as_str().to_string(),
                to: next.as_str().to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl ImportJobRepository for ImportJobRepositoryImpl {
    async fn start(&self, filename: &str, total_rows: usize) -> RepositoryResult<ImportJob> {
        let job = ImportJob::new(filename, total_rows);
        let conn = self.get_conn()?;

        conn.execute(
            r#"
            INSERT INTO import_jobs (
                job_id, filename, total_rows, success_count, error_count,
                errors_json, status, started_at, completed_at
            ) VALUES (?1, ?2, ?3, 0, 0, '[]', ?4, ?5, NULL)
            "#,
            params![
                job.id,
                job.filename,
                job.total_rows as i64,
                job.status.as_str(),
                job.started_at,
            ],
        )?;

        Ok(job)
    }

    async fn mark_processing(&self, job_id: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;

        let job = Self::load_job(&conn, job_id)?.ok_or_else(|| RepositoryError::NotFound {
            entity: "import_jobs".to_string(),
            id: job_id.to_string(),
        })?;
        Self::check_transition(job.status, JobStatus::Processing)?;

        conn.execute(
            "UPDATE import_jobs SET status = ?2 WHERE job_id = ?1",
            params![job_id, JobStatus::Processing.as_str()],
        )?;

        Ok(())
    }

    async fn finish(&self, job_id: &str, result: &ImportResult) -> RepositoryResult<ImportJob> {
        let conn = self.get_conn()?;

        let mut job = Self::load_job(&conn, job_id)?.ok_or_else(|| RepositoryError::NotFound {
            entity: "import_jobs".to_string(),
            id: job_id.to_string(),
        })?;

        let success_count = result.success_count();
        let error_count = result.failed_rows.len();
        let status = ImportJob::terminal_status(success_count, error_count);
        Self::check_transition(job.status, status)?;

        let completed_at = Utc::now();
        let errors_json = serde_json::to_string(&result.failed_rows)?;

        conn.execute(
            r#"
            UPDATE import_jobs
            SET success_count = ?2, error_count = ?3, errors_json = ?4,
                status = ?5, completed_at = ?6
            WHERE job_id = ?1
            "#,
            params![
                job_id,
                success_count as i64,
                error_count as i64,
                errors_json,
                status.as_str(),
                completed_at,
            ],
        )?;

        job.success_count = success_count;
        job.error_count = error_count;
        job.errors = result.failed_rows.clone();
        job.status = status;
        job.completed_at = Some(completed_at);

        Ok(job)
    }

    async fn get_job(&self, job_id: &str) -> RepositoryResult<Option<ImportJob>> {
        let conn = self.get_conn()?;
        Self::load_job(&conn, job_id)
    }

    async fn recent_jobs(&self, limit: usize) -> RepositoryResult<Vec<ImportJob>> {
        let conn = self.get_conn()?;

        let query = format!(
            "SELECT {} FROM import_jobs ORDER BY started_at DESC LIMIT ?1",
            Self::SELECT_COLUMNS
        );
        let mut stmt = conn.prepare(&query)?;

        let jobs = stmt
            .query_map(params![limit as i64], Self::map_job_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(jobs)
    }
}
