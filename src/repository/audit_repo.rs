// ==========================================
// Project Site Tracker - Audit Log Repository
// ==========================================
// Best-effort collaborator: the importer flushes entries here after
// the data transaction commits. A failed audit write is the caller's
// problem to log, never to roll back.
// ==========================================

use crate::db::DbHandle;
use crate::domain::audit::{AuditAction, AuditEntity, AuditEntry};
use crate::repository::error::{RepositoryError, RepositoryResult};
use async_trait::async_trait;
use rusqlite::{params, Connection, Row};

// ==========================================
// AuditSink Trait
// ==========================================
// The pipeline's view of the audit collaborator. The entity whitelist
// is the AuditEntity enum itself: an unlisted table name cannot be
// expressed, so nothing needs rejecting at runtime.
#[async_trait]
pub trait AuditSink: Send + Sync {
    /// Persist one audit entry.
    async fn record_audit(&self, entry: &AuditEntry) -> RepositoryResult<()>;
}

// ==========================================
// AuditLogRepository
// ==========================================
pub struct AuditLogRepository {
    conn: DbHandle,
}

impl AuditLogRepository {
    pub fn new(conn: DbHandle) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    fn map_entry_row(row: &Row<'_>) -> rusqlite::Result<AuditEntry> {
        let action_raw: String = row.get(1)?;
        let entity_raw: String = row.get(2)?;
        let old_json: Option<String> = row.get(4)?;
        let new_json: Option<String> = row.get(5)?;
        Ok(AuditEntry {
            audit_id: row.get(0)?,
            action: AuditAction::from_str(&action_raw).unwrap_or(AuditAction::Update),
            entity: AuditEntity::from_str(&entity_raw).unwrap_or(AuditEntity::ProjectSites),
            record_id: row.get(3)?,
            old_values: old_json.and_then(|s| serde_json::from_str(&s).ok()),
            new_values: new_json.and_then(|s| serde_json::from_str(&s).ok()),
            recorded_at: row.get(6)?,
        })
    }

    /// Entries for one record, newest first.
    pub fn recent_for_record(
        &self,
        entity: AuditEntity,
        record_id: &str,
        limit: usize,
    ) -> RepositoryResult<Vec<AuditEntry>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT audit_id, action, entity, record_id,
                   old_values_json, new_values_json, recorded_at
            FROM audit_log
            WHERE entity = ?1 AND record_id = ?2
            ORDER BY recorded_at DESC
            LIMIT ?3
            "#,
        )?;

        let entries = stmt
            .query_map(
                params![entity.as_str(), record_id, limit as i64],
                Self::map_entry_row,
            )?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(entries)
    }

    /// Total audit rows, for tests and diagnostics.
    pub fn count_entries(&self) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM audit_log", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

#[async_trait]
impl AuditSink for AuditLogRepository {
    async fn record_audit(&self, entry: &AuditEntry) -> RepositoryResult<()> {
        let conn = self.get_conn()?;

        conn.execute(
            r#"
            INSERT INTO audit_log (
                audit_id, action, entity, record_id,
                old_values_json, new_values_json, recorded_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                entry.audit_id,
                entry.action.as_str(),
                entry.entity.as_str(),
                entry.record_id,
                entry.old_values.as_ref().map(|v| v.to_string()),
                entry.new_values.as_ref().map(|v| v.to_string()),
                entry.recorded_at,
            ],
        )?;

        Ok(())
    }
}
