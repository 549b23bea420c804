// ==========================================
// Project Site Tracker - SQLite connection setup
// ==========================================
// Goals:
// - one place for Connection::open PRAGMA behavior, so every module
//   gets foreign keys and busy_timeout consistently
// - schema bootstrap for fresh databases (tests, CLI first run)
// ==========================================

use rusqlite::Connection;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Default busy_timeout (milliseconds).
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// Shared connection handle passed explicitly into every repository.
///
/// There is no process-wide pool: the handle is the injected resource, and
/// the mutex serializes the commit phase of concurrent imports. A caller
/// blocked on the lock is experiencing backpressure, not failure.
pub type DbHandle = Arc<Mutex<Connection>>;

/// Apply the unified PRAGMA set to a connection.
///
/// foreign_keys and busy_timeout are per-connection settings, so this must
/// run on every connection we open.
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// Open a SQLite connection with the unified configuration.
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// Open a connection and wrap it as a shareable handle.
pub fn open_db_handle(db_path: &str) -> rusqlite::Result<DbHandle> {
    Ok(Arc::new(Mutex::new(open_sqlite_connection(db_path)?)))
}

/// Create the pipeline tables if they do not exist.
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS project_sites (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            site_code       TEXT NOT NULL UNIQUE,
            project_type    TEXT NOT NULL,
            site_name       TEXT,
            barangay        TEXT,
            municipality    TEXT,
            province        TEXT,
            district        TEXT,
            latitude        REAL,
            longitude       REAL,
            activation_date TEXT,
            status          TEXT NOT NULL,
            created_at      TEXT NOT NULL,
            updated_at      TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_project_sites_site_code
            ON project_sites (site_code);

        CREATE TABLE IF NOT EXISTS import_jobs (
            job_id        TEXT PRIMARY KEY,
            filename      TEXT NOT NULL,
            total_rows    INTEGER NOT NULL,
            success_count INTEGER NOT NULL DEFAULT 0,
            error_count   INTEGER NOT NULL DEFAULT 0,
            errors_json   TEXT NOT NULL DEFAULT '[]',
            status        TEXT NOT NULL,
            started_at    TEXT NOT NULL,
            completed_at  TEXT
        );

        CREATE TABLE IF NOT EXISTS audit_log (
            audit_id        TEXT PRIMARY KEY,
            action          TEXT NOT NULL,
            entity          TEXT NOT NULL,
            record_id       TEXT NOT NULL,
            old_values_json TEXT,
            new_values_json TEXT,
            recorded_at     TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_audit_log_record
            ON audit_log (entity, record_id);
        "#,
    )
}
