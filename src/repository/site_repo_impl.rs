// ==========================================
// Project Site Tracker - Site Repository implementation
// ==========================================
// rusqlite over the shared connection handle.
// Red line: repositories do data CRUD only, no business rules
// ==========================================

use crate::db::DbHandle;
use crate::domain::site::{NormalizedRecord, ProjectSite};
use crate::domain::types::{ProjectType, SiteStatus};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::site_repo::{BatchApplyStats, SiteRepository};
use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, Connection, Row, Transaction};

// ==========================================
// SiteRepositoryImpl
// ==========================================
pub struct SiteRepositoryImpl {
    conn: DbHandle,
}

impl SiteRepositoryImpl {
    pub fn new(conn: DbHandle) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// Map one project_sites row.
    ///
    /// Enum columns were written via as_str; unknown text (hand-edited
    /// databases) falls back to the import defaults rather than failing
    /// the whole query.
    fn map_site_row(row: &Row<'_>) -> rusqlite::Result<ProjectSite> {
        let project_type_raw: String = row.get(2)?;
        let status_raw: String = row.get(11)?;
        Ok(ProjectSite {
            id: row.get(0)?,
            site_code: row.get(1)?,
            project_type: ProjectType::from_str(&project_type_raw)
                .unwrap_or(ProjectType::FreeWifi),
            site_name: row.get(3)?,
            barangay: row.get(4)?,
            municipality: row.get(5)?,
            province: row.get(6)?,
            district: row.get(7)?,
            latitude: row.get(8)?,
            longitude: row.get(9)?,
            activation_date: row.get(10)?,
            status: SiteStatus::from_str(&status_raw).unwrap_or(SiteStatus::Pending),
            created_at: row.get(12)?,
            updated_at: row.get(13)?,
        })
    }

    const SELECT_COLUMNS: &'static str = "id, site_code, project_type, site_name, barangay, \
         municipality, province, district, latitude, longitude, \
         activation_date, status, created_at, updated_at";

    /// Insert new records inside an open transaction.
    fn insert_batch_tx(
        tx: &Transaction<'_>,
        inserts: &[NormalizedRecord],
    ) -> RepositoryResult<usize> {
        let now = Utc::now();
        let mut stmt = tx.prepare(
            r#"
            INSERT INTO project_sites (
                site_code, project_type, site_name, barangay, municipality,
                province, district, latitude, longitude, activation_date,
                status, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            "#,
        )?;

        let mut count = 0;
        for record in inserts {
            stmt.execute(params![
                record.site_code,
                record.project_type.as_str(),
                record.site_name,
                record.barangay,
                record.municipality,
                record.province,
                record.district,
                record.latitude,
                record.longitude,
                record.activation_date,
                record.status.as_str(),
                now,
                now,
            ])?;
            count += 1;
        }

        Ok(count)
    }

    /// Update overrides by site_code inside an open transaction.
    fn update_batch_tx(
        tx: &Transaction<'_>,
        overrides: &[NormalizedRecord],
    ) -> RepositoryResult<usize> {
        let now = Utc::now();
        let mut stmt = tx.prepare(
            r#"
            UPDATE project_sites
            SET project_type = ?2, site_name = ?3, barangay = ?4,
                municipality = ?5, province = ?6, district = ?7,
                latitude = ?8, longitude = ?9, activation_date = ?10,
                status = ?11, updated_at = ?12
            WHERE site_code = ?1
            "#,
        )?;

        let mut count = 0;
        for record in overrides {
            let affected = stmt.execute(params![
                record.site_code,
                record.project_type.as_str(),
                record.site_name,
                record.barangay,
                record.municipality,
                record.province,
                record.district,
                record.latitude,
                record.longitude,
                record.activation_date,
                record.status.as_str(),
                now,
            ])?;
            // A vanished target row means the store changed under us;
            // abort the batch rather than half-apply it.
            if affected == 0 {
                return Err(RepositoryError::NotFound {
                    entity: "project_sites".to_string(),
                    id: record.site_code.clone(),
                });
            }
            count += 1;
        }

        Ok(count)
    }
}

#[async_trait]
impl SiteRepository for SiteRepositoryImpl {
    async fn fetch_by_site_codes(
        &self,
        site_codes: &[String],
    ) -> RepositoryResult<Vec<ProjectSite>> {
        if site_codes.is_empty() {
            return Ok(Vec::new());
        }

        let conn = self.get_conn()?;

        let placeholders = site_codes.iter().map(|_| "?").collect::<Vec<_>>().join(",");
        let query = format!(
            "SELECT {} FROM project_sites WHERE site_code IN ({})",
            Self::SELECT_COLUMNS,
            placeholders
        );

        let mut stmt = conn.prepare(&query)?;
        let params: Vec<&dyn rusqlite::ToSql> = site_codes
            .iter()
            .map(|code| code as &dyn rusqlite::ToSql)
            .collect();

        let sites = stmt
            .query_map(params.as_slice(), Self::map_site_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(sites)
    }

    async fn apply_batch(
        &self,
        inserts: &[NormalizedRecord],
        overrides: &[NormalizedRecord],
    ) -> RepositoryResult<BatchApplyStats> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;

        let inserted = Self::insert_batch_tx(&tx, inserts)?;
        let updated = Self::update_batch_tx(&tx, overrides)?;

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        Ok(BatchApplyStats { inserted, updated })
    }

    async fn get_by_site_code(
        &self,
        site_code: &str,
    ) -> RepositoryResult<Option<ProjectSite>> {
        let conn = self.get_conn()?;

        let query = format!(
            "SELECT {} FROM project_sites WHERE site_code = ?1",
            Self::SELECT_COLUMNS
        );
        let mut stmt = conn.prepare(&query)?;

        let result = stmt.query_row(params![site_code], Self::map_site_row);
        match result {
            Ok(site) => Ok(Some(site)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn count_sites(&self) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;

        let count: i64 =
            conn.query_row("SELECT COUNT(*) FROM project_sites", [], |row| row.get(0))?;

        Ok(count as usize)
    }
}
