// ==========================================
// Project Site Tracker - Site domain model
// ==========================================
// NormalizedRecord: import pipeline intermediate (one per spreadsheet row)
// ProjectSite: persisted row, owned by the storage layer
// ==========================================

use crate::domain::types::{ProjectType, SiteStatus};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

// ==========================================
// NormalizedRecord - canonical form of one spreadsheet row
// ==========================================
// Produced by the Row Normalizer, consumed by detection and commit.
// Lifetime: one import run only, never persisted as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedRecord {
    // ===== Natural key =====
    pub site_code: String,

    // ===== Classification =====
    pub project_type: ProjectType,

    // ===== Location =====
    pub site_name: Option<String>,
    pub barangay: Option<String>,
    pub municipality: Option<String>,
    pub province: Option<String>,
    pub district: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,

    // ===== Rollout =====
    pub activation_date: Option<NaiveDate>,
    pub status: SiteStatus,

    // ===== Meta =====
    pub row_index: usize, // 1-based source file row, for error attribution
}

/// Ordered list of the mutable fields compared during conflict detection.
///
/// Diff output must follow this exact order so downstream diff UIs render
/// deterministically.
pub const COMPARED_FIELDS: [&str; 9] = [
    "site_name",
    "barangay",
    "municipality",
    "province",
    "district",
    "latitude",
    "longitude",
    "activation_date",
    "status",
];

impl NormalizedRecord {
    /// Field-level diff against a persisted site.
    ///
    /// Returns the names of differing fields in `COMPARED_FIELDS` order;
    /// empty means the row is an exact duplicate of the stored record.
    pub fn differences_from(&self, existing: &ProjectSite) -> Vec<String> {
        let mut diffs = Vec::new();

        if self.site_name != existing.site_name {
            diffs.push("site_name".to_string());
        }
        if self.barangay != existing.barangay {
            diffs.push("barangay".to_string());
        }
        if self.municipality != existing.municipality {
            diffs.push("municipality".to_string());
        }
        if self.province != existing.province {
            diffs.push("province".to_string());
        }
        if self.district != existing.district {
            diffs.push("district".to_string());
        }
        if self.latitude != existing.latitude {
            diffs.push("latitude".to_string());
        }
        if self.longitude != existing.longitude {
            diffs.push("longitude".to_string());
        }
        if self.activation_date != existing.activation_date {
            diffs.push("activation_date".to_string());
        }
        if self.status != existing.status {
            diffs.push("status".to_string());
        }

        diffs
    }
}

// ==========================================
// ProjectSite - persisted project-site row
// ==========================================
// Read-only to the pipeline except through the transactional importer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectSite {
    pub id: i64,
    pub site_code: String,
    pub project_type: ProjectType,
    pub site_name: Option<String>,
    pub barangay: Option<String>,
    pub municipality: Option<String>,
    pub province: Option<String>,
    pub district: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub activation_date: Option<NaiveDate>,
    pub status: SiteStatus,

    // ===== Audit columns =====
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
