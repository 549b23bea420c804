// ==========================================
// Project Site Tracker - Row normalizer implementation
// ==========================================
// Stage 1: raw row map -> NormalizedRecord
// Column aliases, Excel date serials, free-text status mapping
// ==========================================

use crate::domain::site::NormalizedRecord;
use crate::domain::types::{ProjectType, SiteStatus};
use crate::importer::error::{ImportError, PipelineResult};
use crate::importer::site_importer_trait::RowNormalizer as RowNormalizerTrait;
use chrono::{Days, NaiveDate};
use std::collections::HashMap;

/// Spreadsheet serial epoch. 1899-12-30 rather than 1900-01-01 absorbs both
/// the 1-based serial and the phantom 1900-02-29 that spreadsheets carry
/// around; serial 45000 lands on 2023-03-15 exactly as the sheets expect.
const EXCEL_EPOCH: (i32, u32, u32) = (1899, 12, 30);

pub struct RowNormalizer;

impl RowNormalizerTrait for RowNormalizer {
    fn normalize(
        &self,
        row: &HashMap<String, String>,
        row_index: usize,
    ) -> PipelineResult<NormalizedRecord> {
        let site_code = self.get_string(row, "site_code");
        let site_name = self.get_string(row, "site_name");

        // A row with neither identifier cannot be matched or persisted
        if site_code.is_none() && site_name.is_none() {
            return Err(ImportError::EmptyRow { row: row_index });
        }

        let project_name = self.get_string(row, "project_name").unwrap_or_default();
        let status_raw = self.get_string(row, "status").unwrap_or_default();

        Ok(NormalizedRecord {
            site_code: site_code.unwrap_or_default(),
            project_type: ProjectType::from_project_name(&project_name),
            site_name,
            barangay: self.get_string(row, "barangay"),
            municipality: self.get_string(row, "municipality"),
            province: self.get_string(row, "province"),
            district: self.get_string(row, "district"),
            latitude: self.parse_f64(row, "latitude"),
            longitude: self.parse_f64(row, "longitude"),
            activation_date: self
                .get_string(row, "date_of_activation")
                .and_then(|v| parse_excel_date(&v)),
            status: SiteStatus::from_raw(&status_raw),
            row_index,
        })
    }
}

impl RowNormalizer {
    /// Extract a text field, trying the canonical column name first and the
    /// human-readable spreadsheet variants after it. Empty cells count as
    /// absent, so a blank canonical column falls through to an alias.
    fn get_string(&self, row: &HashMap<String, String>, key: &str) -> Option<String> {
        let aliases: Vec<&str> = match key {
            "site_code" => vec!["site_code", "Site Code"],
            "project_name" => vec!["project_name", "Project Name", "Project"],
            "site_name" => vec!["site_name", "Site Name"],
            "barangay" => vec!["barangay", "Barangay"],
            "municipality" => vec!["municipality", "Municipality", "City/Municipality"],
            "province" => vec!["province", "Province"],
            "district" => vec!["district", "District", "Congressional District"],
            "latitude" => vec!["latitude", "Latitude", "Lat"],
            "longitude" => vec!["longitude", "Longitude", "Long"],
            "date_of_activation" => {
                vec!["date_of_activation", "Date of Activation", "Activation Date"]
            }
            "status" => vec!["status", "Status"],
            _ => vec![key],
        };

        for alias in aliases {
            if let Some(v) = row.get(alias) {
                let trimmed = v.trim();
                if !trimmed.is_empty() {
                    return Some(trimmed.to_string());
                }
            }
        }
        None
    }

    /// Lenient float parse: blank or junk cells become None. Range checks
    /// happen at commit time, where they are row-level validation errors.
    fn parse_f64(&self, row: &HashMap<String, String>, key: &str) -> Option<f64> {
        self.get_string(row, key).and_then(|v| v.parse::<f64>().ok())
    }
}

/// Convert a numeric Excel date serial to a calendar date.
///
/// Non-numeric and non-positive values yield None, never an error; the
/// upstream sheets leave the activation column blank or free-text for
/// unactivated sites.
pub fn parse_excel_date(value: &str) -> Option<NaiveDate> {
    let serial = value.trim().parse::<f64>().ok()?;
    if serial <= 0.0 {
        return None;
    }

    let (y, m, d) = EXCEL_EPOCH;
    // Truncate any fractional (time-of-day) part
    NaiveDate::from_ymd_opt(y, m, d)?.checked_add_days(Days::new(serial as u64))
}
