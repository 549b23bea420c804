// ==========================================
// Project Site Tracker - Audit log domain model
// ==========================================
// Every insert/update through the importer produces one entry.
// Audit is best-effort: a failed write is logged, never fatal.
// ==========================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

// ==========================================
// AuditEntity - closed whitelist of auditable tables
// ==========================================
// The upstream system kept this as a runtime set; here it is a closed
// enum, so an unknown entity name cannot reach the audit sink at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuditEntity {
    ProjectSites,
    Users,
    CsvImports,
    Provinces,
    Municipalities,
}

impl AuditEntity {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditEntity::ProjectSites => "project_sites",
            AuditEntity::Users => "users",
            AuditEntity::CsvImports => "csv_imports",
            AuditEntity::Provinces => "provinces",
            AuditEntity::Municipalities => "municipalities",
        }
    }

    /// Parse an entity name; anything outside the whitelist is rejected.
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "project_sites" => Some(AuditEntity::ProjectSites),
            "users" => Some(AuditEntity::Users),
            "csv_imports" => Some(AuditEntity::CsvImports),
            "provinces" => Some(AuditEntity::Provinces),
            "municipalities" => Some(AuditEntity::Municipalities),
            _ => None,
        }
    }
}

// ==========================================
// AuditAction - what happened to the record
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuditAction {
    Create,
    Update,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::Create => "Create",
            AuditAction::Update => "Update",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "Create" => Some(AuditAction::Create),
            "Update" => Some(AuditAction::Update),
            _ => None,
        }
    }
}

// ==========================================
// AuditEntry - one audit-log row
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub audit_id: String, // UUID
    pub action: AuditAction,
    pub entity: AuditEntity,
    pub record_id: String,
    pub old_values: Option<JsonValue>,
    pub new_values: Option<JsonValue>,
    pub recorded_at: DateTime<Utc>,
}

impl AuditEntry {
    pub fn new(action: AuditAction, entity: AuditEntity, record_id: &str) -> Self {
        Self {
            audit_id: uuid::Uuid::new_v4().to_string(),
            action,
            entity,
            record_id: record_id.to_string(),
            old_values: None,
            new_values: None,
            recorded_at: Utc::now(),
        }
    }

    pub fn with_old_values<T: Serialize>(mut self, old: &T) -> Self {
        self.old_values = serde_json::to_value(old).ok();
        self
    }

    pub fn with_new_values<T: Serialize>(mut self, new: &T) -> Self {
        self.new_values = serde_json::to_value(new).ok();
        self
    }
}
