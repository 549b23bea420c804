// ==========================================
// Project Site Tracker - Shared enum types
// ==========================================
// Scope: import pipeline vocabulary
// Stored as text columns; as_str/from_str pairs keep the
// database representation stable across releases
// ==========================================

use serde::{Deserialize, Serialize};

// ==========================================
// ProjectType - which connectivity programme a site belongs to
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProjectType {
    FreeWifi,
    Pnpki,
    Iidb,
    Elgu,
}

impl ProjectType {
    /// Database / display representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectType::FreeWifi => "FreeWifi",
            ProjectType::Pnpki => "PNPKI",
            ProjectType::Iidb => "IIDB",
            ProjectType::Elgu => "eLGU",
        }
    }

    /// Parse the stored representation.
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "FreeWifi" => Some(ProjectType::FreeWifi),
            "PNPKI" => Some(ProjectType::Pnpki),
            "IIDB" => Some(ProjectType::Iidb),
            "eLGU" => Some(ProjectType::Elgu),
            _ => None,
        }
    }

    /// Derive the project type from a free-text project name.
    ///
    /// Substring match, case-insensitive. Unrecognized names fall back to
    /// FreeWifi; this is observed upstream spreadsheet behavior, pinned by
    /// tests rather than corrected.
    pub fn from_project_name(name: &str) -> Self {
        let upper = name.to_uppercase();
        if upper.contains("WIFI") {
            ProjectType::FreeWifi
        } else if upper.contains("PNPKI") {
            ProjectType::Pnpki
        } else if upper.contains("IIDB") {
            ProjectType::Iidb
        } else if upper.contains("ELGU") {
            ProjectType::Elgu
        } else {
            ProjectType::FreeWifi
        }
    }
}

// ==========================================
// SiteStatus - rollout status of one site
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SiteStatus {
    Pending,
    InProgress,
    Done,
    Cancelled,
    OnHold,
}

impl SiteStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SiteStatus::Pending => "Pending",
            SiteStatus::InProgress => "InProgress",
            SiteStatus::Done => "Done",
            SiteStatus::Cancelled => "Cancelled",
            SiteStatus::OnHold => "OnHold",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "Pending" => Some(SiteStatus::Pending),
            "InProgress" => Some(SiteStatus::InProgress),
            "Done" => Some(SiteStatus::Done),
            "Cancelled" => Some(SiteStatus::Cancelled),
            "OnHold" => Some(SiteStatus::OnHold),
            _ => None,
        }
    }

    /// Map the free-text status column of a spreadsheet row.
    ///
    /// Fixed mapping table; anything unmapped (including blank) resolves to
    /// Pending. "IN PROGRESS" mapping to Pending is upstream behavior,
    /// pinned by tests.
    pub fn from_raw(raw: &str) -> Self {
        match raw.trim().to_uppercase().as_str() {
            "DONE" | "COMPLETED" => SiteStatus::Done,
            "PENDING" | "IN PROGRESS" | "ONGOING" => SiteStatus::Pending,
            "CANCELLED" | "CANCELED" | "DELAYED" => SiteStatus::Cancelled,
            _ => SiteStatus::Pending,
        }
    }
}

// ==========================================
// JobStatus - import job state machine
// ==========================================
// Pending -> Processing -> Completed | Failed | Partial
// Terminal states admit no further transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobStatus {
    Pending,
    Processing,
    Completed,
    Failed,
    Partial,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "Pending",
            JobStatus::Processing => "Processing",
            JobStatus::Completed => "Completed",
            JobStatus::Failed => "Failed",
            JobStatus::Partial => "Partial",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "Pending" => Some(JobStatus::Pending),
            "Processing" => Some(JobStatus::Processing),
            "Completed" => Some(JobStatus::Completed),
            "Failed" => Some(JobStatus::Failed),
            "Partial" => Some(JobStatus::Partial),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobStatus::Completed | JobStatus::Failed | JobStatus::Partial
        )
    }

    /// Whether `self -> next` is a legal transition.
    pub fn can_transition_to(&self, next: JobStatus) -> bool {
        match self {
            JobStatus::Pending => matches!(next, JobStatus::Processing),
            JobStatus::Processing => next.is_terminal(),
            _ => false,
        }
    }
}

// ==========================================
// ConflictType - relationship of an incoming row to the store
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConflictType {
    ExactDuplicate,
    SiteCodeMatchDifferentData,
    NoMatch,
}

impl ConflictType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConflictType::ExactDuplicate => "ExactDuplicate",
            ConflictType::SiteCodeMatchDifferentData => "SiteCodeMatchDifferentData",
            ConflictType::NoMatch => "NoMatch",
        }
    }
}

// ==========================================
// ResolutionAction - operator decision for one conflicting row
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResolutionAction {
    Override,
    Skip,
}

impl ResolutionAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResolutionAction::Override => "Override",
            ResolutionAction::Skip => "Skip",
        }
    }

    /// Parse an operator-supplied action name, case-insensitive.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "OVERRIDE" => Some(ResolutionAction::Override),
            "SKIP" => Some(ResolutionAction::Skip),
            _ => None,
        }
    }
}
