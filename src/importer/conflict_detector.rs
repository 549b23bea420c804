// ==========================================
// Project Site Tracker - Conflict detector implementation
// ==========================================
// Stage 2: classify each normalized record against the store snapshot.
// Pure over its inputs: the batched lookup happens in the orchestrator,
// so running this twice on the same snapshot gives identical output.
// ==========================================

use crate::domain::import::Conflict;
use crate::domain::site::{NormalizedRecord, ProjectSite};
use crate::domain::types::ConflictType;
use crate::importer::site_importer_trait::ConflictDetector as ConflictDetectorTrait;
use std::collections::HashMap;

pub struct ConflictDetector;

impl ConflictDetectorTrait for ConflictDetector {
    /// Classify every record against the existing-site snapshot.
    ///
    /// `existing` is keyed by site_code, the one reliable natural key in
    /// this domain. Classification:
    /// - no entry for the code -> NoMatch (plain insert)
    /// - entry with identical mutable fields -> ExactDuplicate
    /// - entry with any differing field -> SiteCodeMatchDifferentData,
    ///   with the differing field names in the fixed comparison order
    fn classify(
        &self,
        records: &[NormalizedRecord],
        existing: &HashMap<String, ProjectSite>,
    ) -> Vec<Conflict> {
        records
            .iter()
            .map(|record| match existing.get(&record.site_code) {
                None => Conflict {
                    row_index: record.row_index,
                    conflict_type: ConflictType::NoMatch,
                    existing: None,
                    incoming: record.clone(),
                    differences: Vec::new(),
                },
                Some(site) => {
                    let differences = record.differences_from(site);
                    let conflict_type = if differences.is_empty() {
                        ConflictType::ExactDuplicate
                    } else {
                        ConflictType::SiteCodeMatchDifferentData
                    };
                    Conflict {
                        row_index: record.row_index,
                        conflict_type,
                        existing: Some(site.clone()),
                        incoming: record.clone(),
                        differences,
                    }
                }
            })
            .collect()
    }
}
