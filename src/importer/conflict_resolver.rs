// ==========================================
// Project Site Tracker - Conflict resolver implementation
// ==========================================
// Stage 3: join operator resolutions to detected conflicts and
// partition them into override / skip / unresolved buckets.
// Pure function; the commit step refuses to run while unresolved
// is non-empty.
// ==========================================

use crate::domain::import::{Conflict, Resolution, ResolutionOutcome};
use crate::domain::types::{ConflictType, ResolutionAction};
use std::collections::HashMap;

/// Apply operator resolutions to the detector's output.
///
/// Rules:
/// - NoMatch rows never pass through here; they flow straight to insert.
///   Any that do arrive are ignored.
/// - ExactDuplicate defaults to Skip (reimporting identical data changes
///   nothing); an explicit Override is honored and harmless.
/// - SiteCodeMatchDifferentData requires an explicit resolution; without
///   one the row lands in `unresolved` and blocks the commit.
/// - The first resolution for a row_index wins; duplicates are ignored.
pub fn resolve(conflicts: &[Conflict], resolutions: &[Resolution]) -> ResolutionOutcome {
    let mut by_row: HashMap<usize, ResolutionAction> = HashMap::new();
    for resolution in resolutions {
        by_row.entry(resolution.row_index).or_insert(resolution.action);
    }

    let mut outcome = ResolutionOutcome::default();

    for conflict in conflicts {
        match conflict.conflict_type {
            ConflictType::NoMatch => continue,
            ConflictType::ExactDuplicate => {
                match by_row.get(&conflict.row_index) {
                    Some(ResolutionAction::Override) => {
                        outcome.to_override.push(conflict.clone())
                    }
                    // Explicit Skip and no resolution mean the same thing here
                    _ => outcome.to_skip.push(conflict.clone()),
                }
            }
            ConflictType::SiteCodeMatchDifferentData => {
                match by_row.get(&conflict.row_index) {
                    Some(ResolutionAction::Override) => {
                        outcome.to_override.push(conflict.clone())
                    }
                    Some(ResolutionAction::Skip) => outcome.to_skip.push(conflict.clone()),
                    None => outcome.unresolved.push(conflict.clone()),
                }
            }
        }
    }

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::site::{NormalizedRecord, ProjectSite};
    use crate::domain::types::{ProjectType, SiteStatus};
    use chrono::Utc;

    fn conflict(row_index: usize, conflict_type: ConflictType) -> Conflict {
        let incoming = NormalizedRecord {
            site_code: format!("S{}", row_index),
            project_type: ProjectType::FreeWifi,
            site_name: Some("Plaza".to_string()),
            barangay: None,
            municipality: None,
            province: None,
            district: None,
            latitude: None,
            longitude: None,
            activation_date: None,
            status: SiteStatus::Pending,
            row_index,
        };
        let existing = match conflict_type {
            ConflictType::NoMatch => None,
            _ => Some(ProjectSite {
                id: row_index as i64,
                site_code: incoming.site_code.clone(),
                project_type: incoming.project_type,
                site_name: incoming.site_name.clone(),
                barangay: None,
                municipality: None,
                province: None,
                district: None,
                latitude: None,
                longitude: None,
                activation_date: None,
                status: SiteStatus::Done,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            }),
        };
        let differences = match conflict_type {
            ConflictType::SiteCodeMatchDifferentData => vec!["status".to_string()],
            _ => Vec::new(),
        };
        Conflict {
            row_index,
            conflict_type,
            existing,
            incoming,
            differences,
        }
    }

    fn resolution(row_index: usize, action: ResolutionAction) -> Resolution {
        Resolution { row_index, action }
    }

    #[test]
    fn test_exact_duplicate_defaults_to_skip() {
        let conflicts = vec![conflict(1, ConflictType::ExactDuplicate)];

        let outcome = resolve(&conflicts, &[]);

        assert_eq!(outcome.to_skip.len(), 1);
        assert!(outcome.to_override.is_empty());
        assert!(outcome.unresolved.is_empty());
    }

    #[test]
    fn test_exact_duplicate_override_honored() {
        let conflicts = vec![conflict(1, ConflictType::ExactDuplicate)];
        let resolutions = vec![resolution(1, ResolutionAction::Override)];

        let outcome = resolve(&conflicts, &resolutions);

        assert_eq!(outcome.to_override.len(), 1);
        assert!(outcome.to_skip.is_empty());
    }

    #[test]
    fn test_different_data_without_resolution_is_unresolved() {
        let conflicts = vec![conflict(1, ConflictType::SiteCodeMatchDifferentData)];

        let outcome = resolve(&conflicts, &[]);

        assert_eq!(outcome.unresolved.len(), 1);
        assert!(outcome.to_override.is_empty());
        assert!(outcome.to_skip.is_empty());
    }

    #[test]
    fn test_different_data_resolutions_applied() {
        let conflicts = vec![
            conflict(1, ConflictType::SiteCodeMatchDifferentData),
            conflict(2, ConflictType::SiteCodeMatchDifferentData),
        ];
        let resolutions = vec![
            resolution(1, ResolutionAction::Override),
            resolution(2, ResolutionAction::Skip),
        ];

        let outcome = resolve(&conflicts, &resolutions);

        assert_eq!(outcome.to_override.len(), 1);
        assert_eq!(outcome.to_override[0].row_index, 1);
        assert_eq!(outcome.to_skip.len(), 1);
        assert_eq!(outcome.to_skip[0].row_index, 2);
        assert!(outcome.unresolved.is_empty());
    }

    #[test]
    fn test_no_match_never_routed() {
        let conflicts = vec![conflict(1, ConflictType::NoMatch)];
        let resolutions = vec![resolution(1, ResolutionAction::Skip)];

        let outcome = resolve(&conflicts, &resolutions);

        assert!(outcome.to_override.is_empty());
        assert!(outcome.to_skip.is_empty());
        assert!(outcome.unresolved.is_empty());
    }

    #[test]
    fn test_buckets_are_disjoint() {
        let conflicts = vec![
            conflict(1, ConflictType::ExactDuplicate),
            conflict(2, ConflictType::SiteCodeMatchDifferentData),
            conflict(3, ConflictType::SiteCodeMatchDifferentData),
            conflict(4, ConflictType::NoMatch),
        ];
        let resolutions = vec![resolution(2, ResolutionAction::Override)];

        let outcome = resolve(&conflicts, &resolutions);

        let mut seen = std::collections::HashSet::new();
        for c in outcome
            .to_override
            .iter()
            .chain(outcome.to_skip.iter())
            .chain(outcome.unresolved.iter())
        {
            assert!(seen.insert(c.row_index), "row {} in two buckets", c.row_index);
        }
        assert_eq!(seen.len(), 3); // NoMatch row excluded
    }

    #[test]
    fn test_first_resolution_wins() {
        let conflicts = vec![conflict(1, ConflictType::SiteCodeMatchDifferentData)];
        let resolutions = vec![
            resolution(1, ResolutionAction::Skip),
            resolution(1, ResolutionAction::Override),
        ];

        let outcome = resolve(&conflicts, &resolutions);

        assert_eq!(outcome.to_skip.len(), 1);
        assert!(outcome.to_override.is_empty());
    }
}
