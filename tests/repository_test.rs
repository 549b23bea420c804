// ==========================================
// Repository integration tests
// ==========================================
// Ledger state machine, batched lookups, transactional batch apply,
// audit log writes. Real temp-file databases throughout.
// ==========================================


use site_tracker::domain::import::{ImportResult, RowError};
use site_tracker::domain::{AuditAction, AuditEntity, AuditEntry};
use site_tracker::logging;
use site_tracker::repository::{
    AuditLogRepository, AuditSink, ImportJobRepository, ImportJobRepositoryImpl,
    RepositoryError, SiteRepository, SiteRepositoryImpl,
};
use site_tracker::{JobStatus, SiteStatus};
use test_helpers::{create_test_db, record};

fn result_with(inserted: usize, failed: usize) -> ImportResult {
    ImportResult {
        inserted,
        updated: 0,
        skipped: 0,
        failed_rows: (0..failed)
            .map(|i| RowError {
                row_index: i + 1,
                message: "bad row".to_string(),
            })
            .collect(),
    }
}

// ==========================================
// Import job ledger
// ==========================================

#[tokio::test]
async fn test_job_lifecycle_pending_to_completed() {
    logging::init_test();
    let (_db_file, handle) = create_test_db();
    let repo = ImportJobRepositoryImpl::new(handle);

    let job = repo.start("sites.csv", 5).await.unwrap();
    assert_eq!(job.status, JobStatus::Pending);

    repo.mark_processing(&job.id).await.unwrap();

    let finished = repo.finish(&job.id, &result_with(5, 0)).await.unwrap();
    assert_eq!(finished.status, JobStatus::Completed);
    assert_eq!(finished.success_count, 5);
    assert_eq!(finished.error_count, 0);
    assert!(finished.completed_at.is_some());

    // The durable row matches what finish returned
    let stored = repo.get_job(&job.id).await.unwrap().unwrap();
    assert_eq!(stored.status, JobStatus::Completed);
    assert_eq!(stored.success_count, 5);
}

#[tokio::test]
async fn test_job_terminal_states_reject_transitions() {
    logging::init_test();
    let (_db_file, handle) = create_test_db();
    let repo = ImportJobRepositoryImpl::new(handle);

    let job = repo.start("sites.csv", 3).await.unwrap();
    repo.mark_processing(&job.id).await.unwrap();
    repo.finish(&job.id, &result_with(3, 0)).await.unwrap();

    let err = repo.mark_processing(&job.id).await.unwrap_err();
    assert!(matches!(
        err,
        RepositoryError::InvalidStateTransition { .. }
    ));

    // Re-finishing a terminal job is equally illegal
    let err = repo.finish(&job.id, &result_with(3, 0)).await.unwrap_err();
    assert!(matches!(
        err,
        RepositoryError::InvalidStateTransition { .. }
    ));
}

#[tokio::test]
async fn test_job_cannot_finish_from_pending() {
    logging::init_test();
    let (_db_file, handle) = create_test_db();
    let repo = ImportJobRepositoryImpl::new(handle);

    let job = repo.start("sites.csv", 3).await.unwrap();

    let err = repo.finish(&job.id, &result_with(3, 0)).await.unwrap_err();
    assert!(matches!(
        err,
        RepositoryError::InvalidStateTransition { .. }
    ));
}

#[tokio::test]
async fn test_job_finish_computes_terminal_status() {
    logging::init_test();
    let (_db_file, handle) = create_test_db();
    let repo = ImportJobRepositoryImpl::new(handle);

    let mixed = repo.start("a.csv", 5).await.unwrap();
    repo.mark_processing(&mixed.id).await.unwrap();
    let mixed = repo.finish(&mixed.id, &result_with(3, 2)).await.unwrap();
    assert_eq!(mixed.status, JobStatus::Partial);
    assert_eq!(mixed.errors.len(), 2);

    let failed = repo.start("b.csv", 2).await.unwrap();
    repo.mark_processing(&failed.id).await.unwrap();
    let failed = repo.finish(&failed.id, &result_with(0, 2)).await.unwrap();
    assert_eq!(failed.status, JobStatus::Failed);
}

#[tokio::test]
async fn test_recent_jobs_newest_first() {
    logging::init_test();
    let (_db_file, handle) = create_test_db();
    let repo = ImportJobRepositoryImpl::new(handle);

    for name in ["first.csv", "second.csv", "third.csv"] {
        repo.start(name, 1).await.unwrap();
        // started_at must strictly increase for the ordering assertion
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    }

    let jobs = repo.recent_jobs(2).await.unwrap();
    assert_eq!(jobs.len(), 2);
    assert_eq!(jobs[0].filename, "third.csv");
    assert_eq!(jobs[1].filename, "second.csv");
}

#[tokio::test]
async fn test_get_missing_job_is_none() {
    logging::init_test();
    let (_db_file, handle) = create_test_db();
    let repo = ImportJobRepositoryImpl::new(handle);

    assert!(repo.get_job("no-such-job").await.unwrap().is_none());
}

// ==========================================
// Site repository
// ==========================================

#[tokio::test]
async fn test_fetch_by_site_codes_batched() {
    logging::init_test();
    let (_db_file, handle) = create_test_db();
    let repo = SiteRepositoryImpl::new(handle);

    let inserts = vec![
        record("FW-001", SiteStatus::Done, 1),
        record("FW-002", SiteStatus::Pending, 2),
        record("FW-003", SiteStatus::Done, 3),
    ];
    repo.apply_batch(&inserts, &[]).await.unwrap();

    let found = repo
        .fetch_by_site_codes(&[
            "FW-001".to_string(),
            "FW-003".to_string(),
            "FW-999".to_string(),
        ])
        .await
        .unwrap();

    assert_eq!(found.len(), 2);
    let mut codes: Vec<&str> = found.iter().map(|s| s.site_code.as_str()).collect();
    codes.sort();
    assert_eq!(codes, vec!["FW-001", "FW-003"]);

    // Empty input short-circuits without touching the database
    assert!(repo.fetch_by_site_codes(&[]).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_apply_batch_inserts_and_updates() {
    logging::init_test();
    let (_db_file, handle) = create_test_db();
    let repo = SiteRepositoryImpl::new(handle);

    repo.apply_batch(&[record("FW-001", SiteStatus::Pending, 1)], &[])
        .await
        .unwrap();

    let mut updated = record("FW-001", SiteStatus::Done, 1);
    updated.site_name = Some("Renamed Plaza".to_string());
    let stats = repo
        .apply_batch(&[record("FW-002", SiteStatus::Pending, 2)], &[updated])
        .await
        .unwrap();

    assert_eq!(stats.inserted, 1);
    assert_eq!(stats.updated, 1);

    let site = repo.get_by_site_code("FW-001").await.unwrap().unwrap();
    assert_eq!(site.status, SiteStatus::Done);
    assert_eq!(site.site_name, Some("Renamed Plaza".to_string()));
    assert_eq!(repo.count_sites().await.unwrap(), 2);
}

#[tokio::test]
async fn test_apply_batch_rolls_back_as_a_whole() {
    logging::init_test();
    let (_db_file, handle) = create_test_db();
    let repo = SiteRepositoryImpl::new(handle);

    // The override targets a site that does not exist, so the whole
    // batch, the valid insert included, must roll back
    let result = repo
        .apply_batch(
            &[record("FW-010", SiteStatus::Pending, 1)],
            &[record("FW-404", SiteStatus::Done, 2)],
        )
        .await;

    assert!(result.is_err());
    assert_eq!(repo.count_sites().await.unwrap(), 0);
}

#[tokio::test]
async fn test_duplicate_insert_rejected_by_unique_constraint() {
    logging::init_test();
    let (_db_file, handle) = create_test_db();
    let repo = SiteRepositoryImpl::new(handle);

    repo.apply_batch(&[record("FW-001", SiteStatus::Pending, 1)], &[])
        .await
        .unwrap();

    let err = repo
        .apply_batch(&[record("FW-001", SiteStatus::Done, 1)], &[])
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        RepositoryError::UniqueConstraintViolation(_)
    ));
}

// ==========================================
// Audit log
// ==========================================

#[tokio::test]
async fn test_audit_record_and_query() {
    logging::init_test();
    let (_db_file, handle) = create_test_db();
    let repo = AuditLogRepository::new(handle);

    let create = AuditEntry::new(AuditAction::Create, AuditEntity::ProjectSites, "FW-001")
        .with_new_values(&serde_json::json!({"status": "Pending"}));
    repo.record_audit(&create).await.unwrap();

    let update = AuditEntry::new(AuditAction::Update, AuditEntity::ProjectSites, "FW-001")
        .with_old_values(&serde_json::json!({"status": "Pending"}))
        .with_new_values(&serde_json::json!({"status": "Done"}));
    repo.record_audit(&update).await.unwrap();

    // A different record's entry must not appear in FW-001's history
    let other = AuditEntry::new(AuditAction::Create, AuditEntity::ProjectSites, "FW-002");
    repo.record_audit(&other).await.unwrap();

    assert_eq!(repo.count_entries().unwrap(), 3);

    let history = repo
        .recent_for_record(AuditEntity::ProjectSites, "FW-001", 10)
        .unwrap();
    assert_eq!(history.len(), 2);
    assert!(history.iter().all(|e| e.record_id == "FW-001"));

    let update_row = history
        .iter()
        .find(|e| e.action == AuditAction::Update)
        .unwrap();
    assert_eq!(
        update_row.old_values,
        Some(serde_json::json!({"status": "Pending"}))
    );
    assert_eq!(
        update_row.new_values,
        Some(serde_json::json!({"status": "Done"}))
    );
}
