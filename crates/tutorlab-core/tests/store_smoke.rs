mod common;

use common::*;
use tempfile::tempdir;
use tutorlab_core::model::RunStatus;
use tutorlab_core::registry;
use tutorlab_core::storage::{ResultFilter, Store};

#[test]
fn test_storage_smoke_lifecycle() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let db_path = dir.path().join("evaluations.db");

    let store = Store::open(&db_path)?;
    store.init_schema()?;
    assert_eq!(store.schema_version()?, 3);

    let run = make_run(&store, 3, 2);
    assert_eq!(run.status, RunStatus::Running);
    assert!(run.id.starts_with("eval-"));
    assert_eq!(run.expected_tests(), 6);

    let id = store.store_result(&run.id, &scored_result("base", "s1", 82.0))?;
    assert!(id > 0);

    // Verify through a raw connection
    let conn = rusqlite::Connection::open(&db_path)?;
    let count: i64 = conn.query_row("SELECT count(*) FROM evaluation_runs", [], |r| r.get(0))?;
    assert_eq!(count, 1);
    let (profile, overall): (String, f64) = conn.query_row(
        "SELECT profile_name, overall_score FROM evaluation_results WHERE id = ?1",
        [id],
        |r| Ok((r.get(0)?, r.get(1)?)),
    )?;
    assert_eq!(profile, "base");
    assert_eq!(overall, 82.0);

    Ok(())
}

#[test]
fn init_schema_is_idempotent() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let db_path = dir.path().join("evaluations.db");

    let store = Store::open(&db_path)?;
    store.init_schema()?;
    store.init_schema()?;
    assert_eq!(store.schema_version()?, 3);

    // Reopening an already-migrated database applies nothing new
    let store = Store::open(&db_path)?;
    store.init_schema()?;
    assert_eq!(store.schema_version()?, 3);
    Ok(())
}

#[test]
fn result_roundtrips_modulo_generated_fields() -> anyhow::Result<()> {
    let store = open_store();
    let run = make_run(&store, 1, 1);

    let original = scored_result("recog-multi", "s7", 91.5).factorial(true, true, false);
    let id = store.store_result(&run.id, &original)?;

    let loaded = store.get_result(id)?.expect("stored result must load");
    assert_eq!(loaded.id, id);
    assert_eq!(loaded.run_id, run.id);
    assert!(!loaded.created_at.is_empty());
    assert_eq!(loaded.result, original);
    Ok(())
}

#[test]
fn failed_attempt_roundtrips_without_judge_block() -> anyhow::Result<()> {
    let store = open_store();
    let run = make_run(&store, 1, 1);

    let original = scored_result("base", "s1", 0.0).failed();
    let id = store.store_result(&run.id, &original)?;
    let loaded = store.get_result(id)?.unwrap();
    assert_eq!(loaded.result, original);
    assert!(loaded.result.evaluation.is_none());
    Ok(())
}

#[test]
fn get_results_filters_are_anded() -> anyhow::Result<()> {
    let store = open_store();
    let run = make_run(&store, 2, 2);

    store.store_result(&run.id, &scored_result("base", "s1", 70.0))?;
    store.store_result(&run.id, &scored_result("base", "s2", 71.0))?;
    store.store_result(&run.id, &scored_result("recog", "s1", 72.0))?;

    let all = store.get_results(&run.id, &ResultFilter::default())?;
    assert_eq!(all.len(), 3);

    let filtered = store.get_results(
        &run.id,
        &ResultFilter {
            scenario_id: Some("s1".into()),
            profile_name: Some("base".into()),
            ..Default::default()
        },
    )?;
    assert_eq!(filtered.len(), 1);
    assert_eq!(filtered[0].result.profile_name, "base");
    assert_eq!(filtered[0].result.scenario_id, "s1");
    Ok(())
}

#[test]
fn store_result_rejects_unknown_run() {
    let store = open_store();
    let err = store
        .store_result("eval-2026-01-01-00000000", &scored_result("base", "s1", 50.0))
        .unwrap_err();
    assert!(err.to_string().contains("E_RUN_NOT_FOUND"));
}

#[test]
fn update_run_status_rejects_unknown_run() {
    let store = open_store();
    let err = registry::update_run_status(
        &store,
        "eval-2026-01-01-00000000",
        registry::RunUpdate::Status(RunStatus::Failed),
    )
    .unwrap_err();
    assert!(err.to_string().contains("E_RUN_NOT_FOUND"));
}

#[test]
fn delete_run_cascades_to_results() -> anyhow::Result<()> {
    let store = open_store();
    let run = make_run(&store, 1, 1);
    store.store_result(&run.id, &scored_result("base", "s1", 60.0))?;
    store.store_result(&run.id, &scored_result("base", "s1", 61.0))?;

    let purged = store.delete_run(&run.id)?;
    assert_eq!(purged, 2);
    assert!(registry::get_run(&store, &run.id)?.is_none());
    assert_eq!(store.count_results(&run.id)?, 0);
    Ok(())
}

#[test]
fn list_runs_enriches_summaries() -> anyhow::Result<()> {
    let store = open_store();
    let run = make_run(&store, 3, 2);
    store.store_result(&run.id, &scored_result("base", "s1", 80.0))?;
    store.store_result(&run.id, &scored_result("recog", "s2", 90.0))?;
    store.store_result(&run.id, &scored_result("recog", "s3", 0.0).failed())?;

    let summaries = registry::list_runs(&store, Some(RunStatus::Running), Some(10))?;
    assert_eq!(summaries.len(), 1);
    let s = &summaries[0];
    assert_eq!(s.completed_tests, 3);
    assert_eq!(s.successful_tests, 2);
    assert_eq!(s.avg_score, Some(85.0));
    assert_eq!(s.scenario_names.len(), 3);
    assert_eq!(s.models, vec!["haiku".to_string()]);
    assert!((s.progress_pct - 50.0).abs() < 1e-9);
    Ok(())
}
