use crate::registry;
use crate::storage::{ResultFilter, Store};
use serde::Serialize;
use std::path::Path;

#[derive(Debug, Serialize)]
pub struct RunSnapshot {
    pub schema_version: u32,
    pub exported_at: String,
    pub run: crate::model::EvaluationRun,
    pub results: Vec<crate::model::StoredResult>,
}

/// Snapshots a run and all of its results for offline reporting.
pub fn export_json(store: &Store, run_id: &str, out: &Path) -> anyhow::Result<RunSnapshot> {
    let run = registry::require_run(store, run_id)?;
    let results = store.get_results(run_id, &ResultFilter::default())?;
    let snapshot = RunSnapshot {
        schema_version: 1,
        exported_at: chrono::Utc::now().to_rfc3339(),
        run,
        results,
    };
    std::fs::write(out, serde_json::to_string_pretty(&snapshot)?)?;
    Ok(snapshot)
}
