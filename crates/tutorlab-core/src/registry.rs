//! Run registry: owns the run rows and the run state machine.
//! `running -> completed` and `running -> failed`; terminal states never
//! transition back. A driver resuming a run leaves it `running` and simply
//! submits more results.

use crate::model::{EvaluationRun, Provenance, RunStatus};
use crate::storage::store::now_rfc3339;
use crate::storage::Store;
use anyhow::Context;
use chrono::{DateTime, Utc};
use rusqlite::params;
use serde::Serialize;
use sha2::{Digest, Sha256};

#[derive(Debug, Clone, Default)]
pub struct NewRun {
    pub description: String,
    pub expected_scenarios: u32,
    pub expected_configs: u32,
    pub metadata: serde_json::Value,
    pub provenance: Provenance,
}

/// The three call shapes of a status update.
#[derive(Debug, Clone)]
pub enum RunUpdate {
    /// Terminal transition with the final test count. `completed_at` of
    /// `None` means "now"; the reconciler passes an explicit historical
    /// timestamp instead.
    Finish {
        status: RunStatus,
        total_tests: u32,
        completed_at: Option<String>,
    },
    /// Progress heartbeat: bump `total_tests`, keep the current status.
    Progress { total_tests: u32 },
    /// Bare status change.
    Status(RunStatus),
}

/// A run enriched with rollups recomputed from its result rows. The stored
/// counters on the run are never treated as authoritative here.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    #[serde(flatten)]
    pub run: EvaluationRun,
    pub scenario_names: Vec<String>,
    pub models: Vec<String>,
    pub completed_tests: u64,
    pub successful_tests: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_score: Option<f64>,
    pub progress_pct: f64,
    pub duration_secs: i64,
}

/// Mints a fresh run id: the creation date for sortability plus a short
/// hash of the creation instant, e.g. `eval-2026-02-03-f5d4dd93`.
pub fn mint_run_id(now: DateTime<Utc>) -> String {
    let mut hasher = Sha256::new();
    hasher.update(now.timestamp_nanos_opt().unwrap_or_default().to_le_bytes());
    hasher.update(std::process::id().to_le_bytes());
    let digest = hex::encode(hasher.finalize());
    format!("eval-{}-{}", now.format("%Y-%m-%d"), &digest[..8])
}

pub fn create_run(store: &Store, new: NewRun) -> anyhow::Result<EvaluationRun> {
    let now = Utc::now();
    let run = EvaluationRun {
        id: mint_run_id(now),
        description: new.description,
        expected_scenarios: new.expected_scenarios,
        expected_configs: new.expected_configs,
        total_tests: None,
        status: RunStatus::Running,
        created_at: now.to_rfc3339(),
        completed_at: None,
        metadata: new.metadata,
        provenance: new.provenance,
    };
    store.insert_run_row(&run)?;
    tracing::info!(event = "run_created", run_id = %run.id, expected = run.expected_tests());
    Ok(run)
}

pub fn get_run(store: &Store, run_id: &str) -> anyhow::Result<Option<EvaluationRun>> {
    let conn = store.conn.lock().unwrap();
    let sql = format!(
        "SELECT {} FROM evaluation_runs WHERE id = ?1",
        crate::storage::rows::RUN_COLUMNS
    );
    let mut stmt = conn.prepare(&sql)?;
    let mut mapped = stmt.query_map(params![run_id], crate::storage::rows::run_from_row)?;
    match mapped.next() {
        Some(run) => Ok(Some(run?)),
        None => Ok(None),
    }
}

pub fn update_run_status(store: &Store, run_id: &str, update: RunUpdate) -> anyhow::Result<()> {
    let conn = store.conn.lock().unwrap();
    let changed = match &update {
        RunUpdate::Finish {
            status,
            total_tests,
            completed_at,
        } => {
            let ts = completed_at.clone().unwrap_or_else(now_rfc3339);
            conn.execute(
                "UPDATE evaluation_runs SET status=?1, total_tests=?2, completed_at=?3 WHERE id=?4",
                params![status.as_str(), total_tests, ts, run_id],
            )?
        }
        RunUpdate::Progress { total_tests } => conn.execute(
            "UPDATE evaluation_runs SET total_tests=?1 WHERE id=?2",
            params![total_tests, run_id],
        )?,
        // completed_at is set iff the run leaves the running state
        RunUpdate::Status(status) => {
            let completed_at = status.is_terminal().then(now_rfc3339);
            conn.execute(
                "UPDATE evaluation_runs SET status=?1, completed_at=?2 WHERE id=?3",
                params![status.as_str(), completed_at, run_id],
            )?
        }
    };
    if changed == 0 {
        anyhow::bail!("E_RUN_NOT_FOUND: no run with id {}", run_id);
    }
    tracing::info!(event = "run_updated", run_id = %run_id, update = ?update);
    Ok(())
}

pub fn list_runs(
    store: &Store,
    status: Option<RunStatus>,
    limit: Option<u32>,
) -> anyhow::Result<Vec<RunSummary>> {
    let runs = {
        let conn = store.conn.lock().unwrap();
        let mut sql = format!(
            "SELECT {} FROM evaluation_runs",
            crate::storage::rows::RUN_COLUMNS
        );
        let mut values: Vec<rusqlite::types::Value> = Vec::new();
        if let Some(s) = status {
            sql.push_str(" WHERE status = ?1");
            values.push(rusqlite::types::Value::Text(s.as_str().to_string()));
        }
        sql.push_str(" ORDER BY created_at DESC");
        if let Some(n) = limit {
            sql.push_str(&format!(" LIMIT {}", n));
        }
        let mut stmt = conn.prepare(&sql)?;
        let mapped = stmt.query_map(
            rusqlite::params_from_iter(values),
            crate::storage::rows::run_from_row,
        )?;
        let mut runs = Vec::new();
        for r in mapped {
            runs.push(r?);
        }
        runs
    };

    runs.into_iter().map(|run| summarize(store, run)).collect()
}

fn summarize(store: &Store, run: EvaluationRun) -> anyhow::Result<RunSummary> {
    let conn = store.conn.lock().unwrap();

    let mut scenario_names = Vec::new();
    {
        let mut stmt = conn.prepare(
            "SELECT DISTINCT scenario_name FROM evaluation_results WHERE run_id = ?1 ORDER BY scenario_name",
        )?;
        for name in stmt.query_map(params![run.id], |r| r.get::<_, String>(0))? {
            scenario_names.push(name?);
        }
    }

    let mut models = Vec::new();
    {
        let mut stmt = conn.prepare(
            "SELECT DISTINCT model FROM evaluation_results WHERE run_id = ?1 ORDER BY model",
        )?;
        for model in stmt.query_map(params![run.id], |r| r.get::<_, String>(0))? {
            models.push(model?);
        }
    }

    let (completed_tests, successful_tests, avg_score): (i64, i64, Option<f64>) = conn.query_row(
        "SELECT COUNT(*), COALESCE(SUM(success), 0), AVG(CASE WHEN success = 1 THEN overall_score END)
         FROM evaluation_results WHERE run_id = ?1",
        params![run.id],
        |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)),
    )?;
    drop(conn);

    let expected = run.expected_tests() as f64;
    let progress_pct = if expected > 0.0 {
        (completed_tests as f64 / expected * 100.0).min(100.0)
    } else {
        0.0
    };

    let duration_secs = duration_secs(&run);

    Ok(RunSummary {
        run,
        scenario_names,
        models,
        completed_tests: completed_tests as u64,
        successful_tests: successful_tests as u64,
        avg_score,
        progress_pct,
        duration_secs,
    })
}

/// Wall-clock elapsed for a still-running run, completed-created otherwise.
fn duration_secs(run: &EvaluationRun) -> i64 {
    let Ok(created) = DateTime::parse_from_rfc3339(&run.created_at) else {
        return 0;
    };
    let end = run
        .completed_at
        .as_deref()
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|t| t.with_timezone(&Utc))
        .unwrap_or_else(Utc::now);
    (end - created.with_timezone(&Utc)).num_seconds()
}

/// Looks up a run or fails with the coded not-found error. Most mutating
/// callers want this rather than the bare `Option`.
pub fn require_run(store: &Store, run_id: &str) -> anyhow::Result<EvaluationRun> {
    get_run(store, run_id)?.with_context(|| format!("E_RUN_NOT_FOUND: no run with id {}", run_id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_id_embeds_date_and_is_unique_per_instant() {
        let t1 = Utc::now();
        let id = mint_run_id(t1);
        assert!(id.starts_with(&format!("eval-{}", t1.format("%Y-%m-%d"))));
        let t2 = t1 + chrono::Duration::nanoseconds(1);
        assert_ne!(mint_run_id(t1), mint_run_id(t2));
    }
}
