//! Stale-run reconciliation. A run left `running` past the age threshold is
//! closed out from whatever result rows exist: zero results means the run
//! failed, anything else means it completed with the actual count and with
//! `completed_at` pinned to the newest result timestamp, not "now".

use crate::model::{EvaluationRun, RunStatus};
use crate::registry::{self, RunUpdate};
use crate::storage::Store;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize)]
pub struct StaleRun {
    #[serde(flatten)]
    pub run: EvaluationRun,
    pub result_count: u64,
    pub expected_tests: u64,
    pub age_minutes: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Reconciliation {
    pub run_id: String,
    pub status: RunStatus,
    pub already_completed: bool,
    pub total_tests: u64,
    pub expected_tests: u64,
    /// Percentage of the originally expected matrix that has a result.
    pub completion_rate: f64,
    pub was_partial: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<String>,
    pub results_per_profile: BTreeMap<String, u64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StaleSweep {
    pub dry_run: bool,
    pub candidates: Vec<StaleRun>,
    pub reconciled: Vec<Reconciliation>,
}

/// Every `running` run created more than `older_than_minutes` ago.
pub fn find_incomplete_runs(
    store: &Store,
    older_than_minutes: i64,
) -> anyhow::Result<Vec<StaleRun>> {
    let now = Utc::now();
    let runs = registry::list_runs(store, Some(RunStatus::Running), None)?;

    let mut stale = Vec::new();
    for summary in runs {
        let run = summary.run;
        let Ok(created) = DateTime::parse_from_rfc3339(&run.created_at) else {
            continue;
        };
        let age_minutes = (now - created.with_timezone(&Utc)).num_minutes();
        if age_minutes <= older_than_minutes {
            continue;
        }
        stale.push(StaleRun {
            expected_tests: run.expected_tests(),
            result_count: summary.completed_tests,
            age_minutes,
            run,
        });
    }
    Ok(stale)
}

/// Closes out a single run from its result rows. Idempotent: a run already
/// in a terminal state is reported with `already_completed = true` and its
/// `completed_at` is never touched again.
pub fn complete_run(store: &Store, run_id: &str) -> anyhow::Result<Reconciliation> {
    let run = registry::require_run(store, run_id)?;
    let results_per_profile = store.results_per_profile(run_id)?;
    let total_tests = store.count_results(run_id)?;
    let expected = run.expected_tests();

    if run.status.is_terminal() {
        return Ok(Reconciliation {
            run_id: run.id,
            status: run.status,
            already_completed: true,
            total_tests,
            expected_tests: expected,
            completion_rate: completion_rate(total_tests, expected),
            was_partial: total_tests < expected,
            completed_at: run.completed_at,
            results_per_profile,
        });
    }

    let (status, completed_at) = if total_tests == 0 {
        // A run that produced no data is a failure, not an empty success.
        (RunStatus::Failed, None)
    } else {
        (RunStatus::Completed, store.latest_result_at(run_id)?)
    };

    registry::update_run_status(
        store,
        run_id,
        RunUpdate::Finish {
            status,
            total_tests: total_tests as u32,
            completed_at: completed_at.clone(),
        },
    )?;
    tracing::warn!(
        event = "run_reconciled",
        run_id = %run_id,
        status = status.as_str(),
        total_tests = total_tests,
        expected = expected
    );

    // Re-read so the reported completed_at is what was actually persisted
    let run = registry::require_run(store, run_id)?;
    Ok(Reconciliation {
        run_id: run.id,
        status,
        already_completed: false,
        total_tests,
        expected_tests: expected,
        completion_rate: completion_rate(total_tests, expected),
        was_partial: total_tests < expected,
        completed_at: run.completed_at,
        results_per_profile,
    })
}

/// Batch reconciliation over every stale run. With `dry_run` the candidate
/// list is returned untouched, for operator review before a destructive
/// pass.
pub fn auto_complete_stale_runs(
    store: &Store,
    older_than_minutes: i64,
    dry_run: bool,
) -> anyhow::Result<StaleSweep> {
    let candidates = find_incomplete_runs(store, older_than_minutes)?;
    if dry_run {
        return Ok(StaleSweep {
            dry_run: true,
            candidates,
            reconciled: Vec::new(),
        });
    }

    let mut reconciled = Vec::new();
    for stale in &candidates {
        reconciled.push(complete_run(store, &stale.run.id)?);
    }
    Ok(StaleSweep {
        dry_run: false,
        candidates,
        reconciled,
    })
}

fn completion_rate(actual: u64, expected: u64) -> f64 {
    if expected == 0 {
        return 0.0;
    }
    actual as f64 / expected as f64 * 100.0
}
