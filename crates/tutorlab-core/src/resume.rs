//! Resumption planning: a pure set difference between the expected
//! profile x scenario matrix and the pairs that already have a stored
//! attempt. Failed attempts count as done -- a stored failure is presumed
//! not auto-retryable -- and replications never inflate the completed count.

use crate::model::RunStatus;
use crate::registry;
use crate::storage::Store;
use serde::Serialize;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PlannedTest {
    pub profile_name: String,
    pub scenario_id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResumePlan {
    pub run_id: String,
    pub total_expected: usize,
    pub completed: usize,
    pub remaining: usize,
    pub progress_pct: f64,
    pub remaining_tests: Vec<PlannedTest>,
    pub can_resume: bool,
}

pub fn incomplete_tests(
    store: &Store,
    run_id: &str,
    expected_configs: &[String],
    expected_scenarios: &[String],
) -> anyhow::Result<ResumePlan> {
    let run = registry::require_run(store, run_id)?;
    let attempted = store.attempted_pairs(run_id)?;

    let mut remaining_tests = Vec::new();
    let mut completed = 0usize;
    for profile in expected_configs {
        for scenario in expected_scenarios {
            if attempted.contains(&format!("{}:{}", profile, scenario)) {
                completed += 1;
            } else {
                remaining_tests.push(PlannedTest {
                    profile_name: profile.clone(),
                    scenario_id: scenario.clone(),
                });
            }
        }
    }

    let total_expected = expected_configs.len() * expected_scenarios.len();
    let progress_pct = if total_expected > 0 {
        completed as f64 / total_expected as f64 * 100.0
    } else {
        100.0
    };
    let can_resume = !remaining_tests.is_empty() && run.status == RunStatus::Running;

    Ok(ResumePlan {
        run_id: run_id.to_string(),
        total_expected,
        completed,
        remaining: remaining_tests.len(),
        progress_pct,
        remaining_tests,
        can_resume,
    })
}
