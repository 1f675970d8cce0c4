//! Aggregate statistics over stored results. Successful results are grouped
//! by (provider, model, profile) or (scenario, provider, model, profile);
//! the score filtering convention here is shared with the factorial
//! extractor and the two must stay consistent.

pub mod factorial;

use crate::model::StoredResult;
use crate::registry;
use crate::storage::{ResultFilter, Store};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, Serialize)]
pub struct DimensionMeans {
    pub relevance: f64,
    pub personalization: f64,
    pub pedagogy: f64,
    pub actionability: f64,
    pub attunement: f64,
    pub recognition: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct GroupStats {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scenario_id: Option<String>,
    pub provider: String,
    pub model: String,
    pub profile_name: String,
    pub attempts: u64,
    pub successes: u64,
    pub success_rate: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_overall: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_base: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_recognition: Option<f64>,
    pub dimensions: DimensionMeans,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_latency_ms: Option<f64>,
    pub total_input_tokens: u64,
    pub total_output_tokens: u64,
    pub required_pass_count: u64,
    pub forbidden_pass_count: u64,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Winner {
    ProfileA,
    ProfileB,
    Tie,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScenarioComparison {
    pub scenario_id: String,
    pub mean_a: f64,
    pub mean_b: f64,
    pub diff: f64,
    pub winner: Winner,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProfileComparison {
    pub run_id: String,
    pub profile_a: String,
    pub profile_b: String,
    pub scenarios: Vec<ScenarioComparison>,
    pub a_wins: u64,
    pub b_wins: u64,
    pub ties: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overall_mean_a: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overall_mean_b: Option<f64>,
}

pub fn run_stats(store: &Store, run_id: &str) -> anyhow::Result<Vec<GroupStats>> {
    grouped_stats(store, run_id, false)
}

pub fn scenario_stats(store: &Store, run_id: &str) -> anyhow::Result<Vec<GroupStats>> {
    grouped_stats(store, run_id, true)
}

fn grouped_stats(store: &Store, run_id: &str, by_scenario: bool) -> anyhow::Result<Vec<GroupStats>> {
    registry::require_run(store, run_id)?;
    let results = store.get_results(run_id, &ResultFilter::default())?;

    let mut groups: BTreeMap<(Option<String>, String, String, String), Vec<&StoredResult>> =
        BTreeMap::new();
    for r in &results {
        let scenario = by_scenario.then(|| r.result.scenario_id.clone());
        groups
            .entry((
                scenario,
                r.result.provider.clone(),
                r.result.model.clone(),
                r.result.profile_name.clone(),
            ))
            .or_default()
            .push(r);
    }

    let mut out = Vec::new();
    for ((scenario_id, provider, model, profile_name), members) in groups {
        out.push(stats_for_group(
            scenario_id,
            provider,
            model,
            profile_name,
            &members,
        ));
    }
    Ok(out)
}

fn stats_for_group(
    scenario_id: Option<String>,
    provider: String,
    model: String,
    profile_name: String,
    members: &[&StoredResult],
) -> GroupStats {
    let attempts = members.len() as u64;
    let successful: Vec<&StoredResult> = members
        .iter()
        .copied()
        .filter(|r| r.result.success)
        .collect();
    let successes = successful.len() as u64;

    let scored: Vec<_> = successful
        .iter()
        .filter_map(|r| r.result.evaluation.as_ref())
        .collect();

    let mut dimensions = DimensionMeans::default();
    if !scored.is_empty() {
        let n = scored.len() as f64;
        for e in &scored {
            dimensions.relevance += e.dimensions.relevance / n;
            dimensions.personalization += e.dimensions.personalization / n;
            dimensions.pedagogy += e.dimensions.pedagogy / n;
            dimensions.actionability += e.dimensions.actionability / n;
            dimensions.attunement += e.dimensions.attunement / n;
            dimensions.recognition += e.dimensions.recognition / n;
        }
    }

    let latencies: Vec<f64> = successful
        .iter()
        .filter_map(|r| r.result.metrics.latency_ms)
        .map(|v| v as f64)
        .collect();

    GroupStats {
        scenario_id,
        provider,
        model,
        profile_name,
        attempts,
        successes,
        success_rate: if attempts > 0 {
            successes as f64 / attempts as f64
        } else {
            0.0
        },
        avg_overall: mean(scored.iter().map(|e| e.overall_score)),
        avg_base: mean(scored.iter().filter_map(|e| e.base_score)),
        avg_recognition: mean(scored.iter().filter_map(|e| e.recognition_score)),
        dimensions,
        avg_latency_ms: mean(latencies.iter().copied()),
        total_input_tokens: successful
            .iter()
            .filter_map(|r| r.result.metrics.input_tokens)
            .sum(),
        total_output_tokens: successful
            .iter()
            .filter_map(|r| r.result.metrics.output_tokens)
            .sum(),
        required_pass_count: scored
            .iter()
            .filter(|e| e.validation.as_ref().is_some_and(|v| v.required_pass))
            .count() as u64,
        forbidden_pass_count: scored
            .iter()
            .filter(|e| e.validation.as_ref().is_some_and(|v| v.forbidden_pass))
            .count() as u64,
    }
}

/// Per-scenario mean-score comparison between exactly two profiles. Ties
/// are exact floating-point equality -- deterministic and auditable; near
/// ties will rarely show as exact.
pub fn compare_profiles(
    store: &Store,
    run_id: &str,
    profile_a: &str,
    profile_b: &str,
) -> anyhow::Result<ProfileComparison> {
    registry::require_run(store, run_id)?;
    let results = store.get_results(run_id, &ResultFilter::default())?;

    let mut per_scenario: BTreeMap<String, (Vec<f64>, Vec<f64>)> = BTreeMap::new();
    let mut all_a = Vec::new();
    let mut all_b = Vec::new();
    for r in &results {
        if !r.result.success {
            continue;
        }
        let Some(eval) = &r.result.evaluation else {
            continue;
        };
        let entry = per_scenario
            .entry(r.result.scenario_id.clone())
            .or_default();
        if r.result.profile_name == profile_a {
            entry.0.push(eval.overall_score);
            all_a.push(eval.overall_score);
        } else if r.result.profile_name == profile_b {
            entry.1.push(eval.overall_score);
            all_b.push(eval.overall_score);
        }
    }

    let mut scenarios = Vec::new();
    let (mut a_wins, mut b_wins, mut ties) = (0u64, 0u64, 0u64);
    for (scenario_id, (scores_a, scores_b)) in per_scenario {
        // Only scenarios both sides attempted are comparable
        let (Some(mean_a), Some(mean_b)) = (
            mean(scores_a.iter().copied()),
            mean(scores_b.iter().copied()),
        ) else {
            continue;
        };
        let winner = if mean_a == mean_b {
            ties += 1;
            Winner::Tie
        } else if mean_a > mean_b {
            a_wins += 1;
            Winner::ProfileA
        } else {
            b_wins += 1;
            Winner::ProfileB
        };
        scenarios.push(ScenarioComparison {
            scenario_id,
            mean_a,
            mean_b,
            diff: mean_a - mean_b,
            winner,
        });
    }

    Ok(ProfileComparison {
        run_id: run_id.to_string(),
        profile_a: profile_a.to_string(),
        profile_b: profile_b.to_string(),
        scenarios,
        a_wins,
        b_wins,
        ties,
        overall_mean_a: mean(all_a.iter().copied()),
        overall_mean_b: mean(all_b.iter().copied()),
    })
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let mut sum = 0.0;
    let mut n = 0u64;
    for v in values {
        sum += v;
        n += 1;
    }
    (n > 0).then(|| sum / n as f64)
}
