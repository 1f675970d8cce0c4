//! Single row<->struct mapping pair per entity. Every read goes through
//! `run_from_row`/`result_from_row` and every write through the matching
//! `*_values` builder, so the column order lives in exactly one place.

use crate::model::{
    Design, DimensionScores, EvaluationResult, EvaluationRun, JudgeEvaluation, PerfMetrics,
    Provenance, RunStatus, StoredResult, Suggestion, ValidationOutcome,
};
use rusqlite::types::Value;
use rusqlite::Row;

pub const RUN_COLUMNS: &str = "id, description, expected_scenarios, expected_configs, \
     total_tests, status, created_at, completed_at, metadata_json, git_commit, package_version";

pub const RESULT_COLUMNS: &str = "id, run_id, scenario_id, scenario_name, scenario_type, \
     profile_name, provider, model, ego_model, superego_model, hyperparameters_json, \
     output_text, suggestions_json, latency_ms, input_tokens, output_tokens, cost_usd, \
     round_count, call_count, relevance, personalization, pedagogy, actionability, \
     attunement, recognition, overall_score, base_score, recognition_score, required_pass, \
     forbidden_pass, required_missing_json, forbidden_found_json, judge_model, \
     judge_reasoning, success, error, uses_recognition, uses_multi_agent, \
     uses_dynamic_learner, learner_architecture, created_at";

pub const INSERT_RESULT_SQL: &str = "INSERT INTO evaluation_results (\
     run_id, scenario_id, scenario_name, scenario_type, profile_name, provider, model, \
     ego_model, superego_model, hyperparameters_json, output_text, suggestions_json, \
     latency_ms, input_tokens, output_tokens, cost_usd, round_count, call_count, \
     relevance, personalization, pedagogy, actionability, attunement, recognition, \
     overall_score, base_score, recognition_score, required_pass, forbidden_pass, \
     required_missing_json, forbidden_found_json, judge_model, judge_reasoning, \
     success, error, uses_recognition, uses_multi_agent, uses_dynamic_learner, \
     learner_architecture, created_at) VALUES (\
     ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, \
     ?19, ?20, ?21, ?22, ?23, ?24, ?25, ?26, ?27, ?28, ?29, ?30, ?31, ?32, ?33, ?34, \
     ?35, ?36, ?37, ?38, ?39, ?40)";

pub const UPDATE_SCORES_SQL: &str = "UPDATE evaluation_results SET \
     relevance=?1, personalization=?2, pedagogy=?3, actionability=?4, attunement=?5, \
     recognition=?6, overall_score=?7, base_score=?8, recognition_score=?9, \
     required_pass=?10, forbidden_pass=?11, required_missing_json=?12, \
     forbidden_found_json=?13, judge_model=?14, judge_reasoning=?15 WHERE id=?16";

pub fn run_from_row(row: &Row<'_>) -> rusqlite::Result<EvaluationRun> {
    let metadata: Option<String> = row.get(8)?;
    Ok(EvaluationRun {
        id: row.get(0)?,
        description: row.get(1)?,
        expected_scenarios: row.get(2)?,
        expected_configs: row.get(3)?,
        total_tests: row.get(4)?,
        status: RunStatus::parse(&row.get::<_, String>(5)?),
        created_at: row.get(6)?,
        completed_at: row.get(7)?,
        metadata: metadata
            .and_then(|s| serde_json::from_str(&s).ok())
            .unwrap_or(serde_json::Value::Null),
        provenance: Provenance {
            git_commit: row.get(9)?,
            package_version: row.get(10)?,
        },
    })
}

pub fn run_values(run: &EvaluationRun) -> anyhow::Result<Vec<Value>> {
    Ok(vec![
        Value::Text(run.id.clone()),
        Value::Text(run.description.clone()),
        Value::Integer(run.expected_scenarios as i64),
        Value::Integer(run.expected_configs as i64),
        opt_int(run.total_tests.map(|v| v as i64)),
        Value::Text(run.status.as_str().to_string()),
        Value::Text(run.created_at.clone()),
        opt_text(run.completed_at.as_deref()),
        Value::Text(serde_json::to_string(&run.metadata)?),
        opt_text(run.provenance.git_commit.as_deref()),
        opt_text(run.provenance.package_version.as_deref()),
    ])
}

pub fn result_from_row(row: &Row<'_>) -> rusqlite::Result<StoredResult> {
    let suggestions: Option<String> = row.get(12)?;
    let hyperparameters: Option<String> = row.get(10)?;

    // Judge block exists iff the judge identity was recorded
    let judge_model: Option<String> = row.get(32)?;
    let evaluation = match judge_model {
        Some(judge_model) => {
            let required_pass: Option<bool> = row.get(28)?;
            let forbidden_pass: Option<bool> = row.get(29)?;
            let validation = match (required_pass, forbidden_pass) {
                (None, None) => None,
                (req, forb) => Some(ValidationOutcome {
                    required_pass: req.unwrap_or(false),
                    forbidden_pass: forb.unwrap_or(false),
                    required_missing: json_list(row.get(30)?),
                    forbidden_found: json_list(row.get(31)?),
                }),
            };
            Some(JudgeEvaluation {
                dimensions: DimensionScores {
                    relevance: row.get::<_, Option<f64>>(19)?.unwrap_or(0.0),
                    personalization: row.get::<_, Option<f64>>(20)?.unwrap_or(0.0),
                    pedagogy: row.get::<_, Option<f64>>(21)?.unwrap_or(0.0),
                    actionability: row.get::<_, Option<f64>>(22)?.unwrap_or(0.0),
                    attunement: row.get::<_, Option<f64>>(23)?.unwrap_or(0.0),
                    recognition: row.get::<_, Option<f64>>(24)?.unwrap_or(0.0),
                },
                overall_score: row.get::<_, Option<f64>>(25)?.unwrap_or(0.0),
                base_score: row.get(26)?,
                recognition_score: row.get(27)?,
                validation,
                judge_model,
                reasoning: row.get(33)?,
            })
        }
        None => None,
    };

    // A row participates in the factorial design only with the full tag
    // block; anything else reads back as Plain.
    let recognition: Option<bool> = row.get(36)?;
    let multi_agent: Option<bool> = row.get(37)?;
    let dynamic_learner: Option<bool> = row.get(38)?;
    let design = match (recognition, multi_agent, dynamic_learner) {
        (Some(recognition), Some(multi_agent), Some(dynamic_learner)) => Design::Factorial {
            recognition,
            multi_agent,
            dynamic_learner,
            learner_architecture: row.get(39)?,
        },
        _ => Design::Plain,
    };

    Ok(StoredResult {
        id: row.get(0)?,
        run_id: row.get(1)?,
        created_at: row.get(40)?,
        result: EvaluationResult {
            scenario_id: row.get(2)?,
            scenario_name: row.get(3)?,
            scenario_type: row.get::<_, Option<String>>(4)?.unwrap_or_default(),
            profile_name: row.get(5)?,
            provider: row.get(6)?,
            model: row.get(7)?,
            ego_model: row.get(8)?,
            superego_model: row.get(9)?,
            hyperparameters: hyperparameters
                .and_then(|s| serde_json::from_str(&s).ok())
                .unwrap_or(serde_json::Value::Null),
            output_text: row.get::<_, Option<String>>(11)?.unwrap_or_default(),
            suggestions: suggestions
                .and_then(|s| serde_json::from_str::<Vec<Suggestion>>(&s).ok())
                .unwrap_or_default(),
            metrics: PerfMetrics {
                latency_ms: row.get::<_, Option<i64>>(13)?.map(|v| v as u64),
                input_tokens: row.get::<_, Option<i64>>(14)?.map(|v| v as u64),
                output_tokens: row.get::<_, Option<i64>>(15)?.map(|v| v as u64),
                cost_usd: row.get(16)?,
                round_count: row.get::<_, Option<i64>>(17)?.map(|v| v as u32),
                call_count: row.get::<_, Option<i64>>(18)?.map(|v| v as u32),
            },
            evaluation,
            success: row.get(34)?,
            error: row.get(35)?,
            design,
        },
    })
}

pub fn result_values(
    run_id: &str,
    created_at: &str,
    r: &EvaluationResult,
) -> anyhow::Result<Vec<Value>> {
    let (recognition, multi_agent, dynamic_learner, learner_architecture) = match &r.design {
        Design::Plain => (Value::Null, Value::Null, Value::Null, Value::Null),
        Design::Factorial {
            recognition,
            multi_agent,
            dynamic_learner,
            learner_architecture,
        } => (
            Value::Integer(*recognition as i64),
            Value::Integer(*multi_agent as i64),
            Value::Integer(*dynamic_learner as i64),
            opt_text(learner_architecture.as_deref()),
        ),
    };

    let mut values = vec![
        Value::Text(run_id.to_string()),
        Value::Text(r.scenario_id.clone()),
        Value::Text(r.scenario_name.clone()),
        Value::Text(r.scenario_type.clone()),
        Value::Text(r.profile_name.clone()),
        Value::Text(r.provider.clone()),
        Value::Text(r.model.clone()),
        opt_text(r.ego_model.as_deref()),
        opt_text(r.superego_model.as_deref()),
        Value::Text(serde_json::to_string(&r.hyperparameters)?),
        Value::Text(r.output_text.clone()),
        Value::Text(serde_json::to_string(&r.suggestions)?),
        opt_int(r.metrics.latency_ms.map(|v| v as i64)),
        opt_int(r.metrics.input_tokens.map(|v| v as i64)),
        opt_int(r.metrics.output_tokens.map(|v| v as i64)),
        opt_real(r.metrics.cost_usd),
        opt_int(r.metrics.round_count.map(|v| v as i64)),
        opt_int(r.metrics.call_count.map(|v| v as i64)),
    ];
    values.extend(score_values(r.evaluation.as_ref())?);
    values.push(Value::Integer(r.success as i64));
    values.push(opt_text(r.error.as_deref()));
    values.push(recognition);
    values.push(multi_agent);
    values.push(dynamic_learner);
    values.push(learner_architecture);
    values.push(Value::Text(created_at.to_string()));
    Ok(values)
}

/// The 15 score-related values, in `UPDATE_SCORES_SQL` order. Shared by the
/// initial insert and the rejudge update so both write the same columns.
pub fn score_values(eval: Option<&JudgeEvaluation>) -> anyhow::Result<Vec<Value>> {
    let Some(e) = eval else {
        return Ok(vec![Value::Null; 15]);
    };
    let d = &e.dimensions;
    let (required_pass, forbidden_pass, required_missing, forbidden_found) = match &e.validation {
        Some(v) => (
            Value::Integer(v.required_pass as i64),
            Value::Integer(v.forbidden_pass as i64),
            Value::Text(serde_json::to_string(&v.required_missing)?),
            Value::Text(serde_json::to_string(&v.forbidden_found)?),
        ),
        None => (Value::Null, Value::Null, Value::Null, Value::Null),
    };
    Ok(vec![
        Value::Real(d.relevance),
        Value::Real(d.personalization),
        Value::Real(d.pedagogy),
        Value::Real(d.actionability),
        Value::Real(d.attunement),
        Value::Real(d.recognition),
        Value::Real(e.overall_score),
        opt_real(e.base_score),
        opt_real(e.recognition_score),
        required_pass,
        forbidden_pass,
        required_missing,
        forbidden_found,
        Value::Text(e.judge_model.clone()),
        opt_text(e.reasoning.as_deref()),
    ])
}

fn json_list(s: Option<String>) -> Vec<String> {
    s.and_then(|s| serde_json::from_str(&s).ok())
        .unwrap_or_default()
}

fn opt_text(s: Option<&str>) -> Value {
    match s {
        Some(s) => Value::Text(s.to_string()),
        None => Value::Null,
    }
}

fn opt_int(v: Option<i64>) -> Value {
    match v {
        Some(v) => Value::Integer(v),
        None => Value::Null,
    }
}

fn opt_real(v: Option<f64>) -> Value {
    match v {
        Some(v) => Value::Real(v),
        None => Value::Null,
    }
}
