use crate::model::{Design, StoredResult};
use crate::registry;
use crate::storage::{ResultFilter, Store};
use std::path::Path;

const HEADER: &str = "result_id,run_id,scenario_id,scenario_name,profile_name,provider,model,\
     ego_model,superego_model,success,latency_ms,input_tokens,output_tokens,cost_usd,\
     round_count,call_count,relevance,personalization,pedagogy,actionability,attunement,\
     recognition,overall_score,base_score,recognition_score,required_pass,forbidden_pass,\
     judge_model,uses_recognition,uses_multi_agent,uses_dynamic_learner,\
     learner_architecture,created_at";

/// Flat results table for spreadsheet/statistics tooling.
pub fn export_csv(store: &Store, run_id: &str, out: &Path) -> anyhow::Result<usize> {
    registry::require_run(store, run_id)?;
    let results = store.get_results(run_id, &ResultFilter::default())?;

    let mut buf = String::new();
    buf.push_str(HEADER);
    buf.push('\n');
    for r in &results {
        buf.push_str(&result_line(r));
        buf.push('\n');
    }
    std::fs::write(out, buf)?;
    Ok(results.len())
}

fn result_line(r: &StoredResult) -> String {
    let res = &r.result;
    let eval = res.evaluation.as_ref();
    let validation = eval.and_then(|e| e.validation.as_ref());
    let (recognition, multi_agent, dynamic_learner, architecture) = match &res.design {
        Design::Plain => (String::new(), String::new(), String::new(), String::new()),
        Design::Factorial {
            recognition,
            multi_agent,
            dynamic_learner,
            learner_architecture,
        } => (
            recognition.to_string(),
            multi_agent.to_string(),
            dynamic_learner.to_string(),
            learner_architecture.clone().unwrap_or_default(),
        ),
    };

    let fields: Vec<String> = vec![
        r.id.to_string(),
        r.run_id.clone(),
        res.scenario_id.clone(),
        res.scenario_name.clone(),
        res.profile_name.clone(),
        res.provider.clone(),
        res.model.clone(),
        res.ego_model.clone().unwrap_or_default(),
        res.superego_model.clone().unwrap_or_default(),
        res.success.to_string(),
        opt_num(res.metrics.latency_ms),
        opt_num(res.metrics.input_tokens),
        opt_num(res.metrics.output_tokens),
        opt_num(res.metrics.cost_usd),
        opt_num(res.metrics.round_count),
        opt_num(res.metrics.call_count),
        opt_num(eval.map(|e| e.dimensions.relevance)),
        opt_num(eval.map(|e| e.dimensions.personalization)),
        opt_num(eval.map(|e| e.dimensions.pedagogy)),
        opt_num(eval.map(|e| e.dimensions.actionability)),
        opt_num(eval.map(|e| e.dimensions.attunement)),
        opt_num(eval.map(|e| e.dimensions.recognition)),
        opt_num(eval.map(|e| e.overall_score)),
        opt_num(eval.and_then(|e| e.base_score)),
        opt_num(eval.and_then(|e| e.recognition_score)),
        validation.map(|v| v.required_pass.to_string()).unwrap_or_default(),
        validation.map(|v| v.forbidden_pass.to_string()).unwrap_or_default(),
        eval.map(|e| e.judge_model.clone()).unwrap_or_default(),
        recognition,
        multi_agent,
        dynamic_learner,
        architecture,
        r.created_at.clone(),
    ];

    fields
        .iter()
        .map(|f| escape(f))
        .collect::<Vec<_>>()
        .join(",")
}

fn opt_num<T: ToString>(v: Option<T>) -> String {
    v.map(|v| v.to_string()).unwrap_or_default()
}

fn escape(field: &str) -> String {
    if field.contains(|c| matches!(c, ',' | '"' | '\n' | '\r')) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
