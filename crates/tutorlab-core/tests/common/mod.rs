#![allow(dead_code)]

use tutorlab_core::model::*;
use tutorlab_core::registry::{self, NewRun};
use tutorlab_core::storage::Store;

pub fn open_store() -> Store {
    let store = Store::memory().unwrap();
    store.init_schema().unwrap();
    store
}

pub fn make_run(store: &Store, scenarios: u32, configs: u32) -> EvaluationRun {
    registry::create_run(
        store,
        NewRun {
            description: "factorial pilot".into(),
            expected_scenarios: scenarios,
            expected_configs: configs,
            metadata: serde_json::json!({"phase": "pilot"}),
            provenance: Provenance {
                git_commit: Some("abc123".into()),
                package_version: Some("0.6.0".into()),
            },
        },
    )
    .unwrap()
}

pub fn judged(score: f64, judge: &str) -> JudgeEvaluation {
    JudgeEvaluation {
        dimensions: DimensionScores {
            relevance: 4.0,
            personalization: 3.5,
            pedagogy: 4.5,
            actionability: 4.0,
            attunement: 3.0,
            recognition: 3.5,
        },
        overall_score: score,
        base_score: Some(score - 5.0),
        recognition_score: Some(score - 10.0),
        validation: Some(ValidationOutcome {
            required_pass: true,
            forbidden_pass: true,
            required_missing: vec![],
            forbidden_found: vec![],
        }),
        judge_model: judge.into(),
        reasoning: Some("solid scaffolding".into()),
    }
}

pub fn scored_result(profile: &str, scenario: &str, score: f64) -> EvaluationResult {
    EvaluationResult {
        scenario_id: scenario.into(),
        scenario_name: format!("Scenario {}", scenario),
        scenario_type: "single_turn".into(),
        profile_name: profile.into(),
        provider: "anthropic".into(),
        model: "haiku".into(),
        ego_model: None,
        superego_model: None,
        hyperparameters: serde_json::json!({"temperature": 0.7}),
        output_text: "Let's revisit derivatives.".into(),
        suggestions: vec![Suggestion {
            kind: "review".into(),
            title: "Revisit derivatives".into(),
            message: "Work two chain-rule examples.".into(),
            reason: Some("Missed both quiz questions on the topic.".into()),
            priority: Some("high".into()),
        }],
        metrics: PerfMetrics {
            latency_ms: Some(1200),
            input_tokens: Some(800),
            output_tokens: Some(250),
            cost_usd: Some(0.004),
            round_count: Some(1),
            call_count: Some(2),
        },
        evaluation: Some(judged(80.0, "judge-v1")),
        success: true,
        error: None,
        design: Design::Plain,
    }
    .with_score(score)
}

pub trait ResultExt {
    fn with_score(self, score: f64) -> Self;
    fn failed(self) -> Self;
    fn factorial(self, recognition: bool, multi_agent: bool, dynamic_learner: bool) -> Self;
}

impl ResultExt for EvaluationResult {
    fn with_score(mut self, score: f64) -> Self {
        if let Some(e) = self.evaluation.as_mut() {
            e.overall_score = score;
            e.base_score = Some(score - 5.0);
            e.recognition_score = Some(score - 10.0);
        }
        self
    }

    fn failed(mut self) -> Self {
        self.success = false;
        self.evaluation = None;
        self.error = Some("provider timeout".into());
        self
    }

    fn factorial(
        mut self,
        recognition: bool,
        multi_agent: bool,
        dynamic_learner: bool,
    ) -> Self {
        self.design = Design::Factorial {
            recognition,
            multi_agent,
            dynamic_learner,
            learner_architecture: Some(if dynamic_learner { "dynamic" } else { "scripted" }.into()),
        };
        self
    }
}
