use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Running,
    Completed,
    Failed,
}

impl RunStatus {
    /// Strict parse for user-supplied input. An unknown status must fail
    /// loudly, never silently filter on the wrong one.
    pub fn from_str(s: &str) -> anyhow::Result<Self> {
        match s {
            "running" => Ok(RunStatus::Running),
            "completed" => Ok(RunStatus::Completed),
            "failed" => Ok(RunStatus::Failed),
            other => anyhow::bail!(
                "E_BAD_STATUS: {:?} (expected running, completed or failed)",
                other
            ),
        }
    }

    /// Lenient parse for database reads only: a row written by a newer or
    /// corrupted schema reads back as `Failed` rather than poisoning every
    /// query that touches it.
    pub fn parse(s: &str) -> Self {
        Self::from_str(s).unwrap_or(RunStatus::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Running => "running",
            RunStatus::Completed => "completed",
            RunStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, RunStatus::Running)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Provenance {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub git_commit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub package_version: Option<String>,
}

/// One experiment execution. `total_tests` is the actual completed count and
/// is only meaningful after completion or reconciliation; the planning figure
/// is `expected_tests()`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationRun {
    pub id: String,
    pub description: String,
    pub expected_scenarios: u32,
    pub expected_configs: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_tests: Option<u32>,
    pub status: RunStatus,
    pub created_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<String>,
    #[serde(default)]
    pub metadata: serde_json::Value,
    #[serde(default, skip_serializing_if = "is_default_provenance")]
    pub provenance: Provenance,
}

fn is_default_provenance(p: &Provenance) -> bool {
    p == &Provenance::default()
}

impl EvaluationRun {
    /// Planning figure only; never enforced against stored results. Widened
    /// so a large scenario x config matrix cannot overflow the product.
    pub fn expected_tests(&self) -> u64 {
        self.expected_scenarios as u64 * self.expected_configs as u64
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Suggestion {
    pub kind: String,
    pub title: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PerfMetrics {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_tokens: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_tokens: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost_usd: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub round_count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub call_count: Option<u32>,
}

/// The six rubric dimensions, each 1-5.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DimensionScores {
    pub relevance: f64,
    pub personalization: f64,
    pub pedagogy: f64,
    pub actionability: f64,
    pub attunement: f64,
    pub recognition: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ValidationOutcome {
    pub required_pass: bool,
    pub forbidden_pass: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required_missing: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub forbidden_found: Vec<String>,
}

/// Output of the judging collaborator. Derived scores are supplied by the
/// judge, never recomputed by the store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JudgeEvaluation {
    pub dimensions: DimensionScores,
    /// 0-100.
    pub overall_score: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recognition_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation: Option<ValidationOutcome>,
    pub judge_model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
}

/// Whether a result participates in the factorial design. A result carries
/// either the full factor block or none of it; half-tagged rows are
/// unrepresentable here and map to `Plain` when read back from storage.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Design {
    Plain,
    Factorial {
        recognition: bool,
        multi_agent: bool,
        dynamic_learner: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        learner_architecture: Option<String>,
    },
}

impl Default for Design {
    fn default() -> Self {
        Design::Plain
    }
}

/// One scored attempt at (profile, scenario) within a run. Logically
/// identified by that triple plus the run id, but never unique at the
/// storage level: replications are additional rows.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EvaluationResult {
    pub scenario_id: String,
    pub scenario_name: String,
    #[serde(default)]
    pub scenario_type: String,
    pub profile_name: String,
    pub provider: String,
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ego_model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub superego_model: Option<String>,
    #[serde(default)]
    pub hyperparameters: serde_json::Value,
    #[serde(default)]
    pub output_text: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<Suggestion>,
    #[serde(default)]
    pub metrics: PerfMetrics,
    /// None when generation failed before judging.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evaluation: Option<JudgeEvaluation>,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default)]
    pub design: Design,
}

/// A persisted result: the surrogate id and timestamps the store generates,
/// wrapped around the caller-supplied payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredResult {
    pub id: i64,
    pub run_id: String,
    pub created_at: String,
    #[serde(flatten)]
    pub result: EvaluationResult,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_parse_roundtrip() {
        for s in [RunStatus::Running, RunStatus::Completed, RunStatus::Failed] {
            assert_eq!(RunStatus::parse(s.as_str()), s);
        }
        assert_eq!(RunStatus::parse("garbage"), RunStatus::Failed);
    }

    #[test]
    fn strict_status_parse_rejects_typos() {
        let err = RunStatus::from_str("runnning").unwrap_err();
        assert!(err.to_string().contains("E_BAD_STATUS"));
        assert_eq!(RunStatus::from_str("running").unwrap(), RunStatus::Running);
    }

    #[test]
    fn expected_tests_survives_huge_matrices() {
        let run = EvaluationRun {
            id: "eval-2026-01-01-00000000".into(),
            description: String::new(),
            expected_scenarios: u32::MAX,
            expected_configs: u32::MAX,
            total_tests: None,
            status: RunStatus::Running,
            created_at: "2026-01-01T00:00:00Z".into(),
            completed_at: None,
            metadata: serde_json::Value::Null,
            provenance: Provenance::default(),
        };
        assert_eq!(run.expected_tests(), u32::MAX as u64 * u32::MAX as u64);
    }

    #[test]
    fn design_serializes_tagged() {
        let d = Design::Factorial {
            recognition: true,
            multi_agent: false,
            dynamic_learner: true,
            learner_architecture: Some("dynamic".into()),
        };
        let v = serde_json::to_value(&d).unwrap();
        assert_eq!(v["kind"], "factorial");
        assert_eq!(v["recognition"], true);
    }
}
