//! Versioned, forward-only schema migrations. Each step runs at most once,
//! tracked in `schema_migrations`; columns are only ever added, never
//! dropped or rewritten.

pub const MIGRATIONS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS schema_migrations (
  version INTEGER PRIMARY KEY,
  applied_at TEXT NOT NULL
);
"#;

const V1_BASE: &str = r#"
CREATE TABLE IF NOT EXISTS evaluation_runs (
  id TEXT PRIMARY KEY,
  description TEXT NOT NULL,
  expected_scenarios INTEGER NOT NULL,
  expected_configs INTEGER NOT NULL,
  total_tests INTEGER,
  status TEXT NOT NULL,
  created_at TEXT NOT NULL,
  completed_at TEXT,
  metadata_json TEXT
);

CREATE TABLE IF NOT EXISTS evaluation_results (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  run_id TEXT NOT NULL REFERENCES evaluation_runs(id),
  scenario_id TEXT NOT NULL,
  scenario_name TEXT NOT NULL,
  scenario_type TEXT,
  profile_name TEXT NOT NULL,
  provider TEXT NOT NULL,
  model TEXT NOT NULL,
  hyperparameters_json TEXT,
  output_text TEXT,
  suggestions_json TEXT,
  latency_ms INTEGER,
  input_tokens INTEGER,
  output_tokens INTEGER,
  cost_usd REAL,
  round_count INTEGER,
  call_count INTEGER,
  relevance REAL,
  personalization REAL,
  pedagogy REAL,
  actionability REAL,
  attunement REAL,
  recognition REAL,
  overall_score REAL,
  required_pass INTEGER,
  forbidden_pass INTEGER,
  required_missing_json TEXT,
  forbidden_found_json TEXT,
  judge_model TEXT,
  judge_reasoning TEXT,
  success INTEGER NOT NULL,
  error TEXT,
  created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_results_run ON evaluation_results(run_id);
"#;

// Factorial design support: three factor tags, the learner-architecture
// label, and the two derived sub-scores the judge reports alongside
// overall_score.
const V2_FACTORIAL: &str = r#"
ALTER TABLE evaluation_results ADD COLUMN uses_recognition INTEGER;
ALTER TABLE evaluation_results ADD COLUMN uses_multi_agent INTEGER;
ALTER TABLE evaluation_results ADD COLUMN uses_dynamic_learner INTEGER;
ALTER TABLE evaluation_results ADD COLUMN learner_architecture TEXT;
ALTER TABLE evaluation_results ADD COLUMN base_score REAL;
ALTER TABLE evaluation_results ADD COLUMN recognition_score REAL;
"#;

// Dual-agent configurations and run provenance.
const V3_DUAL_AGENT: &str = r#"
ALTER TABLE evaluation_results ADD COLUMN ego_model TEXT;
ALTER TABLE evaluation_results ADD COLUMN superego_model TEXT;
ALTER TABLE evaluation_runs ADD COLUMN git_commit TEXT;
ALTER TABLE evaluation_runs ADD COLUMN package_version TEXT;
CREATE INDEX IF NOT EXISTS idx_results_run_profile ON evaluation_results(run_id, profile_name);
"#;

pub const MIGRATIONS: &[(i64, &str)] = &[(1, V1_BASE), (2, V2_FACTORIAL), (3, V3_DUAL_AGENT)];
