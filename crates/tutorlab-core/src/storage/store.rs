use crate::model::{EvaluationResult, EvaluationRun, JudgeEvaluation, StoredResult};
use crate::storage::rows;
use crate::storage::schema;
use anyhow::Context;
use rusqlite::{params, params_from_iter, Connection};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use std::sync::{Arc, Mutex};

/// Handle to the evaluation database. Cheap to clone; all callers share one
/// connection behind a mutex, so each operation is a short independent
/// write. Constructed explicitly and passed by reference -- there is no
/// global handle.
#[derive(Clone)]
pub struct Store {
    pub(crate) conn: Arc<Mutex<Connection>>,
}

/// Optional ANDed filters for `get_results`.
#[derive(Debug, Clone, Default)]
pub struct ResultFilter {
    pub scenario_id: Option<String>,
    pub provider: Option<String>,
    pub model: Option<String>,
    pub profile_name: Option<String>,
}

impl Store {
    pub fn open(path: &Path) -> anyhow::Result<Self> {
        let conn = Connection::open(path).context("failed to open sqlite db")?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.execute("PRAGMA foreign_keys = ON", [])?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn memory() -> anyhow::Result<Self> {
        let conn = Connection::open_in_memory().context("failed to open in-memory sqlite db")?;
        conn.execute("PRAGMA foreign_keys = ON", [])?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Applies every pending migration, in order, each in its own
    /// transaction with its version recorded in `schema_migrations`.
    pub fn init_schema(&self) -> anyhow::Result<()> {
        let mut conn = self.conn.lock().unwrap();
        conn.execute_batch(schema::MIGRATIONS_TABLE)?;

        let current: i64 = conn.query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
            [],
            |r| r.get(0),
        )?;

        for (version, sql) in schema::MIGRATIONS {
            if *version <= current {
                continue;
            }
            let tx = conn.transaction()?;
            tx.execute_batch(sql)
                .with_context(|| format!("schema migration v{} failed", version))?;
            tx.execute(
                "INSERT INTO schema_migrations(version, applied_at) VALUES (?1, ?2)",
                params![version, now_rfc3339()],
            )?;
            tx.commit()?;
            tracing::info!(event = "schema_migrated", version = *version);
        }
        Ok(())
    }

    pub fn schema_version(&self) -> anyhow::Result<i64> {
        let conn = self.conn.lock().unwrap();
        let v = conn.query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
            [],
            |r| r.get(0),
        )?;
        Ok(v)
    }

    /// Always an insert: the store is append-only for results. At-most-once
    /// per (profile, scenario) is the caller's job, via the resumption
    /// planner; duplicate inserts read back as additional replications.
    pub fn store_result(&self, run_id: &str, result: &EvaluationResult) -> anyhow::Result<i64> {
        let conn = self.conn.lock().unwrap();
        if !run_exists(&conn, run_id)? {
            anyhow::bail!("E_RUN_NOT_FOUND: no run with id {}", run_id);
        }
        let values = rows::result_values(run_id, &now_rfc3339(), result)?;
        conn.execute(rows::INSERT_RESULT_SQL, params_from_iter(values))?;
        Ok(conn.last_insert_rowid())
    }

    pub fn get_result(&self, result_id: i64) -> anyhow::Result<Option<StoredResult>> {
        let conn = self.conn.lock().unwrap();
        let sql = format!(
            "SELECT {} FROM evaluation_results WHERE id = ?1",
            rows::RESULT_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let mut found = stmt.query_map(params![result_id], rows::result_from_row)?;
        match found.next() {
            Some(r) => Ok(Some(r?)),
            None => Ok(None),
        }
    }

    pub fn get_results(
        &self,
        run_id: &str,
        filter: &ResultFilter,
    ) -> anyhow::Result<Vec<StoredResult>> {
        let conn = self.conn.lock().unwrap();
        let mut sql = format!(
            "SELECT {} FROM evaluation_results WHERE run_id = ?1",
            rows::RESULT_COLUMNS
        );
        let mut values: Vec<rusqlite::types::Value> =
            vec![rusqlite::types::Value::Text(run_id.to_string())];

        for (column, value) in [
            ("scenario_id", &filter.scenario_id),
            ("provider", &filter.provider),
            ("model", &filter.model),
            ("profile_name", &filter.profile_name),
        ] {
            if let Some(v) = value {
                sql.push_str(&format!(" AND {} = ?{}", column, values.len() + 1));
                values.push(rusqlite::types::Value::Text(v.clone()));
            }
        }
        sql.push_str(" ORDER BY id ASC");

        let mut stmt = conn.prepare(&sql)?;
        let mapped = stmt.query_map(params_from_iter(values), rows::result_from_row)?;
        let mut results = Vec::new();
        for r in mapped {
            results.push(r?);
        }
        Ok(results)
    }

    /// Rejudge primitive: overwrites the score columns, validation fields
    /// and judge identity in place; generation output is never touched.
    /// Duplicate-rejudge detection is the caller's responsibility -- the
    /// store happily overwrites with whatever judge identity it is handed.
    pub fn update_result_scores(
        &self,
        result_id: i64,
        evaluation: &JudgeEvaluation,
    ) -> anyhow::Result<()> {
        let conn = self.conn.lock().unwrap();
        let mut values = rows::score_values(Some(evaluation))?;
        values.push(rusqlite::types::Value::Integer(result_id));
        let changed = conn.execute(rows::UPDATE_SCORES_SQL, params_from_iter(values))?;
        if changed == 0 {
            anyhow::bail!("E_RESULT_NOT_FOUND: no result with id {}", result_id);
        }
        tracing::info!(event = "result_rescored", result_id = result_id, judge = %evaluation.judge_model);
        Ok(())
    }

    /// Administrative purge: deletes the run and every result it owns, in
    /// one transaction.
    pub fn delete_run(&self, run_id: &str) -> anyhow::Result<u64> {
        let mut conn = self.conn.lock().unwrap();
        if !run_exists(&conn, run_id)? {
            anyhow::bail!("E_RUN_NOT_FOUND: no run with id {}", run_id);
        }
        let tx = conn.transaction()?;
        let results = tx.execute(
            "DELETE FROM evaluation_results WHERE run_id = ?1",
            params![run_id],
        )?;
        tx.execute("DELETE FROM evaluation_runs WHERE id = ?1", params![run_id])?;
        tx.commit()?;
        tracing::warn!(event = "run_purged", run_id = %run_id, results = results);
        Ok(results as u64)
    }

    pub fn count_results(&self, run_id: &str) -> anyhow::Result<u64> {
        let conn = self.conn.lock().unwrap();
        let n: i64 = conn.query_row(
            "SELECT COUNT(*) FROM evaluation_results WHERE run_id = ?1",
            params![run_id],
            |r| r.get(0),
        )?;
        Ok(n as u64)
    }

    /// Timestamp of the most recent stored result, used by reconciliation as
    /// the historically accurate completion time.
    pub fn latest_result_at(&self, run_id: &str) -> anyhow::Result<Option<String>> {
        let conn = self.conn.lock().unwrap();
        let ts = conn.query_row(
            "SELECT MAX(created_at) FROM evaluation_results WHERE run_id = ?1",
            params![run_id],
            |r| r.get(0),
        )?;
        Ok(ts)
    }

    pub fn results_per_profile(&self, run_id: &str) -> anyhow::Result<BTreeMap<String, u64>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT profile_name, COUNT(*) FROM evaluation_results
             WHERE run_id = ?1 GROUP BY profile_name",
        )?;
        let mapped = stmt.query_map(params![run_id], |r| {
            Ok((r.get::<_, String>(0)?, r.get::<_, i64>(1)?))
        })?;
        let mut out = BTreeMap::new();
        for row in mapped {
            let (profile, n) = row?;
            out.insert(profile, n as u64);
        }
        Ok(out)
    }

    /// Distinct `"profile:scenario"` keys with at least one stored attempt,
    /// successful or not. The planner treats any stored attempt as done.
    pub fn attempted_pairs(&self, run_id: &str) -> anyhow::Result<HashSet<String>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT DISTINCT profile_name, scenario_id FROM evaluation_results
             WHERE run_id = ?1",
        )?;
        let mapped = stmt.query_map(params![run_id], |r| {
            Ok(format!(
                "{}:{}",
                r.get::<_, String>(0)?,
                r.get::<_, String>(1)?
            ))
        })?;
        let mut pairs = HashSet::new();
        for p in mapped {
            pairs.insert(p?);
        }
        Ok(pairs)
    }

    pub(crate) fn insert_run_row(&self, run: &EvaluationRun) -> anyhow::Result<()> {
        let conn = self.conn.lock().unwrap();
        let values = rows::run_values(run)?;
        conn.execute(
            "INSERT INTO evaluation_runs (id, description, expected_scenarios, \
             expected_configs, total_tests, status, created_at, completed_at, \
             metadata_json, git_commit, package_version) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params_from_iter(values),
        )?;
        Ok(())
    }
}

pub(crate) fn run_exists(conn: &Connection, run_id: &str) -> anyhow::Result<bool> {
    let n: i64 = conn.query_row(
        "SELECT COUNT(*) FROM evaluation_runs WHERE id = ?1",
        params![run_id],
        |r| r.get(0),
    )?;
    Ok(n > 0)
}

pub(crate) fn now_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339()
}
