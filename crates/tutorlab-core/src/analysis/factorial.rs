//! Factorial cell extraction. A cell is one combination of the three
//! boolean factors; only successful results carrying the full factor block
//! and a value in the requested score column contribute.

use crate::model::{Design, JudgeEvaluation};
use crate::registry;
use crate::storage::{ResultFilter, Store};
use std::collections::BTreeMap;

/// Allow-list of score columns exposed to analysis. Anything else is a hard
/// error: a typo'd column must fail loudly, not silently measure the wrong
/// thing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScoreColumn {
    #[default]
    Overall,
    Base,
    Recognition,
}

impl ScoreColumn {
    pub fn parse(s: &str) -> anyhow::Result<Self> {
        match s {
            "overall_score" => Ok(ScoreColumn::Overall),
            "base_score" => Ok(ScoreColumn::Base),
            "recognition_score" => Ok(ScoreColumn::Recognition),
            other => anyhow::bail!(
                "E_BAD_SCORE_COLUMN: {:?} (expected overall_score, base_score or recognition_score)",
                other
            ),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ScoreColumn::Overall => "overall_score",
            ScoreColumn::Base => "base_score",
            ScoreColumn::Recognition => "recognition_score",
        }
    }

    fn extract(&self, e: &JudgeEvaluation) -> Option<f64> {
        match self {
            ScoreColumn::Overall => Some(e.overall_score),
            ScoreColumn::Base => e.base_score,
            ScoreColumn::Recognition => e.recognition_score,
        }
    }
}

pub fn cell_key(recognition: bool, multi_agent: bool, dynamic_learner: bool) -> String {
    let onoff = |b: bool| if b { "on" } else { "off" };
    format!(
        "recog={}|multi={}|dyn={}",
        onoff(recognition),
        onoff(multi_agent),
        onoff(dynamic_learner)
    )
}

/// Groups the chosen score by factor-cell key, ready for variance
/// decomposition downstream. Plain (non-factorial) results are excluded by
/// construction: they carry no factor block to group on.
pub fn factorial_cells(
    store: &Store,
    run_id: &str,
    column: ScoreColumn,
) -> anyhow::Result<BTreeMap<String, Vec<f64>>> {
    registry::require_run(store, run_id)?;
    let results = store.get_results(run_id, &ResultFilter::default())?;

    let mut cells: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    for r in &results {
        if !r.result.success {
            continue;
        }
        let Design::Factorial {
            recognition,
            multi_agent,
            dynamic_learner,
            ..
        } = &r.result.design
        else {
            continue;
        };
        let Some(score) = r
            .result
            .evaluation
            .as_ref()
            .and_then(|e| column.extract(e))
        else {
            continue;
        };
        cells
            .entry(cell_key(*recognition, *multi_agent, *dynamic_learner))
            .or_default()
            .push(score);
    }
    Ok(cells)
}
