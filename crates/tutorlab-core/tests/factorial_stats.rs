mod common;

use common::*;
use tutorlab_core::analysis::factorial::{factorial_cells, ScoreColumn};
use tutorlab_core::analysis::{self, Winner};

#[test]
fn every_fully_tagged_row_lands_in_exactly_one_cell() -> anyhow::Result<()> {
    let store = open_store();
    let run = make_run(&store, 4, 2);

    store.store_result(
        &run.id,
        &scored_result("recog-multi", "s1", 90.0).factorial(true, true, false),
    )?;
    store.store_result(
        &run.id,
        &scored_result("recog-multi", "s2", 92.0).factorial(true, true, false),
    )?;
    store.store_result(
        &run.id,
        &scored_result("base", "s1", 78.0).factorial(false, false, false),
    )?;
    // Plain row: excluded from every cell
    store.store_result(&run.id, &scored_result("base", "s2", 99.0))?;
    // Failed factorial row: excluded too
    store.store_result(
        &run.id,
        &scored_result("base", "s3", 0.0).factorial(false, false, false).failed(),
    )?;

    let cells = factorial_cells(&store, &run.id, ScoreColumn::Overall)?;
    let total: usize = cells.values().map(Vec::len).sum();
    assert_eq!(total, 3);
    assert_eq!(
        cells.get("recog=on|multi=on|dyn=off"),
        Some(&vec![90.0, 92.0])
    );
    assert_eq!(cells.get("recog=off|multi=off|dyn=off"), Some(&vec![78.0]));
    Ok(())
}

#[test]
fn cells_honor_the_requested_score_column() -> anyhow::Result<()> {
    let store = open_store();
    let run = make_run(&store, 1, 1);
    store.store_result(
        &run.id,
        &scored_result("recog", "s1", 90.0).factorial(true, false, false),
    )?;

    // base_score is overall - 5 in the fixture
    let cells = factorial_cells(&store, &run.id, ScoreColumn::Base)?;
    assert_eq!(cells.get("recog=on|multi=off|dyn=off"), Some(&vec![85.0]));
    Ok(())
}

#[test]
fn single_pair_avg_matches_arithmetic_mean() -> anyhow::Result<()> {
    let store = open_store();
    let run = make_run(&store, 1, 1);
    store.store_result(&run.id, &scored_result("base", "s1", 70.0))?;
    store.store_result(&run.id, &scored_result("base", "s1", 80.0))?;
    store.store_result(&run.id, &scored_result("base", "s1", 0.0).failed())?;

    let stats = analysis::run_stats(&store, &run.id)?;
    assert_eq!(stats.len(), 1);
    let s = &stats[0];
    assert_eq!(s.attempts, 3);
    assert_eq!(s.successes, 2);
    assert!((s.success_rate - 2.0 / 3.0).abs() < 1e-12);
    assert_eq!(s.avg_overall, Some(75.0));
    assert_eq!(s.total_input_tokens, 1600);
    assert_eq!(s.total_output_tokens, 500);
    assert_eq!(s.required_pass_count, 2);
    // Dimension means come from the shared fixture scores
    assert!((s.dimensions.pedagogy - 4.5).abs() < 1e-9);
    Ok(())
}

#[test]
fn scenario_stats_split_by_scenario() -> anyhow::Result<()> {
    let store = open_store();
    let run = make_run(&store, 2, 1);
    store.store_result(&run.id, &scored_result("base", "s1", 70.0))?;
    store.store_result(&run.id, &scored_result("base", "s2", 90.0))?;

    let stats = analysis::scenario_stats(&store, &run.id)?;
    assert_eq!(stats.len(), 2);
    assert!(stats.iter().all(|s| s.scenario_id.is_some()));
    Ok(())
}

#[test]
fn comparison_is_symmetric() -> anyhow::Result<()> {
    let store = open_store();
    let run = make_run(&store, 3, 2);
    store.store_result(&run.id, &scored_result("base", "s1", 70.0))?;
    store.store_result(&run.id, &scored_result("recog", "s1", 80.0))?;
    store.store_result(&run.id, &scored_result("base", "s2", 90.0))?;
    store.store_result(&run.id, &scored_result("recog", "s2", 85.0))?;
    store.store_result(&run.id, &scored_result("base", "s3", 75.0))?;
    store.store_result(&run.id, &scored_result("recog", "s3", 75.0))?;

    let ab = analysis::compare_profiles(&store, &run.id, "base", "recog")?;
    let ba = analysis::compare_profiles(&store, &run.id, "recog", "base")?;

    assert_eq!(ab.a_wins, 1);
    assert_eq!(ab.b_wins, 1);
    assert_eq!(ab.ties, 1);
    assert_eq!(ab.a_wins, ba.b_wins);
    assert_eq!(ab.b_wins, ba.a_wins);
    assert_eq!(ab.ties, ba.ties);
    for (x, y) in ab.scenarios.iter().zip(ba.scenarios.iter()) {
        assert_eq!(x.scenario_id, y.scenario_id);
        assert_eq!(x.diff, -y.diff);
    }
    assert_eq!(ab.overall_mean_a, ba.overall_mean_b);
    Ok(())
}

#[test]
fn comparison_skips_one_sided_scenarios() -> anyhow::Result<()> {
    let store = open_store();
    let run = make_run(&store, 2, 2);
    store.store_result(&run.id, &scored_result("base", "s1", 70.0))?;
    store.store_result(&run.id, &scored_result("recog", "s1", 60.0))?;
    store.store_result(&run.id, &scored_result("base", "s2", 90.0))?;

    let cmp = analysis::compare_profiles(&store, &run.id, "base", "recog")?;
    assert_eq!(cmp.scenarios.len(), 1);
    assert_eq!(cmp.scenarios[0].winner, Winner::ProfileA);
    Ok(())
}
