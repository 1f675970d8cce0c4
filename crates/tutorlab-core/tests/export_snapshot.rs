mod common;

use common::*;
use tempfile::tempdir;
use tutorlab_core::report::{csv, json};

#[test]
fn json_snapshot_roundtrips_through_the_file() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let out = dir.path().join("snapshot.json");

    let store = open_store();
    let run = make_run(&store, 2, 2);
    store.store_result(&run.id, &scored_result("base", "s1", 72.0))?;
    store.store_result(
        &run.id,
        &scored_result("recog", "s1", 88.0).factorial(true, false, false),
    )?;
    store.store_result(&run.id, &scored_result("base", "s2", 0.0).failed())?;

    let snapshot = json::export_json(&store, &run.id, &out)?;
    assert_eq!(snapshot.results.len(), 3);

    let written: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&out)?)?;
    assert_eq!(written["schema_version"], 1);
    assert_eq!(written["run"]["id"], run.id.as_str());
    assert_eq!(written["results"].as_array().map(Vec::len), Some(3));
    assert_eq!(written["results"][1]["design"]["kind"], "factorial");
    // Failed attempt carries its error but no judge block
    assert_eq!(written["results"][2]["error"], "provider timeout");
    assert!(written["results"][2].get("evaluation").is_none());
    Ok(())
}

#[test]
fn csv_export_writes_header_plus_one_line_per_result() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let out = dir.path().join("results.csv");

    let store = open_store();
    let run = make_run(&store, 2, 1);
    store.store_result(&run.id, &scored_result("base", "s1", 72.0))?;
    store.store_result(&run.id, &scored_result("base", "s2", 81.0))?;

    let n = csv::export_csv(&store, &run.id, &out)?;
    assert_eq!(n, 2);

    let written = std::fs::read_to_string(&out)?;
    let lines: Vec<&str> = written.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].starts_with("result_id,run_id,"));
    assert!(lines[1].contains(&run.id));
    assert!(lines[1].contains("72"));
    Ok(())
}

#[test]
fn exports_reject_unknown_runs() {
    let dir = tempdir().unwrap();
    let store = open_store();

    let err = json::export_json(&store, "eval-2026-01-01-00000000", &dir.path().join("x.json"))
        .unwrap_err();
    assert!(err.to_string().contains("E_RUN_NOT_FOUND"));
    let err = csv::export_csv(&store, "eval-2026-01-01-00000000", &dir.path().join("x.csv"))
        .unwrap_err();
    assert!(err.to_string().contains("E_RUN_NOT_FOUND"));
}
