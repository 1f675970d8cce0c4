use super::exit_codes;
use crate::cli::args::{CellsArgs, CompareArgs, StatsArgs};
use tutorlab_core::analysis::{self, factorial};

pub fn cmd_stats(args: StatsArgs) -> anyhow::Result<i32> {
    let store = super::open_store(&args.db)?;
    let stats = if args.by_scenario {
        analysis::scenario_stats(&store, &args.run_id)?
    } else {
        analysis::run_stats(&store, &args.run_id)?
    };
    println!("{}", serde_json::to_string_pretty(&stats)?);
    Ok(exit_codes::OK)
}

pub fn cmd_compare(args: CompareArgs) -> anyhow::Result<i32> {
    let store = super::open_store(&args.db)?;
    let cmp = analysis::compare_profiles(&store, &args.run_id, &args.profile_a, &args.profile_b)?;
    println!("{}", serde_json::to_string_pretty(&cmp)?);
    Ok(exit_codes::OK)
}

pub fn cmd_cells(args: CellsArgs) -> anyhow::Result<i32> {
    let store = super::open_store(&args.db)?;
    let column = factorial::ScoreColumn::parse(&args.score)?;
    let cells = factorial::factorial_cells(&store, &args.run_id, column)?;
    println!("{}", serde_json::to_string_pretty(&cells)?);
    Ok(exit_codes::OK)
}
