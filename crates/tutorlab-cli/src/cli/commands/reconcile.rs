use super::exit_codes;
use crate::cli::args::ReconcileArgs;
use tutorlab_core::reconcile::{auto_complete_stale_runs, complete_run};

pub fn cmd_reconcile(args: ReconcileArgs) -> anyhow::Result<i32> {
    let store = super::open_store(&args.db)?;

    if let Some(run_id) = &args.run {
        let outcome = complete_run(&store, run_id)?;
        println!("{}", serde_json::to_string_pretty(&outcome)?);
        return Ok(exit_codes::OK);
    }

    let sweep = auto_complete_stale_runs(&store, args.older_than, args.dry_run)?;
    println!("{}", serde_json::to_string_pretty(&sweep)?);

    if args.dry_run && !sweep.candidates.is_empty() {
        // Non-zero so CI sweeps can alert on pending stale runs
        return Ok(exit_codes::STALE_FOUND);
    }
    Ok(exit_codes::OK)
}
