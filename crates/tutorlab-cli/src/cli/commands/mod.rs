use super::args::*;
use anyhow::Context;
use tutorlab_core::model::RunStatus;
use tutorlab_core::registry;
use tutorlab_core::storage::{ResultFilter, Store};

pub mod export;
pub mod reconcile;
pub mod stats;

pub mod exit_codes {
    pub const OK: i32 = 0;
    pub const STALE_FOUND: i32 = 1;
    pub const CONFIG_ERROR: i32 = 2;
}

pub fn dispatch(cli: Cli) -> anyhow::Result<i32> {
    match cli.cmd {
        Command::Init(args) => cmd_init(args),
        Command::Runs(args) => cmd_runs(args),
        Command::Show(args) => cmd_show(args),
        Command::Results(args) => cmd_results(args),
        Command::Resume(args) => cmd_resume(args),
        Command::Reconcile(args) => reconcile::cmd_reconcile(args),
        Command::Stats(args) => stats::cmd_stats(args),
        Command::Compare(args) => stats::cmd_compare(args),
        Command::Cells(args) => stats::cmd_cells(args),
        Command::Export(args) => export::cmd_export(args),
        Command::Purge(args) => cmd_purge(args),
        Command::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            Ok(exit_codes::OK)
        }
    }
}

pub(crate) fn open_store(db: &std::path::Path) -> anyhow::Result<Store> {
    if let Some(parent) = db.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
    }
    let store = Store::open(db)?;
    store.init_schema()?;
    tracing::debug!(event = "db_opened", db = %db.display());
    Ok(store)
}

fn cmd_init(args: DbArgs) -> anyhow::Result<i32> {
    let store = open_store(&args.db)?;
    println!(
        "initialized {} (schema v{})",
        args.db.display(),
        store.schema_version()?
    );
    Ok(exit_codes::OK)
}

fn cmd_runs(args: RunsArgs) -> anyhow::Result<i32> {
    let store = open_store(&args.db)?;
    let status = args.status.as_deref().map(RunStatus::from_str).transpose()?;
    let summaries = registry::list_runs(&store, status, Some(args.limit))?;

    if args.format == "json" {
        println!("{}", serde_json::to_string_pretty(&summaries)?);
        return Ok(exit_codes::OK);
    }

    if summaries.is_empty() {
        println!("no runs");
        return Ok(exit_codes::OK);
    }
    for s in &summaries {
        println!(
            "{}  {:<9}  {:>5.1}%  {}/{} tests  avg={}  {}",
            s.run.id,
            s.run.status.as_str(),
            s.progress_pct,
            s.completed_tests,
            s.run.expected_tests(),
            s.avg_score
                .map(|v| format!("{:.1}", v))
                .unwrap_or_else(|| "-".into()),
            s.run.description,
        );
    }
    Ok(exit_codes::OK)
}

fn cmd_show(args: ShowArgs) -> anyhow::Result<i32> {
    let store = open_store(&args.db)?;
    let run = registry::require_run(&store, &args.run_id)?;
    println!("{}", serde_json::to_string_pretty(&run)?);
    Ok(exit_codes::OK)
}

fn cmd_results(args: ResultsArgs) -> anyhow::Result<i32> {
    let store = open_store(&args.db)?;
    registry::require_run(&store, &args.run_id)?;
    let results = store.get_results(
        &args.run_id,
        &ResultFilter {
            scenario_id: args.scenario,
            provider: args.provider,
            model: args.model,
            profile_name: args.profile,
        },
    )?;
    println!("{}", serde_json::to_string_pretty(&results)?);
    Ok(exit_codes::OK)
}

fn cmd_resume(args: ResumeArgs) -> anyhow::Result<i32> {
    if args.profiles.is_empty() || args.scenarios.is_empty() {
        anyhow::bail!("--profiles and --scenarios must both be non-empty");
    }
    let store = open_store(&args.db)?;
    let plan =
        tutorlab_core::resume::incomplete_tests(&store, &args.run_id, &args.profiles, &args.scenarios)?;
    println!("{}", serde_json::to_string_pretty(&plan)?);
    Ok(exit_codes::OK)
}

fn cmd_purge(args: PurgeArgs) -> anyhow::Result<i32> {
    let store = open_store(&args.db)?;
    registry::require_run(&store, &args.run_id)?;

    if !args.yes {
        eprint!("delete run {} and all of its results? [y/N] ", args.run_id);
        let mut line = String::new();
        std::io::stdin().read_line(&mut line)?;
        if !line.trim().eq_ignore_ascii_case("y") {
            eprintln!("aborted");
            return Ok(exit_codes::CONFIG_ERROR);
        }
    }

    let purged = store.delete_run(&args.run_id)?;
    println!("purged {} ({} results)", args.run_id, purged);
    Ok(exit_codes::OK)
}
