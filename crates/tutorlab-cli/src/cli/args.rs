use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "tutorlab",
    version,
    about = "Factorial tutor-evaluation runs: inspect, resume, reconcile, export"
)]
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Initialize (or migrate) the evaluation database
    Init(DbArgs),
    /// List evaluation runs with progress rollups
    Runs(RunsArgs),
    /// Show one run in full
    Show(ShowArgs),
    /// List stored results for a run
    Results(ResultsArgs),
    /// Compute which expected tests still lack a stored attempt
    Resume(ResumeArgs),
    /// Close out stale runs from whatever results exist
    Reconcile(ReconcileArgs),
    /// Per-configuration summary statistics
    Stats(StatsArgs),
    /// Head-to-head comparison of two configurations
    Compare(CompareArgs),
    /// Factorial cell data for variance analysis
    Cells(CellsArgs),
    /// Snapshot a run to JSON or CSV
    Export(ExportArgs),
    /// Delete a run and every result it owns
    Purge(PurgeArgs),
    Version,
}

#[derive(clap::Args, Debug, Clone)]
pub struct DbArgs {
    #[arg(long, default_value = ".tutorlab/evaluations.db")]
    pub db: PathBuf,
}

#[derive(clap::Args, Debug, Clone)]
pub struct RunsArgs {
    #[arg(long, default_value = ".tutorlab/evaluations.db")]
    pub db: PathBuf,

    /// Filter: running|completed|failed
    #[arg(long)]
    pub status: Option<String>,

    #[arg(long, default_value_t = 20)]
    pub limit: u32,

    /// Output format: text|json
    #[arg(long, default_value = "text")]
    pub format: String,
}

#[derive(clap::Args, Debug, Clone)]
pub struct ShowArgs {
    #[arg(long, default_value = ".tutorlab/evaluations.db")]
    pub db: PathBuf,

    pub run_id: String,
}

#[derive(clap::Args, Debug, Clone)]
pub struct ResultsArgs {
    #[arg(long, default_value = ".tutorlab/evaluations.db")]
    pub db: PathBuf,

    pub run_id: String,

    #[arg(long)]
    pub scenario: Option<String>,

    #[arg(long)]
    pub provider: Option<String>,

    #[arg(long)]
    pub model: Option<String>,

    #[arg(long)]
    pub profile: Option<String>,
}

#[derive(clap::Args, Debug, Clone)]
pub struct ResumeArgs {
    #[arg(long, default_value = ".tutorlab/evaluations.db")]
    pub db: PathBuf,

    pub run_id: String,

    /// Expected configuration names (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub profiles: Vec<String>,

    /// Expected scenario ids (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub scenarios: Vec<String>,
}

#[derive(clap::Args, Debug, Clone)]
pub struct ReconcileArgs {
    #[arg(long, default_value = ".tutorlab/evaluations.db")]
    pub db: PathBuf,

    /// Reconcile one specific run instead of sweeping
    #[arg(long)]
    pub run: Option<String>,

    /// Staleness threshold in minutes
    #[arg(long, default_value_t = 120)]
    pub older_than: i64,

    /// List candidates without mutating anything
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(clap::Args, Debug, Clone)]
pub struct StatsArgs {
    #[arg(long, default_value = ".tutorlab/evaluations.db")]
    pub db: PathBuf,

    pub run_id: String,

    /// Break totals down per scenario
    #[arg(long)]
    pub by_scenario: bool,
}

#[derive(clap::Args, Debug, Clone)]
pub struct CompareArgs {
    #[arg(long, default_value = ".tutorlab/evaluations.db")]
    pub db: PathBuf,

    pub run_id: String,
    pub profile_a: String,
    pub profile_b: String,
}

#[derive(clap::Args, Debug, Clone)]
pub struct CellsArgs {
    #[arg(long, default_value = ".tutorlab/evaluations.db")]
    pub db: PathBuf,

    pub run_id: String,

    /// overall_score|base_score|recognition_score
    #[arg(long, default_value = "overall_score")]
    pub score: String,
}

#[derive(clap::Args, Debug, Clone)]
pub struct ExportArgs {
    #[arg(long, default_value = ".tutorlab/evaluations.db")]
    pub db: PathBuf,

    pub run_id: String,

    #[arg(long)]
    pub out: PathBuf,

    /// json|csv (inferred from --out extension when omitted)
    #[arg(long)]
    pub format: Option<String>,
}

#[derive(clap::Args, Debug, Clone)]
pub struct PurgeArgs {
    #[arg(long, default_value = ".tutorlab/evaluations.db")]
    pub db: PathBuf,

    pub run_id: String,

    /// Skip the confirmation prompt
    #[arg(long)]
    pub yes: bool,
}
