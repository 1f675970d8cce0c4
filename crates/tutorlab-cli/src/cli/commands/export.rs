use super::exit_codes;
use crate::cli::args::ExportArgs;
use tutorlab_core::report::{csv, json};

pub fn cmd_export(args: ExportArgs) -> anyhow::Result<i32> {
    let store = super::open_store(&args.db)?;

    let format = match args.format.as_deref() {
        Some(f) => f.to_string(),
        None => args
            .out
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("json")
            .to_string(),
    };

    match format.as_str() {
        "json" => {
            let snapshot = json::export_json(&store, &args.run_id, &args.out)?;
            eprintln!(
                "wrote {} ({} results)",
                args.out.display(),
                snapshot.results.len()
            );
        }
        "csv" => {
            let n = csv::export_csv(&store, &args.run_id, &args.out)?;
            eprintln!("wrote {} ({} rows)", args.out.display(), n);
        }
        other => anyhow::bail!("unsupported export format: {} (expected json or csv)", other),
    }
    Ok(exit_codes::OK)
}
