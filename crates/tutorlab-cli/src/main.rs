use clap::Parser;

mod cli;

use cli::args::Cli;
use cli::commands::dispatch;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let code = match dispatch(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("fatal: {e:?}");
            2 // cli::commands::exit_codes::CONFIG_ERROR
        }
    };
    std::process::exit(code);
}
