use clap::Parser;
use tracing_subscriber::EnvFilter;

mod args;
mod cli;

use args::Cli;

const LOG_ENV: &str = "HOTEXIT_LOG";

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = cli::run(cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Logs go to stderr; stdout is for command output.
fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(default_level));
    let is_tty = std::io::IsTerminal::is_terminal(&std::io::stderr());

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(is_tty)
        .with_writer(std::io::stderr)
        .init();
}
