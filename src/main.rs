//! `humanify` binary entry point.

use clap::Parser;
use humanify::cli::{execute, Cli};
use humanify::logging;

#[tokio::main]
async fn main() -> std::process::ExitCode {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    match execute(&cli).await {
        Ok(summary) => {
            tracing::info!("{summary}");
            std::process::ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!("{e}");
            std::process::ExitCode::FAILURE
        }
    }
}
