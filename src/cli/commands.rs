//! CLI command implementations.
//!
//! `execute` is the single dispatch point the binary calls after parsing
//! arguments, mirroring the teacher's `execute(cli: &Cli) -> Result<String>`
//! shape: build a plain-text summary of what happened and let `main.rs`
//! decide how to print it.

use std::fs;

use crate::engine::{self, RenameOptions};
use crate::error::CliError;
use crate::llm::{self, VisitorConfig};

use super::parser::{Cli, Commands, RunArgs};

/// Runs whichever subcommand `cli` selected and returns a human-readable
/// summary to print.
pub async fn execute(cli: &Cli) -> Result<String, CliError> {
    match &cli.command {
        Commands::Run(args) => run(args).await,
    }
}

async fn run(args: &RunArgs) -> Result<String, CliError> {
    let source = fs::read_to_string(&args.input).map_err(|e| CliError::io(&args.input, e))?;

    let visitor_config = VisitorConfig::resolve(
        &args.provider,
        args.model.as_deref(),
        args.api_key_env.as_deref(),
        args.base_url.as_deref(),
    )?;
    let visitor = llm::create_visitor(&visitor_config)?;

    let mut builder = RenameOptions::builder()
        .max_batch_size(args.max_batch_size)
        .batch_concurrency(args.batch_concurrency)
        .unique_names(args.unique_names)
        .context_window_bytes(args.context_window)
        .min_information_score(args.min_information_score)
        .small_scope_merge_limit(args.small_scope_merge_limit);
    if args.resume {
        builder = builder.resume_path(engine::checkpoint::sidecar_path(&args.input));
    }
    let options = builder.build().map_err(CliError::Engine)?;

    let total_start = std::time::Instant::now();
    let outcome = engine::rename(&args.input, &source, visitor, &options, Some(&report_progress))
        .await
        .map_err(CliError::Engine)?;
    let elapsed = total_start.elapsed();

    let output_path = args.output.clone().unwrap_or_else(|| args.input.clone());
    fs::write(&output_path, &outcome.code).map_err(|e| CliError::io(&output_path, e))?;

    Ok(format!(
        "renamed {} identifier(s), left {} unchanged, wrote {} in {:.2}s",
        outcome.renames.len(),
        outcome.skipped,
        output_path.display(),
        elapsed.as_secs_f64()
    ))
}

fn report_progress(update: engine::ProgressUpdate) {
    tracing::debug!(
        batch = update.batch_id,
        progress = format!("{:.0}%", update.fraction() * 100.0),
        "batch applied"
    );
}
