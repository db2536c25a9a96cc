//! Argument parsing.
//!
//! Shaped after the teacher's `Cli`/`Commands` derive layout: one global
//! struct carrying cross-cutting flags, a `Commands` enum for the
//! subcommands, and an `after_help` usage block on each subcommand.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Renames minified JavaScript identifiers with help from an LLM.
#[derive(Debug, Parser)]
#[command(name = "humanify")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable debug-level logging (equivalent to `RUST_LOG=humanify=debug`).
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Rename identifiers in a single JavaScript file.
    #[command(after_help = r#"Examples:
  humanify run app.min.js
  humanify run app.min.js --output app.readable.js
  humanify run app.min.js --resume --max-batch-size 10
  humanify run app.min.js --unique-names --batch-concurrency 8
  humanify run app.min.js --provider openai --model gpt-4o-mini --api-key-env MY_KEY
"#)]
    Run(Box<RunArgs>),
}

/// Arguments for `humanify run`.
#[derive(Debug, clap::Args)]
pub struct RunArgs {
    /// JavaScript file to rename.
    pub input: PathBuf,

    /// Where to write the renamed source. Defaults to overwriting the
    /// input file in place.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Resume an interrupted run from its sidecar checkpoint, if one
    /// exists next to the input file.
    #[arg(long)]
    pub resume: bool,

    /// Maximum number of bindings sent to the visitor in one batch.
    #[arg(long, default_value_t = 10)]
    pub max_batch_size: usize,

    /// Maximum number of visitor calls in flight at once.
    #[arg(long, default_value_t = 1)]
    pub batch_concurrency: usize,

    /// Use stricter collision freshness checks (built-ins plus a
    /// whole-tree name scan) before disambiguating a colliding proposal
    /// with a numeric suffix.
    #[arg(long)]
    pub unique_names: bool,

    /// Byte budget for the surrounding code shown to the visitor per
    /// batch.
    #[arg(long, default_value_t = 4000)]
    pub context_window: usize,

    /// Minimum line-count-based information score a batch's context must
    /// have before it is sent to the visitor at all.
    #[arg(long, default_value_t = 16.0)]
    pub min_information_score: f32,

    /// Maximum binding count a group may have and still be folded into a
    /// neighboring group. `0` disables small-scope merging entirely.
    #[arg(long, default_value_t = 2)]
    pub small_scope_merge_limit: i64,

    /// Visitor implementation to use.
    #[arg(long, default_value = "openai")]
    pub provider: String,

    /// Model name to request from the visitor's provider.
    #[arg(long)]
    pub model: Option<String>,

    /// Environment variable to read the provider API key from.
    #[arg(long, env = "HUMANIFY_API_KEY_ENV")]
    pub api_key_env: Option<String>,

    /// Override the provider's API base URL (self-hosted/compatible
    /// endpoints).
    #[arg(long)]
    pub base_url: Option<String>,
}
