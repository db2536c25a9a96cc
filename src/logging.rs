//! Structured logging setup.
//!
//! `RUST_LOG` is honored as-is; the CLI's `-v` flag raises the default
//! filter from `warn` to `debug` for the `humanify` target only, mirroring
//! the teacher's `--verbose` handling.

use tracing_subscriber::EnvFilter;

/// Initializes the global `tracing` subscriber.
///
/// Safe to call more than once per process (subsequent calls are no-ops);
/// tests that exercise the CLI end to end may call this repeatedly.
pub fn init(verbose: bool) {
    let default_directive = if verbose {
        "humanify=debug,warn"
    } else {
        "humanify=info,warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
