//! Error types.
//!
//! [`EngineError`] covers the seven failure kinds the renaming pipeline
//! itself can produce (§7). [`CliError`] wraps it with the I/O and
//! configuration failures that only the binary entry point sees.

use std::path::PathBuf;

/// Crate-level result alias.
pub type Result<T> = std::result::Result<T, EngineError>;

/// Failures the renaming engine can produce.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The input source failed to parse as JavaScript.
    #[error("parse error in {path}: {message}")]
    Parse {
        /// Path (or synthetic name) of the file that failed to parse.
        path: String,
        /// Parser diagnostic message.
        message: String,
    },

    /// A [`RenameOptions`](crate::engine::config::RenameOptions) value failed
    /// validation.
    #[error("invalid configuration: {message}")]
    Config {
        /// Description of the invalid field and why.
        message: String,
    },

    /// A visitor call returned no usable response after retries.
    #[error("visitor {visitor} failed for batch {batch_id}: {message}")]
    Visitor {
        /// Name of the visitor implementation that failed.
        visitor: String,
        /// Identifier of the batch being processed.
        batch_id: usize,
        /// Underlying failure description.
        message: String,
    },

    /// A visitor's response could not be parsed into a rename mapping.
    #[error("malformed visitor response for batch {batch_id}: {message}")]
    MalformedResponse {
        /// Identifier of the batch whose response was malformed.
        batch_id: usize,
        /// Description of what was wrong with the response.
        message: String,
    },

    /// Applying a proposed rename would violate an engine invariant
    /// (shadowing, reserved word collision, or empty/invalid identifier).
    #[error("rename rejected for binding {binding} in scope {scope}: {reason}")]
    InvalidRename {
        /// Original (minified) binding name.
        binding: String,
        /// Human-readable description of the owning scope.
        scope: String,
        /// Why the rename was rejected.
        reason: String,
    },

    /// The checkpoint sidecar exists but could not be loaded.
    #[error("checkpoint at {path} could not be loaded: {message}")]
    Checkpoint {
        /// Path to the sidecar file.
        path: PathBuf,
        /// Description of the failure (I/O error, schema mismatch, etc.).
        message: String,
    },

    /// An I/O operation failed (reading the source file, writing the
    /// sidecar, writing the final output).
    #[error("I/O error on {path}: {source}")]
    Io {
        /// Path the operation was attempted on.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

impl EngineError {
    /// Wraps a [`std::io::Error`] with the path that triggered it.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Failures visible at the CLI boundary: an [`EngineError`] plus the
/// argument-parsing and environment failures that never reach the engine.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// The renaming engine itself failed.
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// A required environment variable (typically the LLM API key) was
    /// not set.
    #[error("environment variable {name} is not set")]
    MissingEnvVar {
        /// Name of the missing variable.
        name: String,
    },

    /// The requested visitor name has no registered factory.
    #[error("unsupported visitor: {name}")]
    UnsupportedVisitor {
        /// The unrecognized visitor name.
        name: String,
    },

    /// Reading the input file or writing an output file failed.
    #[error("I/O error on {path}: {source}")]
    Io {
        /// Path the operation was attempted on.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

impl CliError {
    /// Wraps a [`std::io::Error`] with the path that triggered it.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
