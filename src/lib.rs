//! Identifier-renaming engine for deobfuscated JavaScript.
//!
//! Given minified or obfuscated source, [`engine::rename`] walks every
//! lexical scope, groups the bindings it finds, and asks a pluggable
//! [`engine::Visitor`] to suggest descriptive replacement names — an LLM
//! by default, but the engine itself has no opinion on what answers the
//! question.
//!
//! ```text
//!   humanify::engine::rename(path, source, visitor, &options, None)
//! ```

pub mod cli;
pub mod engine;
pub mod error;
pub mod llm;
pub mod logging;
pub mod parser;

pub use error::{CliError, EngineError, Result};
