//! Identifier-renaming engine (§2-§6).
//!
//! ```text
//!   source ──▶ parser adapter ──▶ scope analyzer ──▶ grouper
//!                                                        │
//!                      ┌─────────────────────────────────┘
//!                      ▼
//!              small-scope merger ──▶ batch splitter ──▶ context extractor
//!                                                              │
//!                      ┌───────────────────────────────────────┘
//!                      ▼
//!   visitor fan-out (bounded concurrency) ──▶ batch renamer ──▶ rename
//!   primitive (applied to the tree) ──▶ checkpoint manager ──▶ output
//! ```
//!
//! [`engine::rename`] is the only entry point a caller needs; everything
//! else in this module is exposed for callers who want to drive the
//! pipeline stage by stage (e.g. to inspect the scope arena without
//! renaming anything).

pub mod analyzer;
pub mod checkpoint;
pub mod config;
pub mod context;
#[allow(clippy::module_inception)]
pub mod engine;
pub mod grouper;
pub mod merger;
pub mod progress;
pub mod rename;
pub mod scope;
pub mod skip;
pub mod splitter;
pub mod visitor;

pub use config::{RenameOptions, RenameOptionsBuilder};
pub use engine::{rename, RenameOutcome};
pub use progress::{ProgressFn, ProgressUpdate};
pub use scope::{Arena, Binding, BindingKind, Scope, ScopeKind};
pub use visitor::{RenameMap, Visitor};
