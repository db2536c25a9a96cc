//! The [`Visitor`] trait (§6.2): the engine's only LLM-shaped seam. The
//! engine is visitor-agnostic — it drives a bounded-concurrency fan-out of
//! `Visitor::propose_renames` calls and never talks to a provider
//! directly.
//!
//! Shaped after `agent::provider::LlmProvider`: an object-safe async trait
//! implemented once per backend, with a name used in error messages and
//! progress events.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::error::Result;

use super::context::BatchContext;

/// A batch's proposed renames: minified name -> suggested descriptive
/// name. Entries for names the visitor didn't recognize or chose to leave
/// alone are simply absent; the engine keeps the original name in that
/// case rather than treating it as an error.
pub type RenameMap = HashMap<String, String>;

/// Supplies descriptive names for minified bindings.
///
/// Implementations should be cheap to clone (wrap an `Arc`-backed client)
/// since the engine holds one shared instance across every concurrent
/// batch in a cohort.
#[async_trait]
pub trait Visitor: Send + Sync {
    /// Short identifier used in error messages and tracing spans (e.g.
    /// `"openai"`).
    fn name(&self) -> &str;

    /// Proposes names for every target in `context`.
    ///
    /// `batch_id` is included only for diagnostics — implementations must
    /// not assume batches are dispatched in id order (§5 processes a
    /// cohort concurrently).
    async fn propose_renames(&self, batch_id: usize, context: &BatchContext) -> Result<RenameMap>;
}
