//! Engine configuration (§6.5's tunables).
//!
//! Shaped after `agent::config::AgentConfig`/`AgentConfigBuilder`: a
//! `#[must_use]`-chained builder that validates on `build()`. Unlike the
//! teacher's config, this one has no `from_env()` — every field here is a
//! call-site tuning knob for a single `rename()` invocation, not a
//! deployment secret, so there is nothing for the environment to resolve.
//! The CLI's LLM-provider settings (API key, base URL, model) are a
//! separate concern handled in `src/llm`.

use std::path::PathBuf;

use crate::error::EngineError;

/// Tuning knobs for one [`rename`](super::engine::rename) call.
#[derive(Debug, Clone)]
pub struct RenameOptions {
    pub(crate) resume_path: Option<PathBuf>,
    pub(crate) max_batch_size: usize,
    pub(crate) batch_concurrency: usize,
    pub(crate) unique_names: bool,
    pub(crate) context_window_bytes: usize,
    pub(crate) min_information_score: f32,
    pub(crate) small_scope_merge_limit: i64,
    pub(crate) dirty_checkpoint_interval: usize,
}

impl Default for RenameOptions {
    fn default() -> Self {
        Self {
            resume_path: None,
            max_batch_size: 10,
            batch_concurrency: 1,
            unique_names: false,
            context_window_bytes: 4000,
            min_information_score: 16.0,
            small_scope_merge_limit: 2,
            dirty_checkpoint_interval: 50,
        }
    }
}

impl RenameOptions {
    /// Starts building a [`RenameOptions`] from the defaults.
    #[must_use]
    pub fn builder() -> RenameOptionsBuilder {
        RenameOptionsBuilder::default()
    }

    /// Sidecar checkpoint path, if resuming an interrupted run.
    #[must_use]
    pub fn resume_path(&self) -> Option<&PathBuf> {
        self.resume_path.as_ref()
    }

    /// Maximum bindings per visitor call.
    #[must_use]
    pub fn max_batch_size(&self) -> usize {
        self.max_batch_size
    }

    /// Maximum number of visitor calls in flight at once.
    #[must_use]
    pub fn batch_concurrency(&self) -> usize {
        self.batch_concurrency
    }

    /// Whether a colliding proposal is rejected (`true`) rather than
    /// disambiguated with a numeric suffix (`false`, the default).
    #[must_use]
    pub fn unique_names(&self) -> bool {
        self.unique_names
    }

    /// Byte budget for the surrounding code shown to a visitor.
    #[must_use]
    pub fn context_window_bytes(&self) -> usize {
        self.context_window_bytes
    }

    /// Minimum line-count-based information score a batch's context must
    /// have before it is sent to a visitor at all.
    #[must_use]
    pub fn min_information_score(&self) -> f32 {
        self.min_information_score
    }

    /// Maximum binding count a group may have and still be a candidate for
    /// folding into a neighboring group. `0` disables small-scope merging
    /// entirely.
    #[must_use]
    pub fn small_scope_merge_limit(&self) -> i64 {
        self.small_scope_merge_limit
    }

    /// How many groups to process, while the tree is dirty, before the
    /// sidecar is re-checkpointed.
    #[must_use]
    pub fn dirty_checkpoint_interval(&self) -> usize {
        self.dirty_checkpoint_interval
    }
}

/// Builder for [`RenameOptions`].
#[derive(Debug, Clone, Default)]
pub struct RenameOptionsBuilder {
    inner: RenameOptions,
}

impl RenameOptionsBuilder {
    /// Resume from a previous run's sidecar checkpoint.
    #[must_use]
    pub fn resume_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.inner.resume_path = Some(path.into());
        self
    }

    /// Sets the maximum bindings per visitor call.
    #[must_use]
    pub fn max_batch_size(mut self, value: usize) -> Self {
        self.inner.max_batch_size = value;
        self
    }

    /// Sets the maximum number of visitor calls in flight at once.
    #[must_use]
    pub fn batch_concurrency(mut self, value: usize) -> Self {
        self.inner.batch_concurrency = value;
        self
    }

    /// Enables strict collision rejection instead of suffix disambiguation.
    #[must_use]
    pub fn unique_names(mut self, value: bool) -> Self {
        self.inner.unique_names = value;
        self
    }

    /// Sets the byte budget for a batch's surrounding-code context.
    #[must_use]
    pub fn context_window_bytes(mut self, value: usize) -> Self {
        self.inner.context_window_bytes = value;
        self
    }

    /// Sets the minimum information score a batch must clear to be sent
    /// to a visitor.
    #[must_use]
    pub fn min_information_score(mut self, value: f32) -> Self {
        self.inner.min_information_score = value;
        self
    }

    /// Sets the small-scope merge limit. `0` disables merging.
    #[must_use]
    pub fn small_scope_merge_limit(mut self, value: i64) -> Self {
        self.inner.small_scope_merge_limit = value;
        self
    }

    /// Sets the dirty-checkpoint interval (in groups applied).
    #[must_use]
    pub fn dirty_checkpoint_interval(mut self, value: usize) -> Self {
        self.inner.dirty_checkpoint_interval = value;
        self
    }

    /// Validates and finalizes the options.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Config`] if `max_batch_size` or
    /// `batch_concurrency` is zero, `min_information_score` is negative,
    /// or `small_scope_merge_limit` is negative.
    pub fn build(self) -> Result<RenameOptions, EngineError> {
        let opts = self.inner;
        if opts.max_batch_size == 0 {
            return Err(EngineError::Config {
                message: "max_batch_size must be at least 1".to_string(),
            });
        }
        if opts.batch_concurrency == 0 {
            return Err(EngineError::Config {
                message: "batch_concurrency must be at least 1".to_string(),
            });
        }
        if opts.min_information_score < 0.0 {
            return Err(EngineError::Config {
                message: "min_information_score must not be negative".to_string(),
            });
        }
        if opts.small_scope_merge_limit < 0 {
            return Err(EngineError::Config {
                message: "small_scope_merge_limit must not be negative".to_string(),
            });
        }
        Ok(opts)
    }
}
