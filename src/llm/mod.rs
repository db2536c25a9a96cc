//! Default LLM-backed [`Visitor`](crate::engine::Visitor) implementations.
//!
//! The engine itself never imports this module — it only knows about the
//! `Visitor` trait. This is where the CLI gets its default visitor from.

#[cfg(feature = "openai")]
pub mod openai;

use std::env;
use std::sync::Arc;

use crate::engine::Visitor;
use crate::error::CliError;

/// Resolved configuration for the default visitor, read from CLI flags
/// falling back to environment variables — the same resolution order the
/// teacher's `AgentConfig` uses for provider credentials, since this is a
/// deployment secret rather than a per-call tuning knob (unlike
/// `RenameOptions`; see SPEC_FULL §10.3).
#[derive(Debug, Clone)]
pub struct VisitorConfig {
    /// Which visitor implementation to construct.
    pub provider: String,
    /// Model name to request.
    pub model: String,
    /// API key, resolved from `--api-key-env` or the provider's default
    /// environment variable.
    pub api_key: String,
    /// Override for the API base URL (self-hosted/compatible endpoints).
    pub base_url: Option<String>,
}

impl VisitorConfig {
    /// Resolves a [`VisitorConfig`] for `provider`, reading the API key
    /// from `api_key_env` (defaulting to `OPENAI_API_KEY`) and `model`
    /// from the given override or a sensible per-provider default.
    ///
    /// # Errors
    ///
    /// Returns [`CliError::MissingEnvVar`] if the resolved environment
    /// variable is unset.
    pub fn resolve(
        provider: &str,
        model: Option<&str>,
        api_key_env: Option<&str>,
        base_url: Option<&str>,
    ) -> Result<Self, CliError> {
        let env_var = api_key_env.unwrap_or("OPENAI_API_KEY");
        let api_key = env::var(env_var).map_err(|_| CliError::MissingEnvVar {
            name: env_var.to_string(),
        })?;
        let model = model.unwrap_or("gpt-4o-mini").to_string();
        Ok(Self {
            provider: provider.to_string(),
            model,
            api_key,
            base_url: base_url.map(str::to_string),
        })
    }
}

/// Creates a [`Visitor`] for the configured provider.
///
/// # Supported providers
///
/// - `"openai"` (default, requires the `openai` feature) — OpenAI-compatible
///   chat completion APIs via `async-openai`.
///
/// # Errors
///
/// Returns [`CliError::UnsupportedVisitor`] for unknown provider names, or
/// if the matching feature was not compiled in.
pub fn create_visitor(config: &VisitorConfig) -> Result<Arc<dyn Visitor>, CliError> {
    match config.provider.as_str() {
        #[cfg(feature = "openai")]
        "openai" => Ok(Arc::new(openai::OpenAiVisitor::new(config))),
        other => Err(CliError::UnsupportedVisitor {
            name: other.to_string(),
        }),
    }
}

#[cfg(all(test, feature = "openai"))]
mod tests {
    use super::*;

    #[test]
    fn create_visitor_rejects_unknown_provider() {
        let config = VisitorConfig {
            provider: "unknown".to_string(),
            model: "x".to_string(),
            api_key: "sk-test".to_string(),
            base_url: None,
        };
        assert!(create_visitor(&config).is_err());
    }

    #[test]
    fn create_visitor_accepts_openai() {
        let config = VisitorConfig {
            provider: "openai".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key: "sk-test".to_string(),
            base_url: None,
        };
        assert!(create_visitor(&config).is_ok());
    }
}
