//! OpenAI-compatible chat completion [`Visitor`].
//!
//! Grounded on `agent::providers::openai::OpenAiProvider`: the same client
//! construction (`async_openai::Client<OpenAIConfig>`), the same
//! redacting `Debug` impl, and the request-building shape. Where the
//! teacher's provider drives a multi-turn tool-calling loop, this visitor
//! makes exactly one request per batch and expects a JSON object back.

use std::sync::LazyLock;

use async_openai::config::OpenAIConfig;
use async_openai::types::{
    ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
    CreateChatCompletionRequestArgs, ResponseFormat, ResponseFormatJsonObject,
};
use async_openai::Client;
use async_trait::async_trait;
use regex::Regex;

use crate::engine::context::BatchContext;
use crate::engine::visitor::{RenameMap, Visitor};
use crate::error::{EngineError, Result};

use super::VisitorConfig;

const SYSTEM_PROMPT: &str = "You rename minified JavaScript identifiers to short, descriptive names. \
You will be given the surrounding source code for one lexical scope and a list of current (minified) \
names to rename. Respond with a single JSON object mapping each given name to your suggested replacement. \
Only include names you were asked about. Use camelCase. Never propose a JavaScript reserved word. \
If you cannot improve on a name, omit it from the response rather than repeating it unchanged.";

static JSON_OBJECT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\{.*\}").unwrap_or_else(|e| unreachable!("static regex: {e}")));

/// [`Visitor`] backed by an OpenAI-compatible chat completion endpoint.
pub struct OpenAiVisitor {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiVisitor {
    /// Builds a visitor from a resolved [`VisitorConfig`].
    #[must_use]
    pub fn new(config: &VisitorConfig) -> Self {
        let mut openai_config = OpenAIConfig::new().with_api_key(&config.api_key);
        if let Some(base_url) = &config.base_url {
            openai_config = openai_config.with_api_base(base_url);
        }
        Self {
            client: Client::with_config(openai_config),
            model: config.model.clone(),
        }
    }

    fn build_user_message(context: &BatchContext) -> String {
        let mut message = String::new();
        message.push_str("Surrounding code:\n```js\n");
        message.push_str(&context.shared_code);
        message.push_str("\n```\n");
        if !context.global_references.is_empty() {
            message.push_str("Known external references: ");
            message.push_str(&context.global_references.join(", "));
            message.push('\n');
        }
        message.push_str("Names to rename: ");
        let names: Vec<&str> = context.targets.iter().map(|t| t.name.as_str()).collect();
        message.push_str(&names.join(", "));
        message
    }

    /// Parses the model's response content into a rename map, tolerating
    /// a reply wrapped in prose or a fenced code block (the same
    /// defensive fallback chain `agent::subcall` uses to recover a JSON
    /// object from a free-form model response).
    fn parse_response(content: &str) -> Option<RenameMap> {
        if let Ok(map) = serde_json::from_str::<RenameMap>(content) {
            return Some(map);
        }
        let candidate = JSON_OBJECT_RE.find(content)?.as_str();
        serde_json::from_str::<RenameMap>(candidate).ok()
    }
}

impl std::fmt::Debug for OpenAiVisitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiVisitor").field("model", &self.model).finish_non_exhaustive()
    }
}

#[async_trait]
impl Visitor for OpenAiVisitor {
    fn name(&self) -> &str {
        "openai"
    }

    async fn propose_renames(&self, batch_id: usize, context: &BatchContext) -> Result<RenameMap> {
        let system = ChatCompletionRequestSystemMessageArgs::default()
            .content(SYSTEM_PROMPT)
            .build()
            .map_err(|e| visitor_error(batch_id, e))?;
        let user = ChatCompletionRequestUserMessageArgs::default()
            .content(Self::build_user_message(context))
            .build()
            .map_err(|e| visitor_error(batch_id, e))?;

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(vec![system.into(), user.into()])
            .response_format(ResponseFormat::JsonObject(ResponseFormatJsonObject::default()))
            .build()
            .map_err(|e| visitor_error(batch_id, e))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| visitor_error(batch_id, e))?;

        let content = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .ok_or_else(|| EngineError::MalformedResponse {
                batch_id,
                message: "no choices returned".to_string(),
            })?;

        Self::parse_response(&content).ok_or_else(|| EngineError::MalformedResponse {
            batch_id,
            message: "response was not a JSON object of name -> name".to_string(),
        })
    }
}

fn visitor_error(batch_id: usize, err: impl std::fmt::Display) -> EngineError {
    EngineError::Visitor {
        visitor: "openai".to_string(),
        batch_id,
        message: err.to_string(),
    }
}
