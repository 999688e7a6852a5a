//! Language model seam for the agent loop.
//!
//! [`ChatModel`] is the one call the crew makes into a model provider: send a
//! [`ChatRequest`] (system prompt, history, optional tools) and get back a
//! [`ModelTurn`] holding either final text or tool calls. [`GenaiModel`] is
//! the production implementation on top of the `genai` client.

use async_trait::async_trait;
use genai::chat::{ChatOptions, ChatRequest, ToolCall};
use genai::resolver::{AuthData, AuthResolver};
use genai::{Client, ModelIden};

use crate::error::LlmError;

/// One model response, reduced to what the agent loop consumes.
#[derive(Debug, Clone, Default)]
pub struct ModelTurn {
    pub text: Option<String>,
    pub tool_calls: Vec<ToolCall>,
    pub prompt_tokens: Option<i32>,
    pub completion_tokens: Option<i32>,
}

impl ModelTurn {
    /// A text-only turn (final answer).
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            text: Some(content.into()),
            ..Default::default()
        }
    }

    /// A turn requesting tool calls.
    pub fn tool_calls(calls: Vec<ToolCall>) -> Self {
        Self {
            tool_calls: calls,
            ..Default::default()
        }
    }
}

#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Model identifier, for logs.
    fn name(&self) -> &str;

    async fn complete(&self, request: ChatRequest) -> Result<ModelTurn, LlmError>;
}

/// Hosted model accessed through `genai`, authenticated from the process
/// environment.
pub struct GenaiModel {
    model: String,
    api_key_env: String,
    client: Client,
}

impl GenaiModel {
    /// Create a client for `model`. When `api_key_env` is non-empty the key is
    /// read from that variable on every request; an empty name leaves auth to
    /// genai's provider defaults (e.g. local Ollama needs none).
    pub fn new(model: impl Into<String>, api_key_env: impl Into<String>) -> Self {
        let api_key_env = api_key_env.into();
        let client = if api_key_env.is_empty() {
            Client::default()
        } else {
            let var = api_key_env.clone();
            let resolver = AuthResolver::from_resolver_fn(
                move |_model_iden: ModelIden| -> Result<Option<AuthData>, genai::resolver::Error> {
                    Ok(read_api_key(&var).map(AuthData::from_single))
                },
            );
            Client::builder().with_auth_resolver(resolver).build()
        };

        Self {
            model: model.into(),
            api_key_env,
            client,
        }
    }

    /// Fail fast with [`LlmError::MissingCredentials`] when the configured key
    /// variable is unset or blank.
    pub fn check_credentials(&self) -> Result<(), LlmError> {
        if self.api_key_env.is_empty() || read_api_key(&self.api_key_env).is_some() {
            Ok(())
        } else {
            Err(LlmError::MissingCredentials {
                var: self.api_key_env.clone(),
            })
        }
    }
}

fn read_api_key(var: &str) -> Option<String> {
    std::env::var(var)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[async_trait]
impl ChatModel for GenaiModel {
    fn name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, request: ChatRequest) -> Result<ModelTurn, LlmError> {
        self.check_credentials()?;

        let options = ChatOptions::default().with_capture_usage(true);
        let response = self
            .client
            .exec_chat(&self.model, request, Some(&options))
            .await
            .map_err(|e| LlmError::RequestFailed {
                model: self.model.clone(),
                message: e.to_string(),
            })?;

        Ok(ModelTurn {
            text: response.first_text().map(str::to_string),
            tool_calls: response.content.tool_calls().into_iter().cloned().collect(),
            prompt_tokens: response.usage.prompt_tokens,
            completion_tokens: response.usage.completion_tokens,
        })
    }
}
