//! LLM Client Strategy Pattern
//!
//! Defines a common interface over vendor chat APIs with incompatible
//! function-calling protocols, so the agent loop never branches on provider.
//!
//! Vendors differ in exactly two places that matter for the transcript:
//! how "the model asked for these functions" is recorded, and how "this is a
//! function's result" is recorded. Both are encoded by the provider itself
//! through [`LlmClient::to_assistant_message_with_tools`] and
//! [`LlmClient::to_tool_result_message`].
//!
//! ## Usage
//!
//! ```rust,ignore
//! use agent_core::provider::{GenerationOptions, LlmClient};
//!
//! let response = client.chat_with_tools(&history, &specs, &GenerationOptions::default()).await?;
//! if response.is_final() {
//!     println!("{}", response.text());
//! }
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::message::Message;
use crate::tool::{ToolCall, ToolSpec};

/// Configuration for LLM generation
///
/// Unset values are left out of the request so the provider defaults apply.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationOptions {
    /// Model override; `None` uses the client's default model
    #[serde(default)]
    pub model: Option<String>,

    /// Temperature for sampling
    #[serde(default)]
    pub temperature: Option<f32>,

    /// Maximum tokens to generate
    #[serde(default)]
    pub max_tokens: Option<u32>,
}

impl GenerationOptions {
    /// Options pinned to a model
    pub fn for_model(model: impl Into<String>) -> Self {
        Self {
            model: Some(model.into()),
            ..Default::default()
        }
    }

    /// The model to use, falling back to `default`
    pub fn model_or<'a>(&'a self, default: &'a str) -> &'a str {
        self.model.as_deref().unwrap_or(default)
    }
}

/// Normalized result of one tool-enabled model call
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct LlmResponse {
    /// Generated text, if any
    pub content: Option<String>,

    /// Requested tool calls, in the order the provider emitted them
    pub tool_calls: Vec<ToolCall>,

    /// Provider-native payload, only read back by the provider that made it
    pub raw: serde_json::Value,
}

impl LlmResponse {
    /// A final answer with no tool calls
    pub fn text_only(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Default::default()
        }
    }

    /// A turn requesting tool calls
    pub fn with_tool_calls(tool_calls: Vec<ToolCall>) -> Self {
        Self {
            tool_calls,
            ..Default::default()
        }
    }

    /// No tool calls were requested. Text alongside tool calls is advisory.
    pub fn is_final(&self) -> bool {
        self.tool_calls.is_empty()
    }

    /// Generated text, or an empty string
    pub fn text(&self) -> &str {
        self.content.as_deref().unwrap_or_default()
    }
}

/// Strategy trait for LLM providers
///
/// Implement this trait to add support for new LLM backends.
/// Agents work exclusively through this interface. Errors from the
/// underlying API are returned as-is; nothing here retries.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Provider name (e.g., "openai", "gemini")
    fn name(&self) -> &str;

    /// Model used when the options do not name one
    fn default_model(&self) -> &str;

    /// Single completion without tools
    async fn chat(&self, history: &[Message], options: &GenerationOptions) -> Result<String>;

    /// Completion with tool declarations attached; the model decides whether to call them
    async fn chat_with_tools(
        &self,
        history: &[Message],
        tools: &[ToolSpec],
        options: &GenerationOptions,
    ) -> Result<LlmResponse>;

    /// Encode the assistant's tool-call turn the way this provider expects to see it replayed
    fn to_assistant_message_with_tools(&self, response: &LlmResponse) -> Message;

    /// Encode a tool's result as the next turn for this provider
    fn to_tool_result_message(&self, call_id: &str, result: &str, tool_name: &str) -> Message;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generation_options_defaults() {
        let opts = GenerationOptions::default();
        assert!(opts.model.is_none());
        assert!(opts.temperature.is_none());
        assert_eq!(opts.model_or("gpt-4o-mini"), "gpt-4o-mini");
        assert_eq!(GenerationOptions::for_model("gpt-4o").model_or("gpt-4o-mini"), "gpt-4o");
    }

    #[test]
    fn test_response_finality() {
        assert!(LlmResponse::text_only("done").is_final());

        let mut acting = LlmResponse::with_tool_calls(vec![ToolCall::new("1", "clock", Default::default())]);
        acting.content = Some("Let me check".into());
        assert!(!acting.is_final());
    }
}
