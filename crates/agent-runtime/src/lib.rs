//! # agent-runtime
//!
//! Concrete LLM clients for the agent system.
//!
//! ## Providers
//!
//! - **OpenAI** (default): Chat Completions with function calling
//! - **Gemini**: `generateContent` with function declarations
//!
//! ## Usage
//!
//! ```rust,ignore
//! use agent_runtime::{create_client, ProviderConfig};
//!
//! let client = create_client(&ProviderConfig::from_env()?)?;
//! let agent = AgentBuilder::new()
//!     .client(client)
//!     .build()?;
//! ```

pub mod config;
pub mod gemini;
mod http;
pub mod openai;

use std::sync::Arc;

pub use config::{ProviderConfig, ProviderKind};
pub use gemini::GeminiClient;
pub use openai::OpenAiClient;

// Re-export core types for convenience
pub use agent_core::{AgentError, LlmClient, Result};

/// Build the client selected by `config`
pub fn create_client(config: &ProviderConfig) -> Result<Arc<dyn LlmClient>> {
    tracing::info!(provider = %config.kind, model = ?config.model, "Creating LLM client");
    Ok(match config.kind {
        ProviderKind::OpenAi => Arc::new(OpenAiClient::from_config(config)?),
        ProviderKind::Gemini => Arc::new(GeminiClient::from_config(config)?),
    })
}

/// Models known to work with each provider, default first
pub fn available_models(kind: ProviderKind) -> &'static [&'static str] {
    match kind {
        ProviderKind::OpenAi => &["gpt-4o-mini", "gpt-4o", "gpt-4-turbo", "gpt-3.5-turbo"],
        ProviderKind::Gemini => &["gemini-2.5-flash", "gemini-1.5-pro", "gemini-2.0-flash"],
    }
}
