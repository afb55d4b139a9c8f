//! # agent-core
//!
//! Core agent logic with provider-agnostic LLM abstraction, a synchronous
//! tool system and expert orchestration.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        Orchestrator                          │
//! │  ┌─────────────┐  ┌─────────────┐  ┌──────────────────────┐  │
//! │  │  Reasoning  │  │    Tools    │  │   LlmClient          │  │
//! │  │    Loop     │──│   Registry  │──│   (Strategy)         │  │
//! │  └─────────────┘  └─────────────┘  └──────────────────────┘  │
//! │         │ consult_expert                                     │
//! │         ▼                                                    │
//! │  ┌─────────────┐  ┌─────────────┐  ┌─────────────┐           │
//! │  │   Expert    │  │   Expert    │  │   Expert    │  ...      │
//! │  └─────────────┘  └─────────────┘  └─────────────┘           │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! The `LlmClient` trait enables swapping between OpenAI, Gemini or any
//! other provider without changing agent logic. Concrete clients live in
//! `agent-runtime`; [`mock::ScriptedClient`] stands in for them in tests.

pub mod error;
pub mod message;
pub mod mock;
pub mod orchestrator;
pub mod provider;
pub mod reasoning;
pub mod tool;

pub use error::{AgentError, Result};
pub use message::{Conversation, Message, Role};
pub use orchestrator::{Orchestrator, OrchestratorBuilder};
pub use provider::{GenerationOptions, LlmClient, LlmResponse};
pub use reasoning::{Agent, AgentBuilder, AgentConfig};
pub use tool::{
    Arguments, ParameterSchema, Tool, ToolCall, ToolExecutor, ToolRegistry, ToolSpec, DELEGATE_TOOL,
    ERROR_MARKER,
};
