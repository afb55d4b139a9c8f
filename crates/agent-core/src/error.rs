//! Error Types

use thiserror::Error;

/// Result type alias for agent operations
pub type Result<T> = std::result::Result<T, AgentError>;

/// Agent error types
#[derive(Error, Debug)]
pub enum AgentError {
    /// LLM provider error
    #[error("Provider error: {0}")]
    Provider(String),

    /// Provider unreachable (connection refused, timeout, DNS)
    #[error("Provider unavailable: {0}")]
    ProviderUnavailable(String),

    /// Provider answered with a non-success HTTP status
    #[error("Provider API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Tool not found in registry
    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    /// Tool validation failed
    #[error("Tool validation error: {0}")]
    ToolValidation(String),

    /// Tool execution failed
    #[error("Tool execution error: {0}")]
    ToolExecution(String),

    /// Maximum iterations reached in the tool loop
    #[error("Tool loop exceeded {0} iterations")]
    MaxIterations(usize),

    /// Parse error (e.g., undecodable provider response)
    #[error("Parse error: {0}")]
    Parse(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Rate limited
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// Authentication failed
    #[error("Authentication failed: {0}")]
    Auth(String),
}

impl AgentError {
    /// Check if error is retryable
    ///
    /// Nothing in this crate retries; callers wrapping `process` may.
    pub fn is_retryable(&self) -> bool {
        match self {
            AgentError::ProviderUnavailable(_) | AgentError::RateLimited(_) => true,
            AgentError::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Convert to a user-friendly message
    pub fn user_message(&self) -> String {
        match self {
            AgentError::Provider(msg) => format!("The AI service encountered an error: {}", msg),
            AgentError::ProviderUnavailable(_) => "The AI service is currently unavailable. Please try again.".into(),
            AgentError::Api { status, .. } => format!("The AI service rejected the request (HTTP {}).", status),
            AgentError::ToolNotFound(name) => format!("The tool '{}' is not available.", name),
            AgentError::ToolValidation(msg) => format!("Invalid tool input: {}", msg),
            AgentError::ToolExecution(msg) => format!("Tool error: {}", msg),
            AgentError::MaxIterations(_) => "The request took too many steps to process. Please try a simpler query.".into(),
            AgentError::RateLimited(_) => "You've made too many requests. Please wait a moment.".into(),
            AgentError::Auth(_) => "Authentication failed. Please check your API key.".into(),
            AgentError::Config(msg) => format!("Configuration problem: {}", msg),
            AgentError::Parse(_) => "The AI service sent a response that could not be read.".into(),
        }
    }
}
