//! Conversation Messages
//!
//! Normalized message format shared by every agent and provider adapter.
//! Provider adapters read the auxiliary fields (`tool_call_id`, `name`,
//! `tool_calls`, `raw`) to rebuild their own wire shape.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::tool::ToolCall;

/// Role of a message sender
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// System prompt/instructions
    System,
    /// User input
    User,
    /// Assistant (LLM) response
    Assistant,
    /// Tool result fed back to the model
    Tool,
    /// Assistant turn re-synthesized as a list of function calls
    AssistantToolCall,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::System => write!(f, "system"),
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
            Role::Tool => write!(f, "tool"),
            Role::AssistantToolCall => write!(f, "assistant_tool_call"),
        }
    }
}

/// A single message in a conversation
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Message {
    /// Message role
    pub role: Role,

    /// Text content, absent for pure tool invocations
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,

    /// Tool name (tool results)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Originating call id (tool results)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,

    /// Requested calls (re-synthesized assistant tool-call turns)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,

    /// Verbatim provider message, replayed as-is by the provider that produced it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw: Option<serde_json::Value>,

    /// Timestamp
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
}

impl Message {
    /// Create a new message
    pub fn new(role: Role, content: Option<String>) -> Self {
        Self {
            role,
            content,
            name: None,
            tool_call_id: None,
            tool_calls: Vec::new(),
            raw: None,
            timestamp: Utc::now(),
        }
    }

    /// Create a system message
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, Some(content.into()))
    }

    /// Create a user message
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, Some(content.into()))
    }

    /// Create an assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, Some(content.into()))
    }

    /// Create a tool result message
    pub fn tool(
        content: impl Into<String>,
        tool_call_id: impl Into<String>,
        name: Option<String>,
    ) -> Self {
        let mut msg = Self::new(Role::Tool, Some(content.into()));
        msg.tool_call_id = Some(tool_call_id.into());
        msg.name = name;
        msg
    }

    /// Create an assistant turn listing the calls it requested
    pub fn assistant_tool_calls(calls: Vec<ToolCall>) -> Self {
        let mut msg = Self::new(Role::AssistantToolCall, None);
        msg.tool_calls = calls;
        msg
    }

    /// Attach the provider-native message
    pub fn with_raw(mut self, raw: serde_json::Value) -> Self {
        self.raw = Some(raw);
        self
    }

    /// Text content, or an empty string
    pub fn text(&self) -> &str {
        self.content.as_deref().unwrap_or_default()
    }
}

/// Conversation history anchored on a fixed system prompt
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(try_from = "ConversationRecord")]
pub struct Conversation {
    id: Uuid,
    messages: Vec<Message>,
}

/// Unchecked wire form of [`Conversation`]
#[derive(Deserialize)]
struct ConversationRecord {
    id: Uuid,
    messages: Vec<Message>,
}

impl TryFrom<ConversationRecord> for Conversation {
    type Error = String;

    fn try_from(record: ConversationRecord) -> Result<Self, Self::Error> {
        match record.messages.first() {
            Some(first) if first.role == Role::System => Ok(Self {
                id: record.id,
                messages: record.messages,
            }),
            Some(first) => Err(format!("conversation must start with a system message, found {}", first.role)),
            None => Err("conversation has no system message".into()),
        }
    }
}

impl Conversation {
    pub fn with_system_prompt(prompt: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            messages: vec![Message::system(prompt)],
        }
    }

    /// Identifier of the current conversation, renewed on reset
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Add a message
    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Get all messages
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// The system message every history starts with
    pub fn system_prompt(&self) -> &str {
        self.messages.first().map(Message::text).unwrap_or_default()
    }

    /// Get the last message
    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Drop everything after the system prompt and start a new conversation id
    pub fn reset(&mut self) {
        self.messages.truncate(1);
        self.id = Uuid::new_v4();
    }

    /// Number of messages
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Always false: the system prompt is never removed
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
