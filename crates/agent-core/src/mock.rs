//! Scripted LLM Client
//!
//! For testing and demo purposes. Replays a fixed sequence of responses and
//! records every history it was called with. Also provides a trivial
//! `add` tool so loops can be exercised without real tools.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use crate::error::{AgentError, Result};
use crate::message::Message;
use crate::provider::{GenerationOptions, LlmClient, LlmResponse};
use crate::tool::{number_arg, Arguments, ParameterSchema, Tool, ToolCall, ToolSpec};

enum Step {
    Reply(LlmResponse),
    Fail(String),
}

/// One recorded model invocation
#[derive(Clone, Debug)]
pub struct RecordedCall {
    /// History as sent
    pub history: Vec<Message>,
    /// Names of the declared tools (empty for plain `chat`)
    pub tools: Vec<String>,
}

/// Client answering from a script instead of a model
#[derive(Default)]
pub struct ScriptedClient {
    steps: Mutex<VecDeque<Step>>,
    calls: Mutex<Vec<RecordedCall>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl ScriptedClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a final text answer
    pub fn then_text(self, text: impl Into<String>) -> Self {
        self.then_response(LlmResponse::text_only(text))
    }

    /// Queue a turn requesting the given calls, as `(name, arguments)` pairs
    pub fn then_tool_calls<I>(self, calls: I) -> Self
    where
        I: IntoIterator<Item = (&'static str, serde_json::Value)>,
    {
        let offset = lock(&self.steps).len();
        let calls = calls
            .into_iter()
            .enumerate()
            .map(|(i, (name, args))| {
                let arguments = match args {
                    serde_json::Value::Object(map) => map.into_iter().collect(),
                    _ => Default::default(),
                };
                ToolCall::new(format!("call_{}_{}", offset, i), name, arguments)
            })
            .collect();
        self.then_response(LlmResponse::with_tool_calls(calls))
    }

    /// Queue an arbitrary response
    pub fn then_response(self, response: LlmResponse) -> Self {
        lock(&self.steps).push_back(Step::Reply(response));
        self
    }

    /// Queue a provider failure
    pub fn then_error(self, message: impl Into<String>) -> Self {
        lock(&self.steps).push_back(Step::Fail(message.into()));
        self
    }

    /// Every call made so far
    pub fn calls(&self) -> Vec<RecordedCall> {
        lock(&self.calls).clone()
    }

    /// Number of calls made so far
    pub fn call_count(&self) -> usize {
        lock(&self.calls).len()
    }

    /// Script steps not consumed yet
    pub fn remaining(&self) -> usize {
        lock(&self.steps).len()
    }

    fn next(&self, history: &[Message], tools: &[ToolSpec]) -> Result<LlmResponse> {
        lock(&self.calls).push(RecordedCall {
            history: history.to_vec(),
            tools: tools.iter().map(|t| t.name.clone()).collect(),
        });

        match lock(&self.steps).pop_front() {
            Some(Step::Reply(response)) => Ok(response),
            Some(Step::Fail(message)) => Err(AgentError::Provider(message)),
            None => Err(AgentError::Provider("script exhausted".into())),
        }
    }
}

#[async_trait]
impl LlmClient for ScriptedClient {
    fn name(&self) -> &str {
        "scripted"
    }

    fn default_model(&self) -> &str {
        "scripted-model"
    }

    async fn chat(&self, history: &[Message], _options: &GenerationOptions) -> Result<String> {
        let response = self.next(history, &[])?;
        Ok(response.text().to_string())
    }

    async fn chat_with_tools(
        &self,
        history: &[Message],
        tools: &[ToolSpec],
        _options: &GenerationOptions,
    ) -> Result<LlmResponse> {
        self.next(history, tools)
    }

    fn to_assistant_message_with_tools(&self, response: &LlmResponse) -> Message {
        let mut message = Message::assistant_tool_calls(response.tool_calls.clone());
        message.content.clone_from(&response.content);
        message
    }

    fn to_tool_result_message(&self, call_id: &str, result: &str, tool_name: &str) -> Message {
        Message::tool(result, call_id, Some(tool_name.to_string()))
    }
}

/// Tool named `add` summing `a` and `b`
pub struct AdderTool;

impl Tool for AdderTool {
    fn schema(&self) -> ToolSpec {
        ToolSpec::new(
            "add",
            "Add two numbers",
            &[
                ParameterSchema::new("a", "number", "First addend").required(),
                ParameterSchema::new("b", "number", "Second addend").required(),
            ],
        )
    }

    fn execute(&self, arguments: &Arguments) -> Result<String> {
        Ok(format!("{}", number_arg(arguments, "a")? + number_arg(arguments, "b")?))
    }
}
