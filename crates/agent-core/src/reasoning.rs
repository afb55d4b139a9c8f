//! Reasoning Loop
//!
//! Implements the think / act / observe loop shared by the orchestrator and
//! every expert. The agent owns its conversation; each `think` call continues
//! it rather than starting over.

use std::sync::Arc;

use crate::error::{AgentError, Result};
use crate::message::{Conversation, Message};
use crate::provider::{GenerationOptions, LlmClient};
use crate::tool::{ToolExecutor, ToolRegistry, ToolSpec};

/// Agent configuration
#[derive(Clone, Debug)]
pub struct AgentConfig {
    /// Name used in logs and as the expert key
    pub name: String,

    /// System prompt, fixed for the agent's lifetime
    pub system_prompt: String,

    /// Maximum model calls per `think` before giving up
    pub max_iterations: usize,

    /// Generation options
    pub generation: GenerationOptions,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            name: "agent".into(),
            system_prompt: DEFAULT_SYSTEM_PROMPT.into(),
            max_iterations: DEFAULT_MAX_ITERATIONS,
            generation: GenerationOptions::default(),
        }
    }
}

/// Tool rounds allowed per `think` when not configured
pub const DEFAULT_MAX_ITERATIONS: usize = 10;

const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant. Be concise and accurate.";

/// An LLM-backed agent with a persistent conversation
///
/// With no declared tools it is a plain chat agent; otherwise every `think`
/// runs the tool loop.
pub struct Agent {
    client: Arc<dyn LlmClient>,
    tools: Arc<ToolRegistry>,
    specs: Vec<ToolSpec>,
    config: AgentConfig,
    conversation: Conversation,
}

impl Agent {
    /// Create a new agent declaring every tool in `tools`
    pub fn new(client: Arc<dyn LlmClient>, tools: Arc<ToolRegistry>, config: AgentConfig) -> Self {
        Self::with_extra_specs(client, tools, Vec::new(), config)
    }

    /// Create an agent without tools
    pub fn plain(client: Arc<dyn LlmClient>, config: AgentConfig) -> Self {
        Self::new(client, Arc::new(ToolRegistry::new()), config)
    }

    /// Create an agent that also declares tools the registry cannot run
    ///
    /// Calls to those tools must be handled by the executor passed to
    /// [`Agent::think_with`].
    pub fn with_extra_specs(
        client: Arc<dyn LlmClient>,
        tools: Arc<ToolRegistry>,
        extra_specs: Vec<ToolSpec>,
        mut config: AgentConfig,
    ) -> Self {
        config.max_iterations = config.max_iterations.max(1);
        let mut specs = tools.describe();
        specs.extend(extra_specs);
        let conversation = Conversation::with_system_prompt(config.system_prompt.clone());

        Self {
            client,
            tools,
            specs,
            config,
            conversation,
        }
    }

    /// Send a user message and return the agent's final answer
    pub async fn think(&mut self, text: &str) -> Result<String> {
        let tools = Arc::clone(&self.tools);
        let mut executor: &ToolRegistry = &tools;
        self.think_with(text, &mut executor).await
    }

    /// Like [`Agent::think`], running tool calls through `executor`
    pub async fn think_with(&mut self, text: &str, executor: &mut dyn ToolExecutor) -> Result<String> {
        self.conversation.push(Message::user(text));

        if !self.is_tool_enabled() {
            tracing::debug!(agent = %self.config.name, conversation = %self.conversation.id(), "Plain completion");
            let reply = self
                .client
                .chat(self.conversation.messages(), &self.config.generation)
                .await?;
            self.conversation.push(Message::assistant(reply.clone()));
            return Ok(reply);
        }

        for iteration in 1..=self.config.max_iterations {
            tracing::debug!(
                agent = %self.config.name,
                conversation = %self.conversation.id(),
                iteration,
                "Requesting completion with tools"
            );

            let response = self
                .client
                .chat_with_tools(self.conversation.messages(), &self.specs, &self.config.generation)
                .await?;

            if response.is_final() {
                let reply = response.content.unwrap_or_default();
                self.conversation.push(Message::assistant(reply.clone()));
                return Ok(reply);
            }

            tracing::debug!(agent = %self.config.name, calls = response.tool_calls.len(), "Model requested tools");
            self.conversation
                .push(self.client.to_assistant_message_with_tools(&response));

            // Results go in strictly in call order, one at a time
            for call in &response.tool_calls {
                let result = executor.execute(call).await;
                self.conversation
                    .push(self.client.to_tool_result_message(&call.id, &result, &call.name));
            }
        }

        tracing::warn!(agent = %self.config.name, max = self.config.max_iterations, "Tool loop did not converge");
        Err(AgentError::MaxIterations(self.config.max_iterations))
    }

    /// Drop the conversation back to the system prompt
    pub fn reset(&mut self) {
        self.conversation.reset();
    }

    /// Whether any tool is declared to the model
    pub fn is_tool_enabled(&self) -> bool {
        !self.specs.is_empty()
    }

    /// Agent name
    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// The fixed system prompt
    pub fn system_prompt(&self) -> &str {
        self.conversation.system_prompt()
    }

    /// Full message history, system prompt first
    pub fn history(&self) -> &[Message] {
        self.conversation.messages()
    }

    /// Current conversation
    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    /// Declarations sent with every tool-enabled call
    pub fn tool_specs(&self) -> &[ToolSpec] {
        &self.specs
    }

    /// Get the tool registry
    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Get configuration
    pub fn config(&self) -> &AgentConfig {
        &self.config
    }
}

impl std::fmt::Debug for Agent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Agent")
            .field("name", &self.config.name)
            .field("provider", &self.client.name())
            .field("tools", &self.specs.iter().map(|s| s.name.as_str()).collect::<Vec<_>>())
            .field("messages", &self.conversation.len())
            .finish()
    }
}

/// Builder for Agent configuration
pub struct AgentBuilder {
    client: Option<Arc<dyn LlmClient>>,
    tools: Arc<ToolRegistry>,
    extra_specs: Vec<ToolSpec>,
    config: AgentConfig,
}

impl Default for AgentBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl AgentBuilder {
    pub fn new() -> Self {
        Self {
            client: None,
            tools: Arc::new(ToolRegistry::new()),
            extra_specs: Vec::new(),
            config: AgentConfig::default(),
        }
    }

    pub fn client(mut self, client: Arc<dyn LlmClient>) -> Self {
        self.client = Some(client);
        self
    }

    pub fn tools(mut self, tools: ToolRegistry) -> Self {
        self.tools = Arc::new(tools);
        self
    }

    pub fn shared_tools(mut self, tools: Arc<ToolRegistry>) -> Self {
        self.tools = tools;
        self
    }

    /// Declare a tool handled outside the registry
    pub fn tool_spec(mut self, spec: ToolSpec) -> Self {
        self.extra_specs.push(spec);
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.config.name = name.into();
        self
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.system_prompt = prompt.into();
        self
    }

    pub fn generation(mut self, generation: GenerationOptions) -> Self {
        self.config.generation = generation;
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.generation.model = Some(model.into());
        self
    }

    pub fn temperature(mut self, temp: f32) -> Self {
        self.config.generation.temperature = Some(temp);
        self
    }

    pub fn max_iterations(mut self, max: usize) -> Self {
        self.config.max_iterations = max;
        self
    }

    pub fn build(self) -> Result<Agent> {
        let client = self
            .client
            .ok_or_else(|| AgentError::Config("LLM client is required".into()))?;

        Ok(Agent::with_extra_specs(client, self.tools, self.extra_specs, self.config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Role;
    use crate::mock::{AdderTool, ScriptedClient};
    use crate::tool::ERROR_MARKER;
    use serde_json::json;

    fn tool_agent(client: Arc<ScriptedClient>, max_iterations: usize) -> Agent {
        let mut tools = ToolRegistry::new();
        tools.register(AdderTool).unwrap();
        AgentBuilder::new()
            .client(client)
            .tools(tools)
            .system_prompt("You add numbers.")
            .max_iterations(max_iterations)
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_plain_agent_uses_chat() {
        let client = Arc::new(ScriptedClient::new().then_text("Hello!"));
        let mut agent = Agent::plain(client.clone(), AgentConfig::default());

        assert!(!agent.is_tool_enabled());
        let reply = agent.think("Hi").await.unwrap();

        assert_eq!(reply, "Hello!");
        let roles: Vec<Role> = agent.history().iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![Role::System, Role::User, Role::Assistant]);
        assert!(client.calls()[0].tools.is_empty());
    }

    #[tokio::test]
    async fn test_loop_stops_on_kth_call() {
        let client = Arc::new(
            ScriptedClient::new()
                .then_tool_calls([("add", json!({"a": 1, "b": 1}))])
                .then_tool_calls([("add", json!({"a": 2, "b": 2}))])
                .then_text("All done"),
        );
        let mut agent = tool_agent(client.clone(), 10);

        let reply = agent.think("Add things").await.unwrap();

        assert_eq!(reply, "All done");
        assert_eq!(client.call_count(), 3);
        assert_eq!(client.calls()[0].tools, vec!["add"]);
        assert_eq!(agent.history().last().unwrap().text(), "All done");
    }

    #[tokio::test]
    async fn test_tool_results_follow_call_order() {
        let client = Arc::new(
            ScriptedClient::new()
                .then_tool_calls([
                    ("add", json!({"a": 1, "b": 2})),
                    ("teleport", json!({})),
                    ("add", json!({"a": 10, "b": 20})),
                ])
                .then_text("3 and 30"),
        );
        let mut agent = tool_agent(client.clone(), 10);

        agent.think("Go").await.unwrap();

        let history = agent.history();
        assert_eq!(history[2].role, Role::AssistantToolCall);
        let ids: Vec<&str> = history[2].tool_calls.iter().map(|c| c.id.as_str()).collect();

        let results = &history[3..6];
        assert!(results.iter().all(|m| m.role == Role::Tool));
        let result_ids: Vec<&str> = results.iter().filter_map(|m| m.tool_call_id.as_deref()).collect();
        assert_eq!(result_ids, ids);

        assert_eq!(results[0].text(), "3");
        assert!(results[1].text().starts_with(ERROR_MARKER));
        assert_eq!(results[2].text(), "30");
        assert_eq!(history[6].role, Role::Assistant);

        // The second call saw every result
        assert_eq!(client.calls()[1].history.len(), 6);
    }

    #[tokio::test]
    async fn test_iteration_guard() {
        let mut script = ScriptedClient::new();
        for _ in 0..5 {
            script = script.then_tool_calls([("add", json!({"a": 1, "b": 1}))]);
        }
        let client = Arc::new(script);
        let mut agent = tool_agent(client.clone(), 3);

        let err = agent.think("Loop forever").await.unwrap_err();

        assert!(matches!(err, AgentError::MaxIterations(3)));
        assert_eq!(client.call_count(), 3);
    }

    #[tokio::test]
    async fn test_provider_error_propagates() {
        let client = Arc::new(ScriptedClient::new().then_error("connection reset"));
        let mut agent = tool_agent(client, 10);

        let err = agent.think("Hi").await.unwrap_err();
        assert!(matches!(err, AgentError::Provider(msg) if msg == "connection reset"));
    }

    #[tokio::test]
    async fn test_history_persists_and_resets() {
        let client = Arc::new(ScriptedClient::new().then_text("one").then_text("two"));
        let mut agent = Agent::plain(
            client.clone(),
            AgentConfig {
                system_prompt: "Count.".into(),
                ..Default::default()
            },
        );

        agent.think("first").await.unwrap();
        agent.think("second").await.unwrap();

        assert_eq!(client.calls()[1].history.len(), 4);
        assert_eq!(agent.history().len(), 5);
        assert_eq!(agent.history()[0].role, Role::System);

        agent.reset();
        agent.reset();
        assert_eq!(agent.history().len(), 1);
        assert_eq!(agent.system_prompt(), "Count.");
    }

    #[test]
    fn test_builder_requires_client() {
        assert!(matches!(AgentBuilder::new().build(), Err(AgentError::Config(_))));
    }

    #[test]
    fn test_zero_iterations_clamped() {
        let agent = tool_agent(Arc::new(ScriptedClient::new()), 0);
        assert_eq!(agent.config().max_iterations, 1);
    }
}
