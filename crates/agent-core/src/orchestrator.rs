//! Expert Orchestration
//!
//! The orchestrator is a tool-enabled [`Agent`] that, besides the shared tool
//! registry, declares the reserved [`DELEGATE_TOOL`]. Calls to it are routed
//! to the named expert, whose final answer becomes the tool result.
//!
//! ```text
//! user ──▶ Orchestrator ──▶ chat_with_tools
//!               │
//!               ├── consult_expert ──▶ experts[name].think(query)
//!               └── other tools ─────▶ ToolRegistry::invoke
//! ```
//!
//! Each expert keeps its own conversation across delegations; the
//! orchestrator never reads or edits it.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::error::{AgentError, Result};
use crate::message::Message;
use crate::provider::{GenerationOptions, LlmClient};
use crate::reasoning::{Agent, AgentConfig};
use crate::tool::{
    string_arg, Arguments, ParameterSchema, ToolCall, ToolExecutor, ToolRegistry, ToolSpec,
    DELEGATE_TOOL, ERROR_MARKER,
};

const DEFAULT_ORCHESTRATOR_PROMPT: &str = "You coordinate a panel of experts. \
Answer directly when you can, use the available tools for calculations or the \
current time, and consult an expert when a question needs their specialty.";

/// Declaration of the delegation tool for the given expert names
pub fn delegate_spec(expert_names: &[&str]) -> ToolSpec {
    ToolSpec::new(
        DELEGATE_TOOL,
        "Consult a specialized expert and return their answer",
        &[
            ParameterSchema::new("expert_type", "string", "Which expert to consult")
                .required()
                .with_enum(expert_names.iter().copied()),
            ParameterSchema::new("query", "string", "The question for the expert, with all needed context")
                .required(),
        ],
    )
}

/// Top-level agent routing questions to experts
pub struct Orchestrator {
    agent: Agent,
    tools: Arc<ToolRegistry>,
    experts: BTreeMap<String, Agent>,
}

impl Orchestrator {
    pub fn builder() -> OrchestratorBuilder {
        OrchestratorBuilder::new()
    }

    /// Run one user turn, delegating to experts as the model requests
    pub async fn process(&mut self, text: &str) -> Result<String> {
        let mut delegation = Delegation {
            tools: &self.tools,
            experts: &mut self.experts,
        };
        self.agent.think_with(text, &mut delegation).await
    }

    /// Reset the orchestrator's conversation. Experts keep theirs.
    pub fn reset_conversation(&mut self) {
        self.agent.reset();
    }

    /// Reset the orchestrator and every expert
    pub fn reset_all(&mut self) {
        self.agent.reset();
        for expert in self.experts.values_mut() {
            expert.reset();
        }
    }

    /// Orchestrator history, system prompt first
    pub fn history(&self) -> &[Message] {
        self.agent.history()
    }

    /// Look up an expert
    pub fn expert(&self, name: &str) -> Option<&Agent> {
        self.experts.get(name)
    }

    /// Expert names, sorted
    pub fn expert_names(&self) -> Vec<&str> {
        self.experts.keys().map(String::as_str).collect()
    }

    /// The underlying agent
    pub fn agent(&self) -> &Agent {
        &self.agent
    }

    /// Every declaration the orchestrator's model sees
    pub fn tool_specs(&self) -> &[ToolSpec] {
        self.agent.tool_specs()
    }
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("agent", &self.agent)
            .field("experts", &self.expert_names())
            .finish()
    }
}

/// Executor used while the orchestrator thinks
struct Delegation<'a> {
    tools: &'a ToolRegistry,
    experts: &'a mut BTreeMap<String, Agent>,
}

impl Delegation<'_> {
    async fn consult(&mut self, arguments: &Arguments) -> String {
        let (expert_type, query) = match (
            string_arg(arguments, "expert_type"),
            string_arg(arguments, "query"),
        ) {
            (Ok(expert_type), Ok(query)) => (expert_type, query),
            (Err(e), _) | (_, Err(e)) => return format!("{} {}", ERROR_MARKER, e),
        };

        let Some(expert) = self.experts.get_mut(expert_type) else {
            warn!(expert = %expert_type, "Model asked for an unknown expert");
            return format!("{} no expert named '{}'", ERROR_MARKER, expert_type);
        };

        info!(expert = %expert_type, "Delegating to expert");
        match expert.think(query).await {
            Ok(answer) => answer,
            Err(e) => {
                warn!(expert = %expert_type, error = %e, "Expert failed");
                format!("{} expert '{}' failed: {}", ERROR_MARKER, expert_type, e)
            }
        }
    }
}

#[async_trait]
impl ToolExecutor for Delegation<'_> {
    async fn execute(&mut self, call: &ToolCall) -> String {
        if call.name == DELEGATE_TOOL {
            self.consult(&call.arguments).await
        } else {
            self.tools.invoke(&call.name, &call.arguments)
        }
    }
}

/// Builder for [`Orchestrator`]
pub struct OrchestratorBuilder {
    client: Option<Arc<dyn LlmClient>>,
    tools: Arc<ToolRegistry>,
    experts: Vec<Agent>,
    config: AgentConfig,
}

impl Default for OrchestratorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl OrchestratorBuilder {
    pub fn new() -> Self {
        Self {
            client: None,
            tools: Arc::new(ToolRegistry::new()),
            experts: Vec::new(),
            config: AgentConfig {
                name: "orchestrator".into(),
                system_prompt: DEFAULT_ORCHESTRATOR_PROMPT.into(),
                ..AgentConfig::default()
            },
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

    /// Add an expert, keyed by its agent name
    pub fn expert(mut self, expert: Agent) -> Self {
        self.experts.push(expert);
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

    pub fn max_iterations(mut self, max: usize) -> Self {
        self.config.max_iterations = max;
        self
    }

    pub fn build(self) -> Result<Orchestrator> {
        let client = self
            .client
            .ok_or_else(|| AgentError::Config("LLM client is required".into()))?;

        let mut experts = BTreeMap::new();
        for expert in self.experts {
            if expert.tool_specs().iter().any(|spec| spec.name == DELEGATE_TOOL) {
                return Err(AgentError::Config(format!(
                    "expert '{}' must not declare '{}'",
                    expert.name(),
                    DELEGATE_TOOL
                )));
            }
            let name = expert.name().to_string();
            if experts.insert(name.clone(), expert).is_some() {
                return Err(AgentError::Config(format!("duplicate expert '{}'", name)));
            }
        }

        let extra_specs = if experts.is_empty() {
            Vec::new()
        } else {
            let names: Vec<&str> = experts.keys().map(String::as_str).collect();
            vec![delegate_spec(&names)]
        };

        let agent = Agent::with_extra_specs(client, Arc::clone(&self.tools), extra_specs, self.config);
        Ok(Orchestrator {
            agent,
            tools: self.tools,
            experts,
        })
    }
}
