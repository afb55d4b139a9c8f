//! Tool System
//!
//! Declarative tool catalog advertised to the model, plus the synchronous
//! dispatcher the agent loop uses to run the calls the model requests.
//! Dispatch never fails for the caller: every problem comes back as text
//! starting with [`ERROR_MARKER`] so the model can see it and adapt.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{AgentError, Result};

/// Name of the delegation tool. Only the orchestrator may execute it.
pub const DELEGATE_TOOL: &str = "consult_expert";

/// Prefix of every error produced through [`ToolRegistry::invoke`]
pub const ERROR_MARKER: &str = "Error:";

/// Tool arguments as key-value pairs
pub type Arguments = HashMap<String, Value>;

/// Tool call request from the LLM
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Call ID used to correlate the result
    pub id: String,

    /// Tool identifier
    pub name: String,

    /// Arguments as key-value pairs
    #[serde(default)]
    pub arguments: Arguments,
}

impl ToolCall {
    pub fn new(id: impl Into<String>, name: impl Into<String>, arguments: Arguments) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments,
        }
    }

    /// Arguments as a JSON object
    pub fn arguments_json(&self) -> Value {
        Value::Object(self.arguments.clone().into_iter().collect())
    }
}

/// Parameter definition, rendered into the tool's JSON schema
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ParameterSchema {
    /// Parameter name
    pub name: String,

    /// JSON Schema type (string, number, boolean, object, array)
    #[serde(rename = "type")]
    pub param_type: String,

    /// Human-readable description
    pub description: String,

    /// Whether this parameter is required
    #[serde(default)]
    pub required: bool,

    /// Default value if not provided
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,

    /// Enum of allowed values
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<Value>>,

    /// Element schema for array parameters
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Value>,
}

impl ParameterSchema {
    pub fn new(
        name: impl Into<String>,
        param_type: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            param_type: param_type.into(),
            description: description.into(),
            required: false,
            default: None,
            enum_values: None,
            items: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }

    pub fn with_enum<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.enum_values = Some(values.into_iter().map(|v| Value::String(v.into())).collect());
        self
    }

    pub fn with_items(mut self, items: Value) -> Self {
        self.items = Some(items);
        self
    }

    fn to_property(&self) -> Value {
        let mut property = json!({
            "type": self.param_type,
            "description": self.description,
        });
        if let Some(values) = &self.enum_values {
            property["enum"] = Value::Array(values.clone());
        }
        if let Some(items) = &self.items {
            property["items"] = items.clone();
        }
        if let Some(default) = &self.default {
            property["default"] = default.clone();
        }
        property
    }
}

/// Tool declaration advertised to the model
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ToolSpec {
    /// Unique tool identifier
    pub name: String,

    /// Human-readable description (shown to LLM)
    pub description: String,

    /// JSON-schema object describing the arguments
    pub parameters: Value,
}

impl ToolSpec {
    /// Build a spec from parameter definitions
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: &[ParameterSchema],
    ) -> Self {
        let properties: serde_json::Map<String, Value> = parameters
            .iter()
            .map(|p| (p.name.clone(), p.to_property()))
            .collect();
        let required: Vec<&str> = parameters
            .iter()
            .filter(|p| p.required)
            .map(|p| p.name.as_str())
            .collect();

        Self::from_json_schema(
            name,
            description,
            json!({
                "type": "object",
                "properties": properties,
                "required": required,
            }),
        )
    }

    /// Build a spec from a ready-made JSON schema
    pub fn from_json_schema(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: Value,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
        }
    }

    /// Names listed under the schema's `required` key
    pub fn required_parameters(&self) -> Vec<&str> {
        self.parameters
            .get("required")
            .and_then(Value::as_array)
            .map(|names| names.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }

    /// Whether the schema declares at least one property
    pub fn has_parameters(&self) -> bool {
        self.parameters
            .get("properties")
            .and_then(Value::as_object)
            .is_some_and(|props| !props.is_empty())
    }
}

/// Tool trait - implement to add new capabilities
///
/// Tools are pure functions of their arguments and must not touch agent state.
pub trait Tool: Send + Sync {
    /// Get the tool's declaration for LLM function calling
    fn schema(&self) -> ToolSpec;

    /// Execute the tool with given arguments
    fn execute(&self, arguments: &Arguments) -> Result<String>;

    /// Validate arguments before execution
    fn validate(&self, arguments: &Arguments) -> Result<()> {
        let schema = self.schema();

        for name in schema.required_parameters() {
            if !arguments.contains_key(name) {
                return Err(AgentError::ToolValidation(format!(
                    "Missing required parameter: {}",
                    name
                )));
            }
        }

        Ok(())
    }
}

/// Read a finite numeric argument
pub fn number_arg(arguments: &Arguments, name: &str) -> Result<f64> {
    let value = match arguments.get(name) {
        Some(Value::Number(n)) => n
            .as_f64()
            .ok_or_else(|| AgentError::ToolValidation(format!("'{}' is not a finite number", name))),
        // Models occasionally quote numbers
        Some(Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| AgentError::ToolValidation(format!("'{}' must be a number, got \"{}\"", name, s))),
        Some(other) => Err(AgentError::ToolValidation(format!(
            "'{}' must be a number, got {}",
            name, other
        ))),
        None => Err(AgentError::ToolValidation(format!("Missing required parameter: {}", name))),
    }?;

    // f64 parsing accepts "NaN" and "inf"
    if value.is_finite() {
        Ok(value)
    } else {
        Err(AgentError::ToolValidation(format!("'{}' is not a finite number", name)))
    }
}

/// Read a string argument
pub fn string_arg<'a>(arguments: &'a Arguments, name: &str) -> Result<&'a str> {
    match arguments.get(name) {
        Some(Value::String(s)) => Ok(s),
        Some(other) => Err(AgentError::ToolValidation(format!(
            "'{}' must be a string, got {}",
            name, other
        ))),
        None => Err(AgentError::ToolValidation(format!("Missing required parameter: {}", name))),
    }
}

/// Registry for available tools, in registration order
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: Vec<(ToolSpec, Arc<dyn Tool>)>,
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry").field("tools", &self.names()).finish()
    }
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new tool, replacing any tool with the same name
    pub fn register<T: Tool + 'static>(&mut self, tool: T) -> Result<()> {
        self.register_shared(Arc::new(tool))
    }

    /// Register a shared tool
    pub fn register_shared(&mut self, tool: Arc<dyn Tool>) -> Result<()> {
        let spec = tool.schema();
        if spec.name == DELEGATE_TOOL {
            return Err(AgentError::Config(format!(
                "'{}' is reserved for expert delegation",
                DELEGATE_TOOL
            )));
        }

        match self.tools.iter_mut().find(|(existing, _)| existing.name == spec.name) {
            Some(slot) => *slot = (spec, tool),
            None => self.tools.push((spec, tool)),
        }
        Ok(())
    }

    /// Get a tool by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools
            .iter()
            .find(|(spec, _)| spec.name == name)
            .map(|(_, tool)| Arc::clone(tool))
    }

    /// Declarations of every tool, in registration order
    pub fn describe(&self) -> Vec<ToolSpec> {
        self.tools.iter().map(|(spec, _)| spec.clone()).collect()
    }

    /// Run a tool by name. Failures come back as [`ERROR_MARKER`] text.
    pub fn invoke(&self, name: &str, arguments: &Arguments) -> String {
        tracing::debug!(tool = %name, ?arguments, "Executing tool");

        match self.try_invoke(name, arguments) {
            Ok(output) => output,
            Err(e) => {
                tracing::debug!(tool = %name, error = %e, "Tool reported an error");
                format!("{} {}", ERROR_MARKER, e)
            }
        }
    }

    fn try_invoke(&self, name: &str, arguments: &Arguments) -> Result<String> {
        if name == DELEGATE_TOOL {
            return Err(AgentError::ToolExecution(format!(
                "'{}' is only available to the orchestrator",
                DELEGATE_TOOL
            )));
        }

        let tool = self
            .get(name)
            .ok_or_else(|| AgentError::ToolNotFound(name.to_string()))?;

        tool.validate(arguments)?;
        tool.execute(arguments)
    }

    /// A registry holding only the named tools, in this registry's order
    pub fn subset(&self, names: &[&str]) -> Self {
        Self {
            tools: self
                .tools
                .iter()
                .filter(|(spec, _)| names.contains(&spec.name.as_str()))
                .cloned()
                .collect(),
        }
    }

    /// Get tool names
    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|(spec, _)| spec.name.as_str()).collect()
    }

    /// Number of registered tools
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

/// Executes tool calls on behalf of the agent loop
///
/// The registry is the default executor; the orchestrator wraps it to
/// intercept delegation.
#[async_trait]
pub trait ToolExecutor: Send {
    /// Run one call and produce the text fed back to the model
    async fn execute(&mut self, call: &ToolCall) -> String;
}

#[async_trait]
impl<'a> ToolExecutor for &'a ToolRegistry {
    async fn execute(&mut self, call: &ToolCall) -> String {
        self.invoke(&call.name, &call.arguments)
    }
}
