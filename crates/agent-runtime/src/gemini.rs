//! Gemini LLM Client
//!
//! `generateContent` over HTTPS. Gemini has no call ids, so ids are
//! synthesized here, and its history is rebuilt from the normalized messages:
//! the assistant's call turn becomes `functionCall` parts on a `model` turn
//! and tool results become `functionResponse` parts on a `user` turn.

use std::sync::atomic::{AtomicU64, Ordering};

use agent_core::{
    error::{AgentError, Result},
    message::{Message, Role},
    provider::{GenerationOptions, LlmClient, LlmResponse},
    tool::{ToolCall, ToolSpec},
};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Map, Value};

use crate::config::ProviderConfig;
use crate::http;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Schema keywords Gemini's OpenAPI subset accepts
const SCHEMA_KEYS: [&str; 8] = [
    "type",
    "description",
    "enum",
    "properties",
    "items",
    "required",
    "nullable",
    "format",
];

/// Gemini chat client
pub struct GeminiClient {
    http: Client,
    api_key: String,
    base_url: String,
    model: String,
    call_counter: AtomicU64,
}

impl GeminiClient {
    /// Client for the public API with the default model
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::from_config(&ProviderConfig::new(crate::ProviderKind::Gemini, api_key))
    }

    pub fn from_config(config: &ProviderConfig) -> Result<Self> {
        Ok(Self {
            http: http::build_client(config.timeout_secs)?,
            api_key: config.api_key.clone(),
            base_url: config
                .base_url
                .as_deref()
                .unwrap_or(DEFAULT_BASE_URL)
                .trim_end_matches('/')
                .to_string(),
            model: config.model.clone().unwrap_or_else(|| DEFAULT_MODEL.into()),
            call_counter: AtomicU64::new(0),
        })
    }

    /// Split the history into the system instruction and `contents`
    fn encode_history(history: &[Message]) -> (Option<String>, Vec<Value>) {
        let mut system = None;
        let mut contents: Vec<Value> = Vec::new();

        for message in history {
            match message.role {
                Role::System => system = Some(message.text().to_string()),
                Role::User => contents.push(json!({
                    "role": "user",
                    "parts": [{"text": message.text()}],
                })),
                Role::Assistant => {
                    if !message.text().is_empty() {
                        contents.push(json!({
                            "role": "model",
                            "parts": [{"text": message.text()}],
                        }));
                    }
                }
                Role::AssistantToolCall => {
                    let mut parts: Vec<Value> = Vec::new();
                    if !message.text().is_empty() {
                        parts.push(json!({"text": message.text()}));
                    }
                    parts.extend(message.tool_calls.iter().map(|call| {
                        json!({"functionCall": {"name": call.name, "args": call.arguments_json()}})
                    }));
                    contents.push(json!({"role": "model", "parts": parts}));
                }
                Role::Tool => {
                    let part = json!({
                        "functionResponse": {
                            "name": message.name.as_deref().unwrap_or("tool"),
                            "response": {"result": message.text()},
                        }
                    });
                    // Results of one call turn travel together in a single user turn
                    match contents.last_mut() {
                        Some(last) if Self::is_function_response_turn(last) => {
                            if let Some(parts) = last["parts"].as_array_mut() {
                                parts.push(part);
                            }
                        }
                        _ => contents.push(json!({"role": "user", "parts": [part]})),
                    }
                }
            }
        }

        (system, contents)
    }

    fn is_function_response_turn(content: &Value) -> bool {
        content["role"] == "user"
            && content["parts"]
                .as_array()
                .is_some_and(|parts| parts.iter().all(|p| p.get("functionResponse").is_some()))
    }

    /// Translate a JSON schema into Gemini's dialect
    fn translate_schema(schema: &Value) -> Value {
        let Some(object) = schema.as_object() else {
            return schema.clone();
        };

        let mut out = Map::new();
        for key in SCHEMA_KEYS {
            let Some(value) = object.get(key) else {
                continue;
            };
            let translated = match key {
                "type" => match value.as_str() {
                    Some(t) => Value::String(t.to_ascii_uppercase()),
                    None => value.clone(),
                },
                "properties" => match value.as_object() {
                    Some(props) => Value::Object(
                        props
                            .iter()
                            .map(|(name, prop)| (name.clone(), Self::translate_schema(prop)))
                            .collect(),
                    ),
                    None => value.clone(),
                },
                "items" => Self::translate_schema(value),
                _ => value.clone(),
            };
            out.insert(key.to_string(), translated);
        }
        Value::Object(out)
    }

    fn encode_tools(tools: &[ToolSpec]) -> Value {
        let declarations: Vec<Value> = tools
            .iter()
            .map(|tool| {
                let mut declaration = json!({
                    "name": tool.name,
                    "description": tool.description,
                });
                if tool.has_parameters() {
                    declaration["parameters"] = Self::translate_schema(&tool.parameters);
                }
                declaration
            })
            .collect();
        json!([{ "functionDeclarations": declarations }])
    }

    fn payload(history: &[Message], tools: &[ToolSpec], options: &GenerationOptions) -> Value {
        let (system, contents) = Self::encode_history(history);
        let mut payload = json!({ "contents": contents });

        if let Some(system) = system {
            payload["systemInstruction"] = json!({"parts": [{"text": system}]});
        }
        if !tools.is_empty() {
            payload["tools"] = Self::encode_tools(tools);
        }

        let mut generation = Map::new();
        if let Some(temperature) = options.temperature {
            generation.insert("temperature".into(), json!(temperature));
        }
        if let Some(max_tokens) = options.max_tokens {
            generation.insert("maxOutputTokens".into(), json!(max_tokens));
        }
        if !generation.is_empty() {
            payload["generationConfig"] = Value::Object(generation);
        }
        payload
    }

    async fn post(&self, payload: Value, options: &GenerationOptions) -> Result<LlmResponse> {
        let model = options.model_or(&self.model);
        let url = format!("{}/models/{}:generateContent", self.base_url, model);
        tracing::debug!(model = %model, "Gemini generateContent request");

        let request = self
            .http
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&payload);
        let body = http::send_json(request, "gemini").await?;
        self.parse_response(body)
    }

    fn parse_response(&self, body: Value) -> Result<LlmResponse> {
        let candidate = body
            .pointer("/candidates/0")
            .ok_or_else(|| AgentError::Parse("Gemini response has no candidates".into()))?;

        let mut text = String::new();
        let mut tool_calls = Vec::new();

        // A candidate blocked by safety filters carries no content
        let parts = candidate
            .pointer("/content/parts")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();

        for part in parts {
            if let Some(call) = part.get("functionCall") {
                let id = self.call_counter.fetch_add(1, Ordering::Relaxed) + 1;
                let arguments = call
                    .get("args")
                    .and_then(Value::as_object)
                    .map(|args| args.clone().into_iter().collect())
                    .unwrap_or_default();
                tool_calls.push(ToolCall::new(
                    format!("gemini_call_{}", id),
                    call["name"].as_str().unwrap_or_default(),
                    arguments,
                ));
            } else if let Some(fragment) = part.get("text").and_then(Value::as_str) {
                text.push_str(fragment);
            }
        }

        Ok(LlmResponse {
            content: (!text.is_empty()).then_some(text),
            tool_calls,
            raw: body,
        })
    }
}

#[async_trait]
impl LlmClient for GeminiClient {
    fn name(&self) -> &str {
        "gemini"
    }

    fn default_model(&self) -> &str {
        &self.model
    }

    async fn chat(&self, history: &[Message], options: &GenerationOptions) -> Result<String> {
        let response = self.post(Self::payload(history, &[], options), options).await?;
        Ok(response.content.unwrap_or_default())
    }

    async fn chat_with_tools(
        &self,
        history: &[Message],
        tools: &[ToolSpec],
        options: &GenerationOptions,
    ) -> Result<LlmResponse> {
        self.post(Self::payload(history, tools, options), options).await
    }

    fn to_assistant_message_with_tools(&self, response: &LlmResponse) -> Message {
        let mut message = Message::assistant_tool_calls(response.tool_calls.clone());
        message.content.clone_from(&response.content);
        message
    }

    fn to_tool_result_message(&self, call_id: &str, result: &str, tool_name: &str) -> Message {
        let name = if tool_name.is_empty() { "tool" } else { tool_name };
        Message::tool(result, call_id, Some(name.to_string()))
    }
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish()
    }
}
