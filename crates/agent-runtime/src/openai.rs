//! OpenAI LLM Client
//!
//! Chat Completions over HTTPS. The assistant message that requested tools is
//! kept verbatim in `raw` and replayed as-is, so the `tool_calls` ids the API
//! later checks tool results against always match.

use agent_core::{
    error::{AgentError, Result},
    message::{Message, Role},
    provider::{GenerationOptions, LlmClient, LlmResponse},
    tool::{Arguments, ToolCall, ToolSpec},
};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use crate::config::ProviderConfig;
use crate::http;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// OpenAI chat client
pub struct OpenAiClient {
    http: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl OpenAiClient {
    /// Client for the public API with the default model
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::from_config(&ProviderConfig::new(crate::ProviderKind::OpenAi, api_key))
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
        })
    }

    fn encode_message(message: &Message) -> Value {
        if let Some(raw) = &message.raw {
            return raw.clone();
        }

        match message.role {
            Role::System | Role::User | Role::Assistant => json!({
                "role": message.role.to_string(),
                "content": message.text(),
            }),
            Role::AssistantToolCall => json!({
                "role": "assistant",
                "content": message.content,
                "tool_calls": message
                    .tool_calls
                    .iter()
                    .map(|call| json!({
                        "id": call.id,
                        "type": "function",
                        "function": {
                            "name": call.name,
                            "arguments": call.arguments_json().to_string(),
                        }
                    }))
                    .collect::<Vec<_>>(),
            }),
            Role::Tool => json!({
                "role": "tool",
                "tool_call_id": message.tool_call_id,
                "content": message.text(),
            }),
        }
    }

    fn encode_tools(tools: &[ToolSpec]) -> Vec<Value> {
        tools
            .iter()
            .map(|tool| {
                let parameters = if tool.parameters.is_object() {
                    tool.parameters.clone()
                } else {
                    json!({"type": "object", "properties": {}})
                };
                json!({
                    "type": "function",
                    "function": {
                        "name": tool.name,
                        "description": tool.description,
                        "parameters": parameters,
                    }
                })
            })
            .collect()
    }

    fn payload(&self, history: &[Message], tools: &[ToolSpec], options: &GenerationOptions) -> Value {
        let mut payload = json!({
            "model": options.model_or(&self.model),
            "messages": history.iter().map(Self::encode_message).collect::<Vec<_>>(),
        });

        if !tools.is_empty() {
            payload["tools"] = Value::Array(Self::encode_tools(tools));
            payload["tool_choice"] = json!("auto");
        }
        if let Some(temperature) = options.temperature {
            payload["temperature"] = json!(temperature);
        }
        if let Some(max_tokens) = options.max_tokens {
            payload["max_tokens"] = json!(max_tokens);
        }
        payload
    }

    async fn post(&self, payload: Value) -> Result<LlmResponse> {
        let url = format!("{}/chat/completions", self.base_url);
        tracing::debug!(model = %payload["model"], "OpenAI chat completion request");

        let request = self.http.post(&url).bearer_auth(&self.api_key).json(&payload);
        let body = http::send_json(request, "openai").await?;
        Self::parse_response(&body)
    }

    fn parse_response(body: &Value) -> Result<LlmResponse> {
        let message = body
            .pointer("/choices/0/message")
            .filter(|m| m.is_object())
            .ok_or_else(|| AgentError::Parse("OpenAI response has no choices".into()))?;

        let tool_calls = message
            .get("tool_calls")
            .and_then(Value::as_array)
            .map(|calls| calls.iter().map(Self::parse_tool_call).collect())
            .unwrap_or_default();

        Ok(LlmResponse {
            content: message.get("content").and_then(Value::as_str).map(str::to_string),
            tool_calls,
            raw: message.clone(),
        })
    }

    fn parse_tool_call(call: &Value) -> ToolCall {
        let id = call["id"].as_str().unwrap_or_default();
        let name = call["function"]["name"].as_str().unwrap_or_default();

        let arguments = match &call["function"]["arguments"] {
            Value::String(encoded) => serde_json::from_str::<Arguments>(encoded).unwrap_or_else(|e| {
                tracing::warn!(tool = %name, error = %e, "Undecodable tool arguments, using none");
                Arguments::new()
            }),
            Value::Object(map) => map.clone().into_iter().collect(),
            _ => Arguments::new(),
        };

        ToolCall::new(id, name, arguments)
    }
}

#[async_trait]
impl LlmClient for OpenAiClient {
    fn name(&self) -> &str {
        "openai"
    }

    fn default_model(&self) -> &str {
        &self.model
    }

    async fn chat(&self, history: &[Message], options: &GenerationOptions) -> Result<String> {
        let response = self.post(self.payload(history, &[], options)).await?;
        Ok(response.content.unwrap_or_default())
    }

    async fn chat_with_tools(
        &self,
        history: &[Message],
        tools: &[ToolSpec],
        options: &GenerationOptions,
    ) -> Result<LlmResponse> {
        self.post(self.payload(history, tools, options)).await
    }

    fn to_assistant_message_with_tools(&self, response: &LlmResponse) -> Message {
        let mut message = Message::assistant_tool_calls(response.tool_calls.clone());
        message.content.clone_from(&response.content);
        if response.raw.is_object() {
            message = message.with_raw(response.raw.clone());
        }
        message
    }

    fn to_tool_result_message(&self, call_id: &str, result: &str, tool_name: &str) -> Message {
        Message::tool(result, call_id, Some(tool_name.to_string()))
    }
}

impl std::fmt::Debug for OpenAiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiClient")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agent_core::tool::ParameterSchema;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn setup_mock_server(status: u16, response_body: Value) -> (MockServer, OpenAiClient) {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer test_api_key"))
            .respond_with(ResponseTemplate::new(status).set_body_json(response_body))
            .mount(&mock_server)
            .await;

        let config = ProviderConfig::new(crate::ProviderKind::OpenAi, "test_api_key")
            .with_base_url(mock_server.uri());
        let client = OpenAiClient::from_config(&config).unwrap();
        (mock_server, client)
    }

    fn add_spec() -> ToolSpec {
        ToolSpec::new(
            "add",
            "Add two numbers",
            &[
                ParameterSchema::new("a", "number", "First").required(),
                ParameterSchema::new("b", "number", "Second").required(),
            ],
        )
    }

    fn tool_call_body() -> Value {
        json!({
            "id": "chatcmpl-tool",
            "choices": [{
                "index": 0,
                "message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [
                        {"id": "call_1", "type": "function", "function": {"name": "add", "arguments": "{\"a\":2,\"b\":3}"}},
                        {"id": "call_2", "type": "function", "function": {"name": "add", "arguments": "not json"}}
                    ]
                },
                "finish_reason": "tool_calls"
            }]
        })
    }

    #[tokio::test]
    async fn test_chat_basic() {
        let body = json!({
            "choices": [{"index": 0, "message": {"role": "assistant", "content": "Hello!"}, "finish_reason": "stop"}]
        });
        let (server, client) = setup_mock_server(200, body).await;

        let history = vec![Message::system("Be nice."), Message::user("Hi")];
        let reply = client.chat(&history, &GenerationOptions::default()).await.unwrap();
        assert_eq!(reply, "Hello!");

        let requests = server.received_requests().await.unwrap();
        let sent: Value = requests[0].body_json().unwrap();
        assert_eq!(sent["model"], DEFAULT_MODEL);
        assert_eq!(sent["messages"][0], json!({"role": "system", "content": "Be nice."}));
        assert!(sent.get("tools").is_none());
    }

    #[tokio::test]
    async fn test_tool_request_parsing() {
        let (server, client) = setup_mock_server(200, tool_call_body()).await;

        let response = client
            .chat_with_tools(&[Message::user("2+3?")], &[add_spec()], &GenerationOptions::for_model("gpt-4o"))
            .await
            .unwrap();

        assert!(!response.is_final());
        assert_eq!(response.tool_calls.len(), 2);
        assert_eq!(response.tool_calls[0].id, "call_1");
        assert_eq!(response.tool_calls[0].arguments["a"], json!(2));
        assert!(response.tool_calls[1].arguments.is_empty());
        assert_eq!(response.raw["tool_calls"][0]["id"], "call_1");

        let sent: Value = server.received_requests().await.unwrap()[0].body_json().unwrap();
        assert_eq!(sent["model"], "gpt-4o");
        assert_eq!(sent["tool_choice"], "auto");
        assert_eq!(sent["tools"][0]["type"], "function");
        assert_eq!(sent["tools"][0]["function"]["name"], "add");
        assert_eq!(sent["tools"][0]["function"]["parameters"]["required"], json!(["a", "b"]));
    }

    #[tokio::test]
    async fn test_history_replays_raw_and_tool_results() {
        let body = json!({"choices": [{"message": {"role": "assistant", "content": "5"}}]});
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(body_partial_json(json!({
                "messages": [
                    {"role": "user", "content": "2+3?"},
                    {"role": "assistant", "tool_calls": [{"id": "call_1"}]},
                    {"role": "tool", "tool_call_id": "call_1", "content": "5"}
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .expect(1)
            .mount(&mock_server)
            .await;

        let config = ProviderConfig::new(crate::ProviderKind::OpenAi, "k").with_base_url(mock_server.uri());
        let client = OpenAiClient::from_config(&config).unwrap();

        let first = OpenAiClient::parse_response(&tool_call_body()).unwrap();
        let history = vec![
            Message::user("2+3?"),
            client.to_assistant_message_with_tools(&first),
            client.to_tool_result_message("call_1", "5", "add"),
        ];

        let response = client.chat_with_tools(&history, &[add_spec()], &GenerationOptions::default()).await.unwrap();
        assert_eq!(response.text(), "5");
    }

    #[test]
    fn test_synthesized_tool_call_turn() {
        let mut args = Arguments::new();
        args.insert("a".into(), json!(1));
        let message = Message::assistant_tool_calls(vec![ToolCall::new("call_9", "add", args)]);

        let encoded = OpenAiClient::encode_message(&message);
        assert_eq!(encoded["role"], "assistant");
        assert_eq!(encoded["tool_calls"][0]["function"]["arguments"], "{\"a\":1}");
    }

    #[test]
    fn test_missing_schema_becomes_empty_object() {
        let encoded = OpenAiClient::encode_tools(&[
            ToolSpec::from_json_schema("ping", "Ping", Value::Null),
            add_spec(),
        ]);
        assert_eq!(encoded[0]["function"]["parameters"], json!({"type": "object", "properties": {}}));
        assert_eq!(encoded[1]["function"]["parameters"]["required"], json!(["a", "b"]));
    }

    #[tokio::test]
    async fn test_error_statuses() {
        let (_server, client) = setup_mock_server(401, json!({"error": {"message": "Incorrect API key"}})).await;
        let err = client.chat(&[Message::user("Hi")], &GenerationOptions::default()).await.unwrap_err();
        assert!(matches!(err, AgentError::Auth(ref m) if m == "Incorrect API key"));

        let (_server, client) = setup_mock_server(429, json!({"error": {"message": "slow down"}})).await;
        let err = client.chat(&[Message::user("Hi")], &GenerationOptions::default()).await.unwrap_err();
        assert!(matches!(err, AgentError::RateLimited(_)));
        assert!(err.is_retryable());

        let (_server, client) = setup_mock_server(500, json!({"error": {"message": "boom"}})).await;
        let err = client.chat(&[Message::user("Hi")], &GenerationOptions::default()).await.unwrap_err();
        assert!(matches!(err, AgentError::Api { status: 500, .. }));
    }

    #[tokio::test]
    async fn test_missing_choices_is_parse_error() {
        let (_server, client) = setup_mock_server(200, json!({"choices": []})).await;
        let err = client.chat(&[Message::user("Hi")], &GenerationOptions::default()).await.unwrap_err();
        assert!(matches!(err, AgentError::Parse(_)));
    }

    #[tokio::test]
    async fn test_unreachable_server() {
        let config = ProviderConfig::new(crate::ProviderKind::OpenAi, "k").with_base_url("http://127.0.0.1:9");
        let client = OpenAiClient::from_config(&config).unwrap();
        let err = client.chat(&[Message::user("Hi")], &GenerationOptions::default()).await.unwrap_err();
        assert!(matches!(err, AgentError::ProviderUnavailable(_)));
    }
}
