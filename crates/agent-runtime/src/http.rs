//! Shared HTTP plumbing for the provider adapters

use std::time::Duration;

use agent_core::error::{AgentError, Result};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde_json::Value;

/// HTTP client for one adapter; requests are unbounded unless a timeout is given
pub(crate) fn build_client(timeout_secs: Option<u64>) -> Result<Client> {
    let mut builder = Client::builder();
    if let Some(secs) = timeout_secs {
        builder = builder.timeout(Duration::from_secs(secs));
    }
    builder
        .build()
        .map_err(|e| AgentError::Config(format!("failed to build HTTP client: {}", e)))
}

/// Send a request and decode the JSON body, mapping failures onto [`AgentError`]
pub(crate) async fn send_json(request: RequestBuilder, provider: &str) -> Result<Value> {
    let response = request
        .send()
        .await
        .map_err(|e| AgentError::ProviderUnavailable(format!("{}: {}", provider, e)))?;

    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| AgentError::ProviderUnavailable(format!("{}: {}", provider, e)))?;

    if !status.is_success() {
        return Err(status_error(status, &body));
    }

    serde_json::from_str(&body)
        .map_err(|e| AgentError::Parse(format!("{} returned an undecodable body: {}", provider, e)))
}

fn status_error(status: StatusCode, body: &str) -> AgentError {
    let message = error_message(body);
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => AgentError::Auth(message),
        StatusCode::TOO_MANY_REQUESTS => AgentError::RateLimited(message),
        _ => AgentError::Api {
            status: status.as_u16(),
            message,
        },
    }
}

/// Both vendors report `{"error": {"message": ...}}`; anything else is passed through
fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
        .unwrap_or_else(|| body.chars().take(500).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let body = r#"{"error": {"message": "bad key"}}"#;
        assert!(matches!(status_error(StatusCode::UNAUTHORIZED, body), AgentError::Auth(m) if m == "bad key"));
        assert!(matches!(status_error(StatusCode::FORBIDDEN, body), AgentError::Auth(_)));
        assert!(matches!(status_error(StatusCode::TOO_MANY_REQUESTS, body), AgentError::RateLimited(_)));
        assert!(matches!(
            status_error(StatusCode::BAD_GATEWAY, "upstream down"),
            AgentError::Api { status: 502, ref message } if message == "upstream down"
        ));
    }
}
