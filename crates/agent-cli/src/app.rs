//! Session State
//!
//! One orchestrator per terminal session plus the line handling the REPL
//! and the demo share.

use agent_core::Orchestrator;
use agent_runtime::{available_models, ProviderKind};

/// Words that end the session, compared case-insensitively
pub const EXIT_WORDS: &[&str] = &["salir", "exit", "quit"];

/// Clears the orchestrator and every expert
pub const RESET_COMMAND: &str = "/reset";

/// Questions the `demo` subcommand walks through
pub const DEMO_QUESTIONS: &[&str] = &[
    "What is 15 + 27?",
    "What time is it?",
    "Explain what recursion is in programming",
    "Help me write a professional email asking for vacation",
];

/// What a single input line led to
#[derive(Debug, PartialEq, Eq)]
pub enum Outcome {
    Exit,
    Skip,
    Reset,
    Reply(String),
    /// User-facing description of the failure; the session continues
    Failed(String),
}

/// Terminal session state
pub struct App {
    orchestrator: Orchestrator,
    provider: ProviderKind,
}

impl App {
    pub fn new(orchestrator: Orchestrator, provider: ProviderKind) -> Self {
        Self { orchestrator, provider }
    }

    pub async fn handle_line(&mut self, line: &str) -> Outcome {
        let line = line.trim();
        if line.is_empty() {
            return Outcome::Skip;
        }

        let lowered = line.to_lowercase();
        if EXIT_WORDS.contains(&lowered.as_str()) {
            return Outcome::Exit;
        }
        if lowered == RESET_COMMAND {
            self.orchestrator.reset_all();
            tracing::info!("Conversation reset");
            return Outcome::Reset;
        }

        match self.orchestrator.process(line).await {
            Ok(reply) => Outcome::Reply(reply),
            Err(e) => {
                tracing::error!(error = %e, retryable = e.is_retryable(), "Request failed");
                Outcome::Failed(e.user_message())
            }
        }
    }

    pub fn banner(&self) -> String {
        let rule = "=".repeat(60);
        let models = available_models(self.provider);
        let shown: Vec<&str> = models.iter().take(2).copied().collect();

        let mut lines = vec![
            rule.clone(),
            "  MULTI-AGENT ASSISTANT".to_string(),
            rule.clone(),
            format!("  Provider: {}", self.provider.as_str().to_uppercase()),
            format!("  Models:   {}", shown.join(", ")),
            format!("  Experts:  {}", self.orchestrator.expert_names().join(", ")),
            String::new(),
            "  Capabilities:".to_string(),
            "    - Math operations (calculator)".to_string(),
            "    - Current date and time".to_string(),
            "    - Recipe calorie counts".to_string(),
            "    - Delegation to specialist experts".to_string(),
            String::new(),
            "  Try asking:".to_string(),
        ];
        lines.extend(DEMO_QUESTIONS.iter().map(|q| format!("    - {q}")));
        lines.push(String::new());
        lines.push(format!("  Type '{}' to quit, '{}' to start over", EXIT_WORDS[0], RESET_COMMAND));
        lines.push(rule);
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use agent_core::mock::ScriptedClient;
    use expert_panel::PanelOptions;
    use serde_json::json;

    fn app(client: Arc<ScriptedClient>) -> App {
        let orchestrator = expert_panel::standard_orchestrator(client, &PanelOptions::default()).unwrap();
        App::new(orchestrator, ProviderKind::OpenAi)
    }

    #[tokio::test]
    async fn test_control_lines_skip_the_model() {
        let client = Arc::new(ScriptedClient::new());
        let mut app = app(client.clone());

        assert_eq!(app.handle_line("   ").await, Outcome::Skip);
        assert_eq!(app.handle_line("SALIR").await, Outcome::Exit);
        assert_eq!(app.handle_line(" quit ").await, Outcome::Exit);
        assert_eq!(app.handle_line("/reset").await, Outcome::Reset);
        assert_eq!(client.call_count(), 0);
    }

    #[tokio::test]
    async fn test_reply_and_reset() {
        let client = Arc::new(
            ScriptedClient::new()
                .then_tool_calls([("calculator", json!({"operation": "add", "a": 15, "b": 27}))])
                .then_text("15 + 27 = 42"),
        );
        let mut app = app(client);

        assert_eq!(app.handle_line("What is 15 + 27?").await, Outcome::Reply("15 + 27 = 42".into()));
        assert_eq!(app.orchestrator.history().len(), 5);

        app.handle_line("/reset").await;
        assert_eq!(app.orchestrator.history().len(), 1);
    }

    #[tokio::test]
    async fn test_failure_keeps_session_alive() {
        let client = Arc::new(ScriptedClient::new().then_error("boom").then_text("Back again"));
        let mut app = app(client);

        match app.handle_line("hello").await {
            Outcome::Failed(message) => assert!(message.contains("boom")),
            other => panic!("expected failure, got {other:?}"),
        }
        assert_eq!(app.handle_line("hello again").await, Outcome::Reply("Back again".into()));
    }

    #[test]
    fn test_banner() {
        let banner = app(Arc::new(ScriptedClient::new())).banner();
        assert!(banner.contains("Provider: OPENAI"));
        assert!(banner.contains("Models:   gpt-4o-mini, gpt-4o\n"));
        assert!(banner.contains("cocina, codigo, escritura, matematicas"));
        assert!(banner.contains("Type 'salir' to quit"));
    }
}
