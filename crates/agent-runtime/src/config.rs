//! Provider Configuration
//!
//! Selects the backend and carries its credentials. Values come from the
//! environment (`LLM_PROVIDER`, `OPENAI_API_KEY`, `GOOGLE_API_KEY`, ...);
//! parsing goes through a lookup function so it can be exercised without
//! touching the process environment.

use std::fmt;
use std::str::FromStr;

use agent_core::error::{AgentError, Result};

/// Supported LLM backends
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ProviderKind {
    #[default]
    OpenAi,
    Gemini,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 2] = [ProviderKind::OpenAi, ProviderKind::Gemini];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "openai",
            ProviderKind::Gemini => "gemini",
        }
    }

    /// Variables holding the API key, in lookup order
    pub fn api_key_vars(&self) -> &'static [&'static str] {
        match self {
            ProviderKind::OpenAi => &["OPENAI_API_KEY"],
            ProviderKind::Gemini => &["GOOGLE_API_KEY", "GEMINI_API_KEY"],
        }
    }

    fn base_url_var(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "OPENAI_BASE_URL",
            ProviderKind::Gemini => "GEMINI_BASE_URL",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = AgentError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(ProviderKind::OpenAi),
            "gemini" | "google" => Ok(ProviderKind::Gemini),
            other => Err(AgentError::Config(format!(
                "unknown provider '{}', expected one of: {}",
                other,
                ProviderKind::ALL.map(|k| k.as_str()).join(", ")
            ))),
        }
    }
}

/// Everything needed to construct a client
#[derive(Clone)]
pub struct ProviderConfig {
    pub kind: ProviderKind,
    pub api_key: String,
    /// Model override; the adapter default applies when unset
    pub model: Option<String>,
    /// Endpoint override, mainly for proxies and tests
    pub base_url: Option<String>,
    /// Seconds before a provider request is abandoned; no limit when unset
    pub timeout_secs: Option<u64>,
}

impl ProviderConfig {
    pub fn new(kind: ProviderKind, api_key: impl Into<String>) -> Self {
        Self {
            kind,
            api_key: api_key.into(),
            model: None,
            base_url: None,
            timeout_secs: None,
        }
    }

    /// Load from process environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_env_for(None)
    }

    /// Like [`ProviderConfig::from_env`], with the provider chosen by the caller
    pub fn from_env_for(kind: Option<ProviderKind>) -> Result<Self> {
        Self::from_lookup_for(kind, |key| std::env::var(key).ok())
    }

    /// Load from an arbitrary variable source. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        Self::from_lookup_for(None, lookup)
    }

    /// `kind` takes precedence over `LLM_PROVIDER`
    pub fn from_lookup_for<F>(kind: Option<ProviderKind>, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let kind = match (kind, get("LLM_PROVIDER")) {
            (Some(kind), _) => kind,
            (None, Some(name)) => name.parse()?,
            (None, None) => ProviderKind::default(),
        };

        let key_vars = kind.api_key_vars();
        let api_key = key_vars.iter().find_map(|var| get(*var)).ok_or_else(|| {
            AgentError::Config(format!("{} is not set (provider '{}')", key_vars.join(" or "), kind))
        })?;

        let timeout_secs = get("LLM_TIMEOUT_SECS")
            .map(|raw| {
                raw.parse::<u64>()
                    .map_err(|_| AgentError::Config(format!("LLM_TIMEOUT_SECS must be a whole number, got '{}'", raw)))
            })
            .transpose()?;

        Ok(Self {
            kind,
            api_key,
            model: get("LLM_MODEL"),
            base_url: get(kind.base_url_var()),
            timeout_secs,
        })
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }
}

impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("kind", &self.kind)
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_kind_parsing() {
        assert_eq!("OpenAI".parse::<ProviderKind>().unwrap(), ProviderKind::OpenAi);
        assert_eq!(" gemini ".parse::<ProviderKind>().unwrap(), ProviderKind::Gemini);

        let err = "ollama".parse::<ProviderKind>().unwrap_err();
        assert!(err.to_string().contains("openai, gemini"));
    }

    #[test]
    fn test_defaults_to_openai() {
        let config = ProviderConfig::from_lookup(lookup(&[("OPENAI_API_KEY", "sk-test")])).unwrap();
        assert_eq!(config.kind, ProviderKind::OpenAi);
        assert_eq!(config.api_key, "sk-test");
        assert!(config.model.is_none());
        assert_eq!(config.timeout_secs, None);
    }

    #[test]
    fn test_gemini_key_fallback() {
        let config = ProviderConfig::from_lookup(lookup(&[
            ("LLM_PROVIDER", "gemini"),
            ("GOOGLE_API_KEY", ""),
            ("GEMINI_API_KEY", "g-key"),
            ("LLM_MODEL", "gemini-1.5-pro"),
            ("GEMINI_BASE_URL", "http://localhost:9000"),
        ]))
        .unwrap();

        assert_eq!(config.kind, ProviderKind::Gemini);
        assert_eq!(config.api_key, "g-key");
        assert_eq!(config.model.as_deref(), Some("gemini-1.5-pro"));
        assert_eq!(config.base_url.as_deref(), Some("http://localhost:9000"));
    }

    #[test]
    fn test_explicit_kind_wins() {
        let config = ProviderConfig::from_lookup_for(
            Some(ProviderKind::Gemini),
            lookup(&[("LLM_PROVIDER", "openai"), ("GOOGLE_API_KEY", "g")]),
        )
        .unwrap();
        assert_eq!(config.kind, ProviderKind::Gemini);
        assert_eq!(config.api_key, "g");
    }

    #[test]
    fn test_missing_key_is_config_error() {
        let err = ProviderConfig::from_lookup(lookup(&[("LLM_PROVIDER", "gemini")])).unwrap_err();
        assert!(matches!(err, AgentError::Config(ref msg) if msg.contains("GOOGLE_API_KEY")));
    }

    #[test]
    fn test_timeout_only_when_configured() {
        let config = ProviderConfig::from_lookup(lookup(&[("OPENAI_API_KEY", "sk"), ("LLM_TIMEOUT_SECS", "30")])).unwrap();
        assert_eq!(config.timeout_secs, Some(30));
        assert_eq!(ProviderConfig::new(ProviderKind::Gemini, "g").timeout_secs, None);
    }

    #[test]
    fn test_bad_timeout() {
        let err = ProviderConfig::from_lookup(lookup(&[
            ("OPENAI_API_KEY", "sk"),
            ("LLM_TIMEOUT_SECS", "soon"),
        ]))
        .unwrap_err();
        assert!(matches!(err, AgentError::Config(_)));
    }

    #[test]
    fn test_debug_redacts_key() {
        let config = ProviderConfig::new(ProviderKind::OpenAi, "sk-secret");
        assert!(!format!("{:?}", config).contains("sk-secret"));
    }
}
