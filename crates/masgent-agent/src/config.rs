use serde::{Deserialize, Serialize};

/// OpenAI-compatible chat completion providers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    /// api.openai.com.
    #[default]
    OpenAi,
    /// openrouter.ai, which also wants attribution headers.
    OpenRouter,
    /// Groq cloud inference, OpenAI-compatible API.
    Groq,
}

/// The `[model]` section of the configuration file.
///
/// The API key is not part of it: keys are resolved separately at startup and
/// handed to the backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Which API family to talk to.
    pub provider: LlmProvider,
    /// Model name sent with every request.
    pub model_id: String,
    /// Overrides the provider's default endpoint.
    pub api_base_url: Option<String>,
    /// Omitted from requests when unset; some reasoning models reject it.
    pub temperature: Option<f32>,
    /// Upper bound on tokens generated per reply.
    pub max_tokens: u32,
    /// Number of most recent transcript messages resent to the model.
    pub max_history: usize,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            provider: LlmProvider::OpenAi,
            model_id: "gpt-5-nano".to_string(),
            api_base_url: None,
            temperature: None,
            max_tokens: 4096,
            max_history: 200,
        }
    }
}

impl ModelConfig {
    /// Endpoint root without a trailing slash.
    pub fn base_url(&self) -> &str {
        if let Some(url) = &self.api_base_url {
            url.trim_end_matches('/')
        } else {
            match self.provider {
                LlmProvider::OpenAi => "https://api.openai.com",
                LlmProvider::OpenRouter => "https://openrouter.ai/api",
                LlmProvider::Groq => "https://api.groq.com/openai",
            }
        }
    }

    /// Request field carrying the completion budget.
    pub(crate) fn max_tokens_field(&self) -> &'static str {
        match self.provider {
            LlmProvider::OpenAi => "max_completion_tokens",
            LlmProvider::OpenRouter | LlmProvider::Groq => "max_tokens",
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_serialization() {
        assert_eq!(serde_json::to_string(&LlmProvider::OpenAi).unwrap(), "\"openai\"");
        assert_eq!(
            serde_json::to_string(&LlmProvider::OpenRouter).unwrap(),
            "\"openrouter\""
        );
        let groq: LlmProvider = serde_json::from_str("\"groq\"").unwrap();
        assert_eq!(groq, LlmProvider::Groq);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: ModelConfig = serde_json::from_str(r#"{"provider": "groq"}"#).unwrap();
        assert_eq!(config.provider, LlmProvider::Groq);
        assert_eq!(config.model_id, "gpt-5-nano");
        assert_eq!(config.max_history, 200);
        assert!(config.temperature.is_none());
    }

    #[test]
    fn test_base_url_defaults_and_override() {
        let mut config = ModelConfig::default();
        assert_eq!(config.base_url(), "https://api.openai.com");
        config.provider = LlmProvider::OpenRouter;
        assert_eq!(config.base_url(), "https://openrouter.ai/api");
        config.api_base_url = Some("http://localhost:8080/".to_string());
        assert_eq!(config.base_url(), "http://localhost:8080");
    }

    #[test]
    fn test_max_tokens_field_per_provider() {
        let mut config = ModelConfig::default();
        assert_eq!(config.max_tokens_field(), "max_completion_tokens");
        config.provider = LlmProvider::Groq;
        assert_eq!(config.max_tokens_field(), "max_tokens");
    }
}
