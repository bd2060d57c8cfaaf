use reqwest::header::AUTHORIZATION;
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;
use tracing::{debug, info, warn};

use blog_insights::config::LlmConfig;
use blog_insights::insights::{
    insight_prompt, mock_insights, mock_topic_ideas, parse_insights, parse_topic_ideas,
    topic_ideas_prompt, Insights, LlmAnalysisData, TopicIdea,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    OpenAi,
    Groq,
    Mock,
    None,
}

impl Provider {
    pub fn from_str(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "openai" => Some(Provider::OpenAi),
            "groq" => Some(Provider::Groq),
            "mock" => Some(Provider::Mock),
            "none" | "off" => Some(Provider::None),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Provider::OpenAi => "openai",
            Provider::Groq => "groq",
            Provider::Mock => "mock",
            Provider::None => "none",
        }
    }

    fn key_var(self) -> Option<&'static str> {
        match self {
            Provider::OpenAi => Some("OPENAI_API_KEY"),
            Provider::Groq => Some("GROQ_API_KEY"),
            _ => None,
        }
    }

    fn base_var(self) -> Option<&'static str> {
        match self {
            Provider::OpenAi => Some("OPENAI_API_BASE"),
            Provider::Groq => Some("GROQ_API_BASE"),
            _ => None,
        }
    }

    fn default_base(self) -> &'static str {
        match self {
            Provider::Groq => "https://api.groq.com/openai/v1",
            _ => "https://api.openai.com/v1",
        }
    }

    fn default_model(self) -> &'static str {
        match self {
            Provider::Groq => "llama-3.3-70b-versatile",
            _ => "gpt-4o-mini",
        }
    }
}

#[derive(Clone)]
struct Remote {
    client: reqwest::Client,
    api_key: String,
    api_base: String,
    model: String,
    temperature: f64,
}

/// Chat-completions client for OpenAI-compatible providers, or the offline generator.
#[derive(Clone)]
pub struct LlmClient {
    provider: Provider,
    remote: Option<Remote>,
}

impl LlmClient {
    /// Resolves the provider; a remote provider without its API key falls back to `mock`.
    /// Returns `None` when the provider is `none`.
    pub fn from_config(config: &LlmConfig, provider_override: Option<&str>) -> Result<Option<Self>, String> {
        let requested = provider_override.unwrap_or(config.provider.as_str());
        let provider = match Provider::from_str(requested) {
            Some(provider) => provider,
            None => {
                warn!(provider = requested, "unknown llm provider, using mock");
                Provider::Mock
            }
        };

        if provider == Provider::None {
            return Ok(None);
        }

        let Some(key_var) = provider.key_var() else {
            return Ok(Some(Self::mock()));
        };
        let Some(api_key) = env::var(key_var).ok().filter(|key| !key.trim().is_empty()) else {
            warn!(provider = provider.label(), key = key_var, "api key not set, using mock");
            return Ok(Some(Self::mock()));
        };

        let api_base = provider
            .base_var()
            .and_then(|var| env::var(var).ok())
            .filter(|base| !base.trim().is_empty())
            .unwrap_or_else(|| provider.default_base().to_string());
        let model = config
            .model
            .clone()
            .unwrap_or_else(|| provider.default_model().to_string());
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|err| format!("failed to build llm client: {}", err))?;

        Ok(Some(Self {
            provider,
            remote: Some(Remote {
                client,
                api_key,
                api_base,
                model,
                temperature: config.temperature,
            }),
        }))
    }

    pub fn mock() -> Self {
        Self {
            provider: Provider::Mock,
            remote: None,
        }
    }

    pub fn provider(&self) -> Provider {
        self.provider
    }

    pub async fn generate_insights(&self, data: &LlmAnalysisData) -> Result<Insights, String> {
        let Some(remote) = &self.remote else {
            return Ok(mock_insights(data));
        };
        let content = remote.complete(&insight_prompt(data)).await?;
        parse_insights(&content).map_err(|err| format!("{} insights: {}", self.provider.label(), err))
    }

    pub async fn generate_topic_ideas(&self, data: &LlmAnalysisData, count: usize) -> Result<Vec<TopicIdea>, String> {
        let Some(remote) = &self.remote else {
            return Ok(mock_topic_ideas(data, count));
        };
        let content = remote.complete(&topic_ideas_prompt(data, count)).await?;
        let mut ideas = parse_topic_ideas(&content)
            .map_err(|err| format!("{} topic ideas: {}", self.provider.label(), err))?;
        ideas.truncate(count);
        Ok(ideas)
    }
}

impl Remote {
    async fn complete(&self, prompt: &str) -> Result<String, String> {
        let url = format!("{}/chat/completions", self.api_base.trim_end_matches('/'));
        let request = ChatRequest {
            model: self.model.clone(),
            temperature: self.temperature,
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: system_prompt(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: prompt.to_string(),
                },
            ],
        };

        debug!(model = %self.model, prompt_chars = prompt.len(), "requesting completion");
        let response = self
            .client
            .post(url)
            .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await
            .map_err(|err| format!("LLM request failed: {}", err))?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            let detail = error_body.trim();
            if detail.is_empty() {
                return Err(format!("LLM API error: {}", status));
            }
            return Err(format!("LLM API error: {} {}", status, detail));
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|err| format!("LLM response parse failed: {}", err))?;

        let content = body
            .choices
            .first()
            .ok_or_else(|| "LLM response missing choices".to_string())?
            .message
            .content
            .trim()
            .to_string();
        info!(model = %self.model, chars = content.len(), "received completion");
        Ok(content)
    }
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f64,
}

#[derive(Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessageResponse,
}

#[derive(Deserialize)]
struct ChatMessageResponse {
    content: String,
}

fn system_prompt() -> String {
    let prompt = r#"You are an analytics assistant for technical bloggers.
Rules:
- Base every statement on the analysis data you are given.
- Output JSON only, no markdown or commentary.
"#;
    prompt.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_names_parse_case_insensitively() {
        assert_eq!(Provider::from_str("OpenAI"), Some(Provider::OpenAi));
        assert_eq!(Provider::from_str(" groq "), Some(Provider::Groq));
        assert_eq!(Provider::from_str("off"), Some(Provider::None));
        assert_eq!(Provider::from_str("claude"), None);
    }

    #[test]
    fn none_provider_disables_generation() {
        let config = LlmConfig::default();
        let client = LlmClient::from_config(&config, Some("none"));
        assert!(matches!(client, Ok(None)));
    }

    #[test]
    fn mock_provider_needs_no_key() {
        let config = LlmConfig::default();
        let client = LlmClient::from_config(&config, Some("mock"));
        assert!(matches!(client, Ok(Some(ref client)) if client.provider() == Provider::Mock));
    }
}
