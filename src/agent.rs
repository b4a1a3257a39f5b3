//! LLM agent module.
//!
//! The language model sits behind the `LanguageModel` trait so the pipeline can
//! run against stubs. `GeminiModelClient` is the production implementation,
//! built on rstructor's Gemini client.

use crate::config::Config;
use crate::prompt::ComposedPrompt;
use async_trait::async_trait;
use rstructor::{GeminiClient, GeminiModel, LLMClient};
use std::fmt;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum AgentError {
    #[error("LLM request failed: {0}")]
    RequestFailed(String),
    #[error("LLM quota exceeded: {0}")]
    QuotaExceeded(String),
    #[error("LLM authentication failed: {0}")]
    Authentication(String),
    #[error("LLM returned an empty completion")]
    EmptyCompletion,
    #[error("configuration error: {0}")]
    ConfigError(#[from] crate::config::ConfigError),
}

impl AgentError {
    /// Classify a provider error message into one of the named failures
    pub fn from_provider_message(message: impl Into<String>) -> Self {
        let message = message.into();
        let lower = message.to_lowercase();
        if lower.contains("429")
            || lower.contains("quota")
            || lower.contains("resource_exhausted")
        {
            AgentError::QuotaExceeded(message)
        } else if lower.contains("401")
            || lower.contains("403")
            || lower.contains("api key")
            || lower.contains("permission_denied")
            || lower.contains("unauthenticated")
        {
            AgentError::Authentication(message)
        } else {
            AgentError::RequestFailed(message)
        }
    }
}

/// A text-in, text-out language model
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Send one prompt and return the raw completion text
    async fn complete(&self, prompt: &str) -> Result<String, AgentError>;
}

/// Gemini-backed language model
pub struct GeminiModelClient {
    client: GeminiClient,
}

impl GeminiModelClient {
    /// Build the client from config. Fails if the Gemini key is missing.
    pub fn from_config(config: &Config) -> Result<Self, AgentError> {
        let api_key = config.api_key()?;

        // Parse the model from config
        let model = parse_gemini_model(&config.agent.model);

        let client = GeminiClient::new(api_key)
            .map_err(|e| AgentError::RequestFailed(e.to_string()))?
            .model(model)
            .temperature(config.agent.temperature);

        Ok(Self { client })
    }
}

#[async_trait]
impl LanguageModel for GeminiModelClient {
    async fn complete(&self, prompt: &str) -> Result<String, AgentError> {
        debug!(prompt_chars = prompt.chars().count(), "sending prompt to gemini");

        let result = self
            .client
            .generate_with_metadata(prompt)
            .await
            .map_err(|e| AgentError::from_provider_message(e.to_string()))?;

        Ok(result.text)
    }
}

/// Raw itinerary text as produced by the model
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Itinerary(String);

impl Itinerary {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The text with `**` bold markers removed, for terminal output
    pub fn without_bold(&self) -> String {
        self.0.replace("**", "")
    }
}

impl fmt::Display for Itinerary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Run the itinerary generation call. One attempt; failures are returned.
pub async fn generate(
    model: &dyn LanguageModel,
    prompt: &ComposedPrompt,
) -> Result<Itinerary, AgentError> {
    let text = model.complete(prompt.as_str()).await?;

    if text.trim().is_empty() {
        return Err(AgentError::EmptyCompletion);
    }

    debug!(chars = text.chars().count(), "received itinerary");
    Ok(Itinerary(text))
}

/// Strip markdown code block wrappers from a model response
pub(crate) fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();

    // Remove ```json ... ``` or ``` ... ```
    if let Some(rest) = trimmed.strip_prefix("```") {
        let body = match rest.find('\n') {
            Some(newline) => &rest[newline + 1..],
            None => rest,
        };

        if let Some(end_idx) = body.rfind("```") {
            return body[..end_idx].trim();
        }
        return body.trim();
    }

    trimmed
}

/// Parse a model string into a GeminiModel
fn parse_gemini_model(model: &str) -> GeminiModel {
    match model {
        "gemini-2.0-flash" => GeminiModel::Gemini20Flash,
        "gemini-2.5-flash" => GeminiModel::Gemini25Flash,
        "gemini-2.5-pro" => GeminiModel::Gemini25Pro,
        _ => GeminiModel::Gemini20Flash, // Default
    }
}


#[cfg(test)]
mod tests {
    use super::testing::ScriptedModel;
    use super::*;
    use crate::prompt::{compose, PromptSettings};
    use crate::trip::TripRequest;
    use crate::weather::WeatherSummary;

    fn prompt() -> ComposedPrompt {
        compose(
            &TripRequest::bare("a week somewhere"),
            &WeatherSummary::unavailable("", crate::weather::UnavailableReason::NoDestination),
            &[],
            &PromptSettings::default(),
        )
    }

    #[tokio::test]
    async fn generate_returns_model_text() {
        let model = ScriptedModel::new(vec![Ok("# Day 1\nWalk.".to_string())]);
        let itinerary = generate(&model, &prompt()).await.unwrap();
        assert_eq!(itinerary.as_str(), "# Day 1\nWalk.");
        assert_eq!(model.call_count(), 1);
    }

    #[tokio::test]
    async fn bold_markers_are_stripped_for_display() {
        let model = ScriptedModel::new(vec![Ok("## Day 1\n**Morning**: Louvre".to_string())]);
        let itinerary = generate(&model, &prompt()).await.unwrap();
        assert_eq!(itinerary.without_bold(), "## Day 1\nMorning: Louvre");
        assert!(itinerary.as_str().contains("**"));
    }

    #[tokio::test]
    async fn blank_completion_is_an_error() {
        let model = ScriptedModel::new(vec![Ok("  \n ".to_string())]);
        let result = generate(&model, &prompt()).await;
        assert!(matches!(result, Err(AgentError::EmptyCompletion)));
    }

    #[tokio::test]
    async fn generate_does_not_retry() {
        let model = ScriptedModel::new(vec![
            Err(AgentError::RequestFailed("boom".to_string())),
            Ok("never reached".to_string()),
        ]);
        assert!(generate(&model, &prompt()).await.is_err());
        assert_eq!(model.call_count(), 1);
    }

    #[test]
    fn classifies_provider_messages() {
        assert!(matches!(
            AgentError::from_provider_message("HTTP 429: RESOURCE_EXHAUSTED"),
            AgentError::QuotaExceeded(_)
        ));
        assert!(matches!(
            AgentError::from_provider_message("API key not valid"),
            AgentError::Authentication(_)
        ));
        assert!(matches!(
            AgentError::from_provider_message("connection reset"),
            AgentError::RequestFailed(_)
        ));
    }

    #[test]
    fn strips_code_fences() {
        assert_eq!(strip_code_fence("```json\n[1, 2]\n```"), "[1, 2]");
        assert_eq!(strip_code_fence("```\n- a\n```"), "- a");
        assert_eq!(strip_code_fence("  plain  "), "plain");
        assert_eq!(strip_code_fence("```\nunterminated"), "unterminated");
    }

    #[test]
    fn unknown_models_fall_back() {
        assert!(matches!(
            parse_gemini_model("gemini-1.0-ultra"),
            GeminiModel::Gemini20Flash
        ));
    }

    #[test]
    fn missing_key_is_a_config_error() {
        let config = Config::default();
        assert!(matches!(
            GeminiModelClient::from_config(&config),
            Err(AgentError::ConfigError(_))
        ));
    }
}
