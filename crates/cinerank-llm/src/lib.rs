//! LLM Client implementations
//!
//! Provides the Gemini and OpenAI-compatible clients used to classify
//! admin reviews into ranking labels.

use async_trait::async_trait;
use cinerank_core::{CineError, LlmClient, LlmConfig, LlmProvider, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

fn http_client(timeout_secs: u64) -> Result<Client> {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| CineError::LlmError(format!("Failed to build HTTP client: {e}")))
}

fn require_api_key(config: &LlmConfig) -> Result<String> {
    config.api_key.clone().ok_or_else(|| {
        CineError::ConfigError(format!("{:?} API key required", config.provider))
    })
}

// ============================================================================
// Gemini Client
// ============================================================================

/// Google Gemini `generateContent` client
pub struct GeminiClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
}

#[derive(Debug, Serialize, Deserialize, Default)]
struct GeminiContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiPart {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    #[serde(default)]
    content: GeminiContent,
}

impl GeminiResponse {
    /// Concatenated text of the first candidate
    fn into_text(self) -> Result<String> {
        let candidate = self
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| CineError::LlmError("No candidates returned".to_string()))?;

        let text: String = candidate
            .content
            .parts
            .into_iter()
            .map(|p| p.text)
            .collect();

        if text.trim().is_empty() {
            return Err(CineError::LlmError("Empty response generated".to_string()));
        }
        Ok(text)
    }
}

impl GeminiClient {
    /// Create from config
    pub fn from_config(config: &LlmConfig) -> Result<Self> {
        Ok(Self {
            client: http_client(config.timeout_secs)?,
            api_key: require_api_key(config)?,
            base_url: config
                .base_url
                .clone()
                .unwrap_or_else(|| GEMINI_BASE_URL.to_string()),
            model: config.model.clone(),
        })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        )
    }
}

#[async_trait]
impl LlmClient for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let request = GeminiRequest {
            contents: vec![GeminiContent {
                parts: vec![GeminiPart {
                    text: prompt.to_string(),
                }],
            }],
        };

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| CineError::LlmError(format!("Gemini request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(CineError::LlmError(format!(
                "Gemini error ({status}): {error_text}"
            )));
        }

        let result: GeminiResponse = response
            .json()
            .await
            .map_err(|e| CineError::LlmError(format!("Failed to parse Gemini response: {e}")))?;

        result.into_text()
    }

    fn model(&self) -> &str {
        &self.model
    }
}

// ============================================================================
// OpenAI Client
// ============================================================================

/// OpenAI-compatible chat completions client
pub struct OpenAiClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

#[derive(Debug, Serialize)]
struct OpenAiRequest {
    model: String,
    messages: Vec<Message>,
    temperature: f32,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
struct Message {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Message,
}

impl OpenAiResponse {
    fn into_text(self) -> Result<String> {
        self.choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .filter(|text| !text.trim().is_empty())
            .ok_or_else(|| CineError::LlmError("No response generated".to_string()))
    }
}

impl OpenAiClient {
    /// Create from config
    ///
    /// `base_url` may point at Azure or any compatible API.
    pub fn from_config(config: &LlmConfig) -> Result<Self> {
        Ok(Self {
            client: http_client(config.timeout_secs)?,
            api_key: require_api_key(config)?,
            base_url: config
                .base_url
                .clone()
                .unwrap_or_else(|| OPENAI_BASE_URL.to_string()),
            model: config.model.clone(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl LlmClient for OpenAiClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let request = OpenAiRequest {
            model: self.model.clone(),
            messages: vec![Message {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            temperature: 0.0,
        };

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| CineError::LlmError(format!("Request failed: {e}")))?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(CineError::LlmError(format!("OpenAI error: {error_text}")));
        }

        let result: OpenAiResponse = response
            .json()
            .await
            .map_err(|e| CineError::LlmError(format!("Failed to parse response: {e}")))?;

        result.into_text()
    }

    fn model(&self) -> &str {
        &self.model
    }
}

// ============================================================================
// Factory function
// ============================================================================

/// Create an LLM client from config
pub fn create_llm_client(config: &LlmConfig) -> Result<Arc<dyn LlmClient>> {
    let client: Arc<dyn LlmClient> = match config.provider {
        LlmProvider::Gemini => Arc::new(GeminiClient::from_config(config)?),
        LlmProvider::OpenAI => Arc::new(OpenAiClient::from_config(config)?),
    };

    tracing::info!(provider = ?config.provider, model = client.model(), "LLM client ready");
    Ok(client)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn config(provider: LlmProvider, model: &str, base_url: Option<&str>) -> LlmConfig {
        LlmConfig {
            provider,
            api_key: Some("key".to_string()),
            base_url: base_url.map(str::to_string),
            model: model.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_gemini_endpoint() {
        let client = GeminiClient::from_config(&config(
            LlmProvider::Gemini,
            "gemini-2.5-flash",
            Some("http://localhost:9000/"),
        ))
        .unwrap();
        assert_eq!(
            client.endpoint(),
            "http://localhost:9000/v1beta/models/gemini-2.5-flash:generateContent"
        );
    }

    #[test]
    fn test_openai_endpoint() {
        let default = OpenAiClient::from_config(&config(LlmProvider::OpenAI, "gpt-4o-mini", None))
            .unwrap();
        assert_eq!(default.endpoint(), "https://api.openai.com/v1/chat/completions");

        let compatible = OpenAiClient::from_config(&config(
            LlmProvider::OpenAI,
            "gpt-4o-mini",
            Some("http://localhost:11434/v1/"),
        ))
        .unwrap();
        assert_eq!(compatible.endpoint(), "http://localhost:11434/v1/chat/completions");
    }

    #[test]
    fn test_gemini_response_joins_parts() {
        let response: GeminiResponse = serde_json::from_value(json!({
            "candidates": [
                { "content": { "parts": [{ "text": "Goo" }, { "text": "d\n" }], "role": "model" } },
                { "content": { "parts": [{ "text": "Bad" }] } }
            ]
        }))
        .unwrap();

        assert_eq!(response.into_text().unwrap(), "Good\n");
    }

    #[test]
    fn test_gemini_response_without_candidates() {
        let response: GeminiResponse =
            serde_json::from_value(json!({ "promptFeedback": { "blockReason": "SAFETY" } }))
                .unwrap();

        assert!(matches!(response.into_text(), Err(CineError::LlmError(_))));
    }

    #[test]
    fn test_openai_response_first_choice() {
        let response: OpenAiResponse = serde_json::from_value(json!({
            "choices": [{ "message": { "role": "assistant", "content": "Excellent" } }]
        }))
        .unwrap();

        assert_eq!(response.into_text().unwrap(), "Excellent");
    }

    #[test]
    fn test_openai_response_empty() {
        let response: OpenAiResponse = serde_json::from_value(json!({ "choices": [] })).unwrap();
        assert!(response.into_text().is_err());
    }

    #[test]
    fn test_factory_requires_api_key() {
        let config = LlmConfig::default();
        assert!(matches!(
            create_llm_client(&config),
            Err(CineError::ConfigError(_))
        ));
    }

    #[test]
    fn test_factory_selects_provider() {
        let config = LlmConfig {
            provider: LlmProvider::OpenAI,
            api_key: Some("sk-test".to_string()),
            model: "gpt-4o-mini".to_string(),
            ..Default::default()
        };
        let client = create_llm_client(&config).unwrap();
        assert_eq!(client.model(), "gpt-4o-mini");
    }
}
