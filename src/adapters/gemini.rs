//! Gemini `generateContent` client.
//!
//! Endpoint: POST {base_url}/v1beta/models/{model}:generateContent?key=...
//! Request:  {"contents":[{"parts":[{"text": prompt}]}], "generationConfig": {...}}
//! Response: {"candidates":[{"content":{"parts":[{"text": answer}]}}]}

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use tokio::time::timeout;
use tracing::{debug, warn};

use super::{GenerationConfig, Oracle, OracleError};
use crate::config::OracleSettings;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_MODEL: &str = "gemini-1.5-pro";

/// Gemini REST client
pub struct GeminiOracle {
    base_url: String,
    model: String,
    api_key: String,
    request_timeout: Duration,
    client: reqwest::Client,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: [Content<'a>; 1],
    generation_config: &'a GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: [Part<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

impl GeminiOracle {
    /// Create a client against the public endpoint with default settings
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_key: api_key.into(),
            request_timeout: Duration::from_secs(120),
            client: reqwest::Client::new(),
        }
    }

    /// Build from resolved settings; fails when no key is configured
    pub fn from_settings(
        settings: &OracleSettings,
        api_key: Option<&str>,
    ) -> Result<Self, OracleError> {
        let api_key = api_key
            .filter(|k| !k.trim().is_empty())
            .ok_or(OracleError::MissingApiKey)?;

        Ok(Self::new(api_key)
            .with_base_url(&settings.base_url)
            .with_model(&settings.model)
            .with_timeout(Duration::from_secs(settings.timeout_seconds)))
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_timeout(mut self, request_timeout: Duration) -> Self {
        self.request_timeout = request_timeout;
        self
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        )
    }

    async fn send(&self, prompt: &str, config: &GenerationConfig) -> Result<String, OracleError> {
        let body = GenerateRequest {
            contents: [Content {
                parts: [Part { text: prompt }],
            }],
            generation_config: config,
        };

        let response = self
            .client
            .post(self.endpoint())
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await
            .map_err(|e| OracleError::Transport(e.without_url().to_string()))?;

        let status = response.status();
        if status.as_u16() == 429 {
            return Err(OracleError::RateLimited);
        }
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(OracleError::Http {
                status: status.as_u16(),
                body: text,
            });
        }

        let payload: Value = response
            .json()
            .await
            .map_err(|e| OracleError::Malformed(e.without_url().to_string()))?;

        Ok(extract_answer(&payload))
    }
}

/// Pull `candidates[0].content.parts[0].text`, empty when absent
pub fn extract_answer(payload: &Value) -> String {
    payload
        .pointer("/candidates/0/content/parts/0/text")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

#[async_trait]
impl Oracle for GeminiOracle {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn generate(
        &self,
        prompt: &str,
        config: &GenerationConfig,
    ) -> Result<String, OracleError> {
        debug!(
            model = %self.model,
            prompt_chars = prompt.len(),
            max_output_tokens = config.max_output_tokens,
            "Sending oracle request"
        );

        match timeout(self.request_timeout, self.send(prompt, config)).await {
            Ok(result) => result,
            Err(_) => {
                let seconds = self.request_timeout.as_secs();
                warn!(seconds, "Oracle request timed out");
                Err(OracleError::Timeout { seconds })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_extract_answer() {
        let payload = json!({
            "candidates": [{"content": {"parts": [{"text": "hello"}]}}]
        });
        assert_eq!(extract_answer(&payload), "hello");
    }

    #[test]
    fn test_extract_answer_missing_path() {
        assert_eq!(extract_answer(&json!({})), "");
        assert_eq!(extract_answer(&json!({"candidates": []})), "");
        assert_eq!(
            extract_answer(&json!({"candidates": [{"content": {"parts": [{"text": 3}]}}]})),
            ""
        );
    }

    #[test]
    fn test_request_body_shape() {
        let config = GenerationConfig::default();
        let body = GenerateRequest {
            contents: [Content {
                parts: [Part { text: "prompt" }],
            }],
            generation_config: &config,
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["contents"][0]["parts"][0]["text"], "prompt");
        assert_eq!(value["generationConfig"]["topK"], 40);
        assert_eq!(value["generationConfig"]["maxOutputTokens"], 2048);
    }

    #[test]
    fn test_missing_key_rejected() {
        let settings = OracleSettings::default();
        assert!(matches!(
            GeminiOracle::from_settings(&settings, None),
            Err(OracleError::MissingApiKey)
        ));
        assert!(matches!(
            GeminiOracle::from_settings(&settings, Some("  ")),
            Err(OracleError::MissingApiKey)
        ));
    }

    #[test]
    fn test_endpoint_trims_trailing_slash() {
        let oracle = GeminiOracle::new("k").with_base_url("http://localhost:9/");
        assert_eq!(
            oracle.endpoint(),
            "http://localhost:9/v1beta/models/gemini-1.5-pro:generateContent"
        );
    }
}
