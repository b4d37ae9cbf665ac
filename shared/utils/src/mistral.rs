//! Mistral chat-completions client.
//!
//! One shared HTTP client for every AI touchpoint: field fallback during
//! extraction and grounded question answering. Transient failures (rate
//! limit, timeout, 5xx) are retried with exponential backoff up to a fixed
//! budget; callers decide how a final failure degrades.

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::AiConfig;
use crate::error::{SpecsheetError, SpecsheetResult};

pub struct MistralClient {
    client: Client,
    api_url: String,
    api_key: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
    max_retries: u32,
    retry_base_delay: Duration,
}

impl MistralClient {
    pub fn new(config: &AiConfig) -> SpecsheetResult<Self> {
        if config.api_key.is_empty() {
            return Err(SpecsheetError::configuration("Mistral API key not set"));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| SpecsheetError::configuration(e.to_string()))?;

        Ok(Self {
            client,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            max_retries: config.max_retries,
            retry_base_delay: Duration::from_millis(config.retry_base_delay_ms),
        })
    }

    /// Sends one system + user exchange and returns the assistant's text.
    /// Retries transient failures with exponential backoff; after the retry
    /// budget is spent the last error is returned as `AiCallFailed`.
    pub async fn chat(&self, system: &str, user: &str) -> SpecsheetResult<String> {
        let mut attempt = 0u32;
        loop {
            match self.chat_once(system, user).await {
                Ok(content) => return Ok(content),
                Err(e) if e.is_transient() && attempt < self.max_retries => {
                    let delay = self.retry_base_delay * 2u32.saturating_pow(attempt);
                    warn!(
                        attempt = attempt + 1,
                        max_retries = self.max_retries,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Transient AI failure, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn chat_once(&self, system: &str, user: &str) -> SpecsheetResult<String> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: system.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: user.to_string(),
                },
            ],
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.api_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
            let body = response.text().await.unwrap_or_default();
            return Err(SpecsheetError::ai_call_failed(format!(
                "HTTP {}: {}",
                status, body
            )));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            // Auth and request errors are not retried.
            return Err(SpecsheetError::malformed_ai_response(format!(
                "HTTP {}: {}",
                status, body
            )));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| SpecsheetError::malformed_ai_response(e.to_string()))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| SpecsheetError::malformed_ai_response("no choices in response"))?;

        debug!(chars = content.len(), "Received AI response");
        Ok(content)
    }
}

/// Recovers a JSON object from a model reply. Tries the whole reply first,
/// then a fenced ```json block, then the outermost brace span.
pub fn extract_json(reply: &str) -> SpecsheetResult<serde_json::Value> {
    if let Ok(value) = serde_json::from_str(reply.trim()) {
        return Ok(value);
    }

    let fence = regex::Regex::new(r"```(?:json)?\s*([\s\S]*?)\s*```").unwrap();
    if let Some(caps) = fence.captures(reply) {
        if let Ok(value) = serde_json::from_str(caps[1].trim()) {
            return Ok(value);
        }
    }

    if let (Some(start), Some(end)) = (reply.find('{'), reply.rfind('}')) {
        if start < end {
            if let Ok(value) = serde_json::from_str(&reply[start..=end]) {
                return Ok(value);
            }
        }
    }

    Err(SpecsheetError::malformed_ai_response(
        "could not extract JSON from reply",
    ))
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_json_direct() {
        let value = extract_json(r#"{"supplier": "Finisar"}"#).unwrap();
        assert_eq!(value["supplier"], "Finisar");
    }

    #[test]
    fn test_extract_json_fenced() {
        let reply = "Here is the data:\n```json\n{\"wavelength\": {\"value\": 850}}\n```\nDone.";
        let value = extract_json(reply).unwrap();
        assert_eq!(value["wavelength"]["value"], 850);
    }

    #[test]
    fn test_extract_json_embedded_braces() {
        let reply = "The result is {\"reach\": {\"value\": 10, \"unit\": \"km\"}} as requested.";
        let value = extract_json(reply).unwrap();
        assert_eq!(value["reach"]["unit"], "km");
    }

    #[test]
    fn test_extract_json_garbage_is_malformed() {
        let err = extract_json("I could not find any parameters.").unwrap_err();
        assert_eq!(err.error_code(), "MALFORMED_AI_RESPONSE");
    }

    #[test]
    fn test_client_requires_api_key() {
        let config = crate::config::AppConfig::default().ai;
        assert!(MistralClient::new(&config).is_err());
    }
}
