//! OpenAI-backed extraction oracle
//!
//! Calls a chat-completions endpoint with a prompt that demands strict
//! JSON output. Any transport problem, non-success status, or
//! unparseable payload is a transport failure, never an empty result.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};

use triage_core::{ExtractionOracle, LlmConfig, RawExtraction, Result, TriageError};

const SYSTEM_PROMPT: &str = r#"Extract ALL hostnames from the ticket text.

Hostname patterns to look for:
- Server names (e.g., WEB01, DB-PROD-01, APP-SERVER-03)
- Fully qualified domain names (e.g., server.company.com)
- Any identifier that represents a specific machine/server

For each hostname, classify the issue described for it (e.g. "reboot",
"disk", "unreachable") and your confidence ("low", "medium", "high").

Return strict JSON, nothing else:
{"extractions": [{"hostname": "...", "issue_type": "...", "confidence": "..."}]}

If no hostnames are found, return: {"extractions": []}"#;

/// OpenAI API client implementing the extraction oracle
pub struct OpenAiExtractor {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<Message>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
struct Message {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Debug, Deserialize)]
struct OracleContent {
    extractions: Vec<RawExtraction>,
}

impl OpenAiExtractor {
    /// Create from config
    pub fn from_config(config: &LlmConfig) -> Result<Self> {
        let api_key = config.api_key.as_ref().ok_or_else(|| {
            TriageError::Extraction("OpenAI API key required".to_string())
        })?;

        let base_url = config
            .base_url
            .clone()
            .unwrap_or_else(|| "https://api.openai.com/v1".to_string());

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| TriageError::Extraction(format!("cannot build HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key: api_key.clone(),
            base_url,
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        })
    }

    /// Set custom base URL (for Azure or compatible APIs)
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }
}

/// Parse the oracle's message content into raw extraction records
///
/// Tolerates a markdown code fence around the JSON, which chat models
/// add despite instructions.
fn parse_oracle_content(content: &str) -> Result<Vec<RawExtraction>> {
    let trimmed = content.trim();
    let body = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|s| s.strip_suffix("```"))
        .unwrap_or(trimmed);

    let parsed: OracleContent = serde_json::from_str(body.trim())
        .map_err(|e| TriageError::Extraction(format!("malformed oracle response: {e}")))?;

    Ok(parsed.extractions)
}

#[async_trait::async_trait]
impl ExtractionOracle for OpenAiExtractor {
    async fn extract(&self, ticket_text: &str) -> Result<Vec<RawExtraction>> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                Message {
                    role: "system".to_string(),
                    content: SYSTEM_PROMPT.to_string(),
                },
                Message {
                    role: "user".to_string(),
                    content: ticket_text.to_string(),
                },
            ],
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| TriageError::Extraction(format!("request failed: {e}")))?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(TriageError::Extraction(format!(
                "OpenAI error: {error_text}"
            )));
        }

        let result: ChatResponse = response
            .json()
            .await
            .map_err(|e| TriageError::Extraction(format!("failed to parse response: {e}")))?;

        let content = result
            .choices
            .first()
            .map(|c| c.message.content.clone())
            .ok_or_else(|| TriageError::Extraction("no response generated".to_string()))?;

        parse_oracle_content(&content)
    }
}
