//! Answer generation.
//!
//! A [`Generator`] turns one fully composed prompt into completion text.
//! There is no retry: a transport, quota or content-policy failure comes
//! back as [`RagError::GenerationFailure`] for the caller to show.
//!
//! | Config Value | Generator |
//! |-------------|-----------|
//! | `"gemini"` | [`GeminiGenerator`] (`GEMINI_API_KEY`) |
//! | `"ollama"` | [`OllamaGenerator`] |
//! | `"static"` | [`StaticGenerator`] |
//! | `"disabled"` | [`DisabledGenerator`] |

use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use crate::config::GenerationConfig;
use crate::error::RagError;

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

#[async_trait]
pub trait Generator: Send + Sync {
    /// Model identifier the prompt is sent to.
    fn model(&self) -> &str;
    async fn generate(&self, prompt: &str) -> Result<String, RagError>;
}

// ============ Gemini ============

pub struct GeminiGenerator {
    model: String,
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl GeminiGenerator {
    pub fn new(config: &GenerationConfig) -> Result<Self> {
        let api_key = std::env::var("GEMINI_API_KEY")
            .map_err(|_| anyhow!("GEMINI_API_KEY environment variable not set"))?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            model: config.model.clone(),
            base_url: config
                .url
                .clone()
                .unwrap_or_else(|| GEMINI_BASE_URL.to_string()),
            api_key,
            client,
        })
    }
}

#[async_trait]
impl Generator for GeminiGenerator {
    fn model(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &str) -> Result<String, RagError> {
        let body = serde_json::json!({
            "contents": [{ "parts": [{ "text": prompt }] }],
        });
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);

        tracing::debug!(model = %self.model, prompt_chars = prompt.len(), "gemini request");
        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| RagError::GenerationFailure(format!("Gemini request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            return Err(RagError::GenerationFailure(format!(
                "Gemini API error {}: {}",
                status, body_text
            )));
        }

        let json: serde_json::Value = response.json().await.map_err(|e| {
            RagError::GenerationFailure(format!("Gemini returned invalid JSON: {}", e))
        })?;
        parse_gemini_response(&json)
    }
}

fn parse_gemini_response(json: &serde_json::Value) -> Result<String, RagError> {
    if let Some(reason) = json
        .pointer("/promptFeedback/blockReason")
        .and_then(|r| r.as_str())
    {
        return Err(RagError::GenerationFailure(format!(
            "prompt blocked by content policy: {}",
            reason
        )));
    }

    let candidate = json
        .pointer("/candidates/0")
        .ok_or_else(|| RagError::GenerationFailure("Gemini returned no candidates".into()))?;

    let text: String = candidate
        .pointer("/content/parts")
        .and_then(|p| p.as_array())
        .map(|parts| {
            parts
                .iter()
                .filter_map(|part| part.get("text").and_then(|t| t.as_str()))
                .collect()
        })
        .unwrap_or_default();

    if text.is_empty() {
        let finish = candidate
            .get("finishReason")
            .and_then(|f| f.as_str())
            .unwrap_or("UNKNOWN");
        return Err(RagError::GenerationFailure(format!(
            "Gemini returned no text (finishReason: {})",
            finish
        )));
    }
    Ok(text)
}

// ============ Ollama ============

/// Generator using a local Ollama instance's `/api/generate` endpoint.
pub struct OllamaGenerator {
    model: String,
    url: String,
    client: reqwest::Client,
}

impl OllamaGenerator {
    pub fn new(config: &GenerationConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            model: config.model.clone(),
            url: config
                .url
                .clone()
                .unwrap_or_else(|| "http://localhost:11434".to_string()),
            client,
        })
    }
}

#[async_trait]
impl Generator for OllamaGenerator {
    fn model(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &str) -> Result<String, RagError> {
        let body = serde_json::json!({
            "model": self.model,
            "prompt": prompt,
            "stream": false,
        });

        let response = self
            .client
            .post(format!("{}/api/generate", self.url))
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                RagError::GenerationFailure(format!(
                    "Ollama connection error (is Ollama running at {}?): {}",
                    self.url, e
                ))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            return Err(RagError::GenerationFailure(format!(
                "Ollama API error {}: {}",
                status, body_text
            )));
        }

        let json: serde_json::Value = response.json().await.map_err(|e| {
            RagError::GenerationFailure(format!("Ollama returned invalid JSON: {}", e))
        })?;
        json.get("response")
            .and_then(|r| r.as_str())
            .map(str::to_string)
            .ok_or_else(|| RagError::GenerationFailure("Ollama response missing text".into()))
    }
}

// ============ Offline ============

/// Returns the same text for every prompt.
pub struct StaticGenerator {
    text: String,
}

impl StaticGenerator {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

#[async_trait]
impl Generator for StaticGenerator {
    fn model(&self) -> &str {
        "static"
    }

    async fn generate(&self, _prompt: &str) -> Result<String, RagError> {
        Ok(self.text.clone())
    }
}

pub struct DisabledGenerator;

#[async_trait]
impl Generator for DisabledGenerator {
    fn model(&self) -> &str {
        "disabled"
    }

    async fn generate(&self, _prompt: &str) -> Result<String, RagError> {
        Err(RagError::GenerationFailure(
            "generation is disabled (generation.provider = \"disabled\")".into(),
        ))
    }
}

pub fn create_generator(config: &GenerationConfig) -> Result<Box<dyn Generator>> {
    match config.provider.as_str() {
        "gemini" => Ok(Box::new(GeminiGenerator::new(config)?)),
        "ollama" => Ok(Box::new(OllamaGenerator::new(config)?)),
        "static" => {
            let text = config
                .static_text
                .clone()
                .ok_or_else(|| anyhow!("generation.static_text required for static provider"))?;
            Ok(Box::new(StaticGenerator::new(text)))
        }
        "disabled" => Ok(Box::new(DisabledGenerator)),
        other => Err(anyhow!("Unknown generation provider: {}", other)),
    }
}
