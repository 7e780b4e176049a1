//! Gemini `generateContent` client

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use super::errors::{AiError, AiResult};
use super::transform::TextTransform;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";

/// Sampling settings sent with a request
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub temperature: f32,
    pub top_k: u32,
    pub top_p: f32,
    pub max_output_tokens: u32,
}

impl GenerationConfig {
    pub const SUMMARIZE: Self = Self {
        temperature: 0.7,
        top_k: 40,
        top_p: 0.95,
        max_output_tokens: 1024,
    };

    pub const ENHANCE: Self = Self {
        temperature: 0.3,
        top_k: 40,
        top_p: 0.95,
        max_output_tokens: 2048,
    };

    pub const AUTOCOMPLETE: Self = Self {
        temperature: 0.8,
        top_k: 20,
        top_p: 0.8,
        max_output_tokens: 50,
    };

    pub const DEFINE: Self = Self {
        temperature: 0.2,
        top_k: 1,
        top_p: 1.0,
        max_output_tokens: 100,
    };
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: [Content<'a>; 1],
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: [Part<'a>; 1],
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: String,
}

impl GenerateResponse {
    fn text(&self) -> String {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|content| content.parts.iter().map(|p| p.text.as_str()).collect())
            .unwrap_or_default()
    }
}

pub fn summarize_prompt(text: &str) -> String {
    format!(
        "Please provide a concise summary of the following text in 2-3 sentences. \
         Focus on the main points and key information:\n\n{}",
        text
    )
}

pub fn enhance_prompt(text: &str) -> String {
    format!(
        "Please improve the following text while maintaining its original meaning, tone, \
         and approximate length. Focus on grammar, clarity, and readability:\n\n{}",
        text
    )
}

pub fn autocomplete_prompt(text: &str, context: &str) -> String {
    format!(
        "Context: \"{}\"\n\nComplete this text naturally with just a few words \
         (maximum 8 words): \"{}\"",
        context, text
    )
}

pub fn define_prompt(word: &str) -> String {
    format!(
        "Provide a brief, clear definition of the word \"{}\" in one short sentence. \
         Keep it simple and concise.",
        word
    )
}

/// Map an unsuccessful response to a typed error
pub fn classify_error(status: StatusCode, body: &str) -> AiError {
    if body.contains("API_KEY_INVALID") || status == StatusCode::UNAUTHORIZED {
        return AiError::InvalidApiKey;
    }
    if status == StatusCode::FORBIDDEN || body.contains("PERMISSION_DENIED") {
        return AiError::PermissionDenied;
    }
    if status == StatusCode::TOO_MANY_REQUESTS || body.contains("RESOURCE_EXHAUSTED") {
        let lower = body.to_ascii_lowercase();
        if lower.contains("quota") {
            return AiError::QuotaExceeded;
        }
        return AiError::RateLimited;
    }
    AiError::Api {
        status: status.as_u16(),
        message: body.chars().take(500).collect(),
    }
}

/// Client for the Gemini REST API
pub struct GeminiClient {
    client: Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl GeminiClient {
    pub fn new(api_key: String, model: String, base_url: String) -> AiResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .connect_timeout(Duration::from_secs(15))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
            api_key,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn url(&self) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base_url, self.model)
    }

    /// Send one prompt and return the concatenated text of the first candidate
    pub async fn generate(&self, prompt: &str, config: Option<GenerationConfig>) -> AiResult<String> {
        let request = GenerateRequest {
            contents: [Content {
                parts: [Part { text: prompt }],
            }],
            generation_config: config,
        };

        let response = self
            .client
            .post(self.url())
            .query(&[("key", self.api_key.as_str())])
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let err = classify_error(status, &body);
            log::warn!("Gemini request failed: {}", err);
            return Err(err);
        }

        let parsed: GenerateResponse = response.json().await?;
        Ok(parsed.text())
    }
}

#[async_trait]
impl TextTransform for GeminiClient {
    async fn summarize(&self, text: &str) -> AiResult<String> {
        self.generate(&summarize_prompt(text), Some(GenerationConfig::SUMMARIZE))
            .await
    }

    async fn enhance(&self, text: &str) -> AiResult<String> {
        self.generate(&enhance_prompt(text), Some(GenerationConfig::ENHANCE))
            .await
    }

    async fn autocomplete(&self, text: &str, context: &str) -> AiResult<String> {
        self.generate(&autocomplete_prompt(text, context), Some(GenerationConfig::AUTOCOMPLETE))
            .await
    }

    async fn define(&self, word: &str) -> AiResult<String> {
        self.generate(&define_prompt(word), Some(GenerationConfig::DEFINE))
            .await
    }

    async fn health_check(&self) -> AiResult<()> {
        let text = self.generate("Say 'Hello' in one word.", None).await?;
        if text.trim().is_empty() {
            return Err(AiError::EmptyResponse);
        }
        Ok(())
    }
}
