use std::sync::{Arc, OnceLock};
use std::time::Duration;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::errors::{AiError, AiResult};
use super::gemini::{GeminiClient, DEFAULT_BASE_URL, DEFAULT_MODEL};
use super::retry::{RetryPolicy, DEFAULT_MAX_RETRIES};
use super::transform::TextTransform;

pub const EMPTY_SUMMARY_INPUT: &str = "No content to summarize.";
pub const EMPTY_SUMMARY_OUTPUT: &str = "Unable to generate summary for this content.";

/// AI provider configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AiConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub max_retries: u32,
    pub initial_backoff_ms: u64,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            max_retries: DEFAULT_MAX_RETRIES,
            initial_backoff_ms: 1000,
        }
    }
}

impl AiConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            initial_delay: Duration::from_millis(self.initial_backoff_ms),
            ..RetryPolicy::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AiStatus {
    Unconfigured,
    Ready,
}

/// Whether `key` looks like an API key at all
pub fn validate_api_key_format(key: &str) -> bool {
    static KEY_FORMAT: OnceLock<Regex> = OnceLock::new();
    KEY_FORMAT
        .get_or_init(|| Regex::new(r"^[A-Za-z0-9_-]{20,}$").expect("static regex"))
        .is_match(key)
}

/// Writing assistance built once per session and handed to callers
#[derive(Clone)]
pub struct AiService {
    transform: Option<Arc<dyn TextTransform>>,
    retry: RetryPolicy,
}

impl AiService {
    pub fn new(transform: Arc<dyn TextTransform>, retry: RetryPolicy) -> Self {
        Self {
            transform: Some(transform),
            retry,
        }
    }

    pub fn unconfigured() -> Self {
        Self {
            transform: None,
            retry: RetryPolicy::default(),
        }
    }

    /// Build a Gemini-backed service, or an unconfigured one without a key
    pub fn from_config(config: &AiConfig) -> AiResult<Self> {
        let key = match config.api_key.as_deref().map(str::trim) {
            Some(key) if !key.is_empty() => key,
            _ => {
                log::info!("No AI API key configured; writing assistance disabled");
                return Ok(Self::unconfigured());
            }
        };

        if !validate_api_key_format(key) {
            log::warn!("Configured AI API key does not look like a valid key");
        }

        let client = GeminiClient::new(key.to_string(), config.model.clone(), config.base_url.clone())?;
        Ok(Self::new(Arc::new(client), config.retry_policy()))
    }

    pub fn status(&self) -> AiStatus {
        match self.transform {
            Some(_) => AiStatus::Ready,
            None => AiStatus::Unconfigured,
        }
    }

    fn transform(&self) -> AiResult<&Arc<dyn TextTransform>> {
        self.transform.as_ref().ok_or(AiError::NotConfigured)
    }

    pub async fn summarize(&self, text: &str) -> AiResult<String> {
        if text.trim().is_empty() {
            return Ok(EMPTY_SUMMARY_INPUT.to_string());
        }

        let summary = self.transform()?.summarize(text).await?;
        let summary = summary.trim();
        if summary.is_empty() {
            return Ok(EMPTY_SUMMARY_OUTPUT.to_string());
        }
        Ok(summary.to_string())
    }

    /// Improved text, or the input itself when the model has nothing to say
    pub async fn enhance(&self, text: &str) -> AiResult<String> {
        if text.trim().is_empty() {
            return Ok(text.to_string());
        }

        let enhanced = self.transform()?.enhance(text).await?;
        let enhanced = enhanced.trim();
        if enhanced.is_empty() {
            return Ok(text.to_string());
        }
        Ok(enhanced.to_string())
    }

    /// Suggested continuation. Failures degrade to an empty suggestion so
    /// typing is never interrupted.
    pub async fn autocomplete(&self, text: &str, context: &str) -> String {
        if text.trim().is_empty() {
            return String::new();
        }
        let transform = match self.transform() {
            Ok(transform) => transform,
            Err(_) => return String::new(),
        };

        let result = self
            .retry
            .run(move || transform.autocomplete(text, context))
            .await;

        match result {
            Ok(completion) => strip_quotes(completion.trim()).to_string(),
            Err(e) => {
                log::warn!("Autocomplete failed: {}", e);
                String::new()
            }
        }
    }

    pub async fn define(&self, word: &str) -> AiResult<String> {
        let definition = self.transform()?.define(word).await?;
        let definition = definition.trim();
        if definition.is_empty() {
            return Ok(format!("No definition found for \"{}\"", word));
        }
        Ok(definition.to_string())
    }

    /// Verify the configured credentials with a real request
    pub async fn test_connection(&self) -> AiResult<()> {
        self.transform()?.health_check().await
    }
}

fn strip_quotes(text: &str) -> &str {
    let text = text
        .strip_prefix('"')
        .or_else(|| text.strip_prefix('\''))
        .unwrap_or(text);
    text.strip_suffix('"')
        .or_else(|| text.strip_suffix('\''))
        .unwrap_or(text)
}
