//! Writing assistance through a language model
//!
//! The model is an injected [`TextTransform`]. [`AiService`] wraps it with
//! input checks, fallbacks and a bounded retry policy, and reports an
//! explicit unconfigured state when no API key is available.

pub mod errors;
pub mod gemini;
pub mod retry;
pub mod service;
pub mod transform;

pub use errors::{AiError, AiResult};
pub use gemini::GeminiClient;
pub use retry::RetryPolicy;
pub use service::{validate_api_key_format, AiConfig, AiService, AiStatus};
pub use transform::TextTransform;
