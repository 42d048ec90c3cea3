pub mod gemini;
pub mod key_pool;
pub mod qa_prompt;
pub mod template;

pub use gemini::GeminiClient;
pub use key_pool::ApiKeyPool;

use async_trait::async_trait;
use thiserror::Error;

pub const DEFAULT_TEMPERATURE: f64 = 0.9;
pub const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 2048;

#[derive(Debug, Error)]
pub enum AiError {
    #[error("No Google API keys configured")]
    NoApiKeys,

    #[error("API key rejected (HTTP {0})")]
    AuthFailed(u16),

    #[error("Rate limit exceeded")]
    RateLimited,

    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Failed to parse response: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Empty response from model")]
    EmptyResponse,
}

#[derive(Debug, Clone)]
pub struct GenerationOptions {
    pub temperature: f64,
    pub max_output_tokens: u32,
    /// Falls back to the client's configured model
    pub model: Option<String>,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            temperature: DEFAULT_TEMPERATURE,
            max_output_tokens: DEFAULT_MAX_OUTPUT_TOKENS,
            model: None,
        }
    }
}

/// A single-prompt text generation backend
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str, options: GenerationOptions) -> Result<String, AiError>;
}
