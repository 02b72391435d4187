//! LLM provider trait for generating answers

use async_trait::async_trait;
use crate::config::LlmConfig;
use crate::error::Result;

/// A single-turn generation call
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    /// User prompt
    pub prompt: String,
    /// System instruction, when the model supports one
    pub system: Option<String>,
    pub temperature: f32,
    pub top_p: f32,
    pub max_output_tokens: u32,
}

impl GenerationRequest {
    /// Request with the configured sampling parameters
    pub fn new(prompt: impl Into<String>, config: &LlmConfig) -> Self {
        Self {
            prompt: prompt.into(),
            system: None,
            temperature: config.temperature,
            top_p: config.top_p,
            max_output_tokens: config.max_output_tokens,
        }
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }
}

/// Trait for hosted text generation
///
/// Implementations:
/// - `GeminiClient`: Generative Language API
/// - `MockLlm`: canned response for mock mode
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Generate text for a request. Quota refusals surface as
    /// [`crate::Error::QuotaExceeded`].
    async fn generate(&self, request: &GenerationRequest) -> Result<String>;

    /// Check if the provider is healthy and available
    async fn health_check(&self) -> Result<bool>;

    /// Get provider name for logging
    fn name(&self) -> &str;

    /// Get the model being used
    fn model(&self) -> &str;
}
