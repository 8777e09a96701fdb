use crate::error::GenerationError;
use async_trait::async_trait;

/// Trait for the generative-model call behind the answer composer
#[async_trait]
pub trait Generator: Send + Sync {
    /// Generate a completion for a single prompt
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError>;
}
