use crate::error::EmbeddingError;
use async_trait::async_trait;

/// Trait for embedding generation
///
/// One vector per input text, order-preserving. Implementations must be
/// deterministic in dimensionality for a fixed model identifier; retry policy
/// lives with the caller, not here.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Generate embeddings for a batch of texts
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError>;

    /// Dimensionality of the vectors this embedder produces
    fn dimension(&self) -> usize;

    /// Identifier of the underlying embedding model
    fn model_id(&self) -> &str;
}
