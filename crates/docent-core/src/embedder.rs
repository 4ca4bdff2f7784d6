use docent_llm::LlmProvider;

use crate::error::{DocentError, Result};

pub const DEFAULT_DIMENSIONS: usize = 768;

/// Dimension-checked wrapper over a provider's embedding call.
#[derive(Debug, Clone)]
pub struct Embedder<P> {
    provider: P,
    dimensions: usize,
}

impl<P: LlmProvider> Embedder<P> {
    pub fn new(provider: P, dimensions: usize) -> Self {
        Self {
            provider,
            dimensions,
        }
    }

    /// # Errors
    ///
    /// [`DocentError::EmptyInput`] for blank text (the provider is not
    /// called), [`DocentError::EmbeddingDimensionMismatch`] when the vector
    /// length differs from the configured dimension, and
    /// [`DocentError::Model`] when the provider fails.
    pub async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        if text.trim().is_empty() {
            return Err(DocentError::EmptyInput);
        }
        let vector = self.provider.embed(text).await?;
        if vector.len() != self.dimensions {
            tracing::error!(
                expected = self.dimensions,
                actual = vector.len(),
                provider = self.provider.name(),
                "embedding dimension mismatch"
            );
            return Err(DocentError::EmbeddingDimensionMismatch {
                expected: self.dimensions,
                actual: vector.len(),
            });
        }
        Ok(vector)
    }
}
