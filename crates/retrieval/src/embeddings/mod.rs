//! Embedding providers.
//!
//! Chunks and queries are embedded through the [`EmbeddingProvider`]
//! trait. The `hash` provider is deterministic and runs offline, which
//! is what the test suite and local setups use; the `ollama` provider
//! talks to a local Ollama server for real semantic vectors.

mod hash;
mod ollama;

use std::sync::Arc;

use askdesk_core::{AppError, AppResult};

pub use hash::HashEmbedder;
pub use ollama::OllamaEmbedder;

#[async_trait::async_trait]
pub trait EmbeddingProvider: Send + Sync + std::fmt::Debug {
    fn provider_name(&self) -> &str;

    fn model_name(&self) -> &str;

    /// Length of the vectors this provider produces. All entries in one
    /// index must come from a provider with the same dimensionality.
    fn dimensions(&self) -> usize;

    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>>;

    async fn embed(&self, text: &str) -> AppResult<Vec<f32>> {
        let mut results = self.embed_batch(&[text.to_string()]).await?;
        results
            .pop()
            .ok_or_else(|| AppError::Embedding("no embedding returned".to_string()))
    }
}

/// Instantiate the provider named in the configuration.
pub fn create_embedder(
    provider: &str,
    model: &str,
    dimensions: usize,
    endpoint: Option<&str>,
) -> AppResult<Arc<dyn EmbeddingProvider>> {
    match provider {
        "hash" => Ok(Arc::new(HashEmbedder::new(dimensions))),
        "ollama" => Ok(Arc::new(OllamaEmbedder::new(model, dimensions, endpoint))),
        other => Err(AppError::Embedding(format!(
            "unknown embedding provider '{other}'; supported providers: hash, ollama"
        ))),
    }
}
