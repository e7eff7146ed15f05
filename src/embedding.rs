// Copyright 2026 Muvon Un Limited
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use anyhow::Result;
use async_trait::async_trait;
use tracing::debug;

// Re-export embedding functionality from octolib
pub use octolib::embedding::{
    parse_provider_model, provider::create_embedding_provider_from_parts,
    provider::EmbeddingProvider, types::InputType,
};

/// Create embedding provider from config
pub async fn create_embedding_provider(
    config: &crate::config::Config,
) -> Result<Box<dyn EmbeddingProvider>> {
    let (provider, model) = parse_provider_model(&config.embedding.model)?;
    create_embedding_provider_from_parts(&provider, &model).await
}

/// Generate embeddings for multiple texts using batch API
pub async fn generate_embeddings_batch(
    texts: Vec<String>,
    provider: &dyn EmbeddingProvider,
) -> Result<Vec<Vec<f32>>> {
    provider
        .generate_embeddings_batch(texts, InputType::None)
        .await
}

/// What the analyzer needs from an embedding backend. Kept narrow so
/// tests can swap in deterministic vectors.
#[async_trait]
pub trait TextEmbedder: Send + Sync {
    async fn embed_batch(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>>;
}

/// Adapts an octolib provider to the analyzer seam, slicing requests to
/// the provider's batch size limit.
pub struct ProviderEmbedder {
    provider: Box<dyn EmbeddingProvider>,
    batch_size: usize,
}

impl ProviderEmbedder {
    pub fn new(provider: Box<dyn EmbeddingProvider>, batch_size: usize) -> Self {
        Self {
            provider,
            batch_size: batch_size.max(1),
        }
    }

    pub async fn from_config(config: &crate::config::Config) -> Result<Self> {
        let provider = create_embedding_provider(config).await?;
        Ok(Self::new(provider, config.embedding.batch_size))
    }
}

#[async_trait]
impl TextEmbedder for ProviderEmbedder {
    async fn embed_batch(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
        let mut vectors = Vec::with_capacity(texts.len());
        for chunk in texts.chunks(self.batch_size) {
            debug!(texts = chunk.len(), "Embedding batch slice");
            let batch = generate_embeddings_batch(chunk.to_vec(), self.provider.as_ref()).await?;
            vectors.extend(batch);
        }
        Ok(vectors)
    }
}
