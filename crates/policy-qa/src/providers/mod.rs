//! Provider abstractions for embeddings, LLM and vector indexing
//!
//! Hosted backends (Gemini, Pinecone) and in-process stand-ins share the same
//! traits; [`Services::from_config`] picks one per capability at startup.

pub mod embedding;
pub mod gemini;
pub mod llm;
pub mod mock;
pub mod pinecone;
pub mod vector_index;

pub use embedding::EmbeddingProvider;
pub use gemini::{GeminiClient, GeminiEmbedder};
pub use llm::{GenerationRequest, LlmProvider};
pub use mock::{HashingEmbedder, InMemoryVectorIndex, MockLlm};
pub use pinecone::PineconeIndex;
pub use vector_index::{IndexMatch, IndexRecord, IndexStats, VectorIndexProvider};

use serde::Serialize;
use std::sync::Arc;

use crate::config::AppConfig;
use crate::error::Result;

/// Health of one capability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceHealth {
    Healthy,
    Unhealthy,
    MockMode,
}

/// Health of every capability
#[derive(Debug, Clone, Serialize)]
pub struct ServicesHealth {
    pub llm: ServiceHealth,
    pub embeddings: ServiceHealth,
    pub vector_index: ServiceHealth,
}

impl ServicesHealth {
    pub fn all_available(&self) -> bool {
        [self.llm, self.embeddings, self.vector_index]
            .iter()
            .all(|h| *h != ServiceHealth::Unhealthy)
    }
}

/// The capability set injected into the pipeline
#[derive(Clone)]
pub struct Services {
    pub llm: Arc<dyn LlmProvider>,
    pub embedder: Arc<dyn EmbeddingProvider>,
    pub index: Arc<dyn VectorIndexProvider>,
    /// Whether the LLM and embedder are in-process stand-ins
    pub llm_mock: bool,
    /// Whether the vector index is the in-memory stand-in
    pub index_mock: bool,
}

impl Services {
    /// Build hosted providers where credentials exist, stand-ins elsewhere
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let (llm, embedder, llm_mock): (Arc<dyn LlmProvider>, Arc<dyn EmbeddingProvider>, bool) =
            if config.llm.is_configured() {
                let client = Arc::new(GeminiClient::new(&config.llm)?);
                let embedder = Arc::new(GeminiEmbedder::new(client.clone(), &config.embeddings));
                tracing::info!(
                    "Using Gemini model {} with embeddings {}",
                    config.llm.model,
                    config.embeddings.model
                );
                (
                    client as Arc<dyn LlmProvider>,
                    embedder as Arc<dyn EmbeddingProvider>,
                    false,
                )
            } else {
                tracing::warn!("GEMINI_API_KEY not configured, running LLM in mock mode");
                (
                    Arc::new(MockLlm::default()) as Arc<dyn LlmProvider>,
                    Arc::new(HashingEmbedder::new(config.embeddings.dimensions))
                        as Arc<dyn EmbeddingProvider>,
                    true,
                )
            };

        let (index, index_mock): (Arc<dyn VectorIndexProvider>, bool) =
            if config.vector_index.is_configured() {
                let index = PineconeIndex::new(&config.vector_index)?;
                tracing::info!("Using Pinecone index '{}'", index.index_name());
                (Arc::new(index) as Arc<dyn VectorIndexProvider>, false)
            } else {
                tracing::warn!("Pinecone not configured, using in-memory vector index");
                (Arc::new(InMemoryVectorIndex::new()) as Arc<dyn VectorIndexProvider>, true)
            };

        Ok(Self {
            llm,
            embedder,
            index,
            llm_mock,
            index_mock,
        })
    }

    /// Fully in-process services
    pub fn mock(dimensions: usize) -> Self {
        Self {
            llm: Arc::new(MockLlm::default()),
            embedder: Arc::new(HashingEmbedder::new(dimensions)),
            index: Arc::new(InMemoryVectorIndex::new()),
            llm_mock: true,
            index_mock: true,
        }
    }

    /// Probe every hosted capability; stand-ins report `mock_mode`
    pub async fn health(&self) -> ServicesHealth {
        async fn probe<F>(mock: bool, check: F) -> ServiceHealth
        where
            F: std::future::Future<Output = Result<bool>>,
        {
            if mock {
                return ServiceHealth::MockMode;
            }
            match check.await {
                Ok(true) => ServiceHealth::Healthy,
                Ok(false) => ServiceHealth::Unhealthy,
                Err(e) => {
                    tracing::warn!("Health check failed: {}", e);
                    ServiceHealth::Unhealthy
                }
            }
        }

        let (llm, embeddings, vector_index) = tokio::join!(
            probe(self.llm_mock, self.llm.health_check()),
            probe(self.llm_mock, self.embedder.health_check()),
            probe(self.index_mock, self.index.health_check()),
        );

        ServicesHealth {
            llm,
            embeddings,
            vector_index,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unconfigured_services_are_mocks() {
        let services = Services::from_config(&AppConfig::default()).unwrap();
        assert!(services.llm_mock);
        assert!(services.index_mock);
        assert_eq!(services.llm.name(), "mock");
        assert_eq!(services.index.name(), "in-memory");
        assert_eq!(services.embedder.dimensions(), 768);
    }

    #[test]
    fn test_configured_services_are_hosted() {
        let mut config = AppConfig::default();
        config.llm.api_key = Some("real-key".to_string());
        config.vector_index.api_key = Some("pc-key".to_string());
        config.vector_index.index_name = Some("policies".to_string());

        let services = Services::from_config(&config).unwrap();
        assert!(!services.llm_mock);
        assert!(!services.index_mock);
        assert_eq!(services.llm.name(), "gemini");
        assert_eq!(services.index.name(), "pinecone");
    }

    #[tokio::test]
    async fn test_mock_health() {
        let health = Services::mock(8).health().await;
        assert_eq!(health.llm, ServiceHealth::MockMode);
        assert_eq!(health.vector_index, ServiceHealth::MockMode);
        assert!(health.all_available());
    }
}
