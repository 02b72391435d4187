//! Vector index provider trait for storing and searching chunk embeddings

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::types::Chunk;

/// A chunk embedding ready for upsert
#[derive(Debug, Clone, PartialEq)]
pub struct IndexRecord {
    /// Chunk id; upserting the same id overwrites
    pub id: String,
    pub values: Vec<f32>,
    /// Fingerprint of the owning document, used as the query filter
    pub document: String,
    pub text: String,
    pub page: u32,
    pub ordinal: u32,
}

impl IndexRecord {
    pub fn from_chunk(chunk: &Chunk, document: &str, values: Vec<f32>) -> Self {
        Self {
            id: chunk.id.clone(),
            values,
            document: document.to_string(),
            text: chunk.text.clone(),
            page: chunk.page,
            ordinal: chunk.ordinal,
        }
    }
}

/// Query hit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexMatch {
    pub id: String,
    /// Similarity score, higher is closer
    pub score: f32,
    pub text: String,
    pub page: u32,
    pub ordinal: u32,
}

/// Index statistics for diagnostics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndexStats {
    pub dimension: Option<usize>,
    pub total_vectors: u64,
}

/// Trait for vector storage and similarity search
///
/// Implementations:
/// - `PineconeIndex`: hosted Pinecone index over REST
/// - `InMemoryVectorIndex`: cosine similarity scan for mock mode
#[async_trait]
pub trait VectorIndexProvider: Send + Sync {
    /// Insert or overwrite records by id
    async fn upsert(&self, records: &[IndexRecord]) -> Result<()>;

    /// Nearest neighbours of `vector`, best first, optionally restricted to one document
    async fn query(
        &self,
        vector: &[f32],
        top_k: usize,
        document: Option<&str>,
    ) -> Result<Vec<IndexMatch>>;

    /// Index statistics
    async fn stats(&self) -> Result<IndexStats>;

    /// Check if the provider is healthy
    async fn health_check(&self) -> Result<bool>;

    /// Get provider name for logging
    fn name(&self) -> &str;
}
