//! Embeds chunks into the vector index and retrieves them per question

use std::sync::Arc;

use crate::error::{Error, Result};
use crate::providers::{EmbeddingProvider, IndexMatch, IndexRecord, VectorIndexProvider};
use crate::types::Chunk;

/// Embeds and upserts chunks, then answers similarity queries scoped to one document
#[derive(Clone)]
pub struct ChunkIndexer {
    embedder: Arc<dyn EmbeddingProvider>,
    index: Arc<dyn VectorIndexProvider>,
    batch_size: usize,
}

impl ChunkIndexer {
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        index: Arc<dyn VectorIndexProvider>,
        batch_size: usize,
    ) -> Self {
        Self {
            embedder,
            index,
            batch_size: batch_size.max(1),
        }
    }

    /// Embed every chunk, then upsert in batches. Any failure aborts the whole
    /// document; records already upserted are overwritten on the next attempt
    /// because ids are deterministic.
    pub async fn index_chunks(&self, document: &str, chunks: &[Chunk]) -> Result<usize> {
        if chunks.is_empty() {
            return Ok(0);
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let vectors = self.embedder.embed_batch(&texts).await?;
        if vectors.len() != chunks.len() {
            return Err(Error::embedding(format!(
                "{} returned {} embeddings for {} chunks",
                self.embedder.name(),
                vectors.len(),
                chunks.len()
            )));
        }

        let records: Vec<IndexRecord> = chunks
            .iter()
            .zip(vectors)
            .map(|(chunk, values)| IndexRecord::from_chunk(chunk, document, values))
            .collect();

        let total_batches = records.len().div_ceil(self.batch_size);
        for (i, batch) in records.chunks(self.batch_size).enumerate() {
            self.index.upsert(batch).await?;
            tracing::debug!("Uploaded batch {}/{}", i + 1, total_batches);
        }

        tracing::info!(
            "Indexed {} chunks for document {} into {}",
            records.len(),
            document,
            self.index.name()
        );
        Ok(records.len())
    }

    /// Top-k chunks of `document` most similar to `question`
    pub async fn search(
        &self,
        document: &str,
        question: &str,
        top_k: usize,
    ) -> Result<Vec<IndexMatch>> {
        let vector = self.embedder.embed(question).await?;
        self.index.query(&vector, top_k, Some(document)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::{HashingEmbedder, InMemoryVectorIndex, IndexStats};
    use async_trait::async_trait;
    use parking_lot::Mutex;

    /// Records batch sizes while delegating to the in-memory index
    #[derive(Default)]
    struct RecordingIndex {
        inner: InMemoryVectorIndex,
        batches: Mutex<Vec<usize>>,
    }

    #[async_trait]
    impl VectorIndexProvider for RecordingIndex {
        async fn upsert(&self, records: &[IndexRecord]) -> Result<()> {
            self.batches.lock().push(records.len());
            self.inner.upsert(records).await
        }

        async fn query(
            &self,
            vector: &[f32],
            top_k: usize,
            document: Option<&str>,
        ) -> Result<Vec<IndexMatch>> {
            self.inner.query(vector, top_k, document).await
        }

        async fn stats(&self) -> Result<IndexStats> {
            self.inner.stats().await
        }

        async fn health_check(&self) -> Result<bool> {
            Ok(true)
        }

        fn name(&self) -> &str {
            "recording"
        }
    }

    struct FailingEmbedder;

    #[async_trait]
    impl EmbeddingProvider for FailingEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            Err(Error::embedding("model unavailable"))
        }

        fn dimensions(&self) -> usize {
            4
        }

        async fn health_check(&self) -> Result<bool> {
            Ok(false)
        }

        fn name(&self) -> &str {
            "failing"
        }
    }

    fn chunks(n: u32) -> Vec<Chunk> {
        (1..=n)
            .map(|i| Chunk::new("fp", 1, i, format!("clause {} about room rent", i)))
            .collect()
    }

    #[tokio::test]
    async fn test_index_in_batches() {
        let index = Arc::new(RecordingIndex::default());
        let indexer = ChunkIndexer::new(Arc::new(HashingEmbedder::new(32)), index.clone(), 100);

        let count = indexer.index_chunks("fp", &chunks(250)).await.unwrap();
        assert_eq!(count, 250);
        assert_eq!(*index.batches.lock(), vec![100, 100, 50]);
        assert_eq!(index.inner.len(), 250);
    }

    #[tokio::test]
    async fn test_search_is_scoped_to_document() {
        let index = Arc::new(InMemoryVectorIndex::new());
        let indexer = ChunkIndexer::new(Arc::new(HashingEmbedder::new(64)), index, 10);

        indexer
            .index_chunks("doc-a", &[Chunk::new("doc-a", 1, 1, "grace period thirty days".to_string())])
            .await
            .unwrap();
        indexer
            .index_chunks("doc-b", &[Chunk::new("doc-b", 1, 1, "grace period thirty days".to_string())])
            .await
            .unwrap();

        let hits = indexer.search("doc-a", "grace period", 5).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert!(hits[0].id.starts_with("doc-a"));
    }

    #[tokio::test]
    async fn test_embedding_failure_aborts_without_upsert() {
        let index = Arc::new(RecordingIndex::default());
        let indexer = ChunkIndexer::new(Arc::new(FailingEmbedder), index.clone(), 10);

        let err = indexer.index_chunks("fp", &chunks(3)).await.unwrap_err();
        assert!(matches!(err, Error::Embedding(_)));
        assert!(index.batches.lock().is_empty());
    }
}
