//! In-process providers used when hosted credentials are missing

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::Result;

use super::embedding::EmbeddingProvider;
use super::llm::{GenerationRequest, LlmProvider};
use super::vector_index::{IndexMatch, IndexRecord, IndexStats, VectorIndexProvider};

/// Canned answer returned by [`MockLlm`]
pub const MOCK_RESPONSE: &str =
    "This is a mock response from the AI assistant. Please configure Gemini API for full functionality.";

/// LLM stand-in that always returns the same text
pub struct MockLlm {
    response: String,
    calls: AtomicUsize,
}

impl Default for MockLlm {
    fn default() -> Self {
        Self::new(MOCK_RESPONSE)
    }
}

impl MockLlm {
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of `generate` calls so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LlmProvider for MockLlm {
    async fn generate(&self, _request: &GenerationRequest) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.response.clone())
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    fn name(&self) -> &str {
        "mock"
    }

    fn model(&self) -> &str {
        "mock"
    }
}

/// Deterministic bag-of-words embedder using feature hashing
pub struct HashingEmbedder {
    dimensions: usize,
}

impl HashingEmbedder {
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions: dimensions.max(1),
        }
    }

    fn embed_sync(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimensions];
        let lower = text.to_lowercase();

        for token in lower
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| t.len() > 1)
        {
            let hash = fnv1a(token.as_bytes());
            let bucket = (hash % self.dimensions as u64) as usize;
            let sign = if (hash >> 63) == 0 { 1.0 } else { -1.0 };
            vector[bucket] += sign;
        }

        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut vector {
                *v /= norm;
            }
        }
        vector
    }
}

fn fnv1a(bytes: &[u8]) -> u64 {
    let mut hash: u64 = 0xcbf29ce484222325;
    for b in bytes {
        hash ^= *b as u64;
        hash = hash.wrapping_mul(0x100000001b3);
    }
    hash
}

#[async_trait]
impl EmbeddingProvider for HashingEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(self.embed_sync(text))
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    fn name(&self) -> &str {
        "hashing"
    }
}

/// Documents kept by [`InMemoryVectorIndex::new`]
pub const DEFAULT_MAX_DOCUMENTS: usize = 32;

#[derive(Default)]
struct Store {
    records: HashMap<String, IndexRecord>,
    /// Document fingerprints, least recently indexed first
    documents: VecDeque<String>,
}

impl Store {
    fn touch(&mut self, document: &str) {
        if let Some(pos) = self.documents.iter().position(|d| d == document) {
            self.documents.remove(pos);
        }
        self.documents.push_back(document.to_string());
    }

    fn evict_to(&mut self, max_documents: usize) {
        while self.documents.len() > max_documents {
            let Some(evicted) = self.documents.pop_front() else {
                break;
            };
            self.records.retain(|_, r| r.document != evicted);
            tracing::debug!("Evicted vectors of document {}", evicted);
        }
    }
}

/// Vector index held in process memory, scored by cosine similarity.
///
/// Holds at most `max_documents` documents; indexing another one drops the
/// vectors of the document indexed least recently.
pub struct InMemoryVectorIndex {
    store: RwLock<Store>,
    max_documents: usize,
}

impl Default for InMemoryVectorIndex {
    fn default() -> Self {
        Self::with_max_documents(DEFAULT_MAX_DOCUMENTS)
    }
}

impl InMemoryVectorIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_documents(max_documents: usize) -> Self {
        Self {
            store: RwLock::new(Store::default()),
            max_documents: max_documents.max(1),
        }
    }

    pub fn len(&self) -> usize {
        self.store.read().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.read().records.is_empty()
    }

    /// Number of documents with vectors in the index
    pub fn document_count(&self) -> usize {
        self.store.read().documents.len()
    }
}

/// Cosine similarity; zero when either vector has no magnitude
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let na = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let nb = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if na == 0.0 || nb == 0.0 {
        0.0
    } else {
        dot / (na * nb)
    }
}

#[async_trait]
impl VectorIndexProvider for InMemoryVectorIndex {
    async fn upsert(&self, records: &[IndexRecord]) -> Result<()> {
        let mut store = self.store.write();
        for record in records {
            store.touch(&record.document);
            store.records.insert(record.id.clone(), record.clone());
        }
        store.evict_to(self.max_documents);
        Ok(())
    }

    async fn query(
        &self,
        vector: &[f32],
        top_k: usize,
        document: Option<&str>,
    ) -> Result<Vec<IndexMatch>> {
        let store = self.store.read();
        let mut matches: Vec<IndexMatch> = store
            .records
            .values()
            .filter(|r| document.map_or(true, |d| r.document == d))
            .map(|r| IndexMatch {
                id: r.id.clone(),
                score: cosine_similarity(vector, &r.values),
                text: r.text.clone(),
                page: r.page,
                ordinal: r.ordinal,
            })
            .collect();

        matches.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.id.cmp(&b.id))
        });
        matches.truncate(top_k);
        Ok(matches)
    }

    async fn stats(&self) -> Result<IndexStats> {
        let store = self.store.read();
        Ok(IndexStats {
            dimension: store.records.values().next().map(|r| r.values.len()),
            total_vectors: store.records.len() as u64,
        })
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    fn name(&self) -> &str {
        "in-memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, document: &str, values: Vec<f32>) -> IndexRecord {
        IndexRecord {
            id: id.to_string(),
            values,
            document: document.to_string(),
            text: format!("text of {}", id),
            page: 1,
            ordinal: 1,
        }
    }

    #[tokio::test]
    async fn test_hashing_embedder_is_deterministic_and_normalized() {
        let embedder = HashingEmbedder::new(64);
        let a = embedder.embed("Grace period for premium payment").await.unwrap();
        let b = embedder.embed("Grace period for premium payment").await.unwrap();

        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        let norm: f32 = a.iter().map(|v| v * v).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[tokio::test]
    async fn test_related_text_scores_higher() {
        let embedder = HashingEmbedder::new(256);
        let question = embedder.embed("grace period premium").await.unwrap();
        let related = embedder
            .embed("a grace period of thirty days for premium payment")
            .await
            .unwrap();
        let unrelated = embedder.embed("ambulance charges are reimbursed").await.unwrap();

        assert!(cosine_similarity(&question, &related) > cosine_similarity(&question, &unrelated));
    }

    #[tokio::test]
    async fn test_in_memory_query_ranks_and_filters() {
        let index = InMemoryVectorIndex::new();
        index
            .upsert(&[
                record("close", "doc-a", vec![1.0, 0.1]),
                record("far", "doc-a", vec![0.0, 1.0]),
                record("other-doc", "doc-b", vec![1.0, 0.0]),
            ])
            .await
            .unwrap();

        let matches = index.query(&[1.0, 0.0], 5, Some("doc-a")).await.unwrap();
        let ids: Vec<&str> = matches.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["close", "far"]);

        let top = index.query(&[1.0, 0.0], 1, None).await.unwrap();
        assert_eq!(top[0].id, "other-doc");
    }

    #[tokio::test]
    async fn test_upsert_same_id_overwrites() {
        let index = InMemoryVectorIndex::new();
        index.upsert(&[record("x", "d", vec![1.0])]).await.unwrap();
        index.upsert(&[record("x", "d", vec![2.0])]).await.unwrap();

        assert_eq!(index.len(), 1);
        assert_eq!(index.stats().await.unwrap().total_vectors, 1);
    }

    #[tokio::test]
    async fn test_oldest_document_evicted_past_limit() {
        let index = InMemoryVectorIndex::with_max_documents(2);
        index.upsert(&[record("a1", "doc-a", vec![1.0]), record("a2", "doc-a", vec![1.0])]).await.unwrap();
        index.upsert(&[record("b1", "doc-b", vec![1.0])]).await.unwrap();
        // Re-indexing doc-a makes doc-b the oldest
        index.upsert(&[record("a1", "doc-a", vec![1.0])]).await.unwrap();
        index.upsert(&[record("c1", "doc-c", vec![1.0])]).await.unwrap();

        assert_eq!(index.document_count(), 2);
        assert_eq!(index.len(), 3);
        assert!(index.query(&[1.0], 5, Some("doc-b")).await.unwrap().is_empty());
        assert_eq!(index.query(&[1.0], 5, Some("doc-a")).await.unwrap().len(), 2);
        assert_eq!(index.query(&[1.0], 5, Some("doc-c")).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_memory_bounded_across_many_documents() {
        let index = InMemoryVectorIndex::new();
        for i in 0..(DEFAULT_MAX_DOCUMENTS * 3) {
            let document = format!("doc-{}", i);
            index
                .upsert(&[
                    record(&format!("{}-1", document), &document, vec![1.0]),
                    record(&format!("{}-2", document), &document, vec![0.5]),
                ])
                .await
                .unwrap();
        }

        assert_eq!(index.document_count(), DEFAULT_MAX_DOCUMENTS);
        assert_eq!(index.len(), DEFAULT_MAX_DOCUMENTS * 2);
    }

    #[tokio::test]
    async fn test_mock_llm_counts_calls() {
        let llm = MockLlm::default();
        let request = GenerationRequest::new("q", &crate::config::LlmConfig::default());
        assert_eq!(llm.generate(&request).await.unwrap(), MOCK_RESPONSE);
        assert_eq!(llm.calls(), 1);
    }
}
