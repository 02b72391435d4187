//! Pinecone vector index over the REST API
//!
//! The data-plane host is either configured directly or resolved once through
//! the control plane (`GET /indexes/{name}`).

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::time::Duration;
use tokio::sync::OnceCell;

use crate::config::VectorIndexConfig;
use crate::error::{Error, Result};

use super::vector_index::{IndexMatch, IndexRecord, IndexStats, VectorIndexProvider};

const API_VERSION: &str = "2024-07";

/// Index description from the control plane
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexDescription {
    pub name: String,
    #[serde(default)]
    pub dimension: Option<usize>,
    #[serde(default)]
    pub metric: Option<String>,
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub status: Option<IndexStatus>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexStatus {
    #[serde(default)]
    pub ready: bool,
    #[serde(default)]
    pub state: Option<String>,
}

#[derive(Deserialize)]
struct IndexList {
    #[serde(default)]
    indexes: Vec<IndexDescription>,
}

/// Pinecone index client
pub struct PineconeIndex {
    client: reqwest::Client,
    control_plane_url: String,
    index_name: String,
    namespace: Option<String>,
    host: OnceCell<String>,
}

impl PineconeIndex {
    /// Create a client. Requires an API key and an index name.
    pub fn new(config: &VectorIndexConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or_else(|| Error::Config("PINECONE_API_KEY is not set".to_string()))?;
        let index_name = config
            .index_name
            .clone()
            .filter(|n| !n.trim().is_empty())
            .ok_or_else(|| Error::Config("PINECONE_INDEX_NAME is not set".to_string()))?;

        let mut headers = HeaderMap::new();
        headers.insert(
            "Api-Key",
            HeaderValue::from_str(api_key)
                .map_err(|_| Error::Config("PINECONE_API_KEY contains invalid characters".to_string()))?,
        );
        headers.insert("X-Pinecone-API-Version", HeaderValue::from_static(API_VERSION));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .build()
            .map_err(|e| Error::Config(format!("Failed to build Pinecone HTTP client: {}", e)))?;

        let host = match config.host.as_deref().filter(|h| !h.trim().is_empty()) {
            Some(h) => OnceCell::new_with(Some(normalize_host(h))),
            None => OnceCell::new(),
        };

        Ok(Self {
            client,
            control_plane_url: config.control_plane_url.trim_end_matches('/').to_string(),
            index_name,
            namespace: config.namespace.clone(),
            host,
        })
    }

    pub fn index_name(&self) -> &str {
        &self.index_name
    }

    /// List every index visible to the API key
    pub async fn list_indexes(&self) -> Result<Vec<IndexDescription>> {
        let url = format!("{}/indexes", self.control_plane_url);
        let list: IndexList = self.send(self.client.get(&url)).await?;
        Ok(list.indexes)
    }

    /// Describe the configured index
    pub async fn describe(&self) -> Result<IndexDescription> {
        let url = format!("{}/indexes/{}", self.control_plane_url, self.index_name);
        self.send(self.client.get(&url)).await
    }

    async fn host(&self) -> Result<&str> {
        let host = self
            .host
            .get_or_try_init(|| async {
                let description = self.describe().await?;
                let host = description.host.ok_or_else(|| {
                    Error::vector_index(format!(
                        "Index '{}' has no host; is it still initializing?",
                        self.index_name
                    ))
                })?;
                tracing::info!("Resolved Pinecone host for '{}': {}", self.index_name, host);
                Ok::<_, Error>(normalize_host(&host))
            })
            .await?;
        Ok(host.as_str())
    }

    async fn send<R>(&self, request: reqwest::RequestBuilder) -> Result<R>
    where
        R: for<'de> Deserialize<'de>,
    {
        let response = request
            .send()
            .await
            .map_err(|e| Error::vector_index(format!("Pinecone request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let detail = format!("Pinecone returned {}: {}", status, body);
            return Err(match status.as_u16() {
                401 | 403 => Error::Authentication(detail),
                404 => Error::vector_index(format!(
                    "Index '{}' not found ({})",
                    self.index_name, detail
                )),
                _ => Error::vector_index(detail),
            });
        }

        response
            .json()
            .await
            .map_err(|e| Error::vector_index(format!("Failed to parse Pinecone response: {}", e)))
    }

    async fn post<R>(&self, path: &str, body: &Value) -> Result<R>
    where
        R: for<'de> Deserialize<'de>,
    {
        let url = format!("{}{}", self.host().await?, path);
        self.send(self.client.post(&url).json(body)).await
    }
}

fn normalize_host(host: &str) -> String {
    let host = host.trim().trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("https://{}", host)
    }
}

#[derive(Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<QueryMatch>,
}

#[derive(Deserialize)]
struct QueryMatch {
    id: String,
    #[serde(default)]
    score: f32,
    #[serde(default)]
    metadata: Map<String, Value>,
}

impl From<QueryMatch> for IndexMatch {
    fn from(m: QueryMatch) -> Self {
        let number = |key: &str| m.metadata.get(key).and_then(Value::as_f64).unwrap_or(0.0) as u32;
        Self {
            page: number("page"),
            ordinal: number("chunk"),
            text: m
                .metadata
                .get("text")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            id: m.id,
            score: m.score,
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StatsResponse {
    #[serde(default)]
    dimension: Option<usize>,
    #[serde(default)]
    total_vector_count: u64,
}

#[async_trait]
impl VectorIndexProvider for PineconeIndex {
    async fn upsert(&self, records: &[IndexRecord]) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }

        let vectors: Vec<Value> = records
            .iter()
            .map(|r| {
                json!({
                    "id": r.id,
                    "values": r.values,
                    "metadata": {
                        "text": r.text,
                        "page": r.page,
                        "chunk": r.ordinal,
                        "document": r.document,
                    }
                })
            })
            .collect();

        let mut body = json!({ "vectors": vectors });
        if let Some(ns) = &self.namespace {
            body["namespace"] = json!(ns);
        }

        let _: Value = self.post("/vectors/upsert", &body).await?;
        tracing::debug!("Upserted {} vectors into '{}'", records.len(), self.index_name);
        Ok(())
    }

    async fn query(
        &self,
        vector: &[f32],
        top_k: usize,
        document: Option<&str>,
    ) -> Result<Vec<IndexMatch>> {
        let mut body = json!({
            "vector": vector,
            "topK": top_k,
            "includeMetadata": true,
        });
        if let Some(doc) = document {
            body["filter"] = json!({ "document": { "$eq": doc } });
        }
        if let Some(ns) = &self.namespace {
            body["namespace"] = json!(ns);
        }

        let response: QueryResponse = self.post("/query", &body).await?;
        Ok(response.matches.into_iter().map(IndexMatch::from).collect())
    }

    async fn stats(&self) -> Result<IndexStats> {
        let response: StatsResponse = self.post("/describe_index_stats", &json!({})).await?;
        Ok(IndexStats {
            dimension: response.dimension,
            total_vectors: response.total_vector_count,
        })
    }

    async fn health_check(&self) -> Result<bool> {
        let description = self.describe().await?;
        Ok(description.status.map(|s| s.ready).unwrap_or(true))
    }

    fn name(&self) -> &str {
        "pinecone"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        extract::{Path, State},
        http::HeaderMap as AxumHeaders,
        routing::{get, post},
        Json, Router,
    };
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[derive(Clone, Default)]
    struct FakeState {
        base: Arc<Mutex<String>>,
        upserts: Arc<Mutex<Vec<Value>>>,
        queries: Arc<Mutex<Vec<Value>>>,
        describe_calls: Arc<Mutex<usize>>,
    }

    async fn describe(
        State(state): State<FakeState>,
        Path(name): Path<String>,
        headers: AxumHeaders,
    ) -> Json<Value> {
        assert_eq!(headers.get("Api-Key").unwrap(), "pc-key");
        *state.describe_calls.lock() += 1;
        Json(json!({
            "name": name,
            "dimension": 3,
            "metric": "cosine",
            "host": state.base.lock().clone(),
            "status": { "ready": true, "state": "Ready" }
        }))
    }

    async fn upsert(State(state): State<FakeState>, Json(body): Json<Value>) -> Json<Value> {
        let count = body["vectors"].as_array().map(|v| v.len()).unwrap_or(0);
        state.upserts.lock().push(body);
        Json(json!({ "upsertedCount": count }))
    }

    async fn query(State(state): State<FakeState>, Json(body): Json<Value>) -> Json<Value> {
        state.queries.lock().push(body);
        Json(json!({
            "matches": [
                { "id": "fp-page_2_chunk_1", "score": 0.91,
                  "metadata": { "text": "grace period of 30 days", "page": 2.0, "chunk": 1.0, "document": "fp" } }
            ]
        }))
    }

    async fn start() -> (VectorIndexConfig, FakeState) {
        let state = FakeState::default();
        let router = Router::new()
            .route("/indexes", get(|| async { Json(json!({ "indexes": [{ "name": "policies", "dimension": 3 }] })) }))
            .route("/indexes/:name", get(describe))
            .route("/vectors/upsert", post(upsert))
            .route("/query", post(query))
            .route(
                "/describe_index_stats",
                post(|| async { Json(json!({ "dimension": 3, "totalVectorCount": 42 })) }),
            )
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        *state.base.lock() = base.clone();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        let config = VectorIndexConfig {
            api_key: Some("pc-key".to_string()),
            index_name: Some("policies".to_string()),
            control_plane_url: base,
            timeout_secs: 5,
            ..Default::default()
        };
        (config, state)
    }

    fn record(id: &str) -> IndexRecord {
        IndexRecord {
            id: id.to_string(),
            values: vec![0.1, 0.2, 0.3],
            document: "fp".to_string(),
            text: "text".to_string(),
            page: 1,
            ordinal: 1,
        }
    }

    #[tokio::test]
    async fn test_host_resolved_once() {
        let (config, state) = start().await;
        let index = PineconeIndex::new(&config).unwrap();

        index.upsert(&[record("a"), record("b")]).await.unwrap();
        index.upsert(&[record("c")]).await.unwrap();

        assert_eq!(*state.describe_calls.lock(), 1);
        let upserts = state.upserts.lock();
        assert_eq!(upserts.len(), 2);
        assert_eq!(upserts[0]["vectors"][1]["metadata"]["document"], "fp");
    }

    #[tokio::test]
    async fn test_query_filters_by_document() {
        let (config, state) = start().await;
        let index = PineconeIndex::new(&config).unwrap();

        let matches = index.query(&[0.1, 0.2, 0.3], 3, Some("fp")).await.unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].page, 2);
        assert_eq!(matches[0].ordinal, 1);
        assert_eq!(matches[0].text, "grace period of 30 days");

        let queries = state.queries.lock();
        assert_eq!(queries[0]["topK"], 3);
        assert_eq!(queries[0]["filter"]["document"]["$eq"], "fp");
    }

    #[tokio::test]
    async fn test_stats_and_listing() {
        let (config, _) = start().await;
        let index = PineconeIndex::new(&config).unwrap();

        let stats = index.stats().await.unwrap();
        assert_eq!(stats.total_vectors, 42);
        assert_eq!(stats.dimension, Some(3));

        let indexes = index.list_indexes().await.unwrap();
        assert_eq!(indexes[0].name, "policies");
        assert!(index.health_check().await.unwrap());
    }

    #[test]
    fn test_normalize_host() {
        assert_eq!(normalize_host("idx-abc.svc.pinecone.io/"), "https://idx-abc.svc.pinecone.io");
        assert_eq!(normalize_host("http://localhost:5080"), "http://localhost:5080");
    }

    #[test]
    fn test_requires_index_name() {
        let config = VectorIndexConfig {
            api_key: Some("pc-key".to_string()),
            ..Default::default()
        };
        assert!(matches!(PineconeIndex::new(&config), Err(Error::Config(_))));
    }
}
