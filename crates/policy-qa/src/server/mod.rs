//! HTTP server for policy analysis

pub mod routes;
pub mod state;

use axum::Router;
use std::net::SocketAddr;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::AppConfig;
use crate::error::{Error, Result};
use state::AppState;

/// Policy analysis HTTP server
pub struct PolicyServer {
    address: String,
    state: AppState,
}

impl PolicyServer {
    /// Create a server with providers selected from the configuration
    pub fn new(config: AppConfig) -> Result<Self> {
        let address = format!("{}:{}", config.server.host, config.server.port);
        let state = AppState::new(config)?;
        Ok(Self { address, state })
    }

    /// Create a server over existing state
    pub fn with_state(address: impl Into<String>, state: AppState) -> Self {
        Self {
            address: address.into(),
            state,
        }
    }

    /// Build the router with all routes
    pub fn router(&self) -> Router {
        build_router(self.state.clone())
    }

    /// Start the server
    pub async fn start(self) -> Result<()> {
        let addr: SocketAddr = self
            .address
            .parse()
            .map_err(|e| Error::Config(format!("Invalid address '{}': {}", self.address, e)))?;

        let router = self.router();

        tracing::info!("Starting policy analysis server on http://{}", addr);

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| Error::Config(format!("Failed to bind: {}", e)))?;

        axum::serve(listener, router)
            .await
            .map_err(|e| Error::Internal(format!("Server error: {}", e)))?;

        Ok(())
    }

    /// Get the server address
    pub fn address(&self) -> &str {
        &self.address
    }
}

/// Router over `state` with CORS, tracing and compression layers
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    routes::api_routes()
        .with_state(state)
        // Applied bottom to top
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(cors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::Services;
    use crate::testing::{build_pdf, serve_pdf};
    use crate::types::Locator;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use serde_json::Value;
    use tower::ServiceExt;

    fn state() -> AppState {
        AppState::with_services(AppConfig::default(), Services::mock(32)).unwrap()
    }

    async fn send(router: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = router.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    const GRACE_PAGE: &str = "A Grace Period of thirty days is allowed for premium payment.";

    fn policy_pdf(dir: &tempfile::TempDir) -> std::path::PathBuf {
        let path = dir.path().join("policy.pdf");
        std::fs::write(&path, build_pdf(&[GRACE_PAGE]).unwrap()).unwrap();
        path
    }

    #[tokio::test]
    async fn test_root() {
        let request = Request::get("/").body(Body::empty()).unwrap();
        let (status, body) = send(build_router(state()), request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Insurance Policy Analyzer API");
        assert_eq!(body["default_strategy"], "rule_based");
    }

    #[tokio::test]
    async fn test_health_reports_mock_mode() {
        let request = Request::get("/health").body(Body::empty()).unwrap();
        let (status, body) = send(build_router(state()), request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["services"]["llm"], "mock_mode");
        assert_eq!(body["services"]["vector_index"], "mock_mode");
    }

    #[tokio::test]
    async fn test_analyze_requires_document_and_questions() {
        let request = post_json("/analyze", serde_json::json!({"documents": "policy.pdf"}));
        let (status, body) = send(build_router(state()), request).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["type"], "invalid_request");
        assert_eq!(body["error"]["message"], "Document URL and questions are required");
    }

    #[tokio::test]
    async fn test_analyze_remote_document() {
        let url = serve_pdf(build_pdf(&[GRACE_PAGE]).unwrap()).await.unwrap();

        let request = post_json(
            "/analyze",
            serde_json::json!({
                "documents": url,
                "questions": [
                    "What is the grace period for premium payment?",
                    "What is the waiting period for cataract surgery?"
                ],
                "strategy": "rule_based"
            }),
        );
        let (status, body) = send(build_router(state()), request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["status"], "completed");
        assert_eq!(body["total_questions"], 2);
        assert_eq!(body["found_count"], 1);
        assert_eq!(body["results"][0]["answer"], "Grace period: 30 days");
        assert_eq!(body["message"], "Analysis completed successfully with 50.0% accuracy");
    }

    #[tokio::test]
    async fn test_analyze_refuses_server_paths() {
        let dir = tempfile::tempdir().unwrap();
        let path = policy_pdf(&dir);

        for documents in [path.to_string_lossy().to_string(), "/nonexistent/policy.pdf".to_string()] {
            let request = post_json(
                "/analyze",
                serde_json::json!({
                    "documents": documents,
                    "questions": ["What is the grace period for premium payment?"]
                }),
            );
            let (status, body) = send(build_router(state()), request).await;

            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(body["error"]["type"], "invalid_request");
            assert!(body.get("results").is_none());
            assert!(!body.to_string().contains("thirty days"));
        }
    }

    #[tokio::test]
    async fn test_analyze_missing_document_is_bad_gateway() {
        let url = serve_pdf(build_pdf(&[GRACE_PAGE]).unwrap()).await.unwrap();
        let request = post_json(
            "/analyze",
            serde_json::json!({
                "documents": url.replace("policy.pdf", "missing.pdf"),
                "questions": ["What is the grace period?"]
            }),
        );
        let (status, body) = send(build_router(state()), request).await;

        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["error"]["type"], "fetch_error");
    }

    #[tokio::test]
    async fn test_sample_endpoint() {
        let dir = tempfile::tempdir().unwrap();
        let path = policy_pdf(&dir);
        let state = state().with_sample_document(Locator::Local(path));

        let request = Request::post("/test").body(Body::empty()).unwrap();
        let (status, body) = send(build_router(state), request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["test_results"].as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_sample_endpoint_reports_failure() {
        let state = state().with_sample_document(Locator::Local("/nonexistent.pdf".into()));

        let request = Request::post("/test").body(Body::empty()).unwrap();
        let (status, body) = send(build_router(state), request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], false);
        assert!(body["message"].as_str().unwrap().starts_with("Test failed:"));
    }
}
