//! Document retrieval from URLs and local paths

use std::time::Duration;

use crate::config::FetchConfig;
use crate::error::{Error, Result};
use crate::types::{Document, Locator};

/// Fetches document bytes into memory
#[derive(Clone)]
pub struct DocumentFetcher {
    client: reqwest::Client,
    max_bytes: usize,
}

impl DocumentFetcher {
    /// Create a fetcher with the configured timeout and size limit
    pub fn new(config: &FetchConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            max_bytes: config.max_document_bytes,
        })
    }

    /// Retrieve the document a locator points at. Failures are not retried.
    pub async fn fetch(&self, locator: &Locator) -> Result<Document> {
        let source = locator.to_string();
        let bytes = match locator {
            Locator::Remote(url) => self.fetch_remote(url).await?,
            Locator::Local(path) => {
                let bytes = tokio::fs::read(path)
                    .await
                    .map_err(|e| Error::fetch(&source, e.to_string()))?;
                self.check_size(&source, bytes.len())?;
                bytes
            }
        };

        tracing::info!("Fetched {} ({} bytes)", source, bytes.len());
        Ok(Document::new(source, bytes))
    }

    async fn fetch_remote(&self, url: &str) -> Result<Vec<u8>> {
        let mut response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::fetch(url, describe_transport_error(&e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::fetch(url, format!("HTTP {}", status)));
        }

        if let Some(len) = response.content_length() {
            self.check_size(url, len as usize)?;
        }

        let mut bytes = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| Error::fetch(url, describe_transport_error(&e)))?
        {
            bytes.extend_from_slice(&chunk);
            self.check_size(url, bytes.len())?;
        }

        Ok(bytes)
    }

    fn check_size(&self, source: &str, len: usize) -> Result<()> {
        if len > self.max_bytes {
            return Err(Error::fetch(
                source,
                format!(
                    "Document is {} bytes, larger than the {} byte limit",
                    len, self.max_bytes
                ),
            ));
        }
        Ok(())
    }
}

fn describe_transport_error(e: &reqwest::Error) -> String {
    if e.is_timeout() {
        format!("timed out: {}", e)
    } else if e.is_connect() {
        format!("connection failed: {}", e)
    } else {
        e.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::StatusCode, routing::get, Router};

    fn fetcher(max_bytes: usize) -> DocumentFetcher {
        DocumentFetcher::new(&FetchConfig {
            timeout_secs: 5,
            max_document_bytes: max_bytes,
        })
        .unwrap()
    }

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_fetch_local_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("policy.pdf");
        std::fs::write(&path, b"%PDF-1.5 fake").unwrap();

        let doc = fetcher(1024)
            .fetch(&Locator::Local(path.clone()))
            .await
            .unwrap();
        assert_eq!(doc.bytes, b"%PDF-1.5 fake");
        assert_eq!(doc.source, path.display().to_string());
    }

    #[tokio::test]
    async fn test_missing_local_file_is_fetch_error() {
        let err = fetcher(1024)
            .fetch(&Locator::parse("/definitely/not/here.pdf"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Fetch { .. }));
    }

    #[tokio::test]
    async fn test_oversized_local_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("big.pdf");
        std::fs::write(&path, vec![0u8; 64]).unwrap();

        let err = fetcher(16).fetch(&Locator::Local(path)).await.unwrap_err();
        assert!(err.to_string().contains("byte limit"));
    }

    #[tokio::test]
    async fn test_fetch_remote() {
        let base = serve(Router::new().route("/policy.pdf", get(|| async { "remote bytes" }))).await;

        let doc = fetcher(1024)
            .fetch(&Locator::parse(&format!("{}/policy.pdf", base)))
            .await
            .unwrap();
        assert_eq!(doc.bytes, b"remote bytes");
    }

    #[tokio::test]
    async fn test_remote_error_status_is_fetch_error() {
        let base = serve(Router::new().route(
            "/gone.pdf",
            get(|| async { (StatusCode::NOT_FOUND, "missing") }),
        ))
        .await;

        let err = fetcher(1024)
            .fetch(&Locator::parse(&format!("{}/gone.pdf", base)))
            .await
            .unwrap_err();
        match err {
            Error::Fetch { message, .. } => assert!(message.contains("404")),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
