//! Application state for the analysis server

use std::sync::Arc;

use crate::config::AppConfig;
use crate::error::Result;
use crate::pipeline::Pipeline;
use crate::providers::Services;
use crate::types::{Locator, SAMPLE_DOCUMENT_URL};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// Analysis pipeline (owns the configuration and services)
    pipeline: Pipeline,
    /// Document analyzed by `POST /test`
    sample_document: Locator,
}

impl AppState {
    /// Create state with providers selected from the configuration
    pub fn new(config: AppConfig) -> Result<Self> {
        tracing::info!("Initializing application state...");
        let services = Services::from_config(&config)?;
        Self::with_services(config, services)
    }

    /// Create state over already constructed services
    pub fn with_services(config: AppConfig, services: Services) -> Result<Self> {
        let pipeline = Pipeline::new(config, services)?;
        tracing::info!(
            "Default strategy: {} (llm: {}, index: {})",
            pipeline.default_strategy(),
            pipeline.services().llm.name(),
            pipeline.services().index.name()
        );

        Ok(Self {
            inner: Arc::new(AppStateInner {
                pipeline,
                sample_document: Locator::Remote(SAMPLE_DOCUMENT_URL.to_string()),
            }),
        })
    }

    /// Replace the document used by `POST /test`
    pub fn with_sample_document(self, locator: Locator) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                pipeline: self.inner.pipeline.clone(),
                sample_document: locator,
            }),
        }
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.inner.pipeline
    }

    pub fn config(&self) -> &AppConfig {
        self.inner.pipeline.config()
    }

    pub fn services(&self) -> &Services {
        self.inner.pipeline.services()
    }

    pub fn sample_document(&self) -> &Locator {
        &self.inner.sample_document
    }
}
