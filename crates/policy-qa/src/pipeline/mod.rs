//! End-to-end analysis: fetch, extract, index, answer

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::answering::{build_answerer, AnswerContext, Generator, RequestThrottle};
use crate::config::AppConfig;
use crate::error::{Error, Result};
use crate::ingestion::{DocumentFetcher, PdfExtractor, WordChunker};
use crate::providers::Services;
use crate::retrieval::ChunkIndexer;
use crate::types::{
    AnalysisResult, AnswerStrategy, DocumentOverview, ExtractedText, Locator, OverviewMode,
};

/// Runs analyses against the injected services
///
/// Cheap to clone; the throttle is shared between clones so concurrent
/// analyses pace their model calls together.
#[derive(Clone)]
pub struct Pipeline {
    config: Arc<AppConfig>,
    services: Services,
    fetcher: DocumentFetcher,
    chunker: WordChunker,
    throttle: Arc<RequestThrottle>,
}

impl Pipeline {
    pub fn new(config: AppConfig, services: Services) -> Result<Self> {
        let fetcher = DocumentFetcher::new(&config.fetch)?;
        let chunker = WordChunker::new(config.chunking.max_chunk_chars);
        // Canned mock replies are not rate limited
        let throttle = if services.llm_mock {
            RequestThrottle::new(0, Duration::ZERO)
        } else {
            RequestThrottle::from_config(&config.llm)
        };
        let throttle = Arc::new(throttle);

        Ok(Self {
            config: Arc::new(config),
            services,
            fetcher,
            chunker,
            throttle,
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn services(&self) -> &Services {
        &self.services
    }

    /// Strategy used when a request does not name one
    pub fn default_strategy(&self) -> AnswerStrategy {
        self.config.pipeline.strategy
    }

    /// Fetch and extract a document, then answer every question.
    ///
    /// Fetch, extraction and indexing failures fail the whole analysis.
    pub async fn analyze(
        &self,
        locator: &Locator,
        questions: &[String],
        strategy: AnswerStrategy,
    ) -> Result<AnalysisResult> {
        let start = Instant::now();
        tracing::info!(
            "Analyzing {} ({} questions, strategy {})",
            locator,
            questions.len(),
            strategy
        );

        let (fingerprint, extracted) = self.load(locator).await?;
        let mut result = self
            .answer_extracted(&locator.to_string(), &fingerprint, &extracted, questions, strategy)
            .await?;
        result.elapsed_ms = start.elapsed().as_millis() as u64;
        Ok(result)
    }

    /// Analyze a whole document without questions.
    ///
    /// A document without text is an extraction error here, since there is
    /// nothing to describe.
    pub async fn overview(&self, locator: &Locator, mode: OverviewMode) -> Result<DocumentOverview> {
        let start = Instant::now();
        tracing::info!("Describing {} ({} analysis)", locator, mode);

        let (_, extracted) = self.load(locator).await?;
        let source = locator.to_string();
        if extracted.is_empty() {
            return Err(Error::extraction(&source, "No text content found in document"));
        }

        let generator = Generator::new(self.services.llm.clone(), &self.config.llm, self.throttle.clone());
        let analysis = generator.overview(mode, &extracted.full_text()).await?;

        Ok(DocumentOverview::new(
            source,
            mode,
            analysis,
            start.elapsed().as_millis() as u64,
        ))
    }

    /// Describe several documents in order; one failure does not stop the rest
    pub async fn overview_all(
        &self,
        locators: &[Locator],
        mode: OverviewMode,
    ) -> Vec<Result<DocumentOverview>> {
        let delay = self.model_delay();
        let mut results = Vec::with_capacity(locators.len());
        for (i, locator) in locators.iter().enumerate() {
            if i > 0 && !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            tracing::info!("Document {}/{}: {}", i + 1, locators.len(), locator);
            let result = self.overview(locator, mode).await;
            if let Err(e) = &result {
                tracing::error!("Analysis of {} failed: {}", locator, e);
            }
            results.push(result);
        }
        results
    }

    /// Fetch and extract, returning the content fingerprint with the text
    async fn load(&self, locator: &Locator) -> Result<(String, ExtractedText)> {
        let document = self.fetcher.fetch(locator).await?;
        tracing::debug!(
            "Fetched {} bytes (fingerprint {})",
            document.len(),
            document.fingerprint
        );

        let fingerprint = document.fingerprint.clone();
        let extracted = PdfExtractor::extract_blocking(locator.to_string(), document.bytes).await?;
        tracing::info!(
            "Extracted {} chars from {} pages",
            extracted.char_count(),
            extracted.page_count()
        );
        Ok((fingerprint, extracted))
    }

    /// Answer questions over already extracted text.
    ///
    /// `source` labels the result; `fingerprint` scopes indexed chunks.
    /// Text without content yields a `no_content` result and no answerer runs.
    pub async fn answer_extracted(
        &self,
        source: &str,
        fingerprint: &str,
        extracted: &ExtractedText,
        questions: &[String],
        strategy: AnswerStrategy,
    ) -> Result<AnalysisResult> {
        let start = Instant::now();

        if extracted.is_empty() {
            tracing::warn!("No text content extracted from {}", source);
            return Ok(AnalysisResult::no_content(
                source,
                strategy,
                questions.len(),
                start.elapsed().as_millis() as u64,
            ));
        }

        if strategy.needs_index() {
            let chunks = self.chunker.chunk_document(fingerprint, extracted);
            tracing::info!("Created {} chunks", chunks.len());
            ChunkIndexer::new(
                self.services.embedder.clone(),
                self.services.index.clone(),
                self.config.vector_index.batch_size,
            )
            .index_chunks(fingerprint, &chunks)
            .await?;
        }

        let answerer = build_answerer(strategy, &self.services, &self.config, self.throttle.clone());
        let text = extracted.full_text();
        let context = AnswerContext {
            document: fingerprint,
            text: &text,
        };

        let delay = self.question_delay(strategy);
        let mut results = Vec::with_capacity(questions.len());
        for (i, question) in questions.iter().enumerate() {
            if i > 0 && !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            tracing::info!("Question {}/{}: {}", i + 1, questions.len(), question);
            let answer = answerer.answer(&context, question).await;
            tracing::debug!("Outcome for question {}: {:?}", i + 1, answer.outcome);
            results.push(answer);
        }

        let result = AnalysisResult::completed(
            source,
            strategy,
            results,
            start.elapsed().as_millis() as u64,
        );
        tracing::info!("{}", result.summary());
        Ok(result)
    }

    /// Pause between questions; only hosted model calls are paced
    fn question_delay(&self, strategy: AnswerStrategy) -> Duration {
        if strategy.uses_model() {
            self.model_delay()
        } else {
            Duration::ZERO
        }
    }

    fn model_delay(&self) -> Duration {
        if self.services.llm_mock {
            Duration::ZERO
        } else {
            Duration::from_millis(self.config.pipeline.question_delay_ms)
        }
    }
}
