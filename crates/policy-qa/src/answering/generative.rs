//! Model-backed answerers

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use crate::config::LlmConfig;
use crate::error::{Error, Result};
use crate::providers::{GenerationRequest, LlmProvider};
use crate::retrieval::ChunkIndexer;
use crate::types::analysis::NO_RELEVANT_INFORMATION;
use crate::types::{Answer, AnswerStrategy, OverviewMode};

use super::prompt::{PassFindings, PromptBuilder, NO_SECTION_INFORMATION, SYSTEM_INSTRUCTION};
use super::sections::{split_into_sections, MAX_SECTIONS};
use super::structured;
use super::throttle::RequestThrottle;
use super::{AnswerContext, Answerer};

/// Sends prompts to the model with throttling and one retry on quota refusal
#[derive(Clone)]
pub struct Generator {
    llm: Arc<dyn LlmProvider>,
    config: LlmConfig,
    prompts: PromptBuilder,
    throttle: Arc<RequestThrottle>,
}

impl Generator {
    pub fn new(llm: Arc<dyn LlmProvider>, config: &LlmConfig, throttle: Arc<RequestThrottle>) -> Self {
        Self {
            llm,
            prompts: PromptBuilder::new(config.max_context_chars, config.structured_output),
            config: config.clone(),
            throttle,
        }
    }

    pub fn prompts(&self) -> &PromptBuilder {
        &self.prompts
    }

    /// Generate text for a prompt, waiting out one quota refusal
    pub async fn generate(&self, prompt: String) -> Result<String> {
        let request = GenerationRequest::new(prompt, &self.config).with_system(SYSTEM_INSTRUCTION);

        self.throttle.acquire().await;
        match self.llm.generate(&request).await {
            Err(Error::QuotaExceeded(message)) => {
                tracing::warn!(
                    "Quota exceeded ({}), retrying once in {}s",
                    message,
                    self.config.quota_cooldown_secs
                );
                tokio::time::sleep(Duration::from_secs(self.config.quota_cooldown_secs)).await;
                self.llm.generate(&request).await
            }
            other => other,
        }
    }

    /// Whole-document analysis without a question
    pub async fn overview(&self, mode: OverviewMode, text: &str) -> Result<String> {
        let reply = self.generate(self.prompts.overview(mode, text)).await?;
        let reply = reply.trim();
        if reply.is_empty() {
            return Err(Error::llm("No response generated for the document"));
        }
        Ok(reply.to_string())
    }

    /// Turn a model reply into an answer, decoding JSON in structured mode
    fn to_answer(&self, question: &str, reply: &str) -> Answer {
        if self.prompts.is_structured() {
            let (text, confidence) = structured::interpret(reply);
            Answer::new(question, text).with_confidence(confidence)
        } else {
            Answer::new(question, reply.trim())
        }
    }

    async fn answer_prompt(&self, question: &str, prompt: String) -> Answer {
        match self.generate(prompt).await {
            Ok(reply) => self.to_answer(question, &reply),
            Err(e) => {
                tracing::error!("Generation failed for '{}': {}", question, e);
                Answer::failed(question, &e)
            }
        }
    }
}

/// Answers from the leading document text plus keyword windows
pub struct DirectContextAnswerer {
    generator: Generator,
}

impl DirectContextAnswerer {
    pub fn new(generator: Generator) -> Self {
        Self { generator }
    }
}

#[async_trait]
impl Answerer for DirectContextAnswerer {
    fn strategy(&self) -> AnswerStrategy {
        AnswerStrategy::DirectContext
    }

    async fn answer(&self, context: &AnswerContext<'_>, question: &str) -> Answer {
        let prompt = self.generator.prompts().direct_context(question, context.text);
        self.generator.answer_prompt(question, prompt).await
    }
}

/// Answers from the top-k chunks retrieved for each question
pub struct RetrievalAnswerer {
    generator: Generator,
    indexer: ChunkIndexer,
    top_k: usize,
}

impl RetrievalAnswerer {
    pub fn new(generator: Generator, indexer: ChunkIndexer, top_k: usize) -> Self {
        Self {
            generator,
            indexer,
            top_k: top_k.max(1),
        }
    }
}

#[async_trait]
impl Answerer for RetrievalAnswerer {
    fn strategy(&self) -> AnswerStrategy {
        AnswerStrategy::Retrieval
    }

    async fn answer(&self, context: &AnswerContext<'_>, question: &str) -> Answer {
        let matches = match self
            .indexer
            .search(context.document, question, self.top_k)
            .await
        {
            Ok(matches) => matches,
            Err(e) => {
                tracing::error!("Vector search failed for '{}': {}", question, e);
                return Answer::failed(question, &e);
            }
        };

        if matches.is_empty() {
            return Answer::new(question, NO_RELEVANT_INFORMATION).with_relevant_chunks(0);
        }

        tracing::debug!("Retrieved {} chunks for '{}'", matches.len(), question);
        let prompt = self.generator.prompts().retrieval(question, &matches);
        self.generator
            .answer_prompt(question, prompt)
            .await
            .with_relevant_chunks(matches.len())
    }
}

/// Several model passes over the document, combined by a synthesis call
///
/// The direct, keyword and section passes tolerate failures; only a failed
/// synthesis fails the answer.
pub struct ComprehensiveAnswerer {
    generator: Generator,
}

impl ComprehensiveAnswerer {
    pub fn new(generator: Generator) -> Self {
        Self { generator }
    }

    async fn pass(&self, question: &str, label: &str, prompt: String) -> Option<String> {
        match self.generator.generate(prompt).await {
            Ok(reply) => Some(reply.trim().to_string()),
            Err(e) => {
                tracing::warn!("{} pass failed for '{}': {}", label, question, e);
                None
            }
        }
    }

    async fn gather(&self, question: &str, text: &str) -> PassFindings {
        let prompts = self.generator.prompts();

        let direct = self
            .pass(question, "Direct", prompts.direct_pass(question, text))
            .await
            .unwrap_or_else(|| "Direct analysis unavailable".to_string());

        let keywords = match prompts.keyword_pass(question, text) {
            Some(prompt) => self
                .pass(question, "Keyword", prompt)
                .await
                .unwrap_or_else(|| "Keyword analysis unavailable".to_string()),
            None => "No keyword matches found".to_string(),
        };

        let mut sections = Vec::new();
        for (i, section) in split_into_sections(text).iter().take(MAX_SECTIONS).enumerate() {
            let number = i + 1;
            let prompt = prompts.section_pass(question, number, section);
            if let Some(reply) = self.pass(question, "Section", prompt).await {
                if !reply.contains(NO_SECTION_INFORMATION) && !reply.is_empty() {
                    sections.push(format!("Section {}: {}", number, reply));
                }
            }
        }
        tracing::debug!(
            "{} of the sections had information for '{}'",
            sections.len(),
            question
        );

        PassFindings {
            direct,
            keywords,
            sections,
        }
    }
}

#[async_trait]
impl Answerer for ComprehensiveAnswerer {
    fn strategy(&self) -> AnswerStrategy {
        AnswerStrategy::Comprehensive
    }

    async fn answer(&self, context: &AnswerContext<'_>, question: &str) -> Answer {
        let findings = self.gather(question, context.text).await;
        let prompt = self.generator.prompts().synthesis(question, &findings);
        self.generator.answer_prompt(question, prompt).await
    }
}
