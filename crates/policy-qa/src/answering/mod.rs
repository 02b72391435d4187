//! Answering strategies
//!
//! Every strategy implements [`Answerer`]; [`build_answerer`] wires one from
//! the configured services. Answerers never fail a batch: problems with a
//! single question come back as an [`Answer`] with a `failed` outcome.

pub mod generative;
pub mod prompt;
pub mod rules;
pub mod sections;
pub mod structured;
pub mod throttle;

pub use generative::{ComprehensiveAnswerer, DirectContextAnswerer, Generator, RetrievalAnswerer};
pub use prompt::{PromptBuilder, SYSTEM_INSTRUCTION};
pub use rules::RuleCategory;
pub use throttle::RequestThrottle;

use async_trait::async_trait;
use std::sync::Arc;

use crate::config::AppConfig;
use crate::providers::Services;
use crate::retrieval::ChunkIndexer;
use crate::types::{Answer, AnswerStrategy};

/// What an answerer knows about the document
#[derive(Debug, Clone, Copy)]
pub struct AnswerContext<'a> {
    /// Document fingerprint; scopes vector searches
    pub document: &'a str,
    /// Full extracted text
    pub text: &'a str,
}

/// Answers one question about one document
#[async_trait]
pub trait Answerer: Send + Sync {
    fn strategy(&self) -> AnswerStrategy;

    async fn answer(&self, context: &AnswerContext<'_>, question: &str) -> Answer;
}

/// Regex battery over the extracted text; no remote calls
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleBasedAnswerer;

#[async_trait]
impl Answerer for RuleBasedAnswerer {
    fn strategy(&self) -> AnswerStrategy {
        AnswerStrategy::RuleBased
    }

    async fn answer(&self, context: &AnswerContext<'_>, question: &str) -> Answer {
        Answer::new(question, rules::answer(context.text, question))
    }
}

/// Rules first; retrieval generation when the rules find nothing
pub struct HybridAnswerer {
    rules: RuleBasedAnswerer,
    retrieval: RetrievalAnswerer,
}

impl HybridAnswerer {
    pub fn new(retrieval: RetrievalAnswerer) -> Self {
        Self {
            rules: RuleBasedAnswerer,
            retrieval,
        }
    }
}

#[async_trait]
impl Answerer for HybridAnswerer {
    fn strategy(&self) -> AnswerStrategy {
        AnswerStrategy::Hybrid
    }

    async fn answer(&self, context: &AnswerContext<'_>, question: &str) -> Answer {
        let answer = self.rules.answer(context, question).await;
        if answer.is_found() {
            return answer;
        }
        tracing::debug!("Rules found nothing for '{}', falling back to retrieval", question);
        self.retrieval.answer(context, question).await
    }
}

/// Answerer for `strategy` over the given services
pub fn build_answerer(
    strategy: AnswerStrategy,
    services: &Services,
    config: &AppConfig,
    throttle: Arc<RequestThrottle>,
) -> Arc<dyn Answerer> {
    let generator = || Generator::new(services.llm.clone(), &config.llm, throttle.clone());
    let retrieval = || {
        RetrievalAnswerer::new(
            generator(),
            ChunkIndexer::new(
                services.embedder.clone(),
                services.index.clone(),
                config.vector_index.batch_size,
            ),
            config.vector_index.top_k,
        )
    };

    match strategy {
        AnswerStrategy::RuleBased => Arc::new(RuleBasedAnswerer),
        AnswerStrategy::DirectContext => Arc::new(DirectContextAnswerer::new(generator())),
        AnswerStrategy::Retrieval => Arc::new(retrieval()),
        AnswerStrategy::Hybrid => Arc::new(HybridAnswerer::new(retrieval())),
        AnswerStrategy::Comprehensive => Arc::new(ComprehensiveAnswerer::new(generator())),
    }
}
