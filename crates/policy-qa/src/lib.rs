//! policy-qa: question answering over insurance policy PDFs
//!
//! A document is fetched from a URL or path, its text extracted page by page,
//! and each question answered by one of five strategies: regex rules over the
//! text, a single model call with the leading text as context, retrieval over
//! indexed chunks, rules with a retrieval fallback, or several model passes
//! combined by a synthesis call. Documents can also be analyzed without
//! questions (overview, summary, key points). Hosted providers (Gemini,
//! Pinecone) are optional; without credentials the in-process stand-ins are
//! used.

pub mod answering;
pub mod config;
pub mod error;
pub mod ingestion;
pub mod pipeline;
pub mod providers;
pub mod report;
pub mod retrieval;
pub mod server;
#[doc(hidden)]
pub mod testing;
pub mod types;

pub use config::AppConfig;
pub use error::{Error, Result};
pub use pipeline::Pipeline;
pub use providers::Services;
pub use types::{
    AnalysisResult, AnalysisStatus, Answer, AnswerOutcome, AnswerStrategy, ExtractedText,
    Locator,
};
