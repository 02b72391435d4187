//! Core types for the policy QA pipeline

pub mod analysis;
pub mod document;
pub mod overview;
pub mod request;

pub use analysis::{AnalysisResult, AnalysisStatus, Answer, AnswerOutcome, AnswerStrategy};
pub use document::{Chunk, Document, ExtractedText, Locator, PageText};
pub use overview::{DocumentOverview, OverviewMode};
pub use request::{
    AnalyzeRequest, AnalyzeResponse, TestResponse, SAMPLE_DOCUMENT_URL, SAMPLE_QUESTIONS,
};
