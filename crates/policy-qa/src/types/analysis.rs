//! Answer and analysis result types

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::Error;

/// How questions are answered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerStrategy {
    /// Regex pattern matching over the raw text
    #[serde(alias = "rule-based", alias = "text")]
    RuleBased,
    /// Leading document text plus keyword windows sent to the model
    #[serde(alias = "direct-context", alias = "direct")]
    DirectContext,
    /// Vector search over indexed chunks, then generation
    #[serde(alias = "rag")]
    Retrieval,
    /// Rule-based first, retrieval generation when rules find nothing
    Hybrid,
    /// Direct, keyword and per-section model passes, then a synthesis call
    #[serde(alias = "multi_pass", alias = "multi-pass")]
    Comprehensive,
}

impl AnswerStrategy {
    /// All strategies, in display order
    pub const ALL: [AnswerStrategy; 5] = [
        Self::RuleBased,
        Self::DirectContext,
        Self::Retrieval,
        Self::Hybrid,
        Self::Comprehensive,
    ];

    /// Whether the document must be chunked and indexed first
    pub fn needs_index(&self) -> bool {
        matches!(self, Self::Retrieval | Self::Hybrid)
    }

    /// Whether answering may call the hosted model
    pub fn uses_model(&self) -> bool {
        !matches!(self, Self::RuleBased)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RuleBased => "rule_based",
            Self::DirectContext => "direct_context",
            Self::Retrieval => "retrieval",
            Self::Hybrid => "hybrid",
            Self::Comprehensive => "comprehensive",
        }
    }
}

impl fmt::Display for AnswerStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AnswerStrategy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "rule_based" | "rules" | "text" => Ok(Self::RuleBased),
            "direct_context" | "direct" => Ok(Self::DirectContext),
            "retrieval" | "rag" => Ok(Self::Retrieval),
            "hybrid" => Ok(Self::Hybrid),
            "comprehensive" | "multi_pass" => Ok(Self::Comprehensive),
            other => Err(Error::InvalidRequest(format!(
                "Unknown strategy '{}'. Expected one of: rule_based, direct_context, retrieval, hybrid, comprehensive",
                other
            ))),
        }
    }
}

/// Answer for "no category matched the question"
pub const NOT_RECOGNIZED: &str = "Question pattern not recognized for text-based analysis";
/// Answer for "category matched but the text has no evidence"
pub const NOT_FOUND: &str = "Information not found in the document";
/// Answer for "vector search returned nothing"
pub const NO_RELEVANT_INFORMATION: &str = "No relevant information found in the document.";

/// Classification of one answer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerOutcome {
    /// The answer carries evidence from the document
    Found,
    /// The question was understood but nothing was found
    NotFound,
    /// No rule category matched the question
    Unrecognized,
    /// Answering failed; the text carries the error
    Failed,
}

impl AnswerOutcome {
    /// Classify answer text
    pub fn classify(answer: &str) -> Self {
        let lower = answer.to_lowercase();
        if lower.contains("not recognized") {
            Self::Unrecognized
        } else if lower.contains("not found") || lower.contains("no relevant information") {
            Self::NotFound
        } else {
            Self::Found
        }
    }
}

/// Answer to one question
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    pub question: String,
    pub answer: String,
    pub outcome: AnswerOutcome,
    /// Self-reported confidence from structured generation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<String>,
    /// Number of retrieved chunks used as context
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relevant_chunks: Option<usize>,
}

impl Answer {
    /// Answer whose outcome is derived from its text
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        let answer = answer.into();
        Self {
            question: question.into(),
            outcome: AnswerOutcome::classify(&answer),
            answer,
            confidence: None,
            relevant_chunks: None,
        }
    }

    /// Answer recording a failure
    pub fn failed(question: impl Into<String>, error: &Error) -> Self {
        Self {
            question: question.into(),
            answer: format!("Error generating answer: {}", error),
            outcome: AnswerOutcome::Failed,
            confidence: None,
            relevant_chunks: None,
        }
    }

    pub fn with_confidence(mut self, confidence: Option<String>) -> Self {
        self.confidence = confidence;
        self
    }

    pub fn with_relevant_chunks(mut self, count: usize) -> Self {
        self.relevant_chunks = Some(count);
        self
    }

    pub fn is_found(&self) -> bool {
        self.outcome == AnswerOutcome::Found
    }
}

/// Overall status of an analysis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisStatus {
    /// Every question has an answer
    Completed,
    /// The document had no extractable text; nothing was answered
    NoContent,
}

/// Result of analyzing one document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub id: Uuid,
    /// Document locator
    pub document: String,
    pub strategy: AnswerStrategy,
    pub status: AnalysisStatus,
    pub results: Vec<Answer>,
    pub found_count: usize,
    pub total_questions: usize,
    /// Percentage of found answers; absent when there were no questions
    pub accuracy: Option<f64>,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub elapsed_ms: u64,
}

impl AnalysisResult {
    /// Aggregate answers into a completed result
    pub fn completed(
        document: impl Into<String>,
        strategy: AnswerStrategy,
        results: Vec<Answer>,
        elapsed_ms: u64,
    ) -> Self {
        let found_count = results.iter().filter(|a| a.is_found()).count();
        let total_questions = results.len();
        Self {
            id: Uuid::new_v4(),
            document: document.into(),
            strategy,
            status: AnalysisStatus::Completed,
            results,
            found_count,
            total_questions,
            accuracy: accuracy(found_count, total_questions),
            timestamp: chrono::Utc::now(),
            elapsed_ms,
        }
    }

    /// Result for a document without extractable text
    pub fn no_content(
        document: impl Into<String>,
        strategy: AnswerStrategy,
        total_questions: usize,
        elapsed_ms: u64,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            document: document.into(),
            strategy,
            status: AnalysisStatus::NoContent,
            results: Vec::new(),
            found_count: 0,
            total_questions,
            accuracy: None,
            timestamp: chrono::Utc::now(),
            elapsed_ms,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == AnalysisStatus::Completed
    }

    /// One-line human summary
    pub fn summary(&self) -> String {
        match (self.status, self.accuracy) {
            (AnalysisStatus::NoContent, _) => {
                "No text content could be extracted from the document".to_string()
            }
            (AnalysisStatus::Completed, Some(accuracy)) => format!(
                "Found answers for {}/{} questions ({:.1}% accuracy)",
                self.found_count, self.total_questions, accuracy
            ),
            (AnalysisStatus::Completed, None) => "No questions were asked".to_string(),
        }
    }
}

/// Percentage of found answers, `None` when `total` is zero
pub fn accuracy(found: usize, total: usize) -> Option<f64> {
    if total == 0 {
        None
    } else {
        Some(found as f64 / total as f64 * 100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strategy_parsing() {
        assert_eq!("rule-based".parse::<AnswerStrategy>().unwrap(), AnswerStrategy::RuleBased);
        assert_eq!("DIRECT_CONTEXT".parse::<AnswerStrategy>().unwrap(), AnswerStrategy::DirectContext);
        assert_eq!("rag".parse::<AnswerStrategy>().unwrap(), AnswerStrategy::Retrieval);
        assert_eq!("hybrid".parse::<AnswerStrategy>().unwrap(), AnswerStrategy::Hybrid);
        assert_eq!("multi-pass".parse::<AnswerStrategy>().unwrap(), AnswerStrategy::Comprehensive);
        assert!(AnswerStrategy::Comprehensive.uses_model());
        assert!(!AnswerStrategy::Comprehensive.needs_index());
        assert!(matches!(
            "magic".parse::<AnswerStrategy>(),
            Err(Error::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_strategy_serde_aliases() {
        let s: AnswerStrategy = serde_json::from_str("\"rule-based\"").unwrap();
        assert_eq!(s, AnswerStrategy::RuleBased);
        assert_eq!(
            serde_json::to_string(&AnswerStrategy::DirectContext).unwrap(),
            "\"direct_context\""
        );
    }

    #[test]
    fn test_outcome_classification() {
        assert_eq!(AnswerOutcome::classify("Grace period: 30 days"), AnswerOutcome::Found);
        assert_eq!(AnswerOutcome::classify(NOT_FOUND), AnswerOutcome::NotFound);
        assert_eq!(AnswerOutcome::classify(NOT_RECOGNIZED), AnswerOutcome::Unrecognized);
        assert_eq!(
            AnswerOutcome::classify(NO_RELEVANT_INFORMATION),
            AnswerOutcome::NotFound
        );
        assert_eq!(
            AnswerOutcome::classify("Information not found in the provided document excerpts"),
            AnswerOutcome::NotFound
        );
    }

    #[test]
    fn test_accuracy() {
        assert_eq!(accuracy(0, 0), None);
        assert_eq!(accuracy(3, 4), Some(75.0));
        assert_eq!(accuracy(0, 2), Some(0.0));
    }

    #[test]
    fn test_completed_counts_only_found() {
        let results = vec![
            Answer::new("q1", "Grace period: 30 days"),
            Answer::new("q2", NOT_FOUND),
            Answer::new("q3", NOT_RECOGNIZED),
            Answer::failed("q4", &Error::llm("boom")),
        ];
        let result = AnalysisResult::completed("doc.pdf", AnswerStrategy::Hybrid, results, 5);

        assert_eq!(result.found_count, 1);
        assert_eq!(result.total_questions, 4);
        assert_eq!(result.accuracy, Some(25.0));
        assert!(result.is_completed());
        assert_eq!(result.results[3].outcome, AnswerOutcome::Failed);
    }

    #[test]
    fn test_no_content_result() {
        let result = AnalysisResult::no_content("doc.pdf", AnswerStrategy::RuleBased, 3, 1);
        assert_eq!(result.status, AnalysisStatus::NoContent);
        assert!(result.results.is_empty());
        assert_eq!(result.accuracy, None);
        assert_eq!(result.total_questions, 3);
    }
}
