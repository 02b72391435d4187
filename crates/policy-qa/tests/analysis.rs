//! End-to-end analysis over a policy PDF served from a local HTTP server

use policy_qa::providers::mock::MOCK_RESPONSE;
use policy_qa::report;
use policy_qa::testing::{build_pdf, serve_pdf};
use policy_qa::types::SAMPLE_QUESTIONS;
use policy_qa::{
    AnalysisStatus, AnswerOutcome, AnswerStrategy, AppConfig, Locator, Pipeline, Services,
};

const POLICY_PAGES: [&str; 3] = [
    "A Grace Period of thirty days is allowed for payment of renewal premium.",
    "Medical expenses for an organ donor are covered for harvesting the organ.",
    "Expenses for cataract surgery are covered after a waiting period of two years.",
];

/// Serve a PDF built from `pages`, returning its URL
async fn serve_policy(pages: &[&str]) -> String {
    serve_pdf(build_pdf(pages).unwrap())
        .await
        .unwrap()
}

fn mock_pipeline() -> Pipeline {
    Pipeline::new(AppConfig::default(), Services::mock(128)).unwrap()
}

fn questions(items: &[&str]) -> Vec<String> {
    items.iter().map(|q| q.to_string()).collect()
}

#[tokio::test]
async fn rule_based_analysis_of_remote_document() {
    let url = serve_policy(&POLICY_PAGES).await;

    let result = mock_pipeline()
        .analyze(
            &Locator::parse(&url),
            &questions(&SAMPLE_QUESTIONS),
            AnswerStrategy::RuleBased,
        )
        .await
        .unwrap();

    assert_eq!(result.status, AnalysisStatus::Completed);
    assert_eq!(result.document, url);
    assert_eq!(result.total_questions, SAMPLE_QUESTIONS.len());
    assert_eq!(result.results[0].answer, "Grace period: 30 days");
    assert_eq!(result.results[0].outcome, AnswerOutcome::Found);
    assert!(result.results[3].is_found(), "cataract: {}", result.results[3].answer);
    assert!(result.results[4].is_found(), "organ donor: {}", result.results[4].answer);
    assert!(result.found_count >= 3);
    assert!(result.results.iter().all(|a| a.outcome != AnswerOutcome::Failed));
}

#[tokio::test]
async fn hybrid_falls_back_to_retrieval_for_unmatched_questions() {
    let url = serve_policy(&POLICY_PAGES).await;
    let pipeline = mock_pipeline();

    let result = pipeline
        .analyze(
            &Locator::parse(&url),
            &questions(&[
                "What is the grace period for premium payment?",
                "Who underwrites this policy?",
            ]),
            AnswerStrategy::Hybrid,
        )
        .await
        .unwrap();

    assert_eq!(result.results[0].answer, "Grace period: 30 days");
    assert!(result.results[0].relevant_chunks.is_none());

    assert_eq!(result.results[1].answer, MOCK_RESPONSE);
    assert_eq!(result.results[1].relevant_chunks, Some(3));
    assert_eq!(
        pipeline.services().index.stats().await.unwrap().total_vectors,
        3
    );
}

#[tokio::test]
async fn blank_document_has_no_content() {
    let url = serve_policy(&[" "]).await;

    let result = mock_pipeline()
        .analyze(
            &Locator::parse(&url),
            &questions(&["What is the grace period?"]),
            AnswerStrategy::DirectContext,
        )
        .await
        .unwrap();

    assert_eq!(result.status, AnalysisStatus::NoContent);
    assert!(result.results.is_empty());
    assert!(result.accuracy.is_none());
}

#[tokio::test]
async fn analysis_reports_are_written() {
    let url = serve_policy(&POLICY_PAGES).await;
    let dir = tempfile::tempdir().unwrap();

    let result = mock_pipeline()
        .analyze(
            &Locator::parse(&url),
            &questions(&["What is the grace period for premium payment?"]),
            AnswerStrategy::RuleBased,
        )
        .await
        .unwrap();
    let paths = report::write_reports(&result, dir.path()).unwrap();

    let text = std::fs::read_to_string(&paths.text).unwrap();
    assert!(text.contains("**Answer:** Grace period: 30 days"));
    assert!(text.contains("Accuracy: 100.0%"));
    assert!(paths.json.exists());
}
