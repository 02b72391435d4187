//! Analysis endpoints

use axum::{extract::State, Json};

use crate::error::Result;
use crate::server::state::AppState;
use crate::types::{AnalyzeRequest, AnalyzeResponse, TestResponse, SAMPLE_QUESTIONS};

/// Questions answered by `POST /test`
const SAMPLE_QUESTION_COUNT: usize = 3;

/// POST /analyze - answer questions about one document
pub async fn analyze_policy(
    State(state): State<AppState>,
    Json(request): Json<AnalyzeRequest>,
) -> Result<Json<AnalyzeResponse>> {
    request.validate()?;
    let locator = request.remote_locator()?;

    let strategy = request
        .strategy
        .unwrap_or_else(|| state.pipeline().default_strategy());
    tracing::info!(
        "Received analysis request for {} questions",
        request.questions.len()
    );

    let result = state
        .pipeline()
        .analyze(&locator, &request.questions, strategy)
        .await?;

    if state.config().output.save_reports {
        if let Err(e) = crate::report::write_reports(&result, &state.config().output.output_dir) {
            tracing::warn!("Failed to save analysis report: {}", e);
        }
    }

    Ok(Json(AnalyzeResponse::from(result)))
}

/// POST /test - analyze the sample document with the first sample questions
pub async fn run_sample(State(state): State<AppState>) -> Json<TestResponse> {
    let questions: Vec<String> = SAMPLE_QUESTIONS[..SAMPLE_QUESTION_COUNT]
        .iter()
        .map(|q| q.to_string())
        .collect();
    let strategy = state.pipeline().default_strategy();

    let response = match state
        .pipeline()
        .analyze(state.sample_document(), &questions, strategy)
        .await
    {
        Ok(result) if result.is_completed() => {
            let accuracy = result.accuracy.unwrap_or(0.0);
            TestResponse {
                success: true,
                test_results: result.results,
                accuracy: Some(accuracy),
                message: format!("Test completed successfully with {:.1}% accuracy", accuracy),
            }
        }
        Ok(result) => TestResponse {
            success: false,
            test_results: Vec::new(),
            accuracy: None,
            message: format!("Test analysis failed: {}", result.summary()),
        },
        Err(e) => {
            tracing::error!("Sample analysis failed: {}", e);
            TestResponse {
                success: false,
                test_results: Vec::new(),
                accuracy: None,
                message: format!("Test failed: {}", e),
            }
        }
    };

    Json(response)
}
