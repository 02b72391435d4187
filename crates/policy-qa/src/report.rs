//! Analysis reports written to disk

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::types::{AnalysisResult, DocumentOverview};

/// Paths of the files written for one analysis
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportPaths {
    pub json: PathBuf,
    pub text: PathBuf,
}

/// Render the human-readable listing
pub fn render_text(result: &AnalysisResult) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# Policy Analysis");
    let _ = writeln!(out, "Document: {}", result.document);
    let _ = writeln!(out, "Strategy: {}", result.strategy);
    let _ = writeln!(
        out,
        "Timestamp: {}",
        result.timestamp.format("%Y-%m-%d %H:%M:%S")
    );

    for (i, answer) in result.results.iter().enumerate() {
        let _ = writeln!(out);
        let _ = writeln!(out, "## Question {}: {}", i + 1, answer.question);
        let _ = writeln!(out, "**Answer:** {}", answer.answer);
        if let Some(confidence) = &answer.confidence {
            let _ = writeln!(out, "**Confidence:** {}", confidence);
        }
        let _ = writeln!(out, "{}", "-".repeat(50));
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "## Accuracy Summary");
    let _ = writeln!(
        out,
        "Questions with information found: {}/{}",
        result.found_count, result.total_questions
    );
    match result.accuracy {
        Some(accuracy) => {
            let _ = writeln!(out, "Accuracy: {:.1}%", accuracy);
        }
        None => {
            let _ = writeln!(out, "{}", result.summary());
        }
    }
    out
}

/// Base file name, `analysis_<strategy>_<YYYYmmdd_HHMMSS>_<id prefix>`
pub fn report_stem(result: &AnalysisResult) -> String {
    let id = result.id.simple().to_string();
    format!(
        "analysis_{}_{}_{}",
        result.strategy,
        result.timestamp.format("%Y%m%d_%H%M%S"),
        &id[..8]
    )
}

/// Write the JSON and text reports into `dir`, creating it when missing
pub fn write_reports(result: &AnalysisResult, dir: &Path) -> Result<ReportPaths> {
    std::fs::create_dir_all(dir)?;

    let stem = report_stem(result);
    let paths = ReportPaths {
        json: dir.join(format!("{}.json", stem)),
        text: dir.join(format!("{}.txt", stem)),
    };

    let json = serde_json::to_string_pretty(result)?;
    std::fs::write(&paths.json, json)?;
    std::fs::write(&paths.text, render_text(result))?;

    tracing::info!("Saved analysis to {}", paths.json.display());
    Ok(paths)
}

/// Write a document overview as `analysis_<document>_<YYYYmmdd_HHMMSS>_<id prefix>.json`
pub fn write_overview(overview: &DocumentOverview, dir: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)?;

    let id = overview.id.simple().to_string();
    let path = dir.join(format!(
        "analysis_{}_{}_{}.json",
        overview.document_name(),
        overview.timestamp.format("%Y%m%d_%H%M%S"),
        &id[..8]
    ));
    std::fs::write(&path, serde_json::to_string_pretty(overview)?)?;

    tracing::info!("Saved {} analysis to {}", overview.mode, path.display());
    Ok(path)
}
