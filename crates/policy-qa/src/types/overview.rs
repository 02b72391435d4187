//! Question-less document analysis

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::Error;

/// Kind of whole-document analysis
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverviewMode {
    /// Overview, findings, sections, recommendations and summary
    #[default]
    Comprehensive,
    /// Executive summary and takeaways
    Summary,
    /// Key points, details and action items
    #[serde(alias = "key-points")]
    KeyPoints,
}

impl OverviewMode {
    /// Leading characters of the document sent to the model
    pub fn context_chars(&self) -> usize {
        match self {
            Self::Comprehensive => 8000,
            Self::Summary | Self::KeyPoints => 6000,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Comprehensive => "comprehensive",
            Self::Summary => "summary",
            Self::KeyPoints => "key_points",
        }
    }
}

impl fmt::Display for OverviewMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OverviewMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "comprehensive" => Ok(Self::Comprehensive),
            "summary" => Ok(Self::Summary),
            "key_points" => Ok(Self::KeyPoints),
            other => Err(Error::InvalidRequest(format!(
                "Unknown analysis mode '{}'. Expected one of: comprehensive, summary, key_points",
                other
            ))),
        }
    }
}

/// Model-written analysis of one whole document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentOverview {
    pub id: Uuid,
    /// Document locator
    pub document: String,
    pub mode: OverviewMode,
    pub analysis: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub elapsed_ms: u64,
}

impl DocumentOverview {
    pub fn new(
        document: impl Into<String>,
        mode: OverviewMode,
        analysis: impl Into<String>,
        elapsed_ms: u64,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            document: document.into(),
            mode,
            analysis: analysis.into(),
            timestamp: chrono::Utc::now(),
            elapsed_ms,
        }
    }

    /// File or URL path name of the document without its extension
    pub fn document_name(&self) -> String {
        let without_query = self.document.split(['?', '#']).next().unwrap_or_default();
        let name = without_query
            .trim_end_matches('/')
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or_default();
        let stem = name
            .strip_suffix(".pdf")
            .or_else(|| name.strip_suffix(".txt"))
            .unwrap_or(name);

        if stem.is_empty() {
            "document".to_string()
        } else {
            stem.to_string()
        }
    }
}
