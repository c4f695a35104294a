use serde::Serialize;

use crate::scanner::AnalysisResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Info,
    Error,
}

/// Short user-facing message emitted around scans.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub title: String,
    pub description: String,
}

impl Notice {
    fn info(title: &str, description: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            title: title.to_string(),
            description: description.into(),
        }
    }

    pub fn analysis_complete(result: &AnalysisResult) -> Self {
        Self::info(
            "Analysis complete",
            format!(
                "Found {} potential bias indicators.",
                result.flagged_phrases.len()
            ),
        )
    }

    pub fn empty_input() -> Self {
        Self {
            level: NoticeLevel::Error,
            title: "No text to analyze".to_string(),
            description: "Please enter some text first.".to_string(),
        }
    }

    pub fn history_cleared() -> Self {
        Self::info("History cleared", "All analysis history has been removed.")
    }
}

impl std::fmt::Display for Notice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.title, self.description)
    }
}
