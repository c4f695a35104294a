use std::{fs, path::PathBuf};

use anyhow::{Context, Result};
use once_cell::sync::OnceCell;

use super::{Pattern, PatternRepository, Severity};

/// Loads a pattern table from a JSON (or `.json5`) file.
pub struct FilePatternRepository {
    path: PathBuf,
    cache: OnceCell<Vec<Pattern>>,
}

impl FilePatternRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cache: OnceCell::new(),
        }
    }

    fn is_json5(&self) -> bool {
        self.path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("json5"))
            .unwrap_or(false)
    }

    fn read_patterns(&self) -> Result<Vec<Pattern>> {
        let raw = fs::read_to_string(&self.path).with_context(|| {
            format!("failed to read pattern file at {}", self.path.display())
        })?;
        let items: Vec<JsonPattern> = if self.is_json5() {
            json5::from_str(&raw).with_context(|| {
                format!("invalid JSON5 structure in pattern file at {}", self.path.display())
            })?
        } else {
            serde_json::from_str(&raw).with_context(|| {
                format!("invalid JSON structure in pattern file at {}", self.path.display())
            })?
        };
        let mut patterns = Vec::with_capacity(items.len());
        for (idx, item) in items.into_iter().enumerate() {
            let pattern = Pattern::new(item.keywords, item.severity, item.explanation)
                .with_context(|| {
                    format!("invalid pattern #{idx} in {}", self.path.display())
                })?;
            patterns.push(pattern);
        }
        Ok(patterns)
    }
}

impl PatternRepository for FilePatternRepository {
    fn load_patterns(&self) -> Result<Vec<Pattern>> {
        let patterns = self.cache.get_or_try_init(|| self.read_patterns())?;
        Ok(patterns.clone())
    }
}

#[derive(serde::Deserialize)]
struct JsonPattern {
    keywords: Vec<String>,
    severity: Severity,
    explanation: String,
}
