use std::fmt;

use anyhow::Result as AnyResult;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod bias_scanner;
pub mod file_repository;
pub mod patterns;

/// Byte span within the scanned text `(start, end)` where `start <= end`.
pub type Span = (usize, usize);

/// Severity tier attached to every pattern and copied onto its matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    /// Ordinal weight used when aggregating the bias score.
    pub fn weight(self) -> u64 {
        match self {
            Self::Low => 1,
            Self::Medium => 2,
            Self::High => 3,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        })
    }
}

/// Qualitative bucket for a 0–10 bias score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BiasBand {
    Low,
    Moderate,
    High,
}

impl BiasBand {
    pub const MODERATE_MIN: u8 = 3;
    pub const HIGH_MIN: u8 = 6;

    pub fn from_score(score: u8) -> Self {
        if score >= Self::HIGH_MIN {
            Self::High
        } else if score >= Self::MODERATE_MIN {
            Self::Moderate
        } else {
            Self::Low
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Low => "Low Bias",
            Self::Moderate => "Moderate Bias",
            Self::High => "High Bias",
        }
    }
}

/// A keyword group sharing a severity tier and explanation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pattern {
    /// Lower-case literals, searched in declared order.
    pub keywords: Vec<String>,
    pub severity: Severity,
    /// Human-readable reason shown next to each match.
    pub explanation: String,
}

impl Pattern {
    /// Construct a new pattern, validating invariants before returning.
    pub fn new<I, S>(
        keywords: I,
        severity: Severity,
        explanation: impl Into<String>,
    ) -> Result<Self, PatternValidationError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let pattern = Self {
            keywords: keywords.into_iter().map(Into::into).collect(),
            severity,
            explanation: explanation.into(),
        };
        pattern.validate()?;
        Ok(pattern)
    }

    /// Validate invariants for existing pattern definitions.
    pub fn validate(&self) -> Result<(), PatternValidationError> {
        if self.keywords.is_empty() {
            return Err(PatternValidationError::NoKeywords);
        }
        for keyword in &self.keywords {
            if keyword.trim().is_empty() {
                return Err(PatternValidationError::BlankKeyword);
            }
            // Matching runs against lower-cased text.
            if keyword.to_lowercase() != *keyword {
                return Err(PatternValidationError::NotLowercase {
                    keyword: keyword.clone(),
                });
            }
        }
        if self.explanation.trim().is_empty() {
            return Err(PatternValidationError::BlankExplanation {
                keyword: self.keywords[0].clone(),
            });
        }
        Ok(())
    }
}

/// Errors emitted while validating pattern definitions.
#[derive(Debug, Error, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PatternValidationError {
    #[error("pattern must declare at least one keyword")]
    NoKeywords,
    #[error("pattern keywords must not be blank")]
    BlankKeyword,
    #[error("keyword `{keyword}` must be lower case")]
    NotLowercase { keyword: String },
    #[error("pattern starting with `{keyword}` needs an explanation")]
    BlankExplanation { keyword: String },
}

/// A single located keyword occurrence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlaggedPhrase {
    /// Matched text in its original casing.
    pub text: String,
    /// Half-open character offsets into the scanned text.
    pub start: usize,
    pub end: usize,
    /// Same range as `start..end`, in bytes. History files written before
    /// byte spans were recorded load with `(0, 0)`.
    #[serde(default)]
    pub span: Span,
    pub severity: Severity,
    pub explanation: String,
}

impl FlaggedPhrase {
    /// Check that the phrase describes a non-empty slice of `input` and
    /// that `text` matches it.
    pub fn validate(&self, input: &str) -> Result<(), PhraseValidationError> {
        let char_len = input.chars().count();
        if self.start >= self.end || self.end > char_len {
            return Err(PhraseValidationError::InvalidOffsets {
                start: self.start,
                end: self.end,
                len: char_len,
            });
        }
        let (byte_start, byte_end) = self.span;
        let slice = input
            .get(byte_start..byte_end)
            .ok_or(PhraseValidationError::InvalidSpan { span: self.span })?;
        let by_chars: String = input
            .chars()
            .skip(self.start)
            .take(self.end - self.start)
            .collect();
        if slice != self.text || by_chars != self.text {
            return Err(PhraseValidationError::TextMismatch {
                text: self.text.clone(),
                found: by_chars,
            });
        }
        Ok(())
    }
}

/// Validation errors for phrases emitted by the scanner.
#[derive(Debug, Error, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PhraseValidationError {
    #[error("phrase offsets {start}..{end} are invalid for text of {len} chars")]
    InvalidOffsets { start: usize, end: usize, len: usize },
    #[error("phrase byte span {span:?} does not fall on char boundaries")]
    InvalidSpan { span: Span },
    #[error("phrase text `{text}` does not match scanned text `{found}`")]
    TextMismatch { text: String, found: String },
}

/// Outcome of one scan. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    /// Integer in `0..=10`.
    pub bias_score: u8,
    pub summary: String,
    /// Ascending by `start`, discovery order on ties.
    #[serde(alias = "biasedPhrases")]
    pub flagged_phrases: Vec<FlaggedPhrase>,
    /// Creation instant in epoch milliseconds.
    pub timestamp: i64,
}

impl AnalysisResult {
    pub fn band(&self) -> BiasBand {
        BiasBand::from_score(self.bias_score)
    }
}

/// Source of the pattern table a scanner is built from.
pub trait PatternRepository {
    /// Retrieve the full, ordered pattern table.
    fn load_patterns(&self) -> AnyResult<Vec<Pattern>>;
}
