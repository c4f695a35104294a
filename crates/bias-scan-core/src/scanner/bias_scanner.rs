use std::collections::HashMap;

use aho_corasick::{AhoCorasick, MatchKind};
use anyhow::{Context, Result};
use tracing::{debug, instrument, trace};

use super::{
    patterns::default_patterns, AnalysisResult, FlaggedPhrase, Pattern, PatternRepository,
};

const MAX_SCORE: u64 = 10;
const SCORE_SCALE: u64 = 1000;

pub const NEUTRAL_SUMMARY: &str = "This content appears relatively neutral with minimal detected bias indicators. The language used is generally factual and balanced.";

/// Keyword-pattern scanner producing scored, span-annotated results.
///
/// Every occurrence of every keyword is reported, including overlapping
/// occurrences and the same keyword listed under several patterns. Nothing is
/// deduplicated.
pub struct BiasScanner {
    patterns: Vec<Pattern>,
    automaton: Option<AhoCorasick>,
    /// Automaton pattern id -> every `(pattern index, keyword index)` using that keyword.
    owners: Vec<Vec<(usize, usize)>>,
}

impl BiasScanner {
    /// Scanner over the built-in pattern table.
    pub fn new() -> Result<Self> {
        Self::with_patterns(default_patterns().to_vec())
    }

    /// Scanner over a caller-supplied table, validated before use.
    pub fn with_patterns(patterns: Vec<Pattern>) -> Result<Self> {
        for (idx, pattern) in patterns.iter().enumerate() {
            pattern
                .validate()
                .with_context(|| format!("invalid pattern at index {idx}"))?;
        }
        let (automaton, owners) = Self::compile_keyword_automaton(&patterns)?;
        Ok(Self {
            patterns,
            automaton,
            owners,
        })
    }

    pub fn from_repository(repo: &impl PatternRepository) -> Result<Self> {
        let patterns = repo.load_patterns()?;
        Self::with_patterns(patterns)
    }

    pub fn patterns(&self) -> &[Pattern] {
        &self.patterns
    }

    fn compile_keyword_automaton(
        patterns: &[Pattern],
    ) -> Result<(Option<AhoCorasick>, Vec<Vec<(usize, usize)>>)> {
        let mut ids: HashMap<&str, usize> = HashMap::new();
        let mut keywords: Vec<&str> = Vec::new();
        let mut owners: Vec<Vec<(usize, usize)>> = Vec::new();
        for (pattern_idx, pattern) in patterns.iter().enumerate() {
            for (keyword_idx, keyword) in pattern.keywords.iter().enumerate() {
                let id = *ids.entry(keyword.as_str()).or_insert_with(|| {
                    keywords.push(keyword.as_str());
                    owners.push(Vec::new());
                    keywords.len() - 1
                });
                owners[id].push((pattern_idx, keyword_idx));
            }
        }
        if keywords.is_empty() {
            return Ok((None, owners));
        }
        let automaton = AhoCorasick::builder()
            .match_kind(MatchKind::Standard)
            .build(&keywords)
            .context("failed to build keyword automaton from patterns")?;
        Ok((Some(automaton), owners))
    }

    /// Scan `input`, stamping the result with the current time.
    pub fn scan(&self, input: &str) -> AnalysisResult {
        self.scan_at(input, chrono::Utc::now().timestamp_millis())
    }

    /// Scan `input` with an explicit timestamp. Apart from the timestamp the
    /// result depends only on `input` and the pattern table.
    #[instrument(name = "scan_text", skip(self, input), fields(input_len = input.len()))]
    pub fn scan_at(&self, input: &str, timestamp: i64) -> AnalysisResult {
        let lowered = LoweredText::new(input);
        let mut hits: Vec<(usize, usize, usize, FlaggedPhrase)> = Vec::new();

        if let Some(automaton) = &self.automaton {
            trace!(keywords = automaton.patterns_len(), "scanning keywords");
            for mat in automaton.find_overlapping_iter(lowered.text.as_str()) {
                let (start, end) = lowered.original_chars(mat.start(), mat.end());
                let span = (lowered.char_starts[start], lowered.char_starts[end]);
                for &(pattern_idx, keyword_idx) in &self.owners[mat.pattern().as_usize()] {
                    let pattern = &self.patterns[pattern_idx];
                    let phrase = FlaggedPhrase {
                        text: input[span.0..span.1].to_string(),
                        start,
                        end,
                        span,
                        severity: pattern.severity,
                        explanation: pattern.explanation.clone(),
                    };
                    hits.push((start, pattern_idx, keyword_idx, phrase));
                }
            }
        }

        // Discovery order is pattern, keyword, position; a stable sort of that
        // by start equals this key.
        hits.sort_by_key(|(start, pattern_idx, keyword_idx, _)| {
            (*start, *pattern_idx, *keyword_idx)
        });
        let flagged_phrases: Vec<FlaggedPhrase> =
            hits.into_iter().map(|(_, _, _, phrase)| phrase).collect();

        let total_severity: u64 = flagged_phrases
            .iter()
            .map(|phrase| phrase.severity.weight())
            .sum();
        let bias_score = bias_score(total_severity, lowered.char_len());
        let summary = summarize(bias_score, flagged_phrases.len());
        debug!(
            phrases = flagged_phrases.len(),
            total_severity, bias_score, "scan completed"
        );

        AnalysisResult {
            bias_score,
            summary,
            flagged_phrases,
            timestamp,
        }
    }
}

/// `min(10, round(total / len * 1000))` with halves rounded up; `0` for empty text.
pub fn bias_score(total_severity: u64, char_len: usize) -> u8 {
    if char_len == 0 {
        return 0;
    }
    let len = char_len as u64;
    let rounded = (total_severity * SCORE_SCALE * 2 + len) / (len * 2);
    rounded.min(MAX_SCORE) as u8
}

/// Fixed three-tier summary for a score and phrase count.
pub fn summarize(bias_score: u8, phrase_count: usize) -> String {
    let plural = if phrase_count != 1 { "s" } else { "" };
    if bias_score < 3 {
        NEUTRAL_SUMMARY.to_string()
    } else if bias_score < 6 {
        format!(
            "This content contains {phrase_count} potential bias indicator{plural}. Some language may be emotionally charged or lacking proper attribution. Consider verifying claims with additional sources."
        )
    } else {
        format!(
            "This content shows significant bias indicators with {phrase_count} flagged phrase{plural}. The language contains emotional appeals, absolutist statements, or unverified claims. Exercise caution and cross-reference with reliable sources."
        )
    }
}

/// Lower-cased copy of a text that remembers where each byte came from.
struct LoweredText {
    text: String,
    /// Lowered byte -> index of the original char it was produced from.
    origin: Vec<usize>,
    /// Original char index -> byte offset, plus a trailing `input.len()`.
    char_starts: Vec<usize>,
}

impl LoweredText {
    fn new(input: &str) -> Self {
        let mut text = String::with_capacity(input.len());
        let mut origin = Vec::with_capacity(input.len());
        let mut char_starts = Vec::with_capacity(input.len() + 1);
        for (char_idx, (byte_idx, ch)) in input.char_indices().enumerate() {
            char_starts.push(byte_idx);
            for lower in ch.to_lowercase() {
                text.push(lower);
                origin.resize(text.len(), char_idx);
            }
        }
        char_starts.push(input.len());
        Self {
            text,
            origin,
            char_starts,
        }
    }

    fn char_len(&self) -> usize {
        self.char_starts.len() - 1
    }

    /// Map a non-empty lowered byte range to the original chars covering it.
    fn original_chars(&self, start: usize, end: usize) -> (usize, usize) {
        (self.origin[start], self.origin[end - 1] + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::Severity;

    fn scanner() -> BiasScanner {
        BiasScanner::new().expect("built-in patterns compile")
    }

    fn custom(patterns: Vec<Pattern>) -> BiasScanner {
        BiasScanner::with_patterns(patterns).expect("custom patterns compile")
    }

    fn texts(result: &AnalysisResult) -> Vec<&str> {
        result
            .flagged_phrases
            .iter()
            .map(|p| p.text.as_str())
            .collect()
    }

    #[test]
    fn empty_input_is_neutral() {
        let result = scanner().scan("");
        assert_eq!(result.bias_score, 0);
        assert!(result.flagged_phrases.is_empty());
        assert_eq!(result.summary, NEUTRAL_SUMMARY);
    }

    #[test]
    fn flags_absolutist_language() {
        let input = "This is obviously true and everyone knows it";
        let result = scanner().scan(input);
        assert_eq!(texts(&result), vec!["obviously", "everyone knows"]);
        assert!(result
            .flagged_phrases
            .iter()
            .all(|p| p.severity == Severity::Medium));
        // 4 / 44 * 1000 is far past the cap.
        assert_eq!(result.bias_score, 10);
    }

    #[test]
    fn flags_unattributed_and_conspiratorial_claims() {
        let input = "They say mainstream media is fake news";
        let result = scanner().scan(input);
        assert_eq!(
            texts(&result),
            vec!["They say", "mainstream media", "fake news"]
        );
        assert!(result
            .flagged_phrases
            .iter()
            .all(|p| p.severity == Severity::High));
        let total: u64 = result
            .flagged_phrases
            .iter()
            .map(|p| p.severity.weight())
            .sum();
        assert_eq!(total, 9);
        assert_eq!(result.bias_score, 10);
        assert!(result.summary.contains("3 flagged phrases"));
    }

    #[test]
    fn extraction_preserves_original_casing() {
        let result = scanner().scan("It was SHOCKING. Clearly.");
        assert_eq!(texts(&result), vec!["SHOCKING", "Clearly"]);
        let first = &result.flagged_phrases[0];
        assert_eq!((first.start, first.end), (7, 15));
        assert_eq!(first.span, (7, 15));
    }

    #[test]
    fn plain_text_scores_zero_regardless_of_length() {
        let input = "The committee met on Tuesday and reviewed the budget. ".repeat(40);
        let result = scanner().scan(&input);
        assert!(result.flagged_phrases.is_empty());
        assert_eq!(result.bias_score, 0);
        assert_eq!(result.summary, NEUTRAL_SUMMARY);
    }

    #[test]
    fn overlapping_occurrences_are_all_reported() {
        let scanner = custom(vec![Pattern::new(["aa"], Severity::Low, "pairs").unwrap()]);
        let result = scanner.scan_at("aaaa", 0);
        let starts: Vec<_> = result.flagged_phrases.iter().map(|p| p.start).collect();
        assert_eq!(starts, vec![0, 1, 2]);
    }

    #[test]
    fn duplicate_keywords_across_patterns_are_not_deduplicated() {
        let scanner = custom(vec![
            Pattern::new(["spam"], Severity::Low, "first").unwrap(),
            Pattern::new(["spam"], Severity::High, "second").unwrap(),
        ]);
        let result = scanner.scan_at("spam", 0);
        let explanations: Vec<_> = result
            .flagged_phrases
            .iter()
            .map(|p| p.explanation.as_str())
            .collect();
        assert_eq!(explanations, vec!["first", "second"]);
    }

    #[test]
    fn ties_keep_pattern_then_keyword_order() {
        let scanner = custom(vec![
            Pattern::new(["news today", "news"], Severity::Low, "a").unwrap(),
            Pattern::new(["new"], Severity::Medium, "b").unwrap(),
        ]);
        let result = scanner.scan_at("news today", 0);
        assert_eq!(texts(&result), vec!["news today", "news", "new"]);
    }

    #[test]
    fn later_patterns_sort_by_position() {
        let result = scanner().scan("Fake news is always shocking");
        let starts: Vec<_> = result.flagged_phrases.iter().map(|p| p.start).collect();
        let mut sorted = starts.clone();
        sorted.sort();
        assert_eq!(starts, sorted);
        assert_eq!(texts(&result), vec!["Fake news", "always", "shocking"]);
    }

    #[test]
    fn offsets_are_characters_across_case_expansion() {
        // 'İ' lower-cases to two chars; offsets still index the original.
        let input = "İ ALWAYS say it";
        let result = scanner().scan(input);
        assert_eq!(texts(&result), vec!["ALWAYS"]);
        let phrase = &result.flagged_phrases[0];
        assert_eq!((phrase.start, phrase.end), (2, 8));
        assert_eq!(phrase.span, (3, 9));
        phrase.validate(input).expect("phrase should describe input");
    }

    #[test]
    fn score_rounds_half_up() {
        assert_eq!(bias_score(1, 400), 3);
        assert_eq!(bias_score(1, 2000), 1);
        assert_eq!(bias_score(1, 2001), 0);
        assert_eq!(bias_score(9, 38), 10);
        assert_eq!(bias_score(5, 0), 0);
    }

    #[test]
    fn moderate_summary_pluralizes_indicators() {
        let scanner = custom(vec![Pattern::new(["bad"], Severity::Low, "x").unwrap()]);
        let one = scanner.scan_at(&format!("bad{}", "-".repeat(247)), 0);
        assert_eq!(one.bias_score, 4);
        assert!(one.summary.contains("1 potential bias indicator."));

        let two = scanner.scan_at(&format!("bad bad{}", "-".repeat(493)), 0);
        assert_eq!(two.bias_score, 4);
        assert!(two.summary.contains("2 potential bias indicators."));
    }

    #[test]
    fn high_summary_pluralizes_phrases() {
        let scanner = custom(vec![Pattern::new(["bad"], Severity::High, "x").unwrap()]);
        let one = scanner.scan_at(&format!("bad{}", "-".repeat(297)), 0);
        assert_eq!(one.bias_score, 10);
        assert!(one.summary.contains("with 1 flagged phrase."));

        let two = scanner.scan_at("bad bad", 0);
        assert!(two.summary.contains("with 2 flagged phrases."));
    }

    #[test]
    fn empty_pattern_table_flags_nothing() {
        let scanner = custom(Vec::new());
        let result = scanner.scan("obviously");
        assert!(result.flagged_phrases.is_empty());
        assert_eq!(result.bias_score, 0);
    }

    #[test]
    fn rejects_invalid_custom_pattern() {
        let bad = Pattern {
            keywords: vec!["Loud".into()],
            severity: Severity::Low,
            explanation: "x".into(),
        };
        let err = BiasScanner::with_patterns(vec![bad])
            .err()
            .expect("upper-case keyword should be rejected");
        assert!(format!("{err:#}").contains("invalid pattern at index 0"));
    }

    #[test]
    fn repeated_scans_agree() {
        let scanner = scanner();
        let input = "Unbelievable! Many believe this is an undeniable truth.";
        let a = scanner.scan(input);
        let b = scanner.scan(input);
        assert_eq!(a.bias_score, b.bias_score);
        assert_eq!(a.summary, b.summary);
        assert_eq!(a.flagged_phrases, b.flagged_phrases);
    }
}
