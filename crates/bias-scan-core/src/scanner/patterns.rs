use anyhow::Result;
use once_cell::sync::Lazy;

use super::{Pattern, PatternRepository, Severity};

static DEFAULT_PATTERNS: Lazy<Vec<Pattern>> = Lazy::new(|| {
    let table: [(&[&str], Severity, &str); 5] = [
        (
            &["always", "never", "everyone knows", "obviously", "clearly"],
            Severity::Medium,
            "Absolutist language that doesn't allow for nuance or alternative perspectives.",
        ),
        (
            &["they say", "people are saying", "many believe", "some claim"],
            Severity::High,
            "Vague attribution without credible sources, often used to spread unverified claims.",
        ),
        (
            &["shocking", "outrageous", "unbelievable", "stunning"],
            Severity::Medium,
            "Emotional language designed to provoke reaction rather than inform.",
        ),
        (
            &["proven fact", "undeniable truth", "without question"],
            Severity::High,
            "Claims of absolute certainty without providing evidence or acknowledging complexity.",
        ),
        (
            &["mainstream media", "fake news", "they don't want you to know"],
            Severity::High,
            "Conspiratorial language that dismisses established sources without evidence.",
        ),
    ];
    table
        .into_iter()
        .map(|(keywords, severity, explanation)| Pattern {
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
            severity,
            explanation: explanation.to_string(),
        })
        .collect()
});

/// The built-in detection table, in scan order.
pub fn default_patterns() -> &'static [Pattern] {
    &DEFAULT_PATTERNS
}

/// Repository serving the built-in table.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinPatterns;

impl PatternRepository for BuiltinPatterns {
    fn load_patterns(&self) -> Result<Vec<Pattern>> {
        Ok(default_patterns().to_vec())
    }
}
