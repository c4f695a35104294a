use bias_scan_core::{scanner::bias_scanner::NEUTRAL_SUMMARY, BiasScanner};
use proptest::prelude::*;

fn corpus_text() -> impl Strategy<Value = String> {
    let fragments = prop_oneof![
        Just("obviously ".to_string()),
        Just("They Say ".to_string()),
        Just("FAKE NEWS".to_string()),
        Just("always".to_string()),
        Just("ALWAYSALWAYS ".to_string()),
        Just("İstanbul ".to_string()),
        Just("Straße ".to_string()),
        "[a-zA-Z ,.!?'\n]{0,24}",
    ];
    proptest::collection::vec(fragments, 0..12).prop_map(|parts| parts.concat())
}

proptest! {
    #[test]
    fn score_stays_in_range(input in corpus_text()) {
        let result = BiasScanner::new().unwrap().scan(&input);
        prop_assert!(result.bias_score <= 10);
        prop_assert!(!result.summary.is_empty());
    }

    #[test]
    fn phrases_describe_input_slices(input in corpus_text()) {
        let result = BiasScanner::new().unwrap().scan(&input);
        let char_len = input.chars().count();
        for phrase in &result.flagged_phrases {
            prop_assert!(phrase.start < phrase.end && phrase.end <= char_len);
            prop_assert_eq!(&input[phrase.span.0..phrase.span.1], phrase.text.as_str());
            prop_assert!(phrase.validate(&input).is_ok());
        }
    }

    #[test]
    fn phrases_sorted_by_start(input in corpus_text()) {
        let result = BiasScanner::new().unwrap().scan(&input);
        for pair in result.flagged_phrases.windows(2) {
            prop_assert!(pair[0].start <= pair[1].start);
        }
    }

    #[test]
    fn scans_are_repeatable(input in corpus_text()) {
        let scanner = BiasScanner::new().unwrap();
        let first = scanner.scan(&input);
        let second = scanner.scan(&input);
        prop_assert_eq!(first.bias_score, second.bias_score);
        prop_assert_eq!(first.summary, second.summary);
        prop_assert_eq!(first.flagged_phrases, second.flagged_phrases);
    }

    #[test]
    fn keyword_free_text_scores_zero(input in "[b-df-hj-np-tv-z ]{0,400}") {
        // No vowels except 'y', so no keyword can appear.
        let result = BiasScanner::new().unwrap().scan(&input);
        prop_assert!(result.flagged_phrases.is_empty());
        prop_assert_eq!(result.bias_score, 0);
        prop_assert_eq!(result.summary.as_str(), NEUTRAL_SUMMARY);
    }
}

#[test]
fn empty_input_is_neutral() {
    let result = BiasScanner::new().unwrap().scan("");
    assert_eq!(result.bias_score, 0);
    assert!(result.flagged_phrases.is_empty());
    assert_eq!(result.summary, NEUTRAL_SUMMARY);
}
