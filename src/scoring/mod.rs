//! Scoring engine.
//!
//! Pure functions from a target text, the final input and session timing to
//! the metrics stored on a result. Characters are compared by position over
//! Unicode scalar values; anything past the end of the target is ignored.
//!
//! WPM here is net of errors only in the sense that incorrect characters are
//! left out of the numerator: `(correct_chars / 5) / elapsed_minutes`.

use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

use crate::models::{CadenceStats, MissFrequency, ResultMetrics};

/// Characters per "word" in the WPM formula.
pub const CHARS_PER_WORD: f64 = 5.0;

/// Elapsed time is floored to this many milliseconds before any division.
pub const MIN_ELAPSED_MS: u64 = 1;

/// Everything needed to score one finished session.
#[derive(Debug, Clone, Copy)]
pub struct ScoringInput<'a> {
    pub target: &'a str,
    pub input: &'a str,
    pub elapsed_ms: u64,
    /// Largest delay between two input updates.
    pub max_key_delay_ms: u64,
    /// Largest delay between two word boundaries.
    pub max_word_delay_ms: u64,
}

/// Output of [`score`]. Emitted once per session.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionMetrics {
    pub correct_chars: usize,
    pub wpm: u32,
    pub accuracy: u8,
    pub elapsed_ms: u64,
    /// Elapsed whole seconds, rounded.
    pub time_taken: u32,
    pub missed_chars: MissFrequency,
    pub missed_words: MissFrequency,
    pub cadence: CadenceStats,
}

impl SessionMetrics {
    /// Project into the record shape accepted by the result writer.
    pub fn to_result_metrics(&self) -> ResultMetrics {
        ResultMetrics {
            wpm: self.wpm,
            accuracy: self.accuracy,
            time_taken: self.time_taken,
            missed_chars: Some(self.missed_chars.clone()),
            missed_words: Some(self.missed_words.clone()),
            cadence: Some(self.cadence),
        }
    }
}

pub fn correct_chars(target: &str, input: &str) -> usize {
    target
        .chars()
        .zip(input.chars())
        .filter(|(t, i)| t == i)
        .count()
}

/// `round(100 * correct / len(target))`; an empty target scores 0.
pub fn accuracy(correct: usize, target_len: usize) -> u8 {
    if target_len == 0 {
        return 0;
    }
    let pct = (100.0 * correct as f64 / target_len as f64).round();
    pct.clamp(0.0, 100.0) as u8
}

pub fn wpm(correct: usize, elapsed_ms: u64) -> u32 {
    let minutes = elapsed_ms.max(MIN_ELAPSED_MS) as f64 / 60_000.0;
    ((correct as f64 / CHARS_PER_WORD) / minutes).round() as u32
}

/// Target characters that were not reproduced, keyed lowercase.
///
/// Whitespace positions are never counted. A position the input never
/// reached counts as a miss.
pub fn missed_chars(target: &str, input: &str) -> MissFrequency {
    let mut input_chars = input.chars();
    let mut missed = MissFrequency::new();
    for expected in target.chars() {
        let typed = input_chars.next();
        if typed == Some(expected) || expected.is_whitespace() {
            continue;
        }
        let key: String = expected.to_lowercase().collect();
        *missed.entry(key).or_insert(0) += 1;
    }
    missed
}

/// Target words whose token at the same index differs in the input.
///
/// Tokens are split on whitespace runs, keeping the empty token produced by
/// leading whitespace, so an input that starts with a space is shifted by one
/// token. The recorded key is the target token with non-word characters
/// removed, lowercased. Empty keys are skipped.
pub fn missed_words(target: &str, input: &str) -> MissFrequency {
    static NON_WORD: OnceLock<Regex> = OnceLock::new();
    static WHITESPACE_RUN: OnceLock<Regex> = OnceLock::new();
    let non_word = NON_WORD.get_or_init(|| Regex::new(r"[^A-Za-z0-9_]").expect("valid regex"));
    let whitespace = WHITESPACE_RUN.get_or_init(|| Regex::new(r"\s+").expect("valid regex"));

    let mut typed_words = whitespace.split(input);
    let mut missed = MissFrequency::new();
    for expected in whitespace.split(target) {
        if typed_words.next() == Some(expected) {
            continue;
        }
        let key = non_word.replace_all(expected, "").to_lowercase();
        if !key.is_empty() {
            *missed.entry(key).or_insert(0) += 1;
        }
    }
    missed
}

/// Session-wide cadence figures.
///
/// Averages divide total elapsed time by target length and by word count;
/// maxima come from the per-update samples.
pub fn cadence(input: &ScoringInput<'_>) -> CadenceStats {
    let elapsed = input.elapsed_ms.max(MIN_ELAPSED_MS) as f64;
    let letters = input.target.chars().count().max(1) as f64;
    let words = input.target.split_whitespace().count().max(1) as f64;

    CadenceStats {
        avg_time_between_letters: elapsed / letters,
        max_time_between_letters: input.max_key_delay_ms,
        avg_time_between_words: elapsed / words,
        max_time_between_words: input.max_word_delay_ms,
    }
}

/// Score a finished session.
pub fn score(input: &ScoringInput<'_>) -> SessionMetrics {
    let target_len = input.target.chars().count();
    let correct = correct_chars(input.target, input.input);
    let elapsed_ms = input.elapsed_ms.max(MIN_ELAPSED_MS);

    SessionMetrics {
        correct_chars: correct,
        wpm: wpm(correct, elapsed_ms),
        accuracy: accuracy(correct, target_len),
        elapsed_ms,
        time_taken: (elapsed_ms as f64 / 1000.0).round() as u32,
        missed_chars: missed_chars(input.target, input.input),
        missed_words: missed_words(input.target, input.input),
        cadence: cadence(input),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn scoring<'a>(target: &'a str, input: &'a str, elapsed_ms: u64) -> ScoringInput<'a> {
        ScoringInput {
            target,
            input,
            elapsed_ms,
            max_key_delay_ms: 0,
            max_word_delay_ms: 0,
        }
    }

    #[test]
    fn test_abc_abd_six_seconds() {
        let m = score(&scoring("abc", "abd", 6_000));
        assert_eq!(m.correct_chars, 2);
        assert_eq!(m.accuracy, 67);
        assert_eq!(m.wpm, 4);
        assert_eq!(m.time_taken, 6);
        assert_eq!(m.missed_chars.get("c"), Some(&1));
        assert_eq!(m.missed_words.get("abc"), Some(&1));
    }

    #[test]
    fn test_full_accuracy_iff_exact_match() {
        let target = "The quick brown fox";
        assert_eq!(score(&scoring(target, target, 4_000)).accuracy, 100);
        for variant in ["the quick brown fox", "The quick brown fix", "The quick brown fo "] {
            assert!(score(&scoring(target, variant, 4_000)).accuracy < 100);
        }
    }

    #[test]
    fn test_wpm_non_increasing_as_accuracy_drops() {
        let target = "abcdefghijklmnopqrst";
        let mut input: Vec<char> = target.chars().collect();
        let mut previous = score(&scoring(target, target, 10_000));
        for i in 0..input.len() {
            input[i] = '#';
            let typed: String = input.iter().collect();
            let current = score(&scoring(target, &typed, 10_000));
            assert!(current.accuracy <= previous.accuracy);
            assert!(current.wpm <= previous.wpm);
            previous = current;
        }
        assert_eq!(previous.wpm, 0);
    }

    #[test]
    fn test_zero_elapsed_is_floored() {
        let m = score(&scoring("hello", "hello", 0));
        assert_eq!(m.elapsed_ms, 1);
        // (5/5) / (1/60000)
        assert_eq!(m.wpm, 60_000);
        assert_eq!(m.time_taken, 0);
    }

    #[test]
    fn test_empty_target_scores_zero() {
        let m = score(&scoring("", "", 1_000));
        assert_eq!(m.accuracy, 0);
        assert_eq!(m.wpm, 0);
        assert!(m.missed_chars.is_empty());
        assert_eq!(m.cadence.avg_time_between_letters, 1_000.0);
    }

    #[test]
    fn test_extra_input_beyond_target_ignored() {
        let m = score(&scoring("abc", "abcxyz", 6_000));
        assert_eq!(m.correct_chars, 3);
        assert_eq!(m.accuracy, 100);
    }

    #[test]
    fn test_missed_chars_skip_whitespace_and_lowercase() {
        let missed = missed_chars("A b\nA", "x x\tx");
        assert_eq!(missed.len(), 2);
        assert_eq!(missed.get("a"), Some(&2));
        assert_eq!(missed.get("b"), Some(&1));
    }

    #[test]
    fn test_missed_chars_counts_unreached_positions() {
        let missed = missed_chars("abcd", "ab");
        assert_eq!(missed.get("c"), Some(&1));
        assert_eq!(missed.get("d"), Some(&1));
    }

    #[test]
    fn test_missed_words_strip_punctuation() {
        let missed = missed_words("Hello, world! (x) ...", "Hello world! x ...");
        let expected: MissFrequency = [("hello".to_string(), 1), ("x".to_string(), 1)]
            .into_iter()
            .collect();
        assert_eq!(missed, expected);
    }

    #[test]
    fn test_missed_words_leading_space_shifts_tokens() {
        let missed = missed_words("hello world", " hello world");
        let expected: MissFrequency = [("hello".to_string(), 1), ("world".to_string(), 1)]
            .into_iter()
            .collect();
        assert_eq!(missed, expected);

        assert!(missed_words("hello world", "hello world ").is_empty());
        assert!(missed_words("hello  world", "hello world").is_empty());
    }

    #[test]
    fn test_cadence_averages_use_totals() {
        let input = ScoringInput {
            target: "one two three four",
            input: "one two three four",
            elapsed_ms: 3_600,
            max_key_delay_ms: 400,
            max_word_delay_ms: 1_200,
        };
        let c = cadence(&input);
        assert_eq!(c.avg_time_between_letters, 200.0);
        assert_eq!(c.avg_time_between_words, 900.0);
        assert_eq!(c.max_time_between_letters, 400);
        assert_eq!(c.max_time_between_words, 1_200);
    }

    #[test]
    fn test_to_result_metrics_keeps_optional_fields() {
        let m = score(&scoring("abc", "abd", 6_000));
        let r = m.to_result_metrics();
        assert_eq!(r.wpm, 4);
        assert_eq!(r.accuracy, 67);
        assert_eq!(r.time_taken, 6);
        assert_eq!(r.missed_chars.unwrap().get("c"), Some(&1));
        assert!(r.cadence.is_some());
    }
}
