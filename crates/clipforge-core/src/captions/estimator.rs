//! Word Timing Estimator
//!
//! Synthesizes a monotonically increasing word-timing sequence when no real
//! per-word timing exists — the speech synthesizer returned none, or a
//! segment-only transcript has to be subdivided.
//!
//! The estimate is fully deterministic: identical text and settings always
//! produce identical timings.

use crate::config::CaptionSettings;
use crate::WordTiming;

/// Deterministic word-timing synthesizer.
///
/// Each word gets a duration proportional to its character length, clamped
/// to a floor so short words stay readable, and the cursor advances by the
/// duration plus a fixed inter-word gap.
#[derive(Clone, Debug)]
pub struct TimingEstimator {
    /// Minimum word duration, milliseconds
    pub min_word_ms: u64,
    /// Duration per character, milliseconds
    pub per_char_ms: u64,
    /// Gap between consecutive words, milliseconds
    pub gap_ms: u64,
}

impl TimingEstimator {
    /// Creates an estimator from caption settings
    pub fn new(settings: &CaptionSettings) -> Self {
        Self {
            min_word_ms: settings.min_word_ms,
            per_char_ms: settings.per_char_ms,
            gap_ms: settings.word_gap_ms,
        }
    }

    /// Estimates timings for every whitespace-separated word in `text`.
    ///
    /// Returns an empty vector for blank input.
    pub fn estimate(&self, text: &str) -> Vec<WordTiming> {
        let mut timings = Vec::new();
        let mut cursor: u64 = 0;

        for word in text.split_whitespace() {
            let duration = (word.chars().count() as u64 * self.per_char_ms).max(self.min_word_ms);
            timings.push(WordTiming::new(word, cursor, cursor + duration));
            cursor += duration + self.gap_ms;
        }

        timings
    }
}

impl Default for TimingEstimator {
    fn default() -> Self {
        Self::new(&CaptionSettings::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_text_yields_no_timings() {
        let estimator = TimingEstimator::default();
        assert!(estimator.estimate("").is_empty());
        assert!(estimator.estimate("   ").is_empty());
    }

    #[test]
    fn test_starts_are_non_decreasing() {
        let estimator = TimingEstimator::default();
        let timings = estimator.estimate("the quick brown fox jumps over the lazy dog");

        for pair in timings.windows(2) {
            assert!(pair[1].start_ms >= pair[0].start_ms);
            assert!(pair[1].start_ms >= pair[0].end_ms);
        }
    }

    #[test]
    fn test_every_word_meets_the_floor() {
        let estimator = TimingEstimator::default();
        let timings = estimator.estimate("a bb ccc extraordinary");

        for timing in &timings {
            assert!(
                timing.duration_ms() >= estimator.min_word_ms,
                "{} shorter than floor",
                timing.word
            );
        }
        // Long words scale past the floor
        let last = timings.last().unwrap();
        assert!(last.duration_ms() > estimator.min_word_ms);
    }

    #[test]
    fn test_deterministic() {
        let estimator = TimingEstimator::default();
        let a = estimator.estimate("same input every time");
        let b = estimator.estimate("same input every time");
        assert_eq!(a, b);
    }

    #[test]
    fn test_gap_between_words() {
        let estimator = TimingEstimator {
            min_word_ms: 100,
            per_char_ms: 10,
            gap_ms: 50,
        };
        let timings = estimator.estimate("hi there");
        assert_eq!(timings[0].start_ms, 0);
        assert_eq!(timings[0].end_ms, 100);
        assert_eq!(timings[1].start_ms, 150);
    }
}
