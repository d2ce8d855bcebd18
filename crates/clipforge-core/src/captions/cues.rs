//! Caption Cue Builder
//!
//! Groups word timings into display cues under a selectable chunking
//! strategy, and provides the evenly-spaced plain-text fallback used when
//! precise timings are unavailable.

use super::CaptionError;
use crate::config::CaptionSettings;
use crate::{CaptionCue, WordTiming};

/// Builds ordered, non-overlapping caption cues from word timings.
#[derive(Clone, Debug)]
pub struct CueBuilder {
    /// Minimum cue display time, milliseconds
    pub min_cue_ms: u64,
    /// Fixed window length for the plain-text fallback, milliseconds
    pub fallback_window_ms: u64,
}

impl CueBuilder {
    /// Creates a builder from caption settings
    pub fn new(settings: &CaptionSettings) -> Self {
        Self {
            min_cue_ms: settings.min_cue_ms,
            fallback_window_ms: settings.fallback_window_ms,
        }
    }

    /// Builds cues from precise word timings.
    ///
    /// Consecutive disjoint windows of `group_size` words become one cue
    /// each: cue start = first word's start, cue end = last word's end, both
    /// shifted by `delay_ms`. Cues shorter than the display floor are
    /// extended forward, but never past the next cue's start, so the output
    /// is non-overlapping by construction.
    ///
    /// Fails on empty or non-monotonic input; the caller is expected to fall
    /// back to [`CueBuilder::build_evenly_spaced`].
    pub fn build(
        &self,
        words: &[WordTiming],
        group_size: usize,
        delay_ms: u64,
    ) -> Result<Vec<CaptionCue>, CaptionError> {
        if words.is_empty() {
            return Err(CaptionError::EmptyTimings);
        }
        for word in words {
            if word.end_ms < word.start_ms {
                return Err(CaptionError::NonMonotonic);
            }
        }
        // Overlapping words would make overlapping cues; treat as malformed.
        for pair in words.windows(2) {
            if pair[1].start_ms < pair[0].end_ms {
                return Err(CaptionError::NonMonotonic);
            }
        }

        let group_size = group_size.max(1);
        let groups: Vec<&[WordTiming]> = words.chunks(group_size).collect();

        let mut cues = Vec::with_capacity(groups.len());
        for (i, group) in groups.iter().enumerate() {
            let first = &group[0];
            let last = &group[group.len() - 1];

            let start_ms = first.start_ms + delay_ms;
            let mut end_ms = (last.end_ms + delay_ms).max(start_ms + self.min_cue_ms);

            // The floor extension must not spill into the next cue.
            if let Some(next) = groups.get(i + 1) {
                end_ms = end_ms.min(next[0].start_ms + delay_ms);
            }

            let text = group
                .iter()
                .map(|w| w.word.as_str())
                .collect::<Vec<_>>()
                .join(" ")
                .to_uppercase();

            cues.push(CaptionCue {
                text,
                start_ms,
                end_ms,
            });
        }

        Ok(cues)
    }

    /// Builds evenly spaced cues over plain text, for when word timings are
    /// empty or malformed.
    ///
    /// Words are chunked the same way, but every cue occupies one fixed
    /// window, back to back from `delay_ms`.
    pub fn build_evenly_spaced(
        &self,
        text: &str,
        group_size: usize,
        delay_ms: u64,
    ) -> Result<Vec<CaptionCue>, CaptionError> {
        let words: Vec<&str> = text.split_whitespace().collect();
        if words.is_empty() {
            return Err(CaptionError::EmptyText);
        }

        let group_size = group_size.max(1);
        let window = self.fallback_window_ms.max(self.min_cue_ms);

        let cues = words
            .chunks(group_size)
            .enumerate()
            .map(|(i, group)| {
                let start_ms = delay_ms + i as u64 * window;
                CaptionCue {
                    text: group.join(" ").to_uppercase(),
                    start_ms,
                    end_ms: start_ms + window,
                }
            })
            .collect();

        Ok(cues)
    }
}

impl Default for CueBuilder {
    fn default() -> Self {
        Self::new(&CaptionSettings::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(entries: &[(&str, u64, u64)]) -> Vec<WordTiming> {
        entries.iter()
            .map(|(w, s, e)| WordTiming::new(w, *s, *e))
            .collect()
    }

    #[test]
    fn test_single_word_cues() {
        let builder = CueBuilder {
            min_cue_ms: 100,
            fallback_window_ms: 1500,
        };
        let cues = builder
            .build(&words(&[("hello", 0, 400), ("world", 500, 900)]), 1, 0)
            .unwrap();

        assert_eq!(cues.len(), 2);
        assert_eq!(cues[0].text, "HELLO");
        assert_eq!(cues[0].start_ms, 0);
        assert_eq!(cues[0].end_ms, 400);
        assert_eq!(cues[1].start_ms, 500);
    }

    #[test]
    fn test_grouped_cues_bound_their_words() {
        let builder = CueBuilder {
            min_cue_ms: 100,
            fallback_window_ms: 1500,
        };
        let input = words(&[
            ("one", 0, 300),
            ("two", 350, 600),
            ("three", 650, 1000),
            ("four", 1100, 1500),
        ]);
        let cues = builder.build(&input, 3, 0).unwrap();

        assert_eq!(cues.len(), 2);
        assert_eq!(cues[0].text, "ONE TWO THREE");
        assert_eq!(cues[0].start_ms, 0);
        assert_eq!(cues[0].end_ms, 1000);
        assert_eq!(cues[1].start_ms, 1100);
        assert_eq!(cues[1].end_ms, 1500);
    }

    #[test]
    fn test_delay_shifts_every_cue() {
        let builder = CueBuilder::default();
        let cues = builder
            .build(&words(&[("hey", 0, 800)]), 1, 2000)
            .unwrap();
        assert_eq!(cues[0].start_ms, 2000);
        assert_eq!(cues[0].end_ms, 2800);
    }

    #[test]
    fn test_short_cue_extended_to_floor() {
        let builder = CueBuilder {
            min_cue_ms: 700,
            fallback_window_ms: 1500,
        };
        let cues = builder
            .build(&words(&[("uh", 0, 120)]), 1, 0)
            .unwrap();
        assert_eq!(cues[0].end_ms, 700);
    }

    #[test]
    fn test_floor_extension_never_overlaps_next_cue() {
        let builder = CueBuilder {
            min_cue_ms: 700,
            fallback_window_ms: 1500,
        };
        // Dense short words: the floor would push cue 0 past cue 1's start.
        let cues = builder
            .build(&words(&[("a", 0, 100), ("b", 200, 300), ("c", 400, 500)]), 1, 0)
            .unwrap();

        for pair in cues.windows(2) {
            assert!(
                !pair[0].overlaps(&pair[1]),
                "{:?} overlaps {:?}",
                pair[0],
                pair[1]
            );
        }
    }

    #[test]
    fn test_empty_timings_rejected() {
        let builder = CueBuilder::default();
        assert_eq!(builder.build(&[], 1, 0), Err(CaptionError::EmptyTimings));
    }

    #[test]
    fn test_non_monotonic_timings_rejected() {
        let builder = CueBuilder::default();
        let input = words(&[("late", 500, 900), ("early", 100, 400)]);
        assert_eq!(builder.build(&input, 1, 0), Err(CaptionError::NonMonotonic));

        let inverted = words(&[("broken", 500, 100)]);
        // WordTiming::new clamps, so build via raw struct to simulate bad data
        let raw = vec![WordTiming {
            word: inverted[0].word.clone(),
            start_ms: 500,
            end_ms: 100,
        }];
        assert_eq!(builder.build(&raw, 1, 0), Err(CaptionError::NonMonotonic));
    }

    #[test]
    fn test_evenly_spaced_fallback() {
        let builder = CueBuilder {
            min_cue_ms: 700,
            fallback_window_ms: 1500,
        };
        let cues = builder
            .build_evenly_spaced("watch this amazing moment right now", 3, 2000)
            .unwrap();

        assert_eq!(cues.len(), 2);
        assert_eq!(cues[0].text, "WATCH THIS AMAZING");
        assert_eq!(cues[0].start_ms, 2000);
        assert_eq!(cues[0].end_ms, 3500);
        assert_eq!(cues[1].start_ms, 3500);
        for pair in cues.windows(2) {
            assert!(!pair[0].overlaps(&pair[1]));
        }
    }

    #[test]
    fn test_evenly_spaced_rejects_blank_text() {
        let builder = CueBuilder::default();
        assert_eq!(
            builder.build_evenly_spaced("  ", 3, 0),
            Err(CaptionError::EmptyText)
        );
    }

    #[test]
    fn test_zero_group_size_treated_as_one() {
        let builder = CueBuilder::default();
        let cues = builder
            .build(&words(&[("solo", 0, 900)]), 0, 0)
            .unwrap();
        assert_eq!(cues.len(), 1);
    }
}
