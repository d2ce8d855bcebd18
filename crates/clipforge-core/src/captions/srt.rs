//! SRT Rendering
//!
//! Renders caption cues to SubRip format for the subtitle burn filter.

use std::path::Path;

use crate::{ClipResult, CaptionCue};

/// Renders cues to SRT format.
///
/// ```text
/// 1
/// 00:00:02,000 --> 00:00:03,500
/// FIRST CUE
/// ```
pub fn render_srt(cues: &[CaptionCue]) -> String {
    let mut output = String::new();

    for (index, cue) in cues.iter().enumerate() {
        output.push_str(&format!("{}\n", index + 1));
        output.push_str(&format!(
            "{} --> {}\n",
            format_srt_timestamp(cue.start_ms),
            format_srt_timestamp(cue.end_ms)
        ));
        output.push_str(&cue.text);
        output.push_str("\n\n");
    }

    output
}

/// Renders cues and writes them to `path`.
pub fn write_srt(cues: &[CaptionCue], path: &Path) -> ClipResult<()> {
    std::fs::write(path, render_srt(cues))?;
    Ok(())
}

/// Formats milliseconds as an SRT timestamp (00:00:00,000)
fn format_srt_timestamp(ms: u64) -> String {
    let millis = ms % 1000;
    let total_secs = ms / 1000;
    let secs = total_secs % 60;
    let total_mins = total_secs / 60;
    let mins = total_mins % 60;
    let hours = total_mins / 60;

    format!("{:02}:{:02}:{:02},{:03}", hours, mins, secs, millis)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_srt_timestamp() {
        assert_eq!(format_srt_timestamp(0), "00:00:00,000");
        assert_eq!(format_srt_timestamp(1_500), "00:00:01,500");
        assert_eq!(format_srt_timestamp(90_000), "00:01:30,000");
        assert_eq!(format_srt_timestamp(5_400_000), "01:30:00,000");
    }

    #[test]
    fn test_render_srt() {
        let cues = vec![
            CaptionCue {
                text: "HELLO WORLD".to_string(),
                start_ms: 500,
                end_ms: 1_700,
            },
            CaptionCue {
                text: "SECOND CUE".to_string(),
                start_ms: 1_700,
                end_ms: 3_000,
            },
        ];

        let srt = render_srt(&cues);
        assert!(srt.starts_with("1\n00:00:00,500 --> 00:00:01,700\nHELLO WORLD\n"));
        assert!(srt.contains("2\n00:00:01,700 --> 00:00:03,000\nSECOND CUE\n"));
    }

    #[test]
    fn test_write_srt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("captions_1.srt");
        let cues = vec![CaptionCue {
            text: "ON DISK".to_string(),
            start_ms: 0,
            end_ms: 900,
        }];

        write_srt(&cues, &path).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("ON DISK"));
    }
}
