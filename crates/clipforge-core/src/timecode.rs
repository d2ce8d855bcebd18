//! Timestamp Conversion
//!
//! Conversion between textual `MM:SS` / `HH:MM:SS` timestamps and
//! milliseconds. Parsing fails soft: malformed input yields 0, and callers
//! treat 0 as "unknown" where that matters.

/// Parses `MM:SS` or `HH:MM:SS` into milliseconds.
///
/// Returns 0 for anything that does not parse; never errors.
pub fn parse_timestamp(text: &str) -> u64 {
    let parts: Vec<&str> = text.trim().split(':').collect();

    let numbers: Option<Vec<u64>> = parts.iter().map(|p| p.trim().parse().ok()).collect();
    let numbers = match numbers {
        Some(n) => n,
        None => return 0,
    };

    let seconds = match numbers.as_slice() {
        [minutes, seconds] => minutes * 60 + seconds,
        [hours, minutes, seconds] => hours * 3600 + minutes * 60 + seconds,
        _ => return 0,
    };

    seconds * 1000
}

/// Parses `MM:SS` or `HH:MM:SS` into seconds.
pub fn parse_seconds(text: &str) -> f64 {
    parse_timestamp(text) as f64 / 1000.0
}

/// Formats milliseconds as `MM:SS`, or `HH:MM:SS` at one hour and above.
///
/// Sub-second precision is dropped; this is the exact inverse of
/// [`parse_timestamp`] over whole-second values.
pub fn format_timestamp(ms: u64) -> String {
    let total_secs = ms / 1000;
    let secs = total_secs % 60;
    let total_mins = total_secs / 60;
    let mins = total_mins % 60;
    let hours = total_mins / 60;

    if hours > 0 {
        format!("{:02}:{:02}:{:02}", hours, mins, secs)
    } else {
        format!("{:02}:{:02}", mins, secs)
    }
}
