//! Misc

use std::time::Duration;

/// Helper function to format a duration for humans, at minute precision.
pub fn format_duration(dur: &Duration) -> String {
    let total_mins = dur.as_secs() / 60;

    let days = total_mins / (24 * 60);
    let hours = total_mins / 60 % 24;
    let mins = total_mins % 60;

    match (days, hours, mins) {
        (0, 0, mins) => format!("{mins}m"),
        (0, hours, mins) => format!("{hours}h {mins:02}m"),
        (days, hours, mins) => format!("{days}d {hours:02}h {mins:02}m"),
    }
}

/// Cut `text` to at most `max_chars` characters, ending in `…` when it was cut.
pub fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }

    let kept: String = text.chars().take(max_chars.saturating_sub(1)).collect();
    format!("{}…", kept.trim_end())
}
