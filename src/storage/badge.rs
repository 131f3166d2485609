use crate::utils::time::split_hms;

/// Fixed badge-rendering service the artifact points at. The tracked duration
/// is embedded URL-encoded between label and color.
const BADGE_URL_PREFIX: &str = "https://img.shields.io/badge/Code%20Time-";
const BADGE_URL_SUFFIX: &str = "-blue?style=flat";

/// Renders the full markdown badge line for a counter value. Hours are
/// unpadded, minutes and seconds always take two digits.
pub fn render_badge(total_seconds: u64) -> String {
    let (hours, minutes, seconds) = split_hms(total_seconds);
    format!(
        "![Code Time]({BADGE_URL_PREFIX}{hours}h%20{minutes:02}m%20{seconds:02}s{BADGE_URL_SUFFIX})"
    )
}

#[cfg(test)]
mod badge_tests {
    use super::*;

    #[test]
    fn renders_url_encoded_duration() {
        assert_eq!(
            render_badge(3725),
            "![Code Time](https://img.shields.io/badge/Code%20Time-1h%2002m%2005s-blue?style=flat)"
        );
    }

    #[test]
    fn zero_counter_still_renders_a_complete_badge() {
        assert_eq!(
            render_badge(0),
            "![Code Time](https://img.shields.io/badge/Code%20Time-0h%2000m%2000s-blue?style=flat)"
        );
    }

    #[test]
    fn hours_are_not_capped_at_a_day() {
        assert_eq!(
            render_badge(90_061),
            "![Code Time](https://img.shields.io/badge/Code%20Time-25h%2001m%2001s-blue?style=flat)"
        );
    }
}
