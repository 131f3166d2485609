/// Splits a seconds counter into whole hours, minutes and seconds.
pub fn split_hms(total_seconds: u64) -> (u64, u64, u64) {
    (
        total_seconds / 3600,
        (total_seconds % 3600) / 60,
        total_seconds % 60,
    )
}

/// This is the standard way of displaying a tracked duration in codetime.
pub fn format_hms(total_seconds: u64) -> String {
    let (hours, minutes, seconds) = split_hms(total_seconds);
    format!("{hours}h {minutes:02}m {seconds:02}s")
}

#[cfg(test)]
mod time_tests {
    use super::*;

    #[test]
    fn splits_counter_into_components() {
        assert_eq!(split_hms(0), (0, 0, 0));
        assert_eq!(split_hms(59), (0, 0, 59));
        assert_eq!(split_hms(3725), (1, 2, 5));
        assert_eq!(split_hms(86400), (24, 0, 0));
    }

    #[test]
    fn formats_with_padded_minutes_and_seconds() {
        assert_eq!(format_hms(0), "0h 00m 00s");
        assert_eq!(format_hms(3725), "1h 02m 05s");
        assert_eq!(format_hms(36_615), "10h 10m 15s");
    }
}
