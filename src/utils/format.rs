use crate::models::{AdhkarProgress, DhikrKind};

/// Format a duration in seconds to "Xh Ym" or "Ym" string
pub fn format_duration_secs(secs: i64) -> String {
    if secs <= 0 {
        return "now".to_string();
    }
    let hours = secs / 3600;
    let minutes = (secs % 3600) / 60;
    if hours > 0 {
        format!("{}h {}m", hours, minutes)
    } else {
        format!("{}m", minutes)
    }
}

/// Parse a UTC offset string into total minutes.
/// Accepts: "5:30", "+5:30", "-5:30", "5", "+5", "5.5"
pub fn parse_tz_offset(s: &str) -> anyhow::Result<i32> {
    let input = s;
    let s = s.trim().trim_start_matches('+');
    let negative = s.starts_with('-');
    let s = s.trim_start_matches('-');
    let sign = if negative { -1 } else { 1 };

    let (hours, mins) = if let Some((hours, mins)) = s.split_once(':') {
        let mins: i32 = mins.parse()?;
        if !(0..60).contains(&mins) {
            anyhow::bail!("Minutes out of range in offset '{}'", input);
        }
        (hours.parse::<f64>()?, mins)
    } else {
        (s.parse::<f64>()?, 0)
    };

    // Real offsets run from -12:00 to +14:00
    let fractional_with_minutes = hours.fract() != 0.0 && mins != 0;
    if !(0.0..=14.0).contains(&hours) || fractional_with_minutes {
        anyhow::bail!("UTC offset '{}' is out of range", input);
    }

    Ok(sign * ((hours * 60.0).round() as i32 + mins))
}

/// Format total minutes as "+H" or "+H:MM"
pub fn format_tz_offset(minutes: i32) -> String {
    let sign = if minutes < 0 { "-" } else { "+" };
    let abs = minutes.abs();
    let h = abs / 60;
    let m = abs % 60;
    if m == 0 {
        format!("{}{}", sign, h)
    } else {
        format!("{}{}:{:02}", sign, h, m)
    }
}

/// "✓", "33/99" or "○" for a checklist line
pub fn adhkar_status(progress: &AdhkarProgress) -> String {
    if progress.completed {
        return "✓".to_string();
    }
    match progress.item.kind {
        DhikrKind::Counter => format!("{}/{}", progress.count, progress.item.target),
        DhikrKind::Checkbox => "○".to_string(),
    }
}

/// Create a simple ASCII progress bar
pub fn progress_bar(filled: u32, total: u32, width: usize) -> String {
    if total == 0 {
        return "░".repeat(width);
    }
    let ratio = (filled as f64 / total as f64).min(1.0);
    let filled_count = (ratio * width as f64).round() as usize;
    let empty_count = width.saturating_sub(filled_count);
    format!("{}{}", "█".repeat(filled_count), "░".repeat(empty_count))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration_secs(0), "now");
        assert_eq!(format_duration_secs(13 * 60), "13m");
        assert_eq!(format_duration_secs(5 * 3600 + 10 * 60 + 59), "5h 10m");
    }

    #[test]
    fn test_tz_offset_round_trip() {
        assert_eq!(parse_tz_offset("+5:30").unwrap(), 330);
        assert_eq!(parse_tz_offset("-3:30").unwrap(), -210);
        assert_eq!(parse_tz_offset("5").unwrap(), 300);
        assert_eq!(parse_tz_offset("5.75").unwrap(), 345);
        assert!(parse_tz_offset("5:75").is_err());
        assert!(parse_tz_offset("abc").is_err());
        assert!(parse_tz_offset("50000000").is_err());
        assert!(parse_tz_offset("-50000000:30").is_err());
        assert!(parse_tz_offset("1e300").is_err());
        assert!(parse_tz_offset("15").is_err());
        assert_eq!(parse_tz_offset("+14").unwrap(), 840);

        assert_eq!(format_tz_offset(330), "+5:30");
        assert_eq!(format_tz_offset(-300), "-5");
    }

    #[test]
    fn test_progress_bar() {
        assert_eq!(progress_bar(0, 0, 4), "░░░░");
        assert_eq!(progress_bar(11, 11, 4), "████");
        assert_eq!(progress_bar(1, 2, 4), "██░░");
    }
}
