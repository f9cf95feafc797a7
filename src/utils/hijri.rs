use anyhow::Result;
use chrono::{Datelike, Duration, NaiveDate};
use hijri_date::HijriDate;

/// Islamic month names in English (index 0 = Muharram = month 1)
const HIJRI_MONTH_NAMES: &[&str] = &[
    "Muharram",
    "Safar",
    "Rabi' al-Awwal",
    "Rabi' al-Thani",
    "Jumada al-Awwal",
    "Jumada al-Thani",
    "Rajab",
    "Sha'ban",
    "Ramadan",
    "Shawwal",
    "Dhu al-Qi'dah",
    "Dhu al-Hijjah",
];

fn hijri_month_name(month: usize) -> &'static str {
    if (1..=12).contains(&month) {
        HIJRI_MONTH_NAMES[month - 1]
    } else {
        "Unknown"
    }
}

/// Hijri date for a Gregorian date, e.g. "5 Ramadan 1445". `offset_days`
/// adjusts for local moon sighting (-1 if a country is a day behind).
pub fn hijri_string(date: NaiveDate, offset_days: i32) -> Result<String> {
    let adjusted = date + Duration::days(offset_days as i64);
    let hd = HijriDate::from_gr(
        adjusted.year() as usize,
        adjusted.month() as usize,
        adjusted.day() as usize,
    )
    .map_err(|e| anyhow::anyhow!("Hijri conversion error: {}", e))?;

    Ok(format!("{} {} {}", hd.day(), hijri_month_name(hd.month()), hd.year()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_month_names() {
        assert_eq!(hijri_month_name(1), "Muharram");
        assert_eq!(hijri_month_name(9), "Ramadan");
        assert_eq!(hijri_month_name(13), "Unknown");
    }

    #[test]
    fn test_offset_shifts_day() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 20).unwrap();
        let base = hijri_string(date, 0).unwrap();
        let shifted = hijri_string(date, 1).unwrap();
        assert!(base.contains("Ramadan"));
        assert_ne!(base, shifted);
    }
}
