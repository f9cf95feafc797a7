use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::schedule::clock::parse_hhmm;
use crate::schedule::ScheduleError;

/// One of the six externally supplied clock times of a day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Anchor {
    Fajr,
    Sunrise,
    Dhuhr,
    Asr,
    Maghrib,
    Isha,
}

impl Anchor {
    /// Chronological order within a day.
    pub const ALL: [Anchor; 6] = [
        Anchor::Fajr,
        Anchor::Sunrise,
        Anchor::Dhuhr,
        Anchor::Asr,
        Anchor::Maghrib,
        Anchor::Isha,
    ];

    pub fn index(&self) -> usize {
        match self {
            Anchor::Fajr => 0,
            Anchor::Sunrise => 1,
            Anchor::Dhuhr => 2,
            Anchor::Asr => 3,
            Anchor::Maghrib => 4,
            Anchor::Isha => 5,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Anchor::Fajr => "fajr",
            Anchor::Sunrise => "sunrise",
            Anchor::Dhuhr => "dhuhr",
            Anchor::Asr => "asr",
            Anchor::Maghrib => "maghrib",
            Anchor::Isha => "isha",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Anchor::Fajr => "Fajr",
            Anchor::Sunrise => "Sunrise",
            Anchor::Dhuhr => "Dhuhr",
            Anchor::Asr => "Asr",
            Anchor::Maghrib => "Maghrib",
            Anchor::Isha => "Isha",
        }
    }
}

impl std::fmt::Display for Anchor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

impl FromStr for Anchor {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "fajr" => Ok(Anchor::Fajr),
            "sunrise" | "shuruq" => Ok(Anchor::Sunrise),
            "dhuhr" | "zuhr" | "dhuhur" => Ok(Anchor::Dhuhr),
            "asr" => Ok(Anchor::Asr),
            "maghrib" => Ok(Anchor::Maghrib),
            "isha" => Ok(Anchor::Isha),
            _ => Err(anyhow::anyhow!("Unknown anchor time: {}", s)),
        }
    }
}

/// The day's anchor times as `HH:MM` strings, already adjusted for the
/// calculation method and madhab by whoever produced them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnchorTimes {
    pub fajr: String,
    pub sunrise: String,
    pub dhuhr: String,
    pub asr: String,
    pub maghrib: String,
    pub isha: String,
}

impl AnchorTimes {
    pub fn new(
        fajr: impl Into<String>,
        sunrise: impl Into<String>,
        dhuhr: impl Into<String>,
        asr: impl Into<String>,
        maghrib: impl Into<String>,
        isha: impl Into<String>,
    ) -> Self {
        Self {
            fajr: fajr.into(),
            sunrise: sunrise.into(),
            dhuhr: dhuhr.into(),
            asr: asr.into(),
            maghrib: maghrib.into(),
            isha: isha.into(),
        }
    }

    pub fn get(&self, anchor: Anchor) -> &str {
        match anchor {
            Anchor::Fajr => &self.fajr,
            Anchor::Sunrise => &self.sunrise,
            Anchor::Dhuhr => &self.dhuhr,
            Anchor::Asr => &self.asr,
            Anchor::Maghrib => &self.maghrib,
            Anchor::Isha => &self.isha,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Anchor, &str)> {
        Anchor::ALL.into_iter().map(move |a| (a, self.get(a)))
    }

    pub fn parsed(&self, anchor: Anchor) -> Result<NaiveTime, ScheduleError> {
        let value = self.get(anchor);
        parse_hhmm(value).map_err(|_| ScheduleError::InvalidAnchorTime {
            anchor,
            value: value.to_string(),
        })
    }

    /// Parse all six anchors, indexed by `Anchor::index`.
    pub fn parse_all(&self) -> Result<[NaiveTime; 6], ScheduleError> {
        let mut times = [NaiveTime::MIN; 6];
        for anchor in Anchor::ALL {
            times[anchor.index()] = self.parsed(anchor)?;
        }
        Ok(times)
    }

    /// Verify fajr < sunrise < dhuhr < asr < maghrib < isha.
    pub fn check_order(&self) -> Result<(), ScheduleError> {
        let times = self.parse_all()?;
        for pair in Anchor::ALL.windows(2) {
            let (earlier, later) = (pair[0], pair[1]);
            if times[earlier.index()] >= times[later.index()] {
                return Err(ScheduleError::AnchorsOutOfOrder {
                    earlier,
                    earlier_time: self.get(earlier).to_string(),
                    later,
                    later_time: self.get(later).to_string(),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> AnchorTimes {
        AnchorTimes::new("04:40", "06:00", "12:28", "15:54", "18:48", "20:18")
    }

    #[test]
    fn test_anchor_from_str_aliases() {
        assert_eq!(Anchor::from_str("Zuhr").unwrap(), Anchor::Dhuhr);
        assert_eq!(Anchor::from_str("dhuhr").unwrap(), Anchor::Dhuhr);
        assert_eq!(Anchor::from_str("ISHA").unwrap(), Anchor::Isha);
        assert!(Anchor::from_str("tahajjud").is_err());
    }

    #[test]
    fn test_iter_follows_day_order() {
        let names: Vec<&str> = sample().iter().map(|(a, _)| a.as_str()).collect();
        assert_eq!(names, ["fajr", "sunrise", "dhuhr", "asr", "maghrib", "isha"]);
    }

    #[test]
    fn test_check_order_accepts_increasing() {
        assert!(sample().check_order().is_ok());
    }

    #[test]
    fn test_check_order_rejects_swapped() {
        let mut times = sample();
        times.asr = "12:00".to_string();
        let err = times.check_order().unwrap_err();
        assert_eq!(
            err,
            ScheduleError::AnchorsOutOfOrder {
                earlier: Anchor::Dhuhr,
                earlier_time: "12:28".to_string(),
                later: Anchor::Asr,
                later_time: "12:00".to_string(),
            }
        );
    }

    #[test]
    fn test_check_order_rejects_equal() {
        let mut times = sample();
        times.isha = times.maghrib.clone();
        assert!(matches!(
            times.check_order(),
            Err(ScheduleError::AnchorsOutOfOrder { later: Anchor::Isha, .. })
        ));
    }

    #[test]
    fn test_parsed_names_bad_anchor() {
        let mut times = sample();
        times.maghrib = "6:48".to_string();
        assert_eq!(
            times.parsed(Anchor::Maghrib).unwrap_err(),
            ScheduleError::InvalidAnchorTime {
                anchor: Anchor::Maghrib,
                value: "6:48".to_string(),
            }
        );
    }
}
