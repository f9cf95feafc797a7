use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::models::AnchorTimes;
use crate::schedule::clock::parse_hhmm;

/// Obligation class of a prayer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrayerKind {
    Fard,
    Sunnah,
    Nafl,
    Witr,
}

impl PrayerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PrayerKind::Fard => "fard",
            PrayerKind::Sunnah => "sunnah",
            PrayerKind::Nafl => "nafl",
            PrayerKind::Witr => "witr",
        }
    }
}

impl FromStr for PrayerKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fard" => Ok(PrayerKind::Fard),
            "sunnah" => Ok(PrayerKind::Sunnah),
            "nafl" => Ok(PrayerKind::Nafl),
            "witr" => Ok(PrayerKind::Witr),
            _ => Err(anyhow::anyhow!("Unknown prayer kind: {}", s)),
        }
    }
}

/// Position of an event in the liturgical day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrayerCategory {
    Tahajjud,
    BeforeFajr,
    Fajr,
    Duha,
    BeforeDhuhr,
    Dhuhr,
    AfterDhuhr,
    BeforeAsr,
    Asr,
    Maghrib,
    AfterMaghrib,
    BeforeIsha,
    Isha,
    AfterIsha,
    Witr,
}

impl PrayerCategory {
    pub const ALL: [PrayerCategory; 15] = [
        PrayerCategory::Tahajjud,
        PrayerCategory::BeforeFajr,
        PrayerCategory::Fajr,
        PrayerCategory::Duha,
        PrayerCategory::BeforeDhuhr,
        PrayerCategory::Dhuhr,
        PrayerCategory::AfterDhuhr,
        PrayerCategory::BeforeAsr,
        PrayerCategory::Asr,
        PrayerCategory::Maghrib,
        PrayerCategory::AfterMaghrib,
        PrayerCategory::BeforeIsha,
        PrayerCategory::Isha,
        PrayerCategory::AfterIsha,
        PrayerCategory::Witr,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PrayerCategory::Tahajjud => "tahajjud",
            PrayerCategory::BeforeFajr => "before_fajr",
            PrayerCategory::Fajr => "fajr",
            PrayerCategory::Duha => "duha",
            PrayerCategory::BeforeDhuhr => "before_dhuhr",
            PrayerCategory::Dhuhr => "dhuhr",
            PrayerCategory::AfterDhuhr => "after_dhuhr",
            PrayerCategory::BeforeAsr => "before_asr",
            PrayerCategory::Asr => "asr",
            PrayerCategory::Maghrib => "maghrib",
            PrayerCategory::AfterMaghrib => "after_maghrib",
            PrayerCategory::BeforeIsha => "before_isha",
            PrayerCategory::Isha => "isha",
            PrayerCategory::AfterIsha => "after_isha",
            PrayerCategory::Witr => "witr",
        }
    }
}

impl FromStr for PrayerCategory {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PrayerCategory::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| anyhow::anyhow!("Unknown prayer category: {}", s))
    }
}

/// One unit of worship placed on the day's timeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrayerEvent {
    pub name: String,
    pub display_name: String,
    #[serde(rename = "type")]
    pub kind: PrayerKind,
    pub category: PrayerCategory,
    pub time: String,
    pub rakats: u8,
    pub description: String,
    pub is_optional: bool,
    /// 1 is obligatory, 7 fully optional.
    pub priority: u8,
    /// -1 when the offset pushed the time onto the previous day's clock.
    pub day_offset: i8,
}

impl PrayerEvent {
    pub fn clock_time(&self) -> Option<NaiveTime> {
        parse_hhmm(&self.time).ok()
    }
}

/// A generated day. Built fresh by the generator and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyPrayerSchedule {
    date: NaiveDate,
    events: Vec<PrayerEvent>,
    anchors: AnchorTimes,
}

impl DailyPrayerSchedule {
    pub(crate) fn new(date: NaiveDate, events: Vec<PrayerEvent>, anchors: AnchorTimes) -> Self {
        Self {
            date,
            events,
            anchors,
        }
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn events(&self) -> &[PrayerEvent] {
        &self.events
    }

    pub fn anchors(&self) -> &AnchorTimes {
        &self.anchors
    }

    pub fn event(&self, name: &str) -> Option<&PrayerEvent> {
        self.events.iter().find(|e| e.name == name)
    }

    /// False when some offset crossed midnight, in which case the
    /// time-sorted list no longer follows the liturgical order.
    pub fn is_chronological(&self) -> bool {
        self.events.iter().all(|e| e.day_offset == 0)
    }

    pub fn wrapped_events(&self) -> impl Iterator<Item = &PrayerEvent> {
        self.events.iter().filter(|e| e.day_offset != 0)
    }

    pub fn required_events(&self) -> impl Iterator<Item = &PrayerEvent> {
        self.events.iter().filter(|e| !e.is_optional)
    }

    /// Each event with the moment it actually falls on. Wrapped events land
    /// on the neighbouring calendar day.
    pub fn occurrences(&self) -> impl Iterator<Item = (&PrayerEvent, NaiveDateTime)> {
        self.events.iter().filter_map(move |e| {
            let time = e.clock_time()?;
            let day = self
                .date
                .checked_add_signed(Duration::days(i64::from(e.day_offset)))?;
            Some((e, day.and_time(time)))
        })
    }

    /// Earliest event strictly after `now`.
    pub fn next_event(
        &self,
        now: NaiveDateTime,
        include_optional: bool,
    ) -> Option<(&PrayerEvent, NaiveDateTime)> {
        self.occurrences()
            .filter(|(e, at)| *at > now && (include_optional || !e.is_optional))
            .min_by_key(|(_, at)| *at)
    }
}

/// A persisted event with the user's progress on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredEvent {
    #[serde(flatten)]
    pub event: PrayerEvent,
    pub completed: bool,
    /// The user moved the event away from its generated time.
    pub moved: bool,
}
