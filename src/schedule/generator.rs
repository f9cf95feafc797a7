use chrono::NaiveDate;

use crate::models::{
    Anchor, AnchorTimes, DailyPrayerSchedule, PrayerCategory, PrayerEvent, PrayerKind,
};
use crate::schedule::clock::{format_hhmm, shift};
use crate::schedule::ScheduleError;

/// Fixed metadata for one event; only the time varies between days.
pub(crate) struct EventRow {
    pub name: &'static str,
    pub display_name: &'static str,
    pub kind: PrayerKind,
    pub category: PrayerCategory,
    pub anchor: Anchor,
    pub offset_minutes: i32,
    pub rakats: u8,
    pub optional: bool,
    pub priority: u8,
    pub description: &'static str,
}

pub(crate) const EVENT_TABLE: [EventRow; 15] = [
    EventRow {
        name: "tahajjud",
        display_name: "Tahajjud",
        kind: PrayerKind::Nafl,
        category: PrayerCategory::Tahajjud,
        anchor: Anchor::Fajr,
        offset_minutes: -90,
        rakats: 8,
        optional: true,
        priority: 5,
        description: "Night prayer in the last third of the night",
    },
    EventRow {
        name: "fajr_sunnah",
        display_name: "Fajr Sunnah",
        kind: PrayerKind::Sunnah,
        category: PrayerCategory::BeforeFajr,
        anchor: Anchor::Fajr,
        offset_minutes: -15,
        rakats: 2,
        optional: false,
        priority: 2,
        description: "Emphasized sunnah before Fajr",
    },
    EventRow {
        name: "fajr_fard",
        display_name: "Fajr",
        kind: PrayerKind::Fard,
        category: PrayerCategory::Fajr,
        anchor: Anchor::Fajr,
        offset_minutes: 0,
        rakats: 2,
        optional: false,
        priority: 1,
        description: "Obligatory dawn prayer",
    },
    EventRow {
        name: "duha",
        display_name: "Duha",
        kind: PrayerKind::Nafl,
        category: PrayerCategory::Duha,
        anchor: Anchor::Sunrise,
        offset_minutes: 30,
        rakats: 2,
        optional: true,
        priority: 6,
        description: "Forenoon prayer once the sun has risen",
    },
    EventRow {
        name: "dhuhr_sunnah_before",
        display_name: "Dhuhr Sunnah (before)",
        kind: PrayerKind::Sunnah,
        category: PrayerCategory::BeforeDhuhr,
        anchor: Anchor::Dhuhr,
        offset_minutes: -15,
        rakats: 4,
        optional: false,
        priority: 3,
        description: "Emphasized sunnah before Dhuhr",
    },
    EventRow {
        name: "dhuhr_fard",
        display_name: "Dhuhr",
        kind: PrayerKind::Fard,
        category: PrayerCategory::Dhuhr,
        anchor: Anchor::Dhuhr,
        offset_minutes: 0,
        rakats: 4,
        optional: false,
        priority: 1,
        description: "Obligatory midday prayer",
    },
    EventRow {
        name: "dhuhr_sunnah_after",
        display_name: "Dhuhr Sunnah (after)",
        kind: PrayerKind::Sunnah,
        category: PrayerCategory::AfterDhuhr,
        anchor: Anchor::Dhuhr,
        offset_minutes: 10,
        rakats: 2,
        optional: false,
        priority: 3,
        description: "Emphasized sunnah after Dhuhr",
    },
    EventRow {
        name: "asr_sunnah_before",
        display_name: "Asr Sunnah",
        kind: PrayerKind::Sunnah,
        category: PrayerCategory::BeforeAsr,
        anchor: Anchor::Asr,
        offset_minutes: -15,
        rakats: 4,
        optional: true,
        priority: 7,
        description: "Non-emphasized sunnah before Asr",
    },
    EventRow {
        name: "asr_fard",
        display_name: "Asr",
        kind: PrayerKind::Fard,
        category: PrayerCategory::Asr,
        anchor: Anchor::Asr,
        offset_minutes: 0,
        rakats: 4,
        optional: false,
        priority: 1,
        description: "Obligatory afternoon prayer",
    },
    EventRow {
        name: "maghrib_fard",
        display_name: "Maghrib",
        kind: PrayerKind::Fard,
        category: PrayerCategory::Maghrib,
        anchor: Anchor::Maghrib,
        offset_minutes: 0,
        rakats: 3,
        optional: false,
        priority: 1,
        description: "Obligatory sunset prayer",
    },
    EventRow {
        name: "maghrib_sunnah_after",
        display_name: "Maghrib Sunnah",
        kind: PrayerKind::Sunnah,
        category: PrayerCategory::AfterMaghrib,
        anchor: Anchor::Maghrib,
        offset_minutes: 10,
        rakats: 2,
        optional: false,
        priority: 3,
        description: "Emphasized sunnah after Maghrib",
    },
    EventRow {
        name: "isha_sunnah_before",
        display_name: "Isha Sunnah (before)",
        kind: PrayerKind::Sunnah,
        category: PrayerCategory::BeforeIsha,
        anchor: Anchor::Isha,
        offset_minutes: -15,
        rakats: 4,
        optional: true,
        priority: 7,
        description: "Non-emphasized sunnah before Isha",
    },
    EventRow {
        name: "isha_fard",
        display_name: "Isha",
        kind: PrayerKind::Fard,
        category: PrayerCategory::Isha,
        anchor: Anchor::Isha,
        offset_minutes: 0,
        rakats: 4,
        optional: false,
        priority: 1,
        description: "Obligatory night prayer",
    },
    EventRow {
        name: "isha_sunnah_after",
        display_name: "Isha Sunnah (after)",
        kind: PrayerKind::Sunnah,
        category: PrayerCategory::AfterIsha,
        anchor: Anchor::Isha,
        offset_minutes: 10,
        rakats: 2,
        optional: false,
        priority: 3,
        description: "Emphasized sunnah after Isha",
    },
    EventRow {
        name: "witr",
        display_name: "Witr",
        kind: PrayerKind::Witr,
        category: PrayerCategory::Witr,
        anchor: Anchor::Isha,
        offset_minutes: 30,
        rakats: 3,
        optional: false,
        priority: 2,
        description: "Odd-numbered prayer closing the night",
    },
];

/// Derive the day's fifteen prayer events from its anchor times.
///
/// Every anchor is parsed up front, so a malformed anchor fails the whole
/// call and no partial schedule is ever returned. Events are sorted by their
/// `HH:MM` time; table order breaks ties. Offsets that cross midnight wrap
/// to the neighbouring day's clock and are flagged through `day_offset`.
pub fn generate_schedule(
    date: NaiveDate,
    anchors: &AnchorTimes,
) -> Result<DailyPrayerSchedule, ScheduleError> {
    let times = anchors.parse_all()?;

    let mut events: Vec<PrayerEvent> = EVENT_TABLE
        .iter()
        .map(|row| {
            let (time, carry) = shift(times[row.anchor.index()], row.offset_minutes);
            PrayerEvent {
                name: row.name.to_string(),
                display_name: row.display_name.to_string(),
                kind: row.kind,
                category: row.category,
                time: format_hhmm(time),
                rakats: row.rakats,
                description: row.description.to_string(),
                is_optional: row.optional,
                priority: row.priority,
                day_offset: carry as i8,
            }
        })
        .collect();
    events.sort_by(|a, b| a.time.cmp(&b.time));

    let schedule = DailyPrayerSchedule::new(date, events, anchors.clone());
    for event in schedule.wrapped_events() {
        log::warn!(
            "{} on {} wraps past midnight to {} (day offset {})",
            event.name,
            date,
            event.time,
            event.day_offset
        );
    }
    log::debug!("Generated {} prayer events for {}", schedule.events().len(), date);
    Ok(schedule)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
    }

    fn literal_anchors() -> AnchorTimes {
        AnchorTimes::new("04:40", "06:00", "12:28", "15:54", "18:48", "20:18")
    }

    fn time_of<'a>(schedule: &'a DailyPrayerSchedule, name: &str) -> &'a str {
        &schedule.event(name).unwrap().time
    }

    #[test]
    fn test_always_fifteen_unique_events() {
        for anchors in [
            literal_anchors(),
            AnchorTimes::new("05:55", "07:20", "12:05", "14:30", "16:50", "18:15"),
            AnchorTimes::new("02:45", "04:30", "13:10", "17:35", "21:40", "23:20"),
        ] {
            let schedule = generate_schedule(date(), &anchors).unwrap();
            assert_eq!(schedule.events().len(), 15);
            let names: HashSet<&str> = schedule.events().iter().map(|e| e.name.as_str()).collect();
            assert_eq!(names.len(), 15);
        }
    }

    #[test]
    fn test_metadata_is_fixed_per_name() {
        let a = generate_schedule(date(), &literal_anchors()).unwrap();
        let b = generate_schedule(
            date(),
            &AnchorTimes::new("05:55", "07:20", "12:05", "14:30", "16:50", "18:15"),
        )
        .unwrap();

        for row in EVENT_TABLE.iter() {
            for schedule in [&a, &b] {
                let e = schedule.event(row.name).unwrap();
                assert_eq!(e.kind, row.kind, "{}", row.name);
                assert_eq!(e.category, row.category, "{}", row.name);
                assert_eq!(e.rakats, row.rakats, "{}", row.name);
                assert_eq!(e.is_optional, row.optional, "{}", row.name);
                assert_eq!(e.priority, row.priority, "{}", row.name);
            }
        }
    }

    #[test]
    fn test_table_shape() {
        let fard: Vec<&str> = EVENT_TABLE
            .iter()
            .filter(|r| r.kind == PrayerKind::Fard)
            .map(|r| r.name)
            .collect();
        assert_eq!(fard, ["fajr_fard", "dhuhr_fard", "asr_fard", "maghrib_fard", "isha_fard"]);
        assert!(EVENT_TABLE
            .iter()
            .filter(|r| r.kind == PrayerKind::Fard)
            .all(|r| r.priority == 1 && r.offset_minutes == 0 && !r.optional));
        assert!(EVENT_TABLE.iter().all(|r| (1..=7).contains(&r.priority)));

        let categories: HashSet<PrayerCategory> = EVENT_TABLE.iter().map(|r| r.category).collect();
        assert_eq!(categories.len(), PrayerCategory::ALL.len());
    }

    #[test]
    fn test_fajr_offsets() {
        let schedule = generate_schedule(date(), &literal_anchors()).unwrap();
        assert_eq!(time_of(&schedule, "fajr_sunnah"), "04:25");
        assert_eq!(time_of(&schedule, "fajr_fard"), "04:40");
    }

    #[test]
    fn test_literal_day_is_fully_ordered() {
        let schedule = generate_schedule(date(), &literal_anchors()).unwrap();
        let order: Vec<(&str, &str)> = schedule
            .events()
            .iter()
            .map(|e| (e.name.as_str(), e.time.as_str()))
            .collect();
        assert_eq!(
            order,
            [
                ("tahajjud", "03:10"),
                ("fajr_sunnah", "04:25"),
                ("fajr_fard", "04:40"),
                ("duha", "06:30"),
                ("dhuhr_sunnah_before", "12:13"),
                ("dhuhr_fard", "12:28"),
                ("dhuhr_sunnah_after", "12:38"),
                ("asr_sunnah_before", "15:39"),
                ("asr_fard", "15:54"),
                ("maghrib_fard", "18:48"),
                ("maghrib_sunnah_after", "18:58"),
                ("isha_sunnah_before", "20:03"),
                ("isha_fard", "20:18"),
                ("isha_sunnah_after", "20:28"),
                ("witr", "20:48"),
            ]
        );
        assert!(schedule.events().windows(2).all(|w| w[0].time <= w[1].time));
        assert!(schedule.is_chronological());
        assert_eq!(schedule.wrapped_events().count(), 0);
    }

    #[test]
    fn test_generation_is_idempotent() {
        let first = generate_schedule(date(), &literal_anchors()).unwrap();
        let second = generate_schedule(date(), &literal_anchors()).unwrap();
        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    /// Tahajjud before a 00:20 Fajr lands on the previous day's clock. It is
    /// kept, flagged with day offset -1, and sorts last, which breaks the
    /// liturgical order of the list. Expected, but not desirable.
    #[test]
    fn test_midnight_wrap_breaks_ordering() {
        let anchors = AnchorTimes::new("00:20", "02:10", "12:28", "15:54", "18:48", "20:18");
        let schedule = generate_schedule(date(), &anchors).unwrap();

        let tahajjud = schedule.event("tahajjud").unwrap();
        assert_eq!(tahajjud.time, "22:50");
        assert_eq!(tahajjud.day_offset, -1);
        assert_eq!(schedule.events().len(), 15);

        assert!(!schedule.is_chronological());
        let wrapped: Vec<&str> = schedule.wrapped_events().map(|e| e.name.as_str()).collect();
        assert_eq!(wrapped, ["tahajjud"]);

        // Liturgically tahajjud comes first; after the sort it is last.
        assert_eq!(schedule.events().first().unwrap().name, "fajr_sunnah");
        assert_eq!(schedule.events().last().unwrap().name, "tahajjud");
        let tahajjud_pos = schedule.events().iter().position(|e| e.name == "tahajjud").unwrap();
        let fajr_pos = schedule.events().iter().position(|e| e.name == "fajr_fard").unwrap();
        assert!(tahajjud_pos > fajr_pos);
    }

    #[test]
    fn test_late_isha_wraps_forward() {
        let anchors = AnchorTimes::new("03:30", "05:00", "13:00", "17:20", "22:10", "23:40");
        let schedule = generate_schedule(date(), &anchors).unwrap();
        let witr = schedule.event("witr").unwrap();
        assert_eq!(witr.time, "00:10");
        assert_eq!(witr.day_offset, 1);
        assert_eq!(schedule.events().first().unwrap().name, "witr");
    }

    #[test]
    fn test_inputs_are_untouched() {
        let anchors = literal_anchors();
        let before = anchors.clone();
        let schedule = generate_schedule(date(), &anchors).unwrap();
        assert_eq!(anchors, before);
        assert_eq!(schedule.anchors(), &before);
        assert_eq!(schedule.date(), date());
    }

    #[test]
    fn test_malformed_anchor_fails_whole_call() {
        for (anchor, bad) in [
            (Anchor::Fajr, "4:40"),
            (Anchor::Sunrise, "24:00"),
            (Anchor::Asr, "15:60"),
            (Anchor::Maghrib, ""),
            (Anchor::Isha, "ab:cd"),
        ] {
            let mut anchors = literal_anchors();
            match anchor {
                Anchor::Fajr => anchors.fajr = bad.to_string(),
                Anchor::Sunrise => anchors.sunrise = bad.to_string(),
                Anchor::Dhuhr => anchors.dhuhr = bad.to_string(),
                Anchor::Asr => anchors.asr = bad.to_string(),
                Anchor::Maghrib => anchors.maghrib = bad.to_string(),
                Anchor::Isha => anchors.isha = bad.to_string(),
            }
            assert_eq!(
                generate_schedule(date(), &anchors).unwrap_err(),
                ScheduleError::InvalidAnchorTime {
                    anchor,
                    value: bad.to_string(),
                }
            );
        }
    }

    #[test]
    fn test_out_of_order_anchors_still_generate() {
        let anchors = AnchorTimes::new("04:40", "06:00", "15:54", "12:28", "18:48", "20:18");
        assert!(anchors.check_order().is_err());
        let schedule = generate_schedule(date(), &anchors).unwrap();
        assert_eq!(schedule.events().len(), 15);
    }

    #[test]
    fn test_next_event() {
        let schedule = generate_schedule(date(), &literal_anchors()).unwrap();
        let at = |s: &str| date().and_time(crate::schedule::clock::parse_hhmm(s).unwrap());
        let name = |now: &str, optional: bool| {
            schedule.next_event(at(now), optional).map(|(e, _)| e.name.clone())
        };

        assert_eq!(name("04:30", true).as_deref(), Some("fajr_fard"));
        assert_eq!(name("04:40", true).as_deref(), Some("duha"));
        assert_eq!(name("04:40", false).as_deref(), Some("dhuhr_sunnah_before"));
        assert_eq!(name("21:00", true), None);
    }

    #[test]
    fn test_next_event_places_wrapped_events_on_their_day() {
        let anchors = AnchorTimes::new("03:30", "05:00", "13:00", "17:20", "22:10", "23:40");
        let schedule = generate_schedule(date(), &anchors).unwrap();
        let now = date().and_time(crate::schedule::clock::parse_hhmm("23:55").unwrap());

        let (event, at) = schedule.next_event(now, true).unwrap();
        assert_eq!(event.name, "witr");
        assert_eq!(at.date(), date().succ_opt().unwrap());
        assert_eq!(at.time(), crate::schedule::clock::parse_hhmm("00:10").unwrap());
    }

    #[test]
    fn test_required_events() {
        let schedule = generate_schedule(date(), &literal_anchors()).unwrap();
        let optional: Vec<&str> = schedule
            .events()
            .iter()
            .filter(|e| e.is_optional)
            .map(|e| e.name.as_str())
            .collect();
        assert_eq!(
            optional,
            ["tahajjud", "duha", "asr_sunnah_before", "isha_sunnah_before"]
        );
        assert_eq!(schedule.required_events().count(), 11);
    }
}
