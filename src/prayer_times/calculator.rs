use anyhow::{anyhow, Result};
use chrono::{Duration, FixedOffset, NaiveDate, NaiveDateTime};
use rusqlite::Connection;
use salah::prelude::{Configuration, Coordinates, Madhab, Method, Prayer, PrayerSchedule};

use crate::config::AppConfig;
use crate::db::repository::CacheRepo;
use crate::models::{AnchorTimes, DailyPrayerSchedule, PrayerEvent};
use crate::schedule::clock::format_hhmm;
use crate::schedule::{generate_schedule, ScheduleError};

/// Anything that can supply a day's six anchor times.
pub trait AnchorSource {
    fn anchors_for(&self, date: NaiveDate) -> Result<AnchorTimes, ScheduleError>;
}

/// Offline astronomical anchors from the `salah` crate, shifted to a fixed
/// UTC offset.
pub struct SalahSource {
    pub lat: f64,
    pub lng: f64,
    pub method_str: String,
    pub madhab_str: String,
    pub tz_offset_minutes: i32,
}

impl SalahSource {
    pub fn new(
        lat: f64,
        lng: f64,
        method: &str,
        madhab: &str,
        tz_offset_minutes: i32,
    ) -> Result<Self> {
        // Validate everything the calculation will need up front
        parse_method(method)?;
        parse_madhab(madhab)?;
        if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lng) {
            return Err(anyhow!("Invalid coordinates: {}, {}", lat, lng));
        }
        FixedOffset::east_opt(tz_offset_minutes * 60)
            .ok_or_else(|| anyhow!("Invalid timezone offset: {} minutes", tz_offset_minutes))?;
        Ok(Self {
            lat,
            lng,
            method_str: method.to_string(),
            madhab_str: madhab.to_string(),
            tz_offset_minutes,
        })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self> {
        Self::new(
            config.location.latitude,
            config.location.longitude,
            &config.calculation.method,
            &config.calculation.madhab,
            config.location.timezone_offset,
        )
    }

    fn compute(&self, date: NaiveDate) -> Result<AnchorTimes> {
        let coords = Coordinates::new(self.lat, self.lng);
        let params = Configuration::with(parse_method(&self.method_str)?, parse_madhab(&self.madhab_str)?);

        let times = PrayerSchedule::new()
            .on(date)
            .for_location(coords)
            .with_configuration(params)
            .calculate()
            .map_err(|e| anyhow!("Prayer calculation failed: {}", e))?;

        let offset = FixedOffset::east_opt(self.tz_offset_minutes * 60)
            .ok_or_else(|| anyhow!("Invalid timezone offset: {}", self.tz_offset_minutes))?;

        let local = |prayer: Prayer| -> String {
            format_hhmm(times.time(prayer).with_timezone(&offset).time())
        };

        Ok(AnchorTimes {
            fajr: local(Prayer::Fajr),
            sunrise: local(Prayer::Sunrise),
            dhuhr: local(Prayer::Dhuhr),
            asr: local(Prayer::Asr),
            maghrib: local(Prayer::Maghrib),
            isha: local(Prayer::Isha),
        })
    }
}

impl AnchorSource for SalahSource {
    fn anchors_for(&self, date: NaiveDate) -> Result<AnchorTimes, ScheduleError> {
        self.compute(date)
            .map_err(|e| ScheduleError::UpstreamUnavailable {
                date,
                reason: e.to_string(),
            })
    }
}

/// Anchors for `date` from the cache, falling back to `source` and caching
/// what it returns.
pub fn cached_or_fetch(
    conn: &Connection,
    source: &dyn AnchorSource,
    date: NaiveDate,
) -> Result<AnchorTimes> {
    if let Some(cached) = CacheRepo::get(conn, date)? {
        log::debug!("Anchor cache hit for {}", date);
        return Ok(cached);
    }

    log::debug!("Anchor cache miss for {}", date);
    let times = source.anchors_for(date)?;
    CacheRepo::store(conn, date, &times)?;
    Ok(times)
}

/// Fill the cache for `start` through `days_ahead` days later. Stops at the
/// first date the source cannot provide.
pub fn ensure_cached(
    conn: &Connection,
    source: &dyn AnchorSource,
    start: NaiveDate,
    days_ahead: u32,
) -> Result<()> {
    for i in 0..=(days_ahead as i64) {
        cached_or_fetch(conn, source, start + Duration::days(i))?;
    }
    Ok(())
}

/// Build the schedule for `date` from cached or freshly fetched anchors.
/// With `strict_order` the anchors must be increasing through the day.
pub fn schedule_for(
    conn: &Connection,
    source: &dyn AnchorSource,
    date: NaiveDate,
    strict_order: bool,
) -> Result<DailyPrayerSchedule> {
    let anchors = cached_or_fetch(conn, source, date)?;
    if strict_order {
        anchors.check_order()?;
    }
    Ok(generate_schedule(date, &anchors)?)
}

/// The next upcoming event after `now` and the seconds until it. Events
/// that wrapped past midnight count on the day they actually fall, so the
/// neighbouring days' schedules are searched too.
pub fn next_event(
    conn: &Connection,
    source: &dyn AnchorSource,
    now: NaiveDateTime,
    include_optional: bool,
) -> Result<Option<(PrayerEvent, i64)>> {
    let today = now.date();
    let mut best: Option<(PrayerEvent, NaiveDateTime)> = None;

    for date in [today.pred_opt(), Some(today), today.succ_opt()].into_iter().flatten() {
        let schedule = schedule_for(conn, source, date, false)?;
        if let Some((event, at)) = schedule.next_event(now, include_optional) {
            if best.as_ref().is_none_or(|(_, earliest)| at < *earliest) {
                best = Some((event.clone(), at));
            }
        }
    }

    Ok(best.map(|(event, at)| (event, (at - now).num_seconds())))
}

fn parse_method(s: &str) -> Result<Method> {
    match s {
        "MuslimWorldLeague" => Ok(Method::MuslimWorldLeague),
        "Egyptian" => Ok(Method::Egyptian),
        "Karachi" => Ok(Method::Karachi),
        "UmmAlQura" => Ok(Method::UmmAlQura),
        "Dubai" => Ok(Method::Dubai),
        "MoonsightingCommittee" => Ok(Method::MoonsightingCommittee),
        "NorthAmerica" => Ok(Method::NorthAmerica),
        "Kuwait" => Ok(Method::Kuwait),
        "Qatar" => Ok(Method::Qatar),
        "Singapore" => Ok(Method::Singapore),
        "Tehran" => Ok(Method::Tehran),
        "Turkey" => Ok(Method::Turkey),
        "Other" => Ok(Method::Other),
        _ => Err(anyhow!(
            "Unknown calculation method: '{}'. Use one of: {}",
            s,
            CALC_METHODS.join(", ")
        )),
    }
}

fn parse_madhab(s: &str) -> Result<Madhab> {
    match s {
        "Hanafi" => Ok(Madhab::Hanafi),
        "Shafi" | "Shafi'i" => Ok(Madhab::Shafi),
        _ => Err(anyhow!("Unknown madhab: '{}'", s)),
    }
}

pub const CALC_METHODS: &[&str] = &[
    "MuslimWorldLeague",
    "Egyptian",
    "Karachi",
    "UmmAlQura",
    "Dubai",
    "MoonsightingCommittee",
    "NorthAmerica",
    "Kuwait",
    "Qatar",
    "Singapore",
    "Tehran",
    "Turkey",
    "Other",
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrations::run_migrations;
    use chrono::NaiveTime;
    use std::cell::Cell;

    struct FixedSource {
        times: AnchorTimes,
        calls: Cell<u32>,
    }

    impl FixedSource {
        fn new(times: AnchorTimes) -> Self {
            Self {
                times,
                calls: Cell::new(0),
            }
        }
    }

    impl AnchorSource for FixedSource {
        fn anchors_for(&self, _date: NaiveDate) -> Result<AnchorTimes, ScheduleError> {
            self.calls.set(self.calls.get() + 1);
            Ok(self.times.clone())
        }
    }

    struct DownSource;

    impl AnchorSource for DownSource {
        fn anchors_for(&self, date: NaiveDate) -> Result<AnchorTimes, ScheduleError> {
            Err(ScheduleError::UpstreamUnavailable {
                date,
                reason: "network unreachable".to_string(),
            })
        }
    }

    fn setup() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        conn
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
    }

    fn literal() -> AnchorTimes {
        AnchorTimes::new("04:40", "06:00", "12:28", "15:54", "18:48", "20:18")
    }

    #[test]
    fn test_cache_spares_the_source() {
        let conn = setup();
        let source = FixedSource::new(literal());
        assert_eq!(cached_or_fetch(&conn, &source, day()).unwrap(), literal());
        assert_eq!(cached_or_fetch(&conn, &source, day()).unwrap(), literal());
        assert_eq!(source.calls.get(), 1);

        ensure_cached(&conn, &source, day(), 3).unwrap();
        assert_eq!(source.calls.get(), 4);
    }

    #[test]
    fn test_upstream_failure_propagates() {
        let conn = setup();
        let err = cached_or_fetch(&conn, &DownSource, day()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ScheduleError>(),
            Some(ScheduleError::UpstreamUnavailable { .. })
        ));
        assert!(CacheRepo::get(&conn, day()).unwrap().is_none());

        // a cached day still works without the source
        CacheRepo::store(&conn, day(), &literal()).unwrap();
        assert!(schedule_for(&conn, &DownSource, day(), true).is_ok());
    }

    #[test]
    fn test_strict_order_rejects_bad_anchors() {
        let conn = setup();
        let source = FixedSource::new(AnchorTimes::new(
            "04:40", "06:00", "15:54", "12:28", "18:48", "20:18",
        ));
        let err = schedule_for(&conn, &source, day(), true).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ScheduleError>(),
            Some(ScheduleError::AnchorsOutOfOrder { .. })
        ));
        assert!(schedule_for(&conn, &source, day(), false).is_ok());
    }

    #[test]
    fn test_next_event_today_and_tomorrow() {
        let conn = setup();
        let source = FixedSource::new(literal());

        let now = day().and_time(NaiveTime::from_hms_opt(12, 0, 0).unwrap());
        let (event, secs) = next_event(&conn, &source, now, true).unwrap().unwrap();
        assert_eq!(event.name, "dhuhr_sunnah_before");
        assert_eq!(secs, 13 * 60);

        let late = day().and_time(NaiveTime::from_hms_opt(22, 0, 0).unwrap());
        let (event, secs) = next_event(&conn, &source, late, true).unwrap().unwrap();
        assert_eq!(event.name, "tahajjud");
        assert_eq!(secs, (2 * 60 + 3 * 60 + 10) * 60);

        let (event, _) = next_event(&conn, &source, late, false).unwrap().unwrap();
        assert_eq!(event.name, "fajr_sunnah");
    }

    #[test]
    fn test_next_event_after_midnight_witr() {
        let conn = setup();
        let source = FixedSource::new(AnchorTimes::new(
            "03:30", "05:00", "13:00", "17:20", "22:10", "23:40",
        ));
        let now = day().and_time(NaiveTime::from_hms_opt(23, 55, 0).unwrap());
        let (event, secs) = next_event(&conn, &source, now, true).unwrap().unwrap();
        assert_eq!(event.name, "witr");
        assert_eq!(event.day_offset, 1);
        assert_eq!(secs, 15 * 60);

        // still found from the next day, before its own events start
        let early = now + Duration::minutes(10);
        let (event, secs) = next_event(&conn, &source, early, true).unwrap().unwrap();
        assert_eq!(event.name, "witr");
        assert_eq!(secs, 5 * 60);
    }

    #[test]
    fn test_next_event_previous_night_tahajjud() {
        let conn = setup();
        let source = FixedSource::new(AnchorTimes::new(
            "00:20", "02:10", "12:28", "15:54", "18:48", "20:18",
        ));
        let now = day().and_time(NaiveTime::from_hms_opt(22, 0, 0).unwrap());
        let (event, secs) = next_event(&conn, &source, now, true).unwrap().unwrap();
        assert_eq!(event.name, "tahajjud");
        assert_eq!(event.time, "22:50");
        assert_eq!(event.day_offset, -1);
        assert_eq!(secs, 50 * 60);
    }

    #[test]
    fn test_salah_source_validates_settings() {
        assert!(SalahSource::new(33.69, 73.06, "MuslimWorldLeague", "Hanafi", 300).is_ok());
        assert!(SalahSource::new(33.69, 73.06, "Mars", "Hanafi", 300).is_err());
        assert!(SalahSource::new(33.69, 73.06, "Karachi", "Maliki", 300).is_err());
        assert!(SalahSource::new(133.0, 73.06, "Karachi", "Hanafi", 300).is_err());
        assert!(SalahSource::new(33.69, 73.06, "Karachi", "Hanafi", 24 * 60).is_err());
    }

    #[test]
    fn test_salah_source_yields_ordered_anchors() {
        let source = SalahSource::new(33.6938, 73.0651, "Karachi", "Hanafi", 300).unwrap();
        let anchors = source.anchors_for(day()).unwrap();
        anchors.check_order().unwrap();
        let schedule = generate_schedule(day(), &anchors).unwrap();
        assert_eq!(schedule.events().len(), 15);
    }
}
