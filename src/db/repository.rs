use anyhow::{anyhow, Result};
use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension};
use std::str::FromStr;

use crate::models::{
    AdhkarItem, AdhkarProgress, AdhkarSession, AnchorTimes, DailyPrayerSchedule, DhikrKind,
    PrayerCategory, PrayerEvent, PrayerKind, StoredEvent,
};
use crate::schedule::clock::{format_hhmm, parse_hhmm};

fn day_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

// ─── Cached anchor times ─────────────────────────────────────────────────────

pub struct CacheRepo;

impl CacheRepo {
    pub fn get(conn: &Connection, date: NaiveDate) -> Result<Option<AnchorTimes>> {
        conn.query_row(
            "SELECT fajr, sunrise, dhuhr, asr, maghrib, isha FROM prayer_times_cache WHERE date = ?1",
            params![day_key(date)],
            |row| {
                Ok(AnchorTimes {
                    fajr: row.get(0)?,
                    sunrise: row.get(1)?,
                    dhuhr: row.get(2)?,
                    asr: row.get(3)?,
                    maghrib: row.get(4)?,
                    isha: row.get(5)?,
                })
            },
        )
        .optional()
        .map_err(anyhow::Error::from)
    }

    pub fn store(conn: &Connection, date: NaiveDate, times: &AnchorTimes) -> Result<()> {
        conn.execute(
            "INSERT OR REPLACE INTO prayer_times_cache (date, fajr, sunrise, dhuhr, asr, maghrib, isha)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                day_key(date),
                times.fajr,
                times.sunrise,
                times.dhuhr,
                times.asr,
                times.maghrib,
                times.isha,
            ],
        )?;
        Ok(())
    }

    pub fn clear_all(conn: &Connection) -> Result<()> {
        conn.execute("DELETE FROM prayer_times_cache", [])?;
        Ok(())
    }
}

// ─── Stored schedules ────────────────────────────────────────────────────────

struct EventRecord {
    name: String,
    display_name: String,
    kind: String,
    category: String,
    time: String,
    rakats: u8,
    description: String,
    is_optional: bool,
    priority: u8,
    day_offset: i8,
    completed: bool,
    moved: bool,
}

impl EventRecord {
    fn into_stored(self) -> Result<StoredEvent> {
        Ok(StoredEvent {
            event: PrayerEvent {
                kind: PrayerKind::from_str(&self.kind)?,
                category: PrayerCategory::from_str(&self.category)?,
                name: self.name,
                display_name: self.display_name,
                time: self.time,
                rakats: self.rakats,
                description: self.description,
                is_optional: self.is_optional,
                priority: self.priority,
                day_offset: self.day_offset,
            },
            completed: self.completed,
            moved: self.moved,
        })
    }
}

pub struct ScheduleRepo;

impl ScheduleRepo {
    /// Replace whatever is stored for the schedule's date.
    pub fn store(conn: &Connection, schedule: &DailyPrayerSchedule) -> Result<()> {
        let date = day_key(schedule.date());
        let tx = conn.unchecked_transaction()?;
        tx.execute("DELETE FROM schedule_events WHERE date = ?1", params![date])?;
        for (position, e) in schedule.events().iter().enumerate() {
            tx.execute(
                "INSERT INTO schedule_events
                    (date, name, display_name, kind, category, time, rakats, description,
                     is_optional, priority, day_offset, position)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
                params![
                    date,
                    e.name,
                    e.display_name,
                    e.kind.as_str(),
                    e.category.as_str(),
                    e.time,
                    e.rakats,
                    e.description,
                    e.is_optional,
                    e.priority,
                    e.day_offset,
                    position as i64,
                ],
            )?;
        }
        tx.commit()?;
        log::info!("Stored {} events for {}", schedule.events().len(), date);
        Ok(())
    }

    /// Store only when nothing is stored for the date yet, keeping the
    /// user's progress. Returns whether anything was written.
    pub fn store_if_absent(conn: &Connection, schedule: &DailyPrayerSchedule) -> Result<bool> {
        if Self::exists(conn, schedule.date())? {
            return Ok(false);
        }
        Self::store(conn, schedule)?;
        Ok(true)
    }

    pub fn exists(conn: &Connection, date: NaiveDate) -> Result<bool> {
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM schedule_events WHERE date = ?1",
            params![day_key(date)],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Stored events ordered by time, generated order breaking ties.
    pub fn load(conn: &Connection, date: NaiveDate) -> Result<Vec<StoredEvent>> {
        let mut stmt = conn.prepare(
            "SELECT name, display_name, kind, category, time, rakats, description,
                    is_optional, priority, day_offset, completed, moved
             FROM schedule_events WHERE date = ?1
             ORDER BY time, position",
        )?;

        let rows = stmt.query_map(params![day_key(date)], |row| {
            Ok(EventRecord {
                name: row.get(0)?,
                display_name: row.get(1)?,
                kind: row.get(2)?,
                category: row.get(3)?,
                time: row.get(4)?,
                rakats: row.get(5)?,
                description: row.get(6)?,
                is_optional: row.get(7)?,
                priority: row.get(8)?,
                day_offset: row.get(9)?,
                completed: row.get(10)?,
                moved: row.get(11)?,
            })
        })?;

        let mut result = Vec::new();
        for r in rows {
            result.push(r?.into_stored()?);
        }
        Ok(result)
    }

    /// Returns false when no such event is stored for the date.
    pub fn set_completed(
        conn: &Connection,
        date: NaiveDate,
        name: &str,
        completed: bool,
    ) -> Result<bool> {
        let changed = conn.execute(
            "UPDATE schedule_events SET completed = ?1 WHERE date = ?2 AND name = ?3",
            params![completed, day_key(date), name],
        )?;
        Ok(changed > 0)
    }

    /// Move an event to a new clock time on the same day.
    pub fn move_event(conn: &Connection, date: NaiveDate, name: &str, time: &str) -> Result<bool> {
        let time = format_hhmm(parse_hhmm(time)?);
        let changed = conn.execute(
            "UPDATE schedule_events SET time = ?1, moved = 1, day_offset = 0
             WHERE date = ?2 AND name = ?3",
            params![time, day_key(date), name],
        )?;
        Ok(changed > 0)
    }

    pub fn delete_date(conn: &Connection, date: NaiveDate) -> Result<usize> {
        Ok(conn.execute(
            "DELETE FROM schedule_events WHERE date = ?1",
            params![day_key(date)],
        )?)
    }

    /// Drop stored schedules on and after `date`; used when location or
    /// calculation settings change.
    pub fn delete_from(conn: &Connection, date: NaiveDate) -> Result<usize> {
        Ok(conn.execute(
            "DELETE FROM schedule_events WHERE date >= ?1",
            params![day_key(date)],
        )?)
    }

    /// (completed, total) over the non-optional events of a date.
    pub fn required_progress(conn: &Connection, date: NaiveDate) -> Result<(u32, u32)> {
        conn.query_row(
            "SELECT COALESCE(SUM(completed), 0), COUNT(*)
             FROM schedule_events WHERE date = ?1 AND is_optional = 0",
            params![day_key(date)],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .map_err(anyhow::Error::from)
    }
}

// ─── Adhkar ──────────────────────────────────────────────────────────────────

const ITEM_COLUMNS: &str = "id, name, session, kind, target, builtin, sort_order";

type ItemRecord = (i64, String, String, String, i32, bool, i32);

fn item_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<ItemRecord> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
    ))
}

fn into_item(record: ItemRecord) -> Result<AdhkarItem> {
    let (id, name, session, kind, target, builtin, sort_order) = record;
    Ok(AdhkarItem {
        id,
        name,
        session: AdhkarSession::from_str(&session)?,
        kind: DhikrKind::from_str(&kind)?,
        target,
        builtin,
        sort_order,
    })
}

pub struct AdhkarRepo;

impl AdhkarRepo {
    pub fn items(conn: &Connection) -> Result<Vec<AdhkarItem>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM adhkar_items WHERE active = 1 ORDER BY sort_order, id",
            ITEM_COLUMNS
        ))?;
        let rows = stmt.query_map([], item_record)?;

        let mut result = Vec::new();
        for r in rows {
            result.push(into_item(r?)?);
        }
        Ok(result)
    }

    pub fn find_by_name(conn: &Connection, name: &str) -> Result<Option<AdhkarItem>> {
        let record = conn
            .query_row(
                &format!(
                    "SELECT {} FROM adhkar_items WHERE active = 1 AND lower(name) = lower(?1)",
                    ITEM_COLUMNS
                ),
                params![name],
                item_record,
            )
            .optional()?;
        record.map(into_item).transpose()
    }

    /// Add a custom item, or re-activate a removed one with the same name.
    pub fn add_custom(
        conn: &Connection,
        name: &str,
        session: AdhkarSession,
        kind: DhikrKind,
        target: i32,
    ) -> Result<i64> {
        if target < 1 {
            return Err(anyhow!("Target must be at least 1, got {}", target));
        }
        let max_order: i32 = conn.query_row(
            "SELECT COALESCE(MAX(sort_order), 100) FROM adhkar_items WHERE builtin = 0",
            [],
            |row| row.get(0),
        )?;

        conn.execute(
            "INSERT INTO adhkar_items (name, session, kind, target, builtin, sort_order, active)
             VALUES (?1, ?2, ?3, ?4, 0, ?5, 1)
             ON CONFLICT(name) DO UPDATE SET session = ?2, kind = ?3, target = ?4, active = 1",
            params![name, session.as_str(), kind.as_str(), target, max_order + 1],
        )?;
        let id = conn.query_row(
            "SELECT id FROM adhkar_items WHERE name = ?1",
            params![name],
            |row| row.get(0),
        )?;
        Ok(id)
    }

    /// Hide an item from the checklist; its log is kept.
    pub fn deactivate(conn: &Connection, name: &str) -> Result<bool> {
        let changed = conn.execute(
            "UPDATE adhkar_items SET active = 0 WHERE active = 1 AND lower(name) = lower(?1)",
            params![name],
        )?;
        Ok(changed > 0)
    }

    pub fn checklist(conn: &Connection, date: NaiveDate) -> Result<Vec<AdhkarProgress>> {
        let mut stmt = conn.prepare(
            "SELECT i.id, i.name, i.session, i.kind, i.target, i.builtin, i.sort_order,
                    COALESCE(l.count, 0), COALESCE(l.completed, 0)
             FROM adhkar_items i
             LEFT JOIN adhkar_log l ON l.item_id = i.id AND l.date = ?1
             WHERE i.active = 1
             ORDER BY i.sort_order, i.id",
        )?;

        let rows = stmt.query_map(params![day_key(date)], |row| {
            Ok((item_record(row)?, row.get::<_, i32>(7)?, row.get::<_, bool>(8)?))
        })?;

        let mut result = Vec::new();
        for r in rows {
            let (record, count, completed) = r?;
            result.push(AdhkarProgress {
                item: into_item(record)?,
                count,
                completed,
            });
        }
        Ok(result)
    }

    pub fn record(
        conn: &Connection,
        item_id: i64,
        date: NaiveDate,
        count: i32,
        completed: bool,
    ) -> Result<()> {
        conn.execute(
            "INSERT INTO adhkar_log (item_id, date, count, completed)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(item_id, date) DO UPDATE SET count = ?3, completed = ?4",
            params![item_id, day_key(date), count, completed],
        )?;
        Ok(())
    }
}

// ─── App meta ────────────────────────────────────────────────────────────────

pub struct MetaRepo;

impl MetaRepo {
    pub fn get(conn: &Connection, key: &str) -> Result<Option<String>> {
        conn.query_row(
            "SELECT value FROM app_meta WHERE key = ?1",
            params![key],
            |row| row.get(0),
        )
        .optional()
        .map_err(anyhow::Error::from)
    }

    pub fn set(conn: &Connection, key: &str, value: &str) -> Result<()> {
        conn.execute(
            "INSERT INTO app_meta (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = ?2",
            params![key, value],
        )?;
        Ok(())
    }
}
