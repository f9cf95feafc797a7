use anyhow::{anyhow, Context, Result};
use chrono::{Local, NaiveDate};
use rusqlite::Connection;
use serde::Serialize;
use std::str::FromStr;

use crate::cli::args::AdhkarCommands;
use crate::config::AppConfig;
use crate::db::repository::{AdhkarRepo, CacheRepo, MetaRepo, ScheduleRepo};
use crate::models::{AdhkarSession, Anchor, AnchorTimes, DhikrKind, PrayerKind, StoredEvent};
use crate::prayer_times::calculator::{self, SalahSource};
use crate::utils::format::{
    adhkar_status, format_duration_secs, format_tz_offset, parse_tz_offset, progress_bar,
};
use crate::utils::hijri::hijri_string;

// ─── ANSI helpers ────────────────────────────────────────────────────────────

macro_rules! println_colored {
    ($color:expr, $($arg:tt)*) => {{
        print!("{}", $color);
        print!($($arg)*);
        println!("\x1b[0m");
    }};
}

const GREEN: &str = "\x1b[32m";
const AMBER: &str = "\x1b[33m";
const DIM: &str = "\x1b[2m";
const BOLD: &str = "\x1b[1m";
const GOLD: &str = "\x1b[38;2;196;160;68m";

fn today() -> NaiveDate {
    Local::now().date_naive()
}

// ─── Setup ───────────────────────────────────────────────────────────────────

pub struct SetupArgs {
    pub lat: f64,
    pub lng: f64,
    pub name: Option<String>,
    pub method: Option<String>,
    pub madhab: Option<String>,
    pub tz: Option<String>,
}

pub fn handle_setup(conn: &Connection, config: &mut AppConfig, args: SetupArgs) -> Result<()> {
    let mut updated = config.clone();
    updated.location.latitude = args.lat;
    updated.location.longitude = args.lng;
    if let Some(name) = args.name {
        updated.location.name = name;
    }
    if let Some(method) = args.method {
        updated.calculation.method = method;
    }
    if let Some(madhab) = args.madhab {
        updated.calculation.madhab = madhab;
    }
    if let Some(tz) = args.tz {
        updated.location.timezone_offset =
            parse_tz_offset(&tz).with_context(|| format!("Parsing UTC offset '{}'", tz))?;
    }

    // Reject settings the calculator cannot use before anything is written
    let source = SalahSource::from_config(&updated)?;
    updated.save()?;
    *config = updated;

    // Old anchors and schedules were computed for the previous settings
    CacheRepo::clear_all(conn)?;
    let dropped = ScheduleRepo::delete_from(conn, today())?;
    MetaRepo::set(conn, "setup_done", "1")?;
    log::info!("Setup saved; dropped {} stored events", dropped);

    if let Err(e) = calculator::ensure_cached(conn, &source, today(), config.schedule.cache_days) {
        log::warn!("Could not pre-fill prayer times: {:#}", e);
    }

    println_colored!(GREEN, "  ✓ Saved settings to {:?}", AppConfig::config_path()?);
    println!(
        "  {} ({:.4}, {:.4})  UTC{}  {} / {}",
        config.location.name,
        config.location.latitude,
        config.location.longitude,
        format_tz_offset(config.location.timezone_offset),
        config.calculation.method,
        config.calculation.madhab
    );
    Ok(())
}

// ─── Times ───────────────────────────────────────────────────────────────────

pub fn handle_times(
    conn: &Connection,
    config: &AppConfig,
    anchor: Option<&str>,
    date: Option<NaiveDate>,
) -> Result<()> {
    let date = date.unwrap_or_else(today);
    let wanted = selected_anchors(anchor)?;
    let source = SalahSource::from_config(config)?;
    let anchors = calculator::cached_or_fetch(conn, &source, date)?;

    println!();
    println_colored!(
        GOLD,
        "  Prayer Times — {} ({})",
        config.location.name,
        date.format("%Y-%m-%d")
    );
    print_hijri(date, config);
    println!();
    for (anchor, time) in anchors.iter().filter(|(a, _)| wanted.contains(a)) {
        println_colored!(BOLD, "  {:<10}  {}", anchor.display_name(), time);
    }
    println!();
    Ok(())
}

/// All six anchors, or the one named on the command line.
fn selected_anchors(name: Option<&str>) -> Result<Vec<Anchor>> {
    match name {
        Some(name) => Ok(vec![Anchor::from_str(name)?]),
        None => Ok(Anchor::ALL.to_vec()),
    }
}

fn print_hijri(date: NaiveDate, config: &AppConfig) {
    match hijri_string(date, config.calendar.hijri_offset) {
        Ok(h) => println_colored!(DIM, "  {}", h),
        Err(e) => log::warn!("{:#}", e),
    }
}

// ─── Schedule ────────────────────────────────────────────────────────────────

/// JSON shape handed to UI collaborators.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ScheduleView<'a> {
    date: NaiveDate,
    anchors: &'a AnchorTimes,
    chronological: bool,
    events: Vec<&'a StoredEvent>,
}

/// Make sure a schedule is stored for `date`, generating it if needed.
/// With `refresh` a stored schedule is replaced, dropping its progress.
fn ensure_schedule(conn: &Connection, config: &AppConfig, date: NaiveDate, refresh: bool) -> Result<()> {
    if !refresh && ScheduleRepo::exists(conn, date)? {
        return Ok(());
    }
    let source = SalahSource::from_config(config)?;
    let schedule =
        calculator::schedule_for(conn, &source, date, config.schedule.strict_anchor_order)?;
    if refresh {
        ScheduleRepo::store(conn, &schedule)
    } else {
        ScheduleRepo::store_if_absent(conn, &schedule).map(|_| ())
    }
}

pub fn handle_schedule(
    conn: &Connection,
    config: &AppConfig,
    date: Option<NaiveDate>,
    json: bool,
    required_only: bool,
    refresh: bool,
) -> Result<()> {
    let date = date.unwrap_or_else(today);
    ensure_schedule(conn, config, date, refresh)?;

    let stored = ScheduleRepo::load(conn, date)?;
    let show_optional = config.schedule.show_optional && !required_only;
    let visible: Vec<&StoredEvent> = stored
        .iter()
        .filter(|s| show_optional || !s.event.is_optional)
        .collect();
    let chronological = stored.iter().all(|s| s.event.day_offset == 0);

    if json {
        let source = SalahSource::from_config(config)?;
        let anchors = calculator::cached_or_fetch(conn, &source, date)?;
        let view = ScheduleView {
            date,
            anchors: &anchors,
            chronological,
            events: visible,
        };
        println!("{}", serde_json::to_string_pretty(&view)?);
        return Ok(());
    }

    println!();
    println_colored!(
        GOLD,
        "  Prayer Schedule — {} ({})",
        config.location.name,
        date.format("%Y-%m-%d")
    );
    print_hijri(date, config);
    println!();

    for s in &visible {
        let e = &s.event;
        let icon = if s.completed {
            format!("{}●\x1b[0m", GREEN)
        } else {
            format!("{}○\x1b[0m", DIM)
        };
        let mut notes = Vec::new();
        if e.is_optional {
            notes.push("optional".to_string());
        }
        if s.moved {
            notes.push("moved".to_string());
        }
        if e.day_offset < 0 {
            notes.push("previous night".to_string());
        } else if e.day_offset > 0 {
            notes.push("after midnight".to_string());
        }
        let line = format!(
            "  {}  {}  {:<22} {:<7} {} rakat{}",
            icon,
            e.time,
            e.display_name,
            e.kind.as_str(),
            e.rakats,
            if notes.is_empty() {
                String::new()
            } else {
                format!("  ({})", notes.join(", "))
            }
        );
        if e.kind == PrayerKind::Fard {
            println_colored!(BOLD, "{}", line);
        } else {
            println!("{}", line);
        }
    }

    let (done, total) = ScheduleRepo::required_progress(conn, date)?;
    println!();
    println!("  Required  {}  {}/{}", progress_bar(done, total, 11), done, total);

    if !chronological {
        println_colored!(
            AMBER,
            "  Note: some times cross midnight, so the list is not in prayer order"
        );
    }

    if date == today() {
        let source = SalahSource::from_config(config)?;
        let now = Local::now().naive_local();
        if let Some((event, secs)) = calculator::next_event(conn, &source, now, show_optional)? {
            println_colored!(
                AMBER,
                "  Next: {} in {}",
                event.display_name,
                format_duration_secs(secs)
            );
        }
    }
    println!();
    Ok(())
}

fn unknown_event(name: &str, stored: &[StoredEvent]) -> anyhow::Error {
    let known: Vec<&str> = stored.iter().map(|s| s.event.name.as_str()).collect();
    anyhow!("No event named '{}'. Use one of: {}", name, known.join(", "))
}

pub fn handle_done(
    conn: &Connection,
    config: &AppConfig,
    name: &str,
    date: Option<NaiveDate>,
    undo: bool,
) -> Result<()> {
    let date = date.unwrap_or_else(today);
    ensure_schedule(conn, config, date, false)?;

    if !ScheduleRepo::set_completed(conn, date, name, !undo)? {
        return Err(unknown_event(name, &ScheduleRepo::load(conn, date)?));
    }
    if undo {
        println_colored!(DIM, "  ○ {} marked as not done", name);
    } else {
        println_colored!(GREEN, "  ✓ {} marked as done", name);
    }
    Ok(())
}

pub fn handle_move(
    conn: &Connection,
    config: &AppConfig,
    name: &str,
    time: &str,
    date: Option<NaiveDate>,
) -> Result<()> {
    let date = date.unwrap_or_else(today);
    ensure_schedule(conn, config, date, false)?;

    if !ScheduleRepo::move_event(conn, date, name, time)? {
        return Err(unknown_event(name, &ScheduleRepo::load(conn, date)?));
    }
    println_colored!(GREEN, "  ✓ {} moved to {}", name, time);
    Ok(())
}

// ─── Adhkar ──────────────────────────────────────────────────────────────────

pub fn handle_adhkar(conn: &Connection, action: &AdhkarCommands) -> Result<()> {
    match action {
        AdhkarCommands::List { date } => {
            let date = date.unwrap_or_else(today);
            let list = AdhkarRepo::checklist(conn, date)?;
            println!();
            println_colored!(GOLD, "  Adhkar ({})", date.format("%Y-%m-%d"));
            println!();
            for p in &list {
                let status = adhkar_status(p);
                if p.completed {
                    println_colored!(GREEN, "  {:<28}  {:<13} {}", p.item.name, p.item.session.label(), status);
                } else {
                    println!("  {:<28}  {:<13} {}", p.item.name, p.item.session.label(), status);
                }
            }
            println!();
        }
        AdhkarCommands::Tick { name, count, date } => {
            let date = date.unwrap_or_else(today);
            let progress = AdhkarRepo::checklist(conn, date)?
                .into_iter()
                .find(|p| p.item.name.eq_ignore_ascii_case(name))
                .ok_or_else(|| anyhow!("Dhikr '{}' not found", name))?;

            let (new_count, completed) = progress.ticked(*count);
            AdhkarRepo::record(conn, progress.item.id, date, new_count, completed)?;

            match progress.item.kind {
                DhikrKind::Checkbox if completed => {
                    println_colored!(GREEN, "  ✓ {} — done", progress.item.name)
                }
                DhikrKind::Checkbox => println_colored!(DIM, "  ○ {} — unmarked", progress.item.name),
                DhikrKind::Counter => println_colored!(
                    if completed { GREEN } else { AMBER },
                    "  {} {} — {}/{}",
                    if completed { "✓" } else { "◑" },
                    progress.item.name,
                    new_count,
                    progress.item.target
                ),
            }
        }
        AdhkarCommands::Add {
            name,
            session,
            kind,
            target,
        } => {
            let session = AdhkarSession::from_str(session)?;
            let kind = DhikrKind::from_str(kind)?;
            let target = if kind == DhikrKind::Checkbox { 1 } else { *target };
            AdhkarRepo::add_custom(conn, name, session, kind, target)?;
            println_colored!(GREEN, "  ✓ Added dhikr: {}", name);
        }
        AdhkarCommands::Remove { name } => {
            if !AdhkarRepo::deactivate(conn, name)? {
                return Err(anyhow!("Dhikr '{}' not found", name));
            }
            println_colored!(DIM, "  Removed {}", name);
        }
    }
    Ok(())
}

// ─── Config ──────────────────────────────────────────────────────────────────

pub fn handle_config(config: &AppConfig) -> Result<()> {
    println!("# {}", AppConfig::config_path()?.display());
    print!("{}", toml::to_string_pretty(config).context("Serializing config")?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selected_anchors() {
        assert_eq!(selected_anchors(None).unwrap(), Anchor::ALL.to_vec());
        assert_eq!(selected_anchors(Some("Zuhr")).unwrap(), vec![Anchor::Dhuhr]);
        assert_eq!(selected_anchors(Some("shuruq")).unwrap(), vec![Anchor::Sunrise]);
        assert!(selected_anchors(Some("witr")).is_err());
    }
}
