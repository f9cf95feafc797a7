//! Prayer schedule planner.
//!
//! The heart of the crate is [`schedule::generate_schedule`], a pure function
//! turning a day's six anchor times into its fifteen prayer events. Around it
//! sit an offline anchor source, a SQLite store for schedules and adhkar, and
//! the `noor` command line.

pub mod cli;
pub mod config;
pub mod db;
pub mod models;
pub mod prayer_times;
pub mod schedule;
pub mod utils;

pub use models::{AnchorTimes, DailyPrayerSchedule, PrayerEvent};
pub use schedule::{generate_schedule, ScheduleError};
