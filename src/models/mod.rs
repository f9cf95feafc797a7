pub mod adhkar;
pub mod prayer;
pub mod schedule;

pub use adhkar::{AdhkarItem, AdhkarProgress, AdhkarSession, DhikrKind};
pub use prayer::{Anchor, AnchorTimes};
pub use schedule::{DailyPrayerSchedule, PrayerCategory, PrayerEvent, PrayerKind, StoredEvent};
