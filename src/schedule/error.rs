use chrono::NaiveDate;
use thiserror::Error;

use crate::models::Anchor;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("Prayer times unavailable for {date}: {reason}")]
    UpstreamUnavailable { date: NaiveDate, reason: String },

    #[error("Invalid {anchor} anchor time '{value}' (expected HH:MM)")]
    InvalidAnchorTime { anchor: Anchor, value: String },

    #[error("Bad time format: {0}")]
    Format(String),

    #[error("Anchor times out of order: {earlier} ({earlier_time}) is not before {later} ({later_time})")]
    AnchorsOutOfOrder {
        earlier: Anchor,
        earlier_time: String,
        later: Anchor,
        later_time: String,
    },
}
