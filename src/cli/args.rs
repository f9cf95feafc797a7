use chrono::NaiveDate;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "noor", version, author, about = "A personal planner for prayer schedules and daily adhkar")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Save location and calculation settings
    Setup {
        /// Latitude in degrees
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        /// Longitude in degrees
        #[arg(long, allow_hyphen_values = true)]
        lng: f64,
        /// Place name shown in headings
        #[arg(long)]
        name: Option<String>,
        /// Calculation method (MuslimWorldLeague, Karachi, UmmAlQura, ...)
        #[arg(long)]
        method: Option<String>,
        /// Madhab (Hanafi or Shafi)
        #[arg(long)]
        madhab: Option<String>,
        /// UTC offset, e.g. "+5", "+5:30", "-4"
        #[arg(long, allow_hyphen_values = true)]
        tz: Option<String>,
    },
    /// Show the day's anchor prayer times
    Times {
        /// Only this anchor, e.g. fajr, zuhr or shuruq
        anchor: Option<String>,
        /// Date as YYYY-MM-DD (defaults to today)
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Show the full prayer schedule for a day
    Schedule {
        /// Date as YYYY-MM-DD (defaults to today)
        #[arg(long)]
        date: Option<NaiveDate>,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
        /// Hide optional prayers
        #[arg(long)]
        required_only: bool,
        /// Regenerate from the anchor times, discarding progress
        #[arg(long)]
        refresh: bool,
    },
    /// Mark a scheduled prayer as done
    Done {
        /// Event name, e.g. fajr_fard or witr
        name: String,
        #[arg(long)]
        date: Option<NaiveDate>,
        /// Mark as not done
        #[arg(long)]
        undo: bool,
    },
    /// Move a scheduled prayer to another time
    Move {
        /// Event name, e.g. duha
        name: String,
        /// New time as HH:MM
        time: String,
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Adhkar checklist
    Adhkar {
        #[command(subcommand)]
        action: AdhkarCommands,
    },
    /// Print the config file path and its settings
    Config,
}

#[derive(Subcommand, Debug)]
pub enum AdhkarCommands {
    /// Show today's checklist
    List {
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Tick a checkbox item or add to a counter
    Tick {
        /// Item name
        name: String,
        /// Add this count to a counter item
        #[arg(long, allow_hyphen_values = true)]
        count: Option<i32>,
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Add a custom item
    Add {
        /// Item name
        name: String,
        /// morning, evening, after_prayer, before_sleep or anytime
        #[arg(long, default_value = "anytime")]
        session: String,
        /// checkbox or counter
        #[arg(long, default_value = "checkbox")]
        kind: String,
        /// Target count (for counter items)
        #[arg(long, default_value = "1")]
        target: i32,
    },
    /// Remove an item from the checklist
    Remove {
        /// Item name
        name: String,
    },
}
