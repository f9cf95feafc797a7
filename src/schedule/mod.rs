pub mod clock;
pub mod error;
pub mod generator;

pub use error::ScheduleError;
pub use generator::generate_schedule;
