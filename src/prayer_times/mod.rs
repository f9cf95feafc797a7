pub mod calculator;

pub use calculator::{AnchorSource, SalahSource};
