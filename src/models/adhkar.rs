use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// When in the day an item is meant to be recited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdhkarSession {
    Morning,
    Evening,
    AfterPrayer,
    BeforeSleep,
    Anytime,
}

impl AdhkarSession {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdhkarSession::Morning => "morning",
            AdhkarSession::Evening => "evening",
            AdhkarSession::AfterPrayer => "after_prayer",
            AdhkarSession::BeforeSleep => "before_sleep",
            AdhkarSession::Anytime => "anytime",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AdhkarSession::Morning => "Morning",
            AdhkarSession::Evening => "Evening",
            AdhkarSession::AfterPrayer => "After prayer",
            AdhkarSession::BeforeSleep => "Before sleep",
            AdhkarSession::Anytime => "Anytime",
        }
    }
}

impl FromStr for AdhkarSession {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "morning" => Ok(AdhkarSession::Morning),
            "evening" => Ok(AdhkarSession::Evening),
            "after_prayer" | "post_salah" => Ok(AdhkarSession::AfterPrayer),
            "before_sleep" | "night" => Ok(AdhkarSession::BeforeSleep),
            "anytime" => Ok(AdhkarSession::Anytime),
            _ => Err(anyhow::anyhow!("Unknown adhkar session: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DhikrKind {
    /// Ticked off once.
    Checkbox,
    /// Counted up to a target.
    Counter,
}

impl DhikrKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DhikrKind::Checkbox => "checkbox",
            DhikrKind::Counter => "counter",
        }
    }
}

impl FromStr for DhikrKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "checkbox" => Ok(DhikrKind::Checkbox),
            "counter" => Ok(DhikrKind::Counter),
            _ => Err(anyhow::anyhow!("Unknown dhikr kind: {}", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdhkarItem {
    pub id: i64,
    pub name: String,
    pub session: AdhkarSession,
    pub kind: DhikrKind,
    pub target: i32,
    pub builtin: bool,
    pub sort_order: i32,
}

/// An item together with what was logged for it on one date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdhkarProgress {
    pub item: AdhkarItem,
    pub count: i32,
    pub completed: bool,
}

impl AdhkarProgress {
    /// Progress after one tick. Checkboxes toggle; counters add `count`
    /// (default 1) and complete once they reach the target.
    pub fn ticked(&self, count: Option<i32>) -> (i32, bool) {
        match self.item.kind {
            DhikrKind::Checkbox => {
                let done = !self.completed;
                (i32::from(done), done)
            }
            DhikrKind::Counter => {
                let total = (self.count + count.unwrap_or(1)).max(0);
                (total, total >= self.item.target)
            }
        }
    }
}
