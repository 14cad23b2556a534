use std::fmt;

use chrono::NaiveTime;

use super::availability::{format_time, parse_time};

/// A half-open `[start, end)` interval rendered as `HH:MM-HH:MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Slot {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl Slot {
    pub const LABEL_LEN: usize = 11;

    /// Parses a label of exactly 11 characters with the hyphen at index 5.
    /// Only the shape is checked here; whether the slot is bookable is up to
    /// the day's generated slots.
    pub fn parse(label: &str) -> anyhow::Result<Self> {
        if label.len() != Self::LABEL_LEN || label.as_bytes()[5] != b'-' {
            return Err(anyhow::anyhow!("invalid slot label: {label}"));
        }
        let start = parse_time(&label[..5])?;
        let end = parse_time(&label[6..])?;
        Ok(Slot { start, end })
    }

    pub fn label(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", format_time(self.start), format_time(self.end))
    }
}
