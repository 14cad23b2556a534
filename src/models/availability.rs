use chrono::{NaiveTime, Weekday};
use serde_json::{Map, Value};

/// Weekdays in storage order, keyed by their lowercase English name.
pub const WEEKDAYS: [(Weekday, &str); 7] = [
    (Weekday::Sun, "sunday"),
    (Weekday::Mon, "monday"),
    (Weekday::Tue, "tuesday"),
    (Weekday::Wed, "wednesday"),
    (Weekday::Thu, "thursday"),
    (Weekday::Fri, "friday"),
    (Weekday::Sat, "saturday"),
];

pub fn weekday_name(day: Weekday) -> &'static str {
    WEEKDAYS[day.num_days_from_sunday() as usize].1
}

pub fn parse_weekday(s: &str) -> Option<Weekday> {
    let lower = s.to_lowercase();
    WEEKDAYS
        .iter()
        .find(|(_, name)| *name == lower)
        .map(|(day, _)| *day)
}

/// Parses a strict `HH:MM` wall-clock time (00:00 through 23:59).
pub fn parse_time(s: &str) -> anyhow::Result<NaiveTime> {
    let (hour, minute) = s
        .split_once(':')
        .ok_or_else(|| anyhow::anyhow!("invalid time format: {s}"))?;
    let two_digits = |part: &str| part.len() == 2 && part.bytes().all(|b| b.is_ascii_digit());
    if !two_digits(hour) || !two_digits(minute) {
        return Err(anyhow::anyhow!("invalid time format: {s}"));
    }
    let hour: u32 = hour
        .parse()
        .map_err(|_| anyhow::anyhow!("invalid hour in: {s}"))?;
    let minute: u32 = minute
        .parse()
        .map_err(|_| anyhow::anyhow!("invalid minute in: {s}"))?;
    NaiveTime::from_hms_opt(hour, minute, 0).ok_or_else(|| anyhow::anyhow!("time out of range: {s}"))
}

pub fn format_time(t: NaiveTime) -> String {
    t.format("%H:%M").to_string()
}

/// The opening rule for a single weekday.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeekdayRule {
    Closed,
    Open { start: NaiveTime, end: NaiveTime },
}

impl WeekdayRule {
    pub fn is_available(&self) -> bool {
        matches!(self, WeekdayRule::Open { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayHours {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

/// A validated weekly declaration, indexed by days from Sunday.
///
/// This is the write-side view: `from_value` rejects anything malformed so a
/// service is only ever stored with a canonical declaration. Reads go through
/// [`resolve_day_rule`], which never fails.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WeeklyAvailability {
    days: [Option<DayHours>; 7],
}

impl WeeklyAvailability {
    pub fn from_json(s: &str) -> anyhow::Result<Self> {
        let value: Value = serde_json::from_str(s)?;
        Self::from_value(&value)
    }

    pub fn from_value(value: &Value) -> anyhow::Result<Self> {
        let map = value
            .as_object()
            .ok_or_else(|| anyhow::anyhow!("availability must be an object keyed by weekday"))?;

        let mut availability = WeeklyAvailability::default();
        for (key, entry) in map {
            let day = parse_weekday(key).ok_or_else(|| anyhow::anyhow!("invalid weekday: {key}"))?;
            let entry = entry
                .as_object()
                .ok_or_else(|| anyhow::anyhow!("{key}: entry must be an object"))?;

            let available = match entry.get("available") {
                None => true,
                Some(Value::Bool(b)) => *b,
                Some(_) => return Err(anyhow::anyhow!("{key}: available must be a boolean")),
            };
            if !available {
                continue;
            }

            let start = time_field(entry, "start").map_err(|e| anyhow::anyhow!("{key}: {e}"))?;
            let end = time_field(entry, "end").map_err(|e| anyhow::anyhow!("{key}: {e}"))?;
            if start >= end {
                return Err(anyhow::anyhow!("{key}: start must be before end"));
            }
            availability.days[day.num_days_from_sunday() as usize] = Some(DayHours { start, end });
        }
        Ok(availability)
    }

    pub fn open_days(&self) -> usize {
        self.days.iter().filter(|d| d.is_some()).count()
    }

    /// Canonical storage form: all seven days, closed days as `{"available": false}`.
    pub fn to_value(&self) -> Value {
        let mut map = Map::new();
        for (day, name) in WEEKDAYS {
            let entry = match self.days[day.num_days_from_sunday() as usize] {
                Some(hours) => serde_json::json!({
                    "available": true,
                    "start": format_time(hours.start),
                    "end": format_time(hours.end),
                }),
                None => serde_json::json!({ "available": false }),
            };
            map.insert(name.to_string(), entry);
        }
        Value::Object(map)
    }
}

fn time_field(entry: &Map<String, Value>, field: &str) -> anyhow::Result<NaiveTime> {
    let raw = entry
        .get(field)
        .and_then(Value::as_str)
        .ok_or_else(|| anyhow::anyhow!("{field} must be an HH:MM string"))?;
    parse_time(raw)
}

/// Extracts one weekday's rule from a stored declaration.
///
/// Anything missing or malformed reads as `Closed`. Only `available: false`
/// closes a day that has hours; an entry without the flag is open.
/// The rule is returned as stored, so `start >= end` is left for the slot
/// generator to reject.
pub fn resolve_day_rule(raw: &str, day: Weekday) -> WeekdayRule {
    let name = weekday_name(day);
    let value: Value = match serde_json::from_str(raw) {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!(error = %e, "stored availability is not valid JSON; treating {name} as closed");
            return WeekdayRule::Closed;
        }
    };

    let Some(entry) = value.get(name).and_then(Value::as_object) else {
        return WeekdayRule::Closed;
    };

    if let Some(Value::Bool(false)) = entry.get("available") {
        return WeekdayRule::Closed;
    }

    let (Some(start), Some(end)) = (
        entry.get("start").and_then(Value::as_str),
        entry.get("end").and_then(Value::as_str),
    ) else {
        return WeekdayRule::Closed;
    };

    match (parse_time(start), parse_time(end)) {
        (Ok(start), Ok(end)) => WeekdayRule::Open { start, end },
        _ => {
            tracing::warn!(start, end, "stored hours for {name} are not HH:MM; treating as closed");
            WeekdayRule::Closed
        }
    }
}
