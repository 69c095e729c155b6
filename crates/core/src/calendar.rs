//! Calendar-day utilities.
//!
//! Every date in the domain is a calendar day (`NaiveDate`); arithmetic is plain
//! calendar-day arithmetic with no weekend or holiday skipping. Timestamps
//! (`DateTime<Utc>`) only appear for status changes and follow-up notes.

use chrono::{DateTime, Datelike, Days, Months, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};

/// Boundary format for calendar days.
pub const DAY_FORMAT: &str = "%Y-%m-%d";

const MONTH_ABBREVIATIONS: [&str; 12] = [
    "jan", "fev", "mar", "abr", "mai", "jun", "jul", "ago", "set", "out", "nov", "dez",
];

/// Years representable in the four-digit boundary format.
pub const MIN_YEAR: i32 = 1;
pub const MAX_YEAR: i32 = 9999;

/// Parse a strict `YYYY-MM-DD` calendar day.
pub fn parse_day(s: &str) -> DomainResult<NaiveDate> {
    let s = s.trim();
    if s.len() != 10 || !s.starts_with(|c: char| c.is_ascii_digit()) {
        return Err(DomainError::invalid_date(format!("expected YYYY-MM-DD, got {s:?}")));
    }
    let day = NaiveDate::parse_from_str(s, DAY_FORMAT)
        .map_err(|e| DomainError::invalid_date(format!("{s:?}: {e}")))?;
    ensure_in_calendar(day)
}

fn in_calendar(day: NaiveDate) -> bool {
    (MIN_YEAR..=MAX_YEAR).contains(&day.year())
}

fn ensure_in_calendar(day: NaiveDate) -> DomainResult<NaiveDate> {
    if in_calendar(day) {
        Ok(day)
    } else {
        Err(DomainError::invalid_date(format!(
            "{day} is outside years {MIN_YEAR}..={MAX_YEAR}"
        )))
    }
}

/// Latest day the boundary format can express.
pub fn last_day() -> NaiveDate {
    NaiveDate::from_ymd_opt(MAX_YEAR, 12, 31).unwrap_or(NaiveDate::MAX)
}

/// `day` shifted by `days` calendar days.
///
/// Fails when the result leaves the four-digit year range.
pub fn add_days(day: NaiveDate, days: i64) -> DomainResult<NaiveDate> {
    let shifted = if days >= 0 {
        day.checked_add_days(Days::new(days.unsigned_abs()))
    } else {
        day.checked_sub_days(Days::new(days.unsigned_abs()))
    };
    match shifted {
        Some(next) => ensure_in_calendar(next),
        None => Err(DomainError::invalid_date(format!("{day} shifted by {days} days overflows"))),
    }
}

pub fn start_of_month(day: NaiveDate) -> NaiveDate {
    day.with_day0(0).unwrap_or(day)
}

pub fn end_of_month(day: NaiveDate) -> NaiveDate {
    start_of_month(day)
        .checked_add_months(Months::new(1))
        .and_then(|next| next.pred_opt())
        .unwrap_or(NaiveDate::MAX)
}

/// Whole days from `start` to `end` (negative when `end` is earlier).
pub fn days_between(start: NaiveDate, end: NaiveDate) -> i64 {
    (end - start).num_days()
}

/// Calendar day (UTC) of a timestamp.
pub fn day_of(ts: DateTime<Utc>) -> NaiveDate {
    ts.date_naive()
}

pub fn format_day(day: NaiveDate) -> String {
    day.format(DAY_FORMAT).to_string()
}

/// `dd/MM/yyyy`, the display format used in tables.
pub fn format_br(day: NaiveDate) -> String {
    day.format("%d/%m/%Y").to_string()
}

/// `YYYY-MM` grouping key.
pub fn month_key(day: NaiveDate) -> String {
    day.format("%Y-%m").to_string()
}

/// Short month label such as `mar/2024`.
pub fn month_label(day: NaiveDate) -> String {
    format!("{}/{}", MONTH_ABBREVIATIONS[day.month0() as usize], day.year())
}

/// Serde adapter that reads and writes days only as strict `YYYY-MM-DD`.
///
/// Use with `#[serde(with = "calendar::serde_day")]`, or the `option`
/// submodule for optional fields (together with `#[serde(default)]`).
pub mod serde_day {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer, de};

    pub fn serialize<S: Serializer>(day: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format_day(*day))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse_day(&raw).map_err(de::Error::custom)
    }

    pub mod option {
        use chrono::NaiveDate;
        use serde::{Deserialize, Deserializer, Serializer, de};

        pub fn serialize<S: Serializer>(
            day: &Option<NaiveDate>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match day {
                Some(day) => serializer.serialize_some(&super::super::format_day(*day)),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<NaiveDate>, D::Error> {
            Option::<String>::deserialize(deserializer)?
                .map(|raw| super::super::parse_day(&raw))
                .transpose()
                .map_err(de::Error::custom)
        }
    }
}

/// Inclusive calendar-day window used by every report.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    #[serde(with = "serde_day")]
    pub start: NaiveDate,
    #[serde(with = "serde_day")]
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// The calendar month containing `day`.
    pub fn month_of(day: NaiveDate) -> Self {
        Self::new(start_of_month(day), end_of_month(day))
    }

    pub fn contains(&self, day: NaiveDate) -> bool {
        day >= self.start && day <= self.end
    }

    /// Number of days in the window, counting both ends, never less than 1.
    pub fn days(&self) -> i64 {
        (days_between(self.start, self.end) + 1).max(1)
    }
}
