//! Canonical schedule day keys.
//!
//! A [`DateKey`] is written `DD-MM-YYYY` (zero padded, day first). Parsing is
//! strict: the text must match the 2-2-4 digit pattern exactly and name a real
//! calendar day, so `31-04-2026` or `29-02-2025` never become keys.

use chrono::{Datelike, Duration, Local, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// A validated calendar day used to key the schedule.
///
/// Ordering follows the calendar, not the textual form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DateKey(NaiveDate);

/// Returned when a string is not a valid `DD-MM-YYYY` key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidDateKey {
    pub input: String,
}

impl fmt::Display for InvalidDateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}' is not a valid DD-MM-YYYY date", self.input)
    }
}

impl std::error::Error for InvalidDateKey {}

impl DateKey {
    /// Parse a `DD-MM-YYYY` key, rejecting anything that does not round-trip
    /// to the same calendar day.
    pub fn parse(key: &str) -> Result<Self, InvalidDateKey> {
        let invalid = || InvalidDateKey {
            input: key.to_string(),
        };

        let bytes = key.as_bytes();
        if bytes.len() != 10 || bytes[2] != b'-' || bytes[5] != b'-' {
            return Err(invalid());
        }
        let digits_ok = bytes
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != 2 && *i != 5)
            .all(|(_, b)| b.is_ascii_digit());
        if !digits_ok {
            return Err(invalid());
        }

        let day: u32 = key[0..2].parse().map_err(|_| invalid())?;
        let month: u32 = key[3..5].parse().map_err(|_| invalid())?;
        let year: i32 = key[6..10].parse().map_err(|_| invalid())?;

        let date = NaiveDate::from_ymd_opt(year, month, day).ok_or_else(invalid)?;
        if date.day() != day || date.month() != month || date.year() != year {
            return Err(invalid());
        }
        Ok(Self(date))
    }

    /// Build a key from day/month/year parts
    pub fn from_dmy(day: u32, month: u32, year: i32) -> Option<Self> {
        if !(0..=9999).contains(&year) {
            return None;
        }
        NaiveDate::from_ymd_opt(year, month, day).map(Self)
    }

    pub fn from_date(date: NaiveDate) -> Option<Self> {
        Self::from_dmy(date.day(), date.month(), date.year())
    }

    /// Today in the server's local time zone
    pub fn today() -> Self {
        let today = Local::now().date_naive();
        Self::from_date(today).unwrap_or(Self(today))
    }

    pub fn date(&self) -> NaiveDate {
        self.0
    }

    pub fn day(&self) -> u32 {
        self.0.day()
    }

    pub fn month(&self) -> u32 {
        self.0.month()
    }

    pub fn year(&self) -> i32 {
        self.0.year()
    }

    /// Day of week, 0 = Sunday through 6 = Saturday
    pub fn day_of_week(&self) -> u32 {
        self.0.weekday().num_days_from_sunday()
    }

    /// Shift by `days` (negative moves backwards). `None` if the result falls
    /// outside the four-digit year range a key can represent.
    pub fn add_days(&self, days: i64) -> Option<Self> {
        self.0
            .checked_add_signed(Duration::days(days))
            .and_then(Self::from_date)
    }

    /// Signed number of days from `self` to `other`; negative when `self` is
    /// after `other`.
    pub fn days_until(&self, other: &DateKey) -> i64 {
        (other.0 - self.0).num_days()
    }

    /// Signed number of days from `a` to `b`
    pub fn days_between(a: &DateKey, b: &DateKey) -> i64 {
        a.days_until(b)
    }

    /// A contiguous run of `count` keys starting at `self`
    pub fn run(&self, count: u32) -> Vec<DateKey> {
        (0..i64::from(count))
            .map_while(|offset| self.add_days(offset))
            .collect()
    }
}

impl fmt::Display for DateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02}-{:02}-{:04}",
            self.0.day(),
            self.0.month(),
            self.0.year()
        )
    }
}

impl FromStr for DateKey {
    type Err = InvalidDateKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for DateKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for DateKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        DateKey::parse(&raw).map_err(serde::de::Error::custom)
    }
}
