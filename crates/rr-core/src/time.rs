//! Elapsed race times and finishing performance.
//!
//! All times are measured from the race's nominal zero point and carry
//! millisecond precision. Human-entered times are written `H:MM:SS` or
//! `MM:SS`, optionally with fractional seconds (`0:41:07.5`).

use std::fmt;
use std::iter::Sum;
use std::ops::{Add, Div, Mul, Sub};
use std::str::FromStr;

use chrono::TimeDelta;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for time strings that cannot be parsed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid time '{value}': {reason}")]
pub struct TimeError {
    value: String,
    reason: &'static str,
}

impl TimeError {
    fn new(value: &str, reason: &'static str) -> Self {
        Self {
            value: value.to_string(),
            reason,
        }
    }
}

/// A time relative to the race's zero point.
///
/// Recorded finishes and computed durations are never negative; negative
/// values only appear as configured start offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RaceTime(TimeDelta);

impl RaceTime {
    /// The race's zero point.
    #[must_use]
    pub fn zero() -> Self {
        Self(TimeDelta::zero())
    }

    #[must_use]
    pub fn from_millis(ms: i64) -> Self {
        Self(TimeDelta::milliseconds(ms))
    }

    #[must_use]
    pub fn from_seconds(seconds: i64) -> Self {
        Self::from_millis(seconds * 1000)
    }

    /// Builds a time from hours, minutes and seconds.
    #[must_use]
    pub fn hms(hours: i64, minutes: i64, seconds: i64) -> Self {
        Self::from_seconds(hours * 3600 + minutes * 60 + seconds)
    }

    /// Returns the total number of milliseconds.
    #[must_use]
    pub fn as_millis(self) -> i64 {
        self.0.num_milliseconds()
    }

    #[must_use]
    pub fn is_negative(self) -> bool {
        self.as_millis() < 0
    }

    /// Returns the underlying `chrono` delta.
    #[must_use]
    pub const fn as_delta(self) -> TimeDelta {
        self.0
    }
}

impl Add for RaceTime {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl Sub for RaceTime {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self(self.0 - rhs.0)
    }
}

impl Mul<i64> for RaceTime {
    type Output = Self;

    fn mul(self, rhs: i64) -> Self {
        Self::from_millis(self.as_millis() * rhs)
    }
}

/// Integer division, truncating to the millisecond.
impl Div<i64> for RaceTime {
    type Output = Self;

    fn div(self, rhs: i64) -> Self {
        Self::from_millis(self.as_millis() / rhs)
    }
}

impl Sum for RaceTime {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::zero(), Add::add)
    }
}

impl fmt::Display for RaceTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ms = self.as_millis();
        if ms < 0 {
            write!(f, "-")?;
        }
        let ms = ms.unsigned_abs();
        let seconds = ms / 1000;
        write!(
            f,
            "{}:{:02}:{:02}",
            seconds / 3600,
            seconds / 60 % 60,
            seconds % 60
        )?;
        let fraction = ms % 1000;
        if fraction != 0 {
            let digits = format!("{fraction:03}");
            write!(f, ".{}", digits.trim_end_matches('0'))?;
        }
        Ok(())
    }
}

impl FromStr for RaceTime {
    type Err = TimeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let (negative, body) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed),
        };
        if body.is_empty() {
            return Err(TimeError::new(s, "empty"));
        }

        let parts: Vec<&str> = body.split(':').collect();
        if parts.len() > 3 {
            return Err(TimeError::new(s, "too many components"));
        }

        let (last, leading) = parts
            .split_last()
            .ok_or_else(|| TimeError::new(s, "empty"))?;

        let (whole_seconds, fraction) = match last.split_once('.') {
            Some((whole, fraction)) => (whole, Some(fraction)),
            None => (*last, None),
        };

        let mut total_seconds: i64 = 0;
        for (index, part) in leading.iter().enumerate() {
            let value = parse_component(part).ok_or_else(|| TimeError::new(s, "not a number"))?;
            // Minutes following hours are bounded; the leading unit is not.
            if index > 0 && value >= 60 {
                return Err(TimeError::new(s, "minutes out of range"));
            }
            total_seconds = total_seconds * 60 + value;
        }

        let seconds =
            parse_component(whole_seconds).ok_or_else(|| TimeError::new(s, "not a number"))?;
        if !leading.is_empty() && seconds >= 60 {
            return Err(TimeError::new(s, "seconds out of range"));
        }
        total_seconds = total_seconds * 60 + seconds;

        let millis = match fraction {
            None => 0,
            Some(digits) => parse_fraction(digits).ok_or_else(|| {
                TimeError::new(s, "fractional seconds must have one to three digits")
            })?,
        };

        let total = total_seconds * 1000 + millis;
        Ok(Self::from_millis(if negative { -total } else { total }))
    }
}

fn parse_component(part: &str) -> Option<i64> {
    if part.is_empty() || part.len() > 9 || !part.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    part.parse().ok()
}

fn parse_fraction(digits: &str) -> Option<i64> {
    if digits.is_empty() || digits.len() > 3 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let value: i64 = digits.parse().ok()?;
    Some(match digits.len() {
        1 => value * 100,
        2 => value * 10,
        _ => value,
    })
}

impl Serialize for RaceTime {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for RaceTime {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// How a participant's race ended.
///
/// Variants are ordered so that every finisher sorts ahead of every
/// non-finisher, and non-finishers never compare equal to a real time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "status", content = "time", rename_all = "snake_case")]
pub enum Performance {
    /// Completed every segment in the given total time.
    Finished(RaceTime),
    /// Recorded in at least one segment but did not complete them all.
    DidNotFinish,
    /// No timing record at all.
    DidNotStart,
}

impl Performance {
    #[must_use]
    pub const fn is_finished(&self) -> bool {
        matches!(self, Self::Finished(_))
    }

    /// Returns the total time for finishers.
    #[must_use]
    pub const fn time(&self) -> Option<RaceTime> {
        match self {
            Self::Finished(time) => Some(*time),
            Self::DidNotFinish | Self::DidNotStart => None,
        }
    }
}

impl fmt::Display for Performance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Finished(time) => write!(f, "{time}"),
            Self::DidNotFinish => write!(f, "DNF"),
            Self::DidNotStart => write!(f, "DNS"),
        }
    }
}
