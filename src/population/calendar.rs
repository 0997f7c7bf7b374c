//! Calendar of generated days.
//!
//! Days are contiguous with a fixed one-day stride, so a calendar is fully
//! determined by its start timestamp and length.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Milliseconds in one day.
pub const DAY_MS: i64 = 24 * 60 * 60 * 1000;

/// One generated day: its position and its UTC timestamp in milliseconds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CalendarDay {
    pub index: usize,
    pub timestamp_ms: i64,
}

impl CalendarDay {
    /// The following day, or `None` past the end of the timestamp range.
    pub fn next(&self) -> Option<Self> {
        Some(Self {
            index: self.index + 1,
            timestamp_ms: self.timestamp_ms.checked_add(DAY_MS)?,
        })
    }

    pub fn datetime(&self) -> Option<DateTime<Utc>> {
        DateTime::<Utc>::from_timestamp_millis(self.timestamp_ms)
    }
}

impl fmt::Display for CalendarDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.datetime() {
            Some(dt) => write!(f, "day {} ({})", self.index, dt.format("%Y-%m-%d")),
            None => write!(f, "day {} (@{}ms)", self.index, self.timestamp_ms),
        }
    }
}

/// Ordered, evenly spaced sequence of days.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Calendar {
    days: Vec<CalendarDay>,
}

impl Calendar {
    pub fn new(start_timestamp_ms: i64, n_days: usize) -> Result<Self, ConfigError> {
        let overflow = || ConfigError::CalendarOverflow { start_ms: start_timestamp_ms, n_days };

        let mut days = Vec::with_capacity(n_days);
        let mut day = CalendarDay { index: 0, timestamp_ms: start_timestamp_ms };
        for i in 0..n_days {
            if i > 0 {
                day = day.next().ok_or_else(overflow)?;
            }
            days.push(day);
        }
        Ok(Self { days })
    }

    pub fn days(&self) -> &[CalendarDay] {
        &self.days
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&CalendarDay> {
        self.days.get(index)
    }

    pub fn timestamps(&self) -> impl Iterator<Item = i64> + '_ {
        self.days.iter().map(|d| d.timestamp_ms)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CalendarDay> {
        self.days.iter()
    }
}
