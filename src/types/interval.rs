use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A time-of-day window, independent of any calendar date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl TimeRange {
    /// Builds a range, rejecting zero and negative durations.
    pub fn new(start: NaiveTime, end: NaiveTime) -> Result<Self> {
        if start >= end {
            return Err(Error::InvalidRange);
        }
        Ok(Self { start, end })
    }

    /// Anchors the window to a calendar day.
    #[must_use]
    pub fn on(self, day: NaiveDate) -> Interval {
        Interval {
            start: day.and_time(self.start),
            end: day.and_time(self.end),
        }
    }
}

/// A half-open `[start, end)` span of absolute time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interval {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl Interval {
    /// True when `self` starts inside `other`, ends inside `other`, or
    /// fully contains `other`. Touching endpoints do not overlap.
    #[must_use]
    pub fn overlaps(&self, other: &Interval) -> bool {
        (self.start >= other.start && self.start < other.end)
            || (self.end > other.start && self.end <= other.end)
            || (self.start <= other.start && self.end >= other.end)
    }
}
