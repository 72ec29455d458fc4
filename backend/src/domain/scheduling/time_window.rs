//! Half-open time window `[start, end)`.

use chrono::{DateTime, Duration, Utc};

use super::SchedulingValidationError;

/// Non-empty UTC interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl TimeWindow {
    /// Build a window; `end` must be strictly after `start`.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, SchedulingValidationError> {
        if end <= start {
            return Err(SchedulingValidationError::EndNotAfterStart);
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// Reject windows longer than `max_hours`.
    pub fn ensure_max_hours(self, max_hours: i64) -> Result<Self, SchedulingValidationError> {
        if self.duration() > Duration::hours(max_hours) {
            return Err(SchedulingValidationError::WindowTooLong { max_hours });
        }
        Ok(self)
    }

    /// Reject windows that do not start after `now`.
    pub fn ensure_future(self, now: DateTime<Utc>) -> Result<Self, SchedulingValidationError> {
        if self.start <= now {
            return Err(SchedulingValidationError::StartInPast);
        }
        Ok(self)
    }

    /// Whether the two windows share any instant.
    pub fn overlaps(&self, other: &Self) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Same window moved by `offset`.
    #[must_use]
    pub fn shifted(&self, offset: Duration) -> Self {
        Self {
            start: self.start + offset,
            end: self.end + offset,
        }
    }
}
