//! Listing filter shared by slot and band repositories.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::UserId;

/// Narrow a schedule listing. `from`/`to` bound the start time inclusively.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleFilter<S> {
    pub priest_id: Option<UserId>,
    pub parish_id: Option<Uuid>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub status: Option<S>,
}

impl<S> Default for ScheduleFilter<S> {
    fn default() -> Self {
        Self {
            priest_id: None,
            parish_id: None,
            from: None,
            to: None,
            status: None,
        }
    }
}

impl<S> ScheduleFilter<S> {
    /// Whether `start` falls inside the `from`/`to` bounds.
    pub fn admits_start(&self, start: DateTime<Utc>) -> bool {
        self.from.is_none_or(|from| start >= from) && self.to.is_none_or(|to| start <= to)
    }
}
