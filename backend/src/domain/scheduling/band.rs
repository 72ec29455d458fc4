//! Multi-capacity confession band and recurring series expansion.

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use super::{
    BAND_CAPACITY_MAX, BAND_MAX_HOURS, SERIES_MAX_OCCURRENCES, SchedulingValidationError,
    TimeWindow, validate_notes,
};
use crate::domain::UserId;
use crate::domain::text_enum::text_enum;

text_enum! {
    /// Band lifecycle state.
    pub enum BandStatus, parse error ParseBandStatusError ("band status") {
        Available => "available",
        Full => "full",
        Cancelled => "cancelled",
    }
}

text_enum! {
    /// How a band repeats.
    pub enum Recurrence, parse error ParseRecurrenceError ("recurrence") {
        None => "none",
        Daily => "daily",
        Weekly => "weekly",
    }
}

impl Recurrence {
    fn step(self) -> Option<Duration> {
        match self {
            Self::None => None,
            Self::Daily => Some(Duration::days(1)),
            Self::Weekly => Some(Duration::weeks(1)),
        }
    }
}

/// Recurring band request to be expanded into occurrences.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeriesRequest {
    pub first: TimeWindow,
    pub recurrence: Recurrence,
    pub until: Option<DateTime<Utc>>,
}

/// Expand a series into occurrence windows.
///
/// Occurrences start at `first` and step by the recurrence interval while the
/// start is at or before `until`.
///
/// # Examples
/// ```
/// use chrono::{Duration, TimeZone, Utc};
/// use confesapp::domain::scheduling::{expand_series, Recurrence, SeriesRequest, TimeWindow};
///
/// let start = Utc.with_ymd_and_hms(2026, 6, 1, 17, 0, 0).unwrap();
/// let first = TimeWindow::new(start, start + Duration::hours(1)).unwrap();
/// let windows = expand_series(&SeriesRequest {
///     first,
///     recurrence: Recurrence::Weekly,
///     until: Some(start + Duration::weeks(2)),
/// })
/// .unwrap();
/// assert_eq!(windows.len(), 3);
/// ```
pub fn expand_series(request: &SeriesRequest) -> Result<Vec<TimeWindow>, SchedulingValidationError> {
    let Some(step) = request.recurrence.step() else {
        if request.until.is_some() {
            return Err(SchedulingValidationError::RecurrenceUntilWithoutRecurrence);
        }
        return Ok(vec![request.first]);
    };
    let until = request
        .until
        .ok_or(SchedulingValidationError::RecurrenceUntilMissing)?;
    if until <= request.first.start() {
        return Err(SchedulingValidationError::RecurrenceUntilBeforeStart);
    }

    let mut windows = Vec::new();
    let mut current = request.first;
    while current.start() <= until {
        if windows.len() == SERIES_MAX_OCCURRENCES {
            return Err(SchedulingValidationError::TooManyOccurrences {
                max: SERIES_MAX_OCCURRENCES,
            });
        }
        windows.push(current);
        current = current.shifted(step);
    }
    Ok(windows)
}

fn validate_capacity(capacity: u32) -> Result<u32, SchedulingValidationError> {
    if !(1..=BAND_CAPACITY_MAX).contains(&capacity) {
        return Err(SchedulingValidationError::CapacityOutOfRange {
            max: BAND_CAPACITY_MAX,
        });
    }
    Ok(capacity)
}

/// Input payload for [`ConfessionBand::new`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfessionBandDraft {
    pub id: Uuid,
    pub priest_id: UserId,
    pub parish_id: Uuid,
    pub window: TimeWindow,
    pub capacity: u32,
    pub booked_count: u32,
    pub status: BandStatus,
    pub recurrence: Recurrence,
    pub recurrence_until: Option<DateTime<Utc>>,
    pub series_id: Option<Uuid>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Priest-defined window accepting up to `capacity` bookings.
///
/// ## Invariants
/// - `1 <= capacity <= BAND_CAPACITY_MAX`
/// - `booked_count <= capacity`
/// - a non-cancelled band is `Full` exactly when `booked_count == capacity`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfessionBand {
    id: Uuid,
    priest_id: UserId,
    parish_id: Uuid,
    window: TimeWindow,
    capacity: u32,
    booked_count: u32,
    status: BandStatus,
    recurrence: Recurrence,
    recurrence_until: Option<DateTime<Utc>>,
    series_id: Option<Uuid>,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ConfessionBand {
    /// Validate and construct a band.
    pub fn new(draft: ConfessionBandDraft) -> Result<Self, SchedulingValidationError> {
        Self::try_from(draft)
    }

    /// Stable band identifier.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Priest hearing confessions in this band.
    pub fn priest_id(&self) -> UserId {
        self.priest_id
    }

    /// Parish the band is held in.
    pub fn parish_id(&self) -> Uuid {
        self.parish_id
    }

    /// Start and end of the band.
    pub fn window(&self) -> TimeWindow {
        self.window
    }

    /// When the band opens.
    pub fn start_time(&self) -> DateTime<Utc> {
        self.window.start()
    }

    /// When the band closes.
    pub fn end_time(&self) -> DateTime<Utc> {
        self.window.end()
    }

    /// Maximum number of active bookings.
    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Active bookings currently holding a seat.
    pub fn booked_count(&self) -> u32 {
        self.booked_count
    }

    /// Occupancy or cancellation state.
    pub fn status(&self) -> BandStatus {
        self.status
    }

    /// Repeat rule the band was created with.
    pub fn recurrence(&self) -> Recurrence {
        self.recurrence
    }

    /// Last instant a recurring series may start at.
    pub fn recurrence_until(&self) -> Option<DateTime<Utc>> {
        self.recurrence_until
    }

    /// Shared id of the bands created by one recurring request.
    pub fn series_id(&self) -> Option<Uuid> {
        self.series_id
    }

    /// Free-text notes shown to penitents.
    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    /// When the band was created.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// When the band last changed.
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Seats still open.
    pub fn remaining(&self) -> u32 {
        self.capacity.saturating_sub(self.booked_count)
    }

    pub fn is_cancelled(&self) -> bool {
        self.status == BandStatus::Cancelled
    }

    fn occupancy_status(booked_count: u32, capacity: u32) -> BandStatus {
        if booked_count >= capacity {
            BandStatus::Full
        } else {
            BandStatus::Available
        }
    }

    /// Set the booked count and recompute availability.
    pub fn with_booked_count(
        mut self,
        booked_count: u32,
        now: DateTime<Utc>,
    ) -> Result<Self, SchedulingValidationError> {
        if booked_count > self.capacity {
            return Err(SchedulingValidationError::BookedExceedsCapacity {
                booked: booked_count,
                capacity: self.capacity,
            });
        }
        self.booked_count = booked_count;
        if !self.is_cancelled() {
            self.status = Self::occupancy_status(booked_count, self.capacity);
        }
        self.updated_at = now;
        Ok(self)
    }

    /// Change capacity; it may not drop below the seats already booked.
    pub fn with_capacity(
        mut self,
        capacity: u32,
        now: DateTime<Utc>,
    ) -> Result<Self, SchedulingValidationError> {
        if self.is_cancelled() {
            return Err(SchedulingValidationError::BandCancelled);
        }
        let capacity = validate_capacity(capacity)?;
        if capacity < self.booked_count {
            return Err(SchedulingValidationError::BookedExceedsCapacity {
                booked: self.booked_count,
                capacity,
            });
        }
        self.capacity = capacity;
        self.status = Self::occupancy_status(self.booked_count, capacity);
        self.updated_at = now;
        Ok(self)
    }

    /// Cancel the band. Bookings are cancelled by the repository.
    pub fn cancelled(mut self, now: DateTime<Utc>) -> Result<Self, SchedulingValidationError> {
        if self.is_cancelled() {
            return Err(SchedulingValidationError::BandCancelled);
        }
        self.status = BandStatus::Cancelled;
        self.updated_at = now;
        Ok(self)
    }
}

impl TryFrom<ConfessionBandDraft> for ConfessionBand {
    type Error = SchedulingValidationError;

    fn try_from(draft: ConfessionBandDraft) -> Result<Self, Self::Error> {
        let capacity = validate_capacity(draft.capacity)?;
        if draft.booked_count > capacity {
            return Err(SchedulingValidationError::BookedExceedsCapacity {
                booked: draft.booked_count,
                capacity,
            });
        }
        Ok(Self {
            id: draft.id,
            priest_id: draft.priest_id,
            parish_id: draft.parish_id,
            window: draft.window.ensure_max_hours(BAND_MAX_HOURS)?,
            capacity,
            booked_count: draft.booked_count,
            status: draft.status,
            recurrence: draft.recurrence,
            recurrence_until: draft.recurrence_until,
            series_id: draft.series_id,
            notes: validate_notes(draft.notes)?,
            created_at: draft.created_at,
            updated_at: draft.updated_at,
        })
    }
}
