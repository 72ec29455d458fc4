//! Confession scheduling: slots, bands, bookings and their transitions.
//!
//! Entities here are pure. Services decide who may act; repositories apply
//! the plans produced by [`booking`] atomically against locked rows.

pub mod band;
pub mod booking;
pub mod confession;
pub mod slot;
mod time_window;

pub use band::{
    BandStatus, ConfessionBand, ConfessionBandDraft, Recurrence, SeriesRequest, expand_series,
};
pub use booking::{
    BookableTarget, BookingContext, BookingPlan, BookingRejection, BookingRequest, TargetUpdate,
    plan_booking, plan_cancellation, plan_completion,
};
pub use confession::{BookingTarget, Confession, ConfessionDraft, ConfessionStatus};
pub use slot::{ConfessionSlot, ConfessionSlotDraft, SlotChanges, SlotStatus};
pub use time_window::TimeWindow;

/// Longest single slot, in hours.
pub const SLOT_MAX_HOURS: i64 = 4;
/// Longest single band occurrence, in hours.
pub const BAND_MAX_HOURS: i64 = 8;
/// Largest band capacity.
pub const BAND_CAPACITY_MAX: u32 = 50;
/// Most bands a single recurring request may create.
pub const SERIES_MAX_OCCURRENCES: usize = 52;
/// Maximum length of slot, band and confession notes.
pub const NOTES_MAX: usize = 500;

/// Validation errors for scheduling input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchedulingValidationError {
    #[error("end time must be after start time")]
    EndNotAfterStart,
    #[error("window must be at most {max_hours} hours long")]
    WindowTooLong { max_hours: i64 },
    #[error("start time must be in the future")]
    StartInPast,
    #[error("capacity must be between 1 and {max}")]
    CapacityOutOfRange { max: u32 },
    #[error("booked count {booked} exceeds capacity {capacity}")]
    BookedExceedsCapacity { booked: u32, capacity: u32 },
    #[error("recurring bands require recurrenceUntil")]
    RecurrenceUntilMissing,
    #[error("recurrenceUntil must be after the first start time")]
    RecurrenceUntilBeforeStart,
    #[error("recurrenceUntil is only valid for recurring bands")]
    RecurrenceUntilWithoutRecurrence,
    #[error("a series may create at most {max} bands")]
    TooManyOccurrences { max: usize },
    #[error("notes must be at most {max} characters")]
    NotesTooLong { max: usize },
    #[error("exactly one of slotId or bandId is required")]
    AmbiguousTarget,
    #[error("band has been cancelled")]
    BandCancelled,
}

pub(crate) fn validate_notes(
    notes: Option<String>,
) -> Result<Option<String>, SchedulingValidationError> {
    let notes = notes
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty());
    if notes.as_ref().is_some_and(|n| n.chars().count() > NOTES_MAX) {
        return Err(SchedulingValidationError::NotesTooLong { max: NOTES_MAX });
    }
    Ok(notes)
}
