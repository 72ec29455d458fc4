//! Booking, cancellation and completion rules.
//!
//! Each `plan_*` function runs the validation chain for one operation and
//! returns the new state of the confession and its target. Repositories call
//! these against rows locked inside a transaction and persist the result.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::{
    BandStatus, BookingTarget, Confession, ConfessionBand, ConfessionSlot, ConfessionStatus,
    SchedulingValidationError, SlotStatus, validate_notes,
};
use crate::domain::UserId;

/// Slot or band a booking is made against, as currently stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookableTarget {
    Slot(ConfessionSlot),
    Band(ConfessionBand),
}

impl BookableTarget {
    pub fn reference(&self) -> BookingTarget {
        match self {
            Self::Slot(slot) => BookingTarget::Slot(slot.id()),
            Self::Band(band) => BookingTarget::Band(band.id()),
        }
    }

    pub fn priest_id(&self) -> UserId {
        match self {
            Self::Slot(slot) => slot.priest_id(),
            Self::Band(band) => band.priest_id(),
        }
    }

    pub fn start_time(&self) -> DateTime<Utc> {
        match self {
            Self::Slot(slot) => slot.start_time(),
            Self::Band(band) => band.start_time(),
        }
    }
}

/// Facts about existing bookings on the target, read under the same lock.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BookingContext {
    /// The caller already holds a `booked` confession on this target.
    pub caller_has_booking: bool,
    /// Number of `booked` confessions on this target.
    pub active_bookings: u32,
}

/// A validated request to book.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingRequest {
    id: Uuid,
    faithful_id: UserId,
    target: BookingTarget,
    notes: Option<String>,
}

impl BookingRequest {
    /// Validate the target pair and notes.
    pub fn new(
        faithful_id: UserId,
        slot_id: Option<Uuid>,
        band_id: Option<Uuid>,
        notes: Option<String>,
    ) -> Result<Self, SchedulingValidationError> {
        let target = BookingTarget::from_parts(slot_id, band_id)?;
        Ok(Self {
            id: Uuid::new_v4(),
            faithful_id,
            target,
            notes: validate_notes(notes)?,
        })
    }

    /// Id the confession will be stored under.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Penitent making the booking.
    pub fn faithful_id(&self) -> UserId {
        self.faithful_id
    }

    /// Slot or band being booked.
    pub fn target(&self) -> BookingTarget {
        self.target
    }

    /// Notes for the priest, already trimmed.
    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }
}

/// Why a booking transition was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum BookingRejection {
    #[error("confession slot or band is not available")]
    TargetUnavailable,
    #[error("confession band is full")]
    BandFull,
    #[error("bookings close when the confession starts")]
    WindowClosed,
    #[error("you already have a booking for this time")]
    DuplicateBooking,
    #[error("confession slot is already booked")]
    SlotTaken,
    #[error("confession is {status}, not booked")]
    NotBooked { status: ConfessionStatus },
    #[error("confessions can only be cancelled before they start")]
    TooLateToCancel,
    #[error("confessions can only be completed once they have started")]
    TooEarlyToComplete,
    #[error("confession does not belong to the supplied slot or band")]
    TargetMismatch,
}

impl BookingRejection {
    /// Stable machine-readable code reported in error details.
    pub const fn code(self) -> &'static str {
        match self {
            Self::TargetUnavailable => "target_unavailable",
            Self::BandFull => "band_full",
            Self::WindowClosed => "booking_window_closed",
            Self::DuplicateBooking => "duplicate_booking",
            Self::SlotTaken => "slot_taken",
            Self::NotBooked { .. } => "not_booked",
            Self::TooLateToCancel => "cancellation_window_closed",
            Self::TooEarlyToComplete => "not_started",
            Self::TargetMismatch => "target_mismatch",
        }
    }
}

/// New target state to persist alongside a confession change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetUpdate {
    Slot(ConfessionSlot),
    Band(ConfessionBand),
    Unchanged,
}

/// Result of a successful `plan_*` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingPlan {
    pub confession: Confession,
    pub target: TargetUpdate,
}

/// Run the booking chain: status, time window, duplicate, capacity.
pub fn plan_booking(
    request: &BookingRequest,
    target: BookableTarget,
    context: BookingContext,
    now: DateTime<Utc>,
) -> Result<BookingPlan, BookingRejection> {
    if target.reference() != request.target {
        return Err(BookingRejection::TargetMismatch);
    }

    match &target {
        BookableTarget::Slot(slot) if slot.status() != SlotStatus::Available => {
            return Err(BookingRejection::TargetUnavailable);
        }
        BookableTarget::Band(band) => match band.status() {
            BandStatus::Full => return Err(BookingRejection::BandFull),
            BandStatus::Cancelled => return Err(BookingRejection::TargetUnavailable),
            BandStatus::Available => {}
        },
        BookableTarget::Slot(_) => {}
    }

    if now >= target.start_time() {
        return Err(BookingRejection::WindowClosed);
    }

    if context.caller_has_booking {
        return Err(BookingRejection::DuplicateBooking);
    }

    let confession = Confession::booked(
        request.id,
        request.faithful_id,
        target.priest_id(),
        request.target,
        target.start_time(),
        request.notes.clone(),
        now,
    );

    let update = match target {
        BookableTarget::Slot(slot) => {
            if context.active_bookings > 0 {
                return Err(BookingRejection::SlotTaken);
            }
            TargetUpdate::Slot(slot.with_status(SlotStatus::Booked, now))
        }
        BookableTarget::Band(band) => {
            if band.booked_count() >= band.capacity() {
                return Err(BookingRejection::BandFull);
            }
            let booked = band.booked_count() + 1;
            let band = band
                .with_booked_count(booked, now)
                .map_err(|_| BookingRejection::BandFull)?;
            TargetUpdate::Band(band)
        }
    };

    Ok(BookingPlan {
        confession,
        target: update,
    })
}

fn ensure_target_matches(
    confession: &Confession,
    target: &BookableTarget,
) -> Result<(), BookingRejection> {
    if confession.target() == target.reference() {
        Ok(())
    } else {
        Err(BookingRejection::TargetMismatch)
    }
}

fn ensure_booked(confession: &Confession) -> Result<(), BookingRejection> {
    match confession.status() {
        ConfessionStatus::Booked => Ok(()),
        status => Err(BookingRejection::NotBooked { status }),
    }
}

/// Cancel a booked confession before it starts and release its seat.
pub fn plan_cancellation(
    confession: Confession,
    target: BookableTarget,
    now: DateTime<Utc>,
) -> Result<BookingPlan, BookingRejection> {
    ensure_target_matches(&confession, &target)?;
    ensure_booked(&confession)?;
    if now >= confession.scheduled_time() {
        return Err(BookingRejection::TooLateToCancel);
    }

    let update = match target {
        BookableTarget::Slot(slot) if slot.status() == SlotStatus::Booked => {
            TargetUpdate::Slot(slot.with_status(SlotStatus::Available, now))
        }
        BookableTarget::Slot(_) => TargetUpdate::Unchanged,
        BookableTarget::Band(band) => {
            let released = band.booked_count().saturating_sub(1);
            let band = band
                .with_booked_count(released, now)
                .map_err(|_| BookingRejection::TargetUnavailable)?;
            TargetUpdate::Band(band)
        }
    };

    Ok(BookingPlan {
        confession: confession.with_status(ConfessionStatus::Cancelled, now),
        target: update,
    })
}

/// Complete a booked confession once it has started.
pub fn plan_completion(
    confession: Confession,
    target: BookableTarget,
    now: DateTime<Utc>,
) -> Result<BookingPlan, BookingRejection> {
    ensure_target_matches(&confession, &target)?;
    ensure_booked(&confession)?;
    if now < confession.scheduled_time() {
        return Err(BookingRejection::TooEarlyToComplete);
    }

    let update = match target {
        BookableTarget::Slot(slot) => {
            TargetUpdate::Slot(slot.with_status(SlotStatus::Completed, now))
        }
        BookableTarget::Band(_) => TargetUpdate::Unchanged,
    };

    Ok(BookingPlan {
        confession: confession.with_status(ConfessionStatus::Completed, now),
        target: update,
    })
}
