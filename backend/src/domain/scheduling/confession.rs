//! Confession booking entity.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::{SchedulingValidationError, validate_notes};
use crate::domain::UserId;
use crate::domain::text_enum::text_enum;

text_enum! {
    /// Confession lifecycle state.
    pub enum ConfessionStatus, parse error ParseConfessionStatusError ("confession status") {
        Booked => "booked",
        Completed => "completed",
        Cancelled => "cancelled",
    }
}

/// What a confession is booked against: exactly one slot or one band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BookingTarget {
    Slot(Uuid),
    Band(Uuid),
}

impl BookingTarget {
    /// Build a target from the nullable column pair.
    ///
    /// # Examples
    /// ```
    /// use confesapp::domain::scheduling::BookingTarget;
    /// use uuid::Uuid;
    ///
    /// let slot = Uuid::new_v4();
    /// assert_eq!(BookingTarget::from_parts(Some(slot), None), Ok(BookingTarget::Slot(slot)));
    /// assert!(BookingTarget::from_parts(None, None).is_err());
    /// assert!(BookingTarget::from_parts(Some(slot), Some(Uuid::new_v4())).is_err());
    /// ```
    pub fn from_parts(
        slot_id: Option<Uuid>,
        band_id: Option<Uuid>,
    ) -> Result<Self, SchedulingValidationError> {
        match (slot_id, band_id) {
            (Some(slot), None) => Ok(Self::Slot(slot)),
            (None, Some(band)) => Ok(Self::Band(band)),
            _ => Err(SchedulingValidationError::AmbiguousTarget),
        }
    }

    pub fn slot_id(&self) -> Option<Uuid> {
        match self {
            Self::Slot(id) => Some(*id),
            Self::Band(_) => None,
        }
    }

    pub fn band_id(&self) -> Option<Uuid> {
        match self {
            Self::Band(id) => Some(*id),
            Self::Slot(_) => None,
        }
    }
}

/// Input payload for [`Confession::new`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfessionDraft {
    pub id: Uuid,
    pub faithful_id: UserId,
    pub priest_id: UserId,
    pub target: BookingTarget,
    pub scheduled_time: DateTime<Utc>,
    pub status: ConfessionStatus,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A faithful's appointment against a slot or band.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Confession {
    id: Uuid,
    faithful_id: UserId,
    priest_id: UserId,
    target: BookingTarget,
    scheduled_time: DateTime<Utc>,
    status: ConfessionStatus,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Confession {
    /// Validate and construct a confession.
    pub fn new(draft: ConfessionDraft) -> Result<Self, SchedulingValidationError> {
        Self::try_from(draft)
    }

    /// Stable confession identifier.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Penitent who booked.
    pub fn faithful_id(&self) -> UserId {
        self.faithful_id
    }

    /// Priest hearing the confession.
    pub fn priest_id(&self) -> UserId {
        self.priest_id
    }

    /// Slot or band the confession holds.
    pub fn target(&self) -> BookingTarget {
        self.target
    }

    /// Start of the booked slot or band.
    pub fn scheduled_time(&self) -> DateTime<Utc> {
        self.scheduled_time
    }

    /// Lifecycle state.
    pub fn status(&self) -> ConfessionStatus {
        self.status
    }

    /// Notes for the priest.
    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    /// When the booking was made.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// When the confession last changed.
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Fresh booking whose notes were validated by [`super::validate_notes`].
    pub(super) fn booked(
        id: Uuid,
        faithful_id: UserId,
        priest_id: UserId,
        target: BookingTarget,
        scheduled_time: DateTime<Utc>,
        notes: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            faithful_id,
            priest_id,
            target,
            scheduled_time,
            status: ConfessionStatus::Booked,
            notes,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether `user_id` is the faithful or the priest of this confession.
    pub fn involves(&self, user_id: UserId) -> bool {
        self.faithful_id == user_id || self.priest_id == user_id
    }

    #[must_use]
    pub fn with_status(mut self, status: ConfessionStatus, now: DateTime<Utc>) -> Self {
        self.status = status;
        self.updated_at = now;
        self
    }
}

impl TryFrom<ConfessionDraft> for Confession {
    type Error = SchedulingValidationError;

    fn try_from(draft: ConfessionDraft) -> Result<Self, Self::Error> {
        Ok(Self {
            id: draft.id,
            faithful_id: draft.faithful_id,
            priest_id: draft.priest_id,
            target: draft.target,
            scheduled_time: draft.scheduled_time,
            status: draft.status,
            notes: validate_notes(draft.notes)?,
            created_at: draft.created_at,
            updated_at: draft.updated_at,
        })
    }
}
