//! Single-booking confession slot.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::{SLOT_MAX_HOURS, SchedulingValidationError, TimeWindow, validate_notes};
use crate::domain::UserId;
use crate::domain::text_enum::text_enum;

text_enum! {
    /// Slot lifecycle state.
    pub enum SlotStatus, parse error ParseSlotStatusError ("slot status") {
        Available => "available",
        Booked => "booked",
        Completed => "completed",
    }
}

/// Input payload for [`ConfessionSlot::new`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfessionSlotDraft {
    pub id: Uuid,
    pub priest_id: UserId,
    pub parish_id: Uuid,
    pub window: TimeWindow,
    pub status: SlotStatus,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Partial update for an available slot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SlotChanges {
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    /// `Some(None)` clears the notes.
    pub notes: Option<Option<String>>,
}

/// Priest-defined window taking exactly one booking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfessionSlot {
    id: Uuid,
    priest_id: UserId,
    parish_id: Uuid,
    window: TimeWindow,
    status: SlotStatus,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ConfessionSlot {
    /// Validate and construct a slot. Time rules for new slots are checked
    /// by [`TimeWindow::ensure_future`] at the call site; stored slots may be
    /// in the past.
    pub fn new(draft: ConfessionSlotDraft) -> Result<Self, SchedulingValidationError> {
        Self::try_from(draft)
    }

    /// Stable slot identifier.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Priest offering the slot.
    pub fn priest_id(&self) -> UserId {
        self.priest_id
    }

    /// Parish the slot is held in.
    pub fn parish_id(&self) -> Uuid {
        self.parish_id
    }

    /// Start and end of the slot.
    pub fn window(&self) -> TimeWindow {
        self.window
    }

    /// When the slot opens.
    pub fn start_time(&self) -> DateTime<Utc> {
        self.window.start()
    }

    /// When the slot closes.
    pub fn end_time(&self) -> DateTime<Utc> {
        self.window.end()
    }

    /// Booking state of the slot.
    pub fn status(&self) -> SlotStatus {
        self.status
    }

    /// Free-text notes shown to penitents.
    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    /// When the slot was created.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// When the slot last changed.
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn is_available(&self) -> bool {
        self.status == SlotStatus::Available
    }

    /// Apply a partial update, re-validating the window against `now`.
    pub fn apply(
        mut self,
        changes: SlotChanges,
        now: DateTime<Utc>,
    ) -> Result<Self, SchedulingValidationError> {
        let start = changes.start_time.unwrap_or(self.window.start());
        let end = changes.end_time.unwrap_or(self.window.end());
        self.window = TimeWindow::new(start, end)?
            .ensure_max_hours(SLOT_MAX_HOURS)?
            .ensure_future(now)?;
        if let Some(notes) = changes.notes {
            self.notes = validate_notes(notes)?;
        }
        self.updated_at = now;
        Ok(self)
    }

    #[must_use]
    pub fn with_status(mut self, status: SlotStatus, now: DateTime<Utc>) -> Self {
        self.status = status;
        self.updated_at = now;
        self
    }
}

impl TryFrom<ConfessionSlotDraft> for ConfessionSlot {
    type Error = SchedulingValidationError;

    fn try_from(draft: ConfessionSlotDraft) -> Result<Self, Self::Error> {
        Ok(Self {
            id: draft.id,
            priest_id: draft.priest_id,
            parish_id: draft.parish_id,
            window: draft.window.ensure_max_hours(SLOT_MAX_HOURS)?,
            status: draft.status,
            notes: validate_notes(draft.notes)?,
            created_at: draft.created_at,
            updated_at: draft.updated_at,
        })
    }
}
