//! Port for confession slot persistence.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::UserId;
use crate::domain::scheduling::{ConfessionSlot, SlotStatus, TimeWindow};

use super::{ScheduleFilter, define_port_error};

define_port_error! {
    /// Persistence errors raised by slot repository adapters.
    pub enum ConfessionSlotRepositoryError ("slot repository") {
        /// Confessions still reference the slot.
        Referenced => "confessions still reference this slot",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ConfessionSlotRepository: Send + Sync {
    async fn create(&self, slot: &ConfessionSlot) -> Result<(), ConfessionSlotRepositoryError>;

    async fn find_by_id(
        &self,
        id: Uuid,
    ) -> Result<Option<ConfessionSlot>, ConfessionSlotRepositoryError>;

    /// Slots ordered by start time.
    async fn list(
        &self,
        filter: ScheduleFilter<SlotStatus>,
    ) -> Result<Vec<ConfessionSlot>, ConfessionSlotRepositoryError>;

    /// Whether the priest has a non-completed slot overlapping `window`,
    /// ignoring `exclude`.
    async fn has_overlap(
        &self,
        priest_id: UserId,
        window: TimeWindow,
        exclude: Option<Uuid>,
    ) -> Result<bool, ConfessionSlotRepositoryError>;

    /// Overwrite the slot only while the stored row is still available.
    ///
    /// Returns `false` when the slot was booked or completed since it was
    /// read, leaving the row untouched.
    async fn update_available(
        &self,
        slot: &ConfessionSlot,
    ) -> Result<bool, ConfessionSlotRepositoryError>;

    /// Hard delete. Fails with `Referenced` when confessions point at it.
    async fn delete(&self, id: Uuid) -> Result<(), ConfessionSlotRepositoryError>;
}
