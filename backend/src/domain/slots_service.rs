//! Single-booking confession slots.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use tracing::info;
use uuid::Uuid;

use crate::domain::ports::{
    ConfessionSlotRepository, ConfessionSlotRepositoryError, ConfessionSlotsService, NewSlot,
    ScheduleFilter, UserRepository,
};
use crate::domain::scheduling::{
    ConfessionSlot, ConfessionSlotDraft, SLOT_MAX_HOURS, SlotChanges, SlotStatus, TimeWindow,
};
use crate::domain::service_support::{
    ensure_owner_or_admin, invalid_schedule, load_actor, load_assigned_priest,
};
use crate::domain::{Actor, Error, UserId};

/// Slot service implementing [`ConfessionSlotsService`].
#[derive(Clone)]
pub struct ConfessionSlotsServiceImpl<S, U> {
    slots: Arc<S>,
    users: Arc<U>,
    clock: Arc<dyn Clock>,
}

impl<S, U> ConfessionSlotsServiceImpl<S, U> {
    pub fn new(slots: Arc<S>, users: Arc<U>, clock: Arc<dyn Clock>) -> Self {
        Self {
            slots,
            users,
            clock,
        }
    }
}

fn not_available(status: SlotStatus) -> Error {
    Error::invalid_request(format!(
        "only available slots can be updated; this one is {status}"
    ))
}

impl<S, U> ConfessionSlotsServiceImpl<S, U>
where
    S: ConfessionSlotRepository,
    U: UserRepository,
{
    async fn require_slot(&self, id: Uuid) -> Result<ConfessionSlot, Error> {
        self.slots
            .find_by_id(id)
            .await?
            .ok_or_else(|| Error::not_found(format!("confession slot {id} not found")))
    }

    async fn ensure_free(
        &self,
        priest_id: UserId,
        window: TimeWindow,
        exclude: Option<Uuid>,
    ) -> Result<(), Error> {
        if self.slots.has_overlap(priest_id, window, exclude).await? {
            return Err(Error::invalid_request(
                "slot overlaps another slot of the same priest",
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl<S, U> ConfessionSlotsService for ConfessionSlotsServiceImpl<S, U>
where
    S: ConfessionSlotRepository,
    U: UserRepository,
{
    async fn create(&self, actor: &Actor, slot: NewSlot) -> Result<ConfessionSlot, Error> {
        let (scope, parish_id) =
            load_assigned_priest(self.users.as_ref(), actor, "create confession slots").await?;
        let now = self.clock.utc();
        let window = TimeWindow::new(slot.start_time, slot.end_time)
            .and_then(|window| window.ensure_max_hours(SLOT_MAX_HOURS))
            .and_then(|window| window.ensure_future(now))
            .map_err(invalid_schedule)?;
        self.ensure_free(scope.user_id(), window, None).await?;

        let created = ConfessionSlot::new(ConfessionSlotDraft {
            id: Uuid::new_v4(),
            priest_id: scope.user_id(),
            parish_id,
            window,
            status: SlotStatus::Available,
            notes: slot.notes,
            created_at: now,
            updated_at: now,
        })
        .map_err(invalid_schedule)?;
        self.slots.create(&created).await?;
        info!(slot_id = %created.id(), priest_id = %scope.user_id(), "created confession slot");
        Ok(created)
    }

    async fn list(&self, filter: ScheduleFilter<SlotStatus>) -> Result<Vec<ConfessionSlot>, Error> {
        Ok(self.slots.list(filter).await?)
    }

    async fn get(&self, id: Uuid) -> Result<ConfessionSlot, Error> {
        self.require_slot(id).await
    }

    async fn update(
        &self,
        actor: &Actor,
        id: Uuid,
        changes: SlotChanges,
    ) -> Result<ConfessionSlot, Error> {
        let caller = load_actor(self.users.as_ref(), actor).await?;
        let current = self.require_slot(id).await?;
        ensure_owner_or_admin(&caller, current.priest_id(), "update this slot")?;
        if !current.is_available() {
            return Err(not_available(current.status()));
        }
        let previous = current.window();
        let updated = current
            .apply(changes, self.clock.utc())
            .map_err(invalid_schedule)?;
        if updated.window() != previous {
            self.ensure_free(updated.priest_id(), updated.window(), Some(id))
                .await?;
        }
        if !self.slots.update_available(&updated).await? {
            let status = self.require_slot(id).await?.status();
            return Err(not_available(status));
        }
        Ok(updated)
    }

    async fn delete(&self, actor: &Actor, id: Uuid) -> Result<(), Error> {
        let caller = load_actor(self.users.as_ref(), actor).await?;
        let current = self.require_slot(id).await?;
        ensure_owner_or_admin(&caller, current.priest_id(), "delete this slot")?;
        if current.status() == SlotStatus::Booked {
            return Err(Error::invalid_request("a booked slot cannot be deleted"));
        }
        self.slots.delete(id).await.map_err(|err| match err {
            err @ ConfessionSlotRepositoryError::Referenced => {
                Error::invalid_request(err.to_string())
            }
            other => other.into(),
        })?;
        info!(slot_id = %id, "deleted confession slot");
        Ok(())
    }
}

#[cfg(test)]
#[path = "slots_service_tests.rs"]
mod tests;
