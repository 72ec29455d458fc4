//! Booking, cancelling and completing confessions.
//!
//! The booking rules themselves live in [`crate::domain::scheduling::booking`]
//! and run inside the repository transaction. This service decides who may
//! trigger each transition and maps refusals onto API errors.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use tracing::info;
use uuid::Uuid;

use crate::domain::auth::forbidden;
use crate::domain::ports::{
    BookConfession, ConfessionRepository, ConfessionRepositoryError, ConfessionsService,
    UserRepository,
};
use crate::domain::scheduling::{BookingRequest, Confession, ConfessionStatus};
use crate::domain::service_support::{booking_rejected, invalid_schedule, load_actor, load_scope};
use crate::domain::{Actor, Error, UserRole};

/// Booking service implementing [`ConfessionsService`].
#[derive(Clone)]
pub struct ConfessionsServiceImpl<C, U> {
    confessions: Arc<C>,
    users: Arc<U>,
    clock: Arc<dyn Clock>,
}

impl<C, U> ConfessionsServiceImpl<C, U> {
    pub fn new(confessions: Arc<C>, users: Arc<U>, clock: Arc<dyn Clock>) -> Self {
        Self {
            confessions,
            users,
            clock,
        }
    }
}

fn confession_not_found(id: Uuid) -> Error {
    Error::not_found(format!("confession {id} not found"))
}

fn transition_error(id: Uuid, err: ConfessionRepositoryError) -> Error {
    match err {
        ConfessionRepositoryError::Rejected { reason } => booking_rejected(reason),
        ConfessionRepositoryError::ConfessionNotFound => confession_not_found(id),
        err @ ConfessionRepositoryError::TargetNotFound => Error::not_found(err.to_string()),
        other => other.into(),
    }
}

impl<C, U> ConfessionsServiceImpl<C, U>
where
    C: ConfessionRepository,
    U: UserRepository,
{
    async fn require_confession(&self, id: Uuid) -> Result<Confession, Error> {
        self.confessions
            .find_by_id(id)
            .await?
            .ok_or_else(|| confession_not_found(id))
    }
}

#[async_trait]
impl<C, U> ConfessionsService for ConfessionsServiceImpl<C, U>
where
    C: ConfessionRepository,
    U: UserRepository,
{
    async fn book(&self, actor: &Actor, booking: BookConfession) -> Result<Confession, Error> {
        let scope = load_scope(self.users.as_ref(), actor).await?;
        let request = BookingRequest::new(
            scope.user_id(),
            booking.slot_id,
            booking.band_id,
            booking.notes,
        )
        .map_err(invalid_schedule)?;
        let confession = self
            .confessions
            .book(&request, self.clock.utc())
            .await
            .map_err(|err| transition_error(request.id(), err))?;
        info!(
            confession_id = %confession.id(),
            faithful_id = %confession.faithful_id(),
            priest_id = %confession.priest_id(),
            "booked confession"
        );
        Ok(confession)
    }

    async fn cancel(&self, actor: &Actor, id: Uuid) -> Result<Confession, Error> {
        let caller = load_actor(self.users.as_ref(), actor).await?;
        let current = self.require_confession(id).await?;
        if !(caller.is_admin() || current.involves(caller.user_id())) {
            return Err(forbidden("cancel this confession"));
        }
        let cancelled = self
            .confessions
            .cancel(id, self.clock.utc())
            .await
            .map_err(|err| transition_error(id, err))?;
        info!(confession_id = %id, "cancelled confession");
        Ok(cancelled)
    }

    async fn complete(&self, actor: &Actor, id: Uuid) -> Result<Confession, Error> {
        let caller = load_actor(self.users.as_ref(), actor).await?;
        let current = self.require_confession(id).await?;
        if !(caller.is_admin() || caller.is(current.priest_id())) {
            return Err(forbidden("complete this confession"));
        }
        let completed = self
            .confessions
            .complete(id, self.clock.utc())
            .await
            .map_err(|err| transition_error(id, err))?;
        info!(confession_id = %id, "completed confession");
        Ok(completed)
    }

    async fn get(&self, actor: &Actor, id: Uuid) -> Result<Confession, Error> {
        let caller = load_actor(self.users.as_ref(), actor).await?;
        let confession = self.require_confession(id).await?;
        if !(caller.is_admin() || confession.involves(caller.user_id())) {
            return Err(forbidden("view this confession"));
        }
        Ok(confession)
    }

    async fn list_mine(&self, actor: &Actor) -> Result<Vec<Confession>, Error> {
        let caller = load_actor(self.users.as_ref(), actor).await?;
        Ok(self.confessions.list_for_faithful(caller.user_id()).await?)
    }

    async fn list_for_priest(
        &self,
        actor: &Actor,
        status: Option<ConfessionStatus>,
    ) -> Result<Vec<Confession>, Error> {
        let caller = load_actor(self.users.as_ref(), actor).await?;
        caller.require_role(&[UserRole::Priest], "list priest confessions")?;
        Ok(self
            .confessions
            .list_for_priest(caller.user_id(), status)
            .await?)
    }
}

#[cfg(test)]
#[path = "confessions_service_tests.rs"]
mod tests;
