//! Diocese and parish use cases.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use tracing::info;
use uuid::Uuid;

use crate::domain::auth::forbidden;
use crate::domain::ports::{
    DioceseRepository, DiocesesService, NewDiocese, NewParish, ParishRepository, ParishesService,
    UserRepository,
};
use crate::domain::service_support::{invalid, load_actor, load_scope};
use crate::domain::{
    Actor, Diocese, DioceseChanges, DioceseDraft, Error, Parish, ParishChanges, ParishDraft, User,
    UserId, UserRole,
};

async fn require_active_diocese<D>(dioceses: &D, id: Uuid) -> Result<Diocese, Error>
where
    D: DioceseRepository + ?Sized,
{
    dioceses
        .find_by_id(id)
        .await?
        .filter(Diocese::is_active)
        .ok_or_else(|| Error::not_found(format!("diocese {id} not found")))
}

async fn require_active_parish<P>(parishes: &P, id: Uuid) -> Result<Parish, Error>
where
    P: ParishRepository + ?Sized,
{
    parishes
        .find_by_id(id)
        .await?
        .filter(Parish::is_active)
        .ok_or_else(|| Error::not_found(format!("parish {id} not found")))
}

/// Diocese service implementing [`DiocesesService`].
#[derive(Clone)]
pub struct DiocesesServiceImpl<D, P, U> {
    dioceses: Arc<D>,
    parishes: Arc<P>,
    users: Arc<U>,
    clock: Arc<dyn Clock>,
}

impl<D, P, U> DiocesesServiceImpl<D, P, U> {
    pub fn new(
        dioceses: Arc<D>,
        parishes: Arc<P>,
        users: Arc<U>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            dioceses,
            parishes,
            users,
            clock,
        }
    }
}

impl<D, P, U> DiocesesServiceImpl<D, P, U>
where
    D: DioceseRepository,
    P: ParishRepository,
    U: UserRepository,
{
    async fn find_bishop(&self, bishop_id: UserId) -> Result<User, Error> {
        self.users
            .find_by_id(&bishop_id)
            .await?
            .filter(|user| user.is_active() && user.role() == UserRole::Bishop)
            .ok_or_else(|| {
                Error::invalid_request(format!("user {bishop_id} is not an active bishop"))
            })
    }

    /// Make `bishop` the head of `diocese_id`.
    ///
    /// The outgoing head loses the diocese assignment and the incoming one
    /// stops heading any other diocese, so `dioceses.bishop_id` and
    /// `users.diocese_id` name the same bishop.
    async fn assign_bishop(
        &self,
        bishop: User,
        diocese_id: Uuid,
        previous: Option<UserId>,
    ) -> Result<(), Error> {
        let now = self.clock.utc();
        if let Some(previous) = previous.filter(|id| *id != bishop.id()) {
            let outgoing = self
                .users
                .find_by_id(&previous)
                .await?
                .filter(|user| user.diocese_id() == Some(diocese_id));
            if let Some(outgoing) = outgoing {
                let role = outgoing.role();
                self.users
                    .save(&outgoing.with_role(role, None, None, now))
                    .await?;
                info!(user_id = %previous, diocese_id = %diocese_id, "released outgoing bishop");
            }
        }
        self.dioceses
            .release_bishop(bishop.id(), Some(diocese_id), now)
            .await?;
        if bishop.diocese_id() != Some(diocese_id) {
            let moved = bishop.with_role(UserRole::Bishop, Some(diocese_id), None, now);
            self.users.save(&moved).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl<D, P, U> DiocesesService for DiocesesServiceImpl<D, P, U>
where
    D: DioceseRepository,
    P: ParishRepository,
    U: UserRepository,
{
    async fn create(&self, actor: &Actor, diocese: NewDiocese) -> Result<Diocese, Error> {
        load_actor(self.users.as_ref(), actor)
            .await?
            .require_role(&[UserRole::Admin], "create dioceses")?;
        let now = self.clock.utc();
        let created = Diocese::new(DioceseDraft {
            id: Uuid::new_v4(),
            name: diocese.name,
            bishop_id: diocese.bishop_id,
            active: true,
            created_at: now,
            updated_at: now,
        })
        .map_err(invalid)?;
        let bishop = match created.bishop_id() {
            Some(bishop_id) => Some(self.find_bishop(bishop_id).await?),
            None => None,
        };
        self.dioceses.create(&created).await?;
        if let Some(bishop) = bishop {
            self.assign_bishop(bishop, created.id(), None).await?;
        }
        info!(diocese_id = %created.id(), "created diocese");
        Ok(created)
    }

    async fn list(&self, _actor: &Actor) -> Result<Vec<Diocese>, Error> {
        Ok(self.dioceses.list_active().await?)
    }

    async fn get(&self, _actor: &Actor, id: Uuid) -> Result<Diocese, Error> {
        require_active_diocese(self.dioceses.as_ref(), id).await
    }

    async fn update(
        &self,
        actor: &Actor,
        id: Uuid,
        changes: DioceseChanges,
    ) -> Result<Diocese, Error> {
        let scope = load_scope(self.users.as_ref(), actor).await?;
        let is_admin = scope.actor().is_admin();
        let current = require_active_diocese(self.dioceses.as_ref(), id).await?;
        if !(is_admin || scope.is_bishop_of(id)) {
            return Err(forbidden("update this diocese"));
        }
        if changes.bishop_id.is_some() && !is_admin {
            return Err(forbidden("assign a bishop"));
        }
        let bishop = match changes.bishop_id {
            Some(bishop_id) => Some(self.find_bishop(bishop_id).await?),
            None => None,
        };
        let previous = current.bishop_id();
        let updated = current
            .apply(changes, self.clock.utc())
            .map_err(invalid)?;
        self.dioceses.save(&updated).await?;
        if let Some(bishop) = bishop {
            self.assign_bishop(bishop, id, previous).await?;
        }
        Ok(updated)
    }

    async fn delete(&self, actor: &Actor, id: Uuid) -> Result<(), Error> {
        load_actor(self.users.as_ref(), actor)
            .await?
            .require_role(&[UserRole::Admin], "delete dioceses")?;
        let current = require_active_diocese(self.dioceses.as_ref(), id).await?;
        let parishes = self.parishes.count_active_in_diocese(id).await?;
        if parishes > 0 {
            return Err(Error::invalid_request(format!(
                "diocese still has {parishes} active parishes"
            )));
        }
        self.dioceses
            .save(&current.deactivated(self.clock.utc()))
            .await?;
        info!(diocese_id = %id, "deactivated diocese");
        Ok(())
    }
}

/// Parish service implementing [`ParishesService`].
#[derive(Clone)]
pub struct ParishesServiceImpl<P, D, U> {
    parishes: Arc<P>,
    dioceses: Arc<D>,
    users: Arc<U>,
    clock: Arc<dyn Clock>,
}

impl<P, D, U> ParishesServiceImpl<P, D, U> {
    pub fn new(
        parishes: Arc<P>,
        dioceses: Arc<D>,
        users: Arc<U>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            parishes,
            dioceses,
            users,
            clock,
        }
    }
}

#[async_trait]
impl<P, D, U> ParishesService for ParishesServiceImpl<P, D, U>
where
    P: ParishRepository,
    D: DioceseRepository,
    U: UserRepository,
{
    async fn create(&self, actor: &Actor, parish: NewParish) -> Result<Parish, Error> {
        let scope = load_scope(self.users.as_ref(), actor).await?;
        let diocese = self
            .dioceses
            .find_by_id(parish.diocese_id)
            .await?
            .filter(Diocese::is_active)
            .ok_or_else(|| {
                Error::invalid_request(format!("diocese {} not found", parish.diocese_id))
            })?;
        if !(scope.actor().is_admin() || scope.is_bishop_of(diocese.id())) {
            return Err(forbidden("create parishes in this diocese"));
        }
        let now = self.clock.utc();
        let created = Parish::new(ParishDraft {
            id: Uuid::new_v4(),
            diocese_id: diocese.id(),
            name: parish.name,
            address: parish.address,
            location: parish.location,
            active: true,
            created_at: now,
            updated_at: now,
        })
        .map_err(invalid)?;
        self.parishes.create(&created).await?;
        info!(parish_id = %created.id(), diocese_id = %diocese.id(), "created parish");
        Ok(created)
    }

    async fn list(&self, _actor: &Actor, diocese_id: Option<Uuid>) -> Result<Vec<Parish>, Error> {
        Ok(self.parishes.list_active(diocese_id).await?)
    }

    async fn get(&self, _actor: &Actor, id: Uuid) -> Result<Parish, Error> {
        require_active_parish(self.parishes.as_ref(), id).await
    }

    async fn update(
        &self,
        actor: &Actor,
        id: Uuid,
        changes: ParishChanges,
    ) -> Result<Parish, Error> {
        let scope = load_scope(self.users.as_ref(), actor).await?;
        let current = require_active_parish(self.parishes.as_ref(), id).await?;
        let allowed = scope.actor().is_admin()
            || scope.is_bishop_of(current.diocese_id())
            || scope.is_staff_of(id);
        if !allowed {
            return Err(forbidden("update this parish"));
        }
        let updated = current
            .apply(changes, self.clock.utc())
            .map_err(invalid)?;
        self.parishes.save(&updated).await?;
        Ok(updated)
    }

    async fn delete(&self, actor: &Actor, id: Uuid) -> Result<(), Error> {
        let scope = load_scope(self.users.as_ref(), actor).await?;
        let current = require_active_parish(self.parishes.as_ref(), id).await?;
        if !(scope.actor().is_admin() || scope.is_bishop_of(current.diocese_id())) {
            return Err(forbidden("delete this parish"));
        }
        self.parishes
            .save(&current.deactivated(self.clock.utc()))
            .await?;
        info!(parish_id = %id, "deactivated parish");
        Ok(())
    }
}

#[cfg(test)]
#[path = "directory_service_tests.rs"]
mod tests;
