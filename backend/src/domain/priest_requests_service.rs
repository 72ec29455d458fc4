//! Priest parish requests and their review.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use tracing::info;
use uuid::Uuid;

use crate::domain::auth::forbidden;
use crate::domain::ports::{
    ParishRepository, PriestRequestRepository, PriestRequestRepositoryError,
    PriestRequestsService, RequestAcceptance, RequestScope, UserRepository,
};
use crate::domain::service_support::{invalid, load_actor, load_scope, require_user};
use crate::domain::{
    Actor, CallerScope, Error, Parish, PriestParishHistory, PriestParishRequest,
    PriestParishRequestDraft, RequestStatus, UserId, UserRole,
};

/// Request service implementing [`PriestRequestsService`].
#[derive(Clone)]
pub struct PriestRequestsServiceImpl<R, U, P> {
    requests: Arc<R>,
    users: Arc<U>,
    parishes: Arc<P>,
    clock: Arc<dyn Clock>,
}

impl<R, U, P> PriestRequestsServiceImpl<R, U, P> {
    pub fn new(requests: Arc<R>, users: Arc<U>, parishes: Arc<P>, clock: Arc<dyn Clock>) -> Self {
        Self {
            requests,
            users,
            parishes,
            clock,
        }
    }
}

fn may_review(scope: &CallerScope, parish: &Parish) -> bool {
    scope.role() == UserRole::Admin
        || scope.is_bishop_of(parish.diocese_id())
        || scope.is_staff_of(parish.id())
}

fn already_reviewed() -> Error {
    Error::invalid_request("request is no longer pending")
}

impl<R, U, P> PriestRequestsServiceImpl<R, U, P>
where
    R: PriestRequestRepository,
    U: UserRepository,
    P: ParishRepository,
{
    /// Load a pending request and its parish once the caller may review it.
    async fn reviewable(
        &self,
        actor: &Actor,
        id: Uuid,
    ) -> Result<(PriestParishRequest, Parish), Error> {
        let request = self
            .requests
            .find_by_id(id)
            .await?
            .ok_or_else(|| Error::not_found(format!("request {id} not found")))?;
        let parish = self
            .parishes
            .find_by_id(request.parish_id())
            .await?
            .ok_or_else(|| Error::not_found(format!("parish {} not found", request.parish_id())))?;
        let scope = load_scope(self.users.as_ref(), actor).await?;
        if !may_review(&scope, &parish) {
            return Err(forbidden("review requests for this parish"));
        }
        Ok((request, parish))
    }
}

#[async_trait]
impl<R, U, P> PriestRequestsService for PriestRequestsServiceImpl<R, U, P>
where
    R: PriestRequestRepository,
    U: UserRepository,
    P: ParishRepository,
{
    async fn create(
        &self,
        actor: &Actor,
        parish_id: Uuid,
        message: Option<String>,
    ) -> Result<PriestParishRequest, Error> {
        let scope = load_scope(self.users.as_ref(), actor).await?;
        if scope.role() != UserRole::Priest {
            return Err(forbidden("request a parish assignment"));
        }
        self.parishes
            .find_by_id(parish_id)
            .await?
            .filter(Parish::is_active)
            .ok_or_else(|| Error::invalid_request(format!("parish {parish_id} not found")))?;
        if scope.parish_id() == Some(parish_id) {
            return Err(Error::invalid_request("already assigned to this parish"));
        }

        let request = PriestParishRequest::new(PriestParishRequestDraft {
            id: Uuid::new_v4(),
            priest_id: scope.user_id(),
            parish_id,
            message,
            status: RequestStatus::Pending,
            reviewed_by: None,
            reviewed_at: None,
            created_at: self.clock.utc(),
        })
        .map_err(invalid)?;
        self.requests
            .create(&request)
            .await
            .map_err(|err| match err {
                err @ PriestRequestRepositoryError::DuplicatePending => {
                    Error::conflict(err.to_string())
                }
                other => other.into(),
            })?;
        info!(request_id = %request.id(), %parish_id, "priest requested parish");
        Ok(request)
    }

    async fn list(
        &self,
        actor: &Actor,
        status: Option<RequestStatus>,
    ) -> Result<Vec<PriestParishRequest>, Error> {
        let scope = load_scope(self.users.as_ref(), actor).await?;
        let visible = match scope.role() {
            UserRole::Admin => Some(RequestScope::All),
            UserRole::Priest => Some(RequestScope::Priest(scope.user_id())),
            UserRole::Bishop => scope.diocese_id().map(RequestScope::Diocese),
            UserRole::ParishStaff => scope.parish_id().map(RequestScope::Parish),
            UserRole::Faithful => return Err(forbidden("list priest requests")),
        };
        match visible {
            Some(visible) => Ok(self.requests.list(visible, status).await?),
            None => Ok(Vec::new()),
        }
    }

    async fn accept(&self, actor: &Actor, id: Uuid) -> Result<PriestParishRequest, Error> {
        let (request, parish) = self.reviewable(actor, id).await?;
        if !parish.is_active() {
            return Err(Error::invalid_request("parish is no longer active"));
        }
        let now = self.clock.utc();
        let priest_id = request.priest_id();
        let accepted = request
            .reviewed(RequestStatus::Accepted, actor.user_id(), now)
            .map_err(invalid)?;
        let acceptance = RequestAcceptance {
            history: PriestParishHistory::open(priest_id, parish.id(), now),
            request: accepted,
            diocese_id: parish.diocese_id(),
            now,
        };
        if !self.requests.accept(&acceptance).await? {
            return Err(already_reviewed());
        }
        info!(request_id = %id, %priest_id, parish_id = %parish.id(), "accepted priest request");
        Ok(acceptance.request)
    }

    async fn reject(&self, actor: &Actor, id: Uuid) -> Result<PriestParishRequest, Error> {
        let (request, _) = self.reviewable(actor, id).await?;
        let rejected = request
            .reviewed(RequestStatus::Rejected, actor.user_id(), self.clock.utc())
            .map_err(invalid)?;
        if !self.requests.reject(&rejected).await? {
            return Err(already_reviewed());
        }
        info!(request_id = %id, "rejected priest request");
        Ok(rejected)
    }

    async fn history(
        &self,
        actor: &Actor,
        priest_id: UserId,
    ) -> Result<Vec<PriestParishHistory>, Error> {
        let caller = load_actor(self.users.as_ref(), actor).await?;
        if !caller.is(priest_id) {
            caller.require_role(
                &[UserRole::Admin, UserRole::Bishop, UserRole::ParishStaff],
                "view assignment history",
            )?;
        }
        require_user(self.users.as_ref(), priest_id).await?;
        Ok(self.requests.history(priest_id).await?)
    }
}

#[cfg(test)]
#[path = "priest_requests_service_tests.rs"]
mod tests;
