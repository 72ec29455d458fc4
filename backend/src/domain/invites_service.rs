//! Invitation use cases.
//!
//! Authorisation for issuing invites depends on the invited role:
//! admins invite anyone, bishops invite priests and parish staff into
//! parishes of their diocese, parish staff invite priests into their parish.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockable::Clock;
use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::auth::forbidden;
use crate::domain::invite::invite_ttl;
use crate::domain::ports::{
    DioceseRepository, InviteGrant, InviteRegistration, InviteRepository, InviteRepositoryError,
    InvitesService, IssuedInvite, NewInvite, ParishRepository, PasswordHasher, UserRepository,
};
use crate::domain::service_support::{invalid, load_actor, load_caller, load_scope};
use crate::domain::{
    Actor, CallerScope, Diocese, Error, Invite, InviteDraft, InviteStateError, InviteStatus,
    InviteToken, Parish, PriestParishHistory, User, UserDraft, UserId, UserRole,
};

/// Invite service implementing [`InvitesService`].
#[derive(Clone)]
pub struct InvitesServiceImpl<I, U, P, D> {
    invites: Arc<I>,
    users: Arc<U>,
    parishes: Arc<P>,
    dioceses: Arc<D>,
    hasher: Arc<dyn PasswordHasher>,
    clock: Arc<dyn Clock>,
}

impl<I, U, P, D> InvitesServiceImpl<I, U, P, D> {
    pub fn new(
        invites: Arc<I>,
        users: Arc<U>,
        parishes: Arc<P>,
        dioceses: Arc<D>,
        hasher: Arc<dyn PasswordHasher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            invites,
            users,
            parishes,
            dioceses,
            hasher,
            clock,
        }
    }
}

fn may_issue(
    scope: &CallerScope,
    role: UserRole,
    diocese_id: Option<Uuid>,
    parish_id: Option<Uuid>,
) -> bool {
    match scope.role() {
        UserRole::Admin => true,
        UserRole::Bishop => {
            matches!(role, UserRole::Priest | UserRole::ParishStaff)
                && diocese_id.is_some_and(|id| scope.is_bishop_of(id))
        }
        UserRole::ParishStaff => {
            role == UserRole::Priest && parish_id.is_some_and(|id| scope.is_staff_of(id))
        }
        UserRole::Faithful | UserRole::Priest => false,
    }
}

/// Role change plus the assignment history a priest invite opens.
fn grant(invite: &Invite, user: User, now: DateTime<Utc>) -> InviteGrant {
    let user = user.with_role(invite.role(), invite.diocese_id(), invite.parish_id(), now);
    let history = match (invite.role(), invite.parish_id()) {
        (UserRole::Priest, Some(parish_id)) => {
            Some(PriestParishHistory::open(user.id(), parish_id, now))
        }
        _ => None,
    };
    InviteGrant {
        invite_id: invite.id(),
        user,
        history,
    }
}

fn lost_race() -> Error {
    Error::invalid_request("invite is no longer pending")
}

impl<I, U, P, D> InvitesServiceImpl<I, U, P, D>
where
    I: InviteRepository,
    U: UserRepository,
    P: ParishRepository,
    D: DioceseRepository,
{
    /// Resolve the invite's target, returning the diocese to store with it.
    async fn resolve_target(&self, invite: &NewInvite) -> Result<Option<Uuid>, Error> {
        if let Some(parish_id) = invite.parish_id {
            let parish = self
                .parishes
                .find_by_id(parish_id)
                .await?
                .filter(Parish::is_active)
                .ok_or_else(|| Error::invalid_request(format!("parish {parish_id} not found")))?;
            if invite.diocese_id.is_some_and(|id| id != parish.diocese_id()) {
                return Err(Error::invalid_request(
                    "dioceseId does not match the parish's diocese",
                ));
            }
            return Ok(Some(parish.diocese_id()));
        }
        if let Some(diocese_id) = invite.diocese_id {
            self.dioceses
                .find_by_id(diocese_id)
                .await?
                .filter(Diocese::is_active)
                .ok_or_else(|| Error::invalid_request(format!("diocese {diocese_id} not found")))?;
        }
        Ok(invite.diocese_id)
    }

    /// Find a pending, unexpired invite, persisting expiry when it lapsed.
    async fn usable_invite(&self, token: &InviteToken) -> Result<Invite, Error> {
        let invite = self
            .invites
            .find_by_digest(&token.digest())
            .await?
            .ok_or_else(|| Error::not_found("invite not found"))?;
        let now = self.clock.utc();
        if let Err(state) = invite.ensure_usable(now) {
            if state == InviteStateError::Expired && invite.status() == InviteStatus::Pending {
                self.invites
                    .transition(invite.id(), InviteStatus::Pending, InviteStatus::Expired)
                    .await?;
                info!(invite_id = %invite.id(), "invite expired");
            }
            return Err(Error::invalid_request(state.to_string()));
        }
        Ok(invite)
    }
}

#[async_trait]
impl<I, U, P, D> InvitesService for InvitesServiceImpl<I, U, P, D>
where
    I: InviteRepository,
    U: UserRepository,
    P: ParishRepository,
    D: DioceseRepository,
{
    async fn create(&self, actor: &Actor, invite: NewInvite) -> Result<IssuedInvite, Error> {
        let scope = load_scope(self.users.as_ref(), actor).await?;
        let ttl = invite_ttl(invite.ttl_days).map_err(invalid)?;
        let diocese_id = self.resolve_target(&invite).await?;
        if !may_issue(&scope, invite.role, diocese_id, invite.parish_id) {
            return Err(forbidden(&format!("invite a {}", invite.role)));
        }

        let now = self.clock.utc();
        let token = InviteToken::generate();
        let stored = Invite::new(InviteDraft {
            id: Uuid::new_v4(),
            token_digest: token.digest(),
            email: invite.email,
            role: invite.role,
            parish_id: invite.parish_id,
            diocese_id,
            invited_by: scope.user_id(),
            status: InviteStatus::Pending,
            expires_at: now + ttl,
            created_at: now,
        })
        .map_err(invalid)?;
        self.invites.create(&stored).await?;
        info!(invite_id = %stored.id(), role = %stored.role(), "issued invite");
        Ok(IssuedInvite {
            invite: stored,
            token,
        })
    }

    async fn list(&self, actor: &Actor) -> Result<Vec<Invite>, Error> {
        let caller = load_actor(self.users.as_ref(), actor).await?;
        let invited_by = (!caller.is_admin()).then(|| caller.user_id());
        Ok(self.invites.list(invited_by).await?)
    }

    async fn inspect(&self, token: &InviteToken) -> Result<Invite, Error> {
        self.usable_invite(token).await
    }

    async fn accept(&self, actor: &Actor, token: &InviteToken) -> Result<User, Error> {
        let invite = self.usable_invite(token).await?;
        let user = load_caller(self.users.as_ref(), actor).await?;
        CallerScope::from_user(&user)?;
        if !invite.is_addressed_to(user.email()) {
            warn!(invite_id = %invite.id(), user_id = %user.id(), "invite email mismatch");
            return Err(forbidden("accept an invite addressed to another email"));
        }

        let grant = grant(&invite, user, self.clock.utc());
        if !self.invites.accept(&grant).await? {
            return Err(lost_race());
        }
        info!(invite_id = %invite.id(), user_id = %grant.user.id(), "accepted invite");
        Ok(grant.user)
    }

    async fn register(
        &self,
        token: &InviteToken,
        registration: InviteRegistration,
    ) -> Result<User, Error> {
        let invite = self.usable_invite(token).await?;
        let now = self.clock.utc();
        let user = User::new(UserDraft {
            id: UserId::random(),
            email: invite.email().clone(),
            first_name: registration.first_name,
            last_name: registration.last_name,
            phone: registration.phone,
            role: UserRole::Faithful,
            diocese_id: None,
            parish_id: None,
            active: true,
            created_at: now,
            updated_at: now,
        })
        .map_err(invalid)?;
        let grant = grant(&invite, user, now);
        let hash = self.hasher.hash(registration.password.expose())?;

        let accepted = self
            .invites
            .register(&grant, &hash)
            .await
            .map_err(|err| match err {
                InviteRepositoryError::DuplicateEmail { email } => {
                    Error::conflict(format!("email {email} is already registered"))
                }
                other => other.into(),
            })?;
        if !accepted {
            return Err(lost_race());
        }
        info!(invite_id = %invite.id(), user_id = %grant.user.id(), "registered from invite");
        Ok(grant.user)
    }

    async fn revoke(&self, actor: &Actor, id: Uuid) -> Result<Invite, Error> {
        let caller = load_actor(self.users.as_ref(), actor).await?;
        let invite = self
            .invites
            .find_by_id(id)
            .await?
            .ok_or_else(|| Error::not_found(format!("invite {id} not found")))?;
        if !(caller.is_admin() || caller.is(invite.invited_by())) {
            return Err(forbidden("revoke this invite"));
        }
        if invite.status() != InviteStatus::Pending {
            return Err(Error::invalid_request(format!(
                "only pending invites can be revoked; this one is {}",
                invite.status()
            )));
        }
        if !self
            .invites
            .transition(id, InviteStatus::Pending, InviteStatus::Revoked)
            .await?
        {
            return Err(lost_race());
        }
        info!(invite_id = %id, "revoked invite");
        Ok(invite.with_status(InviteStatus::Revoked))
    }
}

#[cfg(test)]
#[path = "invites_service_tests.rs"]
mod tests;
