//! User administration use cases.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use tracing::info;

use crate::domain::auth::forbidden;
use crate::domain::ports::{
    DioceseRepository, ParishRepository, RoleAssignment, UserListFilter, UserRepository,
    UserScope, UsersService,
};
use crate::domain::service_support::{load_scope, require_user};
use crate::domain::{Actor, CallerScope, Error, ProfileChanges, User, UserId, UserRole};

/// User service implementing [`UsersService`].
#[derive(Clone)]
pub struct UsersServiceImpl<U, P, D> {
    users: Arc<U>,
    parishes: Arc<P>,
    dioceses: Arc<D>,
    clock: Arc<dyn Clock>,
}

impl<U, P, D> UsersServiceImpl<U, P, D> {
    pub fn new(users: Arc<U>, parishes: Arc<P>, dioceses: Arc<D>, clock: Arc<dyn Clock>) -> Self {
        Self {
            users,
            parishes,
            dioceses,
            clock,
        }
    }
}

fn can_view(scope: &CallerScope, target: &User) -> bool {
    scope.user_id() == target.id()
        || scope.actor().is_admin()
        || target.diocese_id().is_some_and(|id| scope.is_bishop_of(id))
        || target.parish_id().is_some_and(|id| scope.is_staff_of(id))
}

impl<U, P, D> UsersServiceImpl<U, P, D>
where
    U: UserRepository,
    P: ParishRepository,
    D: DioceseRepository,
{
    async fn require_admin(&self, actor: &Actor, action: &str) -> Result<CallerScope, Error> {
        let scope = load_scope(self.users.as_ref(), actor).await?;
        scope.actor().require_role(&[UserRole::Admin], action)?;
        Ok(scope)
    }

    /// Resolve the diocese for a parish assignment and check the role's
    /// association requirements.
    async fn resolve_assignment(&self, assignment: RoleAssignment) -> Result<RoleAssignment, Error> {
        let mut resolved = assignment;
        if let Some(parish_id) = assignment.parish_id {
            let parish = self
                .parishes
                .find_by_id(parish_id)
                .await?
                .filter(|parish| parish.is_active())
                .ok_or_else(|| Error::invalid_request(format!("parish {parish_id} not found")))?;
            if assignment
                .diocese_id
                .is_some_and(|diocese| diocese != parish.diocese_id())
            {
                return Err(Error::invalid_request(
                    "dioceseId does not match the parish's diocese",
                ));
            }
            resolved.diocese_id = Some(parish.diocese_id());
        }

        match assignment.role {
            UserRole::Priest | UserRole::ParishStaff if resolved.parish_id.is_none() => Err(
                Error::invalid_request(format!("{} requires a parishId", assignment.role)),
            ),
            UserRole::Bishop if resolved.diocese_id.is_none() => {
                Err(Error::invalid_request("bishop requires a dioceseId"))
            }
            _ => Ok(resolved),
        }
    }
}

#[async_trait]
impl<U, P, D> UsersService for UsersServiceImpl<U, P, D>
where
    U: UserRepository,
    P: ParishRepository,
    D: DioceseRepository,
{
    async fn list(&self, actor: &Actor, filter: UserListFilter) -> Result<Vec<User>, Error> {
        let scope = load_scope(self.users.as_ref(), actor).await?;
        let visible = match (scope.role(), scope.diocese_id(), scope.parish_id()) {
            (UserRole::Admin, _, _) => UserScope::All,
            (UserRole::Bishop, Some(diocese), _) => UserScope::Diocese(diocese),
            (UserRole::ParishStaff, _, Some(parish)) => UserScope::Parish(parish),
            (UserRole::Bishop | UserRole::ParishStaff, _, _) => return Ok(Vec::new()),
            _ => return Err(forbidden("list users")),
        };
        Ok(self.users.list(visible, filter).await?)
    }

    async fn get(&self, actor: &Actor, id: UserId) -> Result<User, Error> {
        let scope = load_scope(self.users.as_ref(), actor).await?;
        let target = require_user(self.users.as_ref(), id).await?;
        if !can_view(&scope, &target) {
            return Err(forbidden("view this user"));
        }
        Ok(target)
    }

    async fn update_profile(
        &self,
        actor: &Actor,
        id: UserId,
        changes: ProfileChanges,
    ) -> Result<User, Error> {
        let scope = load_scope(self.users.as_ref(), actor).await?;
        if !(scope.user_id() == id || scope.actor().is_admin()) {
            return Err(forbidden("update this profile"));
        }
        let user = require_user(self.users.as_ref(), id)
            .await?
            .with_profile(changes, self.clock.utc());
        self.users.save(&user).await?;
        Ok(user)
    }

    async fn change_role(
        &self,
        actor: &Actor,
        id: UserId,
        assignment: RoleAssignment,
    ) -> Result<User, Error> {
        self.require_admin(actor, "change roles").await?;
        let assignment = self.resolve_assignment(assignment).await?;
        let now = self.clock.utc();
        let user = require_user(self.users.as_ref(), id).await?.with_role(
            assignment.role,
            assignment.diocese_id,
            assignment.parish_id,
            now,
        );
        self.users.save(&user).await?;
        // A bishop heads at most the diocese they are assigned to.
        let keep = match assignment.role {
            UserRole::Bishop => assignment.diocese_id,
            _ => None,
        };
        self.dioceses.release_bishop(id, keep, now).await?;
        info!(user_id = %id, role = %assignment.role, "changed user role");
        Ok(user)
    }

    async fn deactivate(&self, actor: &Actor, id: UserId) -> Result<(), Error> {
        let scope = self.require_admin(actor, "deactivate users").await?;
        if scope.user_id() == id {
            return Err(Error::invalid_request("you cannot deactivate your own account"));
        }
        let now = self.clock.utc();
        let user = require_user(self.users.as_ref(), id)
            .await?
            .deactivated(now);
        self.users.save(&user).await?;
        self.dioceses.release_bishop(id, None, now).await?;
        info!(user_id = %id, "deactivated user");
        Ok(())
    }
}

#[cfg(test)]
#[path = "users_service_tests.rs"]
mod tests;
