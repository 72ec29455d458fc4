//! Driving port for user administration.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{Actor, Error, ProfileChanges, User, UserId, UserRole};

use super::UserListFilter;

/// New role and association set by an admin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleAssignment {
    pub role: UserRole,
    pub diocese_id: Option<Uuid>,
    pub parish_id: Option<Uuid>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UsersService: Send + Sync {
    async fn list(&self, actor: &Actor, filter: UserListFilter) -> Result<Vec<User>, Error>;

    async fn get(&self, actor: &Actor, id: UserId) -> Result<User, Error>;

    async fn update_profile(
        &self,
        actor: &Actor,
        id: UserId,
        changes: ProfileChanges,
    ) -> Result<User, Error>;

    async fn change_role(
        &self,
        actor: &Actor,
        id: UserId,
        assignment: RoleAssignment,
    ) -> Result<User, Error>;

    async fn deactivate(&self, actor: &Actor, id: UserId) -> Result<(), Error>;
}
