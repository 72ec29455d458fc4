//! Port abstraction for user persistence adapters and their errors.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{Email, User, UserId, UserRole};

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by user repository adapters.
    pub enum UserRepositoryError ("user repository") {
        /// Another account already uses the address.
        DuplicateEmail { email: String } => "email {email} is already registered",
    }
}

/// A user together with the stored password hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredCredentials {
    pub user: User,
    pub password_hash: String,
}

/// Which users a caller may see.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserScope {
    All,
    /// Users whose diocese is the given one.
    Diocese(Uuid),
    /// Users whose parish is the given one.
    Parish(Uuid),
}

/// Optional narrowing applied on top of a [`UserScope`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UserListFilter {
    pub role: Option<UserRole>,
    pub parish_id: Option<Uuid>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a new user with its password hash.
    async fn create(&self, user: &User, password_hash: &str) -> Result<(), UserRepositoryError>;

    /// Fetch a user by identifier, active or not.
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserRepositoryError>;

    /// Fetch a user and password hash by normalised email.
    async fn find_credentials(
        &self,
        email: &Email,
    ) -> Result<Option<StoredCredentials>, UserRepositoryError>;

    /// Active users visible in `scope`, ordered by last then first name.
    async fn list(
        &self,
        scope: UserScope,
        filter: UserListFilter,
    ) -> Result<Vec<User>, UserRepositoryError>;

    /// Persist profile, role, assignment and active flag of an existing user.
    async fn save(&self, user: &User) -> Result<(), UserRepositoryError>;
}
