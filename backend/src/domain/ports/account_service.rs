//! Driving port for registration, login and the caller's own profile.

use async_trait::async_trait;

use crate::domain::{Actor, Email, Error, LoginCredentials, NewPassword, PersonName, User};

/// Validated self-registration payload. New accounts are `faithful`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub email: Email,
    pub password: NewPassword,
    pub first_name: PersonName,
    pub last_name: PersonName,
    pub phone: Option<String>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AccountService: Send + Sync {
    /// Create a faithful account. A taken email is `409 Conflict`.
    async fn register(&self, registration: Registration) -> Result<User, Error>;

    /// Verify credentials. Every failure is the same `401`.
    async fn login(&self, credentials: &LoginCredentials) -> Result<User, Error>;

    /// The caller's current record.
    async fn current_user(&self, actor: &Actor) -> Result<User, Error>;
}
