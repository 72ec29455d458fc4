//! Registration, login and self-profile use cases.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use tracing::info;

use crate::domain::ports::{
    AccountService, PasswordHasher, Registration, UserRepository, UserRepositoryError,
};
use crate::domain::service_support::{invalid, load_caller};
use crate::domain::{Actor, Error, LoginCredentials, User, UserDraft, UserId, UserRole};

const INVALID_CREDENTIALS: &str = "invalid email or password";

/// Account service implementing [`AccountService`].
#[derive(Clone)]
pub struct AccountServiceImpl<U> {
    users: Arc<U>,
    hasher: Arc<dyn PasswordHasher>,
    clock: Arc<dyn Clock>,
}

impl<U> AccountServiceImpl<U> {
    pub fn new(users: Arc<U>, hasher: Arc<dyn PasswordHasher>, clock: Arc<dyn Clock>) -> Self {
        Self {
            users,
            hasher,
            clock,
        }
    }
}

pub(crate) fn map_user_write_error(error: UserRepositoryError) -> Error {
    match error {
        UserRepositoryError::DuplicateEmail { email } => {
            Error::conflict(format!("email {email} is already registered"))
        }
        other => other.into(),
    }
}

#[async_trait]
impl<U> AccountService for AccountServiceImpl<U>
where
    U: UserRepository,
{
    async fn register(&self, registration: Registration) -> Result<User, Error> {
        if self.users.find_credentials(&registration.email).await?.is_some() {
            return Err(Error::conflict(format!(
                "email {} is already registered",
                registration.email
            )));
        }

        let now = self.clock.utc();
        let user = User::new(UserDraft {
            id: UserId::random(),
            email: registration.email,
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

        let hash = self.hasher.hash(registration.password.expose())?;
        self.users
            .create(&user, &hash)
            .await
            .map_err(map_user_write_error)?;
        info!(user_id = %user.id(), "registered account");
        Ok(user)
    }

    async fn login(&self, credentials: &LoginCredentials) -> Result<User, Error> {
        let Some(stored) = self.users.find_credentials(credentials.email()).await? else {
            return Err(Error::unauthorized(INVALID_CREDENTIALS));
        };
        let matches = self
            .hasher
            .verify(credentials.password(), &stored.password_hash)?;
        if !matches || !stored.user.is_active() {
            info!(user_id = %stored.user.id(), "login rejected");
            return Err(Error::unauthorized(INVALID_CREDENTIALS));
        }
        Ok(stored.user)
    }

    async fn current_user(&self, actor: &Actor) -> Result<User, Error> {
        let user = load_caller(self.users.as_ref(), actor).await?;
        if !user.is_active() {
            return Err(Error::unauthorized("account is inactive"));
        }
        Ok(user)
    }
}

#[cfg(test)]
#[path = "account_service_tests.rs"]
mod tests;
