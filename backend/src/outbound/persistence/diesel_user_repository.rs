//! PostgreSQL-backed [`UserRepository`].

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{
    StoredCredentials, UserListFilter, UserRepository, UserRepositoryError, UserScope,
};
use crate::domain::{Email, User, UserId};

use super::diesel_helpers::{collect_rows, map_diesel_error, map_pool_error, unique_violation};
use super::models::{NewUserRow, UserRow, UserUpdate};
use super::pool::{DbPool, PoolError};
use super::schema::users;

/// Diesel implementation of the user port.
#[derive(Clone)]
pub struct DieselUserRepository {
    pool: DbPool,
}

impl DieselUserRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn pool_error(error: PoolError) -> UserRepositoryError {
    map_pool_error(error, UserRepositoryError::connection)
}

fn diesel_error(error: diesel::result::Error) -> UserRepositoryError {
    map_diesel_error(
        error,
        UserRepositoryError::query,
        UserRepositoryError::connection,
    )
}

fn write_error(error: diesel::result::Error, email: &Email) -> UserRepositoryError {
    match unique_violation(&error) {
        Some(_) => UserRepositoryError::duplicate_email(email.as_ref()),
        None => diesel_error(error),
    }
}

fn to_user(row: UserRow) -> Result<User, UserRepositoryError> {
    row.into_domain().map_err(UserRepositoryError::query)
}

#[async_trait]
impl UserRepository for DieselUserRepository {
    async fn create(&self, user: &User, password_hash: &str) -> Result<(), UserRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        diesel::insert_into(users::table)
            .values(NewUserRow::new(user, password_hash))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(|err| write_error(err, user.email()))
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let row: Option<UserRow> = users::table
            .filter(users::id.eq(id.as_uuid()))
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(diesel_error)?;
        row.map(to_user).transpose()
    }

    async fn find_credentials(
        &self,
        email: &Email,
    ) -> Result<Option<StoredCredentials>, UserRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let found: Option<(UserRow, String)> = users::table
            .filter(users::email.eq(email.as_ref()))
            .select((UserRow::as_select(), users::password_hash))
            .first(&mut conn)
            .await
            .optional()
            .map_err(diesel_error)?;
        found
            .map(|(row, password_hash)| {
                to_user(row).map(|user| StoredCredentials {
                    user,
                    password_hash,
                })
            })
            .transpose()
    }

    async fn list(
        &self,
        scope: UserScope,
        filter: UserListFilter,
    ) -> Result<Vec<User>, UserRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let mut query = users::table
            .filter(users::active.eq(true))
            .select(UserRow::as_select())
            .order_by((users::last_name.asc(), users::first_name.asc()))
            .into_boxed();

        query = match scope {
            UserScope::All => query,
            UserScope::Diocese(diocese_id) => query.filter(users::diocese_id.eq(diocese_id)),
            UserScope::Parish(parish_id) => query.filter(users::parish_id.eq(parish_id)),
        };
        if let Some(role) = filter.role {
            query = query.filter(users::role.eq(role.as_str()));
        }
        if let Some(parish_id) = filter.parish_id {
            query = query.filter(users::parish_id.eq(parish_id));
        }

        let rows: Vec<UserRow> = query.load(&mut conn).await.map_err(diesel_error)?;
        collect_rows(rows, UserRow::into_domain, UserRepositoryError::query)
    }

    async fn save(&self, user: &User) -> Result<(), UserRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let updated = diesel::update(users::table.filter(users::id.eq(user.id().as_uuid())))
            .set(UserUpdate::from(user))
            .execute(&mut conn)
            .await
            .map_err(diesel_error)?;
        if updated == 0 {
            return Err(UserRepositoryError::query(format!(
                "user {} not found for update",
                user.id()
            )));
        }
        Ok(())
    }
}
